//! Shared grammar fragments and identifier validation
//!
//! Every resource kind builds its pattern from the fragments below and every
//! constructor validates identifiers with [`validate_id`], so the rules for
//! length, charset, case, hyphen placement and UUID exclusion live in one place.

use crate::errors::NameError;
use regex::Regex;
use std::sync::LazyLock;

/// The only supported location segment
pub const LOCATION: &str = "global";

/// Collection wildcard accepted in list parents
pub const WILDCARD: &str = "-";

/// Maximum identifier length
pub const MAX_ID_LENGTH: usize = 80;

/// Maximum revision tag length
pub const MAX_REVISION_TAG_LENGTH: usize = 40;

/// One name segment as accepted by the parsers (validation is stricter)
pub(crate) const SEGMENT: &str = r"([A-Za-z0-9_.\-]+)";

/// Optional `@revision` or `@tag` suffix
pub(crate) const REVISION_SUFFIX: &str = r"(?:@([A-Za-z0-9_.\-]+))?";

static CUSTOM_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9\-.]+$").expect("identifier pattern is valid - this should never happen")
});

static REVISION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9\-]+$").expect("revision tag pattern is valid - this should never happen")
});

/// Pattern matching `projects/{id}` with an optional `locations/global` suffix
pub(crate) fn project_prefix() -> String {
    format!("projects/{SEGMENT}(?:/locations/{LOCATION})?")
}

/// Compile an anchored pattern
pub(crate) fn anchored(body: &str) -> Regex {
    Regex::new(&format!("^{body}$")).expect("name pattern is valid - this should never happen")
}

/// Returns true if the segment is the collection wildcard
pub fn is_wildcard(id: &str) -> bool {
    id == WILDCARD
}

/// Validate a user-supplied identifier
///
/// Identifiers must be non-empty, at most 80 characters, consist of lowercase
/// letters, digits, hyphens and dots, begin and end with a letter or digit, and
/// must not parse as a UUID (those are reserved for system-generated ids).
pub fn validate_id(id: &str) -> Result<(), NameError> {
    let fail = |reason: &str| {
        Err(NameError::InvalidIdentifier {
            id: id.to_string(),
            reason: reason.to_string(),
        })
    };

    if id.is_empty() {
        return fail("identifier must be nonempty");
    }
    if !CUSTOM_IDENTIFIER.is_match(id) {
        return fail("must contain only lowercase letters, digits, hyphens and dots");
    }
    if uuid::Uuid::parse_str(id).is_ok() {
        return fail("must not match UUID format");
    }
    if id.len() > MAX_ID_LENGTH {
        return fail("must be 80 characters or less");
    }
    if id.starts_with(['-', '.']) {
        return fail("must begin with a number or letter");
    }
    if id.ends_with(['-', '.']) {
        return fail("must end with a number or letter");
    }
    Ok(())
}

/// Validate a custom revision tag
pub fn validate_revision_tag(tag: &str) -> Result<(), NameError> {
    let fail = |reason: &str| {
        Err(NameError::InvalidRevisionTag {
            tag: tag.to_string(),
            reason: reason.to_string(),
        })
    };

    if !REVISION_TAG.is_match(tag) {
        return fail("must contain only lowercase letters, digits, and dashes");
    }
    if tag == WILDCARD {
        return fail("must not be a single dash");
    }
    if tag.len() > MAX_REVISION_TAG_LENGTH {
        return fail("must be 40 characters or less");
    }
    Ok(())
}

/// Validate every identifier in order, stopping at the first failure
pub(crate) fn validate_all(ids: &[&str]) -> Result<(), NameError> {
    ids.iter().try_for_each(|id| validate_id(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id_valid() {
        let max = "a".repeat(80);
        let valid = vec!["a", "my-api", "v1.2.3", "0abc9", max.as_str()];
        for id in valid {
            assert!(validate_id(id).is_ok(), "id '{id}' should be valid");
        }
    }

    #[test]
    fn test_validate_id_invalid() {
        let too_long = "a".repeat(81);
        let invalid = vec![
            "",
            "-",
            "Upper",
            "under_score",
            "-leading",
            "trailing-",
            ".leading",
            "trailing.",
            "has space",
            "123e4567-e89b-12d3-a456-426614174000",
            too_long.as_str(),
        ];
        for id in invalid {
            assert!(validate_id(id).is_err(), "id '{id}' should be invalid");
        }
    }

    #[test]
    fn test_validate_revision_tag() {
        assert!(validate_revision_tag("prod").is_ok());
        assert!(validate_revision_tag("release-1").is_ok());
        assert!(validate_revision_tag("-").is_err());
        assert!(validate_revision_tag("v1.0").is_err(), "dots are not allowed in tags");
        assert!(validate_revision_tag("Prod").is_err());
        assert!(validate_revision_tag("").is_err());
        assert!(validate_revision_tag(&"t".repeat(41)).is_err());
    }
}
