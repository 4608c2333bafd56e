//! # Field masks
//!
//! Updates name the fields they change with a [`FieldMask`]:
//!
//! - no mask, or an empty one, updates the fields populated in the body
//! - `*` updates every mutable field, resetting those left unset in the body
//! - otherwise exactly the listed paths are updated
//!
//! Paths outside a kind's mutable set are rejected: output fields such as
//! `name` or `revision_id` can only change through their own operations.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};

/// Path that selects every mutable field
pub const WILDCARD_PATH: &str = "*";

/// A message whose fields can be updated selectively
pub trait Masked {
    /// Fields an update may change
    const MUTABLE: &'static [&'static str];

    /// Known fields that only the registry sets
    const OUTPUT_ONLY: &'static [&'static str];

    /// True if `path` holds a non-default value
    fn is_populated(&self, path: &str) -> bool;

    /// Copy the field at `path` from `from`
    fn copy_field(&mut self, from: &Self, path: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask {
    pub paths: Vec<String>,
}

impl FieldMask {
    pub fn new<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Mask covering every mutable field
    pub fn all() -> Self {
        Self::new([WILDCARD_PATH])
    }

    /// Resolve the concrete paths an update of `body` will change
    pub fn resolve<T: Masked>(mask: Option<&Self>, body: &T) -> Result<Vec<&'static str>> {
        let paths = match mask {
            Some(mask) if !mask.paths.is_empty() => &mask.paths,
            _ => {
                return Ok(T::MUTABLE
                    .iter()
                    .copied()
                    .filter(|path| body.is_populated(path))
                    .collect())
            }
        };

        if paths.iter().any(|p| p == WILDCARD_PATH) {
            return Ok(T::MUTABLE.to_vec());
        }

        paths
            .iter()
            .map(|path| {
                if let Some(known) = T::MUTABLE.iter().find(|m| **m == path.as_str()) {
                    Ok(*known)
                } else if T::OUTPUT_ONLY.contains(&path.as_str()) {
                    Err(RegistryError::invalid_argument(format!(
                        "invalid update_mask: field {path:?} cannot be updated"
                    )))
                } else {
                    Err(RegistryError::invalid_argument(format!(
                        "invalid update_mask: unknown field {path:?}"
                    )))
                }
            })
            .collect()
    }

    /// Copy the masked fields of `body` into `target`, returning the paths applied
    pub fn apply<T: Masked>(mask: Option<&Self>, target: &mut T, body: &T) -> Result<Vec<&'static str>> {
        let paths = Self::resolve(mask, body)?;
        for path in &paths {
            target.copy_field(body, path);
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Widget {
        name: String,
        title: String,
        color: String,
    }

    impl Masked for Widget {
        const MUTABLE: &'static [&'static str] = &["title", "color"];
        const OUTPUT_ONLY: &'static [&'static str] = &["name"];

        fn is_populated(&self, path: &str) -> bool {
            match path {
                "title" => !self.title.is_empty(),
                "color" => !self.color.is_empty(),
                _ => false,
            }
        }

        fn copy_field(&mut self, from: &Self, path: &str) {
            match path {
                "title" => self.title.clone_from(&from.title),
                "color" => self.color.clone_from(&from.color),
                _ => {}
            }
        }
    }

    fn existing() -> Widget {
        Widget {
            name: "w".to_string(),
            title: "old".to_string(),
            color: "red".to_string(),
        }
    }

    #[test]
    fn test_empty_mask_updates_populated_fields() {
        let body = Widget {
            title: "new".to_string(),
            ..Widget::default()
        };
        let mut target = existing();
        let applied = FieldMask::apply(None, &mut target, &body).expect("apply");
        assert_eq!(applied, vec!["title"]);
        assert_eq!(target.title, "new");
        assert_eq!(target.color, "red", "unset fields are kept");

        let mut target = existing();
        FieldMask::apply(Some(&FieldMask::default()), &mut target, &body).expect("apply");
        assert_eq!(target.color, "red");
    }

    #[test]
    fn test_wildcard_mask_resets_unset_fields() {
        let body = Widget {
            title: "new".to_string(),
            ..Widget::default()
        };
        let mut target = existing();
        FieldMask::apply(Some(&FieldMask::all()), &mut target, &body).expect("apply");
        assert_eq!(target.title, "new");
        assert_eq!(target.color, "");
        assert_eq!(target.name, "w");
    }

    #[test]
    fn test_explicit_paths() {
        let body = Widget {
            title: "new".to_string(),
            color: "blue".to_string(),
            ..Widget::default()
        };
        let mut target = existing();
        FieldMask::apply(Some(&FieldMask::new(["color"])), &mut target, &body).expect("apply");
        assert_eq!(target.title, "old");
        assert_eq!(target.color, "blue");
    }

    #[test]
    fn test_invalid_paths() {
        let body = Widget::default();
        for path in ["name", "size", "labels.team"] {
            let mask = FieldMask::new([path]);
            assert!(
                FieldMask::resolve(Some(&mask), &body).is_err(),
                "path '{path}' should be rejected"
            );
        }
    }
}
