//! # Pagination
//!
//! List calls resume from an opaque page token. The token records how many
//! rows of the ordered, unfiltered listing have already been scanned, plus the
//! filter and order the listing was started with. Resuming with a different
//! filter or order is rejected.
//!
//! Scanning is offset based: every row read advances the offset whether or not
//! it matched the filter. Concurrent writes between pages may therefore cause
//! skipped or repeated rows.

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PAGE_TOKEN_VERSION};
use crate::error::{RegistryError, Result};
use crate::filtering::{Field, FieldMap, Filter};
use crate::models::ListRequest;
use base64::{engine::general_purpose, Engine as _};
use sea_orm::{ConnectionTrait, EntityTrait, Order, QueryOrder, QuerySelect, Select};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// A row that can be evaluated by list filters
pub trait Filterable {
    /// Filter and ordering schema of the kind
    const FIELDS: &'static [Field];

    fn field_map(&self) -> FieldMap;
}

/// Decoded page token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageToken {
    #[serde(rename = "v")]
    pub version: u8,
    pub offset: u64,
    pub filter: String,
    pub order: String,
}

impl PageToken {
    pub fn new(offset: u64, filter: &str, order: &str) -> Self {
        Self {
            version: PAGE_TOKEN_VERSION,
            offset,
            filter: filter.to_string(),
            order: order.to_string(),
        }
    }

    /// Encode as an opaque string
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a token produced by [`PageToken::encode`]; the empty token is the first page
    pub fn decode(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Ok(Self::new(0, "", ""));
        }
        let invalid = |reason: String| {
            RegistryError::invalid_argument(format!("invalid page token {token:?}: {reason}"))
        };
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| invalid(format!("expected base64: {e}")))?;
        let decoded: Self =
            serde_json::from_slice(&bytes).map_err(|e| invalid(format!("malformed: {e}")))?;
        if decoded.version != PAGE_TOKEN_VERSION {
            return Err(invalid(format!("unsupported version {}", decoded.version)));
        }
        Ok(decoded)
    }

    /// A resumed listing must use the filter it started with
    pub fn validate_filter(&self, filter: &str) -> Result<()> {
        if self.offset > 0 && self.filter != filter {
            return Err(RegistryError::invalid_argument(format!(
                "invalid filter {filter:?}: does not match previous filter {:?}",
                self.filter
            )));
        }
        Ok(())
    }

    /// A resumed listing must use the order it started with
    pub fn validate_order(&self, order: &str) -> Result<()> {
        if self.offset > 0 && self.order != order {
            return Err(RegistryError::invalid_argument(format!(
                "invalid order_by {order:?}: does not match previous order {:?}",
                self.order
            )));
        }
        Ok(())
    }
}

/// Apply the page size policy: negative is invalid, 0 is the default, large values are clamped
pub fn page_size(requested: i32) -> Result<u64> {
    match u64::try_from(requested) {
        Err(_) => Err(RegistryError::invalid_argument(format!(
            "invalid page_size {requested}: must not be negative"
        ))),
        Ok(0) => Ok(DEFAULT_PAGE_SIZE),
        Ok(size) => Ok(size.min(MAX_PAGE_SIZE)),
    }
}

/// One `order_by` clause resolved to a storage column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Parse a comma-separated `field [asc|desc]` list against a schema
pub fn parse_order(order_by: &str, fields: &[Field]) -> Result<Vec<OrderBy>> {
    let invalid = |reason: String| {
        RegistryError::invalid_argument(format!("invalid order_by {order_by:?}: {reason}"))
    };

    let mut clauses = Vec::new();
    for clause in order_by.split(',') {
        let parts: Vec<&str> = clause.split_whitespace().collect();
        let (field, descending) = match parts.as_slice() {
            [field] => (*field, false),
            [field, "asc"] => (*field, false),
            [field, "desc"] => (*field, true),
            [] => return Err(invalid("missing field name".to_string())),
            [_, direction] => return Err(invalid(format!("unknown direction {direction:?}"))),
            _ => return Err(invalid(format!("too many parts in {:?}", clause.trim()))),
        };
        let column = fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| invalid(format!("unknown field {field:?}")))?
            .column
            .ok_or_else(|| invalid(format!("cannot order by {field:?}")))?;
        clauses.push(OrderBy { column, descending });
    }
    Ok(clauses)
}

/// A validated list request, ready to scan
#[derive(Debug, Clone)]
pub struct Page {
    pub size: u64,
    pub token: PageToken,
    pub filter: Filter,
    pub order: Vec<OrderBy>,
}

impl Page {
    /// Validate the paging parameters of `request` for a kind
    ///
    /// `default_order` applies when the request names no order.
    pub fn new(request: &ListRequest, fields: &[Field], default_order: &[OrderBy]) -> Result<Self> {
        let size = page_size(request.page_size)?;
        let mut token = PageToken::decode(&request.page_token)?;
        token.validate_filter(&request.filter)?;
        token.validate_order(&request.order_by)?;
        token.filter.clone_from(&request.filter);
        token.order.clone_from(&request.order_by);

        let filter = Filter::new(&request.filter, fields)?;
        let order = if request.order_by.trim().is_empty() {
            default_order.to_vec()
        } else {
            parse_order(&request.order_by, fields)?
        };

        Ok(Self {
            size,
            token,
            filter,
            order,
        })
    }

    /// Scan `query` from the token offset and collect one page of matching rows
    ///
    /// Returns the page and the token for the next page, which is empty when no
    /// further matching row exists.
    pub async fn scan<E, C>(&self, conn: &C, query: Select<E>) -> Result<(Vec<E::Model>, String)>
    where
        E: EntityTrait,
        E::Model: Filterable + Sync,
        C: ConnectionTrait,
    {
        let query = self.ordered(query)?;
        let page_len = usize::try_from(self.size).unwrap_or(usize::MAX);
        let batch = self.size + 1;
        let mut offset = self.token.offset;
        let mut items = Vec::with_capacity(page_len);

        loop {
            let rows = query.clone().offset(offset).limit(batch).all(conn).await?;
            let exhausted = (rows.len() as u64) < batch;
            debug!(offset = offset, rows = rows.len(), "Scanned list batch");

            for row in rows {
                if !self.filter.matches(&row.field_map())? {
                    offset += 1;
                    continue;
                }
                if items.len() == page_len {
                    let next = PageToken::new(offset, &self.token.filter, &self.token.order);
                    return Ok((items, next.encode()?));
                }
                offset += 1;
                items.push(row);
            }

            if exhausted {
                return Ok((items, String::new()));
            }
        }
    }

    fn ordered<E: EntityTrait>(&self, mut query: Select<E>) -> Result<Select<E>> {
        for clause in self.order.iter().chain(std::iter::once(&OrderBy::asc("key"))) {
            let column = E::Column::from_str(clause.column).ok().ok_or_else(|| {
                RegistryError::internal(format!("no column {:?} to order by", clause.column))
            })?;
            let direction = if clause.descending { Order::Desc } else { Order::Asc };
            query = query.order_by(column, direction);
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtering::FieldType;

    const FIELDS: &[Field] = &[
        Field::new("name", FieldType::String, Some("key")),
        Field::new("description", FieldType::String, Some("description")),
        Field::new("create_time", FieldType::Timestamp, Some("create_time")),
        Field::new("labels", FieldType::StringMap, None),
    ];

    #[test]
    fn test_page_token_round_trip() {
        let token = PageToken::new(42, "description == 'x'", "create_time desc");
        let encoded = token.encode().expect("encode");
        assert_eq!(PageToken::decode(&encoded).expect("decode"), token);
    }

    #[test]
    fn test_page_token_rejects_garbage() {
        let garbage = vec!["not base64!", "aGVsbG8", "e30", "eyJ2Ijo5LCJvZmZzZXQiOjEsImZpbHRlciI6IiIsIm9yZGVyIjoiIn0"];
        for token in garbage {
            let err = PageToken::decode(token).expect_err(&format!("'{token}' should not decode"));
            assert_eq!(err.code(), crate::error::Code::InvalidArgument);
        }
    }

    #[test]
    fn test_empty_token_is_first_page() {
        let token = PageToken::decode("").expect("empty token");
        assert_eq!(token.offset, 0);
        assert!(token.validate_filter("anything").is_ok());
    }

    #[test]
    fn test_resumed_filter_must_match() {
        let token = PageToken::new(10, "a", "");
        assert!(token.validate_filter("a").is_ok());
        assert!(token.validate_filter("b").is_err());
        assert!(token.validate_order("name desc").is_err());
    }

    #[test]
    fn test_page_size_policy() {
        assert!(page_size(-1).is_err());
        assert_eq!(page_size(0).expect("default"), 50);
        assert_eq!(page_size(7).expect("exact"), 7);
        assert_eq!(page_size(1000).expect("max"), 1000);
        assert_eq!(page_size(1500).expect("clamped"), 1000);
    }

    #[test]
    fn test_parse_order() {
        let order = parse_order("name, create_time desc,description asc", FIELDS).expect("order");
        assert_eq!(
            order,
            vec![
                OrderBy::asc("key"),
                OrderBy::desc("create_time"),
                OrderBy::asc("description"),
            ]
        );

        let invalid = vec![
            "unknown",
            "name sideways",
            "name desc extra",
            "name,",
            "labels",
        ];
        for order_by in invalid {
            assert!(
                parse_order(order_by, FIELDS).is_err(),
                "order_by '{order_by}' should be rejected"
            );
        }
    }
}
