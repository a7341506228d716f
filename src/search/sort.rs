//! Field sorts

use crate::error::{Error, Result};
use crate::search::clause::Params;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a user supplied order (`asc`/`desc`, any case)
    pub fn parse(order: &str) -> Result<Self> {
        SortOrder::from_str(order.trim())
            .map_err(|_| Error::InvalidArgument(format!("unknown sort order '{}'", order)))
    }
}

/// Sort on one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSort {
    pub field: String,
    pub order: Option<SortOrder>,
    pub params: Params,
}

impl FieldSort {
    pub fn new(field: impl Into<String>, order: Option<SortOrder>) -> Self {
        Self {
            field: field.into(),
            order,
            params: Params::new(),
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn to_dsl(&self) -> Value {
        let mut body = self.params.clone();
        if let Some(order) = self.order {
            body.insert("order".to_string(), json!(order.as_ref()));
        }
        let mut sort = Map::new();
        sort.insert(self.field.clone(), Value::Object(body));
        Value::Object(sort)
    }
}

/// Turn a `sort_by` attribute into field sorts.
///
/// Accepts a field name, a list of field names (ascending) or a map of field
/// to order; mixed maps with numeric keys treat the value as an ascending
/// field. `id` is skipped wherever it appears.
pub fn parse_sort_attribute(sort_by: &Value) -> Result<Vec<FieldSort>> {
    let mut sorts = Vec::new();
    match sort_by {
        Value::Null => {}
        Value::String(field) => push_ascending(&mut sorts, field),
        Value::Array(fields) => {
            for field in fields {
                let field = field.as_str().ok_or_else(|| {
                    Error::InvalidArgument(format!("sort field must be a string, got {}", field))
                })?;
                push_ascending(&mut sorts, field);
            }
        }
        Value::Object(entries) => {
            for (key, order) in entries {
                let order = order.as_str().ok_or_else(|| {
                    Error::InvalidArgument(format!("sort order for '{}' must be a string", key))
                })?;
                if key == "id" || order == "id" {
                    continue;
                }
                if key.parse::<u64>().is_ok() {
                    push_ascending(&mut sorts, order);
                } else {
                    sorts.push(FieldSort::new(key.as_str(), Some(SortOrder::parse(order)?)));
                }
            }
        }
        other => {
            return Err(Error::InvalidArgument(format!(
                "attribute sort_by must be a field or a map, got {}",
                other
            )))
        }
    }
    Ok(sorts)
}

fn push_ascending(sorts: &mut Vec<FieldSort>, field: &str) {
    if field != "id" {
        sorts.push(FieldSort::new(field, Some(SortOrder::Asc)));
    }
}
