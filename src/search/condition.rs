//! Filter value classification

use crate::error::{Error, Result};
use crate::search::clause::Params;
use serde_json::{Map, Value};

/// Range bound keys recognised by the classifier
pub const RANGE_KEYS: [&str; 4] = ["gt", "gte", "lt", "lte"];

/// What a single filter value asks for
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `null`: the field must be present
    Exists,
    /// Scalar: exact match
    Term(Value),
    /// List (or map without range/negation keys): any of the values
    Terms(Vec<Value>),
    /// Map with at least one of `gt`/`gte`/`lt`/`lte`
    Range(Params),
    /// Map with a `not` key: the inner value, negated
    Not(Value),
}

impl Condition {
    /// Classify a filter value. First matching rule wins.
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Null => Condition::Exists,
            Value::Array(values) => Condition::Terms(values.clone()),
            Value::Object(map) => {
                let bounds: Params = map
                    .iter()
                    .filter(|(key, _)| RANGE_KEYS.contains(&key.as_str()))
                    .map(|(key, bound)| (key.clone(), bound.clone()))
                    .collect();

                if !bounds.is_empty() {
                    Condition::Range(bounds)
                } else if let Some(inner) = map.get("not") {
                    Condition::Not(inner.clone())
                } else {
                    Condition::Terms(map.values().cloned().collect())
                }
            }
            scalar => Condition::Term(scalar.clone()),
        }
    }
}

/// Check that a top-level filter/query attribute is a field map.
///
/// `null`, `[]` and `{}` mean "no conditions" and yield `None`.
pub fn expect_field_map<'a>(name: &str, value: &'a Value) -> Result<Option<&'a Map<String, Value>>> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        Value::Array(items) if items.is_empty() => Ok(None),
        _ => Err(Error::InvalidArgument(format!(
            "attribute {} must be associative array",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_become_terms() {
        for value in [json!("active"), json!(42), json!(1.5), json!(true)] {
            assert_eq!(Condition::classify(&value), Condition::Term(value.clone()));
        }
    }

    #[test]
    fn test_null_is_existence() {
        assert_eq!(Condition::classify(&Value::Null), Condition::Exists);
    }

    #[test]
    fn test_lists_become_term_sets() {
        assert_eq!(
            Condition::classify(&json!([1, 2, 3])),
            Condition::Terms(vec![json!(1), json!(2), json!(3)])
        );
    }

    #[test]
    fn test_range_keeps_only_bounds() {
        let condition = Condition::classify(&json!({"gte": 18, "lt": 65, "boost": 2}));
        let Condition::Range(bounds) = condition else {
            panic!("expected a range");
        };
        assert_eq!(Value::Object(bounds), json!({"gte": 18, "lt": 65}));
    }

    #[test]
    fn test_range_wins_over_not() {
        let condition = Condition::classify(&json!({"not": 3, "gt": 1}));
        assert!(matches!(condition, Condition::Range(_)));
    }

    #[test]
    fn test_not_and_plain_maps() {
        assert_eq!(
            Condition::classify(&json!({"not": "draft"})),
            Condition::Not(json!("draft"))
        );
        assert_eq!(
            Condition::classify(&json!({"a": "x", "b": "y"})),
            Condition::Terms(vec![json!("x"), json!("y")])
        );
    }

    #[test]
    fn test_field_map_contract() {
        assert!(expect_field_map("where", &Value::Null).unwrap().is_none());
        assert!(expect_field_map("where", &json!([])).unwrap().is_none());
        assert!(expect_field_map("where", &json!({})).unwrap().is_none());
        assert_eq!(
            expect_field_map("where", &json!({"a": 1})).unwrap().map(Map::len),
            Some(1)
        );

        let err = expect_field_map("where", &json!(["status"])).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(expect_field_map("query", &json!("status")).is_err());
    }
}
