//! Aggregation requests

use crate::search::clause::Params;
use serde_json::{json, Map, Value};

/// Default bucket count of a terms aggregation
pub const DEFAULT_TERMS_SIZE: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    Terms {
        field: Option<String>,
        size: u64,
        script: Option<String>,
    },
    /// Single-value metric (`avg`, `sum`, `min`, `max`, `value_count`, `cardinality`)
    Metric {
        kind: &'static str,
        field: String,
        params: Params,
    },
}

impl Aggregation {
    pub fn to_dsl(&self) -> Value {
        match self {
            Aggregation::Terms {
                field,
                size,
                script,
            } => {
                // Unset and zero entries are left out
                let mut body = Map::new();
                if let Some(field) = field.as_deref().filter(|f| !f.is_empty()) {
                    body.insert("field".to_string(), json!(field));
                }
                if *size > 0 {
                    body.insert("size".to_string(), json!(size));
                }
                if let Some(script) = script.as_deref().filter(|s| !s.is_empty()) {
                    body.insert("script".to_string(), json!(script));
                }
                json!({ "terms": body })
            }
            Aggregation::Metric {
                kind,
                field,
                params,
            } => {
                let mut body = params.clone();
                body.insert("field".to_string(), json!(field));
                let mut agg = Map::new();
                agg.insert(kind.to_string(), Value::Object(body));
                Value::Object(agg)
            }
        }
    }
}

/// Collects named aggregations for a search
#[derive(Debug, Clone, Default)]
pub struct AggregationBuilder {
    aggregations: Vec<(String, Aggregation)>,
}

impl AggregationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terms bucket aggregation with the default size
    pub fn terms(&mut self, name: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.terms_with(name, Some(field.into()), DEFAULT_TERMS_SIZE, None)
    }

    pub fn terms_with(
        &mut self,
        name: impl Into<String>,
        field: Option<String>,
        size: u64,
        script: Option<String>,
    ) -> &mut Self {
        self.push(
            name,
            Aggregation::Terms {
                field,
                size,
                script,
            },
        )
    }

    pub fn average(&mut self, name: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.metric(name, "avg", field)
    }

    pub fn sum(&mut self, name: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.metric(name, "sum", field)
    }

    pub fn min(&mut self, name: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.metric(name, "min", field)
    }

    pub fn max(&mut self, name: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.metric(name, "max", field)
    }

    pub fn value_count(&mut self, name: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.metric(name, "value_count", field)
    }

    pub fn cardinality(&mut self, name: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.metric(name, "cardinality", field)
    }

    fn metric(&mut self, name: impl Into<String>, kind: &'static str, field: impl Into<String>) -> &mut Self {
        self.push(
            name,
            Aggregation::Metric {
                kind,
                field: field.into(),
                params: Params::new(),
            },
        )
    }

    fn push(&mut self, name: impl Into<String>, aggregation: Aggregation) -> &mut Self {
        let name = name.into();
        // A later aggregation replaces an earlier one of the same name
        self.aggregations.retain(|(existing, _)| *existing != name);
        self.aggregations.push((name, aggregation));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.aggregations.is_empty()
    }

    /// The `aggregations` section
    pub fn to_dsl(&self) -> Value {
        let section: Map<String, Value> = self
            .aggregations
            .iter()
            .map(|(name, aggregation)| (name.clone(), aggregation.to_dsl()))
            .collect();
        Value::Object(section)
    }
}
