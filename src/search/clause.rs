//! Elementary query clauses and their wire rendering

use crate::error::{Error, Result};
use crate::search::bool_query::BoolQuery;
use serde_json::{json, Map, Value};

/// Extra clause options (boost, fuzziness, analyzer, ...)
pub type Params = Map<String, Value>;

/// One atomic search condition
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Exists {
        field: String,
    },
    Term {
        field: String,
        value: Value,
        params: Params,
    },
    Terms {
        field: String,
        values: Vec<Value>,
        params: Params,
    },
    Range {
        field: String,
        bounds: Params,
    },
    Prefix {
        field: String,
        value: Value,
        params: Params,
    },
    Wildcard {
        field: String,
        value: Value,
        params: Params,
    },
    Fuzzy {
        field: String,
        value: Value,
        params: Params,
    },
    Regexp {
        field: String,
        pattern: String,
        params: Params,
    },
    Match {
        field: String,
        query: Value,
        params: Params,
    },
    MultiMatch {
        fields: Vec<String>,
        query: Value,
        params: Params,
    },
    CommonTerms {
        field: String,
        query: Value,
        params: Params,
    },
    QueryString {
        query: String,
        params: Params,
    },
    SimpleQueryString {
        query: String,
        params: Params,
    },
    MatchAll {
        params: Params,
    },
    Ids {
        values: Vec<Value>,
        params: Params,
    },
    GeoDistance {
        field: String,
        distance: Value,
        location: Value,
        params: Params,
    },
    GeoDistanceRange {
        field: String,
        from: Value,
        to: Value,
        location: Value,
        params: Params,
    },
    GeoBoundingBox {
        field: String,
        corners: BoundingBox,
        params: Params,
    },
    GeoPolygon {
        field: String,
        points: Vec<Value>,
        params: Params,
    },
    GeoShape {
        field: String,
        shape_type: String,
        coordinates: Value,
        params: Params,
    },
    Nested {
        path: String,
        query: Box<BoolQuery>,
        params: Params,
    },
    Bool(BoolQuery),
}

/// Corners of a geo bounding box, given as two or four points
#[derive(Debug, Clone, PartialEq)]
pub enum BoundingBox {
    Corners {
        top_left: Value,
        bottom_right: Value,
    },
    Edges {
        top: Value,
        left: Value,
        bottom: Value,
        right: Value,
    },
}

impl BoundingBox {
    /// Accepts exactly two (corner) or four (edge) values
    pub fn from_values(values: Vec<Value>) -> Result<Self> {
        let mut values = values.into_iter();
        match values.len() {
            2 => Ok(BoundingBox::Corners {
                top_left: values.next().unwrap_or(Value::Null),
                bottom_right: values.next().unwrap_or(Value::Null),
            }),
            4 => Ok(BoundingBox::Edges {
                top: values.next().unwrap_or(Value::Null),
                left: values.next().unwrap_or(Value::Null),
                bottom: values.next().unwrap_or(Value::Null),
                right: values.next().unwrap_or(Value::Null),
            }),
            n => Err(Error::InvalidArgument(format!(
                "geo bounding box needs 2 or 4 geo points, got {}",
                n
            ))),
        }
    }

    fn to_dsl(&self) -> Value {
        match self {
            BoundingBox::Corners {
                top_left,
                bottom_right,
            } => json!({ "top_left": top_left, "bottom_right": bottom_right }),
            BoundingBox::Edges {
                top,
                left,
                bottom,
                right,
            } => json!({ "top": top, "left": left, "bottom": bottom, "right": right }),
        }
    }
}

impl Clause {
    /// DSL key of the clause
    pub fn kind(&self) -> &'static str {
        match self {
            Clause::Exists { .. } => "exists",
            Clause::Term { .. } => "term",
            Clause::Terms { .. } => "terms",
            Clause::Range { .. } => "range",
            Clause::Prefix { .. } => "prefix",
            Clause::Wildcard { .. } => "wildcard",
            Clause::Fuzzy { .. } => "fuzzy",
            Clause::Regexp { .. } => "regexp",
            Clause::Match { .. } => "match",
            Clause::MultiMatch { .. } => "multi_match",
            Clause::CommonTerms { .. } => "common",
            Clause::QueryString { .. } => "query_string",
            Clause::SimpleQueryString { .. } => "simple_query_string",
            Clause::MatchAll { .. } => "match_all",
            Clause::Ids { .. } => "ids",
            Clause::GeoDistance { .. } => "geo_distance",
            Clause::GeoDistanceRange { .. } => "geo_distance_range",
            Clause::GeoBoundingBox { .. } => "geo_bounding_box",
            Clause::GeoPolygon { .. } => "geo_polygon",
            Clause::GeoShape { .. } => "geo_shape",
            Clause::Nested { .. } => "nested",
            Clause::Bool(_) => "bool",
        }
    }

    /// Render the clause as an engine query object
    pub fn to_dsl(&self) -> Value {
        let body = match self {
            Clause::Exists { field } => json!({ "field": field }),
            Clause::Term {
                field,
                value,
                params,
            } => {
                // A bare value unless options force the long form
                let inner = if params.is_empty() {
                    value.clone()
                } else {
                    with_params(params, [("value", value.clone())])
                };
                single(field, inner)
            }
            Clause::Terms {
                field,
                values,
                params,
            } => with_params(params, [(field.as_str(), Value::Array(values.clone()))]),
            Clause::Range { field, bounds } => single(field, Value::Object(bounds.clone())),
            Clause::Prefix {
                field,
                value,
                params,
            }
            | Clause::Wildcard {
                field,
                value,
                params,
            }
            | Clause::Fuzzy {
                field,
                value,
                params,
            } => single(field, with_params(params, [("value", value.clone())])),
            Clause::Regexp {
                field,
                pattern,
                params,
            } => single(field, with_params(params, [("value", json!(pattern))])),
            Clause::Match {
                field,
                query,
                params,
            }
            | Clause::CommonTerms {
                field,
                query,
                params,
            } => single(field, with_params(params, [("query", query.clone())])),
            Clause::MultiMatch {
                fields,
                query,
                params,
            } => {
                let mut body = Params::new();
                if !fields.is_empty() {
                    body.insert("fields".to_string(), json!(fields));
                }
                body.insert("query".to_string(), query.clone());
                merge(params, body)
            }
            Clause::QueryString { query, params } | Clause::SimpleQueryString { query, params } => {
                with_params(params, [("query", json!(query))])
            }
            Clause::MatchAll { params } => Value::Object(params.clone()),
            Clause::Ids { values, params } => {
                with_params(params, [("values", Value::Array(values.clone()))])
            }
            Clause::GeoDistance {
                field,
                distance,
                location,
                params,
            } => with_params(
                params,
                [("distance", distance.clone()), (field.as_str(), location.clone())],
            ),
            Clause::GeoDistanceRange {
                field,
                from,
                to,
                location,
                params,
            } => with_params(
                params,
                [
                    ("from", from.clone()),
                    ("to", to.clone()),
                    (field.as_str(), location.clone()),
                ],
            ),
            Clause::GeoBoundingBox {
                field,
                corners,
                params,
            } => with_params(params, [(field.as_str(), corners.to_dsl())]),
            Clause::GeoPolygon {
                field,
                points,
                params,
            } => with_params(params, [(field.as_str(), json!({ "points": points }))]),
            Clause::GeoShape {
                field,
                shape_type,
                coordinates,
                params,
            } => {
                // Options live inside the shape object for this clause
                let shape = with_params(
                    params,
                    [("type", json!(shape_type)), ("coordinates", coordinates.clone())],
                );
                single(field, json!({ "shape": shape }))
            }
            Clause::Nested {
                path,
                query,
                params,
            } => with_params(params, [("path", json!(path)), ("query", query.to_dsl())]),
            Clause::Bool(query) => return query.to_dsl(),
        };

        single(self.kind(), body)
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn with_params<const N: usize>(params: &Params, entries: [(&str, Value); N]) -> Value {
    let mut body = Params::new();
    for (key, value) in entries {
        body.insert(key.to_string(), value);
    }
    merge(params, body)
}

fn merge(params: &Params, body: Params) -> Value {
    let mut merged = params.clone();
    for (key, value) in body {
        merged.insert(key, value);
    }
    Value::Object(merged)
}
