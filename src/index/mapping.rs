use crate::search::clause::Params;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Field datatypes understood by the mapping blueprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldType {
    Text,
    Keyword,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Date,
    GeoPoint,
    Completion,
    Nested,
    Object,
}

#[derive(Debug, Clone, PartialEq)]
struct FieldMapping {
    field_type: FieldType,
    params: Params,
    properties: Option<Mapping>,
}

/// Field mapping blueprint of one document type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    fields: Vec<(String, FieldMapping)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field of any type; a field declared twice keeps the last definition
    pub fn field(&mut self, name: impl Into<String>, field_type: FieldType, params: Params) -> &mut Self {
        self.insert(
            name.into(),
            FieldMapping {
                field_type,
                params,
                properties: None,
            },
        )
    }

    pub fn text(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::Text, Params::new())
    }

    pub fn keyword(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::Keyword, Params::new())
    }

    pub fn integer(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::Integer, Params::new())
    }

    pub fn long(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::Long, Params::new())
    }

    pub fn float(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::Float, Params::new())
    }

    pub fn double(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::Double, Params::new())
    }

    pub fn boolean(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::Boolean, Params::new())
    }

    pub fn date(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::Date, Params::new())
    }

    pub fn geo_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.field(name, FieldType::GeoPoint, Params::new())
    }

    pub fn completion(&mut self, name: impl Into<String>, params: Params) -> &mut Self {
        self.field(name, FieldType::Completion, params)
    }

    /// Nested field whose sub-fields are declared by `build`
    pub fn nested<F>(&mut self, name: impl Into<String>, build: F) -> &mut Self
    where
        F: FnOnce(&mut Mapping),
    {
        self.compound(name.into(), FieldType::Nested, build)
    }

    /// Object field whose sub-fields are declared by `build`
    pub fn object<F>(&mut self, name: impl Into<String>, build: F) -> &mut Self
    where
        F: FnOnce(&mut Mapping),
    {
        self.compound(name.into(), FieldType::Object, build)
    }

    fn compound<F>(&mut self, name: String, field_type: FieldType, build: F) -> &mut Self
    where
        F: FnOnce(&mut Mapping),
    {
        let mut properties = Mapping::new();
        build(&mut properties);
        self.insert(
            name,
            FieldMapping {
                field_type,
                params: Params::new(),
                properties: Some(properties),
            },
        )
    }

    fn insert(&mut self, name: String, field: FieldMapping) -> &mut Self {
        self.fields.retain(|(existing, _)| *existing != name);
        self.fields.push((name, field));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `{"properties": {...}}` body of a put-mapping request
    pub fn to_dsl(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, field)| {
                let mut body = field.params.clone();
                body.insert("type".to_string(), json!(field.field_type.as_ref()));
                if let Some(properties) = &field.properties {
                    if let Some(inner) = properties.to_dsl().get("properties") {
                        body.insert("properties".to_string(), inner.clone());
                    }
                }
                (name.clone(), Value::Object(body))
            })
            .collect();
        json!({ "properties": properties })
    }
}
