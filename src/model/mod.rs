//! Indexable entities and their persistence collaborators

pub mod document;
pub mod memory;
pub mod registry;

pub use document::Document;
pub use memory::InMemoryLoader;
pub use registry::ModelRegistry;

use crate::client::DocumentRef;
use crate::error::Result;
use crate::index::{default_field_mapping, Mapping};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Document field holding completion suggester input
pub const SUGGEST_FIELD: &str = "_suggest";

/// Capability of an entity that can be indexed and searched
pub trait Searchable: Send + Sync {
    /// Identifier of the backing record, also used as the document id
    fn primary_key(&self) -> String;

    /// Backing table (or collection) name
    fn table_name(&self) -> String;

    /// Whether the backing record has been saved
    fn is_persisted(&self) -> bool {
        true
    }

    /// Raw document fields
    fn build_document(&self) -> Map<String, Value>;

    /// Mapping type of the document; the type's own name by default
    fn document_type(&self) -> String {
        let name = std::any::type_name::<Self>();
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name).to_string()
    }

    /// Index the document lives in: `{table}_{APP_ENV}`, or the table name
    /// when no environment is set
    fn document_index(&self) -> String {
        match std::env::var("APP_ENV") {
            Ok(env) if !env.is_empty() => format!("{}_{}", self.table_name(), env),
            _ => self.table_name(),
        }
    }

    /// Attributes feeding the completion suggester; `None` means every field
    fn suggester_attributes(&self) -> Option<Vec<String>> {
        None
    }

    /// Document body sent to the engine, including suggester input
    fn document_data(&self) -> Map<String, Value> {
        let mut document = self.build_document();
        let attributes = self
            .suggester_attributes()
            .unwrap_or_else(|| document.keys().cloned().collect());

        let mut input = Vec::new();
        for attribute in &attributes {
            match document.get(attribute) {
                Some(Value::String(text)) if has_letters(text) => input.push(json_string(text)),
                Some(Value::Array(items)) => input.extend(
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .filter(|text| has_letters(text))
                        .map(json_string),
                ),
                _ => {}
            }
        }

        document.insert(SUGGEST_FIELD.to_string(), Value::Array(input));
        document
    }

    /// Field mapping applied when the index is reset
    fn mapping(&self) -> Mapping {
        default_field_mapping()
    }

    /// Whether save/delete hooks push changes to the index
    fn should_sync_document(&self) -> bool {
        true
    }

    /// Address of this entity's document
    fn document_ref(&self) -> DocumentRef {
        DocumentRef::new(self.document_index(), self.document_type(), self.primary_key())
    }
}

fn has_letters(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

fn json_string(text: &str) -> Value {
    Value::String(text.to_string())
}

/// Loads entities of one kind from backing storage
#[async_trait]
pub trait EntityLoader<E>: Send + Sync {
    /// Fetch every entity whose key is in `ids`, eager-loading `with`.
    /// Missing ids are simply absent from the result.
    async fn find_many(&self, ids: &[String], with: &[String]) -> Result<Vec<E>>;

    /// Build an unsaved entity straight from indexed fields, skipping the
    /// usual write guards
    fn hydrate_unchecked(&self, source: Map<String, Value>) -> Result<E>;
}
