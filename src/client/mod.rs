//! Engine client seam
//!
//! Everything that crosses the network goes through [`SearchClient`]. The
//! query builders only produce JSON documents and consume [`SearchResponse`];
//! retries, pooling and topology are left to the implementation.

pub mod http;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use http::HttpClient;

/// Address of a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub index: String,
    pub doc_type: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            index: index.into(),
            doc_type: doc_type.into(),
            id: id.into(),
        }
    }
}

/// One entry of a bulk request
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    Index { target: DocumentRef, source: Value },
    Delete { target: DocumentRef },
}

impl BulkAction {
    pub fn target(&self) -> &DocumentRef {
        match self {
            BulkAction::Index { target, .. } | BulkAction::Delete { target } => target,
        }
    }
}

/// Reported hit count; 7.x engines wrap it in an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HitsTotal {
    Count(u64),
    Tracked { value: u64, relation: Option<TotalRelation> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    Eq,
    Gte,
}

impl HitsTotal {
    pub fn value(&self) -> u64 {
        match self {
            HitsTotal::Count(value) | HitsTotal::Tracked { value, .. } => *value,
        }
    }
}

impl Default for HitsTotal {
    fn default() -> Self {
        HitsTotal::Count(0)
    }
}

/// A single ranked hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default)]
    pub index: String,

    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_score", default)]
    pub score: Option<f64>,

    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl Hit {
    /// Type tag identifying which entity kind the hit represents.
    ///
    /// Typeless engines report `_doc` (or nothing); the index name is used then.
    pub fn discriminator(&self) -> &str {
        match self.doc_type.as_deref() {
            Some(doc_type) if !doc_type.is_empty() && doc_type != "_doc" => doc_type,
            _ => &self.index,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: HitsTotal,

    #[serde(default)]
    pub max_score: Option<f64>,

    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// Body of a search response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub took: u64,

    #[serde(default)]
    pub timed_out: bool,

    #[serde(default)]
    pub hits: Hits,

    #[serde(default)]
    pub aggregations: Map<String, Value>,
}

impl SearchResponse {
    pub fn total(&self) -> u64 {
        self.hits.total.value()
    }
}

/// Operations consumed from the search engine
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a query document against the given indices
    async fn search(&self, indices: &[String], body: &Value) -> Result<SearchResponse>;

    /// Run a suggest section, returning the engine's `suggest` payload
    async fn suggest(&self, indices: &[String], body: &Value) -> Result<Value>;

    /// Index (create or replace) a document
    async fn index(&self, target: &DocumentRef, body: &Value) -> Result<Value>;

    /// Partially update a document
    async fn update(&self, target: &DocumentRef, partial: &Value) -> Result<Value>;

    /// Delete a document
    async fn delete(&self, target: &DocumentRef) -> Result<Value>;

    /// Check whether a document exists
    async fn exists(&self, target: &DocumentRef) -> Result<bool>;

    /// Execute a batch of index/delete actions
    async fn bulk(&self, actions: &[BulkAction]) -> Result<Value>;

    async fn indices_exists(&self, index: &str) -> Result<bool>;

    async fn indices_create(&self, index: &str, body: &Value) -> Result<Value>;

    async fn indices_delete(&self, index: &str) -> Result<Value>;

    async fn put_mapping(&self, index: &str, doc_type: &str, body: &Value) -> Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_and_tracked_totals() {
        let legacy: SearchResponse =
            serde_json::from_value(json!({"hits": {"total": 12, "hits": []}})).unwrap();
        assert_eq!(legacy.total(), 12);

        let tracked: SearchResponse = serde_json::from_value(
            json!({"hits": {"total": {"value": 10000, "relation": "gte"}, "hits": []}}),
        )
        .unwrap();
        assert_eq!(tracked.total(), 10000);
    }

    #[test]
    fn test_missing_sections_default() {
        let empty: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.total(), 0);
        assert!(empty.hits.hits.is_empty());
        assert!(empty.aggregations.is_empty());
    }

    #[test]
    fn test_hit_discriminator() {
        let typed: Hit = serde_json::from_value(
            json!({"_index": "blog", "_type": "posts", "_id": "1", "_source": {}}),
        )
        .unwrap();
        assert_eq!(typed.discriminator(), "posts");

        let typeless: Hit =
            serde_json::from_value(json!({"_index": "comments", "_type": "_doc", "_id": "2"}))
                .unwrap();
        assert_eq!(typeless.discriminator(), "comments");

        let untyped: Hit = serde_json::from_value(json!({"_index": "users", "_id": "3"})).unwrap();
        assert_eq!(untyped.discriminator(), "users");
        assert!(untyped.source.is_empty());
    }
}
