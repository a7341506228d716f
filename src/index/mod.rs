//! Index lifecycle: reset, mapping and bulk reindexing

pub mod mapping;

pub use mapping::{FieldType, Mapping};

use crate::client::SearchClient;
use crate::config::Config;
use crate::error::Result;
use crate::model::{Document, Searchable, SUGGEST_FIELD};
use crate::search::clause::Params;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Documents per bulk request when reindexing
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Field mapping every searchable kind starts from
pub fn default_field_mapping() -> Mapping {
    let mut params = Params::new();
    params.insert("analyzer".to_string(), json!("simple"));
    params.insert("search_analyzer".to_string(), json!("simple"));

    let mut mapping = Mapping::new();
    mapping.completion(SUGGEST_FIELD, params);
    mapping
}

/// Creates, drops and fills indices
pub struct IndexManager {
    client: Arc<dyn SearchClient>,
    config: Arc<Config>,
    chunk_size: usize,
}

impl IndexManager {
    pub fn new(client: Arc<dyn SearchClient>, config: Arc<Config>) -> Self {
        Self {
            client,
            config,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Index settings applied on creation: string fields are indexed both
    /// whole and analyzed
    pub fn default_mapping(&self) -> Value {
        if self.config.uses_mapping_types() {
            json!({
                "mappings": {
                    "_default_": {
                        "dynamic_templates": [{
                            "strings": {
                                "match": "*",
                                "match_mapping_type": "string",
                                "mapping": {
                                    "type": "text",
                                    "fields": {
                                        "{name}": {
                                            "include_in_all": true,
                                            "index": "not_analyzed",
                                            "type": "string"
                                        },
                                        "analyzed": {
                                            "index": "analyzed",
                                            "type": "string"
                                        }
                                    }
                                }
                            }
                        }]
                    }
                }
            })
        } else {
            json!({
                "mappings": {
                    "dynamic_templates": [{
                        "strings": {
                            "match": "*",
                            "match_mapping_type": "string",
                            "mapping": {
                                "type": "text",
                                "fields": {
                                    "raw": {"type": "keyword"}
                                }
                            }
                        }
                    }]
                }
            })
        }
    }

    pub async fn exists(&self, index: &str) -> Result<bool> {
        self.client.indices_exists(index).await
    }

    /// Create an index with the default mapping
    pub async fn create(&self, index: &str) -> Result<Value> {
        info!(index = %index, "Creating index");
        self.client.indices_create(index, &self.default_mapping()).await
    }

    /// Drop an index; a missing index is not an error
    pub async fn delete(&self, index: &str) -> Result<()> {
        match self.client.indices_delete(index).await {
            Ok(_) => {
                info!(index = %index, "Index deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(index = %index, "Index did not exist");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Drop the index if present, then create it again
    pub async fn recreate(&self, index: &str) -> Result<Value> {
        if self.exists(index).await? {
            self.delete(index).await?;
        }
        self.create(index).await
    }

    /// Put a field mapping for a document type
    pub async fn put_mapping(&self, index: &str, doc_type: &str, mapping: &Mapping) -> Result<Value> {
        debug!(index = %index, doc_type = %doc_type, "Putting mapping");
        self.client.put_mapping(index, doc_type, &mapping.to_dsl()).await
    }

    /// Put the entity kind's field mapping into its index
    pub async fn run_mapping<M: Searchable>(&self, model: &M) -> Result<Value> {
        self.put_mapping(&model.document_index(), &model.document_type(), &model.mapping())
            .await
    }

    /// Recreate the entity kind's index and apply its mapping
    pub async fn reset_index<M: Searchable>(&self, model: &M) -> Result<()> {
        let index = model.document_index();
        self.recreate(&index).await?;
        self.run_mapping(model).await?;
        info!(index = %index, doc_type = %model.document_type(), "Index reset");
        Ok(())
    }

    /// Bulk-index every entity, `chunk_size` documents per request.
    /// Returns the number of bulk requests sent.
    pub async fn reindex_all<M: Searchable>(&self, models: &[M]) -> Result<usize> {
        let document: Document<'_, M> = Document::new(self.client.clone());
        let mut requests = 0;
        for chunk in models.chunks(self.chunk_size) {
            document.bulk_save(chunk).await?;
            requests += 1;
        }
        info!(documents = models.len(), requests, "Reindex complete");
        Ok(requests)
    }
}
