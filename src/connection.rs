//! Entry point handed to application code

use crate::client::{HttpClient, SearchClient};
use crate::config::Config;
use crate::error::Result;
use crate::index::IndexManager;
use crate::model::{Document, Searchable};
use crate::search::{RequestParams, SearchAttributes, SearchBuilder, SuggestionBuilder};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Engine client plus configuration, shared by every builder it creates
#[derive(Clone)]
pub struct Connection {
    client: Arc<dyn SearchClient>,
    config: Arc<Config>,
}

impl Connection {
    pub fn new(client: Arc<dyn SearchClient>, config: Config) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Connection over HTTP to the first configured host
    pub fn from_config(config: Config) -> Result<Self> {
        let client = HttpClient::new(&config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn client(&self) -> &Arc<dyn SearchClient> {
        &self.client
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Index searched when nothing more specific is given
    pub fn default_index(&self) -> &str {
        &self.config.index
    }

    /// Start a search for `keyword`
    pub fn search(&self, keyword: &str, attributes: &SearchAttributes) -> Result<SearchBuilder> {
        SearchBuilder::from_attributes(self.clone(), keyword, attributes)
    }

    /// Start a search, taking pagination from request parameters where the
    /// attributes are silent
    pub fn search_with_request(
        &self,
        keyword: &str,
        attributes: &SearchAttributes,
        request: &RequestParams,
    ) -> Result<SearchBuilder> {
        SearchBuilder::with_request(self.clone(), keyword, attributes, request)
    }

    /// Search the index of `model`'s kind
    pub fn search_model<M: Searchable>(
        &self,
        model: &M,
        keyword: &str,
        attributes: &SearchAttributes,
    ) -> Result<SearchBuilder> {
        let mut builder = self.search(keyword, attributes)?;
        if attributes.index.is_empty() {
            builder.set_model(model);
        }
        Ok(builder)
    }

    pub fn suggest(&self) -> SuggestionBuilder {
        SuggestionBuilder::new(self.clone())
    }

    pub fn document<'a, M: Searchable>(&self) -> Document<'a, M> {
        Document::new(self.client.clone())
    }

    pub fn indices(&self) -> IndexManager {
        IndexManager::new(self.client.clone(), self.config.clone())
    }

    /// Save hook: push the entity's document when it syncs
    pub async fn saved<M: Searchable>(&self, model: &M) -> Result<Option<Value>> {
        if !model.should_sync_document() {
            debug!(id = %model.primary_key(), "Document sync disabled, skipping save");
            return Ok(None);
        }
        Ok(Some(self.document().model(model).save().await?))
    }

    /// Delete hook: remove the entity's document when it syncs
    pub async fn deleted<M: Searchable>(&self, model: &M) -> Result<Option<Value>> {
        if !model.should_sync_document() {
            debug!(id = %model.primary_key(), "Document sync disabled, skipping delete");
            return Ok(None);
        }
        self.document().model(model).delete().await
    }

    /// Index the entity's document regardless of its sync setting
    pub async fn reindex<M: Searchable>(&self, model: &M) -> Result<Value> {
        self.document().model(model).save().await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("index", &self.config.index)
            .field("hosts", &self.config.connection.hosts)
            .finish()
    }
}
