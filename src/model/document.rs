use crate::client::{BulkAction, SearchClient};
use crate::error::{Error, Result};
use crate::model::Searchable;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Pushes a searchable entity's document to the engine
pub struct Document<'a, M> {
    client: Arc<dyn SearchClient>,
    model: Option<&'a M>,
}

impl<'a, M> Document<'a, M>
where
    M: Searchable,
{
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self {
            client,
            model: None,
        }
    }

    /// Bind the entity single-document operations act on
    pub fn model(mut self, model: &'a M) -> Self {
        self.model = Some(model);
        self
    }

    pub fn get_model(&self) -> Option<&'a M> {
        self.model
    }

    fn bound(&self) -> Result<&'a M> {
        self.model
            .ok_or_else(|| Error::MissingArgument("you should set the model first".to_string()))
    }

    fn persisted(&self) -> Result<&'a M> {
        let model = self.bound()?;
        if !model.is_persisted() {
            return Err(Error::NotPersisted(format!(
                "{} {}",
                model.document_type(),
                model.primary_key()
            )));
        }
        Ok(model)
    }

    /// Index the full document
    pub async fn save(&self) -> Result<Value> {
        let model = self.persisted()?;
        let target = model.document_ref();
        debug!(index = %target.index, id = %target.id, "Indexing document");
        self.client
            .index(&target, &Value::Object(model.document_data()))
            .await
    }

    /// Partially update the document with the current fields
    pub async fn update(&self) -> Result<Value> {
        let model = self.persisted()?;
        let target = model.document_ref();
        debug!(index = %target.index, id = %target.id, "Updating document");
        self.client
            .update(&target, &Value::Object(model.document_data()))
            .await
    }

    /// Delete the document; `None` when there was nothing to delete
    pub async fn delete(&self) -> Result<Option<Value>> {
        let target = self.bound()?.document_ref();
        if !self.client.exists(&target).await? {
            debug!(index = %target.index, id = %target.id, "Document already absent");
            return Ok(None);
        }
        Ok(Some(self.client.delete(&target).await?))
    }

    /// Index many entities in one bulk request
    pub async fn bulk_save(&self, models: &[M]) -> Result<Value> {
        let actions: Vec<BulkAction> = models
            .iter()
            .map(|model| BulkAction::Index {
                target: model.document_ref(),
                source: Value::Object(model.document_data()),
            })
            .collect();
        self.send_bulk(actions).await
    }

    /// Delete many documents in one bulk request
    pub async fn bulk_delete(&self, models: &[M]) -> Result<Value> {
        let actions: Vec<BulkAction> = models
            .iter()
            .map(|model| BulkAction::Delete {
                target: model.document_ref(),
            })
            .collect();
        self.send_bulk(actions).await
    }

    async fn send_bulk(&self, actions: Vec<BulkAction>) -> Result<Value> {
        if actions.is_empty() {
            debug!("Empty bulk request skipped");
            return Ok(Value::Null);
        }
        info!(actions = actions.len(), "Sending bulk document request");
        self.client.bulk(&actions).await
    }
}
