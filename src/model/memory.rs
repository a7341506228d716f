use crate::error::Result;
use crate::model::{EntityLoader, Searchable};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory entity loader (for tooling and testing)
#[derive(Clone)]
pub struct InMemoryLoader<E> {
    entities: Arc<DashMap<String, E>>,
    fetches: Arc<AtomicUsize>,
}

impl<E> InMemoryLoader<E>
where
    E: Searchable + Clone,
{
    pub fn new() -> Self {
        Self {
            entities: Arc::new(DashMap::new()),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Store (or replace) an entity under its primary key
    pub fn insert(&self, entity: E) {
        let key = entity.primary_key();
        self.entities.insert(key.clone(), entity);
        tracing::debug!(primary_key = %key, "Entity stored");
    }

    pub fn remove(&self, key: &str) -> Option<E> {
        self.entities.remove(key).map(|(_, entity)| entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every stored entity, ordered by primary key
    pub fn all(&self) -> Vec<E> {
        let mut entities: Vec<(String, E)> = self
            .entities
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entities.sort_by(|a, b| a.0.cmp(&b.0));
        entities.into_iter().map(|(_, entity)| entity).collect()
    }

    /// Number of `find_many` calls served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl<E> Default for InMemoryLoader<E>
where
    E: Searchable + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E> EntityLoader<E> for InMemoryLoader<E>
where
    E: Searchable + Clone + DeserializeOwned + 'static,
{
    async fn find_many(&self, ids: &[String], _with: &[String]) -> Result<Vec<E>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .filter_map(|id| self.entities.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    fn hydrate_unchecked(&self, source: Map<String, Value>) -> Result<E> {
        Ok(serde_json::from_value(Value::Object(source))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Tag {
        #[serde(default)]
        id: String,
        name: String,
    }

    impl Searchable for Tag {
        fn primary_key(&self) -> String {
            self.id.clone()
        }

        fn table_name(&self) -> String {
            "tags".to_string()
        }

        fn build_document(&self) -> Map<String, Value> {
            let mut doc = Map::new();
            doc.insert("name".to_string(), json!(self.name));
            doc
        }
    }

    #[tokio::test]
    async fn test_find_many_skips_missing_ids() {
        let loader = InMemoryLoader::new();
        loader.insert(Tag {
            id: "1".to_string(),
            name: "rust".to_string(),
        });

        let found = loader
            .find_many(&["1".to_string(), "2".to_string()], &[])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(loader.fetch_count(), 1);
    }

    #[test]
    fn test_hydrate_from_source() {
        let loader: InMemoryLoader<Tag> = InMemoryLoader::new();
        let source = json!({"name": "search"}).as_object().cloned().unwrap();
        let tag = loader.hydrate_unchecked(source).unwrap();
        assert_eq!(tag.name, "search");
        assert!(tag.id.is_empty());
    }
}
