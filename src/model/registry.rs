use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::EntityLoader;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps hit discriminators to entity kinds and entity kinds to loaders.
///
/// Populated once at start-up and shared read-only afterwards.
pub struct ModelRegistry<E> {
    type_map: HashMap<String, String>,
    loaders: HashMap<String, Arc<dyn EntityLoader<E>>>,
}

impl<E> ModelRegistry<E> {
    pub fn new() -> Self {
        Self {
            type_map: HashMap::new(),
            loaders: HashMap::new(),
        }
    }

    /// Registry seeded with the configured discriminator mappings
    pub fn from_config(config: &Config) -> Self {
        Self {
            type_map: config.mappings.clone(),
            loaders: HashMap::new(),
        }
    }

    /// Route a discriminator to an entity kind
    pub fn map_type(&mut self, discriminator: impl Into<String>, kind: impl Into<String>) -> &mut Self {
        self.type_map.insert(discriminator.into(), kind.into());
        self
    }

    /// Register the loader serving an entity kind
    pub fn register<L>(&mut self, kind: impl Into<String>, loader: L) -> &mut Self
    where
        L: EntityLoader<E> + 'static,
    {
        self.loaders.insert(kind.into(), Arc::new(loader));
        self
    }

    pub fn register_shared(&mut self, kind: impl Into<String>, loader: Arc<dyn EntityLoader<E>>) -> &mut Self {
        self.loaders.insert(kind.into(), loader);
        self
    }

    /// Entity kind for a discriminator; unmapped discriminators are their own kind
    pub fn resolve<'a>(&'a self, discriminator: &'a str) -> &'a str {
        self.type_map
            .get(discriminator)
            .map(String::as_str)
            .unwrap_or(discriminator)
    }

    /// Loader for an entity kind
    pub fn loader(&self, kind: &str) -> Result<Arc<dyn EntityLoader<E>>> {
        self.loaders
            .get(kind)
            .cloned()
            .ok_or_else(|| Error::UnregisteredKind(kind.to_string()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.loaders.keys().map(String::as_str)
    }
}

impl<E> Default for ModelRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    struct NoopLoader;

    #[async_trait]
    impl EntityLoader<String> for NoopLoader {
        async fn find_many(&self, _ids: &[String], _with: &[String]) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn hydrate_unchecked(&self, _source: Map<String, Value>) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_resolve_falls_back_to_discriminator() {
        let mut config = Config::default();
        config.mappings.insert("posts".to_string(), "Post".to_string());

        let registry: ModelRegistry<String> = ModelRegistry::from_config(&config);
        assert_eq!(registry.resolve("posts"), "Post");
        assert_eq!(registry.resolve("Comment"), "Comment");
    }

    #[test]
    fn test_missing_loader_is_reported() {
        let mut registry = ModelRegistry::new();
        registry.map_type("posts", "Post").register("Post", NoopLoader);

        assert!(registry.loader("Post").is_ok());
        assert!(matches!(
            registry.loader("Comment"),
            Err(Error::UnregisteredKind(kind)) if kind == "Comment"
        ));
        assert_eq!(registry.kinds().count(), 1);
    }
}
