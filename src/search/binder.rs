//! Hit-to-entity binding

use crate::client::Hit;
use crate::error::Result;
use crate::model::{ModelRegistry, Searchable};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Position given to entities whose hit was never recorded
const UNRANKED: usize = usize::MAX;

/// Turns a ranked, type-tagged hit list back into entities.
///
/// One fetch is issued per distinct entity kind. The output holds one
/// entity per hit, in hit order; hits without a backing record become
/// stub entities hydrated from their source fields.
pub struct ResultBinder<'a, E> {
    registry: &'a ModelRegistry<E>,
    with: &'a [String],
}

impl<'a, E> ResultBinder<'a, E>
where
    E: Searchable + Clone,
{
    pub fn new(registry: &'a ModelRegistry<E>, with: &'a [String]) -> Self {
        Self { registry, with }
    }

    pub async fn bind(&self, hits: &[Hit]) -> Result<Vec<E>> {
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(hits.len());
        let mut buckets: IndexMap<&str, Vec<&Hit>> = IndexMap::new();

        for (position, hit) in hits.iter().enumerate() {
            let discriminator = hit.discriminator();
            let kind = self.registry.resolve(discriminator);
            positions.insert(position_key(kind, &hit.id), position);
            buckets.entry(discriminator).or_default().push(hit);
        }

        let mut ranked: Vec<(usize, E)> = Vec::with_capacity(hits.len());
        for (discriminator, bucket) in buckets {
            let kind = self.registry.resolve(discriminator);
            let loader = self.registry.loader(kind)?;

            let ids: IndexSet<String> = bucket.iter().map(|hit| hit.id.clone()).collect();
            let ids: Vec<String> = ids.into_iter().collect();
            debug!(kind = %kind, ids = ids.len(), with = ?self.with, "Loading entities for hits");

            let loaded: HashMap<String, E> = loader
                .find_many(&ids, self.with)
                .await?
                .into_iter()
                .map(|entity| (entity.primary_key(), entity))
                .collect();

            for hit in bucket {
                let (key, entity) = match loaded.get(&hit.id) {
                    Some(entity) => (position_key(kind, &entity.primary_key()), entity.clone()),
                    None => {
                        warn!(kind = %kind, id = %hit.id, "No backing record for hit, using indexed fields");
                        (
                            position_key(kind, &hit.id),
                            loader.hydrate_unchecked(hit.source.clone())?,
                        )
                    }
                };
                let position = positions.get(&key).copied().unwrap_or(UNRANKED);
                ranked.push((position, entity));
            }
        }

        ranked.sort_by_key(|(position, _)| *position);
        Ok(ranked.into_iter().map(|(_, entity)| entity).collect())
    }
}

fn position_key(kind: &str, id: &str) -> String {
    format!("{}:{}", kind, id)
}
