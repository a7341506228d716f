//! Paginated search results

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{Map, Value};

/// Bound entities of one page plus the metadata of the whole result
#[derive(Debug, Clone, PartialEq)]
pub struct Paginator<E> {
    items: Vec<E>,
    total: u64,
    per_page: u64,
    current_page: u64,
    aggregations: Map<String, Value>,
}

impl<E> Paginator<E> {
    pub fn new(
        items: Vec<E>,
        total: u64,
        per_page: u64,
        current_page: u64,
        aggregations: Map<String, Value>,
    ) -> Self {
        Self {
            items,
            total,
            per_page,
            current_page: current_page.max(1),
            aggregations,
        }
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn into_items(self) -> Vec<E> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hits matching the query across all pages
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    pub fn on_first_page(&self) -> bool {
        self.current_page <= 1
    }

    /// 1-based rank of the first item on this page
    pub fn first_item(&self) -> Option<u64> {
        if self.items.is_empty() {
            return None;
        }
        Some(
            (self.current_page - 1)
                .saturating_mul(self.per_page)
                .saturating_add(1),
        )
    }

    /// 1-based rank of the last item on this page
    pub fn last_item(&self) -> Option<u64> {
        self.first_item()
            .map(|first| first.saturating_add(self.items.len() as u64 - 1))
    }

    /// Aggregation payload as returned by the engine
    pub fn aggregations(&self) -> &Map<String, Value> {
        &self.aggregations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.items.iter()
    }
}

impl<E> IntoIterator for Paginator<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<E: Serialize> Serialize for Paginator<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Paginator", 8)?;
        state.serialize_field("current_page", &self.current_page)?;
        state.serialize_field("data", &self.items)?;
        state.serialize_field("from", &self.first_item())?;
        state.serialize_field("last_page", &self.last_page())?;
        state.serialize_field("per_page", &self.per_page)?;
        state.serialize_field("to", &self.last_item())?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("aggregations", &self.aggregations)?;
        state.end()
    }
}
