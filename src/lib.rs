//! Search-engine integration for application entities
//!
//! Entities implementing [`model::Searchable`] are indexed into a JSON/HTTP
//! search engine and queried back through a fluent builder that assembles the
//! engine's boolean query DSL and binds the ranked hits to typed entities.

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod index;
pub mod model;
pub mod search;

pub use error::{Error, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::client::{HttpClient, SearchClient, SearchResponse};
    pub use crate::config::Config;
    pub use crate::connection::Connection;
    pub use crate::error::{Error, Result};
    pub use crate::index::{IndexManager, Mapping};
    pub use crate::model::{Document, EntityLoader, InMemoryLoader, ModelRegistry, Searchable};
    pub use crate::search::{
        BoolContext, Paginator, QueryComposer, SearchAttributes, SearchBuilder, SortOrder,
        SuggestionBuilder,
    };
}
