//! Query DSL builder and result binding
//!
//! This module turns a keyword plus a structured attribute bundle into an
//! engine query document, runs it, and turns the ranked hits back into
//! application entities:
//!
//! - **Condition classification**: `null`, scalars, lists, ranges and `not`
//!   maps each map to one clause kind
//! - **Boolean assembly**: clauses attach to the bucket named by the current
//!   context (`must`, `should`, `must_not`, `filter`)
//! - **Fluent builder**: pagination, sorting, keyword matching, aggregations
//!   and every elementary clause constructor
//! - **Result binding**: hits are grouped by type, loaded once per kind and
//!   put back in rank order
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           SearchBuilder                          │
//! ├─────────────────────────────────────────────────┤
//! │  - pagination      - sort_by / aggregate        │
//! │  - where_* / query_*  (QueryComposer)           │
//! │  - to_dsl()  get()  total()  paginate()         │
//! └─────────────────────────────────────────────────┘
//!            │                          │
//!            ▼                          ▼
//! ┌──────────────────────┐   ┌──────────────────────┐
//! │  Assembler           │   │  ResultBinder        │
//! │  Condition / Clause  │   │  ModelRegistry       │
//! │  BoolQuery           │   │  Paginator           │
//! └──────────────────────┘   └──────────────────────┘
//!                                       │
//!                                       ▼
//!                            ┌──────────────────────┐
//!                            │  SearchClient        │
//!                            └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mysticquent::prelude::*;
//! use serde_json::json;
//!
//! # async fn run<E: Searchable + Clone>(registry: ModelRegistry<E>) -> mysticquent::Result<()> {
//! let connection = Connection::from_config(Config::load()?)?;
//! let attributes: SearchAttributes = serde_json::from_value(json!({
//!     "where": {"status": "published", "views": {"gte": 100}},
//!     "sort_by": {"created_at": "desc"},
//!     "per_page": 20
//! }))?;
//!
//! let mut search = connection.search("rust", &attributes)?;
//! search.where_not("author", "bot");
//!
//! let page = search.get(&registry).await?;
//! println!("{} of {} hits", page.len(), page.total());
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod binder;
pub mod bool_query;
pub mod builder;
pub mod clause;
pub mod composer;
pub mod condition;
pub mod paginator;
pub mod sort;
pub mod suggestion;

pub use aggregation::{Aggregation, AggregationBuilder};
pub use binder::ResultBinder;
pub use bool_query::{BoolContext, BoolQuery};
pub use builder::{RequestParams, SearchAttributes, SearchBuilder};
pub use clause::{BoundingBox, Clause, Params};
pub use composer::{params, Assembler, QueryComposer};
pub use condition::Condition;
pub use paginator::Paginator;
pub use sort::{FieldSort, SortOrder};
pub use suggestion::{SuggesterKind, Suggestion, SuggestionBuilder};
