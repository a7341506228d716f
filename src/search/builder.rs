//! Fluent search builder

use crate::client::SearchResponse;
use crate::connection::Connection;
use crate::error::Result;
use crate::model::{ModelRegistry, Searchable};
use crate::search::aggregation::AggregationBuilder;
use crate::search::binder::ResultBinder;
use crate::search::clause::{Clause, Params};
use crate::search::composer::{Assembler, QueryComposer};
use crate::search::paginator::Paginator;
use crate::search::sort::{parse_sort_attribute, FieldSort, SortOrder};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Keyword matching every document
pub const MATCH_EVERYTHING: &str = "*";

/// Construction attributes of a search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchAttributes {
    /// Non-scored conditions, `{field: value}` plus `or`/`not` groups
    #[serde(rename = "where", default)]
    pub filters: Value,

    /// Scored conditions, same shape as `filters`
    #[serde(default)]
    pub query: Value,

    #[serde(default)]
    pub sort_by: Value,

    /// Fields the keyword is matched against
    #[serde(default, deserialize_with = "one_or_many")]
    pub fields: Vec<String>,

    /// Relations eager-loaded with the bound entities
    #[serde(default, deserialize_with = "one_or_many")]
    pub with: Vec<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub index: Vec<String>,

    #[serde(default)]
    pub page: Option<u64>,

    #[serde(default)]
    pub per_page: Option<u64>,

    #[serde(default)]
    pub offset: Option<u64>,

    #[serde(default)]
    pub limit: Option<u64>,
}

/// Pagination values taken from the incoming request, used when the
/// attributes leave them out
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RequestParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// Builds one search request and turns its response into entities
pub struct SearchBuilder {
    connection: Connection,
    keyword: String,
    assembler: Assembler,
    sorts: Vec<FieldSort>,
    aggregations: AggregationBuilder,
    from: Option<u64>,
    size: Option<u64>,
    min_score: Option<f64>,
    offset: u64,
    limit: u64,
    with: Vec<String>,
    index: Vec<String>,
}

impl SearchBuilder {
    /// Builder with no conditions against the configured default index
    pub fn new(connection: Connection) -> Self {
        let per_page = connection.config().pagination.per_page;
        let index = vec![connection.default_index().to_string()];
        Self {
            connection,
            keyword: MATCH_EVERYTHING.to_string(),
            assembler: Assembler::new(),
            sorts: Vec::new(),
            aggregations: AggregationBuilder::new(),
            from: None,
            size: None,
            min_score: None,
            offset: 0,
            limit: per_page,
            with: Vec::new(),
            index,
        }
    }

    /// Builder for a keyword and attribute bundle.
    ///
    /// Malformed `where`/`query`/`sort_by` attributes are rejected here,
    /// before any request is made.
    pub fn from_attributes(
        connection: Connection,
        keyword: &str,
        attributes: &SearchAttributes,
    ) -> Result<Self> {
        Self::with_request(connection, keyword, attributes, &RequestParams::default())
    }

    /// Like [`SearchBuilder::from_attributes`], falling back to request
    /// parameters for pagination
    pub fn with_request(
        connection: Connection,
        keyword: &str,
        attributes: &SearchAttributes,
        request: &RequestParams,
    ) -> Result<Self> {
        let mut builder = Self::new(connection);
        builder.keyword = if keyword.is_empty() {
            MATCH_EVERYTHING.to_string()
        } else {
            keyword.to_string()
        };
        builder.set_pagination(attributes, request);
        builder.add_filters(&attributes.filters)?;
        builder.add_queries(&attributes.query)?;
        builder.sorts.extend(parse_sort_attribute(&attributes.sort_by)?);
        builder.set_search_fields(&attributes.fields);
        builder.with = attributes.with.clone();
        if !attributes.index.is_empty() {
            builder.index = attributes.index.clone();
        }
        Ok(builder)
    }

    fn set_pagination(&mut self, attributes: &SearchAttributes, request: &RequestParams) {
        let default_per_page = self.connection.config().pagination.per_page;
        let page = attributes.page.or(request.page).unwrap_or(1);
        let per_page = attributes
            .per_page
            .or(request.per_page)
            .unwrap_or(default_per_page);
        let offset = attributes
            .offset
            .or(request.offset)
            .unwrap_or_else(|| per_page.saturating_mul(page.saturating_sub(1)));
        let limit = attributes.limit.or(request.limit).unwrap_or(per_page);

        self.set_offset(offset);
        self.set_limit(limit);
    }

    /// Add the keyword clause, matched against `fields` minus `*_id` fields
    fn set_search_fields(&mut self, fields: &[String]) {
        if self.keyword.is_empty() || self.keyword == MATCH_EVERYTHING {
            return;
        }

        let fields: Vec<String> = fields
            .iter()
            .filter(|field| !field.ends_with("_id"))
            .cloned()
            .collect();

        let mut params = Params::new();
        params.insert("fuzziness".to_string(), json!("AUTO"));
        let query = Value::String(self.keyword.clone());
        let clause = if fields.is_empty() {
            Clause::Match {
                field: "_all".to_string(),
                query,
                params,
            }
        } else {
            Clause::MultiMatch {
                fields,
                query,
                params,
            }
        };

        self.must().append(clause);
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.offset = offset;
        self
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Current page, derived from offset and limit
    pub fn page(&self) -> u64 {
        if self.limit == 0 {
            return self.offset.saturating_add(1);
        }
        self.offset / self.limit + 1
    }

    /// Move to `page`; zero is ignored
    pub fn set_page(&mut self, page: u64) -> &mut Self {
        if page > 0 {
            self.offset = (page - 1).saturating_mul(self.limit);
        }
        self
    }

    pub fn per_page(&self) -> u64 {
        self.limit
    }

    /// Change the page size, staying on the current page; zero is ignored
    pub fn set_per_page(&mut self, per_page: u64) -> &mut Self {
        if per_page > 0 {
            let page = self.page();
            self.limit = per_page;
            self.offset = (page - 1).saturating_mul(self.limit);
        }
        self
    }

    pub fn with(&self) -> &[String] {
        &self.with
    }

    pub fn set_with(&mut self, with: Vec<String>) -> &mut Self {
        self.with = with;
        self
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn set_index(&mut self, index: Vec<String>) -> &mut Self {
        self.index = index;
        self
    }

    /// Search the index the entity lives in
    pub fn set_model<M: Searchable>(&mut self, model: &M) -> &mut Self {
        let index = model.document_index();
        if !index.is_empty() {
            self.index = vec![index];
        }
        self
    }

    /// Raw `from` of the request
    pub fn from(&mut self, from: u64) -> &mut Self {
        self.from = Some(from);
        self
    }

    /// Raw `size` of the request
    pub fn size(&mut self, size: u64) -> &mut Self {
        self.size = Some(size);
        self
    }

    pub fn sort_by(&mut self, field: impl Into<String>, order: Option<SortOrder>, params: Params) -> &mut Self {
        self.sorts.push(FieldSort::new(field, order).with_params(params));
        self
    }

    pub fn min_score(&mut self, score: f64) -> &mut Self {
        self.min_score = Some(score);
        self
    }

    /// Add aggregations through `build`
    pub fn aggregate<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut AggregationBuilder),
    {
        build(&mut self.aggregations);
        self
    }

    /// Request body for the engine
    pub fn to_dsl(&self) -> Value {
        let mut body = Map::new();

        let root = self.assembler.to_bool_query();
        if !root.is_empty() {
            body.insert("query".to_string(), root.to_dsl());
        }
        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }
        if let Some(size) = self.size {
            body.insert("size".to_string(), json!(size));
        }
        if !self.sorts.is_empty() {
            body.insert(
                "sort".to_string(),
                Value::Array(self.sorts.iter().map(FieldSort::to_dsl).collect()),
            );
        }
        if let Some(min_score) = self.min_score {
            body.insert("min_score".to_string(), json!(min_score));
        }
        if !self.aggregations.is_empty() {
            body.insert("aggregations".to_string(), self.aggregations.to_dsl());
        }

        Value::Object(body)
    }

    /// Run the request as built
    pub async fn get_raw(&self) -> Result<SearchResponse> {
        let body = self.to_dsl();
        debug!(index = ?self.index, dsl = %body, "Executing search");
        self.connection.client().search(&self.index, &body).await
    }

    /// Run the current page
    async fn execute(&mut self) -> Result<SearchResponse> {
        let (offset, limit) = (self.offset, self.limit);
        self.from(offset).size(limit);
        self.get_raw().await
    }

    /// Run the current page and bind the hits to entities
    pub async fn get<E>(&mut self, registry: &ModelRegistry<E>) -> Result<Paginator<E>>
    where
        E: Searchable + Clone,
    {
        let response = self.execute().await?;
        let items = ResultBinder::new(registry, &self.with)
            .bind(&response.hits.hits)
            .await?;

        Ok(Paginator::new(
            items,
            response.total(),
            self.limit,
            self.page(),
            response.aggregations,
        ))
    }

    /// Total hit count of the query
    pub async fn total(&mut self) -> Result<u64> {
        Ok(self.execute().await?.total())
    }

    /// Set page size and page (current page when `None`), then `get`
    pub async fn paginate<E>(
        &mut self,
        registry: &ModelRegistry<E>,
        limit: u64,
        page: Option<u64>,
    ) -> Result<Paginator<E>>
    where
        E: Searchable + Clone,
    {
        let page = page.unwrap_or_else(|| self.page());
        self.set_limit(limit);
        self.set_page(page);
        self.get(registry).await
    }

    /// Aggregation section of the response
    pub async fn get_aggregations(&self) -> Result<Map<String, Value>> {
        Ok(self.get_raw().await?.aggregations)
    }
}

impl QueryComposer for SearchBuilder {
    fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    fn assembler_mut(&mut self) -> &mut Assembler {
        &mut self.assembler
    }
}

impl std::fmt::Debug for SearchBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchBuilder")
            .field("keyword", &self.keyword)
            .field("index", &self.index)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("bool_state", &self.assembler.context())
            .finish()
    }
}
