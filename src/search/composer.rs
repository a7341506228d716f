//! Boolean query assembly and the fluent clause constructors
//!
//! Two trees are kept side by side. Query-style calls (`term`, `match_`,
//! `query*`) land in the scored tree; filter-style calls (`where*`) land in a
//! filter tree that is attached to the root `filter` bucket when rendered, so
//! those conditions include or exclude documents without touching the score.
//! Both trees share one current [`BoolContext`].

use crate::error::{Error, Result};
use crate::search::bool_query::{BoolContext, BoolQuery};
use crate::search::clause::{BoundingBox, Clause, Params};
use crate::search::condition::{expect_field_map, Condition};
use serde_json::{json, Value};

/// Which tree a condition is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Filter,
    Query,
}

/// Mutable query tree plus the current boolean context.
///
/// Every builder owns one; `nested` hands a fresh one to its closure, so
/// contexts never leak between nesting levels.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    query: BoolQuery,
    filter: BoolQuery,
    context: BoolContext,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> BoolContext {
        self.context
    }

    pub fn set_context(&mut self, context: BoolContext) {
        self.context = context;
    }

    /// Scored clauses
    pub fn query_tree(&self) -> &BoolQuery {
        &self.query
    }

    /// Non-scored clauses added through the `where*` family
    pub fn filter_tree(&self) -> &BoolQuery {
        &self.filter
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.filter.is_empty()
    }

    /// Append to the scored tree under the current context
    pub fn push(&mut self, clause: Clause) {
        self.query.add(clause, self.context);
    }

    /// Append to the filter tree under the current context
    pub fn push_filter(&mut self, clause: Clause) {
        self.filter.add(clause, self.context);
    }

    /// Single tree combining both halves
    pub fn to_bool_query(&self) -> BoolQuery {
        let mut root = self.query.clone();
        if !self.filter.is_empty() {
            root.add(Clause::Bool(self.filter.clone()), BoolContext::Filter);
        }
        root
    }

    fn attach(&mut self, style: Style, clause: Clause) {
        match style {
            Style::Filter => self.push_filter(clause),
            Style::Query => self.push(clause),
        }
    }

    fn add_condition(&mut self, style: Style, field: &str, value: &Value, params: &Params) {
        let clause = match Condition::classify(value) {
            Condition::Exists => Clause::Exists {
                field: field.to_string(),
            },
            Condition::Term(value) => Clause::Term {
                field: field.to_string(),
                value,
                params: params.clone(),
            },
            Condition::Terms(values) => Clause::Terms {
                field: field.to_string(),
                values,
                params: params.clone(),
            },
            Condition::Range(bounds) => Clause::Range {
                field: field.to_string(),
                bounds,
            },
            Condition::Not(inner) => {
                self.context = self.context.negated();
                return self.add_condition(style, field, &inner, params);
            }
        };
        self.attach(style, clause);
    }

    fn add_conditions(
        &mut self,
        style: Style,
        context: BoolContext,
        name: &str,
        fields: &Value,
    ) -> Result<()> {
        let Some(map) = expect_field_map(name, fields)? else {
            return Ok(());
        };
        for (field, value) in map {
            self.context = context;
            self.add_condition(style, field, value, &Params::new());
        }
        Ok(())
    }

    /// Process a filter/query attribute map, honouring the `or`/`not` keys
    fn add_attribute_map(&mut self, style: Style, name: &str, attributes: &Value) -> Result<()> {
        let Some(map) = expect_field_map(name, attributes)? else {
            return Ok(());
        };
        for (key, value) in map {
            match key.as_str() {
                "or" => self.add_conditions(style, BoolContext::Should, name, value)?,
                "not" => self.add_conditions(style, BoolContext::MustNot, name, value)?,
                field => {
                    self.context = BoolContext::Must;
                    self.add_condition(style, field, value, &Params::new());
                }
            }
        }
        Ok(())
    }
}

/// Fluent clause constructors shared by the search builder and nested
/// sub-builders.
///
/// Constructors append to the scored tree under the current context. Use
/// [`QueryComposer::append`] to add a clause carrying options.
pub trait QueryComposer: Sized {
    fn assembler(&self) -> &Assembler;

    fn assembler_mut(&mut self) -> &mut Assembler;

    /// Current boolean context
    fn get_bool_state(&self) -> BoolContext {
        self.assembler().context()
    }

    fn must(&mut self) -> &mut Self {
        self.assembler_mut().set_context(BoolContext::Must);
        self
    }

    fn should(&mut self) -> &mut Self {
        self.assembler_mut().set_context(BoolContext::Should);
        self
    }

    fn must_not(&mut self) -> &mut Self {
        self.assembler_mut().set_context(BoolContext::MustNot);
        self
    }

    fn filter(&mut self) -> &mut Self {
        self.assembler_mut().set_context(BoolContext::Filter);
        self
    }

    /// Append a prepared clause
    fn append(&mut self, clause: Clause) -> &mut Self {
        self.assembler_mut().push(clause);
        self
    }

    fn ids<I, V>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.append(Clause::Ids {
            values: ids.into_iter().map(Into::into).collect(),
            params: Params::new(),
        })
    }

    fn term(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.append(Clause::Term {
            field: field.into(),
            value: value.into(),
            params: Params::new(),
        })
    }

    fn terms<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.append(Clause::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            params: Params::new(),
        })
    }

    fn exists(&mut self, field: impl Into<String>) -> &mut Self {
        self.append(Clause::Exists {
            field: field.into(),
        })
    }

    /// Wildcard match with the default boost of 1.0
    fn wildcard(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.wildcard_with_boost(field, value, 1.0)
    }

    fn wildcard_with_boost(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
        boost: f64,
    ) -> &mut Self {
        self.append(Clause::Wildcard {
            field: field.into(),
            value: value.into(),
            params: boost_params(boost),
        })
    }

    /// Match every document with the default boost of 1.0
    fn match_all(&mut self) -> &mut Self {
        self.match_all_with_boost(1.0)
    }

    fn match_all_with_boost(&mut self, boost: f64) -> &mut Self {
        self.append(Clause::MatchAll {
            params: boost_params(boost),
        })
    }

    fn match_(&mut self, field: impl Into<String>, query: impl Into<Value>) -> &mut Self {
        self.append(Clause::Match {
            field: field.into(),
            query: query.into(),
            params: Params::new(),
        })
    }

    fn multi_match<I, S>(&mut self, fields: I, query: impl Into<Value>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.append(Clause::MultiMatch {
            fields: fields.into_iter().map(Into::into).collect(),
            query: query.into(),
            params: Params::new(),
        })
    }

    fn prefix(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.append(Clause::Prefix {
            field: field.into(),
            value: value.into(),
            params: Params::new(),
        })
    }

    fn fuzzy(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.append(Clause::Fuzzy {
            field: field.into(),
            value: value.into(),
            params: Params::new(),
        })
    }

    fn regexp(&mut self, field: impl Into<String>, pattern: impl Into<String>) -> &mut Self {
        self.append(Clause::Regexp {
            field: field.into(),
            pattern: pattern.into(),
            params: Params::new(),
        })
    }

    /// Range over the given bounds (`gt`, `gte`, `lt`, `lte`, `format`, ...)
    fn range(&mut self, field: impl Into<String>, bounds: Params) -> &mut Self {
        self.append(Clause::Range {
            field: field.into(),
            bounds,
        })
    }

    fn common_term(&mut self, field: impl Into<String>, query: impl Into<Value>) -> &mut Self {
        self.append(Clause::CommonTerms {
            field: field.into(),
            query: query.into(),
            params: Params::new(),
        })
    }

    fn query_string(&mut self, query: impl Into<String>) -> &mut Self {
        self.append(Clause::QueryString {
            query: query.into(),
            params: Params::new(),
        })
    }

    fn simple_query_string(&mut self, query: impl Into<String>) -> &mut Self {
        self.append(Clause::SimpleQueryString {
            query: query.into(),
            params: Params::new(),
        })
    }

    fn geo_distance(
        &mut self,
        field: impl Into<String>,
        distance: impl Into<Value>,
        location: impl Into<Value>,
    ) -> &mut Self {
        self.append(Clause::GeoDistance {
            field: field.into(),
            distance: distance.into(),
            location: location.into(),
            params: Params::new(),
        })
    }

    fn geo_distance_range(
        &mut self,
        field: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
        location: impl Into<Value>,
    ) -> &mut Self {
        self.append(Clause::GeoDistanceRange {
            field: field.into(),
            from: from.into(),
            to: to.into(),
            location: location.into(),
            params: Params::new(),
        })
    }

    /// Bounding box from two corner points or four edges
    fn geo_bounding_box(&mut self, field: impl Into<String>, points: Vec<Value>) -> Result<&mut Self> {
        let corners = BoundingBox::from_values(points)?;
        Ok(self.append(Clause::GeoBoundingBox {
            field: field.into(),
            corners,
            params: Params::new(),
        }))
    }

    fn geo_polygon(&mut self, field: impl Into<String>, points: Vec<Value>) -> &mut Self {
        self.append(Clause::GeoPolygon {
            field: field.into(),
            points,
            params: Params::new(),
        })
    }

    fn geo_shape(
        &mut self,
        field: impl Into<String>,
        shape_type: impl Into<String>,
        coordinates: impl Into<Value>,
    ) -> &mut Self {
        self.append(Clause::GeoShape {
            field: field.into(),
            shape_type: shape_type.into(),
            coordinates: coordinates.into(),
            params: Params::new(),
        })
    }

    /// Nested query scored with `avg`
    fn nested<F>(&mut self, path: impl Into<String>, build: F) -> &mut Self
    where
        F: FnOnce(&mut Assembler),
    {
        self.nested_with_score_mode(path, "avg", build)
    }

    /// Nested query; `build` fills a fresh sub-builder starting in `must`
    fn nested_with_score_mode<F>(
        &mut self,
        path: impl Into<String>,
        score_mode: &str,
        build: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut Assembler),
    {
        let mut inner = Assembler::new();
        build(&mut inner);

        let mut params = Params::new();
        params.insert("score_mode".to_string(), json!(score_mode));
        self.append(Clause::Nested {
            path: path.into(),
            query: Box::new(inner.to_bool_query()),
            params,
        })
    }

    /// Filter: `field` must match `value`
    fn where_(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.where_with(field, value, Params::new())
    }

    /// `where_` with options (`boost`, ...) on the generated term clause
    fn where_with(&mut self, field: &str, value: impl Into<Value>, params: Params) -> &mut Self {
        let assembler = self.assembler_mut();
        assembler.set_context(BoolContext::Must);
        assembler.add_condition(Style::Filter, field, &value.into(), &params);
        self
    }

    /// Filter: `field` should match `value`
    fn where_or(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.where_or_with(field, value, Params::new())
    }

    fn where_or_with(&mut self, field: &str, value: impl Into<Value>, params: Params) -> &mut Self {
        let assembler = self.assembler_mut();
        assembler.set_context(BoolContext::Should);
        assembler.add_condition(Style::Filter, field, &value.into(), &params);
        self
    }

    /// Filter: `field` must not match `value`
    fn where_not(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.where_not_with(field, value, Params::new())
    }

    fn where_not_with(&mut self, field: &str, value: impl Into<Value>, params: Params) -> &mut Self {
        let assembler = self.assembler_mut();
        assembler.set_context(BoolContext::MustNot);
        assembler.add_condition(Style::Filter, field, &value.into(), &params);
        self
    }

    /// Scored: `field` must match `value`
    fn query(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.query_with(field, value, Params::new())
    }

    fn query_with(&mut self, field: &str, value: impl Into<Value>, params: Params) -> &mut Self {
        let assembler = self.assembler_mut();
        assembler.set_context(BoolContext::Must);
        assembler.add_condition(Style::Query, field, &value.into(), &params);
        self
    }

    fn query_or(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.query_or_with(field, value, Params::new())
    }

    fn query_or_with(&mut self, field: &str, value: impl Into<Value>, params: Params) -> &mut Self {
        let assembler = self.assembler_mut();
        assembler.set_context(BoolContext::Should);
        assembler.add_condition(Style::Query, field, &value.into(), &params);
        self
    }

    fn query_not(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.query_not_with(field, value, Params::new())
    }

    fn query_not_with(&mut self, field: &str, value: impl Into<Value>, params: Params) -> &mut Self {
        let assembler = self.assembler_mut();
        assembler.set_context(BoolContext::MustNot);
        assembler.add_condition(Style::Query, field, &value.into(), &params);
        self
    }

    /// `where_` for every entry of a field map
    fn where_all(&mut self, fields: &Value) -> Result<&mut Self> {
        self.assembler_mut()
            .add_conditions(Style::Filter, BoolContext::Must, "fields", fields)?;
        Ok(self)
    }

    fn where_or_all(&mut self, fields: &Value) -> Result<&mut Self> {
        self.assembler_mut()
            .add_conditions(Style::Filter, BoolContext::Should, "fields", fields)?;
        Ok(self)
    }

    fn where_not_all(&mut self, fields: &Value) -> Result<&mut Self> {
        self.assembler_mut()
            .add_conditions(Style::Filter, BoolContext::MustNot, "fields", fields)?;
        Ok(self)
    }

    fn query_all(&mut self, fields: &Value) -> Result<&mut Self> {
        self.assembler_mut()
            .add_conditions(Style::Query, BoolContext::Must, "fields", fields)?;
        Ok(self)
    }

    fn query_or_all(&mut self, fields: &Value) -> Result<&mut Self> {
        self.assembler_mut()
            .add_conditions(Style::Query, BoolContext::Should, "fields", fields)?;
        Ok(self)
    }

    fn query_not_all(&mut self, fields: &Value) -> Result<&mut Self> {
        self.assembler_mut()
            .add_conditions(Style::Query, BoolContext::MustNot, "fields", fields)?;
        Ok(self)
    }

    /// Apply a `where` attribute map (`or`/`not` keys group their entries)
    fn add_filters(&mut self, filters: &Value) -> Result<&mut Self> {
        self.assembler_mut()
            .add_attribute_map(Style::Filter, "where", filters)?;
        Ok(self)
    }

    /// Apply a `query` attribute map (`or`/`not` keys group their entries)
    fn add_queries(&mut self, queries: &Value) -> Result<&mut Self> {
        self.assembler_mut()
            .add_attribute_map(Style::Query, "query", queries)?;
        Ok(self)
    }
}

impl QueryComposer for Assembler {
    fn assembler(&self) -> &Assembler {
        self
    }

    fn assembler_mut(&mut self) -> &mut Assembler {
        self
    }
}

fn boost_params(boost: f64) -> Params {
    let mut params = Params::new();
    params.insert("boost".to_string(), json!(boost));
    params
}

/// Turn a JSON object into clause options; anything else is rejected
pub fn params(value: Value) -> Result<Params> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Params::new()),
        other => Err(Error::InvalidArgument(format!(
            "clause options must be an object, got {}",
            other
        ))),
    }
}
