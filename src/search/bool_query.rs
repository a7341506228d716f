//! Compound boolean query tree

use crate::search::clause::{Clause, Params};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Bucket new clauses attach to
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoolContext {
    #[default]
    Must,
    Should,
    MustNot,
    Filter,
}

impl BoolContext {
    /// Context a `not` condition is reissued under
    pub fn negated(self) -> Self {
        match self {
            BoolContext::MustNot => BoolContext::Must,
            BoolContext::Must | BoolContext::Should | BoolContext::Filter => BoolContext::MustNot,
        }
    }
}

/// Boolean query with four ordered clause buckets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    must: Vec<Clause>,
    should: Vec<Clause>,
    must_not: Vec<Clause>,
    filter: Vec<Clause>,
    params: Params,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a clause to the given bucket
    pub fn add(&mut self, clause: Clause, context: BoolContext) {
        self.bucket_mut(context).push(clause);
    }

    /// Clauses of one bucket, in insertion order
    pub fn bucket(&self, context: BoolContext) -> &[Clause] {
        match context {
            BoolContext::Must => &self.must,
            BoolContext::Should => &self.should,
            BoolContext::MustNot => &self.must_not,
            BoolContext::Filter => &self.filter,
        }
    }

    fn bucket_mut(&mut self, context: BoolContext) -> &mut Vec<Clause> {
        match context {
            BoolContext::Must => &mut self.must,
            BoolContext::Should => &mut self.should,
            BoolContext::MustNot => &mut self.must_not,
            BoolContext::Filter => &mut self.filter,
        }
    }

    /// Extra bool options such as `minimum_should_match`
    pub fn set_param(&mut self, key: impl Into<String>, value: Value) {
        self.params.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len() + self.filter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render as a query object.
    ///
    /// A tree holding a single `must` clause and no options renders as that
    /// clause alone.
    pub fn to_dsl(&self) -> Value {
        if self.params.is_empty()
            && self.must.len() == 1
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
        {
            return self.must[0].to_dsl();
        }

        let mut body = Map::new();
        for context in [
            BoolContext::Must,
            BoolContext::Should,
            BoolContext::MustNot,
            BoolContext::Filter,
        ] {
            let clauses = self.bucket(context);
            if !clauses.is_empty() {
                body.insert(
                    context.to_string(),
                    Value::Array(clauses.iter().map(Clause::to_dsl).collect()),
                );
            }
        }
        for (key, value) in &self.params {
            body.insert(key.clone(), value.clone());
        }

        json!({ "bool": body })
    }
}
