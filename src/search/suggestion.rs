//! Completion and term suggestions

use crate::connection::Connection;
use crate::error::Result;
use crate::model::{Searchable, SUGGEST_FIELD};
use crate::search::clause::Params;
use serde_json::{json, Map, Value};
use strum::{AsRefStr, Display};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SuggesterKind {
    Completion,
    Term,
}

/// One named suggester
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub name: String,
    pub kind: SuggesterKind,
    pub text: String,
    pub field: String,
    pub params: Params,
}

impl Suggestion {
    fn to_dsl(&self) -> Value {
        let mut options = self.params.clone();
        options.insert("field".to_string(), json!(self.field));

        let mut body = Map::new();
        body.insert("text".to_string(), json!(self.text));
        body.insert(self.kind.to_string(), Value::Object(options));
        Value::Object(body)
    }
}

/// Builds and runs a `suggest` request
pub struct SuggestionBuilder {
    connection: Connection,
    index: Vec<String>,
    suggestions: Vec<Suggestion>,
}

impl SuggestionBuilder {
    pub fn new(connection: Connection) -> Self {
        let index = vec![connection.default_index().to_string()];
        Self {
            connection,
            index,
            suggestions: Vec::new(),
        }
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn set_index(&mut self, index: Vec<String>) -> &mut Self {
        self.index = index;
        self
    }

    /// Suggest from the index the entity lives in
    pub fn set_model<M: Searchable>(&mut self, model: &M) -> &mut Self {
        let index = model.document_index();
        if !index.is_empty() {
            self.index = vec![index];
        }
        self
    }

    /// Completion suggester over the `_suggest` field
    pub fn completion(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.completion_on(name, text, SUGGEST_FIELD, Params::new())
    }

    pub fn completion_on(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
        field: impl Into<String>,
        params: Params,
    ) -> &mut Self {
        self.append(SuggesterKind::Completion, name, text, field, params)
    }

    /// Term suggester over `_all`
    pub fn term(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.term_on(name, text, "_all", Params::new())
    }

    pub fn term_on(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
        field: impl Into<String>,
        params: Params,
    ) -> &mut Self {
        self.append(SuggesterKind::Term, name, text, field, params)
    }

    fn append(
        &mut self,
        kind: SuggesterKind,
        name: impl Into<String>,
        text: impl Into<String>,
        field: impl Into<String>,
        params: Params,
    ) -> &mut Self {
        let name = name.into();
        self.suggestions.retain(|existing| existing.name != name);
        self.suggestions.push(Suggestion {
            name,
            kind,
            text: text.into(),
            field: field.into(),
            params,
        });
        self
    }

    /// The `suggest` section
    pub fn to_dsl(&self) -> Value {
        let section: Map<String, Value> = self
            .suggestions
            .iter()
            .map(|suggestion| (suggestion.name.clone(), suggestion.to_dsl()))
            .collect();
        Value::Object(section)
    }

    /// Run the suggesters, returning the engine's `suggest` payload
    pub async fn get(&self) -> Result<Value> {
        let body = self.to_dsl();
        debug!(index = ?self.index, dsl = %body, "Executing suggest");
        self.connection.client().suggest(&self.index, &body).await
    }
}
