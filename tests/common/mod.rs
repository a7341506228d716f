//! Shared fixtures for the integration tests
//!
//! Two entity kinds (`Post`, `Comment`) wrapped in one `Entity` enum, loaders
//! backed by [`InMemoryLoader`], and a [`RecordingClient`] standing in for the
//! engine.

#![allow(dead_code)]

use async_trait::async_trait;
use mysticquent::client::{BulkAction, DocumentRef, Hit, Hits, HitsTotal, SearchClient, SearchResponse};
use mysticquent::config::Config;
use mysticquent::connection::Connection;
use mysticquent::error::{Error, Result};
use mysticquent::model::{EntityLoader, InMemoryLoader, ModelRegistry, Searchable};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip)]
    pub persisted: bool,
}

impl Searchable for Post {
    fn primary_key(&self) -> String {
        self.id.clone()
    }

    fn table_name(&self) -> String {
        "posts".to_string()
    }

    fn is_persisted(&self) -> bool {
        self.persisted
    }

    fn build_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("title".to_string(), json!(self.title));
        doc.insert("status".to_string(), json!(self.status));
        doc.insert("tags".to_string(), json!(self.tags));
        doc
    }

    fn document_index(&self) -> String {
        format!("{}_testing", self.table_name())
    }

    fn suggester_attributes(&self) -> Option<Vec<String>> {
        Some(vec!["title".to_string(), "tags".to_string()])
    }

    fn should_sync_document(&self) -> bool {
        self.status != "draft"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    pub body: String,
    #[serde(default)]
    pub post_id: String,
}

impl Searchable for Comment {
    fn primary_key(&self) -> String {
        self.id.clone()
    }

    fn table_name(&self) -> String {
        "comments".to_string()
    }

    fn build_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("body".to_string(), json!(self.body));
        doc.insert("post_id".to_string(), json!(self.post_id));
        doc
    }

    fn document_index(&self) -> String {
        format!("{}_testing", self.table_name())
    }
}

/// Everything a mixed-kind search can bind to
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Post(Post),
    Comment(Comment),
}

impl Entity {
    fn inner(&self) -> &dyn Searchable {
        match self {
            Entity::Post(post) => post,
            Entity::Comment(comment) => comment,
        }
    }

    pub fn as_post(&self) -> Option<&Post> {
        match self {
            Entity::Post(post) => Some(post),
            Entity::Comment(_) => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Entity::Comment(comment) => Some(comment),
            Entity::Post(_) => None,
        }
    }
}

impl Searchable for Entity {
    fn primary_key(&self) -> String {
        self.inner().primary_key()
    }

    fn table_name(&self) -> String {
        self.inner().table_name()
    }

    fn is_persisted(&self) -> bool {
        self.inner().is_persisted()
    }

    fn build_document(&self) -> Map<String, Value> {
        self.inner().build_document()
    }

    fn document_type(&self) -> String {
        match self {
            Entity::Post(post) => post.document_type(),
            Entity::Comment(comment) => comment.document_type(),
        }
    }

    fn document_index(&self) -> String {
        self.inner().document_index()
    }
}

/// Serves one kind out of an [`InMemoryLoader`], wrapped into [`Entity`].
/// Eager-load hints of every fetch are kept for inspection.
#[derive(Clone)]
pub struct KindLoader<T> {
    pub store: InMemoryLoader<T>,
    wrap: fn(T) -> Entity,
    hints: Arc<Mutex<Vec<Vec<String>>>>,
}

impl<T> KindLoader<T>
where
    T: Searchable + Clone,
{
    pub fn new(wrap: fn(T) -> Entity) -> Self {
        Self {
            store: InMemoryLoader::new(),
            wrap,
            hints: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn hints(&self) -> Vec<Vec<String>> {
        self.hints.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T> EntityLoader<Entity> for KindLoader<T>
where
    T: Searchable + Clone + serde::de::DeserializeOwned + 'static,
{
    async fn find_many(&self, ids: &[String], with: &[String]) -> Result<Vec<Entity>> {
        self.hints.lock().unwrap().push(with.to_vec());
        let found = self.store.find_many(ids, with).await?;
        Ok(found.into_iter().map(self.wrap).collect())
    }

    fn hydrate_unchecked(&self, source: Map<String, Value>) -> Result<Entity> {
        Ok((self.wrap)(self.store.hydrate_unchecked(source)?))
    }
}

/// Registry over both kinds plus handles to their loaders
pub struct Fixture {
    pub registry: ModelRegistry<Entity>,
    pub posts: KindLoader<Post>,
    pub comments: KindLoader<Comment>,
}

impl Fixture {
    pub fn new(config: &Config) -> Self {
        let posts = KindLoader::new(Entity::Post);
        let comments = KindLoader::new(Entity::Comment);

        let mut registry = ModelRegistry::from_config(config);
        registry
            .register("Post", posts.clone())
            .register("Comment", comments.clone());

        Self {
            registry,
            posts,
            comments,
        }
    }
}

pub fn post(id: &str, title: &str, status: &str) -> Post {
    Post {
        id: id.to_string(),
        title: title.to_string(),
        status: status.to_string(),
        tags: Vec::new(),
        persisted: true,
    }
}

pub fn comment(id: &str, body: &str, post_id: &str) -> Comment {
    Comment {
        id: id.to_string(),
        body: body.to_string(),
        post_id: post_id.to_string(),
    }
}

pub fn hit(index: &str, doc_type: Option<&str>, id: &str, source: Value) -> Hit {
    Hit {
        index: index.to_string(),
        doc_type: doc_type.map(str::to_string),
        id: id.to_string(),
        score: Some(1.0),
        source: source.as_object().cloned().unwrap_or_default(),
    }
}

pub fn response(hits: Vec<Hit>, total: u64) -> SearchResponse {
    SearchResponse {
        took: 3,
        timed_out: false,
        hits: Hits {
            total: HitsTotal::Count(total),
            max_score: Some(1.0),
            hits,
        },
        aggregations: Map::new(),
    }
}

/// One request seen by [`RecordingClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search { indices: Vec<String>, body: Value },
    Suggest { indices: Vec<String>, body: Value },
    Index { target: DocumentRef, body: Value },
    Update { target: DocumentRef, partial: Value },
    Delete { target: DocumentRef },
    Exists { target: DocumentRef },
    Bulk { actions: Vec<BulkAction> },
    IndicesExists(String),
    IndicesCreate { index: String, body: Value },
    IndicesDelete(String),
    PutMapping { index: String, doc_type: String, body: Value },
}

/// In-process engine double: records every call, keeps track of indexed
/// documents and created indices, answers searches with a canned response
#[derive(Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<Call>>,
    response: Mutex<SearchResponse>,
    suggest: Mutex<Value>,
    documents: Mutex<HashSet<(String, String)>>,
    indices: Mutex<HashSet<String>>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_response(response: SearchResponse) -> Arc<Self> {
        let client = Self::default();
        *client.response.lock().unwrap() = response;
        Arc::new(client)
    }

    pub fn set_suggest(&self, payload: Value) {
        *self.suggest.lock().unwrap() = payload;
    }

    pub fn add_index(&self, index: &str) {
        self.indices.lock().unwrap().insert(index.to_string());
    }

    pub fn has_document(&self, index: &str, id: &str) -> bool {
        self.documents
            .lock()
            .unwrap()
            .contains(&(index.to_string(), id.to_string()))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Bodies of every search request, in order
    pub fn search_bodies(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn store(&self, target: &DocumentRef) {
        self.documents
            .lock()
            .unwrap()
            .insert((target.index.clone(), target.id.clone()));
    }
}

#[async_trait]
impl SearchClient for RecordingClient {
    async fn search(&self, indices: &[String], body: &Value) -> Result<SearchResponse> {
        self.record(Call::Search {
            indices: indices.to_vec(),
            body: body.clone(),
        });
        Ok(self.response.lock().unwrap().clone())
    }

    async fn suggest(&self, indices: &[String], body: &Value) -> Result<Value> {
        self.record(Call::Suggest {
            indices: indices.to_vec(),
            body: body.clone(),
        });
        Ok(self.suggest.lock().unwrap().clone())
    }

    async fn index(&self, target: &DocumentRef, body: &Value) -> Result<Value> {
        self.record(Call::Index {
            target: target.clone(),
            body: body.clone(),
        });
        self.store(target);
        Ok(json!({"_id": target.id, "result": "created"}))
    }

    async fn update(&self, target: &DocumentRef, partial: &Value) -> Result<Value> {
        self.record(Call::Update {
            target: target.clone(),
            partial: partial.clone(),
        });
        Ok(json!({"_id": target.id, "result": "updated"}))
    }

    async fn delete(&self, target: &DocumentRef) -> Result<Value> {
        self.record(Call::Delete {
            target: target.clone(),
        });
        self.documents
            .lock()
            .unwrap()
            .remove(&(target.index.clone(), target.id.clone()));
        Ok(json!({"_id": target.id, "result": "deleted"}))
    }

    async fn exists(&self, target: &DocumentRef) -> Result<bool> {
        self.record(Call::Exists {
            target: target.clone(),
        });
        Ok(self.has_document(&target.index, &target.id))
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<Value> {
        self.record(Call::Bulk {
            actions: actions.to_vec(),
        });
        for action in actions {
            match action {
                BulkAction::Index { target, .. } => self.store(target),
                BulkAction::Delete { target } => {
                    self.documents
                        .lock()
                        .unwrap()
                        .remove(&(target.index.clone(), target.id.clone()));
                }
            }
        }
        Ok(json!({"errors": false, "items": actions.len()}))
    }

    async fn indices_exists(&self, index: &str) -> Result<bool> {
        self.record(Call::IndicesExists(index.to_string()));
        Ok(self.indices.lock().unwrap().contains(index))
    }

    async fn indices_create(&self, index: &str, body: &Value) -> Result<Value> {
        self.record(Call::IndicesCreate {
            index: index.to_string(),
            body: body.clone(),
        });
        self.add_index(index);
        Ok(json!({"acknowledged": true, "index": index}))
    }

    async fn indices_delete(&self, index: &str) -> Result<Value> {
        self.record(Call::IndicesDelete(index.to_string()));
        if self.indices.lock().unwrap().remove(index) {
            Ok(json!({"acknowledged": true}))
        } else {
            Err(Error::Engine {
                status: 404,
                body: format!("no such index [{}]", index),
            })
        }
    }

    async fn put_mapping(&self, index: &str, doc_type: &str, body: &Value) -> Result<Value> {
        self.record(Call::PutMapping {
            index: index.to_string(),
            doc_type: doc_type.to_string(),
            body: body.clone(),
        });
        Ok(json!({"acknowledged": true}))
    }
}

/// Connection over a recording client with the default configuration
pub fn connection(client: Arc<RecordingClient>) -> Connection {
    connection_with(client, Config::default())
}

pub fn connection_with(client: Arc<RecordingClient>, config: Config) -> Connection {
    Connection::new(client, config)
}
