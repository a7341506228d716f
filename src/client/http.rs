use crate::client::{BulkAction, DocumentRef, SearchClient, SearchResponse};
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error};

/// JSON-over-HTTP engine client
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) typed_documents: bool,
}

impl HttpClient {
    /// Create a client for the first configured host
    pub fn new(config: &Config) -> Result<Self> {
        let host = config.connection.hosts.first().ok_or_else(|| {
            Error::Configuration("connection.hosts must list at least one host".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.connection.timeout_secs))
            .user_agent(config.connection.user_agent.clone())
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_host(host),
            typed_documents: config.uses_mapping_types(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn document_path(&self, target: &DocumentRef) -> String {
        let doc_type = if self.typed_documents {
            target.doc_type.as_str()
        } else {
            "_doc"
        };
        format!("{}/{}/{}", target.index, doc_type, target.id)
    }

    fn bulk_metadata(&self, target: &DocumentRef) -> Value {
        let mut meta = json!({
            "_index": target.index,
            "_id": target.id,
        });
        if self.typed_documents {
            meta["_type"] = Value::String(target.doc_type.clone());
        }
        meta
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Transport(format!("Engine request timed out: {}", e))
            } else if e.is_connect() {
                Error::Transport(format!("Failed to connect to engine: {}", e))
            } else {
                Error::Transport(format!("Engine request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("Failed to read engine response: {}", e)))?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Engine rejected request");
            return Err(Error::Engine {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "Sending engine request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await
    }

    async fn head(&self, path: &str) -> Result<bool> {
        let url = self.url(path);
        debug!(url = %url, "Checking existence");

        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("Engine request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::Engine {
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }
}

#[async_trait]
impl SearchClient for HttpClient {
    async fn search(&self, indices: &[String], body: &Value) -> Result<SearchResponse> {
        let path = format!("{}/_search", join_indices(indices));
        let raw = self.send_json(Method::POST, &path, Some(body)).await?;
        Ok(serde_json::from_value(raw)?)
    }

    async fn suggest(&self, indices: &[String], body: &Value) -> Result<Value> {
        let path = format!("{}/_search", join_indices(indices));
        let request = json!({ "size": 0, "suggest": body });
        let mut raw = self.send_json(Method::POST, &path, Some(&request)).await?;
        Ok(raw
            .get_mut("suggest")
            .map(Value::take)
            .unwrap_or_else(|| json!({})))
    }

    async fn index(&self, target: &DocumentRef, body: &Value) -> Result<Value> {
        let path = self.document_path(target);
        self.send_json(Method::PUT, &path, Some(body)).await
    }

    async fn update(&self, target: &DocumentRef, partial: &Value) -> Result<Value> {
        let path = if self.typed_documents {
            format!("{}/_update", self.document_path(target))
        } else {
            format!("{}/_update/{}", target.index, target.id)
        };
        let body = json!({ "doc": partial });
        self.send_json(Method::POST, &path, Some(&body)).await
    }

    async fn delete(&self, target: &DocumentRef) -> Result<Value> {
        let path = self.document_path(target);
        self.send_json(Method::DELETE, &path, None).await
    }

    async fn exists(&self, target: &DocumentRef) -> Result<bool> {
        self.head(&self.document_path(target)).await
    }

    async fn bulk(&self, actions: &[BulkAction]) -> Result<Value> {
        let mut payload = String::new();
        for action in actions {
            let line = match action {
                BulkAction::Index { target, source } => {
                    let meta = json!({ "index": self.bulk_metadata(target) });
                    format!("{}\n{}\n", meta, source)
                }
                BulkAction::Delete { target } => {
                    format!("{}\n", json!({ "delete": self.bulk_metadata(target) }))
                }
            };
            payload.push_str(&line);
        }

        let url = self.url("_bulk");
        debug!(url = %url, actions = actions.len(), "Sending bulk request");
        let request = self
            .client
            .post(&url)
            .header("Content-Type", "application/x-ndjson")
            .body(payload);
        self.send(request).await
    }

    async fn indices_exists(&self, index: &str) -> Result<bool> {
        self.head(index).await
    }

    async fn indices_create(&self, index: &str, body: &Value) -> Result<Value> {
        self.send_json(Method::PUT, index, Some(body)).await
    }

    async fn indices_delete(&self, index: &str) -> Result<Value> {
        self.send_json(Method::DELETE, index, None).await
    }

    async fn put_mapping(&self, index: &str, doc_type: &str, body: &Value) -> Result<Value> {
        let path = if self.typed_documents {
            format!("{}/_mapping/{}", index, doc_type)
        } else {
            format!("{}/_mapping", index)
        };
        self.send_json(Method::PUT, &path, Some(body)).await
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

fn join_indices(indices: &[String]) -> String {
    if indices.is_empty() {
        "_all".to_string()
    } else {
        indices.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("127.0.0.1:9200"), "http://127.0.0.1:9200");
        assert_eq!(normalize_host("https://es.example.com/"), "https://es.example.com");
    }

    #[test]
    fn test_join_indices() {
        assert_eq!(join_indices(&[]), "_all");
        assert_eq!(
            join_indices(&["posts".to_string(), "comments".to_string()]),
            "posts,comments"
        );
    }

    #[test]
    fn test_document_paths_follow_engine_version() {
        let mut config = Config::default();
        let target = DocumentRef::new("posts_testing", "Post", "7");

        let typed = HttpClient::new(&config).unwrap();
        assert_eq!(typed.document_path(&target), "posts_testing/Post/7");

        config.elasticsearch_version = "7.10.2".to_string();
        let typeless = HttpClient::new(&config).unwrap();
        assert_eq!(typeless.document_path(&target), "posts_testing/_doc/7");
        assert!(typeless.bulk_metadata(&target).get("_type").is_none());
    }
}
