//! Document persistence, sync hooks, index lifecycle and suggestions

mod common;

use common::*;
use mysticquent::client::BulkAction;
use mysticquent::prelude::*;
use serde_json::json;

#[tokio::test]
async fn test_save_indexes_document_with_suggest_input() {
    let client = RecordingClient::new();
    let connection = connection(client.clone());
    let mut entry = post("7", "Fearless concurrency", "published");
    entry.tags = vec!["threads".to_string(), "2024".to_string()];

    connection.document().model(&entry).save().await.unwrap();

    match &client.calls()[0] {
        Call::Index { target, body } => {
            assert_eq!(target.index, "posts_testing");
            assert_eq!(target.doc_type, "Post");
            assert_eq!(target.id, "7");
            assert_eq!(body["title"], json!("Fearless concurrency"));
            assert_eq!(body["_suggest"], json!(["Fearless concurrency", "threads"]));
        }
        other => panic!("unexpected call {:?}", other),
    }
    assert!(client.has_document("posts_testing", "7"));
}

#[tokio::test]
async fn test_update_sends_partial_document() {
    let client = RecordingClient::new();
    let connection = connection(client.clone());
    let entry = post("7", "Fearless concurrency", "published");

    connection.document().model(&entry).update().await.unwrap();

    assert!(matches!(
        &client.calls()[0],
        Call::Update { partial, .. } if partial["status"] == json!("published")
    ));
}

#[tokio::test]
async fn test_unbound_and_unsaved_entities_are_rejected() {
    let client = RecordingClient::new();
    let connection = connection(client.clone());

    let unbound = connection.document::<Post>();
    assert!(unbound.get_model().is_none());
    assert!(matches!(
        unbound.save().await,
        Err(Error::MissingArgument(_))
    ));
    assert!(matches!(
        unbound.delete().await,
        Err(Error::MissingArgument(_))
    ));

    let mut draft = post("8", "Unsaved", "published");
    draft.persisted = false;
    let err = connection.document().model(&draft).save().await.unwrap_err();
    assert_eq!(err.error_code(), "NOT_PERSISTED");

    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_delete_checks_existence_first() {
    let client = RecordingClient::new();
    let connection = connection(client.clone());
    let entry = post("7", "Fearless concurrency", "published");

    let absent = connection.document().model(&entry).delete().await.unwrap();
    assert!(absent.is_none());
    assert_eq!(client.calls().len(), 1);

    connection.document().model(&entry).save().await.unwrap();
    let deleted = connection.document().model(&entry).delete().await.unwrap();
    assert_eq!(deleted.unwrap()["result"], json!("deleted"));
    assert!(!client.has_document("posts_testing", "7"));
}

#[tokio::test]
async fn test_bulk_save_and_delete() {
    let client = RecordingClient::new();
    let connection = connection(client.clone());
    let entries = vec![
        post("1", "Ownership explained", "published"),
        post("2", "Borrowing in practice", "published"),
    ];

    let document = connection.document::<Post>();
    document.bulk_save(&entries).await.unwrap();
    assert!(client.has_document("posts_testing", "1"));
    assert!(client.has_document("posts_testing", "2"));

    document.bulk_delete(&entries[..1]).await.unwrap();
    assert!(!client.has_document("posts_testing", "1"));

    let skipped = document.bulk_save(&[]).await.unwrap();
    assert!(skipped.is_null());
    assert_eq!(client.calls().len(), 2);

    match &client.calls()[1] {
        Call::Bulk { actions } => {
            assert!(matches!(&actions[0], BulkAction::Delete { target } if target.id == "1"));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_sync_hooks_honour_entity_setting() {
    let client = RecordingClient::new();
    let connection = connection(client.clone());

    let draft = post("3", "Work in progress", "draft");
    assert!(connection.saved(&draft).await.unwrap().is_none());
    assert!(connection.deleted(&draft).await.unwrap().is_none());
    assert!(client.calls().is_empty());

    connection.reindex(&draft).await.unwrap();
    assert!(client.has_document("posts_testing", "3"));

    let published = post("4", "Shipped", "published");
    assert!(connection.saved(&published).await.unwrap().is_some());
    assert!(connection.deleted(&published).await.unwrap().is_some());
    assert!(!client.has_document("posts_testing", "4"));

    let note = comment("5", "Great write-up", "4");
    connection.saved(&note).await.unwrap();
    assert!(client.has_document("comments_testing", "5"));
}

#[tokio::test]
async fn test_reset_index_recreates_and_maps() {
    let client = RecordingClient::new();
    client.add_index("posts_testing");
    let connection = connection(client.clone());

    connection
        .indices()
        .reset_index(&post("1", "Ownership explained", "published"))
        .await
        .unwrap();

    let calls = client.calls();
    assert_eq!(calls[0], Call::IndicesExists("posts_testing".to_string()));
    assert_eq!(calls[1], Call::IndicesDelete("posts_testing".to_string()));
    assert!(matches!(
        &calls[2],
        Call::IndicesCreate { index, body } if index == "posts_testing" && body["mappings"]["_default_"].is_object()
    ));
    match &calls[3] {
        Call::PutMapping {
            index,
            doc_type,
            body,
        } => {
            assert_eq!(index, "posts_testing");
            assert_eq!(doc_type, "Post");
            assert_eq!(
                body,
                &json!({"properties": {"_suggest": {
                    "type": "completion",
                    "analyzer": "simple",
                    "search_analyzer": "simple"
                }}})
            );
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_index_is_tolerated() {
    let client = RecordingClient::new();
    let connection = connection(client.clone());
    let indices = connection.indices();

    indices.delete("nowhere").await.unwrap();
    assert!(!indices.exists("nowhere").await.unwrap());

    indices.recreate("fresh").await.unwrap();
    assert!(indices.exists("fresh").await.unwrap());
}

#[tokio::test]
async fn test_typeless_engine_gets_modern_mapping() {
    let client = RecordingClient::new();
    let mut config = Config::default();
    config.elasticsearch_version = "7.4.0".to_string();
    let connection = connection_with(client.clone(), config);

    connection.indices().create("posts_testing").await.unwrap();
    assert!(matches!(
        &client.calls()[0],
        Call::IndicesCreate { body, .. }
            if body["mappings"]["dynamic_templates"][0]["strings"]["mapping"]["fields"]["raw"]["type"] == json!("keyword")
    ));
}

#[tokio::test]
async fn test_reindex_all_chunks_bulk_requests() {
    let client = RecordingClient::new();
    let connection = connection(client.clone());
    let entries: Vec<Post> = (1..=5)
        .map(|id| post(&id.to_string(), "Chunked", "published"))
        .collect();

    let requests = connection
        .indices()
        .with_chunk_size(2)
        .reindex_all(&entries)
        .await
        .unwrap();

    assert_eq!(requests, 3);
    let sizes: Vec<usize> = client
        .calls()
        .into_iter()
        .map(|call| match call {
            Call::Bulk { actions } => actions.len(),
            _ => 0,
        })
        .collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_completion_suggestion_request() {
    let client = RecordingClient::new();
    client.set_suggest(json!({"titles": [{"text": "own", "options": [{"text": "Ownership explained"}]}]}));
    let connection = connection(client.clone());

    let mut suggest = connection.suggest();
    suggest
        .set_model(&post("1", "Ownership explained", "published"))
        .completion("titles", "own");
    let payload = suggest.get().await.unwrap();

    assert_eq!(payload["titles"][0]["options"][0]["text"], json!("Ownership explained"));
    assert_eq!(
        client.calls()[0],
        Call::Suggest {
            indices: vec!["posts_testing".to_string()],
            body: json!({"titles": {"text": "own", "completion": {"field": "_suggest"}}}),
        }
    );
}
