// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Pinecone REST client against a local mock server

use jarvis_rag_node::config::KnowledgeBaseConfig;
use jarvis_rag_node::rag::{connect_knowledge_base, IndexError, PineconeIndex, VectorIndex};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(api_key: &str) -> KnowledgeBaseConfig {
    KnowledgeBaseConfig {
        api_key: Some(api_key.to_string()),
        ..Default::default()
    }
}

fn config_with_host(server: &MockServer) -> KnowledgeBaseConfig {
    KnowledgeBaseConfig {
        index_host: Some(server.uri()),
        ..config("test-key")
    }
}

#[tokio::test]
async fn test_connect_resolves_host_from_control_plane() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/jarvis-knowledge"))
        .and(header("Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "jarvis-knowledge",
            "dimension": 384,
            "host": server.uri(),
            "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let index = PineconeIndex::connect_with_control_plane(&config("test-key"), &server.uri())
        .await
        .unwrap();
    assert_eq!(index.host(), server.uri());
    assert_eq!(index.name(), "jarvis-knowledge");
}

#[tokio::test]
async fn test_connect_unknown_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/jarvis-knowledge"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let err = PineconeIndex::connect_with_control_plane(&config("test-key"), &server.uri())
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::IndexNotFound(name) if name == "jarvis-knowledge"));
}

#[tokio::test]
async fn test_connect_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = PineconeIndex::connect_with_control_plane(&config("bad-key"), &server.uri())
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Unauthorized(_)));
}

#[tokio::test]
async fn test_query_sends_vector_and_parses_matches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(header("Api-Key", "test-key"))
        .and(body_partial_json(json!({
            "topK": 3,
            "includeMetadata": true,
            "includeValues": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                { "id": "doc-1", "score": 0.91, "metadata": { "text": "The Mark III armor." } },
                { "id": "doc-2", "score": 0.42, "metadata": { "source": "wiki" } }
            ],
            "namespace": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let index = PineconeIndex::connect(&config_with_host(&server)).await.unwrap();
    let matches = index.query(&[0.1; 384], 3).await.unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].id, "doc-1");
    assert_eq!(matches[0].text(), "The Mark III armor.");
    assert_eq!(matches[1].text(), "");
}

#[tokio::test]
async fn test_query_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let index = PineconeIndex::connect(&config_with_host(&server)).await.unwrap();
    let err = index.query(&[0.1; 384], 3).await.unwrap_err();
    assert!(matches!(err, IndexError::RateLimited));
}

#[tokio::test]
async fn test_query_rejects_empty_vector() {
    let server = MockServer::start().await;
    let index = PineconeIndex::connect(&config_with_host(&server)).await.unwrap();

    let err = index.query(&[], 3).await.unwrap_err();
    assert!(matches!(err, IndexError::InvalidVector(_)));
}

#[tokio::test]
async fn test_knowledge_base_disabled_without_key() {
    let config = KnowledgeBaseConfig {
        api_key: None,
        ..Default::default()
    };
    assert!(connect_knowledge_base(&config).await.is_none());

    let blank = KnowledgeBaseConfig {
        api_key: Some("   ".to_string()),
        ..Default::default()
    };
    assert!(connect_knowledge_base(&blank).await.is_none());
}

#[tokio::test]
async fn test_knowledge_base_uses_configured_host() {
    let server = MockServer::start().await;
    let index = connect_knowledge_base(&config_with_host(&server)).await;
    assert!(index.is_some());
}
