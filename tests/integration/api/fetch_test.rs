use super::client_for;
use pretty_assertions::assert_eq;
use serde_json::json;
use socialsync::client::cache::{CacheKey, CacheValue, RemoteFetcher};
use socialsync::client::error::FetchError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_conversation_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [
                { "id": 7, "title": "Ada", "unread_count": 2 },
                { "id": 8, "title": "Grace" }
            ]
        })))
        .mount(&server)
        .await;

    let value = client_for(&server.uri(), None)
        .fetch(&CacheKey::ConversationList)
        .await
        .unwrap();

    let CacheValue::Conversations(conversations) = value else {
        panic!("expected conversations");
    };
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].title, "Ada");
    assert_eq!(conversations[1].unread_count, 0);
}

#[tokio::test]
async fn test_fetch_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/7/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{
                "id": 1,
                "conversation_id": 7,
                "content": "hi",
                "created_at": "2024-03-01T12:00:00Z"
            }]
        })))
        .mount(&server)
        .await;

    let value = client_for(&server.uri(), None)
        .fetch(&CacheKey::Messages(7))
        .await
        .unwrap();
    assert_eq!(value.unread_total(), 0);
    let CacheValue::Messages(messages) = value else {
        panic!("expected messages");
    };
    assert_eq!(messages[0].content, "hi");
}

#[tokio::test]
async fn test_fetch_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), None);
    assert_eq!(
        client.fetch(&CacheKey::ConversationList).await,
        Err(FetchError::Status(500))
    );
    assert!(matches!(
        client.fetch(&CacheKey::Messages(1)).await,
        Err(FetchError::Decode(_))
    ));
}
