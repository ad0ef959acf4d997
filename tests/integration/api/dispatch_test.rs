use super::client_for;
use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::json;
use socialsync::client::api_client::{ActionDispatcher, DispatchResponse, IDEMPOTENCY_KEY_HEADER};
use socialsync::client::error::DispatchError;
use socialsync::client::offline::{ActionKind, PendingAction};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn like(post_id: i64) -> PendingAction {
    PendingAction::new(ActionKind::LikePost { post_id }, Utc::now())
}

#[tokio::test]
async fn test_like_carries_idempotency_key_and_token() {
    let server = MockServer::start().await;
    let action = like(42);

    Mock::given(method("POST"))
        .and(path("/api/posts/42/like"))
        .and(header(IDEMPOTENCY_KEY_HEADER, action.id.to_string().as_str()))
        .and(header("Authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post_id": 42,
            "like_count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), Some("session-token"));
    let response = client.dispatch(&action).await.unwrap();

    assert_matches!(response, DispatchResponse::Like(like) if like.like_count == 3 && like.liked);
}

#[tokio::test]
async fn test_message_body_and_response() {
    let server = MockServer::start().await;
    let action = PendingAction::new(
        ActionKind::SendMessage {
            conversation_id: 7,
            content: "see you at 8".to_string(),
        },
        Utc::now(),
    );

    Mock::given(method("POST"))
        .and(path("/api/conversations/7/messages"))
        .and(body_partial_json(json!({
            "content": "see you at 8",
            "client_ref": action.id.to_string()
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 900,
            "conversation_id": 7,
            "content": "see you at 8",
            "created_at": "2024-03-01T12:00:00Z",
            "client_ref": action.id.to_string()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server.uri(), None).dispatch(&action).await.unwrap();
    assert_matches!(response, DispatchResponse::Message(message) if message.id == Some(900) && !message.pending);
}

#[tokio::test]
async fn test_success_without_entity_is_acknowledged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let action = PendingAction::new(
        ActionKind::CreatePost {
            body: "hi".to_string(),
        },
        Utc::now(),
    );
    let response = client_for(&server.uri(), None).dispatch(&action).await.unwrap();
    assert_matches!(response, DispatchResponse::Acknowledged(_));
}

#[tokio::test]
async fn test_status_classification() {
    let cases = [
        (400, false),
        (404, false),
        (422, false),
        (408, true),
        (429, true),
        (500, true),
        (503, true),
    ];

    for (status, retryable) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;

        let error = client_for(&server.uri(), None)
            .dispatch(&like(1))
            .await
            .unwrap_err();
        assert_eq!(error.is_retryable(), retryable, "status {}", status);
        if !retryable {
            assert_eq!(
                error,
                DispatchError::ServerRejected {
                    status,
                    message: "nope".to_string()
                }
            );
        }
    }
}

#[tokio::test]
async fn test_unreachable_server_is_network_failure() {
    // Grab a free port and close it again so nothing is listening there
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let uri = format!("http://127.0.0.1:{}", port);

    let error = client_for(&uri, None).dispatch(&like(1)).await.unwrap_err();
    assert_matches!(error, DispatchError::NetworkUnavailable { .. });
}
