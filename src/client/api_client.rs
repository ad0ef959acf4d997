//! HTTP API Client
//!
//! JSON-over-HTTP access to the backend: dispatching pending actions and
//! fetching cached resources.
//!
//! Every dispatch carries `Idempotency-Key: <action id>` and the same id as
//! `client_ref` in the body, so a replay after a lost response is recognised by
//! the backend and the created entity comes back with the correlation id.

use crate::client::cache::{CacheKey, CacheValue, RemoteFetcher};
use crate::client::config::Config;
use crate::client::error::{DispatchError, FetchError};
use crate::client::offline::queue::{ActionKind, PendingAction};
use crate::shared::feed::{Comment, CreateCommentRequest, CreatePostRequest, LikePostRequest, LikeResponse, Post};
use crate::shared::messaging::{ChatMessage, ListConversationsResponse, ListMessagesResponse, SendMessageRequest};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Header carrying the action id
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Performs the network call for one pending action
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    async fn dispatch(&self, action: &PendingAction) -> Result<DispatchResponse, DispatchError>;
}

/// Entity returned by a successful dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResponse {
    Post(Post),
    Comment(Comment),
    Like(LikeResponse),
    Message(ChatMessage),
    /// 2xx whose body was not the expected entity
    Acknowledged(Value),
}

/// JSON body of a dispatch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Post(CreatePostRequest),
    Comment(CreateCommentRequest),
    Like(LikePostRequest),
    Message(SendMessageRequest),
}

/// Method, path and JSON body for an action
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
}

impl Endpoint {
    /// Static mapping from action kind to request
    pub fn for_action(action: &PendingAction) -> Self {
        let client_ref = action.id.as_uuid();
        match &action.kind {
            ActionKind::CreatePost { body } => Endpoint {
                method: Method::POST,
                path: "/api/posts".to_string(),
                body: RequestBody::Post(CreatePostRequest {
                    body: body.clone(),
                    client_ref,
                }),
            },
            ActionKind::CreateComment { post_id, body } => Endpoint {
                method: Method::POST,
                path: format!("/api/posts/{}/comments", post_id),
                body: RequestBody::Comment(CreateCommentRequest {
                    body: body.clone(),
                    client_ref,
                }),
            },
            ActionKind::LikePost { post_id } => Endpoint {
                method: Method::POST,
                path: format!("/api/posts/{}/like", post_id),
                body: RequestBody::Like(LikePostRequest { client_ref }),
            },
            ActionKind::SendMessage {
                conversation_id,
                content,
            } => Endpoint {
                method: Method::POST,
                path: format!("/api/conversations/{}/messages", conversation_id),
                body: RequestBody::Message(SendMessageRequest {
                    content: content.clone(),
                    client_ref,
                }),
            },
        }
    }
}

/// Map a non-success status to a dispatch outcome
pub fn classify_status(status: StatusCode, message: String) -> DispatchError {
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            DispatchError::ServerTransientFailure {
                status: status.as_u16(),
            }
        }
        s if s.is_client_error() => DispatchError::ServerRejected {
            status: s.as_u16(),
            message: if message.trim().is_empty() {
                s.canonical_reason().unwrap_or("rejected").to_string()
            } else {
                message
            },
        },
        s => DispatchError::ServerTransientFailure { status: s.as_u16() },
    }
}

/// Backend client
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: Config,
    client: Client,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.app().sync.dispatch_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.config.api_url(path));
        match self.config.get_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn decode_response(kind: &ActionKind, bytes: &[u8]) -> DispatchResponse {
    fn parse<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
        serde_json::from_slice(bytes).ok()
    }

    let parsed = match kind {
        ActionKind::CreatePost { .. } => parse(bytes).map(DispatchResponse::Post),
        ActionKind::CreateComment { .. } => parse(bytes).map(DispatchResponse::Comment),
        ActionKind::LikePost { .. } => parse(bytes).map(DispatchResponse::Like),
        ActionKind::SendMessage { .. } => parse(bytes).map(DispatchResponse::Message),
    };

    parsed.unwrap_or_else(|| {
        tracing::debug!(kind = kind.name(), "unexpected response body, acknowledging");
        DispatchResponse::Acknowledged(parse(bytes).unwrap_or(Value::Null))
    })
}

#[async_trait]
impl ActionDispatcher for ApiClient {
    async fn dispatch(&self, action: &PendingAction) -> Result<DispatchResponse, DispatchError> {
        let endpoint = Endpoint::for_action(action);

        tracing::debug!(
            action_id = %action.id,
            kind = action.kind.name(),
            path = %endpoint.path,
            "dispatching"
        );

        let response = self
            .request(endpoint.method, &endpoint.path)
            .header(IDEMPOTENCY_KEY_HEADER, action.id.to_string())
            .json(&endpoint.body)
            .send()
            .await
            .map_err(|e| DispatchError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status, message));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DispatchError::network(e.to_string()))?;
        Ok(decode_response(&action.kind, &bytes))
    }
}

#[async_trait]
impl RemoteFetcher for ApiClient {
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, FetchError> {
        match key {
            CacheKey::ConversationList => {
                let response: ListConversationsResponse = self.get_json("/api/conversations").await?;
                Ok(CacheValue::Conversations(response.conversations))
            }
            CacheKey::Messages(conversation_id) => {
                let path = format!("/api/conversations/{}/messages", conversation_id);
                let response: ListMessagesResponse = self.get_json(&path).await?;
                Ok(CacheValue::Messages(response.messages))
            }
        }
    }
}
