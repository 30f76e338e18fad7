//! Transport between the widget and the chat backend.
//!
//! The widget only needs one operation, "send this message, give me the
//! reply", so the seam is a single-method trait. [`HttpChatTransport`] is the
//! production implementation; tests substitute scripted transports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::config::EndpointConfig;
use crate::error::{ChatError, Result};
use crate::protocol::{ChatRequest, ChatResponse};

/// Default path of the chat endpoint.
pub const DEFAULT_CHAT_PATH: &str = "/chat";
/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sends one chat request and returns the decoded reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and wait for the backend's reply.
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        (**self).send(request).await
    }
}

/// HTTP transport posting JSON to the `/chat` endpoint.
///
/// # Example
///
/// ```rust,no_run
/// use wanderwise_chat::protocol::ChatRequest;
/// use wanderwise_chat::transport::{ChatTransport, HttpChatTransport};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpChatTransport::new("http://127.0.0.1:5001")?;
/// let request = ChatRequest::from_input("Where should I go in May?").unwrap();
/// let reply = transport.send(&request).await?;
/// println!("{}", reply.reply);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpChatTransport {
    /// Create a transport for `base_url` using the default `/chat` path and
    /// request timeout.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Self::with_client(base_url, DEFAULT_CHAT_PATH, http)
    }

    /// Create a transport with a custom chat path and reqwest client.
    ///
    /// `chat_path` is resolved against `base_url` the way a browser resolves
    /// a link, so `/chat` always lands at the host root.
    pub fn with_client(
        base_url: impl AsRef<str>,
        chat_path: &str,
        http: reqwest::Client,
    ) -> Result<Self> {
        let endpoint = Url::parse(base_url.as_ref())?.join(chat_path)?;
        Ok(Self { endpoint, http })
    }

    /// Build a transport from endpoint settings, applying the request timeout.
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Self::with_client(&config.base_url, &config.chat_path, http)
    }

    /// The fully resolved chat endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Decode the reply body.
    ///
    /// The backend reports user-facing failures as `{"reply": ...}` with an
    /// error status, so a decodable body wins over the status code.
    async fn handle_response(response: reqwest::Response) -> Result<ChatResponse> {
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ChatResponse>(&body) {
            Ok(reply) => {
                if !status.is_success() {
                    warn!(
                        name: "chat.transport.error_reply",
                        status = status.as_u16(),
                        "Backend returned an error status with a reply"
                    );
                }
                Ok(reply)
            }
            Err(err) if status.is_success() => Err(ChatError::Decode(err)),
            Err(_) => Err(ChatError::Api {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        debug!(
            name: "chat.transport.request",
            endpoint = %self.endpoint,
            chars = request.message.chars().count(),
            "Posting chat message"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
