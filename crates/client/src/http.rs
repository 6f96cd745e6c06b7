use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use snafu::ResultExt;

use crate::error::{ApiResult, EndpointStatusSnafu, HttpRequestSnafu};
use crate::wire::{BotReply, ChatRequest, parse_reply};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Network seam for the chat widget.
///
/// The widget only ever issues fire-and-forget exchanges through this
/// trait, so tests can substitute a fake backend without touching the
/// transcript logic.
pub trait ChatBackend: Send + Sync {
    fn send_message(&self, request: ChatRequest) -> BoxFuture<'static, ApiResult<BotReply>>;
}

/// Production backend: one JSON POST per exchange against `{base_url}/chat`.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    chat_url: String,
    request_timeout: Duration,
}

impl HttpChatBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            chat_url: chat_url(base_url),
            request_timeout,
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    async fn post_chat(&self, request: ChatRequest) -> ApiResult<BotReply> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .timeout(self.request_timeout)
            .send()
            .await
            .context(HttpRequestSnafu { stage: "post-chat" })?;

        let status = response.status();
        let body = response.text().await.context(HttpRequestSnafu {
            stage: "read-chat-reply",
        })?;

        if !status.is_success() {
            return EndpointStatusSnafu {
                stage: "post-chat",
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        parse_reply(body.as_bytes())
    }
}

impl ChatBackend for HttpChatBackend {
    fn send_message(&self, request: ChatRequest) -> BoxFuture<'static, ApiResult<BotReply>> {
        let backend = self.clone();
        Box::pin(async move { backend.post_chat(request).await })
    }
}

fn chat_url(base_url: &str) -> String {
    format!("{}/chat", base_url.trim().trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ErrorClass};

    #[test]
    fn chat_url_tolerates_trailing_slashes() {
        assert_eq!(chat_url("http://127.0.0.1:5000"), "http://127.0.0.1:5000/chat");
        assert_eq!(chat_url("http://127.0.0.1:5000/"), "http://127.0.0.1:5000/chat");
        assert_eq!(chat_url(" https://bot.example.com "), "https://bot.example.com/chat");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Bind an ephemeral port, then drop the listener so the connection
        // is refused instead of hanging.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let backend = HttpChatBackend::new(
            &format!("http://127.0.0.1:{port}"),
            Duration::from_secs(5),
        );
        let error = backend
            .send_message(ChatRequest::new("Hello", None))
            .await
            .unwrap_err();

        assert!(matches!(error, ApiError::HttpRequest { .. }));
        assert_eq!(error.class(), ErrorClass::Transport);
    }
}
