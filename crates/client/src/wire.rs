use serde::{Deserialize, Serialize};

use crate::error::{ApiResult, BackendSnafu, InvalidReplySnafu, ReplyDecodeSnafu};
use snafu::ResultExt;

/// Request body for one chat exchange.
///
/// `session_id` is the opaque token handed out by the server on a previous
/// reply, or `None` before the first reply and after a clear. It serializes
/// as JSON `null` in that case, which the backend treats as "start a new
/// session".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            session_id,
        }
    }
}

/// Successful chat reply after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    /// Rich markup produced by the backend. Rendered unescaped by the
    /// widget; the backend is the trusted source of this content.
    pub content: String,
    /// Session token to adopt for the next request. The server may return
    /// `null`, in which case the held session is reset.
    pub session_id: Option<String>,
}

/// Raw reply shape before classification. All fields are optional because
/// the server returns either `{response, session_id}` or `{error}`, and
/// anything else must be rejected rather than guessed at.
#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

/// Decodes and classifies a 2xx reply body.
///
/// Classification order matches the backend contract: an `error` field wins
/// over a `response` field, and a body carrying neither is a protocol
/// violation. Empty strings count as absent, the same as missing or null
/// fields.
pub fn parse_reply(body: &[u8]) -> ApiResult<BotReply> {
    let reply: WireReply = serde_json::from_slice(body).context(ReplyDecodeSnafu {
        stage: "decode-chat-reply",
    })?;

    if let Some(message) = reply.error.filter(|message| !message.is_empty()) {
        return BackendSnafu {
            stage: "classify-chat-reply",
            message,
        }
        .fail();
    }

    match reply.response.filter(|content| !content.is_empty()) {
        Some(content) => Ok(BotReply {
            content,
            session_id: reply.session_id,
        }),
        None => InvalidReplySnafu {
            stage: "classify-chat-reply",
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ErrorClass};

    #[test]
    fn request_serializes_missing_session_as_null() {
        let request = ChatRequest::new("Hello", None);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["message"], "Hello");
        assert!(json["session_id"].is_null());

        let request = ChatRequest::new("Hello again", Some("abc".to_string()));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["session_id"], "abc");
    }

    #[test]
    fn success_reply_yields_content_and_session() {
        let reply = parse_reply(br#"{"response": "Hi!", "session_id": "abc"}"#).unwrap();
        assert_eq!(reply.content, "Hi!");
        assert_eq!(reply.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn success_reply_may_carry_null_session() {
        let reply = parse_reply(br#"{"response": "Hi!", "session_id": null}"#).unwrap();
        assert_eq!(reply.session_id, None);

        // A reply that omits the field entirely behaves the same way.
        let reply = parse_reply(br#"{"response": "Hi!"}"#).unwrap();
        assert_eq!(reply.session_id, None);
    }

    #[test]
    fn error_field_wins_over_response_field() {
        let error = parse_reply(br#"{"error": "model overloaded", "response": "Hi!"}"#)
            .unwrap_err();
        match &error {
            ApiError::Backend { message, .. } => assert_eq!(message, "model overloaded"),
            other => panic!("expected backend error, got {other:?}"),
        }
        assert_eq!(error.class(), ErrorClass::Application);
    }

    #[test]
    fn reply_without_response_or_error_is_a_protocol_error() {
        let error = parse_reply(br#"{"session_id": "abc"}"#).unwrap_err();
        assert!(matches!(error, ApiError::InvalidReply { .. }));
        assert_eq!(error.class(), ErrorClass::Protocol);
    }

    #[test]
    fn empty_fields_count_as_absent() {
        // An empty error string is not an error; the response still wins.
        let reply = parse_reply(br#"{"error": "", "response": "Hi!", "session_id": "abc"}"#)
            .unwrap();
        assert_eq!(reply.content, "Hi!");

        // An empty response is no response at all: no bot turn, no session
        // adoption.
        let error = parse_reply(br#"{"response": "", "session_id": "abc"}"#).unwrap_err();
        assert!(matches!(error, ApiError::InvalidReply { .. }));
    }

    #[test]
    fn non_json_body_is_a_transport_error() {
        let error = parse_reply(b"<html>bad gateway</html>").unwrap_err();
        assert!(matches!(error, ApiError::ReplyDecode { .. }));
        assert_eq!(error.class(), ErrorClass::Transport);
    }
}
