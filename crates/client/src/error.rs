use snafu::Snafu;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure modes for one chat exchange.
///
/// Every variant carries a `stage` tag naming the point in the exchange
/// where it was raised, so transport logs can locate the failure without a
/// backtrace.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    /// The server answered with an explicit `error` field. The message is
    /// authored by the backend and is shown to the user verbatim.
    #[snafu(display("{message}"))]
    Backend {
        stage: &'static str,
        message: String,
    },
    /// The reply was valid JSON but carried neither `response` nor `error`.
    #[snafu(display("chat reply carried neither a response nor an error"))]
    InvalidReply { stage: &'static str },
    /// The endpoint answered with a non-2xx status. The body is kept for
    /// logging; it is not trusted enough to surface to the user.
    #[snafu(display("chat endpoint returned status {status}"))]
    EndpointStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("http request failed on `{stage}`, {source}"))]
    HttpRequest {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to decode chat reply: {source}"))]
    ReplyDecode {
        stage: &'static str,
        source: serde_json::Error,
    },
}

/// Failure taxonomy as the widget surfaces it. Validation errors never
/// reach this crate; they are caught before a request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Server-authored error message, surfaced verbatim.
    Application,
    /// Structurally broken reply, surfaced as a generic message.
    Protocol,
    /// Network failure, non-2xx status, or undecodable body.
    Transport,
}

impl ApiError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Backend { .. } => ErrorClass::Application,
            Self::InvalidReply { .. } => ErrorClass::Protocol,
            Self::EndpointStatus { .. } | Self::HttpRequest { .. } | Self::ReplyDecode { .. } => {
                ErrorClass::Transport
            }
        }
    }
}
