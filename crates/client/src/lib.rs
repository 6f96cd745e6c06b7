#![deny(unsafe_code)]

//! Client for the chat backend's single `/chat` endpoint.
//!
//! One exchange is one JSON POST: `{message, session_id}` out, either
//! `{response, session_id}` or `{error}` back. This crate owns the wire
//! contract, the reply classification, and the error taxonomy; the widget
//! decides how each failure class is shown to the user.

mod error;
mod http;
mod wire;

pub use error::{ApiError, ApiResult, ErrorClass};
pub use http::{BoxFuture, ChatBackend, HttpChatBackend};
pub use wire::{BotReply, ChatRequest, parse_reply};
