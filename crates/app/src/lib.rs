#![deny(unsafe_code)]

//! Desktop chat widget for a hosted chatbot backend.
//!
//! One window, one conversation: user input goes out as a JSON POST, the
//! reply comes back as a bot turn, and a session token correlates the
//! exchanges server-side. See `chat::Transcript` for the observable
//! semantics.

pub mod app;
/// Chat domain state and UI components.
pub mod chat;
/// Backend connection settings.
pub mod settings;
