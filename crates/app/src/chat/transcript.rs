use std::time::Duration;

use parley_client::{ApiResult, BotReply, ChatRequest, ErrorClass};

use crate::chat::message::{Banner, BannerId, HistoryCell, RequestId, Role, Turn, TurnId};

/// Validation failure surfaced when the input is empty after trimming.
pub const EMPTY_MESSAGE_ERROR: &str = "Please enter a message";
/// Generic banner for replies that carry neither `response` nor `error`.
pub const INVALID_REPLY_ERROR: &str = "No valid response from server";
/// Error banners remove themselves after this long.
pub const ERROR_BANNER_TTL: Duration = Duration::from_millis(5000);

/// A validated send, ready to be dispatched to the backend. By the time
/// this value exists, the user turn and the loading placeholder are already
/// in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundChat {
    pub request_id: RequestId,
    pub request: ChatRequest,
}

/// Rejection reason for a send that never reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    EmptyMessage,
}

/// Terminal result of one request, reduced to what the transcript renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Reply {
        content: String,
        session_id: Option<String>,
    },
    Failure {
        banner: String,
    },
}

/// Rejection reason for a completion that no longer has a home: the
/// request already completed, or the conversation was cleared while it was
/// in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionRejection {
    UnknownRequest { request_id: RequestId },
}

/// What applying a completion changed, so the caller can schedule banner
/// expiry and log session adoption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOutcome {
    pub banner: Option<BannerId>,
    pub adopted_session: bool,
}

/// Maps a backend result onto the banner/turn the user sees.
///
/// Application errors are surfaced verbatim, protocol errors collapse to a
/// generic message, and transport failures carry the underlying failure
/// description. Transport failures are the only class that gets a log
/// trace.
pub fn outcome_from_result(result: ApiResult<BotReply>) -> SendOutcome {
    match result {
        Ok(reply) => SendOutcome::Reply {
            content: reply.content,
            session_id: reply.session_id,
        },
        Err(error) => {
            let banner = match error.class() {
                ErrorClass::Application => error.to_string(),
                ErrorClass::Protocol => INVALID_REPLY_ERROR.to_string(),
                ErrorClass::Transport => {
                    tracing::error!("chat request failed: {error}");
                    format!("Failed to connect: {error}")
                }
            };
            SendOutcome::Failure { banner }
        }
    }
}

/// Controller-owned conversation state.
///
/// The transcript is the single writer of history cells and the session
/// identifier. It is purely synchronous; the view drives it from UI events
/// and request completions, both of which run one at a time on the
/// foreground executor.
#[derive(Debug, Default)]
pub struct Transcript {
    cells: Vec<HistoryCell>,
    session_id: Option<String>,
    latest_request: Option<RequestId>,
    next_turn_id: u64,
    next_request_id: u64,
    next_banner_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[HistoryCell] {
        &self.cells
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Validates the input and stages one send: appends the user turn,
    /// inserts the loading placeholder, and builds the request payload with
    /// the currently held session identifier. Both cells are in place
    /// before the caller can produce any network effect.
    pub fn begin_send(&mut self, input: &str, stamp: &str) -> Result<OutboundChat, SendRejection> {
        let message = input.trim();
        if message.is_empty() {
            return Err(SendRejection::EmptyMessage);
        }

        let turn_id = self.alloc_turn_id();
        self.cells
            .push(HistoryCell::Turn(Turn::new(turn_id, Role::User, message, stamp)));

        let request_id = self.alloc_request_id();
        self.cells.push(HistoryCell::Loading(request_id));
        self.latest_request = Some(request_id);

        Ok(OutboundChat {
            request_id,
            request: ChatRequest::new(message, self.session_id.clone()),
        })
    }

    /// Applies the terminal outcome of one request.
    ///
    /// The request's own loading placeholder is removed exactly once; a
    /// second completion, or a completion for a request forgotten by
    /// `clear`, is rejected. Only the most recently issued request may
    /// update the session identifier. An older completion still renders
    /// its bot turn but its session token is stale and is dropped.
    pub fn apply_outcome(
        &mut self,
        request_id: RequestId,
        outcome: SendOutcome,
        stamp: &str,
    ) -> Result<AppliedOutcome, CompletionRejection> {
        if !self.remove_loading(request_id) {
            return Err(CompletionRejection::UnknownRequest { request_id });
        }

        match outcome {
            SendOutcome::Reply {
                content,
                session_id,
            } => {
                let turn_id = self.alloc_turn_id();
                self.cells
                    .push(HistoryCell::Turn(Turn::new(turn_id, Role::Bot, content, stamp)));

                let adopted_session = self.latest_request == Some(request_id);
                if adopted_session {
                    // Adopt whatever the server returned, including null.
                    self.session_id = session_id;
                }

                Ok(AppliedOutcome {
                    banner: None,
                    adopted_session,
                })
            }
            SendOutcome::Failure { banner } => {
                let banner_id = self.push_banner(banner);
                Ok(AppliedOutcome {
                    banner: Some(banner_id),
                    adopted_session: false,
                })
            }
        }
    }

    /// Appends an error banner and returns its identifier so the caller
    /// can schedule the timed removal.
    pub fn push_banner(&mut self, message: impl Into<String>) -> BannerId {
        let id = self.alloc_banner_id();
        self.cells.push(HistoryCell::Banner(Banner {
            id,
            message: message.into(),
        }));
        id
    }

    /// Removes a banner. Idempotent: expiry and a future manual dismissal
    /// may race, and the loser must be a no-op.
    pub fn remove_banner(&mut self, banner_id: BannerId) {
        self.cells
            .retain(|cell| !matches!(cell, HistoryCell::Banner(banner) if banner.id == banner_id));
    }

    /// Drops every history cell and resets the session identifier.
    ///
    /// In-flight requests are forgotten along with their placeholders;
    /// their completions will be rejected by `apply_outcome`. The server is
    /// not notified.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.session_id = None;
        self.latest_request = None;
    }

    fn remove_loading(&mut self, request_id: RequestId) -> bool {
        let position = self
            .cells
            .iter()
            .position(|cell| matches!(cell, HistoryCell::Loading(id) if *id == request_id));

        match position {
            Some(index) => {
                self.cells.remove(index);
                true
            }
            None => false,
        }
    }

    fn alloc_turn_id(&mut self) -> TurnId {
        self.next_turn_id = self.next_turn_id.saturating_add(1);
        TurnId::new(self.next_turn_id)
    }

    fn alloc_request_id(&mut self) -> RequestId {
        self.next_request_id = self.next_request_id.saturating_add(1);
        RequestId::new(self.next_request_id)
    }

    fn alloc_banner_id(&mut self) -> BannerId {
        self.next_banner_id = self.next_banner_id.saturating_add(1);
        BannerId::new(self.next_banner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_client::ApiError;

    fn reply(content: &str, session_id: Option<&str>) -> SendOutcome {
        SendOutcome::Reply {
            content: content.to_string(),
            session_id: session_id.map(str::to_string),
        }
    }

    fn user_turns(transcript: &Transcript) -> Vec<&str> {
        turns_with_role(transcript, Role::User)
    }

    fn bot_turns(transcript: &Transcript) -> Vec<&str> {
        turns_with_role(transcript, Role::Bot)
    }

    fn turns_with_role(transcript: &Transcript, role: Role) -> Vec<&str> {
        transcript
            .cells()
            .iter()
            .filter_map(|cell| match cell {
                HistoryCell::Turn(turn) if turn.role == role => Some(turn.content.as_str()),
                _ => None,
            })
            .collect()
    }

    fn loading_count(transcript: &Transcript) -> usize {
        transcript
            .cells()
            .iter()
            .filter(|cell| matches!(cell, HistoryCell::Loading(_)))
            .count()
    }

    fn banner_messages(transcript: &Transcript) -> Vec<&str> {
        transcript
            .cells()
            .iter()
            .filter_map(|cell| match cell {
                HistoryCell::Banner(banner) => Some(banner.message.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn begin_send_stages_user_turn_and_placeholder_before_any_network_effect() {
        let mut transcript = Transcript::new();
        let outbound = transcript.begin_send("  Hello  ", "09:05").unwrap();

        assert_eq!(user_turns(&transcript), vec!["Hello"]);
        assert_eq!(loading_count(&transcript), 1);
        assert_eq!(outbound.request.message, "Hello");
        assert_eq!(outbound.request.session_id, None);

        // The placeholder follows the user turn in append order.
        assert!(matches!(
            transcript.cells().last(),
            Some(HistoryCell::Loading(id)) if *id == outbound.request_id
        ));
    }

    #[test]
    fn whitespace_only_input_is_rejected_without_staging_anything() {
        let mut transcript = Transcript::new();

        assert_eq!(
            transcript.begin_send("   \n ", "09:05"),
            Err(SendRejection::EmptyMessage)
        );
        assert!(transcript.cells().is_empty());
    }

    #[test]
    fn reply_appends_one_bot_turn_and_adopts_the_session() {
        let mut transcript = Transcript::new();
        let outbound = transcript.begin_send("Hello", "09:05").unwrap();

        let applied = transcript
            .apply_outcome(outbound.request_id, reply("Hi!", Some("abc")), "09:05")
            .unwrap();

        assert!(applied.adopted_session);
        assert_eq!(bot_turns(&transcript), vec!["Hi!"]);
        assert_eq!(loading_count(&transcript), 0);
        assert_eq!(transcript.session_id(), Some("abc"));

        // The adopted session rides along on the next request.
        let next = transcript.begin_send("And again", "09:06").unwrap();
        assert_eq!(next.request.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn server_may_reset_the_session_to_null() {
        let mut transcript = Transcript::new();
        let first = transcript.begin_send("Hello", "09:05").unwrap();
        transcript
            .apply_outcome(first.request_id, reply("Hi!", Some("abc")), "09:05")
            .unwrap();

        let second = transcript.begin_send("More", "09:06").unwrap();
        transcript
            .apply_outcome(second.request_id, reply("Sure", None), "09:06")
            .unwrap();

        assert_eq!(transcript.session_id(), None);
    }

    #[test]
    fn failure_surfaces_a_banner_and_leaves_the_session_untouched() {
        let mut transcript = Transcript::new();
        let first = transcript.begin_send("Hello", "09:05").unwrap();
        transcript
            .apply_outcome(first.request_id, reply("Hi!", Some("abc")), "09:05")
            .unwrap();

        let second = transcript.begin_send("More", "09:06").unwrap();
        let applied = transcript
            .apply_outcome(
                second.request_id,
                SendOutcome::Failure {
                    banner: "Failed to connect: chat endpoint returned status 502".to_string(),
                },
                "09:06",
            )
            .unwrap();

        assert!(applied.banner.is_some());
        assert!(!applied.adopted_session);
        assert_eq!(bot_turns(&transcript), vec!["Hi!"]);
        assert_eq!(loading_count(&transcript), 0);
        assert_eq!(transcript.session_id(), Some("abc"));
        assert_eq!(banner_messages(&transcript).len(), 1);
    }

    #[test]
    fn a_request_completes_exactly_once() {
        let mut transcript = Transcript::new();
        let outbound = transcript.begin_send("Hello", "09:05").unwrap();

        transcript
            .apply_outcome(outbound.request_id, reply("Hi!", Some("abc")), "09:05")
            .unwrap();

        assert_eq!(
            transcript.apply_outcome(outbound.request_id, reply("Hi again!", None), "09:05"),
            Err(CompletionRejection::UnknownRequest {
                request_id: outbound.request_id
            })
        );
        assert_eq!(bot_turns(&transcript), vec!["Hi!"]);
        assert_eq!(transcript.session_id(), Some("abc"));
    }

    #[test]
    fn overlapping_sends_each_own_their_placeholder() {
        let mut transcript = Transcript::new();
        let first = transcript.begin_send("First", "09:05").unwrap();
        let second = transcript.begin_send("Second", "09:05").unwrap();
        assert_eq!(loading_count(&transcript), 2);

        // Completions interleave in reverse order; each removes only its
        // own placeholder.
        transcript
            .apply_outcome(second.request_id, reply("Two", Some("s2")), "09:05")
            .unwrap();
        assert_eq!(loading_count(&transcript), 1);

        transcript
            .apply_outcome(first.request_id, reply("One", Some("s1")), "09:05")
            .unwrap();
        assert_eq!(loading_count(&transcript), 0);
        assert_eq!(bot_turns(&transcript), vec!["Two", "One"]);
    }

    #[test]
    fn only_the_most_recently_issued_request_updates_the_session() {
        let mut transcript = Transcript::new();
        let first = transcript.begin_send("First", "09:05").unwrap();
        let second = transcript.begin_send("Second", "09:05").unwrap();

        let newest = transcript
            .apply_outcome(second.request_id, reply("Two", Some("s2")), "09:05")
            .unwrap();
        assert!(newest.adopted_session);

        let stale = transcript
            .apply_outcome(first.request_id, reply("One", Some("s1")), "09:05")
            .unwrap();
        assert!(!stale.adopted_session);
        assert_eq!(transcript.session_id(), Some("s2"));
    }

    #[test]
    fn clear_drops_everything_and_resets_the_session() {
        let mut transcript = Transcript::new();
        let outbound = transcript.begin_send("Hello", "09:05").unwrap();
        transcript
            .apply_outcome(outbound.request_id, reply("Hi!", Some("abc")), "09:05")
            .unwrap();
        transcript.push_banner("stray banner");

        transcript.clear();

        assert!(transcript.cells().is_empty());
        assert_eq!(transcript.session_id(), None);

        // The next send starts a fresh session.
        let next = transcript.begin_send("Fresh start", "09:10").unwrap();
        assert_eq!(next.request.session_id, None);
    }

    #[test]
    fn completions_arriving_after_clear_are_rejected() {
        let mut transcript = Transcript::new();
        let outbound = transcript.begin_send("Hello", "09:05").unwrap();

        transcript.clear();

        assert_eq!(
            transcript.apply_outcome(outbound.request_id, reply("Hi!", Some("abc")), "09:05"),
            Err(CompletionRejection::UnknownRequest {
                request_id: outbound.request_id
            })
        );
        assert!(transcript.cells().is_empty());
        assert_eq!(transcript.session_id(), None);
    }

    #[test]
    fn banner_removal_is_idempotent() {
        let mut transcript = Transcript::new();
        let banner_id = transcript.push_banner(EMPTY_MESSAGE_ERROR);
        assert_eq!(banner_messages(&transcript), vec![EMPTY_MESSAGE_ERROR]);

        transcript.remove_banner(banner_id);
        assert!(banner_messages(&transcript).is_empty());

        // Second removal must be a no-op.
        transcript.remove_banner(banner_id);
        assert!(transcript.cells().is_empty());
    }

    #[test]
    fn outcome_mapping_follows_the_error_taxonomy() {
        let verbatim = outcome_from_result(Err(ApiError::Backend {
            stage: "classify-chat-reply",
            message: "model overloaded".to_string(),
        }));
        assert_eq!(
            verbatim,
            SendOutcome::Failure {
                banner: "model overloaded".to_string()
            }
        );

        let generic = outcome_from_result(Err(ApiError::InvalidReply {
            stage: "classify-chat-reply",
        }));
        assert_eq!(
            generic,
            SendOutcome::Failure {
                banner: INVALID_REPLY_ERROR.to_string()
            }
        );

        let transport = outcome_from_result(Err(ApiError::EndpointStatus {
            stage: "post-chat",
            status: 502,
            body: String::new(),
        }));
        assert_eq!(
            transport,
            SendOutcome::Failure {
                banner: "Failed to connect: chat endpoint returned status 502".to_string()
            }
        );

        let success = outcome_from_result(Ok(BotReply {
            content: "Hi!".to_string(),
            session_id: Some("abc".to_string()),
        }));
        assert_eq!(
            success,
            SendOutcome::Reply {
                content: "Hi!".to_string(),
                session_id: Some("abc".to_string()),
            }
        );
    }
}
