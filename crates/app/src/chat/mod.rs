/// Event contracts for chat module wiring.
pub mod events;
/// Domain entities: turns, cells, typed identifiers.
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod scroll_manager;
/// Controller-owned conversation state and send lifecycle.
pub mod transcript;
pub mod view;

pub use events::Submit;
pub use message::{Banner, BannerId, HistoryCell, RequestId, Role, Turn, TurnId};
pub use message_input::MessageInput;
pub use message_list::{MessageList, WELCOME_MESSAGE};
pub use scroll_manager::ScrollManager;
pub use transcript::{
    AppliedOutcome, CompletionRejection, EMPTY_MESSAGE_ERROR, ERROR_BANNER_TTL,
    INVALID_REPLY_ERROR, OutboundChat, SendOutcome, SendRejection, Transcript,
    outcome_from_result,
};
pub use view::ChatView;
