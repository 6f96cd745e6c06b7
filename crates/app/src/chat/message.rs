use chrono::{DateTime, Local};

/// Stable identifier for one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u64);

impl TurnId {
    /// Creates a typed turn identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identifier for one in-flight chat request.
///
/// Allocated from a monotonic counter on every send, so "most recently
/// issued" is well defined when sends overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Creates a typed request identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Stable identifier for one transient error banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BannerId(pub u64);

impl BannerId {
    /// Creates a typed banner identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Conversation author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Bot,
}

/// One conversation turn. Append-only: never mutated after creation,
/// removed only by a full clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    /// Plain text for user turns; server-supplied rich markup for bot
    /// turns (rendered unescaped, see the trust note in DESIGN.md).
    pub content: String,
    /// Preformatted local wall-clock label (hour:minute).
    pub stamp: String,
}

impl Turn {
    pub fn new(id: TurnId, role: Role, content: impl Into<String>, stamp: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            stamp: stamp.into(),
        }
    }
}

/// Transient error banner. Not part of the conversation data; self-expires
/// after a fixed delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: BannerId,
    pub message: String,
}

/// One renderable entry in the history view, in append order.
///
/// Turns are the conversation itself; loading placeholders and banners are
/// ephemeral view cells that happen to live in the same visual flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryCell {
    Turn(Turn),
    Loading(RequestId),
    Banner(Banner),
}

/// Formats a timestamp the way turns display it: local time, hour:minute.
pub fn clock_label(time: &DateTime<Local>) -> String {
    time.format("%H:%M").to_string()
}

/// Returns the clock label for "now". Kept separate from `clock_label` so
/// tests can exercise formatting with fixed inputs.
pub fn clock_label_now() -> String {
    clock_label(&Local::now())
}
