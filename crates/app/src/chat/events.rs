/// Emitted when the user triggers a send, via the send button or the Enter
/// key. The content is the raw input text; validation happens in the
/// transcript so that empty submissions still surface their error banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
