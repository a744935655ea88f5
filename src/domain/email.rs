/// Opaque identifier handed out by a [`MessageStore`](crate::store::repo::MessageStore).
pub type MessageId = String;

/// A message together with its extracted plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub id: MessageId,
    pub content: String,
}

impl Email {
    pub fn new(id: impl Into<MessageId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }

    /// The value handed back when the body could not be fetched or parsed.
    pub fn empty(id: impl Into<MessageId>) -> Self {
        Self::new(id, String::new())
    }
}
