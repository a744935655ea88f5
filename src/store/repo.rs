use anyhow::Result;

use crate::domain::email::MessageId;

/// Mailbox operations the handler needs from a mail provider.
///
/// Every id returned by `search` must be usable right away for the other calls.
pub trait MessageStore: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<MessageId>>;
    fn fetch_raw(&self, id: &str) -> Result<Vec<u8>>;

    fn delete(&self, id: &str) -> Result<()>;
    fn mark_read(&self, id: &str) -> Result<()>;
}
