/// Failures the handler reports to its caller instead of degrading to a default.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The query was expected to identify exactly one message.
    #[error("exactly one message shall be found for '{query}', but was {found}")]
    NotUnique { query: String, found: usize },
}
