use thiserror::Error;

/// Failures surfaced by the relay capabilities
///
/// None of these reach the hosting page: the glue logs them and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("background channel error: {0}")]
    Channel(String),

    #[error("page message bus error: {0}")]
    PageBus(String),

    #[error("permissions iframe `{0}` not found")]
    MissingFrame(String),

    #[error("tabs api error: {0}")]
    Tabs(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid config: {0}")]
    Config(String),
}
