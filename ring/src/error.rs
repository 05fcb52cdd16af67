use thiserror::Error;

pub type Result<T> = std::result::Result<T, RingError>;

/// Everything that can go wrong when talking to a ring.
///
/// Lookups on an empty ring are not an error; they return an absent value,
/// since "nobody owns this key yet" is a normal state for a fresh ring.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RingError {
    /// `add_node` was called with a name that is already registered.
    /// Remove the node first if the intent was to change its weight.
    #[error("node `{0}` is already on the ring")]
    DuplicateNode(String),
    #[error("node name must not be empty")]
    EmptyNodeName,
    #[error("node weight must be at least 1, got {0}")]
    InvalidWeight(u32),
    #[error("lookup key must not be empty")]
    EmptyKey,
    #[error("invalid ring config: {0}")]
    InvalidConfig(&'static str),
}
