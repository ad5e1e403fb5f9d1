use thiserror::Error;

/// Errors surfaced at the registry boundary.
///
/// A failed call never mutates existing state: the offending subscription is
/// rejected and everything already registered stays as it was.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("topic name exceeds {limit} bytes")]
    NameTooLong { limit: usize },

    #[error("topic limit reached ({limit})")]
    TooManyTopics { limit: usize },

    #[error("subscriber limit reached on topic '{topic}' ({limit})")]
    CapacityExceeded { topic: String, limit: usize },
}
