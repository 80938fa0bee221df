// ============================================================================
// spark-reactive - Errors
// ============================================================================

use thiserror::Error;

/// Why a value could not be wrapped in a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    #[error("value cannot be made reactive: {type_name}")]
    NotAnObject { type_name: &'static str },

    #[error("object is marked raw and is never wrapped")]
    MarkedRaw,
}
