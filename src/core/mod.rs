// ============================================================================
// spark-reactive - Core Module
// Value model, raw objects, reflection and the thread-local context
// ============================================================================

pub mod constants;
pub mod context;
pub mod error;
pub mod reflect;
pub mod target;
pub mod types;
pub mod value;

// Re-export commonly used items
pub use constants::*;
pub use context::{is_batching, is_tracking, is_untracking, with_context, ReactiveContext};
pub use error::ReactiveError;
pub use target::Target;
pub use types::{AnyReaction, Dep};
pub use value::{Key, Symbol, Value, WellKnownSymbol};
