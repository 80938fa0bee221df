// ============================================================================
// spark-reactive - Reactivity Module
// Dependency tracking, per-key deps, batching and effect scheduling
// ============================================================================

pub mod batching;
pub mod dep;
pub mod equality;
pub mod scheduling;
pub mod tracking;

// Re-export main tracking functions
pub use tracking::{is_dirty, notify_write, set_status, subscribe_all, track_read, unsubscribe_all};

// Re-export the per-key facade
pub use dep::{track, trigger};

// Re-export scheduling functions
pub use scheduling::{flush_sync, schedule_reaction};

// Re-export batching functions
pub use batching::{batch, enable_tracking, pause_tracking, peek, tick, untrack, TrackingGuard};
