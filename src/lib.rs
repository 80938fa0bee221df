// ============================================================================
// spark-reactive - Fine-grained Reactive Objects for Rust
// ============================================================================
//
// Records and arrays are wrapped in transparent proxies. Reads through a
// proxy record a dependency on the exact key that was read; writes notify
// only the effects that read that key. Nested objects are wrapped lazily,
// refs stored in objects are unwrapped, and read-only views reject writes.
// ============================================================================

//! Fine-grained reactive objects.
//!
//! ```
//! use spark_reactive::{array, effect, object, reactive};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let state = reactive(object! {
//!     "title" => "todo",
//!     "items" => array![],
//! });
//!
//! let count = Rc::new(Cell::new(0));
//! let _dispose = effect({
//!     let state = state.clone();
//!     let count = count.clone();
//!     move || count.set(state.get("items").len())
//! });
//!
//! // Nested arrays come back wrapped, so pushing notifies the effect
//! state.get("items").push(["write docs"]);
//! assert_eq!(count.get(), 1);
//!
//! // Unrelated keys do not
//! state.set("title", "done");
//! assert_eq!(count.get(), 1);
//! ```

pub mod core;
pub mod macros;
pub mod primitives;
pub mod proxy;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use core::constants::{self, ReactiveFlag, TrackOp, TriggerOp};
pub use core::context::{is_batching, is_tracking, is_untracking, with_context, ReactiveContext};
pub use core::error::ReactiveError;
pub use core::target::Target;
pub use core::types::{AnyReaction, Dep};
pub use core::value::{Key, Symbol, Value, WellKnownSymbol};

// Re-export the proxy layer
pub use proxy::{
    is_proxy, is_reactive, is_readonly, is_shallow, mark_raw, reactive, readonly,
    shallow_reactive, shallow_readonly, to_raw, to_reactive, to_readonly, ArrayMethod, Mode,
    Proxy,
};

// Re-export primitives
pub use primitives::effect::{
    effect, effect_root, effect_sync, effect_sync_with_cleanup, effect_tracking,
    effect_with_cleanup, CleanupFn, EffectFn,
};
pub use primitives::reference::{is_ref, unref, Ref};

// Re-export reactivity functions
pub use reactivity::batching::{
    batch, enable_tracking, pause_tracking, peek, tick, untrack, TrackingGuard,
};
pub use reactivity::dep::{track, trigger};
pub use reactivity::equality::{has_changed, same_value_zero, strict_equals};
pub use reactivity::scheduling::flush_sync;

// =============================================================================
// TESTS
// =============================================================================
