// ============================================================================
// spark-reactive - Batching and Tracking Control
// Grouping writes into one flush, and regions that record no reads
// ============================================================================

use crate::core::context::with_context;
use crate::reactivity::scheduling::flush_sync;

// =============================================================================
// BATCH
// =============================================================================

/// Ends a batch level; the outermost level flushes. Also runs on unwind,
/// so a panicking batch still delivers the writes it made.
struct BatchLevel;

impl BatchLevel {
    fn enter() -> Self {
        with_context(|ctx| ctx.enter_batch());
        BatchLevel
    }
}

impl Drop for BatchLevel {
    fn drop(&mut self) {
        let outermost = with_context(|ctx| ctx.exit_batch() == 0 && !ctx.is_flushing());
        // A running flush drains the queue itself
        if outermost {
            flush_sync();
        }
    }
}

/// Run `f` with effect runs deferred until it returns.
///
/// An effect dirtied several times inside the batch runs once, after the
/// outermost batch ends.
///
/// # Example
///
/// ```
/// use spark_reactive::{batch, effect, object, reactive};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let point = reactive(object! { "x" => 0, "y" => 0 });
/// let runs = Rc::new(Cell::new(0));
///
/// let _dispose = effect({
///     let point = point.clone();
///     let runs = runs.clone();
///     move || {
///         let _ = (point.get("x"), point.get("y"));
///         runs.set(runs.get() + 1);
///     }
/// });
///
/// batch(|| {
///     point.set("x", 3);
///     point.set("y", 4);
/// });
/// assert_eq!(runs.get(), 2);
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    let _level = BatchLevel::enter();
    f()
}

/// Run every queued effect now.
///
/// Writes outside a batch already flush before returning, so this only
/// matters after queueing through the low-level context.
pub fn tick() {
    flush_sync();
}

// =============================================================================
// TRACKING CONTROL
// =============================================================================

/// Puts back the tracking state it replaced when dropped.
#[must_use = "tracking is restored as soon as the guard is dropped"]
pub struct TrackingGuard {
    prev_untracking: bool,
}

impl TrackingGuard {
    fn replace(untracking: bool) -> Self {
        Self {
            prev_untracking: with_context(|ctx| ctx.set_untracking(untracking)),
        }
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        with_context(|ctx| ctx.set_untracking(self.prev_untracking));
    }
}

/// Stop recording reads until the guard is dropped.
///
/// ```
/// use spark_reactive::{is_untracking, pause_tracking};
///
/// {
///     let _paused = pause_tracking();
///     assert!(is_untracking());
/// }
/// assert!(!is_untracking());
/// ```
pub fn pause_tracking() -> TrackingGuard {
    TrackingGuard::replace(true)
}

/// Record reads again until the guard is dropped, even in a paused region.
pub fn enable_tracking() -> TrackingGuard {
    TrackingGuard::replace(false)
}

/// Evaluate `f` without recording any of its reads.
///
/// ```
/// use spark_reactive::{effect, object, reactive, untrack};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let state = reactive(object! { "shown" => 1, "hidden" => 2 });
/// let runs = Rc::new(Cell::new(0));
///
/// let _dispose = effect({
///     let state = state.clone();
///     let runs = runs.clone();
///     move || {
///         let _ = state.get("shown");
///         let _ = untrack(|| state.get("hidden"));
///         runs.set(runs.get() + 1);
///     }
/// });
///
/// state.set("hidden", 20);
/// assert_eq!(runs.get(), 1);
///
/// state.set("shown", 10);
/// assert_eq!(runs.get(), 2);
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _paused = pause_tracking();
    f()
}

/// Same as `untrack`.
pub fn peek<T>(f: impl FnOnce() -> T) -> T {
    untrack(f)
}

// =============================================================================
// TESTS
// =============================================================================
