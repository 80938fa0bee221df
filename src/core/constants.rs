// ============================================================================
// spark-reactive - Constants
// Effect flags, proxy marker keys and dependency operation kinds
// ============================================================================

// =============================================================================
// EFFECT FLAGS
// =============================================================================
//
// Kind bits are fixed at creation. Exactly one status bit (CLEAN or DIRTY)
// is set at a time; DESTROYED is independent.
// =============================================================================

/// Scheduled by the flush loop when a dependency changes
pub const EFFECT: u32 = 1 << 0;

/// First run happens at creation, even inside a batch or flush
pub const SYNC_EFFECT: u32 = 1 << 1;

/// Owns the effects created in its body; never re-runs
pub const ROOT_EFFECT: u32 = 1 << 2;

/// Up to date with every dependency
pub const CLEAN: u32 = 1 << 8;

/// A dependency changed since the last run
pub const DIRTY: u32 = 1 << 9;

/// Disposed; never runs again
pub const DESTROYED: u32 = 1 << 10;

/// Clears the status bits
pub const STATUS_MASK: u32 = !(DIRTY | CLEAN);

// =============================================================================
// PROXY MARKER KEYS
// =============================================================================

/// Marker keys answered by the proxy read path without touching the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactiveFlag {
    /// Set on objects that must never be wrapped
    Skip,
    /// True on mutable proxies
    IsReactive,
    /// True on read-only proxies
    IsReadonly,
    /// Escape hatch returning the wrapped target
    Raw,
}

impl ReactiveFlag {
    /// The property name this marker is read through.
    pub const fn name(self) -> &'static str {
        match self {
            ReactiveFlag::Skip => "__v_skip",
            ReactiveFlag::IsReactive => "__v_isReactive",
            ReactiveFlag::IsReadonly => "__v_isReadonly",
            ReactiveFlag::Raw => "__v_raw",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "__v_skip" => Some(ReactiveFlag::Skip),
            "__v_isReactive" => Some(ReactiveFlag::IsReactive),
            "__v_isReadonly" => Some(ReactiveFlag::IsReadonly),
            "__v_raw" => Some(ReactiveFlag::Raw),
            _ => None,
        }
    }
}

/// Property name identifying boxed references.
pub const IS_REF_KEY: &str = "__v_isRef";

// =============================================================================
// DEPENDENCY OPERATIONS
// =============================================================================

/// Kind of read recorded by `track`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOp {
    Get,
    Has,
    Iterate,
}

/// Kind of mutation reported to `trigger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOp {
    Set,
    Add,
    Delete,
}

// =============================================================================
// TESTS
// =============================================================================
