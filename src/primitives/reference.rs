// ============================================================================
// spark-reactive - Ref Primitive
// A boxed single-slot value with its own dependency tracking
// ============================================================================
//
// A ref keeps the raw value it was given and, unless shallow, the reactive
// view of it. Reading `value()` tracks the ref; writing triggers only when
// the raw value actually changed. Stored inside a reactive object, a ref is
// unwrapped on read and written through on assignment.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::types::Dep;
use crate::core::value::Value;
use crate::proxy::reactive::{is_readonly, is_shallow, to_raw, to_reactive};
use crate::reactivity::equality::has_changed;
use crate::reactivity::tracking::{notify_write, track_read};

// =============================================================================
// REF
// =============================================================================

struct RefInner {
    /// The value as written, unwrapped to raw unless shallow
    raw: RefCell<Value>,

    /// The value handed out by `value()`
    current: RefCell<Value>,

    dep: Rc<Dep>,

    shallow: bool,
}

/// A reactive box around one `Value`.
///
/// # Example
///
/// ```
/// use spark_reactive::{effect, Ref};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let count = Ref::new(1);
/// let seen = Rc::new(Cell::new(0.0));
///
/// let _dispose = effect({
///     let count = count.clone();
///     let seen = seen.clone();
///     move || seen.set(count.value().as_number().unwrap_or(0.0))
/// });
///
/// count.set_value(2);
/// assert_eq!(seen.get(), 2.0);
/// ```
#[derive(Clone)]
pub struct Ref {
    inner: Rc<RefInner>,
}

impl Ref {
    /// Create a deep ref: objects stored in it are read back reactive.
    pub fn new(value: impl Into<Value>) -> Self {
        Self::with_mode(value.into(), false)
    }

    /// Create a shallow ref: the value is stored and returned as given.
    pub fn shallow(value: impl Into<Value>) -> Self {
        Self::with_mode(value.into(), true)
    }

    fn with_mode(value: Value, shallow: bool) -> Self {
        let raw = if shallow { value.clone() } else { to_raw(&value) };
        let current = if shallow { value } else { to_reactive(&value) };

        Self {
            inner: Rc::new(RefInner {
                raw: RefCell::new(raw),
                current: RefCell::new(current),
                dep: Rc::new(Dep::new()),
                shallow,
            }),
        }
    }

    /// Read the current value, registering the ref as a dependency.
    pub fn value(&self) -> Value {
        track_read(&self.inner.dep);
        self.peek()
    }

    /// Read the current value without tracking.
    pub fn peek(&self) -> Value {
        self.inner.current.borrow().clone()
    }

    /// Replace the value. Returns true if it changed.
    pub fn set_value(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let direct = self.inner.shallow || is_shallow(&value) || is_readonly(&value);
        let raw = if direct { value.clone() } else { to_raw(&value) };

        if !has_changed(&raw, &self.inner.raw.borrow()) {
            return false;
        }

        let current = if direct { value } else { to_reactive(&raw) };
        *self.inner.raw.borrow_mut() = raw;
        *self.inner.current.borrow_mut() = current;
        notify_write(&self.inner.dep);
        true
    }

    /// Number of changes written so far.
    pub fn version(&self) -> u32 {
        self.inner.dep.version()
    }

    /// Whether this ref stores values without wrapping them.
    pub fn is_shallow(&self) -> bool {
        self.inner.shallow
    }

    /// Address of the shared cell, stable for the life of the ref.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.peek())
            .field("shallow", &self.inner.shallow)
            .finish()
    }
}

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

/// Whether the value is a ref.
pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

/// The ref's value if `value` is a ref, otherwise `value` itself.
pub fn unref(value: &Value) -> Value {
    match value {
        Value::Ref(r) => r.value(),
        other => other.clone(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
