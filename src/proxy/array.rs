// ============================================================================
// spark-reactive - Array Methods
// Native array algorithms plus the instrumented versions mutable proxies use
// ============================================================================
//
// The native algorithms run against a receiver through the reflect layer,
// so on a proxy every internal read and write passes through its traps just
// like the built-ins would.
//
// Mutable array proxies instrument two families:
// - searches track every index, then retry with raw values on a miss;
// - length-changing methods run with tracking paused, so the `length` they
//   read internally never becomes a dependency of the calling effect, and
//   inside one batch, so no effect observes a half-applied mutation.
// ============================================================================

use crate::core::constants::TrackOp;
use crate::core::reflect;
use crate::core::value::{Key, Value};
use crate::proxy::reactive::to_raw;
use crate::reactivity::batching::{batch, pause_tracking};
use crate::reactivity::dep::track;
use crate::reactivity::equality::{same_value_zero, strict_equals};

// =============================================================================
// METHOD NAMES
// =============================================================================

/// Array methods with an instrumented version on mutable proxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayMethod {
    Includes,
    IndexOf,
    LastIndexOf,
    Push,
    Pop,
    Shift,
    Unshift,
    Splice,
}

impl ArrayMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "includes" => Some(ArrayMethod::Includes),
            "indexOf" => Some(ArrayMethod::IndexOf),
            "lastIndexOf" => Some(ArrayMethod::LastIndexOf),
            "push" => Some(ArrayMethod::Push),
            "pop" => Some(ArrayMethod::Pop),
            "shift" => Some(ArrayMethod::Shift),
            "unshift" => Some(ArrayMethod::Unshift),
            "splice" => Some(ArrayMethod::Splice),
            _ => None,
        }
    }

    pub fn from_key(key: &Key) -> Option<Self> {
        key.as_name().and_then(Self::from_name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ArrayMethod::Includes => "includes",
            ArrayMethod::IndexOf => "indexOf",
            ArrayMethod::LastIndexOf => "lastIndexOf",
            ArrayMethod::Push => "push",
            ArrayMethod::Pop => "pop",
            ArrayMethod::Shift => "shift",
            ArrayMethod::Unshift => "unshift",
            ArrayMethod::Splice => "splice",
        }
    }

    /// Identity-sensitive searches.
    pub fn is_search(self) -> bool {
        matches!(
            self,
            ArrayMethod::Includes | ArrayMethod::IndexOf | ArrayMethod::LastIndexOf
        )
    }

    /// Methods that read and write `length`.
    pub fn mutates_length(self) -> bool {
        !self.is_search()
    }
}

/// Whether calls on `receiver` go through the instrumented versions.
fn is_instrumented(receiver: &Value) -> bool {
    receiver
        .as_proxy()
        .is_some_and(|proxy| !proxy.mode().is_readonly() && reflect::is_array(proxy.target()))
}

// =============================================================================
// SEARCH
// =============================================================================

#[derive(Clone, Copy)]
enum Search {
    Includes,
    First,
    Last,
}

fn index_key(index: usize) -> Key {
    Key::from(index)
}

/// The native search. `unwrap` compares raw forms of the elements.
fn native_search(this: &Value, search: Search, needle: &Value, unwrap: bool) -> Option<usize> {
    let len = this.len();
    let element = |index: usize| {
        let value = reflect::get(this, &index_key(index), this);
        if unwrap {
            to_raw(&value)
        } else {
            value
        }
    };

    match search {
        // includes reads holes as undefined and matches NaN
        Search::Includes => (0..len).find(|&i| same_value_zero(&element(i), needle)),
        Search::First => (0..len)
            .find(|&i| reflect::has(this, &index_key(i)) && strict_equals(&element(i), needle)),
        Search::Last => (0..len)
            .rev()
            .find(|&i| reflect::has(this, &index_key(i)) && strict_equals(&element(i), needle)),
    }
}

fn search(this: &Value, search: Search, needle: &Value) -> Option<usize> {
    if !is_instrumented(this) {
        return native_search(this, search, needle, false);
    }

    let raw = to_raw(this);
    if let Some(raw_target) = raw.as_target() {
        for index in 0..this.len() {
            track(raw_target, TrackOp::Get, &index_key(index));
        }
    }

    // First with the caller's value as given, then with raw forms on both
    // sides so a raw needle finds its wrapped element and vice versa
    native_search(&raw, search, needle, false)
        .or_else(|| native_search(&raw, search, &to_raw(needle), true))
}

// =============================================================================
// NATIVE MUTATORS
// =============================================================================

fn set_length(this: &Value, len: usize) {
    reflect::set(this, &Key::length(), Value::from(len), this);
}

/// Move the element at `from` to `to`, or delete `to` if `from` is a hole.
fn move_element(this: &Value, from: usize, to: usize) {
    let from = index_key(from);
    let to = index_key(to);
    if reflect::has(this, &from) {
        let value = reflect::get(this, &from, this);
        reflect::set(this, &to, value, this);
    } else {
        reflect::delete(this, &to);
    }
}

fn native_push(this: &Value, items: Vec<Value>) -> usize {
    let mut len = this.len();
    for item in items {
        reflect::set(this, &index_key(len), item, this);
        len += 1;
    }
    set_length(this, len);
    len
}

fn native_pop(this: &Value) -> Value {
    let len = this.len();
    if len == 0 {
        set_length(this, 0);
        return Value::Undefined;
    }
    let last = index_key(len - 1);
    let element = reflect::get(this, &last, this);
    reflect::delete(this, &last);
    set_length(this, len - 1);
    element
}

fn native_shift(this: &Value) -> Value {
    let len = this.len();
    if len == 0 {
        set_length(this, 0);
        return Value::Undefined;
    }
    let first = reflect::get(this, &index_key(0), this);
    for k in 1..len {
        move_element(this, k, k - 1);
    }
    reflect::delete(this, &index_key(len - 1));
    set_length(this, len - 1);
    first
}

fn native_unshift(this: &Value, items: Vec<Value>) -> usize {
    let len = this.len();
    let count = items.len();
    if count > 0 {
        for k in (0..len).rev() {
            move_element(this, k, k + count);
        }
        for (j, item) in items.into_iter().enumerate() {
            reflect::set(this, &index_key(j), item, this);
        }
    }
    set_length(this, len + count);
    len + count
}

fn native_splice(this: &Value, start: i64, delete_count: Option<usize>, items: Vec<Value>) -> Vec<Value> {
    let len = this.len();
    let start = if start < 0 {
        len.saturating_sub(start.unsigned_abs() as usize)
    } else {
        (start as usize).min(len)
    };
    let delete_count = delete_count.unwrap_or(len - start).min(len - start);
    let item_count = items.len();

    let removed = (0..delete_count)
        .map(|k| reflect::get(this, &index_key(start + k), this))
        .collect();

    if item_count < delete_count {
        for k in start..(len - delete_count) {
            move_element(this, k + delete_count, k + item_count);
        }
        for k in ((len - delete_count + item_count)..len).rev() {
            reflect::delete(this, &index_key(k));
        }
    } else if item_count > delete_count {
        for k in (start..(len - delete_count)).rev() {
            move_element(this, k + delete_count, k + item_count);
        }
    }

    for (j, item) in items.into_iter().enumerate() {
        reflect::set(this, &index_key(start + j), item, this);
    }
    set_length(this, len - delete_count + item_count);
    removed
}

/// Run a length-changing method. On an instrumented receiver the reads it
/// makes are not tracked and its writes notify once, after `length` is final.
fn mutate<R>(this: &Value, f: impl FnOnce() -> R) -> R {
    if is_instrumented(this) {
        batch(|| {
            let _paused = pause_tracking();
            f()
        })
    } else {
        f()
    }
}

// =============================================================================
// VALUE ARRAY API
// =============================================================================

impl Value {
    /// SameValueZero membership test.
    pub fn includes(&self, needle: impl Into<Value>) -> bool {
        search(self, Search::Includes, &needle.into()).is_some()
    }

    /// First index strictly equal to `needle`.
    pub fn index_of(&self, needle: impl Into<Value>) -> Option<usize> {
        search(self, Search::First, &needle.into())
    }

    /// Last index strictly equal to `needle`.
    pub fn last_index_of(&self, needle: impl Into<Value>) -> Option<usize> {
        search(self, Search::Last, &needle.into())
    }

    /// Append items, returning the new length.
    pub fn push<V: Into<Value>>(&self, items: impl IntoIterator<Item = V>) -> usize {
        let items = items.into_iter().map(Into::into).collect();
        mutate(self, || native_push(self, items))
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Value {
        mutate(self, || native_pop(self))
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Value {
        mutate(self, || native_shift(self))
    }

    /// Prepend items, returning the new length.
    pub fn unshift<V: Into<Value>>(&self, items: impl IntoIterator<Item = V>) -> usize {
        let items = items.into_iter().map(Into::into).collect();
        mutate(self, || native_unshift(self, items))
    }

    /// Remove `delete_count` elements at `start` (negative counts from the
    /// end, `None` removes the rest) and insert `items` in their place.
    pub fn splice<V: Into<Value>>(
        &self,
        start: i64,
        delete_count: Option<usize>,
        items: impl IntoIterator<Item = V>,
    ) -> Vec<Value> {
        let items = items.into_iter().map(Into::into).collect();
        mutate(self, || native_splice(self, start, delete_count, items))
    }

    /// Call an array method by name with dynamic arguments.
    ///
    /// Returns `None` when `self` is not an array or `name` is not one of
    /// the supported methods. Search misses return `false` or `-1`.
    pub fn call(&self, name: &str, args: &[Value]) -> Option<Value> {
        if !self.is_array() {
            return None;
        }
        let method = ArrayMethod::from_name(name)?;
        let first = args.first().cloned().unwrap_or_default();
        let position = |found: Option<usize>| found.map_or(Value::from(-1), Value::from);

        let result = match method {
            ArrayMethod::Includes => Value::from(self.includes(first)),
            ArrayMethod::IndexOf => position(self.index_of(first)),
            ArrayMethod::LastIndexOf => position(self.last_index_of(first)),
            ArrayMethod::Push => Value::from(self.push(args.iter().cloned())),
            ArrayMethod::Pop => self.pop(),
            ArrayMethod::Shift => self.shift(),
            ArrayMethod::Unshift => Value::from(self.unshift(args.iter().cloned())),
            ArrayMethod::Splice => {
                let start = first.as_number().map_or(0, |n| n as i64);
                let delete_count = args
                    .get(1)
                    .map(|count| count.as_number().map_or(0, |n| n.max(0.0) as usize));
                let removed = self.splice(start, delete_count, args.iter().skip(2).cloned());
                Value::from(removed)
            }
        };
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================
