// ============================================================================
// spark-reactive - Equality Functions
// Value comparisons used by searches and the change predicate
// ============================================================================
//
// Compound values compare by identity only. There is no deep comparison:
// replacing an object with a structurally equal copy is a change.
// ============================================================================

use crate::core::value::Value;

// =============================================================================
// NUMBER EQUALITY
// =============================================================================

/// Safe not-equal check for f64.
/// Handles NaN correctly: NaN == NaN returns true (unlike IEEE 754).
///
/// # Example
/// ```
/// use spark_reactive::reactivity::equality::safe_not_equal_f64;
///
/// assert!(safe_not_equal_f64(&1.0, &2.0));
/// assert!(!safe_not_equal_f64(&1.0, &1.0));
///
/// // NaN is considered equal to NaN
/// assert!(!safe_not_equal_f64(&f64::NAN, &f64::NAN));
/// assert!(safe_not_equal_f64(&f64::NAN, &1.0));
/// ```
pub fn safe_not_equal_f64(a: &f64, b: &f64) -> bool {
    if a.is_nan() {
        return !b.is_nan();
    }
    a != b
}

// =============================================================================
// VALUE EQUALITY
// =============================================================================

/// Same type and same primitive value, or the same object/proxy/ref handle.
/// Numbers use IEEE comparison, so `NaN` is never equal to itself.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => identical_non_number(a, b),
    }
}

/// Like `strict_equals`, except `NaN` equals `NaN`.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => !safe_not_equal_f64(x, y),
        _ => identical_non_number(a, b),
    }
}

fn identical_non_number(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
        (Value::Proxy(x), Value::Proxy(y)) => x.ptr_eq(y),
        (Value::Ref(x), Value::Ref(y)) => x.ptr_eq(y),
        _ => false,
    }
}

/// The change predicate for writes: strict inequality, except that
/// replacing `NaN` with `NaN` is not a change.
///
/// # Example
/// ```
/// use spark_reactive::reactivity::equality::has_changed;
/// use spark_reactive::Value;
///
/// assert!(has_changed(&Value::from(1), &Value::from(2)));
/// assert!(!has_changed(&Value::from(f64::NAN), &Value::from(f64::NAN)));
/// assert!(!has_changed(&Value::from("a"), &Value::from("a")));
/// ```
pub fn has_changed(value: &Value, old_value: &Value) -> bool {
    !same_value_zero(value, old_value)
}

// =============================================================================
// TESTS
// =============================================================================
