// ============================================================================
// spark-reactive - Wrapping API
// Creating, looking up and unwrapping proxies
// ============================================================================
//
// Every raw object has at most one live proxy per mode. Wrapping is lazy:
// nested objects are wrapped when they are read, never up front.
// ============================================================================

use tracing::warn;

use crate::core::constants::ReactiveFlag;
use crate::core::context::with_context;
use crate::core::error::ReactiveError;
use crate::core::reflect;
use crate::core::value::{Key, Value};
use crate::proxy::{Mode, Proxy};

// =============================================================================
// CREATE
// =============================================================================

fn flag(value: &Value, flag: ReactiveFlag) -> Value {
    reflect::get(value, &Key::from(flag.name()), value)
}

/// Find or create the proxy for `value` in `mode`.
fn create_proxy(value: &Value, mode: Mode) -> Result<Proxy, ReactiveError> {
    if !value.is_object() {
        return Err(ReactiveError::NotAnObject {
            type_name: value.type_name(),
        });
    }

    // Already a proxy. A read-only view over a mutable proxy is the one
    // case where a proxy gets wrapped again.
    if let Value::Proxy(proxy) = value {
        let wraps_mutable = mode.is_readonly() && flag(value, ReactiveFlag::IsReactive).is_truthy();
        if flag(value, ReactiveFlag::Raw).is_truthy() && !wraps_mutable {
            return Ok(proxy.clone());
        }
    }

    let Some(target_id) = value.identity() else {
        return Err(ReactiveError::NotAnObject {
            type_name: value.type_name(),
        });
    };

    if let Some(existing) = with_context(|ctx| ctx.proxies.get(mode, target_id)) {
        return Ok(existing);
    }

    if value.as_target().is_some_and(|target| target.is_marked_raw()) {
        return Err(ReactiveError::MarkedRaw);
    }

    let proxy = Proxy::from_parts(value.clone(), mode);
    with_context(|ctx| ctx.proxies.insert(mode, target_id, &proxy));
    Ok(proxy)
}

impl Proxy {
    /// Wrap `value` in `mode`, returning the existing proxy if there is one.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::NotAnObject`] for primitives and refs,
    /// [`ReactiveError::MarkedRaw`] for objects passed to [`mark_raw`].
    pub fn new(value: impl Into<Value>, mode: Mode) -> Result<Proxy, ReactiveError> {
        create_proxy(&value.into(), mode)
    }
}

/// The infallible form: values that cannot be wrapped come back unchanged.
fn wrap(value: Value, mode: Mode) -> Value {
    match create_proxy(&value, mode) {
        Ok(proxy) => Value::Proxy(proxy),
        Err(ReactiveError::NotAnObject { type_name }) => {
            if cfg!(feature = "dev-warnings") {
                warn!(?value, "value cannot be made reactive: {}", type_name);
            }
            value
        }
        Err(ReactiveError::MarkedRaw) => value,
    }
}

// =============================================================================
// WRAPPING CONSTRUCTORS
// =============================================================================

/// A deep mutable proxy: reads are tracked, nested objects are wrapped on
/// access and writes notify dependents.
///
/// # Example
///
/// ```
/// use spark_reactive::{object, reactive, to_raw};
///
/// let raw = object! { "count" => 0 };
/// let state = reactive(raw.clone());
///
/// // Idempotent per raw object
/// assert_eq!(reactive(raw.clone()), state);
/// assert_eq!(reactive(state.clone()), state);
/// assert_eq!(to_raw(&state), raw);
/// ```
pub fn reactive(value: impl Into<Value>) -> Value {
    let value = value.into();
    // A read-only view stays read-only
    if is_readonly(&value) {
        return value;
    }
    wrap(value, Mode::Reactive)
}

/// Only top-level keys are tracked; values are returned and stored as-is.
pub fn shallow_reactive(value: impl Into<Value>) -> Value {
    wrap(value.into(), Mode::ShallowReactive)
}

/// A deep read-only proxy: writes and deletes are ignored, nested objects
/// come back read-only.
pub fn readonly(value: impl Into<Value>) -> Value {
    wrap(value.into(), Mode::Readonly)
}

/// Read-only at the top level only.
pub fn shallow_readonly(value: impl Into<Value>) -> Value {
    wrap(value.into(), Mode::ShallowReadonly)
}

// =============================================================================
// INSPECTION
// =============================================================================

/// The raw object behind any number of proxy layers, or `value` itself.
pub fn to_raw(value: &Value) -> Value {
    if !value.is_object() {
        return value.clone();
    }
    let raw = flag(value, ReactiveFlag::Raw);
    if raw.is_object() {
        to_raw(&raw)
    } else {
        value.clone()
    }
}

/// True for mutable proxies, and for read-only views over them.
pub fn is_reactive(value: &Value) -> bool {
    if is_readonly(value) {
        return is_reactive(&flag(value, ReactiveFlag::Raw));
    }
    flag(value, ReactiveFlag::IsReactive).is_truthy()
}

pub fn is_readonly(value: &Value) -> bool {
    flag(value, ReactiveFlag::IsReadonly).is_truthy()
}

pub fn is_shallow(value: &Value) -> bool {
    value.as_proxy().is_some_and(|proxy| proxy.mode().is_shallow())
}

pub fn is_proxy(value: &Value) -> bool {
    is_reactive(value) || is_readonly(value)
}

/// Exclude an object from wrapping. The wrapping constructors return it
/// unchanged from now on.
pub fn mark_raw(value: &Value) -> Value {
    if let Some(target) = to_raw(value).as_target() {
        target.mark_skip();
    }
    value.clone()
}

/// `reactive` for objects, identity for everything else.
pub fn to_reactive(value: &Value) -> Value {
    if value.is_object() {
        reactive(value)
    } else {
        value.clone()
    }
}

/// `readonly` for objects, identity for everything else.
pub fn to_readonly(value: &Value) -> Value {
    if value.is_object() {
        readonly(value)
    } else {
        value.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================
