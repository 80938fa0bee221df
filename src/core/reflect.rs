// ============================================================================
// spark-reactive - Reflect
// Object operations dispatched over any value: raw, proxied or boxed
// ============================================================================
//
// Raw objects run their ordinary semantics, proxies run their handler set,
// refs expose `value`. Everything else behaves like a primitive: reads give
// `undefined` and writes fail.
// ============================================================================

use crate::core::constants::IS_REF_KEY;
use crate::core::value::{Key, Value};

pub fn get(obj: &Value, key: &Key, receiver: &Value) -> Value {
    match obj {
        Value::Object(target) => target.get(key, receiver),
        Value::Proxy(proxy) => proxy.get(key, receiver),
        Value::Ref(r) => match key.as_name() {
            Some("value") => r.value(),
            Some(IS_REF_KEY) => Value::Bool(true),
            _ => Value::Undefined,
        },
        _ => Value::Undefined,
    }
}

pub fn set(obj: &Value, key: &Key, value: Value, receiver: &Value) -> bool {
    match obj {
        Value::Object(target) => target.set(key, value, receiver),
        Value::Proxy(proxy) => proxy.set(key, value, receiver),
        Value::Ref(r) if key.as_name() == Some("value") => {
            r.set_value(value);
            true
        }
        _ => false,
    }
}

/// Define an own data property. Proxies have no define trap, so this lands
/// on the proxied object without tracking or triggering.
pub fn define(obj: &Value, key: &Key, value: Value) -> bool {
    match obj {
        Value::Object(target) => target.define(key, value),
        Value::Proxy(proxy) => define(proxy.target(), key, value),
        _ => false,
    }
}

pub fn delete(obj: &Value, key: &Key) -> bool {
    match obj {
        Value::Object(target) => target.delete(key),
        Value::Proxy(proxy) => proxy.delete_property(key),
        _ => false,
    }
}

pub fn has(obj: &Value, key: &Key) -> bool {
    match obj {
        Value::Object(target) => target.has(key),
        Value::Proxy(proxy) => proxy.has(key),
        Value::Ref(_) => matches!(key.as_name(), Some("value") | Some(IS_REF_KEY)),
        _ => false,
    }
}

/// Untrapped own-property check.
pub fn has_own(obj: &Value, key: &Key) -> bool {
    match obj {
        Value::Object(target) => target.has_own(key),
        Value::Proxy(proxy) => has_own(proxy.target(), key),
        _ => false,
    }
}

pub fn own_keys(obj: &Value) -> Vec<Key> {
    match obj {
        Value::Object(target) => target.own_keys(),
        Value::Proxy(proxy) => proxy.own_keys(),
        _ => Vec::new(),
    }
}

/// Whether the value is an array, looking through proxies.
pub fn is_array(obj: &Value) -> bool {
    match obj {
        Value::Object(target) => target.is_array(),
        Value::Proxy(proxy) => is_array(proxy.target()),
        _ => false,
    }
}

// =============================================================================
// ERGONOMIC ACCESS
// =============================================================================
//
// Property access with the value itself as receiver, the way `obj.key` reads.
// =============================================================================

impl Value {
    pub fn get(&self, key: impl Into<Key>) -> Value {
        get(self, &key.into(), self)
    }

    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> bool {
        set(self, &key.into(), value.into(), self)
    }

    pub fn delete(&self, key: impl Into<Key>) -> bool {
        delete(self, &key.into())
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        has(self, &key.into())
    }

    pub fn own_keys(&self) -> Vec<Key> {
        own_keys(self)
    }

    pub fn is_array(&self) -> bool {
        is_array(self)
    }

    /// `length` read through the normal (possibly tracked) path.
    pub fn len(&self) -> usize {
        self.get(Key::length())
            .as_number()
            .and_then(crate::core::target::to_array_length)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
