// ============================================================================
// spark-reactive - Raw Objects
// Records and arrays with ordinary (unintercepted) property semantics
// ============================================================================
//
// A Target is the plain backing data a proxy observes. Its operations never
// track or trigger. Reads and writes that miss an own property continue on
// the prototype through the reflect layer, carrying the original receiver so
// proxies further up the chain can tell they are not the write target.
//
// Borrow rule: never hold a borrow of `data` across a call into reflect,
// since the prototype may be a proxy that calls back into this object.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::core::context::release_target;
use crate::core::reflect;
use crate::core::value::{Key, Value};

// =============================================================================
// TARGET DATA
// =============================================================================

enum TargetData {
    Record {
        props: IndexMap<Key, Value>,
        proto: Option<Value>,
    },
    /// Elements are stored sparsely: an index below `len` with no entry is
    /// a hole, in bounds but not an own property.
    Array {
        elements: BTreeMap<usize, Value>,
        len: usize,
        props: IndexMap<Key, Value>,
    },
}

pub struct TargetInner {
    data: RefCell<TargetData>,
    skip: Cell<bool>,
}

impl Drop for TargetInner {
    fn drop(&mut self) {
        release_target(self as *const TargetInner as usize);
    }
}

// =============================================================================
// TARGET HANDLE
// =============================================================================

/// A raw object or array. Clones share the same allocation.
#[derive(Clone)]
pub struct Target(Rc<TargetInner>);

impl Target {
    fn from_data(data: TargetData) -> Self {
        Target(Rc::new(TargetInner {
            data: RefCell::new(data),
            skip: Cell::new(false),
        }))
    }

    /// An empty record with no prototype.
    pub fn record() -> Self {
        Self::from_data(TargetData::Record {
            props: IndexMap::new(),
            proto: None,
        })
    }

    /// An empty record whose missing keys resolve through `proto`.
    pub fn with_proto(proto: impl Into<Value>) -> Self {
        Self::from_data(TargetData::Record {
            props: IndexMap::new(),
            proto: Some(proto.into()),
        })
    }

    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let target = Self::record();
        for (key, value) in entries {
            target.define(&key.into(), value.into());
        }
        target
    }

    /// An empty array.
    pub fn array() -> Self {
        Self::from_data(TargetData::Array {
            elements: BTreeMap::new(),
            len: 0,
            props: IndexMap::new(),
        })
    }

    pub fn from_values<V, I>(values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let elements: BTreeMap<usize, Value> =
            values.into_iter().map(Into::into).enumerate().collect();
        Self::from_data(TargetData::Array {
            len: elements.len(),
            elements,
            props: IndexMap::new(),
        })
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    /// Address of the allocation, stable for the object's lifetime.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Target) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> Weak<TargetInner> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn is_same_allocation(&self, weak: &Weak<TargetInner>) -> bool {
        std::ptr::eq(weak.as_ptr(), Rc::as_ptr(&self.0))
    }

    pub fn is_array(&self) -> bool {
        matches!(&*self.0.data.borrow(), TargetData::Array { .. })
    }

    /// Array length, or `None` for records.
    pub fn array_len(&self) -> Option<usize> {
        match &*self.0.data.borrow() {
            TargetData::Array { len, .. } => Some(*len),
            TargetData::Record { .. } => None,
        }
    }

    /// Array elements with holes read as `undefined`.
    pub fn items(&self) -> Vec<Value> {
        match &*self.0.data.borrow() {
            TargetData::Array { elements, len, .. } => (0..*len)
                .map(|index| elements.get(&index).cloned().unwrap_or_default())
                .collect(),
            TargetData::Record { .. } => Vec::new(),
        }
    }

    pub fn proto(&self) -> Option<Value> {
        match &*self.0.data.borrow() {
            TargetData::Record { proto, .. } => proto.clone(),
            TargetData::Array { .. } => None,
        }
    }

    /// Replace the prototype of a record. Arrays have no prototype.
    pub fn set_proto(&self, new_proto: Option<Value>) -> bool {
        let old = match &mut *self.0.data.borrow_mut() {
            TargetData::Record { proto, .. } => std::mem::replace(proto, new_proto),
            TargetData::Array { .. } => return false,
        };
        drop(old);
        true
    }

    // =========================================================================
    // SKIP MARKER
    // =========================================================================

    pub(crate) fn mark_skip(&self) {
        self.0.skip.set(true);
    }

    pub fn is_marked_raw(&self) -> bool {
        self.0.skip.get()
    }

    // =========================================================================
    // ORDINARY OPERATIONS
    // =========================================================================

    /// Read `key`, continuing on the prototype when it is not owned.
    pub fn get(&self, key: &Key, receiver: &Value) -> Value {
        let proto = match &*self.0.data.borrow() {
            TargetData::Array { elements, len, props } => {
                if key.is_length() {
                    return Value::from(*len);
                }
                if let Some(index) = key.as_index() {
                    return elements.get(&index).cloned().unwrap_or_default();
                }
                return props.get(key).cloned().unwrap_or_default();
            }
            TargetData::Record { props, proto } => {
                if let Some(value) = props.get(key) {
                    return value.clone();
                }
                match proto {
                    Some(proto) => proto.clone(),
                    None => return Value::Undefined,
                }
            }
        };
        reflect::get(&proto, key, receiver)
    }

    /// Assign `key` on behalf of `receiver`.
    ///
    /// A key this object does not own is handed to the prototype with the
    /// same receiver. Otherwise the data property is defined on the receiver,
    /// which is this object unless the write started further down a chain.
    pub fn set(&self, key: &Key, value: Value, receiver: &Value) -> bool {
        let proto = match &*self.0.data.borrow() {
            TargetData::Record {
                props,
                proto: Some(proto),
            } if !props.contains_key(key) => Some(proto.clone()),
            _ => None,
        };

        match proto {
            Some(proto) => reflect::set(&proto, key, value, receiver),
            None => match receiver {
                Value::Object(target) if target.ptr_eq(self) => self.define(key, value),
                other => reflect::define(other, key, value),
            },
        }
    }

    /// Create or overwrite an own data property.
    pub fn define(&self, key: &Key, value: Value) -> bool {
        let mut data = self.0.data.borrow_mut();
        match &mut *data {
            TargetData::Record { props, .. } => {
                props.insert(key.clone(), value);
                true
            }
            TargetData::Array { elements, len, props } => {
                if key.is_length() {
                    match value.as_number().and_then(to_array_length) {
                        Some(new_len) => {
                            let cut = elements.split_off(&new_len);
                            *len = new_len;
                            drop(cut);
                            true
                        }
                        None => false,
                    }
                } else if let Some(index) = key.as_index() {
                    // Indices stop at MAX_ARRAY_INDEX, so the new length fits
                    *len = (*len).max(index + 1);
                    elements.insert(index, value);
                    true
                } else {
                    props.insert(key.clone(), value);
                    true
                }
            }
        }
    }

    /// Remove an own property. Deleting an array index leaves a hole;
    /// `length` cannot be deleted.
    pub fn delete(&self, key: &Key) -> bool {
        let removed = match &mut *self.0.data.borrow_mut() {
            TargetData::Record { props, .. } => props.shift_remove(key),
            TargetData::Array { elements, props, .. } => {
                if key.is_length() {
                    return false;
                }
                match key.as_index() {
                    Some(index) => elements.remove(&index),
                    None => props.shift_remove(key),
                }
            }
        };
        drop(removed);
        true
    }

    pub fn has_own(&self, key: &Key) -> bool {
        match &*self.0.data.borrow() {
            TargetData::Record { props, .. } => props.contains_key(key),
            TargetData::Array { elements, props, .. } => {
                if key.is_length() {
                    return true;
                }
                match key.as_index() {
                    Some(index) => elements.contains_key(&index),
                    None => props.contains_key(key),
                }
            }
        }
    }

    /// Own or inherited existence check.
    pub fn has(&self, key: &Key) -> bool {
        if self.has_own(key) {
            return true;
        }
        match self.proto() {
            Some(proto) => reflect::has(&proto, key),
            None => false,
        }
    }

    /// Own keys: integer keys ascending, then names in insertion order, then
    /// symbols. Arrays list present indices, `length`, then named properties.
    pub fn own_keys(&self) -> Vec<Key> {
        match &*self.0.data.borrow() {
            TargetData::Record { props, .. } => ordered_keys(props.keys(), Vec::new()),
            TargetData::Array { elements, props, .. } => {
                let mut keys: Vec<Key> = elements.keys().map(|&index| Key::from(index)).collect();
                keys.push(Key::length());
                ordered_keys(props.keys(), keys)
            }
        }
    }
}

fn ordered_keys<'a>(keys: impl Iterator<Item = &'a Key>, mut out: Vec<Key>) -> Vec<Key> {
    let mut indices = Vec::new();
    let mut names = Vec::new();
    let mut symbols = Vec::new();

    for key in keys {
        match key {
            Key::Symbol(_) => symbols.push(key.clone()),
            Key::Name(_) => match key.as_index() {
                Some(index) => indices.push((index, key.clone())),
                None => names.push(key.clone()),
            },
        }
    }

    indices.sort_by_key(|(index, _)| *index);
    out.extend(indices.into_iter().map(|(_, key)| key));
    out.extend(names);
    out.extend(symbols);
    out
}

/// Valid array lengths are non-negative integers below 2^32.
pub fn to_array_length(n: f64) -> Option<usize> {
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
        Some(n as usize)
    } else {
        None
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.data.try_borrow() {
            Ok(data) => match &*data {
                TargetData::Record { props, .. } => {
                    write!(f, "Object#{:x}({} keys)", self.id(), props.len())
                }
                TargetData::Array { len, .. } => {
                    write!(f, "Array#{:x}(len {})", self.id(), len)
                }
            },
            Err(_) => write!(f, "Object#{:x}", self.id()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
