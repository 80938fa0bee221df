// ============================================================================
// spark-reactive - Proxies
// Transparent views over raw objects that track reads and trigger writes
// ============================================================================
//
// A proxy pairs a target with a mode. Every object operation on it runs the
// mode's handler set: reads record dependencies and lazily wrap nested
// objects, writes apply to the target and notify dependents.
// ============================================================================

pub mod array;
pub mod handlers;
pub mod keys;
pub mod reactive;
pub mod registry;

use std::fmt;
use std::rc::Rc;

use crate::core::context::try_with_context;
use crate::core::value::{Key, Value};
use handlers::{
    Handlers, MUTABLE_HANDLERS, READONLY_HANDLERS, SHALLOW_REACTIVE_HANDLERS,
    SHALLOW_READONLY_HANDLERS,
};

pub use array::ArrayMethod;
pub use keys::{classify, is_builtin_symbol, is_integer_key, is_non_trackable_key, KeyClass};
pub use reactive::{
    is_proxy, is_reactive, is_readonly, is_shallow, mark_raw, reactive, readonly,
    shallow_reactive, shallow_readonly, to_raw, to_reactive, to_readonly,
};

// =============================================================================
// MODE
// =============================================================================

/// Wrapping mode: mutable or read-only, deep or shallow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Reactive,
    ShallowReactive,
    Readonly,
    ShallowReadonly,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Reactive,
        Mode::ShallowReactive,
        Mode::Readonly,
        Mode::ShallowReadonly,
    ];

    pub fn is_readonly(self) -> bool {
        matches!(self, Mode::Readonly | Mode::ShallowReadonly)
    }

    pub fn is_shallow(self) -> bool {
        matches!(self, Mode::ShallowReactive | Mode::ShallowReadonly)
    }

    pub fn handlers(self) -> &'static Handlers {
        match self {
            Mode::Reactive => &MUTABLE_HANDLERS,
            Mode::ShallowReactive => &SHALLOW_REACTIVE_HANDLERS,
            Mode::Readonly => &READONLY_HANDLERS,
            Mode::ShallowReadonly => &SHALLOW_READONLY_HANDLERS,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// PROXY
// =============================================================================

pub struct ProxyInner {
    target: Value,
    mode: Mode,
}

impl Drop for ProxyInner {
    fn drop(&mut self) {
        let Some(target_id) = self.target.identity() else {
            return;
        };
        let this = self as *const ProxyInner;
        try_with_context(|ctx| ctx.proxies.forget(self.mode, target_id, this));
    }
}

/// A handle to a proxy. Clones are the same proxy.
#[derive(Clone)]
pub struct Proxy(Rc<ProxyInner>);

impl Proxy {
    /// Build a proxy without consulting the registry.
    pub(crate) fn from_parts(target: Value, mode: Mode) -> Self {
        Proxy(Rc::new(ProxyInner { target, mode }))
    }

    /// The proxied value: a raw object, or a mutable proxy under a
    /// read-only one.
    pub fn target(&self) -> &Value {
        &self.0.target
    }

    pub fn mode(&self) -> Mode {
        self.0.mode
    }

    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Proxy) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> std::rc::Weak<ProxyInner> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn from_inner(inner: Rc<ProxyInner>) -> Self {
        Proxy(inner)
    }

    // =========================================================================
    // TRAPPED OPERATIONS
    // =========================================================================

    pub fn get(&self, key: &Key, receiver: &Value) -> Value {
        (self.mode().handlers().get)(self, key, receiver)
    }

    pub fn set(&self, key: &Key, value: Value, receiver: &Value) -> bool {
        (self.mode().handlers().set)(self, key, value, receiver)
    }

    pub fn delete_property(&self, key: &Key) -> bool {
        (self.mode().handlers().delete_property)(self, key)
    }

    pub fn has(&self, key: &Key) -> bool {
        (self.mode().handlers().has)(self, key)
    }

    pub fn own_keys(&self) -> Vec<Key> {
        (self.mode().handlers().own_keys)(self)
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("mode", &self.mode())
            .field("target", self.target())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::Target;

    #[test]
    fn mode_flags() {
        assert!(!Mode::Reactive.is_readonly());
        assert!(!Mode::Reactive.is_shallow());
        assert!(Mode::ShallowReactive.is_shallow());
        assert!(Mode::Readonly.is_readonly());
        assert!(Mode::ShallowReadonly.is_readonly() && Mode::ShallowReadonly.is_shallow());

        let indices: Vec<usize> = Mode::ALL.iter().map(|m| m.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn dropping_the_last_handle_forgets_the_registry_entry() {
        let raw = Target::record();
        let proxy = Proxy::new(&raw, Mode::Reactive).unwrap();
        assert!(try_with_context(|ctx| ctx.proxies.get(Mode::Reactive, raw.id()))
            .flatten()
            .is_some());

        drop(proxy);
        assert!(try_with_context(|ctx| ctx.proxies.get(Mode::Reactive, raw.id()))
            .flatten()
            .is_none());
    }

    #[test]
    fn debug_names_the_mode() {
        let proxy = Proxy::new(Target::record(), Mode::ShallowReadonly).unwrap();
        assert!(format!("{:?}", proxy).contains("ShallowReadonly"));
    }
}
