// ============================================================================
// spark-reactive - Proxy Handlers
// The trap sets behind the four wrapping modes
// ============================================================================
//
// The read and write traps are generic over const flags, so each mode gets
// its own monomorphized trap with no runtime mode checks on the hot path.
//
// Read:  marker keys -> array methods -> raw read -> track -> unwrap/wrap
// Write: old value -> unwrap -> ref write-through -> raw write -> trigger
//
// Read-only modes never track and accept-but-ignore every write.
// ============================================================================

use tracing::warn;

use crate::core::constants::{ReactiveFlag, TrackOp, TriggerOp};
use crate::core::context::with_context;
use crate::core::reflect;
use crate::core::value::{Key, Value};
use crate::primitives::reference::is_ref;
use crate::proxy::array::ArrayMethod;
use crate::proxy::keys::{classify, is_builtin_symbol, is_integer_key, KeyClass};
use crate::proxy::reactive::{is_readonly, reactive, readonly, to_raw};
use crate::proxy::Proxy;
use crate::reactivity::dep::{track, trigger};
use crate::reactivity::equality::has_changed;

// =============================================================================
// HANDLER SETS
// =============================================================================

pub type GetTrap = fn(&Proxy, &Key, &Value) -> Value;
pub type SetTrap = fn(&Proxy, &Key, Value, &Value) -> bool;
pub type DeleteTrap = fn(&Proxy, &Key) -> bool;
pub type HasTrap = fn(&Proxy, &Key) -> bool;
pub type OwnKeysTrap = fn(&Proxy) -> Vec<Key>;

/// One trap per intercepted operation.
#[derive(Clone, Copy)]
pub struct Handlers {
    pub get: GetTrap,
    pub set: SetTrap,
    pub delete_property: DeleteTrap,
    pub has: HasTrap,
    pub own_keys: OwnKeysTrap,
}

pub const MUTABLE_HANDLERS: Handlers = Handlers {
    get: get::<false, false>,
    set: set::<false>,
    delete_property,
    has,
    own_keys,
};

pub const READONLY_HANDLERS: Handlers = Handlers {
    get: get::<true, false>,
    set: readonly_set,
    delete_property: readonly_delete_property,
    has: untracked_has,
    own_keys: untracked_own_keys,
};

pub const SHALLOW_REACTIVE_HANDLERS: Handlers = Handlers {
    get: get::<false, true>,
    set: set::<true>,
    ..MUTABLE_HANDLERS
};

pub const SHALLOW_READONLY_HANDLERS: Handlers = Handlers {
    get: get::<true, true>,
    ..READONLY_HANDLERS
};

// =============================================================================
// GET
// =============================================================================

/// Read `key` through the proxy.
pub fn get<const READONLY: bool, const SHALLOW: bool>(
    proxy: &Proxy,
    key: &Key,
    receiver: &Value,
) -> Value {
    match key.as_name().and_then(ReactiveFlag::from_name) {
        Some(ReactiveFlag::IsReactive) => return Value::Bool(!READONLY),
        Some(ReactiveFlag::IsReadonly) => return Value::Bool(READONLY),
        Some(ReactiveFlag::Raw) if is_registered_receiver(proxy, receiver) => {
            return proxy.target().clone();
        }
        _ => {}
    }

    let target = proxy.target();
    let target_is_array = reflect::is_array(target);

    // Instrumented methods are invoked through the typed array API, never
    // read as data, so their names are not dependencies
    if !READONLY && target_is_array && ArrayMethod::from_key(key).is_some() {
        return reflect::get(target, key, receiver);
    }

    let res = reflect::get(target, key, receiver);

    if classify(key) != KeyClass::Trackable {
        return res;
    }

    if !READONLY {
        if let Some(raw) = target.as_target() {
            track(raw, TrackOp::Get, key);
        }
    }

    if SHALLOW {
        return res;
    }

    // Refs stored at array indices stay refs
    let unwrap_ref = !target_is_array || !is_integer_key(key);
    match res {
        Value::Ref(r) if unwrap_ref => r.value(),
        res if res.is_object() => {
            if READONLY {
                readonly(res)
            } else {
                reactive(res)
            }
        }
        res => res,
    }
}

/// The raw escape only answers the proxy registered for this target and
/// mode, so a foreign receiver never reaches the raw object.
fn is_registered_receiver(proxy: &Proxy, receiver: &Value) -> bool {
    let (Some(receiver), Some(target_id)) = (receiver.as_proxy(), proxy.target().identity()) else {
        return false;
    };
    with_context(|ctx| ctx.proxies.get(proxy.mode(), target_id))
        .is_some_and(|registered| registered.ptr_eq(receiver))
}

// =============================================================================
// SET
// =============================================================================

/// Write `key` through the proxy.
pub fn set<const SHALLOW: bool>(proxy: &Proxy, key: &Key, value: Value, receiver: &Value) -> bool {
    let target = proxy.target();
    let target_is_array = reflect::is_array(target);

    let mut value = value;
    let mut old_value = reflect::get(target, key, target);

    // Shallow proxies store values as given, and read-only views are kept
    // as views: they neither unwrap nor write through a ref
    if !SHALLOW && !is_readonly(&value) {
        value = to_raw(&value);
        old_value = to_raw(&old_value);

        if !target_is_array && !is_ref(&value) {
            if let Value::Ref(r) = &old_value {
                r.set_value(value);
                return true;
            }
        }
    }

    let had_key = match key.as_index() {
        Some(index) if target_is_array => {
            index < target.as_target().and_then(|t| t.array_len()).unwrap_or(0)
        }
        _ => reflect::has_own(target, key),
    };

    let result = reflect::set(target, key, value.clone(), receiver);

    // A write that reached this target through a prototype chain belongs to
    // the receiver, not to this object. A rejected write changed nothing.
    if let Some(raw) = target.as_target() {
        let is_own_write = result && to_raw(receiver).as_target().is_some_and(|r| r.ptr_eq(raw));
        if is_own_write {
            if !had_key {
                trigger(raw, TriggerOp::Add, key, Some(&value), None);
            } else if has_changed(&value, &old_value) {
                trigger(raw, TriggerOp::Set, key, Some(&value), Some(&old_value));
            }
        }
    }

    result
}

// =============================================================================
// DELETE / HAS / OWN KEYS
// =============================================================================

pub fn delete_property(proxy: &Proxy, key: &Key) -> bool {
    let target = proxy.target();
    let had_key = reflect::has_own(target, key);
    let old_value = reflect::get(target, key, target);

    let result = reflect::delete(target, key);
    if result && had_key {
        if let Some(raw) = target.as_target() {
            trigger(raw, TriggerOp::Delete, key, None, Some(&old_value));
        }
    }
    result
}

pub fn has(proxy: &Proxy, key: &Key) -> bool {
    let target = proxy.target();
    let result = reflect::has(target, key);
    if !is_builtin_symbol(key) {
        if let Some(raw) = target.as_target() {
            track(raw, TrackOp::Has, key);
        }
    }
    result
}

pub fn own_keys(proxy: &Proxy) -> Vec<Key> {
    let target = proxy.target();
    if let Some(raw) = target.as_target() {
        let key = if raw.is_array() { Key::length() } else { Key::iterate() };
        track(raw, TrackOp::Iterate, &key);
    }
    reflect::own_keys(target)
}

// =============================================================================
// READ-ONLY
// =============================================================================

fn readonly_set(proxy: &Proxy, key: &Key, _value: Value, _receiver: &Value) -> bool {
    if cfg!(feature = "dev-warnings") {
        warn!(
            target_value = ?proxy.target(),
            "Set operation on key \"{}\" failed: target is readonly.",
            key
        );
    }
    true
}

fn readonly_delete_property(proxy: &Proxy, key: &Key) -> bool {
    if cfg!(feature = "dev-warnings") {
        warn!(
            target_value = ?proxy.target(),
            "Delete operation on key \"{}\" failed: target is readonly.",
            key
        );
    }
    true
}

fn untracked_has(proxy: &Proxy, key: &Key) -> bool {
    reflect::has(proxy.target(), key)
}

fn untracked_own_keys(proxy: &Proxy) -> Vec<Key> {
    reflect::own_keys(proxy.target())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::Target;
    use crate::primitives::effect::effect;
    use crate::primitives::reference::Ref;
    use crate::proxy::reactive::{is_reactive, shallow_reactive, shallow_readonly};
    use std::cell::Cell;
    use std::rc::Rc;

    fn runs_of(read: impl Fn() + 'static) -> (Rc<Cell<u32>>, impl FnOnce()) {
        let runs = Rc::new(Cell::new(0));
        let dispose = effect({
            let runs = runs.clone();
            move || {
                read();
                runs.set(runs.get() + 1);
            }
        });
        (runs, dispose)
    }

    #[test]
    fn marker_keys_answer_the_mode() {
        let raw = Target::record();
        let state = reactive(&raw);
        let view = readonly(&raw);

        assert_eq!(state.get("__v_isReactive"), Value::Bool(true));
        assert_eq!(state.get("__v_isReadonly"), Value::Bool(false));
        assert_eq!(view.get("__v_isReactive"), Value::Bool(false));
        assert_eq!(view.get("__v_isReadonly"), Value::Bool(true));
        assert_eq!(state.get("__v_raw"), Value::from(&raw));
    }

    #[test]
    fn raw_escape_ignores_foreign_receivers() {
        let raw = Target::from_entries([("a", 1)]);
        let state = reactive(&raw);
        let other = reactive(Target::record());

        let proxy = state.as_proxy().unwrap();
        assert_eq!(proxy.get(&Key::from("__v_raw"), &other), Value::Undefined);
        assert_eq!(proxy.get(&Key::from("__v_raw"), &state), Value::from(&raw));
    }

    #[test]
    fn nested_objects_are_wrapped_on_access() {
        let inner = Target::from_entries([("n", 1)]);
        let raw = Target::from_entries([("inner", &inner)]);

        let deep = reactive(&raw).get("inner");
        assert!(is_reactive(&deep));
        assert_eq!(deep, reactive(&inner));

        let ro = readonly(&raw).get("inner");
        assert!(is_readonly(&ro));

        let shallow = shallow_reactive(&raw).get("inner");
        assert_eq!(shallow, Value::from(&inner));

        // The raw object itself was never touched
        assert_eq!(raw.get(&Key::from("inner"), &Value::from(&raw)), Value::from(&inner));
    }

    #[test]
    fn refs_unwrap_except_at_array_indices() {
        let r = Ref::new(1);
        let record = reactive(Target::from_entries([("r", r.clone())]));
        assert_eq!(record.get("r"), Value::from(1));

        let list = reactive(Target::from_values([r.clone()]));
        assert!(matches!(list.get(0usize), Value::Ref(found) if found.ptr_eq(&r)));

        let shallow = shallow_reactive(Target::from_entries([("r", r.clone())]));
        assert!(is_ref(&shallow.get("r")));
    }

    #[test]
    fn non_trackable_keys_are_read_without_tracking() {
        let raw = Target::from_entries([("__v_isRef", false)]);
        let state = reactive(&raw);

        let (runs, _dispose) = runs_of({
            let state = state.clone();
            move || {
                let _ = state.get("__v_isRef");
            }
        });

        state.set("__v_isRef", true);
        assert_eq!(runs.get(), 1);
        assert_eq!(with_context(|ctx| ctx.dep_count(&raw)), 0);
    }

    #[test]
    fn readonly_reads_do_not_track() {
        let raw = Target::from_entries([("a", 1)]);
        let view = readonly(&raw);

        let (_runs, _dispose) = runs_of(move || {
            let _ = view.get("a");
            let _ = view.has("a");
            let _ = view.own_keys();
        });

        assert_eq!(with_context(|ctx| ctx.dep_count(&raw)), 0);
    }

    #[test]
    fn readonly_over_reactive_still_tracks() {
        let raw = Target::from_entries([("a", 1)]);
        let state = reactive(&raw);
        let view = readonly(&state);

        let (runs, _dispose) = runs_of({
            let view = view.clone();
            move || {
                let _ = view.get("a");
            }
        });

        state.set("a", 2);
        assert_eq!(runs.get(), 2);
        assert_eq!(view.get("a"), Value::from(2));
        assert_eq!(to_raw(&view), Value::from(&raw));
    }

    #[test]
    fn readonly_writes_are_accepted_and_ignored() {
        let raw = Target::from_entries([("a", 1)]);
        for view in [readonly(&raw), shallow_readonly(&raw)] {
            assert!(view.set("a", 2));
            assert!(view.set("missing", 2));
            assert!(view.delete("a"));
            assert!(view.delete("missing"));
        }
        assert_eq!(raw.own_keys(), vec![Key::from("a")]);
        assert_eq!(raw.get(&Key::from("a"), &Value::from(&raw)), Value::from(1));
    }

    #[test]
    fn write_unwraps_reactive_values() {
        let raw = Target::record();
        let state = reactive(&raw);
        let child = reactive(Target::record());

        state.set("child", child.clone());
        let stored = raw.get(&Key::from("child"), &Value::from(&raw));
        assert_eq!(stored, to_raw(&child));

        // Shallow proxies store what they are given
        let shallow = shallow_reactive(Target::record());
        shallow.set("child", child.clone());
        assert_eq!(shallow.get("child"), child);
    }

    #[test]
    fn write_unwraps_shallow_values_but_keeps_readonly_views() {
        let raw = Target::record();
        let state = reactive(&raw);
        let child_raw = Target::record();
        let this = Value::from(&raw);

        state.set("shallow", shallow_reactive(&child_raw));
        assert_eq!(raw.get(&Key::from("shallow"), &this), Value::from(&child_raw));

        let view = readonly(&child_raw);
        state.set("view", view.clone());
        assert_eq!(raw.get(&Key::from("view"), &this), view);

        let frozen = shallow_readonly(&child_raw);
        state.set("frozen", frozen.clone());
        assert_eq!(raw.get(&Key::from("frozen"), &this), frozen);
    }

    #[test]
    fn readonly_values_replace_a_ref_slot() {
        let r = Ref::new(1);
        let raw = Target::from_entries([("r", r.clone())]);
        let state = reactive(&raw);
        let view = readonly(Target::record());

        assert!(state.set("r", view.clone()));
        assert_eq!(raw.get(&Key::from("r"), &Value::from(&raw)), view);
        assert_eq!(r.peek(), Value::from(1));
    }

    #[test]
    fn out_of_range_integer_keys_on_arrays() {
        let raw = Target::array();
        let list = reactive(&raw);

        let (runs, _dispose) = runs_of({
            let list = list.clone();
            move || {
                let _ = list.len();
            }
        });

        // Not an index: a named property, length untouched
        assert!(list.set("18446744073709551615", 1));
        assert_eq!(list.get("18446744073709551615"), Value::from(1));
        assert_eq!(raw.array_len(), Some(0));
        assert_eq!(runs.get(), 1);

        // The last valid index grows length without filling the gap
        assert!(list.set("4294967294", 2));
        assert_eq!(list.len(), 4_294_967_295);
        assert_eq!(runs.get(), 2);

        assert!(list.set(Key::length(), 0));
        assert_eq!(list.len(), 0);
        assert!(!list.has("4294967294"));
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn write_through_refs_on_records_only() {
        let r = Ref::new(1);
        let raw = Target::from_entries([("r", r.clone())]);
        let state = reactive(&raw);

        assert!(state.set("r", 2));
        assert_eq!(r.peek(), Value::from(2));
        assert!(is_ref(&raw.get(&Key::from("r"), &Value::from(&raw))));

        // Assigning another ref replaces the slot
        let other = Ref::new(9);
        state.set("r", other.clone());
        assert!(matches!(raw.get(&Key::from("r"), &Value::from(&raw)), Value::Ref(x) if x.ptr_eq(&other)));

        let list_raw = Target::from_values([r.clone()]);
        let list = reactive(&list_raw);
        list.set(0usize, 5);
        assert_eq!(list_raw.items()[0], Value::from(5));
    }

    #[test]
    fn inherited_writes_do_not_trigger_the_parent() {
        let parent_raw = Target::from_entries([("a", 1)]);
        let parent = reactive(&parent_raw);
        let child_raw = Target::with_proto(parent.clone());
        let child = reactive(&child_raw);

        let (parent_runs, _p) = runs_of({
            let parent = parent.clone();
            move || {
                let _ = parent.get("a");
            }
        });
        let (child_runs, _c) = runs_of({
            let child = child.clone();
            move || {
                let _ = child.get("a");
            }
        });

        child.set("a", 2);

        // The write defined an own property on the child
        assert!(child_raw.has_own(&Key::from("a")));
        assert_eq!(parent_raw.get(&Key::from("a"), &Value::from(&parent_raw)), Value::from(1));
        assert_eq!(parent_runs.get(), 1);
        assert_eq!(child_runs.get(), 2);
        assert_eq!(child.get("a"), Value::from(2));
    }

    #[test]
    fn delete_triggers_only_owned_keys() {
        let raw = Target::from_entries([("a", 1)]);
        let state = reactive(&raw);

        let (runs, _dispose) = runs_of({
            let state = state.clone();
            move || {
                let _ = state.has("a");
                let _ = state.has("b");
            }
        });

        assert!(state.delete("b"));
        assert_eq!(runs.get(), 1);

        assert!(state.delete("a"));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn builtin_symbols_are_never_tracked_by_has() {
        use crate::core::value::WellKnownSymbol;

        let raw = Target::record();
        let state = reactive(&raw);
        let (_runs, _dispose) = runs_of(move || {
            let _ = state.has(WellKnownSymbol::Iterator);
        });
        assert_eq!(with_context(|ctx| ctx.dep_count(&raw)), 0);
    }

    #[test]
    fn own_keys_track_length_on_arrays() {
        let raw = Target::from_values([1, 2]);
        let list = reactive(&raw);

        let (runs, _dispose) = runs_of({
            let list = list.clone();
            move || {
                let _ = list.own_keys();
            }
        });

        list.set(0usize, 10);
        assert_eq!(runs.get(), 1);

        list.set(2usize, 3);
        assert_eq!(runs.get(), 2);
    }
}
