use spark_reactive::{
    array, batch, effect, is_reactive, is_readonly, object, reactive, readonly, shallow_reactive,
    shallow_readonly, to_raw, Key, Ref, Target, Value,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Run `read` in an effect and count its executions.
fn count_runs(read: impl Fn() + 'static) -> (Rc<Cell<u32>>, impl FnOnce()) {
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

// =============================================================================
// WRAPPING
// =============================================================================

#[test]
fn wrapping_returns_the_same_proxy() {
    let raw = object! { "a" => 1 };

    let first = reactive(raw.clone());
    assert_eq!(reactive(raw.clone()), first);
    assert_eq!(reactive(first.clone()), first);

    let view = readonly(raw.clone());
    assert_eq!(readonly(raw.clone()), view);
    assert_eq!(readonly(view.clone()), view);
}

#[test]
fn modes_are_isolated_but_share_the_raw_object() {
    let raw = object! { "a" => 1 };
    let state = reactive(raw.clone());
    let view = readonly(raw.clone());

    assert_ne!(state, view);
    assert_eq!(to_raw(&state), raw);
    assert_eq!(to_raw(&view), raw);

    // A write through one mode is visible through the others
    state.set("a", 2);
    assert_eq!(view.get("a"), Value::from(2));
    assert_eq!(shallow_readonly(raw.clone()).get("a"), Value::from(2));
}

#[test]
fn nested_objects_follow_the_parent_mode() {
    let raw = object! { "inner" => object! { "x" => 1 } };

    assert!(is_reactive(&reactive(raw.clone()).get("inner")));
    assert!(is_readonly(&readonly(raw.clone()).get("inner")));
    assert!(!is_reactive(&shallow_reactive(raw.clone()).get("inner")));
    assert!(!is_readonly(&shallow_readonly(raw.clone()).get("inner")));

    // The same nested proxy on every read
    let state = reactive(raw);
    assert_eq!(state.get("inner"), state.get("inner"));
}

// =============================================================================
// READ TRACKING
// =============================================================================

#[test]
fn effects_rerun_only_for_keys_they_read() {
    let state = reactive(object! { "a" => 1, "b" => 1 });
    let (runs, _dispose) = count_runs({
        let state = state.clone();
        move || {
            let _ = state.get("a");
        }
    });
    assert_eq!(runs.get(), 1);

    state.set("a", 2);
    assert_eq!(runs.get(), 2);

    state.set("b", 2);
    assert_eq!(runs.get(), 2);
}

#[test]
fn nested_reads_track_the_nested_key() {
    let state = reactive(object! { "user" => object! { "name" => "ada" } });
    let seen = Rc::new(RefCell::new(Vec::new()));
    let _dispose = effect({
        let state = state.clone();
        let seen = seen.clone();
        move || seen.borrow_mut().push(state.get("user").get("name"))
    });

    state.get("user").set("name", "grace");
    assert_eq!(*seen.borrow(), vec![Value::from("ada"), Value::from("grace")]);

    // Mutating the raw object bypasses tracking entirely
    to_raw(&state.get("user")).set("name", "linus");
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn add_and_set_are_told_apart() {
    let state = reactive(object! { "a" => f64::NAN });

    let (key_runs, _k) = count_runs({
        let state = state.clone();
        move || {
            let _ = state.get("a");
        }
    });
    let (keys_runs, _i) = count_runs({
        let state = state.clone();
        move || {
            let _ = state.own_keys();
        }
    });

    // NaN to NaN is not a change
    state.set("a", f64::NAN);
    assert_eq!((key_runs.get(), keys_runs.get()), (1, 1));

    // Existing key with a new value: set, not add
    state.set("a", 1);
    assert_eq!((key_runs.get(), keys_runs.get()), (2, 1));

    // Equal value: nothing
    state.set("a", 1);
    assert_eq!((key_runs.get(), keys_runs.get()), (2, 1));

    // Absent key: add
    state.set("b", 1);
    assert_eq!((key_runs.get(), keys_runs.get()), (2, 2));
}

#[test]
fn has_checks_track_additions_and_deletions() {
    let state = reactive(object! {});
    let (runs, _dispose) = count_runs({
        let state = state.clone();
        move || {
            let _ = state.has("x");
        }
    });

    state.set("x", 1);
    assert_eq!(runs.get(), 2);

    state.delete("x");
    assert_eq!(runs.get(), 3);

    // Deleting an absent key changes nothing
    state.delete("x");
    assert_eq!(runs.get(), 3);
}

#[test]
fn enumeration_ignores_value_changes() {
    let state = reactive(object! { "a" => 1 });
    let (runs, _dispose) = count_runs({
        let state = state.clone();
        move || {
            let _ = state.own_keys();
        }
    });

    state.set("a", 2);
    assert_eq!(runs.get(), 1);

    state.set("b", 1);
    assert_eq!(runs.get(), 2);

    state.delete("a");
    assert_eq!(runs.get(), 3);
    assert_eq!(state.own_keys(), vec![Key::from("b")]);
}

#[test]
fn batched_writes_run_effects_once() {
    let state = reactive(object! { "a" => 0, "b" => 0 });
    let (runs, _dispose) = count_runs({
        let state = state.clone();
        move || {
            let _ = (state.get("a"), state.get("b"));
        }
    });

    batch(|| {
        state.set("a", 1);
        state.set("b", 1);
        state.set("c", 1);
    });
    assert_eq!(runs.get(), 2);
}

// =============================================================================
// ARRAYS
// =============================================================================

#[test]
fn an_effect_pushing_to_the_array_it_reads_settles() {
    let list = reactive(array![1, 2]);
    let (runs, _dispose) = count_runs({
        let list = list.clone();
        move || {
            let len = list.len();
            if len < 5 {
                list.push([len]);
            }
        }
    });
    assert_eq!(list.len(), 3);

    // One external trigger
    list.push([0]);

    assert_eq!(list.len(), 5);
    assert!(runs.get() <= 4, "effect ran {} times", runs.get());
}

#[test]
fn searches_find_raw_objects_stored_wrapped() {
    let item = object! { "id" => 1 };
    let wrapped = reactive(item.clone());
    let list = reactive(array![wrapped.clone()]);

    assert!(list.includes(item.clone()));
    assert!(list.includes(wrapped.clone()));
    assert_eq!(list.index_of(item.clone()), Some(0));
    assert_eq!(list.last_index_of(item), Some(0));
    assert!(!list.includes(object! { "id" => 1 }));
}

#[test]
fn length_changes_reach_index_readers() {
    let list = reactive(array!["a", "b", "c"]);
    let last = Rc::new(RefCell::new(Value::Undefined));
    let _dispose = effect({
        let list = list.clone();
        let last = last.clone();
        move || *last.borrow_mut() = list.get(2usize)
    });
    assert_eq!(*last.borrow(), Value::from("c"));

    list.set("length", 1);
    assert_eq!(*last.borrow(), Value::Undefined);
    assert_eq!(list.len(), 1);
}

#[test]
fn index_writes_past_the_end_notify_length_readers() {
    let list = reactive(array![]);
    let lengths = Rc::new(RefCell::new(Vec::new()));
    let _dispose = effect({
        let list = list.clone();
        let lengths = lengths.clone();
        move || lengths.borrow_mut().push(list.len())
    });

    list.set(0usize, "x");
    list.set(0usize, "y");
    list.set(3usize, "z");
    assert_eq!(*lengths.borrow(), vec![0, 1, 4]);
}

#[test]
fn huge_integer_keys_on_arrays_stay_cheap() {
    let list = reactive(array![1]);
    let lengths = Rc::new(RefCell::new(Vec::new()));
    let _dispose = effect({
        let list = list.clone();
        let lengths = lengths.clone();
        move || lengths.borrow_mut().push(list.len())
    });

    // Beyond the index range: a named property, length untouched
    assert!(list.set("18446744073709551615", "named"));
    assert!(list.set("4294967294", "last"));
    assert!(list.set("length", 4_294_967_295u32));

    assert_eq!(list.get("18446744073709551615"), Value::from("named"));
    assert_eq!(list.get(4_294_967_294usize), Value::from("last"));
    assert!(!list.has(1usize));

    // Past the largest length the write is refused and nothing reruns
    assert!(!list.set("length", 4_294_967_296.0));
    list.set("length", 1);

    assert_eq!(*lengths.borrow(), vec![1, 4_294_967_295, 1]);
    assert_eq!(
        list.own_keys(),
        vec![Key::from("0"), Key::length(), Key::from("18446744073709551615")]
    );
}

// =============================================================================
// REFS
// =============================================================================

#[test]
fn refs_in_objects_are_unwrapped_and_written_through() {
    let r = Ref::new(1);
    let state = reactive(object! { "r" => r.clone() });

    assert_eq!(state.get("r"), Value::from(1));

    state.set("r", 2);
    assert_eq!(r.peek(), Value::from(2));
    assert!(to_raw(&state).get("r").as_ref_cell().is_some_and(|slot| slot.ptr_eq(&r)));

    // Replacing a ref with another ref swaps the slot
    let other = Ref::new(10);
    state.set("r", other.clone());
    assert_eq!(state.get("r"), Value::from(10));
    assert_eq!(r.peek(), Value::from(2));
}

#[test]
fn refs_in_arrays_stay_refs() {
    let r = Ref::new(1);
    let list = reactive(array![r.clone()]);

    assert!(list.get(0usize).as_ref_cell().is_some_and(|slot| slot.ptr_eq(&r)));

    // Arrays replace the slot instead of writing through
    list.set(0usize, 5);
    assert_eq!(list.get(0usize), Value::from(5));
    assert_eq!(r.peek(), Value::from(1));
}

#[test]
fn readonly_views_replace_refs_instead_of_writing_through() {
    let r = Ref::new(1);
    let raw = object! { "r" => r.clone() };
    let state = reactive(raw.clone());
    let view = readonly(object! { "n" => 2 });

    state.set("r", view.clone());
    assert_eq!(raw.get("r"), view);
    assert_eq!(r.peek(), Value::from(1));
}

#[test]
fn only_readonly_values_are_stored_wrapped() {
    let child = object! { "x" => 1 };
    let raw = object! {};
    let state = reactive(raw.clone());

    state.set("deep", reactive(child.clone()));
    state.set("shallow", shallow_reactive(child.clone()));
    state.set("view", readonly(child.clone()));

    assert_eq!(raw.get("deep"), child);
    assert_eq!(raw.get("shallow"), child);
    assert!(is_readonly(&raw.get("view")));
    assert_eq!(to_raw(&raw.get("view")), child);
}

// =============================================================================
// READ-ONLY
// =============================================================================

#[test]
fn readonly_rejects_writes_and_reports_success() {
    let raw = object! { "a" => 1 };
    let view = readonly(raw.clone());

    assert!(view.set("a", 2));
    assert!(view.set("missing", 2));
    assert!(view.delete("a"));
    assert!(view.delete("missing"));

    assert_eq!(raw.get("a"), Value::from(1));
    assert!(!raw.has("missing"));
    assert_eq!(raw.own_keys(), vec![Key::from("a")]);
}

#[test]
fn readonly_views_of_reactive_objects_follow_changes() {
    let state = reactive(object! { "n" => 1 });
    let view = readonly(state.clone());
    let seen = Rc::new(Cell::new(0.0));
    let _dispose = effect({
        let view = view.clone();
        let seen = seen.clone();
        move || seen.set(view.get("n").as_number().unwrap_or(-1.0))
    });

    state.set("n", 2);
    assert_eq!(seen.get(), 2.0);

    // The view still refuses writes
    view.set("n", 3);
    assert_eq!(seen.get(), 2.0);
    assert_eq!(state.get("n"), Value::from(2));
}

#[test]
fn prototype_writes_land_on_the_receiver() {
    let parent = object! { "shared" => 1 };
    let child = Value::from(Target::with_proto(reactive(parent.clone())));
    let state = reactive(child.clone());

    let (runs, _dispose) = count_runs({
        let parent = reactive(parent.clone());
        move || {
            let _ = parent.get("shared");
        }
    });

    state.set("shared", 2);
    assert_eq!(child.get("shared"), Value::from(2));
    assert_eq!(parent.get("shared"), Value::from(1));
    assert_eq!(runs.get(), 1);
}
