use spark_reactive::{
    array, cloned, effect, is_reactive, object, peek, reactive, untrack, Ref, Value,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn ergonomic_cloned_macro() {
    let state = reactive(object! { "a" => 10, "b" => 20 });
    let sum = Rc::new(Cell::new(0.0));

    // Manual cloning
    let _manual = effect({
        let state = state.clone();
        let sum = sum.clone();
        move || {
            let a = state.get("a").as_number().unwrap_or(0.0);
            let b = state.get("b").as_number().unwrap_or(0.0);
            sum.set(a + b);
        }
    });

    // Same effect through the macro
    let total = Rc::new(Cell::new(0.0));
    let _macro = effect(cloned!(state, total => move || {
        let a = state.get("a").as_number().unwrap_or(0.0);
        let b = state.get("b").as_number().unwrap_or(0.0);
        total.set(a + b);
    }));

    assert_eq!((sum.get(), total.get()), (30.0, 30.0));

    state.set("a", 15);
    assert_eq!((sum.get(), total.get()), (35.0, 35.0));
}

#[test]
fn ergonomic_effect_macro() {
    let todos = reactive(array![]);
    let log = Rc::new(RefCell::new(Vec::new()));

    let _dispose = spark_reactive::effect!(todos, log => {
        log.borrow_mut().push(todos.len());
    });

    todos.push(["write tests"]);
    todos.push(["ship"]);
    assert_eq!(*log.borrow(), vec![0, 1, 2]);
}

#[test]
fn object_literals_nest() {
    let state = reactive(object! {
        "user" => object! {
            "name" => "ada",
            "roles" => array!["admin"],
        },
        "count" => Ref::new(0),
    });

    // Nested values come back wrapped, refs come back unwrapped
    assert!(is_reactive(&state.get("user")));
    assert!(is_reactive(&state.get("user").get("roles")));
    assert_eq!(state.get("count"), Value::from(0));
    assert!(state.get("user").get("roles").includes("admin"));
}

#[test]
fn untrack_and_peek_skip_dependencies() {
    let state = reactive(object! { "tracked" => 0, "ignored" => 0 });
    let runs = Rc::new(Cell::new(0));

    let _dispose = effect(cloned!(state, runs => move || {
        let _ = state.get("tracked");
        let _ = untrack(|| state.get("ignored"));
        let _ = peek(|| state.own_keys());
        runs.set(runs.get() + 1);
    }));

    state.set("ignored", 1);
    state.set("new", 1);
    assert_eq!(runs.get(), 1);

    state.set("tracked", 1);
    assert_eq!(runs.get(), 2);
}
