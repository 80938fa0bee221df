// ============================================================================
// spark-reactive - Track / Trigger
// Per-(object, key) dependency cells
// ============================================================================
//
// Every (raw object, key) pair that was read inside an effect owns a `Dep`.
// `track` collects it into the running effect and `trigger` bumps the deps
// a mutation affects. Deps are created only on tracked reads, so untouched
// keys cost nothing.
// ============================================================================

use std::rc::{Rc, Weak};

use tracing::trace;

use crate::core::constants::{TrackOp, TriggerOp};
use crate::core::context::{is_tracking, with_context};
use crate::core::target::{to_array_length, Target};
use crate::core::types::Dep;
use crate::core::value::{Key, Value};
use crate::reactivity::batching::batch;
use crate::reactivity::tracking::{notify_write, track_read};

// =============================================================================
// TRACK
// =============================================================================

/// Record that the active effect depends on `key` of `target`.
///
/// No-op outside an effect or while tracking is paused.
pub fn track(target: &Target, op: TrackOp, key: &Key) {
    if !is_tracking() {
        return;
    }

    trace!(target_id = target.id(), ?op, %key, "track");

    let dep = with_context(|ctx| ctx.dep_for(target, key));
    track_read(&dep);
}

// =============================================================================
// TRIGGER
// =============================================================================

/// Notify every effect depending on the keys a mutation affects.
///
/// - the written key itself;
/// - the iteration key when a record gains or loses a key;
/// - `length` when an array gains an index;
/// - for a `length` write on an array: `length` and every index at or past
///   the new length.
///
/// All affected effects run once, after the last dependency is bumped.
pub fn trigger(
    target: &Target,
    op: TriggerOp,
    key: &Key,
    new_value: Option<&Value>,
    old_value: Option<&Value>,
) {
    let is_array = target.is_array();
    let new_length = if is_array && key.is_length() {
        Some(
            new_value
                .and_then(Value::as_number)
                .and_then(to_array_length)
                .unwrap_or(0),
        )
    } else {
        None
    };

    let deps: Vec<Rc<Dep>> = with_context(|ctx| {
        let map = ctx.target_map.borrow();
        let Some(entry) = map.get(&target.id()) else {
            return Vec::new();
        };

        let mut deps = Vec::new();
        match new_length {
            Some(new_length) => {
                for (dep_key, dep) in &entry.deps {
                    let cut = dep_key.as_index().is_some_and(|index| index >= new_length);
                    if dep_key.is_length() || cut {
                        deps.extend(dep.upgrade());
                    }
                }
            }
            None => {
                let live = |key: &Key| entry.deps.get(key).and_then(Weak::upgrade);
                deps.extend(live(key));
                match op {
                    TriggerOp::Add if !is_array => deps.extend(live(&Key::iterate())),
                    TriggerOp::Add if key.as_index().is_some() => deps.extend(live(&Key::length())),
                    TriggerOp::Delete if !is_array => deps.extend(live(&Key::iterate())),
                    _ => {}
                }
            }
        }
        deps
    });

    trace!(
        target_id = target.id(),
        ?op,
        %key,
        ?new_value,
        ?old_value,
        deps = deps.len(),
        "trigger"
    );

    if deps.is_empty() {
        return;
    }

    batch(|| deps.iter().for_each(|dep| notify_write(dep)));
}

// =============================================================================
// TESTS
// =============================================================================
