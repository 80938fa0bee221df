// ============================================================================
// spark-reactive - Dependency Tracking
// Recording reads against the running effect and fanning writes out
// ============================================================================
//
// Reads are collected into the current run frame and only subscribed once
// the run completes, so a dep read twice costs one subscription and deps
// the run stopped reading are dropped in one swap.
// ============================================================================

use std::rc::Rc;

use crate::core::constants::{DIRTY, EFFECT, STATUS_MASK};
use crate::core::context::with_context;
use crate::core::types::{AnyReaction, Dep};
use crate::reactivity::scheduling::schedule_reaction;

// =============================================================================
// READS
// =============================================================================

/// Record a read of `dep` by the running effect, if any.
pub fn track_read(dep: &Rc<Dep>) {
    with_context(|ctx| ctx.collect(dep));
}

// =============================================================================
// WRITES
// =============================================================================

/// Bump `dep` and mark its subscribers dirty, scheduling the effects.
///
/// Subscribers that are already dirty are queued or running and are left
/// alone.
pub fn notify_write(dep: &Dep) {
    dep.bump();

    // Snapshot first: scheduling may run effects that resubscribe to `dep`
    for reaction in dep.subscribers() {
        let flags = reaction.flags();
        if flags & DIRTY != 0 || reaction.is_destroyed() {
            continue;
        }
        set_status(&*reaction, DIRTY);
        if flags & EFFECT != 0 {
            schedule_reaction(reaction);
        }
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Replace the status bits (CLEAN, DIRTY) of a reaction.
pub fn set_status(reaction: &dyn AnyReaction, status: u32) {
    reaction.set_flags((reaction.flags() & STATUS_MASK) | status);
}

pub fn is_dirty(reaction: &dyn AnyReaction) -> bool {
    reaction.is_dirty()
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

/// Install `deps` as the reaction's dependency set, replacing the old one.
pub fn subscribe_all(reaction: &Rc<dyn AnyReaction>, deps: Vec<Rc<Dep>>) {
    unsubscribe_all(reaction);
    for dep in &deps {
        dep.subscribe(Rc::downgrade(reaction));
    }
    reaction.set_deps(deps);
}

/// Take the reaction out of every dep it is subscribed to.
pub fn unsubscribe_all(reaction: &Rc<dyn AnyReaction>) {
    for dep in reaction.take_deps() {
        dep.unsubscribe(reaction);
    }
}

// =============================================================================
// TESTS
// =============================================================================
