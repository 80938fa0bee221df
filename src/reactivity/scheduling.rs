// ============================================================================
// spark-reactive - Effect Scheduling
// Queueing dirty effects and flushing them with loop detection
// ============================================================================
//
// Scheduling is synchronous: an effect marked dirty outside a batch or flush
// runs before the write returns. Inside a batch it waits for the outermost
// batch to end. Inside a flush the running loop picks it up on its next pass.
// ============================================================================

use std::rc::{Rc, Weak};

use tracing::trace;

use crate::core::constants::EFFECT;
use crate::core::context::with_context;
use crate::core::types::AnyReaction;

/// Flush passes allowed before a self-triggering effect is reported.
pub const MAX_FLUSH_COUNT: u32 = 1000;

// =============================================================================
// SCHEDULE
// =============================================================================

/// Queue a dirty reaction and flush unless a batch or flush is in progress.
pub fn schedule_reaction(reaction: Rc<dyn AnyReaction>) {
    let idle = with_context(|ctx| {
        ctx.enqueue(Rc::downgrade(&reaction));
        !ctx.is_batching() && !ctx.is_flushing()
    });

    if idle {
        flush_sync();
    }
}

// =============================================================================
// FLUSH
// =============================================================================

/// Clears the flushing flag on exit, panics included.
struct Flushing {
    was_flushing: bool,
}

impl Flushing {
    fn enter() -> Self {
        Self {
            was_flushing: with_context(|ctx| ctx.set_flushing(true)),
        }
    }
}

impl Drop for Flushing {
    fn drop(&mut self) {
        with_context(|ctx| ctx.set_flushing(self.was_flushing));
    }
}

/// A queued reaction still worth running when its turn comes.
fn is_due(reaction: &dyn AnyReaction) -> bool {
    reaction.flags() & EFFECT != 0 && reaction.is_dirty() && !reaction.is_destroyed()
}

/// Run every queued effect until the queue stays empty.
///
/// Effects dirtied while the flush runs, including the running effect
/// itself, are picked up by the next pass.
///
/// # Panics
///
/// Panics with "Maximum update depth exceeded" after `MAX_FLUSH_COUNT`
/// passes, which happens when an effect keeps triggering itself.
pub fn flush_sync() {
    let _flushing = Flushing::enter();
    let mut passes = 0u32;

    loop {
        let queued = with_context(|ctx| ctx.drain_queue());
        if queued.is_empty() {
            break;
        }

        passes += 1;
        if passes > MAX_FLUSH_COUNT {
            panic!(
                "Maximum update depth exceeded: an effect keeps writing state it \
                 reads. Guard the write or move it out of the effect."
            );
        }

        // Checked right before each run: an earlier run may have disposed
        // or already re-run a later entry
        for reaction in queued.iter().filter_map(Weak::upgrade) {
            if is_due(&*reaction) {
                reaction.run();
            }
        }
    }

    if passes > 0 {
        trace!(passes, "flush");
    }
}

/// True while `flush_sync` is running.
pub fn is_flushing() -> bool {
    with_context(|ctx| ctx.is_flushing())
}

// =============================================================================
// TESTS
// =============================================================================
