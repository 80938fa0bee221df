// ============================================================================
// spark-reactive - Reactive Context
// Thread-local state: the running effect, the batch queue, per-key deps
// and the proxy registries
// ============================================================================

use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use super::target::{Target, TargetInner};
use super::types::{AnyReaction, Dep};
use super::value::Key;
use crate::proxy::registry::ProxyRegistry;

// =============================================================================
// TARGET DEPENDENCIES
// =============================================================================

/// Dependency cells of one raw object, created lazily on first tracked read.
///
/// The links are weak: the effects that read a key own its cell.
pub struct TargetDeps {
    target: Weak<TargetInner>,
    pub deps: FxHashMap<Key, Weak<Dep>>,
}

// =============================================================================
// RUN FRAME
// =============================================================================

/// What an effect run replaced in the context, handed back on exit so
/// nested runs restore their parent exactly.
pub struct RunFrame {
    effect: Option<Weak<dyn AnyReaction>>,
    run_id: u32,
    collected: Vec<Rc<Dep>>,
    untracking: bool,
}

// =============================================================================
// REACTIVE CONTEXT
// =============================================================================

/// Thread-local reactive context holding all global state for reactivity.
pub struct ReactiveContext {
    // =========================================================================
    // RUNNING EFFECT
    // =========================================================================
    /// Effect whose body is executing
    active_effect: RefCell<Option<Weak<dyn AnyReaction>>>,

    /// Reads are not recorded while set
    untracking: Cell<bool>,

    /// Id of the current run, 0 outside any run
    run_id: Cell<u32>,

    last_run_id: Cell<u32>,

    /// Deps read so far by the current run, in first-read order
    collected: RefCell<Vec<Rc<Dep>>>,

    // =========================================================================
    // BATCHING
    // =========================================================================
    batch_depth: Cell<u32>,

    /// Dirty effects waiting for the next flush
    queue: RefCell<Vec<Weak<dyn AnyReaction>>>,

    flushing: Cell<bool>,

    // =========================================================================
    // OBJECT GRAPH
    // =========================================================================
    /// Raw object id -> per-key dependency cells
    pub target_map: RefCell<FxHashMap<usize, TargetDeps>>,

    /// Raw object id -> live proxy, one map per mode
    pub proxies: ProxyRegistry,
}

impl ReactiveContext {
    pub fn new() -> Self {
        Self {
            active_effect: RefCell::new(None),
            untracking: Cell::new(false),
            run_id: Cell::new(0),
            last_run_id: Cell::new(0),
            collected: RefCell::new(Vec::new()),
            batch_depth: Cell::new(0),
            queue: RefCell::new(Vec::new()),
            flushing: Cell::new(false),
            target_map: RefCell::new(FxHashMap::default()),
            proxies: ProxyRegistry::default(),
        }
    }

    // =========================================================================
    // RUNNING EFFECT
    // =========================================================================

    pub fn active_effect(&self) -> Option<Rc<dyn AnyReaction>> {
        self.active_effect.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn has_active_effect(&self) -> bool {
        self.active_effect.borrow().is_some()
    }

    /// Set untracking mode, returning the previous value.
    pub fn set_untracking(&self, value: bool) -> bool {
        self.untracking.replace(value)
    }

    pub fn is_untracking(&self) -> bool {
        self.untracking.get()
    }

    /// Make `effect` the running effect with a fresh run id and an empty
    /// read set. Tracking is on for the run even inside a paused region.
    pub fn enter_run(&self, effect: Weak<dyn AnyReaction>) -> RunFrame {
        let run_id = self.last_run_id.get().wrapping_add(1).max(1);
        self.last_run_id.set(run_id);

        RunFrame {
            effect: self.active_effect.replace(Some(effect)),
            run_id: self.run_id.replace(run_id),
            collected: self.collected.replace(Vec::new()),
            untracking: self.untracking.replace(false),
        }
    }

    /// Restore the state saved by `enter_run`, returning the deps the
    /// finished run read.
    pub fn exit_run(&self, frame: RunFrame) -> Vec<Rc<Dep>> {
        *self.active_effect.borrow_mut() = frame.effect;
        self.run_id.set(frame.run_id);
        self.untracking.set(frame.untracking);
        mem::replace(&mut *self.collected.borrow_mut(), frame.collected)
    }

    /// Record a read of `dep` by the current run. Repeat reads in the same
    /// run are ignored.
    pub fn collect(&self, dep: &Rc<Dep>) {
        if !self.has_active_effect() || self.is_untracking() {
            return;
        }
        if dep.first_read_in(self.run_id.get()) {
            self.collected.borrow_mut().push(dep.clone());
        }
    }

    /// Deps collected so far by the current run.
    pub fn collected_count(&self) -> usize {
        self.collected.borrow().len()
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    /// Increment batch depth, returns new depth
    pub fn enter_batch(&self) -> u32 {
        let depth = self.batch_depth.get() + 1;
        self.batch_depth.set(depth);
        depth
    }

    /// Decrement batch depth, returns new depth
    pub fn exit_batch(&self) -> u32 {
        let depth = self.batch_depth.get().saturating_sub(1);
        self.batch_depth.set(depth);
        depth
    }

    pub fn batch_depth(&self) -> u32 {
        self.batch_depth.get()
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth.get() > 0
    }

    pub fn enqueue(&self, reaction: Weak<dyn AnyReaction>) {
        self.queue.borrow_mut().push(reaction);
    }

    pub fn drain_queue(&self) -> Vec<Weak<dyn AnyReaction>> {
        self.queue.take()
    }

    /// Set flushing mode, returning the previous value.
    pub fn set_flushing(&self, value: bool) -> bool {
        self.flushing.replace(value)
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing.get()
    }

    // =========================================================================
    // OBJECT GRAPH
    // =========================================================================

    /// Get or create the dependency cell for `(target, key)`.
    ///
    /// An entry left behind by a dead object at the same address is replaced.
    pub fn dep_for(&self, target: &Target, key: &Key) -> Rc<Dep> {
        let mut map = self.target_map.borrow_mut();
        let entry = map.entry(target.id()).or_insert_with(|| TargetDeps {
            target: target.downgrade(),
            deps: FxHashMap::default(),
        });
        if !target.is_same_allocation(&entry.target) {
            entry.target = target.downgrade();
            entry.deps.clear();
        }
        if let Some(dep) = entry.deps.get(key).and_then(Weak::upgrade) {
            return dep;
        }
        let dep = Rc::new(Dep::owned(target.id(), key.clone()));
        entry.deps.insert(key.clone(), Rc::downgrade(&dep));
        dep
    }

    /// Number of keys with a live dependency cell on `target`.
    pub fn dep_count(&self, target: &Target) -> usize {
        self.target_map
            .borrow()
            .get(&target.id())
            .filter(|entry| target.is_same_allocation(&entry.target))
            .map_or(0, |entry| {
                entry.deps.values().filter(|dep| dep.strong_count() > 0).count()
            })
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

/// Access the thread-local reactive context.
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

/// Like `with_context`, but returns `None` once the thread-local has been
/// torn down. Used from destructors.
pub fn try_with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> Option<R> {
    CONTEXT.try_with(f).ok()
}

/// Drop the dependency cells of a raw object that is being freed.
pub(crate) fn release_target(id: usize) {
    let removed = try_with_context(|ctx| {
        ctx.target_map
            .try_borrow_mut()
            .ok()
            .and_then(|mut map| map.remove(&id))
    });
    drop(removed);
}

/// Remove the entry of a dependency cell that is being freed, and the
/// object's entry with it once no cells are left.
pub(crate) fn release_dep(target_id: usize, key: &Key, dep: *const Dep) {
    let removed = try_with_context(|ctx| {
        let mut map = ctx.target_map.try_borrow_mut().ok()?;
        let entry = map.get_mut(&target_id)?;
        if entry.deps.get(key).is_some_and(|weak| std::ptr::eq(weak.as_ptr(), dep)) {
            entry.deps.remove(key);
        }
        if entry.deps.is_empty() {
            map.remove(&target_id)
        } else {
            None
        }
    });
    drop(removed);
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// True inside an effect body with tracking enabled.
pub fn is_tracking() -> bool {
    with_context(|ctx| ctx.has_active_effect() && !ctx.is_untracking())
}

/// True inside `untrack`, `peek` or a live `pause_tracking` guard.
pub fn is_untracking() -> bool {
    with_context(|ctx| ctx.is_untracking())
}

/// True inside `batch`.
pub fn is_batching() -> bool {
    with_context(|ctx| ctx.is_batching())
}

// =============================================================================
// TESTS
// =============================================================================
