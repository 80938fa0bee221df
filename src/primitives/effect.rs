// ============================================================================
// spark-reactive - Effect System
// Side effects that re-run when the object keys and refs they read change
// ============================================================================
//
// Effects are the only reactions in this crate. A run collects every dep it
// reads; when the run ends those deps replace the previous set. An effect
// created while another one runs becomes its child and is destroyed when the
// parent re-runs or is disposed.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::ptr;
use std::rc::{Rc, Weak};

use crate::core::constants::{CLEAN, DESTROYED, DIRTY, EFFECT, ROOT_EFFECT, SYNC_EFFECT};
use crate::core::context::{with_context, RunFrame};
use crate::core::types::{AnyReaction, Dep};
use crate::reactivity::scheduling::schedule_reaction;
use crate::reactivity::tracking::{set_status, subscribe_all, unsubscribe_all};

/// Cleanup returned by an effect run, called before the next run and on
/// disposal.
pub type CleanupFn = Box<dyn FnOnce()>;

/// Effect body.
pub type EffectFn = Box<dyn FnMut() -> Option<CleanupFn>>;

// =============================================================================
// EFFECT INNER
// =============================================================================

pub struct EffectInner {
    flags: Cell<u32>,

    /// Taken out while running, so a re-entrant write never double-borrows it
    func: RefCell<Option<EffectFn>>,

    teardown: RefCell<Option<CleanupFn>>,

    /// Deps installed by the last completed run
    deps: RefCell<Vec<Rc<Dep>>>,

    parent: RefCell<Weak<EffectInner>>,

    /// Effects created by the last run, owned here
    children: RefCell<Vec<Rc<EffectInner>>>,

    this: Weak<EffectInner>,
}

impl EffectInner {
    /// Create an effect that has not run yet (`DIRTY`).
    pub fn new(flags: u32, func: Option<EffectFn>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            flags: Cell::new(flags | DIRTY),
            func: RefCell::new(func),
            teardown: RefCell::new(None),
            deps: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            this: this.clone(),
        })
    }

    pub fn parent(&self) -> Option<Rc<EffectInner>> {
        self.parent.borrow().upgrade()
    }

    pub fn children(&self) -> Vec<Rc<EffectInner>> {
        self.children.borrow().clone()
    }

    pub fn is_root(&self) -> bool {
        self.flags.get() & ROOT_EFFECT != 0
    }

    fn as_reaction(self: &Rc<Self>) -> Rc<dyn AnyReaction> {
        self.clone()
    }

    fn run_teardown(&self) {
        let teardown = self.teardown.borrow_mut().take();
        if let Some(cleanup) = teardown {
            cleanup();
        }
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        if let Some(cleanup) = self.teardown.get_mut().take() {
            cleanup();
        }
    }
}

impl AnyReaction for EffectInner {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    fn take_deps(&self) -> Vec<Rc<Dep>> {
        self.deps.take()
    }

    fn set_deps(&self, deps: Vec<Rc<Dep>>) {
        *self.deps.borrow_mut() = deps;
    }

    fn run(&self) {
        if let Some(this) = self.this.upgrade() {
            update_effect(&this);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// EFFECT TREE
// =============================================================================

fn adopt(parent: &Rc<EffectInner>, child: &Rc<EffectInner>) {
    *child.parent.borrow_mut() = Rc::downgrade(parent);
    parent.children.borrow_mut().push(child.clone());
}

fn detach(effect: &EffectInner) {
    let parent = effect.parent.replace(Weak::new()).upgrade();
    if let Some(parent) = parent {
        parent
            .children
            .borrow_mut()
            .retain(|child| !ptr::eq(Rc::as_ptr(child), effect));
    }
}

fn destroy_children(effect: &EffectInner) {
    // Detached up front, a child's teardown may create or dispose effects
    let children = effect.children.take();
    for child in children {
        *child.parent.borrow_mut() = Weak::new();
        destroy_effect(&child);
    }
}

/// Dispose an effect and its children.
///
/// Unsubscribes it, runs its teardown and removes it from its parent.
/// Disposing twice is a no-op.
pub fn destroy_effect(effect: &Rc<EffectInner>) {
    if effect.is_destroyed() {
        return;
    }

    destroy_children(effect);
    unsubscribe_all(&effect.as_reaction());
    set_status(&**effect, DESTROYED);
    effect.run_teardown();
    detach(effect);

    let func = effect.func.borrow_mut().take();
    drop(func);
}

// =============================================================================
// RUN
// =============================================================================

/// Leaves the run frame and installs the collected deps, panics included.
struct RunGuard<'a> {
    effect: &'a Rc<EffectInner>,
    frame: Option<RunFrame>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        let deps = with_context(|ctx| ctx.exit_run(frame));

        // Disposed from inside its own run
        if !self.effect.is_destroyed() {
            subscribe_all(&self.effect.as_reaction(), deps);
        }
    }
}

/// Run an effect now and re-collect its dependencies.
///
/// Children and the previous teardown go first. The effect is marked clean
/// before its body runs, so a write to something it already depends on
/// queues it again.
pub fn update_effect(effect: &Rc<EffectInner>) {
    if effect.is_destroyed() {
        return;
    }

    set_status(&**effect, CLEAN);
    destroy_children(effect);
    effect.run_teardown();

    let reaction = effect.as_reaction();
    let frame = with_context(|ctx| ctx.enter_run(Rc::downgrade(&reaction)));
    let guard = RunGuard {
        effect,
        frame: Some(frame),
    };

    let func = effect.func.borrow_mut().take();
    let teardown = match func {
        Some(mut func) => {
            let teardown = func();
            if !effect.is_destroyed() {
                *effect.func.borrow_mut() = Some(func);
            }
            teardown
        }
        None => None,
    };

    drop(guard);

    if effect.is_destroyed() {
        if let Some(cleanup) = teardown {
            cleanup();
        }
        return;
    }

    *effect.teardown.borrow_mut() = teardown;
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Create an effect that re-runs whenever something it read changes.
///
/// Reactive keys and refs read in the body are tracked. Returns a dispose
/// function. The effect lives as long as the dispose function or its parent
/// effect.
///
/// # Example
///
/// ```
/// use spark_reactive::{effect, object, reactive};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let state = reactive(object! { "count" => 0 });
/// let seen = Rc::new(Cell::new(0.0));
///
/// let dispose = effect({
///     let state = state.clone();
///     let seen = seen.clone();
///     move || seen.set(state.get("count").as_number().unwrap_or(0.0))
/// });
///
/// state.set("count", 1);
/// assert_eq!(seen.get(), 1.0);
///
/// dispose();
/// state.set("count", 2);
/// assert_eq!(seen.get(), 1.0);
/// ```
pub fn effect<F>(mut f: F) -> impl FnOnce()
where
    F: FnMut() + 'static,
{
    effect_with_cleanup(move || {
        f();
        None
    })
}

/// Like `effect`, with a cleanup returned from each run.
pub fn effect_with_cleanup<F>(f: F) -> impl FnOnce()
where
    F: FnMut() -> Option<CleanupFn> + 'static,
{
    let effect = create_effect(EFFECT, Box::new(f), false);
    move || destroy_effect(&effect)
}

/// Create an effect whose first run happens immediately, even inside a
/// batch or flush. Later runs are scheduled like any other effect.
pub fn effect_sync<F>(mut f: F) -> impl FnOnce()
where
    F: FnMut() + 'static,
{
    effect_sync_with_cleanup(move || {
        f();
        None
    })
}

pub fn effect_sync_with_cleanup<F>(f: F) -> impl FnOnce()
where
    F: FnMut() -> Option<CleanupFn> + 'static,
{
    let effect = create_effect(EFFECT | SYNC_EFFECT, Box::new(f), true);
    move || destroy_effect(&effect)
}

/// Run `f` once as the owner of every effect it creates.
///
/// The returned function disposes them all. A root is never the child of
/// the effect it was created in.
pub fn effect_root<F>(f: F) -> impl FnOnce()
where
    F: FnOnce() + 'static,
{
    let mut f = Some(f);
    let effect = create_effect(
        ROOT_EFFECT,
        Box::new(move || {
            if let Some(f) = f.take() {
                f();
            }
            None
        }),
        true,
    );
    move || destroy_effect(&effect)
}

/// True while an effect body is running.
pub fn effect_tracking() -> bool {
    with_context(|ctx| ctx.has_active_effect())
}

fn create_effect(flags: u32, func: EffectFn, run_now: bool) -> Rc<EffectInner> {
    let effect = EffectInner::new(flags, Some(func));

    if !effect.is_root() {
        let parent = with_context(|ctx| ctx.active_effect()).and_then(|active| {
            active
                .as_any()
                .downcast_ref::<EffectInner>()
                .and_then(|parent| parent.this.upgrade())
        });
        if let Some(parent) = parent {
            adopt(&parent, &effect);
        }
    }

    if run_now {
        update_effect(&effect);
    } else {
        schedule_reaction(effect.clone());
    }

    effect
}

// =============================================================================
// TESTS
// =============================================================================
