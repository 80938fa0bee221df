// ============================================================================
// spark-reactive - Graph Types
// Dependency cells and the reaction interface effects implement
// ============================================================================
//
// The graph is bipartite: deps hold weak links to the reactions that read
// them, reactions hold strong links to their deps. Dropping an effect is
// therefore enough to take it out of every dep it subscribed to.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::constants::{CLEAN, DESTROYED, DIRTY};
use super::context::release_dep;
use super::value::Key;

// =============================================================================
// REACTION
// =============================================================================

/// Something that re-runs when a dep it read is bumped.
///
/// Implemented by `EffectInner`. The scheduler and the tracking functions
/// only see this trait.
pub trait AnyReaction: Any {
    fn flags(&self) -> u32;

    fn set_flags(&self, flags: u32);

    /// Deps installed by the last completed run
    fn dep_count(&self) -> usize;

    /// Remove and return the installed deps.
    fn take_deps(&self) -> Vec<Rc<Dep>>;

    /// Install the deps read by the run that just finished.
    fn set_deps(&self, deps: Vec<Rc<Dep>>);

    /// Run the reaction body.
    fn run(&self);

    fn as_any(&self) -> &dyn Any;

    fn is_dirty(&self) -> bool {
        self.flags() & DIRTY != 0
    }

    fn is_clean(&self) -> bool {
        self.flags() & CLEAN != 0
    }

    fn is_destroyed(&self) -> bool {
        self.flags() & DESTROYED != 0
    }
}

// =============================================================================
// DEP
// =============================================================================

/// A dependency cell: one per tracked (object, key) pair, and one per ref.
///
/// Holds no value, only a change counter and the reactions to notify.
/// Object cells live as long as some effect holds them, and leave the
/// context's target map when the last one lets go.
#[derive(Default)]
pub struct Dep {
    /// Bumped on every notified change
    version: Cell<u32>,

    /// Id of the last effect run that collected this dep
    seen_in_run: Cell<u32>,

    subscribers: RefCell<Vec<Weak<dyn AnyReaction>>>,

    /// The (object id, key) entry this cell is registered under
    owner: Option<(usize, Key)>,
}

impl Dep {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell registered in the target map under `key` of object `target_id`.
    pub(crate) fn owned(target_id: usize, key: Key) -> Self {
        Self {
            version: Cell::new(0),
            seen_in_run: Cell::new(0),
            subscribers: RefCell::new(Vec::new()),
            owner: Some((target_id, key)),
        }
    }

    /// Number of changes notified so far.
    pub fn version(&self) -> u32 {
        self.version.get()
    }

    pub(crate) fn bump(&self) {
        self.version.set(self.version.get().wrapping_add(1));
    }

    /// True the first time this dep is read during run `run_id`.
    pub(crate) fn first_read_in(&self, run_id: u32) -> bool {
        self.seen_in_run.replace(run_id) != run_id
    }

    /// Live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub(crate) fn subscribe(&self, reaction: Weak<dyn AnyReaction>) {
        self.subscribers.borrow_mut().push(reaction);
    }

    /// Drop `reaction` and every dead link.
    pub(crate) fn unsubscribe(&self, reaction: &Rc<dyn AnyReaction>) {
        let target = Rc::as_ptr(reaction) as *const ();
        self.subscribers.borrow_mut().retain(|weak| {
            weak.strong_count() > 0 && weak.as_ptr() as *const () != target
        });
    }

    /// Snapshot of the live subscribers, pruning dead links.
    ///
    /// The borrow is released before returning, so callers may run the
    /// reactions, which may subscribe to this dep again.
    pub(crate) fn subscribers(&self) -> Vec<Rc<dyn AnyReaction>> {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.iter().filter_map(Weak::upgrade).collect()
    }
}

impl Drop for Dep {
    fn drop(&mut self) {
        let this: *const Dep = self;
        if let Some((target_id, key)) = &self.owner {
            release_dep(*target_id, key, this);
        }
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("version", &self.version())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        flags: Cell<u32>,
    }

    impl AnyReaction for Probe {
        fn flags(&self) -> u32 {
            self.flags.get()
        }

        fn set_flags(&self, flags: u32) {
            self.flags.set(flags);
        }

        fn dep_count(&self) -> usize {
            0
        }

        fn take_deps(&self) -> Vec<Rc<Dep>> {
            Vec::new()
        }

        fn set_deps(&self, _deps: Vec<Rc<Dep>>) {}

        fn run(&self) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn probe() -> Rc<dyn AnyReaction> {
        Rc::new(Probe {
            flags: Cell::new(CLEAN),
        })
    }

    #[test]
    fn versions_only_move_forward() {
        let dep = Dep::new();
        assert_eq!(dep.version(), 0);
        dep.bump();
        dep.bump();
        assert_eq!(dep.version(), 2);
    }

    #[test]
    fn first_read_is_per_run() {
        let dep = Dep::new();
        assert!(dep.first_read_in(1));
        assert!(!dep.first_read_in(1));
        assert!(dep.first_read_in(2));
    }

    #[test]
    fn subscriptions_are_weak() {
        let dep = Dep::new();
        let kept = probe();
        {
            let dropped = probe();
            dep.subscribe(Rc::downgrade(&kept));
            dep.subscribe(Rc::downgrade(&dropped));
            assert_eq!(dep.subscriber_count(), 2);
        }
        assert_eq!(dep.subscriber_count(), 1);
        assert_eq!(dep.subscribers().len(), 1);
    }

    #[test]
    fn unsubscribe_matches_by_identity() {
        let dep = Dep::new();
        let a = probe();
        let b = probe();
        dep.subscribe(Rc::downgrade(&a));
        dep.subscribe(Rc::downgrade(&b));

        dep.unsubscribe(&a);

        let remaining = dep.subscribers();
        assert_eq!(remaining.len(), 1);
        assert!(Rc::ptr_eq(&remaining[0], &b));
    }

    #[test]
    fn status_helpers_read_flags() {
        let reaction = probe();
        assert!(reaction.is_clean() && !reaction.is_dirty());
        reaction.set_flags(DIRTY | DESTROYED);
        assert!(reaction.is_dirty() && reaction.is_destroyed());
    }
}
