// ============================================================================
// spark-reactive - Proxy Registry
// Raw object -> live proxy, one identity map per mode
// ============================================================================
//
// Entries are weak: the registry never keeps a proxy alive. A proxy removes
// its own entry when its last handle drops.
// ============================================================================

use std::cell::RefCell;
use std::rc::Weak;

use rustc_hash::FxHashMap;

use super::{Mode, Proxy, ProxyInner};

type ProxyMap = RefCell<FxHashMap<usize, Weak<ProxyInner>>>;

#[derive(Default)]
pub struct ProxyRegistry {
    maps: [ProxyMap; 4],
}

impl ProxyRegistry {
    /// The live proxy for `target_id` in `mode`, if any.
    pub fn get(&self, mode: Mode, target_id: usize) -> Option<Proxy> {
        self.maps[mode.index()]
            .borrow()
            .get(&target_id)
            .and_then(Weak::upgrade)
            .map(Proxy::from_inner)
    }

    pub fn insert(&self, mode: Mode, target_id: usize, proxy: &Proxy) {
        let previous = self.maps[mode.index()]
            .borrow_mut()
            .insert(target_id, proxy.downgrade());
        drop(previous);
    }

    /// Remove the entry for `target_id` if it still belongs to `proxy`.
    pub fn forget(&self, mode: Mode, target_id: usize, proxy: *const ProxyInner) {
        let Ok(mut map) = self.maps[mode.index()].try_borrow_mut() else {
            return;
        };
        let owned = map
            .get(&target_id)
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), proxy) || weak.strong_count() == 0);
        if owned {
            map.remove(&target_id);
        }
    }

    /// Number of entries in one mode's map, live or not.
    pub fn len(&self, mode: Mode) -> usize {
        self.maps[mode.index()].borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(|map| map.borrow().is_empty())
    }
}
