// ============================================================================
// spark-reactive - Primitives Module
// Effects that observe proxies, and boxed references
// ============================================================================

pub mod effect;
pub mod reference;

// Re-export for convenience
pub use effect::{
    destroy_effect, effect, effect_root, effect_sync, effect_sync_with_cleanup, effect_tracking,
    effect_with_cleanup, update_effect, CleanupFn, EffectFn, EffectInner,
};
pub use reference::{is_ref, unref, Ref};
