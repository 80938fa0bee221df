// ============================================================================
// spark-reactive - Key Classifier
// Which property keys are tracked, and which name array indices
// ============================================================================

use crate::core::value::{Key, Symbol};

/// Property names that are never tracked.
const NON_TRACKABLE_NAMES: [&str; 3] = ["__proto__", "__v_isRef", "__isVue"];

/// How the read path treats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Internal marker name, read but never tracked
    Internal,
    /// Well-known symbol, read but never tracked
    BuiltinSymbol,
    /// Everything else
    Trackable,
}

pub fn classify(key: &Key) -> KeyClass {
    if is_builtin_symbol(key) {
        KeyClass::BuiltinSymbol
    } else if is_non_trackable_key(key) {
        KeyClass::Internal
    } else {
        KeyClass::Trackable
    }
}

pub fn is_non_trackable_key(key: &Key) -> bool {
    key.as_name().is_some_and(|name| NON_TRACKABLE_NAMES.contains(&name))
}

pub fn is_builtin_symbol(key: &Key) -> bool {
    matches!(key, Key::Symbol(Symbol::WellKnown(_)))
}

/// True iff the key is a canonical non-negative integer literal.
pub fn is_integer_key(key: &Key) -> bool {
    key.as_index().is_some()
}
