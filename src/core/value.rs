// ============================================================================
// spark-reactive - Values, Keys and Symbols
// The dynamic value model shared by raw objects, proxies and refs
// ============================================================================

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::target::Target;
use crate::primitives::reference::Ref;
use crate::proxy::Proxy;
use crate::reactivity::equality::same_value_zero;

// =============================================================================
// SYMBOLS
// =============================================================================

/// Language-level well-known symbols. Reads keyed by these are never tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownSymbol {
    AsyncIterator,
    HasInstance,
    IsConcatSpreadable,
    Iterator,
    Match,
    MatchAll,
    Replace,
    Search,
    Species,
    Split,
    ToPrimitive,
    ToStringTag,
    Unscopables,
}

impl WellKnownSymbol {
    pub const ALL: [WellKnownSymbol; 13] = [
        WellKnownSymbol::AsyncIterator,
        WellKnownSymbol::HasInstance,
        WellKnownSymbol::IsConcatSpreadable,
        WellKnownSymbol::Iterator,
        WellKnownSymbol::Match,
        WellKnownSymbol::MatchAll,
        WellKnownSymbol::Replace,
        WellKnownSymbol::Search,
        WellKnownSymbol::Species,
        WellKnownSymbol::Split,
        WellKnownSymbol::ToPrimitive,
        WellKnownSymbol::ToStringTag,
        WellKnownSymbol::Unscopables,
    ];

    pub const fn description(self) -> &'static str {
        match self {
            WellKnownSymbol::AsyncIterator => "Symbol.asyncIterator",
            WellKnownSymbol::HasInstance => "Symbol.hasInstance",
            WellKnownSymbol::IsConcatSpreadable => "Symbol.isConcatSpreadable",
            WellKnownSymbol::Iterator => "Symbol.iterator",
            WellKnownSymbol::Match => "Symbol.match",
            WellKnownSymbol::MatchAll => "Symbol.matchAll",
            WellKnownSymbol::Replace => "Symbol.replace",
            WellKnownSymbol::Search => "Symbol.search",
            WellKnownSymbol::Species => "Symbol.species",
            WellKnownSymbol::Split => "Symbol.split",
            WellKnownSymbol::ToPrimitive => "Symbol.toPrimitive",
            WellKnownSymbol::ToStringTag => "Symbol.toStringTag",
            WellKnownSymbol::Unscopables => "Symbol.unscopables",
        }
    }
}

/// Id 0 is reserved for the iteration sentinel.
static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

const ITERATE_SYMBOL_ID: u64 = 0;

/// Largest array index, one below the largest array length (2^32 - 1).
pub const MAX_ARRAY_INDEX: u64 = u32::MAX as u64 - 1;

/// A symbol key. Unique symbols compare by id, never by description.
#[derive(Clone)]
pub enum Symbol {
    WellKnown(WellKnownSymbol),
    Unique {
        id: u64,
        description: Option<Rc<str>>,
    },
}

impl Symbol {
    /// Create a fresh symbol, distinct from every other symbol.
    pub fn new(description: Option<&str>) -> Self {
        Symbol::Unique {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.map(Rc::from),
        }
    }

    /// The sentinel standing for "the own-key set of an object".
    pub fn iterate() -> Self {
        Symbol::Unique {
            id: ITERATE_SYMBOL_ID,
            description: Some(Rc::from("iterate")),
        }
    }

    pub fn is_well_known(&self) -> bool {
        matches!(self, Symbol::WellKnown(_))
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Symbol::WellKnown(s) => Some(s.description()),
            Symbol::Unique { description, .. } => description.as_deref(),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Symbol::WellKnown(a), Symbol::WellKnown(b)) => a == b,
            (Symbol::Unique { id: a, .. }, Symbol::Unique { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Symbol::WellKnown(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            Symbol::Unique { id, .. } => {
                1u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

impl From<WellKnownSymbol> for Symbol {
    fn from(symbol: WellKnownSymbol) -> Self {
        Symbol::WellKnown(symbol)
    }
}

// =============================================================================
// KEYS
// =============================================================================

/// A property key: a string name or a symbol.
///
/// Array indices are names in canonical decimal form, so `Key::from(2usize)`
/// and `Key::from("2")` are the same key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(Rc<str>),
    Symbol(Symbol),
}

impl Key {
    pub fn length() -> Self {
        Key::from("length")
    }

    pub fn iterate() -> Self {
        Key::Symbol(Symbol::iterate())
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Symbol(_) => None,
        }
    }

    pub fn is_length(&self) -> bool {
        self.as_name() == Some("length")
    }

    /// The array index this key names: a canonical non-negative integer
    /// literal no greater than `MAX_ARRAY_INDEX`. Larger integer names are
    /// ordinary properties.
    pub fn as_index(&self) -> Option<usize> {
        let name = self.as_name()?;
        let bytes = name.as_bytes();
        if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
            return None;
        }
        if bytes.len() > 1 && bytes[0] == b'0' {
            return None;
        }
        let index: u64 = name.parse().ok()?;
        if index > MAX_ARRAY_INDEX {
            return None;
        }
        usize::try_from(index).ok()
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(Rc::from(name))
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(Rc::from(name))
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Name(Rc::from(index.to_string()))
    }
}

impl From<Symbol> for Key {
    fn from(symbol: Symbol) -> Self {
        Key::Symbol(symbol)
    }
}

impl From<WellKnownSymbol> for Key {
    fn from(symbol: WellKnownSymbol) -> Self {
        Key::Symbol(Symbol::WellKnown(symbol))
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Symbol(symbol) => write!(f, "{:?}", symbol),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{:?}", name),
            Key::Symbol(symbol) => write!(f, "{:?}", symbol),
        }
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A dynamic value stored in objects, arrays and refs.
///
/// Cloning is cheap: objects, proxies and refs are reference-counted handles
/// and compare by identity.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Symbol(Symbol),
    /// A raw object or array
    Object(Target),
    /// A reactive or read-only view over an object
    Proxy(Proxy),
    /// A boxed reference
    Ref(Ref),
}

impl Value {
    /// Objects and proxies. Refs are boxed values, not objects.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Proxy(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<&Target> {
        match self {
            Value::Object(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_proxy(&self) -> Option<&Proxy> {
        match self {
            Value::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    pub fn as_ref_cell(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Identity of an object, proxy or ref allocation.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Object(target) => Some(target.id()),
            Value::Proxy(proxy) => Some(proxy.id()),
            Value::Ref(r) => Some(r.id()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Object(_) | Value::Proxy(_) => "object",
            Value::Ref(_) => "ref",
        }
    }
}

/// Equality is SameValueZero: `NaN` equals `NaN`, `+0` equals `-0`, and
/// handles compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        same_value_zero(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Symbol(s) => write!(f, "{:?}", s),
            Value::Object(target) => write!(f, "{:?}", target),
            Value::Proxy(proxy) => write!(f, "{:?}", proxy),
            Value::Ref(r) => write!(f, "{:?}", r),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<Target> for Value {
    fn from(target: Target) -> Self {
        Value::Object(target)
    }
}

impl From<&Target> for Value {
    fn from(target: &Target) -> Self {
        Value::Object(target.clone())
    }
}

impl From<Proxy> for Value {
    fn from(proxy: Proxy) -> Self {
        Value::Proxy(proxy)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Object(Target::from_values(items))
    }
}

// =============================================================================
// TESTS
// =============================================================================
