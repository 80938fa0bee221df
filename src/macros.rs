// ============================================================================
// spark-reactive - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// Proxies and refs are reference-counted handles, so capturing them in an
/// effect means cloning them first.
///
/// # Usage
///
/// ```rust
/// use spark_reactive::{cloned, effect, object, reactive};
///
/// let state = reactive(object! { "n" => 1 });
///
/// let _dispose = effect(cloned!(state => move || {
///     let _ = state.get("n");
/// }));
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Create an effect with automatic variable capturing.
///
/// Wraps `effect(cloned!(... => move || ...))` and evaluates to the
/// dispose function.
///
/// # Usage
///
/// ```rust
/// use spark_reactive::{effect, object, reactive};
///
/// let state = reactive(object! { "title" => "draft" });
///
/// let _dispose = effect!(state => {
///     println!("title: {:?}", state.get("title"));
/// });
/// ```
#[macro_export]
macro_rules! effect {
    // Case 1: With dependencies
    ($($deps:ident),+ => $body:expr) => {
        $crate::effect($crate::cloned!($($deps),+ => move || { $body; }))
    };
    // Case 2: No dependencies
    ($body:expr) => {
        $crate::effect(move || { $body; })
    };
}

/// Build a raw record from `key => value` pairs.
///
/// Keys go through `Key::from`, values through `Value::from`, so string
/// names, numbers, strings, nested objects and refs all work.
///
/// # Usage
///
/// ```rust
/// use spark_reactive::{array, object};
///
/// let user = object! {
///     "name" => "Ada",
///     "tags" => array!["admin", "ops"],
///     "address" => object! { "city" => "London" },
/// };
/// assert_eq!(user.get("address").get("city").as_str(), Some("London"));
/// assert_eq!(user.get("tags").len(), 2);
/// ```
#[macro_export]
macro_rules! object {
    () => {
        $crate::Value::from($crate::Target::record())
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Value::from($crate::Target::from_entries([
            $( ($crate::Key::from($key), $crate::Value::from($value)) ),+
        ]))
    };
}

/// Build a raw array from a list of values.
///
/// # Usage
///
/// ```rust
/// use spark_reactive::array;
///
/// let list = array![1, 2, 3];
/// assert!(list.is_array());
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! array {
    () => {
        $crate::Value::from($crate::Target::array())
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Value::from($crate::Target::from_values([
            $( $crate::Value::from($value) ),+
        ]))
    };
}
