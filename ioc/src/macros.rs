//! Public macros for building override maps and resolving from the global
//! container.

/// Builds a [`Parameters`](crate::Parameters) override map.
///
/// Values are wrapped with [`instance`](crate::instance), so passing an
/// `Instance` keeps its identity.
///
/// # Examples
///
/// ```
/// use fibre_autowire::params;
///
/// let overrides = params! { "retries" => 3u32, "host" => String::from("localhost") };
/// assert_eq!(overrides.len(), 2);
/// assert!(params! {}.is_empty());
/// ```
#[macro_export]
macro_rules! params {
  () => {
    $crate::Parameters::new()
  };
  ($($name:expr => $value:expr),+ $(,)?) => {{
    let mut parameters = $crate::Parameters::new();
    $(
      parameters.insert($name, $crate::instance($value));
    )+
    parameters
  }};
}

/// Resolves an entry from the global container.
///
/// Panics if the entry cannot be resolved. For a non-panicking version, use
/// `global().get(...)` directly.
///
/// # Panics
///
/// This macro will panic if the entry cannot be resolved, or, in the typed
/// form, if it is not of the requested type.
///
/// # Examples
///
/// ```
/// use fibre_autowire::{global, resolve};
///
/// global().set("motd", String::from("hello"));
///
/// // Untyped: an `Instance`.
/// let raw = resolve!("motd");
/// assert_eq!(raw.downcast_ref::<String>().unwrap(), "hello");
///
/// // Typed: an `Arc<String>`.
/// let motd = resolve!("motd", String);
/// assert_eq!(*motd, "hello");
/// ```
#[macro_export]
macro_rules! resolve {
  // Arm for a typed resolution: resolve!("id", MyService)
  ($id:expr, $type:ty) => {
    $crate::global()
      .get_as::<$type>($id, &$crate::Parameters::new())
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required entry '{}' as {}: {}",
          $id,
          std::any::type_name::<$type>(),
          err
        )
      })
  };

  // Arm for an untyped resolution: resolve!("id")
  ($id:expr) => {
    $crate::global()
      .make($id)
      .unwrap_or_else(|err| panic!("Failed to resolve required entry '{}': {}", $id, err))
  };
}
