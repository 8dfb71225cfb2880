//! The process-wide container handle.

use crate::container::{Container, ContainerBuilder};
use once_cell::sync::OnceCell;

// Created on first access, unless `init_global` ran before.
static GLOBAL_CONTAINER: OnceCell<Container> = OnceCell::new();

/// Provides a reference to the global container instance.
///
/// Unless [`init_global`] ran first, this is a default container over an
/// empty `TypeRegistry`: shared instances and factory bindings work, type
/// names do not resolve.
///
/// # Examples
///
/// ```
/// use fibre_autowire::global;
///
/// global().set("greeting", String::from("Hello from global!"));
/// assert!(global().has("greeting"));
/// ```
pub fn global() -> &'static Container {
  GLOBAL_CONTAINER.get_or_init(Container::default)
}

/// Creates the global container from `builder`.
///
/// Returns `false`, leaving the existing container in place, if the global
/// container was already created.
pub fn init_global(builder: ContainerBuilder) -> bool {
  let initialised = GLOBAL_CONTAINER.set(builder.build()).is_ok();
  if !initialised {
    tracing::debug!("global container already initialised");
  }
  initialised
}
