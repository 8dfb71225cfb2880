//! Bindings: a factory paired with a sharing policy.

use crate::container::Container;
use crate::core::{Instance, Parameters};
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Produces an instance, given the container and the active override map.
pub type Factory = Arc<dyn Fn(&Container, &Parameters) -> Result<Instance> + Send + Sync>;

/// An immutable registration held in the container's binding table.
#[derive(Clone)]
pub struct Binding {
  factory: Factory,
  shared: bool,
}

impl Binding {
  pub fn new(factory: Factory, shared: bool) -> Self {
    Self { factory, shared }
  }

  pub fn factory(&self) -> &Factory {
    &self.factory
  }

  /// Whether the produced instance is cached and reused.
  pub fn is_shared(&self) -> bool {
    self.shared
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Binding")
      .field("shared", &self.shared)
      .finish_non_exhaustive()
  }
}

/// What a binding or a build is made from: a reflectable type name, or a
/// factory closure.
#[derive(Clone)]
pub enum Concrete {
  Type(String),
  Factory(Factory),
}

impl Concrete {
  pub fn factory<F>(factory: F) -> Self
  where
    F: Fn(&Container, &Parameters) -> Result<Instance> + Send + Sync + 'static,
  {
    Concrete::Factory(Arc::new(factory))
  }
}

impl From<&str> for Concrete {
  fn from(type_name: &str) -> Self {
    Concrete::Type(type_name.to_owned())
  }
}

impl From<String> for Concrete {
  fn from(type_name: String) -> Self {
    Concrete::Type(type_name)
  }
}

impl From<Factory> for Concrete {
  fn from(factory: Factory) -> Self {
    Concrete::Factory(factory)
  }
}

impl fmt::Debug for Concrete {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Concrete::Type(name) => f.debug_tuple("Type").field(name).finish(),
      Concrete::Factory(_) => f.write_str("Factory(..)"),
    }
  }
}
