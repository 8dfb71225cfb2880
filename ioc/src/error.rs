use thiserror::Error;

/// The error type for every fallible container operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A type name could not be reflected by the container's `Reflector`.
  #[error("Target class \"{0}\" does not exist.")]
  ClassNotFound(String),

  /// `get` could not produce a value for the identifier.
  #[error("No entry was found for \"{0}\".")]
  EntryNotFound(String),

  /// A constructor or method parameter could not be resolved, or a method
  /// invocation through `call` failed.
  #[error("{0}")]
  Injection(String),

  /// A type name was requested while it was already being built.
  #[error("Circular dependency detected while building: {}", chain.join(" -> "))]
  CircularDependency { chain: Vec<String> },

  /// A resolved value was not of the type the caller asked for.
  #[error("Entry \"{id}\" is not of type {expected}")]
  TypeMismatch { id: String, expected: &'static str },

  #[error("Failed to parse container configuration: {0}")]
  Config(String),
}

impl Error {
  pub fn is_class_not_found(&self) -> bool {
    matches!(self, Error::ClassNotFound(_))
  }

  pub fn is_entry_not_found(&self) -> bool {
    matches!(self, Error::EntryNotFound(_))
  }

  pub fn is_injection(&self) -> bool {
    matches!(self, Error::Injection(_))
  }
}

/// A specialized `Result` type for `fibre_autowire` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
