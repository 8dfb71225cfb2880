//! Container behaviour switches.

use crate::error::{Error, Result};
use serde::Deserialize;

fn default_true() -> bool {
  true
}

/// Tunables applied through `ContainerBuilder::config`.
///
/// ```
/// use fibre_autowire::ContainerConfig;
///
/// let config = ContainerConfig::from_yaml_str("detect_cycles: false").unwrap();
/// assert!(!config.detect_cycles);
/// assert!(config.auto_bind);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
  /// Fail with `Error::CircularDependency` when a type is requested while the
  /// same thread is already building it. A parameter with a default or a
  /// variadic recovers from that failure like from any other. Without it such a request recurses until the
  /// stack overflows.
  #[serde(default = "default_true")]
  pub detect_cycles: bool,

  /// Let `get` bind an unregistered identifier to the type of the same
  /// name. When off, only explicit bindings and shared instances resolve.
  #[serde(default = "default_true")]
  pub auto_bind: bool,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      detect_cycles: true,
      auto_bind: true,
    }
  }
}

impl ContainerConfig {
  pub fn from_yaml_str(source: &str) -> Result<Self> {
    // An empty document is `null` in YAML; treat it as "all defaults".
    if source.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(source).map_err(|e| Error::Config(e.to_string()))
  }
}
