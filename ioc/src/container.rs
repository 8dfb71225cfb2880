//! The main `Container` struct and its resolution algorithm.

use crate::binding::{Binding, Concrete, Factory};
use crate::config::ContainerConfig;
use crate::core::{instance, BuildStack, Instance, OverrideStack, Parameters};
use crate::error::{Error, Result};
use crate::reflect::{Arguments, ClassInfo, Constructor, ParamType, Parameter, Reflector, TypeRegistry};
use dashmap::DashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The Inversion of Control (IoC) container.
///
/// Holds explicit bindings and shared instances keyed by identifier, and
/// builds anything else it can reflect by resolving constructor parameters
/// recursively.
///
/// The container is `Send + Sync`. The override and build stacks are kept
/// per thread, so resolutions running on different threads do not see each
/// other's overrides or trip cycle detection.
pub struct Container {
  bindings: DashMap<String, Binding>,
  shared: DashMap<String, Instance>,
  build_stack: BuildStack,
  overrides: OverrideStack,
  reflector: Arc<dyn Reflector>,
  config: ContainerConfig,
}

/// A single resolved parameter, before splicing into the argument list.
enum Resolved {
  Single(Instance),
  Spread(Vec<Instance>),
}

impl Default for Container {
  fn default() -> Self {
    ContainerBuilder::new().build()
  }
}

impl Container {
  /// Creates an empty container over an empty `TypeRegistry`.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_reflector(reflector: Arc<dyn Reflector>) -> Self {
    ContainerBuilder::new().reflector(reflector).build()
  }

  pub fn builder() -> ContainerBuilder {
    ContainerBuilder::new()
  }

  pub fn reflector(&self) -> &Arc<dyn Reflector> {
    &self.reflector
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.config
  }

  /// The type names the calling thread is currently building, outermost
  /// first.
  pub fn build_stack(&self) -> Vec<String> {
    self.build_stack.snapshot()
  }

  // --- PRIVATE HELPERS ---

  fn drop_stale(&self, id: &str) -> bool {
    let binding = self.bindings.remove(id).is_some();
    let shared = self.shared.remove(id).is_some();
    binding || shared
  }

  fn insert_binding(&self, id: &str, factory: Factory, shared: bool) {
    debug!(id, shared, "binding registered");
    self.bindings.insert(id.to_owned(), Binding::new(factory, shared));
  }

  fn type_factory(type_name: String) -> Factory {
    Arc::new(move |container: &Container, _: &Parameters| container.build_type(&type_name))
  }

  // --- Registration ---

  /// Whether `id` has a binding or a shared instance.
  pub fn has(&self, id: &str) -> bool {
    self.bindings.contains_key(id) || self.shared.contains_key(id)
  }

  /// Stores `value` as the shared instance for `id`, replacing any binding.
  ///
  /// Passing an [`Instance`] keeps its identity: `get(id)` returns that very
  /// `Arc`. A typed `Arc<T>` is stored as an `Arc<T>` value unless it goes
  /// through [`from_arc`](crate::from_arc) first.
  pub fn set<T: Any + Send + Sync>(&self, id: &str, value: T) {
    self.drop_stale(id);
    debug!(id, "shared instance registered");
    self.shared.insert(id.to_owned(), instance(value));
  }

  /// Registers a binding for `id`, replacing any binding or shared instance.
  ///
  /// `None` binds `id` to the type of the same name. A type name must be
  /// reflectable, otherwise this fails with `Error::ClassNotFound`.
  pub fn bind(&self, id: &str, concrete: Option<Concrete>, shared: bool) -> Result<()> {
    self.drop_stale(id);

    let factory = match concrete.unwrap_or_else(|| Concrete::Type(id.to_owned())) {
      Concrete::Factory(factory) => factory,
      Concrete::Type(type_name) => {
        if self.reflector.reflect(&type_name).is_none() {
          return Err(Error::ClassNotFound(type_name));
        }
        Self::type_factory(type_name)
      }
    };

    self.insert_binding(id, factory, shared);
    Ok(())
  }

  /// Binds `id` to the type `type_name`.
  pub fn bind_type(&self, id: &str, type_name: &str, shared: bool) -> Result<()> {
    self.bind(id, Some(Concrete::from(type_name)), shared)
  }

  /// Binds `id` to a factory closure. Never fails.
  pub fn bind_factory<F>(&self, id: &str, shared: bool, factory: F)
  where
    F: Fn(&Container, &Parameters) -> Result<Instance> + Send + Sync + 'static,
  {
    self.drop_stale(id);
    self.insert_binding(id, Arc::new(factory), shared);
  }

  /// Binds `id` to the type `type_name` as a shared singleton.
  pub fn singleton(&self, id: &str, type_name: &str) -> Result<()> {
    self.bind_type(id, type_name, true)
  }

  /// Removes the binding and shared instance for `id`. Returns whether
  /// anything was registered.
  pub fn forget(&self, id: &str) -> bool {
    let removed = self.drop_stale(id);
    debug!(id, removed, "entry forgotten");
    removed
  }

  // --- Resolution ---

  /// Resolves `id`, building it if needed.
  ///
  /// Unregistered identifiers are bound to the type of the same name first;
  /// if no such type can be reflected this fails with
  /// `Error::EntryNotFound`. `parameters` override constructor parameters
  /// by name anywhere in the construction chain this call triggers.
  pub fn get(&self, id: &str, parameters: &Parameters) -> Result<Instance> {
    self.get_with(id, Arc::new(parameters.clone()))
  }

  /// Resolves `id` without overrides.
  pub fn make(&self, id: &str) -> Result<Instance> {
    self.get(id, &Parameters::new())
  }

  /// Resolves `id` and downcasts it to `T`.
  pub fn get_as<T: Any + Send + Sync>(&self, id: &str, parameters: &Parameters) -> Result<Arc<T>> {
    let entry = self.get(id, parameters)?;
    entry.downcast::<T>().map_err(|_| Error::TypeMismatch {
      id: id.to_owned(),
      expected: type_name::<T>(),
    })
  }

  fn get_with(&self, id: &str, parameters: Arc<Parameters>) -> Result<Instance> {
    if !self.has(id) {
      if !self.config.auto_bind {
        return Err(Error::EntryNotFound(id.to_owned()));
      }
      self.bind(id, None, false).map_err(|err| match err {
        Error::ClassNotFound(_) => Error::EntryNotFound(id.to_owned()),
        other => other,
      })?;
    }

    if let Some(entry) = self.shared.get(id) {
      trace!(id, "shared instance hit");
      return Ok(entry.value().clone());
    }

    // Clone the binding out so no map guard is held while the factory
    // re-enters the container.
    let binding = match self.bindings.get(id) {
      Some(binding) => binding.value().clone(),
      None => return Err(Error::EntryNotFound(id.to_owned())),
    };

    trace!(id, overrides = ?parameters, "resolving entry");
    let _frame = self.overrides.push(parameters.clone());
    let entry = (binding.factory())(self, &parameters)?;

    if binding.is_shared() {
      self.shared.insert(id.to_owned(), entry.clone());
    }
    Ok(entry)
  }

  /// Builds a fresh instance, bypassing bindings and the shared cache.
  ///
  /// A factory is invoked with the innermost override map. A type name is
  /// reflected and constructed, resolving its constructor parameters.
  pub fn build(&self, concrete: impl Into<Concrete>) -> Result<Instance> {
    match concrete.into() {
      Concrete::Factory(factory) => {
        let overrides = self.overrides.top();
        factory(self, &overrides)
      }
      Concrete::Type(type_name) => self.build_type(&type_name),
    }
  }

  fn build_type(&self, type_name: &str) -> Result<Instance> {
    let class = self
      .reflector
      .reflect(type_name)
      .ok_or_else(|| Error::ClassNotFound(type_name.to_owned()))?;

    let _frame = self.build_stack.enter(type_name, self.config.detect_cycles)?;

    match class.constructor() {
      Constructor::Implicit(new) => {
        trace!(class = type_name, "building without constructor");
        Ok(new())
      }
      Constructor::Declared { params, construct } => {
        trace!(class = type_name, params = params.len(), "building with constructor");
        let values = self
          .resolve_dependencies(&class, params)
          .map_err(into_injection)?;
        let mut args = Arguments::new(class.name(), values);
        construct(&mut args).map_err(into_injection)
      }
    }
  }

  // --- Dependency resolution ---

  fn resolve_dependencies(&self, class: &ClassInfo, params: &[Parameter]) -> Result<Vec<Instance>> {
    let mut results = Vec::with_capacity(params.len());

    for param in params {
      let overrides = self.overrides.top();
      if let Some(value) = overrides.get(param.name()) {
        trace!(class = class.name(), param = param.name(), "using override");
        results.push(value.clone());
        continue;
      }

      let resolved = match parameter_class_name(class, param) {
        None => resolve_primitive(class, param)?,
        Some(type_name) => self.resolve_class(param, &type_name, overrides)?,
      };

      match resolved {
        Resolved::Single(value) => results.push(value),
        Resolved::Spread(values) => results.extend(values),
      }
    }

    Ok(results)
  }

  fn resolve_class(&self, param: &Parameter, type_name: &str, overrides: Arc<Parameters>) -> Result<Resolved> {
    match self.get_with(type_name, overrides) {
      // Only one value can come out of the container, even for variadics.
      Ok(entry) if param.is_variadic() => Ok(Resolved::Spread(vec![entry])),
      Ok(entry) => Ok(Resolved::Single(entry)),
      // A cycle is recoverable here too: a self-referencing parameter with a
      // default ends the recursion.
      Err(err) => {
        if let Some(default) = param.default_value() {
          debug!(param = param.name(), class = type_name, error = %err, "falling back to default value");
          return Ok(Resolved::Single(default.clone()));
        }
        if param.is_variadic() {
          debug!(param = param.name(), class = type_name, error = %err, "falling back to empty variadic");
          return Ok(Resolved::Spread(Vec::new()));
        }
        Err(err)
      }
    }
  }

  // --- Method invocation ---

  /// Resolves `id`, then invokes its method `method` with injected
  /// arguments. `parameters` override method parameters by name.
  ///
  /// A failure to resolve `id` is reported as is. Every later failure is
  /// reported as one `Error::Injection` naming the target and method.
  pub fn call(&self, id: &str, method: &str, parameters: &Parameters) -> Result<Instance> {
    let target = self.make(id)?;

    self
      .invoke_method(&target, method, parameters)
      .map_err(|err| {
        debug!(id, method, error = %err, "method injection failed");
        Error::Injection(format!(
          "Target method \"{}::{}\" cannot be injected with proper dependencies.",
          id, method
        ))
      })
  }

  /// Like [`Container::call`], downcasting the result to `T`.
  pub fn call_as<T: Any + Send + Sync>(&self, id: &str, method: &str, parameters: &Parameters) -> Result<Arc<T>> {
    let result = self.call(id, method, parameters)?;
    result.downcast::<T>().map_err(|_| Error::TypeMismatch {
      id: format!("{}::{}", id, method),
      expected: type_name::<T>(),
    })
  }

  fn invoke_method(&self, target: &Instance, method_name: &str, parameters: &Parameters) -> Result<Instance> {
    let class = self
      .reflector
      .reflect_instance(target)
      .ok_or_else(|| Error::Injection("Target instance has no reflectable class".to_owned()))?;
    let method = class.method(method_name).ok_or_else(|| {
      Error::Injection(format!(
        "Method \"{}::{}\" does not exist",
        class.name(),
        method_name
      ))
    })?;

    let _frame = self.overrides.push(Arc::new(parameters.clone()));
    let values = self.resolve_dependencies(&class, method.params())?;
    let mut args = Arguments::new(&format!("{}::{}", class.name(), method_name), values);
    method.invoke(target, &mut args)
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Container")
      .field("bindings", &self.bindings.len())
      .field("shared", &self.shared.len())
      .field("build_stack", &self.build_stack.snapshot())
      .field("override_depth", &self.overrides.depth())
      .field("config", &self.config)
      .finish()
  }
}

/// Maps `SelfType`/`Parent` onto the declaring class. `None` means the
/// parameter is not resolved from the container.
fn parameter_class_name(class: &ClassInfo, param: &Parameter) -> Option<String> {
  match param.ty() {
    ParamType::Class(name) => Some(name.clone()),
    ParamType::SelfType => Some(class.name().to_owned()),
    ParamType::Parent => class.parent().map(str::to_owned),
    ParamType::Builtin => None,
  }
}

fn resolve_primitive(class: &ClassInfo, param: &Parameter) -> Result<Resolved> {
  if let Some(default) = param.default_value() {
    return Ok(Resolved::Single(default.clone()));
  }
  if param.is_variadic() {
    return Ok(Resolved::Spread(Vec::new()));
  }
  Err(Error::Injection(format!(
    "Unresolvable dependency resolving \"{}\" in class \"{}\"",
    param.name(),
    class.name()
  )))
}

/// Construction failures surface as `Error::Injection`, keeping the inner
/// message. Cycles keep their own kind.
fn into_injection(err: Error) -> Error {
  match err {
    Error::Injection(_) | Error::CircularDependency { .. } => err,
    other => Error::Injection(other.to_string()),
  }
}

// --- Builder ---

/// Configures and creates a [`Container`].
#[derive(Default)]
pub struct ContainerBuilder {
  reflector: Option<Arc<dyn Reflector>>,
  config: ContainerConfig,
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// The reflection capability. Defaults to an empty `TypeRegistry`.
  pub fn reflector(mut self, reflector: Arc<dyn Reflector>) -> Self {
    self.reflector = Some(reflector);
    self
  }

  pub fn config(mut self, config: ContainerConfig) -> Self {
    self.config = config;
    self
  }

  pub fn build(self) -> Container {
    Container {
      bindings: DashMap::new(),
      shared: DashMap::new(),
      build_stack: BuildStack::default(),
      overrides: OverrideStack::default(),
      reflector: self
        .reflector
        .unwrap_or_else(|| Arc::new(TypeRegistry::new()) as Arc<dyn Reflector>),
      config: self.config,
    }
  }
}
