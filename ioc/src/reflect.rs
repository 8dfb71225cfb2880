//! The reflection capability consumed by the container.
//!
//! Rust has no runtime introspection, so the container asks a [`Reflector`]
//! to describe types by name: their parent, their constructor parameters and
//! their methods. [`TypeRegistry`] is the stock implementation, populated at
//! startup with [`ClassInfo`] descriptors:
//!
//! ```
//! use fibre_autowire::{ClassInfo, Parameter, TypeRegistry};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Clock;
//!
//! struct Scheduler {
//!   clock: Arc<Clock>,
//! }
//!
//! let registry = TypeRegistry::new();
//! registry.register(ClassInfo::implicit::<Clock>("Clock"));
//! registry.register(ClassInfo::constructed::<Scheduler, _>(
//!   "Scheduler",
//!   vec![Parameter::class("clock", "Clock")],
//!   |args| Ok(Scheduler { clock: args.next()? }),
//! ));
//!
//! assert!(registry.contains("Scheduler"));
//! ```

use crate::core::{instance, Instance};
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Describes types by name for the container.
pub trait Reflector: Send + Sync {
  /// Looks up a type by name. `None` means the type cannot be reflected.
  fn reflect(&self, type_name: &str) -> Option<Arc<ClassInfo>>;

  /// Looks up the descriptor of the type an instance was built from.
  fn reflect_instance(&self, instance: &Instance) -> Option<Arc<ClassInfo>>;
}

// --- Parameters ---

/// The declared type of a constructor or method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
  /// A named, resolvable type.
  Class(String),
  /// The declaring class itself.
  SelfType,
  /// The declaring class's immediate parent.
  Parent,
  /// A primitive or missing annotation. Never resolved from the container.
  Builtin,
}

/// One constructor or method parameter.
#[derive(Clone)]
pub struct Parameter {
  name: String,
  ty: ParamType,
  default: Option<Instance>,
  variadic: bool,
}

impl Parameter {
  fn new(name: &str, ty: ParamType) -> Self {
    Self {
      name: name.to_owned(),
      ty,
      default: None,
      variadic: false,
    }
  }

  pub fn class(name: &str, type_name: &str) -> Self {
    Self::new(name, ParamType::Class(type_name.to_owned()))
  }

  pub fn builtin(name: &str) -> Self {
    Self::new(name, ParamType::Builtin)
  }

  pub fn self_type(name: &str) -> Self {
    Self::new(name, ParamType::SelfType)
  }

  pub fn parent(name: &str) -> Self {
    Self::new(name, ParamType::Parent)
  }

  pub fn with_default<T: Any + Send + Sync>(self, value: T) -> Self {
    self.with_default_instance(instance(value))
  }

  pub fn with_default_instance(mut self, value: Instance) -> Self {
    self.default = Some(value);
    self
  }

  pub fn variadic(mut self) -> Self {
    self.variadic = true;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn ty(&self) -> &ParamType {
    &self.ty
  }

  pub fn default_value(&self) -> Option<&Instance> {
    self.default.as_ref()
  }

  pub fn is_variadic(&self) -> bool {
    self.variadic
  }
}

impl fmt::Debug for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Parameter")
      .field("name", &self.name)
      .field("ty", &self.ty)
      .field("has_default", &self.default.is_some())
      .field("variadic", &self.variadic)
      .finish()
  }
}

// --- Arguments ---

/// The resolved argument list handed to a constructor or method, in
/// declaration order with variadic values spliced in.
pub struct Arguments {
  owner: String,
  values: std::vec::IntoIter<Instance>,
  position: usize,
}

impl Arguments {
  pub(crate) fn new(owner: &str, values: Vec<Instance>) -> Self {
    Self {
      owner: owner.to_owned(),
      values: values.into_iter(),
      position: 0,
    }
  }

  /// Takes the next argument without inspecting its type.
  pub fn next_instance(&mut self) -> Result<Instance> {
    self.position += 1;
    self.values.next().ok_or_else(|| {
      Error::Injection(format!(
        "Too few arguments passed to \"{}\": argument #{} is missing",
        self.owner, self.position
      ))
    })
  }

  /// Takes the next argument as a `T`.
  pub fn next<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
    let value = self.next_instance()?;
    value.downcast::<T>().map_err(|_| {
      Error::Injection(format!(
        "Argument #{} passed to \"{}\" must be of type {}",
        self.position,
        self.owner,
        type_name::<T>()
      ))
    })
  }

  /// Takes every remaining argument as a `T`, for variadic parameters.
  pub fn rest<T: Any + Send + Sync>(&mut self) -> Result<Vec<Arc<T>>> {
    let mut rest = Vec::with_capacity(self.remaining());
    while self.remaining() > 0 {
      rest.push(self.next::<T>()?);
    }
    Ok(rest)
  }

  pub fn remaining(&self) -> usize {
    self.values.len()
  }
}

// --- Class descriptors ---

type ConstructFn = Arc<dyn Fn(&mut Arguments) -> Result<Instance> + Send + Sync>;
type MethodFn = Arc<dyn Fn(&Instance, &mut Arguments) -> Result<Instance> + Send + Sync>;

pub(crate) enum Constructor {
  /// No declared constructor: the type is built with no arguments.
  Implicit(Arc<dyn Fn() -> Instance + Send + Sync>),
  Declared {
    params: Vec<Parameter>,
    construct: ConstructFn,
  },
}

/// A method that can be invoked through `Container::call`.
pub struct Method {
  params: Vec<Parameter>,
  invoke: MethodFn,
}

impl Method {
  pub fn params(&self) -> &[Parameter] {
    &self.params
  }

  pub(crate) fn invoke(&self, target: &Instance, args: &mut Arguments) -> Result<Instance> {
    (self.invoke)(target, args)
  }
}

/// Everything the container needs to know about one type.
pub struct ClassInfo {
  name: String,
  parent: Option<String>,
  type_id: TypeId,
  rust_type: &'static str,
  constructor: Constructor,
  methods: HashMap<String, Method>,
}

impl ClassInfo {
  /// Describes a type without a declared constructor. It is built from
  /// `T::default()`.
  pub fn implicit<T: Any + Send + Sync + Default>(name: &str) -> ClassBuilder<T> {
    ClassBuilder::new(
      name,
      Constructor::Implicit(Arc::new(|| instance(T::default()))),
    )
  }

  /// Describes a type with a declared constructor. `construct` receives the
  /// resolved arguments in the order of `params`.
  pub fn constructed<T, F>(name: &str, params: Vec<Parameter>, construct: F) -> ClassBuilder<T>
  where
    T: Any + Send + Sync,
    F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
  {
    let construct: ConstructFn = Arc::new(move |args: &mut Arguments| construct(args).map(instance));
    ClassBuilder::new(name, Constructor::Declared { params, construct })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn parent(&self) -> Option<&str> {
    self.parent.as_deref()
  }

  /// The `TypeId` of the Rust type instances of this class have.
  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn has_constructor(&self) -> bool {
    matches!(self.constructor, Constructor::Declared { .. })
  }

  /// Declared constructor parameters, or `None` for an implicit constructor.
  pub fn constructor_params(&self) -> Option<&[Parameter]> {
    match &self.constructor {
      Constructor::Declared { params, .. } => Some(params),
      Constructor::Implicit(_) => None,
    }
  }

  pub fn method(&self, name: &str) -> Option<&Method> {
    self.methods.get(name)
  }

  pub(crate) fn constructor(&self) -> &Constructor {
    &self.constructor
  }
}

impl fmt::Debug for ClassInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut methods: Vec<&String> = self.methods.keys().collect();
    methods.sort();
    f.debug_struct("ClassInfo")
      .field("name", &self.name)
      .field("parent", &self.parent)
      .field("rust_type", &self.rust_type)
      .field("constructor", &self.constructor_params())
      .field("methods", &methods)
      .finish()
  }
}

/// Builds a [`ClassInfo`] for the Rust type `T`.
pub struct ClassBuilder<T> {
  info: ClassInfo,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
  fn new(name: &str, constructor: Constructor) -> Self {
    Self {
      info: ClassInfo {
        name: name.to_owned(),
        parent: None,
        type_id: TypeId::of::<T>(),
        rust_type: type_name::<T>(),
        constructor,
        methods: HashMap::new(),
      },
      _marker: PhantomData,
    }
  }

  /// Names the immediate parent, the target of `ParamType::Parent`.
  pub fn extends(mut self, parent: &str) -> Self {
    self.info.parent = Some(parent.to_owned());
    self
  }

  /// Adds an invokable method. The closure receives the target instance
  /// and the resolved arguments.
  pub fn method<F>(mut self, name: &str, params: Vec<Parameter>, invoke: F) -> Self
  where
    F: Fn(&T, &mut Arguments) -> Result<Instance> + Send + Sync + 'static,
  {
    let class = self.info.name.clone();
    let method = name.to_owned();
    let invoke: MethodFn = Arc::new(move |target: &Instance, args: &mut Arguments| {
      let target = target.downcast_ref::<T>().ok_or_else(|| {
        Error::Injection(format!(
          "Method \"{}::{}\" invoked on a value of another type",
          class, method
        ))
      })?;
      invoke(target, args)
    });
    self
      .info
      .methods
      .insert(name.to_owned(), Method { params, invoke });
    self
  }

  pub fn build(self) -> ClassInfo {
    self.info
  }
}

impl<T: Any + Send + Sync> From<ClassBuilder<T>> for ClassInfo {
  fn from(builder: ClassBuilder<T>) -> Self {
    builder.build()
  }
}

// --- Registry ---

/// A thread-safe [`Reflector`] backed by explicit registrations.
///
/// Registering a second class under an existing name replaces it. When two
/// names describe the same Rust type, instance lookups see the latest one.
#[derive(Default)]
pub struct TypeRegistry {
  by_name: DashMap<String, Arc<ClassInfo>>,
  by_type: DashMap<TypeId, Arc<ClassInfo>>,
}

impl TypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&self, class: impl Into<ClassInfo>) -> Arc<ClassInfo> {
    let class = Arc::new(class.into());
    tracing::trace!(class = class.name(), rust_type = class.rust_type, "registering class");
    self.by_name.insert(class.name.clone(), class.clone());
    self.by_type.insert(class.type_id, class.clone());
    class
  }

  pub fn contains(&self, type_name: &str) -> bool {
    self.by_name.contains_key(type_name)
  }

  pub fn len(&self) -> usize {
    self.by_name.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_name.is_empty()
  }
}

impl Reflector for TypeRegistry {
  fn reflect(&self, type_name: &str) -> Option<Arc<ClassInfo>> {
    self.by_name.get(type_name).map(|entry| entry.value().clone())
  }

  fn reflect_instance(&self, instance: &Instance) -> Option<Arc<ClassInfo>> {
    let type_id = (**instance).type_id();
    self.by_type.get(&type_id).map(|entry| entry.value().clone())
  }
}
