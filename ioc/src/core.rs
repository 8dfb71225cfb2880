//! Core data structures shared by the container and the reflection layer.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// A type-erased, shareable value produced or stored by the container.
///
/// Two `Instance`s are "the same instance" when `Arc::ptr_eq` holds.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps any value into an [`Instance`].
///
/// A value that already is an `Instance` is returned as is, so its identity
/// survives being passed through `Parameters` or `Container::set`. Any other
/// `Arc<T>` is wrapped like a plain value and downcasts to `Arc<T>`, not `T`;
/// use [`from_arc`] to keep it as the `T` it points to.
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
  let boxed: Box<dyn Any + Send + Sync> = Box::new(value);
  match boxed.downcast::<Instance>() {
    Ok(existing) => *existing,
    Err(boxed) => Arc::from(boxed),
  }
}

/// Erases a typed `Arc` into an [`Instance`] that shares its allocation, so
/// the value downcasts back to `T` and keeps its identity.
pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Instance {
  value
}

/// A name-keyed map of caller-supplied parameter values.
///
/// When a constructor or method parameter's name appears in the map, the
/// mapped value is injected verbatim instead of being resolved.
#[derive(Clone, Default)]
pub struct Parameters {
  values: HashMap<String, Instance>,
}

impl Parameters {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a value and returns `self`, for chained construction.
  ///
  /// The value goes through [`instance`]: pass a typed `Arc<T>` through
  /// [`from_arc`] first to inject the `T` itself.
  pub fn with<T: Any + Send + Sync>(mut self, name: &str, value: T) -> Self {
    self.insert(name, instance(value));
    self
  }

  pub fn insert(&mut self, name: &str, value: Instance) -> Option<Instance> {
    self.values.insert(name.to_owned(), value)
  }

  pub fn get(&self, name: &str) -> Option<&Instance> {
    self.values.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl fmt::Debug for Parameters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names: Vec<&String> = self.values.keys().collect();
    names.sort();
    f.debug_struct("Parameters").field("names", &names).finish()
  }
}

// --- Build stack ---

/// Identifiers currently under construction, innermost last.
///
/// Each thread resolving through the container gets its own stack, so two
/// threads building the same type never see each other's frames.
#[derive(Default)]
pub(crate) struct BuildStack {
  entries: Mutex<HashMap<ThreadId, Vec<String>>>,
}

impl BuildStack {
  /// Pushes `name` and returns a frame that pops it again when dropped.
  ///
  /// With `detect_cycles`, a name that is already on the calling thread's
  /// stack is rejected before anything is pushed.
  pub(crate) fn enter(&self, name: &str, detect_cycles: bool) -> Result<BuildFrame<'_>> {
    let thread = thread::current().id();
    let mut entries = self.entries.lock();
    let stack = entries.entry(thread).or_default();
    if detect_cycles && stack.iter().any(|entry| entry == name) {
      let mut chain = stack.clone();
      chain.push(name.to_owned());
      tracing::warn!(class = name, chain = ?chain, "circular dependency detected");
      return Err(Error::CircularDependency { chain });
    }
    stack.push(name.to_owned());
    Ok(BuildFrame { stack: self, thread })
  }

  /// The calling thread's stack, outermost first.
  pub(crate) fn snapshot(&self) -> Vec<String> {
    self
      .entries
      .lock()
      .get(&thread::current().id())
      .cloned()
      .unwrap_or_default()
  }
}

/// An RAII guard for one build stack entry.
pub(crate) struct BuildFrame<'a> {
  stack: &'a BuildStack,
  thread: ThreadId,
}

impl Drop for BuildFrame<'_> {
  fn drop(&mut self) {
    pop_thread_frame(&self.stack.entries, self.thread);
  }
}

// --- Override stack ---

/// Caller override maps, one frame per in-flight `get`/`call`, kept per
/// thread like the build stack.
///
/// Only the top frame is visible to dependency resolution.
#[derive(Default)]
pub(crate) struct OverrideStack {
  frames: Mutex<HashMap<ThreadId, Vec<Arc<Parameters>>>>,
}

impl OverrideStack {
  pub(crate) fn push(&self, parameters: Arc<Parameters>) -> OverrideFrame<'_> {
    let thread = thread::current().id();
    self.frames.lock().entry(thread).or_default().push(parameters);
    OverrideFrame { stack: self, thread }
  }

  /// The calling thread's top frame, or an empty map when nothing is in
  /// flight.
  pub(crate) fn top(&self) -> Arc<Parameters> {
    self
      .frames
      .lock()
      .get(&thread::current().id())
      .and_then(|frames| frames.last().cloned())
      .unwrap_or_else(|| Arc::new(Parameters::default()))
  }

  pub(crate) fn depth(&self) -> usize {
    self
      .frames
      .lock()
      .get(&thread::current().id())
      .map_or(0, Vec::len)
  }
}

/// An RAII guard for one override frame. The frame is popped on every exit
/// path, so a failed nested resolution never leaks its overrides.
pub(crate) struct OverrideFrame<'a> {
  stack: &'a OverrideStack,
  thread: ThreadId,
}

impl Drop for OverrideFrame<'_> {
  fn drop(&mut self) {
    pop_thread_frame(&self.stack.frames, self.thread);
  }
}

/// Pops the innermost frame of `thread`, dropping its stack once empty.
fn pop_thread_frame<T>(stacks: &Mutex<HashMap<ThreadId, Vec<T>>>, thread: ThreadId) {
  let mut stacks = stacks.lock();
  let emptied = match stacks.get_mut(&thread) {
    Some(stack) => {
      stack.pop();
      stack.is_empty()
    }
    None => false,
  };
  if emptied {
    stacks.remove(&thread);
  }
}
