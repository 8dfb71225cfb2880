use fibre_autowire::{ClassInfo, Container, TypeRegistry};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

impl Default for RequestTracker {
  fn default() -> Self {
    let id = ID_COUNTER.fetch_add(1, Ordering::SeqCst);
    println!("Creating RequestTracker #{}...", id);
    Self { id }
  }
}

fn main() {
  let registry = Arc::new(TypeRegistry::new());
  registry.register(ClassInfo::implicit::<RequestTracker>("RequestTracker"));
  let container = Container::with_reflector(registry);

  // --- Singleton Registration ---
  // The tracker will only be built ONCE for this id.
  container.singleton("singleton_tracker", "RequestTracker").unwrap();

  // --- Transient Registration ---
  // The tracker will be built EVERY time this id is resolved.
  container
    .bind_type("transient_tracker", "RequestTracker", false)
    .unwrap();

  println!("--- Resolving Singletons ---");
  let s1 = container.get_as::<RequestTracker>("singleton_tracker", &Default::default()).unwrap();
  let s2 = container.get_as::<RequestTracker>("singleton_tracker", &Default::default()).unwrap();
  println!("Singleton 1 ID: {}, Singleton 2 ID: {}", s1.id, s2.id);
  assert_eq!(s1.id, 0);
  assert!(Arc::ptr_eq(&s1, &s2), "Singleton instances should be identical");
  println!("Singleton instances are the same pointer, as expected.\n");

  println!("--- Resolving Transients ---");
  let t1 = container.get_as::<RequestTracker>("transient_tracker", &Default::default()).unwrap();
  let t2 = container.get_as::<RequestTracker>("transient_tracker", &Default::default()).unwrap();
  println!("Transient 1 ID: {}, Transient 2 ID: {}", t1.id, t2.id);
  assert_eq!(t1.id, 1);
  assert_eq!(t2.id, 2);
  assert!(!Arc::ptr_eq(&t1, &t2), "Transient instances should be different");
  println!("Transient instances are different pointers, as expected.");
}
