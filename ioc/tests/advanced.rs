use fibre_autowire::{
  instance, params, ClassInfo, Concrete, Container, ContainerConfig, Error, Instance, Parameter, Parameters,
  TypeRegistry,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// --- Advanced Test Fixtures ---

#[derive(Default)]
struct Logger;

// Variadic over a resolvable type: receives exactly one logger.
struct Handler {
  loggers: Vec<Arc<Logger>>,
}

// Variadic over a type nobody can build.
struct Plugins {
  plugins: Vec<Arc<String>>,
}

// Variadic over a builtin.
struct Tags {
  tags: Vec<Arc<String>>,
}

struct Retry {
  attempts: u32,
}

struct Needy {
  port: u16,
}

struct Cache {
  backend: Arc<String>,
}

struct Strict {
  _missing: Instance,
}

struct Tolerant {
  needy: Arc<Needy>,
}

struct Ping {
  _pong: Arc<Pong>,
}

struct Pong {
  _ping: Arc<Ping>,
}

// Self-referencing with a default that ends the chain.
struct Node {
  depth: u8,
}

// Slow to construct, to keep one build in flight while another starts.
struct Slow {
  _logger: Arc<Logger>,
}

#[derive(Default)]
struct Base;

struct Derived {
  base: Arc<Base>,
}

struct Orphan {
  level: u8,
}

fn registry() -> Arc<TypeRegistry> {
  let registry = Arc::new(TypeRegistry::new());
  registry.register(ClassInfo::implicit::<Logger>("Logger"));
  registry.register(ClassInfo::constructed::<Handler, _>(
    "Handler",
    vec![Parameter::class("loggers", "Logger").variadic()],
    |args| Ok(Handler { loggers: args.rest()? }),
  ));
  registry.register(ClassInfo::constructed::<Plugins, _>(
    "Plugins",
    vec![Parameter::class("plugins", "Plugin").variadic()],
    |args| Ok(Plugins { plugins: args.rest()? }),
  ));
  registry.register(ClassInfo::constructed::<Tags, _>(
    "Tags",
    vec![Parameter::builtin("tags").variadic()],
    |args| Ok(Tags { tags: args.rest()? }),
  ));
  registry.register(ClassInfo::constructed::<Retry, _>(
    "Retry",
    vec![Parameter::builtin("attempts").with_default(3u32)],
    |args| {
      Ok(Retry {
        attempts: *args.next::<u32>()?,
      })
    },
  ));
  registry.register(ClassInfo::constructed::<Needy, _>(
    "Needy",
    vec![Parameter::builtin("port")],
    |args| Ok(Needy { port: *args.next::<u16>()? }),
  ));
  registry.register(ClassInfo::constructed::<Cache, _>(
    "Cache",
    vec![Parameter::class("backend", "Backend").with_default(String::from("memory"))],
    |args| Ok(Cache { backend: args.next()? }),
  ));
  registry.register(ClassInfo::constructed::<Strict, _>(
    "Strict",
    vec![Parameter::class("missing", "Missing")],
    |args| {
      Ok(Strict {
        _missing: args.next_instance()?,
      })
    },
  ));
  registry.register(ClassInfo::constructed::<Tolerant, _>(
    "Tolerant",
    vec![Parameter::class("needy", "Needy").with_default(Needy { port: 1 })],
    |args| Ok(Tolerant { needy: args.next()? }),
  ));
  registry.register(ClassInfo::constructed::<Ping, _>(
    "Ping",
    vec![Parameter::class("pong", "Pong")],
    |args| Ok(Ping { _pong: args.next()? }),
  ));
  registry.register(ClassInfo::constructed::<Pong, _>(
    "Pong",
    vec![Parameter::class("ping", "Ping")],
    |args| Ok(Pong { _ping: args.next()? }),
  ));
  registry.register(ClassInfo::constructed::<Node, _>(
    "Node",
    vec![Parameter::self_type("next").with_default(0u8)],
    |args| {
      // Either the default depth or a fully built next node.
      let next = args.next_instance()?;
      let depth = match next.downcast_ref::<Node>() {
        Some(node) => node.depth + 1,
        None => *next
          .downcast_ref::<u8>()
          .ok_or_else(|| Error::Injection("unexpected next node".into()))?,
      };
      Ok(Node { depth })
    },
  ));
  registry.register(ClassInfo::constructed::<Slow, _>(
    "Slow",
    vec![Parameter::class("logger", "Logger")],
    |args| {
      thread::sleep(Duration::from_millis(200));
      Ok(Slow { _logger: args.next()? })
    },
  ));
  registry.register(ClassInfo::implicit::<Base>("Base"));
  registry.register(
    ClassInfo::constructed::<Derived, _>("Derived", vec![Parameter::parent("base")], |args| {
      Ok(Derived { base: args.next()? })
    })
    .extends("Base"),
  );
  registry.register(ClassInfo::constructed::<Orphan, _>(
    "Orphan",
    vec![Parameter::parent("level").with_default(7u8)],
    |args| Ok(Orphan { level: *args.next::<u8>()? }),
  ));
  registry
}

fn container() -> Container {
  Container::with_reflector(registry())
}

// --- Variadics ---

#[test]
fn test_variadic_class_parameter_receives_one_value() {
  let c = container();

  let handler = c.get_as::<Handler>("Handler", &Parameters::new()).unwrap();

  assert_eq!(handler.loggers.len(), 1);
}

#[test]
fn test_unresolvable_variadic_class_parameter_is_empty() {
  let c = container();

  let plugins = c.get_as::<Plugins>("Plugins", &Parameters::new()).unwrap();

  assert!(plugins.plugins.is_empty());
}

#[test]
fn test_variadic_builtin_parameter_is_empty() {
  let c = container();

  let tags = c.get_as::<Tags>("Tags", &Parameters::new()).unwrap();

  assert!(tags.tags.is_empty());
}

// --- Defaults and builtins ---

#[test]
fn test_builtin_default_is_used() {
  let c = container();

  let retry = c.get_as::<Retry>("Retry", &Parameters::new()).unwrap();

  assert_eq!(retry.attempts, 3);
}

#[test]
fn test_builtin_override_wins_over_default() {
  let c = container();

  let retry = c
    .get_as::<Retry>("Retry", &params! { "attempts" => 10u32 })
    .unwrap();

  assert_eq!(retry.attempts, 10);
}

#[test]
fn test_builtin_without_default_is_an_injection_error() {
  let c = container();

  let err = c.make("Needy").unwrap_err();

  assert_eq!(
    err,
    Error::Injection("Unresolvable dependency resolving \"port\" in class \"Needy\"".into())
  );

  let needy = c
    .get_as::<Needy>("Needy", &params! { "port" => 8080u16 })
    .unwrap();
  assert_eq!(needy.port, 8080);
}

#[test]
fn test_unresolvable_class_falls_back_to_default() {
  let c = container();

  let cache = c.get_as::<Cache>("Cache", &Parameters::new()).unwrap();

  assert_eq!(*cache.backend, "memory");
}

#[test]
fn test_failing_nested_build_falls_back_to_default() {
  let c = container();

  let tolerant = c.get_as::<Tolerant>("Tolerant", &Parameters::new()).unwrap();
  assert_eq!(tolerant.needy.port, 1);

  // With the override, the nested build succeeds and the default is unused.
  let tolerant = c
    .get_as::<Tolerant>("Tolerant", &params! { "port" => 9000u16 })
    .unwrap();
  assert_eq!(tolerant.needy.port, 9000);
}

#[test]
fn test_unresolvable_class_without_fallback_is_wrapped() {
  let c = container();

  let err = c.make("Strict").unwrap_err();

  assert_eq!(err, Error::Injection("No entry was found for \"Missing\".".into()));
}

// --- Self and parent ---

#[test]
fn test_parent_type_resolves_to_declared_parent() {
  let c = container();
  let base: Instance = Arc::new(Base);
  c.set("Base", base.clone());

  let derived = c.get_as::<Derived>("Derived", &Parameters::new()).unwrap();

  let got: Instance = derived.base.clone();
  assert!(Arc::ptr_eq(&got, &base));
}

#[test]
fn test_parent_type_without_parent_uses_default() {
  let c = container();

  let orphan = c.get_as::<Orphan>("Orphan", &Parameters::new()).unwrap();

  assert_eq!(orphan.level, 7);
}

// --- Cycles and stack hygiene ---

#[test]
fn test_circular_dependency_is_reported() {
  let c = container();

  let err = c.make("Ping").unwrap_err();

  assert_eq!(
    err,
    Error::CircularDependency {
      chain: vec!["Ping".into(), "Pong".into(), "Ping".into()]
    }
  );
  assert!(err.to_string().contains("Ping -> Pong -> Ping"));
  assert!(c.build_stack().is_empty());
}

#[test]
fn test_self_reference_with_default_ends_the_cycle() {
  let c = container();

  let node = c.get_as::<Node>("Node", &Parameters::new()).unwrap();

  // Building `next` would re-enter `Node`, so the default is injected.
  assert_eq!(node.depth, 0);
  assert!(c.build_stack().is_empty());
}

#[test]
fn test_concurrent_builds_of_one_type_are_not_cycles() {
  let c = container();

  let results: Vec<Result<(), Error>> = thread::scope(|s| {
    let first = s.spawn(|| c.make("Slow").map(|_| ()));
    thread::sleep(Duration::from_millis(50));
    let second = s.spawn(|| c.make("Slow").map(|_| ()));
    vec![first.join().unwrap(), second.join().unwrap()]
  });

  assert_eq!(results, vec![Ok(()), Ok(())]);
}

#[test]
fn test_failed_resolution_leaves_no_stale_override() {
  let c = container();

  // Fails resolving `Missing`, after the override frame was pushed.
  assert!(c
    .get_as::<Strict>("Strict", &params! { "port" => 1u16 })
    .is_err());
  assert!(c.build_stack().is_empty());

  // A sibling call must not see the failed call's overrides.
  let sees_no_overrides = c
    .build(Concrete::factory(|_, params| Ok(instance(params.is_empty()))))
    .unwrap();
  assert_eq!(sees_no_overrides.downcast_ref::<bool>(), Some(&true));
  assert!(format!("{:?}", c).contains("override_depth: 0"));
}

// --- Configuration ---

#[test]
fn test_auto_bind_can_be_disabled() {
  let config = ContainerConfig::from_yaml_str("auto_bind: false").unwrap();
  let c = Container::builder().reflector(registry()).config(config).build();

  assert_eq!(c.make("Logger").unwrap_err(), Error::EntryNotFound("Logger".into()));
  assert!(!c.has("Logger"));

  c.bind("Logger", None, false).unwrap();
  assert!(c.make("Logger").is_ok());
}

#[test]
fn test_container_config_is_exposed() {
  let c = container();
  assert_eq!(c.config(), &ContainerConfig::default());
  assert!(c.reflector().reflect("Logger").is_some());
}

// --- Factories ---

#[test]
fn test_factories_see_the_active_overrides() {
  let c = container();
  c.bind_factory("Direct", false, |_, params| Ok(instance(params.contains("flag"))));
  c.bind_factory("ViaBuild", false, |container, _| {
    container.build(Concrete::factory(|_, params| Ok(instance(params.contains("flag")))))
  });

  let flagged = params! { "flag" => true };
  assert!(*c.get_as::<bool>("Direct", &flagged).unwrap());
  assert!(*c.get_as::<bool>("ViaBuild", &flagged).unwrap());
  assert!(!*c.get_as::<bool>("ViaBuild", &Parameters::new()).unwrap());
}

#[test]
fn test_failed_shared_factory_is_not_cached() {
  static CALLS: AtomicUsize = AtomicUsize::new(0);
  let c = container();
  c.bind_factory("Flaky", true, |_, _| {
    if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
      Err(Error::Injection("not yet".into()))
    } else {
      Ok(instance(Logger))
    }
  });

  assert!(c.make("Flaky").is_err());
  let first = c.make("Flaky").unwrap();
  let second = c.make("Flaky").unwrap();

  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(CALLS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_rebinding_replaces_previous_policy() {
  let c = container();
  c.singleton("Logger", "Logger").unwrap();
  let cached = c.make("Logger").unwrap();
  assert!(Arc::ptr_eq(&cached, &c.make("Logger").unwrap()));

  c.bind_type("Logger", "Logger", false).unwrap();
  let fresh = c.make("Logger").unwrap();
  assert!(!Arc::ptr_eq(&cached, &fresh));
  assert!(!Arc::ptr_eq(&fresh, &c.make("Logger").unwrap()));
}

#[test]
fn test_forget_removes_entries() {
  let c = container();
  c.set("answer", 42u32);

  assert!(c.forget("answer"));
  assert!(!c.has("answer"));
  assert!(!c.forget("answer"));
}

#[test]
fn test_shared_instances_are_readable_across_threads() {
  let c = container();
  let logger: Instance = Arc::new(Logger);
  c.set("Logger", logger.clone());

  thread::scope(|s| {
    for _ in 0..8 {
      s.spawn(|| {
        let got = c.make("Logger").unwrap();
        assert!(Arc::ptr_eq(&got, &logger));
      });
    }
  });
}
