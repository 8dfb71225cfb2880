use fibre_autowire::{instance, params, ClassInfo, Container, Parameter, TypeRegistry};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger {
  prefix: String,
}

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[{}]: {}", self.prefix, message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self, title: &str) -> String {
    self.logger.log("Starting report generation.");
    let report = format!("Report: {}", title);
    self.logger.log("Finished report generation.");
    report
  }
}

fn main() {
  let registry = Arc::new(TypeRegistry::new());
  registry.register(
    ClassInfo::constructed::<ReportService, _>(
      "ReportService",
      vec![Parameter::class("logger", "Logger")],
      |args| {
        // Interface bindings hand out an `Arc<dyn Logger>` wrapped in an instance.
        let logger = args.next::<Arc<dyn Logger>>()?;
        Ok(ReportService {
          logger: (*logger).clone(),
        })
      },
    )
    .method("generate", vec![Parameter::builtin("title")], |service, args| {
      let title = args.next::<String>()?;
      Ok(instance(service.generate_report(&title)))
    }),
  );
  let container = Container::with_reflector(registry);

  // --- Registration ---

  // Bind the `Logger` identifier to a factory producing the trait object.
  container.bind_factory("Logger", true, |_, _| {
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger {
      prefix: String::from("CONSOLE LOG"),
    });
    Ok(instance(logger))
  });

  // --- Resolution ---

  // `ReportService` was never registered: it is built from its descriptor,
  // with the logger injected.
  let report = container
    .call_as::<String>("ReportService", "generate", &params! { "title" => String::from("Q3") })
    .unwrap();

  assert_eq!(*report, "Report: Q3");
  println!("{}", report);
}
