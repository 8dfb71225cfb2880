use fibre_autowire::{params, ClassInfo, Container, Parameter, TypeRegistry};
use std::sync::Arc;

struct Connection {
  url: Arc<String>,
}

struct Repository {
  connection: Arc<Connection>,
}

struct UserService {
  repository: Arc<Repository>,
}

fn main() {
  let registry = Arc::new(TypeRegistry::new());
  registry.register(ClassInfo::constructed::<Connection, _>(
    "Connection",
    vec![Parameter::builtin("url").with_default(String::from("postgres://localhost/app"))],
    |args| Ok(Connection { url: args.next()? }),
  ));
  registry.register(ClassInfo::constructed::<Repository, _>(
    "Repository",
    vec![Parameter::class("connection", "Connection")],
    |args| Ok(Repository { connection: args.next()? }),
  ));
  registry.register(ClassInfo::constructed::<UserService, _>(
    "UserService",
    vec![Parameter::class("repository", "Repository")],
    |args| Ok(UserService { repository: args.next()? }),
  ));
  let container = Container::with_reflector(registry);

  // Without overrides, the default URL is used two levels down.
  let service = container.get_as::<UserService>("UserService", &params! {}).unwrap();
  println!("default url:  {}", service.repository.connection.url);
  assert_eq!(*service.repository.connection.url, "postgres://localhost/app");

  // An override reaches every constructor the call builds.
  let service = container
    .get_as::<UserService>("UserService", &params! { "url" => String::from("postgres://replica/app") })
    .unwrap();
  println!("override url: {}", service.repository.connection.url);
  assert_eq!(*service.repository.connection.url, "postgres://replica/app");

  // Overrides are scoped to the call that passed them.
  let service = container.get_as::<UserService>("UserService", &params! {}).unwrap();
  assert_eq!(*service.repository.connection.url, "postgres://localhost/app");
  println!("scoped again: {}", service.repository.connection.url);
}
