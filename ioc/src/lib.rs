//! # Fibre Autowire
//!
//! A reflective, name-keyed Inversion of Control (IoC) container for Rust.
//!
//! Ask the container for an identifier and it hands back a fully built
//! instance: explicit bindings are consulted first, and anything else is
//! constructed automatically by resolving its constructor parameters from the
//! container, recursively.
//!
//! ## Core Concepts
//!
//! - **Container**: holds bindings and shared instances, keyed by string
//!   identifiers. See [`Container`].
//! - **Binding**: a factory plus a sharing policy. Shared bindings cache the
//!   first instance they produce; transient ones build anew on every request.
//! - **Reflection**: Rust cannot introspect types at runtime, so types are
//!   described up front with [`ClassInfo`] and looked up through a
//!   [`Reflector`]. [`TypeRegistry`] is the stock implementation.
//! - **Overrides**: a [`Parameters`] map passed to `get` or `call` replaces
//!   any constructor or method parameter of the same name, all the way down
//!   the construction chain that call triggers.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_autowire::{params, ClassInfo, Container, Parameter, TypeRegistry};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Database;
//!
//! struct Mailer {
//!   sender: Arc<String>,
//! }
//!
//! struct Signup {
//!   db: Arc<Database>,
//!   mailer: Arc<Mailer>,
//! }
//!
//! let registry = Arc::new(TypeRegistry::new());
//! registry.register(ClassInfo::implicit::<Database>("Database"));
//! registry.register(ClassInfo::constructed::<Mailer, _>(
//!   "Mailer",
//!   vec![Parameter::builtin("sender").with_default(String::from("noreply@example.com"))],
//!   |args| Ok(Mailer { sender: args.next()? }),
//! ));
//! registry.register(ClassInfo::constructed::<Signup, _>(
//!   "Signup",
//!   vec![Parameter::class("db", "Database"), Parameter::class("mailer", "Mailer")],
//!   |args| Ok(Signup { db: args.next()?, mailer: args.next()? }),
//! ));
//!
//! let container = Container::with_reflector(registry);
//! container.singleton("Database", "Database").unwrap();
//!
//! // The override reaches the nested `Mailer` constructor.
//! let signup = container
//!   .get_as::<Signup>("Signup", &params! { "sender" => String::from("hello@example.com") })
//!   .unwrap();
//! assert_eq!(*signup.mailer.sender, "hello@example.com");
//!
//! // `Database` is shared.
//! let again = container.get_as::<Signup>("Signup", &params! {}).unwrap();
//! assert!(Arc::ptr_eq(&signup.db, &again.db));
//! ```

mod binding;
mod config;
mod container;
mod core;
mod error;
mod global;
mod macros;
mod reflect;

pub use binding::{Binding, Concrete, Factory};
pub use config::ContainerConfig;
pub use container::{Container, ContainerBuilder};
pub use crate::core::{from_arc, instance, Instance, Parameters};
pub use error::{Error, Result};
pub use global::{global, init_global};
pub use reflect::{Arguments, ClassBuilder, ClassInfo, Method, ParamType, Parameter, Reflector, TypeRegistry};
