//! # Dependency Autowire - String-Keyed IOC Container for Rust
//!
//! A concurrent inversion-of-control container that resolves string keys
//! into instances, building constructor dependencies recursively from a
//! type schema.
//!
//! ## Features
//!
//! - 🔑 **String keys** - Bind interface names, service ids or config keys
//! - 🧩 **Autowiring** - Constructor parameters are resolved by type name
//! - 🏭 **Factories** - Closures invoked with caller-supplied arguments
//! - 🔒 **Singletons** - Constructed at most once, even under contention
//! - 🔄 **Cycle detection** - `A -> B -> A` fails with the full chain
//! - 🎭 **Trait objects** - Interfaces resolve to `Arc<dyn Trait>` views
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use dependency_autowire::{Constructor, Container, Parameter, TypeDescriptor, TypeRegistry};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn path(&self) -> &str;
//! }
//!
//! struct FileLogger { path: String }
//!
//! impl Logger for FileLogger {
//!     fn path(&self) -> &str { &self.path }
//! }
//!
//! struct Mailer { logger: Arc<dyn Logger> }
//!
//! let types = TypeRegistry::new();
//! types.register(TypeDescriptor::interface("Logger"));
//! types.register(
//!     TypeDescriptor::concrete("FileLogger")
//!         .with_constructor(
//!             Constructor::new(|deps| Ok(FileLogger { path: deps.cloned::<String>(0)? }))
//!                 .param(Parameter::primitive::<String>("path").with_default(String::from("app.log"))),
//!         )
//!         .implements(|l: Arc<FileLogger>| l as Arc<dyn Logger>),
//! );
//! types.register(
//!     TypeDescriptor::concrete("Mailer").with_constructor(
//!         Constructor::new(|deps| Ok(Mailer { logger: deps.view::<dyn Logger>(0)? }))
//!             .param(Parameter::dependency("logger", "Logger")),
//!     ),
//! );
//!
//! let container = Container::new(types);
//! container.bind("Logger", "FileLogger");
//!
//! let mailer = container.get::<Mailer>("Mailer").unwrap();
//! assert_eq!(mailer.logger.path(), "app.log");
//! ```
//!
//! ## Bindings
//!
//! ```rust
//! use dependency_autowire::{Args, Binding, Container, Instance};
//!
//! #[derive(Default)]
//! struct Cache;
//!
//! let container = Container::default();
//!
//! // Alias - resolved as a type name
//! container.bind("Storage", "FileStorage");
//!
//! // Prebuilt value - returned unchanged
//! container.bind("config.debug", Binding::instance(true));
//!
//! // Factory - invoked with caller arguments
//! container.bind("greeting", Binding::factory(|args: &Args| {
//!     format!("hello {}", args.get::<String>(0).map(|s| s.to_string()).unwrap_or_default())
//! }));
//!
//! // Singleton - first result cached
//! container.singleton("Cache", Binding::factory(|_| Cache));
//!
//! let args = Args::new().with(String::from("world"));
//! let greeting = container.make("greeting", &args).unwrap();
//! assert_eq!(greeting.downcast::<String>().unwrap().as_str(), "hello world");
//!
//! let a = container.make("Cache", &Args::new()).unwrap();
//! let b = container.make("Cache", &Args::new()).unwrap();
//! assert!(Instance::ptr_eq(&a, &b));
//! ```
//!
//! ## Derive
//!
//! With the `derive` feature, `#[derive(Autowire)]` writes the type
//! descriptor from the struct definition:
//!
//! ```rust,ignore
//! use dependency_autowire::{Autowire, Container, TypeRegistry};
//! use std::sync::Arc;
//!
//! #[derive(Autowire)]
//! struct Database {
//!     #[param(default = String::from("sqlite::memory:"))]
//!     dsn: String,
//! }
//!
//! #[derive(Autowire)]
//! struct UserRepository {
//!     #[inject]
//!     db: Arc<Database>,
//! }
//!
//! let types = TypeRegistry::new();
//! types.register_type::<Database>();
//! types.register_type::<UserRepository>();
//!
//! let repo = Container::new(types).get::<UserRepository>("UserRepository").unwrap();
//! ```

mod args;
mod container;
mod error;
mod factory;
mod instance;
mod introspect;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod storage;

pub use args::*;
pub use container::*;
pub use error::*;
pub use factory::*;
pub use instance::*;
pub use introspect::*;
pub use provider::*;

#[cfg(feature = "derive")]
pub use dependency_autowire_derive::Autowire;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Args, Autowire, Binding, Constructor, Container, Dependencies, DiError, Factory,
        Injectable, Instance, Introspector, Parameter, Result, TypeDescriptor, TypeKind,
        TypeRegistry,
    };
    pub use std::sync::Arc;
}
