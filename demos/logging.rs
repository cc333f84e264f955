//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use dependency_autowire::{
    Args, Binding, Constructor, Container, Parameter, TypeDescriptor, TypeRegistry,
};

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct UserService {
    db: std::sync::Arc<Database>,
}

fn main() {
    // Every resolution step is logged at TRACE under the crate target
    dependency_autowire::logging::builder()
        .pretty()
        .trace()
        .autowire_only()
        .init();

    println!("=== Dependency Autowire Logging Demo ===\n");

    let types = TypeRegistry::new();
    types.register(TypeDescriptor::interface("Store"));
    types.register(
        TypeDescriptor::concrete("Database").with_constructor(
            Constructor::new(|deps| {
                Ok(Database {
                    url: deps.cloned::<String>(0)?,
                })
            })
            .param(Parameter::primitive::<String>("url").with_default(String::from("postgres://localhost/app"))),
        ),
    );
    types.register(
        TypeDescriptor::concrete("UserService").with_constructor(
            Constructor::new(|deps| Ok(UserService { db: deps.get::<Database>(0)? }))
                .param(Parameter::dependency("db", "Store")),
        ),
    );

    // Logs: "Creating new autowiring container"
    let container = Container::new(types);

    // Logs: "Registering binding"
    container.bind("Store", "Database");
    container.singleton("users", "UserService");
    container.bind("request.id", Binding::factory(|_| 7u64));

    println!("\n--- First access: singleton initializes ---");
    let _ = container.make("users", &Args::new());

    println!("\n--- Second access: served from cache ---");
    let _ = container.make("users", &Args::new());

    println!("\n--- Factory binding ---");
    let _ = container.make("request.id", &Args::new());

    println!("\n--- Failure: unknown type ---");
    if let Err(err) = container.make("Mailer", &Args::new()) {
        println!("  [App] {err}");
    }

    println!("\n=== Demo Complete ===");
}
