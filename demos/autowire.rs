//! Autowiring walkthrough
//!
//! ```bash
//! cargo run --example autowire
//! ```

use dependency_autowire::{
    Args, Binding, Constructor, Container, DiError, Instance, Parameter, TypeDescriptor,
    TypeRegistry,
};
use std::sync::Arc;

trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

struct FileLogger {
    path: String,
}

impl Logger for FileLogger {
    fn log(&self, message: &str) {
        println!("  [{}] {}", self.path, message);
    }
}

struct Mailer {
    logger: Arc<dyn Logger>,
    sender: String,
}

struct Registry {
    created_by: &'static str,
}

fn types() -> TypeRegistry {
    let types = TypeRegistry::new();

    types.register(TypeDescriptor::interface("Logger"));
    types.register(TypeDescriptor::abstract_type("Transport"));

    types.register(
        TypeDescriptor::concrete("FileLogger")
            .with_constructor(
                Constructor::new(|deps| {
                    Ok(FileLogger {
                        path: deps.cloned::<String>(0)?,
                    })
                })
                .param(Parameter::primitive::<String>("path").with_default(String::from("app.log"))),
            )
            .implements(|logger: Arc<FileLogger>| logger as Arc<dyn Logger>),
    );

    types.register(
        TypeDescriptor::concrete("Mailer").with_constructor(
            Constructor::new(|deps| {
                Ok(Mailer {
                    logger: deps.view::<dyn Logger>(0)?,
                    sender: deps.cloned::<String>(1)?,
                })
            })
            .param(Parameter::dependency("logger", "Logger"))
            .param(Parameter::primitive::<String>("sender").with_default(String::from("noreply@example.com"))),
        ),
    );

    // No constructor: built through its static accessor
    types.register(TypeDescriptor::concrete("Registry").with_static_method(
        "init",
        Constructor::new(|_| Ok(Registry { created_by: "init" })),
    ));

    types
}

fn main() -> dependency_autowire::Result<()> {
    println!("=== Dependency Autowire Demo ===\n");

    let container = Container::new(types());

    println!("1. Interface bound to a concrete type");
    container.bind("Logger", "FileLogger");
    let mailer = container.get::<Mailer>("Mailer")?;
    mailer.logger.log(&format!("mailer ready, sending as {}", mailer.sender));

    println!("\n2. Singletons are built once");
    container.singleton("mailer", "Mailer");
    let a = container.make("mailer", &Args::new())?;
    let b = container.make("mailer", &Args::new())?;
    println!("  same instance: {}", Instance::ptr_eq(&a, &b));

    println!("\n3. Factories receive caller arguments");
    container.bind(
        "greeting",
        Binding::factory(|args: &Args| {
            let name = args.get::<String>(0).map(|n| n.to_string()).unwrap_or_default();
            format!("hello, {name}")
        }),
    );
    let greeting = container.make("greeting", &Args::new().with(String::from("ada")))?;
    println!("  {}", greeting.downcast::<String>()?);

    println!("\n4. Static accessor when there is no constructor");
    let registry = container.get::<Registry>("Registry")?;
    println!("  created by {}", registry.created_by);

    println!("\n5. Failures");
    let failures: [(&str, Result<Instance, DiError>); 2] = [
        ("Transport", container.make("Transport", &Args::new())),
        ("Mailer2", container.make("Mailer2", &Args::new())),
    ];
    for (key, result) in failures {
        if let Err(err) = result {
            println!("  {key}: {err}");
        }
    }

    println!("\n6. Bindings");
    for (key, history) in container.bindings() {
        let latest = history.last().map(|b| b.kind()).unwrap_or("none");
        println!("  {key}: {latest} ({} registered)", history.len());
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
