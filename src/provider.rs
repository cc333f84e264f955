//! Provider traits for dependency injection
//!
//! These traits define what types can be stored in the container and how a
//! type describes its own construction.

use crate::TypeDescriptor;

/// Marker trait for types that can be held by the container.
///
/// This is automatically implemented for all types that are `Send + Sync + 'static`.
/// You never need to implement this manually.
pub trait Injectable: Send + Sync + 'static {}

// Blanket implementation - everything that's Send + Sync + 'static is Injectable
impl<T: Send + Sync + 'static> Injectable for T {}

/// A type that knows its own construction schema.
///
/// Usually generated with `#[derive(Autowire)]` (feature `derive`), but can
/// be written by hand:
///
/// ```rust
/// use dependency_autowire::{Autowire, Constructor, Parameter, TypeDescriptor, TypeRegistry};
///
/// struct FileLogger {
///     path: String,
/// }
///
/// impl Autowire for FileLogger {
///     const TYPE_NAME: &'static str = "FileLogger";
///
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::concrete(Self::TYPE_NAME).with_constructor(
///             Constructor::new(|deps| Ok(FileLogger { path: deps.cloned::<String>(0)? }))
///                 .param(Parameter::primitive::<String>("path").with_default(String::from("app.log"))),
///         )
///     }
/// }
///
/// let types = TypeRegistry::new();
/// types.register_type::<FileLogger>();
/// assert!(types.contains("FileLogger"));
/// ```
pub trait Autowire: Sized {
    /// Name the type is registered under
    const TYPE_NAME: &'static str;

    /// Build the schema the resolver uses to construct this type
    fn descriptor() -> TypeDescriptor;
}
