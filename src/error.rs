//! Error types for dependency resolution

use thiserror::Error;

/// Errors that can occur while binding or resolving
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Asked to build an abstract type, or an interface nothing is bound to
    #[error("Cannot instantiate {type_name}: {reason}")]
    AbstractInstantiation {
        type_name: String,
        reason: &'static str,
    },

    /// Type has no constructor and no `init`/`get_instance` static method
    #[error("Type is not instantiable: {type_name}")]
    NonInstantiable { type_name: String },

    /// Primitive parameter with no declared default
    #[error("Cannot resolve parameter `{parameter}` of {type_name}: no type and no default value")]
    UnresolvableParameter {
        type_name: String,
        parameter: String,
    },

    /// Type re-entered while it was still being resolved
    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// The introspector has no descriptor for this name
    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },

    /// Resolved value is not of the requested type
    #[error("Type mismatch for {key}: expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// Factory or constructor reported a failure
    #[error("Failed to create {type_name}: {reason}")]
    CreationFailed { type_name: String, reason: String },

    /// Resolution nested deeper than the configured limit
    #[error("Resolution depth limit ({limit}) exceeded while resolving {type_name}")]
    DepthExceeded { type_name: String, limit: usize },
}

impl DiError {
    /// Create an AbstractInstantiation error
    #[inline]
    pub fn abstract_instantiation(type_name: impl Into<String>, reason: &'static str) -> Self {
        Self::AbstractInstantiation {
            type_name: type_name.into(),
            reason,
        }
    }

    /// Create a NonInstantiable error
    #[inline]
    pub fn non_instantiable(type_name: impl Into<String>) -> Self {
        Self::NonInstantiable {
            type_name: type_name.into(),
        }
    }

    /// Create an UnresolvableParameter error
    #[inline]
    pub fn unresolvable(type_name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::UnresolvableParameter {
            type_name: type_name.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an UnknownType error
    #[inline]
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create a TypeMismatch error for the requested type `T`
    #[inline]
    pub fn type_mismatch<T: ?Sized + 'static>(key: impl Into<String>) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-friendly name of the error kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AbstractInstantiation { .. } => "abstract_instantiation",
            Self::NonInstantiable { .. } => "non_instantiable",
            Self::UnresolvableParameter { .. } => "unresolvable_parameter",
            Self::CircularDependency { .. } => "circular_dependency",
            Self::UnknownType { .. } => "unknown_type",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::CreationFailed { .. } => "creation_failed",
            Self::DepthExceeded { .. } => "depth_exceeded",
        }
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DiError::abstract_instantiation("Storage", "interface is not bound");
        assert_eq!(err.to_string(), "Cannot instantiate Storage: interface is not bound");

        let err = DiError::unresolvable("FileLogger", "path");
        assert!(err.to_string().contains("`path`"));

        let err = DiError::CircularDependency {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
    }

    #[test]
    fn test_type_mismatch_names_expected_type() {
        let err = DiError::type_mismatch::<String>("Config");
        assert_eq!(
            err,
            DiError::TypeMismatch {
                key: "Config".into(),
                expected: "alloc::string::String",
            }
        );
        assert_eq!(err.kind(), "type_mismatch");
    }
}
