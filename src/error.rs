//! Error types for the object model.
//!
//! Every failure in the model is synchronous and carries the class, property,
//! or generic names involved so callers can report precisely what went wrong.
//! Validation failures carry every rejection message, not just the first.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by class declaration, construction, property access,
/// and generic-function dispatch.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ObjectError {
    #[error("Declaration error: {message}")]
    #[diagnostic(
        code(manifold::declaration),
        help("Check the class or generic declaration for name collisions and stale references")
    )]
    Declaration { message: String },

    #[error("Property '{property}' on class '{class}' conflicts with an inherited declaration: {reason}")]
    #[diagnostic(
        code(manifold::property_conflict),
        help("A redeclared property must keep the parent's type, or narrow it to a subclass or sub-union")
    )]
    PropertyConflict {
        class: String,
        property: String,
        reason: String,
    },

    #[error("Type mismatch for {context}: expected {expected}, found {found}")]
    #[diagnostic(
        code(manifold::type_mismatch),
        help("Check that the value's class or base type satisfies the declared property type")
    )]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("Validation of class '{class}' rejected the instance: {}", .messages.join("; "))]
    #[diagnostic(
        code(manifold::validation),
        help("Every message reflects one violated constraint; fix all of them")
    )]
    Validation {
        class: String,
        messages: Vec<String>,
    },

    #[error("Unknown property '{property}' on class '{class}'")]
    #[diagnostic(
        code(manifold::unknown_property),
        help("The property must be declared on the class or one of its ancestors")
    )]
    UnknownProperty { class: String, property: String },

    #[error("No applicable method for generic '{generic}' with argument classes ({classes})")]
    #[diagnostic(
        code(manifold::method_not_found),
        help("Register a method covering these classes, or a legacy fallback for the first argument")
    )]
    MethodNotFound { generic: String, classes: String },

    #[error("No next method for generic '{generic}'")]
    #[diagnostic(
        code(manifold::no_next_method),
        help("The executing method is already the least specific applicable one")
    )]
    NoNextMethod { generic: String },

    #[error("Wrong arity for generic '{generic}': expected {expected} dispatched arguments, got {found}")]
    #[diagnostic(
        code(manifold::wrong_arity),
        help("The dispatch signature fixes how many leading arguments participate in dispatch")
    )]
    WrongArity {
        generic: String,
        expected: usize,
        found: usize,
    },
}

impl ObjectError {
    pub fn declaration(message: impl Into<String>) -> Self {
        Self::Declaration {
            message: message.into(),
        }
    }

    pub fn property_conflict(
        class: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::PropertyConflict {
            class: class.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn validation(class: impl Into<String>, messages: Vec<String>) -> Self {
        Self::Validation {
            class: class.into(),
            messages,
        }
    }

    pub fn unknown_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    pub fn method_not_found(generic: impl Into<String>, classes: impl Into<String>) -> Self {
        Self::MethodNotFound {
            generic: generic.into(),
            classes: classes.into(),
        }
    }

    pub fn no_next_method(generic: impl Into<String>) -> Self {
        Self::NoNextMethod {
            generic: generic.into(),
        }
    }

    pub fn wrong_arity(generic: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::WrongArity {
            generic: generic.into(),
            expected,
            found,
        }
    }
}

/// Type alias for object-model results
pub type Result<T> = std::result::Result<T, ObjectError>;
