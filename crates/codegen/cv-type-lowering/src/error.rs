//! Lowering errors
//!
//! Every variant describes input that type checking should have rejected. The
//! plain query methods of [`crate::TypeLowering`] panic with these messages; the
//! `try_*` forms hand them back to the caller.

use miette::Diagnostic;
use thiserror::Error;

/// A type or function that cannot be given a backend representation
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum LoweringError {
    /// The type has no representation
    #[error("no backend representation for `{ty}`")]
    #[diagnostic(code(lowering::unresolved_type))]
    UnresolvedType {
        /// Rendered type
        ty: String,
    },

    /// A generic type is applied to the wrong number of arguments
    #[error("`{ty}` expects {expected} generic arguments, got {found}")]
    #[diagnostic(code(lowering::generic_arity))]
    GenericArityMismatch {
        /// Rendered type
        ty: String,
        /// Declared generic parameters
        expected: usize,
        /// Supplied generic arguments
        found: usize,
    },

    /// A multiprotocol query received another kind of type
    #[error("`{ty}` is not a multiprotocol")]
    #[diagnostic(code(lowering::not_a_multiprotocol))]
    NotAMultiprotocol {
        /// Rendered type
        ty: String,
    },

    /// A class query received another kind of type
    #[error("`{ty}` is not a class")]
    #[diagnostic(code(lowering::not_a_class))]
    NotAClass {
        /// Rendered type
        ty: String,
    },

    /// An instance variable index past the end of the class's variables
    #[error("`{ty}` has no instance variable #{index}")]
    #[diagnostic(code(lowering::no_such_instance_variable))]
    NoSuchInstanceVariable {
        /// Rendered type
        ty: String,
        /// Requested index
        index: usize,
    },
}

/// Result type for lowering queries
pub type LoweringResult<T> = Result<T, LoweringError>;
