//! Errors raised while registering definitions in a package

use cv_span::FileSpan;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for package construction
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// A definition that cannot be registered
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DefinitionError {
    /// The superclass refers to a definition the package does not know
    #[error("superclass of `{class}` is not a registered type definition")]
    #[diagnostic(
        code(types::unknown_superclass),
        help("register the superclass before its subclasses")
    )]
    UnknownSuperclass {
        /// Class being registered
        class: String,
        /// Declaration site
        span: FileSpan,
    },

    /// The superclass is not a class type
    #[error("`{class}` cannot inherit from `{superclass}`, which is not a class")]
    #[diagnostic(code(types::superclass_not_a_class))]
    SuperclassNotAClass {
        /// Class being registered
        class: String,
        /// Offending superclass
        superclass: String,
        /// Declaration site
        span: FileSpan,
    },

    /// A conformance refers to a definition the package does not know
    #[error("`{ty}` conforms to a protocol that is not registered")]
    #[diagnostic(code(types::unknown_protocol))]
    UnknownProtocol {
        /// Conforming type
        ty: String,
        /// Declaration site
        span: FileSpan,
    },

    /// A conformance names something that is not a protocol
    #[error("`{ty}` cannot conform to `{protocol}`, which is not a protocol")]
    #[diagnostic(code(types::not_a_protocol))]
    NotAProtocol {
        /// Conforming type
        ty: String,
        /// Offending type
        protocol: String,
        /// Declaration site
        span: FileSpan,
    },
}
