//! Scoping errors

use cv_intern::{Interner, Symbol};
use cv_span::FileSpan;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while declaring or resolving variables
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ScopeError {
    /// Neither an active scope nor the instance scope declares the name
    #[error("variable not found at {use_site}")]
    #[diagnostic(code(scope::variable_not_found))]
    VariableNotFound {
        /// Name that was looked up
        name: Symbol,
        /// Where the variable was used
        use_site: FileSpan,
    },

    /// The name is already declared in the same scope
    #[error("variable redeclared at {second}, first declared at {first}")]
    #[diagnostic(
        code(scope::redeclaration),
        help("pick a different name or assign to the existing variable")
    )]
    Redeclaration {
        /// Declared name
        name: Symbol,
        /// Earlier declaration
        first: FileSpan,
        /// Rejected declaration
        second: FileSpan,
    },
}

impl ScopeError {
    /// Name the error is about
    pub fn name(&self) -> Symbol {
        match self {
            Self::VariableNotFound { name, .. } | Self::Redeclaration { name, .. } => *name,
        }
    }

    /// Position to report the error at
    pub fn span(&self) -> FileSpan {
        match self {
            Self::VariableNotFound { use_site, .. } => *use_site,
            Self::Redeclaration { second, .. } => *second,
        }
    }

    /// Message with the variable name spelled out
    pub fn render(&self, interner: &Interner) -> String {
        let name = interner.resolve(&self.name());
        match self {
            Self::VariableNotFound { .. } => format!("Variable \"{name}\" not defined."),
            Self::Redeclaration { .. } => format!("Cannot redeclare variable \"{name}\"."),
        }
    }
}

/// Result type for scoping operations
pub type ScopeResult<T> = Result<T, ScopeError>;
