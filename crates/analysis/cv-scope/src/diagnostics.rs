//! Warnings produced while scoping

use cv_intern::{Interner, Symbol};
use cv_span::FileSpan;

/// A non-fatal finding about a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeWarning {
    /// A declaration hides a variable of an enclosing scope
    ShadowsLocal {
        /// Declared name
        name: Symbol,
        /// Shadowing declaration
        span: FileSpan,
    },
    /// A declaration hides an instance variable
    ShadowsInstance {
        /// Declared name
        name: Symbol,
        /// Shadowing declaration
        span: FileSpan,
    },
    /// A mutable variable is never assigned after its declaration
    NeverMutated {
        /// Variable name
        name: Symbol,
        /// Declaration site
        span: FileSpan,
    },
    /// No path initializes the variable before its scope ends
    NeverInitialized {
        /// Variable name
        name: Symbol,
        /// Declaration site
        span: FileSpan,
    },
}

impl ScopeWarning {
    /// Variable the warning is about
    pub fn name(&self) -> Symbol {
        match self {
            Self::ShadowsLocal { name, .. }
            | Self::ShadowsInstance { name, .. }
            | Self::NeverMutated { name, .. }
            | Self::NeverInitialized { name, .. } => *name,
        }
    }

    /// Position to report the warning at
    pub fn span(&self) -> FileSpan {
        match self {
            Self::ShadowsLocal { span, .. }
            | Self::ShadowsInstance { span, .. }
            | Self::NeverMutated { span, .. }
            | Self::NeverInitialized { span, .. } => *span,
        }
    }

    /// Warning text with the variable name spelled out
    pub fn render(&self, interner: &Interner) -> String {
        let name = interner.resolve(&self.name());
        match self {
            Self::ShadowsLocal { .. } => {
                format!("Declaration of \"{name}\" shadows a variable of an enclosing scope.")
            }
            Self::ShadowsInstance { .. } => {
                format!("Declaration of \"{name}\" shadows an instance variable.")
            }
            Self::NeverMutated { .. } => {
                format!("Variable \"{name}\" was declared mutable but is never mutated.")
            }
            Self::NeverInitialized { .. } => {
                format!("Variable \"{name}\" is declared but never initialized.")
            }
        }
    }
}

/// Collaborator receiving scoping warnings
pub trait DiagnosticSink {
    /// Report a warning
    fn warn(&mut self, warning: ScopeWarning);
}

/// Sink that keeps every warning in report order
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<ScopeWarning>,
}

impl Diagnostics {
    /// An empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings reported so far
    pub fn warnings(&self) -> &[ScopeWarning] {
        &self.warnings
    }

    /// Number of warnings reported so far
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Whether nothing was reported
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Render every warning, one per line
    pub fn render(&self, interner: &Interner) -> String {
        self.warnings
            .iter()
            .map(|warning| format!("warning at {}: {}", warning.span(), warning.render(interner)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl DiagnosticSink for Diagnostics {
    fn warn(&mut self, warning: ScopeWarning) {
        tracing::debug!(?warning, "scope warning");
        self.warnings.push(warning);
    }
}
