//! Closure captures

use crate::ty::Type;
use derive_more::Display;

/// Identifier of a variable slot inside one compiled function body
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
#[display("v{_0}")]
pub struct VariableId(pub u32);

impl VariableId {
    /// The id following this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A single variable copied into a closure's capture storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableCapture {
    /// Variable in the enclosing body
    pub source_id: VariableId,
    /// Variable inside the closure body
    pub captured_id: VariableId,
    /// Declared type of the variable
    pub ty: Type,
}

/// Everything a closure references from its enclosing scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Capture {
    /// Captured variables, in capture order
    pub variables: Vec<VariableCapture>,
    /// Whether the closure uses the enclosing instance
    pub captures_self: bool,
}

impl Capture {
    /// Whether nothing at all is captured
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && !self.captures_self
    }
}
