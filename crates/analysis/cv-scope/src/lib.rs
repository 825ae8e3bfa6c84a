//! Lexical scoping of variables inside function bodies
//!
//! A [`SemanticScoper`] is created per compiled body. It keeps a stack of
//! [`Scope`]s, the innermost last, and optionally the instance scope of the
//! type the body belongs to. Every declared variable gets a [`VariableId`] that
//! is unique for the whole body, so later passes can size local storage from
//! [`SemanticScopeStats`].
//!
//! Popping a scope reports unused mutability and missing initialization through
//! a [`DiagnosticSink`]; initialization is queried from a [`PathAnalyser`].
//!
//! [`VariableId`]: cv_types::VariableId

pub mod diagnostics;
pub mod error;
pub mod instance;
pub mod path;
pub mod scope;
pub mod scoper;

pub use diagnostics::{DiagnosticSink, Diagnostics, ScopeWarning};
pub use error::{ScopeError, ScopeResult};
pub use instance::InstanceScopes;
pub use path::{IncidentLog, PathAnalyser, PathIncident};
pub use scope::{Scope, Variable};
pub use scoper::{ResolvedVariable, SemanticScopeStats, SemanticScoper};
