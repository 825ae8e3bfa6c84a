//! A single lexical scope

use crate::diagnostics::{DiagnosticSink, ScopeWarning};
use crate::error::{ScopeError, ScopeResult};
use crate::path::{PathAnalyser, PathIncident};
use cv_intern::Symbol;
use cv_span::FileSpan;
use cv_types::{Type, VariableId};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// A declared variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Slot id, unique within the body
    pub id: VariableId,
    /// Declared type
    pub ty: Type,
    /// Whether the variable may be reassigned
    pub mutable: bool,
    /// Declaration site
    pub span: FileSpan,
    /// Whether an assignment after the declaration was seen
    pub mutated: bool,
    /// Whether the variable was declared by a superclass
    pub inherited: bool,
}

impl Variable {
    /// Record an assignment to the variable
    pub fn mark_mutated(&mut self) {
        self.mutated = true;
    }
}

/// Names declared in one block
///
/// `max_variable_id` is one past the highest id handed out through this scope,
/// which is also the id the next declaration receives.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    variables: FxHashMap<Symbol, Variable>,
    max_variable_id: u32,
}

impl Scope {
    /// An empty scope whose first declaration receives id `start`
    pub fn new(start: u32) -> Self {
        Self {
            variables: FxHashMap::default(),
            max_variable_id: start,
        }
    }

    /// Declare a variable with the next free id
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Redeclaration`] if `name` is already declared in
    /// this scope. The scope is left unchanged in that case.
    pub fn declare_variable(
        &mut self,
        name: Symbol,
        ty: Type,
        mutable: bool,
        span: FileSpan,
    ) -> ScopeResult<&mut Variable> {
        match self.variables.entry(name) {
            Entry::Occupied(existing) => Err(ScopeError::Redeclaration {
                name,
                first: existing.get().span,
                second: span,
            }),
            Entry::Vacant(slot) => {
                let id = VariableId(self.max_variable_id);
                self.max_variable_id += 1;
                tracing::trace!(%id, mutable, "declared variable");
                Ok(slot.insert(Variable {
                    id,
                    ty,
                    mutable,
                    span,
                    mutated: false,
                    inherited: false,
                }))
            }
        }
    }

    /// Whether `name` is declared directly in this scope
    pub fn has_local_variable(&self, name: Symbol) -> bool {
        self.variables.contains_key(&name)
    }

    /// Variable declared directly in this scope
    pub fn local_variable(&self, name: Symbol) -> Option<&Variable> {
        self.variables.get(&name)
    }

    /// Mutable access to a variable declared directly in this scope
    pub fn local_variable_mut(&mut self, name: Symbol) -> Option<&mut Variable> {
        self.variables.get_mut(&name)
    }

    /// One past the highest id handed out through this scope
    pub fn max_variable_id(&self) -> u32 {
        self.max_variable_id
    }

    pub(crate) fn raise_max_variable_id(&mut self, max: u32) {
        self.max_variable_id = self.max_variable_id.max(max);
    }

    /// Declared variables, ordered by id
    pub fn variables(&self) -> Vec<(Symbol, &Variable)> {
        let mut variables: Vec<_> =
            self.variables.iter().map(|(name, variable)| (*name, variable)).collect();
        variables.sort_by_key(|(_, variable)| variable.id);
        variables
    }

    /// Number of variables declared in this scope
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether nothing is declared in this scope
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Report unused mutability and missing initialization
    ///
    /// Inherited variables are initialized by their superclass and never
    /// reported.
    pub fn check_scope(&self, analyser: &dyn PathAnalyser, sink: &mut dyn DiagnosticSink) {
        for (name, variable) in self.variables() {
            if variable.inherited {
                continue;
            }
            if variable.mutable && !variable.mutated {
                sink.warn(ScopeWarning::NeverMutated {
                    name,
                    span: variable.span,
                });
            }
            if !analyser.has_potentially(PathIncident::InitializedVariable(variable.id)) {
                sink.warn(ScopeWarning::NeverInitialized {
                    name,
                    span: variable.span,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::path::IncidentLog;
    use cv_intern::Interner;
    use cv_span::FileId;

    fn span() -> FileSpan {
        FileSpan::synthetic(FileId(0))
    }

    #[test]
    fn test_ids_are_sequential() {
        let interner = Interner::new();
        let mut scope = Scope::new(3);
        let first = scope
            .declare_variable(interner.intern("a"), Type::integer(), false, span())
            .unwrap()
            .id;
        let second = scope
            .declare_variable(interner.intern("b"), Type::real(), true, span())
            .unwrap()
            .id;
        assert_eq!(first, VariableId(3));
        assert_eq!(second, VariableId(4));
        assert_eq!(scope.max_variable_id(), 5);
    }

    #[test]
    fn test_redeclaration_is_rejected() {
        let interner = Interner::new();
        let name = interner.intern("count");
        let mut scope = Scope::new(0);
        scope.declare_variable(name, Type::integer(), false, span()).unwrap();

        let result = scope.declare_variable(name, Type::integer(), true, span());
        assert!(matches!(result, Err(ScopeError::Redeclaration { .. })));
        assert_eq!(scope.len(), 1);
        assert_eq!(scope.max_variable_id(), 1);
    }

    #[test]
    fn test_check_scope_reports_unmutated_and_uninitialized() {
        let interner = Interner::new();
        let mut scope = Scope::new(0);
        let used = scope
            .declare_variable(interner.intern("used"), Type::integer(), true, span())
            .unwrap();
        used.mark_mutated();
        let used_id = used.id;
        scope
            .declare_variable(interner.intern("idle"), Type::integer(), true, span())
            .unwrap();

        let mut log = IncidentLog::new();
        log.record(PathIncident::InitializedVariable(used_id));
        let mut diagnostics = Diagnostics::new();
        scope.check_scope(&log, &mut diagnostics);

        assert_eq!(
            diagnostics.warnings(),
            &[
                ScopeWarning::NeverMutated {
                    name: interner.intern("idle"),
                    span: span(),
                },
                ScopeWarning::NeverInitialized {
                    name: interner.intern("idle"),
                    span: span(),
                },
            ]
        );
    }

    #[test]
    fn test_inherited_variables_are_not_checked() {
        let interner = Interner::new();
        let mut scope = Scope::new(0);
        scope
            .declare_variable(interner.intern("base"), Type::integer(), true, span())
            .unwrap()
            .inherited = true;

        let mut diagnostics = Diagnostics::new();
        scope.check_scope(&IncidentLog::new(), &mut diagnostics);
        assert!(diagnostics.is_empty());
    }
}
