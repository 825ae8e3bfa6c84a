//! Stack of lexical scopes for one function body

use crate::diagnostics::{DiagnosticSink, ScopeWarning};
use crate::error::{ScopeError, ScopeResult};
use crate::instance::InstanceScopes;
use crate::path::{PathAnalyser, PathIncident};
use crate::scope::{Scope, Variable};
use cv_intern::Symbol;
use cv_span::FileSpan;
use cv_types::{Function, Parameter};

/// Outcome of resolving a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedVariable<'scope> {
    /// The variable the name refers to
    pub variable: &'scope Variable,
    /// Whether the name resolved to an instance variable
    pub in_instance_scope: bool,
}

/// Storage summary of a scoped body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SemanticScopeStats {
    /// One past the highest id used by a parameter
    pub max_argument_id: u32,
    /// Number of variables declared in the outermost scope
    pub variable_count: usize,
    /// One past the highest id handed out in the body
    pub max_variable_id: u32,
}

/// Resolves names inside one function body
///
/// Scopes form a stack: the last pushed scope is searched first and must be
/// popped first. The instance scope is consulted after every local scope and is
/// never pushed or popped.
#[derive(Debug, Clone, Default)]
pub struct SemanticScoper<'inst> {
    scopes: Vec<Scope>,
    instance_scope: Option<&'inst Scope>,
    max_variable_id: u32,
    argument_end: Option<u32>,
}

impl<'inst> SemanticScoper<'inst> {
    /// A scoper without instance scope
    pub fn new() -> Self {
        Self::default()
    }

    /// A scoper that falls back to `instance_scope`
    pub fn with_instance_scope(instance_scope: &'inst Scope) -> Self {
        Self {
            instance_scope: Some(instance_scope),
            ..Self::default()
        }
    }

    /// A scoper for the body of `function`
    ///
    /// Only methods, initializers and deinitializers see the instance scope of
    /// their owner.
    pub fn for_function(function: &Function, instance_scopes: &'inst InstanceScopes) -> Self {
        let instance_scope = function
            .owner
            .filter(|_| function.kind.has_instance_scope())
            .and_then(|owner| instance_scopes.get(owner));
        Self {
            instance_scope,
            ..Self::default()
        }
    }

    /// Instance scope consulted after the local scopes
    pub fn instance_scope(&self) -> Option<&'inst Scope> {
        self.instance_scope
    }

    /// Number of active scopes
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Push a scope holding the parameters of the body
    ///
    /// Every parameter is declared at `position` with its own mutability and
    /// recorded as initialized, since arguments are bound on entry.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::Redeclaration`] if two parameters share a name.
    /// The scoper and `analyser` are then left as they were.
    pub fn push_arguments_scope(
        &mut self,
        analyser: &mut dyn PathAnalyser,
        parameters: &[Parameter],
        position: FileSpan,
    ) -> ScopeResult<&mut Scope> {
        let mut scope = Scope::new(self.next_variable_id());
        let mut declared = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            let variable = scope.declare_variable(
                parameter.name,
                parameter.ty.clone(),
                parameter.mutable,
                position,
            )?;
            declared.push(variable.id);
        }
        for id in declared {
            analyser.record(PathIncident::InitializedVariable(id));
        }
        self.argument_end = Some(scope.max_variable_id());
        Ok(self.enter(scope))
    }

    /// Push an empty scope
    ///
    /// Its ids start after every id handed out so far in this body.
    pub fn push_scope(&mut self) -> &mut Scope {
        let scope = Scope::new(self.next_variable_id());
        self.enter(scope)
    }

    fn next_variable_id(&self) -> u32 {
        self.scopes
            .last()
            .map_or(self.max_variable_id, |scope| scope.max_variable_id().max(self.max_variable_id))
    }

    fn enter(&mut self, scope: Scope) -> &mut Scope {
        tracing::trace!(
            depth = self.scopes.len() + 1,
            start = scope.max_variable_id(),
            "push scope"
        );
        self.scopes.push(scope);
        let index = self.scopes.len() - 1;
        &mut self.scopes[index]
    }

    /// Innermost active scope
    pub fn current_scope(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    /// Check and remove the innermost scope
    ///
    /// The scope reports its warnings before it is removed. Ids it handed out
    /// are never handed out again in this body.
    ///
    /// # Panics
    ///
    /// Debug builds panic if no scope is active.
    pub fn pop_scope(&mut self, analyser: &dyn PathAnalyser, sink: &mut dyn DiagnosticSink) {
        debug_assert!(!self.scopes.is_empty(), "pop_scope without an active scope");
        let Some(scope) = self.scopes.last() else {
            tracing::warn!("pop_scope without an active scope");
            return;
        };
        scope.check_scope(analyser, sink);
        let popped_max = scope.max_variable_id();
        self.scopes.pop();

        self.max_variable_id = self.max_variable_id.max(popped_max);
        if let Some(parent) = self.scopes.last_mut() {
            parent.raise_max_variable_id(popped_max);
        }
        tracing::trace!(depth = self.scopes.len(), max = self.max_variable_id, "pop scope");
    }

    /// Resolve `name`, innermost scope first, then the instance scope
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::VariableNotFound`] carrying `name` and
    /// `use_site` if no scope declares the name.
    pub fn get_variable(
        &self,
        name: Symbol,
        use_site: FileSpan,
    ) -> ScopeResult<ResolvedVariable<'_>> {
        if let Some(variable) = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.local_variable(name))
        {
            return Ok(ResolvedVariable {
                variable,
                in_instance_scope: false,
            });
        }
        if let Some(variable) = self
            .instance_scope
            .and_then(|scope| scope.local_variable(name))
        {
            return Ok(ResolvedVariable {
                variable,
                in_instance_scope: true,
            });
        }
        Err(ScopeError::VariableNotFound { name, use_site })
    }

    /// Record an assignment to a local variable
    ///
    /// Returns `false` if no local scope declares `name`; instance variables
    /// are not tracked.
    pub fn mark_mutated(&mut self, name: Symbol) -> bool {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.local_variable_mut(name))
        {
            Some(variable) => {
                variable.mark_mutated();
                true
            }
            None => false,
        }
    }

    /// Warn about every active scope that already declares `name`
    pub fn check_for_shadowing(
        &self,
        name: Symbol,
        position: FileSpan,
        sink: &mut dyn DiagnosticSink,
    ) {
        for scope in &self.scopes {
            if scope.has_local_variable(name) {
                sink.warn(ScopeWarning::ShadowsLocal {
                    name,
                    span: position,
                });
            }
        }
        if self
            .instance_scope
            .is_some_and(|scope| scope.has_local_variable(name))
        {
            sink.warn(ScopeWarning::ShadowsInstance {
                name,
                span: position,
            });
        }
    }

    /// Summarize the body for sizing variable storage
    ///
    /// Returns `None` if no scope is active.
    pub fn create_stats(&self) -> Option<SemanticScopeStats> {
        let outermost = self.scopes.first()?;
        let innermost_max = self
            .scopes
            .iter()
            .map(Scope::max_variable_id)
            .max()
            .unwrap_or_default();
        Some(SemanticScopeStats {
            max_argument_id: self.argument_end.unwrap_or_default(),
            variable_count: outermost.len(),
            max_variable_id: innermost_max.max(self.max_variable_id),
        })
    }
}
