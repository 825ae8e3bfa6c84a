//! Instance scopes of classes and value types

use crate::error::ScopeResult;
use crate::scope::Scope;
use cv_types::{Package, TypeDefId, TypeDefinitionKind};
use rustc_hash::FxHashMap;

/// The instance scope of every class and value type of a package
///
/// Built once before any body is scoped. Scopers borrow the scope of their
/// owner type and never modify it.
#[derive(Debug, Clone, Default)]
pub struct InstanceScopes {
    scopes: FxHashMap<TypeDefId, Scope>,
}

impl InstanceScopes {
    /// Declare the instance variables of every class and value type
    ///
    /// Inherited variables come first and are flagged `inherited`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ScopeError::Redeclaration`] if a class declares an
    /// instance variable with the name of one it already has.
    pub fn build(package: &Package) -> ScopeResult<Self> {
        let mut scopes = FxHashMap::default();
        for (id, definition) in package.definitions() {
            if !matches!(
                definition.kind,
                TypeDefinitionKind::Class { .. } | TypeDefinitionKind::ValueType
            ) {
                continue;
            }

            let mut scope = Scope::new(0);
            for (variable, inherited) in package.instance_variables(id) {
                scope
                    .declare_variable(variable.name, variable.ty, variable.mutable, variable.span)?
                    .inherited = inherited;
            }
            tracing::trace!(definition = id.0, variables = scope.len(), "built instance scope");
            scopes.insert(id, scope);
        }
        Ok(Self { scopes })
    }

    /// Instance scope of a class or value type
    pub fn get(&self, id: TypeDefId) -> Option<&Scope> {
        self.scopes.get(&id)
    }

    /// Number of instance scopes
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Whether the package has no classes or value types
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
