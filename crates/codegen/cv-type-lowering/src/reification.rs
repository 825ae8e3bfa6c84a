//! Generic argument substitution during lowering
//!
//! While generic code is generated, the code generator installs a
//! [`ReificationContext`] mapping the generic parameters in scope to concrete
//! types. Installing returns a [`ReificationGuard`]; the previous context comes
//! back when the guard is dropped, whichever way the guarded code exits.

use crate::lowering::TypeLowering;
use cv_types::{FunctionId, GenericOwner, GenericParamRef, Type, TypeDefId};
use rustc_hash::FxHashMap;
use std::ops::{Deref, DerefMut};

/// Concrete types for generic parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReificationContext {
    arguments: FxHashMap<GenericParamRef, Type>,
}

impl ReificationContext {
    /// A context resolving nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the generic parameters of a type definition, in order
    pub fn for_type(def: TypeDefId, args: impl IntoIterator<Item = Type>) -> Self {
        Self::new().with_arguments(GenericOwner::Type(def), args)
    }

    /// Map the generic parameters of a function, in order
    pub fn for_function(function: FunctionId, args: impl IntoIterator<Item = Type>) -> Self {
        Self::new().with_arguments(GenericOwner::Function(function), args)
    }

    /// Add the arguments for another owner
    #[must_use]
    pub fn with_arguments(
        mut self,
        owner: GenericOwner,
        args: impl IntoIterator<Item = Type>,
    ) -> Self {
        for (index, ty) in args.into_iter().enumerate() {
            self.insert(
                GenericParamRef {
                    owner,
                    index: index as u32,
                },
                ty,
            );
        }
        self
    }

    /// Map a single parameter, returning the type it was mapped to before
    pub fn insert(&mut self, param: GenericParamRef, ty: Type) -> Option<Type> {
        self.arguments.insert(param, ty)
    }

    /// Type a parameter is mapped to
    pub fn get(&self, param: GenericParamRef) -> Option<&Type> {
        self.arguments.get(&param)
    }

    /// Number of mapped parameters
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Whether nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Replace every mapped parameter inside `ty`
    pub fn resolve(&self, ty: &Type) -> Type {
        ty.substitute(&|param| self.arguments.get(&param).cloned())
    }
}

/// Keeps a [`ReificationContext`] installed on a [`TypeLowering`]
///
/// Dereferences to the engine. Dropping the guard reinstalls the context that
/// was active before, or none.
#[derive(Debug)]
pub struct ReificationGuard<'lower, 'pkg> {
    lowering: &'lower mut TypeLowering<'pkg>,
    previous: Option<ReificationContext>,
}

impl<'lower, 'pkg> ReificationGuard<'lower, 'pkg> {
    pub(crate) fn new(
        lowering: &'lower mut TypeLowering<'pkg>,
        context: ReificationContext,
    ) -> Self {
        tracing::debug!(arguments = context.len(), "install reification context");
        let previous = lowering.reification.replace(context);
        Self { lowering, previous }
    }
}

impl<'pkg> Deref for ReificationGuard<'_, 'pkg> {
    type Target = TypeLowering<'pkg>;

    fn deref(&self) -> &Self::Target {
        &*self.lowering
    }
}

impl DerefMut for ReificationGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.lowering
    }
}

impl Drop for ReificationGuard<'_, '_> {
    fn drop(&mut self) {
        tracing::debug!(restored = self.previous.is_some(), "restore reification context");
        self.lowering.reification = self.previous.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_maps_only_known_params() {
        let list = TypeDefId(0);
        let context = ReificationContext::for_type(list, [Type::integer()]);
        let pair = Type::value_type(
            TypeDefId(1),
            vec![Type::type_param(list, 0), Type::type_param(list, 1)],
        );

        assert_eq!(
            context.resolve(&pair),
            Type::value_type(TypeDefId(1), vec![Type::integer(), Type::type_param(list, 1)])
        );
    }

    #[test]
    fn test_function_and_type_params_are_distinct() {
        let context = ReificationContext::for_type(TypeDefId(0), [Type::integer()])
            .with_arguments(GenericOwner::Function(FunctionId(0)), [Type::real()]);
        assert_eq!(context.len(), 2);
        let param = GenericParamRef {
            owner: GenericOwner::Function(FunctionId(0)),
            index: 0,
        };
        assert_eq!(context.get(param), Some(&Type::real()));
        assert_eq!(context.resolve(&Type::type_param(TypeDefId(0), 0)), Type::integer());
    }
}
