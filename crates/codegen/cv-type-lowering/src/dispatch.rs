//! Virtual dispatch tables

use crate::error::{LoweringError, LoweringResult};
use crate::lowering::{TypeLowering, expect_lowered};
use cv_intern::Symbol;
use cv_lir::BackendType;
use cv_types::{FunctionId, FunctionKind, TypeDefId, TypeDefinitionKind};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Method slots of a class
///
/// Slots of a superclass keep their position in every subclass, so a call
/// through the superclass's slot index reaches the override. Methods and
/// type methods live in separate name spaces: a type method never takes over
/// the slot of a method with the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchTable {
    slots: Vec<FunctionId>,
    names: FxHashMap<SlotKey, usize>,
}

/// Method name and whether it is called on the type itself
type SlotKey = (Symbol, bool);

impl DispatchTable {
    /// Implementation in each slot
    pub fn slots(&self) -> &[FunctionId] {
        &self.slots
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the class has no dynamically dispatched methods
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot of the method called `name`
    pub fn index_of(&self, name: Symbol) -> Option<usize> {
        self.names.get(&(name, false)).copied()
    }

    /// Slot of the type method called `name`
    pub fn type_method_index_of(&self, name: Symbol) -> Option<usize> {
        self.names.get(&(name, true)).copied()
    }

    fn add(&mut self, key: SlotKey, method: FunctionId) {
        match self.names.get(&key) {
            Some(&index) => self.slots[index] = method,
            None => {
                self.names.insert(key, self.slots.len());
                self.slots.push(method);
            }
        }
    }
}

fn slot_key(name: Symbol, kind: FunctionKind) -> Option<SlotKey> {
    match kind {
        FunctionKind::ObjectMethod => Some((name, false)),
        FunctionKind::ClassMethod => Some((name, true)),
        FunctionKind::Function
        | FunctionKind::ObjectInitializer
        | FunctionKind::Deinitializer
        | FunctionKind::ValueTypeMethod
        | FunctionKind::ValueTypeInitializer
        | FunctionKind::Closure => None,
    }
}

#[allow(
    clippy::multiple_inherent_impl,
    reason = "engine queries are grouped by the layout they produce"
)]
impl TypeLowering<'_> {
    /// Dispatch table of `class`
    ///
    /// # Panics
    ///
    /// Panics if `class` is not a class.
    pub fn dispatch_table(&mut self, class: TypeDefId) -> Arc<DispatchTable> {
        expect_lowered(self.try_dispatch_table(class))
    }

    /// Dispatch table of `class`
    ///
    /// Methods and type methods along the superclass chain get one slot per
    /// name and kind, the root class's first.
    ///
    /// # Errors
    ///
    /// Fails if `class` is not a class.
    pub fn try_dispatch_table(
        &mut self,
        class: TypeDefId,
    ) -> LoweringResult<Arc<DispatchTable>> {
        if let Some(table) = self.dispatch_tables.get(&class) {
            return Ok(Arc::clone(table));
        }
        if !matches!(self.kind_of(class), Some(TypeDefinitionKind::Class { .. })) {
            return Err(LoweringError::NotAClass { ty: format!("#{}", class.0) });
        }

        let mut chain: Vec<TypeDefId> = self.package.superclass_chain(class).collect();
        chain.reverse();
        let mut table = DispatchTable::default();
        for ancestor in chain {
            for &method in &self.package.definition(ancestor).methods {
                let function = self.package.function(method);
                if let Some(key) = slot_key(function.name, function.kind) {
                    table.add(key, method);
                }
            }
        }
        tracing::debug!(class = class.0, slots = table.len(), "built dispatch table");

        let table = Arc::new(table);
        self.dispatch_tables.insert(class, Arc::clone(&table));
        Ok(table)
    }

    /// Slot through which `method` is called on instances of `class`
    ///
    /// Returns `None` for methods that are not dispatched dynamically or that
    /// `class` does not have.
    ///
    /// # Errors
    ///
    /// Fails if `class` is not a class.
    pub fn dispatch_index(
        &mut self,
        class: TypeDefId,
        method: FunctionId,
    ) -> LoweringResult<Option<usize>> {
        let function = self.package.function(method);
        let Some(key) = slot_key(function.name, function.kind) else {
            return Ok(None);
        };
        Ok(self.try_dispatch_table(class)?.names.get(&key).copied())
    }

    /// `[N x ptr]` holding the dispatch table of `class`
    ///
    /// # Errors
    ///
    /// Fails if `class` is not a class.
    pub fn dispatch_table_type(&mut self, class: TypeDefId) -> LoweringResult<BackendType> {
        let table = self.try_dispatch_table(class)?;
        Ok(BackendType::array(BackendType::Ptr, table.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoweringOptions;
    use crate::fixtures::shapes;

    #[test]
    fn test_override_reuses_slot() {
        let shapes = shapes();
        let mut lowering = TypeLowering::new(&shapes.package, LoweringOptions::default());

        let shape = lowering.dispatch_table(shapes.shape);
        assert_eq!(shape.slots(), &[shapes.shape_area, shapes.shape_draw]);

        let circle = lowering.dispatch_table(shapes.circle);
        assert_eq!(
            circle.slots(),
            &[shapes.circle_area, shapes.shape_draw, shapes.circle_scale]
        );
        assert_eq!(
            lowering.dispatch_index(shapes.circle, shapes.shape_area).unwrap(),
            lowering.dispatch_index(shapes.circle, shapes.circle_area).unwrap()
        );
        assert_eq!(lowering.dispatch_index(shapes.circle, shapes.circle_scale).unwrap(), Some(2));
        assert_eq!(lowering.dispatch_table_type(shapes.circle).unwrap().to_string(), "[3 x ptr]");
    }

    #[test]
    fn test_tables_are_cached() {
        let shapes = shapes();
        let mut lowering = TypeLowering::new(&shapes.package, LoweringOptions::default());
        let first = lowering.dispatch_table(shapes.circle);
        let second = lowering.dispatch_table(shapes.circle);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_value_type_has_no_dispatch_table() {
        let shapes = shapes();
        let mut lowering = TypeLowering::new(&shapes.package, LoweringOptions::default());
        assert!(matches!(
            lowering.try_dispatch_table(shapes.point),
            Err(LoweringError::NotAClass { .. })
        ));
    }
}
