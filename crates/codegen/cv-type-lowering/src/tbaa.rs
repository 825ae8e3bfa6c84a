//! Type-based alias analysis tags

use crate::error::{LoweringError, LoweringResult};
use crate::lowering::{TypeLowering, expect_lowered, is_box_represented, substitute_own};
use cv_lir::{AliasTag, TbaaField, TbaaNode, TbaaNodeId, TbaaTree};
use cv_types::Type;

#[allow(
    clippy::multiple_inherent_impl,
    reason = "engine queries are grouped by the layout they produce"
)]
impl TypeLowering<'_> {
    /// Alias analysis nodes created so far
    pub fn tbaa_tree(&self) -> &TbaaTree {
        &self.tbaa
    }

    /// Whether loads and stores of `ty` should carry an alias tag
    ///
    /// Boxes, callables and erased generic values are accessed under
    /// several types and never get one.
    pub fn should_add_tbaa(&self, ty: &Type) -> bool {
        if !self.options.alias_tags {
            return false;
        }
        let resolved = self.resolve(ty);
        !is_box_represented(&resolved)
            && !matches!(resolved, Type::Callable { .. } | Type::NoReturn)
    }

    /// Alias tag for accessing a value of `ty`
    ///
    /// # Panics
    ///
    /// Panics if `ty` has no representation.
    pub fn tbaa_node_for(&mut self, ty: &Type, class_as_struct: bool) -> AliasTag {
        expect_lowered(self.try_tbaa_node_for(ty, class_as_struct))
    }

    /// Alias tag for accessing a value of `ty`
    ///
    /// Classes are tagged below their superclass and root classes below
    /// `Someobject`, so a reference typed as an ancestor may alias one typed
    /// as a descendant. An optional class shares the tag of the class. With
    /// `class_as_struct`, a class is instead described as the struct of its
    /// instance variables.
    ///
    /// # Errors
    ///
    /// Fails if `ty` has no representation.
    pub fn try_tbaa_node_for(
        &mut self,
        ty: &Type,
        class_as_struct: bool,
    ) -> LoweringResult<AliasTag> {
        let resolved = self.resolve(ty);
        let node = self.tbaa_node(&resolved, class_as_struct)?;
        Ok(self.tbaa.scalar_tag(node))
    }

    /// Alias tag for accessing instance variable `index` of an object of class `ty`
    ///
    /// # Errors
    ///
    /// Fails if `ty` is not a class or has fewer instance variables.
    pub fn instance_variable_tag(&mut self, ty: &Type, index: usize) -> LoweringResult<AliasTag> {
        let resolved = self.resolve(ty);
        if !matches!(resolved, Type::Class { .. }) {
            return Err(LoweringError::NotAClass { ty: self.display(&resolved) });
        }
        let base = self.tbaa_node(&resolved, true)?;
        let field = match self.tbaa.node(base) {
            TbaaNode::Struct { fields, .. } => fields.get(index).cloned(),
            TbaaNode::Root { .. } | TbaaNode::Scalar { .. } => None,
        };
        field
            .map(|field| AliasTag {
                base,
                access: field.node,
                offset: field.offset,
            })
            .ok_or_else(|| LoweringError::NoSuchInstanceVariable {
                ty: self.display(&resolved),
                index,
            })
    }

    fn tbaa_node(&mut self, resolved: &Type, class_as_struct: bool) -> LoweringResult<TbaaNodeId> {
        let as_struct = class_as_struct && matches!(resolved, Type::Class { .. });
        let key = (resolved.clone(), as_struct);
        if let Some(&node) = self.tbaa_nodes.get(&key) {
            return Ok(node);
        }

        let name = self.display(resolved);
        let node = match resolved {
            Type::Class { def, args } if as_struct => {
                let layout = self.try_object_layout(resolved)?;
                let offsets = layout
                    .as_struct()
                    .map(|st| self.layout.struct_layout(st).offsets)
                    .unwrap_or_default();
                let header = self.object_header_len(*def);
                let mut fields = Vec::new();
                for (index, field) in self.instance_variable_types(*def, args).iter().enumerate() {
                    fields.push(TbaaField {
                        offset: offsets.get(header + index).copied().unwrap_or_default(),
                        node: self.tbaa_node(field, false)?,
                    });
                }
                self.tbaa.add_struct(format!("class.{name}"), fields)
            }
            Type::Class { def, args } => {
                self.check_class(resolved, *def, args)?;
                let parent = match self.package.definition(*def).superclass() {
                    Some(superclass) => {
                        self.tbaa_node(&substitute_own(*def, args, superclass), false)?
                    }
                    None => self.tbaa_node(&Type::Someobject, false)?,
                };
                self.tbaa.add_scalar(name, parent)
            }
            Type::Optional(inner) if matches!(**inner, Type::Class { .. } | Type::Someobject) => {
                self.tbaa_node(inner, false)?
            }
            _ => {
                self.lower_resolved(resolved)?;
                let root = self.tbaa.root();
                self.tbaa.add_scalar(name, root)
            }
        };
        tracing::trace!(%node, as_struct, "created alias node");
        self.tbaa_nodes.insert(key, node);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoweringOptions;
    use crate::fixtures::shapes;

    #[test]
    fn test_subclass_aliases_superclass() {
        let shapes = shapes();
        let mut lowering = TypeLowering::new(&shapes.package, LoweringOptions::default());
        let shape = lowering.tbaa_node_for(&Type::class(shapes.shape, vec![]), false);
        let circle = lowering.tbaa_node_for(&Type::class(shapes.circle, vec![]), false);
        let real = lowering.tbaa_node_for(&Type::real(), false);

        let tree = lowering.tbaa_tree();
        assert!(tree.may_alias(&shape, &circle));
        assert!(!tree.may_alias(&circle, &real));
    }

    #[test]
    fn test_someobject_and_optionals_alias_classes() {
        let shapes = shapes();
        let mut lowering = TypeLowering::new(&shapes.package, LoweringOptions::default());
        let shape = Type::class(shapes.shape, vec![]);
        let shape_tag = lowering.tbaa_node_for(&shape, false);
        let optional = lowering.tbaa_node_for(&Type::optional(shape), false);
        let someobject = lowering.tbaa_node_for(&Type::Someobject, false);
        let optional_object = lowering.tbaa_node_for(&Type::optional(Type::Someobject), false);

        assert_eq!(optional, shape_tag);
        assert_eq!(optional_object, someobject);
        let tree = lowering.tbaa_tree();
        assert!(tree.may_alias(&someobject, &shape_tag));
        assert!(tree.is_ancestor(someobject.access, shape_tag.access));
    }

    #[test]
    fn test_instance_variables_do_not_alias() {
        let shapes = shapes();
        let mut lowering = TypeLowering::new(&shapes.package, LoweringOptions::default());
        let circle = Type::class(shapes.circle, vec![]);
        let id = lowering.instance_variable_tag(&circle, 0).unwrap();
        let radius = lowering.instance_variable_tag(&circle, 1).unwrap();

        assert_eq!(id.offset, 16);
        assert_eq!(radius.offset, 24);
        assert!(!lowering.tbaa_tree().may_alias(&id, &radius));
        assert!(matches!(
            lowering.instance_variable_tag(&circle, 2),
            Err(LoweringError::NoSuchInstanceVariable { index: 2, .. })
        ));
    }

    #[test]
    fn test_nodes_are_cached() {
        let shapes = shapes();
        let mut lowering = TypeLowering::new(&shapes.package, LoweringOptions::default());
        let first = lowering.tbaa_node_for(&Type::integer(), false);
        let count = lowering.tbaa_tree().len();
        let second = lowering.tbaa_node_for(&Type::integer(), false);
        assert_eq!(first, second);
        assert_eq!(lowering.tbaa_tree().len(), count);
    }

    #[test]
    fn test_should_add_tbaa() {
        let shapes = shapes();
        let lowering = TypeLowering::new(&shapes.package, LoweringOptions::default());
        assert!(lowering.should_add_tbaa(&Type::integer()));
        assert!(lowering.should_add_tbaa(&Type::class(shapes.shape, vec![])));
        assert!(!lowering.should_add_tbaa(&Type::protocol(shapes.printable, vec![])));
        assert!(!lowering.should_add_tbaa(&Type::callable(vec![], Type::integer())));
        assert!(!lowering.should_add_tbaa(&Type::type_param(shapes.list, 0)));

        let disabled = TypeLowering::new(
            &shapes.package,
            LoweringOptions {
                alias_tags: false,
                ..LoweringOptions::default()
            },
        );
        assert!(!disabled.should_add_tbaa(&Type::integer()));
    }
}
