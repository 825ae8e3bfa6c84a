//! Type-based alias analysis metadata
//!
//! Nodes form a tree under a single root. Scalar nodes name a type; struct nodes
//! list the nodes of their fields at byte offsets. A memory access is tagged with
//! an [`AliasTag`] naming the base type it goes through, the type actually
//! accessed and the offset of that access inside the base type.

use derive_more::Display;

/// Index of a node inside a [`TbaaTree`]
#[derive(Copy, Clone, Debug, Display, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[display("!tbaa{_0}")]
pub struct TbaaNodeId(pub u32);

/// A field of a struct node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TbaaField {
    /// Byte offset of the field
    pub offset: u64,
    /// Node describing the field's type
    pub node: TbaaNodeId,
}

/// A node of the type tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TbaaNode {
    /// Root of the tree
    Root {
        /// Name of the tree
        name: String,
    },
    /// Scalar type
    Scalar {
        /// Type name
        name: String,
        /// Enclosing node
        parent: TbaaNodeId,
    },
    /// Aggregate type with typed fields
    Struct {
        /// Type name
        name: String,
        /// Fields in offset order
        fields: Vec<TbaaField>,
    },
}

/// Access tag attached to a load or store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AliasTag {
    /// Type through which memory is accessed
    pub base: TbaaNodeId,
    /// Type of the accessed value
    pub access: TbaaNodeId,
    /// Offset of the access inside `base`
    pub offset: u64,
}

/// Tree of alias analysis nodes for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TbaaTree {
    nodes: Vec<TbaaNode>,
}

impl TbaaTree {
    /// A tree holding only its root
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![TbaaNode::Root {
                name: root_name.into(),
            }],
        }
    }

    /// The root node
    pub fn root(&self) -> TbaaNodeId {
        TbaaNodeId(0)
    }

    /// Add a scalar node below `parent`
    pub fn add_scalar(&mut self, name: impl Into<String>, parent: TbaaNodeId) -> TbaaNodeId {
        self.push(TbaaNode::Scalar {
            name: name.into(),
            parent,
        })
    }

    /// Add a struct node
    pub fn add_struct(&mut self, name: impl Into<String>, fields: Vec<TbaaField>) -> TbaaNodeId {
        self.push(TbaaNode::Struct {
            name: name.into(),
            fields,
        })
    }

    fn push(&mut self, node: TbaaNode) -> TbaaNodeId {
        let id = TbaaNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Look up a node
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: TbaaNodeId) -> &TbaaNode {
        &self.nodes[id.0 as usize]
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Tag for accessing a whole scalar of type `node`
    pub fn scalar_tag(&self, node: TbaaNodeId) -> AliasTag {
        AliasTag {
            base: node,
            access: node,
            offset: 0,
        }
    }

    /// Whether `ancestor` is `node` or lies on its parent chain
    pub fn is_ancestor(&self, ancestor: TbaaNodeId, node: TbaaNodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = match self.node(id) {
                TbaaNode::Scalar { parent, .. } => Some(*parent),
                TbaaNode::Root { .. } => None,
                TbaaNode::Struct { .. } => Some(self.root()),
            };
        }
        false
    }

    /// Whether two tagged accesses may refer to the same memory
    pub fn may_alias(&self, first: &AliasTag, second: &AliasTag) -> bool {
        if first.base == second.base
            && matches!(self.node(first.base), TbaaNode::Struct { .. })
            && first.offset != second.offset
        {
            return false;
        }
        self.is_ancestor(first.access, second.access)
            || self.is_ancestor(second.access, first.access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_scalars_do_not_alias() {
        let mut tree = TbaaTree::new("corvid");
        let integer = tree.add_scalar("Integer", tree.root());
        let real = tree.add_scalar("Real", tree.root());
        assert!(!tree.may_alias(&tree.scalar_tag(integer), &tree.scalar_tag(real)));
        assert!(tree.may_alias(&tree.scalar_tag(integer), &tree.scalar_tag(integer)));
    }

    #[test]
    fn test_child_aliases_parent() {
        let mut tree = TbaaTree::new("corvid");
        let object = tree.add_scalar("object", tree.root());
        let shape = tree.add_scalar("Shape", object);
        assert!(tree.may_alias(&tree.scalar_tag(object), &tree.scalar_tag(shape)));
        assert!(tree.is_ancestor(tree.root(), shape));
    }

    #[test]
    fn test_struct_fields_at_different_offsets() {
        let mut tree = TbaaTree::new("corvid");
        let integer = tree.add_scalar("Integer", tree.root());
        let point = tree.add_struct(
            "Point",
            vec![
                TbaaField { offset: 0, node: integer },
                TbaaField { offset: 8, node: integer },
            ],
        );
        let x = AliasTag { base: point, access: integer, offset: 0 };
        let y = AliasTag { base: point, access: integer, offset: 8 };
        assert!(!tree.may_alias(&x, &y));
        assert!(tree.may_alias(&x, &x));
        assert_eq!(point.to_string(), "!tbaa2");
    }
}
