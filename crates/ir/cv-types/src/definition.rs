//! Type definitions: classes, value types, enums and protocols

use crate::function::FunctionId;
use crate::ty::Type;
use cv_intern::Symbol;
use cv_span::FileSpan;

/// Unique ID for a type definition inside a package
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TypeDefId(pub u32);

/// Kind-specific part of a type definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefinitionKind {
    /// Reference type with single inheritance
    Class {
        /// Superclass, with generic arguments expressed in this class's parameters
        superclass: Option<Type>,
    },
    /// Inline value type
    ValueType,
    /// Enumeration with named cases
    Enum {
        /// Case names in declaration order
        cases: Vec<Symbol>,
    },
    /// Protocol
    Protocol {
        /// Package-wide protocol index, assigned at registration
        protocol_index: u32,
    },
}

/// An instance variable (object field) of a class or value type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceVariable {
    /// Field name
    pub name: Symbol,
    /// Declared type, possibly mentioning the owner's generic parameters
    pub ty: Type,
    /// Whether the field may be reassigned
    pub mutable: bool,
    /// Declaration site
    pub span: FileSpan,
}

/// A class, value type, enum or protocol declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    /// Declared name
    pub name: Symbol,
    /// Kind-specific data
    pub kind: TypeDefinitionKind,
    /// Names of the definition's own generic parameters
    pub generic_params: Vec<Symbol>,
    /// Own instance variables (inherited ones live on the superclass)
    pub instance_variables: Vec<InstanceVariable>,
    /// Methods, initializers and type methods, in declaration order
    pub methods: Vec<FunctionId>,
    /// Protocols this definition conforms to
    pub conformances: Vec<Type>,
    /// Declaration site
    pub span: FileSpan,
}

impl TypeDefinition {
    fn new(name: Symbol, kind: TypeDefinitionKind, span: FileSpan) -> Self {
        Self {
            name,
            kind,
            generic_params: Vec::new(),
            instance_variables: Vec::new(),
            methods: Vec::new(),
            conformances: Vec::new(),
            span,
        }
    }

    /// A class without superclass
    pub fn class(name: Symbol, span: FileSpan) -> Self {
        Self::new(name, TypeDefinitionKind::Class { superclass: None }, span)
    }

    /// A value type
    pub fn value_type(name: Symbol, span: FileSpan) -> Self {
        Self::new(name, TypeDefinitionKind::ValueType, span)
    }

    /// An enum with the given cases
    pub fn enumeration(name: Symbol, cases: Vec<Symbol>, span: FileSpan) -> Self {
        Self::new(name, TypeDefinitionKind::Enum { cases }, span)
    }

    /// A protocol; its index is assigned when the package registers it
    pub fn protocol(name: Symbol, span: FileSpan) -> Self {
        Self::new(name, TypeDefinitionKind::Protocol { protocol_index: 0 }, span)
    }

    /// Set the superclass (classes only; ignored otherwise)
    #[must_use]
    pub fn with_superclass(mut self, superclass: Type) -> Self {
        if let TypeDefinitionKind::Class { superclass: slot } = &mut self.kind {
            *slot = Some(superclass);
        }
        self
    }

    /// Declare the definition's own generic parameters
    #[must_use]
    pub fn with_generic_params(mut self, params: Vec<Symbol>) -> Self {
        self.generic_params = params;
        self
    }

    /// Append an instance variable
    #[must_use]
    pub fn with_instance_variable(mut self, name: Symbol, ty: Type, mutable: bool) -> Self {
        let span = self.span;
        self.instance_variables.push(InstanceVariable {
            name,
            ty,
            mutable,
            span,
        });
        self
    }

    /// Declare conformance to a protocol
    #[must_use]
    pub fn with_conformance(mut self, protocol: Type) -> Self {
        self.conformances.push(protocol);
        self
    }

    /// Whether this is a class
    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeDefinitionKind::Class { .. })
    }

    /// Whether this is a protocol
    pub fn is_protocol(&self) -> bool {
        matches!(self.kind, TypeDefinitionKind::Protocol { .. })
    }

    /// Superclass type, for classes that have one
    pub fn superclass(&self) -> Option<&Type> {
        match &self.kind {
            TypeDefinitionKind::Class { superclass } => superclass.as_ref(),
            _ => None,
        }
    }

    /// Package-wide protocol index, for protocols
    pub fn protocol_index(&self) -> Option<u32> {
        match self.kind {
            TypeDefinitionKind::Protocol { protocol_index } => Some(protocol_index),
            _ => None,
        }
    }
}
