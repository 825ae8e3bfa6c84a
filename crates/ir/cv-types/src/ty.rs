//! Type representation

use crate::definition::TypeDefId;
use crate::function::FunctionId;

/// Builtin scalar types
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Primitive {
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point number
    Real,
    /// Truth value
    Boolean,
    /// Unsigned 8-bit value
    Byte,
    /// A single Unicode scalar value
    Symbol,
}

impl Primitive {
    /// Source-level name of the primitive
    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Real => "Real",
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Symbol => "Symbol",
        }
    }
}

/// Declaration that introduces a generic parameter
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum GenericOwner {
    /// Parameter of a class, value type or protocol
    Type(TypeDefId),
    /// Parameter declared by a function itself
    Function(FunctionId),
}

/// Identity of a generic parameter: its owner and its position in the owner's list
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct GenericParamRef {
    /// Declaration owning the parameter
    pub owner: GenericOwner,
    /// Index into the owner's generic parameter list
    pub index: u32,
}

/// A source-level type
///
/// Types compare structurally: two values built from the same definition with the
/// same generic arguments are equal and hash identically.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Type {
    /// Builtin scalar
    Primitive(Primitive),
    /// Reference to a class instance
    Class {
        /// Class definition
        def: TypeDefId,
        /// Generic arguments
        args: Vec<Type>,
    },
    /// Value type stored inline
    ValueType {
        /// Value type definition
        def: TypeDefId,
        /// Generic arguments
        args: Vec<Type>,
    },
    /// Enumeration
    Enum {
        /// Enum definition
        def: TypeDefId,
    },
    /// Any value conforming to a protocol
    Protocol {
        /// Protocol definition
        def: TypeDefId,
        /// Generic arguments
        args: Vec<Type>,
    },
    /// Any value conforming to all listed protocols
    ///
    /// Build with [`Type::multi_protocol`] so the protocols are in canonical order.
    MultiProtocol(Vec<Type>),
    /// A value or nothing
    Optional(Box<Type>),
    /// Closure or function reference
    Callable {
        /// Parameter types
        params: Vec<Type>,
        /// Return type
        ret: Box<Type>,
    },
    /// Generic type parameter
    GenericParam(GenericParamRef),
    /// Any class instance
    Someobject,
    /// Any value at all
    Something,
    /// The type of expressions that never produce a value
    NoReturn,
}

impl Type {
    /// The `Integer` type
    pub fn integer() -> Self {
        Self::Primitive(Primitive::Integer)
    }

    /// The `Real` type
    pub fn real() -> Self {
        Self::Primitive(Primitive::Real)
    }

    /// The `Boolean` type
    pub fn boolean() -> Self {
        Self::Primitive(Primitive::Boolean)
    }

    /// The `Byte` type
    pub fn byte() -> Self {
        Self::Primitive(Primitive::Byte)
    }

    /// A class type
    pub fn class(def: TypeDefId, args: Vec<Self>) -> Self {
        Self::Class { def, args }
    }

    /// A value type
    pub fn value_type(def: TypeDefId, args: Vec<Self>) -> Self {
        Self::ValueType { def, args }
    }

    /// A protocol type
    pub fn protocol(def: TypeDefId, args: Vec<Self>) -> Self {
        Self::Protocol { def, args }
    }

    /// A multiprotocol type with its protocols sorted by definition and deduplicated
    pub fn multi_protocol(mut protocols: Vec<Self>) -> Self {
        protocols.sort_by_key(|protocol| protocol.type_definition().map(|def| def.0));
        protocols.dedup();
        Self::MultiProtocol(protocols)
    }

    /// An optional wrapping `inner`
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// A callable type
    pub fn callable(params: Vec<Self>, ret: Self) -> Self {
        Self::Callable {
            params,
            ret: Box::new(ret),
        }
    }

    /// A generic parameter of a type definition
    pub fn type_param(owner: TypeDefId, index: u32) -> Self {
        Self::GenericParam(GenericParamRef {
            owner: GenericOwner::Type(owner),
            index,
        })
    }

    /// A generic parameter declared by a function
    pub fn function_param(owner: FunctionId, index: u32) -> Self {
        Self::GenericParam(GenericParamRef {
            owner: GenericOwner::Function(owner),
            index,
        })
    }

    /// Definition backing this type, if it is nominal
    pub fn type_definition(&self) -> Option<TypeDefId> {
        match self {
            Self::Class { def, .. }
            | Self::ValueType { def, .. }
            | Self::Enum { def }
            | Self::Protocol { def, .. } => Some(*def),
            _ => None,
        }
    }

    /// Generic arguments carried by this type
    pub fn generic_arguments(&self) -> &[Self] {
        match self {
            Self::Class { args, .. }
            | Self::ValueType { args, .. }
            | Self::Protocol { args, .. } => args,
            _ => &[],
        }
    }

    /// Whether the value is a reference to a class instance
    pub fn is_class_like(&self) -> bool {
        matches!(self, Self::Class { .. } | Self::Someobject)
    }

    /// Whether the type mentions any generic parameter
    pub fn contains_generic_params(&self) -> bool {
        match self {
            Self::GenericParam(_) => true,
            Self::Class { args, .. }
            | Self::ValueType { args, .. }
            | Self::Protocol { args, .. } => args.iter().any(Self::contains_generic_params),
            Self::MultiProtocol(protocols) => protocols.iter().any(Self::contains_generic_params),
            Self::Optional(inner) => inner.contains_generic_params(),
            Self::Callable { params, ret } => {
                params.iter().any(Self::contains_generic_params) || ret.contains_generic_params()
            }
            Self::Primitive(_)
            | Self::Enum { .. }
            | Self::Someobject
            | Self::Something
            | Self::NoReturn => false,
        }
    }

    /// Replace generic parameters for which `lookup` returns a type
    ///
    /// Parameters without a replacement are kept as they are.
    #[must_use]
    pub fn substitute(&self, lookup: &impl Fn(GenericParamRef) -> Option<Self>) -> Self {
        let map_all = |types: &[Self]| -> Vec<Self> {
            types.iter().map(|ty| ty.substitute(lookup)).collect()
        };
        match self {
            Self::GenericParam(param) => lookup(*param).unwrap_or_else(|| self.clone()),
            Self::Class { def, args } => Self::Class {
                def: *def,
                args: map_all(args),
            },
            Self::ValueType { def, args } => Self::ValueType {
                def: *def,
                args: map_all(args),
            },
            Self::Protocol { def, args } => Self::Protocol {
                def: *def,
                args: map_all(args),
            },
            Self::MultiProtocol(protocols) => Self::multi_protocol(map_all(protocols)),
            Self::Optional(inner) => Self::optional(inner.substitute(lookup)),
            Self::Callable { params, ret } => {
                Self::callable(map_all(params), ret.substitute(lookup))
            }
            Self::Primitive(_)
            | Self::Enum { .. }
            | Self::Someobject
            | Self::Something
            | Self::NoReturn => self.clone(),
        }
    }
}
