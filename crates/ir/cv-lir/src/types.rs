//! Backend type representation

use std::fmt;
use std::sync::Arc;

/// A concrete, fixed-layout representation of a value
///
/// Struct types are shared behind [`Arc`] so that layouts produced once can be
/// handed out repeatedly without copying. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendType {
    /// No value
    Void,
    /// Integer of the given bit width
    Int(u32),
    /// 64-bit IEEE floating point
    Double,
    /// Opaque pointer
    Ptr,
    /// Fixed-length array
    Array(Arc<ArrayType>),
    /// Structure
    Struct(Arc<StructType>),
}

impl BackendType {
    /// 1-bit integer
    pub const I1: Self = Self::Int(1);
    /// 8-bit integer
    pub const I8: Self = Self::Int(8);
    /// 16-bit integer
    pub const I16: Self = Self::Int(16);
    /// 32-bit integer
    pub const I32: Self = Self::Int(32);
    /// 64-bit integer
    pub const I64: Self = Self::Int(64);

    /// An array of `len` elements
    pub fn array(element: Self, len: u64) -> Self {
        Self::Array(Arc::new(ArrayType { element, len }))
    }

    /// A named struct
    pub fn named_struct(name: impl Into<String>, fields: Vec<Self>) -> Self {
        Self::Struct(Arc::new(StructType::named(name, fields)))
    }

    /// An anonymous struct
    pub fn anonymous_struct(fields: Vec<Self>) -> Self {
        Self::Struct(Arc::new(StructType::anonymous(fields)))
    }

    /// The struct behind this type, if it is one
    pub fn as_struct(&self) -> Option<&Arc<StructType>> {
        match self {
            Self::Struct(st) => Some(st),
            _ => None,
        }
    }

    /// The array behind this type, if it is one
    pub fn as_array(&self) -> Option<&Arc<ArrayType>> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Whether this is the opaque pointer type
    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Ptr)
    }
}

impl From<StructType> for BackendType {
    fn from(st: StructType) -> Self {
        Self::Struct(Arc::new(st))
    }
}

impl From<ArrayType> for BackendType {
    fn from(array: ArrayType) -> Self {
        Self::Array(Arc::new(array))
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(formatter, "void"),
            Self::Int(bits) => write!(formatter, "i{bits}"),
            Self::Double => write!(formatter, "double"),
            Self::Ptr => write!(formatter, "ptr"),
            Self::Array(array) => write!(formatter, "[{} x {}]", array.len, array.element),
            Self::Struct(st) => match &st.name {
                Some(name) => write!(formatter, "%{name}"),
                None => write!(formatter, "{}", st.body()),
            },
        }
    }
}

/// Fixed-length array type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    /// Element representation
    pub element: BackendType,
    /// Number of elements
    pub len: u64,
}

/// Structure type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
    /// Name for named structs, `None` for literal structs
    pub name: Option<String>,
    /// Field representations, in memory order
    pub fields: Vec<BackendType>,
    /// Whether fields are laid out without padding
    pub packed: bool,
}

impl StructType {
    /// A named, unpacked struct
    pub fn named(name: impl Into<String>, fields: Vec<BackendType>) -> Self {
        Self {
            name: Some(name.into()),
            fields,
            packed: false,
        }
    }

    /// An anonymous, unpacked struct
    pub fn anonymous(fields: Vec<BackendType>) -> Self {
        Self {
            name: None,
            fields,
            packed: false,
        }
    }

    /// Field list rendered as `{ a, b }`
    pub fn body(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let body = if fields.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {fields} }}")
        };
        if self.packed { format!("<{body}>") } else { body }
    }

    /// Definition line for named structs, e.g. `%box = type { ptr, [4 x i64] }`
    pub fn definition(&self) -> String {
        match &self.name {
            Some(name) => format!("%{name} = type {}", self.body()),
            None => self.body(),
        }
    }
}

/// Calling-convention level function signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    /// Parameter representations, implicit parameters first
    pub params: Vec<BackendType>,
    /// Return representation
    pub ret: BackendType,
}

impl FunctionSignature {
    /// A signature from parameters and return type
    pub fn new(params: Vec<BackendType>, ret: BackendType) -> Self {
        Self { params, ret }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(formatter, "{} ({params})", self.ret)
    }
}
