//! Semantic type model for Corvid
//!
//! Semantic analysis produces these values and owns them; scoping and type
//! lowering only read them. The model is a closed set of variants:
//!
//! - [`Type`]: a source-level type (primitive, class, value type, enum, protocol,
//!   multiprotocol, optional, callable, generic parameter, ...)
//! - [`TypeDefinition`]: a class, value type, enum or protocol declaration
//! - [`Function`]: a callable declaration together with its [`FunctionKind`]
//! - [`Package`]: the tables holding every definition of one compiled package
//! - [`Capture`]: the variables a closure captures from its enclosing body

pub mod capture;
pub mod definition;
pub mod error;
pub mod function;
pub mod package;
pub mod ty;

pub use capture::{Capture, VariableCapture, VariableId};
pub use definition::{InstanceVariable, TypeDefId, TypeDefinition, TypeDefinitionKind};
pub use error::{DefinitionError, DefinitionResult};
pub use function::{Function, FunctionId, FunctionKind, Parameter, Receiver};
pub use package::Package;
pub use ty::{GenericOwner, GenericParamRef, Primitive, Type};
