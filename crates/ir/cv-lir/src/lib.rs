//! Low-level representation (LIR) of Corvid values
//!
//! LIR types are fixed-layout and fully concrete. They mirror what a native code
//! generator needs to allocate, load and store values:
//! - [`BackendType`]: scalar, pointer, array and struct representations
//! - [`FunctionSignature`]: calling-convention level signatures
//! - [`DataLayout`]: sizes, alignments and field offsets for a target
//! - [`TbaaTree`] / [`AliasTag`]: type-based alias analysis metadata

pub mod layout;
pub mod tbaa;
pub mod types;

pub use layout::{DataLayout, StructLayout};
pub use tbaa::{AliasTag, TbaaField, TbaaNode, TbaaNodeId, TbaaTree};
pub use types::{ArrayType, BackendType, FunctionSignature, StructType};
