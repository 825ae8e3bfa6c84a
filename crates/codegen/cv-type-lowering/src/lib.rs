//! Type lowering for Corvid
//!
//! Turns the semantic types of a package into the fixed layouts a native code
//! generator works with. A [`TypeLowering`] is created per package and answers:
//!
//! - representations of types ([`TypeLowering::backend_type_for`]) and
//!   signatures of functions ([`TypeLowering::function_signature_for`])
//! - the runtime layouts shared by all code: box, box info, class info,
//!   conformance tables, callables, type descriptions ([`CoreTypes`])
//! - object, capture and multiprotocol conformance layouts
//! - run-time type info, dispatch tables and conformance slots
//! - alias analysis tags
//!
//! Generic code is lowered inside a [`ReificationContext`] installed with
//! [`TypeLowering::with_reification_context`]. Generic parameters the context
//! does not map are erased: values of such types travel in the box.

pub mod capture;
pub mod core_types;
pub mod dispatch;
pub mod error;
pub mod lowering;
pub mod options;
pub mod protocols;
pub mod reification;
pub mod rtti;
pub mod signature;
pub mod tbaa;

#[cfg(test)]
mod fixtures;

pub use core_types::{CoreTypes, managable};
pub use dispatch::DispatchTable;
pub use error::{LoweringError, LoweringResult};
pub use lowering::TypeLowering;
pub use options::{LoweringOptions, OptionsError};
pub use protocols::ConformanceSlots;
pub use reification::{ReificationContext, ReificationGuard};
pub use rtti::{RunTimeTypeInfo, RunTimeTypeInfoFlag, TypeDescription};
