//! Calling-convention signatures

use crate::error::LoweringResult;
use crate::lowering::{TypeLowering, expect_lowered};
use cv_lir::{BackendType, FunctionSignature};
use cv_types::{Function, FunctionKind, Receiver};

#[allow(
    clippy::multiple_inherent_impl,
    reason = "engine queries are grouped by the layout they produce"
)]
impl TypeLowering<'_> {
    /// Signature of `function`
    ///
    /// # Panics
    ///
    /// Panics if a parameter or the return type has no representation.
    pub fn function_signature_for(&mut self, function: &Function) -> FunctionSignature {
        expect_lowered(self.try_function_signature_for(function))
    }

    /// Signature of `function`
    ///
    /// Parameters are, in order: the receiver pointer if the kind has one, a
    /// pointer to the generic arguments if the function declares its own generic
    /// parameters, the declared parameters, and an out-pointer for the error if
    /// the function can raise. Initializers of classes return the object; those
    /// of value types initialize through the receiver and return nothing.
    ///
    /// # Errors
    ///
    /// Fails if a parameter, the error type or the return type cannot be lowered.
    pub fn try_function_signature_for(
        &mut self,
        function: &Function,
    ) -> LoweringResult<FunctionSignature> {
        let mut params = Vec::with_capacity(function.parameters.len() + 3);
        if function.kind.receiver() != Receiver::None {
            params.push(BackendType::Ptr);
        }
        if !function.generic_params.is_empty() {
            params.push(BackendType::Ptr);
        }
        for parameter in &function.parameters {
            params.push(self.try_backend_type_for(&parameter.ty)?);
        }
        if let Some(error_type) = &function.error_type {
            self.try_backend_type_for(error_type)?;
            params.push(BackendType::Ptr);
        }

        let ret = match function.kind {
            FunctionKind::ObjectInitializer => BackendType::Ptr,
            FunctionKind::ValueTypeInitializer => BackendType::Void,
            _ => self.try_backend_type_for(&function.return_type)?,
        };
        Ok(FunctionSignature::new(params, ret))
    }
}
