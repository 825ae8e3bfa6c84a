//! Closure capture storage

use crate::error::LoweringResult;
use crate::lowering::{TypeLowering, expect_lowered};
use cv_lir::BackendType;
use cv_types::Capture;

#[allow(
    clippy::multiple_inherent_impl,
    reason = "engine queries are grouped by the layout they produce"
)]
impl TypeLowering<'_> {
    /// Layout of the storage holding what a closure captures
    ///
    /// # Panics
    ///
    /// Panics if a captured variable has no representation.
    pub fn capture_layout(
        &mut self,
        capture: &Capture,
        this_type: &BackendType,
        escaping: bool,
    ) -> BackendType {
        expect_lowered(self.try_capture_layout(capture, this_type, escaping))
    }

    /// Layout of the storage holding what a closure captures
    ///
    /// Escaping captures are heap allocated and start with a control block
    /// pointer and a pointer to their deinitializer. `this_type` is stored next
    /// when the closure captures the enclosing instance, followed by the
    /// captured variables in capture order.
    ///
    /// # Errors
    ///
    /// Fails if a captured variable cannot be lowered.
    pub fn try_capture_layout(
        &mut self,
        capture: &Capture,
        this_type: &BackendType,
        escaping: bool,
    ) -> LoweringResult<BackendType> {
        let mut fields = Vec::with_capacity(capture.variables.len() + 3);
        if escaping {
            fields.push(BackendType::Ptr);
            fields.push(BackendType::Ptr);
        }
        if capture.captures_self {
            fields.push(this_type.clone());
        }
        for variable in &capture.variables {
            fields.push(self.try_backend_type_for(&variable.ty)?);
        }
        tracing::trace!(fields = fields.len(), escaping, "built capture layout");
        Ok(BackendType::anonymous_struct(fields))
    }
}
