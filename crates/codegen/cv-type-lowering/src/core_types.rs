//! Package-wide runtime layouts
//!
//! These layouts are shared by every compiled function of a package and must
//! match what the runtime library expects. They are built once when the
//! [`crate::TypeLowering`] is created and never change afterwards.

use crate::options::LoweringOptions;
use cv_lir::{BackendType, FunctionSignature};

/// The runtime layouts of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreTypes {
    /// `%box = { ptr box_info, [N x i64] }`
    pub box_type: BackendType,
    /// `{ protocol_conformance, ptr rtti, ptr retain, ptr release }`
    pub box_info: BackendType,
    /// `{ ptr dispatch_table, ptr superclass_info, protocol_conformance, ptr rtti }`
    pub class_info: BackendType,
    /// `{ ptr conformance_entries, i16 lowest_index, i16 count }`
    pub protocol_conformance: BackendType,
    /// `{ ptr rtti, ptr method_table }`
    pub protocol_conformance_entry: BackendType,
    /// `{ ptr function, ptr captures }`
    pub callable: BackendType,
    /// A callable stored remotely inside a box: `{ ptr control, callable }`
    pub callable_box_capture: BackendType,
    /// `{ ptr rtti, i1 optional }`
    pub type_description: BackendType,
    /// `{ i16 own_generic_count, i16 generic_offset, i8 flag }`
    pub run_time_type_info: BackendType,
    /// Representation of any class instance
    pub someobject: BackendType,
    /// `void (ptr)`, retains or releases the remote payload of a box
    pub box_retain_release: FunctionSignature,
    /// `void (ptr)`, tears down escaping capture storage
    pub capture_deinit: FunctionSignature,
}

impl CoreTypes {
    /// Build every runtime layout for `options`
    pub fn new(options: &LoweringOptions) -> Self {
        let protocol_conformance = BackendType::named_struct(
            "protocol_conformance",
            vec![BackendType::Ptr, BackendType::I16, BackendType::I16],
        );
        let callable =
            BackendType::named_struct("callable", vec![BackendType::Ptr, BackendType::Ptr]);

        Self {
            box_type: BackendType::named_struct(
                "box",
                vec![
                    BackendType::Ptr,
                    BackendType::array(BackendType::I64, options.box_inline_words),
                ],
            ),
            box_info: BackendType::named_struct(
                "box_info",
                vec![
                    protocol_conformance.clone(),
                    BackendType::Ptr,
                    BackendType::Ptr,
                    BackendType::Ptr,
                ],
            ),
            class_info: BackendType::named_struct(
                "class_info",
                vec![
                    BackendType::Ptr,
                    BackendType::Ptr,
                    protocol_conformance.clone(),
                    BackendType::Ptr,
                ],
            ),
            protocol_conformance_entry: BackendType::named_struct(
                "protocol_conformance_entry",
                vec![BackendType::Ptr, BackendType::Ptr],
            ),
            callable_box_capture: managable(callable.clone()),
            type_description: BackendType::named_struct(
                "type_description",
                vec![BackendType::Ptr, BackendType::I1],
            ),
            run_time_type_info: BackendType::named_struct(
                "run_time_type_info",
                vec![BackendType::I16, BackendType::I16, BackendType::I8],
            ),
            someobject: BackendType::Ptr,
            box_retain_release: FunctionSignature::new(vec![BackendType::Ptr], BackendType::Void),
            capture_deinit: FunctionSignature::new(vec![BackendType::Ptr], BackendType::Void),
            protocol_conformance,
            callable,
        }
    }

    /// Named struct definitions, in dependency order
    pub fn definitions(&self) -> Vec<String> {
        [
            &self.box_type,
            &self.protocol_conformance,
            &self.box_info,
            &self.class_info,
            &self.protocol_conformance_entry,
            &self.callable,
            &self.type_description,
            &self.run_time_type_info,
        ]
        .into_iter()
        .filter_map(BackendType::as_struct)
        .map(|st| st.definition())
        .collect()
    }
}

/// `{ ptr control, payload }`: a payload with its own control block
pub fn managable(payload: BackendType) -> BackendType {
    BackendType::anonymous_struct(vec![BackendType::Ptr, payload])
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_lir::DataLayout;
    use expect_test::expect;

    #[test]
    fn test_definitions() {
        let core = CoreTypes::new(&LoweringOptions::default());
        expect![[r#"
            %box = type { ptr, [4 x i64] }
            %protocol_conformance = type { ptr, i16, i16 }
            %box_info = type { %protocol_conformance, ptr, ptr, ptr }
            %class_info = type { ptr, ptr, %protocol_conformance, ptr }
            %protocol_conformance_entry = type { ptr, ptr }
            %callable = type { ptr, ptr }
            %type_description = type { ptr, i1 }
            %run_time_type_info = type { i16, i16, i8 }"#]]
        .assert_eq(&core.definitions().join("\n"));
    }

    #[test]
    fn test_box_size_follows_options() {
        let layout = DataLayout::default();
        let core = CoreTypes::new(&LoweringOptions::default());
        assert_eq!(layout.size_of(&core.box_type), 40);

        let small = CoreTypes::new(&LoweringOptions {
            box_inline_words: 2,
            ..LoweringOptions::default()
        });
        assert_eq!(layout.size_of(&small.box_type), 24);
    }

    #[test]
    fn test_signatures() {
        let core = CoreTypes::new(&LoweringOptions::default());
        assert_eq!(core.box_retain_release.to_string(), "void (ptr)");
        assert_eq!(core.callable_box_capture.to_string(), "{ ptr, %callable }");
    }
}
