//! Target data layout: sizes, alignments and field offsets

use crate::types::{BackendType, StructType};

/// Memory layout rules of the compilation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataLayout {
    pointer_size: u64,
}

/// Computed layout of one struct type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructLayout {
    /// Allocation size including trailing padding
    pub size: u64,
    /// Alignment of the struct
    pub align: u64,
    /// Byte offset of every field
    pub offsets: Vec<u64>,
}

impl DataLayout {
    /// A layout with the given pointer size in bytes
    pub fn new(pointer_size: u64) -> Self {
        Self { pointer_size }
    }

    /// Pointer size in bytes
    pub fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    /// Allocation size of a value of `ty`: its store size rounded up to its alignment
    pub fn size_of(&self, ty: &BackendType) -> u64 {
        match ty {
            BackendType::Void => 0,
            BackendType::Int(bits) => {
                let bytes = u64::from(bits.div_ceil(8));
                bytes.next_power_of_two()
            }
            BackendType::Double => 8,
            BackendType::Ptr => self.pointer_size,
            BackendType::Array(array) => self.size_of(&array.element) * array.len,
            BackendType::Struct(st) => self.struct_layout(st).size,
        }
    }

    /// ABI alignment of `ty`
    pub fn align_of(&self, ty: &BackendType) -> u64 {
        match ty {
            BackendType::Void => 1,
            BackendType::Int(_) => self.size_of(ty).min(8),
            BackendType::Double => 8,
            BackendType::Ptr => self.pointer_size,
            BackendType::Array(array) => self.align_of(&array.element),
            BackendType::Struct(st) => self.struct_layout(st).align,
        }
    }

    /// Offsets, size and alignment of a struct
    pub fn struct_layout(&self, st: &StructType) -> StructLayout {
        let mut offsets = Vec::with_capacity(st.fields.len());
        let mut offset = 0;
        let mut align = 1;

        for field in &st.fields {
            let field_align = if st.packed { 1 } else { self.align_of(field) };
            offset = align_to(offset, field_align);
            offsets.push(offset);
            offset += self.size_of(field);
            align = align.max(field_align);
        }

        StructLayout {
            size: align_to(offset, align),
            align,
            offsets,
        }
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new(8)
    }
}

fn align_to(offset: u64, align: u64) -> u64 {
    offset.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_sizes() {
        let layout = DataLayout::default();
        assert_eq!(layout.size_of(&BackendType::I1), 1);
        assert_eq!(layout.size_of(&BackendType::I16), 2);
        assert_eq!(layout.size_of(&BackendType::I32), 4);
        assert_eq!(layout.size_of(&BackendType::I64), 8);
        assert_eq!(layout.size_of(&BackendType::Ptr), 8);
        assert_eq!(DataLayout::new(4).size_of(&BackendType::Ptr), 4);
    }

    #[test]
    fn test_struct_padding() {
        let layout = DataLayout::default();
        let st = StructType::anonymous(vec![BackendType::I8, BackendType::I64, BackendType::I16]);
        let computed = layout.struct_layout(&st);
        assert_eq!(computed.offsets, vec![0, 8, 16]);
        assert_eq!(computed.size, 24);
        assert_eq!(computed.align, 8);
    }

    #[test]
    fn test_packed_struct() {
        let layout = DataLayout::default();
        let mut st = StructType::anonymous(vec![BackendType::I8, BackendType::I64]);
        st.packed = true;
        let computed = layout.struct_layout(&st);
        assert_eq!(computed.offsets, vec![0, 1]);
        assert_eq!(computed.size, 9);
    }

    #[test]
    fn test_array_of_bytes_has_no_padding() {
        let layout = DataLayout::default();
        let array = BackendType::array(BackendType::I8, 33);
        assert_eq!(layout.size_of(&array), 33);
        assert_eq!(layout.align_of(&array), 1);
    }

    #[test]
    fn test_empty_struct() {
        let layout = DataLayout::default();
        let st = StructType::anonymous(vec![]);
        assert_eq!(layout.struct_layout(&st).size, 0);
    }
}
