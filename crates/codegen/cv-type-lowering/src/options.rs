//! Per-package lowering configuration

use cv_lir::DataLayout;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use toml::de::Error as TomlError;
use thiserror::Error;

/// Construction parameters of a [`crate::TypeLowering`]
///
/// ```toml
/// pointer_size = 8
/// box_inline_words = 4
/// alias_tags = true
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoweringOptions {
    /// Pointer size of the target in bytes
    pub pointer_size: u64,
    /// Inline payload of a box, in 64-bit words
    pub box_inline_words: u64,
    /// Whether memory accesses get alias analysis tags
    pub alias_tags: bool,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self {
            pointer_size: 8,
            box_inline_words: 4,
            alias_tags: true,
        }
    }
}

/// Errors raised while reading [`LoweringOptions`]
#[derive(Debug, Error, Diagnostic)]
pub enum OptionsError {
    /// The text is not valid TOML or has unknown keys
    #[error("invalid lowering options: {0}")]
    #[diagnostic(code(lowering::options::parse))]
    Parse(#[from] TomlError),

    /// Only 32- and 64-bit targets are supported
    #[error("pointer size must be 4 or 8 bytes, got {0}")]
    #[diagnostic(code(lowering::options::pointer_size))]
    InvalidPointerSize(u64),

    /// A box must be able to hold at least a pointer
    #[error("a box needs at least one inline word")]
    #[diagnostic(code(lowering::options::box_size))]
    EmptyBox,
}

impl LoweringOptions {
    /// Parse options from TOML; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, unknown keys or unsupported values.
    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that the values describe a supported target
    ///
    /// # Errors
    ///
    /// Fails on a pointer size other than 4 or 8 and on an empty box.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !matches!(self.pointer_size, 4 | 8) {
            return Err(OptionsError::InvalidPointerSize(self.pointer_size));
        }
        if self.box_inline_words == 0 {
            return Err(OptionsError::EmptyBox);
        }
        Ok(())
    }

    /// Data layout of the target
    pub fn data_layout(&self) -> DataLayout {
        DataLayout::new(self.pointer_size)
    }

    /// Inline payload of a box in bytes
    pub fn box_capacity(&self) -> u64 {
        self.box_inline_words * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoweringOptions::from_toml_str("").unwrap();
        assert_eq!(options, LoweringOptions::default());
        assert_eq!(options.box_capacity(), 32);
    }

    #[test]
    fn test_partial_override() {
        let options =
            LoweringOptions::from_toml_str("alias_tags = false\nbox_inline_words = 2").unwrap();
        assert!(!options.alias_tags);
        assert_eq!(options.box_capacity(), 16);
        assert_eq!(options.pointer_size, 8);
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            LoweringOptions::from_toml_str("frobnicate = 1"),
            Err(OptionsError::Parse(_))
        ));
        assert!(matches!(
            LoweringOptions::from_toml_str("pointer_size = 2"),
            Err(OptionsError::InvalidPointerSize(2))
        ));
        assert!(matches!(
            LoweringOptions::from_toml_str("box_inline_words = 0"),
            Err(OptionsError::EmptyBox)
        ));
    }
}
