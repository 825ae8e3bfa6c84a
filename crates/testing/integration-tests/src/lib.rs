//! Integration test utilities for Corvid
//!
//! Test packages are described by TOML manifests under `test-packages/`; see
//! [`manifest`] for the format. A [`TestFixture`] owns the built package and
//! hands out the scoping and lowering front ends over it.

pub mod manifest;
pub mod report;

use anyhow::{Context as _, Result};
use cv_intern::{Interner, Symbol};
use cv_scope::InstanceScopes;
use cv_span::FileId;
use cv_type_lowering::{LoweringOptions, TypeLowering};
use cv_types::{Function, FunctionId, Package, Type, TypeDefId};
use indexmap::IndexMap;
use manifest::Manifest;
use std::fs;
use std::path::PathBuf;

/// A package loaded for a test
#[derive(Debug)]
pub struct TestFixture {
    /// Interner holding every name of the package
    pub interner: Interner,
    /// The package
    pub package: Package,
    /// Definition ids by name
    pub types: IndexMap<String, TypeDefId>,
    /// Function ids by `Owner.name`, or `name` for free functions
    pub functions: IndexMap<String, FunctionId>,
}

impl TestFixture {
    /// Builds a fixture from manifest source
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is malformed or names unknown types
    pub fn from_manifest(source: &str) -> Result<Self> {
        let interner = Interner::new();
        let loaded = Manifest::from_toml_str(source)?.load(&interner, FileId(0))?;
        Ok(Self {
            interner,
            package: loaded.package,
            types: loaded.types,
            functions: loaded.functions,
        })
    }

    /// Loads `test-packages/<name>.toml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid manifest
    pub fn from_test_package(name: &str) -> Result<Self> {
        let path = Self::test_packages_dir().join(format!("{name}.toml"));
        let source = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::from_manifest(&source).with_context(|| format!("in {}", path.display()))
    }

    /// Directory holding the test package manifests
    #[must_use]
    pub fn test_packages_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-packages")
    }

    /// Definition called `name`
    ///
    /// # Panics
    ///
    /// Panics if the package has no such definition
    #[must_use]
    pub fn def(&self, name: &str) -> TypeDefId {
        self.types[name]
    }

    /// Function registered as `key`
    ///
    /// # Panics
    ///
    /// Panics if the package has no such function
    #[must_use]
    pub fn function_id(&self, key: &str) -> FunctionId {
        self.functions[key]
    }

    /// Function registered as `key`
    ///
    /// # Panics
    ///
    /// Panics if the package has no such function
    #[must_use]
    pub fn function(&self, key: &str) -> &Function {
        self.package.function(self.function_id(key))
    }

    /// Definition `name` applied to its own generic parameters
    ///
    /// # Panics
    ///
    /// Panics if the package has no such definition
    #[must_use]
    pub fn own_type(&self, name: &str) -> Type {
        report::own_type(&self.package, self.def(name))
    }

    /// Symbol for `text`
    #[must_use]
    pub fn symbol(&self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    /// A lowering engine with default options
    #[must_use]
    pub fn lowering(&self) -> TypeLowering<'_> {
        TypeLowering::new(&self.package, LoweringOptions::default())
    }

    /// Instance scopes of every class and value type
    ///
    /// # Errors
    ///
    /// Returns an error if a type redeclares an inherited instance variable
    pub fn instance_scopes(&self) -> Result<InstanceScopes> {
        InstanceScopes::build(&self.package)
            .map_err(|error| anyhow::anyhow!(error.render(&self.interner)))
    }
}
