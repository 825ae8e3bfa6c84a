//! Package manifests
//!
//! A manifest describes the definitions and functions of a test package in
//! TOML. Types are written the way they are displayed, e.g. `List<Element>?`,
//! `(Printable & Hashable)` or `fn(Integer) -> Real`.

use anyhow::{Context as _, Result, bail};
use cv_intern::Interner;
use cv_span::{FileId, FileSpan};
use cv_types::{
    Function, FunctionId, FunctionKind, GenericOwner, GenericParamRef, Package, Primitive, Type,
    TypeDefId, TypeDefinition,
};
use indexmap::IndexMap;
use serde::Deserialize;

/// Top-level manifest
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Type definitions in registration order
    #[serde(default, rename = "type")]
    pub types: Vec<TypeEntry>,
    /// Functions in registration order
    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionEntry>,
}

/// Kind of a type definition entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    /// `class`
    Class,
    /// `value-type`
    ValueType,
    /// `enum`
    Enum,
    /// `protocol`
    Protocol,
}

/// One type definition
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeEntry {
    /// Declared name
    pub name: String,
    /// Kind of definition
    pub kind: EntryKind,
    /// Own generic parameter names
    #[serde(default)]
    pub generics: Vec<String>,
    /// Superclass, for classes
    pub superclass: Option<String>,
    /// Protocols the definition conforms to
    #[serde(default)]
    pub conforms: Vec<String>,
    /// Enum cases
    #[serde(default)]
    pub cases: Vec<String>,
    /// Own instance variables
    #[serde(default, rename = "field")]
    pub fields: Vec<VariableEntry>,
}

/// An instance variable or parameter
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableEntry {
    /// Name
    pub name: String,
    /// Declared type
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether it may be reassigned
    #[serde(default)]
    pub mutable: bool,
}

/// One function
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionEntry {
    /// Declared name
    pub name: String,
    /// Kind of callable
    pub kind: FunctionKindEntry,
    /// Type the function belongs to
    pub owner: Option<String>,
    /// Own generic parameter names
    #[serde(default)]
    pub generics: Vec<String>,
    /// Return type
    #[serde(default = "no_return")]
    pub returns: String,
    /// Error type, for functions that can raise
    pub raises: Option<String>,
    /// Declared parameters
    #[serde(default, rename = "param")]
    pub params: Vec<VariableEntry>,
}

fn no_return() -> String {
    "NoReturn".to_string()
}

/// Manifest spelling of [`FunctionKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionKindEntry {
    /// `function`
    Function,
    /// `object-method`
    ObjectMethod,
    /// `object-initializer`
    ObjectInitializer,
    /// `deinitializer`
    Deinitializer,
    /// `value-type-method`
    ValueTypeMethod,
    /// `value-type-initializer`
    ValueTypeInitializer,
    /// `class-method`
    ClassMethod,
    /// `closure`
    Closure,
}

impl From<FunctionKindEntry> for FunctionKind {
    fn from(kind: FunctionKindEntry) -> Self {
        match kind {
            FunctionKindEntry::Function => Self::Function,
            FunctionKindEntry::ObjectMethod => Self::ObjectMethod,
            FunctionKindEntry::ObjectInitializer => Self::ObjectInitializer,
            FunctionKindEntry::Deinitializer => Self::Deinitializer,
            FunctionKindEntry::ValueTypeMethod => Self::ValueTypeMethod,
            FunctionKindEntry::ValueTypeInitializer => Self::ValueTypeInitializer,
            FunctionKindEntry::ClassMethod => Self::ClassMethod,
            FunctionKindEntry::Closure => Self::Closure,
        }
    }
}

/// A package built from a manifest, with its names
#[derive(Debug)]
pub struct LoadedPackage {
    /// The package
    pub package: Package,
    /// Definition ids by name
    pub types: IndexMap<String, TypeDefId>,
    /// Function ids by `Owner.name`, or `name` for free functions
    pub functions: IndexMap<String, FunctionId>,
}

impl Manifest {
    /// Parse a manifest
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is not a valid manifest.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid package manifest")
    }

    /// Register every entry in a fresh package
    ///
    /// Definitions get ids in manifest order, so a definition may mention
    /// itself or any definition listed before or after it in field types.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names, malformed types and definitions the
    /// package rejects.
    pub fn load(&self, interner: &Interner, file: FileId) -> Result<LoadedPackage> {
        let span = FileSpan::synthetic(file);
        let kinds: IndexMap<String, (TypeDefId, EntryKind)> = self
            .types
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.name.clone(), (TypeDefId(index as u32), entry.kind)))
            .collect();
        let mut package = Package::new(interner.clone());

        for (index, entry) in self.types.iter().enumerate() {
            let id = TypeDefId(index as u32);
            let parser = TypeParser {
                definitions: &kinds,
                generics: vec![(GenericOwner::Type(id), entry.generics.as_slice())],
            };
            let name = interner.intern(&entry.name);
            let mut definition = match entry.kind {
                EntryKind::Class => TypeDefinition::class(name, span),
                EntryKind::ValueType => TypeDefinition::value_type(name, span),
                EntryKind::Protocol => TypeDefinition::protocol(name, span),
                EntryKind::Enum => {
                    let cases = entry.cases.iter().map(|case| interner.intern(case)).collect();
                    TypeDefinition::enumeration(name, cases, span)
                }
            };
            if !entry.generics.is_empty() {
                let params = entry.generics.iter().map(|param| interner.intern(param)).collect();
                definition = definition.with_generic_params(params);
            }
            if let Some(superclass) = &entry.superclass {
                definition = definition.with_superclass(parser.parse(superclass)?);
            }
            for field in &entry.fields {
                definition = definition.with_instance_variable(
                    interner.intern(&field.name),
                    parser.parse(&field.ty)?,
                    field.mutable,
                );
            }
            for protocol in &entry.conforms {
                definition = definition.with_conformance(parser.parse(protocol)?);
            }
            let registered = package
                .add_type_definition(definition)
                .with_context(|| format!("cannot register `{}`", entry.name))?;
            debug_assert_eq!(registered, id);
        }

        let mut functions = IndexMap::new();
        for (index, entry) in self.functions.iter().enumerate() {
            let id = FunctionId(index as u32);
            let owner = match &entry.owner {
                Some(owner) => Some(
                    kinds
                        .get(owner)
                        .map(|&(def, _)| def)
                        .with_context(|| format!("unknown owner `{owner}` of `{}`", entry.name))?,
                ),
                None => None,
            };
            let owner_generics: &[String] = owner
                .map(|def| self.types[def.0 as usize].generics.as_slice())
                .unwrap_or_default();
            let mut generics = vec![(GenericOwner::Function(id), entry.generics.as_slice())];
            if let Some(def) = owner {
                generics.push((GenericOwner::Type(def), owner_generics));
            }
            let parser = TypeParser {
                definitions: &kinds,
                generics,
            };

            let mut function = Function::new(
                interner.intern(&entry.name),
                entry.kind.into(),
                parser.parse(&entry.returns)?,
                span,
            );
            if let Some(def) = owner {
                function = function.with_owner(def);
            }
            if !entry.generics.is_empty() {
                let params = entry.generics.iter().map(|param| interner.intern(param)).collect();
                function = function.with_generic_params(params);
            }
            for param in &entry.params {
                function = function.with_parameter(
                    interner.intern(&param.name),
                    parser.parse(&param.ty)?,
                    param.mutable,
                );
            }
            if let Some(raises) = &entry.raises {
                function = function.with_error_type(parser.parse(raises)?);
            }

            let registered = package.add_function(function);
            let key = match &entry.owner {
                Some(owner) => format!("{owner}.{}", entry.name),
                None => entry.name.clone(),
            };
            functions.insert(key, registered);
        }

        let types = kinds.into_iter().map(|(name, (id, _))| (name, id)).collect();
        Ok(LoadedPackage {
            package,
            types,
            functions,
        })
    }
}

/// Parses type expressions against the names of one manifest
struct TypeParser<'defs> {
    definitions: &'defs IndexMap<String, (TypeDefId, EntryKind)>,
    /// Generic parameters in scope, innermost owner first
    generics: Vec<(GenericOwner, &'defs [String])>,
}

impl TypeParser<'_> {
    fn parse(&self, source: &str) -> Result<Type> {
        let mut cursor = Cursor { source, position: 0 };
        let ty = self
            .parse_type(&mut cursor)
            .with_context(|| format!("in type `{source}`"))?;
        cursor.skip_whitespace();
        if !cursor.at_end() {
            bail!("unexpected `{}` in type `{source}`", cursor.rest());
        }
        Ok(ty)
    }

    fn parse_type(&self, cursor: &mut Cursor<'_>) -> Result<Type> {
        let mut ty = if cursor.eat('(') {
            let protocols = self.parse_list(cursor, '&', ')')?;
            Type::multi_protocol(protocols)
        } else {
            let name = cursor.identifier()?;
            self.parse_named(cursor, name)?
        };
        while cursor.eat('?') {
            ty = Type::optional(ty);
        }
        Ok(ty)
    }

    fn parse_named(&self, cursor: &mut Cursor<'_>, name: &str) -> Result<Type> {
        let ty = match name {
            "Integer" => Type::integer(),
            "Real" => Type::real(),
            "Boolean" => Type::boolean(),
            "Byte" => Type::byte(),
            "Symbol" => Type::Primitive(Primitive::Symbol),
            "Something" => Type::Something,
            "Someobject" => Type::Someobject,
            "NoReturn" => Type::NoReturn,
            "fn" => {
                if !cursor.eat('(') {
                    bail!("expected `(` after `fn`");
                }
                let params = self.parse_list(cursor, ',', ')')?;
                if !cursor.eat_str("->") {
                    bail!("expected `->` after callable parameters");
                }
                let ret = self.parse_type(cursor)?;
                Type::callable(params, ret)
            }
            _ => {
                if let Some(param) = self.generic_param(name) {
                    return Ok(Type::GenericParam(param));
                }
                let &(def, kind) = self
                    .definitions
                    .get(name)
                    .with_context(|| format!("unknown type `{name}`"))?;
                let args = if cursor.eat('<') {
                    self.parse_list(cursor, ',', '>')?
                } else {
                    Vec::new()
                };
                match kind {
                    EntryKind::Class => Type::class(def, args),
                    EntryKind::ValueType => Type::value_type(def, args),
                    EntryKind::Protocol => Type::protocol(def, args),
                    EntryKind::Enum => Type::Enum { def },
                }
            }
        };
        Ok(ty)
    }

    fn parse_list(
        &self,
        cursor: &mut Cursor<'_>,
        separator: char,
        close: char,
    ) -> Result<Vec<Type>> {
        let mut types = Vec::new();
        if cursor.eat(close) {
            return Ok(types);
        }
        loop {
            types.push(self.parse_type(cursor)?);
            if cursor.eat(close) {
                return Ok(types);
            }
            if !cursor.eat(separator) {
                bail!("expected `{separator}` or `{close}`");
            }
        }
    }

    fn generic_param(&self, name: &str) -> Option<GenericParamRef> {
        self.generics.iter().find_map(|(owner, params)| {
            params.iter().position(|param| param == name).map(|index| GenericParamRef {
                owner: *owner,
                index: index as u32,
            })
        })
    }
}

struct Cursor<'src> {
    source: &'src str,
    position: usize,
}

impl<'src> Cursor<'src> {
    fn rest(&self) -> &'src str {
        &self.source[self.position..]
    }

    fn at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.position += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(expected) {
            self.position += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, expected: &str) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(expected) {
            self.position += expected.len();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<&'src str> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            bail!("expected a type name at `{rest}`");
        }
        self.position += len;
        Ok(&rest[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
        [[type]]
        name = "Printable"
        kind = "protocol"

        [[type]]
        name = "Node"
        kind = "class"
        generics = ["Value"]
        conforms = ["Printable"]

        [[type.field]]
        name = "value"
        type = "Value"

        [[type.field]]
        name = "next"
        type = "Node<Value>?"
        mutable = true

        [[function]]
        name = "map"
        kind = "object-method"
        owner = "Node"
        generics = ["Result"]
        returns = "Node<Result>"

        [[function.param]]
        name = "transform"
        type = "fn(Value) -> Result"
    "#;

    #[test]
    fn test_load_generic_class() {
        let interner = Interner::new();
        let loaded = Manifest::from_toml_str(MANIFEST)
            .and_then(|manifest| manifest.load(&interner, FileId(0)))
            .unwrap();
        let node = loaded.types["Node"];
        let map = loaded.functions["Node.map"];

        let next = &loaded.package.definition(node).instance_variables[1];
        assert_eq!(loaded.package.display(&next.ty), "Node<Value>?");
        assert!(next.mutable);

        let function = loaded.package.function(map);
        assert_eq!(
            function.parameters[0].ty,
            Type::callable(vec![Type::type_param(node, 0)], Type::function_param(map, 0))
        );
        assert_eq!(loaded.package.display(&function.return_type), "Node<Result>");
    }

    #[test]
    fn test_multi_protocol_and_errors() {
        let interner = Interner::new();
        let manifest = Manifest::from_toml_str(
            r#"
            [[type]]
            name = "A"
            kind = "protocol"

            [[type]]
            name = "B"
            kind = "protocol"

            [[function]]
            name = "show"
            kind = "function"

            [[function.param]]
            name = "value"
            type = "(B & A)?"
            "#,
        )
        .unwrap();
        let loaded = manifest.load(&interner, FileId(0)).unwrap();
        let show = loaded.package.function(loaded.functions["show"]);
        assert_eq!(loaded.package.display(&show.parameters[0].ty), "(A & B)?");

        let broken = Manifest::from_toml_str(
            r#"
            [[type]]
            name = "Broken"
            kind = "value-type"

            [[type.field]]
            name = "x"
            type = "Missing"
            "#,
        )
        .unwrap();
        let error = broken.load(&interner, FileId(0)).unwrap_err();
        assert!(format!("{error:#}").contains("unknown type `Missing`"));
    }
}
