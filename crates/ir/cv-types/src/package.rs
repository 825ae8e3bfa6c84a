//! Package-wide definition tables

use crate::definition::{InstanceVariable, TypeDefId, TypeDefinition, TypeDefinitionKind};
use crate::error::{DefinitionError, DefinitionResult};
use crate::function::{Function, FunctionId};
use crate::ty::{GenericOwner, GenericParamRef, Type};
use cv_intern::{Interner, Symbol};
use std::iter;

/// All type definitions and functions of one compiled package
///
/// Definitions are registered in dependency order: a superclass or protocol must
/// be registered before anything that refers to it. Since a definition can only
/// name definitions with a lower id, superclass chains are acyclic by
/// construction.
#[derive(Debug, Clone)]
pub struct Package {
    interner: Interner,
    definitions: Vec<TypeDefinition>,
    functions: Vec<Function>,
    protocol_count: u32,
}

impl Package {
    /// Create an empty package whose names live in `interner`
    pub fn new(interner: Interner) -> Self {
        Self {
            interner,
            definitions: Vec::new(),
            functions: Vec::new(),
            protocol_count: 0,
        }
    }

    /// Interner holding every name of the package
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Register a type definition
    ///
    /// # Errors
    ///
    /// Fails if the superclass or a conformance refers to a definition that is not
    /// registered yet or has the wrong kind.
    pub fn add_type_definition(
        &mut self,
        mut definition: TypeDefinition,
    ) -> DefinitionResult<TypeDefId> {
        if let Some(superclass) = definition.superclass() {
            self.validate_superclass(&definition, superclass)?;
        }
        for protocol in &definition.conformances {
            self.validate_conformance(&definition, protocol)?;
        }
        if let TypeDefinitionKind::Protocol { protocol_index } = &mut definition.kind {
            *protocol_index = self.protocol_count;
            self.protocol_count += 1;
        }

        let id = TypeDefId(self.definitions.len() as u32);
        self.definitions.push(definition);
        Ok(id)
    }

    fn validate_superclass(
        &self,
        definition: &TypeDefinition,
        superclass: &Type,
    ) -> DefinitionResult<()> {
        let class = self.interner.resolve(&definition.name);
        let Some(def) = superclass.type_definition() else {
            return Err(DefinitionError::SuperclassNotAClass {
                class,
                superclass: self.display(superclass),
                span: definition.span,
            });
        };
        match self.definitions.get(def.0 as usize) {
            None => Err(DefinitionError::UnknownSuperclass {
                class,
                span: definition.span,
            }),
            Some(existing) if !existing.is_class() || !matches!(superclass, Type::Class { .. }) => {
                Err(DefinitionError::SuperclassNotAClass {
                    class,
                    superclass: self.display(superclass),
                    span: definition.span,
                })
            }
            Some(_) => Ok(()),
        }
    }

    fn validate_conformance(
        &self,
        definition: &TypeDefinition,
        protocol: &Type,
    ) -> DefinitionResult<()> {
        let ty = self.interner.resolve(&definition.name);
        let existing = protocol
            .type_definition()
            .and_then(|def| self.definitions.get(def.0 as usize));
        match existing {
            None if protocol.type_definition().is_some() => Err(DefinitionError::UnknownProtocol {
                ty,
                span: definition.span,
            }),
            Some(existing)
                if existing.is_protocol() && matches!(protocol, Type::Protocol { .. }) =>
            {
                Ok(())
            }
            _ => Err(DefinitionError::NotAProtocol {
                ty,
                protocol: self.display(protocol),
                span: definition.span,
            }),
        }
    }

    /// Register a function; methods are appended to their owner's method list
    pub fn add_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        if let Some(owner) = function.owner {
            if let Some(definition) = self.definitions.get_mut(owner.0 as usize) {
                definition.methods.push(id);
            }
        }
        self.functions.push(function);
        id
    }

    /// Look up a type definition
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this package.
    pub fn definition(&self, id: TypeDefId) -> &TypeDefinition {
        &self.definitions[id.0 as usize]
    }

    /// Look up a type definition that may not exist
    pub fn try_definition(&self, id: TypeDefId) -> Option<&TypeDefinition> {
        self.definitions.get(id.0 as usize)
    }

    /// Look up a function
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this package.
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    /// All definitions with their ids, in registration order
    pub fn definitions(&self) -> impl Iterator<Item = (TypeDefId, &TypeDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| (TypeDefId(index as u32), definition))
    }

    /// All functions with their ids, in registration order
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(index, function)| (FunctionId(index as u32), function))
    }

    /// Number of registered protocols
    pub fn protocol_count(&self) -> u32 {
        self.protocol_count
    }

    /// Direct superclass of a class
    pub fn superclass(&self, id: TypeDefId) -> Option<TypeDefId> {
        self.definition(id)
            .superclass()
            .and_then(Type::type_definition)
    }

    /// The class itself followed by its superclasses, nearest first
    pub fn superclass_chain(&self, id: TypeDefId) -> impl Iterator<Item = TypeDefId> + '_ {
        iter::successors(Some(id), move |current| self.superclass(*current))
    }

    /// Number of generic parameters declared along the superclass chain, excluding `id`
    pub fn inherited_generic_count(&self, id: TypeDefId) -> usize {
        self.superclass_chain(id)
            .skip(1)
            .map(|ancestor| self.definition(ancestor).generic_params.len())
            .sum()
    }

    /// Instance variables of a class or value type, including inherited ones
    ///
    /// Superclass variables come first, root class first. Their types are
    /// rewritten in terms of `id`'s own generic parameters. The flag is `true`
    /// for inherited variables.
    pub fn instance_variables(&self, id: TypeDefId) -> Vec<(InstanceVariable, bool)> {
        let mut collected = Vec::new();
        self.collect_instance_variables(id, None, false, &mut collected);
        collected
    }

    fn collect_instance_variables(
        &self,
        id: TypeDefId,
        args: Option<&[Type]>,
        inherited: bool,
        out: &mut Vec<(InstanceVariable, bool)>,
    ) {
        let definition = self.definition(id);
        let substitute = |ty: &Type| match args {
            Some(args) => ty.substitute(&|param: GenericParamRef| {
                if param.owner == GenericOwner::Type(id) {
                    args.get(param.index as usize).cloned()
                } else {
                    None
                }
            }),
            None => ty.clone(),
        };

        if let Some(superclass) = definition.superclass()
            && let Some(super_def) = superclass.type_definition()
        {
            let super_args: Vec<Type> =
                superclass.generic_arguments().iter().map(&substitute).collect();
            self.collect_instance_variables(super_def, Some(&super_args), true, out);
        }
        for variable in &definition.instance_variables {
            let rewritten = InstanceVariable {
                ty: substitute(&variable.ty),
                ..variable.clone()
            };
            out.push((rewritten, inherited));
        }
    }

    /// Name of a generic parameter
    pub fn generic_param_name(&self, param: GenericParamRef) -> Option<Symbol> {
        let names = match param.owner {
            GenericOwner::Type(def) => &self.definitions.get(def.0 as usize)?.generic_params,
            GenericOwner::Function(function) => {
                &self.functions.get(function.0 as usize)?.generic_params
            }
        };
        names.get(param.index as usize).copied()
    }

    /// Render a type the way it is written in source
    pub fn display(&self, ty: &Type) -> String {
        let list = |types: &[Type], separator: &str| -> String {
            types
                .iter()
                .map(|ty| self.display(ty))
                .collect::<Vec<_>>()
                .join(separator)
        };
        let nominal = |def: TypeDefId, args: &[Type]| -> String {
            let name = self
                .definitions
                .get(def.0 as usize)
                .map_or_else(
                    || format!("#{}", def.0),
                    |definition| self.interner.resolve(&definition.name),
                );
            if args.is_empty() {
                name
            } else {
                format!("{name}<{}>", list(args, ", "))
            }
        };

        match ty {
            Type::Primitive(primitive) => primitive.name().to_string(),
            Type::Class { def, args }
            | Type::ValueType { def, args }
            | Type::Protocol { def, args } => nominal(*def, args),
            Type::Enum { def } => nominal(*def, &[]),
            Type::MultiProtocol(protocols) => format!("({})", list(protocols, " & ")),
            Type::Optional(inner) => format!("{}?", self.display(inner)),
            Type::Callable { params, ret } => {
                format!("fn({}) -> {}", list(params, ", "), self.display(ret))
            }
            Type::GenericParam(param) => self
                .generic_param_name(*param)
                .map_or_else(|| format!("T{}", param.index), |name| self.interner.resolve(&name)),
            Type::Someobject => "Someobject".to_string(),
            Type::Something => "Something".to_string(),
            Type::NoReturn => "NoReturn".to_string(),
        }
    }
}
