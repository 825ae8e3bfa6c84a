//! Run-time type information
//!
//! Every type that can be inspected at run time has a [`RunTimeTypeInfo`]
//! record. A [`TypeDescription`] pairs such a record with the descriptions of
//! the generic arguments a concrete instance was created with. Class
//! instances store the arguments of their whole superclass chain: inherited
//! ones first, starting at `generic_offset` for the class's own.

use crate::error::{LoweringError, LoweringResult};
use crate::lowering::{TypeLowering, expect_lowered, substitute_own};
use cv_types::{Type, TypeDefId};

/// Kind of a described type, as stored in the flag byte
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[repr(u8)]
pub enum RunTimeTypeInfoFlag {
    /// Class instance
    Class = 0,
    /// Value stored inline in a box
    ValueType = 1,
    /// Value stored remotely by a box
    ValueTypeRemote = 2,
    /// Protocol
    Protocol = 3,
    /// Callable
    Callable = 4,
}

/// The values of one run-time type info record
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct RunTimeTypeInfo {
    /// Number of generic parameters the type declares itself
    pub own_generic_count: u16,
    /// Position of the own generic arguments among all stored arguments
    pub generic_offset: u16,
    /// Kind of type
    pub flag: RunTimeTypeInfoFlag,
}

/// A concrete type as seen at run time
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct TypeDescription {
    /// Record of the type's definition
    pub info: RunTimeTypeInfo,
    /// Whether the value may be absent
    pub optional: bool,
    /// Descriptions of all generic arguments, inherited ones first
    pub arguments: Vec<TypeDescription>,
}

#[allow(
    clippy::multiple_inherent_impl,
    reason = "engine queries are grouped by the layout they produce"
)]
impl TypeLowering<'_> {
    /// Run-time type info of `ty`
    ///
    /// # Panics
    ///
    /// Panics if `ty` cannot be described at run time.
    pub fn run_time_type_info_for(&mut self, ty: &Type) -> RunTimeTypeInfo {
        expect_lowered(self.try_run_time_type_info_for(ty))
    }

    /// Run-time type info of `ty`; optionals share the record of their wrapped type
    ///
    /// # Errors
    ///
    /// Fails for types without a definite run-time kind: multiprotocols,
    /// `Something`, `NoReturn` and unresolved generic parameters.
    pub fn try_run_time_type_info_for(&mut self, ty: &Type) -> LoweringResult<RunTimeTypeInfo> {
        let resolved = self.resolve(ty);
        self.rtti_resolved(&resolved)
    }

    fn rtti_resolved(&mut self, ty: &Type) -> LoweringResult<RunTimeTypeInfo> {
        let plain = |flag| RunTimeTypeInfo {
            own_generic_count: 0,
            generic_offset: 0,
            flag,
        };
        let info = match ty {
            Type::Class { def, args } => {
                self.check_class(ty, *def, args)?;
                RunTimeTypeInfo {
                    own_generic_count: args.len() as u16,
                    generic_offset: self.package.inherited_generic_count(*def) as u16,
                    flag: RunTimeTypeInfoFlag::Class,
                }
            }
            Type::Someobject => plain(RunTimeTypeInfoFlag::Class),
            Type::ValueType { args, .. } => {
                let remote = self.try_is_remote(ty)?;
                RunTimeTypeInfo {
                    own_generic_count: args.len() as u16,
                    generic_offset: 0,
                    flag: if remote {
                        RunTimeTypeInfoFlag::ValueTypeRemote
                    } else {
                        RunTimeTypeInfoFlag::ValueType
                    },
                }
            }
            Type::Primitive(_) | Type::Enum { .. } => {
                self.lower_resolved(ty)?;
                plain(RunTimeTypeInfoFlag::ValueType)
            }
            Type::Protocol { args, .. } => {
                self.lower_resolved(ty)?;
                RunTimeTypeInfo {
                    own_generic_count: args.len() as u16,
                    generic_offset: 0,
                    flag: RunTimeTypeInfoFlag::Protocol,
                }
            }
            Type::Callable { .. } => plain(RunTimeTypeInfoFlag::Callable),
            Type::Optional(inner) => self.rtti_resolved(inner)?,
            Type::MultiProtocol(_) | Type::Something | Type::NoReturn | Type::GenericParam(_) => {
                return Err(self.unresolved(ty));
            }
        };
        Ok(info)
    }

    /// Full run-time description of `ty`
    ///
    /// # Panics
    ///
    /// Panics if `ty` or one of its generic arguments cannot be described.
    pub fn type_description_for(&mut self, ty: &Type) -> TypeDescription {
        expect_lowered(self.try_type_description_for(ty))
    }

    /// Full run-time description of `ty`
    ///
    /// # Errors
    ///
    /// Fails if `ty` or one of its generic arguments cannot be described.
    pub fn try_type_description_for(&mut self, ty: &Type) -> LoweringResult<TypeDescription> {
        let resolved = self.resolve(ty);
        self.describe_resolved(&resolved)
    }

    fn describe_resolved(&mut self, ty: &Type) -> LoweringResult<TypeDescription> {
        let (optional, concrete) = match ty {
            Type::Optional(inner) => (true, inner.as_ref()),
            _ => (false, ty),
        };
        let info = self.rtti_resolved(concrete)?;
        let argument_types = match concrete {
            Type::Class { def, args } => self.class_generic_arguments(*def, args)?,
            _ => concrete.generic_arguments().to_vec(),
        };
        let arguments = argument_types
            .iter()
            .map(|argument| self.describe_resolved(argument))
            .collect::<LoweringResult<Vec<_>>>()?;
        Ok(TypeDescription {
            info,
            optional,
            arguments,
        })
    }

    /// Generic arguments of a class and its superclasses, root class first
    fn class_generic_arguments(&self, def: TypeDefId, args: &[Type]) -> LoweringResult<Vec<Type>> {
        let definition = self
            .package
            .try_definition(def)
            .ok_or_else(|| LoweringError::NotAClass { ty: format!("#{}", def.0) })?;
        let mut arguments = match definition.superclass() {
            Some(superclass) => {
                let superclass = substitute_own(def, args, superclass);
                match &superclass {
                    Type::Class {
                        def: super_def,
                        args: super_args,
                    } => self.class_generic_arguments(*super_def, super_args)?,
                    _ => return Err(LoweringError::NotAClass { ty: self.display(&superclass) }),
                }
            }
            None => Vec::new(),
        };
        arguments.extend_from_slice(args);
        Ok(arguments)
    }
}
