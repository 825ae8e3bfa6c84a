//! The type lowering engine

use crate::core_types::{CoreTypes, managable};
use crate::dispatch::DispatchTable;
use crate::error::{LoweringError, LoweringResult};
use crate::options::LoweringOptions;
use crate::reification::{ReificationContext, ReificationGuard};
use cv_lir::{BackendType, DataLayout, FunctionSignature, TbaaNodeId, TbaaTree};
use cv_types::{GenericOwner, Package, Primitive, Type, TypeDefId, TypeDefinitionKind};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Maps semantic types of one package to backend representations
///
/// One engine exists per compiled package. Every lowered type is cached under
/// its resolved form, so repeated queries return identical layouts and a cached
/// entry never changes once produced.
#[derive(Debug)]
pub struct TypeLowering<'pkg> {
    pub(crate) package: &'pkg Package,
    pub(crate) options: LoweringOptions,
    pub(crate) layout: DataLayout,
    pub(crate) core: CoreTypes,
    pub(crate) reification: Option<ReificationContext>,
    types: FxHashMap<Type, BackendType>,
    objects: IndexMap<Type, BackendType>,
    pub(crate) dispatch_tables: FxHashMap<TypeDefId, Arc<DispatchTable>>,
    pub(crate) tbaa: TbaaTree,
    pub(crate) tbaa_nodes: FxHashMap<(Type, bool), TbaaNodeId>,
}

#[allow(
    clippy::multiple_inherent_impl,
    reason = "engine queries are grouped by the layout they produce"
)]
impl<'pkg> TypeLowering<'pkg> {
    /// Create the engine for `package`, building the runtime layouts
    pub fn new(package: &'pkg Package, options: LoweringOptions) -> Self {
        let core = CoreTypes::new(&options);
        tracing::debug!(
            box_type = %core.box_type,
            capacity = options.box_capacity(),
            "built core types"
        );
        Self {
            package,
            options,
            layout: options.data_layout(),
            core,
            reification: None,
            types: FxHashMap::default(),
            objects: IndexMap::new(),
            dispatch_tables: FxHashMap::default(),
            tbaa: TbaaTree::new("corvid"),
            tbaa_nodes: FxHashMap::default(),
        }
    }

    /// Package whose types are lowered
    pub fn package(&self) -> &'pkg Package {
        self.package
    }

    /// Options the engine was built with
    pub fn options(&self) -> &LoweringOptions {
        &self.options
    }

    /// Target data layout
    pub fn data_layout(&self) -> &DataLayout {
        &self.layout
    }

    /// All runtime layouts
    pub fn core_types(&self) -> &CoreTypes {
        &self.core
    }

    /// The uniform box
    pub fn box_type(&self) -> &BackendType {
        &self.core.box_type
    }

    /// Identifies the content of a box
    pub fn box_info(&self) -> &BackendType {
        &self.core.box_info
    }

    /// Per-class metadata: dispatch table, superclass info, conformances
    pub fn class_info(&self) -> &BackendType {
        &self.core.class_info
    }

    /// Conformance table header
    pub fn protocol_conformance(&self) -> &BackendType {
        &self.core.protocol_conformance
    }

    /// One (type, protocol) conformance
    pub fn protocol_conformance_entry(&self) -> &BackendType {
        &self.core.protocol_conformance_entry
    }

    /// Function pointer with capture storage
    pub fn callable(&self) -> &BackendType {
        &self.core.callable
    }

    /// Callable held remotely by a box
    pub fn callable_box_capture(&self) -> &BackendType {
        &self.core.callable_box_capture
    }

    /// Reified type: run-time type info plus optional flag
    pub fn type_description(&self) -> &BackendType {
        &self.core.type_description
    }

    /// Layout of run-time type info records
    pub fn run_time_type_info(&self) -> &BackendType {
        &self.core.run_time_type_info
    }

    /// Any class instance
    pub fn someobject(&self) -> &BackendType {
        &self.core.someobject
    }

    /// Retain or release function stored in box info
    pub fn box_retain_release(&self) -> &FunctionSignature {
        &self.core.box_retain_release
    }

    /// Deinitializer of escaping capture storage
    pub fn capture_deinit(&self) -> &FunctionSignature {
        &self.core.capture_deinit
    }

    /// Wrap `payload` behind a control block pointer
    pub fn managable(&self, payload: BackendType) -> BackendType {
        managable(payload)
    }

    /// Context currently resolving generic parameters
    pub fn reification_context(&self) -> Option<&ReificationContext> {
        self.reification.as_ref()
    }

    /// Install `context` until the returned guard is dropped
    pub fn enter_reification_context(
        &mut self,
        context: ReificationContext,
    ) -> ReificationGuard<'_, 'pkg> {
        ReificationGuard::new(self, context)
    }

    /// Run `operation` with `context` installed
    ///
    /// The previous context is reinstalled afterwards, also when `operation`
    /// returns an error or panics.
    pub fn with_reification_context<R>(
        &mut self,
        context: ReificationContext,
        operation: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let mut guard = self.enter_reification_context(context);
        operation(&mut *guard)
    }

    /// Apply the installed context to `ty`
    pub fn resolve(&self, ty: &Type) -> Type {
        match &self.reification {
            Some(context) => context.resolve(ty),
            None => ty.clone(),
        }
    }

    /// Source rendering of a type, for names and messages
    pub fn display(&self, ty: &Type) -> String {
        self.package.display(ty)
    }

    /// Backend representation of `ty`
    ///
    /// # Panics
    ///
    /// Panics if `ty` has no representation, which type checking rules out.
    pub fn backend_type_for(&mut self, ty: &Type) -> BackendType {
        expect_lowered(self.try_backend_type_for(ty))
    }

    /// Backend representation of `ty`
    ///
    /// Generic parameters mapped by the installed context are replaced first.
    /// Parameters that stay unresolved are erased to the box.
    ///
    /// # Errors
    ///
    /// Fails for types naming missing or mismatched definitions and for generic
    /// types applied to the wrong number of arguments.
    pub fn try_backend_type_for(&mut self, ty: &Type) -> LoweringResult<BackendType> {
        let resolved = self.resolve(ty);
        self.lower_resolved(&resolved)
    }

    pub(crate) fn lower_resolved(&mut self, ty: &Type) -> LoweringResult<BackendType> {
        if let Some(found) = self.types.get(ty) {
            return Ok(found.clone());
        }
        let lowered = self.lower_uncached(ty)?;
        tracing::debug!(ty = %self.display(ty), lowered = %lowered, "lowered type");
        self.types.insert(ty.clone(), lowered.clone());
        Ok(lowered)
    }

    fn lower_uncached(&mut self, ty: &Type) -> LoweringResult<BackendType> {
        let lowered = match ty {
            Type::Primitive(primitive) => match primitive {
                Primitive::Integer => BackendType::I64,
                Primitive::Real => BackendType::Double,
                Primitive::Boolean => BackendType::I1,
                Primitive::Byte => BackendType::I8,
                Primitive::Symbol => BackendType::I32,
            },
            Type::NoReturn => BackendType::Void,
            Type::Class { def, args } => {
                self.check_class(ty, *def, args)?;
                BackendType::Ptr
            }
            Type::Someobject => self.core.someobject.clone(),
            Type::Enum { def } => {
                if !matches!(self.kind_of(*def), Some(TypeDefinitionKind::Enum { .. })) {
                    return Err(self.unresolved(ty));
                }
                BackendType::I64
            }
            Type::ValueType { def, args } => self.value_type_layout(ty, *def, args)?,
            Type::Protocol { def, args } => {
                if !matches!(self.kind_of(*def), Some(TypeDefinitionKind::Protocol { .. })) {
                    return Err(self.unresolved(ty));
                }
                self.check_arity(ty, *def, args)?;
                self.core.box_type.clone()
            }
            Type::MultiProtocol(protocols) => {
                for protocol in protocols {
                    self.lower_resolved(protocol)?;
                }
                self.core.box_type.clone()
            }
            Type::Something | Type::GenericParam(_) => self.core.box_type.clone(),
            Type::Optional(inner) => self.optional_layout(ty, inner)?,
            Type::Callable { .. } => self.core.callable.clone(),
        };
        Ok(lowered)
    }

    fn optional_layout(&mut self, ty: &Type, inner: &Type) -> LoweringResult<BackendType> {
        if matches!(inner, Type::NoReturn) {
            return Err(self.unresolved(ty));
        }
        let lowered = self.lower_resolved(inner)?;
        if inner.is_class_like() {
            return Ok(BackendType::Ptr);
        }
        if is_box_represented(inner) {
            return Ok(lowered);
        }
        Ok(BackendType::anonymous_struct(vec![BackendType::I1, lowered]))
    }

    fn value_type_layout(
        &mut self,
        ty: &Type,
        def: TypeDefId,
        args: &[Type],
    ) -> LoweringResult<BackendType> {
        if !matches!(self.kind_of(def), Some(TypeDefinitionKind::ValueType)) {
            return Err(self.unresolved(ty));
        }
        self.check_arity(ty, def, args)?;
        let field_types = self.instance_variable_types(def, args);
        let fields = field_types
            .iter()
            .map(|field| self.lower_resolved(field))
            .collect::<LoweringResult<Vec<_>>>()?;
        Ok(BackendType::named_struct(format!("vt.{}", self.display(ty)), fields))
    }

    /// Types of all instance variables of `def` applied to `args`, inherited first
    pub(crate) fn instance_variable_types(&self, def: TypeDefId, args: &[Type]) -> Vec<Type> {
        self.package
            .instance_variables(def)
            .into_iter()
            .map(|(variable, _)| substitute_own(def, args, &variable.ty))
            .collect()
    }

    pub(crate) fn kind_of(&self, def: TypeDefId) -> Option<&'pkg TypeDefinitionKind> {
        self.package.try_definition(def).map(|definition| &definition.kind)
    }

    pub(crate) fn check_class(
        &self,
        ty: &Type,
        def: TypeDefId,
        args: &[Type],
    ) -> LoweringResult<()> {
        if !matches!(self.kind_of(def), Some(TypeDefinitionKind::Class { .. })) {
            return Err(LoweringError::NotAClass { ty: self.display(ty) });
        }
        self.check_arity(ty, def, args)
    }

    fn check_arity(&self, ty: &Type, def: TypeDefId, args: &[Type]) -> LoweringResult<()> {
        let expected = self
            .package
            .try_definition(def)
            .map_or(0, |definition| definition.generic_params.len());
        if expected == args.len() {
            Ok(())
        } else {
            Err(LoweringError::GenericArityMismatch {
                ty: self.display(ty),
                expected,
                found: args.len(),
            })
        }
    }

    pub(crate) fn unresolved(&self, ty: &Type) -> LoweringError {
        LoweringError::UnresolvedType { ty: self.display(ty) }
    }

    /// Whether values of `ty` travel inside the uniform box
    pub fn is_box_represented(&self, ty: &Type) -> bool {
        is_box_represented(&self.resolve(ty))
    }

    /// Whether values of `ty` are always a pointer that can be dereferenced
    pub fn is_dereferenceable(&self, ty: &Type) -> bool {
        matches!(self.resolve(ty), Type::Class { .. } | Type::Someobject)
    }

    /// Whether a boxed value of `ty` must live on the heap
    ///
    /// # Panics
    ///
    /// Panics if `ty` has no representation.
    pub fn is_remote(&mut self, ty: &Type) -> bool {
        expect_lowered(self.try_is_remote(ty))
    }

    /// Whether a boxed value of `ty` must live on the heap
    ///
    /// True when the representation is larger than the inline payload of a
    /// box. Values that are boxes already are never remote.
    ///
    /// # Errors
    ///
    /// Fails if `ty` has no representation.
    pub fn try_is_remote(&mut self, ty: &Type) -> LoweringResult<bool> {
        let resolved = self.resolve(ty);
        if is_box_represented(&resolved) {
            return Ok(false);
        }
        let lowered = self.lower_resolved(&resolved)?;
        Ok(self.layout.size_of(&lowered) > self.options.box_capacity())
    }

    /// Whether instances of `ty` store a type description of their generic arguments
    ///
    /// This holds for classes whose superclass chain declares any generic
    /// parameter.
    pub fn stores_generic_args(&self, ty: &Type) -> bool {
        match self.resolve(ty) {
            Type::Class { def, .. } => self.class_has_generics(def),
            _ => false,
        }
    }

    fn class_has_generics(&self, def: TypeDefId) -> bool {
        if !matches!(self.kind_of(def), Some(TypeDefinitionKind::Class { .. })) {
            return false;
        }
        self.package
            .superclass_chain(def)
            .any(|ancestor| !self.package.definition(ancestor).generic_params.is_empty())
    }

    /// Number of header fields preceding the instance variables of a class object
    pub(crate) fn object_header_len(&self, def: TypeDefId) -> usize {
        if self.class_has_generics(def) { 3 } else { 2 }
    }

    /// Memory layout of an instance of the class `ty`
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not a well-formed class type.
    pub fn object_layout(&mut self, ty: &Type) -> BackendType {
        expect_lowered(self.try_object_layout(ty))
    }

    /// Memory layout of an instance of the class `ty`
    ///
    /// `{ ptr control, ptr class_info, [ptr type_description], variables... }`,
    /// with inherited instance variables before the class's own.
    ///
    /// # Errors
    ///
    /// Fails if `ty` is not a class or one of its variables cannot be lowered.
    pub fn try_object_layout(&mut self, ty: &Type) -> LoweringResult<BackendType> {
        let resolved = self.resolve(ty);
        let Type::Class { def, args } = &resolved else {
            return Err(LoweringError::NotAClass { ty: self.display(&resolved) });
        };
        self.check_class(&resolved, *def, args)?;
        if let Some(found) = self.objects.get(&resolved) {
            return Ok(found.clone());
        }

        let mut fields = vec![BackendType::Ptr; self.object_header_len(*def)];
        for field in self.instance_variable_types(*def, args) {
            fields.push(self.lower_resolved(&field)?);
        }
        let layout =
            BackendType::named_struct(format!("class.{}", self.display(&resolved)), fields);
        tracing::debug!(layout = %layout, "built object layout");
        self.objects.insert(resolved, layout.clone());
        Ok(layout)
    }

    /// Object layouts built so far, in creation order
    pub fn object_layouts(&self) -> impl Iterator<Item = (&Type, &BackendType)> {
        self.objects.iter()
    }
}

/// Whether a resolved type is represented by the box
pub(crate) fn is_box_represented(ty: &Type) -> bool {
    match ty {
        Type::Protocol { .. }
        | Type::MultiProtocol(_)
        | Type::Something
        | Type::GenericParam(_) => true,
        Type::Optional(inner) => is_box_represented(inner),
        _ => false,
    }
}

/// Replace the generic parameters of `def` inside `ty` with `args`
pub(crate) fn substitute_own(def: TypeDefId, args: &[Type], ty: &Type) -> Type {
    ty.substitute(&|param| {
        if param.owner == GenericOwner::Type(def) {
            args.get(param.index as usize).cloned()
        } else {
            None
        }
    })
}

#[track_caller]
#[expect(
    clippy::panic,
    reason = "lowering errors are unreachable for type-checked input and abort the compilation"
)]
pub(crate) fn expect_lowered<T>(result: LoweringResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("internal lowering error: {error}"),
    }
}
