//! Plain-text summary of how a package lowers, for snapshot tests

use anyhow::Result;
use cv_lir::BackendType;
use cv_type_lowering::TypeLowering;
use cv_types::{FunctionId, Package, Type, TypeDefId, TypeDefinitionKind};
use std::fmt::Write as _;

/// `def` applied to its own generic parameters
pub fn own_type(package: &Package, def: TypeDefId) -> Type {
    let definition = package.definition(def);
    let args = (0..definition.generic_params.len() as u32)
        .map(|index| Type::type_param(def, index))
        .collect();
    match &definition.kind {
        TypeDefinitionKind::Class { .. } => Type::class(def, args),
        TypeDefinitionKind::ValueType => Type::value_type(def, args),
        TypeDefinitionKind::Protocol { .. } => Type::protocol(def, args),
        TypeDefinitionKind::Enum { .. } => Type::Enum { def },
    }
}

/// Name of a function, qualified by its owner
pub fn function_name(package: &Package, id: FunctionId) -> String {
    let function = package.function(id);
    let name = package.interner().resolve(&function.name);
    match function.owner {
        Some(owner) => {
            let owner = package.interner().resolve(&package.definition(owner).name);
            format!("{owner}.{name}")
        }
        None => name,
    }
}

fn struct_definition(layout: &BackendType) -> String {
    layout
        .as_struct()
        .map_or_else(|| layout.to_string(), |st| st.definition())
}

/// Describe every definition and function of the package
///
/// # Errors
///
/// Returns an error if a definition cannot be lowered
pub fn layout_report(lowering: &mut TypeLowering<'_>) -> Result<String> {
    let package = lowering.package();
    let mut out = String::new();

    for (def, definition) in package.definitions() {
        let ty = own_type(package, def);
        let name = lowering.display(&ty);
        match &definition.kind {
            TypeDefinitionKind::Protocol { protocol_index } => {
                writeln!(out, "protocol {name} (index {protocol_index})")?;
                continue;
            }
            TypeDefinitionKind::Enum { .. } => {
                writeln!(out, "enum {name}: {}", lowering.try_backend_type_for(&ty)?)?;
                continue;
            }
            TypeDefinitionKind::Class { .. } => {
                writeln!(out, "class {name}")?;
                let layout = lowering.try_object_layout(&ty)?;
                writeln!(out, "  layout: {}", struct_definition(&layout))?;
                let table = lowering.try_dispatch_table(def)?;
                let slots = table
                    .slots()
                    .iter()
                    .map(|&method| function_name(package, method))
                    .collect::<Vec<_>>();
                writeln!(out, "  dispatch: [{}]", slots.join(", "))?;
            }
            TypeDefinitionKind::ValueType => {
                writeln!(out, "value {name}")?;
                let layout = lowering.try_backend_type_for(&ty)?;
                writeln!(out, "  layout: {}", struct_definition(&layout))?;
                writeln!(
                    out,
                    "  size: {}, remote: {}",
                    lowering.data_layout().size_of(&layout),
                    lowering.try_is_remote(&ty)?
                )?;
            }
        }

        let info = lowering.try_run_time_type_info_for(&ty)?;
        writeln!(
            out,
            "  rtti: {:?}, own {}, offset {}",
            info.flag, info.own_generic_count, info.generic_offset
        )?;
        let slots = lowering.conformance_slots(def);
        if !slots.is_empty() {
            let protocols = (0..slots.len())
                .map(|slot| {
                    slots.protocol_at(slot).map_or_else(
                        || "_".to_string(),
                        |protocol| package.interner().resolve(&package.definition(protocol).name),
                    )
                })
                .collect::<Vec<_>>();
            writeln!(
                out,
                "  conformances from {}: [{}]",
                slots.lowest_index(),
                protocols.join(", ")
            )?;
        }
    }

    for (id, function) in package.functions() {
        let signature = lowering.try_function_signature_for(function)?;
        writeln!(out, "fn {}: {signature}", function_name(package, id))?;
    }
    Ok(out)
}
