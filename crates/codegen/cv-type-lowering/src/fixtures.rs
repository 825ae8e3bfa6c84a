//! Sample package shared by the unit tests

use cv_intern::Interner;
use cv_span::{FileId, FileSpan};
use cv_types::{Function, FunctionId, FunctionKind, Package, Type, TypeDefId, TypeDefinition};

pub struct Shapes {
    pub interner: Interner,
    pub package: Package,
    pub printable: TypeDefId,
    pub hashable: TypeDefId,
    pub drawable: TypeDefId,
    pub shape: TypeDefId,
    pub circle: TypeDefId,
    pub list: TypeDefId,
    pub point: TypeDefId,
    pub pair: TypeDefId,
    pub color: TypeDefId,
    pub shape_area: FunctionId,
    pub shape_draw: FunctionId,
    pub circle_area: FunctionId,
    pub circle_scale: FunctionId,
}

pub fn span() -> FileSpan {
    FileSpan::synthetic(FileId(0))
}

pub fn bytes(package: &mut Package, name: &str, count: usize) -> TypeDefId {
    let interner = package.interner().clone();
    let mut definition = TypeDefinition::value_type(interner.intern(name), span());
    for index in 0..count {
        let field = interner.intern(&format!("b{index}"));
        definition = definition.with_instance_variable(field, Type::byte(), false);
    }
    package.add_type_definition(definition).unwrap()
}

pub fn shapes() -> Shapes {
    let interner = Interner::new();
    let mut package = Package::new(interner.clone());
    let name = |text: &str| interner.intern(text);

    let printable = package
        .add_type_definition(TypeDefinition::protocol(name("Printable"), span()))
        .unwrap();
    let hashable = package
        .add_type_definition(TypeDefinition::protocol(name("Hashable"), span()))
        .unwrap();
    let drawable = package
        .add_type_definition(TypeDefinition::protocol(name("Drawable"), span()))
        .unwrap();

    let shape = package
        .add_type_definition(
            TypeDefinition::class(name("Shape"), span())
                .with_instance_variable(name("id"), Type::integer(), false)
                .with_conformance(Type::protocol(printable, vec![])),
        )
        .unwrap();
    let circle = package
        .add_type_definition(
            TypeDefinition::class(name("Circle"), span())
                .with_superclass(Type::class(shape, vec![]))
                .with_instance_variable(name("radius"), Type::real(), true)
                .with_conformance(Type::protocol(drawable, vec![])),
        )
        .unwrap();
    let list = package
        .add_type_definition(
            TypeDefinition::class(name("List"), span())
                .with_generic_params(vec![name("Element")])
                .with_instance_variable(name("count"), Type::integer(), true)
                .with_instance_variable(name("first"), Type::type_param(TypeDefId(5), 0), true),
        )
        .unwrap();
    let point = package
        .add_type_definition(
            TypeDefinition::value_type(name("Point"), span())
                .with_instance_variable(name("x"), Type::real(), false)
                .with_instance_variable(name("y"), Type::real(), false)
                .with_conformance(Type::protocol(hashable, vec![])),
        )
        .unwrap();
    let pair = package
        .add_type_definition(
            TypeDefinition::value_type(name("Pair"), span())
                .with_generic_params(vec![name("A"), name("B")])
                .with_instance_variable(name("first"), Type::type_param(TypeDefId(7), 0), false)
                .with_instance_variable(name("second"), Type::type_param(TypeDefId(7), 1), false),
        )
        .unwrap();
    let color = package
        .add_type_definition(TypeDefinition::enumeration(
            name("Color"),
            vec![name("red"), name("green")],
            span(),
        ))
        .unwrap();

    let shape_area = package.add_function(
        Function::new(name("area"), FunctionKind::ObjectMethod, Type::real(), span())
            .with_owner(shape),
    );
    let shape_draw = package.add_function(
        Function::new(name("draw"), FunctionKind::ObjectMethod, Type::NoReturn, span())
            .with_owner(shape),
    );
    let circle_area = package.add_function(
        Function::new(name("area"), FunctionKind::ObjectMethod, Type::real(), span())
            .with_owner(circle),
    );
    let circle_scale = package.add_function(
        Function::new(name("scale"), FunctionKind::ObjectMethod, Type::NoReturn, span())
            .with_owner(circle)
            .with_parameter(name("factor"), Type::real(), false),
    );

    Shapes {
        interner,
        package,
        printable,
        hashable,
        drawable,
        shape,
        circle,
        list,
        point,
        pair,
        color,
        shape_area,
        shape_draw,
        circle_area,
        circle_scale,
    }
}
