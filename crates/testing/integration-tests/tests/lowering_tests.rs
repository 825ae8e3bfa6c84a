//! Lowering of whole test packages
//!
//! Each test loads a package from `test-packages/` and checks the layouts,
//! signatures and runtime tables produced for it.

use cv_lir::BackendType;
use cv_type_lowering::{LoweringError, ReificationContext, RunTimeTypeInfoFlag};
use cv_types::{Capture, Type, VariableCapture, VariableId};
use expect_test::expect;
use integration_tests::TestFixture;
use integration_tests::report::layout_report;

#[test]
fn test_shapes_report() {
    let fixture = TestFixture::from_test_package("shapes").unwrap();
    let mut lowering = fixture.lowering();
    let report = layout_report(&mut lowering).unwrap();
    expect![[r#"
        protocol Printable (index 0)
        protocol Hashable (index 1)
        protocol Drawable (index 2)
        class Shape
          layout: %class.Shape = type { ptr, ptr, i64 }
          dispatch: [Shape.area, Shape.draw, Shape.make]
          rtti: Class, own 0, offset 0
          conformances from 0: [Printable]
        class Circle
          layout: %class.Circle = type { ptr, ptr, i64, double }
          dispatch: [Circle.area, Shape.draw, Shape.make, Circle.scale]
          rtti: Class, own 0, offset 0
          conformances from 0: [Printable, _, Drawable]
        value Point
          layout: %vt.Point = type { double, double }
          size: 16, remote: false
          rtti: ValueType, own 0, offset 0
          conformances from 1: [Hashable]
        enum Color: i64
        value Matrix
          layout: %vt.Matrix = type { double, double, double, double, double }
          size: 40, remote: true
          rtti: ValueTypeRemote, own 0, offset 0
        fn Shape.area: double (ptr)
        fn Shape.draw: void (ptr)
        fn Circle.area: double (ptr)
        fn Circle.init: ptr (ptr, double)
        fn Circle.scale: void (ptr, double)
        fn Point.length: double (ptr)
        fn Shape.make: ptr (ptr)
        fn describe: %box (ptr, i64, ptr)
    "#]]
    .assert_eq(&report);
}

#[test]
fn test_collections_report() {
    let fixture = TestFixture::from_test_package("collections").unwrap();
    let mut lowering = fixture.lowering();
    let report = layout_report(&mut lowering).unwrap();
    expect![[r#"
        protocol Sequence<Element> (index 0)
        class Collection<Element>
          layout: %class.Collection<Element> = type { ptr, ptr, ptr, i64 }
          dispatch: []
          rtti: Class, own 1, offset 0
        class List<Item>
          layout: %class.List<Item> = type { ptr, ptr, ptr, i64, %box }
          dispatch: [List.get, List.map]
          rtti: Class, own 1, offset 1
          conformances from 0: [Sequence]
        class IntList
          layout: %class.IntList = type { ptr, ptr, ptr, i64, { i1, i64 }, i8 }
          dispatch: [List.get, List.map]
          rtti: Class, own 0, offset 2
          conformances from 0: [Sequence]
        value Pair<A, B>
          layout: %vt.Pair<A, B> = type { %box, %box }
          size: 80, remote: true
          rtti: ValueTypeRemote, own 2, offset 0
        fn List.get: %box (ptr, i64)
        fn List.map: ptr (ptr, ptr, %callable)
        fn swap: %vt.Pair<B, A> (ptr, %vt.Pair<A, B>)
    "#]]
    .assert_eq(&report);
}

#[test]
fn test_reified_generic_class() {
    let fixture = TestFixture::from_test_package("collections").unwrap();
    let mut lowering = fixture.lowering();
    let list = fixture.def("List");
    let get = fixture.function("List.get").clone();
    let own = fixture.own_type("List");

    let (layout, signature) = lowering.with_reification_context(
        ReificationContext::for_type(list, [Type::real()]),
        |lowering| (lowering.object_layout(&own), lowering.function_signature_for(&get)),
    );
    assert_eq!(
        layout.as_struct().unwrap().definition(),
        "%class.List<Real> = type { ptr, ptr, ptr, i64, { i1, double } }"
    );
    assert_eq!(signature.to_string(), "{ i1, double } (ptr, i64)");

    assert!(lowering.reification_context().is_none());
    assert_eq!(lowering.function_signature_for(&get).to_string(), "%box (ptr, i64)");
}

#[test]
fn test_reified_generic_function() {
    let fixture = TestFixture::from_test_package("collections").unwrap();
    let mut lowering = fixture.lowering();
    let swap_id = fixture.function_id("swap");
    let swap = fixture.function("swap").clone();

    let signature = lowering.with_reification_context(
        ReificationContext::for_function(swap_id, [Type::integer(), Type::boolean()]),
        |lowering| lowering.function_signature_for(&swap),
    );
    assert_eq!(
        signature.to_string(),
        "%vt.Pair<Boolean, Integer> (ptr, %vt.Pair<Integer, Boolean>)"
    );
    let pair = Type::value_type(fixture.def("Pair"), vec![Type::integer(), Type::boolean()]);
    let lowered = lowering.backend_type_for(&pair);
    assert_eq!(lowered.as_struct().unwrap().body(), "{ i64, i1 }");
    assert!(!lowering.is_remote(&pair));
}

#[test]
fn test_type_description_of_subclass() {
    let fixture = TestFixture::from_test_package("collections").unwrap();
    let mut lowering = fixture.lowering();
    let description = lowering.type_description_for(&Type::optional(fixture.own_type("IntList")));

    assert!(description.optional);
    assert_eq!(description.info.flag, RunTimeTypeInfoFlag::Class);
    assert_eq!(description.info.generic_offset, 2);
    assert_eq!(description.arguments.len(), 2);
    assert!(
        description
            .arguments
            .iter()
            .all(|argument| argument.info.flag == RunTimeTypeInfoFlag::ValueType
                && argument.arguments.is_empty())
    );
}

#[test]
fn test_arity_errors_name_the_type() {
    let fixture = TestFixture::from_test_package("collections").unwrap();
    let mut lowering = fixture.lowering();
    let broken = Type::class(fixture.def("List"), vec![Type::integer(), Type::real()]);

    let error = lowering.try_object_layout(&broken).unwrap_err();
    assert_eq!(
        error,
        LoweringError::GenericArityMismatch {
            ty: "List<Integer, Real>".to_string(),
            expected: 1,
            found: 2,
        }
    );
    assert_eq!(
        error.to_string(),
        "`List<Integer, Real>` expects 1 generic arguments, got 2"
    );
}

#[test]
fn test_multiprotocol_conformance() {
    let fixture = TestFixture::from_test_package("shapes").unwrap();
    let mut lowering = fixture.lowering();
    let printable = Type::protocol(fixture.def("Printable"), vec![]);
    let hashable = Type::protocol(fixture.def("Hashable"), vec![]);
    let either_order = [
        Type::multi_protocol(vec![hashable.clone(), printable.clone()]),
        Type::multi_protocol(vec![printable, hashable]),
    ];

    for ty in &either_order {
        assert_eq!(lowering.multiprotocol_conformance(ty).to_string(), "[2 x ptr]");
        assert_eq!(lowering.multiprotocol_slot(ty, fixture.def("Hashable")), Ok(Some(1)));
        assert_eq!(lowering.multiprotocol_slot(ty, fixture.def("Drawable")), Ok(None));
    }
    assert_eq!(lowering.backend_type_for(&either_order[0]), lowering.box_type().clone());
}

#[test]
fn test_type_method_keeps_its_own_slot() {
    let fixture = TestFixture::from_manifest(
        r#"
        [[type]]
        name = "Shape"
        kind = "class"

        [[type]]
        name = "Circle"
        kind = "class"
        superclass = "Shape"

        [[function]]
        name = "area"
        kind = "object-method"
        owner = "Shape"
        returns = "Real"

        [[function]]
        name = "draw"
        kind = "object-method"
        owner = "Shape"

        [[function]]
        name = "area"
        kind = "class-method"
        owner = "Circle"
        returns = "Real"
        "#,
    )
    .unwrap();
    let mut lowering = fixture.lowering();
    let circle = fixture.def("Circle");
    let instance_area = fixture.function_id("Shape.area");
    let type_area = fixture.function_id("Circle.area");

    let table = lowering.dispatch_table(circle);
    assert_eq!(
        table.slots(),
        &[instance_area, fixture.function_id("Shape.draw"), type_area]
    );
    assert_eq!(table.index_of(fixture.symbol("area")), Some(0));
    assert_eq!(table.type_method_index_of(fixture.symbol("area")), Some(2));
    assert_eq!(lowering.dispatch_index(circle, instance_area), Ok(Some(0)));
    assert_eq!(lowering.dispatch_index(circle, type_area), Ok(Some(2)));
}

#[test]
fn test_object_references_alias_each_other() {
    let fixture = TestFixture::from_test_package("shapes").unwrap();
    let mut lowering = fixture.lowering();
    let shape = fixture.own_type("Shape");

    let shape_tag = lowering.tbaa_node_for(&shape, false);
    let optional_shape = lowering.tbaa_node_for(&Type::optional(shape.clone()), false);
    let someobject = lowering.tbaa_node_for(&Type::Someobject, false);
    let circle = lowering.tbaa_node_for(&fixture.own_type("Circle"), false);
    let real = lowering.tbaa_node_for(&Type::real(), false);

    let tree = lowering.tbaa_tree();
    assert!(tree.may_alias(&someobject, &shape_tag));
    assert!(tree.may_alias(&someobject, &circle));
    assert!(tree.may_alias(&optional_shape, &shape_tag));
    assert!(tree.may_alias(&optional_shape, &circle));
    assert!(!tree.may_alias(&someobject, &real));
}

#[test]
fn test_instance_variable_alias_tags() {
    let fixture = TestFixture::from_test_package("shapes").unwrap();
    let mut lowering = fixture.lowering();
    let circle = fixture.own_type("Circle");

    let id = lowering.instance_variable_tag(&circle, 0).unwrap();
    let radius = lowering.instance_variable_tag(&circle, 1).unwrap();
    assert_eq!((id.offset, radius.offset), (16, 24));
    assert!(!lowering.tbaa_tree().may_alias(&id, &radius));

    let shape = lowering.tbaa_node_for(&fixture.own_type("Shape"), false);
    let circle_tag = lowering.tbaa_node_for(&circle, false);
    assert!(lowering.tbaa_tree().may_alias(&shape, &circle_tag));
    assert!(matches!(
        lowering.instance_variable_tag(&circle, 2),
        Err(LoweringError::NoSuchInstanceVariable { index: 2, .. })
    ));
}

#[test]
fn test_escaping_closure_capture() {
    let fixture = TestFixture::from_test_package("shapes").unwrap();
    let mut lowering = fixture.lowering();
    let capture = Capture {
        variables: vec![
            VariableCapture {
                source_id: VariableId(0),
                captured_id: VariableId(0),
                ty: Type::real(),
            },
            VariableCapture {
                source_id: VariableId(3),
                captured_id: VariableId(1),
                ty: Type::value_type(fixture.def("Point"), vec![]),
            },
        ],
        captures_self: true,
    };

    let escaping = lowering.capture_layout(&capture, &BackendType::Ptr, true);
    assert_eq!(escaping.to_string(), "{ ptr, ptr, ptr, double, %vt.Point }");
    let local = lowering.capture_layout(&capture, &BackendType::Ptr, false);
    assert_eq!(local.to_string(), "{ ptr, double, %vt.Point }");
}
