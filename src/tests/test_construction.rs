//! Construction and validation: flattened property sets, validator chains,
//! abstract classes, defaults, and custom constructors.

use crate::class::ClassDecl;
use crate::error::ObjectError;
use crate::instance::Instance;
use crate::model::ObjectModel;
use crate::property::PropertySpec;
use crate::value::{BaseType, Value};
use pretty_assertions::assert_eq;

/// Class `a` with `x: float`, subclass `b` adding `y: float` and a
/// validator requiring `y >= x`.
fn model_with_a_and_b() -> (ObjectModel, crate::class::ClassId, crate::class::ClassId) {
    let mut model = ObjectModel::new();
    let a = model
        .declare_class(ClassDecl::new("a").property(PropertySpec::base("x", BaseType::Float)))
        .unwrap();
    let b = model
        .declare_class(
            ClassDecl::new("b")
                .parent(a)
                .property(PropertySpec::base("y", BaseType::Float))
                .validator(|_, instance| {
                    let x = instance
                        .raw_property("x")
                        .and_then(Value::as_float)
                        .unwrap_or(0.0);
                    let y = instance
                        .raw_property("y")
                        .and_then(Value::as_float)
                        .unwrap_or(0.0);
                    if y < x {
                        vec![format!("y must be at least x (y={y}, x={x})")]
                    } else {
                        Vec::new()
                    }
                }),
        )
        .unwrap();
    (model, a, b)
}

#[test]
fn constructing_b_with_y_below_x_fails_validation() {
    let (model, _, b) = model_with_a_and_b();
    let err = model
        .construct(
            b,
            Value::Null,
            vec![("x", Value::Float(5.0)), ("y", Value::Float(3.0))],
        )
        .unwrap_err();
    match err {
        ObjectError::Validation { class, messages } => {
            assert_eq!(class, "b");
            assert_eq!(messages.len(), 1);
            assert!(messages[0].contains("y must be at least x"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn constructing_b_with_valid_values_succeeds() {
    let (model, _, b) = model_with_a_and_b();
    let instance = model
        .construct(
            b,
            Value::Null,
            vec![("x", Value::Float(5.0)), ("y", Value::Float(10.0))],
        )
        .unwrap();
    assert_eq!(
        model.get_property(&instance, "x").unwrap(),
        Value::Float(5.0)
    );
    assert_eq!(
        model.get_property(&instance, "y").unwrap(),
        Value::Float(10.0)
    );
}

#[test]
fn flattened_properties_are_parent_set_plus_own() {
    let (model, a, b) = model_with_a_and_b();
    let a_names = model.get_class(a).unwrap().property_names();
    let b_names = model.get_class(b).unwrap().property_names();
    assert_eq!(a_names, vec!["x"]);
    assert_eq!(b_names, vec!["x", "y"]);
}

#[test]
fn subclass_instances_satisfy_parent_validators() {
    let mut model = ObjectModel::new();
    let positive = model
        .declare_class(
            ClassDecl::new("positive")
                .property(PropertySpec::base("x", BaseType::Float))
                .validator(|_, instance| {
                    match instance.raw_property("x").and_then(Value::as_float) {
                        Some(x) if x > 0.0 => Vec::new(),
                        _ => vec!["x must be positive".to_string()],
                    }
                }),
        )
        .unwrap();
    let child = model
        .declare_class(ClassDecl::new("positive-child").parent(positive))
        .unwrap();

    // The parent validator runs even though the child declares none.
    let err = model
        .construct(child, Value::Null, vec![("x", Value::Float(-1.0))])
        .unwrap_err();
    assert!(matches!(err, ObjectError::Validation { .. }));

    let ok = model
        .construct(child, Value::Null, vec![("x", Value::Float(1.0))])
        .unwrap();
    assert_eq!(model.validate(&ok), Vec::<String>::new());
}

#[test]
fn validation_messages_accumulate_root_to_most_specific() {
    let mut model = ObjectModel::new();
    let parent = model
        .declare_class(
            ClassDecl::new("parent")
                .property(PropertySpec::any("value"))
                .validator(|_, _| vec!["parent rejects".to_string()]),
        )
        .unwrap();
    let child = model
        .declare_class(
            ClassDecl::new("child")
                .parent(parent)
                .validator(|_, _| vec!["child rejects".to_string()]),
        )
        .unwrap();

    let err = model.construct(child, Value::Null, vec![("value", Value::Null)]);
    match err.unwrap_err() {
        ObjectError::Validation { messages, .. } => {
            assert_eq!(
                messages,
                vec!["parent rejects".to_string(), "child rejects".to_string()]
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn abstract_classes_cannot_be_instantiated() {
    let mut model = ObjectModel::new();
    let shape = model
        .declare_class(ClassDecl::new("shape").abstract_class())
        .unwrap();
    let err = model
        .construct::<&str>(shape, Value::Null, Vec::new())
        .unwrap_err();
    assert!(matches!(err, ObjectError::Declaration { .. }));

    // Concrete descendants still work.
    let circle = model
        .declare_class(ClassDecl::new("circle").parent(shape))
        .unwrap();
    assert!(model
        .construct::<&str>(circle, Value::Null, Vec::new())
        .is_ok());
}

#[test]
fn base_rooted_classes_type_check_the_base_value() {
    let mut model = ObjectModel::new();
    let text = model
        .declare_class(ClassDecl::new("text").base(BaseType::String))
        .unwrap();

    let err = model
        .construct::<&str>(text, Value::Integer(3), Vec::new())
        .unwrap_err();
    match err {
        ObjectError::TypeMismatch {
            expected, found, ..
        } => {
            assert_eq!(expected, "string");
            assert_eq!(found, "integer");
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }

    let ok = model
        .construct::<&str>(text, Value::String("hello".to_string()), Vec::new())
        .unwrap();
    assert_eq!(ok.base(), &Value::String("hello".to_string()));
}

#[test]
fn missing_values_take_the_default_then_null() {
    let mut model = ObjectModel::new();
    let config = model
        .declare_class(
            ClassDecl::new("config")
                .property(PropertySpec::base("retries", BaseType::Integer).with_default(Value::Integer(3)))
                .property(PropertySpec::any("note")),
        )
        .unwrap();
    let instance = model
        .construct::<&str>(config, Value::Null, Vec::new())
        .unwrap();
    assert_eq!(
        model.get_property(&instance, "retries").unwrap(),
        Value::Integer(3)
    );
    assert_eq!(model.get_property(&instance, "note").unwrap(), Value::Null);
}

#[test]
fn unknown_constructor_arguments_are_rejected() {
    let (model, _, b) = model_with_a_and_b();
    let err = model
        .construct(b, Value::Null, vec![("z", Value::Float(1.0))])
        .unwrap_err();
    assert!(matches!(err, ObjectError::UnknownProperty { .. }));
}

#[test]
fn mistyped_constructor_arguments_name_the_property() {
    let (model, _, b) = model_with_a_and_b();
    let err = model
        .construct(
            b,
            Value::Null,
            vec![("x", Value::String("five".to_string()))],
        )
        .unwrap_err();
    match err {
        ObjectError::TypeMismatch {
            context,
            expected,
            found,
        } => {
            assert!(context.contains("'x'"));
            assert_eq!(expected, "float");
            assert_eq!(found, "string");
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[test]
fn incompatible_property_redeclaration_conflicts() {
    let mut model = ObjectModel::new();
    let a = model
        .declare_class(ClassDecl::new("a").property(PropertySpec::base("x", BaseType::Float)))
        .unwrap();
    let err = model
        .declare_class(
            ClassDecl::new("bad-child")
                .parent(a)
                .property(PropertySpec::base("x", BaseType::String)),
        )
        .unwrap_err();
    assert!(matches!(err, ObjectError::PropertyConflict { .. }));
}

#[test]
fn custom_constructors_still_run_the_validator_chain() {
    let mut model = ObjectModel::new();
    let range = model
        .declare_class(
            ClassDecl::new("range")
                .property(PropertySpec::base("start", BaseType::Float))
                .property(PropertySpec::base("end", BaseType::Float))
                .validator(|_, instance| {
                    let start = instance
                        .raw_property("start")
                        .and_then(Value::as_float)
                        .unwrap_or(0.0);
                    let end = instance
                        .raw_property("end")
                        .and_then(Value::as_float)
                        .unwrap_or(0.0);
                    if end < start {
                        vec!["end must not precede start".to_string()]
                    } else {
                        Vec::new()
                    }
                })
                .constructor(|model, base, mut args| {
                    // Accept a single "span" argument and derive both bounds.
                    let span = args
                        .shift_remove("span")
                        .and_then(|v| v.as_float())
                        .unwrap_or(0.0);
                    let class = model.find_class("range").expect("declared");
                    let mut properties = indexmap::IndexMap::new();
                    properties.insert("start".to_string(), Value::Float(0.0));
                    properties.insert("end".to_string(), Value::Float(span));
                    Ok(Instance::new(class, base, properties))
                }),
        )
        .unwrap();

    let ok = model
        .construct(range, Value::Null, vec![("span", Value::Float(4.0))])
        .unwrap();
    assert_eq!(
        model.get_property(&ok, "end").unwrap(),
        Value::Float(4.0)
    );

    let err = model
        .construct(range, Value::Null, vec![("span", Value::Float(-2.0))])
        .unwrap_err();
    assert!(matches!(err, ObjectError::Validation { .. }));
}
