//! Next-method chaining: the resumable cursor over remaining applicable
//! methods, its exhaustion behavior, and its dedup guarantee.

use crate::class::{ClassDecl, ClassId};
use crate::error::ObjectError;
use crate::generic::Dispatchable;
use crate::model::ObjectModel;
use crate::value::Value;
use pretty_assertions::assert_eq;

fn instance_of(model: &ObjectModel, class: ClassId) -> Value {
    Value::Object(model.construct::<&str>(class, Value::Null, Vec::new()).unwrap())
}

/// A method that prepends its label to whatever the rest of the chain
/// produces, treating chain exhaustion as the empty list.
fn chaining(label: &'static str) -> crate::generic::MethodFn {
    ObjectModel::method(move |model, cursor, args| {
        let rest = match cursor.call_next(model, args) {
            Ok(Value::List(items)) => items,
            Ok(other) => vec![other],
            Err(ObjectError::NoNextMethod { .. }) => Vec::new(),
            Err(other) => return Err(other),
        };
        let mut items = vec![Value::String(label.to_string())];
        items.extend(rest);
        Ok(Value::List(items))
    })
}

fn labels(value: Value) -> Vec<String> {
    match value {
        Value::List(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => panic!("expected string label, got {other:?}"),
            })
            .collect(),
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn two_position_scenario_b_b_then_a_a() {
    let mut model = ObjectModel::new();
    let a = model.declare_class(ClassDecl::new("a")).unwrap();
    let b = model.declare_class(ClassDecl::new("b").parent(a)).unwrap();

    let g = model.declare_generic("g", 2).unwrap();
    model
        .register_method(
            g,
            &[Dispatchable::Class(a), Dispatchable::Class(a)],
            chaining("a/a"),
            None,
        )
        .unwrap();
    model
        .register_method(
            g,
            &[Dispatchable::Class(b), Dispatchable::Class(b)],
            chaining("b/b"),
            None,
        )
        .unwrap();

    // g(b, b) resolves to (b, b); next_method inside it reaches (a, a).
    let result = model
        .call(g, vec![instance_of(&model, b), instance_of(&model, b)])
        .unwrap();
    assert_eq!(labels(result), vec!["b/b".to_string(), "a/a".to_string()]);
}

#[test]
fn chain_length_equals_applicable_ancestor_methods() {
    let mut model = ObjectModel::new();
    let base = model.declare_class(ClassDecl::new("base")).unwrap();
    let mid = model
        .declare_class(ClassDecl::new("mid").parent(base))
        .unwrap();
    let leaf = model
        .declare_class(ClassDecl::new("leaf").parent(mid))
        .unwrap();

    let walk = model.declare_generic("walk", 1).unwrap();
    for (class, label) in [(leaf, "leaf"), (mid, "mid"), (base, "base")] {
        model
            .register_method(walk, &[Dispatchable::Class(class)], chaining(label), None)
            .unwrap();
    }
    model
        .register_method(walk, &[Dispatchable::Any], chaining("any"), None)
        .unwrap();

    // Chaining succeeds exactly as many times as there are applicable
    // ancestor methods, then stops.
    let result = model.call(walk, vec![instance_of(&model, leaf)]).unwrap();
    assert_eq!(
        labels(result),
        vec![
            "leaf".to_string(),
            "mid".to_string(),
            "base".to_string(),
            "any".to_string()
        ]
    );
}

#[test]
fn exhaustion_raises_no_next_method() {
    let mut model = ObjectModel::new();
    let solo = model.declare_class(ClassDecl::new("solo")).unwrap();
    let only = model.declare_generic("only", 1).unwrap();
    model
        .register_method(
            only,
            &[Dispatchable::Class(solo)],
            ObjectModel::method(|model, cursor, args| {
                let err = cursor.call_next(model, args).unwrap_err();
                match err {
                    ObjectError::NoNextMethod { generic } => {
                        assert_eq!(generic, "only");
                    }
                    other => panic!("expected no-next-method, got {other:?}"),
                }
                // A second request is still exhausted.
                assert!(matches!(
                    cursor.call_next(model, args),
                    Err(ObjectError::NoNextMethod { .. })
                ));
                Ok(Value::Boolean(true))
            }),
            None,
        )
        .unwrap();

    assert_eq!(
        model.call(only, vec![instance_of(&model, solo)]).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn a_method_reachable_through_several_tuples_runs_once() {
    use crate::union::{UnionMember, UnionSpec};

    let mut model = ObjectModel::new();
    let a = model.declare_class(ClassDecl::new("a")).unwrap();
    let b = model.declare_class(ClassDecl::new("b").parent(a)).unwrap();

    let g = model.declare_generic("g", 2).unwrap();
    // One union registration covers the whole (a|b) x (a|b) product with a
    // single method; the specific (b, b) registration then displaces one
    // corner of it.
    let either = UnionSpec::new([UnionMember::Class(a), UnionMember::Class(b)]);
    model
        .register_method(
            g,
            &[
                Dispatchable::Union(either.clone()),
                Dispatchable::Union(either),
            ],
            chaining("shared"),
            None,
        )
        .unwrap();
    model
        .register_method(
            g,
            &[Dispatchable::Class(b), Dispatchable::Class(b)],
            chaining("specific"),
            None,
        )
        .unwrap();

    // Both ancestor positions still hold the shared method under three
    // distinct tuples; the cursor visits it exactly once.
    let result = model
        .call(g, vec![instance_of(&model, b), instance_of(&model, b)])
        .unwrap();
    assert_eq!(
        labels(result),
        vec!["specific".to_string(), "shared".to_string()]
    );
}

#[test]
fn next_method_passes_extra_arguments_through() {
    let mut model = ObjectModel::new();
    let a = model.declare_class(ClassDecl::new("a")).unwrap();
    let b = model.declare_class(ClassDecl::new("b").parent(a)).unwrap();

    let g = model.declare_generic("g", 1).unwrap();
    model
        .register_method(
            g,
            &[Dispatchable::Class(a)],
            ObjectModel::method(|_, _, args| Ok(Value::List(args.extra.clone()))),
            None,
        )
        .unwrap();
    model
        .register_method(
            g,
            &[Dispatchable::Class(b)],
            ObjectModel::method(|model, cursor, args| cursor.call_next(model, args)),
            None,
        )
        .unwrap();

    let result = model
        .call_with_extra(
            g,
            vec![instance_of(&model, b)],
            vec![Value::Integer(9)],
        )
        .unwrap();
    assert_eq!(result, Value::List(vec![Value::Integer(9)]));
}
