//! End-to-end scenarios through the public `rebind` API.

use bumpalo::Bump;
use pretty_assertions::assert_eq;
use rebind::{
    AdaptError, Adapters, AdapterOptions, Handle, Invoker, OpSet, Primitive, Signature,
    TypeManager, UnsupportedOp, Value,
};

/// Returns its arguments as an `Object[]`.
fn list<'t>(tm: &'t TypeManager<'t>, signature: Signature<'t>) -> Handle<'t> {
    let array = tm.array(tm.object());
    Handle::direct("list", signature, move |args| {
        Ok(Value::array(array, args.iter().cloned()))
    })
}

fn items<'t>(value: Value<'t>) -> Vec<Value<'t>> {
    match value {
        Value::Array { items, .. } => items.to_vec(),
        other => panic!("expected a list, got {}", other),
    }
}

#[test]
fn chicken_and_rice() {
    let arena = Bump::new();
    let tm = TypeManager::new(&arena);
    let adapters = Adapters::with_defaults(tm.builtins());

    let pair = tm.signature(&[tm.object(), tm.object()], tm.object());
    let caller = tm.signature(&[tm.string(), tm.string()], tm.object());
    let swapped = adapters
        .adapt_with_permutation(&caller, list(tm, pair), &[1, 0])
        .unwrap();

    let result = Invoker::new(tm.builtins())
        .invoke(&swapped, &[Value::str("chicken"), Value::str("rice")])
        .unwrap();
    assert_eq!(items(result), vec![Value::str("rice"), Value::str("chicken")]);
}

#[test]
fn curry_and_chutney() {
    let arena = Bump::new();
    let tm = TypeManager::new(&arena);
    let adapters = Adapters::with_defaults(tm.builtins());

    let pair = tm.signature(&[tm.object(), tm.object()], tm.object());
    let triple = tm.signature(&[tm.object(), tm.object(), tm.object()], tm.object());
    let dropped = adapters.drop_arguments(&triple, list(tm, pair), 1, 1).unwrap();
    assert_eq!(dropped.signature(), &triple);

    let result = Invoker::new(tm.builtins())
        .invoke(
            &dropped,
            &[Value::str("curry"), Value::str("naan"), Value::str("chutney")],
        )
        .unwrap();
    assert_eq!(items(result), vec![Value::str("curry"), Value::str("chutney")]);
}

#[test]
fn identical_signature_returns_target() {
    let arena = Bump::new();
    let tm = TypeManager::new(&arena);
    let adapters = Adapters::with_defaults(tm.builtins());

    let sig = tm.signature(&[tm.string(), tm.int()], tm.object());
    let adapted = adapters.adapt(&sig, list(tm, sig.clone())).unwrap();
    assert!(!adapted.is_adapter());
    assert_eq!(adapted.name(), "list");
}

#[test]
fn swapping_twice_restores_order() {
    let arena = Bump::new();
    let tm = TypeManager::new(&arena);
    let adapters = Adapters::with_defaults(tm.builtins());

    let sig = tm.signature(&[tm.string(), tm.int(), tm.string()], tm.object());
    let once = adapters.swap_arguments(&sig, list(tm, sig.clone()), 0, 2).unwrap();
    let twice = adapters.swap_arguments(&sig, once, 2, 0).unwrap();

    let args = [Value::str("a"), Value::int(1), Value::str("b")];
    let result = Invoker::new(tm.builtins()).invoke(&twice, &args).unwrap();
    assert_eq!(items(result), args.to_vec());
}

#[test]
fn dropping_nothing_is_plain_adaptation() {
    let arena = Bump::new();
    let tm = TypeManager::new(&arena);
    let adapters = Adapters::with_defaults(tm.builtins());

    let target_type = tm.signature(&[tm.object(), tm.int()], tm.object());
    let caller = tm.signature(&[tm.string(), tm.short()], tm.object());
    let dropped = adapters
        .drop_arguments(&caller, list(tm, target_type.clone()), 1, 0)
        .unwrap();
    let adapted = adapters.adapt(&caller, list(tm, target_type)).unwrap();
    assert_eq!(dropped.to_string(), adapted.to_string());
}

#[test]
fn varargs_adaptation_is_idempotent() {
    let arena = Bump::new();
    let tm = TypeManager::new(&arena);
    let adapters = Adapters::with_defaults(tm.builtins());

    let objects = tm.array(tm.object());
    let collector = adapters
        .as_varargs_collector(list(tm, tm.signature(&[objects], tm.object())), objects)
        .unwrap();
    let three = tm.signature(&[tm.string(), tm.string(), tm.string()], tm.object());
    let first = collector.adapt(&three).unwrap();
    let second = collector.adapt(&three).unwrap();
    assert_eq!(first.signature(), second.signature());
    assert_eq!(collector.cached_arities(), vec![3]);

    let result = Invoker::new(tm.builtins())
        .invoke(&second, &[Value::str("x"), Value::str("y"), Value::str("z")])
        .unwrap();
    assert_eq!(
        items(result),
        vec![Value::array(
            objects,
            [Value::str("x"), Value::str("y"), Value::str("z")]
        )]
    );
}

#[test]
fn boxing_is_never_emitted() {
    let arena = Bump::new();
    let tm = TypeManager::new(&arena);
    let adapters = Adapters::new(
        tm.builtins(),
        AdapterOptions {
            implemented_ops: OpSet::all(),
            ..Default::default()
        },
    );

    let target_type = tm.signature(&[tm.object()], tm.object());
    let caller = tm.signature(&[tm.int()], tm.object());
    assert!(!adapters.can_adapt(&caller, &target_type));
    assert!(!adapters.can_box_argument(&caller, &target_type, 0, tm.wrapper(Primitive::Int)));
    assert_eq!(
        adapters
            .box_argument(&caller, list(tm, target_type), 0, tm.wrapper(Primitive::Int))
            .unwrap_err(),
        AdaptError::Unsupported(UnsupportedOp::Boxing)
    );
}

#[test]
fn short_rotations_are_rejected() {
    let arena = Bump::new();
    let tm = TypeManager::new(&arena);
    let adapters = Adapters::with_defaults(tm.builtins());

    let two = tm.signature(&[tm.string(), tm.string()], tm.object());
    assert!(!adapters.can_rotate_arguments(&two, &two, 0, 2, 1));
    assert!(!adapters.can_rotate_arguments(&two, &two, 0, 1, 1));
    assert!(!adapters.can_rotate_arguments(&two, &two, 0, 0, 0));
}
