use bumpalo::Bump;
use pretty_assertions::assert_eq;

use super::{Adapters, BasicType, Conversion, Handle, OpKind, OpSet, positive_rotation};
use crate::api::{AdaptError, AdapterOptions, UnsupportedOp};
use crate::test_utils::{echo, init_test_logging, received};
use crate::types::{Primitive, TypeManager};
use crate::vm::{InvokeError, Invoker, PrimValue, Value};

fn conversions(handle: &Handle<'_>) -> Vec<String> {
    handle
        .chain()
        .filter_map(|h| h.conversion())
        .map(|c| c.to_string())
        .collect()
}

#[test]
fn test_retype_same_signature_returns_target() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());

    let sig = tm.signature(&[tm.string()], tm.object());
    let target = echo(tm, sig.clone());
    let same = adapters.retype_only(&sig, target).unwrap();
    assert!(!same.is_adapter());
    assert_eq!(same.name(), "echo");
}

#[test]
fn test_retype_only_and_raw() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());

    let target_type = tm.signature(&[tm.object(), tm.int()], tm.object());
    let widened = tm.signature(&[tm.string(), tm.short()], tm.object());
    assert!(adapters.can_retype_only(&widened, &target_type));

    let retyped = adapters.retype_only(&widened, echo(tm, target_type.clone())).unwrap();
    assert_eq!(retyped.signature(), &widened);
    assert_eq!(retyped.conversion(), Some(&Conversion::RetypeOnly));

    let bits = tm.signature(&[tm.object(), tm.float()], tm.object());
    assert!(!adapters.can_retype_only(&bits, &target_type));
    assert!(adapters.can_retype_raw(&bits, &target_type));

    let raw = adapters.retype_raw(&bits, echo(tm, target_type.clone())).unwrap();
    let args = received(
        Invoker::new(tm.builtins())
            .invoke(&raw, &[Value::Null, Value::Prim(PrimValue::Float(1.0))])
            .unwrap(),
    );
    assert_eq!(args[1], Value::int(0x3f80_0000));

    let strict = Adapters::new(
        tm.builtins(),
        AdapterOptions {
            raw_retype: false,
            ..AdapterOptions::default()
        },
    );
    assert!(!strict.can_retype_raw(&bits, &target_type));
}

#[test]
fn test_check_cast() {
    init_test_logging();
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());
    let invoker = Invoker::new(tm.builtins());

    let target_type = tm.signature(&[tm.string()], tm.object());
    let caller = tm.signature(&[tm.object()], tm.object());
    assert!(adapters.can_check_cast(&caller, &target_type, 0, tm.string()));
    assert!(!adapters.can_check_cast(&caller, &target_type, 0, tm.object()));
    assert!(!adapters.can_check_cast(&caller, &target_type, 1, tm.string()));

    let cast = adapters
        .check_cast(&caller, echo(tm, target_type), 0, tm.string())
        .unwrap();
    assert_eq!(cast.to_string(), "(Object)Object via check_cast(0, String)");

    let ok = received(invoker.invoke(&cast, &[Value::str("soup")]).unwrap());
    assert_eq!(ok, vec![Value::str("soup")]);
    assert!(invoker.invoke(&cast, &[Value::Null]).is_ok());
    assert_eq!(
        invoker.invoke(&cast, &[Value::Object(tm.object())]),
        Err(InvokeError::ClassCast {
            value: "Object@".to_string(),
            class: "String".to_string(),
        })
    );
}

#[test]
fn test_prim_cast_widens_and_narrows() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());
    let invoker = Invoker::new(tm.builtins());

    let target_type = tm.signature(&[tm.long(), tm.byte()], tm.object());
    let caller = tm.signature(&[tm.int(), tm.byte()], tm.object());
    assert!(adapters.can_prim_cast(&caller, &target_type, 0, tm.long()));
    assert!(!adapters.can_prim_cast(&caller, &target_type, 0, tm.double()));

    let widen = adapters
        .prim_cast(&caller, echo(tm, target_type.clone()), 0, tm.long())
        .unwrap();
    assert_eq!(widen.stack_move(), 1);
    let args = received(
        invoker
            .invoke(&widen, &[Value::int(-3), Value::Prim(PrimValue::Byte(9))])
            .unwrap(),
    );
    assert_eq!(args[0], Value::long(-3));

    let narrowing = tm.signature(&[tm.long(), tm.int()], tm.object());
    let narrow = adapters
        .prim_cast(&narrowing, echo(tm, target_type), 1, tm.byte())
        .unwrap();
    let args = received(invoker.invoke(&narrow, &[Value::long(1), Value::int(300)]).unwrap());
    assert_eq!(args[1], Value::Prim(PrimValue::Byte(44)));
}

#[test]
fn test_unbox_argument() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());
    let invoker = Invoker::new(tm.builtins());

    let target_type = tm.signature(&[tm.int()], tm.object());
    let exact = tm.signature(&[tm.wrapper(Primitive::Int)], tm.object());
    let direct = adapters
        .unbox_argument(&exact, echo(tm, target_type.clone()), 0, tm.int())
        .unwrap();
    assert_eq!(conversions(&direct), vec!["ref_to_prim(0, Integer -> int)"]);

    let loose = tm.signature(&[tm.object()], tm.object());
    let casted = adapters
        .unbox_argument(&loose, echo(tm, target_type), 0, tm.wrapper(Primitive::Int))
        .unwrap();
    assert_eq!(
        conversions(&casted),
        vec!["check_cast(0, Integer)", "ref_to_prim(0, Integer -> int)"]
    );
    assert_eq!(casted.signature(), &loose);

    let args = received(
        invoker
            .invoke(&casted, &[Value::Boxed(PrimValue::Int(7))])
            .unwrap(),
    );
    assert_eq!(args, vec![Value::int(7)]);
    assert!(matches!(
        invoker.invoke(&casted, &[Value::Null]),
        Err(InvokeError::NullPointer { .. })
    ));
    assert!(matches!(
        invoker.invoke(&casted, &[Value::Boxed(PrimValue::Long(7))]),
        Err(InvokeError::ClassCast { .. })
    ));
}

#[test]
fn test_boxing_is_refused() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::new(
        tm.builtins(),
        AdapterOptions {
            implemented_ops: OpSet::all(),
            ..AdapterOptions::default()
        },
    );

    let target_type = tm.signature(&[tm.object()], tm.object());
    let caller = tm.signature(&[tm.int()], tm.object());
    assert!(!adapters.can_box_argument(&caller, &target_type, 0, tm.wrapper(Primitive::Int)));
    assert_eq!(
        adapters
            .box_argument(&caller, echo(tm, target_type), 0, tm.wrapper(Primitive::Int))
            .unwrap_err(),
        AdaptError::Unsupported(UnsupportedOp::Boxing)
    );
}

#[test]
fn test_drop_arguments() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());
    let invoker = Invoker::new(tm.builtins());

    let target_type = tm.signature(&[tm.object(), tm.object()], tm.object());
    let caller = tm.signature(&[tm.object(), tm.long(), tm.object()], tm.object());
    assert!(adapters.can_drop_arguments(&caller, &target_type, 1, 1));
    assert!(!adapters.can_drop_arguments(&caller, &target_type, 0, 1));
    assert!(!adapters.can_drop_arguments(&caller, &target_type, 1, 2));

    let dropped = adapters
        .drop_arguments(&caller, echo(tm, target_type), 1, 1)
        .unwrap();
    assert_eq!(dropped.stack_move(), -2);
    let args = received(
        invoker
            .invoke(&dropped, &[Value::str("curry"), Value::long(5), Value::str("chutney")])
            .unwrap(),
    );
    assert_eq!(args, vec![Value::str("curry"), Value::str("chutney")]);
}

#[test]
fn test_drop_nothing_is_a_retype() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());

    let target_type = tm.signature(&[tm.object()], tm.object());
    let caller = tm.signature(&[tm.string()], tm.object());
    let dropped = adapters
        .drop_arguments(&caller, echo(tm, target_type.clone()), 0, 0)
        .unwrap();
    let adapted = adapters.adapt(&caller, echo(tm, target_type)).unwrap();
    assert_eq!(dropped.to_string(), adapted.to_string());
    assert_eq!(dropped.conversion(), Some(&Conversion::RetypeOnly));
}

#[test]
fn test_duplicate_arguments() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());
    let invoker = Invoker::new(tm.builtins());

    let caller = tm.signature(&[tm.string(), tm.double(), tm.int()], tm.object());
    let target_type = tm.signature(
        &[tm.string(), tm.double(), tm.int(), tm.double(), tm.int()],
        tm.object(),
    );
    assert!(adapters.can_duplicate_arguments(&caller, &target_type, 1, 2));
    assert!(!adapters.can_duplicate_arguments(&caller, &target_type, 0, 2));

    let dup = adapters
        .duplicate_arguments(&caller, echo(tm, target_type), 1, 2)
        .unwrap();
    assert_eq!(dup.stack_move(), 3);
    let args = received(
        invoker
            .invoke(&dup, &[Value::str("x"), Value::double(0.5), Value::int(2)])
            .unwrap(),
    );
    assert_eq!(
        args,
        vec![
            Value::str("x"),
            Value::double(0.5),
            Value::int(2),
            Value::double(0.5),
            Value::int(2)
        ]
    );
}

#[test]
fn test_swap_twice_restores() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());
    let invoker = Invoker::new(tm.builtins());

    let target_type = tm.signature(&[tm.string(), tm.int(), tm.object()], tm.object());
    let swapped_type = tm.signature(&[tm.object(), tm.int(), tm.string()], tm.object());

    let once = adapters
        .swap_arguments(&swapped_type, echo(tm, target_type.clone()), 2, 0)
        .unwrap();
    assert_eq!(once.to_string(), "(Object,int,String)Object via swap_args(0, 2)");

    let twice = adapters.swap_arguments(&target_type, once, 0, 2).unwrap();
    assert_eq!(twice.signature(), &target_type);

    let input = [Value::str("a"), Value::int(1), Value::str("b")];
    let args = received(invoker.invoke(&twice, &input).unwrap());
    assert_eq!(args, input.to_vec());
}

#[test]
fn test_swap_requires_equal_widths() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());

    let target_type = tm.signature(&[tm.long(), tm.int()], tm.object());
    let caller = tm.signature(&[tm.int(), tm.long()], tm.object());
    assert!(!adapters.can_swap_arguments(&caller, &target_type, 0, 1));
    assert!(adapters.swap_arguments(&caller, echo(tm, target_type), 0, 1).is_err());

    let same = tm.signature(&[tm.int(), tm.long()], tm.object());
    let unchanged = adapters
        .swap_arguments(&same, echo(tm, same.clone()), 1, 1)
        .unwrap();
    assert!(!unchanged.is_adapter());
}

#[test]
fn test_swap_descriptor() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());

    let target_type = tm.signature(&[tm.double(), tm.int(), tm.long(), tm.int()], tm.object());
    let caller = tm.signature(&[tm.long(), tm.int(), tm.double(), tm.int()], tm.object());
    let swap = adapters
        .swap_arguments(&caller, echo(tm, target_type), 0, 2)
        .unwrap();
    let Handle::Adapter(node) = &swap else {
        panic!("expected an adapter node");
    };
    let word = adapters.conv_word(node);
    assert_eq!(word.op(), Some(OpKind::SwapArgs));
    assert_eq!(word.arg_pos(), Some(0));
    assert_eq!(word.src_type(), Some(BasicType::Long));
    // Only the trailing int lies above the second swapped argument.
    assert_eq!(word.vm_info(), 1);
}

#[test]
fn test_rotate_arguments() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());
    let invoker = Invoker::new(tm.builtins());

    let caller = tm.signature(&[tm.string(), tm.int(), tm.long(), tm.double()], tm.object());
    let right = tm.signature(&[tm.string(), tm.double(), tm.int(), tm.long()], tm.object());
    let left = tm.signature(&[tm.string(), tm.long(), tm.double(), tm.int()], tm.object());

    assert!(adapters.can_rotate_arguments(&caller, &right, 1, 3, 1));
    assert!(adapters.can_rotate_arguments(&caller, &right, 1, 3, -2));
    assert!(adapters.can_rotate_arguments(&caller, &left, 1, 3, -1));
    assert!(!adapters.can_rotate_arguments(&caller, &left, 1, 3, 1));
    assert!(!adapters.can_rotate_arguments(&caller, &right, 1, 3, 0));
    assert!(!adapters.can_rotate_arguments(&caller, &caller, 1, 2, 1));

    let input = [Value::str("s"), Value::int(1), Value::long(2), Value::double(3.0)];

    let rotated = adapters
        .rotate_arguments(&caller, echo(tm, right), 1, 3, 1)
        .unwrap();
    assert_eq!(rotated.conversion().and_then(|c| c.arg_pos()), Some(3));
    let args = received(invoker.invoke(&rotated, &input).unwrap());
    assert_eq!(
        args,
        vec![Value::str("s"), Value::double(3.0), Value::int(1), Value::long(2)]
    );

    let rotated = adapters
        .rotate_arguments(&caller, echo(tm, left), 1, 3, -1)
        .unwrap();
    assert_eq!(rotated.conversion().and_then(|c| c.arg_pos()), Some(1));
    let args = received(invoker.invoke(&rotated, &input).unwrap());
    assert_eq!(
        args,
        vec![Value::str("s"), Value::long(2), Value::double(3.0), Value::int(1)]
    );
}

#[test]
fn test_rotate_too_wide() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());

    let o = tm.object();
    let caller = tm.signature(&[o, o, o, o, o], o);
    assert!(!adapters.can_rotate_arguments(&caller, &caller, 0, 5, 2));
    assert_eq!(
        adapters
            .rotate_arguments(&caller, echo(tm, caller.clone()), 0, 5, 2)
            .unwrap_err(),
        AdaptError::Unsupported(UnsupportedOp::WideRotation)
    );
}

#[test]
fn test_huge_positions_and_counts_are_refused() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());

    let o = tm.object();
    let three = tm.signature(&[o, o, o], o);
    let two = tm.signature(&[o, o], o);
    let objects = tm.array(o);
    let spread_from = tm.signature(&[objects], o);
    let max = usize::MAX;

    assert!(!adapters.can_drop_arguments(&three, &two, 1, max));
    assert!(!adapters.can_drop_arguments(&three, &two, max, 1));
    assert!(!adapters.can_duplicate_arguments(&two, &three, 1, max));
    assert!(!adapters.can_duplicate_arguments(&two, &three, max, 1));
    assert!(!adapters.can_rotate_arguments(&three, &three, 1, max, 1));
    assert!(!adapters.can_rotate_arguments(&three, &three, max, 3, isize::MIN));
    assert!(!adapters.can_spread_arguments(&spread_from, &two, objects, 0, max));
    assert!(
        adapters
            .drop_arguments(&three, echo(tm, two.clone()), 1, max)
            .is_err()
    );
    assert!(
        adapters
            .duplicate_arguments(&two, echo(tm, three), max, max)
            .is_err()
    );
    assert!(
        adapters
            .spread_arguments(&spread_from, echo(tm, two), objects, 0, max)
            .is_err()
    );
}

#[test]
fn test_positive_rotation() {
    assert_eq!(positive_rotation(3, -1), 2);
    assert_eq!(positive_rotation(3, 4), 1);
    assert_eq!(positive_rotation(0, 5), 0);
    assert_eq!(positive_rotation(usize::MAX, -1), usize::MAX - 1);
    assert_eq!(positive_rotation(5, isize::MIN), 2);
}

#[test]
fn test_spread_arguments() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::with_defaults(tm.builtins());
    let invoker = Invoker::new(tm.builtins());

    let strings = tm.array(tm.string());
    let target_type = tm.signature(&[tm.int(), tm.object(), tm.string()], tm.object());
    let caller = tm.signature(&[tm.int(), strings], tm.object());
    assert!(adapters.can_spread_arguments(&caller, &target_type, strings, 1, 2));
    assert!(!adapters.can_spread_arguments(&caller, &target_type, tm.array(tm.object()), 1, 2));

    let spread = adapters
        .spread_arguments(&caller, echo(tm, target_type.clone()), strings, 1, 2)
        .unwrap();
    assert_eq!(spread.stack_move(), 1);
    let pair = Value::array(strings, [Value::str("salt"), Value::str("pepper")]);
    let args = received(invoker.invoke(&spread, &[Value::int(4), pair]).unwrap());
    assert_eq!(args, vec![Value::int(4), Value::str("salt"), Value::str("pepper")]);

    let short = Value::array(strings, [Value::str("salt")]);
    assert_eq!(
        invoker.invoke(&spread, &[Value::int(4), short]),
        Err(InvokeError::ArrayLength {
            expected: 2,
            actual: 1,
        })
    );

    let untyped = tm.signature(&[tm.int(), tm.object()], tm.object());
    let checked = adapters
        .spread_arguments(&untyped, echo(tm, target_type), strings, 1, 2)
        .unwrap();
    assert_eq!(
        conversions(&checked),
        vec!["check_cast(1, String[])", "spread_args(1, String[], 2)"]
    );
    assert!(matches!(
        invoker.invoke(&checked, &[Value::int(4), Value::str("nope")]),
        Err(InvokeError::ClassCast { .. })
    ));
}

#[test]
fn test_gated_operations() {
    let bump = Bump::new();
    let tm = TypeManager::new(&bump);
    let adapters = Adapters::new(
        tm.builtins(),
        AdapterOptions {
            implemented_ops: OpSet::ELEMENTARY - OpSet::SWAP_ARGS,
            ..AdapterOptions::default()
        },
    );

    let target_type = tm.signature(&[tm.string(), tm.object()], tm.object());
    let caller = tm.signature(&[tm.object(), tm.string()], tm.object());
    assert!(!adapters.supported(OpKind::SwapArgs));
    assert!(!adapters.can_swap_arguments(&caller, &target_type, 0, 1));
    assert!(!adapters.can_collect_arguments(&caller, &target_type));
    assert!(!adapters.can_flyby(&caller, &target_type));
    assert!(!adapters.can_ricochet(&caller, &target_type));
    assert_eq!(
        adapters
            .collect_arguments(&caller, echo(tm, target_type.clone()))
            .unwrap_err(),
        AdaptError::Unsupported(UnsupportedOp::Collect)
    );
    assert_eq!(
        adapters
            .ricochet(&caller, echo(tm, target_type))
            .unwrap_err(),
        AdaptError::Unsupported(UnsupportedOp::Ricochet)
    );
}
