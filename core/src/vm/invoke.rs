use tracing::trace;

use crate::adapter::{Conversion, Handle};
use crate::types::{Builtins, Signature, Type};
use crate::vm::{InvokeError, PrimValue, Value};

/// Runs adapter chains the way the host VM would.
///
/// Each adapter step rewrites the argument vector in place and then hands
/// it to its successor; the direct handle at the end of the chain receives
/// the final vector. Results travel back out through every step's return
/// type. The chain is walked iteratively, so long chains cost no native
/// stack.
#[derive(Clone, Copy)]
pub struct Invoker<'t> {
    builtins: &'t Builtins<'t>,
}

impl<'t> Invoker<'t> {
    pub fn new(builtins: &'t Builtins<'t>) -> Self {
        Self { builtins }
    }

    pub fn invoke(&self, handle: &Handle<'t>, args: &[Value<'t>]) -> Result<Value<'t>, InvokeError> {
        let expected = handle.signature().param_count();
        if args.len() != expected {
            return Err(InvokeError::WrongArity {
                expected,
                actual: args.len(),
            });
        }

        let mut args = args.to_vec();
        let mut unwind: Vec<(&Signature<'t>, bool)> = Vec::new();
        let mut current = handle;
        loop {
            match current {
                Handle::Direct(direct) => {
                    trace!(name = direct.name(), args = args.len(), "direct call");
                    let mut result = direct.call(&args)?;
                    for (signature, raw) in unwind.into_iter().rev() {
                        result = coerce(result, signature.ret(), raw);
                    }
                    return Ok(result);
                }
                Handle::Adapter(node) => {
                    let raw = matches!(node.conversion(), Conversion::RetypeRaw);
                    self.apply(node.conversion(), &mut args)?;
                    let target = node.target();
                    conform(&mut args, target.signature(), raw);
                    unwind.push((node.signature(), raw));
                    current = target;
                }
                Handle::Collect(node) => {
                    let items = args.split_off(node.pos());
                    args.push(Value::Array {
                        ty: node.array_type(),
                        items: items.into(),
                    });
                    let target = node.target();
                    conform(&mut args, target.signature(), false);
                    unwind.push((current.signature(), false));
                    current = target;
                }
            }
        }
    }

    fn apply(&self, conversion: &Conversion<'t>, args: &mut Vec<Value<'t>>) -> Result<(), InvokeError> {
        trace!(%conversion, "apply");
        match *conversion {
            Conversion::RetypeOnly | Conversion::RetypeRaw => {}
            Conversion::CheckCast { arg, class } => {
                self.check_cast(&args[arg], class)?;
            }
            Conversion::PrimToPrim { arg, to, .. } => {
                let prim = match &args[arg] {
                    Value::Prim(prim) => *prim,
                    other => return Err(class_cast(other, to.name())),
                };
                args[arg] = Value::Prim(prim.convert(to));
            }
            Conversion::RefToPrim { arg, to, wrapper } => {
                let prim = match &args[arg] {
                    Value::Null => {
                        return Err(InvokeError::NullPointer {
                            expected: wrapper.to_string(),
                        });
                    }
                    Value::Boxed(prim) if Some(prim.kind()) == wrapper.unboxed() => *prim,
                    other => return Err(class_cast(other, wrapper)),
                };
                args[arg] = Value::Prim(prim.convert(to));
            }
            Conversion::DropArgs { pos, count, .. } => {
                args.drain(pos..pos + count);
            }
            Conversion::DupArgs { pos, count, .. } => {
                let copies = args[pos..pos + count].to_vec();
                args.extend(copies);
            }
            Conversion::SwapArgs { first, second, .. } => args.swap(first, second),
            Conversion::RotateArgs {
                first, count, by, ..
            } => args[first..first + count].rotate_right(by),
            Conversion::SpreadArgs {
                pos,
                count,
                array_type,
                ..
            } => {
                let items = match &args[pos] {
                    Value::Null => {
                        return Err(InvokeError::NullPointer {
                            expected: array_type.to_string(),
                        });
                    }
                    Value::Array { items, .. } => items.clone(),
                    other => {
                        return Err(InvokeError::NotAnArray {
                            value: other.to_string(),
                        });
                    }
                };
                self.check_cast(&args[pos], array_type)?;
                if items.len() != count {
                    return Err(InvokeError::ArrayLength {
                        expected: count,
                        actual: items.len(),
                    });
                }
                args.splice(pos..=pos, items.iter().cloned());
            }
        }
        Ok(())
    }

    fn check_cast(&self, value: &Value<'t>, class: &'t Type<'t>) -> Result<(), InvokeError> {
        if value.is_instance_of(class, self.builtins) {
            Ok(())
        } else {
            Err(class_cast(value, class))
        }
    }
}

fn class_cast(value: &Value<'_>, class: impl ToString) -> InvokeError {
    InvokeError::ClassCast {
        value: value.to_string(),
        class: class.to_string(),
    }
}

/// Brings primitive arguments in line with the successor's parameter kinds.
/// Widening that the type system treats as free still changes the runtime
/// tag; raw steps reinterpret bits instead.
fn conform<'t>(args: &mut [Value<'t>], signature: &Signature<'t>, raw: bool) {
    for (arg, ty) in args.iter_mut().zip(signature.params()) {
        if let Value::Prim(_) = arg {
            *arg = coerce(arg.clone(), ty, raw);
        }
    }
}

fn coerce<'t>(value: Value<'t>, ty: &Type<'t>, raw: bool) -> Value<'t> {
    match (value, ty) {
        (_, Type::Void) => Value::Void,
        (Value::Prim(prim), Type::Primitive(to)) if prim.kind() != *to => {
            if raw && prim.kind().slot_size() == to.slot_size() {
                Value::Prim(prim.reinterpret(*to))
            } else {
                Value::Prim(prim.convert(*to))
            }
        }
        // A raw retype may read a void result as a one-slot primitive.
        (Value::Void, Type::Primitive(to)) => Value::Prim(PrimValue::Int(0).convert(*to)),
        (value, _) => value,
    }
}
