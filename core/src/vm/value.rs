use core::fmt;
use std::sync::Arc;

use crate::types::{Builtins, Primitive, Type};

/// A primitive value, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimValue {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl PrimValue {
    pub fn kind(self) -> Primitive {
        match self {
            PrimValue::Boolean(_) => Primitive::Boolean,
            PrimValue::Byte(_) => Primitive::Byte,
            PrimValue::Char(_) => Primitive::Char,
            PrimValue::Short(_) => Primitive::Short,
            PrimValue::Int(_) => Primitive::Int,
            PrimValue::Long(_) => Primitive::Long,
            PrimValue::Float(_) => Primitive::Float,
            PrimValue::Double(_) => Primitive::Double,
        }
    }

    fn as_i64(self) -> i64 {
        match self {
            PrimValue::Boolean(b) => b as i64,
            PrimValue::Byte(v) => v as i64,
            PrimValue::Char(v) => v as i64,
            PrimValue::Short(v) => v as i64,
            PrimValue::Int(v) => v as i64,
            PrimValue::Long(v) => v,
            PrimValue::Float(v) => v as i64,
            PrimValue::Double(v) => v as i64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            PrimValue::Float(v) => v as f64,
            PrimValue::Double(v) => v,
            other => other.as_i64() as f64,
        }
    }

    /// Value-preserving where possible: integral kinds truncate to the
    /// destination width, booleans keep the low bit.
    pub fn convert(self, to: Primitive) -> PrimValue {
        if self.kind() == to {
            return self;
        }
        match to {
            Primitive::Float => PrimValue::Float(self.as_f64() as f32),
            Primitive::Double => PrimValue::Double(self.as_f64()),
            _ => PrimValue::from_i64(to, self.as_i64()),
        }
    }

    fn from_i64(to: Primitive, v: i64) -> PrimValue {
        match to {
            Primitive::Boolean => PrimValue::Boolean(v & 1 != 0),
            Primitive::Byte => PrimValue::Byte(v as i8),
            Primitive::Char => PrimValue::Char(v as u16),
            Primitive::Short => PrimValue::Short(v as i16),
            Primitive::Int => PrimValue::Int(v as i32),
            Primitive::Long => PrimValue::Long(v),
            Primitive::Float => PrimValue::Float(v as f32),
            Primitive::Double => PrimValue::Double(v as f64),
        }
    }

    fn bits(self) -> u64 {
        match self {
            PrimValue::Float(v) => v.to_bits() as u64,
            PrimValue::Double(v) => v.to_bits(),
            // Single-slot integrals travel sign-extended to 32 bits.
            PrimValue::Long(v) => v as u64,
            other => other.as_i64() as u32 as u64,
        }
    }

    /// Reads the same slot bits as another kind of equal width.
    pub fn reinterpret(self, to: Primitive) -> PrimValue {
        let bits = self.bits();
        match to {
            Primitive::Float => PrimValue::Float(f32::from_bits(bits as u32)),
            Primitive::Double => PrimValue::Double(f64::from_bits(bits)),
            Primitive::Long => PrimValue::Long(bits as i64),
            _ => PrimValue::from_i64(to, bits as u32 as i32 as i64),
        }
    }
}

impl fmt::Display for PrimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimValue::Boolean(v) => write!(f, "{}", v),
            PrimValue::Byte(v) => write!(f, "{}", v),
            PrimValue::Char(v) => match char::from_u32(*v as u32) {
                Some(c) => write!(f, "'{}'", c),
                None => write!(f, "'\\u{{{:04x}}}'", v),
            },
            PrimValue::Short(v) => write!(f, "{}", v),
            PrimValue::Int(v) => write!(f, "{}", v),
            PrimValue::Long(v) => write!(f, "{}L", v),
            PrimValue::Float(v) => write!(f, "{}f", v),
            PrimValue::Double(v) => write!(f, "{}", v),
        }
    }
}

/// A runtime value flowing through an adapter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'t> {
    /// The result of a `void` call.
    Void,
    Null,
    Prim(PrimValue),
    Str(Arc<str>),
    /// A wrapper instance (`Integer`, `Double`, ...).
    Boxed(PrimValue),
    Array {
        ty: &'t Type<'t>,
        items: Arc<[Value<'t>]>,
    },
    /// An opaque instance of some registered class.
    Object(&'t Type<'t>),
}

impl<'t> Value<'t> {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn int(v: i32) -> Self {
        Value::Prim(PrimValue::Int(v))
    }

    pub fn long(v: i64) -> Self {
        Value::Prim(PrimValue::Long(v))
    }

    pub fn double(v: f64) -> Self {
        Value::Prim(PrimValue::Double(v))
    }

    pub fn array(ty: &'t Type<'t>, items: impl IntoIterator<Item = Value<'t>>) -> Self {
        Value::Array {
            ty,
            items: items.into_iter().collect(),
        }
    }

    pub fn as_prim(&self) -> Option<PrimValue> {
        match self {
            Value::Prim(prim) => Some(*prim),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Class of a non-null reference value.
    pub fn runtime_type(&self, builtins: &Builtins<'t>) -> Option<&'t Type<'t>> {
        match self {
            Value::Str(_) => Some(builtins.string),
            Value::Boxed(prim) => Some(builtins.wrapper(prim.kind())),
            Value::Array { ty, .. } | Value::Object(ty) => Some(ty),
            Value::Void | Value::Null | Value::Prim(_) => None,
        }
    }

    /// Whether a checked cast to `ty` succeeds. `null` passes every cast.
    pub fn is_instance_of(&self, ty: &Type<'t>, builtins: &Builtins<'t>) -> bool {
        match self {
            Value::Null => ty.is_reference(),
            _ => self
                .runtime_type(builtins)
                .is_some_and(|rt| ty.is_assignable_from(rt)),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Null => write!(f, "null"),
            Value::Prim(prim) => write!(f, "{}", prim),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Boxed(prim) => write!(f, "{}({})", prim.kind().wrapper_name(), prim),
            Value::Array { items, .. } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(ty) => write!(f, "{}@", ty),
        }
    }
}
