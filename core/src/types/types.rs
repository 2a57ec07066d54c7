use core::fmt::{self, Display};

/// Primitive value kinds.
///
/// `Long` and `Double` are the double-width kinds: they occupy two stack
/// slots when passed as arguments. Everything else occupies one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Primitive {
    Boolean = 0,
    Byte = 1,
    Char = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Float = 6,
    Double = 7,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ];

    pub fn is_floating(self) -> bool {
        matches!(self, Primitive::Float | Primitive::Double)
    }

    /// Boolean and char count as (unsigned) integral kinds.
    pub fn is_integral(self) -> bool {
        !self.is_floating()
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::Short | Primitive::Int | Primitive::Long
        )
    }

    /// Integral kinds that travel as a single 32-bit word.
    pub fn is_subword_or_int(self) -> bool {
        self.is_integral() && self.bit_width() <= 32
    }

    pub fn bit_width(self) -> u32 {
        match self {
            Primitive::Boolean => 1,
            Primitive::Byte => 8,
            Primitive::Char | Primitive::Short => 16,
            Primitive::Int | Primitive::Float => 32,
            Primitive::Long | Primitive::Double => 64,
        }
    }

    pub fn slot_size(self) -> usize {
        match self {
            Primitive::Long | Primitive::Double => 2,
            _ => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Char => "char",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// Name of the reference class that boxes this primitive.
    pub fn wrapper_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Char => "Character",
            Primitive::Short => "Short",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reference class (or interface) known to the type manager.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Class<'a> {
    pub name: &'a str,
    pub superclass: Option<&'a Type<'a>>,
    pub interfaces: &'a [&'a Type<'a>],
    pub is_interface: bool,
    /// Set on wrapper classes: the primitive this class boxes.
    pub unboxes_to: Option<Primitive>,
}

impl<'a> Class<'a> {
    /// The root of the class hierarchy has no superclass and is not an interface.
    pub fn is_root(&self) -> bool {
        self.superclass.is_none() && !self.is_interface
    }

    fn supertypes(&self) -> impl Iterator<Item = &'a Type<'a>> + '_ {
        self.superclass.into_iter().chain(self.interfaces.iter().copied())
    }
}

/// A value type as seen by the adapter engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type<'a> {
    Void,
    /// The type of the `null` literal: convertible to every reference type.
    Null,
    Primitive(Primitive),
    Class(&'a Class<'a>),
    Array(&'a Type<'a>),
}

impl<'a> Type<'a> {
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Null | Type::Class(_) | Type::Array(_))
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, Type::Class(class) if class.is_interface)
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(prim) => Some(*prim),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&'a Class<'a>> {
        match self {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&'a Type<'a>> {
        match self {
            Type::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// The primitive this type unboxes to, if it is a wrapper class.
    pub fn unboxed(&self) -> Option<Primitive> {
        self.as_class().and_then(|class| class.unboxes_to)
    }

    /// Number of argument stack slots a value of this type occupies.
    pub fn slot_size(&self) -> usize {
        match self {
            Type::Void => 0,
            Type::Primitive(prim) => prim.slot_size(),
            _ => 1,
        }
    }

    /// Whether a value of type `src` may be stored into a variable of this
    /// type without any check (plain subtyping; interfaces are honored).
    pub fn is_assignable_from(&self, src: &Type<'a>) -> bool {
        if core::ptr::eq(self, src) || self == src {
            return true;
        }
        match (self, src) {
            (_, Type::Null) => self.is_reference(),
            (Type::Class(dst), _) if dst.is_root() => src.is_reference(),
            (Type::Class(_), Type::Class(class)) => {
                class.supertypes().any(|sup| self.is_assignable_from(sup))
            }
            (Type::Array(dst_elem), Type::Array(src_elem)) => {
                if dst_elem.is_reference() && src_elem.is_reference() {
                    dst_elem.is_assignable_from(src_elem)
                } else {
                    dst_elem == src_elem
                }
            }
            _ => false,
        }
    }
}

impl Display for Type<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Null => write!(f, "null"),
            Type::Primitive(prim) => write!(f, "{}", prim),
            Type::Class(class) => write!(f, "{}", class.name),
            Type::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}
