//! Type compatibility rules for argument and return conversions.
//!
//! Everything here is a pure question about two value types; nothing knows
//! about adapter chains. The adapter factory and the planners build on these
//! answers.
//!
//! Vocabulary:
//!
//! - A **null conversion** needs no runtime action at all: identical types,
//!   reference widening, or subword integral widening that the verifier
//!   already accepts.
//! - A **checked cast** is needed between two reference types that are not
//!   statically related. `null` passes every cast.
//! - **Raw** passing additionally accepts bitwise reinterpretation between
//!   primitives of the same width. Only trusted callers may ask for it.
//!
//! Boxing (primitive to reference) is never possible here: producing a fresh
//! object in the middle of an adapter chain needs allocator cooperation the
//! host cannot give.

use crate::types::{Primitive, Signature, Type};

/// How a value of one type can be passed where another type is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// No runtime action needed.
    Trivial,
    /// Both are references; a checked cast would make it work.
    NeedsCast,
    /// No unchecked pass is possible.
    Never,
}

/// Strictness of unchecked passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Checked,
    Raw,
}

/// Can `src` be used as `dst` with no runtime action?
pub fn is_null_conversion(src: &Type<'_>, dst: &Type<'_>) -> bool {
    if core::ptr::eq(src, dst) || src == dst {
        return true;
    }
    match (src, dst) {
        (_, Type::Void) => true,
        (Type::Null, _) => dst.is_reference(),
        (Type::Primitive(s), Type::Primitive(d)) => is_subword_widening(*s, *d),
        _ if src.is_reference() && dst.is_reference() => {
            // The verifier does not check interface types.
            dst.is_interface() || dst.is_assignable_from(src)
        }
        _ => false,
    }
}

fn is_subword_widening(src: Primitive, dst: Primitive) -> bool {
    if !src.is_subword_or_int() || !dst.is_subword_or_int() {
        return false;
    }
    match (src.is_signed(), dst.is_signed()) {
        (true, false) => false,
        (false, true) => src.bit_width() < dst.bit_width(),
        _ => src.bit_width() <= dst.bit_width(),
    }
}

/// Whole-signature null conversion: calls shaped like `from` can be handed
/// to a callee of type `to` with no action on any argument or the result.
pub fn is_null_signature_conversion(from: &Signature<'_>, to: &Signature<'_>) -> bool {
    from.param_count() == to.param_count()
        && is_null_conversion(to.ret(), from.ret())
        && from
            .params()
            .iter()
            .zip(to.params())
            .all(|(src, dst)| is_null_conversion(src, dst))
}

pub fn can_pass_unchecked(src: &Type<'_>, dst: &Type<'_>) -> Pass {
    if is_null_conversion(src, dst) {
        Pass::Trivial
    } else if src.is_reference() && dst.is_reference() {
        Pass::NeedsCast
    } else {
        Pass::Never
    }
}

/// Like [`can_pass_unchecked`], but also accepts same-width primitive
/// reinterpretation (`int` as `float`, `long` as `double`, `int` as `byte`)
/// and a `void` result read as a one-slot primitive.
pub fn can_pass_raw(src: &Type<'_>, dst: &Type<'_>) -> Pass {
    match (src, dst) {
        (Type::Primitive(s), Type::Primitive(d)) if s.slot_size() == d.slot_size() => Pass::Trivial,
        (Type::Void, Type::Primitive(d)) if d.slot_size() == 1 => Pass::Trivial,
        _ => can_pass_unchecked(src, dst),
    }
}

pub fn can_pass(src: &Type<'_>, dst: &Type<'_>, mode: Mode) -> Pass {
    match mode {
        Mode::Checked => can_pass_unchecked(src, dst),
        Mode::Raw => can_pass_raw(src, dst),
    }
}

/// Can some single elementary adapter turn a `src` argument into `dst`?
pub fn can_convert_argument(src: &Type<'_>, dst: &Type<'_>) -> bool {
    if is_null_conversion(src, dst) {
        true
    } else if src.is_primitive() {
        if dst.is_primitive() {
            can_prim_cast(src, dst)
        } else {
            can_box_argument(src, dst)
        }
    } else if dst.is_primitive() {
        can_unbox_argument(src, dst)
    } else {
        // any two refs can be interconverted
        src.is_reference() && dst.is_reference()
    }
}

/// Primitive conversions stay on one side of the floating/integral divide.
pub fn can_prim_cast(src: &Type<'_>, dst: &Type<'_>) -> bool {
    match (src.as_primitive(), dst.as_primitive()) {
        (Some(s), Some(d)) if s != d => s.is_floating() == d.is_floating(),
        _ => false,
    }
}

pub fn can_check_cast(src: &Type<'_>, dst: &Type<'_>) -> bool {
    src.is_reference() && dst.is_reference()
}

/// `src` is exactly the wrapper class of the primitive `dst`.
pub fn can_unbox(src: &Type<'_>, dst: &Type<'_>) -> bool {
    match dst.as_primitive() {
        Some(prim) => src.unboxed() == Some(prim),
        None => false,
    }
}

/// Unboxing from an arbitrary reference: a cast to the wrapper goes first.
pub fn can_unbox_argument(src: &Type<'_>, dst: &Type<'_>) -> bool {
    src.is_reference() && dst.is_primitive()
}

/// Boxing is never available.
pub fn can_box_argument(_src: &Type<'_>, _dst: &Type<'_>) -> bool {
    false
}
