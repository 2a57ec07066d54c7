//! Packed adapter descriptors.
//!
//! In memory every step is a [`Conversion`]. Hosts that want the classic
//! one-word descriptor get it here, and only here:
//!
//! ```text
//! 63          32 31      20 19   16 15   12 11    8 7       0
//! ┌─────────────┬──────────┬───────┬───────┬───────┬─────────┐
//! │   arg pos   │stack move│  src  │ dest  │  op   │ vm info │
//! │  (32 bits)  │ (12 bits)│(4 bit)│(4 bit)│(4 bit)│ (8 bits)│
//! └─────────────┴──────────┴───────┴───────┴───────┴─────────┘
//! ```
//!
//! - `arg pos` is `-1` (all ones) for retypes.
//! - `stack move` is a signed slot count already scaled by the host's stack
//!   move unit (how an address changes per push; `-1` when the stack grows
//!   down).
//! - `vm info` holds the destination slot depth for swaps and rotations.

use core::fmt;

use static_assertions::const_assert_eq;

use crate::adapter::op::{Conversion, OpKind};
use crate::types::{Primitive, Type};

pub const CONV_VMINFO_SHIFT: u32 = 0;
pub const CONV_VMINFO_MASK: u32 = 0x0FF;
pub const CONV_OP_SHIFT: u32 = 8;
pub const CONV_OP_MASK: u32 = 0xF00;
pub const CONV_DEST_TYPE_SHIFT: u32 = 12;
pub const CONV_SRC_TYPE_SHIFT: u32 = 16;
pub const CONV_TYPE_MASK: u32 = 0xF;
pub const CONV_STACK_MOVE_SHIFT: u32 = 20;
pub const CONV_STACK_MOVE_MASK: u32 = (1 << (32 - CONV_STACK_MOVE_SHIFT)) - 1;

/// VM basic type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BasicType {
    Boolean = 4,
    Char = 5,
    Float = 6,
    Double = 7,
    Byte = 8,
    Short = 9,
    Int = 10,
    Long = 11,
    Object = 12,
    Void = 14,
}

impl BasicType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<BasicType> {
        Some(match code {
            4 => BasicType::Boolean,
            5 => BasicType::Char,
            6 => BasicType::Float,
            7 => BasicType::Double,
            8 => BasicType::Byte,
            9 => BasicType::Short,
            10 => BasicType::Int,
            11 => BasicType::Long,
            12 => BasicType::Object,
            14 => BasicType::Void,
            _ => return None,
        })
    }

    pub fn slot_size(self) -> usize {
        match self {
            BasicType::Long | BasicType::Double => 2,
            BasicType::Void => 0,
            _ => 1,
        }
    }
}

impl From<Primitive> for BasicType {
    fn from(prim: Primitive) -> Self {
        match prim {
            Primitive::Boolean => BasicType::Boolean,
            Primitive::Byte => BasicType::Byte,
            Primitive::Char => BasicType::Char,
            Primitive::Short => BasicType::Short,
            Primitive::Int => BasicType::Int,
            Primitive::Long => BasicType::Long,
            Primitive::Float => BasicType::Float,
            Primitive::Double => BasicType::Double,
        }
    }
}

impl From<&Type<'_>> for BasicType {
    fn from(ty: &Type<'_>) -> Self {
        match ty {
            Type::Void => BasicType::Void,
            Type::Primitive(prim) => BasicType::from(*prim),
            _ => BasicType::Object,
        }
    }
}

/// A packed adapter descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConvWord(u64);

const_assert_eq!(core::mem::size_of::<ConvWord>(), 8);

impl ConvWord {
    pub fn from_bits(bits: u64) -> Self {
        ConvWord(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    fn low(self) -> u32 {
        self.0 as u32
    }

    /// Recorded argument position, `None` for the retype sentinel.
    pub fn arg_pos(self) -> Option<usize> {
        let pos = (self.0 >> 32) as i32;
        usize::try_from(pos).ok()
    }

    pub fn op(self) -> Option<OpKind> {
        OpKind::from_code(((self.low() & CONV_OP_MASK) >> CONV_OP_SHIFT) as u8)
    }

    pub fn src_type(self) -> Option<BasicType> {
        BasicType::from_code(((self.low() >> CONV_SRC_TYPE_SHIFT) & CONV_TYPE_MASK) as u8)
    }

    pub fn dest_type(self) -> Option<BasicType> {
        BasicType::from_code(((self.low() >> CONV_DEST_TYPE_SHIFT) & CONV_TYPE_MASK) as u8)
    }

    pub fn vm_info(self) -> u32 {
        (self.low() >> CONV_VMINFO_SHIFT) & CONV_VMINFO_MASK
    }

    /// Slot delta, undoing the host's stack move unit.
    pub fn stack_move(self, stack_move_unit: i32) -> i32 {
        let raw = (self.low() >> CONV_STACK_MOVE_SHIFT) & CONV_STACK_MOVE_MASK;
        // Sign-extend the 12-bit field.
        let sp_change = ((raw << CONV_STACK_MOVE_SHIFT) as i32) >> CONV_STACK_MOVE_SHIFT;
        sp_change / stack_move_unit
    }
}

impl fmt::Debug for ConvWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConvWord({:#018x})", self.0)
    }
}

fn insert_stack_move(stack_move: i32, stack_move_unit: i32) -> u32 {
    let sp_change = stack_move * stack_move_unit;
    ((sp_change as u32) & CONV_STACK_MOVE_MASK) << CONV_STACK_MOVE_SHIFT
}

impl Conversion<'_> {
    /// Packs this step into the one-word descriptor layout.
    pub fn encode(&self, stack_move_unit: i32) -> ConvWord {
        let arg = match self.arg_pos() {
            Some(pos) => pos as u32,
            None => u32::MAX,
        };
        let src = self.src_type().map_or(0, BasicType::code) as u32;
        let dest = self.dest_type().map_or(0, BasicType::code) as u32;
        let vm_info = match *self {
            Conversion::SwapArgs { dest_slot, .. } | Conversion::RotateArgs { dest_slot, .. } => {
                dest_slot as u32 & CONV_VMINFO_MASK
            }
            _ => 0,
        };
        let low = (self.op().code() as u32) << CONV_OP_SHIFT
            | src << CONV_SRC_TYPE_SHIFT
            | dest << CONV_DEST_TYPE_SHIFT
            | insert_stack_move(self.stack_move(), stack_move_unit)
            | vm_info << CONV_VMINFO_SHIFT;
        ConvWord((arg as u64) << 32 | low as u64)
    }
}
