use core::fmt;

use bitflags::bitflags;

use crate::adapter::encoding::BasicType;
use crate::types::{Primitive, Type};

/// Adapter operation codes.
///
/// The discriminants are the opcodes of the classic adapter descriptor
/// layout; see [`crate::adapter::encoding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpKind {
    RetypeOnly = 0x0,
    RetypeRaw = 0x1,
    CheckCast = 0x2,
    PrimToPrim = 0x3,
    RefToPrim = 0x4,
    PrimToRef = 0x5,
    SwapArgs = 0x6,
    RotateArgs = 0x7,
    DupArgs = 0x8,
    DropArgs = 0x9,
    CollectArgs = 0xA,
    SpreadArgs = 0xB,
    Flyby = 0xC,
    Ricochet = 0xD,
}

impl OpKind {
    pub const ALL: [OpKind; 14] = [
        OpKind::RetypeOnly,
        OpKind::RetypeRaw,
        OpKind::CheckCast,
        OpKind::PrimToPrim,
        OpKind::RefToPrim,
        OpKind::PrimToRef,
        OpKind::SwapArgs,
        OpKind::RotateArgs,
        OpKind::DupArgs,
        OpKind::DropArgs,
        OpKind::CollectArgs,
        OpKind::SpreadArgs,
        OpKind::Flyby,
        OpKind::Ricochet,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<OpKind> {
        OpKind::ALL.get(code as usize).copied()
    }

    pub fn bit(self) -> OpSet {
        OpSet::from_bits_retain(1 << self.code())
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpKind::RetypeOnly => "retype_only",
            OpKind::RetypeRaw => "retype_raw",
            OpKind::CheckCast => "check_cast",
            OpKind::PrimToPrim => "prim_to_prim",
            OpKind::RefToPrim => "ref_to_prim",
            OpKind::PrimToRef => "prim_to_ref",
            OpKind::SwapArgs => "swap_args",
            OpKind::RotateArgs => "rotate_args",
            OpKind::DupArgs => "dup_args",
            OpKind::DropArgs => "drop_args",
            OpKind::CollectArgs => "collect_args",
            OpKind::SpreadArgs => "spread_args",
            OpKind::Flyby => "flyby",
            OpKind::Ricochet => "ricochet",
        }
    }
}

bitflags! {
    /// The set of adapter operations the host VM knows how to execute.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct OpSet: u16 {
        const RETYPE_ONLY = 1 << 0x0;
        const RETYPE_RAW = 1 << 0x1;
        const CHECK_CAST = 1 << 0x2;
        const PRIM_TO_PRIM = 1 << 0x3;
        const REF_TO_PRIM = 1 << 0x4;
        const PRIM_TO_REF = 1 << 0x5;
        const SWAP_ARGS = 1 << 0x6;
        const ROTATE_ARGS = 1 << 0x7;
        const DUP_ARGS = 1 << 0x8;
        const DROP_ARGS = 1 << 0x9;
        const COLLECT_ARGS = 1 << 0xA;
        const SPREAD_ARGS = 1 << 0xB;
        const FLYBY = 1 << 0xC;
        const RICOCHET = 1 << 0xD;

        /// Everything the factory can build.
        const ELEMENTARY = Self::RETYPE_ONLY.bits()
            | Self::RETYPE_RAW.bits()
            | Self::CHECK_CAST.bits()
            | Self::PRIM_TO_PRIM.bits()
            | Self::REF_TO_PRIM.bits()
            | Self::SWAP_ARGS.bits()
            | Self::ROTATE_ARGS.bits()
            | Self::DUP_ARGS.bits()
            | Self::DROP_ARGS.bits()
            | Self::SPREAD_ARGS.bits();
    }
}

impl Default for OpSet {
    fn default() -> Self {
        OpSet::ELEMENTARY
    }
}

/// One elementary conversion, as carried by an adapter node.
///
/// Argument positions are in terms of the node's own (caller-facing)
/// signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion<'t> {
    RetypeOnly,
    RetypeRaw,
    CheckCast {
        arg: usize,
        class: &'t Type<'t>,
    },
    PrimToPrim {
        arg: usize,
        from: Primitive,
        to: Primitive,
    },
    RefToPrim {
        arg: usize,
        to: Primitive,
        wrapper: &'t Type<'t>,
    },
    DropArgs {
        pos: usize,
        count: usize,
        slots: usize,
    },
    DupArgs {
        pos: usize,
        count: usize,
        slots: usize,
    },
    SwapArgs {
        first: usize,
        second: usize,
        basic: BasicType,
        dest_slot: usize,
    },
    /// The run `first..first + count` reaches the target rotated right by
    /// `by`. Exactly one argument (`moved`) crosses the rest of the run.
    RotateArgs {
        first: usize,
        count: usize,
        by: usize,
        moved: usize,
        basic: BasicType,
        dest_slot: usize,
    },
    SpreadArgs {
        pos: usize,
        count: usize,
        array_type: &'t Type<'t>,
        slots: usize,
    },
}

impl<'t> Conversion<'t> {
    pub fn op(&self) -> OpKind {
        match self {
            Conversion::RetypeOnly => OpKind::RetypeOnly,
            Conversion::RetypeRaw => OpKind::RetypeRaw,
            Conversion::CheckCast { .. } => OpKind::CheckCast,
            Conversion::PrimToPrim { .. } => OpKind::PrimToPrim,
            Conversion::RefToPrim { .. } => OpKind::RefToPrim,
            Conversion::DropArgs { .. } => OpKind::DropArgs,
            Conversion::DupArgs { .. } => OpKind::DupArgs,
            Conversion::SwapArgs { .. } => OpKind::SwapArgs,
            Conversion::RotateArgs { .. } => OpKind::RotateArgs,
            Conversion::SpreadArgs { .. } => OpKind::SpreadArgs,
        }
    }

    /// The argument position recorded in the descriptor. Retypes have none.
    ///
    /// Drops and dups record the last affected position; rotations record
    /// the argument that moves.
    pub fn arg_pos(&self) -> Option<usize> {
        match *self {
            Conversion::RetypeOnly | Conversion::RetypeRaw => None,
            Conversion::CheckCast { arg, .. }
            | Conversion::PrimToPrim { arg, .. }
            | Conversion::RefToPrim { arg, .. } => Some(arg),
            Conversion::DropArgs { pos, count, .. } | Conversion::DupArgs { pos, count, .. } => {
                Some(pos + count - 1)
            }
            Conversion::SwapArgs { first, .. } => Some(first),
            Conversion::RotateArgs { moved, .. } => Some(moved),
            Conversion::SpreadArgs { pos, .. } => Some(pos),
        }
    }

    /// How many argument positions the step touches.
    pub fn arg_count(&self) -> usize {
        match *self {
            Conversion::RetypeOnly | Conversion::RetypeRaw => 0,
            Conversion::CheckCast { .. }
            | Conversion::PrimToPrim { .. }
            | Conversion::RefToPrim { .. }
            | Conversion::SpreadArgs { .. } => 1,
            Conversion::SwapArgs { .. } => 2,
            Conversion::DropArgs { count, .. }
            | Conversion::DupArgs { count, .. }
            | Conversion::RotateArgs { count, .. } => count,
        }
    }

    /// Net number of argument slots pushed by the step (negative for pops).
    pub fn stack_move(&self) -> i32 {
        match *self {
            Conversion::RetypeOnly
            | Conversion::RetypeRaw
            | Conversion::CheckCast { .. }
            | Conversion::SwapArgs { .. }
            | Conversion::RotateArgs { .. } => 0,
            Conversion::PrimToPrim { from, to, .. } => to.slot_size() as i32 - from.slot_size() as i32,
            Conversion::RefToPrim { to, .. } => to.slot_size() as i32 - 1,
            Conversion::DropArgs { slots, .. } => -(slots as i32),
            Conversion::DupArgs { slots, .. } => slots as i32,
            Conversion::SpreadArgs { slots, .. } => slots as i32 - 1,
        }
    }

    pub fn src_type(&self) -> Option<BasicType> {
        match *self {
            Conversion::CheckCast { .. } | Conversion::RefToPrim { .. } => Some(BasicType::Object),
            Conversion::PrimToPrim { from, .. } => Some(BasicType::from(from)),
            Conversion::SwapArgs { basic, .. } | Conversion::RotateArgs { basic, .. } => Some(basic),
            Conversion::SpreadArgs { .. } => Some(BasicType::Object),
            _ => None,
        }
    }

    pub fn dest_type(&self) -> Option<BasicType> {
        match *self {
            Conversion::CheckCast { .. } => Some(BasicType::Object),
            Conversion::PrimToPrim { to, .. } | Conversion::RefToPrim { to, .. } => {
                Some(BasicType::from(to))
            }
            Conversion::SwapArgs { basic, .. } | Conversion::RotateArgs { basic, .. } => Some(basic),
            Conversion::SpreadArgs { .. } => Some(BasicType::Object),
            _ => None,
        }
    }

    /// Extra type operand: cast class, box class or spread array type.
    pub fn witness(&self) -> Option<&'t Type<'t>> {
        match *self {
            Conversion::CheckCast { class, .. } => Some(class),
            Conversion::RefToPrim { wrapper, .. } => Some(wrapper),
            Conversion::SpreadArgs { array_type, .. } => Some(array_type),
            _ => None,
        }
    }
}

impl fmt::Display for Conversion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.op().mnemonic();
        match self {
            Conversion::RetypeOnly | Conversion::RetypeRaw => write!(f, "{}", name),
            Conversion::CheckCast { arg, class } => write!(f, "{}({}, {})", name, arg, class),
            Conversion::PrimToPrim { arg, from, to } => {
                write!(f, "{}({}, {} -> {})", name, arg, from, to)
            }
            Conversion::RefToPrim { arg, to, wrapper } => {
                write!(f, "{}({}, {} -> {})", name, arg, wrapper, to)
            }
            Conversion::DropArgs { pos, count, .. } | Conversion::DupArgs { pos, count, .. } => {
                write!(f, "{}({}, {})", name, pos, count)
            }
            Conversion::SwapArgs { first, second, .. } => {
                write!(f, "{}({}, {})", name, first, second)
            }
            Conversion::RotateArgs {
                first, count, by, ..
            } => write!(f, "{}({}, {}, {})", name, first, count, by),
            Conversion::SpreadArgs {
                pos,
                count,
                array_type,
                ..
            } => write!(f, "{}({}, {}, {})", name, pos, array_type, count),
        }
    }
}
