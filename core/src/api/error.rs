//! Public error types for adapter planning.
//!
//! Every `can_*` predicate is total and answers with a `bool`; the matching
//! constructor reports the reason through [`AdaptError`] instead of handing
//! back a partial chain.

use thiserror::Error;

/// Operations the planner recognizes but can never build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedOp {
    /// Primitive to reference: needs an allocation in the middle of a chain.
    Boxing,
    Collect,
    Flyby,
    Ricochet,
    /// A rotation moving more than one argument across the rest of its run.
    WideRotation,
}

impl core::fmt::Display for UnsupportedOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let what = match self {
            UnsupportedOp::Boxing => "boxing a primitive argument",
            UnsupportedOp::Collect => "collecting arguments",
            UnsupportedOp::Flyby => "flyby adapters",
            UnsupportedOp::Ricochet => "ricochet adapters",
            UnsupportedOp::WideRotation => "rotating more than one argument at once",
        };
        f.write_str(what)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptError {
    #[error("cannot convert {from} to {to}")]
    NotConvertible { from: String, to: String },

    #[error("bad argument map {map:?}: {reason}")]
    BadPermutation { map: Vec<usize>, reason: String },

    #[error("unsupported: {0}")]
    Unsupported(UnsupportedOp),

    /// A planner produced a chain whose type is not the requested one.
    #[error("internal error: built {found}, expected {expected}")]
    Inconsistent { expected: String, found: String },
}

impl AdaptError {
    pub(crate) fn not_convertible(from: impl ToString, to: impl ToString) -> Self {
        AdaptError::NotConvertible {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub(crate) fn bad_permutation(map: &[usize], reason: impl Into<String>) -> Self {
        AdaptError::BadPermutation {
            map: map.to_vec(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = AdaptError> = core::result::Result<T, E>;
