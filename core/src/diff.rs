//! Positional comparison of two signatures.
//!
//! The comparison is directional: `adapter` is the caller-facing type whose
//! values flow into `target`. A position is "different" when its value
//! cannot be passed without runtime action under the chosen [`Mode`].

use crate::conversion::{Mode, Pass, can_pass};
use crate::types::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diff {
    /// Every compared position passes trivially.
    Zero,
    /// Exactly one position differs.
    Single(usize),
    /// Two or more positions differ; carries the first one.
    Multiple(usize),
    /// Return types or arities cannot be reconciled.
    Incompatible,
}

impl Diff {
    /// The position of the only difference, if there is exactly one.
    pub fn sole(self) -> Option<usize> {
        match self {
            Diff::Single(pos) => Some(pos),
            _ => None,
        }
    }
}

/// Compares `n` parameters of `adapter` starting at `astart` with `n`
/// parameters of `target` starting at `tstart`. Positions in the result are
/// relative to `astart`.
pub fn diff_params(
    adapter: &Signature<'_>,
    astart: usize,
    target: &Signature<'_>,
    tstart: usize,
    n: usize,
    mode: Mode,
) -> Diff {
    if astart + n > adapter.param_count() || tstart + n > target.param_count() {
        return Diff::Incompatible;
    }
    let mut found = None;
    for i in 0..n {
        let src = adapter.param(astart + i);
        let dst = target.param(tstart + i);
        if can_pass(src, dst, mode) != Pass::Trivial {
            if let Some(first) = found {
                return Diff::Multiple(first);
            }
            found = Some(i);
        }
    }
    found.map_or(Diff::Zero, Diff::Single)
}

/// Whether the target's result may be handed back as the adapter's result.
///
/// Only trivial return conversions exist; raw mode also lets a trusted
/// caller receive any reference as any other reference.
pub fn return_types_match(adapter: &Signature<'_>, target: &Signature<'_>, mode: Mode) -> bool {
    let src = target.ret();
    let dst = adapter.ret();
    if can_pass(src, dst, mode) == Pass::Trivial {
        return true;
    }
    mode == Mode::Raw && src.is_reference() && dst.is_reference()
}

/// Full comparison: return type, arity, then every parameter.
pub fn diff_types(adapter: &Signature<'_>, target: &Signature<'_>, mode: Mode) -> Diff {
    if !return_types_match(adapter, target, mode) {
        return Diff::Incompatible;
    }
    let nargs = adapter.param_count();
    if nargs != target.param_count() {
        return Diff::Incompatible;
    }
    diff_params(adapter, 0, target, 0, nargs, mode)
}

/// True when the given ranges compare as [`Diff::Zero`] in checked mode.
pub(crate) fn params_match(
    adapter: &Signature<'_>,
    astart: usize,
    target: &Signature<'_>,
    tstart: usize,
    n: usize,
) -> bool {
    diff_params(adapter, astart, target, tstart, n, Mode::Checked) == Diff::Zero
}
