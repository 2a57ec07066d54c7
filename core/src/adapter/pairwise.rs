//! Position-by-position conversion of a whole argument list.

use tracing::debug;

use crate::adapter::factory::Adapters;
use crate::adapter::handle::Handle;
use crate::api::{AdaptError, Result};
use crate::conversion::{can_convert_argument, is_null_conversion, is_null_signature_conversion};
use crate::types::Signature;

impl<'t> Adapters<'t> {
    /// Same arity, a free return conversion, and every argument convertible
    /// by some elementary step.
    pub fn can_adapt(&self, new: &Signature<'t>, target: &Signature<'t>) -> bool {
        new.param_count() == target.param_count()
            && is_null_conversion(target.ret(), new.ret())
            && new
                .params()
                .iter()
                .zip(target.params())
                .all(|(src, dst)| can_convert_argument(src, dst))
    }

    /// Conforms `target` to `new` with casts, primitive conversions and
    /// unboxing, one step per argument that needs real work.
    ///
    /// Steps are stacked from the target outward. The type between two
    /// steps starts as the target's own parameters and moves one position
    /// at a time toward the caller's; the outermost step takes the caller's
    /// type whole, absorbing any trivial differences left over.
    pub fn adapt(&self, new: &Signature<'t>, target: Handle<'t>) -> Result<Handle<'t>> {
        let old = target.signature().clone();
        if old == *new {
            return Ok(target);
        }
        if !self.can_adapt(new, &old) {
            debug!(%new, %old, "no pairwise conversion");
            return Err(AdaptError::not_convertible(&old, new));
        }

        let last_conv = (0..new.param_count())
            .rev()
            .find(|&i| !is_null_conversion(new.param(i), old.param(i)));

        let mut adapter = target;
        if let Some(last_conv) = last_conv {
            let mut mid = old.with_ret(new.ret());
            for i in 0..=last_conv {
                let src = new.param(i);
                let dst = mid.param(i);
                if is_null_conversion(src, dst) {
                    continue;
                }
                mid = if i == last_conv {
                    debug_assert!(is_null_signature_conversion(new, &mid.with_param(i, src)));
                    new.clone()
                } else {
                    mid.with_param(i, src)
                };

                adapter = match (src.is_primitive(), dst.is_primitive()) {
                    (true, true) => self.prim_cast(&mid, adapter, i, dst)?,
                    (true, false) => self.box_argument(&mid, adapter, i, dst)?,
                    // The wrapper must match the primitive exactly.
                    (false, true) => self.unbox_argument(&mid, adapter, i, dst)?,
                    // No hierarchy check: null passes any cast.
                    (false, false) => self.check_cast(&mid, adapter, i, dst)?,
                };
                broken_invariant(&mid, adapter.signature())?;
            }
        }

        if adapter.signature() != new {
            // Only trivial differences remain.
            debug_assert!(last_conv.is_none());
            adapter = self.retype_only(new, adapter)?;
        }
        broken_invariant(new, adapter.signature())?;
        Ok(adapter)
    }
}

/// A planner built something other than what it was asked for.
pub(crate) fn broken_invariant<'a>(expected: &Signature<'a>, found: &Signature<'a>) -> Result<()> {
    debug_assert_eq!(expected, found, "adapter chain has the wrong type");
    if expected == found {
        Ok(())
    } else {
        Err(AdaptError::Inconsistent {
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}
