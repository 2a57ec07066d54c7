//! Argument reordering.
//!
//! An argument map says, for every target parameter, which caller argument
//! feeds it. Caller arguments may be used once, several times or not at
//! all. The planner lowers the map to a list of [`Shuffle`]s (drops, then
//! duplications, then swaps and single-argument rotations) and stacks one
//! elementary adapter per shuffle.

use core::cmp::Reverse;

use tracing::debug;

use crate::adapter::factory::Adapters;
use crate::adapter::handle::Handle;
use crate::adapter::op::OpKind;
use crate::adapter::pairwise::broken_invariant;
use crate::api::{AdaptError, Result};
use crate::conversion::is_null_conversion;
use crate::types::Signature;

/// One reordering step, applied to the argument list on its way from the
/// caller to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shuffle {
    Drop { pos: usize, count: usize },
    /// Appends copies of `pos..pos + count`.
    Dup { pos: usize, count: usize },
    Swap { first: usize, second: usize },
    /// Rotates `first..first + count` right by `by`.
    Rotate { first: usize, count: usize, by: usize },
}

impl Shuffle {
    pub(crate) fn apply<T: Clone>(self, args: &mut Vec<T>) {
        match self {
            Shuffle::Drop { pos, count } => {
                args.drain(pos..pos + count);
            }
            Shuffle::Dup { pos, count } => {
                let copies = args[pos..pos + count].to_vec();
                args.extend(copies);
            }
            Shuffle::Swap { first, second } => args.swap(first, second),
            Shuffle::Rotate { first, count, by } => args[first..first + count].rotate_right(by),
        }
    }

    fn span(self) -> usize {
        match self {
            Shuffle::Swap { first, second } => second - first + 1,
            Shuffle::Rotate { count, .. } | Shuffle::Drop { count, .. } | Shuffle::Dup { count, .. } => {
                count
            }
        }
    }

    fn is_swap(self) -> bool {
        matches!(self, Shuffle::Swap { .. })
    }
}

/// Lowers `map` to shuffles over caller arguments whose slot widths are
/// `widths`. Applying the result to `0..widths.len()` yields `map`.
pub(crate) fn plan_shuffles(widths: &[usize], map: &[usize]) -> Vec<Shuffle> {
    let n = widths.len();
    let mut uses = vec![0usize; n];
    for &j in map {
        uses[j] += 1;
    }

    let mut plan = Vec::new();
    let mut cur: Vec<usize> = (0..n).collect();

    // Unused arguments go first, right to left so earlier positions hold.
    let mut end = n;
    while end > 0 {
        if uses[end - 1] != 0 {
            end -= 1;
            continue;
        }
        let mut start = end - 1;
        while start > 0 && uses[start - 1] == 0 {
            start -= 1;
        }
        push(&mut plan, &mut cur, Shuffle::Drop {
            pos: start,
            count: end - start,
        });
        end = start;
    }

    // Copies are appended, so positions of the originals never move.
    let mut extra: Vec<usize> = cur.iter().map(|&j| uses[j] - 1).collect();
    while extra.iter().any(|&e| e > 0) {
        let mut pos = 0;
        while pos < extra.len() {
            if extra[pos] == 0 {
                pos += 1;
                continue;
            }
            let start = pos;
            while pos < extra.len() && extra[pos] > 0 {
                extra[pos] -= 1;
                pos += 1;
            }
            push(&mut plan, &mut cur, Shuffle::Dup {
                pos: start,
                count: pos - start,
            });
        }
    }
    debug_assert_eq!(cur.len(), map.len());

    let width = |j: usize| widths[j];
    let m = map.len();
    for i in 0..m {
        if cur[i] == map[i] {
            continue;
        }
        let wanted = map[i];
        let mut candidates = Vec::new();
        for k in i + 1..m {
            if cur[k] == wanted {
                if width(cur[i]) == width(cur[k]) {
                    candidates.push(Shuffle::Swap { first: i, second: k });
                }
                if k >= i + 2 {
                    candidates.push(Shuffle::Rotate {
                        first: i,
                        count: k - i + 1,
                        by: 1,
                    });
                }
            }
            if k >= i + 2 && cur[i + 1] == wanted {
                let count = k - i + 1;
                candidates.push(Shuffle::Rotate {
                    first: i,
                    count,
                    by: count - 1,
                });
            }
        }

        let score = |shuffle: Shuffle| {
            let mut next = cur.clone();
            shuffle.apply(&mut next);
            (i..m).filter(|&p| next[p] == map[p]).count()
        };
        let best = candidates
            .into_iter()
            .max_by_key(|&s| (score(s), s.is_swap(), Reverse(s.span())));

        match best {
            Some(shuffle) => push(&mut plan, &mut cur, shuffle),
            None => {
                // Only an adjacent pair of different widths at the very end
                // is left. Exchange it around the fixed argument before it,
                // or with no such argument, copy the left one past the right
                // one and drop the original.
                debug_assert!(i + 2 == m && cur[i + 1] == wanted);
                if i == 0 {
                    push(&mut plan, &mut cur, Shuffle::Dup { pos: i, count: 1 });
                    push(&mut plan, &mut cur, Shuffle::Drop { pos: i, count: 1 });
                    break;
                }
                let pivot = i - 1;
                if width(cur[pivot]) == width(cur[i + 1]) {
                    push(&mut plan, &mut cur, Shuffle::Swap {
                        first: pivot,
                        second: i + 1,
                    });
                    push(&mut plan, &mut cur, Shuffle::Rotate {
                        first: pivot,
                        count: 3,
                        by: 1,
                    });
                } else {
                    push(&mut plan, &mut cur, Shuffle::Rotate {
                        first: pivot,
                        count: 3,
                        by: 2,
                    });
                    push(&mut plan, &mut cur, Shuffle::Swap {
                        first: pivot,
                        second: i + 1,
                    });
                }
            }
        }
        debug_assert_eq!(cur[i], map[i]);
    }
    debug_assert_eq!(cur, map);
    plan
}

fn push(plan: &mut Vec<Shuffle>, cur: &mut Vec<usize>, shuffle: Shuffle) {
    shuffle.apply(cur);
    plan.push(shuffle);
}

impl<'t> Adapters<'t> {
    /// Checks `map` against both signatures without building anything.
    pub fn can_adapt_with_permutation(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        map: &[usize],
    ) -> bool {
        if self.check_permutation(new, target, map).is_err() {
            return false;
        }
        if is_identity(new, target, map) {
            return self.can_adapt(new, target);
        }
        self.plan_supported(&plan_shuffles(&widths(new), map))
    }

    fn check_permutation(&self, new: &Signature<'t>, target: &Signature<'t>, map: &[usize]) -> Result<()> {
        if map.len() != target.param_count() {
            return Err(AdaptError::bad_permutation(
                map,
                format!("expected {} entries", target.param_count()),
            ));
        }
        if let Some(&j) = map.iter().find(|&&j| j >= new.param_count()) {
            return Err(AdaptError::bad_permutation(
                map,
                format!("caller has no argument {}", j),
            ));
        }
        if is_identity(new, target, map) {
            return Ok(());
        }
        let convertible = is_null_conversion(target.ret(), new.ret())
            && map
                .iter()
                .enumerate()
                .all(|(i, &j)| is_null_conversion(new.param(j), target.param(i)));
        if convertible {
            Ok(())
        } else {
            Err(AdaptError::not_convertible(target, new))
        }
    }

    fn plan_supported(&self, plan: &[Shuffle]) -> bool {
        plan.iter().all(|shuffle| {
            self.supported(match shuffle {
                Shuffle::Drop { .. } => OpKind::DropArgs,
                Shuffle::Dup { .. } => OpKind::DupArgs,
                Shuffle::Swap { .. } => OpKind::SwapArgs,
                Shuffle::Rotate { .. } => OpKind::RotateArgs,
            })
        })
    }

    /// Builds a chain under which target parameter `i` receives caller
    /// argument `map[i]`. Every mapped pair must pass without conversion.
    pub fn adapt_with_permutation(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        map: &[usize],
    ) -> Result<Handle<'t>> {
        self.check_permutation(new, target.signature(), map)?;
        if is_identity(new, target.signature(), map) {
            return self.adapt(new, target);
        }

        let plan = plan_shuffles(&widths(new), map);
        debug!(%new, target = %target.signature(), ?map, ?plan, "permutation plan");

        // Caller-facing type in front of every step.
        let mut state: Vec<usize> = (0..new.param_count()).collect();
        let mut fronts = Vec::with_capacity(plan.len());
        for shuffle in &plan {
            fronts.push(new.with_params(state.iter().map(|&j| new.param(j))));
            shuffle.apply(&mut state);
        }

        let mut adapter = target;
        for (shuffle, front) in plan.iter().zip(&fronts).rev() {
            adapter = match *shuffle {
                Shuffle::Drop { pos, count } => self.drop_arguments(front, adapter, pos, count)?,
                Shuffle::Dup { pos, count } => self.duplicate_arguments(front, adapter, pos, count)?,
                Shuffle::Swap { first, second } => self.swap_arguments(front, adapter, first, second)?,
                Shuffle::Rotate { first, count, by } => {
                    self.rotate_arguments(front, adapter, first, count, by as isize)?
                }
            };
        }
        if adapter.signature() != new {
            adapter = self.retype_only(new, adapter)?;
        }
        broken_invariant(new, adapter.signature())?;
        Ok(adapter)
    }
}

fn is_identity(new: &Signature<'_>, target: &Signature<'_>, map: &[usize]) -> bool {
    new.param_count() == target.param_count() && map.iter().enumerate().all(|(i, &j)| i == j)
}

fn widths(sig: &Signature<'_>) -> Vec<usize> {
    sig.params().iter().map(|ty| ty.slot_size()).collect()
}
