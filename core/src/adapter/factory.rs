//! Elementary adapters.
//!
//! Each operation comes as a pair: a total `can_*` predicate over the two
//! signatures, and a constructor that re-checks it and wraps the target in
//! exactly one step (a few constructors add a cast step in front). A
//! constructor never returns a handle whose type differs from the one it
//! was asked for.

use tracing::{debug, trace};

use crate::adapter::encoding::{BasicType, ConvWord};
use crate::adapter::handle::{AdapterNode, Handle};
use crate::adapter::op::{Conversion, OpKind};
use crate::api::{AdaptError, AdapterOptions, Result, UnsupportedOp};
use crate::conversion::{self, Mode, is_null_conversion};
use crate::diff::{Diff, diff_types, params_match, return_types_match};
use crate::types::{Builtins, Signature, Type};

/// Rotations move at most this many arguments across the rest of the run.
pub const MAX_ARG_ROTATION: usize = 1;

/// Builds adapter chains for one host VM.
#[derive(Debug, Clone)]
pub struct Adapters<'t> {
    builtins: &'t Builtins<'t>,
    options: AdapterOptions,
}

/// Normalizes a rotation amount into `0..count`.
pub fn positive_rotation(count: usize, by: isize) -> usize {
    if count == 0 {
        return 0;
    }
    (by as i128).rem_euclid(count as i128) as usize
}

fn refuse(new: &Signature<'_>, target: &Signature<'_>) -> AdaptError {
    debug!(%new, %target, "adapter refused");
    AdaptError::not_convertible(target, new)
}

impl<'t> Adapters<'t> {
    pub fn new(builtins: &'t Builtins<'t>, options: AdapterOptions) -> Self {
        Self { builtins, options }
    }

    pub fn with_defaults(builtins: &'t Builtins<'t>) -> Self {
        Self::new(builtins, AdapterOptions::default())
    }

    pub fn builtins(&self) -> &'t Builtins<'t> {
        self.builtins
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    pub fn supported(&self, op: OpKind) -> bool {
        self.options.implemented_ops.contains(op.bit())
    }

    /// Packs a node's conversion using the host's stack move unit.
    pub fn conv_word(&self, node: &AdapterNode<'t>) -> ConvWord {
        node.encode(self.options.stack_move_unit)
    }

    fn wrap(&self, target: Handle<'t>, new: &Signature<'t>, conversion: Conversion<'t>) -> Handle<'t> {
        AdapterNode::wrap(target, new.clone(), conversion)
    }

    // Retyping

    pub fn can_retype(&self, new: &Signature<'t>, target: &Signature<'t>, mode: Mode) -> bool {
        let gate = match mode {
            Mode::Checked => self.supported(OpKind::RetypeOnly),
            Mode::Raw => self.options.raw_retype && self.supported(OpKind::RetypeRaw),
        };
        gate && diff_types(new, target, mode) == Diff::Zero
    }

    pub fn can_retype_only(&self, new: &Signature<'t>, target: &Signature<'t>) -> bool {
        self.can_retype(new, target, Mode::Checked)
    }

    /// Also allows bitwise reinterpretation of same-width primitives and
    /// unchecked reference returns. The caller must be trusted.
    pub fn can_retype_raw(&self, new: &Signature<'t>, target: &Signature<'t>) -> bool {
        self.can_retype(new, target, Mode::Raw)
    }

    pub fn retype(&self, new: &Signature<'t>, target: Handle<'t>, mode: Mode) -> Result<Handle<'t>> {
        if target.signature() == new {
            return Ok(target);
        }
        if !self.can_retype(new, target.signature(), mode) {
            return Err(refuse(new, target.signature()));
        }
        let conversion = match mode {
            Mode::Checked => Conversion::RetypeOnly,
            Mode::Raw => Conversion::RetypeRaw,
        };
        Ok(self.wrap(target, new, conversion))
    }

    pub fn retype_only(&self, new: &Signature<'t>, target: Handle<'t>) -> Result<Handle<'t>> {
        self.retype(new, target, Mode::Checked)
    }

    pub fn retype_raw(&self, new: &Signature<'t>, target: Handle<'t>) -> Result<Handle<'t>> {
        self.retype(new, target, Mode::Raw)
    }

    // Single-argument conversions

    fn sole_difference(&self, new: &Signature<'t>, target: &Signature<'t>, arg: usize) -> bool {
        diff_types(new, target, Mode::Checked) == Diff::Single(arg)
    }

    /// Any two reference types may be cast, even unrelated ones; `class`
    /// must pass to the target parameter for free.
    pub fn can_check_cast(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        arg: usize,
        class: &Type<'t>,
    ) -> bool {
        self.supported(OpKind::CheckCast)
            && self.sole_difference(new, target, arg)
            && conversion::can_check_cast(new.param(arg), class)
            && is_null_conversion(class, target.param(arg))
    }

    pub fn check_cast(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        arg: usize,
        class: &'t Type<'t>,
    ) -> Result<Handle<'t>> {
        if !self.can_check_cast(new, target.signature(), arg, class) {
            return Err(refuse(new, target.signature()));
        }
        Ok(self.wrap(target, new, Conversion::CheckCast { arg, class }))
    }

    pub fn can_prim_cast(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        arg: usize,
        conv_type: &Type<'t>,
    ) -> bool {
        self.supported(OpKind::PrimToPrim)
            && self.sole_difference(new, target, arg)
            && conversion::can_prim_cast(new.param(arg), conv_type)
            && is_null_conversion(conv_type, target.param(arg))
    }

    /// Truncates or extends a primitive argument, or converts between the
    /// single and double width floating kinds.
    pub fn prim_cast(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        arg: usize,
        conv_type: &'t Type<'t>,
    ) -> Result<Handle<'t>> {
        if !self.can_prim_cast(new, target.signature(), arg, conv_type) {
            return Err(refuse(new, target.signature()));
        }
        let (Some(from), Some(to)) = (new.param(arg).as_primitive(), conv_type.as_primitive()) else {
            return Err(refuse(new, target.signature()));
        };
        Ok(self.wrap(target, new, Conversion::PrimToPrim { arg, from, to }))
    }

    /// `conv_type` may name either the primitive or its wrapper class.
    pub fn can_unbox_argument(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        arg: usize,
        conv_type: &Type<'t>,
    ) -> bool {
        let Some(prim) = conv_type.as_primitive().or_else(|| conv_type.unboxed()) else {
            return false;
        };
        self.supported(OpKind::RefToPrim)
            && self.sole_difference(new, target, arg)
            && conversion::can_check_cast(new.param(arg), self.builtins.wrapper(prim))
            && is_null_conversion(self.builtins.primitive(prim), target.param(arg))
    }

    /// Unboxes a reference argument. When the caller's type is not already
    /// the wrapper class, a cast to the wrapper runs first.
    pub fn unbox_argument(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        arg: usize,
        conv_type: &'t Type<'t>,
    ) -> Result<Handle<'t>> {
        if !self.can_unbox_argument(new, target.signature(), arg, conv_type) {
            return Err(refuse(new, target.signature()));
        }
        let Some(to) = conv_type.as_primitive().or_else(|| conv_type.unboxed()) else {
            return Err(refuse(new, target.signature()));
        };
        let wrapper = self.builtins.wrapper(to);
        let unbox = Conversion::RefToPrim { arg, to, wrapper };
        if is_null_conversion(new.param(arg), wrapper) {
            return Ok(self.wrap(target, new, unbox));
        }
        let cast_done = new.with_param(arg, wrapper);
        let adapter = self.wrap(target, &cast_done, unbox);
        self.check_cast(new, adapter, arg, wrapper)
    }

    /// Boxing needs an allocation in the middle of a chain; never available.
    pub fn can_box_argument(
        &self,
        new: &Signature<'t>,
        _target: &Signature<'t>,
        arg: usize,
        conv_type: &Type<'t>,
    ) -> bool {
        self.supported(OpKind::PrimToRef)
            && arg < new.param_count()
            && conversion::can_box_argument(new.param(arg), conv_type)
    }

    pub fn box_argument(
        &self,
        new: &Signature<'t>,
        _target: Handle<'t>,
        arg: usize,
        conv_type: &'t Type<'t>,
    ) -> Result<Handle<'t>> {
        debug!(%new, arg, %conv_type, "boxing requested");
        Err(AdaptError::Unsupported(UnsupportedOp::Boxing))
    }

    // Argument list surgery

    /// The caller passes `count` extra arguments at `pos` that the target
    /// does not take.
    pub fn can_drop_arguments(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        pos: usize,
        count: usize,
    ) -> bool {
        if count == 0 {
            return self.can_retype_only(new, target);
        }
        let n = new.param_count();
        let Some(after) = pos.checked_add(count) else {
            return false;
        };
        self.supported(OpKind::DropArgs)
            && return_types_match(new, target, Mode::Checked)
            && pos < n
            && after <= n
            && target.param_count() == n - count
            && params_match(new, 0, target, 0, pos)
            && params_match(new, after, target, pos, n - after)
    }

    pub fn drop_arguments(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        pos: usize,
        count: usize,
    ) -> Result<Handle<'t>> {
        if count == 0 {
            return self.retype_only(new, target);
        }
        if !self.can_drop_arguments(new, target.signature(), pos, count) {
            return Err(refuse(new, target.signature()));
        }
        let slots = new.slot_depth(pos) - new.slot_depth(pos + count);
        debug_assert_eq!(target.signature().slot_count() + slots, new.slot_count());
        Ok(self.wrap(target, new, Conversion::DropArgs { pos, count, slots }))
    }

    /// The target takes the caller's arguments followed by copies of
    /// `new[pos..pos + count]`.
    pub fn can_duplicate_arguments(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        pos: usize,
        count: usize,
    ) -> bool {
        let n = new.param_count();
        self.supported(OpKind::DupArgs)
            && return_types_match(new, target, Mode::Checked)
            && pos.checked_add(count).is_some_and(|end| end <= n)
            && n.checked_add(count) == Some(target.param_count())
            && params_match(new, 0, target, 0, n)
            && params_match(new, pos, target, n, count)
    }

    pub fn duplicate_arguments(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        pos: usize,
        count: usize,
    ) -> Result<Handle<'t>> {
        if !self.can_duplicate_arguments(new, target.signature(), pos, count) {
            return Err(refuse(new, target.signature()));
        }
        if count == 0 {
            return self.retype_only(new, target);
        }
        let slots = new.slot_depth(pos) - new.slot_depth(pos + count);
        Ok(self.wrap(target, new, Conversion::DupArgs { pos, count, slots }))
    }

    /// Exchanges arguments `first < second`. Both must occupy the same
    /// number of stack slots.
    pub fn can_swap_arguments(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        first: usize,
        second: usize,
    ) -> bool {
        let n = new.param_count();
        self.supported(OpKind::SwapArgs)
            && first < second
            && second < n
            && target.param_count() == n
            && return_types_match(new, target, Mode::Checked)
            && new.param(first).slot_size() == new.param(second).slot_size()
            && params_match(new, 0, target, 0, first)
            && params_match(new, first, target, second, 1)
            && params_match(new, first + 1, target, first + 1, second - first - 1)
            && params_match(new, second, target, first, 1)
            && params_match(new, second + 1, target, second + 1, n - second - 1)
    }

    pub fn swap_arguments(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        first: usize,
        second: usize,
    ) -> Result<Handle<'t>> {
        if first == second {
            return self.retype_only(new, target);
        }
        let (first, second) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        if !self.can_swap_arguments(new, target.signature(), first, second) {
            return Err(refuse(new, target.signature()));
        }
        let conversion = Conversion::SwapArgs {
            first,
            second,
            basic: BasicType::from(new.param(first)),
            dest_slot: new.slot_depth(second + 1),
        };
        Ok(self.wrap(target, new, conversion))
    }

    fn rotation_too_wide(count: usize, by: usize) -> bool {
        by > MAX_ARG_ROTATION && by < count - MAX_ARG_ROTATION
    }

    /// The target sees `new[first..first + count]` rotated right by `by`
    /// (negative amounts rotate left). Runs of two are swaps, not rotations.
    pub fn can_rotate_arguments(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        first: usize,
        count: usize,
        by: isize,
    ) -> bool {
        if !self.supported(OpKind::RotateArgs) || count <= 2 {
            return false;
        }
        let n = new.param_count();
        let Some(limit) = first.checked_add(count).filter(|&limit| limit <= n) else {
            return false;
        };
        let by = positive_rotation(count, by);
        if by == 0 || Self::rotation_too_wide(count, by) {
            return false;
        }
        if target.param_count() != n || !return_types_match(new, target, Mode::Checked) {
            return false;
        }
        let (chunk1, chunk2) = (count - by, by);
        params_match(new, 0, target, 0, first)
            && params_match(new, first, target, limit - chunk1, chunk1)
            && params_match(new, first + chunk1, target, first, chunk2)
            && params_match(new, limit, target, limit, n - limit)
    }

    pub fn rotate_arguments(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        first: usize,
        count: usize,
        by: isize,
    ) -> Result<Handle<'t>> {
        if count > 2 {
            let by = positive_rotation(count, by);
            if by != 0 && Self::rotation_too_wide(count, by) {
                return Err(AdaptError::Unsupported(UnsupportedOp::WideRotation));
            }
        }
        if !self.can_rotate_arguments(new, target.signature(), first, count, by) {
            return Err(refuse(new, target.signature()));
        }
        let by = positive_rotation(count, by);
        let limit = first + count;
        // A single argument crosses the run: the last one moving to the
        // front, or the first one moving to the back.
        let (moved, dest) = if by == 1 {
            (limit - 1, first)
        } else {
            (first, limit - 1)
        };
        let conversion = Conversion::RotateArgs {
            first,
            count,
            by,
            moved,
            basic: BasicType::from(new.param(moved)),
            dest_slot: new.slot_depth(dest + 1),
        };
        Ok(self.wrap(target, new, conversion))
    }

    /// The array argument at `pos` feeds `count` target parameters.
    pub fn can_spread_arguments(
        &self,
        new: &Signature<'t>,
        target: &Signature<'t>,
        array_type: &Type<'t>,
        pos: usize,
        count: usize,
    ) -> bool {
        let n = new.param_count();
        if !self.supported(OpKind::SpreadArgs)
            || pos >= n
            || (n - 1).checked_add(count) != Some(target.param_count())
            || !return_types_match(new, target, Mode::Checked)
        {
            return false;
        }
        let Some(elem) = array_type.element_type() else {
            return false;
        };
        let incoming = new.param(pos);
        if incoming != array_type && !conversion::can_check_cast(incoming, array_type) {
            return false;
        }
        params_match(new, 0, target, 0, pos)
            && params_match(new, pos + 1, target, pos + count, n - pos - 1)
            && (0..count).all(|i| is_null_conversion(elem, target.param(pos + i)))
    }

    pub fn spread_arguments(
        &self,
        new: &Signature<'t>,
        target: Handle<'t>,
        array_type: &'t Type<'t>,
        pos: usize,
        count: usize,
    ) -> Result<Handle<'t>> {
        if !self.can_spread_arguments(new, target.signature(), array_type, pos, count) {
            return Err(refuse(new, target.signature()));
        }
        let target_type = target.signature();
        let slots = target_type.slot_depth(pos) - target_type.slot_depth(pos + count);
        let spread = Conversion::SpreadArgs {
            pos,
            count,
            array_type,
            slots,
        };
        if is_null_conversion(new.param(pos), array_type) {
            return Ok(self.wrap(target, new, spread));
        }
        trace!(pos, %array_type, "spread needs a cast first");
        let cast_done = new.with_param(pos, array_type);
        let adapter = self.wrap(target, &cast_done, spread);
        self.check_cast(new, adapter, pos, array_type)
    }

    // Operations the host cannot run.

    pub fn can_collect_arguments(&self, _new: &Signature<'t>, _target: &Signature<'t>) -> bool {
        false
    }

    pub fn collect_arguments(&self, _new: &Signature<'t>, _target: Handle<'t>) -> Result<Handle<'t>> {
        Err(AdaptError::Unsupported(UnsupportedOp::Collect))
    }

    pub fn can_flyby(&self, _new: &Signature<'t>, _target: &Signature<'t>) -> bool {
        false
    }

    pub fn flyby(&self, _new: &Signature<'t>, _target: Handle<'t>) -> Result<Handle<'t>> {
        Err(AdaptError::Unsupported(UnsupportedOp::Flyby))
    }

    pub fn can_ricochet(&self, _new: &Signature<'t>, _target: &Signature<'t>) -> bool {
        false
    }

    pub fn ricochet(&self, _new: &Signature<'t>, _target: Handle<'t>) -> Result<Handle<'t>> {
        Err(AdaptError::Unsupported(UnsupportedOp::Ricochet))
    }
}
