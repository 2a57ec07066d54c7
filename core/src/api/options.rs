//! Configuration options for the adapter factory.

use crate::adapter::OpSet;

/// Describes the host VM the adapters are built for.
///
/// # Example
///
/// ```
/// use rebind_core::adapter::OpSet;
/// use rebind_core::api::AdapterOptions;
///
/// // A host without rotation or spreading support.
/// let options = AdapterOptions {
///     implemented_ops: OpSet::ELEMENTARY - OpSet::ROTATE_ARGS - OpSet::SPREAD_ARGS,
///     ..AdapterOptions::default()
/// };
/// assert!(options.raw_retype);
/// ```
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Adapter operations the host knows how to execute. Asking for any
    /// other operation is answered with `false` by the `can_*` predicates.
    ///
    /// Default: [`OpSet::ELEMENTARY`]
    pub implemented_ops: OpSet,

    /// How a stack address changes per pushed slot. Only used when packing
    /// conversion words.
    ///
    /// Default: -1 (the stack grows down)
    pub stack_move_unit: i32,

    /// Whether trusted callers may request raw retypes (bitwise
    /// reinterpretation of same-width primitives).
    ///
    /// Default: true
    pub raw_retype: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            implemented_ops: OpSet::default(),
            stack_move_unit: -1,
            raw_retype: true,
        }
    }
}
