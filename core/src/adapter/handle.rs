use core::fmt;
use std::sync::Arc;

use static_assertions::assert_impl_all;

use crate::adapter::encoding::ConvWord;
use crate::adapter::op::Conversion;
use crate::types::{Signature, Type};
use crate::vm::{InvokeError, Value};

/// Host function backing a direct handle.
pub type HostFn<'t> = dyn Fn(&[Value<'t>]) -> Result<Value<'t>, InvokeError> + Send + Sync + 't;

/// A callable with a fixed calling convention.
///
/// Adapter chains are built by wrapping handles: each [`AdapterNode`]
/// exclusively owns the handle it forwards to, so a chain is a singly
/// linked list ending in a [`DirectHandle`]. Handles are immutable once
/// built and can be shared between threads.
#[derive(Clone)]
pub enum Handle<'t> {
    Direct(DirectHandle<'t>),
    Adapter(AdapterNode<'t>),
    Collect(CollectNode<'t>),
}

assert_impl_all!(Handle<'static>: Send, Sync, Clone);

impl<'t> Handle<'t> {
    pub fn direct<F>(name: &str, signature: Signature<'t>, body: F) -> Self
    where
        F: Fn(&[Value<'t>]) -> Result<Value<'t>, InvokeError> + Send + Sync + 't,
    {
        Handle::Direct(DirectHandle {
            name: Arc::from(name),
            signature,
            body: Arc::new(body),
        })
    }

    pub fn signature(&self) -> &Signature<'t> {
        match self {
            Handle::Direct(direct) => &direct.signature,
            Handle::Adapter(node) => &node.signature,
            Handle::Collect(node) => &node.signature,
        }
    }

    /// Net slot change performed by this handle before it forwards the call.
    pub fn stack_move(&self) -> i32 {
        match self {
            Handle::Direct(_) => 0,
            Handle::Adapter(node) => node.conversion.stack_move(),
            Handle::Collect(node) => node.stack_move(),
        }
    }

    /// The handle this one forwards to, if it is not a direct handle.
    pub fn target(&self) -> Option<&Handle<'t>> {
        match self {
            Handle::Direct(_) => None,
            Handle::Adapter(node) => Some(&node.target),
            Handle::Collect(node) => Some(&node.target),
        }
    }

    pub fn conversion(&self) -> Option<&Conversion<'t>> {
        match self {
            Handle::Adapter(node) => Some(&node.conversion),
            _ => None,
        }
    }

    /// This handle followed by every handle it (transitively) forwards to.
    pub fn chain(&self) -> impl Iterator<Item = &Handle<'t>> {
        core::iter::successors(Some(self), |handle| handle.target())
    }

    /// Name of the direct handle at the end of the chain.
    pub fn name(&self) -> &str {
        match self.chain().last() {
            Some(Handle::Direct(direct)) => &direct.name,
            _ => "",
        }
    }

    pub fn is_adapter(&self) -> bool {
        !matches!(self, Handle::Direct(_))
    }
}

impl fmt::Display for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Direct(direct) => write!(f, "{}{}", direct.name, direct.signature),
            Handle::Adapter(node) => write!(f, "{}", node),
            Handle::Collect(node) => write!(
                f,
                "{} via collect_args({}, {}, {})",
                node.signature, node.pos, node.array_type, node.count
            ),
        }
    }
}

impl fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.chain().map(|handle| handle.to_string()).collect();
        f.debug_list().entries(steps).finish()
    }
}

/// A host function: the end of every chain.
#[derive(Clone)]
pub struct DirectHandle<'t> {
    name: Arc<str>,
    signature: Signature<'t>,
    body: Arc<HostFn<'t>>,
}

impl<'t> DirectHandle<'t> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, args: &[Value<'t>]) -> Result<Value<'t>, InvokeError> {
        (self.body)(args)
    }
}

/// One elementary conversion step wrapping a successor.
#[derive(Clone)]
pub struct AdapterNode<'t> {
    /// Caller-facing type of this step.
    signature: Signature<'t>,
    conversion: Conversion<'t>,
    target: Box<Handle<'t>>,
}

impl<'t> AdapterNode<'t> {
    pub(crate) fn wrap(
        target: Handle<'t>,
        signature: Signature<'t>,
        conversion: Conversion<'t>,
    ) -> Handle<'t> {
        tracing::trace!(%signature, %conversion, target = %target.signature(), "adapter node");
        Handle::Adapter(AdapterNode {
            signature,
            conversion,
            target: Box::new(target),
        })
    }

    pub fn signature(&self) -> &Signature<'t> {
        &self.signature
    }

    /// Type of the wrapped successor.
    pub fn target_signature(&self) -> &Signature<'t> {
        self.target.signature()
    }

    pub fn conversion(&self) -> &Conversion<'t> {
        &self.conversion
    }

    pub fn target(&self) -> &Handle<'t> {
        &self.target
    }

    pub fn encode(&self, stack_move_unit: i32) -> ConvWord {
        self.conversion.encode(stack_move_unit)
    }
}

impl fmt::Display for AdapterNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {}", self.signature, self.conversion)
    }
}

/// Gathers the trailing `count` arguments into one array.
///
/// This is a host-level combinator used by varargs collectors, not an
/// elementary VM adapter.
#[derive(Clone)]
pub struct CollectNode<'t> {
    signature: Signature<'t>,
    pos: usize,
    count: usize,
    array_type: &'t Type<'t>,
    target: Box<Handle<'t>>,
}

impl<'t> CollectNode<'t> {
    /// Wraps `target`, whose last parameter must be `array_type`, so that it
    /// accepts `count` separate element arguments in its place.
    pub(crate) fn wrap(target: Handle<'t>, array_type: &'t Type<'t>, count: usize) -> Option<Handle<'t>> {
        let target_type = target.signature();
        let pos = target_type.param_count().checked_sub(1)?;
        let elem = array_type.element_type()?;
        let params = target_type.params()[..pos]
            .iter()
            .copied()
            .chain(core::iter::repeat_n(elem, count));
        let signature = target_type.with_params(params);
        tracing::trace!(%signature, count, "collect node");
        Some(Handle::Collect(CollectNode {
            signature,
            pos,
            count,
            array_type,
            target: Box::new(target),
        }))
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn array_type(&self) -> &'t Type<'t> {
        self.array_type
    }

    pub fn target(&self) -> &Handle<'t> {
        &self.target
    }

    fn stack_move(&self) -> i32 {
        1 - self.signature.slot_depth(self.pos) as i32
    }
}
