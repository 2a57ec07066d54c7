//! Adapter chains and the planners that build them.
//!
//! [`Adapters`] is the entry point. Its elementary constructors wrap a
//! [`Handle`] in a single conversion step; `adapt`,
//! `adapt_with_permutation` and varargs collectors stack several of them.

pub mod encoding;
mod factory;
mod handle;
mod op;
mod pairwise;
mod permute;
mod varargs;

#[cfg(test)]
mod factory_test;

pub use encoding::{BasicType, ConvWord};
pub use factory::{Adapters, MAX_ARG_ROTATION, positive_rotation};
pub use handle::{AdapterNode, CollectNode, DirectHandle, Handle, HostFn};
pub use op::{Conversion, OpKind, OpSet};
pub use varargs::VarargsCollector;
