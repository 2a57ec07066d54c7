//! Rebind - calling-convention adapters for typed callables
//!
//! # Overview
//!
//! A callable has a fixed signature. A caller often holds arguments in a
//! different shape: narrower reference types, smaller primitives, a
//! different order, or a loose list where the callee wants an array.
//! Rebind decides whether an elementary adapter chain can bridge the two
//! and builds it.
//!
//! # Quick Start
//!
//! ```
//! use bumpalo::Bump;
//! use rebind::{Adapters, Handle, Invoker, TypeManager, Value};
//!
//! let arena = Bump::new();
//! let tm = TypeManager::new(&arena);
//! let adapters = Adapters::with_defaults(tm.builtins());
//!
//! // A callee that drops its first argument.
//! let two = tm.signature(&[tm.object(), tm.object()], tm.object());
//! let second = Handle::direct("second", two, |args| Ok(args[1].clone()));
//!
//! let caller = tm.signature(&[tm.string()], tm.object());
//! let doubled = adapters.adapt_with_permutation(&caller, second, &[0, 0]).unwrap();
//!
//! let result = Invoker::new(tm.builtins()).invoke(&doubled, &[Value::str("curry")]);
//! assert_eq!(result, Ok(Value::str("curry")));
//! ```
//!
//! # Capabilities
//!
//! Which adapter kinds may be emitted is controlled by
//! [`AdapterOptions::implemented_ops`]. Boxing, collecting, flyby and
//! ricochet adapters are never emitted; asking for them yields
//! [`AdaptError::Unsupported`].

// Re-export public API from rebind_core
pub use rebind_core::api::{AdaptError, AdapterOptions, Result, UnsupportedOp};

// Re-export the builders and the handle model
pub use rebind_core::adapter::{
    self, Adapters, Conversion, Handle, MAX_ARG_ROTATION, OpKind, OpSet, VarargsCollector,
};

// Re-export commonly used types and values
pub use rebind_core::types::{self, Primitive, Signature, Type, TypeManager};
pub use rebind_core::vm::{InvokeError, Invoker, PrimValue, Value};
pub use rebind_core::{conversion, diff};
