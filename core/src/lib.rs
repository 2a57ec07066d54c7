//! Calling-convention adapters.
//!
//! Given a callable with a fixed signature and the signature a caller wants
//! to use, this crate decides whether the two can be bridged by a chain of
//! elementary argument conversions and shuffles, and builds that chain.
//!
//! ```
//! use bumpalo::Bump;
//! use rebind_core::adapter::{Adapters, Handle};
//! use rebind_core::types::TypeManager;
//! use rebind_core::vm::{Invoker, Value};
//!
//! let arena = Bump::new();
//! let tm = TypeManager::new(&arena);
//! let adapters = Adapters::with_defaults(tm.builtins());
//!
//! let pair = tm.signature(&[tm.object(), tm.object()], tm.object());
//! let target = Handle::direct("first", pair, |args| Ok(args[0].clone()));
//!
//! let caller = tm.signature(&[tm.string(), tm.string()], tm.object());
//! let flipped = adapters.adapt_with_permutation(&caller, target, &[1, 0]).unwrap();
//!
//! let result = Invoker::new(tm.builtins())
//!     .invoke(&flipped, &[Value::str("chicken"), Value::str("rice")])
//!     .unwrap();
//! assert_eq!(result, Value::str("rice"));
//! ```

pub mod adapter;
pub mod api;
pub mod conversion;
pub mod diff;
pub mod types;
pub mod vm;

pub use adapter::{Adapters, Handle};
pub use api::{AdaptError, AdapterOptions};
pub use types::{Signature, Type, TypeManager};
