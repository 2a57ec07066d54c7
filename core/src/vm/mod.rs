//! A reference host for running adapter chains.
//!
//! The real VM executes adapters natively; this module plays its part so
//! that chains can be exercised end to end.

mod error;
mod invoke;
mod value;


pub use error::InvokeError;
pub use invoke::Invoker;
pub use value::{PrimValue, Value};
