pub mod manager;
mod signature;
mod types;


pub use manager::{Builtins, TypeManager};
pub use signature::Signature;
pub use types::{Class, Primitive, Type};
