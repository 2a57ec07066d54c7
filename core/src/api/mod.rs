//! Options and errors shared by every planner.

pub mod error;
pub mod options;

pub use error::{AdaptError, Result, UnsupportedOp};
pub use options::AdapterOptions;
