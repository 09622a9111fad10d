//! Tree-walking interpreter
//!
//! Executes a checked program against a scoped [`MemoryStack`].

mod builtins;
mod error;
mod eval;
pub mod memory;
mod ops;
mod output;
mod value;

pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{Flow, Interpreter};
pub use memory::{ConcreteRef, Frame, MemoryStack, Target};
pub use output::PrintHandler;
pub use value::Value;
