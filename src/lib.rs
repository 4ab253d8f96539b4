//! Interpreter core for FLOW-MATIC, the 1957 English-language
//! data-processing notation.
//!
//! The crate splits into a [`compiler`] that turns source text into a
//! numbered table of operations, and a [`runtime`] whose engine steps
//! through that table over named record streams. Arithmetic is exact
//! decimal throughout; branch targets may be rewritten at run time by
//! SET OPERATION without touching the compiled program.

pub mod compiler;
pub mod logger;
pub mod runtime;
pub mod values;

pub use compiler::{CompilerError, Program, compile};
pub use runtime::{ExecutionOptions, Interpreter, RuntimeError, RuntimeErrorKind};
pub use values::{Record, Value};
