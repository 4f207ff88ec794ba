//! Crate root: wires together the equation pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns an [`Action`] tree.
//! - `action` evaluates trees at a given `x`.
//! - `codec` lowers trees into their binary form and reads them back.
//! - `equation` and `file` frame encoded trees into color-tagged records and
//!   whole files.
//! - `sample` evaluates equations over a range of inputs.
//! - `error` holds the error type shared by all of the above.

pub mod action;
pub mod codec;
pub mod equation;
pub mod error;
pub mod file;
pub mod parser;
pub mod sample;
pub mod tokenizer;

pub use action::{Action, BinaryOp};
pub use equation::{Equation, Rgb};
pub use error::{EquError, EquResult, ErrorKind, FormatErrorKind};
pub use file::{Curve, EquationFile};
pub use sample::SampleRange;

/// Compile a formula in `x` into an expression tree.
pub fn compile(expr: &str) -> EquResult<Action> {
  let tokens = tokenizer::tokenize(expr)?;
  parser::parse(tokens, expr)
}
