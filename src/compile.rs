//! Template compiler.
//!
//! Scans template source line by line, validating block nesting with a
//! [`BlockStack`][`block::BlockStack`], and produces a flat, immutable
//! instruction list that the renderer interprets directly. No source code
//! is generated or executed; the compiled [`Template`] is an inspectable,
//! serializable value.

mod block;
mod compiler;
mod program;

pub use compiler::Compiler;
pub use program::{Fragment, Instruction, Template};

use crate::{log::Error, syntax::Syntax};

/// Compile the given template source with the default [`Syntax`].
///
/// Returns a new [`Template`], which can be rendered with some
/// [`Scope`][`crate::Scope`] data to receive output.
///
/// # Errors
///
/// Returns an [`Error`] when the source contains invalid syntax. The error
/// names the offending 1-based line, available through
/// [`Error::line`][`crate::Error::line`].
///
/// # Examples
///
/// ```
/// use lino::compile;
///
/// assert!(compile("Hello {{ name }}!").is_ok());
/// assert!(compile("Hello {{ name!").is_err());
/// ```
pub fn compile(text: &str) -> Result<Template, Error> {
    Compiler::new(text, &Syntax::default()).compile(None)
}
