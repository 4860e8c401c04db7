//! Lino - Line-Oriented Template Engine
//!
//! Templates are compiled line by line: a line beginning with the
//! directive sentinel (`$` by default) is a control directive, and any
//! other line is text, which may carry `{{ expression }}` spans.
//! Compilation produces an inspectable [`Template`] value; rendering
//! interprets it against a read-only [`Scope`].
//!
//! ```
//! use lino::{compile, render, Scope};
//!
//! let template = compile(
//!     "Hello {{ name }}!\n\
//!      $if show_list\n\
//!      $for n in nums\n\
//!      - {{ n }}\n\
//!      $endfor\n\
//!      $endif",
//! )
//! .unwrap();
//!
//! let scope = Scope::new()
//!     .with_must("name", "Bot")
//!     .with_must("show_list", true)
//!     .with_must("nums", vec![1, 2, 3]);
//!
//! assert_eq!(
//!     render(&template, &scope).unwrap(),
//!     "Hello Bot!\n- 1\n- 2\n- 3\n"
//! );
//! ```
//!
//! Custom helpers are registered on an [`Engine`], and a custom [`Syntax`]
//! changes the markers:
//!
//! ```
//! use lino::{Builder, Engine};
//!
//! let engine = Engine::new(
//!     Builder::new()
//!         .with_directive("%")
//!         .with_expression("((", "))")
//!         .to_syntax(),
//! );
//! assert!(engine.compile("%if ready\n(( name ))\n%endif").is_ok());
//! ```

mod compile;
mod engine;
mod eval;
mod expr;
mod function;
mod log;
mod region;
mod render;
mod scope;
mod syntax;

pub use compile::{compile, Compiler, Fragment, Instruction, Template};
pub use engine::Engine;
pub use eval::Evaluator;
pub use function::Function;
pub use log::Error;
pub use region::Region;
pub use render::Renderer;
pub use scope::{Resolve, Scope};
pub use syntax::{Builder, Syntax};

/// Render a [`Template`] with the given [`Scope`], using a default
/// [`Engine`].
///
/// # Errors
///
/// Returns an [`Error`] when evaluation of a stored fragment fails.
///
/// # Examples
///
/// ```
/// use lino::{compile, render, Scope};
///
/// let template = compile("hello, {{ name }}!").unwrap();
/// let scope = Scope::new().with_must("name", "taylor");
///
/// assert_eq!(render(&template, &scope).unwrap(), "hello, taylor!\n");
/// ```
pub fn render(template: &Template, scope: &Scope) -> Result<String, Error> {
    Engine::default().render(template, scope)
}
