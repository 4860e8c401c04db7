//! Contains the `Function` trait, which backs the callable values templates
//! can reference.
//!
//! A function is any type which implements the [`Function`] trait. You can
//! assign a function to an [`Engine`][`crate::Engine`] with the
//! [`add_function`][`crate::Engine::add_function()`] method, and it will be
//! available to every expression rendered by that engine.
//!
//! Given this template line:
//!
//! ```html
//! <div>{{ ago(build.elapsed) }}</div>
//! ```
//!
//! the renderer evaluates `build.elapsed` against the scope and passes the
//! result to the engine function registered under the name `ago`.
//!
//! # Examples
//!
//! You can either create a struct and implement the trait on that, or just
//! create a function matching the trait signature:
//!
//! ```rust
//! use lino::{Engine, Error, Scope};
//! use serde_json::{json, Value};
//!
//! fn upper(args: &[Value]) -> Result<Value, Error> {
//!     match args {
//!         [Value::String(string)] => Ok(json!(string.to_uppercase())),
//!         _ => Err(Error::build("function `upper` requires one string argument")),
//!     }
//! }
//!
//! let engine = Engine::default().with_function_must("upper", upper);
//! let template = engine.compile("{{ upper(name) }}").unwrap();
//! let result = engine.render(&template, &Scope::new().with_must("name", "bot"));
//!
//! assert_eq!(result.unwrap(), "BOT\n");
//! ```

use crate::log::Error;
use serde_json::Value;

/// Describes a callable that template expressions may invoke by name.
pub trait Function: Sync + Send {
    /// Execute the function with the given arguments and return a new
    /// Value as output.
    fn apply(&self, args: &[Value]) -> Result<Value, Error>;
}

/// Allows assignment of any function matching the signature of `apply` as
/// a `Function` to `Engine`, instead of requiring a struct be created.
impl<F> Function for F
where
    F: Fn(&[Value]) -> Result<Value, Error> + Sync + Send,
{
    fn apply(&self, args: &[Value]) -> Result<Value, Error> {
        self(args)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Engine, Error, Scope};
    use serde_json::{json, Value};

    #[test]
    fn test_call() {
        let engine = Engine::default().with_function_must("twice", twice);
        let template = engine.compile("{{ twice(n) }}").unwrap();
        let result = engine.render(&template, &Scope::new().with_must("n", 21));

        assert_eq!(result.unwrap(), "42\n");
    }

    #[test]
    fn test_call_unregistered() {
        let engine = Engine::default();
        let template = engine.compile("{{ twice(n) }}").unwrap();
        let result = engine.render(&template, &Scope::new().with_must("n", 21));

        assert!(result.is_err());
    }

    #[test]
    fn test_call_error_propagates() {
        let engine = Engine::default().with_function_must("twice", twice);
        let template = engine.compile("{{ twice(n) }}").unwrap();
        let result = engine.render(&template, &Scope::new().with_must("n", "nope"));

        assert!(result.is_err());
    }

    /// A Function used to test dispatch.
    fn twice(args: &[Value]) -> Result<Value, Error> {
        match args {
            [Value::Number(n)] if n.is_i64() => Ok(json!(n.as_i64().unwrap() * 2)),
            _ => Err(Error::build("function `twice` requires one integer argument")),
        }
    }
}
