use crate::{log::Error, scope::Resolve};
use serde_json::Value;

/// The expression-evaluation capability the renderer depends on.
///
/// The compiler stores condition, expression, loop header and statement
/// text verbatim; the renderer hands those fragments to an `Evaluator` at
/// execution time. [`Engine`][`crate::Engine`] implements this trait with
/// the crate's default expression grammar, but the renderer itself makes no
/// grammar decisions.
pub trait Evaluator {
    /// Evaluate an expression fragment against the given scope.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the fragment cannot be parsed or refers
    /// to an undefined name.
    fn evaluate(&self, source: &str, scope: &dyn Resolve) -> Result<Value, Error>;

    /// Interpret a loop header of the shape `binding in iterable` against
    /// the given scope, returning the binding name and the elements the
    /// iterable produced, in order.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the header is malformed or the iterable
    /// expression does not produce a sequence.
    fn iterate(&self, header: &str, scope: &dyn Resolve) -> Result<(String, Vec<Value>), Error>;

    /// Execute a statement fragment against the given scope.
    ///
    /// A statement may produce a binding, which the renderer makes visible
    /// to subsequent instructions in the same enclosing scope.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the statement is unrecognized or its
    /// evaluation fails.
    fn execute(&self, source: &str, scope: &dyn Resolve)
        -> Result<Option<(String, Value)>, Error>;
}
