//! The crate's default expression grammar.
//!
//! The compiler stores expression, condition, loop header and statement
//! text verbatim; this module parses and evaluates those fragments when
//! [`Engine`][`crate::Engine`] is asked to. The grammar covers literals,
//! dotted variable paths, calls to registered functions, unary `!`/`not`
//! and `-`, arithmetic, comparisons, and short-circuit `&&`/`||`.

mod eval;
mod lex;
mod parse;
mod tree;
mod value;

pub(crate) use value::is_truthy;

use crate::{
    function::Function,
    log::{Error, NOT_ITERABLE},
    scope::Resolve,
};
use eval::Interpreter;
use parse::Parser;
use serde_json::Value;
use std::collections::HashMap;

pub(crate) type Functions = HashMap<String, Box<dyn Function>>;

/// Evaluate an expression fragment against the given scope and functions.
pub(crate) fn evaluate(
    fragment: &str,
    scope: &dyn Resolve,
    functions: &Functions,
) -> Result<Value, Error> {
    let expression = Parser::new(fragment).parse_expression()?;

    Interpreter::new(fragment, scope, functions).evaluate(&expression)
}

/// Interpret a loop header of the shape `binding in iterable`, returning
/// the binding name and the elements of the iterable.
pub(crate) fn iterate(
    header: &str,
    scope: &dyn Resolve,
    functions: &Functions,
) -> Result<(String, Vec<Value>), Error> {
    let (binding, expression) = Parser::new(header).parse_loop()?;
    let value = Interpreter::new(header, scope, functions).evaluate(&expression)?;

    match value {
        Value::Array(items) => Ok((binding, items)),
        other => Err(Error::build(NOT_ITERABLE)
            .with_pointer(header, expression.region())
            .with_help(format!(
                "expected an array to iterate over, found {}",
                value::type_of(&other)
            ))),
    }
}

/// Execute a statement fragment, returning the binding it produced.
pub(crate) fn execute(
    statement: &str,
    scope: &dyn Resolve,
    functions: &Functions,
) -> Result<Option<(String, Value)>, Error> {
    let (name, expression) = Parser::new(statement).parse_statement()?;
    let value = Interpreter::new(statement, scope, functions).evaluate(&expression)?;

    Ok(Some((name, value)))
}
