use super::{
    tree::{Binary, Call, Expr, Logical, LogicalOperator, Variable},
    value::{self, is_truthy},
    Functions,
};
use crate::{
    log::{Error, INCOMPATIBLE_TYPES, INVALID_FUNCTION, UNDEFINED_NAME},
    scope::Resolve,
};
use serde_json::{json, Value};

/// Evaluates a parsed expression against a scope and a set of registered
/// functions.
pub struct Interpreter<'render> {
    /// The fragment the expression was parsed from, for error pointers.
    fragment: &'render str,
    scope: &'render dyn Resolve,
    functions: &'render Functions,
}

impl<'render> Interpreter<'render> {
    /// Create a new Interpreter over the given fragment.
    pub fn new(
        fragment: &'render str,
        scope: &'render dyn Resolve,
        functions: &'render Functions,
    ) -> Self {
        Self {
            fragment,
            scope,
            functions,
        }
    }

    /// Evaluate the expression to a value.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when a root name is undefined, a key is read
    /// from a non-object, a function is unregistered or fails, or an
    /// operator does not apply to its operands.
    pub fn evaluate(&self, expression: &Expr) -> Result<Value, Error> {
        match expression {
            Expr::Literal(literal) => Ok(literal.value.clone()),
            Expr::Variable(variable) => self.variable(variable),
            Expr::Call(call) => self.call(call),
            Expr::Not(operand, _) => {
                let value = self.evaluate(operand)?;
                Ok(json!(!is_truthy(&value)))
            }
            Expr::Negate(operand, region) => {
                let value = self.evaluate(operand)?;
                match value.as_i64() {
                    Some(number) => Ok(json!(-number)),
                    None => match value.as_f64() {
                        Some(number) => Ok(json!(-number)),
                        None => Err(Error::build(INCOMPATIBLE_TYPES)
                            .with_pointer(self.fragment, *region)
                            .with_help(format!(
                                "cannot negate {}",
                                value::type_of(&value)
                            ))),
                    },
                }
            }
            Expr::Binary(binary) => self.binary(binary),
            Expr::Logical(logical) => self.logical(logical),
        }
    }

    /// Resolve a dotted path against the scope.
    ///
    /// The root name must exist; a missing key further down the path is
    /// null, while a key read from a non-object is an error.
    fn variable(&self, variable: &Variable) -> Result<Value, Error> {
        let root = &variable.path[0];
        let Some(base) = self.scope.resolve(&root.name) else {
            return Err(Error::build(UNDEFINED_NAME)
                .with_pointer(self.fragment, root.region)
                .with_help(format!("`{}` is not present in the scope", root.name)));
        };

        let mut value = base.clone();
        for key in &variable.path[1..] {
            match value {
                Value::Object(ref object) => {
                    value = object.get(&key.name).cloned().unwrap_or(Value::Null);
                }
                ref other => {
                    return Err(Error::build(INCOMPATIBLE_TYPES)
                        .with_pointer(self.fragment, key.region)
                        .with_help(format!(
                            "`{}` cannot be read from {}",
                            key.name,
                            value::type_of(other)
                        )))
                }
            }
        }

        Ok(value)
    }

    fn call(&self, call: &Call) -> Result<Value, Error> {
        let Some(function) = self.functions.get(&call.name.name) else {
            return Err(Error::build(INVALID_FUNCTION)
                .with_pointer(self.fragment, call.name.region)
                .with_help(format!("`{}` is not registered", call.name.name)));
        };

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.evaluate(arg)?);
        }

        function.apply(&args)
    }

    fn binary(&self, binary: &Binary) -> Result<Value, Error> {
        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;

        value::apply(&left, binary.operator, &right)
            .map_err(|error| error.with_pointer(self.fragment, binary.region))
    }

    /// Evaluate `&&` or `||`, short-circuiting on the left side.
    fn logical(&self, logical: &Logical) -> Result<Value, Error> {
        let left = self.evaluate(&logical.left)?;
        let left = is_truthy(&left);

        let value = match logical.operator {
            LogicalOperator::And if !left => false,
            LogicalOperator::Or if left => true,
            _ => {
                let right = self.evaluate(&logical.right)?;
                is_truthy(&right)
            }
        };

        Ok(json!(value))
    }
}
