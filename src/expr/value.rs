use super::tree::Operator;
use crate::log::{Error, INCOMPATIBLE_TYPES};
use serde_json::{json, Value};

/// Decide if the given value is truthy.
///
/// Null, false, zero, and empty strings, arrays and objects are falsy;
/// everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(boolean) => *boolean,
        Value::Number(number) => number.as_f64().is_some_and(|number| number != 0.0),
        Value::String(string) => !string.is_empty(),
        Value::Array(array) => !array.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}

/// Describe the type of the given value, for error messages.
pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Apply a binary operator to two values.
///
/// Numbers support arithmetic and ordered comparison, with integer
/// arithmetic preserved where both sides are integers. `/` always
/// produces a float. Strings support `+` as concatenation and ordered
/// comparison. Every pair of values supports `==` and `!=`.
///
/// # Errors
///
/// Returns an [`Error`] when the operator does not apply to the operand
/// types, or on division by zero. The error carries no location; the
/// caller points it at the operation.
pub fn apply(left: &Value, operator: Operator, right: &Value) -> Result<Value, Error> {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) => numeric(left, operator, right),
        (Value::String(left), Value::String(right)) => stringy(left, operator, right),
        _ => match operator {
            Operator::Equal => Ok(json!(left == right)),
            Operator::NotEqual => Ok(json!(left != right)),
            _ => Err(Error::build(INCOMPATIBLE_TYPES).with_help(format!(
                "{} and {} do not support `{}`",
                type_of(left),
                type_of(right),
                operator
            ))),
        },
    }
}

fn numeric(left: &Value, operator: Operator, right: &Value) -> Result<Value, Error> {
    // Stay in integer arithmetic when both sides are integers, so
    // timestamps subtract cleanly.
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        let result = match operator {
            Operator::Add => left.checked_add(right).map(Value::from),
            Operator::Subtract => left.checked_sub(right).map(Value::from),
            Operator::Multiply => left.checked_mul(right).map(Value::from),
            Operator::Divide => None,
            Operator::Equal => Some(json!(left == right)),
            Operator::NotEqual => Some(json!(left != right)),
            Operator::Greater => Some(json!(left > right)),
            Operator::GreaterOrEqual => Some(json!(left >= right)),
            Operator::Lesser => Some(json!(left < right)),
            Operator::LesserOrEqual => Some(json!(left <= right)),
        };
        if let Some(value) = result {
            return Ok(value);
        }
    }

    let (Some(left), Some(right)) = (left.as_f64(), right.as_f64()) else {
        return Err(Error::build(INCOMPATIBLE_TYPES)
            .with_help(format!("`{}` does not apply to these numbers", operator)));
    };
    let value = match operator {
        Operator::Add => json!(left + right),
        Operator::Subtract => json!(left - right),
        Operator::Multiply => json!(left * right),
        Operator::Divide => {
            if right == 0.0 {
                return Err(
                    Error::build(INCOMPATIBLE_TYPES).with_help("cannot divide by zero")
                );
            }
            json!(left / right)
        }
        Operator::Equal => json!(left == right),
        Operator::NotEqual => json!(left != right),
        Operator::Greater => json!(left > right),
        Operator::GreaterOrEqual => json!(left >= right),
        Operator::Lesser => json!(left < right),
        Operator::LesserOrEqual => json!(left <= right),
    };

    Ok(value)
}

fn stringy(left: &str, operator: Operator, right: &str) -> Result<Value, Error> {
    let value = match operator {
        Operator::Add => json!(format!("{}{}", left, right)),
        Operator::Equal => json!(left == right),
        Operator::NotEqual => json!(left != right),
        Operator::Greater => json!(left > right),
        Operator::GreaterOrEqual => json!(left >= right),
        Operator::Lesser => json!(left < right),
        Operator::LesserOrEqual => json!(left <= right),
        Operator::Subtract | Operator::Multiply | Operator::Divide => {
            return Err(Error::build(INCOMPATIBLE_TYPES)
                .with_help(format!("strings do not support `{}`", operator)))
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::{apply, is_truthy, Operator};
    use serde_json::{json, Value};

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));

        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!("no")));
        assert!(is_truthy(&json!([0])));
    }

    #[test]
    fn test_integer_arithmetic() {
        assert_eq!(apply(&json!(7), Operator::Subtract, &json!(2)).unwrap(), json!(5));
        assert_eq!(apply(&json!(7), Operator::Multiply, &json!(2)).unwrap(), json!(14));
        // Division always leaves the integers.
        assert_eq!(apply(&json!(7), Operator::Divide, &json!(2)).unwrap(), json!(3.5));
    }

    #[test]
    fn test_mixed_numeric_comparison() {
        assert_eq!(
            apply(&json!(1), Operator::Equal, &json!(1.0)).unwrap(),
            json!(true)
        );
    }

    #[test]
    fn test_divide_by_zero() {
        assert!(apply(&json!(1), Operator::Divide, &json!(0)).is_err());
    }

    #[test]
    fn test_string_concat() {
        assert_eq!(
            apply(&json!("ab"), Operator::Add, &json!("cd")).unwrap(),
            json!("abcd")
        );
        assert!(apply(&json!("ab"), Operator::Multiply, &json!("cd")).is_err());
    }

    #[test]
    fn test_cross_type_equality() {
        assert_eq!(
            apply(&json!("1"), Operator::Equal, &json!(1)).unwrap(),
            json!(false)
        );
        assert!(apply(&json!("1"), Operator::Greater, &json!(1)).is_err());
    }
}
