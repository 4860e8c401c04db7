use crate::region::Region;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// A parsed expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal value such as `42`, `"hi"`, `true` or `null`.
    Literal(Literal),
    /// A dotted path into the scope, such as `build.bot.name`.
    Variable(Variable),
    /// A call to a registered function, such as `ago(seconds)`.
    Call(Call),
    /// Logical negation with `!` or `not`.
    Not(Box<Expr>, Region),
    /// Numeric negation with `-`.
    Negate(Box<Expr>, Region),
    /// An arithmetic or comparison operation.
    Binary(Binary),
    /// A short-circuiting `&&` or `||` operation.
    Logical(Logical),
}

impl Expr {
    /// The region of the source fragment this expression was parsed from.
    pub fn region(&self) -> Region {
        match self {
            Expr::Literal(literal) => literal.region,
            Expr::Variable(variable) => variable.region(),
            Expr::Call(call) => call.region,
            Expr::Not(_, region) => *region,
            Expr::Negate(_, region) => *region,
            Expr::Binary(binary) => binary.region,
            Expr::Logical(logical) => logical.region,
        }
    }
}

/// A literal value and its location in the fragment.
#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Value,
    pub region: Region,
}

/// A name appearing in the fragment.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: String,
    pub region: Region,
}

/// A dotted path of identifiers, resolved left to right.
///
/// The parser guarantees the path is never empty.
#[derive(Debug, Clone)]
pub struct Variable {
    pub path: Vec<Identifier>,
}

impl Variable {
    pub fn region(&self) -> Region {
        let first = self.path.first().map(|key| key.region);
        let last = self.path.last().map(|key| key.region);

        match (first, last) {
            (Some(first), Some(last)) => first.combine(last),
            _ => Region::new(0..0),
        }
    }
}

/// A call to a registered function.
#[derive(Debug, Clone)]
pub struct Call {
    pub name: Identifier,
    pub args: Vec<Expr>,
    pub region: Region,
}

/// An arithmetic or comparison operation.
#[derive(Debug, Clone)]
pub struct Binary {
    pub left: Box<Expr>,
    pub operator: Operator,
    pub right: Box<Expr>,
    pub region: Region,
}

/// A short-circuiting logical operation.
#[derive(Debug, Clone)]
pub struct Logical {
    pub left: Box<Expr>,
    pub operator: LogicalOperator,
    pub right: Box<Expr>,
    pub region: Region,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// An arithmetic or comparison operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Lesser,
    LesserOrEqual,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Lesser => "<",
            Operator::LesserOrEqual => "<=",
        };
        write!(f, "{}", text)
    }
}
