use super::{
    lex::{Lexer, Token},
    tree::{Binary, Call, Expr, Identifier, Literal, Logical, LogicalOperator, Operator, Variable},
};
use crate::{
    log::{error_eof, Error, INVALID_STATEMENT, UNEXPECTED_TOKEN},
    region::Region,
};
use serde_json::{Number, Value};

const STATEMENT_HELP: &str = "expected a statement like `name = expression`";

/// A recursive descent parser over a single expression fragment.
///
/// Each binding power gets its own method, from `logical_or` at the
/// loosest down to `primary`.
pub struct Parser<'fragment> {
    lexer: Lexer<'fragment>,
    /// Temporary storage for a token that was peeked but not consumed.
    buffer: Option<(Token, Region)>,
}

impl<'fragment> Parser<'fragment> {
    /// Create a new Parser over the given fragment.
    pub fn new(fragment: &'fragment str) -> Self {
        Self {
            lexer: Lexer::new(fragment),
            buffer: None,
        }
    }

    /// Parse the fragment as a single expression.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the fragment is not one complete
    /// expression.
    pub fn parse_expression(mut self) -> Result<Expr, Error> {
        let expression = self.expression()?;
        self.expect_end()?;

        Ok(expression)
    }

    /// Parse the fragment as a loop header of the shape
    /// `binding in iterable`.
    pub fn parse_loop(mut self) -> Result<(String, Expr), Error> {
        let (token, region) = self.next_any()?;
        if token != Token::Identifier {
            return Err(Error::build(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help("expected a loop header like `item in items`"));
        }
        let binding = self.lexer.source[region].to_string();
        self.next_must(Token::In)?;
        let expression = self.expression()?;
        self.expect_end()?;

        Ok((binding, expression))
    }

    /// Parse the fragment as an assignment statement of the shape
    /// `name = expression`.
    pub fn parse_statement(mut self) -> Result<(String, Expr), Error> {
        let end = self.lexer.source.len();
        let Some((token, region)) = self.next()? else {
            return Err(Error::build(INVALID_STATEMENT)
                .with_pointer(self.lexer.source, end..end)
                .with_help(STATEMENT_HELP));
        };
        if token != Token::Identifier {
            return Err(Error::build(INVALID_STATEMENT)
                .with_pointer(self.lexer.source, region)
                .with_help(STATEMENT_HELP));
        }
        let name = self.lexer.source[region].to_string();

        match self.next()? {
            Some((Token::Assign, _)) => {}
            Some((_, region)) => {
                return Err(Error::build(INVALID_STATEMENT)
                    .with_pointer(self.lexer.source, region)
                    .with_help(STATEMENT_HELP))
            }
            None => {
                return Err(Error::build(INVALID_STATEMENT)
                    .with_pointer(self.lexer.source, end..end)
                    .with_help(STATEMENT_HELP))
            }
        }
        let expression = self.expression()?;
        self.expect_end()?;

        Ok((name, expression))
    }

    fn expression(&mut self) -> Result<Expr, Error> {
        self.logical_or()
    }

    fn logical_or(&mut self) -> Result<Expr, Error> {
        let mut left = self.logical_and()?;
        while self.next_is(Token::Or)? {
            let right = self.logical_and()?;
            left = logical(left, LogicalOperator::Or, right);
        }

        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, Error> {
        let mut left = self.comparison()?;
        while self.next_is(Token::And)? {
            let right = self.comparison()?;
            left = logical(left, LogicalOperator::And, right);
        }

        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, Error> {
        const ACCEPT: &[Operator] = &[
            Operator::Equal,
            Operator::NotEqual,
            Operator::Greater,
            Operator::GreaterOrEqual,
            Operator::Lesser,
            Operator::LesserOrEqual,
        ];

        let mut left = self.additive()?;
        while let Some(operator) = self.next_operator(ACCEPT)? {
            let right = self.additive()?;
            left = binary(left, operator, right);
        }

        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, Error> {
        const ACCEPT: &[Operator] = &[Operator::Add, Operator::Subtract];

        let mut left = self.multiplicative()?;
        while let Some(operator) = self.next_operator(ACCEPT)? {
            let right = self.multiplicative()?;
            left = binary(left, operator, right);
        }

        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, Error> {
        const ACCEPT: &[Operator] = &[Operator::Multiply, Operator::Divide];

        let mut left = self.unary()?;
        while let Some(operator) = self.next_operator(ACCEPT)? {
            let right = self.unary()?;
            left = binary(left, operator, right);
        }

        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, Error> {
        match self.peek()? {
            Some((Token::Exclamation | Token::Not, region)) => {
                self.next()?;
                let operand = self.unary()?;
                let region = region.combine(operand.region());
                Ok(Expr::Not(Box::new(operand), region))
            }
            Some((Token::Operator(Operator::Subtract), region)) => {
                self.next()?;
                let operand = self.unary()?;
                let region = region.combine(operand.region());
                Ok(Expr::Negate(Box::new(operand), region))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, Error> {
        let (token, region) = self.next_any()?;

        match token {
            Token::Number => {
                let text = &self.lexer.source[region];
                let value = text.parse::<Number>().map_err(|_| {
                    Error::build(UNEXPECTED_TOKEN)
                        .with_pointer(self.lexer.source, region)
                        .with_help(format!("`{}` is not a valid number", text))
                })?;
                Ok(Expr::Literal(Literal {
                    value: Value::Number(value),
                    region,
                }))
            }
            Token::String => Ok(Expr::Literal(Literal {
                value: Value::String(self.unescape(region)),
                region,
            })),
            Token::True => Ok(literal(Value::Bool(true), region)),
            Token::False => Ok(literal(Value::Bool(false), region)),
            Token::Null => Ok(literal(Value::Null, region)),
            Token::LeftParen => {
                let expression = self.expression()?;
                self.next_must(Token::RightParen)?;
                Ok(expression)
            }
            Token::Identifier => self.path_or_call(region),
            other => Err(Error::build(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(format!("expected an expression, found {}", other))),
        }
    }

    /// Continue a primary that began with an identifier: either a call
    /// like `name(args)` or a dotted path like `name.key.key`.
    fn path_or_call(&mut self, region: Region) -> Result<Expr, Error> {
        let name = Identifier {
            name: self.lexer.source[region].to_string(),
            region,
        };

        if self.next_is(Token::LeftParen)? {
            let mut args = vec![];
            let close = loop {
                if let Some((Token::RightParen, close)) = self.peek()? {
                    self.next()?;
                    break close;
                }
                args.push(self.expression()?);
                if !self.next_is(Token::Comma)? {
                    break self.next_must(Token::RightParen)?.1;
                }
            };
            let region = name.region.combine(close);
            return Ok(Expr::Call(Call { name, args, region }));
        }

        let mut path = vec![name];
        while self.next_is(Token::Period)? {
            let (_, key) = self.next_must(Token::Identifier)?;
            path.push(Identifier {
                name: self.lexer.source[key].to_string(),
                region: key,
            });
        }

        Ok(Expr::Variable(Variable { path }))
    }

    /// Decode the inner text of a string literal region, resolving
    /// escape sequences.
    fn unescape(&self, region: Region) -> String {
        let inner = &self.lexer.source[Region::new(region.begin + 1..region.end - 1)];
        let mut text = String::with_capacity(inner.len());
        let mut characters = inner.chars();
        while let Some(character) = characters.next() {
            if character != '\\' {
                text.push(character);
                continue;
            }
            match characters.next() {
                Some('n') => text.push('\n'),
                Some('r') => text.push('\r'),
                Some('t') => text.push('\t'),
                Some(other) => text.push(other),
                None => {}
            }
        }

        text
    }

    /// Return the next token, consuming it.
    fn next(&mut self) -> Result<Option<(Token, Region)>, Error> {
        match self.buffer.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next(),
        }
    }

    /// Return the next token without consuming it.
    fn peek(&mut self) -> Result<Option<(Token, Region)>, Error> {
        if self.buffer.is_none() {
            self.buffer = self.lexer.next()?;
        }

        Ok(self.buffer)
    }

    /// Return the next token, or an error if the fragment has ended.
    fn next_any(&mut self) -> Result<(Token, Region), Error> {
        self.next()?.ok_or_else(|| error_eof(self.lexer.source))
    }

    /// Return the next token, which must be of the expected kind.
    fn next_must(&mut self, expect: Token) -> Result<(Token, Region), Error> {
        match self.next()? {
            Some((token, region)) if token == expect => Ok((token, region)),
            Some((token, region)) => Err(Error::build(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(format!("expected {}, found {}", expect, token))),
            None => Err(error_eof(self.lexer.source)),
        }
    }

    /// Consume the next token if it is of the expected kind.
    fn next_is(&mut self, expect: Token) -> Result<bool, Error> {
        if self.peek()?.map(|(token, _)| token) == Some(expect) {
            self.next()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Consume the next token if it is one of the accepted operators.
    fn next_operator(&mut self, accept: &[Operator]) -> Result<Option<Operator>, Error> {
        if let Some((Token::Operator(operator), _)) = self.peek()? {
            if accept.contains(&operator) {
                self.next()?;
                return Ok(Some(operator));
            }
        }

        Ok(None)
    }

    /// Require that the whole fragment has been consumed.
    fn expect_end(&mut self) -> Result<(), Error> {
        match self.next()? {
            None => Ok(()),
            Some((token, region)) => Err(Error::build(UNEXPECTED_TOKEN)
                .with_pointer(self.lexer.source, region)
                .with_help(format!("{} was not expected here", token))),
        }
    }
}

fn literal(value: Value, region: Region) -> Expr {
    Expr::Literal(Literal { value, region })
}

fn binary(left: Expr, operator: Operator, right: Expr) -> Expr {
    let region = left.region().combine(right.region());
    Expr::Binary(Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        region,
    })
}

fn logical(left: Expr, operator: LogicalOperator, right: Expr) -> Expr {
    let region = left.region().combine(right.region());
    Expr::Logical(Logical {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        region,
    })
}

#[cfg(test)]
mod tests {
    use super::{Expr, Operator, Parser};

    #[test]
    fn test_precedence() {
        let expression = Parser::new("1 + 2 * 3 == 7").parse_expression().unwrap();

        // The comparison binds loosest.
        let Expr::Binary(comparison) = expression else {
            panic!("expected a binary expression");
        };
        assert_eq!(comparison.operator, Operator::Equal);
        let Expr::Binary(sum) = *comparison.left else {
            panic!("expected a binary left side");
        };
        assert_eq!(sum.operator, Operator::Add);
    }

    #[test]
    fn test_path() {
        let expression = Parser::new("build.bot.name").parse_expression().unwrap();
        let Expr::Variable(variable) = expression else {
            panic!("expected a variable");
        };

        let path: Vec<&str> = variable.path.iter().map(|key| key.name.as_str()).collect();
        assert_eq!(path, ["build", "bot", "name"]);
    }

    #[test]
    fn test_call() {
        let expression = Parser::new("ago(b.finished_at - b.started_at)")
            .parse_expression()
            .unwrap();
        let Expr::Call(call) = expression else {
            panic!("expected a call");
        };

        assert_eq!(call.name.name, "ago");
        assert_eq!(call.args.len(), 1);
    }

    #[test]
    fn test_call_no_args() {
        let expression = Parser::new("now()").parse_expression().unwrap();
        let Expr::Call(call) = expression else {
            panic!("expected a call");
        };

        assert!(call.args.is_empty());
    }

    #[test]
    fn test_trailing_tokens() {
        assert!(Parser::new("a b").parse_expression().is_err());
    }

    #[test]
    fn test_incomplete() {
        assert!(Parser::new("a +").parse_expression().is_err());
        assert!(Parser::new("(a").parse_expression().is_err());
        assert!(Parser::new("").parse_expression().is_err());
    }

    #[test]
    fn test_loop_header() {
        let (binding, _) = Parser::new("n in nums").parse_loop().unwrap();

        assert_eq!(binding, "n");
        assert!(Parser::new("nums").parse_loop().is_err());
        assert!(Parser::new("1 in nums").parse_loop().is_err());
    }

    #[test]
    fn test_statement() {
        let (name, _) = Parser::new("total = a + b").parse_statement().unwrap();

        assert_eq!(name, "total");
        assert!(Parser::new("1 = 2").parse_statement().is_err());
        assert!(Parser::new("total").parse_statement().is_err());
    }
}
