use super::tree::Operator;
use crate::{
    log::{Error, INVALID_SYNTAX, UNEXPECTED_TOKEN},
    region::Region,
};
use std::fmt::{self, Display, Formatter};
use unicode_ident::{is_xid_continue, is_xid_start};

/// A token within an expression fragment.
///
/// Tokens carry no text of their own; the [`Region`] returned beside each
/// token locates it in the fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Identifier,
    String,
    Number,
    True,
    False,
    Null,
    In,
    Not,
    Exclamation,
    Assign,
    LeftParen,
    RightParen,
    Comma,
    Period,
    And,
    Or,
    Operator(Operator),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier => write!(f, "identifier"),
            Token::String => write!(f, "string"),
            Token::Number => write!(f, "number"),
            Token::True => write!(f, "`true`"),
            Token::False => write!(f, "`false`"),
            Token::Null => write!(f, "`null`"),
            Token::In => write!(f, "`in`"),
            Token::Not => write!(f, "`not`"),
            Token::Exclamation => write!(f, "`!`"),
            Token::Assign => write!(f, "`=`"),
            Token::LeftParen => write!(f, "`(`"),
            Token::RightParen => write!(f, "`)`"),
            Token::Comma => write!(f, "`,`"),
            Token::Period => write!(f, "`.`"),
            Token::And => write!(f, "`&&`"),
            Token::Or => write!(f, "`||`"),
            Token::Operator(operator) => write!(f, "`{}`", operator),
        }
    }
}

/// A lexer over a single expression fragment.
pub struct Lexer<'fragment> {
    /// The fragment being scanned.
    pub source: &'fragment str,
    /// Byte position of the next unread character.
    cursor: usize,
}

impl<'fragment> Lexer<'fragment> {
    /// Create a new Lexer over the given fragment.
    pub fn new(source: &'fragment str) -> Self {
        Self { source, cursor: 0 }
    }

    /// Return the next token and its region, or None at the end of the
    /// fragment.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when an unrecognized character is found, or a
    /// string literal is left unterminated.
    pub fn next(&mut self) -> Result<Option<(Token, Region)>, Error> {
        self.skip_whitespace();
        let begin = self.cursor;
        let Some(character) = self.peek(begin) else {
            return Ok(None);
        };

        let (token, length) = match character {
            '(' => (Token::LeftParen, 1),
            ')' => (Token::RightParen, 1),
            ',' => (Token::Comma, 1),
            '.' => (Token::Period, 1),
            '+' => (Token::Operator(Operator::Add), 1),
            '-' => (Token::Operator(Operator::Subtract), 1),
            '*' => (Token::Operator(Operator::Multiply), 1),
            '/' => (Token::Operator(Operator::Divide), 1),
            '=' => match self.peek(begin + 1) {
                Some('=') => (Token::Operator(Operator::Equal), 2),
                _ => (Token::Assign, 1),
            },
            '!' => match self.peek(begin + 1) {
                Some('=') => (Token::Operator(Operator::NotEqual), 2),
                _ => (Token::Exclamation, 1),
            },
            '>' => match self.peek(begin + 1) {
                Some('=') => (Token::Operator(Operator::GreaterOrEqual), 2),
                _ => (Token::Operator(Operator::Greater), 1),
            },
            '<' => match self.peek(begin + 1) {
                Some('=') => (Token::Operator(Operator::LesserOrEqual), 2),
                _ => (Token::Operator(Operator::Lesser), 1),
            },
            '&' => match self.peek(begin + 1) {
                Some('&') => (Token::And, 2),
                _ => {
                    return Err(Error::build(UNEXPECTED_TOKEN)
                        .with_pointer(self.source, begin..begin + 1)
                        .with_help("a single `&` is not an operator, did you mean `&&`?"))
                }
            },
            '|' => match self.peek(begin + 1) {
                Some('|') => (Token::Or, 2),
                _ => {
                    return Err(Error::build(UNEXPECTED_TOKEN)
                        .with_pointer(self.source, begin..begin + 1)
                        .with_help("a single `|` is not an operator, did you mean `||`?"))
                }
            },
            '"' => return self.string(begin),
            character if character.is_ascii_digit() => return Ok(Some(self.number(begin))),
            character if is_xid_start(character) || character == '_' => {
                return Ok(Some(self.identifier(begin)))
            }
            character => {
                return Err(Error::build(UNEXPECTED_TOKEN)
                    .with_pointer(self.source, begin..begin + character.len_utf8())
                    .with_help(format!("`{}` is not recognized here", character)))
            }
        };

        self.cursor = begin + length;
        Ok(Some((token, Region::new(begin..self.cursor))))
    }

    /// Scan a string literal opened at `begin`.
    ///
    /// The returned region includes the surrounding quotes. Escapes are
    /// passed over here and decoded by the parser.
    fn string(&mut self, begin: usize) -> Result<Option<(Token, Region)>, Error> {
        let mut characters = self.source[begin + 1..].char_indices();
        while let Some((at, character)) = characters.next() {
            match character {
                '\\' => {
                    characters.next();
                }
                '"' => {
                    self.cursor = begin + 1 + at + 1;
                    return Ok(Some((Token::String, Region::new(begin..self.cursor))));
                }
                _ => {}
            }
        }

        Err(Error::build(INVALID_SYNTAX)
            .with_pointer(self.source, begin..self.source.len())
            .with_help("this string literal is never closed"))
    }

    /// Scan a number beginning at `begin`.
    fn number(&mut self, begin: usize) -> (Token, Region) {
        let mut end = begin;
        for (at, character) in self.source[begin..].char_indices() {
            if character.is_ascii_digit() || character == '.' {
                end = begin + at + character.len_utf8();
            } else {
                break;
            }
        }

        self.cursor = end;
        (Token::Number, Region::new(begin..end))
    }

    /// Scan an identifier or keyword beginning at `begin`.
    fn identifier(&mut self, begin: usize) -> (Token, Region) {
        let mut end = begin;
        for (at, character) in self.source[begin..].char_indices() {
            if is_xid_continue(character) || character == '_' {
                end = begin + at + character.len_utf8();
            } else {
                break;
            }
        }

        self.cursor = end;
        let token = match &self.source[begin..end] {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "in" => Token::In,
            "not" => Token::Not,
            _ => Token::Identifier,
        };
        (token, Region::new(begin..end))
    }

    /// Return the character at the given byte position, if any.
    fn peek(&self, at: usize) -> Option<char> {
        self.source.get(at..).and_then(|rest| rest.chars().next())
    }

    fn skip_whitespace(&mut self) {
        for (at, character) in self.source[self.cursor..].char_indices() {
            if !character.is_whitespace() {
                self.cursor += at;
                return;
            }
        }
        self.cursor = self.source.len();
    }
}

#[cfg(test)]
mod tests {
    use super::{Lexer, Operator, Token};
    use crate::region::Region;

    #[test]
    fn test_operators() {
        let mut lexer = Lexer::new("a >= 2 && b != \"x\"");
        let expected = [
            Token::Identifier,
            Token::Operator(Operator::GreaterOrEqual),
            Token::Number,
            Token::And,
            Token::Identifier,
            Token::Operator(Operator::NotEqual),
            Token::String,
        ];

        for want in expected {
            let (token, _) = lexer.next().unwrap().unwrap();
            assert_eq!(token, want);
        }
        assert!(lexer.next().unwrap().is_none());
    }

    #[test]
    fn test_keywords() {
        let mut lexer = Lexer::new("n in not true");
        let expected = [Token::Identifier, Token::In, Token::Not, Token::True];

        for want in expected {
            assert_eq!(lexer.next().unwrap().unwrap().0, want);
        }
    }

    #[test]
    fn test_regions() {
        let mut lexer = Lexer::new("ab + 1");

        assert_eq!(lexer.next().unwrap().unwrap().1, Region::new(0..2));
        assert_eq!(lexer.next().unwrap().unwrap().1, Region::new(3..4));
        assert_eq!(lexer.next().unwrap().unwrap().1, Region::new(5..6));
    }

    #[test]
    fn test_string_escapes() {
        let mut lexer = Lexer::new(r#""a\"b""#);
        let (token, region) = lexer.next().unwrap().unwrap();

        assert_eq!(token, Token::String);
        assert_eq!(region, Region::new(0..6));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("\"oops").next().is_err());
    }

    #[test]
    fn test_unrecognized_character() {
        let mut lexer = Lexer::new("a ~ b");

        assert!(lexer.next().is_ok());
        assert!(lexer.next().is_err());
    }

    #[test]
    fn test_lonely_ampersand() {
        let mut lexer = Lexer::new("a & b");
        lexer.next().unwrap();

        assert!(lexer.next().is_err());
    }
}
