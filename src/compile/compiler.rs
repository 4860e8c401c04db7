use crate::{
    compile::{
        block::{BlockKind, BlockStack, PopError},
        program::{Fragment, Instruction, Template},
    },
    log::{
        Error, INVALID_SYNTAX, UNCLOSED_BLOCK, UNCLOSED_EXPRESSION, UNEXPECTED_DIRECTIVE,
        UNEXPECTED_TOKEN,
    },
    region::Region,
    syntax::{Marker, Syntax},
};
use morel::Finder;

/// Compiles template source into a [`Template`].
///
/// The compiler is line granular: directives occupy a whole line, and an
/// expression span never crosses a line boundary. This keeps the grammar
/// small and every error addressable by line.
pub struct Compiler<'source> {
    /// Reference to the source text.
    source: &'source str,
    /// The markers the source is scanned for.
    syntax: &'source Syntax,
    /// Compiled [`Finder`] used to search lines for expression markers.
    finder: Finder<&'source str>,
    /// Tracks open `if`/`for` blocks.
    stack: BlockStack,
    /// The program being emitted.
    instructions: Vec<Instruction>,
}

impl<'source> Compiler<'source> {
    /// Create a new Compiler over the given source and [`Syntax`].
    pub fn new(source: &'source str, syntax: &'source Syntax) -> Self {
        Self {
            source,
            syntax,
            finder: syntax.to_finder(),
            stack: BlockStack::new(),
            instructions: vec![],
        }
    }

    /// Compile the template.
    ///
    /// Returns a new [`Template`], which can be rendered with some
    /// [`Scope`][`crate::Scope`] data to receive output.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the source contains invalid syntax,
    /// pointing at the offending line.
    pub fn compile(self, name: Option<&str>) -> Result<Template, Error> {
        match name {
            Some(name) => self
                .run()
                .map(|mut template| {
                    template.name = Some(name.to_owned());
                    template
                })
                .map_err(|error| error.with_name(name)),
            None => self.run(),
        }
    }

    fn run(mut self) -> Result<Template, Error> {
        let source = self.source;

        // Mirror the usual splitlines behavior: a trailing newline does
        // not produce a final empty line.
        let mut lines: Vec<&str> = source.split('\n').collect();
        if source.is_empty() || source.ends_with('\n') {
            lines.pop();
        }

        let mut offset = 0;
        for (index, raw) in lines.into_iter().enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.starts_with(self.syntax.directive()) {
                self.directive(line, index + 1, offset)?;
            } else {
                self.text(line, index + 1, offset)?;
            }
            offset += raw.len() + 1;
        }

        if let Some(open) = self.stack.unclosed() {
            return Err(Error::build(UNCLOSED_BLOCK)
                .with_pointer(source, open.region)
                .with_help(format!(
                    "did you close this `{}` block with `end{}`?",
                    open.kind, open.kind
                )));
        }

        Ok(Template {
            name: None,
            instructions: self.instructions,
        })
    }

    /// Compile a directive line.
    ///
    /// The sentinel is stripped and the remainder trimmed; the first
    /// whitespace-delimited token is the keyword. A bare sentinel with
    /// nothing after it compiles to nothing.
    fn directive(&mut self, line: &str, number: usize, offset: usize) -> Result<(), Error> {
        let after = &line[self.syntax.directive().len()..];
        let body = after.trim();
        if body.is_empty() {
            return Ok(());
        }

        let lead = after.len() - after.trim_start().len();
        let begin = offset + self.syntax.directive().len() + lead;

        let (keyword, rest) = match body.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim_start()),
            None => (body, ""),
        };
        let keyword_region = Region::new(begin..begin + keyword.len());
        let rest_region = Region::new(begin + body.len() - rest.len()..begin + body.len());

        match keyword {
            "if" => {
                let condition = self.fragment(keyword, rest, number, keyword_region)?;
                self.stack.push(BlockKind::If, keyword_region);
                self.instructions.push(Instruction::If(condition));
            }
            "for" => {
                let header = self.fragment(keyword, rest, number, keyword_region)?;
                self.stack.push(BlockKind::For, keyword_region);
                self.instructions.push(Instruction::For(header));
            }
            "elif" | "else" => self.branch(keyword, rest, number, keyword_region, rest_region)?,
            "endif" | "endfor" => self.close(keyword, rest, keyword_region, rest_region)?,
            _ => self.instructions.push(Instruction::Statement(Fragment {
                text: body.to_owned(),
                line: number,
            })),
        }

        Ok(())
    }

    /// Build the [`Fragment`] trailing a block-opening keyword, which must
    /// not be empty.
    fn fragment(
        &self,
        keyword: &str,
        rest: &str,
        number: usize,
        region: Region,
    ) -> Result<Fragment, Error> {
        if rest.is_empty() {
            let expected = match keyword {
                "if" | "elif" => "a condition",
                _ => "`binding in iterable`",
            };

            return Err(Error::build(INVALID_SYNTAX)
                .with_pointer(self.source, region)
                .with_help(format!("expected {expected} after `{keyword}`")));
        }

        Ok(Fragment {
            text: rest.to_owned(),
            line: number,
        })
    }

    /// Compile an `elif` or `else` directive.
    ///
    /// Both require the innermost open block to be an `if` whose `else`
    /// has not yet been seen. The stack is not popped; the enclosing block
    /// stays open.
    fn branch(
        &mut self,
        keyword: &str,
        rest: &str,
        number: usize,
        keyword_region: Region,
        rest_region: Region,
    ) -> Result<(), Error> {
        let open = self.stack.top().map(|open| (open.kind, open.else_seen));
        match open {
            Some((BlockKind::If, false)) => match keyword {
                "elif" => {
                    let condition = self.fragment(keyword, rest, number, keyword_region)?;
                    self.instructions.push(Instruction::Elif(condition));
                    Ok(())
                }
                _ => {
                    if !rest.is_empty() {
                        return Err(Error::build(UNEXPECTED_TOKEN)
                            .with_pointer(self.source, rest_region)
                            .with_help("unexpected text after `else`"));
                    }
                    self.stack
                        .top_mut()
                        .expect("matched block should still be open")
                        .else_seen = true;
                    self.instructions.push(Instruction::Else);
                    Ok(())
                }
            },
            Some((BlockKind::If, true)) => {
                let reason = match keyword {
                    "elif" => "an `elif` cannot follow `else`",
                    _ => "duplicate `else`",
                };

                Err(Error::build(UNEXPECTED_DIRECTIVE)
                    .with_pointer(self.source, keyword_region)
                    .with_help(reason))
            }
            _ => Err(Error::build(UNEXPECTED_DIRECTIVE)
                .with_pointer(self.source, keyword_region)
                .with_help(format!(
                    "`{keyword}` is only valid between `if` and `endif`"
                ))),
        }
    }

    /// Compile an `endif` or `endfor` directive.
    fn close(
        &mut self,
        keyword: &str,
        rest: &str,
        keyword_region: Region,
        rest_region: Region,
    ) -> Result<(), Error> {
        let expected = match keyword {
            "endif" => BlockKind::If,
            _ => BlockKind::For,
        };

        match self.stack.pop(expected) {
            Ok(_) => {
                if !rest.is_empty() {
                    return Err(Error::build(UNEXPECTED_TOKEN)
                        .with_pointer(self.source, rest_region)
                        .with_help(format!("unexpected text after `{keyword}`")));
                }
                self.instructions.push(match expected {
                    BlockKind::If => Instruction::EndIf,
                    BlockKind::For => Instruction::EndFor,
                });
                Ok(())
            }
            Err(PopError::Empty) => Err(Error::build(UNEXPECTED_DIRECTIVE)
                .with_pointer(self.source, keyword_region)
                .with_help(format!("there is no open block for `{keyword}` to close"))),
            Err(PopError::Mismatch(kind)) => Err(Error::build(UNEXPECTED_DIRECTIVE)
                .with_pointer(self.source, keyword_region)
                .with_help(format!("expected `end{kind}`, found `{keyword}`"))),
        }
    }

    /// Compile a text line.
    ///
    /// Literal text is emitted verbatim with a newline appended at the end
    /// of the line; expression spans between the markers are emitted as
    /// expression instructions. A stray end marker outside a span is
    /// literal text.
    fn text(&mut self, line: &'source str, number: usize, offset: usize) -> Result<(), Error> {
        let mut cursor = 0;
        loop {
            let Some((begin, end)) = self.find(line, cursor, Marker::BeginExpression) else {
                let mut text = String::with_capacity(line.len() - cursor + 1);
                text.push_str(&line[cursor..]);
                text.push('\n');
                self.instructions.push(Instruction::Literal(text));
                return Ok(());
            };

            if begin > cursor {
                self.instructions
                    .push(Instruction::Literal(line[cursor..begin].to_owned()));
            }

            let Some((close_begin, close_end)) = self.find(line, end, Marker::EndExpression)
            else {
                return Err(Error::build(UNCLOSED_EXPRESSION)
                    .with_pointer(self.source, offset + begin..offset + end)
                    .with_help(format!(
                        "expected a closing `{}` before the end of the line",
                        self.syntax.expression().1
                    )));
            };

            let text = line[end..close_begin].trim();
            if text.is_empty() {
                return Err(Error::build(INVALID_SYNTAX)
                    .with_pointer(self.source, offset + begin..offset + close_end)
                    .with_help("expected an expression between the markers"));
            }

            self.instructions.push(Instruction::Expression(Fragment {
                text: text.to_owned(),
                line: number,
            }));
            cursor = close_end;
        }
    }

    /// Find the next occurrence of the wanted marker in the line, at or
    /// after the given position. Occurrences of other markers are skipped;
    /// they are literal text.
    fn find(&self, line: &'source str, from: usize, want: Marker) -> Option<(usize, usize)> {
        let want: usize = want.into();
        let mut from = from;
        while let Some((id, begin, end)) = self.finder.next(line, from) {
            if id == want {
                return Some((begin, end));
            }
            from = end;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::Compiler;
    use crate::{
        compile::program::{Fragment, Instruction},
        syntax::Syntax,
    };

    #[test]
    fn test_literal_lines_keep_newlines() {
        let template = compile("one\ntwo").unwrap();

        assert_eq!(
            template.instructions,
            vec![
                Instruction::Literal("one\n".into()),
                Instruction::Literal("two\n".into()),
            ]
        );
    }

    #[test]
    fn test_trailing_newline_adds_no_line() {
        assert_eq!(compile("one\n").unwrap(), compile("one").unwrap());
    }

    #[test]
    fn test_empty_source() {
        assert!(compile("").unwrap().instructions.is_empty());
    }

    #[test]
    fn test_expression_spans() {
        let template = compile("a {{ one }} b {{ two }}").unwrap();

        assert_eq!(
            template.instructions,
            vec![
                Instruction::Literal("a ".into()),
                Instruction::Expression(Fragment {
                    text: "one".into(),
                    line: 1
                }),
                Instruction::Literal(" b ".into()),
                Instruction::Expression(Fragment {
                    text: "two".into(),
                    line: 1
                }),
                Instruction::Literal("\n".into()),
            ]
        );
    }

    #[test]
    fn test_stray_end_marker_is_literal() {
        let template = compile("a }} b").unwrap();

        assert_eq!(
            template.instructions,
            vec![Instruction::Literal("a }} b\n".into())]
        );
    }

    #[test]
    fn test_directive_whitespace() {
        // The sentinel may be followed by whitespace, as in `$ if cond`.
        let template = compile("$ if show\n$ endif").unwrap();

        assert_eq!(
            template.instructions,
            vec![
                Instruction::If(Fragment {
                    text: "show".into(),
                    line: 1
                }),
                Instruction::EndIf,
            ]
        );
    }

    #[test]
    fn test_bare_sentinel_compiles_to_nothing() {
        assert!(compile("$").unwrap().instructions.is_empty());
    }

    #[test]
    fn test_other_keyword_is_statement() {
        let template = compile("$greeting = \"hi\"").unwrap();

        assert_eq!(
            template.instructions,
            vec![Instruction::Statement(Fragment {
                text: "greeting = \"hi\"".into(),
                line: 1
            })]
        );
    }

    #[test]
    fn test_unclosed_expression() {
        let error = compile("first\nbad {{ name\nthird").unwrap_err();

        assert_eq!(error.line(), Some(2));
    }

    #[test]
    fn test_empty_expression() {
        assert!(compile("oops {{ }} here").is_err());
    }

    #[test]
    fn test_else_without_if() {
        let error = compile("one\n$else\nthree").unwrap_err();

        assert_eq!(error.line(), Some(2));
    }

    #[test]
    fn test_elif_inside_for() {
        let error = compile("$for n in nums\n$elif n\n$endfor").unwrap_err();

        assert_eq!(error.line(), Some(2));
    }

    #[test]
    fn test_mismatched_close() {
        let error = compile("$for x in xs\n$endif").unwrap_err();

        assert_eq!(error.line(), Some(2));
    }

    #[test]
    fn test_extraneous_close() {
        let error = compile("$endfor").unwrap_err();

        assert_eq!(error.line(), Some(1));
    }

    #[test]
    fn test_text_after_close_keyword() {
        let error = compile("$if show\n$endif show").unwrap_err();

        assert_eq!(error.line(), Some(2));
    }

    #[test]
    fn test_unclosed_block_at_eof() {
        let error = compile("$if show\nbody").unwrap_err();

        assert_eq!(error.line(), Some(1));
    }

    #[test]
    fn test_elif_after_else() {
        let source = "$if a\n$else\n$elif b\n$endif";

        assert_eq!(compile(source).unwrap_err().line(), Some(3));
    }

    #[test]
    fn test_duplicate_else() {
        let source = "$if a\n$else\n$else\n$endif";

        assert_eq!(compile(source).unwrap_err().line(), Some(3));
    }

    #[test]
    fn test_missing_condition() {
        assert_eq!(compile("$if").unwrap_err().line(), Some(1));
        assert_eq!(compile("$for").unwrap_err().line(), Some(1));
    }

    #[test]
    fn test_named_errors() {
        let syntax = Syntax::default();
        let error = Compiler::new("$else", &syntax)
            .compile(Some("status.html"))
            .unwrap_err();

        assert_eq!(error.name(), Some("status.html"));
    }

    #[test]
    fn test_custom_syntax() {
        let syntax = crate::syntax::Builder::new()
            .with_directive("%")
            .with_expression("((", "))")
            .to_syntax();
        let template = Compiler::new("% if show\nhi (( name ))\n% endif", &syntax)
            .compile(None)
            .unwrap();

        assert_eq!(
            template.instructions,
            vec![
                Instruction::If(Fragment {
                    text: "show".into(),
                    line: 1
                }),
                Instruction::Literal("hi ".into()),
                Instruction::Expression(Fragment {
                    text: "name".into(),
                    line: 2
                }),
                Instruction::Literal("\n".into()),
                Instruction::EndIf,
            ]
        );
    }

    fn compile(source: &str) -> Result<crate::Template, crate::Error> {
        let syntax = Syntax::default();
        Compiler::new(source, &syntax).compile(None)
    }
}
