use super::{pipe::Pipe, stack::Stack};
use crate::{
    compile::{Fragment, Instruction, Template},
    eval::Evaluator,
    expr::is_truthy,
    log::{error_write, Error, MALFORMED_PROGRAM},
    scope::Scope,
};
use std::fmt::Write;

/// Interprets a compiled [`Template`] against a [`Scope`].
///
/// The renderer walks the instruction list with a cursor. Fragments are
/// handed to the [`Evaluator`] verbatim; the renderer itself only decides
/// control flow and writes output.
pub struct Renderer<'render> {
    /// Evaluates the fragments stored in the template.
    evaluator: &'render dyn Evaluator,
    /// The template being rendered.
    template: &'render Template,
    /// Render-time bindings over the caller's scope.
    stack: Stack<'render>,
}

impl<'render> Renderer<'render> {
    /// Create a new Renderer.
    pub fn new(
        evaluator: &'render dyn Evaluator,
        template: &'render Template,
        scope: &'render Scope,
    ) -> Self {
        Renderer {
            evaluator,
            template,
            stack: Stack::new(scope),
        }
    }

    /// Render the Template stored inside the Renderer.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the evaluator rejects a fragment, or the
    /// template's instruction list is not well formed. Evaluator errors
    /// are propagated unchanged, apart from receiving the template name.
    pub fn render(mut self) -> Result<String, Error> {
        let mut buffer = String::new();
        let mut pipe = Pipe::new(&mut buffer);

        let result = self.walk(&mut pipe, 0, self.template.instructions.len());
        if let Err(error) = result {
            return Err(match &self.template.name {
                Some(name) if error.name().is_none() => error.with_name(name),
                _ => error,
            });
        }

        Ok(buffer)
    }

    /// Execute the instructions in `[cursor, end)`.
    fn walk(&mut self, pipe: &mut Pipe, mut cursor: usize, end: usize) -> Result<(), Error> {
        let template = self.template;
        while cursor < end {
            match &template.instructions[cursor] {
                Instruction::Literal(text) => {
                    pipe.write_str(text).map_err(|_| error_write())?;
                    cursor += 1;
                }
                Instruction::Expression(fragment) => {
                    let value = self.evaluator.evaluate(&fragment.text, &self.stack)?;
                    pipe.write_value(&value).map_err(|_| error_write())?;
                    cursor += 1;
                }
                Instruction::Statement(fragment) => {
                    if let Some((name, value)) =
                        self.evaluator.execute(&fragment.text, &self.stack)?
                    {
                        self.stack.bind(name, value);
                    }
                    cursor += 1;
                }
                Instruction::If(condition) => {
                    cursor = self.conditional(pipe, condition, cursor, end)?;
                }
                Instruction::For(header) => {
                    cursor = self.repeat(pipe, header, cursor, end)?;
                }
                Instruction::Elif(_) => return Err(malformed("`elif` has no opening `if`")),
                Instruction::Else => return Err(malformed("`else` has no opening `if`")),
                Instruction::EndIf => return Err(malformed("`endif` has no opening `if`")),
                Instruction::EndFor => return Err(malformed("`endfor` has no opening `for`")),
            }
        }

        Ok(())
    }

    /// Execute the conditional opened at `begin`, rendering the body of
    /// the first branch whose condition is truthy.
    ///
    /// The conditions of the remaining branches are left unevaluated.
    /// Returns the cursor position just past the closing instruction.
    fn conditional(
        &mut self,
        pipe: &mut Pipe,
        condition: &Fragment,
        begin: usize,
        end: usize,
    ) -> Result<usize, Error> {
        let template = self.template;

        // Each branch is a condition, or None for `else`, and the index
        // its body begins at. The boundary list holds where each body
        // ends; the last boundary is the closing instruction.
        let mut branches: Vec<(Option<&Fragment>, usize)> = vec![(Some(condition), begin + 1)];
        let mut boundaries: Vec<usize> = vec![];
        let mut depth = 0usize;
        let mut cursor = begin + 1;
        let close = loop {
            if cursor >= end {
                return Err(malformed("an `if` has no matching `endif`"));
            }
            match &template.instructions[cursor] {
                Instruction::If(_) | Instruction::For(_) => depth += 1,
                Instruction::EndIf => {
                    if depth == 0 {
                        boundaries.push(cursor);
                        break cursor;
                    }
                    depth -= 1;
                }
                Instruction::EndFor => {
                    if depth == 0 {
                        return Err(malformed("found `endfor` while an `if` is open"));
                    }
                    depth -= 1;
                }
                Instruction::Elif(header) if depth == 0 => {
                    boundaries.push(cursor);
                    branches.push((Some(header), cursor + 1));
                }
                Instruction::Else if depth == 0 => {
                    boundaries.push(cursor);
                    branches.push((None, cursor + 1));
                }
                _ => {}
            }
            cursor += 1;
        };

        for (at, (condition, body)) in branches.iter().enumerate() {
            let chosen = match condition {
                Some(fragment) => {
                    let value = self.evaluator.evaluate(&fragment.text, &self.stack)?;
                    is_truthy(&value)
                }
                None => true,
            };
            if chosen {
                self.walk(pipe, *body, boundaries[at])?;
                break;
            }
        }

        Ok(close + 1)
    }

    /// Execute the loop opened at `begin`, rendering its body once per
    /// element with the binding laid over the enclosing bindings.
    ///
    /// The iterable is evaluated once, before the first iteration.
    /// Returns the cursor position just past the closing instruction.
    fn repeat(
        &mut self,
        pipe: &mut Pipe,
        header: &Fragment,
        begin: usize,
        end: usize,
    ) -> Result<usize, Error> {
        let template = self.template;

        let mut depth = 0usize;
        let mut cursor = begin + 1;
        let close = loop {
            if cursor >= end {
                return Err(malformed("a `for` has no matching `endfor`"));
            }
            match &template.instructions[cursor] {
                Instruction::If(_) | Instruction::For(_) => depth += 1,
                Instruction::EndFor => {
                    if depth == 0 {
                        break cursor;
                    }
                    depth -= 1;
                }
                Instruction::EndIf => {
                    if depth == 0 {
                        return Err(malformed("found `endif` while a `for` is open"));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            cursor += 1;
        };

        let (binding, items) = self.evaluator.iterate(&header.text, &self.stack)?;
        for item in items {
            self.stack.push_frame();
            self.stack.bind(binding.clone(), item);
            self.walk(pipe, begin + 1, close)?;
            self.stack.pop_frame();
        }

        Ok(close + 1)
    }
}

fn malformed<T>(help: T) -> Error
where
    T: Into<String>,
{
    Error::build(MALFORMED_PROGRAM).with_help(help)
}

#[cfg(test)]
mod tests {
    use super::Renderer;
    use crate::{
        compile::{Instruction, Template},
        Engine, Scope,
    };
    use serde_json::json;

    #[test]
    fn test_first_true_branch() {
        let engine = Engine::default();
        let template = engine
            .compile_must("$if a\nA\n$elif b\nB\n$elif c\nC\n$else\nD\n$endif");

        let scope = Scope::new()
            .with_must("a", false)
            .with_must("b", true)
            .with_must("c", true);
        assert_eq!(engine.render(&template, &scope).unwrap(), "B\n");
    }

    #[test]
    fn test_no_branch_chosen() {
        let engine = Engine::default();
        let template = engine.compile_must("$if a\nA\n$endif");
        let scope = Scope::new().with_must("a", false);

        assert_eq!(engine.render(&template, &scope).unwrap(), "");
    }

    #[test]
    fn test_untaken_branch_not_evaluated() {
        let engine = Engine::default();
        let template = engine.compile_must("$if a\n{{ ghost }}\n$else\nok\n$endif");
        let scope = Scope::new().with_must("a", false);

        assert_eq!(engine.render(&template, &scope).unwrap(), "ok\n");
    }

    #[test]
    fn test_loop_over_array() {
        let engine = Engine::default();
        let template = engine.compile_must("$for n in nums\n- {{ n }}\n$endfor");
        let scope = Scope::new().with_must("nums", vec![1, 2, 3]);

        assert_eq!(engine.render(&template, &scope).unwrap(), "- 1\n- 2\n- 3\n");
    }

    #[test]
    fn test_loop_zero_iterations() {
        let engine = Engine::default();
        let template = engine.compile_must("$for n in nums\n- {{ n }}\n$endfor");
        let scope = Scope::new().with_must("nums", json!([]));

        assert_eq!(engine.render(&template, &scope).unwrap(), "");
    }

    #[test]
    fn test_loop_binding_dropped_after_loop() {
        let engine = Engine::default();
        let template = engine.compile_must("$for n in nums\n$endfor\n{{ n }}");
        let scope = Scope::new().with_must("nums", vec![1]);

        assert!(engine.render(&template, &scope).is_err());
    }

    #[test]
    fn test_loop_iterations_independent() {
        let engine = Engine::default();
        let template = engine
            .compile_must("$for n in nums\n$ doubled = n * 2\n{{ doubled }}\n$endfor");
        let scope = Scope::new().with_must("nums", vec![1, 2]);

        assert_eq!(engine.render(&template, &scope).unwrap(), "2\n4\n");
    }

    #[test]
    fn test_statement_binding_persists() {
        let engine = Engine::default();
        let template = engine.compile_must("$ total = a + 1\n{{ total }} and {{ total }}");
        let scope = Scope::new().with_must("a", 41);

        assert_eq!(engine.render(&template, &scope).unwrap(), "42 and 42\n");
    }

    #[test]
    fn test_scope_never_mutated() {
        let engine = Engine::default();
        let template = engine.compile_must("$ x = 1\n{{ x }}");
        let scope = Scope::new();

        assert_eq!(engine.render(&template, &scope).unwrap(), "1\n");
        // A second render starts from a clean stack.
        assert_eq!(engine.render(&template, &scope).unwrap(), "1\n");
        assert_eq!(scope.get("x"), None);
    }

    #[test]
    fn test_nested_blocks() {
        let engine = Engine::default();
        let source = "$for row in rows\n$if row.show\n{{ row.name }}\n$endif\n$endfor";
        let template = engine.compile_must(source);
        let scope = Scope::new().with_must(
            "rows",
            json!([
                {"name": "one", "show": true},
                {"name": "two", "show": false},
                {"name": "three", "show": true},
            ]),
        );

        assert_eq!(engine.render(&template, &scope).unwrap(), "one\nthree\n");
    }

    #[test]
    fn test_text_only_template_unchanged() {
        let engine = Engine::default();
        let source = "<ul>\n  <li>one</li>\n</ul>\n";
        let template = engine.compile_must(source);

        assert_eq!(engine.render(&template, &Scope::new()).unwrap(), source);
    }

    #[test]
    fn test_one_template_many_scopes() {
        let engine = Engine::default();
        let template = engine.compile_must("Hello {{ name }}!");

        let first = engine.render(&template, &Scope::new().with_must("name", "Ana"));
        let second = engine.render(&template, &Scope::new().with_must("name", "Ben"));
        assert_eq!(first.unwrap(), "Hello Ana!\n");
        assert_eq!(second.unwrap(), "Hello Ben!\n");
    }

    #[test]
    fn test_malformed_program() {
        let engine = Engine::default();
        let scope = Scope::new();

        // Instruction lists can be built by hand, so block pairing is
        // checked again at render time.
        let stray = Template {
            name: None,
            instructions: vec![Instruction::EndIf],
        };
        assert!(engine.render(&stray, &scope).is_err());

        let unclosed = Template {
            name: None,
            instructions: vec![Instruction::If(crate::compile::Fragment {
                text: "true".into(),
                line: 1,
            })],
        };
        assert!(engine.render(&unclosed, &scope).is_err());
    }

    #[test]
    fn test_render_error_carries_template_name() {
        let engine = Engine::default();
        let template = engine.compile_named("status.html", "{{ ghost }}").unwrap();
        let error = engine.render(&template, &Scope::new()).unwrap_err();

        assert_eq!(error.name(), Some("status.html"));
    }

    #[test]
    fn test_renderer_direct() {
        let engine = Engine::default();
        let template = engine.compile_must("Hello {{ name }}!");
        let scope = Scope::new().with_must("name", "Bot");
        let renderer = Renderer::new(&engine, &template, &scope);

        assert_eq!(renderer.render().unwrap(), "Hello Bot!\n");
    }
}
