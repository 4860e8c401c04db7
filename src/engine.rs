use crate::{
    compile::{Compiler, Template},
    eval::Evaluator,
    expr::{self, Functions},
    function::Function,
    log::{Error, INVALID_FUNCTION},
    render::Renderer,
    scope::{Resolve, Scope},
    syntax::Syntax,
};
use serde_json::Value;

/// Facilitates compiling and rendering templates, and provides storage
/// for functions.
///
/// An `Engine` holds the [`Syntax`] its templates are compiled with, and
/// acts as the [`Evaluator`] for the templates it renders, interpreting
/// stored fragments with the crate's default expression grammar.
pub struct Engine {
    /// The syntax used to compile templates.
    syntax: Syntax,
    /// Functions that this engine is aware of.
    functions: Functions,
}

impl Engine {
    /// Create a new instance of [`Engine`] with the given [`Syntax`].
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::{Builder, Engine};
    ///
    /// let syntax = Builder::new()
    ///     .with_directive("%")
    ///     .with_expression("((", "))")
    ///     .to_syntax();
    /// let engine = Engine::new(syntax);
    ///
    /// assert!(engine.compile("%if ready\n(( name ))\n%endif").is_ok());
    /// ```
    pub fn new(syntax: Syntax) -> Self {
        Self {
            syntax,
            functions: Functions::new(),
        }
    }

    /// Compile a new [`Template`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means
    /// the source contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::Engine;
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile("hello, {{ name }}!");
    /// assert!(template.is_ok());
    /// ```
    #[inline]
    pub fn compile(&self, text: &str) -> Result<Template, Error> {
        Compiler::new(text, &self.syntax).compile(None)
    }

    /// Compile a new [`Template`].
    ///
    /// # Panics
    ///
    /// Panics when compilation fails, which most likely means the source
    /// contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::Engine;
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile_must("hello, {{ name }}!");
    /// ```
    #[inline]
    pub fn compile_must(&self, text: &str) -> Template {
        self.compile(text).unwrap()
    }

    /// Compile a new [`Template`] carrying the given name.
    ///
    /// The name travels with the template and shows up in compile and
    /// render errors, so output like `--> status.html:4:12` can say which
    /// template went wrong.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when compilation fails, which most likely means
    /// the source contains invalid syntax.
    pub fn compile_named(&self, name: &str, text: &str) -> Result<Template, Error> {
        Compiler::new(text, &self.syntax).compile(Some(name))
    }

    /// Render a [`Template`] with the given [`Scope`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if rendering fails, which may happen when a
    /// [`Function`] returns an `Error` itself, or the template cannot be
    /// rendered for a reason that will be described by the `Error`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::{Engine, Scope};
    ///
    /// let engine = Engine::default();
    /// let template = engine.compile_must("hello, {{ name }}!");
    /// let result = engine.render(&template, &Scope::new().with_must("name", "taylor"));
    ///
    /// assert_eq!(result.unwrap(), "hello, taylor!\n")
    /// ```
    #[inline]
    pub fn render(&self, template: &Template, scope: &Scope) -> Result<String, Error> {
        Renderer::new(self, template, scope).render()
    }

    /// Add a [`Function`].
    ///
    /// # Errors
    ///
    /// If a `Function` with the given name already exists in the engine,
    /// an [`Error`] is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::{Engine, Error};
    /// use serde_json::{json, Value};
    ///
    /// fn upper(args: &[Value]) -> Result<Value, Error> {
    ///     match args {
    ///         [Value::String(string)] => Ok(json!(string.to_uppercase())),
    ///         _ => Err(Error::build("function `upper` requires one string argument")),
    ///     }
    /// }
    ///
    /// let mut engine = Engine::default();
    /// let result = engine.add_function("upper", upper);
    ///
    /// assert!(result.is_ok());
    /// ```
    pub fn add_function<T>(&mut self, name: &str, function: T) -> Result<(), Error>
    where
        T: Function + 'static,
    {
        if self.functions.contains_key(name) {
            return Err(Error::build(INVALID_FUNCTION).with_help(format!(
                "function with name `{name}` already exists in engine, \
                overwrite it with `.add_function_must`"
            )));
        }
        self.functions.insert(name.to_string(), Box::new(function));
        Ok(())
    }

    /// Add a [`Function`].
    ///
    /// If a `Function` with the given name already exists in the
    /// [`Engine`], it is overwritten.
    #[inline]
    pub fn add_function_must<T>(&mut self, name: &str, function: T)
    where
        T: Function + 'static,
    {
        self.functions.insert(name.to_string(), Box::new(function));
    }

    /// Add a [`Function`].
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    ///
    /// # Errors
    ///
    /// If a `Function` with the given name already exists in the engine,
    /// an [`Error`] is returned.
    #[inline]
    pub fn with_function<T>(mut self, name: &str, function: T) -> Result<Self, Error>
    where
        T: Function + 'static,
    {
        self.add_function(name, function)?;
        Ok(self)
    }

    /// Add a [`Function`].
    ///
    /// Returns the [`Engine`], so additional methods may be chained.
    ///
    /// If a `Function` with the given name already exists in the
    /// [`Engine`], it is overwritten.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::{Engine, Error, Scope};
    /// use serde_json::{json, Value};
    ///
    /// fn upper(args: &[Value]) -> Result<Value, Error> {
    ///     match args {
    ///         [Value::String(string)] => Ok(json!(string.to_uppercase())),
    ///         _ => Err(Error::build("function `upper` requires one string argument")),
    ///     }
    /// }
    ///
    /// let engine = Engine::default().with_function_must("upper", upper);
    /// let template = engine.compile_must("{{ upper(name) }}");
    /// let result = engine.render(&template, &Scope::new().with_must("name", "bot"));
    ///
    /// assert_eq!(result.unwrap(), "BOT\n");
    /// ```
    #[inline]
    pub fn with_function_must<T>(mut self, name: &str, function: T) -> Self
    where
        T: Function + 'static,
    {
        self.add_function_must(name, function);
        self
    }

    /// Return the function with the given name, if it exists in Engine.
    #[inline]
    pub fn get_function(&self, name: &str) -> Option<&dyn Function> {
        self.functions.get(name).map(|function| function.as_ref())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Syntax::default())
    }
}

impl Evaluator for Engine {
    fn evaluate(&self, source: &str, scope: &dyn Resolve) -> Result<Value, Error> {
        expr::evaluate(source, scope, &self.functions)
    }

    fn iterate(&self, header: &str, scope: &dyn Resolve) -> Result<(String, Vec<Value>), Error> {
        expr::iterate(header, scope, &self.functions)
    }

    fn execute(&self, source: &str, scope: &dyn Resolve) -> Result<Option<(String, Value)>, Error> {
        expr::execute(source, scope, &self.functions)
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::{log::Error, Scope};
    use serde_json::{json, Value};

    #[test]
    fn test_add() {
        let mut engine = Engine::default();
        engine.add_function_must("faux", faux_function_a);

        assert!(engine.get_function("faux").is_some());
        assert!(engine.get_function("ghost").is_none())
    }

    #[test]
    fn test_add_fluent() {
        assert!(Engine::default()
            .with_function("faux", faux_function_a)
            .unwrap()
            .get_function("faux")
            .is_some());
        assert!(Engine::default().get_function("ghost").is_none());
    }

    #[test]
    fn test_add_duplicate() {
        assert!(Engine::default()
            .with_function_must("faux", faux_function_a)
            .with_function("faux", faux_function_a)
            .is_err())
    }

    #[test]
    fn test_add_overwrite() {
        let mut engine = Engine::default().with_function_must("faux", faux_function_a);
        assert!(engine
            .get_function("faux")
            .is_some_and(|f| f.apply(&[]).is_ok_and(|v| v == json!("a"))));

        engine.add_function_must("faux", faux_function_b);
        assert!(engine
            .get_function("faux")
            .is_some_and(|f| f.apply(&[]).is_ok_and(|v| v == json!("b"))));
    }

    #[test]
    fn test_custom_syntax_end_to_end() {
        let syntax = crate::Builder::new()
            .with_directive("%")
            .with_expression("((", "))")
            .to_syntax();
        let engine = Engine::new(syntax);
        let template = engine.compile_must("%for n in nums\n- (( n ))\n%endfor");
        let scope = Scope::new().with_must("nums", vec![1, 2]);

        assert_eq!(engine.render(&template, &scope).unwrap(), "- 1\n- 2\n");
    }

    #[test]
    fn test_function_in_template() {
        let engine = Engine::default().with_function_must("len", |args: &[Value]| match args {
            [Value::Array(array)] => Ok(json!(array.len())),
            _ => Err(Error::build("function `len` requires one array argument")),
        });
        let template = engine.compile_must("{{ len(nums) }}");
        let scope = Scope::new().with_must("nums", vec![1, 2, 3]);

        assert_eq!(engine.render(&template, &scope).unwrap(), "3\n");
    }

    #[test]
    fn test_function_error_stops_render() {
        let engine = Engine::default().with_function_must("boom", |_: &[Value]| {
            Err::<Value, Error>(Error::build("boom"))
        });
        let template = engine.compile_must("{{ boom() }}");
        let error = engine.render(&template, &Scope::new()).unwrap_err();

        assert_eq!(error, Error::build("boom"));
    }

    #[test]
    fn test_compile_named_errors_carry_name() {
        let engine = Engine::default();
        let error = engine.compile_named("status.html", "$endif").unwrap_err();

        assert_eq!(error.name(), Some("status.html"));
    }

    /// A Function used to test Engine.
    fn faux_function_a(_: &[Value]) -> Result<Value, Error> {
        Ok(json!("a"))
    }

    /// A Function used to test Engine.
    fn faux_function_b(_: &[Value]) -> Result<Value, Error> {
        Ok(json!("b"))
    }
}
