use serde::{Deserialize, Serialize};

/// A piece of source text carried by an [`Instruction`], together with the
/// 1-based template line it was found on.
///
/// Fragments are stored verbatim; they are interpreted by an
/// [`Evaluator`][`crate::Evaluator`] at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// The fragment source text.
    pub text: String,
    /// The 1-based template line the fragment appeared on.
    pub line: usize,
}

/// One step of a compiled template.
///
/// A well-formed program contains balanced `If`/`EndIf` and `For`/`EndFor`
/// pairs, with `Elif` and `Else` only between an `If` and its `EndIf`; the
/// compiler guarantees this for every [`Template`] it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Append text to the output verbatim.
    Literal(String),
    /// Evaluate an expression and append its textual form to the output.
    Expression(Fragment),
    /// Open a conditional block.
    If(Fragment),
    /// Open a further branch of the enclosing conditional.
    Elif(Fragment),
    /// Open the fallback branch of the enclosing conditional.
    Else,
    /// Close a conditional block.
    EndIf,
    /// Open a loop block; the fragment is a `binding in iterable` header.
    For(Fragment),
    /// Close a loop block.
    EndFor,
    /// Execute a statement, such as a local binding.
    Statement(Fragment),
}

/// A compiled template.
///
/// A `Template` owns its instructions and holds no hidden mutable state,
/// so it may be rendered any number of times, concurrently, against
/// independent scopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// The name of the template, if one was given at compile time.
    pub name: Option<String>,
    /// The instruction sequence executed by the renderer.
    pub instructions: Vec<Instruction>,
}
