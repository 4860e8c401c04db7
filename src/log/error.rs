use super::{Pointer, Visual, RED, RESET};
use crate::region::Region;
use std::fmt::{Debug, Display, Formatter, Result};

/// Describes a compilation or evaluation failure.
///
/// An `Error` always carries a reason. It may also carry contextual help
/// text, the name of the template it came from, and a visualization
/// pointing at the offending source text.
///
/// # Examples
///
/// Creating an [`Error`] that includes a [`Pointer`] visualization:
///
/// ```
/// use lino::{Error, Region};
///
/// Error::build("unexpected `else`")
///     .with_pointer("$else", Region::new(1..5))
///     .with_name("status.html")
///     .with_help("`else` is only valid between `if` and `endif`");
/// ```
///
/// When printed with `println!("{:#}", error)` the above produces:
///
/// ```text
/// error: unexpected `else`
///   --> status.html:1:2
///    |
///  1 | $else
///    |  ^^^^
///    |
///   = help: `else` is only valid between `if` and `endif`
/// ```
pub struct Error {
    /// Describes the cause of the error.
    reason: String,
    /// A visualization to help illustrate the error.
    visual: Option<Box<dyn Visual>>,
    /// Additional information to display with the error.
    help: Option<String>,
    /// Name of the template that the error comes from.
    name: Option<String>,
}

impl Error {
    /// Create a new [`Error`] with the given reason text.
    ///
    /// The remaining fields may be populated with the `with_*` methods.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::Error;
    ///
    /// Error::build("unexpected `endfor`")
    ///     .with_help("expected `endif`, the open block is an `if`");
    /// ```
    pub fn build<T>(reason: T) -> Self
    where
        T: Into<String>,
    {
        Error {
            reason: reason.into(),
            name: None,
            visual: None,
            help: None,
        }
    }

    /// Set the name of the template that the error is related to.
    pub fn with_name<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.name = Some(text.into());

        self
    }

    /// Set the visualization to a new [`Pointer`] over the given source
    /// text and [`Region`].
    pub fn with_pointer<T>(mut self, source: &str, region: T) -> Self
    where
        T: Into<Region>,
    {
        self.visual = Some(Box::new(Pointer::new(source, region.into())));

        self
    }

    /// Set the help text, which is contextual information to accompany
    /// the reason text.
    pub fn with_help<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.help = Some(text.into());

        self
    }

    /// Return the name of the template that the error is related to.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return the 1-based source line the error points at, if the error
    /// carries a visualization.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::compile;
    ///
    /// let error = compile("one\n$else\nthree").unwrap_err();
    /// assert_eq!(error.line(), Some(2));
    /// ```
    pub fn line(&self) -> Option<usize> {
        self.visual.as_ref().and_then(|visual| visual.line())
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if !f.alternate() {
            writeln!(f, "{self:#}")?;
        }
        f.debug_struct("Error")
            .field("reason", &self.reason)
            .field("name", &self.name)
            .field("visual", &self.visual)
            .field("help", &self.help)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let header = format!("{RED}error{RESET}");
        write!(f, "{header}: {}", self.reason)?;

        match &self.visual {
            Some(visual) if f.alternate() => {
                visual.display(f, self.name.as_deref(), self.help.as_deref())
            }
            _ => Ok(()),
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.reason == other.reason && self.help == other.help && self.name == other.name
    }
}
