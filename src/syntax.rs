use morel::Finder;

/// Markers that identify expression spans within a text line.
pub(crate) enum Marker {
    /// Beginning of an expression span.
    BeginExpression = 0,
    /// End of an expression span.
    EndExpression = 1,
}

impl From<usize> for Marker {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::BeginExpression,
            1 => Self::EndExpression,
            _ => unreachable!(),
        }
    }
}

impl From<Marker> for usize {
    fn from(marker: Marker) -> Self {
        marker as usize
    }
}

/// Defines the markers that identify directives and expressions within
/// templates.
///
/// A line whose first characters are the directive sentinel is a directive
/// line; any other line is a text line, which may contain expression spans
/// wrapped in the expression markers.
#[derive(Debug, Clone)]
pub struct Syntax {
    /// Sentinel that marks a directive line.
    directive: String,
    /// Markers that delimit an inline expression span.
    expression: (String, String),
}

impl Syntax {
    /// Return the directive sentinel.
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// Return the expression markers.
    pub fn expression(&self) -> (&str, &str) {
        (&self.expression.0, &self.expression.1)
    }

    /// Return a [`Finder`] that searches for this Syntax's expression
    /// markers.
    pub(crate) fn to_finder<T: AsRef<[u8]>>(&self) -> Finder<T> {
        let markers = vec![
            (Marker::BeginExpression.into(), self.expression.0.clone()),
            (Marker::EndExpression.into(), self.expression.1.clone()),
        ];

        Finder::new(morel::Syntax::new(markers))
    }
}

impl Default for Syntax {
    /// Return a Syntax with the default markers.
    ///
    /// ```text
    /// Directives:  $if show
    /// Expressions: {{ name }}
    /// ```
    fn default() -> Self {
        Builder::new().to_syntax()
    }
}

/// Provides methods to build a [`Syntax`].
///
/// # Examples
///
/// ```
/// use lino::Builder;
///
/// let syntax = Builder::new()
///     .with_directive("%")
///     .with_expression("((", "))")
///     .to_syntax();
/// ```
pub struct Builder<'marker> {
    directive: &'marker str,
    expression: (&'marker str, &'marker str),
}

impl<'marker> Builder<'marker> {
    /// Create a new [`Builder`].
    ///
    /// The `Builder` has default markers:
    ///
    /// ```text
    /// Directives:  $if show
    /// Expressions: {{ name }}
    /// ```
    ///
    /// To proceed with these defaults, you may immediately call `to_syntax`
    /// to receive the [`Syntax`] instance.
    #[inline]
    pub fn new() -> Self {
        Self {
            directive: "$",
            expression: ("{{", "}}"),
        }
    }

    /// Set the directive sentinel.
    #[inline]
    pub fn set_directive(&mut self, sentinel: &'marker str) {
        assert!(!sentinel.is_empty());
        self.directive = sentinel;
    }

    /// Set the directive sentinel.
    ///
    /// Returns the [`Builder`], so additional methods may be chained.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::Builder;
    ///
    /// Builder::new()
    ///     .with_directive("%");
    /// ```
    #[inline]
    pub fn with_directive(mut self, sentinel: &'marker str) -> Self {
        self.set_directive(sentinel);

        self
    }

    /// Set the expression markers.
    #[inline]
    pub fn set_expression(&mut self, begin: &'marker str, end: &'marker str) {
        assert!(!begin.is_empty() && !end.is_empty());
        self.expression = (begin, end);
    }

    /// Set the expression markers.
    ///
    /// Returns the [`Builder`], so additional methods may be chained.
    ///
    /// # Examples
    ///
    /// ```
    /// use lino::Builder;
    ///
    /// Builder::new()
    ///     .with_expression("((", "))");
    /// ```
    #[inline]
    pub fn with_expression(mut self, begin: &'marker str, end: &'marker str) -> Self {
        self.set_expression(begin, end);

        self
    }

    /// Return a [`Syntax`] instance from the markers in this [`Builder`].
    pub fn to_syntax(self) -> Syntax {
        Syntax {
            directive: self.directive.to_owned(),
            expression: (self.expression.0.to_owned(), self.expression.1.to_owned()),
        }
    }
}

impl<'marker> Default for Builder<'marker> {
    fn default() -> Self {
        Self::new()
    }
}
