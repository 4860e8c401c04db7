use super::{
    super::{RESET, YELLOW},
    get_width, Visual, BLANK, EQUAL, HIGHLIGHT, PIPE,
};
use crate::region::Region;
use std::{
    cmp::max,
    fmt::{Formatter, Result},
};

/// A type of [`Visual`] that points to a specific location within source
/// text.
#[derive(Debug, PartialEq)]
pub struct Pointer {
    /// The line that the Pointer is pointing to, zero indexed.
    line: usize,
    /// Display-width offset of the highlight within that line.
    column: usize,
    /// Display width of the highlighted text.
    length: usize,
    /// The actual line of text that is being pointed to.
    text: String,
}

impl Pointer {
    /// Create a new Pointer over the given source text and Region.
    pub fn new(source: &str, region: Region) -> Self {
        let begin = region.begin.min(source.len());
        let line = source[..begin].matches('\n').count();
        let line_begin = source[..begin].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let text = source[line_begin..]
            .split('\n')
            .next()
            .unwrap_or("")
            .trim_end_matches('\r')
            .to_string();

        let column = get_width(&source[line_begin..begin]);
        let end = region.end.min(line_begin + text.len()).max(begin);
        let length = max(1, get_width(&source[begin..end]));

        Self {
            line,
            column,
            length,
            text,
        }
    }
}

impl Visual for Pointer {
    fn display(
        &self,
        formatter: &mut Formatter<'_>,
        template: Option<&str>,
        help: Option<&str>,
    ) -> Result {
        let num = (self.line + 1).to_string();
        let col = self.column + 1;
        let pad = get_width(&num);
        let align = self.column + self.length;

        let name = template.unwrap_or("?");
        let text = &self.text;
        let underline = HIGHLIGHT.repeat(self.length);

        write!(
            formatter,
            "\n {BLANK:pad$}--> {name}:{num}:{col}\
             \n {BLANK:pad$} {PIPE}\
             \n {num:>} {PIPE} {text}\
             \n {BLANK:pad$} {PIPE} {YELLOW}{underline:>align$}{RESET}\
             \n {BLANK:pad$} {PIPE}\n",
        )?;

        if let Some(help) = help {
            writeln!(formatter, " {BLANK:pad$}{EQUAL} help: {help}")?;
        }

        Ok(())
    }

    fn line(&self) -> Option<usize> {
        Some(self.line + 1)
    }
}
