use super::Error;

pub const INVALID_SYNTAX: &str = "invalid syntax";
pub const UNEXPECTED_TOKEN: &str = "unexpected token";
pub const UNEXPECTED_EOF: &str = "unexpected eof";
pub const UNEXPECTED_DIRECTIVE: &str = "unexpected directive";
pub const UNCLOSED_BLOCK: &str = "unclosed block";
pub const UNCLOSED_EXPRESSION: &str = "unclosed expression";
pub const UNDEFINED_NAME: &str = "undefined name";
pub const INVALID_FUNCTION: &str = "invalid function";
pub const INVALID_STATEMENT: &str = "invalid statement";
pub const INCOMPATIBLE_TYPES: &str = "incompatible types";
pub const NOT_ITERABLE: &str = "not iterable";
pub const MALFORMED_PROGRAM: &str = "malformed program";

/// Return an [`Error`] explaining that the end of an expression fragment
/// was not expected.
pub fn error_eof(fragment: &str) -> Error {
    let end = fragment.len();
    Error::build(UNEXPECTED_EOF)
        .with_pointer(fragment, end..end)
        .with_help("expected additional tokens, is the expression complete?")
}

/// Return an [`Error`] explaining that the write operation failed.
///
/// This is likely caused by a failure during a `write!` macro operation.
pub fn error_write() -> Error {
    Error::build("write failure").with_help("failed to write render output, are you low on memory?")
}
