/*!
# Error types

This module holds the error types returned by the tokenizer, parser, writer
and schema validator. Every failure is a value — nothing in this crate
panics or aborts on malformed input.
*/
use std::error;
use std::fmt;
use std::result::Result as StdResult;

use crate::position::Position;

pub const ERRCTX_STRING: &str = "in string literal";

/// The taxonomy of failures this crate can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller contract violated (null where required, wrong value tag).
    Invalid,
    /// Allocation failure (checked arithmetic overflow or allocator failure).
    Oom,
    /// Syntactic junk in the lexer or parser.
    BadToken,
    /// Malformed number lexeme.
    BadNumber,
    /// Bad `\X` escape in a string.
    BadEscape,
    /// Malformed `\uXXXX`, surrogate pair, or invalid UTF-8 under REJECT.
    BadUnicode,
    /// Nesting limit exceeded.
    Depth,
    /// String/container/total-byte limit exceeded, or a capacity overflow.
    Limit,
    /// Duplicate key under the `ERROR` duplicate-key policy.
    DupKey,
    /// Non-finite number encountered or emitted without the option enabled.
    NonFinite,
    /// Extra bytes after the root value in single-value mode.
    TrailingGarbage,
    /// Writer operation disallowed by the streaming state machine.
    State,
    /// Writer finished with a non-empty container stack.
    Incomplete,
    /// Schema validation mismatch.
    Schema,
    /// Sink callback failed during writing.
    Write,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Invalid => "invalid argument",
            ErrorKind::Oom => "allocation failure",
            ErrorKind::BadToken => "bad token",
            ErrorKind::BadNumber => "bad number",
            ErrorKind::BadEscape => "bad escape",
            ErrorKind::BadUnicode => "bad unicode",
            ErrorKind::Depth => "nesting limit exceeded",
            ErrorKind::Limit => "resource limit exceeded",
            ErrorKind::DupKey => "duplicate key",
            ErrorKind::NonFinite => "non-finite number",
            ErrorKind::TrailingGarbage => "trailing garbage",
            ErrorKind::State => "invalid writer state",
            ErrorKind::Incomplete => "incomplete document",
            ErrorKind::Schema => "schema validation failed",
            ErrorKind::Write => "sink write failed",
        };
        f.write_str(s)
    }
}

/// A window of bytes around an error offset, with a caret offset relative to
/// the snippet start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    text: String,
    caret: usize,
}

impl Snippet {
    const RADIUS: usize = 20;

    /// Clip a `±RADIUS`-byte window out of `input` around `offset`.
    pub(crate) fn clip(input: &[u8], offset: usize) -> Snippet {
        let start = offset.saturating_sub(Self::RADIUS);
        let end = (offset + Self::RADIUS).min(input.len());
        let start = start.min(input.len());
        let window = &input[start..end];
        Snippet {
            text: String::from_utf8_lossy(window).into_owned(),
            caret: offset.saturating_sub(start),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }
}

/// A parse-time or lex-time error, enriched with position, human-readable
/// token descriptors, and a context snippet.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: &'static str,
    pub position: Position,
    pub expected: Option<&'static str>,
    pub actual: Option<&'static str>,
    pub snippet: Option<Snippet>,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, message: &'static str, position: Position) -> ParseError {
        ParseError { kind, message, position, expected: None, actual: None, snippet: None }
    }

    pub(crate) fn expected_actual(mut self, expected: &'static str, actual: &'static str) -> Self {
        self.expected = Some(expected);
        self.actual = Some(actual);
        self
    }

    pub(crate) fn with_snippet(mut self, input: &[u8]) -> Self {
        self.snippet = Some(Snippet::clip(input, self.position.offset));
        self
    }

    /// Accessor for the owned snippet text, present whenever the error was
    /// produced with the originating input buffer available.
    pub fn snippet_str(&self) -> Option<&str> {
        self.snippet.as_ref().map(Snippet::text)
    }

    /// Release the snippet held by this error.
    ///
    /// Rust's ownership model already frees the snippet `String` when the
    /// error is dropped; this method exists to give callers an explicit,
    /// callable way to release it early. It is equivalent to `drop`.
    pub fn release_snippet(&mut self) {
        self.snippet = None;
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {} column {} (offset {}): {}",
            self.kind, self.position.line, self.position.col, self.position.offset, self.message
        )?;
        if let (Some(expected), Some(actual)) = (self.expected, self.actual) {
            write!(f, " (expected {}, found {})", expected, actual)?;
        }
        Ok(())
    }
}

impl error::Error for ParseError {}

/// Error produced when a streaming-writer operation is rejected by the
/// stack-based state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterError {
    pub kind: ErrorKind,
    pub message: &'static str,
}

impl fmt::Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl error::Error for WriterError {}

/// Error produced by schema validation, carrying the JSON Pointer-like path
/// to the offending instance location.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub message: &'static str,
    pub path: String,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema violation at {}: {}", self.path, self.message)
    }
}

impl error::Error for SchemaError {}

/// The crate-wide error type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Parse(ParseError),
    Writer(WriterError),
    Schema(SchemaError),
    Io(&'static str),
}

pub type Result<T> = StdResult<T, Error>;

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Error {
        Error::Parse(e)
    }
}

impl From<WriterError> for Error {
    fn from(e: WriterError) -> Error {
        Error::Writer(e)
    }
}

impl From<SchemaError> for Error {
    fn from(e: SchemaError) -> Error {
        Error::Schema(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => fmt::Display::fmt(e, f),
            Error::Writer(e) => fmt::Display::fmt(e, f),
            Error::Schema(e) => fmt::Display::fmt(e, f),
            Error::Io(msg) => write!(f, "{}: {}", ErrorKind::Write, msg),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Writer(e) => Some(e),
            Error::Schema(e) => Some(e),
            Error::Io(_) => None,
        }
    }
}
