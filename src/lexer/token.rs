/*!
# Lexer tokens

Mirrors the token/metrics split the parser expects: every token
carries its start position plus enough of the raw byte range to let the
parser reuse it for in-situ leaves without rescanning the input.
*/
use crate::position::{Position, Span};

/// The byte range a token occupies in the source buffer, independent of its
/// start [`Position`] (which additionally tracks line/column).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct TokenMetrics {
    span: Span,
}

impl TokenMetrics {
    pub(crate) fn new(start: usize, end: usize) -> TokenMetrics {
        TokenMetrics { span: Span::new(start, end) }
    }

    pub(crate) fn len(&self) -> usize {
        self.span.len()
    }

    pub(crate) fn start(&self) -> usize {
        self.span.start()
    }

    pub(crate) fn end(&self) -> usize {
        self.span.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Eof,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Comma,
    True,
    False,
    Null,
    NaN,
    Infinity,
    NegInfinity,
    /// `body` is the raw byte range *between* the quotes (excluding them).
    String { body: Span, has_escapes: bool },
    /// `lexeme` is the raw byte range of the number's source spelling.
    Number { lexeme: Span },
}

impl TokenKind {
    /// A short human-readable name for error "expected X, found Y" messages.
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::LBracket => "opening bracket '['",
            TokenKind::RBracket => "closing bracket ']'",
            TokenKind::LBrace => "opening brace '{'",
            TokenKind::RBrace => "closing brace '}'",
            TokenKind::Colon => "colon ':'",
            TokenKind::Comma => "comma ','",
            TokenKind::True => "keyword 'true'",
            TokenKind::False => "keyword 'false'",
            TokenKind::Null => "keyword 'null'",
            TokenKind::NaN => "keyword 'NaN'",
            TokenKind::Infinity => "keyword 'Infinity'",
            TokenKind::NegInfinity => "keyword '-Infinity'",
            TokenKind::String { .. } => "string literal",
            TokenKind::Number { .. } => "number literal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) metrics: TokenMetrics,
    pub(crate) position: Position,
}
