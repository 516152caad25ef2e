/*!
# Tokenizer

Turns a byte buffer into a stream of [`Token`]s. Holds a
borrowed buffer, a byte offset, and a running [`Position`]; never allocates
except for a string token's decoded payload (handled by
[`crate::strdecode`]) or a bad-token error's snippet.
*/
mod token;

pub(crate) use token::{Token, TokenKind, TokenMetrics};

use crate::error::{ErrorKind, ParseError, ERRCTX_STRING};
use crate::position::Position;

/// The lexer-relevant subset of `ParseOptions`, threaded explicitly rather
/// than read from shared state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct LexerOptions {
    pub(crate) allow_comments: bool,
    pub(crate) allow_trailing_commas: bool,
    pub(crate) allow_nonfinite_numbers: bool,
    pub(crate) allow_single_quotes: bool,
    pub(crate) allow_unescaped_controls: bool,
    pub(crate) allow_leading_bom: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        LexerOptions {
            allow_comments: false,
            allow_trailing_commas: false,
            allow_nonfinite_numbers: false,
            allow_single_quotes: false,
            allow_unescaped_controls: false,
            allow_leading_bom: true,
        }
    }
}

const NUMBER_CHARSET_TAIL: &[u8] = b"0123456789.eE+-";

pub(crate) struct Lexer<'a> {
    buf: &'a [u8],
    offset: usize,
    position: Position,
    opts: LexerOptions,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(buf: &'a [u8], opts: LexerOptions) -> Lexer<'a> {
        let mut lexer = Lexer { buf, offset: 0, position: Position::start(), opts };
        if opts.allow_leading_bom && buf.starts_with(&[0xEF, 0xBB, 0xBF]) {
            lexer.advance(3);
        }
        lexer
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn input(&self) -> &'a [u8] {
        self.buf
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.offset).copied()
    }

    fn peek_at(&self, rel: usize) -> Option<u8> {
        self.buf.get(self.offset + rel).copied()
    }

    fn advance(&mut self, n: usize) {
        let end = (self.offset + n).min(self.buf.len());
        self.position.advance_by(&self.buf[self.offset..end]);
        self.offset = end;
    }

    fn bad_token(&self, message: &'static str) -> ParseError {
        ParseError::new(ErrorKind::BadToken, message, self.position).with_snippet(self.buf)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            let mut made_progress = false;
            while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n')) {
                self.advance(1);
                made_progress = true;
            }
            if self.opts.allow_comments {
                if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'/') {
                    self.advance(2);
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.advance(1);
                    }
                    made_progress = true;
                } else if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
                    let start = self.position;
                    self.advance(2);
                    loop {
                        match self.peek() {
                            None => {
                                return Err(ParseError::new(
                                    ErrorKind::BadToken,
                                    "unterminated block comment",
                                    start,
                                )
                                .with_snippet(self.buf));
                            }
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.advance(2);
                                break;
                            }
                            _ => self.advance(1),
                        }
                    }
                    made_progress = true;
                }
            }
            if !made_progress {
                break;
            }
        }
        Ok(())
    }

    fn scan_string_body(&mut self, quote: u8) -> Result<(usize, usize, bool), ParseError> {
        let body_start = self.offset;
        let mut has_escapes = false;
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::new(
                        ErrorKind::BadToken,
                        "unterminated string literal",
                        self.position,
                    )
                    .expected_actual("closing quote", "end of input")
                    .with_snippet(self.buf));
                }
                Some(b) if b == quote => {
                    let body_len = self.offset - body_start;
                    self.advance(1);
                    return Ok((body_start, body_len, has_escapes));
                }
                Some(b'\\') => {
                    has_escapes = true;
                    self.advance(1);
                    if self.peek().is_none() {
                        return Err(ParseError::new(
                            ErrorKind::BadEscape,
                            "dangling escape at end of input",
                            self.position,
                        )
                        .with_snippet(self.buf));
                    }
                    self.advance(1);
                }
                Some(b) if b < 0x20 && !self.opts.allow_unescaped_controls => {
                    return Err(ParseError::new(
                        ErrorKind::BadToken,
                        ERRCTX_STRING,
                        self.position,
                    )
                    .with_snippet(self.buf));
                }
                Some(_) => self.advance(1),
            }
        }
    }

    fn scan_number(&mut self) -> (usize, usize) {
        let start = self.offset;
        if self.peek() == Some(b'-') {
            self.advance(1);
        }
        while matches!(self.peek(), Some(b) if NUMBER_CHARSET_TAIL.contains(&b)) {
            self.advance(1);
        }
        (start, self.offset - start)
    }

    fn scan_identifier(&mut self) -> (usize, usize) {
        let start = self.offset;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.advance(1);
        }
        (start, self.offset - start)
    }

    fn starts_with_at(&self, rel: usize, s: &[u8]) -> bool {
        self.buf[self.offset + rel..].starts_with(s)
    }

    pub(crate) fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_whitespace_and_comments()?;
        let start_pos = self.position;
        let start_off = self.offset;

        let b = match self.peek() {
            None => {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    metrics: TokenMetrics::new(start_off, start_off),
                    position: start_pos,
                });
            }
            Some(b) => b,
        };

        let kind = match b {
            b'[' => {
                self.advance(1);
                TokenKind::LBracket
            }
            b']' => {
                self.advance(1);
                TokenKind::RBracket
            }
            b'{' => {
                self.advance(1);
                TokenKind::LBrace
            }
            b'}' => {
                self.advance(1);
                TokenKind::RBrace
            }
            b':' => {
                self.advance(1);
                TokenKind::Colon
            }
            b',' => {
                self.advance(1);
                TokenKind::Comma
            }
            b'"' => {
                self.advance(1);
                let (body_start, body_len, has_escapes) = self.scan_string_body(b'"')?;
                TokenKind::String {
                    body: crate::position::Span::new(body_start, body_start + body_len),
                    has_escapes,
                }
            }
            b'\'' if self.opts.allow_single_quotes => {
                self.advance(1);
                let (body_start, body_len, has_escapes) = self.scan_string_body(b'\'')?;
                TokenKind::String {
                    body: crate::position::Span::new(body_start, body_start + body_len),
                    has_escapes,
                }
            }
            b'-' if self.opts.allow_nonfinite_numbers && self.starts_with_at(1, b"Infinity") => {
                self.advance(1 + "Infinity".len());
                TokenKind::NegInfinity
            }
            b'-' | b'0'..=b'9' => {
                let (lex_start, lex_len) = self.scan_number();
                TokenKind::Number {
                    lexeme: crate::position::Span::new(lex_start, lex_start + lex_len),
                }
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let (id_start, id_len) = self.scan_identifier();
                let word = &self.buf[id_start..id_start + id_len];
                match word {
                    b"true" => TokenKind::True,
                    b"false" => TokenKind::False,
                    b"null" => TokenKind::Null,
                    b"NaN" if self.opts.allow_nonfinite_numbers => TokenKind::NaN,
                    b"Infinity" if self.opts.allow_nonfinite_numbers => TokenKind::Infinity,
                    _ => return Err(self.bad_token("unrecognized keyword")),
                }
            }
            _ => return Err(self.bad_token("unexpected byte")),
        };

        Ok(Token { kind, metrics: TokenMetrics::new(start_off, self.offset), position: start_pos })
    }
}
