/*!
# Recursive-descent parser

Builds an arena DOM from a token stream under strict resource limits. One
token of lookahead; `value` is the single dispatch point used by array
elements, object values, and the root, so non-finite numbers and every
other value kind are handled identically regardless of position.
*/
use crate::context::{Child, Context, Node, NodeId};
use crate::error::{ErrorKind, ParseError};
use crate::lexer::{Lexer, LexerOptions, Token, TokenKind};
use crate::limits::Limits;
use crate::number::NumberValue;
use crate::strdecode::{self, Utf8Mode};
use crate::value::{object_put_with_policy, DupKeyPolicy, Document, PutError};

/// Parse-time configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParseOptions {
    pub allow_comments: bool,
    pub allow_trailing_commas: bool,
    pub allow_nonfinite_numbers: bool,
    pub allow_single_quotes: bool,
    pub allow_unescaped_controls: bool,
    pub allow_leading_bom: bool,
    pub validate_utf8: Utf8Mode,
    /// Reserved; has no effect.
    pub normalize_unicode: bool,
    pub dupkeys: DupKeyPolicy,
    pub limits: Limits,
    pub preserve_number_lexeme: bool,
    pub parse_int64: bool,
    pub parse_uint64: bool,
    pub parse_double: bool,
    pub in_situ_mode: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            allow_comments: false,
            allow_trailing_commas: false,
            allow_nonfinite_numbers: false,
            allow_single_quotes: false,
            allow_unescaped_controls: false,
            allow_leading_bom: true,
            validate_utf8: Utf8Mode::Reject,
            normalize_unicode: false,
            dupkeys: DupKeyPolicy::Error,
            limits: Limits::default(),
            preserve_number_lexeme: true,
            parse_int64: true,
            parse_uint64: true,
            parse_double: true,
            in_situ_mode: false,
        }
    }
}

impl ParseOptions {
    fn lexer_options(&self) -> LexerOptions {
        LexerOptions {
            allow_comments: self.allow_comments,
            allow_trailing_commas: self.allow_trailing_commas,
            allow_nonfinite_numbers: self.allow_nonfinite_numbers,
            allow_single_quotes: self.allow_single_quotes,
            allow_unescaped_controls: self.allow_unescaped_controls,
            allow_leading_bom: self.allow_leading_bom,
        }
    }
}

/// Parse a complete document from `input`. A "parse one value, then require
/// EOF" entry point.
pub fn parse(input: &[u8], options: ParseOptions) -> Result<Document<'_>, ParseError> {
    tracing::trace!(len = input.len(), in_situ = options.in_situ_mode, "parsing document");
    let mut parser = Parser::new(input, options);
    let mut ctx = if options.in_situ_mode { Context::with_input(input) } else { Context::new() };

    let tok = parser.lexer.next_token()?;
    let root_id = parser.value(&mut ctx, tok, 0, true)?;
    ctx.set_root(root_id);

    let trailing = parser.lexer.next_token()?;
    if !matches!(trailing.kind, TokenKind::Eof) {
        return Err(ParseError::new(
            ErrorKind::TrailingGarbage,
            "unexpected trailing bytes after root value",
            trailing.position,
        )
        .with_snippet(input));
    }

    Ok(Document { ctx })
}

/// Parse one value starting at `input[0..]` and report how many bytes it
/// consumed, so the caller can iterate concatenated documents.
pub fn parse_one(input: &[u8], options: ParseOptions) -> Result<(Document<'_>, usize), ParseError> {
    let mut parser = Parser::new(input, options);
    let mut ctx = if options.in_situ_mode { Context::with_input(input) } else { Context::new() };

    let tok = parser.lexer.next_token()?;
    let root_id = parser.value(&mut ctx, tok, 0, true)?;
    ctx.set_root(root_id);
    let consumed = parser.lexer.offset();
    Ok((Document { ctx }, consumed))
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8], options: ParseOptions) -> Parser<'a> {
        Parser { lexer: Lexer::new(input, options.lexer_options()), options }
    }

    fn err_at(&self, kind: ErrorKind, message: &'static str, position: crate::position::Position) -> ParseError {
        ParseError::new(kind, message, position).with_snippet(self.lexer.input())
    }

    fn unexpected(&self, tok: &Token, expected: &'static str) -> ParseError {
        self.err_at(ErrorKind::BadToken, "unexpected token", tok.position)
            .expected_actual(expected, tok.kind.describe())
    }

    fn value(&mut self, ctx: &mut Context<'a>, tok: Token, depth: usize, is_root: bool) -> Result<NodeId, ParseError> {
        match tok.kind {
            TokenKind::Null => Ok(ctx.push_node(Node::Null)),
            TokenKind::True => Ok(ctx.push_node(Node::Bool(true))),
            TokenKind::False => Ok(ctx.push_node(Node::Bool(false))),
            TokenKind::NaN => Ok(ctx.push_node(Node::Number(NumberValue::from_f64(f64::NAN)))),
            TokenKind::Infinity => Ok(ctx.push_node(Node::Number(NumberValue::from_f64(f64::INFINITY)))),
            TokenKind::NegInfinity => {
                Ok(ctx.push_node(Node::Number(NumberValue::from_f64(f64::NEG_INFINITY))))
            }
            TokenKind::String { body, has_escapes } => self.string_value(ctx, body, has_escapes, is_root),
            TokenKind::Number { lexeme } => self.number_value(ctx, lexeme, is_root),
            TokenKind::LBracket => self.array(ctx, depth),
            TokenKind::LBrace => self.object(ctx, depth),
            TokenKind::Eof
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::Colon
            | TokenKind::Comma => Err(self.unexpected(&tok, "value")),
        }
    }

    fn string_value(
        &mut self,
        ctx: &mut Context<'a>,
        body: crate::position::Span,
        has_escapes: bool,
        is_root: bool,
    ) -> Result<NodeId, ParseError> {
        let limits = self.options.limits.resolved();
        let raw = &self.lexer.input()[body.start()..body.end()];

        if self.options.in_situ_mode && !is_root && !has_escapes && ctx.input().is_some() {
            if self.options.validate_utf8 != Utf8Mode::Verbatim {
                if let Err(at) = strdecode::validate_utf8(raw, self.options.validate_utf8) {
                    let mut position = self.lexer.position();
                    position.offset = body.start() + at;
                    return Err(self.err_at(ErrorKind::BadUnicode, "invalid UTF-8 in string literal", position));
                }
            }
            if raw.len() > limits.max_string_bytes {
                return Err(self.err_at(ErrorKind::Limit, "max_string_bytes exceeded", self.lexer.position()));
            }
            if !ctx.charge_total_bytes(raw.len(), &limits) {
                return Err(self.err_at(ErrorKind::Limit, "max_total_bytes exceeded", self.lexer.position()));
            }
            let data = crate::context::StrData::InSitu { offset: body.start(), len: raw.len() };
            return Ok(ctx.push_node(Node::Str(data)));
        }

        let decoded = strdecode::decode_string_body(raw, self.options.allow_unescaped_controls)
            .map_err(|e| self.strdecode_error(e, body.start()))?;

        if self.options.validate_utf8 != Utf8Mode::Verbatim {
            if strdecode::validate_utf8(&decoded, self.options.validate_utf8).is_err() {
                return Err(self.err_at(
                    ErrorKind::BadUnicode,
                    "invalid UTF-8 in decoded string",
                    self.lexer.position(),
                ));
            }
        }
        if decoded.len() > limits.max_string_bytes {
            return Err(self.err_at(ErrorKind::Limit, "max_string_bytes exceeded", self.lexer.position()));
        }
        if !ctx.charge_total_bytes(decoded.len(), &limits) {
            return Err(self.err_at(ErrorKind::Limit, "max_total_bytes exceeded", self.lexer.position()));
        }
        let data = ctx
            .intern_str(&decoded)
            .ok_or_else(|| self.err_at(ErrorKind::Oom, "allocation failure", self.lexer.position()))?;
        Ok(ctx.push_node(Node::Str(data)))
    }

    fn strdecode_error(&self, e: strdecode::StrDecodeError, body_start: usize) -> ParseError {
        use crate::strdecode::StrDecodeErrorKind::*;
        let kind = match e.kind {
            BadEscape => ErrorKind::BadEscape,
            BadUnicode => ErrorKind::BadUnicode,
            UnescapedControl | InvalidUtf8 => ErrorKind::BadToken,
            };
        let mut position = self.lexer.position();
        position.offset = body_start + e.offset;
        self.err_at(kind, "malformed string literal", position)
    }

    fn number_value(&mut self, ctx: &mut Context<'a>, lexeme: crate::position::Span, is_root: bool) -> Result<NodeId, ParseError> {
        let limits = self.options.limits.resolved();
        let raw = &self.lexer.input()[lexeme.start()..lexeme.end()];

        if !strdecode::validate_number_syntax(raw) {
            return Err(self.err_at(ErrorKind::BadNumber, "malformed number literal", self.lexer.position()));
        }
        if !ctx.charge_total_bytes(raw.len(), &limits) {
            return Err(self.err_at(ErrorKind::Limit, "max_total_bytes exceeded", self.lexer.position()));
        }

        let (i, u, f) = strdecode::decode_number_views(raw);
        let i64_val = if self.options.parse_int64 { i } else { None };
        let u64_val = if self.options.parse_uint64 { u } else { None };
        let f64_val = if self.options.parse_double { f } else { None };

        let lex_ref = if !self.options.preserve_number_lexeme {
            None
        } else if self.options.in_situ_mode && !is_root && ctx.input().is_some() {
            Some(crate::number::LexemeRef::InSitu { offset: lexeme.start(), len: raw.len() })
        } else {
            let handle = ctx
                .intern_lexeme(raw)
                .ok_or_else(|| self.err_at(ErrorKind::Oom, "allocation failure", self.lexer.position()))?;
            Some(crate::number::LexemeRef::Owned(handle))
        };

        let number = NumberValue::new(lex_ref, i64_val, u64_val, f64_val);
        Ok(ctx.push_node(Node::Number(number)))
    }

    fn check_depth(&self, new_depth: usize, position: crate::position::Position) -> Result<(), ParseError> {
        if new_depth > self.options.limits.resolved().max_depth {
            Err(self.err_at(ErrorKind::Depth, "max_depth exceeded", position))
        } else {
            Ok(())
        }
    }

    fn array(&mut self, ctx: &mut Context<'a>, depth: usize) -> Result<NodeId, ParseError> {
        let new_depth = depth + 1;
        self.check_depth(new_depth, self.lexer.position())?;

        let arr_id = ctx.push_node(Node::Array(Vec::new()));
        let mut tok = self.lexer.next_token()?;
        if matches!(tok.kind, TokenKind::RBracket) {
            return Ok(arr_id);
        }

        loop {
            let val_id = self.value(ctx, tok, new_depth, false)?;

            let limits = self.options.limits.resolved();
            let len = match ctx.node(arr_id) {
                Node::Array(v) => v.len(),
                _ => unreachable!(),
            };
            if len >= limits.max_container_elems {
                return Err(self.err_at(ErrorKind::Limit, "max_container_elems exceeded", self.lexer.position()));
            }
            if let Node::Array(v) = ctx.node_mut(arr_id) {
                v.push(Child::Local(val_id));
            }

            let next = self.lexer.next_token()?;
            match next.kind {
                TokenKind::RBracket => return Ok(arr_id),
                TokenKind::Comma => {
                    let after_comma = self.lexer.next_token()?;
                    if matches!(after_comma.kind, TokenKind::RBracket) {
                        if self.options.allow_trailing_commas {
                            return Ok(arr_id);
                        }
                        return Err(self.unexpected(&after_comma, "array element"));
                    }
                    tok = after_comma;
                }
                _ => return Err(self.unexpected(&next, "comma ',' or closing bracket ']'")),
            }
        }
    }

    fn object(&mut self, ctx: &mut Context<'a>, depth: usize) -> Result<NodeId, ParseError> {
        let new_depth = depth + 1;
        self.check_depth(new_depth, self.lexer.position())?;

        let obj_id = ctx.push_node(Node::Object(Vec::new()));
        let mut tok = self.lexer.next_token()?;
        if matches!(tok.kind, TokenKind::RBrace) {
            return Ok(obj_id);
        }

        loop {
            let key_bytes = match tok.kind {
                TokenKind::String { body, has_escapes } => {
                    let raw = &self.lexer.input()[body.start()..body.end()];
                    if has_escapes {
                        strdecode::decode_string_body(raw, self.options.allow_unescaped_controls)
                            .map_err(|e| self.strdecode_error(e, body.start()))?
                    } else {
                        raw.to_vec()
                    }
                }
                _ => return Err(self.unexpected(&tok, "object key string")),
            };
            if self.options.validate_utf8 != Utf8Mode::Verbatim
                && strdecode::validate_utf8(&key_bytes, self.options.validate_utf8).is_err()
            {
                return Err(self.err_at(ErrorKind::BadUnicode, "invalid UTF-8 in object key", self.lexer.position()));
            }

            let colon = self.lexer.next_token()?;
            if !matches!(colon.kind, TokenKind::Colon) {
                return Err(self.unexpected(&colon, "colon ':'"));
            }

            let val_tok = self.lexer.next_token()?;
            let val_id = self.value(ctx, val_tok, new_depth, false)?;

            let key_data = ctx
                .intern_key(&key_bytes)
                .ok_or_else(|| self.err_at(ErrorKind::Oom, "allocation failure", self.lexer.position()))?;
            let limits = self.options.limits.resolved();
            match object_put_with_policy(ctx, obj_id, key_data, val_id, self.options.dupkeys, limits.max_container_elems) {
                Ok(()) => {}
                Err(PutError::DupKey) => {
                    return Err(self.err_at(ErrorKind::DupKey, "duplicate object key", self.lexer.position()));
                }
                Err(PutError::Limit) => {
                    return Err(self.err_at(ErrorKind::Limit, "max_container_elems exceeded", self.lexer.position()));
                }
            }

            let next = self.lexer.next_token()?;
            match next.kind {
                TokenKind::RBrace => return Ok(obj_id),
                TokenKind::Comma => {
                    let after_comma = self.lexer.next_token()?;
                    if matches!(after_comma.kind, TokenKind::RBrace) {
                        if self.options.allow_trailing_commas {
                            return Ok(obj_id);
                        }
                        return Err(self.unexpected(&after_comma, "object key string"));
                    }
                    tok = after_comma;
                }
                _ => return Err(self.unexpected(&next, "comma ',' or closing brace '}'")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn parse_default(input: &[u8]) -> Document<'_> {
        parse(input, ParseOptions::default()).unwrap()
    }

    #[test]
    fn parses_basic_object() {
        let doc = parse_default(br#"{"a":1,"b":[true,null,"x"]}"#);
        let root = doc.root();
        let obj = root.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        let b = obj.get("b").unwrap().as_array().unwrap();
        assert_eq!(b.len(), 3);
        assert_eq!(b.get(0).unwrap().as_bool(), Some(true));
        assert!(b.get(1).unwrap().is_null());
        assert_eq!(b.get(2).unwrap().as_str(), Some("x"));
    }

    #[test]
    fn duplicate_key_error_policy_fails() {
        let err = parse(br#"{"k":1,"k":2}"#, ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DupKey);
    }

    #[test]
    fn duplicate_key_first_wins() {
        let opts = ParseOptions { dupkeys: DupKeyPolicy::FirstWins, ..Default::default() };
        let doc = parse(br#"{"k":1,"k":2,"k":3}"#, opts).unwrap();
        let obj = doc.root().as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj.get("k").unwrap().as_number().unwrap().as_i64(), Some(1));
    }

    #[test]
    fn duplicate_key_last_wins() {
        let opts = ParseOptions { dupkeys: DupKeyPolicy::LastWins, ..Default::default() };
        let doc = parse(br#"{"k":1,"k":2,"k":3}"#, opts).unwrap();
        let obj = doc.root().as_object().unwrap();
        assert_eq!(obj.get("k").unwrap().as_number().unwrap().as_i64(), Some(3));
    }

    #[test]
    fn duplicate_key_collect() {
        let opts = ParseOptions { dupkeys: DupKeyPolicy::Collect, ..Default::default() };
        let doc = parse(br#"{"k":1,"k":2,"k":3}"#, opts).unwrap();
        let obj = doc.root().as_object().unwrap();
        assert_eq!(obj.len(), 1);
        let arr = obj.get("k").unwrap().as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(2).unwrap().as_number().unwrap().as_i64(), Some(3));
    }

    #[test]
    fn nonfinite_numbers_accepted_in_every_position() {
        let opts = ParseOptions { allow_nonfinite_numbers: true, ..Default::default() };
        let doc = parse(b"[NaN,Infinity,-Infinity]", opts).unwrap();
        let arr = doc.root().as_array().unwrap();
        assert!(arr.get(0).unwrap().as_number().unwrap().as_f64().unwrap().is_nan());
        assert_eq!(arr.get(1).unwrap().as_number().unwrap().as_f64(), Some(f64::INFINITY));
        assert_eq!(arr.get(2).unwrap().as_number().unwrap().as_f64(), Some(f64::NEG_INFINITY));

        let opts = ParseOptions { allow_nonfinite_numbers: true, ..Default::default() };
        let doc = parse(b"NaN", opts).unwrap();
        assert_eq!(doc.root().kind(), ValueKind::Number);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let opts = ParseOptions { limits: Limits { max_depth: 5, ..Default::default() }, ..Default::default() };
        let err = parse(b"[[[[[[]]]]]]", opts).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Depth);

        let opts_ok = ParseOptions { limits: Limits { max_depth: 6, ..Default::default() }, ..Default::default() };
        assert!(parse(b"[[[[[[]]]]]]", opts_ok).is_ok());
    }

    #[test]
    fn trailing_commas_require_option() {
        assert!(parse(b"[1,2,]", ParseOptions::default()).is_err());
        let opts = ParseOptions { allow_trailing_commas: true, ..Default::default() };
        assert!(parse(b"[1,2,]", opts).is_ok());
    }

    #[test]
    fn trailing_garbage_after_root_fails() {
        let err = parse(b"1 2", ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TrailingGarbage);
    }

    #[test]
    fn parse_one_reports_bytes_consumed() {
        let (doc, consumed) = parse_one(b"1 2", ParseOptions::default()).unwrap();
        assert_eq!(doc.root().as_number().unwrap().as_i64(), Some(1));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn in_situ_mode_avoids_copy_for_plain_strings() {
        let opts = ParseOptions { in_situ_mode: true, ..Default::default() };
        let doc = parse(br#"["plain"]"#, opts).unwrap();
        let arr = doc.root().as_array().unwrap();
        assert_eq!(arr.get(0).unwrap().as_str(), Some("plain"));
    }

    #[test]
    fn string_byte_limit_is_enforced() {
        let opts = ParseOptions {
            limits: Limits { max_string_bytes: 3, ..Default::default() },
            ..Default::default()
        };
        let err = parse(br#""abcd""#, opts).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Limit);
    }
}
