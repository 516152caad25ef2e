/*!
# String and number lexeme decoding

Turns the raw bytes the lexer found between quotes, or a number's source
lexeme, into decoded payloads and numeric views. Kept separate from the
lexer itself, which only locates token boundaries; this module does the
byte-level work of escape processing and numeric-grammar validation.
*/

/// How strictly to treat the string payload's UTF-8-ness after decoding.
///
/// `Replace` is currently identical to `Reject`: rather than guess at the
/// intended replacement-character behavior, this mode preserves the
/// observable equivalence until a real substitution policy is designed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Utf8Mode {
    Reject,
    Replace,
    Verbatim,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StrDecodeErrorKind {
    BadEscape,
    BadUnicode,
    UnescapedControl,
    InvalidUtf8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct StrDecodeError {
    pub(crate) kind: StrDecodeErrorKind,
    /// Offset relative to the start of the decoded body (the bytes between
    /// the quotes), not the whole document.
    pub(crate) offset: usize,
}

fn hex_digit(b: u8) -> Option<u32> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u32),
        b'a'..=b'f' => Some((b - b'a' + 10) as u32),
        b'A'..=b'F' => Some((b - b'A' + 10) as u32),
        _ => None,
    }
}

fn read_hex4(body: &[u8], at: usize) -> Option<u32> {
    if at + 4 > body.len() {
        return None;
    }
    let mut v = 0u32;
    for &b in &body[at..at + 4] {
        v = v * 16 + hex_digit(b)?;
    }
    Some(v)
}

fn is_high_surrogate(cp: u32) -> bool {
    (0xD800..=0xDBFF).contains(&cp)
}

fn is_low_surrogate(cp: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&cp)
}

fn push_codepoint(out: &mut Vec<u8>, cp: u32) {
    match char::from_u32(cp) {
        Some(c) => {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
        None => {
            // Unreachable for valid (possibly surrogate-combined) codepoints,
            // kept only as a defensive fallback for the replacement character.
            out.extend_from_slice("\u{FFFD}".as_bytes());
        }
    }
}

/// Decode the bytes between a string token's quotes.
///
/// `allow_unescaped_controls` permits raw bytes below `0x20`; otherwise they
/// are a bad-token condition the lexer has already rejected and this
/// function never sees (kept here too as a defense-in-depth check).
pub(crate) fn decode_string_body(
    body: &[u8],
    allow_unescaped_controls: bool,
) -> Result<Vec<u8>, StrDecodeError> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0usize;
    while i < body.len() {
        let b = body[i];
        if b == b'\\' {
            let esc_start = i;
            i += 1;
            if i >= body.len() {
                return Err(StrDecodeError { kind: StrDecodeErrorKind::BadEscape, offset: esc_start });
            }
            match body[i] {
                b'"' => {
                    out.push(b'"');
                    i += 1;
                }
                b'\\' => {
                    out.push(b'\\');
                    i += 1;
                }
                b'/' => {
                    out.push(b'/');
                    i += 1;
                }
                b'b' => {
                    out.push(0x08);
                    i += 1;
                }
                b'f' => {
                    out.push(0x0C);
                    i += 1;
                }
                b'n' => {
                    out.push(b'\n');
                    i += 1;
                }
                b'r' => {
                    out.push(b'\r');
                    i += 1;
                }
                b't' => {
                    out.push(b'\t');
                    i += 1;
                }
                b'u' => {
                    let digits_at = i + 1;
                    let cp = read_hex4(body, digits_at)
                        .ok_or(StrDecodeError { kind: StrDecodeErrorKind::BadUnicode, offset: esc_start })?;
                    i = digits_at + 4;
                    if is_high_surrogate(cp) {
                        if body.get(i) != Some(&b'\\') || body.get(i + 1) != Some(&b'u') {
                            return Err(StrDecodeError {
                                kind: StrDecodeErrorKind::BadUnicode,
                                offset: esc_start,
                            });
                        }
                        let low_digits_at = i + 2;
                        let low = read_hex4(body, low_digits_at).ok_or(StrDecodeError {
                            kind: StrDecodeErrorKind::BadUnicode,
                            offset: esc_start,
                        })?;
                        if !is_low_surrogate(low) {
                            return Err(StrDecodeError {
                                kind: StrDecodeErrorKind::BadUnicode,
                                offset: esc_start,
                            });
                        }
                        let combined = 0x10000 + (cp - 0xD800) * 0x400 + (low - 0xDC00);
                        push_codepoint(&mut out, combined);
                        i = low_digits_at + 4;
                    } else if is_low_surrogate(cp) {
                        // Lone low surrogate.
                        return Err(StrDecodeError {
                            kind: StrDecodeErrorKind::BadUnicode,
                            offset: esc_start,
                        });
                    } else {
                        push_codepoint(&mut out, cp);
                    }
                }
                _ => {
                    return Err(StrDecodeError { kind: StrDecodeErrorKind::BadEscape, offset: esc_start });
                }
            }
        } else if b < 0x20 && !allow_unescaped_controls {
            return Err(StrDecodeError { kind: StrDecodeErrorKind::UnescapedControl, offset: i });
        } else {
            out.push(b);
            i += 1;
        }
    }
    Ok(out)
}

/// Validate `bytes` as UTF-8 under `mode`. When `validate_utf8` is on, the
/// output is scanned for valid UTF-8; `Reject`/`Replace` both fail on the
/// first ill-formed sequence (see [`Utf8Mode`]); `Verbatim`
/// always succeeds.
pub(crate) fn validate_utf8(bytes: &[u8], mode: Utf8Mode) -> Result<(), usize> {
    match mode {
        Utf8Mode::Verbatim => Ok(()),
        Utf8Mode::Reject | Utf8Mode::Replace => {
            std::str::from_utf8(bytes).map(|_| ()).map_err(|e| e.valid_up_to())
        }
    }
}

/// Validate a number lexeme against RFC 8259 grammar: optional `-`, an
/// integer part (`0` or a non-zero digit followed by digits, no other
/// leading zeros), an optional `.digits` fraction, an optional
/// `[eE][+-]?digits` exponent. Does not accept `NaN`/`Infinity`
/// spellings; those are lexer keyword tokens, not numeric lexemes.
pub(crate) fn validate_number_syntax(lexeme: &[u8]) -> bool {
    let mut i = 0usize;
    let n = lexeme.len();
    if n == 0 {
        return false;
    }
    if lexeme[i] == b'-' {
        i += 1;
    }
    if i >= n {
        return false;
    }
    if lexeme[i] == b'0' {
        i += 1;
    } else if lexeme[i].is_ascii_digit() {
        while i < n && lexeme[i].is_ascii_digit() {
            i += 1;
        }
    } else {
        return false;
    }

    if i < n && lexeme[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < n && lexeme[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return false;
        }
    }

    if i < n && (lexeme[i] == b'e' || lexeme[i] == b'E') {
        i += 1;
        if i < n && (lexeme[i] == b'+' || lexeme[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < n && lexeme[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == n
}

/// Independently attempt each of the three numeric views for a
/// syntactically valid lexeme: signed/unsigned 64-bit if the lexeme is an
/// integer in range, and a double via strict decimal conversion.
pub(crate) fn decode_number_views(lexeme: &[u8]) -> (Option<i64>, Option<u64>, Option<f64>) {
    let text = match std::str::from_utf8(lexeme) {
        Ok(t) => t,
        Err(_) => return (None, None, None),
    };
    let is_integer = !text.contains('.') && !text.contains('e') && !text.contains('E');

    let i64_val = if is_integer { text.parse::<i64>().ok() } else { None };
    let u64_val = if is_integer { text.parse::<u64>().ok() } else { None };
    let f64_val = text.parse::<f64>().ok();

    (i64_val, u64_val, f64_val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_standard_escapes() {
        let body = br#"a\"b\\c\/d\be\ff\ng\rh\ti"#;
        let decoded = decode_string_body(body, false).unwrap();
        assert_eq!(decoded, b"a\"b\\c/d\x08e\x0cf\ng\rh\ti");
    }

    #[test]
    fn decodes_surrogate_pair() {
        // U+1F600 GRINNING FACE, written as a JSON surrogate pair escape.
        let body = b"\\uD83D\\uDE00";
        let decoded = decode_string_body(body, false).unwrap();
        assert_eq!(decoded, "\u{1F600}".as_bytes());
    }

    #[test]
    fn lone_high_surrogate_is_bad_unicode() {
        let body = br"\uD800";
        let err = decode_string_body(body, false).unwrap_err();
        assert_eq!(err.kind, StrDecodeErrorKind::BadUnicode);
    }

    #[test]
    fn lone_low_surrogate_is_bad_unicode() {
        let body = br"\uDC00";
        let err = decode_string_body(body, false).unwrap_err();
        assert_eq!(err.kind, StrDecodeErrorKind::BadUnicode);
    }

    #[test]
    fn unescaped_control_rejected_unless_allowed() {
        let body = b"a\x01b";
        assert!(decode_string_body(body, false).is_err());
        assert_eq!(decode_string_body(body, true).unwrap(), b"a\x01b");
    }

    #[test]
    fn bad_escape_char_is_rejected() {
        let body = br"\q";
        let err = decode_string_body(body, false).unwrap_err();
        assert_eq!(err.kind, StrDecodeErrorKind::BadEscape);
    }

    #[test]
    fn replace_mode_matches_reject_mode() {
        let invalid = [0xFFu8, 0xFE];
        assert_eq!(validate_utf8(&invalid, Utf8Mode::Reject).is_err(), true);
        assert_eq!(
            validate_utf8(&invalid, Utf8Mode::Reject).is_err(),
            validate_utf8(&invalid, Utf8Mode::Replace).is_err()
        );
    }

    #[test]
    fn verbatim_mode_accepts_anything() {
        let invalid = [0xFFu8, 0xFE];
        assert!(validate_utf8(&invalid, Utf8Mode::Verbatim).is_ok());
    }

    #[test]
    fn number_syntax_rejects_leading_zero() {
        assert!(!validate_number_syntax(b"0123"));
        assert!(validate_number_syntax(b"0"));
        assert!(validate_number_syntax(b"0.5"));
    }

    #[test]
    fn number_syntax_rejects_bare_dot() {
        assert!(!validate_number_syntax(b".5"));
        assert!(!validate_number_syntax(b"5."));
    }

    #[test]
    fn number_syntax_accepts_exponent_forms() {
        assert!(validate_number_syntax(b"1e10"));
        assert!(validate_number_syntax(b"1E+10"));
        assert!(validate_number_syntax(b"-1.5e-10"));
    }

    #[test]
    fn decode_number_views_populates_integer_and_float() {
        let (i, u, f) = decode_number_views(b"42");
        assert_eq!(i, Some(42));
        assert_eq!(u, Some(42));
        assert_eq!(f, Some(42.0));
    }

    #[test]
    fn decode_number_views_float_lexeme_has_no_integer_views() {
        let (i, u, f) = decode_number_views(b"1.5");
        assert_eq!(i, None);
        assert_eq!(u, None);
        assert_eq!(f, Some(1.5));
    }

    #[test]
    fn decode_number_views_negative_has_no_u64() {
        let (i, u, _) = decode_number_views(b"-5");
        assert_eq!(i, Some(-5));
        assert_eq!(u, None);
    }
}
