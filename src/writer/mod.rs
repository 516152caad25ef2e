/*!
# Escape engine and DOM writer

Two writers — this recursive DOM writer and the stack-based streaming
writer in [`crate::writer::stream`] — share the byte-wise escape engine and
number-emission logic defined here.
*/
use crate::error::{ErrorKind, WriterError};
use crate::limits::checked_mul;
use crate::value::{ArrayRef, Document, ObjectRef, ValueKind, ValueRef};

pub mod stream;

/// Options controlling DOM and streaming emission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    pub pretty: bool,
    pub indent_spaces: usize,
    pub newline: &'static str,
    pub escape_solidus: bool,
    pub escape_unicode: bool,
    pub escape_all_non_ascii: bool,
    pub sort_object_keys: bool,
    pub canonical_numbers: bool,
    /// Reserved, no effect: unlike numbers, strings carry no preserved
    /// source-escape spelling to fall back on or override, so there is
    /// nothing for this flag to toggle (decision recorded in `DESIGN.md`).
    pub canonical_strings: bool,
    pub allow_nonfinite_numbers: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            pretty: false,
            indent_spaces: 2,
            newline: "\n",
            escape_solidus: false,
            escape_unicode: false,
            escape_all_non_ascii: false,
            sort_object_keys: false,
            canonical_numbers: false,
            canonical_strings: false,
            allow_nonfinite_numbers: false,
        }
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

fn push_u_escape(out: &mut Vec<u8>, byte: u8) {
    out.extend_from_slice(b"\\u00");
    out.push(HEX_DIGITS[(byte >> 4) as usize]);
    out.push(HEX_DIGITS[(byte & 0x0f) as usize]);
}

/// Escape `bytes` into `out` as a quoted JSON string. Byte-wise: high-bit
/// bytes are escaped one at a time without decoding the UTF-8 sequence they
/// belong to, so a multi-byte codepoint comes out as multiple `\u00XX`
/// escapes rather than one `\uXXXX` escape. This is a known limitation, not
/// a bug to fix casually — changing it would change the byte-for-byte
/// output of every non-ASCII string.
pub(crate) fn escape_string_bytes(out: &mut Vec<u8>, bytes: &[u8], opts: &WriteOptions) {
    out.push(b'"');
    for &b in bytes {
        match b {
            b'"' => out.extend_from_slice(b"\\\""),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'/' if opts.escape_solidus => out.extend_from_slice(b"\\/"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0c => out.extend_from_slice(b"\\f"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            c if c < 0x20 => push_u_escape(out, c),
            c if c >= 0x80 && (opts.escape_unicode || opts.escape_all_non_ascii) => push_u_escape(out, c),
            c => out.push(c),
        }
    }
    out.push(b'"');
}

fn write_f64(out: &mut Vec<u8>, f: f64, opts: &WriteOptions) -> Result<(), WriterError> {
    if !f.is_finite() {
        if !opts.allow_nonfinite_numbers {
            return Err(WriterError {
                kind: ErrorKind::NonFinite,
                message: "non-finite number emitted without allow_nonfinite_numbers",
            });
        }
        let spelling: &[u8] = if f.is_nan() {
            b"NaN"
        } else if f.is_sign_negative() {
            b"-Infinity"
        } else {
            b"Infinity"
        };
        out.extend_from_slice(spelling);
        return Ok(());
    }
    let mut buf = ryu::Buffer::new();
    out.extend_from_slice(buf.format(f).as_bytes());
    Ok(())
}

/// Emit a number's bytes: the verbatim lexeme unless `canonical_numbers` is
/// set, else i64, then u64, then a 17-significant-digit double.
pub(crate) fn write_number(out: &mut Vec<u8>, value: ValueRef<'_, '_>, opts: &WriteOptions) -> Result<(), WriterError> {
    if !opts.canonical_numbers {
        if let Some(lexeme) = value.number_lexeme() {
            out.extend_from_slice(lexeme);
            return Ok(());
        }
    }
    let n = value
        .as_number()
        .expect("write_number called on a value that is not a number");
    if let Some(i) = n.as_i64() {
        out.extend_from_slice(i.to_string().as_bytes());
        return Ok(());
    }
    if let Some(u) = n.as_u64() {
        out.extend_from_slice(u.to_string().as_bytes());
        return Ok(());
    }
    let f = n.as_f64().ok_or(WriterError {
        kind: ErrorKind::Invalid,
        message: "number has no representable view",
    })?;
    write_f64(out, f, opts)
}

/// Append a newline plus `indent_spaces * depth` spaces, the way the DOM
/// writer precedes each element and the closing bracket of a non-empty
/// container in pretty mode. No-op when `opts.pretty` is off.
pub(crate) fn push_indent(out: &mut Vec<u8>, opts: &WriteOptions, depth: usize) -> Result<(), WriterError> {
    if !opts.pretty {
        return Ok(());
    }
    let n = checked_mul(opts.indent_spaces, depth).ok_or(WriterError {
        kind: ErrorKind::Limit,
        message: "indent width overflow",
    })?;
    out.extend_from_slice(opts.newline.as_bytes());
    out.resize(out.len() + n, b' ');
    Ok(())
}

/// Serialize `doc`'s root value.
pub fn write_document(doc: &Document<'_>, opts: &WriteOptions) -> Result<Vec<u8>, WriterError> {
    write_value(doc.root(), opts)
}

/// Serialize a single value, recursively.
pub fn write_value(value: ValueRef<'_, '_>, opts: &WriteOptions) -> Result<Vec<u8>, WriterError> {
    let mut out = Vec::new();
    write_into(&mut out, value, opts, 0)?;
    Ok(out)
}

fn write_into(out: &mut Vec<u8>, value: ValueRef<'_, '_>, opts: &WriteOptions, depth: usize) -> Result<(), WriterError> {
    match value.kind() {
        ValueKind::Null => {
            out.extend_from_slice(b"null");
            Ok(())
        }
        ValueKind::Bool => {
            out.extend_from_slice(if value.as_bool().unwrap() { b"true" } else { b"false" });
            Ok(())
        }
        ValueKind::Number => write_number(out, value, opts),
        ValueKind::String => {
            escape_string_bytes(out, value.as_str_bytes().unwrap_or(b""), opts);
            Ok(())
        }
        ValueKind::Array => write_array(out, value.as_array().unwrap(), opts, depth),
        ValueKind::Object => write_object(out, value.as_object().unwrap(), opts, depth),
    }
}

fn write_array(out: &mut Vec<u8>, arr: ArrayRef<'_, '_>, opts: &WriteOptions, depth: usize) -> Result<(), WriterError> {
    out.push(b'[');
    if arr.is_empty() {
        out.push(b']');
        return Ok(());
    }
    let child_depth = depth + 1;
    for (i, item) in arr.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        push_indent(out, opts, child_depth)?;
        write_into(out, item, opts, child_depth)?;
    }
    push_indent(out, opts, depth)?;
    out.push(b']');
    Ok(())
}

fn write_object(out: &mut Vec<u8>, obj: ObjectRef<'_, '_>, opts: &WriteOptions, depth: usize) -> Result<(), WriterError> {
    out.push(b'{');
    if obj.is_empty() {
        out.push(b'}');
        return Ok(());
    }
    let mut pairs: Vec<_> = obj.iter().collect();
    if opts.sort_object_keys {
        // `Vec::sort_by` is stable, and byte-lex order already makes a
        // shorter prefix sort first when it ties with a longer key's head.
        pairs.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
    }
    let child_depth = depth + 1;
    for (i, (key, val)) in pairs.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        push_indent(out, opts, child_depth)?;
        escape_string_bytes(out, key.as_bytes(), opts);
        out.push(b':');
        if opts.pretty {
            out.push(b' ');
        }
        write_into(out, val, opts, child_depth)?;
    }
    push_indent(out, opts, depth)?;
    out.push(b'}');
    Ok(())
}
