/*!
# Streaming writer

A stack-validated, sink-driven writer exposing the eight primitive
operations: `begin`/`end` for each container kind, `key`, and one op per
scalar kind (`null`, `bool`, four number variants, `string`), plus
`finish`.

The only abstraction is the sink: a trait with a single
`write(bytes) -> bool` method, so the writer never hard-codes a particular
output destination.
*/
use crate::error::{ErrorKind, WriterError};
use crate::writer::{escape_string_bytes, push_indent, WriteOptions};

/// An output channel for a [`StreamWriter`]. Returns `true` on success;
/// `false` latches the writer into the failed state with `E_WRITE`.
pub trait Sink {
    fn write(&mut self, bytes: &[u8]) -> bool;
}

/// A growable in-memory sink that never fails, owning and reallocating its
/// buffer as needed.
#[derive(Debug, Default)]
pub struct GrowableBuffer {
    buf: Vec<u8>,
}

impl GrowableBuffer {
    pub fn new() -> GrowableBuffer {
        GrowableBuffer { buf: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

impl Sink for GrowableBuffer {
    fn write(&mut self, bytes: &[u8]) -> bool {
        self.buf.extend_from_slice(bytes);
        true
    }
}

/// A fixed-capacity sink that records truncation instead of growing. Writes
/// past capacity are silently dropped; the writer itself never sees a
/// failure from this sink.
#[derive(Debug)]
pub struct FixedBuffer {
    buf: Vec<u8>,
    len: usize,
    truncated: bool,
}

impl FixedBuffer {
    pub fn new(capacity: usize) -> FixedBuffer {
        FixedBuffer { buf: vec![0u8; capacity], len: 0, truncated: false }
    }

    pub fn written(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl Sink for FixedBuffer {
    fn write(&mut self, bytes: &[u8]) -> bool {
        let remaining = self.buf.len() - self.len;
        let take = bytes.len().min(remaining);
        self.buf[self.len..self.len + take].copy_from_slice(&bytes[..take]);
        self.len += take;
        if take < bytes.len() {
            self.truncated = true;
        }
        true
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FrameKind {
    Object,
    Array,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Frame {
    kind: FrameKind,
    has_elements: bool,
    /// Only meaningful for `FrameKind::Object`: true when the next expected
    /// token is a key rather than a value.
    expecting_key: bool,
}

/// Frame stack depth bound, to prevent runaway nesting.
const MAX_STACK_FRAMES: usize = 1_000_000;

/// A stack-validated streaming JSON writer.
pub struct StreamWriter<S: Sink> {
    sink: S,
    opts: WriteOptions,
    frames: Vec<Frame>,
    failed: bool,
}

impl<S: Sink> StreamWriter<S> {
    pub fn new(sink: S, opts: WriteOptions) -> StreamWriter<S> {
        StreamWriter { sink, opts, frames: Vec::new(), failed: false }
    }

    fn fail(&mut self, kind: ErrorKind, message: &'static str) -> Result<(), WriterError> {
        self.failed = true;
        tracing::debug!(kind = ?kind, message, "streaming writer operation rejected");
        Err(WriterError { kind, message })
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), WriterError> {
        if !self.sink.write(bytes) {
            return self.fail(ErrorKind::Write, "sink write failed");
        }
        Ok(())
    }

    /// Once any operation fails, every further operation returns a state
    /// error until the writer is dropped.
    fn check_ok(&mut self) -> Result<(), WriterError> {
        if self.failed {
            return Err(WriterError { kind: ErrorKind::State, message: "writer already in a failed state" });
        }
        Ok(())
    }

    /// Legality of the next operation against the top frame.
    fn check_state(&mut self, is_key: bool, is_object_end: bool, is_array_end: bool) -> Result<(), WriterError> {
        self.check_ok()?;
        match self.frames.last() {
            None => {
                if is_key || is_object_end || is_array_end {
                    return self.fail(ErrorKind::State, "no open container for this operation");
                }
                Ok(())
            }
            Some(top) if top.kind == FrameKind::Object => {
                if is_object_end {
                    return if top.expecting_key {
                        Ok(())
                    } else {
                        self.fail(ErrorKind::State, "object_end with a pending value (dangling key)")
                    };
                }
                if is_array_end {
                    return self.fail(ErrorKind::State, "array_end inside an object frame");
                }
                if is_key {
                    if top.expecting_key {
                        Ok(())
                    } else {
                        self.fail(ErrorKind::State, "key not expected; a value is pending")
                    }
                } else if top.expecting_key {
                    self.fail(ErrorKind::State, "value not expected; object frame is expecting a key")
                } else {
                    Ok(())
                }
            }
            Some(_array) => {
                if is_object_end {
                    return self.fail(ErrorKind::State, "object_end inside an array frame");
                }
                if is_key {
                    return self.fail(ErrorKind::State, "key outside an object frame");
                }
                Ok(())
            }
        }
    }

    /// Comma-if-needed plus pretty indentation before a key, or before a
    /// value that opens its own slot (array element, or the root value),
    /// driven by the top frame's `has_elements`.
    fn enter_element(&mut self) -> Result<(), WriterError> {
        let (has_elements, depth) = match self.frames.last() {
            Some(top) => (top.has_elements, self.frames.len()),
            None => (false, 0),
        };
        if has_elements {
            self.write_raw(b",")?;
        }
        if !self.frames.is_empty() {
            let mut buf = Vec::new();
            push_indent(&mut buf, &self.opts, depth).map_err(|e| {
                self.failed = true;
                e
            })?;
            if !buf.is_empty() {
                self.write_raw(&buf)?;
            }
        }
        Ok(())
    }

    /// Comma-if-needed plus pretty indentation before a *value*, skipped
    /// when the value fills an object member's slot: `key()` already
    /// emitted the comma, indent, and `"key": ` for that slot, so the
    /// value that follows it must not enter a second time.
    fn enter_value(&mut self) -> Result<(), WriterError> {
        if let Some(top) = self.frames.last() {
            if top.kind == FrameKind::Object {
                return Ok(());
            }
        }
        self.enter_element()
    }

    /// Marks the just-written value complete in the parent frame: the
    /// parent now has an element (for future commas), and if it is an
    /// object, the next expected token flips back to a key.
    fn complete_in_parent(&mut self) {
        if let Some(top) = self.frames.last_mut() {
            top.has_elements = true;
            if top.kind == FrameKind::Object {
                top.expecting_key = true;
            }
        }
    }

    fn push_frame(&mut self, kind: FrameKind) -> Result<(), WriterError> {
        if self.frames.len() >= MAX_STACK_FRAMES {
            return self.fail(ErrorKind::Limit, "streaming writer frame stack overflow");
        }
        self.frames.push(Frame { kind, has_elements: false, expecting_key: true });
        Ok(())
    }

    pub fn begin_object(&mut self) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        self.enter_value()?;
        self.write_raw(b"{")?;
        self.push_frame(FrameKind::Object)
    }

    pub fn end_object(&mut self) -> Result<(), WriterError> {
        self.check_state(false, true, false)?;
        let frame = self.frames.pop().expect("checked: top frame is an object");
        if frame.has_elements {
            let mut buf = Vec::new();
            push_indent(&mut buf, &self.opts, self.frames.len()).map_err(|e| {
                self.failed = true;
                e
            })?;
            if !buf.is_empty() {
                self.write_raw(&buf)?;
            }
        }
        self.write_raw(b"}")?;
        self.complete_in_parent();
        Ok(())
    }

    pub fn begin_array(&mut self) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        self.enter_value()?;
        self.write_raw(b"[")?;
        self.push_frame(FrameKind::Array)
    }

    pub fn end_array(&mut self) -> Result<(), WriterError> {
        self.check_state(false, false, true)?;
        let frame = self.frames.pop().expect("checked: top frame is an array");
        if frame.has_elements {
            let mut buf = Vec::new();
            push_indent(&mut buf, &self.opts, self.frames.len()).map_err(|e| {
                self.failed = true;
                e
            })?;
            if !buf.is_empty() {
                self.write_raw(&buf)?;
            }
        }
        self.write_raw(b"]")?;
        self.complete_in_parent();
        Ok(())
    }

    pub fn key(&mut self, key: &str) -> Result<(), WriterError> {
        self.check_state(true, false, false)?;
        self.enter_element()?;
        let mut buf = Vec::new();
        escape_string_bytes(&mut buf, key.as_bytes(), &self.opts);
        buf.push(b':');
        if self.opts.pretty {
            buf.push(b' ');
        }
        self.write_raw(&buf)?;
        self.frames.last_mut().expect("checked: top frame is an object").expecting_key = false;
        Ok(())
    }

    fn value_bytes(&mut self, bytes: &[u8]) -> Result<(), WriterError> {
        self.enter_value()?;
        self.write_raw(bytes)?;
        self.complete_in_parent();
        Ok(())
    }

    pub fn null(&mut self) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        self.value_bytes(b"null")
    }

    pub fn boolean(&mut self, b: bool) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        self.value_bytes(if b { b"true" } else { b"false" })
    }

    /// Emit a pre-validated number lexeme verbatim, bypassing
    /// `canonical_numbers` (the caller already has the exact spelling it
    /// wants on the wire).
    pub fn number_lexeme(&mut self, lexeme: &[u8]) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        self.value_bytes(lexeme)
    }

    pub fn number_i64(&mut self, n: i64) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        let s = n.to_string();
        self.value_bytes(s.as_bytes())
    }

    pub fn number_u64(&mut self, n: u64) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        let s = n.to_string();
        self.value_bytes(s.as_bytes())
    }

    pub fn number_f64(&mut self, n: f64) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        if !n.is_finite() {
            if !self.opts.allow_nonfinite_numbers {
                return self.fail(ErrorKind::NonFinite, "non-finite number emitted without allow_nonfinite_numbers");
            }
            let spelling: &[u8] = if n.is_nan() {
                b"NaN"
            } else if n.is_sign_negative() {
                b"-Infinity"
            } else {
                b"Infinity"
            };
            return self.value_bytes(spelling);
        }
        let mut buf = ryu::Buffer::new();
        let formatted = buf.format(n).as_bytes().to_vec();
        self.value_bytes(&formatted)
    }

    pub fn string(&mut self, s: &str) -> Result<(), WriterError> {
        self.check_state(false, false, false)?;
        let mut buf = Vec::new();
        escape_string_bytes(&mut buf, s.as_bytes(), &self.opts);
        self.value_bytes(&buf)
    }

    /// Require an empty frame stack (otherwise `E_INCOMPLETE`), and hand
    /// back the sink.
    pub fn finish(mut self) -> Result<S, WriterError> {
        self.check_ok()?;
        if !self.frames.is_empty() {
            self.failed = true;
            return Err(WriterError { kind: ErrorKind::Incomplete, message: "finish called with an open container" });
        }
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_writer(opts: WriteOptions) -> StreamWriter<GrowableBuffer> {
        StreamWriter::new(GrowableBuffer::new(), opts)
    }

    #[test]
    fn basic_object_round_trips_compact() {
        let mut w = new_writer(WriteOptions::default());
        w.begin_object().unwrap();
        w.key("a").unwrap();
        w.number_i64(1).unwrap();
        w.key("b").unwrap();
        w.begin_array().unwrap();
        w.boolean(true).unwrap();
        w.null().unwrap();
        w.string("x").unwrap();
        w.end_array().unwrap();
        w.end_object().unwrap();
        let buf = w.finish().unwrap();
        assert_eq!(buf.into_inner(), br#"{"a":1,"b":[true,null,"x"]}"#);
    }

    #[test]
    fn pretty_nested_container_matches_dom_writer_layout() {
        let opts = WriteOptions { pretty: true, ..Default::default() };
        let mut w = new_writer(opts);
        w.begin_object().unwrap();
        w.key("x").unwrap();
        w.begin_array().unwrap();
        w.number_i64(1).unwrap();
        w.number_i64(2).unwrap();
        w.end_array().unwrap();
        w.end_object().unwrap();
        let buf = w.finish().unwrap();
        assert_eq!(
            String::from_utf8(buf.into_inner()).unwrap(),
            "{\n  \"x\": [\n    1,\n    2\n  ]\n}"
        );
    }

    #[test]
    fn double_begin_object_is_state_error_and_latches() {
        let mut w = new_writer(WriteOptions::default());
        w.begin_object().unwrap();
        let err = w.begin_object().unwrap_err();
        assert_eq!(err.kind, ErrorKind::State);
        let err = w.finish().unwrap_err();
        assert_eq!(err.kind, ErrorKind::State);
    }

    #[test]
    fn object_end_with_dangling_key_is_state_error() {
        let mut w = new_writer(WriteOptions::default());
        w.begin_object().unwrap();
        w.key("a").unwrap();
        let err = w.end_object().unwrap_err();
        assert_eq!(err.kind, ErrorKind::State);
    }

    #[test]
    fn finish_with_open_container_is_incomplete() {
        let mut w = new_writer(WriteOptions::default());
        w.begin_array().unwrap();
        let err = w.finish().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Incomplete);
    }

    #[test]
    fn fixed_buffer_records_truncation_without_failing_writer() {
        let mut w = StreamWriter::new(FixedBuffer::new(4), WriteOptions::default());
        w.string("hello").unwrap();
        let buf = w.finish().unwrap();
        assert!(buf.truncated());
        assert_eq!(buf.written().len(), 4);
    }

    #[test]
    fn nonfinite_number_rejected_without_option() {
        let mut w = new_writer(WriteOptions::default());
        let err = w.number_f64(f64::NAN).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NonFinite);
    }
}
