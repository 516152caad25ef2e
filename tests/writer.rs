//! End-to-end writer scenarios covering compact round-tripping, pretty
//! printing, and streaming-writer state errors, plus the streaming writer
//! against a fixed-capacity sink.

use jsondom::parse;
use jsondom::writer::stream::{FixedBuffer, GrowableBuffer, StreamWriter};
use jsondom::{write_document, ErrorKind, ParseOptions, WriteOptions};

#[test]
fn scenario_1_compact_round_trip_is_byte_equal() {
    let input: &[u8] = br#"{"a":1,"b":[true,null,"x"]}"#;
    let doc = parse(input, ParseOptions::default()).unwrap();
    let out = write_document(&doc, &WriteOptions::default()).unwrap();
    assert_eq!(out, input);
}

#[test]
fn scenario_5_pretty_printing_matches_exact_layout() {
    let doc = parse(br#"{"x":[1,2]}"#, ParseOptions::default()).unwrap();
    let opts = WriteOptions { pretty: true, indent_spaces: 2, ..Default::default() };
    let out = write_document(&doc, &opts).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\n  \"x\": [\n    1,\n    2\n  ]\n}"
    );
}

#[test]
fn scenario_6_streaming_writer_misuse_latches_state_error() {
    let mut w = StreamWriter::new(GrowableBuffer::new(), WriteOptions::default());
    w.begin_object().unwrap();
    let err = w.begin_object().unwrap_err();
    assert_eq!(err.kind, ErrorKind::State);
    let err = w.finish().unwrap_err();
    assert_eq!(err.kind, ErrorKind::State);
}

#[test]
fn streaming_writer_matches_dom_writer_for_the_same_tree() {
    let doc = parse(br#"{"a":1,"b":[true,null,"x"]}"#, ParseOptions::default()).unwrap();
    let dom_out = write_document(&doc, &WriteOptions::default()).unwrap();

    let mut w = StreamWriter::new(GrowableBuffer::new(), WriteOptions::default());
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
    let stream_out = w.finish().unwrap().into_inner();

    assert_eq!(dom_out, stream_out);
}

#[test]
fn fixed_buffer_truncates_without_failing_the_writer() {
    let mut w = StreamWriter::new(FixedBuffer::new(4), WriteOptions::default());
    w.string("hello world").unwrap();
    let buf = w.finish().unwrap();
    assert!(buf.truncated());
    assert_eq!(buf.written().len(), 4);
}
