/*!
# jsondom

A restricted, resource-bounded JSON parser and DOM, built around a
bump-allocated arena instead of per-node heap allocations.

* [`parser`] turns bytes into a [`value::Document`] under strict, checked
  resource limits (depth, string bytes, container elements, total bytes).
* [`value`] is the DOM itself: [`value::ValueRef`] for read access,
  [`value::ArrayMut`]/[`value::ObjectMut`] for in-place mutation, and an
  *adoption* mechanism for grafting one standalone document into another
  without copying.
* [`writer`] renders a document back to bytes, either all at once
  ([`writer::write_document`]) or incrementally through
  [`writer::stream::StreamWriter`].
* [`schema`] compiles and evaluates a small JSON Schema subset against a
  parsed document.

Most applications only need [`parser::parse`], [`writer::write_document`],
and the [`value`] read/mutation API; the rest is exposed for callers who
need finer control.
*/
#![forbid(unsafe_code)]

mod arena;
mod context;
pub mod error;
pub mod limits;
mod lexer;
pub mod number;
pub mod parser;
pub mod position;
pub mod schema;
mod strdecode;
pub mod value;
pub mod writer;

pub use error::{Error, ErrorKind, ParseError, Result, SchemaError, WriterError};
pub use limits::Limits;
pub use number::NumberValue;
pub use parser::{parse, parse_one, ParseOptions};
pub use position::{Position, Span};
pub use schema::{compile as compile_schema, validate as validate_schema, SchemaNode};
pub use strdecode::Utf8Mode;
pub use value::{
    values_cmp, values_eq, ArrayMut, ArrayRef, Document, DupKeyPolicy, ObjectMut, ObjectRef, ValueKind,
    ValueRef,
};
pub use writer::{write_document, write_value, WriteOptions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_then_write_round_trips_a_compact_document() {
        let doc = parse(br#"{"a":1,"b":[true,null]}"#, ParseOptions::default()).unwrap();
        let out = write_document(&doc, &WriteOptions::default()).unwrap();
        assert_eq!(out, br#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn public_surface_exposes_schema_round_trip() {
        let schema_doc = parse(br#"{"type":"number","minimum":0}"#, ParseOptions::default()).unwrap();
        let node = compile_schema(schema_doc.root()).unwrap();
        let instance = parse(b"5", ParseOptions::default()).unwrap();
        assert!(validate_schema(&node, instance.root()).is_ok());
    }
}
