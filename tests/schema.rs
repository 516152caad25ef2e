//! End-to-end schema compilation and validation scenarios.

use jsondom::{compile_schema, parse, validate_schema, ParseOptions};

const SCHEMA: &[u8] =
    br#"{"type":"object","required":["n"],"properties":{"n":{"type":"number","minimum":0,"maximum":10}}}"#;

fn compiled() -> jsondom::SchemaNode {
    let doc = parse(SCHEMA, ParseOptions::default()).unwrap();
    compile_schema(doc.root()).unwrap()
}

#[test]
fn scenario_7_in_range_instance_validates() {
    let node = compiled();
    let instance = parse(br#"{"n":5}"#, ParseOptions::default()).unwrap();
    assert!(validate_schema(&node, instance.root()).is_ok());
}

#[test]
fn scenario_7_above_maximum_fails() {
    let node = compiled();
    let instance = parse(br#"{"n":11}"#, ParseOptions::default()).unwrap();
    assert!(validate_schema(&node, instance.root()).is_err());
}

#[test]
fn scenario_7_missing_required_property_fails() {
    let node = compiled();
    let instance = parse(br#"{}"#, ParseOptions::default()).unwrap();
    assert!(validate_schema(&node, instance.root()).is_err());
}

#[test]
fn scenario_7_unknown_property_is_ignored() {
    let node = compiled();
    let instance = parse(br#"{"n":5,"x":"ignored"}"#, ParseOptions::default()).unwrap();
    assert!(validate_schema(&node, instance.root()).is_ok());
}

#[test]
fn schema_idempotence_depends_only_on_the_abstract_schema() {
    let a = compiled();
    // Recompile from an independently re-parsed, differently-whitespaced
    // schema document; validation results must agree regardless.
    let doc = parse(br#"{ "type" : "object" , "required" : [ "n" ] , "properties" : { "n" : { "type" : "number" , "minimum" : 0 , "maximum" : 10 } } }"#, ParseOptions::default()).unwrap();
    let b = compile_schema(doc.root()).unwrap();

    for src in [br#"{"n":5}"#.as_slice(), br#"{"n":11}"#.as_slice(), br#"{}"#.as_slice()] {
        let instance = parse(src, ParseOptions::default()).unwrap();
        assert_eq!(
            validate_schema(&a, instance.root()).is_ok(),
            validate_schema(&b, instance.root()).is_ok()
        );
    }
}
