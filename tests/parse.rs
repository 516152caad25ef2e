//! End-to-end parse scenarios covering basic shape, duplicate-key
//! policies, non-finite numbers, and depth limits.

use jsondom::{parse, DupKeyPolicy, Error, ErrorKind, Limits, ParseOptions, ValueKind};

#[test]
fn scenario_1_basic_parse_produces_expected_shape() {
    let doc = parse(br#"{"a":1,"b":[true,null,"x"]}"#, ParseOptions::default()).unwrap();
    let obj = doc.root().as_object().unwrap();
    assert_eq!(obj.len(), 2);
    let b = obj.get("b").unwrap().as_array().unwrap();
    assert_eq!(b.len(), 3);
    assert_eq!(b.get(0).unwrap().as_bool(), Some(true));
    assert!(b.get(1).unwrap().is_null());
    assert_eq!(b.get(2).unwrap().as_str(), Some("x"));
}

#[test]
fn scenario_2_duplicate_key_policies() {
    let err = parse(br#"{"k":1,"k":2,"k":3}"#, ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DupKey);

    let first = ParseOptions { dupkeys: DupKeyPolicy::FirstWins, ..Default::default() };
    let doc = parse(br#"{"k":1,"k":2,"k":3}"#, first).unwrap();
    let obj = doc.root().as_object().unwrap();
    assert_eq!(obj.len(), 1);
    assert_eq!(obj.get("k").unwrap().as_number().unwrap().as_i64(), Some(1));

    let last = ParseOptions { dupkeys: DupKeyPolicy::LastWins, ..Default::default() };
    let doc = parse(br#"{"k":1,"k":2,"k":3}"#, last).unwrap();
    let obj = doc.root().as_object().unwrap();
    assert_eq!(obj.len(), 1);
    assert_eq!(obj.get("k").unwrap().as_number().unwrap().as_i64(), Some(3));

    let collect = ParseOptions { dupkeys: DupKeyPolicy::Collect, ..Default::default() };
    let doc = parse(br#"{"k":1,"k":2,"k":3}"#, collect).unwrap();
    let obj = doc.root().as_object().unwrap();
    assert_eq!(obj.len(), 1);
    let collected = obj.get("k").unwrap().as_array().unwrap();
    let values: Vec<_> = collected.iter().map(|v| v.as_number().unwrap().as_i64().unwrap()).collect();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn scenario_3_nonfinite_round_trip_parses_again_as_structurally_equal() {
    let opts = ParseOptions { allow_nonfinite_numbers: true, ..Default::default() };
    let doc = parse(b"[NaN,Infinity,-Infinity]", opts).unwrap();
    let write_opts = jsondom::WriteOptions { allow_nonfinite_numbers: true, ..Default::default() };
    let out = jsondom::write_document(&doc, &write_opts).unwrap();
    assert_eq!(out, b"[NaN,Infinity,-Infinity]");

    let doc2 = parse(&out, opts).unwrap();
    assert!(jsondom::values_eq(doc.root(), doc2.root()));
}

#[test]
fn scenario_4_depth_limit_fails_below_and_succeeds_at_threshold() {
    let six_nested = b"[[[[[[]]]]]]";
    let opts = ParseOptions { limits: Limits { max_depth: 5, ..Default::default() }, ..Default::default() };
    let err = parse(six_nested, opts).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Depth);

    let opts_ok = ParseOptions { limits: Limits { max_depth: 6, ..Default::default() }, ..Default::default() };
    let doc = parse(six_nested, opts_ok).unwrap();
    let mut cur = doc.root();
    for _ in 0..5 {
        let arr = cur.as_array().expect("nested array");
        assert_eq!(arr.len(), 1);
        cur = arr.get(0).unwrap();
    }
    assert_eq!(cur.kind(), ValueKind::Array);
    assert!(cur.as_array().unwrap().is_empty());
}

#[test]
fn crate_error_wraps_parse_error() {
    let parse_err = parse(b"{", ParseOptions::default()).unwrap_err();
    let wrapped: Error = parse_err.clone().into();
    match wrapped {
        Error::Parse(e) => assert_eq!(e.kind, parse_err.kind),
        _ => panic!("expected Error::Parse"),
    }
}
