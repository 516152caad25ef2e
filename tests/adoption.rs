//! Cross-context adoption and deep-equality properties: adoption
//! correctness and the deep-equal equivalence-relation property.

use jsondom::{parse, values_eq, Document, NumberValue, ParseOptions};

#[test]
fn adopted_subtree_reads_through_its_foreign_context() {
    let mut parent = Document::array();
    let child = Document::string("hello");
    {
        let mut arr = parent.root_array_mut().unwrap();
        arr.adopt(child);
        arr.push_number(NumberValue::from_i64(1));
    }
    let arr = parent.root().as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr.get(0).unwrap().as_str(), Some("hello"));
    assert_eq!(arr.get(1).unwrap().as_number().unwrap().as_i64(), Some(1));
}

#[test]
fn deep_equal_ignores_which_context_built_each_side() {
    let doc_a = parse(br#"{"x":[1,2],"y":"z"}"#, ParseOptions::default()).unwrap();

    let mut doc_b = Document::object();
    {
        let mut obj = doc_b.root_object_mut().unwrap();
        {
            let mut arr = obj.put_array("x").unwrap();
            arr.push_number(NumberValue::from_i64(1));
            arr.push_number(NumberValue::from_i64(2));
        }
        obj.put_adopt("y", Document::string("z"));
    }

    assert!(values_eq(doc_a.root(), doc_b.root()));
}

#[test]
fn deep_equal_is_reflexive_symmetric_and_transitive_on_a_sample() {
    let a = parse(br#"[1,{"k":true},null]"#, ParseOptions::default()).unwrap();
    let b = parse(br#"[1,{"k":true},null]"#, ParseOptions::default()).unwrap();
    let c = parse(br#"[1,{"k":true},null]"#, ParseOptions::default()).unwrap();

    assert!(values_eq(a.root(), a.root()));
    assert_eq!(values_eq(a.root(), b.root()), values_eq(b.root(), a.root()));
    assert!(values_eq(a.root(), b.root()) && values_eq(b.root(), c.root()) && values_eq(a.root(), c.root()));
}

#[test]
fn replacing_an_adopted_child_drops_the_displaced_subtree() {
    let mut parent = Document::array();
    {
        let mut arr = parent.root_array_mut().unwrap();
        arr.adopt(Document::string("first"));
        arr.adopt(Document::string("second"));
    }
    {
        let mut arr = parent.root_array_mut().unwrap();
        assert!(arr.set_adopt(0, Document::string("replaced")));
    }
    let arr = parent.root().as_array().unwrap();
    assert_eq!(arr.get(0).unwrap().as_str(), Some("replaced"));
    assert_eq!(arr.get(1).unwrap().as_str(), Some("second"));
}

#[test]
fn removing_an_adopted_child_shifts_the_tail() {
    let mut parent = Document::array();
    {
        let mut arr = parent.root_array_mut().unwrap();
        arr.adopt(Document::bool(true));
        arr.adopt(Document::bool(false));
        arr.adopt(Document::null());
    }
    {
        let mut arr = parent.root_array_mut().unwrap();
        assert!(arr.remove(0));
    }
    let arr = parent.root().as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr.get(0).unwrap().as_bool(), Some(false));
    assert!(arr.get(1).unwrap().is_null());
}

#[test]
fn insert_adopt_shifts_the_tail_by_one() {
    let mut parent = Document::array();
    {
        let mut arr = parent.root_array_mut().unwrap();
        arr.adopt(Document::string("a"));
        arr.adopt(Document::string("c"));
    }
    {
        let mut arr = parent.root_array_mut().unwrap();
        assert!(arr.insert_adopt(1, Document::string("b")));
    }
    let arr = parent.root().as_array().unwrap();
    let values: Vec<_> = arr.iter().map(|v| v.as_str().unwrap().to_string()).collect();
    assert_eq!(values, vec!["a", "b", "c"]);
}
