/*!
# Schema validation

Recursively checks a `(SchemaNode, instance)` pair in order: `const`, then
`enum`, then `type`, then per-kind bounds/recursion.
*/
use crate::error::SchemaError;
use crate::schema::SchemaNode;
use crate::value::{values_eq, ValueKind, ValueRef};

fn err(path: &str, message: &'static str) -> SchemaError {
    SchemaError { message, path: path.to_string() }
}

fn child_path(path: &str, segment: &str) -> String {
    format!("{}/{}", path, segment)
}

fn validate_at(node: &SchemaNode, instance: ValueRef<'_, '_>, path: &str) -> Result<(), SchemaError> {
    if let Some(doc) = &node.const_value {
        return if values_eq(instance, doc.root()) {
            Ok(())
        } else {
            Err(err(path, "instance does not match const"))
        };
    }

    if let Some(doc) = &node.enum_values {
        let candidates = doc.root().as_array().expect("enum_values document root is always an array");
        return if candidates.iter().any(|v| values_eq(instance, v)) {
            Ok(())
        } else {
            Err(err(path, "instance is not one of the enum values"))
        };
    }

    if !node.types.is_any() && !node.types.contains(instance.kind()) {
        return Err(err(path, "instance type not allowed by schema"));
    }

    match instance.kind() {
        ValueKind::Number => {
            let n = instance.as_number().expect("kind() said Number");
            if let Some(f) = n.as_f64() {
                if let Some(min) = node.minimum {
                    if f < min {
                        return Err(err(path, "number below minimum"));
                    }
                }
                if let Some(max) = node.maximum {
                    if f > max {
                        return Err(err(path, "number above maximum"));
                    }
                }
            }
        }
        ValueKind::String => {
            let len = instance.as_str_bytes().map(|b| b.len()).unwrap_or(0);
            if let Some(min) = node.min_length {
                if len < min {
                    return Err(err(path, "string shorter than minLength"));
                }
            }
            if let Some(max) = node.max_length {
                if len > max {
                    return Err(err(path, "string longer than maxLength"));
                }
            }
        }
        ValueKind::Array => {
            let arr = instance.as_array().expect("kind() said Array");
            if let Some(min) = node.min_items {
                if arr.len() < min {
                    return Err(err(path, "array shorter than minItems"));
                }
            }
            if let Some(max) = node.max_items {
                if arr.len() > max {
                    return Err(err(path, "array longer than maxItems"));
                }
            }
            if let Some(items_schema) = &node.items {
                for (i, item) in arr.iter().enumerate() {
                    validate_at(items_schema, item, &child_path(path, &i.to_string()))?;
                }
            }
        }
        ValueKind::Object => {
            let obj = instance.as_object().expect("kind() said Object");
            for key in &node.required {
                if obj.get(key).is_none() {
                    return Err(err(&child_path(path, key), "required property missing"));
                }
            }
            for (name, sub) in &node.properties {
                if let Some(v) = obj.get(name) {
                    validate_at(sub, v, &child_path(path, name))?;
                }
            }
        }
        ValueKind::Null | ValueKind::Bool => {}
    }

    Ok(())
}

/// Validate `instance` against a compiled schema.
pub fn validate(node: &SchemaNode, instance: ValueRef<'_, '_>) -> Result<(), SchemaError> {
    validate_at(node, instance, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ParseOptions};
    use crate::schema::compile;

    fn check(schema_src: &[u8], instance_src: &[u8]) -> Result<(), SchemaError> {
        let schema_doc = parse(schema_src, ParseOptions::default()).unwrap();
        let node = compile(schema_doc.root()).unwrap();
        let instance_doc = parse(instance_src, ParseOptions::default()).unwrap();
        validate(&node, instance_doc.root())
    }

    const SCHEMA: &[u8] =
        br#"{"type":"object","required":["n"],"properties":{"n":{"type":"number","minimum":0,"maximum":10}}}"#;

    #[test]
    fn in_range_property_validates() {
        assert!(check(SCHEMA, br#"{"n":5}"#).is_ok());
    }

    #[test]
    fn above_maximum_fails() {
        let err = check(SCHEMA, br#"{"n":11}"#).unwrap_err();
        assert!(err.path.contains('n'));
    }

    #[test]
    fn missing_required_property_fails() {
        assert!(check(SCHEMA, br#"{}"#).is_err());
    }

    #[test]
    fn unknown_properties_are_ignored() {
        assert!(check(SCHEMA, br#"{"n":5,"x":"ignored"}"#).is_ok());
    }

    #[test]
    fn const_short_circuits_further_checks() {
        let schema_doc = parse(br#"{"const":5,"type":"string"}"#, ParseOptions::default()).unwrap();
        let node = compile(schema_doc.root()).unwrap();
        let five = parse(b"5", ParseOptions::default()).unwrap();
        assert!(validate(&node, five.root()).is_ok());
        let six = parse(b"6", ParseOptions::default()).unwrap();
        assert!(validate(&node, six.root()).is_err());
    }

    #[test]
    fn enum_matches_any_listed_value() {
        let schema_doc = parse(br#"{"enum":["a","b"]}"#, ParseOptions::default()).unwrap();
        let node = compile(schema_doc.root()).unwrap();
        let a = parse(br#""a""#, ParseOptions::default()).unwrap();
        assert!(validate(&node, a.root()).is_ok());
        let c = parse(br#""c""#, ParseOptions::default()).unwrap();
        assert!(validate(&node, c.root()).is_err());
    }

    #[test]
    fn array_items_are_validated_recursively() {
        let schema_doc = parse(br#"{"type":"array","items":{"type":"number"}}"#, ParseOptions::default()).unwrap();
        let node = compile(schema_doc.root()).unwrap();
        let ok = parse(b"[1,2,3]", ParseOptions::default()).unwrap();
        assert!(validate(&node, ok.root()).is_ok());
        let bad = parse(br#"[1,"x"]"#, ParseOptions::default()).unwrap();
        assert!(validate(&node, bad.root()).is_err());
    }
}
