/*!
# Schema compilation

Walks a parsed JSON value (the schema document) into a [`SchemaNode`] tree.
Unknown keys are ignored for forward compatibility.
*/
use crate::context::{Child, Context, Node};
use crate::error::SchemaError;
use crate::number::{LexemeRef, NumberValue};
use crate::schema::{SchemaNode, TypeSet};
use crate::value::{Document, ObjectRef, ValueRef};

/// Deep-clone `src` into `dst`'s arena, returning the new node's id. Used
/// to give `enum`/`const` values their own schema-owned context, detached
/// from whatever document the schema itself was parsed from.
fn clone_into(dst: &mut Context<'static>, src: ValueRef<'_, '_>) -> crate::context::NodeId {
    use crate::value::ValueKind;
    match src.kind() {
        ValueKind::Null => dst.push_node(Node::Null),
        ValueKind::Bool => dst.push_node(Node::Bool(src.as_bool().unwrap())),
        ValueKind::Number => {
            let n = src.as_number().unwrap();
            let lexeme = src.number_lexeme().map(|bytes| {
                LexemeRef::Owned(dst.intern_lexeme(bytes).expect("schema clone allocation failure"))
            });
            let cloned = NumberValue::new(lexeme, n.as_i64(), n.as_u64(), n.as_f64());
            dst.push_node(Node::Number(cloned))
        }
        ValueKind::String => {
            let data = dst
                .intern_str(src.as_str_bytes().unwrap_or(b""))
                .expect("schema clone allocation failure");
            dst.push_node(Node::Str(data))
        }
        ValueKind::Array => {
            let children: Vec<Child> = src
                .as_array()
                .unwrap()
                .iter()
                .map(|v| Child::Local(clone_into(dst, v)))
                .collect();
            dst.push_node(Node::Array(children))
        }
        ValueKind::Object => {
            let pairs = src
                .as_object()
                .unwrap()
                .iter()
                .map(|(k, v)| {
                    let key = dst.intern_key(k.as_bytes()).expect("schema clone allocation failure");
                    (key, Child::Local(clone_into(dst, v)))
                })
                .collect();
            dst.push_node(Node::Object(pairs))
        }
    }
}

fn clone_standalone(src: ValueRef<'_, '_>) -> Document<'static> {
    let mut ctx = Context::new();
    let id = clone_into(&mut ctx, src);
    ctx.set_root(id);
    Document { ctx }
}

fn parse_type_value(v: ValueRef<'_, '_>) -> TypeSet {
    let mut set = TypeSet::default();
    if let Some(name) = v.as_str() {
        set.insert_name(name);
        return set;
    }
    if let Some(arr) = v.as_array() {
        for item in arr.iter() {
            if let Some(name) = item.as_str() {
                set.insert_name(name);
            }
        }
    }
    set
}

fn as_nonneg_usize(v: ValueRef<'_, '_>) -> Option<usize> {
    let n = v.as_number()?;
    if let Some(u) = n.as_u64() {
        return Some(u as usize);
    }
    n.as_i64().filter(|&i| i >= 0).map(|i| i as usize)
}

fn compile_properties(node: &mut SchemaNode, obj: ObjectRef<'_, '_>) -> Result<(), SchemaError> {
    if let Some(props) = obj.get("properties").and_then(|v| v.as_object()) {
        for (key, sub) in props.iter() {
            node.properties.push((key.to_string(), compile_node(sub)?));
        }
    }
    Ok(())
}

fn compile_node(schema: ValueRef<'_, '_>) -> Result<SchemaNode, SchemaError> {
    let mut node = SchemaNode::default();
    let obj = match schema.as_object() {
        Some(o) => o,
        // A non-object schema value (e.g. a bare `true`/`false` in drafts
        // that allow it) degenerates to "accept everything" in this
        // subset.
        None => return Ok(node),
    };

    if let Some(t) = obj.get("type") {
        node.types = parse_type_value(t);
    }
    compile_properties(&mut node, obj)?;
    if let Some(req) = obj.get("required").and_then(|v| v.as_array()) {
        for item in req.iter() {
            if let Some(name) = item.as_str() {
                node.required.push(name.to_string());
            }
        }
    }
    if let Some(items) = obj.get("items") {
        node.items = Some(Box::new(compile_node(items)?));
    }
    if let Some(enum_arr) = obj.get("enum").and_then(|v| v.as_array()) {
        let mut ctx = Context::new();
        let children: Vec<Child> = enum_arr.iter().map(|v| Child::Local(clone_into(&mut ctx, v))).collect();
        let root = ctx.push_node(Node::Array(children));
        ctx.set_root(root);
        node.enum_values = Some(Document { ctx });
    }
    if let Some(c) = obj.get("const") {
        node.const_value = Some(clone_standalone(c));
    }
    if let Some(min) = obj.get("minimum").and_then(|v| v.as_number()).and_then(NumberValue::as_f64) {
        node.minimum = Some(min);
    }
    if let Some(max) = obj.get("maximum").and_then(|v| v.as_number()).and_then(NumberValue::as_f64) {
        node.maximum = Some(max);
    }
    if let Some(v) = obj.get("minLength").and_then(as_nonneg_usize) {
        node.min_length = Some(v);
    }
    if let Some(v) = obj.get("maxLength").and_then(as_nonneg_usize) {
        node.max_length = Some(v);
    }
    if let Some(v) = obj.get("minItems").and_then(as_nonneg_usize) {
        node.min_items = Some(v);
    }
    if let Some(v) = obj.get("maxItems").and_then(as_nonneg_usize) {
        node.max_items = Some(v);
    }
    Ok(node)
}

/// Compile a schema document's root value into a [`SchemaNode`] tree (spec
/// §4.5).
pub fn compile(schema: ValueRef<'_, '_>) -> Result<SchemaNode, SchemaError> {
    let node = compile_node(schema)?;
    tracing::debug!(
        properties = node.properties.len(),
        required = node.required.len(),
        "compiled schema node"
    );
    Ok(node)
}
