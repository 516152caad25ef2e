/*!
# The `Value` tree and its mutation API

Read access is provided by [`ValueRef`], a cheap `Copy` handle into a
[`Context`]. Mutation happens through [`ArrayMut`]/[`ObjectMut`], which
borrow the owning context mutably for the duration of a single edit: a
value is mutated only through this public mutation API, never in place
through a raw handle.
*/
use std::convert::TryFrom;
use std::str;

use crate::context::{Child, Context, KeyData, Node, NodeId};
use crate::number::{number_eq, NumberValue};

/// The tag of a value's six-variant union.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

/// How to resolve a repeated object key during parsing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum DupKeyPolicy {
    /// Reject the document with `E_DUPKEY`.
    #[default]
    Error,
    /// Keep the first value, discard later ones.
    FirstWins,
    /// Keep the last value, discarding earlier ones.
    LastWins,
    /// Collect every value for the key into an array.
    Collect,
}

/// An owned, standalone document: one [`Context`] and its root node.
///
/// Created by a parse entry point or by one of the standalone constructors
/// ([`Document::null`], [`Document::array`], ...), each of which starts a
/// fresh context.
pub struct Document<'a> {
    pub(crate) ctx: Context<'a>,
}

impl Document<'static> {
    pub fn null() -> Document<'static> {
        let mut ctx = Context::new();
        let id = ctx.push_node(Node::Null);
        ctx.set_root(id);
        Document { ctx }
    }

    pub fn bool(b: bool) -> Document<'static> {
        let mut ctx = Context::new();
        let id = ctx.push_node(Node::Bool(b));
        ctx.set_root(id);
        Document { ctx }
    }

    pub fn number(n: NumberValue) -> Document<'static> {
        let mut ctx = Context::new();
        let id = ctx.push_node(Node::Number(n));
        ctx.set_root(id);
        Document { ctx }
    }

    pub fn string(s: &str) -> Document<'static> {
        let mut ctx = Context::new();
        let data = ctx.intern_str(s.as_bytes()).expect("allocation failure");
        let id = ctx.push_node(Node::Str(data));
        ctx.set_root(id);
        Document { ctx }
    }

    pub fn array() -> Document<'static> {
        let mut ctx = Context::new();
        let id = ctx.push_node(Node::Array(Vec::new()));
        ctx.set_root(id);
        Document { ctx }
    }

    pub fn object() -> Document<'static> {
        let mut ctx = Context::new();
        let id = ctx.push_node(Node::Object(Vec::new()));
        ctx.set_root(id);
        Document { ctx }
    }
}

impl<'a> Document<'a> {
    pub fn root(&self) -> ValueRef<'_, 'a> {
        ValueRef { ctx: &self.ctx, id: self.ctx.root().expect("document without a root") }
    }

    pub fn root_array_mut(&mut self) -> Option<ArrayMut<'_, 'a>> {
        let id = self.ctx.root()?;
        match self.ctx.node(id) {
            Node::Array(_) => Some(ArrayMut { ctx: &mut self.ctx, id }),
            _ => None,
        }
    }

    pub fn root_object_mut(&mut self) -> Option<ObjectMut<'_, 'a>> {
        let id = self.ctx.root()?;
        match self.ctx.node(id) {
            Node::Object(_) => Some(ObjectMut { ctx: &mut self.ctx, id }),
            _ => None,
        }
    }

    pub fn into_context(self) -> Context<'a> {
        self.ctx
    }
}

/// A read-only, `Copy` handle to one node in a [`Context`].
#[derive(Copy, Clone)]
pub struct ValueRef<'c, 'a> {
    ctx: &'c Context<'a>,
    id: NodeId,
}

impl<'c, 'a> ValueRef<'c, 'a> {
    pub(crate) fn new(ctx: &'c Context<'a>, id: NodeId) -> Self {
        ValueRef { ctx, id }
    }

    pub fn kind(&self) -> ValueKind {
        match self.ctx.node(self.id) {
            Node::Null => ValueKind::Null,
            Node::Bool(_) => ValueKind::Bool,
            Node::Number(_) => ValueKind::Number,
            Node::Str(_) => ValueKind::String,
            Node::Array(_) => ValueKind::Array,
            Node::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind() == ValueKind::Null
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.ctx.node(self.id) {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&'c NumberValue> {
        match self.ctx.node(self.id) {
            Node::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn number_lexeme(&self) -> Option<&'c [u8]> {
        let n = self.as_number()?;
        n.lexeme.map(|lex| self.ctx.number_lexeme_bytes(lex))
    }

    /// The string's raw bytes.
    ///
    /// Valid UTF-8 unless `allow_unescaped_controls` or a permissive UTF-8
    /// mode was active at parse time.
    pub fn as_str_bytes(&self) -> Option<&'c [u8]> {
        match self.ctx.node(self.id) {
            Node::Str(s) => Some(self.ctx.str_bytes(s)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'c str> {
        self.as_str_bytes().and_then(|b| str::from_utf8(b).ok())
    }

    pub fn as_array(&self) -> Option<ArrayRef<'c, 'a>> {
        match self.ctx.node(self.id) {
            Node::Array(children) => Some(ArrayRef { ctx: self.ctx, children }),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectRef<'c, 'a>> {
        match self.ctx.node(self.id) {
            Node::Object(pairs) => Some(ObjectRef { ctx: self.ctx, pairs }),
            _ => None,
        }
    }
}

fn child_view<'c, 'a>(parent: &'c Context<'a>, child: &'c Child) -> ValueRef<'c, 'a> {
    match child {
        Child::Local(id) => ValueRef::new(parent, *id),
        Child::Foreign(boxed) => {
            // A `Context<'static>` is a valid `Context<'a>` for any `'a`
            // (Context is covariant: the only lifetime-bearing field is a
            // shared `&'a [u8]`), so this is an ordinary reborrow, not a
            // cast.
            let foreign: &'c Context<'a> = &**boxed;
            ValueRef::new(foreign, boxed.root().expect("foreign document without a root"))
        }
    }
}

/// A read-only view of an array's elements.
#[derive(Copy, Clone)]
pub struct ArrayRef<'c, 'a> {
    ctx: &'c Context<'a>,
    children: &'c [Child],
}

impl<'c, 'a> ArrayRef<'c, 'a> {
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ValueRef<'c, 'a>> {
        self.children.get(index).map(|c| child_view(self.ctx, c))
    }

    pub fn iter(&self) -> impl Iterator<Item = ValueRef<'c, 'a>> + 'c {
        let ctx = self.ctx;
        self.children.iter().map(move |c| child_view(ctx, c))
    }
}

/// A read-only view of an object's (key, value) pairs, in insertion order.
#[derive(Copy, Clone)]
pub struct ObjectRef<'c, 'a> {
    ctx: &'c Context<'a>,
    pairs: &'c [(KeyData, Child)],
}

impl<'c, 'a> ObjectRef<'c, 'a> {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'c str, ValueRef<'c, 'a>)> + 'c {
        let ctx = self.ctx;
        self.pairs.iter().map(move |(k, v)| {
            let key = str::from_utf8(ctx.key_bytes(*k)).unwrap_or("");
            (key, child_view(ctx, v))
        })
    }

    /// Linear lookup by key; objects do not maintain a hash index.
    pub fn get(&self, key: &str) -> Option<ValueRef<'c, 'a>> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// All values stored under `key`, in case a `COLLECT` duplicate-key
    /// policy produced more than one pair before they were merged into an
    /// array (defensive; normal documents have at most one pair per key).
    pub fn get_all<'s>(&'s self, key: &'s str) -> impl Iterator<Item = ValueRef<'c, 'a>> + 's {
        self.iter().filter(move |(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// A mutable handle to one array node, supporting push/insert/remove with
/// checked, doubling growth.
pub struct ArrayMut<'m, 'a> {
    ctx: &'m mut Context<'a>,
    id: NodeId,
}

impl<'m, 'a> ArrayMut<'m, 'a> {
    fn children_mut(&mut self) -> &mut Vec<Child> {
        match self.ctx.node_mut(self.id) {
            Node::Array(c) => c,
            _ => unreachable!("ArrayMut over a non-array node"),
        }
    }

    pub fn len(&self) -> usize {
        match self.ctx.node(self.id) {
            Node::Array(c) => c.len(),
            _ => unreachable!(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push_local(&mut self, node: Node) {
        let child_id = self.ctx.push_node(node);
        self.children_mut().push(Child::Local(child_id));
    }

    pub fn push_null(&mut self) {
        self.push_local(Node::Null);
    }

    pub fn push_bool(&mut self, b: bool) {
        self.push_local(Node::Bool(b));
    }

    pub fn push_number(&mut self, n: NumberValue) {
        self.push_local(Node::Number(n));
    }

    pub fn push_string(&mut self, s: &str) -> bool {
        match self.ctx.intern_str(s.as_bytes()) {
            Some(data) => {
                self.push_local(Node::Str(data));
                true
            }
            None => false,
        }
    }

    /// Push an empty array and return a handle to it, for building nested
    /// structures one container at a time.
    pub fn push_array(&mut self) -> ArrayMut<'_, 'a> {
        let child_id = self.ctx.push_node(Node::Array(Vec::new()));
        self.children_mut().push(Child::Local(child_id));
        ArrayMut { ctx: self.ctx, id: child_id }
    }

    pub fn push_object(&mut self) -> ObjectMut<'_, 'a> {
        let child_id = self.ctx.push_node(Node::Object(Vec::new()));
        self.children_mut().push(Child::Local(child_id));
        ObjectMut { ctx: self.ctx, id: child_id }
    }

    /// Graft a standalone, independently-constructed document as the new
    /// last element. If `value` was built with a different context than
    /// this array's own, that context is *adopted*.
    pub fn adopt(&mut self, value: Document<'static>) {
        self.children_mut().push(Child::Foreign(Box::new(value.ctx)));
    }

    /// Replace element `index` with a freshly-adopted document. The
    /// displaced child is dropped immediately.
    pub fn set_adopt(&mut self, index: usize, value: Document<'static>) -> bool {
        let children = self.children_mut();
        match children.get_mut(index) {
            Some(slot) => {
                *slot = Child::Foreign(Box::new(value.ctx));
                true
            }
            None => false,
        }
    }

    /// Insert a freshly-adopted document at `index`, shifting the tail by
    /// one.
    pub fn insert_adopt(&mut self, index: usize, value: Document<'static>) -> bool {
        let children = self.children_mut();
        if index > children.len() {
            return false;
        }
        children.insert(index, Child::Foreign(Box::new(value.ctx)));
        true
    }

    /// Remove and drop element `index`, shifting the tail by one.
    pub fn remove(&mut self, index: usize) -> bool {
        let children = self.children_mut();
        if index >= children.len() {
            return false;
        }
        children.remove(index);
        true
    }
}

/// A mutable handle to one object node. Duplicate-key resolution during
/// construction is driven by [`DupKeyPolicy`]; ordinary mutation-API `put`
/// always behaves like `LastWins`, replacing an existing slot in place to
/// preserve key order.
pub struct ObjectMut<'m, 'a> {
    ctx: &'m mut Context<'a>,
    id: NodeId,
}

impl<'m, 'a> ObjectMut<'m, 'a> {
    fn pairs_mut(&mut self) -> &mut Vec<(KeyData, Child)> {
        match self.ctx.node_mut(self.id) {
            Node::Object(p) => p,
            _ => unreachable!("ObjectMut over a non-object node"),
        }
    }

    pub fn len(&self) -> usize {
        match self.ctx.node(self.id) {
            Node::Object(p) => p.len(),
            _ => unreachable!(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find(&self, key: &str) -> Option<usize> {
        match self.ctx.node(self.id) {
            Node::Object(pairs) => pairs
                .iter()
                .position(|(k, _)| self.ctx.key_bytes(*k) == key.as_bytes()),
            _ => None,
        }
    }

    /// Insert or replace (last-wins, order-preserving) a child built
    /// directly in this object's own context.
    fn put_local(&mut self, key: &str, node: Node) -> bool {
        let key_data = match self.ctx.intern_key(key.as_bytes()) {
            Some(k) => k,
            None => return false,
        };
        let child_id = self.ctx.push_node(node);
        match self.find(key) {
            Some(idx) => {
                self.pairs_mut()[idx] = (key_data, Child::Local(child_id));
            }
            None => {
                self.pairs_mut().push((key_data, Child::Local(child_id)));
            }
        }
        true
    }

    pub fn put_null(&mut self, key: &str) -> bool {
        self.put_local(key, Node::Null)
    }

    pub fn put_bool(&mut self, key: &str, b: bool) -> bool {
        self.put_local(key, Node::Bool(b))
    }

    pub fn put_number(&mut self, key: &str, n: NumberValue) -> bool {
        self.put_local(key, Node::Number(n))
    }

    pub fn put_string(&mut self, key: &str, s: &str) -> bool {
        let data = match self.ctx.intern_str(s.as_bytes()) {
            Some(d) => d,
            None => return false,
        };
        self.put_local(key, Node::Str(data))
    }

    pub fn put_array(&mut self, key: &str) -> Option<ArrayMut<'_, 'a>> {
        if !self.put_local(key, Node::Array(Vec::new())) {
            return None;
        }
        let idx = self.find(key)?;
        let child_id = match self.ctx.node(self.id) {
            Node::Object(pairs) => match pairs[idx].1 {
                Child::Local(id) => id,
                Child::Foreign(_) => unreachable!(),
            },
            _ => unreachable!(),
        };
        Some(ArrayMut { ctx: self.ctx, id: child_id })
    }

    /// Graft a standalone document under `key`, adopting its context.
    pub fn put_adopt(&mut self, key: &str, value: Document<'static>) -> bool {
        let key_data = match self.ctx.intern_key(key.as_bytes()) {
            Some(k) => k,
            None => return false,
        };
        let child = Child::Foreign(Box::new(value.ctx));
        match self.find(key) {
            Some(idx) => {
                self.pairs_mut()[idx] = (key_data, child);
            }
            None => {
                self.pairs_mut().push((key_data, child));
            }
        }
        true
    }

    /// Remove the pair for `key`, shifting the tail by one. Returns whether
    /// a pair was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.find(key) {
            Some(idx) => {
                self.pairs_mut().remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Why [`object_put_with_policy`] rejected a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum PutError {
    /// `DupKeyPolicy::Error` saw a repeated key.
    DupKey,
    /// Growing the object (or a `Collect` array) would exceed
    /// `max_container_elems`.
    Limit,
}

/// Apply a duplicate-key policy when a parser encounters a repeated key.
/// `new_value` is the freshly-parsed child, already pushed into `ctx` as a
/// local node. `max_container_elems` bounds both the object's own pair
/// count and a `Collect` array's element count, checked before growing an
/// array or object.
pub(crate) fn object_put_with_policy(
    ctx: &mut Context<'_>,
    container: NodeId,
    key: KeyData,
    new_child: NodeId,
    policy: DupKeyPolicy,
    max_container_elems: usize,
) -> Result<(), PutError> {
    let existing_idx = match ctx.node(container) {
        Node::Object(pairs) => pairs.iter().position(|(k, _)| ctx.key_bytes(*k) == ctx.key_bytes(key)),
        _ => unreachable!("object_put_with_policy over a non-object node"),
    };

    match existing_idx {
        None => {
            let len = match ctx.node(container) {
                Node::Object(pairs) => pairs.len(),
                _ => unreachable!(),
            };
            if len >= max_container_elems {
                return Err(PutError::Limit);
            }
            if let Node::Object(pairs) = ctx.node_mut(container) {
                pairs.push((key, Child::Local(new_child)));
            }
            Ok(())
        }
        Some(idx) => match policy {
            DupKeyPolicy::Error => Err(PutError::DupKey),
            DupKeyPolicy::FirstWins => Ok(()), // new_child stays allocated, unlinked
            DupKeyPolicy::LastWins => {
                if let Node::Object(pairs) = ctx.node_mut(container) {
                    pairs[idx].1 = Child::Local(new_child);
                }
                Ok(())
            }
            DupKeyPolicy::Collect => {
                // Duplicate-key collection only ever sees children this same
                // parse produced, so the existing slot is always `Local`;
                // there is no live `Context: Clone` to lean on here, so the
                // existing child is moved out via `mem::replace` instead of
                // cloned.
                let existing_local_id = match ctx.node(container) {
                    Node::Object(pairs) => match pairs[idx].1 {
                        Child::Local(id) => Some(id),
                        Child::Foreign(_) => None,
                    },
                    _ => unreachable!(),
                };
                let existing_array_id = match existing_local_id {
                    Some(id) if matches!(ctx.node(id), Node::Array(_)) => Some(id),
                    _ => None,
                };

                if let Some(arr_id) = existing_array_id {
                    let len = match ctx.node(arr_id) {
                        Node::Array(items) => items.len(),
                        _ => unreachable!(),
                    };
                    if len >= max_container_elems {
                        return Err(PutError::Limit);
                    }
                    if let Node::Array(items) = ctx.node_mut(arr_id) {
                        items.push(Child::Local(new_child));
                    }
                } else {
                    let placeholder = ctx.push_node(Node::Null);
                    let existing_child = match ctx.node_mut(container) {
                        Node::Object(pairs) => std::mem::replace(&mut pairs[idx].1, Child::Local(placeholder)),
                        _ => unreachable!(),
                    };
                    let arr_id = ctx.push_node(Node::Array(vec![existing_child, Child::Local(new_child)]));
                    if let Node::Object(pairs) = ctx.node_mut(container) {
                        pairs[idx].1 = Child::Local(arr_id);
                    }
                }
                Ok(())
            }
        },
    }
}

/// Structural, deep equality over two values, possibly from different
/// contexts.
pub fn values_eq(a: ValueRef<'_, '_>, b: ValueRef<'_, '_>) -> bool {
    match (a.kind(), b.kind()) {
        (ValueKind::Null, ValueKind::Null) => true,
        (ValueKind::Bool, ValueKind::Bool) => a.as_bool() == b.as_bool(),
        (ValueKind::Number, ValueKind::Number) => number_eq(
            a.as_number().unwrap(),
            a.ctx.arena(),
            a.ctx.input(),
            b.as_number().unwrap(),
            b.ctx.arena(),
            b.ctx.input(),
        ),
        (ValueKind::String, ValueKind::String) => a.as_str_bytes() == b.as_str_bytes(),
        (ValueKind::Array, ValueKind::Array) => {
            let (arr_a, arr_b) = (a.as_array().unwrap(), b.as_array().unwrap());
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b.iter()).all(|(x, y)| values_eq(x, y))
        }
        (ValueKind::Object, ValueKind::Object) => {
            let (obj_a, obj_b) = (a.as_object().unwrap(), b.as_object().unwrap());
            if obj_a.len() != obj_b.len() {
                return false;
            }
            // Unordered multiset of (key, value) pairs; duplicate keys must
            // match with the same multiplicity.
            let mut used = vec![false; obj_b.len()];
            'outer: for (ka, va) in obj_a.iter() {
                for (i, (kb, vb)) in obj_b.iter().enumerate() {
                    if !used[i] && ka == kb && values_eq(va, vb) {
                        used[i] = true;
                        continue 'outer;
                    }
                }
                return false;
            }
            true
        }
        _ => false,
    }
}

/// Arbitrary total order across kinds, used by [`values_cmp`] to rank
/// values of different kinds against each other.
fn kind_rank(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::Null => 0,
        ValueKind::Bool => 1,
        ValueKind::Number => 2,
        ValueKind::String => 3,
        ValueKind::Array => 4,
        ValueKind::Object => 5,
    }
}

/// Total ordering over two values, possibly from different contexts.
///
/// Values of the same kind compare structurally (numbers through
/// [`crate::number::number_cmp`]'s shared-representation preference and
/// NaN-total-order convention, strings and array/object elements
/// lexicographically, objects by their stored iteration order rather than
/// as a multiset). Values of different kinds fall back to a fixed
/// cross-kind order: `Null < Bool < Number < String < Array < Object`.
pub fn values_cmp(a: ValueRef<'_, '_>, b: ValueRef<'_, '_>) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (a.kind(), b.kind()) {
        (ValueKind::Null, ValueKind::Null) => Ordering::Equal,
        (ValueKind::Bool, ValueKind::Bool) => a.as_bool().cmp(&b.as_bool()),
        (ValueKind::Number, ValueKind::Number) => crate::number::number_cmp(
            a.as_number().unwrap(),
            a.ctx.arena(),
            a.ctx.input(),
            b.as_number().unwrap(),
            b.ctx.arena(),
            b.ctx.input(),
        ),
        (ValueKind::String, ValueKind::String) => a.as_str_bytes().cmp(b.as_str_bytes()),
        (ValueKind::Array, ValueKind::Array) => {
            let (arr_a, arr_b) = (a.as_array().unwrap(), b.as_array().unwrap());
            let mut ia = arr_a.iter();
            let mut ib = arr_b.iter();
            loop {
                match (ia.next(), ib.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some(x), Some(y)) => match values_cmp(x, y) {
                        Ordering::Equal => continue,
                        other => return other,
                    },
                }
            }
        }
        (ValueKind::Object, ValueKind::Object) => {
            let (obj_a, obj_b) = (a.as_object().unwrap(), b.as_object().unwrap());
            let mut ia = obj_a.iter();
            let mut ib = obj_b.iter();
            loop {
                match (ia.next(), ib.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some((ka, va)), Some((kb, vb))) => match ka.cmp(kb) {
                        Ordering::Equal => match values_cmp(va, vb) {
                            Ordering::Equal => continue,
                            other => return other,
                        },
                        other => return other,
                    },
                }
            }
        }
        (ka, kb) => kind_rank(ka).cmp(&kind_rank(kb)),
    }
}

impl<'a> TryFrom<Document<'a>> for Context<'a> {
    type Error = ();

    fn try_from(doc: Document<'a>) -> Result<Self, ()> {
        Ok(doc.ctx)
    }
}
