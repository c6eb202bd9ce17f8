use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

/// Handle to a node inside a [`Graph`] arena. Stable for the graph's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Str(String),
    Bool(bool),
    Int(i64),
    Date(NaiveDate),
}

impl Scalar {
    /// Null and the empty string are never serialized.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Str(s) => Value::String(s.clone()),
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(d: NaiveDate) -> Self {
        Scalar::Date(d)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Scalar(Scalar),
    Ref(NodeId),
    /// Traversal-only edge set; never serialized.
    Seq(Vec<NodeId>),
}

#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    kind: String,
    attrs: BTreeMap<String, AttrValue>,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn scalar(&self, name: &str) -> Option<&Scalar> {
        match self.attrs.get(name) {
            Some(AttrValue::Scalar(s)) => Some(s),
            _ => None,
        }
    }

    pub fn reference(&self, name: &str) -> Option<NodeId> {
        match self.attrs.get(name) {
            Some(AttrValue::Ref(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn sequence(&self, name: &str) -> &[NodeId] {
        match self.attrs.get(name) {
            Some(AttrValue::Seq(ids)) => ids,
            _ => &[],
        }
    }

    /// Every node directly reachable from this one, in attribute order.
    pub fn related(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.attrs
            .values()
            .flat_map(|value| match value {
                AttrValue::Ref(id) => std::slice::from_ref(id),
                AttrValue::Seq(ids) => ids.as_slice(),
                AttrValue::Scalar(_) => &[][..],
            })
            .copied()
    }
}

/// Arena owning every node of one work's graph, plus the roots the
/// flattener starts from.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

pub fn blank_id() -> String {
    format!("_:{}", Uuid::new_v4())
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node with a fresh blank identifier.
    pub fn add(&mut self, kind: &str) -> NodeId {
        self.add_with_id(blank_id(), kind)
    }

    /// Allocate a node that stands for an existing remote record.
    pub fn add_with_id(&mut self, id: impl Into<String>, kind: &str) -> NodeId {
        let handle = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id: id.into(),
            kind: kind.trim().to_lowercase(),
            attrs: BTreeMap::new(),
        });
        handle
    }

    /// Allocate with `stable_id` when given, otherwise a blank identifier.
    pub fn add_maybe_stable(&mut self, stable_id: Option<&str>, kind: &str) -> NodeId {
        match stable_id {
            Some(id) => self.add_with_id(id, kind),
            None => self.add(kind),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set(&mut self, node: NodeId, name: &str, value: impl Into<Scalar>) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), AttrValue::Scalar(value.into()));
    }

    /// Set a scalar only when a value is present and non-empty.
    pub fn set_opt<V: Into<Scalar>>(&mut self, node: NodeId, name: &str, value: Option<V>) {
        if let Some(value) = value {
            let scalar = value.into();
            if !scalar.is_blank() {
                self.nodes[node.0]
                    .attrs
                    .insert(name.to_string(), AttrValue::Scalar(scalar));
            }
        }
    }

    pub fn link(&mut self, node: NodeId, name: &str, target: NodeId) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), AttrValue::Ref(target));
    }

    /// Append to a sequence attribute, creating it if needed. A scalar or
    /// reference previously stored under `name` is replaced.
    pub fn push(&mut self, node: NodeId, name: &str, target: NodeId) {
        let attrs = &mut self.nodes[node.0].attrs;
        match attrs.get_mut(name) {
            Some(AttrValue::Seq(ids)) => ids.push(target),
            _ => {
                attrs.insert(name.to_string(), AttrValue::Seq(vec![target]));
            }
        }
    }

    /// Make sure `name` exists as a (possibly empty) sequence.
    pub fn ensure_seq(&mut self, node: NodeId, name: &str) {
        let attrs = &mut self.nodes[node.0].attrs;
        if !matches!(attrs.get(name), Some(AttrValue::Seq(_))) {
            attrs.insert(name.to_string(), AttrValue::Seq(Vec::new()));
        }
    }

    pub fn add_root(&mut self, node: NodeId) {
        self.roots.push(node);
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Compact `{@id, @type}` form used in place of embedding a node.
    pub fn pointer(&self, node: NodeId) -> Value {
        let node = self.node(node);
        json!({ "@id": node.id, "@type": node.kind })
    }
}
