use std::collections::VecDeque;

use serde_json::{Map, Value};

use crate::format::WorkGraph;
use crate::node::{AttrValue, Graph, NodeId};

/// Every node reachable from `roots`, in first-visit order.
pub fn reachable(graph: &Graph, roots: &[NodeId]) -> Vec<NodeId> {
    let mut visited = vec![false; graph.len()];
    let mut order = Vec::new();
    let mut worklist: VecDeque<NodeId> = roots.iter().copied().collect();

    while let Some(node) = worklist.pop_front() {
        if visited[node.index()] {
            continue;
        }
        visited[node.index()] = true;
        order.push(node);
        worklist.extend(graph.node(node).related());
    }

    order
}

/// Serialize one node: `@id`, `@type`, non-blank scalars verbatim and
/// references as pointers. Sequences are dropped.
pub fn serialize_node(graph: &Graph, node: NodeId) -> Value {
    let node_ref = graph.node(node);
    let mut record = Map::new();
    record.insert("@id".into(), Value::String(node_ref.id().to_string()));
    record.insert("@type".into(), Value::String(node_ref.kind().to_string()));

    for (name, value) in node_ref.attrs() {
        match value {
            AttrValue::Scalar(scalar) if !scalar.is_blank() => {
                record.insert(name.to_string(), scalar.to_json());
            }
            AttrValue::Ref(target) => {
                record.insert(name.to_string(), graph.pointer(*target));
            }
            AttrValue::Scalar(_) | AttrValue::Seq(_) => {}
        }
    }

    Value::Object(record)
}

/// Flatten the nodes reachable from `roots`.
pub fn flatten_from(graph: &Graph, roots: &[NodeId]) -> Vec<Value> {
    reachable(graph, roots)
        .into_iter()
        .map(|node| serialize_node(graph, node))
        .collect()
}

/// Flatten a formatted work from the roots recorded while formatting it.
pub fn flatten(work: &WorkGraph) -> Vec<Value> {
    let records = flatten_from(&work.graph, work.graph.roots());
    tracing::debug!(work = %work.key, records = records.len(), "Flattened work graph");
    records
}
