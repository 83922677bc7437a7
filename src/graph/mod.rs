use std::collections::HashSet;
use std::ops::{Index, IndexMut};

use indexmap::IndexMap;
use serde_json::Value;
use smol_str::SmolStr;

use crate::path::{RefPath, Segment};
use crate::{Error, Result};

/// Stable handle to a node in a [`Graph`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub type ObjectEdges = IndexMap<SmolStr, NodeId>;

/// One node of a rehydrated document. Containers hold edges, not values, so
/// a node may have any number of incoming edges, including from itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<NodeId>),
    Object(ObjectEdges),
}

impl Node {
    pub const fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub const fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    pub const fn is_object(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<NodeId>> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectEdges> {
        match self {
            Node::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectEdges> {
        match self {
            Node::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }
}

/// Arena-backed document graph produced by rehydration.
///
/// Nodes are addressed by [`NodeId`]; two reference markers that resolved to
/// the same path hold the same id, so a mutation through [`Graph::get_mut`]
/// is observable through every incoming edge.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Graph {
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edge lookup by array position.
    pub fn get_index(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.get(id)?.as_array()?.get(index).copied()
    }

    /// Edge lookup by object key.
    pub fn get_key(&self, id: NodeId, key: &str) -> Option<NodeId> {
        self.get(id)?.as_object()?.get(key).copied()
    }

    /// Walk a parsed path from the root by plain container lookups.
    pub fn resolve(&self, path: &RefPath) -> Result<NodeId> {
        resolve_in(&self.nodes, self.root, path, &path.to_string())
    }

    /// Tree-only export back to a [`serde_json::Value`].
    ///
    /// A node reachable through more than one path (a shared reference,
    /// scalar targets included, or a cycle) cannot be represented as a plain
    /// tree and reports an export error instead of duplicating or looping.
    pub fn to_value(&self) -> Result<Value> {
        let mut visited = HashSet::new();
        self.value_at(self.root, &mut visited)
    }

    fn value_at(&self, id: NodeId, visited: &mut HashSet<usize>) -> Result<Value> {
        if !visited.insert(id.0) {
            return Err(Error::export(
                "document contains shared or cyclic nodes and cannot be exported as a tree",
            ));
        }
        match &self[id] {
            Node::Null => Ok(Value::Null),
            Node::Bool(b) => Ok(Value::Bool(*b)),
            Node::Number(n) => Ok(Value::Number(n.clone())),
            Node::String(s) => Ok(Value::String(s.clone())),
            Node::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for &item in items {
                    out.push(self.value_at(item, visited)?);
                }
                Ok(Value::Array(out))
            }
            Node::Object(entries) => {
                let mut out = serde_json::Map::with_capacity(entries.len());
                for (key, &value) in entries {
                    out.insert(key.to_string(), self.value_at(value, visited)?);
                }
                Ok(Value::Object(out))
            }
        }
    }

    /// Cycle-aware structural equality (bisimulation over id pairs).
    pub fn graph_eq(&self, other: &Graph) -> bool {
        let mut seen = HashSet::new();
        self.eq_at(self.root, other, other.root, &mut seen)
    }

    fn eq_at(
        &self,
        id: NodeId,
        other: &Graph,
        other_id: NodeId,
        seen: &mut HashSet<(usize, usize)>,
    ) -> bool {
        if !seen.insert((id.0, other_id.0)) {
            return true;
        }
        match (&self[id], &other[other_id]) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(a), Node::Bool(b)) => a == b,
            (Node::Number(a), Node::Number(b)) => a == b,
            (Node::String(a), Node::String(b)) => a == b,
            (Node::Array(a), Node::Array(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(&x, &y)| self.eq_at(x, other, y, seen))
            }
            (Node::Object(a), Node::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, &x)| match b.get(key.as_str()) {
                        Some(&y) => self.eq_at(x, other, y, seen),
                        None => false,
                    })
            }
            _ => false,
        }
    }

    /// Nodes with more than one incoming edge.
    pub fn shared_node_count(&self) -> usize {
        let mut indegree = vec![0usize; self.nodes.len()];
        for node in &self.nodes {
            match node {
                Node::Array(items) => {
                    for item in items {
                        indegree[item.0] += 1;
                    }
                }
                Node::Object(entries) => {
                    for value in entries.values() {
                        indegree[value.0] += 1;
                    }
                }
                _ => {}
            }
        }
        indegree.iter().filter(|&&degree| degree > 1).count()
    }

    /// Depth-first three-color cycle detection; iterative, so reference
    /// chains longer than the input nesting cannot overflow the stack.
    pub fn has_cycle(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Gray,
            Black,
        }

        let mut marks = vec![Mark::White; self.nodes.len()];
        let mut stack = vec![(self.root.0, 0usize)];
        marks[self.root.0] = Mark::Gray;

        while let Some((id, cursor)) = stack.pop() {
            match self.edge_at(id, cursor) {
                Some(child) => {
                    stack.push((id, cursor + 1));
                    match marks[child.0] {
                        Mark::Gray => return true,
                        Mark::White => {
                            marks[child.0] = Mark::Gray;
                            stack.push((child.0, 0));
                        }
                        Mark::Black => {}
                    }
                }
                None => marks[id] = Mark::Black,
            }
        }
        false
    }

    fn edge_at(&self, id: usize, cursor: usize) -> Option<NodeId> {
        match &self.nodes[id] {
            Node::Array(items) => items.get(cursor).copied(),
            Node::Object(entries) => entries.get_index(cursor).map(|(_, &value)| value),
            _ => None,
        }
    }
}

impl Index<NodeId> for Graph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.nodes.get(id.0).unwrap_or_else(|| {
            panic!(
                "node id {} out of bounds for graph of {} nodes",
                id.0,
                self.nodes.len()
            )
        })
    }
}

impl IndexMut<NodeId> for Graph {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        let len = self.nodes.len();
        self.nodes
            .get_mut(id.0)
            .unwrap_or_else(|| panic!("node id {} out of bounds for graph of {len} nodes", id.0))
    }
}

pub(crate) fn resolve_in(
    nodes: &[Node],
    root: NodeId,
    path: &RefPath,
    raw: &str,
) -> Result<NodeId> {
    let mut current = root;
    for (pos, segment) in path.segments().iter().enumerate() {
        let node = &nodes[current.0];
        current = match (segment, node) {
            (Segment::Index(index), Node::Array(items)) => usize::try_from(*index)
                .ok()
                .and_then(|index| items.get(index).copied())
                .ok_or_else(|| {
                    Error::resolve(
                        raw,
                        pos,
                        format!(
                            "index {index} out of bounds for array of length {}",
                            items.len()
                        ),
                    )
                })?,
            (Segment::Key(key), Node::Object(entries)) => {
                entries.get(key.as_str()).copied().ok_or_else(|| {
                    Error::resolve(raw, pos, format!("key \"{key}\" not found in object"))
                })?
            }
            (Segment::Index(_), other) => {
                return Err(Error::resolve(
                    raw,
                    pos,
                    format!("expected an array, found {}", other.type_name()),
                ));
            }
            (Segment::Key(_), other) => {
                return Err(Error::resolve(
                    raw,
                    pos,
                    format!("expected an object, found {}", other.type_name()),
                ));
            }
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use smol_str::SmolStr;

    use super::{Graph, Node, NodeId};

    fn leaf_graph() -> Graph {
        // { "a": [1, 2], "b": "x" }
        let mut entries = IndexMap::new();
        entries.insert(SmolStr::new("a"), NodeId(1));
        entries.insert(SmolStr::new("b"), NodeId(4));
        Graph::from_parts(
            vec![
                Node::Object(entries),
                Node::Array(vec![NodeId(2), NodeId(3)]),
                Node::Number(1.into()),
                Node::Number(2.into()),
                Node::String("x".to_string()),
            ],
            NodeId(0),
        )
    }

    #[rstest::rstest]
    fn test_navigation() {
        let graph = leaf_graph();
        let a = graph.get_key(graph.root(), "a").unwrap();
        assert!(graph[a].is_array());
        let second = graph.get_index(a, 1).unwrap();
        assert_eq!(graph[second].as_i64(), Some(2));
        assert!(graph.get_key(graph.root(), "missing").is_none());
        assert!(graph.get_index(a, 9).is_none());
    }

    #[rstest::rstest]
    fn test_to_value_tree() {
        let graph = leaf_graph();
        let value = graph.to_value().unwrap();
        assert_eq!(value, serde_json::json!({"a": [1, 2], "b": "x"}));
    }

    #[rstest::rstest]
    fn test_to_value_rejects_sharing() {
        // [x, x] where x is one array instance
        let graph = Graph::from_parts(
            vec![
                Node::Array(vec![NodeId(1), NodeId(1)]),
                Node::Array(vec![]),
            ],
            NodeId(0),
        );
        assert!(graph.to_value().is_err());
        assert_eq!(graph.shared_node_count(), 1);
        assert!(!graph.has_cycle());
    }

    #[rstest::rstest]
    fn test_cycle_detection() {
        let mut entries = IndexMap::new();
        entries.insert(SmolStr::new("me"), NodeId(0));
        let graph = Graph::from_parts(vec![Node::Object(entries)], NodeId(0));
        assert!(graph.has_cycle());
        assert!(graph.to_value().is_err());
    }

    #[rstest::rstest]
    fn test_graph_eq_with_cycles() {
        let cyclic = |key: &str| {
            let mut entries = IndexMap::new();
            entries.insert(SmolStr::new(key), NodeId(0));
            Graph::from_parts(vec![Node::Object(entries)], NodeId(0))
        };
        assert!(cyclic("me").graph_eq(&cyclic("me")));
        assert!(!cyclic("me").graph_eq(&cyclic("you")));

        let tree = leaf_graph();
        assert!(tree.graph_eq(&leaf_graph()));
        assert!(!tree.graph_eq(&cyclic("me")));
    }
}
