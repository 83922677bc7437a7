use std::io::Read;

use serde_json::Value;
use smol_str::SmolStr;

use crate::graph::{resolve_in, Graph, Node, NodeId, ObjectEdges};
use crate::path::RefPath;
use crate::{Error, RehydrateOptions, Result};

pub fn from_value(value: Value, options: &RehydrateOptions) -> Result<Graph> {
    let mut worker = Rehydrator::new(options);
    worker.intern_into(value, worker.root, 0)?;
    Ok(Graph::from_parts(worker.nodes, worker.root))
}

pub fn from_str(input: &str, options: &RehydrateOptions) -> Result<Graph> {
    let value: Value = serde_json::from_str(input)
        .map_err(|err| Error::parse(format!("invalid json: {err}")))?;
    from_value(value, options)
}

pub fn from_slice(input: &[u8], options: &RehydrateOptions) -> Result<Graph> {
    let text =
        std::str::from_utf8(input).map_err(|err| Error::parse(format!("invalid utf-8: {err}")))?;
    from_str(text, options)
}

pub fn from_reader<R: Read>(mut reader: R, options: &RehydrateOptions) -> Result<Graph> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|err| Error::parse(format!("read failed: {err}")))?;
    from_str(&buf, options)
}

/// Single-pass, pre-order intern of a value tree into a node arena.
///
/// Container nodes are written to their slot and every child edge is recorded
/// in the parent before the child itself is populated, so at the moment a
/// reference marker is resolved all edges along the current ancestor chain
/// already exist. A conforming marker points at an ancestor or at an earlier
/// pre-order node, so resolution always walks existing edges; the resolved id
/// is recorded as the edge and the target is never recursed into, which is
/// what lets cycles close without unbounded recursion.
struct Rehydrator {
    nodes: Vec<Node>,
    root: NodeId,
    max_depth: usize,
    strict_markers: bool,
}

impl Rehydrator {
    fn new(options: &RehydrateOptions) -> Self {
        let mut worker = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            max_depth: options.max_depth,
            strict_markers: options.strict_markers,
        };
        worker.root = worker.alloc();
        worker
    }

    fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Null);
        id
    }

    fn intern_into(&mut self, value: Value, slot: NodeId, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(Error::depth(self.max_depth));
        }
        match value {
            Value::Null => {}
            Value::Bool(b) => self.nodes[slot.0] = Node::Bool(b),
            Value::Number(n) => self.nodes[slot.0] = Node::Number(n),
            Value::String(s) => self.nodes[slot.0] = Node::String(s),
            Value::Array(items) => {
                self.nodes[slot.0] = Node::Array(Vec::with_capacity(items.len()));
                for item in items {
                    match self.try_marker(&item)? {
                        Some(target) => self.push_item(slot, target),
                        None => {
                            let child = self.alloc();
                            self.push_item(slot, child);
                            self.intern_into(item, child, depth + 1)?;
                        }
                    }
                }
            }
            Value::Object(entries) => {
                self.nodes[slot.0] = Node::Object(ObjectEdges::with_capacity(entries.len()));
                for (key, item) in entries {
                    let key = SmolStr::new(key);
                    match self.try_marker(&item)? {
                        Some(target) => self.insert_entry(slot, key, target),
                        None => {
                            let child = self.alloc();
                            self.insert_entry(slot, key, child);
                            self.intern_into(item, child, depth + 1)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// A marker is an object whose `$ref` member is a string matching the
    /// path grammar. Anything else, including a grammar-rejected string, is
    /// ordinary data. A matching path that fails to resolve is a hard error:
    /// the upstream encoder produced a reference to nowhere.
    fn try_marker(&self, value: &Value) -> Result<Option<NodeId>> {
        let Value::Object(entries) = value else {
            return Ok(None);
        };
        if self.strict_markers && entries.len() != 1 {
            return Ok(None);
        }
        let Some(Value::String(raw)) = entries.get("$ref") else {
            return Ok(None);
        };
        let Ok(path) = RefPath::parse(raw) else {
            return Ok(None);
        };
        resolve_in(&self.nodes, self.root, &path, raw).map(Some)
    }

    fn push_item(&mut self, slot: NodeId, target: NodeId) {
        match &mut self.nodes[slot.0] {
            Node::Array(items) => items.push(target),
            _ => unreachable!("slot {} is not an array", slot.0),
        }
    }

    fn insert_entry(&mut self, slot: NodeId, key: SmolStr, target: NodeId) {
        match &mut self.nodes[slot.0] {
            Node::Object(entries) => {
                entries.insert(key, target);
            }
            _ => unreachable!("slot {} is not an object", slot.0),
        }
    }
}
