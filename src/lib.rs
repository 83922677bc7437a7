//! Rehydration of decycled JSON documents.
//!
//! A decycled document is a tree in which every shared or cyclic edge has
//! been replaced by a reference marker `{"$ref": "<path>"}` pointing at the
//! canonical occurrence of the target node. This crate reverses that: it
//! interns the tree into an arena-backed [`Graph`] and resolves every marker
//! by walking its path with plain container lookups, restoring true aliasing
//! and cycles without ever evaluating a path as code.
//!
//! ```
//! use serde_json::json;
//!
//! let graph = serde_rehydrate::rehydrate(json!([{"x": 1}, {"$ref": "$[0]"}])).unwrap();
//! let first = graph.get_index(graph.root(), 0).unwrap();
//! let second = graph.get_index(graph.root(), 1).unwrap();
//! assert_eq!(first, second); // one instance, two incoming edges
//! ```

pub mod error;
pub mod graph;
pub mod options;
pub mod path;
pub mod rehydrate;

use std::io::Read;

use serde::Serialize;
use serde_json::Value;

pub use crate::error::{Error, ErrorKind};
pub use crate::graph::{Graph, Node, NodeId, ObjectEdges};
pub use crate::options::RehydrateOptions;
pub use crate::path::{RefPath, Segment};

pub type Result<T> = std::result::Result<T, Error>;

/// Rehydrate a value tree with default options.
pub fn rehydrate(value: Value) -> Result<Graph> {
    rehydrate_with_options(value, &RehydrateOptions::default())
}

pub fn rehydrate_with_options(value: Value, options: &RehydrateOptions) -> Result<Graph> {
    rehydrate::from_value(value, options)
}

/// Serialize any value to its JSON form, then rehydrate that.
pub fn rehydrate_from<T: Serialize>(value: &T) -> Result<Graph> {
    rehydrate_from_with_options(value, &RehydrateOptions::default())
}

pub fn rehydrate_from_with_options<T: Serialize>(
    value: &T,
    options: &RehydrateOptions,
) -> Result<Graph> {
    let value = serde_json::to_value(value)
        .map_err(|err| Error::serialize(format!("serialize failed: {err}")))?;
    rehydrate_with_options(value, options)
}

/// Parse a JSON document (object key order preserved) and rehydrate it.
pub fn from_str(input: &str) -> Result<Graph> {
    from_str_with_options(input, &RehydrateOptions::default())
}

pub fn from_str_with_options(input: &str, options: &RehydrateOptions) -> Result<Graph> {
    rehydrate::from_str(input, options)
}

pub fn from_slice(input: &[u8]) -> Result<Graph> {
    from_slice_with_options(input, &RehydrateOptions::default())
}

pub fn from_slice_with_options(input: &[u8], options: &RehydrateOptions) -> Result<Graph> {
    rehydrate::from_slice(input, options)
}

pub fn from_reader<R: Read>(reader: R) -> Result<Graph> {
    from_reader_with_options(reader, &RehydrateOptions::default())
}

pub fn from_reader_with_options<R: Read>(reader: R, options: &RehydrateOptions) -> Result<Graph> {
    rehydrate::from_reader(reader, options)
}

/// True when the string matches the reference path grammar.
pub fn is_reference(input: &str) -> bool {
    RefPath::matches(input)
}
