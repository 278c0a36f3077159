//! The JSON graph document the CLI lays out.
//!
//! ```json
//! {
//!   "nodes": [{ "id": "a" }, { "id": "b" }],
//!   "edges": [{ "source": "a", "target": "b" }]
//! }
//! ```
//!
//! Extra fields on nodes and edges are ignored. An edge may omit either
//! endpoint; such edges are kept in the document but play no part in the
//! layout.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spring_graph_layout::{AdapterError, GraphAdapter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeEntry {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub edges: Vec<EdgeEntry>,
}

impl GraphDocument {
    /// Read and parse a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph from {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Invalid graph document {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Keys nodes by `id` and edges by `source` / `target`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAdapter;

impl GraphAdapter<NodeEntry, EdgeEntry> for DocumentAdapter {
    type Key = String;

    fn key_of(&self, node: &NodeEntry) -> Result<String, AdapterError> {
        if node.id.trim().is_empty() {
            return Err(AdapterError::new("node id must not be empty"));
        }
        Ok(node.id.clone())
    }

    fn source_key_of(&self, edge: &EdgeEntry) -> Result<Option<String>, AdapterError> {
        Ok(edge.source.clone())
    }

    fn destination_key_of(&self, edge: &EdgeEntry) -> Result<Option<String>, AdapterError> {
        Ok(edge.target.clone())
    }
}
