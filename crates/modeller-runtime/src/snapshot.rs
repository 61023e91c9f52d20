//! Serializable export of a physical graph.

use modeller_core::types::Vec3;
use serde::{Deserialize, Serialize};

/// One node as exported: title, body, and current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub title: String,
    pub body: String,
    pub position: Vec3,
}

/// Nodes in sphere id order plus the connection sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub connections: Vec<(String, String)>,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn node(&self, title: &str) -> Option<&NodeSnapshot> {
        self.nodes.iter().find(|node| node.title == title)
    }
}
