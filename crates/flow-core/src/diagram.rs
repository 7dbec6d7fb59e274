//! Persisted diagram resources and the encodings stores may use for them.

use crate::error::CodecError;
use crate::id::DiagramId;
use crate::model::{Edge, Node};
use serde::{Deserialize, Serialize};

/// The node and edge sets of a diagram, as handed to a diagram store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// MessagePack with named fields, so the payload survives field reordering.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// A named diagram. `id` stays `None` until the first successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramResource {
    pub id: Option<DiagramId>,
    pub name: String,
    pub graph_data: GraphData,
}
