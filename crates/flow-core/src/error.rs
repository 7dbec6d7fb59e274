use crate::id::{EntityId, NodeId};
use crate::model::{Connection, NodeKind};
use thiserror::Error;

/// Structural errors returned synchronously by `FlowGraph` operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node {0} already exists")]
    DuplicateId(NodeId),

    #[error("entity {0} is already represented by another node")]
    DuplicateEntity(EntityId),

    #[error("node {0} not found")]
    NotFound(NodeId),

    #[error("node {0} cannot connect to itself")]
    SelfLoop(NodeId),

    #[error("edge {0} already exists")]
    DuplicateEdge(Connection),

    #[error("node {id} is a {expected} node, got a {found} patch")]
    KindMismatch {
        id: NodeId,
        expected: NodeKind,
        found: NodeKind,
    },
}

/// Errors from encoding or decoding persisted graph data.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("msgpack encode: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),

    #[error("msgpack decode: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),
}
