pub mod diagram;
pub mod error;
pub mod graph;
pub mod id;
pub mod layout;
pub mod model;

pub use diagram::{DiagramResource, GraphData};
pub use error::{CodecError, GraphError};
pub use graph::FlowGraph;
pub use id::{DiagramId, EdgeId, EntityId, HandleId, NodeId};
pub use layout::GridLayout;
pub use model::*;
