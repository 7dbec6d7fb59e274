use crate::store::StoreError;
use flow_core::GraphError;
use thiserror::Error;

/// Failure of a session operation that touches a collaborator store.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}
