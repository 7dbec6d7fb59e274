pub mod autosave;
pub mod config;
pub mod connect;
pub mod error;
pub mod history;
pub mod session;
pub mod store;
pub mod sync;
#[cfg(feature = "tokio")]
pub mod tokio_timer;

pub use autosave::{Autosave, ManualScheduler, SaveRequest, SaveStatus, Scheduler, TimerId};
pub use config::EditorConfig;
pub use connect::{ConnectOutcome, ConnectionAction, Rejection};
pub use error::EditorError;
pub use history::{History, HistoryEntry, Mode};
pub use session::EditorSession;
pub use store::{DiagramStore, Entity, EntityStore, NewTask, StoreError};
pub use sync::SyncReport;
#[cfg(feature = "tokio")]
pub use tokio_timer::TokioScheduler;
