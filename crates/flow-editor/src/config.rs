use flow_core::GridLayout;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for an `EditorSession`.
///
/// Every field has a default, so a partial JSON document is enough to
/// override just what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Quiet period after the last edit before an autosave. Default: **2000 ms**.
    pub autosave_delay_ms: u64,

    /// Diagram name used until the user renames it. Default: **"New Flow"**.
    pub default_name: String,

    /// Slots for entity cards that have never been placed.
    pub grid: GridLayout,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 2000,
            default_name: "New Flow".to_string(),
            grid: GridLayout::default(),
        }
    }
}

impl EditorConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
