//! Default placement for nodes that have never been positioned.

use crate::model::Position;
use serde::{Deserialize, Serialize};

/// Row-major grid of card slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub columns: u32,
    pub spacing_x: f32,
    pub spacing_y: f32,
    pub origin: Position,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 3,
            spacing_x: 350.0,
            spacing_y: 250.0,
            origin: Position::new(50.0, 50.0),
        }
    }
}

impl GridLayout {
    /// Position of the `index`-th slot.
    pub fn slot(&self, index: usize) -> Position {
        let columns = self.columns.max(1) as usize;
        let col = (index % columns) as f32;
        let row = (index / columns) as f32;
        Position::new(
            self.origin.x + col * self.spacing_x,
            self.origin.y + row * self.spacing_y,
        )
    }

    /// First slot not already occupied by one of `taken`.
    ///
    /// Only the first `taken.len() + 1` slots are searched, so a grid whose
    /// slots collapse onto each other (zero spacing) falls back to `origin`.
    pub fn next_free<'a>(&self, taken: impl IntoIterator<Item = &'a Position> + Clone) -> Position {
        let bound = taken.clone().into_iter().count() + 1;
        (0..bound)
            .map(|i| self.slot(i))
            .find(|p| !taken.clone().into_iter().any(|t| t == p))
            .unwrap_or(self.origin)
    }
}
