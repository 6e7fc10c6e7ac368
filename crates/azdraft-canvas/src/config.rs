use azdraft_core::Position;
use serde::{Deserialize, Serialize};

/// Grid geometry and animation timings of the canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    pub origin_x: f64,
    pub origin_y: f64,
    pub column_spacing: f64,
    pub row_spacing: f64,
    pub columns: usize,
    /// How long a newly projected node keeps its entrance animation.
    pub entrance_ms: u64,
    /// Delay between a connection change and the edges appearing.
    pub edge_reveal_ms: u64,
    /// Extra fade delay per edge, multiplied by the edge's index.
    pub edge_stagger_ms: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            origin_x: 100.0,
            origin_y: 100.0,
            column_spacing: 250.0,
            row_spacing: 150.0,
            columns: 3,
            entrance_ms: 1000,
            edge_reveal_ms: 500,
            edge_stagger_ms: 100,
        }
    }
}

impl CanvasConfig {
    /// Grid slot of the node at `index`, filling rows left to right.
    pub fn grid_position(&self, index: usize) -> Position {
        let columns = self.columns.max(1);
        Position::new(
            self.origin_x + (index % columns) as f64 * self.column_spacing,
            self.origin_y + (index / columns) as f64 * self.row_spacing,
        )
    }
}
