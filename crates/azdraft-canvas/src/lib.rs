//! Render projection for azdraft diagrams.
//!
//! Turns graph store state into the node and edge lists a flow-chart surface
//! draws, with grid placement, entrance animation and delayed edge reveal.

pub mod canvas;
pub mod config;
pub mod timeline;
pub mod view;

pub use canvas::{Canvas, CanvasTask};
pub use config::CanvasConfig;
pub use timeline::{Clock, ManualClock, SystemClock, Timeline};
pub use view::{edge_color, EdgeStyle, EdgeView, NodeData, NodeView};
