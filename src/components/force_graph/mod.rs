mod component;
mod info_panel;
mod render;
mod state;
mod types;
mod viewport;

pub use component::ForceGraphCanvas;
pub use types::{GraphData, GraphLink, GraphNode};
