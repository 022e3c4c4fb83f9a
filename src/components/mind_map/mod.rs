mod component;
mod render;
mod state;
mod storage;
mod types;

pub use component::MindMapCanvas;
pub use storage::load as load_saved_map;
