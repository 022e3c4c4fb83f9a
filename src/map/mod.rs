//! The mind-map model: node graph, layouts, viewport maths and the stored
//! document format. Nothing in here touches the DOM.

pub mod document;
pub mod error;
pub mod graph;
pub mod layout;
pub mod types;
pub mod viewport;

pub use document::{MapDocument, NodeRecord};
pub use error::{MapError, Result};
pub use graph::{MapMetadata, MindMap};
pub use layout::Layout;
pub use types::{
	Attachment, AttachmentKind, Connection, Node, NodeId, NodePatch, NodeStyle, Point, Shape, Size,
};
pub use viewport::{Bounds, Viewport};
