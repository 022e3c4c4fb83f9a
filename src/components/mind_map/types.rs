use super::state::MindMapState;
use crate::map::{NodeId, Point};

/// Screen-space placement of the in-place text editor. The draft is not
/// mirrored here; the input reads it once when created.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorOverlay {
	pub id: NodeId,
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
	pub font_size: f64,
}

/// Snapshot of the selected node for the style panel.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionInfo {
	pub id: NodeId,
	pub color: String,
	pub text_color: String,
	pub font_size: f64,
	pub shape: String,
	pub icon: String,
	pub notes: String,
	pub tags: String,
	/// One `kind: title-or-content` line per attachment.
	pub attachments: Vec<String>,
	pub collapsed: bool,
	pub child_count: usize,
}

/// Reactive mirror of the parts of the engine state the DOM chrome shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChromeView {
	pub zoom_percent: u32,
	pub node_count: usize,
	pub editor: Option<EditorOverlay>,
	pub selection: Option<SelectionInfo>,
	pub style_panel_open: bool,
}

/// Pointer position relative to the canvas' top-left corner.
pub fn canvas_point(client_x: i32, client_y: i32, left: f64, top: f64) -> Point {
	Point::new(client_x as f64 - left, client_y as f64 - top)
}

impl ChromeView {
	pub fn of(state: &MindMapState) -> Self {
		let vp = state.viewport;
		let editor = state.editing().and_then(|(id, _)| {
			let node = state.map.node(id)?;
			let centre = vp.world_to_screen(node.position);
			let (width, height) = (node.size.width * vp.zoom, node.size.height * vp.zoom);
			Some(EditorOverlay {
				id: id.clone(),
				left: centre.x - width / 2.0,
				top: centre.y - height / 2.0,
				width,
				height,
				font_size: node.style.font_size * vp.zoom,
			})
		});
		let selection = state.selected.as_ref().and_then(|id| {
			let node = state.map.node(id)?;
			Some(SelectionInfo {
				id: id.clone(),
				color: node.style.color.clone(),
				text_color: node.style.text_color.clone(),
				font_size: node.style.font_size,
				shape: node.style.shape.as_str().to_owned(),
				icon: node.style.icon.clone().unwrap_or_default(),
				notes: node.notes.clone(),
				tags: node.tags.join(", "),
				attachments: node
					.attachments
					.iter()
					.map(|a| {
						let label = a.title.as_deref().unwrap_or(&a.content);
						format!("{}: {label}", a.kind.as_str())
					})
					.collect(),
				collapsed: node.collapsed,
				child_count: state.map.children_of(id).len(),
			})
		});
		ChromeView {
			zoom_percent: (vp.zoom * 100.0).round() as u32,
			node_count: state.map.len(),
			style_panel_open: state.style_panel_open && selection.is_some(),
			editor,
			selection,
		}
	}
}

/// Splits the comma separated tag field of the style panel.
pub fn parse_tags(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.map(str::to_owned)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::map::{Attachment, AttachmentKind, MindMap};

	#[test]
	fn editor_overlay_tracks_zoom_and_pan() {
		let mut map = MindMap::new();
		let root = map.create_node(Point::new(100.0, 100.0), "root", None);
		let mut state = MindMapState::new(map, 800.0, 600.0);
		state.viewport.set_zoom(2.0);
		state.viewport.pan = Point::new(50.0, 50.0);
		state.begin_edit(root.clone());
		let view = ChromeView::of(&state);
		let editor = view.editor.expect("editing");
		assert_eq!(editor.id, root);
		// root is 160x72, centred at screen (300, 300)
		assert_eq!((editor.left, editor.top), (140.0, 228.0));
		assert_eq!((editor.width, editor.height), (320.0, 144.0));
		assert_eq!(editor.font_size, 28.0);
		assert_eq!(view.zoom_percent, 200);
		assert_eq!(view.selection.map(|s| s.shape), Some("ellipse".to_owned()));
	}

	#[test]
	fn selection_lists_attachments() {
		let mut map = MindMap::new();
		let root = map.create_node(Point::new(0.0, 0.0), "root", None);
		map.add_attachment(
			&root,
			Attachment {
				kind: AttachmentKind::Link,
				content: "https://example.org".into(),
				title: Some("docs".into()),
			},
		);
		map.add_attachment(
			&root,
			Attachment {
				kind: AttachmentKind::Formula,
				content: "e = mc^2".into(),
				title: None,
			},
		);
		let mut state = MindMapState::new(map, 800.0, 600.0);
		state.select(Some(root));
		let attachments = ChromeView::of(&state).selection.map(|s| s.attachments);
		assert_eq!(
			attachments,
			Some(vec!["link: docs".to_owned(), "formula: e = mc^2".to_owned()])
		);
	}

	#[test]
	fn style_panel_needs_a_selection() {
		let mut state = MindMapState::new(MindMap::new(), 800.0, 600.0);
		state.style_panel_open = true;
		assert!(!ChromeView::of(&state).style_panel_open);
	}

	#[test]
	fn tags_are_trimmed_and_blank_ones_dropped() {
		assert_eq!(parse_tags(" maths, ,exam ,"), vec!["maths", "exam"]);
		assert!(parse_tags("").is_empty());
	}
}
