use log::debug;

use crate::map::{Attachment, Layout, MindMap, NodeId, NodePatch, Point, Size, Viewport};

/// Text given to a root created on an empty canvas.
pub const ROOT_TEXT: &str = "Central Topic";

/// What the pointer (or keyboard) is currently doing to the canvas.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Interaction {
	#[default]
	Idle,
	/// Background drag. `moved` distinguishes a pan from a plain click.
	Panning { last: Point, moved: bool },
	/// `grab_offset` is pointer minus node centre, in screen space.
	DraggingNode { id: NodeId, grab_offset: Point },
	EditingNode { id: NodeId, draft: String },
}

/// Everything the canvas needs besides the graph itself: viewport,
/// selection and the interaction state machine. All graph changes go
/// through [`MindMap`].
pub struct MindMapState {
	pub map: MindMap,
	pub viewport: Viewport,
	pub interaction: Interaction,
	pub selected: Option<NodeId>,
	pub style_panel_open: bool,
	pub width: f64,
	pub height: f64,
	revision: u64,
}

impl MindMapState {
	pub fn new(map: MindMap, width: f64, height: f64) -> Self {
		Self {
			map,
			viewport: Viewport::default(),
			interaction: Interaction::Idle,
			selected: None,
			style_panel_open: false,
			width,
			height,
			revision: 0,
		}
	}

	/// Bumped on every committed change to the map; used to drive autosave.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	fn touch(&mut self) {
		self.revision = self.revision.wrapping_add(1);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn canvas_size(&self) -> Size {
		Size {
			width: self.width,
			height: self.height,
		}
	}

	pub fn node_at_screen(&self, screen: Point) -> Option<NodeId> {
		self.map
			.node_at(self.viewport.screen_to_world(screen))
			.cloned()
	}

	pub fn editing(&self) -> Option<(&NodeId, &str)> {
		match &self.interaction {
			Interaction::EditingNode { id, draft } => Some((id, draft.as_str())),
			_ => None,
		}
	}

	pub fn is_dragging(&self) -> bool {
		matches!(self.interaction, Interaction::DraggingNode { .. })
	}

	pub fn select(&mut self, id: Option<NodeId>) {
		if id.is_none() {
			self.style_panel_open = false;
		}
		self.selected = id.filter(|id| self.map.contains(id));
	}

	pub fn toggle_style_panel(&mut self) {
		self.style_panel_open = !self.style_panel_open && self.selected.is_some();
	}

	pub fn pointer_down(&mut self, screen: Point) {
		let hit = self.node_at_screen(screen);
		if let Interaction::EditingNode { id, .. } = &self.interaction {
			if hit.as_ref() == Some(id) {
				return;
			}
			self.commit_edit();
		}
		match hit {
			Some(id) => {
				let Some(node) = self.map.node(&id) else {
					return;
				};
				let grab_offset = screen - self.viewport.world_to_screen(node.position);
				debug!("drag start {id}");
				self.selected = Some(id.clone());
				self.interaction = Interaction::DraggingNode { id, grab_offset };
			}
			None => {
				self.interaction = Interaction::Panning {
					last: screen,
					moved: false,
				};
			}
		}
	}

	/// Returns true when something visible changed.
	pub fn pointer_move(&mut self, screen: Point) -> bool {
		match &mut self.interaction {
			Interaction::Panning { last, moved } => {
				let delta = screen - *last;
				if delta == Point::default() {
					return false;
				}
				*last = screen;
				*moved = true;
				self.viewport.pan_by_screen(delta);
				true
			}
			Interaction::DraggingNode { id, grab_offset } => {
				let world = self.viewport.screen_to_world(screen - *grab_offset);
				let id = id.clone();
				let moved = self.map.update_node(&id, NodePatch::position(world));
				if moved {
					self.touch();
				}
				moved
			}
			Interaction::Idle | Interaction::EditingNode { .. } => false,
		}
	}

	pub fn pointer_up(&mut self) {
		match std::mem::take(&mut self.interaction) {
			// a background press that never moved is a click on empty canvas
			Interaction::Panning { moved: false, .. } => self.select(None),
			Interaction::EditingNode { id, draft } => {
				self.interaction = Interaction::EditingNode { id, draft };
			}
			_ => {}
		}
	}

	/// Pointer left the canvas: end any drag/pan without click semantics.
	pub fn pointer_leave(&mut self) {
		if matches!(
			self.interaction,
			Interaction::Panning { .. } | Interaction::DraggingNode { .. }
		) {
			self.interaction = Interaction::Idle;
		}
	}

	pub fn double_click(&mut self, screen: Point) {
		let Some(id) = self.node_at_screen(screen) else {
			return;
		};
		self.begin_edit(id);
	}

	pub fn begin_edit(&mut self, id: NodeId) {
		if !self.map.contains(&id) {
			return;
		}
		if self.editing().is_some() {
			self.commit_edit();
		}
		let draft = self.map.node(&id).map(|n| n.text.clone()).unwrap_or_default();
		debug!("editing {id}");
		self.interaction = Interaction::EditingNode {
			id: id.clone(),
			draft,
		};
		self.selected = Some(id);
	}

	pub fn edit_input(&mut self, text: String) {
		if let Interaction::EditingNode { draft, .. } = &mut self.interaction {
			*draft = text;
		}
	}

	/// Writes the draft into the node (blur, Enter, clicking elsewhere).
	pub fn commit_edit(&mut self) -> bool {
		let Interaction::EditingNode { id, draft } = std::mem::take(&mut self.interaction) else {
			return false;
		};
		let changed = self.map.node(&id).is_some_and(|n| n.text != draft);
		if changed {
			self.map.update_node(&id, NodePatch::text(draft));
			self.touch();
		}
		debug!("edit committed on {id}");
		changed
	}

	/// Drops the draft (Escape).
	pub fn cancel_edit(&mut self) {
		if let Interaction::EditingNode { id, .. } = std::mem::take(&mut self.interaction) {
			debug!("edit cancelled on {id}");
		}
	}

	/// Keyboard shortcuts. Returns true when the key was consumed.
	pub fn key_down(&mut self, key: &str) -> bool {
		let editing = self.editing().is_some();
		match key {
			"Escape" if editing => self.cancel_edit(),
			"Escape" => self.select(None),
			"Enter" if editing => {
				self.commit_edit();
			}
			"Delete" if !editing => return self.delete_selected() > 0,
			"Tab" if !editing => return self.add_node().is_some(),
			_ => return false,
		}
		true
	}

	pub fn wheel(&mut self, delta_y: f64) {
		self.viewport.wheel(delta_y);
	}

	pub fn zoom_in(&mut self) {
		self.viewport.zoom_in();
	}

	pub fn zoom_out(&mut self) {
		self.viewport.zoom_out();
	}

	pub fn reset_view(&mut self) {
		self.viewport.reset();
	}

	pub fn fit_to_view(&mut self) {
		if let Some(bounds) = self.map.bounds() {
			let size = self.canvas_size();
			self.viewport.fit_to_view(bounds, size);
		}
	}

	/// Adds a child to the selection, or to the root when nothing is
	/// selected. On an empty map, creates the root in the middle of the view.
	pub fn add_node(&mut self) -> Option<NodeId> {
		let parent = self
			.selected
			.clone()
			.or_else(|| self.map.primary_root().cloned());
		let id = match parent {
			Some(parent) => self.map.add_child_node(&parent)?,
			None => {
				let centre = self
					.viewport
					.screen_to_world(Point::new(self.width / 2.0, self.height / 2.0));
				self.map.create_node(centre, ROOT_TEXT, None)
			}
		};
		self.touch();
		self.selected = Some(id.clone());
		Some(id)
	}

	/// Deletes a node and its subtree, dropping selection and edit state
	/// that pointed into it.
	pub fn delete_node(&mut self, id: &NodeId) -> usize {
		let removed = self.map.delete_node(id);
		if removed.is_empty() {
			return 0;
		}
		if self.selected.as_ref().is_some_and(|s| removed.contains(s)) {
			self.select(None);
		}
		let stale = match &self.interaction {
			Interaction::DraggingNode { id, .. } | Interaction::EditingNode { id, .. } => {
				removed.contains(id)
			}
			_ => false,
		};
		if stale {
			self.interaction = Interaction::Idle;
		}
		self.touch();
		removed.len()
	}

	pub fn delete_selected(&mut self) -> usize {
		match self.selected.clone() {
			Some(id) => self.delete_node(&id),
			None => 0,
		}
	}

	pub fn toggle_collapse_selected(&mut self) -> Option<bool> {
		let id = self.selected.clone()?;
		let collapsed = self.map.toggle_collapsed(&id)?;
		self.touch();
		Some(collapsed)
	}

	pub fn update_selected(&mut self, patch: NodePatch) -> bool {
		let Some(id) = self.selected.clone() else {
			return false;
		};
		let updated = self.map.update_node(&id, patch);
		if updated {
			self.touch();
		}
		updated
	}

	pub fn attach_to_selected(&mut self, attachment: Attachment) -> bool {
		let Some(id) = self.selected.clone() else {
			return false;
		};
		let added = self.map.add_attachment(&id, attachment);
		if added {
			self.touch();
		}
		added
	}

	pub fn detach_from_selected(&mut self, index: usize) -> Option<Attachment> {
		let id = self.selected.clone()?;
		let removed = self.map.remove_attachment(&id, index)?;
		self.touch();
		Some(removed)
	}

	pub fn apply_layout(&mut self, layout: Layout) -> usize {
		let moved = self.map.apply_layout(layout);
		if moved > 0 {
			self.touch();
		}
		moved
	}

	/// Swaps in a whole new map (import, template, generated content).
	pub fn replace_map(&mut self, map: MindMap) {
		debug!("map replaced ({} nodes)", map.len());
		self.map = map;
		self.selected = None;
		self.style_panel_open = false;
		self.interaction = Interaction::Idle;
		self.touch();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::map::AttachmentKind;

	/// Root at world (400, 300) on an 800x600 canvas at identity zoom.
	fn state() -> (MindMapState, NodeId) {
		let mut map = MindMap::new();
		let root = map.create_node(Point::new(400.0, 300.0), "root", None);
		(MindMapState::new(map, 800.0, 600.0), root)
	}

	fn pos(s: &MindMapState, id: &NodeId) -> Point {
		s.map.node(id).map(|n| n.position).unwrap_or_default()
	}

	#[test]
	fn background_drag_pans_by_delta_over_zoom() {
		let (mut s, _) = state();
		s.viewport.set_zoom(2.0);
		s.pointer_down(Point::new(10.0, 10.0));
		assert!(s.pointer_move(Point::new(30.0, 50.0)));
		assert_eq!(s.viewport.pan, Point::new(10.0, 20.0));
		assert!(s.pointer_move(Point::new(40.0, 50.0)));
		assert_eq!(s.viewport.pan, Point::new(15.0, 20.0));
		s.pointer_up();
		assert_eq!(s.interaction, Interaction::Idle);
	}

	#[test]
	fn dragging_keeps_the_grab_offset() {
		let (mut s, root) = state();
		s.viewport.set_zoom(2.0);
		s.viewport.pan = Point::new(-200.0, -150.0);
		// root renders at (400, 300); grab it 10px right of centre
		s.pointer_down(Point::new(410.0, 300.0));
		assert!(s.is_dragging());
		assert_eq!(s.selected.as_ref(), Some(&root));
		s.pointer_move(Point::new(410.0, 300.0));
		assert_eq!(pos(&s, &root), Point::new(400.0, 300.0));
		s.pointer_move(Point::new(510.0, 200.0));
		assert_eq!(pos(&s, &root), Point::new(450.0, 250.0));
		s.pointer_up();
		assert_eq!(s.interaction, Interaction::Idle);
		assert_eq!(s.selected.as_ref(), Some(&root));
	}

	#[test]
	fn click_on_empty_canvas_deselects_but_pan_does_not() {
		let (mut s, root) = state();
		s.select(Some(root.clone()));
		s.style_panel_open = true;
		s.pointer_down(Point::new(5.0, 5.0));
		s.pointer_move(Point::new(25.0, 5.0));
		s.pointer_up();
		assert_eq!(s.selected.as_ref(), Some(&root));

		s.pointer_down(Point::new(5.0, 5.0));
		s.pointer_up();
		assert_eq!(s.selected, None);
		assert!(!s.style_panel_open);
	}

	#[test]
	fn escape_discards_and_blur_commits() {
		let (mut s, root) = state();
		s.double_click(Point::new(400.0, 300.0));
		assert_eq!(s.editing(), Some((&root, "root")));
		s.edit_input("discarded".into());
		assert!(s.key_down("Escape"));
		assert_eq!(s.editing(), None);
		assert_eq!(s.map.node(&root).map(|n| n.text.as_str()), Some("root"));

		s.double_click(Point::new(400.0, 300.0));
		s.edit_input("kept".into());
		let before = s.revision();
		assert!(s.commit_edit());
		assert_eq!(s.map.node(&root).map(|n| n.text.as_str()), Some("kept"));
		assert!(s.revision() > before);
	}

	#[test]
	fn pressing_elsewhere_commits_the_edit() {
		let (mut s, root) = state();
		let kid = s.add_node().expect("root exists");
		s.begin_edit(root.clone());
		s.edit_input("renamed".into());
		// press inside the edited node does nothing
		s.pointer_down(Point::new(400.0, 300.0));
		assert!(s.editing().is_some());
		s.pointer_up();
		assert!(s.editing().is_some());
		// press on the child commits and starts dragging it
		s.pointer_down(Point::new(550.0, 300.0));
		assert_eq!(s.map.node(&root).map(|n| n.text.as_str()), Some("renamed"));
		assert!(s.is_dragging());
		assert_eq!(s.selected.as_ref(), Some(&kid));
	}

	#[test]
	fn enter_commits_and_tab_adds_child() {
		let (mut s, root) = state();
		s.select(Some(root.clone()));
		assert!(s.key_down("Tab"));
		assert_eq!(s.map.children_of(&root).len(), 1);
		let kid = s.selected.clone().expect("new child selected");
		s.begin_edit(kid.clone());
		s.edit_input("Chapter 1".into());
		assert!(s.key_down("Enter"));
		assert_eq!(s.map.node(&kid).map(|n| n.text.as_str()), Some("Chapter 1"));
		assert!(!s.key_down("x"));
	}

	#[test]
	fn deleting_selection_clears_it() {
		let (mut s, root) = state();
		let kid = s.add_node().expect("root exists");
		let grandchild = s.add_node().expect("kid selected");
		assert_eq!(s.map.parent_of(&grandchild), Some(&kid));
		s.select(Some(kid.clone()));
		assert!(s.key_down("Delete"));
		assert_eq!(s.selected, None);
		assert!(!s.map.contains(&grandchild));
		assert_eq!(s.map.len(), 1);
		assert_eq!(s.delete_node(&kid), 0);
		assert!(s.map.contains(&root));
	}

	#[test]
	fn deleting_the_edited_node_ends_editing() {
		let (mut s, root) = state();
		s.begin_edit(root.clone());
		s.delete_node(&root);
		assert_eq!(s.interaction, Interaction::Idle);
		assert!(s.map.is_empty());
	}

	#[test]
	fn add_node_on_empty_map_creates_centred_root() {
		let mut s = MindMapState::new(MindMap::new(), 800.0, 600.0);
		s.viewport.pan = Point::new(100.0, 0.0);
		let root = s.add_node().expect("always creates");
		assert_eq!(pos(&s, &root), Point::new(300.0, 300.0));
		assert_eq!(s.map.primary_root(), Some(&root));
	}

	#[test]
	fn wheel_only_zooms() {
		let (mut s, _) = state();
		let pan = s.viewport.pan;
		for _ in 0..50 {
			s.wheel(-120.0);
		}
		assert_eq!(s.viewport.zoom, crate::map::viewport::MAX_ZOOM);
		assert_eq!(s.viewport.pan, pan);
	}

	#[test]
	fn fit_to_view_centres_the_map() {
		let (mut s, root) = state();
		s.viewport.pan = Point::new(1234.0, -99.0);
		s.fit_to_view();
		let centre = s.viewport.world_to_screen(pos(&s, &root));
		assert!((centre.x - 400.0).abs() < 1e-9 && (centre.y - 300.0).abs() < 1e-9);
	}

	#[test]
	fn attachments_follow_the_selection() {
		let (mut s, root) = state();
		let note = Attachment {
			kind: AttachmentKind::Note,
			content: "bring calculator".into(),
			title: None,
		};
		assert!(!s.attach_to_selected(note.clone()));
		s.select(Some(root.clone()));
		let before = s.revision();
		assert!(s.attach_to_selected(note.clone()));
		assert!(s.revision() > before);
		assert_eq!(s.map.node(&root).map(|n| n.attachments.len()), Some(1));
		assert_eq!(s.detach_from_selected(5), None);
		assert_eq!(s.detach_from_selected(0), Some(note));
		assert_eq!(s.map.node(&root).map(|n| n.attachments.len()), Some(0));
	}

	#[test]
	fn replace_map_resets_interaction() {
		let (mut s, root) = state();
		s.begin_edit(root);
		s.replace_map(MindMap::new());
		assert_eq!(s.interaction, Interaction::Idle);
		assert_eq!(s.selected, None);
		assert!(s.map.is_empty());
	}
}
