//! The node graph and its mutation API.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::error::{MapError, Result};
use super::types::{
	Attachment, CHILD_SIZE, Connection, Node, NodeId, NodePatch, NodeStyle, Point, ROOT_SIZE,
	Shape,
};
use super::viewport::Bounds;

/// Distance from a parent at which [`MindMap::add_child_node`] places a new child.
pub const CHILD_RADIUS: f64 = 150.0;
/// Angular step between consecutive children, in degrees.
pub const CHILD_ANGLE_STEP: f64 = 60.0;
/// Label given to nodes made by [`MindMap::add_child_node`].
pub const NEW_CHILD_TEXT: &str = "New Idea";

/// Map-level fields persisted next to the nodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapMetadata {
	/// Map title.
	#[serde(default)]
	pub title: String,
	/// Free-form description.
	#[serde(default)]
	pub description: String,
}

/// The node graph.
///
/// `children` is the only record of structure: parents and connections are
/// derived from it, so there is nothing to keep in sync. Every node has an
/// entry (possibly empty) in `children`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(
	try_from = "crate::map::document::MapDocument",
	into = "crate::map::document::MapDocument"
)]
pub struct MindMap {
	nodes: IndexMap<NodeId, Node>,
	children: HashMap<NodeId, Vec<NodeId>>,
	/// Title and description.
	pub metadata: MapMetadata,
	next_id: u64,
}

impl Default for MindMap {
	fn default() -> Self {
		Self {
			nodes: IndexMap::new(),
			children: HashMap::new(),
			metadata: MapMetadata::default(),
			next_id: 1,
		}
	}
}

impl PartialEq for MindMap {
	fn eq(&self, other: &Self) -> bool {
		self.nodes.iter().eq(other.nodes.iter())
			&& self.children == other.children
			&& self.metadata == other.metadata
	}
}

impl MindMap {
	/// An empty map; the first id handed out is `node-1`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a map from already-validated parts.
	pub(crate) fn from_parts(
		nodes: IndexMap<NodeId, Node>,
		children: HashMap<NodeId, Vec<NodeId>>,
		metadata: MapMetadata,
	) -> Self {
		let next_id = nodes.len() as u64 + 1;
		Self {
			nodes,
			children,
			metadata,
			next_id,
		}
	}

	/// Number of nodes, hidden ones included.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// True when the map has no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// True when `id` names a node of this map.
	pub fn contains(&self, id: &NodeId) -> bool {
		self.nodes.contains_key(id)
	}

	/// Looks a node up by id.
	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
		self.nodes.get_mut(id)
	}

	/// Nodes in creation order (later nodes draw on top).
	pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
		self.nodes.values()
	}

	/// Ordered children of `id`; empty for leaves and unknown ids.
	pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
		self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
	}

	/// The node listing `id` as a child.
	pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
		self.children
			.iter()
			.find(|(_, kids)| kids.contains(id))
			.map(|(parent, _)| parent)
	}

	/// Unparented nodes, in creation order.
	pub fn roots(&self) -> impl Iterator<Item = &NodeId> + '_ {
		let parented: HashSet<&NodeId> = self.children.values().flatten().collect();
		self.nodes.keys().filter(move |id| !parented.contains(id))
	}

	/// The first unparented node; layouts are anchored on it.
	pub fn primary_root(&self) -> Option<&NodeId> {
		self.roots().next()
	}

	/// Parent-to-child edges, ordered by parent creation then child order.
	pub fn connections(&self) -> Vec<Connection> {
		self.nodes
			.keys()
			.flat_map(|from| {
				self.children_of(from).iter().map(move |to| Connection {
					from: from.clone(),
					to: to.clone(),
				})
			})
			.collect()
	}

	/// Depth-first (pre-order) list of every node below `id`.
	pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack: Vec<&NodeId> = self.children_of(id).iter().rev().collect();
		while let Some(next) = stack.pop() {
			out.push(next.clone());
			stack.extend(self.children_of(next).iter().rev());
		}
		out
	}

	/// True when `ancestor` lies on the parent chain of `id`.
	pub fn is_ancestor(&self, ancestor: &NodeId, id: &NodeId) -> bool {
		let mut cursor = self.parent_of(id);
		while let Some(parent) = cursor {
			if parent == ancestor {
				return true;
			}
			cursor = self.parent_of(parent);
		}
		false
	}

	fn allocate_id(&mut self) -> NodeId {
		loop {
			let candidate = NodeId::new(format!("node-{}", self.next_id));
			self.next_id += 1;
			if !self.nodes.contains_key(&candidate) {
				return candidate;
			}
		}
	}

	/// Inserts a node and, when `parent` resolves, links it as that
	/// parent's last child. An unresolved parent yields a new root.
	pub fn create_node(
		&mut self,
		position: Point,
		text: impl Into<String>,
		parent: Option<&NodeId>,
	) -> NodeId {
		let id = self.allocate_id();
		let parent = parent.filter(|p| self.nodes.contains_key(*p)).cloned();
		let (size, shape) = match parent {
			Some(_) => (CHILD_SIZE, Shape::Rectangle),
			None => (ROOT_SIZE, Shape::Ellipse),
		};
		let style = NodeStyle::from_palette(self.nodes.len(), shape);
		self.nodes
			.insert(id.clone(), Node::new(id.clone(), text, position, size, style));
		self.children.insert(id.clone(), Vec::new());
		if let Some(parent) = &parent {
			self.children.entry(parent.clone()).or_default().push(id.clone());
		}
		debug!("created {id} under {parent:?}");
		id
	}

	/// Adds a child at [`CHILD_RADIUS`] from `parent`, rotated
	/// [`CHILD_ANGLE_STEP`] degrees per existing sibling.
	pub fn add_child_node(&mut self, parent: &NodeId) -> Option<NodeId> {
		let origin = self.nodes.get(parent)?.position;
		let angle = (CHILD_ANGLE_STEP * self.children_of(parent).len() as f64) * PI / 180.0;
		let position = Point::new(
			origin.x + CHILD_RADIUS * angle.cos(),
			origin.y + CHILD_RADIUS * angle.sin(),
		);
		Some(self.create_node(position, NEW_CHILD_TEXT, Some(parent)))
	}

	/// Merges `patch` into the node. Returns false for an unknown id.
	pub fn update_node(&mut self, id: &NodeId, patch: NodePatch) -> bool {
		match self.nodes.get_mut(id) {
			Some(node) => {
				patch.apply(node);
				true
			}
			None => false,
		}
	}

	/// Removes `id` and its whole subtree. Returns the ids removed, empty
	/// for an unknown id.
	pub fn delete_node(&mut self, id: &NodeId) -> Vec<NodeId> {
		if !self.nodes.contains_key(id) {
			return Vec::new();
		}
		if let Some(parent) = self.parent_of(id).cloned() {
			if let Some(siblings) = self.children.get_mut(&parent) {
				siblings.retain(|c| c != id);
			}
		}
		// descendants first, deepest last in pre-order, so walk it backwards
		let mut removed = self.descendants(id);
		removed.reverse();
		removed.push(id.clone());
		for gone in &removed {
			self.nodes.shift_remove(gone);
			self.children.remove(gone);
		}
		debug!("deleted {id} ({} nodes)", removed.len());
		removed
	}

	/// Moves `id` (with its subtree) under `new_parent`, or detaches it as a
	/// root when `new_parent` is `None`.
	pub fn reparent_node(&mut self, id: &NodeId, new_parent: Option<&NodeId>) -> Result<()> {
		if !self.nodes.contains_key(id) {
			return Err(MapError::NodeNotFound(id.clone()));
		}
		if let Some(parent) = new_parent {
			if !self.nodes.contains_key(parent) {
				return Err(MapError::NodeNotFound(parent.clone()));
			}
			if parent == id || self.is_ancestor(id, parent) {
				return Err(MapError::WouldCreateCycle {
					node: id.clone(),
					parent: parent.clone(),
				});
			}
		}
		let old_parent = self.parent_of(id).cloned();
		if old_parent.as_ref() == new_parent {
			return Ok(());
		}
		if let Some(old) = &old_parent {
			if let Some(siblings) = self.children.get_mut(old) {
				siblings.retain(|c| c != id);
			}
		}
		if let Some(parent) = new_parent {
			self.children.entry(parent.clone()).or_default().push(id.clone());
		}
		debug!("reparented {id}: {old_parent:?} -> {new_parent:?}");
		Ok(())
	}

	/// Flips the collapsed flag, returning the new value.
	pub fn toggle_collapsed(&mut self, id: &NodeId) -> Option<bool> {
		let node = self.nodes.get_mut(id)?;
		node.collapsed = !node.collapsed;
		Some(node.collapsed)
	}

	/// False when any ancestor is collapsed.
	pub fn is_visible(&self, id: &NodeId) -> bool {
		let mut cursor = self.parent_of(id);
		while let Some(parent) = cursor {
			if self.nodes.get(parent).is_some_and(|n| n.collapsed) {
				return false;
			}
			cursor = self.parent_of(parent);
		}
		self.nodes.contains_key(id)
	}

	fn hidden_set(&self) -> HashSet<NodeId> {
		self.nodes
			.values()
			.filter(|n| n.collapsed)
			.flat_map(|n| self.descendants(&n.id))
			.collect()
	}

	/// Nodes not hidden by a collapsed ancestor, in draw order.
	pub fn visible_nodes(&self) -> Vec<&Node> {
		let hidden = self.hidden_set();
		self.nodes
			.values()
			.filter(|n| !hidden.contains(&n.id))
			.collect()
	}

	/// Connections whose ends are both visible.
	pub fn visible_connections(&self) -> Vec<Connection> {
		let hidden = self.hidden_set();
		self.connections()
			.into_iter()
			.filter(|c| !hidden.contains(&c.from) && !hidden.contains(&c.to))
			.collect()
	}

	/// Size of the subtree folded away under a collapsed node; 0 otherwise.
	pub fn hidden_descendant_count(&self, id: &NodeId) -> usize {
		match self.nodes.get(id) {
			Some(node) if node.collapsed => self.descendants(id).len(),
			_ => 0,
		}
	}

	/// Top-most visible node under a world-space point.
	pub fn node_at(&self, world: Point) -> Option<&NodeId> {
		self.visible_nodes()
			.into_iter()
			.rev()
			.find(|n| n.contains(world))
			.map(|n| &n.id)
	}

	/// World-space box around every visible node extent.
	pub fn bounds(&self) -> Option<Bounds> {
		Bounds::around(self.visible_nodes().into_iter())
	}

	/// Appends an attachment. Returns false for an unknown id.
	pub fn add_attachment(&mut self, id: &NodeId, attachment: Attachment) -> bool {
		match self.nodes.get_mut(id) {
			Some(node) => {
				node.attachments.push(attachment);
				true
			}
			None => false,
		}
	}

	/// Removes the attachment at `index`, if both the node and index exist.
	pub fn remove_attachment(&mut self, id: &NodeId, index: usize) -> Option<Attachment> {
		let node = self.nodes.get_mut(id)?;
		(index < node.attachments.len()).then(|| node.attachments.remove(index))
	}

	pub(crate) fn parts(&self) -> (&IndexMap<NodeId, Node>, &HashMap<NodeId, Vec<NodeId>>) {
		(&self.nodes, &self.children)
	}
}
