//! Automatic repositioning of the primary root's tree. Only `position`
//! fields change; structure is never touched.

use std::collections::{HashSet, VecDeque};
use std::f64::consts::PI;

use log::debug;

use super::graph::MindMap;
use super::types::{NodeId, Point};

/// Canvas point the root is pinned to by the radial layout.
pub const RADIAL_CENTER: Point = Point::new(400.0, 300.0);
/// Radius added per BFS level.
pub const RADIAL_STEP: f64 = 150.0;
/// Canvas point the root is pinned to by the tree layout.
pub const TREE_ANCHOR: Point = Point::new(400.0, 80.0);
/// Vertical distance between tree rows.
pub const TREE_LEVEL_SPACING: f64 = 120.0;
/// Horizontal distance between siblings in the tree layout.
pub const TREE_CHILD_SPACING: f64 = 180.0;

/// Automatic arrangement offered by the toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
	/// Concentric rings around the root.
	Radial,
	/// Rows below the root.
	Tree,
}

impl MindMap {
	/// Runs `layout`, returning the number of nodes moved.
	pub fn apply_layout(&mut self, layout: Layout) -> usize {
		match layout {
			Layout::Radial => self.layout_radial(),
			Layout::Tree => self.layout_tree(),
		}
	}

	/// Places BFS level `n` (root = 0) on a circle of radius `n * RADIAL_STEP`
	/// around [`RADIAL_CENTER`], spread evenly. Returns the number of nodes
	/// moved. Subtrees under collapsed nodes keep their positions.
	pub fn layout_radial(&mut self) -> usize {
		let Some(root) = self.primary_root().cloned() else {
			return 0;
		};
		let levels = self.visible_levels(&root);
		let mut moved = 0;
		for (depth, level) in levels.iter().enumerate() {
			let radius = depth as f64 * RADIAL_STEP;
			for (index, id) in level.iter().enumerate() {
				let angle = index as f64 * 2.0 * PI / level.len() as f64;
				let position = Point::new(
					RADIAL_CENTER.x + radius * angle.cos(),
					RADIAL_CENTER.y + radius * angle.sin(),
				);
				if let Some(node) = self.node_mut(id) {
					node.position = position;
					moved += 1;
				}
			}
		}
		debug!("radial layout: {moved} nodes over {} levels", levels.len());
		moved
	}

	/// Top-down layout: each row of children sits [`TREE_LEVEL_SPACING`]
	/// below its parent, centred under it, [`TREE_CHILD_SPACING`] apart.
	/// Sibling subtrees may overlap.
	pub fn layout_tree(&mut self) -> usize {
		let Some(root) = self.primary_root().cloned() else {
			return 0;
		};
		let moved = self.place_subtree(&root, TREE_ANCHOR);
		debug!("tree layout: {moved} nodes");
		moved
	}

	fn place_subtree(&mut self, id: &NodeId, at: Point) -> usize {
		let Some(node) = self.node_mut(id) else {
			return 0;
		};
		node.position = at;
		if node.collapsed {
			return 1;
		}
		let children = self.children_of(id).to_vec();
		let span = (children.len().saturating_sub(1)) as f64 * TREE_CHILD_SPACING;
		let mut moved = 1;
		for (i, child) in children.iter().enumerate() {
			let x = at.x - span / 2.0 + i as f64 * TREE_CHILD_SPACING;
			moved += self.place_subtree(child, Point::new(x, at.y + TREE_LEVEL_SPACING));
		}
		moved
	}

	fn visible_levels(&self, root: &NodeId) -> Vec<Vec<NodeId>> {
		let mut levels: Vec<Vec<NodeId>> = Vec::new();
		let mut seen = HashSet::new();
		let mut queue = VecDeque::from([(root.clone(), 0usize)]);
		while let Some((id, depth)) = queue.pop_front() {
			if !seen.insert(id.clone()) {
				continue;
			}
			if levels.len() <= depth {
				levels.push(Vec::new());
			}
			let expand = self.node(&id).is_some_and(|n| !n.collapsed);
			if expand {
				for child in self.children_of(&id) {
					queue.push_back((child.clone(), depth + 1));
				}
			}
			levels[depth].push(id);
		}
		levels
	}
}
