//! The JSON shape a map is stored and exchanged in.
//!
//! Each node record carries its `parent` and `children`, and the document
//! repeats every edge in `connections`. All three are checked against each
//! other on load; a document that disagrees with itself is rejected rather
//! than half-loaded.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::{MapError, Result};
use super::graph::{MapMetadata, MindMap};
use super::types::{Connection, Node, NodeId};

/// A node as stored: its own fields plus both ends of its structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
	/// The node itself, flattened into the record.
	#[serde(flatten)]
	pub node: Node,
	/// `None` for roots.
	#[serde(default)]
	pub parent: Option<NodeId>,
	/// Ordered child ids.
	#[serde(default)]
	pub children: Vec<NodeId>,
}

/// Top-level stored object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
	/// Records keyed by node id, in creation order.
	pub nodes: IndexMap<String, NodeRecord>,
	/// Every parent-to-child edge; may be omitted on input.
	#[serde(default)]
	pub connections: Vec<Connection>,
	/// Title and description.
	#[serde(default)]
	pub metadata: MapMetadata,
}

impl From<MindMap> for MapDocument {
	fn from(map: MindMap) -> Self {
		let (nodes, children) = map.parts();
		let parents: HashMap<&NodeId, &NodeId> = children
			.iter()
			.flat_map(|(parent, kids)| kids.iter().map(move |kid| (kid, parent)))
			.collect();
		let records = nodes
			.iter()
			.map(|(id, node)| {
				let record = NodeRecord {
					node: node.clone(),
					parent: parents.get(id).map(|p| (*p).clone()),
					children: map.children_of(id).to_vec(),
				};
				(id.as_str().to_owned(), record)
			})
			.collect();
		MapDocument {
			nodes: records,
			connections: map.connections(),
			metadata: map.metadata.clone(),
		}
	}
}

impl TryFrom<MapDocument> for MindMap {
	type Error = MapError;

	fn try_from(doc: MapDocument) -> Result<Self> {
		let mut parents: HashMap<NodeId, Option<NodeId>> = HashMap::new();
		let mut nodes = IndexMap::with_capacity(doc.nodes.len());
		let mut children = HashMap::with_capacity(doc.nodes.len());
		for (key, record) in doc.nodes {
			if key != record.node.id.as_str() {
				return Err(MapError::KeyMismatch {
					key,
					id: record.node.id,
				});
			}
			let id = record.node.id.clone();
			parents.insert(id.clone(), record.parent);
			children.insert(id.clone(), record.children);
			nodes.insert(id, record.node);
		}

		let mut listed = HashSet::new();
		for (parent, kids) in &children {
			for kid in kids {
				let Some(actual) = parents.get(kid) else {
					return Err(MapError::DanglingReference {
						node: parent.clone(),
						role: "child",
						missing: kid.clone(),
					});
				};
				if actual.as_ref() != Some(parent) {
					return Err(MapError::ParentMismatch {
						child: kid.clone(),
						listed: parent.clone(),
						actual: actual.clone(),
					});
				}
				if !listed.insert(kid.clone()) {
					return Err(MapError::DuplicateChild(kid.clone()));
				}
			}
		}

		for (child, parent) in &parents {
			let Some(parent) = parent else { continue };
			if !nodes.contains_key(parent) {
				return Err(MapError::DanglingReference {
					node: child.clone(),
					role: "parent",
					missing: parent.clone(),
				});
			}
			if !listed.contains(child) {
				return Err(MapError::NotListed {
					child: child.clone(),
					parent: parent.clone(),
				});
			}
		}

		// every parent chain must end at a root within `len` steps
		for start in parents.keys() {
			let mut cursor = start;
			for _ in 0..=parents.len() {
				match parents.get(cursor).and_then(Option::as_ref) {
					Some(next) if next == start => return Err(MapError::Cycle(start.clone())),
					Some(next) => cursor = next,
					None => break,
				}
			}
		}

		for conn in &doc.connections {
			let matches = children.get(&conn.from).is_some_and(|kids| kids.contains(&conn.to));
			if !matches {
				return Err(MapError::ConnectionMismatch {
					from: conn.from.clone(),
					to: conn.to.clone(),
				});
			}
		}

		Ok(MindMap::from_parts(nodes, children, doc.metadata))
	}
}

impl MindMap {
	/// Parses and validates a stored or received document.
	pub fn from_json(json: &str) -> Result<MindMap> {
		let doc: MapDocument = serde_json::from_str(json)?;
		MindMap::try_from(doc)
	}

	/// Pretty-printed document JSON.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(&MapDocument::from(self.clone()))?)
	}
}
