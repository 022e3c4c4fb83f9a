//! Errors raised while loading documents or restructuring the graph.

use super::types::NodeId;

/// Result alias used throughout the model.
pub type Result<T> = std::result::Result<T, MapError>;

/// Why a document was rejected or a move refused.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
	/// Input was not JSON of the document shape.
	#[error(transparent)]
	Json(#[from] serde_json::Error),

	/// An operation named a node the map does not have.
	#[error("Node {0} not found")]
	NodeNotFound(NodeId),

	/// Reparenting would put a node under itself or its own subtree.
	#[error("Moving node {node} under {parent} would make it its own ancestor")]
	WouldCreateCycle {
		/// Node being moved.
		node: NodeId,
		/// Requested parent.
		parent: NodeId,
	},

	/// A record's map key differs from its `id` field.
	#[error("Node stored under key {key} carries id {id}")]
	KeyMismatch {
		/// Key in the `nodes` object.
		key: String,
		/// Id inside the record.
		id: NodeId,
	},

	/// A record points at a node the document does not contain.
	#[error("Node {node} refers to missing {role} {missing}")]
	DanglingReference {
		/// Record holding the reference.
		node: NodeId,
		/// `"child"` or `"parent"`.
		role: &'static str,
		/// Id that does not resolve.
		missing: NodeId,
	},

	/// A child list and the child's `parent` field disagree.
	#[error("Node {child} is listed as a child of {listed} but its parent is {actual:?}")]
	ParentMismatch {
		/// Listed child.
		child: NodeId,
		/// Node whose list contains it.
		listed: NodeId,
		/// The child's own `parent` field.
		actual: Option<NodeId>,
	},

	/// A node names a parent that does not list it.
	#[error("Node {child} names {parent} as parent but is not among its children")]
	NotListed {
		/// Node with the `parent` field.
		child: NodeId,
		/// Parent that omits it.
		parent: NodeId,
	},

	/// The same id appears twice across child lists.
	#[error("Node {0} is listed as a child more than once")]
	DuplicateChild(NodeId),

	/// Following `parent` links from this node returns to it.
	#[error("Node {0} is reachable from itself")]
	Cycle(NodeId),

	/// A stored connection has no matching parent/child pair.
	#[error("Connection {from} -> {to} does not match the parent/child structure")]
	ConnectionMismatch {
		/// Stored parent end.
		from: NodeId,
		/// Stored child end.
		to: NodeId,
	},
}
