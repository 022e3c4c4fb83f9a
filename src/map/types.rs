//! Node-level value types shared by the graph, layouts and renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fill colours handed out to new nodes, cycled by creation count.
pub const PALETTE: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Label colour of new nodes.
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";
/// Label size of new nodes, in world pixels.
pub const DEFAULT_FONT_SIZE: f64 = 14.0;
/// Default extent of a node created without a parent.
pub const ROOT_SIZE: Size = Size {
	width: 160.0,
	height: 72.0,
};
/// Default extent of a node created under a parent.
pub const CHILD_SIZE: Size = Size {
	width: 130.0,
	height: 52.0,
};

/// Stable identifier of a node for its whole lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
	/// Wraps an id string as-is.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// The raw id.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(s: &str) -> Self {
		Self(s.to_owned())
	}
}

/// A 2D point or vector; world or screen space depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (other.x - self.x, other.y - self.y);
		(dx * dx + dy * dy).sqrt()
	}
}

impl std::ops::Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl std::ops::Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

/// Width and height of a node's bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

/// Node outline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
	/// Circle inscribed in the node box.
	Circle,
	/// Rounded rectangle filling the node box.
	#[default]
	Rectangle,
	/// Ellipse filling the node box.
	Ellipse,
	/// Apex up, base along the bottom edge.
	Triangle,
	/// Rhombus touching the middle of each edge.
	Diamond,
}

impl Shape {
	/// Every shape, in the order the style panel lists them.
	pub const ALL: [Shape; 5] = [
		Shape::Circle,
		Shape::Rectangle,
		Shape::Ellipse,
		Shape::Triangle,
		Shape::Diamond,
	];

	/// Lowercase name, as stored in documents.
	pub fn as_str(self) -> &'static str {
		match self {
			Shape::Circle => "circle",
			Shape::Rectangle => "rectangle",
			Shape::Ellipse => "ellipse",
			Shape::Triangle => "triangle",
			Shape::Diamond => "diamond",
		}
	}

	/// Inverse of [`Shape::as_str`].
	pub fn parse(s: &str) -> Option<Shape> {
		Shape::ALL.into_iter().find(|shape| shape.as_str() == s)
	}
}

/// How a node is drawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
	/// Fill colour, any CSS colour string.
	pub color: String,
	/// Label colour.
	pub text_color: String,
	/// Label size in world pixels.
	pub font_size: f64,
	/// Outline drawn and hit-tested.
	pub shape: Shape,
	/// Icon key drawn left of the label.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub icon: Option<String>,
}

impl NodeStyle {
	/// Palette colour `index` (wrapping), white text.
	pub fn from_palette(index: usize, shape: Shape) -> Self {
		Self {
			color: PALETTE[index % PALETTE.len()].to_owned(),
			text_color: DEFAULT_TEXT_COLOR.to_owned(),
			font_size: DEFAULT_FONT_SIZE,
			shape,
			icon: None,
		}
	}
}

/// What an [`Attachment`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
	/// A URL.
	Link,
	/// A formula in source form.
	Formula,
	/// Free text.
	Note,
}

impl AttachmentKind {
	/// Every kind, in the order the style panel lists them.
	pub const ALL: [AttachmentKind; 3] =
		[AttachmentKind::Link, AttachmentKind::Formula, AttachmentKind::Note];

	/// Lowercase name, as stored in documents.
	pub fn as_str(self) -> &'static str {
		match self {
			AttachmentKind::Link => "link",
			AttachmentKind::Formula => "formula",
			AttachmentKind::Note => "note",
		}
	}

	/// Inverse of [`AttachmentKind::as_str`].
	pub fn parse(s: &str) -> Option<AttachmentKind> {
		AttachmentKind::ALL.into_iter().find(|kind| kind.as_str() == s)
	}
}

/// Side content hung off a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
	/// Stored as `type`.
	#[serde(rename = "type")]
	pub kind: AttachmentKind,
	/// URL, formula source or note text.
	pub content: String,
	/// Optional caption.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
}

/// A mind-map vertex. Structure (parent/children) lives in
/// [`MindMap`](super::MindMap), not here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Key of the node in its map.
	pub id: NodeId,
	/// Label; may span several lines.
	pub text: String,
	/// World coordinates of the node centre.
	pub position: Point,
	/// Extent of the shape's bounding box.
	pub size: Size,
	/// Fill, label and outline.
	pub style: NodeStyle,
	/// Hides the node's descendants when set.
	#[serde(default)]
	pub collapsed: bool,
	/// Links, formulas and notes.
	#[serde(default)]
	pub attachments: Vec<Attachment>,
	/// Free-form notes from the style panel.
	#[serde(default)]
	pub notes: String,
	/// User tags.
	#[serde(default)]
	pub tags: Vec<String>,
}

impl Node {
	/// Expanded node with no attachments, notes or tags.
	pub fn new(
		id: NodeId,
		text: impl Into<String>,
		position: Point,
		size: Size,
		style: NodeStyle,
	) -> Self {
		Self {
			id,
			text: text.into(),
			position,
			size,
			style,
			collapsed: false,
			attachments: Vec::new(),
			notes: String::new(),
			tags: Vec::new(),
		}
	}

	/// Half of the width and height.
	pub fn half_extent(&self) -> (f64, f64) {
		(self.size.width / 2.0, self.size.height / 2.0)
	}

	/// Shape-aware containment test for a world-space point.
	pub fn contains(&self, p: Point) -> bool {
		let (hw, hh) = self.half_extent();
		if hw <= 0.0 || hh <= 0.0 {
			return false;
		}
		let (dx, dy) = (p.x - self.position.x, p.y - self.position.y);
		match self.style.shape {
			Shape::Rectangle => dx.abs() <= hw && dy.abs() <= hh,
			Shape::Ellipse => (dx / hw).powi(2) + (dy / hh).powi(2) <= 1.0,
			Shape::Circle => {
				let r = hw.min(hh);
				dx * dx + dy * dy <= r * r
			}
			Shape::Diamond => dx.abs() / hw + dy.abs() / hh <= 1.0,
			// apex at top centre, base along the bottom edge
			Shape::Triangle => {
				if dy.abs() > hh {
					return false;
				}
				let t = (dy + hh) / (2.0 * hh);
				dx.abs() <= hw * t
			}
		}
	}
}

/// Partial update merged by [`MindMap::update_node`](super::MindMap::update_node).
/// `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePatch {
	/// New label.
	pub text: Option<String>,
	/// New centre.
	pub position: Option<Point>,
	/// New extent; not checked for positivity.
	pub size: Option<Size>,
	/// New fill colour.
	pub color: Option<String>,
	/// New label colour.
	pub text_color: Option<String>,
	/// New label size.
	pub font_size: Option<f64>,
	/// New outline.
	pub shape: Option<Shape>,
	/// `Some(None)` clears the icon.
	pub icon: Option<Option<String>>,
	/// New collapsed flag.
	pub collapsed: Option<bool>,
	/// New notes.
	pub notes: Option<String>,
	/// Replacement tag list.
	pub tags: Option<Vec<String>>,
}

impl NodePatch {
	/// Patch that only relabels.
	pub fn text(text: impl Into<String>) -> Self {
		Self {
			text: Some(text.into()),
			..Self::default()
		}
	}

	/// Patch that only moves.
	pub fn position(position: Point) -> Self {
		Self {
			position: Some(position),
			..Self::default()
		}
	}

	pub(crate) fn apply(self, node: &mut Node) {
		if let Some(text) = self.text {
			node.text = text;
		}
		if let Some(position) = self.position {
			node.position = position;
		}
		if let Some(size) = self.size {
			node.size = size;
		}
		if let Some(color) = self.color {
			node.style.color = color;
		}
		if let Some(text_color) = self.text_color {
			node.style.text_color = text_color;
		}
		if let Some(font_size) = self.font_size {
			node.style.font_size = font_size;
		}
		if let Some(shape) = self.shape {
			node.style.shape = shape;
		}
		if let Some(icon) = self.icon {
			node.style.icon = icon;
		}
		if let Some(collapsed) = self.collapsed {
			node.collapsed = collapsed;
		}
		if let Some(notes) = self.notes {
			node.notes = notes;
		}
		if let Some(tags) = self.tags {
			node.tags = tags;
		}
	}
}

/// Render-time edge from a parent to one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
	/// Parent end.
	pub from: NodeId,
	/// Child end.
	pub to: NodeId,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(shape: Shape) -> Node {
		let style = NodeStyle::from_palette(0, shape);
		Node::new(
			NodeId::from("n"),
			"n",
			Point::new(100.0, 100.0),
			Size {
				width: 100.0,
				height: 60.0,
			},
			style,
		)
	}

	#[test]
	fn rectangle_contains_corners_but_ellipse_does_not() {
		let corner = Point::new(148.0, 128.0);
		assert!(node(Shape::Rectangle).contains(corner));
		assert!(!node(Shape::Ellipse).contains(corner));
		assert!(!node(Shape::Diamond).contains(corner));
	}

	#[test]
	fn triangle_is_narrow_at_the_top() {
		let tri = node(Shape::Triangle);
		assert!(tri.contains(Point::new(100.0, 75.0)));
		assert!(!tri.contains(Point::new(140.0, 75.0)));
		assert!(tri.contains(Point::new(140.0, 129.0)));
	}

	#[test]
	fn circle_uses_smaller_extent() {
		let circle = node(Shape::Circle);
		assert!(circle.contains(Point::new(129.0, 100.0)));
		assert!(!circle.contains(Point::new(140.0, 100.0)));
	}

	#[test]
	fn patch_only_touches_given_fields() {
		let mut n = node(Shape::Rectangle);
		NodePatch {
			font_size: Some(20.0),
			icon: Some(Some("idea".into())),
			..NodePatch::default()
		}
		.apply(&mut n);
		assert_eq!(n.style.font_size, 20.0);
		assert_eq!(n.style.icon.as_deref(), Some("idea"));
		assert_eq!(n.text, "n");
	}

	#[test]
	fn shapes_parse_from_their_names() {
		for shape in Shape::ALL {
			assert_eq!(Shape::parse(shape.as_str()), Some(shape));
		}
		assert_eq!(Shape::parse("hexagon"), None);
		for kind in AttachmentKind::ALL {
			assert_eq!(AttachmentKind::parse(kind.as_str()), Some(kind));
		}
		assert_eq!(AttachmentKind::parse("video"), None);
	}
}
