//! World/screen transforms.
//!
//! A single affine map is used everywhere: `screen = (world + pan) * zoom`.
//! Pan is therefore expressed in world units and scales with the content.

use super::types::{Node, Point, Size};

/// Smallest zoom any operation can reach.
pub const MIN_ZOOM: f64 = 0.2;
/// Largest zoom any operation can reach.
pub const MAX_ZOOM: f64 = 3.0;
/// Additive zoom change for one wheel notch or toolbar press.
pub const ZOOM_STEP: f64 = 0.1;
/// Screen-space padding kept around content by [`fit`].
pub const FIT_MARGIN: f64 = 50.0;
/// Fit never magnifies beyond this, so tiny maps are not blown up.
pub const MAX_FIT_ZOOM: f64 = 1.5;

/// Axis-aligned world-space box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Top-left corner.
	pub min: Point,
	/// Bottom-right corner.
	pub max: Point,
}

impl Bounds {
	/// Box around `position ± size / 2` of every node, `None` when empty.
	pub fn around<'a>(nodes: impl Iterator<Item = &'a Node>) -> Option<Self> {
		nodes.fold(None, |acc: Option<Bounds>, node| {
			let (hw, hh) = node.half_extent();
			let b = Bounds {
				min: Point::new(node.position.x - hw, node.position.y - hh),
				max: Point::new(node.position.x + hw, node.position.y + hh),
			};
			Some(match acc {
				Some(a) => a.union(b),
				None => b,
			})
		})
	}

	/// Smallest box holding both.
	pub fn union(self, other: Bounds) -> Bounds {
		Bounds {
			min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
			max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
		}
	}

	/// Horizontal extent.
	pub fn width(&self) -> f64 {
		self.max.x - self.min.x
	}

	/// Vertical extent.
	pub fn height(&self) -> f64 {
		self.max.y - self.min.y
	}

	/// Midpoint.
	pub fn center(&self) -> Point {
		Point::new(
			(self.min.x + self.max.x) / 2.0,
			(self.min.y + self.max.y) / 2.0,
		)
	}
}

/// Zoom and pan of the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Scale factor, kept within [`MIN_ZOOM`]..=[`MAX_ZOOM`] by the setters.
	pub zoom: f64,
	/// Offset in world units, applied before scaling.
	pub pan: Point,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			zoom: 1.0,
			pan: Point::default(),
		}
	}
}

impl Viewport {
	/// Canvas pixel of a world point.
	pub fn world_to_screen(&self, world: Point) -> Point {
		Point::new(
			world.x * self.zoom + self.pan.x * self.zoom,
			world.y * self.zoom + self.pan.y * self.zoom,
		)
	}

	/// World point under a canvas pixel.
	pub fn screen_to_world(&self, screen: Point) -> Point {
		Point::new(
			screen.x / self.zoom - self.pan.x,
			screen.y / self.zoom - self.pan.y,
		)
	}

	/// Sets zoom, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`]. Pan is left alone,
	/// so the focal point is not preserved.
	pub fn set_zoom(&mut self, zoom: f64) {
		self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
	}

	/// Adds `delta` to the zoom, clamped.
	pub fn zoom_by(&mut self, delta: f64) {
		self.set_zoom(self.zoom + delta);
	}

	/// One [`ZOOM_STEP`] in.
	pub fn zoom_in(&mut self) {
		self.zoom_by(ZOOM_STEP);
	}

	/// One [`ZOOM_STEP`] out.
	pub fn zoom_out(&mut self) {
		self.zoom_by(-ZOOM_STEP);
	}

	/// Wheel down zooms out, wheel up zooms in.
	pub fn wheel(&mut self, delta_y: f64) {
		if delta_y > 0.0 {
			self.zoom_out();
		} else if delta_y < 0.0 {
			self.zoom_in();
		}
	}

	/// Moves the content by a screen-space delta; speed is independent of zoom.
	pub fn pan_by_screen(&mut self, delta: Point) {
		self.pan.x += delta.x / self.zoom;
		self.pan.y += delta.y / self.zoom;
	}

	/// Zoom 1, no pan.
	pub fn reset(&mut self) {
		*self = Viewport::default();
	}

	/// Viewport at `zoom` that puts world point `center` in the middle of
	/// `target`.
	pub fn centered_on(center: Point, target: Size, zoom: f64) -> Viewport {
		Viewport {
			zoom,
			pan: Point::new(
				target.width / 2.0 / zoom - center.x,
				target.height / 2.0 / zoom - center.y,
			),
		}
	}

	/// Interactive fit: [`fit`] with the result kept inside the zoom range.
	pub fn fit_to_view(&mut self, bounds: Bounds, target: Size) {
		let fitted = fit(bounds, target, FIT_MARGIN, MAX_FIT_ZOOM);
		*self = Viewport::centered_on(
			bounds.center(),
			target,
			fitted.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
		);
	}
}

/// Viewport that fits `bounds` into a `target` canvas with `margin` pixels
/// on every side, zoom capped at `max_zoom`. Shared by the on-screen
/// fit-to-view and the offscreen export.
pub fn fit(bounds: Bounds, target: Size, margin: f64, max_zoom: f64) -> Viewport {
	let avail_w = (target.width - 2.0 * margin).max(1.0);
	let avail_h = (target.height - 2.0 * margin).max(1.0);
	let zoom = (avail_w / bounds.width().max(1.0))
		.min(avail_h / bounds.height().max(1.0))
		.min(max_zoom);
	Viewport::centered_on(bounds.center(), target, zoom)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::map::types::{NodeId, NodeStyle, Shape};

	fn approx(a: Point, b: Point) -> bool {
		(a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
	}

	#[test]
	fn world_to_screen_applies_pan_before_zoom() {
		let vp = Viewport {
			zoom: 2.0,
			pan: Point::new(50.0, 50.0),
		};
		assert_eq!(
			vp.world_to_screen(Point::new(100.0, 100.0)),
			Point::new(300.0, 300.0)
		);
		assert!(approx(
			vp.screen_to_world(Point::new(300.0, 300.0)),
			Point::new(100.0, 100.0)
		));
	}

	#[test]
	fn zoom_is_clamped() {
		let mut vp = Viewport::default();
		vp.set_zoom(10.0);
		assert_eq!(vp.zoom, MAX_ZOOM);
		for _ in 0..100 {
			vp.wheel(1.0);
		}
		assert_eq!(vp.zoom, MIN_ZOOM);
		vp.wheel(0.0);
		assert_eq!(vp.zoom, MIN_ZOOM);
	}

	#[test]
	fn panning_is_zoom_independent_on_screen() {
		let mut vp = Viewport {
			zoom: 2.5,
			pan: Point::default(),
		};
		let world = Point::new(10.0, 20.0);
		let before = vp.world_to_screen(world);
		vp.pan_by_screen(Point::new(30.0, -15.0));
		let after = vp.world_to_screen(world);
		assert!(approx(after - before, Point::new(30.0, -15.0)));
	}

	#[test]
	fn fit_centres_and_caps_zoom() {
		let bounds = Bounds {
			min: Point::new(0.0, 0.0),
			max: Point::new(100.0, 50.0),
		};
		let target = Size {
			width: 800.0,
			height: 600.0,
		};
		let vp = fit(bounds, target, FIT_MARGIN, MAX_FIT_ZOOM);
		assert_eq!(vp.zoom, MAX_FIT_ZOOM);
		assert!(approx(
			vp.world_to_screen(bounds.center()),
			Point::new(400.0, 300.0)
		));

		let wide = Bounds {
			min: Point::new(-1000.0, 0.0),
			max: Point::new(1000.0, 10.0),
		};
		let vp = fit(wide, target, FIT_MARGIN, MAX_FIT_ZOOM);
		assert!((vp.zoom - 700.0 / 2000.0).abs() < 1e-12);
		let left = vp.world_to_screen(wide.min);
		assert!((left.x - FIT_MARGIN).abs() < 1e-9);
	}

	#[test]
	fn interactive_fit_respects_min_zoom() {
		let huge = Bounds {
			min: Point::new(0.0, 0.0),
			max: Point::new(100_000.0, 100.0),
		};
		let mut vp = Viewport::default();
		vp.fit_to_view(
			huge,
			Size {
				width: 800.0,
				height: 600.0,
			},
		);
		assert_eq!(vp.zoom, MIN_ZOOM);
	}

	#[test]
	fn bounds_cover_node_extents() {
		let style = NodeStyle::from_palette(0, Shape::Rectangle);
		let size = Size {
			width: 20.0,
			height: 10.0,
		};
		let nodes = [
			Node::new(NodeId::from("a"), "", Point::new(0.0, 0.0), size, style.clone()),
			Node::new(NodeId::from("b"), "", Point::new(100.0, 50.0), size, style),
		];
		let b = Bounds::around(nodes.iter()).expect("non-empty");
		assert_eq!(b.min, Point::new(-10.0, -5.0));
		assert_eq!(b.max, Point::new(110.0, 55.0));
		assert!(Bounds::around(std::iter::empty()).is_none());
	}
}
