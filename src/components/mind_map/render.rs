use std::f64::consts::PI;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::state::MindMapState;
use crate::map::viewport::{self, Viewport};
use crate::map::{MindMap, Node, NodeId, Shape, Size};

const BACKGROUND: &str = "#1a1a2e";
const EDGE_COLOR: &str = "rgba(100, 180, 255, 0.6)";
const SELECTION_COLOR: &str = "#ffd166";
/// Corner radius of rectangle nodes, in world pixels.
const CORNER_RADIUS: f64 = 10.0;

pub const EXPORT_SIZE: Size = Size {
	width: 1600.0,
	height: 1200.0,
};
const EXPORT_MARGIN: f64 = 40.0;
const EXPORT_MAX_ZOOM: f64 = 2.0;

/// Icon keys offered in the style panel and the glyph drawn for each.
pub const ICONS: &[(&str, &str)] = &[
	("idea", "💡"),
	("book", "📚"),
	("star", "⭐"),
	("check", "✅"),
	("warning", "⚠️"),
	("question", "❓"),
	("target", "🎯"),
	("clock", "⏰"),
];

fn icon_glyph(key: &str) -> Option<&'static str> {
	ICONS.iter().find(|(k, _)| *k == key).map(|(_, glyph)| *glyph)
}

/// Marks drawn on top of the plain map.
#[derive(Clone, Copy, Default)]
struct Highlights<'a> {
	selected: Option<&'a NodeId>,
	editing: Option<&'a NodeId>,
}

pub fn render(state: &MindMapState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	let marks = Highlights {
		selected: state.selected.as_ref(),
		editing: state.editing().map(|(id, _)| id),
	};
	draw_with(ctx, &state.map, state.viewport, marks);
}

fn draw_with(ctx: &CanvasRenderingContext2d, map: &MindMap, vp: Viewport, marks: Highlights) {
	ctx.save();
	// screen = (world + pan) * zoom
	let _ = ctx.scale(vp.zoom, vp.zoom);
	let _ = ctx.translate(vp.pan.x, vp.pan.y);
	draw_connections(map, ctx, vp.zoom);
	for node in map.visible_nodes() {
		draw_node(map, node, ctx, vp.zoom, marks);
	}
	ctx.restore();
}

fn draw_connections(map: &MindMap, ctx: &CanvasRenderingContext2d, k: f64) {
	ctx.set_stroke_style_str(EDGE_COLOR);
	ctx.set_line_width(2.0 / k.max(0.5));
	for conn in map.visible_connections() {
		let (Some(from), Some(to)) = (map.node(&conn.from), map.node(&conn.to)) else {
			continue;
		};
		ctx.begin_path();
		ctx.move_to(from.position.x, from.position.y);
		ctx.line_to(to.position.x, to.position.y);
		ctx.stroke();
	}
}

fn corner_radius(hw: f64, hh: f64) -> f64 {
	CORNER_RADIUS.min(hw).min(hh).max(0.0)
}

fn trace_rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, hw: f64, hh: f64, r: f64) {
	let (left, right, top, bottom) = (x - hw, x + hw, y - hh, y + hh);
	ctx.move_to(left + r, top);
	let _ = ctx.arc_to(right, top, right, bottom, r);
	let _ = ctx.arc_to(right, bottom, left, bottom, r);
	let _ = ctx.arc_to(left, bottom, left, top, r);
	let _ = ctx.arc_to(left, top, right, top, r);
	ctx.close_path();
}

fn trace_shape(node: &Node, ctx: &CanvasRenderingContext2d, grow: f64) {
	let (x, y) = (node.position.x, node.position.y);
	let (hw, hh) = node.half_extent();
	let (hw, hh) = (hw + grow, hh + grow);
	ctx.begin_path();
	match node.style.shape {
		Shape::Circle => {
			let _ = ctx.arc(x, y, hw.min(hh), 0.0, 2.0 * PI);
		}
		Shape::Ellipse => {
			let _ = ctx.ellipse(x, y, hw, hh, 0.0, 0.0, 2.0 * PI);
		}
		Shape::Rectangle => trace_rounded_rect(ctx, x, y, hw, hh, corner_radius(hw, hh)),
		Shape::Diamond => {
			ctx.move_to(x, y - hh);
			ctx.line_to(x + hw, y);
			ctx.line_to(x, y + hh);
			ctx.line_to(x - hw, y);
			ctx.close_path();
		}
		Shape::Triangle => {
			ctx.move_to(x, y - hh);
			ctx.line_to(x + hw, y + hh);
			ctx.line_to(x - hw, y + hh);
			ctx.close_path();
		}
	}
}

fn draw_node(
	map: &MindMap,
	node: &Node,
	ctx: &CanvasRenderingContext2d,
	k: f64,
	marks: Highlights,
) {
	let (x, y) = (node.position.x, node.position.y);
	let (hw, hh) = node.half_extent();

	trace_shape(node, ctx, 0.0);
	ctx.set_fill_style_str(&node.style.color);
	ctx.fill();

	if marks.selected == Some(&node.id) {
		trace_shape(node, ctx, 4.0 / k);
		ctx.set_stroke_style_str(SELECTION_COLOR);
		ctx.set_line_width(2.0 / k);
		let dash = js_sys::Array::of2(&JsValue::from_f64(6.0 / k), &JsValue::from_f64(4.0 / k));
		let _ = ctx.set_line_dash(&dash);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}

	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	if let Some(glyph) = node.style.icon.as_deref().and_then(icon_glyph) {
		ctx.set_font(&format!("{}px sans-serif", node.style.font_size));
		let _ = ctx.fill_text(glyph, x - hw + node.style.font_size, y);
	}

	if marks.editing != Some(&node.id) {
		ctx.set_fill_style_str(&node.style.text_color);
		ctx.set_font(&format!("{}px sans-serif", node.style.font_size));
		let lines: Vec<&str> = node.text.lines().collect();
		let line_height = node.style.font_size * 1.2;
		let top = y - line_height * (lines.len().saturating_sub(1)) as f64 / 2.0;
		for (i, line) in lines.iter().enumerate() {
			let _ = ctx.fill_text(line, x, top + i as f64 * line_height);
		}
	}

	let hidden = map.hidden_descendant_count(&node.id);
	if hidden > 0 {
		let (bx, by, r) = (x + hw, y, 11.0);
		ctx.begin_path();
		let _ = ctx.arc(bx, by, r, 0.0, 2.0 * PI);
		ctx.set_fill_style_str("#ffffff");
		ctx.fill();
		ctx.set_fill_style_str(BACKGROUND);
		ctx.set_font("11px sans-serif");
		let _ = ctx.fill_text(&format!("+{hidden}"), bx, by);
	}

	if !node.attachments.is_empty() {
		ctx.set_fill_style_str("rgba(255, 255, 255, 0.8)");
		ctx.set_font("11px sans-serif");
		let _ = ctx.fill_text(
			&format!("📎{}", node.attachments.len()),
			x + hw - 12.0,
			y + hh - 8.0,
		);
	}
}

/// Draws the whole map onto an offscreen canvas of [`EXPORT_SIZE`] and
/// returns it as a PNG data URL.
pub fn export_png(map: &MindMap) -> Result<String, JsValue> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| JsValue::from_str("no document"))?;
	let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
	canvas.set_width(EXPORT_SIZE.width as u32);
	canvas.set_height(EXPORT_SIZE.height as u32);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")?
		.ok_or_else(|| JsValue::from_str("no 2d context"))?
		.dyn_into()?;

	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, EXPORT_SIZE.width, EXPORT_SIZE.height);
	if let Some(bounds) = map.bounds() {
		let vp = viewport::fit(bounds, EXPORT_SIZE, EXPORT_MARGIN, EXPORT_MAX_ZOOM);
		draw_with(&ctx, map, vp, Highlights::default());
	}
	canvas.to_data_url()
}
