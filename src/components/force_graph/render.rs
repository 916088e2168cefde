use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;

const BACKGROUND: &str = "#ffffff";
const LINK_COLOR: &str = "#E5E5E5";
const LINK_WIDTH: f64 = 1.0;
const SELECTED_STROKE: &str = "black";
const SELECTED_WIDTH: f64 = 3.0;
const LABEL_FONT: &str = "15px sans-serif";

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = (state.viewport.width, state.viewport.height);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);

	let t = state.viewport.transform();
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	draw_labels(state, ctx);
	ctx.restore();
}

fn draw_links(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(LINK_COLOR);
	ctx.set_line_width(LINK_WIDTH);
	ctx.begin_path();
	for (from, to) in state.link_segments() {
		ctx.move_to(from.x, from.y);
		ctx.line_to(to.x, to.y);
	}
	ctx.stroke();
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	for (idx, node) in state.nodes().iter().enumerate() {
		let p = state.position(idx);
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, node.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&node.color);
		ctx.fill();
	}

	// Stroke last so neighbours never paint over the highlight.
	if let Some(idx) = state.selected() {
		let p = state.position(idx);
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, state.nodes()[idx].radius, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(SELECTED_STROKE);
		ctx.set_line_width(SELECTED_WIDTH);
		ctx.stroke();
	}
}

fn draw_labels(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("black");
	ctx.set_font(LABEL_FONT);
	for (idx, node) in state.nodes().iter().enumerate() {
		if let Some(label) = &node.attributes.label {
			let anchor = state.label_anchor(idx);
			let _ = ctx.fill_text(label, anchor.x, anchor.y);
		}
	}
}
