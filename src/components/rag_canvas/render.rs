use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{
	DEADLOCK_COLOR, NodeInfo, NodeKind, PROCESS_COLOR, PROCESS_RADIUS, RESOURCE_COLOR,
	RESOURCE_HALF, RagCanvasState,
};

const ALLOCATION_RGB: &str = "100, 180, 255";
const REQUEST_RGB: &str = "110, 220, 140";
const DEADLOCK_RGB: &str = "255, 90, 90";

pub fn render(state: &RagCanvasState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

/// Distance from a node's centre to its outline along the edge direction.
fn node_extent(info: &NodeInfo) -> f64 {
	match info.kind {
		NodeKind::Process => PROCESS_RADIUS,
		NodeKind::Resource => RESOURCE_HALF * 1.2,
	}
}

fn draw_edges(state: &RagCanvasState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);

	state.graph.visit_edges(|n1, n2, _| {
		let (x1, y1, x2, y2) = (n1.x() as f64, n1.y() as f64, n2.x() as f64, n2.y() as f64);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return;
		}
		let (from, to) = (&n1.data.user_data, &n2.data.user_data);

		// Requests run process -> resource and are drawn as flowing dashes.
		let is_request = from.kind == NodeKind::Process;
		let rgb = if from.deadlocked || to.deadlocked {
			DEADLOCK_RGB
		} else if is_request {
			REQUEST_RGB
		} else {
			ALLOCATION_RGB
		};

		ctx.set_stroke_style_str(&format!("rgba({}, 0.8)", rgb));
		ctx.set_line_width(line_width);
		if is_request {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		}

		let (ux, uy) = (dx / dist, dy / dist);
		let (start, end) = (node_extent(from), node_extent(to));
		ctx.begin_path();
		ctx.move_to(x1 + ux * start, y1 + uy * start);
		ctx.line_to(x2 - ux * (end + arrow_size), y2 - uy * (end + arrow_size));
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		ctx.set_fill_style_str(&format!("rgba({}, 0.95)", rgb));
		let (tip_x, tip_y) = (x2 - ux * end, y2 - uy * end);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	});
}

fn draw_nodes(state: &RagCanvasState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let font = format!("{}px sans-serif", 11.0 / k.max(0.5));

	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let fill = match (info.kind, info.deadlocked) {
			(NodeKind::Process, true) => DEADLOCK_COLOR,
			(NodeKind::Process, false) => PROCESS_COLOR,
			(NodeKind::Resource, _) => RESOURCE_COLOR,
		};

		ctx.begin_path();
		match info.kind {
			NodeKind::Process => {
				let _ = ctx.arc(x, y, PROCESS_RADIUS, 0.0, 2.0 * PI);
			}
			NodeKind::Resource => {
				ctx.rect(
					x - RESOURCE_HALF,
					y - RESOURCE_HALF,
					RESOURCE_HALF * 2.0,
					RESOURCE_HALF * 2.0,
				);
			}
		}
		ctx.set_fill_style_str(fill);
		ctx.fill();

		if state.is_selected(info) {
			let ring = node_extent(info) + 4.0 / k;
			ctx.begin_path();
			let _ = ctx.arc(x, y, ring, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str("rgba(140, 150, 255, 0.9)");
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}

		ctx.set_font(&font);
		ctx.set_fill_style_str("white");
		let label_x = x + node_extent(info) + 4.0;
		let _ = ctx.fill_text(&info.label, label_x, y);
		if let Some(detail) = &info.detail {
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.6)");
			let _ = ctx.fill_text(detail, label_x, y + 12.0 / k.max(0.5));
		}
	});
}
