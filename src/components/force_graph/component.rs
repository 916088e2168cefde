use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::info_panel::InfoPanel;
use super::render;
use super::state::{ForceGraphState, NodeDetails};
use super::types::GraphData;
use crate::config::{DatasetConfig, LayoutConfig, ViewportConfig};
use crate::error::ViewerError;

type FrameSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn surface_size(window: &Window, fraction: f64) -> (f64, f64) {
	let dim = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
	(
		(dim(window.inner_width()) * fraction).floor(),
		(dim(window.inner_height()) * fraction).floor(),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn pointer_position(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	ev: &MouseEvent,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Whether the frame loop should schedule another frame.
fn keep_animating(disposed: &AtomicBool, connected: bool) -> bool {
	connected && !disposed.load(Ordering::Relaxed)
}

/// Drops the frame and resize callbacks, unhooking the resize listener first.
fn detach(window: &Window, animate: &FrameSlot, resize_cb: &FrameSlot) {
	if let Some(cb) = resize_cb.borrow_mut().take() {
		let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
	}
	// The running frame callback is released once it returns.
	let _ = animate.borrow_mut().take();
}

/// Canvas view of one dataset. Stays blank until `data` yields a value.
///
/// The animation loop and resize listener live until the component is disposed.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<Option<GraphData>>,
	dataset: DatasetConfig,
	layout: LayoutConfig,
	viewport: ViewportConfig,
	/// Receives the error when the loaded data cannot be laid out.
	#[prop(optional)]
	on_error: Option<Callback<ViewerError>>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<ForceGraphState>>> = Rc::new(RefCell::new(None));
	let animate: FrameSlot = Rc::new(RefCell::new(None));
	let resize_cb: FrameSlot = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	let disposed = Arc::new(AtomicBool::new(false));
	let disposed_init = disposed.clone();
	on_cleanup(move || disposed.store(true, Ordering::Relaxed));

	let details = RwSignal::new(None::<NodeDetails>);
	let decay_input = RwSignal::new(dataset.decay_input_default.to_string());
	let size_fraction = viewport.size_fraction;

	Effect::new(move |_| {
		let Some(graph) = data.get() else {
			return;
		};
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = surface_size(&window, size_fraction);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = context_2d(&canvas) else {
			error!("canvas has no 2d context");
			return;
		};
		match ForceGraphState::new(&graph, &dataset, &layout, &viewport, w, h) {
			Ok(s) => {
				info!(
					"{}: {} nodes, {} links on a {}x{} surface",
					dataset.id,
					graph.nodes.len(),
					graph.links.len(),
					w,
					h
				);
				*state_init.borrow_mut() = Some(s);
			}
			Err(e) => {
				error!("{}: cannot build graph: {}", dataset.id, e);
				if let Some(on_error) = on_error {
					on_error.run(e.into());
				}
				return;
			}
		}

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = surface_size(&win, size_fraction);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner, resize_inner) =
			(state_init.clone(), animate_init.clone(), resize_cb_init.clone());
		let disposed = disposed_init.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !keep_animating(&disposed, canvas.is_connected()) {
				info!("graph view detached, stopping animation");
				if let Some(win) = web_sys::window() {
					detach(&win, &animate_inner, &resize_inner);
				}
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick();
				s.viewport.advance(js_sys::Date::now());
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			match s.node_at_position(x, y) {
				Some(idx) => s.begin_drag(idx, x, y),
				None => s.begin_pan(x, y),
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.is_dragging() {
				s.drag_to(x, y);
			} else {
				s.pan_to(x, y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if let Some(idx) = s.release_pointer() {
				details.set(Some(s.select(idx)));
			}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			// Leaving the canvas ends the gesture but is never a click.
			let _ = s.release_pointer();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.viewport.zoom_at(x, y, factor);
		}
	};

	let state_reset = state.clone();
	let on_reset_zoom = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_reset.borrow_mut() {
			s.viewport.begin_reset(js_sys::Date::now());
		}
	};

	let state_decay = state.clone();
	let on_apply_decay = move |_: MouseEvent| {
		let raw = decay_input.get_untracked();
		let Ok(value) = raw.trim().parse::<f64>() else {
			warn!("ignoring non-numeric decay input {:?}", raw);
			return;
		};
		if let Some(ref mut s) = *state_decay.borrow_mut() {
			match s.apply_decay_input(value) {
				Ok(steps) => info!("layout restarted, cooling over {} steps", steps),
				Err(e) => warn!("{}", e),
			}
		}
	};

	let state_close = state.clone();
	let on_close_details = move |_: MouseEvent| {
		details.set(None);
		if let Some(ref mut s) = *state_close.borrow_mut() {
			s.clear_selection();
		}
	};

	view! {
		<div class="graph-controls">
			<label>
				"Alpha decay "
				<input
					type="number"
					min="1"
					step="1"
					prop:value=move || decay_input.get()
					on:input=move |ev| decay_input.set(event_target_value(&ev))
				/>
			</label>
			<button on:click=on_apply_decay>"Update"</button>
			<button on:click=on_reset_zoom>"Reset zoom"</button>
		</div>
		<div class="graph-stage">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab; border: 1px solid black;"
			/>
			<div
				class="node-info"
				style:display=move || {
					if details.with(Option::is_some) { "block" } else { "none" }
				}
			>
				<button class="node-info-close" on:click=on_close_details>
					"×"
				</button>
				<InfoPanel details=details />
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn frame_loop_stops_once_disposed_or_detached() {
		let disposed = AtomicBool::new(false);
		assert!(keep_animating(&disposed, true));
		assert!(!keep_animating(&disposed, false));

		disposed.store(true, Ordering::Relaxed);
		assert!(!keep_animating(&disposed, true));
	}
}
