use std::collections::HashMap;

use log::debug;

use super::types::{GraphData, NodeAttributes};
use super::viewport::Viewport;
use crate::config::{DatasetConfig, LayoutConfig, ViewportConfig};
use crate::error::GraphError;
use crate::physics::{Pin, Simulation, Spring, Vec2, decay_for_steps};

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Pointer travel, in screen pixels, that turns a press into a drag rather than a click.
pub const CLICK_DISTANCE: f64 = 3.0;
/// Label offset from its node, in world units.
pub const LABEL_OFFSET: Vec2 = Vec2::new(15.0, 4.0);

#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub color: String,
	pub radius: f64,
	pub attributes: NodeAttributes,
}

/// Rows shown in the info panel for the selected node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetails {
	pub rows: Vec<(String, String)>,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

pub struct ForceGraphState {
	pub viewport: Viewport,
	pub drag: DragState,
	pub pan: PanState,
	nodes: Vec<NodeInfo>,
	edges: Vec<(usize, usize)>,
	simulation: Simulation,
	selected: Option<usize>,
	info_fields: Vec<(String, String)>,
	decay_input_scale: f64,
	drag_alpha_target: f64,
	alpha_min: f64,
}

impl ForceGraphState {
	pub fn new(
		data: &GraphData,
		dataset: &DatasetConfig,
		layout: &LayoutConfig,
		viewport: &ViewportConfig,
		width: f64,
		height: f64,
	) -> Result<Self, GraphError> {
		let mut id_to_idx = HashMap::with_capacity(data.nodes.len());
		let mut nodes = Vec::with_capacity(data.nodes.len());

		for (i, node) in data.nodes.iter().enumerate() {
			if id_to_idx.insert(node.key.clone(), i).is_some() {
				return Err(GraphError::DuplicateNode(node.key.clone()));
			}
			let color = node
				.attributes
				.color
				.clone()
				.unwrap_or_else(|| COLORS[i % COLORS.len()].into());
			let radius = (node.attributes.size.unwrap_or(0.0) + dataset.size_offset).max(1.0);
			nodes.push(NodeInfo {
				color,
				radius,
				attributes: node.attributes.clone(),
			});
		}

		let mut springs = Vec::with_capacity(data.links.len());
		for (link_idx, link) in data.links.iter().enumerate() {
			let resolve = |key: &String| {
				id_to_idx.get(key).copied().ok_or_else(|| GraphError::UnknownNode {
					link: link_idx,
					key: key.clone(),
				})
			};
			springs.push(Spring {
				source: resolve(&link.source)?,
				target: resolve(&link.target)?,
				weight: link.weight,
			});
		}

		let simulation = Simulation::new(nodes.len(), &springs, layout, width, height)?;

		Ok(Self {
			viewport: Viewport::new(width, height, viewport),
			drag: DragState::default(),
			pan: PanState::default(),
			edges: springs.iter().map(|s| (s.source, s.target)).collect(),
			nodes,
			simulation,
			selected: None,
			info_fields: dataset
				.info_fields
				.iter()
				.map(|field| (field.label.clone(), field.key.clone()))
				.collect(),
			decay_input_scale: dataset.decay_input_scale,
			drag_alpha_target: layout.drag_alpha_target,
			alpha_min: layout.alpha_min,
		})
	}

	pub fn nodes(&self) -> &[NodeInfo] {
		&self.nodes
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub fn position(&self, idx: usize) -> Vec2 {
		self.simulation.bodies()[idx].position
	}

	pub fn pin(&self, idx: usize) -> Pin {
		self.simulation.bodies()[idx].pin
	}

	/// Runs one layout step if the simulation is live, then clamps every node into the viewport.
	pub fn tick(&mut self) -> bool {
		let running = self.simulation.is_running();
		if running {
			self.simulation.step();
			self.clamp_to_viewport();
		}
		running
	}

	/// Writes viewport-clamped positions back into the simulation.
	pub fn clamp_to_viewport(&mut self) {
		let viewport = &self.viewport;
		for body in self.simulation.bodies_mut() {
			body.position = viewport.clamp(body.position);
		}
	}

	/// Drawn segment for every link, from the current clamped positions.
	pub fn link_segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
		let bodies = self.simulation.bodies();
		self.edges
			.iter()
			.map(move |&(src, tgt)| (bodies[src].position, bodies[tgt].position))
	}

	pub fn label_anchor(&self, idx: usize) -> Vec2 {
		self.position(idx) + LABEL_OFFSET
	}

	/// Topmost node whose circle contains the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let point = self.viewport.screen_to_world(sx, sy);
		let bodies = self.simulation.bodies();
		(0..self.nodes.len())
			.rev()
			.find(|&idx| bodies[idx].position.distance(point) <= self.nodes[idx].radius)
	}

	pub fn begin_drag(&mut self, idx: usize, sx: f64, sy: f64) {
		self.simulation.set_alpha_target(self.drag_alpha_target);
		self.simulation.restart();
		let current = self.position(idx);
		self.simulation.pin(idx, current);
		self.drag = DragState {
			node_idx: Some(idx),
			start_x: sx,
			start_y: sy,
			moved: false,
		};
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(idx) = self.drag.node_idx else {
			return;
		};
		let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
		if !self.drag.moved && dx * dx + dy * dy < CLICK_DISTANCE * CLICK_DISTANCE {
			return;
		}
		self.drag.moved = true;
		let point = self.viewport.clamp(self.viewport.screen_to_world(sx, sy));
		self.simulation.pin(idx, point);
	}

	/// Releases the dragged node where it is. Returns it when the press never moved,
	/// which the caller treats as a click.
	pub fn end_drag(&mut self) -> Option<usize> {
		let idx = self.drag.node_idx.take()?;
		self.simulation.set_alpha_target(0.0);
		let anchor = match self.pin(idx) {
			Pin::Pinned(point) => point,
			Pin::Free => self.position(idx),
		};
		self.simulation.pin(idx, self.viewport.clamp(anchor));
		let clicked = !self.drag.moved;
		self.drag.moved = false;
		clicked.then_some(idx)
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.node_idx.is_some()
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		let t = self.viewport.transform();
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: t.x,
			transform_start_y: t.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if !self.pan.active {
			return;
		}
		self.viewport.set_translation(
			self.pan.transform_start_x + (sx - self.pan.start_x),
			self.pan.transform_start_y + (sy - self.pan.start_y),
		);
	}

	/// Ends any pointer gesture; returns the clicked node, if the gesture was a click.
	pub fn release_pointer(&mut self) -> Option<usize> {
		self.pan.active = false;
		self.end_drag()
	}

	/// Highlights `idx` alone and returns its info panel rows.
	pub fn select(&mut self, idx: usize) -> NodeDetails {
		self.selected = Some(idx);
		let attributes = &self.nodes[idx].attributes;
		let position = self.position(idx);

		let mut rows = vec![
			("Label".to_string(), attributes.label_text()),
			("Color".to_string(), attributes.color_text()),
			("Size".to_string(), attributes.size_text()),
		];
		rows.extend(
			self.info_fields
				.iter()
				.map(|(label, key)| (label.clone(), attributes.field_text(key))),
		);
		rows.push(("X".to_string(), position.x.to_string()));
		rows.push(("Y".to_string(), position.y.to_string()));

		NodeDetails { rows }
	}

	pub fn clear_selection(&mut self) {
		self.selected = None;
	}

	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	pub fn is_selected(&self, idx: usize) -> bool {
		self.selected == Some(idx)
	}

	/// Applies a raw decay input and restarts the layout from full energy.
	/// Returns the resulting step target.
	pub fn apply_decay_input(&mut self, raw: f64) -> Result<f64, GraphError> {
		let steps = raw * self.decay_input_scale;
		let decay = decay_for_steps(steps, self.alpha_min)?;
		debug!("alpha decay {decay:.5} for {steps} steps");
		self.simulation.set_alpha_decay(decay);
		self.simulation.set_alpha(1.0);
		self.simulation.restart();
		Ok(steps)
	}

	/// Adopts a new surface size: recentres the layout and pulls nodes inside the new bounds.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
		self.simulation.set_center(self.viewport.center());
		self.clamp_to_viewport();
		self.simulation.restart();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{GraphLink, GraphNode};

	fn node(key: &str, size: f64) -> GraphNode {
		let mut attributes = NodeAttributes {
			label: Some(format!("Node {key}")),
			color: Some("#336699".into()),
			size: Some(size),
			..NodeAttributes::default()
		};
		attributes.extra.insert("0".into(), "Aula 3".into());
		GraphNode {
			key: key.into(),
			attributes,
		}
	}

	fn link(source: &str, target: &str) -> GraphLink {
		GraphLink {
			source: source.into(),
			target: target.into(),
			weight: 1.0,
		}
	}

	fn chain(n: usize) -> GraphData {
		GraphData {
			nodes: (0..n).map(|i| node(&i.to_string(), 2.0)).collect(),
			links: (1..n).map(|i| link(&(i - 1).to_string(), &i.to_string())).collect(),
		}
	}

	fn state(data: &GraphData) -> ForceGraphState {
		ForceGraphState::new(
			data,
			&DatasetConfig::school(),
			&LayoutConfig::default(),
			&ViewportConfig::default(),
			400.0,
			300.0,
		)
		.expect("valid graph")
	}

	#[test]
	fn positions_stay_in_viewport_after_every_tick() {
		let mut s = state(&chain(60));
		while s.tick() {
			for idx in 0..s.nodes().len() {
				let p = s.position(idx);
				assert!((0.0..=400.0).contains(&p.x) && (0.0..=300.0).contains(&p.y));
			}
		}
	}

	#[test]
	fn link_segments_follow_clamped_endpoints() {
		let mut s = state(&chain(8));
		for _ in 0..5 {
			s.tick();
		}
		for ((a, b), &(src, tgt)) in s.link_segments().zip(&s.edges) {
			assert_eq!(a, s.position(src));
			assert_eq!(b, s.position(tgt));
		}
		assert_eq!(s.label_anchor(0), s.position(0) + LABEL_OFFSET);
	}

	#[test]
	fn unknown_link_endpoint_is_rejected() {
		let mut data = chain(3);
		data.links.push(link("2", "ghost"));

		let err = ForceGraphState::new(
			&data,
			&DatasetConfig::school(),
			&LayoutConfig::default(),
			&ViewportConfig::default(),
			400.0,
			300.0,
		)
		.err();
		assert_eq!(
			err,
			Some(GraphError::UnknownNode {
				link: 2,
				key: "ghost".into()
			})
		);
	}

	#[test]
	fn duplicate_keys_are_rejected() {
		let mut data = chain(2);
		data.nodes.push(node("1", 1.0));
		let err = ForceGraphState::new(
			&data,
			&DatasetConfig::eurosis(),
			&LayoutConfig::default(),
			&ViewportConfig::default(),
			400.0,
			300.0,
		)
		.err();
		assert_eq!(err, Some(GraphError::DuplicateNode("1".into())));
	}

	#[test]
	fn radius_adds_dataset_offset() {
		let s = state(&chain(2));
		assert_eq!(s.nodes()[0].radius, 12.0);
	}

	#[test]
	fn selecting_b_clears_a() {
		let mut s = state(&chain(3));
		s.select(0);
		s.select(1);

		assert!(s.is_selected(1));
		assert!(!s.is_selected(0));
		assert_eq!(s.selected(), Some(1));
	}

	#[test]
	fn details_list_dataset_fields_and_coordinates() {
		let mut s = state(&chain(2));
		let details = s.select(0);
		let p = s.position(0);

		let labels: Vec<&str> = details.rows.iter().map(|(label, _)| label.as_str()).collect();
		assert_eq!(labels, ["Label", "Color", "Size", "Ubicacion", "Sexo", "X", "Y"]);
		assert_eq!(details.rows[3].1, "Aula 3");
		assert_eq!(details.rows[4].1, "undefined");
		assert_eq!(details.rows[5].1, p.x.to_string());
	}

	#[test]
	fn press_without_motion_is_a_click_and_pins() {
		let mut s = state(&chain(3));
		let at = s.viewport.world_to_screen(s.position(1));

		s.begin_drag(1, at.x, at.y);
		s.drag_to(at.x + 1.0, at.y);
		assert_eq!(s.release_pointer(), Some(1));
		assert!(matches!(s.pin(1), Pin::Pinned(_)));
	}

	#[test]
	fn dragged_node_stays_pinned_at_release_point() {
		let mut s = state(&chain(10));
		for _ in 0..10 {
			s.tick();
		}
		let at = s.viewport.world_to_screen(s.position(4));

		s.begin_drag(4, at.x, at.y);
		assert_eq!(s.simulation().alpha_target(), 0.3);
		s.drag_to(at.x + 50.0, at.y + 50.0);
		s.drag_to(120.0, 80.0);
		s.tick();
		assert_eq!(s.release_pointer(), None);
		assert_eq!(s.simulation().alpha_target(), 0.0);

		let release = Vec2::new(120.0, 80.0);
		assert_eq!(s.pin(4), Pin::Pinned(release));
		while s.tick() {}
		assert_eq!(s.position(4), release);
	}

	#[test]
	fn decay_input_restarts_from_full_energy() {
		let mut s = state(&chain(5));
		while s.tick() {}
		assert!(s.simulation().alpha() < 0.001);

		let steps = s.apply_decay_input(5.0).expect("positive input");
		assert_eq!(steps, 50.0);
		assert_eq!(s.simulation().alpha(), 1.0);
		assert!(s.simulation().is_running());

		let decay = s.simulation().alpha_decay();
		assert!(s.apply_decay_input(0.0).is_err());
		assert_eq!(s.simulation().alpha_decay(), decay);
	}

	#[test]
	fn node_hit_test_uses_radius_and_transform() {
		let mut s = state(&chain(1));
		let p = s.position(0);
		assert_eq!(s.node_at_position(p.x + 5.0, p.y), Some(0));

		s.viewport.zoom_at(0.0, 0.0, 2.0);
		let screen = s.viewport.world_to_screen(p);
		assert_eq!(s.node_at_position(screen.x + 20.0, screen.y), Some(0));
		assert_eq!(s.node_at_position(screen.x + 30.0, screen.y), None);
	}

	#[test]
	fn background_drag_pans_by_pointer_delta() {
		let mut s = state(&chain(2));
		s.viewport.set_translation(5.0, 5.0);

		s.begin_pan(10.0, 10.0);
		s.pan_to(40.0, -5.0);
		let t = s.viewport.transform();
		assert_eq!((t.x, t.y), (35.0, -10.0));

		assert_eq!(s.release_pointer(), None);
		s.pan_to(100.0, 100.0);
		assert_eq!(s.viewport.transform().x, 35.0);
	}

	#[test]
	fn resize_recenters_and_reclamps() {
		let mut s = state(&chain(8));
		while s.tick() {}

		s.resize(200.0, 150.0);
		assert_eq!(s.viewport.center(), Vec2::new(100.0, 75.0));
		assert!(s.simulation().is_running());
		for idx in 0..s.nodes().len() {
			let p = s.position(idx);
			assert!((0.0..=200.0).contains(&p.x) && (0.0..=150.0).contains(&p.y));
		}

		while s.tick() {}
		let mean = (0..s.nodes().len()).fold(Vec2::ZERO, |sum, idx| sum + s.position(idx))
			/ s.nodes().len() as f64;
		assert!(mean.distance(Vec2::new(100.0, 75.0)) < 40.0, "mean {mean:?}");
	}
}
