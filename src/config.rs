//! Layout, viewport and per-dataset settings.
//!
//! Defaults reproduce the two bundled datasets. A page may override any of it with a
//! `<script type="application/json" id="graph-config">` block.

use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

const CONFIG_ELEMENT_ID: &str = "graph-config";

/// Force and cooling parameters for [`crate::physics::Simulation`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
	/// Rest length of link springs.
	pub link_distance: f64,
	/// Many-body strength per node; negative repels.
	pub charge_strength: f64,
	/// Barnes–Hut opening angle.
	pub theta: f64,
	/// Distance below which charge stops growing.
	pub distance_min: f64,
	/// How much of the mean offset the centering force removes per step.
	pub center_strength: f64,
	/// Collision radius of every node.
	pub collide_radius: f64,
	/// Fraction of an overlap resolved per step.
	pub collide_strength: f64,
	/// Target of the horizontal axis spring.
	pub axis_target_x: f64,
	/// Target of the vertical axis spring.
	pub axis_target_y: f64,
	/// Strength of both axis springs.
	pub axis_strength: f64,
	/// Fraction of velocity lost per step.
	pub velocity_decay: f64,
	/// Alpha below which stepping stops.
	pub alpha_min: f64,
	/// Steps alpha takes to cool from 1 to `alpha_min` at startup.
	pub decay_steps: f64,
	/// Alpha target held while a node is dragged.
	pub drag_alpha_target: f64,
	/// Seed for initial placement and tie-breaking jiggle.
	pub seed: u64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			link_distance: 30.0,
			charge_strength: -50.0,
			theta: 0.9,
			distance_min: 1.0,
			center_strength: 1.0,
			collide_radius: 20.0,
			collide_strength: 1.0,
			axis_target_x: 0.0,
			axis_target_y: 0.0,
			axis_strength: 0.1,
			velocity_decay: 0.4,
			alpha_min: 0.001,
			decay_steps: 30.0,
			drag_alpha_target: 0.3,
			seed: 0x5eed,
		}
	}
}

/// Drawing surface and zoom behaviour.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
	/// Share of the window each canvas dimension takes.
	pub size_fraction: f64,
	/// Smallest zoom factor.
	pub min_scale: f64,
	/// Largest zoom factor.
	pub max_scale: f64,
	/// Length of the reset-zoom animation in milliseconds.
	pub reset_duration_ms: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			size_fraction: 0.8,
			min_scale: 0.5,
			max_scale: 5.0,
			reset_duration_ms: 750.0,
		}
	}
}

/// An extra attribute shown in the info panel.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct InfoField {
	/// Caption shown to the user.
	pub label: String,
	/// Attribute key looked up on the node.
	pub key: String,
}

impl InfoField {
	fn new(label: &str, key: &str) -> Self {
		Self {
			label: label.into(),
			key: key.into(),
		}
	}
}

/// Everything that differs between dataset instances.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DatasetConfig {
	/// Route segment and lookup key.
	pub id: String,
	/// Heading shown above the canvas.
	pub title: String,
	/// URL of the nodes JSON.
	pub nodes_url: String,
	/// URL of the edges JSON.
	pub edges_url: String,
	/// Added to each node's `size` to get its drawn radius.
	#[serde(default)]
	pub size_offset: f64,
	/// Dataset-specific attributes listed in the info panel.
	#[serde(default)]
	pub info_fields: Vec<InfoField>,
	/// Multiplier from the decay input's raw value to a step target.
	#[serde(default = "default_decay_scale")]
	pub decay_input_scale: f64,
	/// Initial raw value of the decay input.
	#[serde(default = "default_decay_input")]
	pub decay_input_default: f64,
}

fn default_decay_scale() -> f64 {
	1.0
}

fn default_decay_input() -> f64 {
	30.0
}

impl DatasetConfig {
	/// The school contact network.
	pub fn school() -> Self {
		Self {
			id: "school".into(),
			title: "School".into(),
			nodes_url: "/data/school/nodes.json".into(),
			edges_url: "/data/school/edges.json".into(),
			size_offset: 10.0,
			info_fields: vec![InfoField::new("Ubicacion", "0"), InfoField::new("Sexo", "1")],
			decay_input_scale: 10.0,
			decay_input_default: 3.0,
		}
	}

	/// The EuroSiS collaboration network.
	pub fn eurosis() -> Self {
		Self {
			id: "eurosis".into(),
			title: "EuroSiS".into(),
			nodes_url: "/data/eurosis/nodes.json".into(),
			edges_url: "/data/eurosis/edges.json".into(),
			size_offset: 0.0,
			info_fields: vec![InfoField::new("Country", "1"), InfoField::new("Info", "2")],
			decay_input_scale: 1.0,
			decay_input_default: 30.0,
		}
	}
}

/// Top-level settings for the app.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
	/// Shared layout parameters.
	pub layout: LayoutConfig,
	/// Shared viewport parameters.
	pub viewport: ViewportConfig,
	/// Available datasets, in display order.
	pub datasets: Vec<DatasetConfig>,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			layout: LayoutConfig::default(),
			viewport: ViewportConfig::default(),
			datasets: vec![DatasetConfig::school(), DatasetConfig::eurosis()],
		}
	}
}

impl AppConfig {
	/// Parses a JSON override; missing sections fall back to defaults.
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Reads the page's config block, falling back to defaults when it is absent or invalid.
	pub fn load() -> Self {
		let Some(text) = config_block_text() else {
			return Self::default();
		};
		match Self::from_json(&text) {
			Ok(config) => {
				info!("graph config: {} datasets from page", config.datasets.len());
				config
			}
			Err(e) => {
				warn!("graph config: ignoring malformed block: {}", e);
				Self::default()
			}
		}
	}

	/// Finds a dataset by id.
	pub fn dataset(&self, id: &str) -> Option<&DatasetConfig> {
		self.datasets.iter().find(|dataset| dataset.id == id)
	}
}

fn config_block_text() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(CONFIG_ELEMENT_ID)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}
