use serde::Deserialize;
use serde_json::{Map, Value};

/// Placeholder shown for attributes a node does not carry.
pub const MISSING_VALUE: &str = "undefined";

/// Attribute bag of a node as exported by the graph tool.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct NodeAttributes {
	/// Display name.
	pub label: Option<String>,
	/// CSS fill color.
	pub color: Option<String>,
	/// Base radius before the dataset offset.
	pub size: Option<f64>,
	/// Dataset-specific fields such as `"0"`, `"1"` or `"2"`.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

impl NodeAttributes {
	pub fn label_text(&self) -> String {
		self.label.clone().unwrap_or_else(|| MISSING_VALUE.into())
	}

	pub fn color_text(&self) -> String {
		self.color.clone().unwrap_or_else(|| MISSING_VALUE.into())
	}

	pub fn size_text(&self) -> String {
		self.size
			.map(|size| size.to_string())
			.unwrap_or_else(|| MISSING_VALUE.into())
	}

	/// Display text for a dataset-specific field.
	pub fn field_text(&self, key: &str) -> String {
		match self.extra.get(key) {
			None | Some(Value::Null) => MISSING_VALUE.into(),
			Some(Value::String(text)) => text.clone(),
			Some(other) => other.to_string(),
		}
	}
}

/// One entry of the nodes file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GraphNode {
	/// Unique key referenced by links.
	pub key: String,
	/// Display attributes.
	#[serde(default)]
	pub attributes: NodeAttributes,
}

fn default_weight() -> f64 {
	1.0
}

/// One entry of the edges file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GraphLink {
	/// Key of the source node.
	pub source: String,
	/// Key of the target node.
	pub target: String,
	/// Relative attraction strength.
	#[serde(default = "default_weight")]
	pub weight: f64,
}

/// Nodes and links of one dataset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// All nodes.
	pub nodes: Vec<GraphNode>,
	/// All links.
	pub links: Vec<GraphLink>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nodes_keep_dataset_fields() {
		let nodes: Vec<GraphNode> = serde_json::from_str(
			r##"[{ "key": "1", "attributes": { "label": "Ana", "color": "#ff0000", "size": 4, "0": "North", "1": 2 } }]"##,
		)
		.expect("valid nodes");

		let attributes = &nodes[0].attributes;
		assert_eq!(attributes.label_text(), "Ana");
		assert_eq!(attributes.size_text(), "4");
		assert_eq!(attributes.field_text("0"), "North");
		assert_eq!(attributes.field_text("1"), "2");
	}

	#[test]
	fn missing_attributes_read_as_undefined() {
		let nodes: Vec<GraphNode> = serde_json::from_str(r#"[{ "key": "a" }]"#).expect("valid nodes");

		let attributes = &nodes[0].attributes;
		assert_eq!(attributes.label_text(), MISSING_VALUE);
		assert_eq!(attributes.color_text(), MISSING_VALUE);
		assert_eq!(attributes.size_text(), MISSING_VALUE);
		assert_eq!(attributes.field_text("2"), MISSING_VALUE);
	}

	#[test]
	fn links_default_weight_and_ignore_extra_fields() {
		let links: Vec<GraphLink> = serde_json::from_str(
			r#"[{ "source": "a", "target": "b" }, { "key": "e1", "source": "b", "target": "c", "weight": 2.5 }]"#,
		)
		.expect("valid links");

		assert_eq!(links[0].weight, 1.0);
		assert_eq!(links[1].weight, 2.5);
	}
}
