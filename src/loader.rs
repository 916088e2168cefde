//! Fetches a dataset's nodes and edges and joins them once both have arrived.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_net::http::Request;
use leptos::task::spawn_local;
use log::{error, info};
use serde::de::DeserializeOwned;

use crate::components::force_graph::{GraphData, GraphLink, GraphNode};
use crate::config::DatasetConfig;
use crate::error::LoadError;

/// Join point for the two independent fetches. Settles exactly once, with the combined
/// data or with the first failure.
#[derive(Debug, Default)]
pub struct DatasetBarrier {
	nodes: Option<Vec<GraphNode>>,
	links: Option<Vec<GraphLink>>,
	released: bool,
}

impl DatasetBarrier {
	/// Records the nodes; returns the full dataset if the links are already in.
	pub fn offer_nodes(&mut self, nodes: Vec<GraphNode>) -> Option<GraphData> {
		self.nodes = Some(nodes);
		self.try_release()
	}

	/// Records the links; returns the full dataset if the nodes are already in.
	pub fn offer_links(&mut self, links: Vec<GraphLink>) -> Option<GraphData> {
		self.links = Some(links);
		self.try_release()
	}

	/// Records a failed fetch; returns whether it is the one to report.
	pub fn offer_failure(&mut self) -> bool {
		!std::mem::replace(&mut self.released, true)
	}

	fn try_release(&mut self) -> Option<GraphData> {
		if self.released || self.nodes.is_none() || self.links.is_none() {
			return None;
		}
		self.released = true;
		Some(GraphData {
			nodes: self.nodes.take()?,
			links: self.links.take()?,
		})
	}
}

/// GETs `url` and decodes its JSON body.
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, LoadError> {
	let resp = Request::get(url)
		.send()
		.await
		.map_err(|source| LoadError::Request {
			url: url.into(),
			source,
		})?;
	if !resp.ok() {
		return Err(LoadError::Status {
			url: url.into(),
			status: resp.status(),
		});
	}
	let text = resp.text().await.map_err(|source| LoadError::Request {
		url: url.into(),
		source,
	})?;
	serde_json::from_str(&text).map_err(|source| LoadError::Parse {
		url: url.into(),
		source,
	})
}

/// Starts both fetches for `dataset`. `on_done` runs once: with the joined data after
/// both succeed, or with the first failure.
///
/// Failures are logged and never retried.
pub fn load_dataset(dataset: &DatasetConfig, on_done: impl Fn(Result<GraphData, LoadError>) + 'static) {
	let barrier = Rc::new(RefCell::new(DatasetBarrier::default()));
	let on_done = Rc::new(on_done);

	let (nodes_url, barrier_nodes, done_nodes) =
		(dataset.nodes_url.clone(), barrier.clone(), on_done.clone());
	spawn_local(async move {
		let fetched = fetch_json::<Vec<GraphNode>>(&nodes_url).await;
		let outcome = match fetched {
			Ok(nodes) => {
				info!("loaded {} nodes from {}", nodes.len(), nodes_url);
				barrier_nodes.borrow_mut().offer_nodes(nodes).map(Ok)
			}
			Err(e) => {
				error!("{}", e);
				barrier_nodes.borrow_mut().offer_failure().then_some(Err(e))
			}
		};
		if let Some(outcome) = outcome {
			done_nodes(outcome);
		}
	});

	let edges_url = dataset.edges_url.clone();
	spawn_local(async move {
		let fetched = fetch_json::<Vec<GraphLink>>(&edges_url).await;
		let outcome = match fetched {
			Ok(links) => {
				info!("loaded {} links from {}", links.len(), edges_url);
				barrier.borrow_mut().offer_links(links).map(Ok)
			}
			Err(e) => {
				error!("{}", e);
				barrier.borrow_mut().offer_failure().then_some(Err(e))
			}
		};
		if let Some(outcome) = outcome {
			on_done(outcome);
		}
	});
}

#[cfg(test)]
mod tests {
	use super::*;

	fn nodes() -> Vec<GraphNode> {
		serde_json::from_str(r#"[{ "key": "a" }, { "key": "b" }]"#).expect("valid nodes")
	}

	fn links() -> Vec<GraphLink> {
		serde_json::from_str(r#"[{ "source": "a", "target": "b", "weight": 1 }]"#)
			.expect("valid links")
	}

	#[test]
	fn releases_only_when_both_halves_arrive() {
		let mut barrier = DatasetBarrier::default();
		assert!(barrier.offer_links(links()).is_none());

		let data = barrier.offer_nodes(nodes()).expect("both halves present");
		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.links.len(), 1);
	}

	#[test]
	fn order_of_arrival_does_not_matter() {
		let mut barrier = DatasetBarrier::default();
		assert!(barrier.offer_nodes(nodes()).is_none());
		assert!(barrier.offer_links(links()).is_some());
	}

	#[test]
	fn later_offers_do_not_release_again() {
		let mut barrier = DatasetBarrier::default();
		barrier.offer_nodes(nodes());
		barrier.offer_links(links());

		assert!(barrier.offer_nodes(nodes()).is_none());
		assert!(barrier.offer_links(links()).is_none());
		assert!(!barrier.offer_failure());
	}

	#[test]
	fn one_missing_half_never_releases() {
		let mut barrier = DatasetBarrier::default();
		assert!(barrier.offer_nodes(nodes()).is_none());
		assert!(barrier.offer_nodes(nodes()).is_none());
	}

	#[test]
	fn first_failure_settles_the_barrier() {
		let mut barrier = DatasetBarrier::default();
		assert!(barrier.offer_failure());
		assert!(!barrier.offer_failure());
		assert!(barrier.offer_nodes(nodes()).is_none());
		assert!(barrier.offer_links(links()).is_none());
	}
}
