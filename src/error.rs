//! Error types for loading and building a graph view.

use thiserror::Error;

/// Failure fetching or decoding one of the dataset resources.
#[derive(Debug, Error)]
pub enum LoadError {
	/// The request could not be sent or its body could not be read.
	#[error("request for {url} failed: {source}")]
	Request {
		/// Resource URL.
		url: String,
		/// Underlying transport error.
		#[source]
		source: gloo_net::Error,
	},
	/// The server answered with a non-success status.
	#[error("request for {url} returned status {status}")]
	Status {
		/// Resource URL.
		url: String,
		/// HTTP status code.
		status: u16,
	},
	/// The body was not the expected JSON shape.
	#[error("could not parse {url}: {source}")]
	Parse {
		/// Resource URL.
		url: String,
		/// Underlying decode error.
		#[source]
		source: serde_json::Error,
	},
}

/// Failure turning loaded data into a running layout.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
	/// A link names a node key that is not in the nodes file.
	#[error("link {link} references unknown node `{key}`")]
	UnknownNode {
		/// Position of the link in the edges file.
		link: usize,
		/// The unresolved key.
		key: String,
	},
	/// Two nodes share a key.
	#[error("duplicate node key `{0}`")]
	DuplicateNode(String),
	/// A decay step target that is not a positive finite number.
	#[error("decay step target must be positive, got {0}")]
	InvalidDecay(f64),
}

/// Anything that keeps a dataset view from showing.
#[derive(Debug, Error)]
pub enum ViewerError {
	/// A resource failed to load.
	#[error(transparent)]
	Load(#[from] LoadError),
	/// The loaded data could not be laid out.
	#[error(transparent)]
	Graph(#[from] GraphError),
}
