use std::sync::Arc;

use leptos::either::Either;
use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use log::warn;

use crate::components::force_graph::{ForceGraphCanvas, GraphData};
use crate::config::{AppConfig, DatasetConfig, LayoutConfig, ViewportConfig};
use crate::error::ViewerError;
use crate::loader::load_dataset;
use crate::pages::not_found::NotFound;

/// Resolves `/graph/:dataset` against the app config.
#[component]
pub fn DatasetRoute() -> impl IntoView {
	let params = use_params_map();
	let config = AppConfig::load();
	let id = params.get_untracked().get("dataset").unwrap_or_default();

	match config.dataset(&id).cloned() {
		Some(dataset) => {
			let AppConfig { layout, viewport, .. } = config;
			Either::Left(view! { <GraphPage dataset=dataset layout=layout viewport=viewport /> })
		}
		None => {
			warn!("no dataset named {:?}", id);
			Either::Right(view! { <NotFound /> })
		}
	}
}

/// One dataset's viewer: starts both fetches and hands the joined data to the canvas.
/// A failed load or an unusable dataset replaces the view with the error.
#[component]
pub fn GraphPage(
	dataset: DatasetConfig,
	layout: LayoutConfig,
	viewport: ViewportConfig,
) -> impl IntoView {
	let graph_data = RwSignal::new(None::<GraphData>);
	let failure = RwSignal::new(None::<Arc<ViewerError>>);
	load_dataset(&dataset, move |loaded| match loaded {
		Ok(data) => graph_data.set(Some(data)),
		Err(e) => failure.set(Some(Arc::new(e.into()))),
	});
	let on_error = Callback::new(move |e: ViewerError| failure.set(Some(Arc::new(e))));
	let title = dataset.title.clone();

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			{move || failure.get().map_or(Ok(()), Err)}
			<div class="graph-page">
				<header class="graph-header">
					<h1>{title}</h1>
					<p class="subtitle">
						"Drag nodes to pin them. Click a node for details. Scroll to zoom, drag the background to pan."
					</p>
					<A href="/">"All datasets"</A>
				</header>
				<ForceGraphCanvas
					data=graph_data
					dataset=dataset
					layout=layout
					viewport=viewport
					on_error=on_error
				/>
			</div>
		</ErrorBoundary>
	}
}
