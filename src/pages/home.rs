use leptos::prelude::*;
use leptos_router::components::A;

use crate::config::AppConfig;

/// Default Home Page, listing the configured datasets.
#[component]
pub fn Home() -> impl IntoView {
	let datasets = AppConfig::load().datasets;

	view! {
		<div class="home">
			<h1>"Force-Directed Networks"</h1>
			<p class="subtitle">"Pick a dataset to explore."</p>
			<ul class="dataset-list">
				{datasets
					.into_iter()
					.map(|dataset| {
						view! {
							<li>
								<A href=format!("/graph/{}", dataset.id)>{dataset.title}</A>
							</li>
						}
					})
					.collect_view()}
			</ul>
		</div>
	}
}
