use leptos::prelude::*;
use leptos_router::components::A;

/// 404 - Not Found
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"Uh oh!" <br /> "We couldn't find that page!"</h1>
			<A href="/">"Back to the datasets"</A>
		</div>
	}
}
