use leptos::prelude::*;

use super::state::NodeDetails;

/// Attribute listing for the selected node.
#[component]
pub fn InfoPanel(#[prop(into)] details: Signal<Option<NodeDetails>>) -> impl IntoView {
	move || {
		details.get().map(|d| {
			view! {
				<h3>"Node Information"</h3>
				{d
					.rows
					.into_iter()
					.map(|(label, value)| {
						view! {
							<p>
								<strong>{label}":"</strong>
								" "
								{value}
							</p>
						}
					})
					.collect_view()}
			}
		})
	}
}
