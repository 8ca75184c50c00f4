use leptos::prelude::*;

use crate::components::{ControlPanel, EditorState, RagCanvas};
use crate::rag::{DeadlockReport, EntityStore};

/// Simulator page: control panel on the left, graph canvas filling the rest.
#[component]
pub fn Home() -> impl IntoView {
	let store = RwSignal::new(EntityStore::with_defaults());
	// Stays stale until the next explicit detection run.
	let report = RwSignal::new(DeadlockReport::default());
	let editor = RwSignal::new(EditorState::default());

	let selected = Signal::derive(move || editor.with(|e| e.selected.clone()));
	let on_node_click = move |id: String| {
		store.update(|s| editor.update(|e| e.click(s, &id)));
	};

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

			<div class="simulator">
				<ControlPanel store=store report=report editor=editor />
				<div class="graph-area">
					<RagCanvas
						store=store
						report=report
						selected=selected
						on_node_click=on_node_click
					/>
					<div class="graph-overlay">
						<h1>"Resource Allocation Graph"</h1>
						<p class="subtitle">
							"Circles are processes, squares are resources. Drag to move, scroll to zoom."
						</p>
					</div>
				</div>
			</div>
		</ErrorBoundary>
	}
}
