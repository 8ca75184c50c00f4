use leptos::ev::MouseEvent;
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use super::editor::{EditMode, EditorState};
use crate::rag::{DeadlockReport, EXPORT_FILE_NAME, EntityStore, ProcessId, ResourceId, Snapshot};

fn process_label(store: &EntityStore, id: &ProcessId) -> String {
	store
		.process(id)
		.map(|p| p.label.clone())
		.unwrap_or_else(|| format!("?{id}"))
}

fn resource_label(store: &EntityStore, id: &ResourceId) -> String {
	store
		.resource(id)
		.map(|r| r.label.clone())
		.unwrap_or_else(|| format!("?{id}"))
}

/// Saves `json` as [`EXPORT_FILE_NAME`] through a temporary object URL.
fn download_json(json: &str) -> Result<(), JsValue> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| JsValue::from_str("no document"))?;
	let options = BlobPropertyBag::new();
	options.set_type("application/json");
	let parts = js_sys::Array::of1(&JsValue::from_str(json));
	let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
	let url = Url::create_object_url_with_blob(&blob)?;

	let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
	anchor.set_href(&url);
	anchor.set_download(EXPORT_FILE_NAME);
	anchor.click();
	Url::revoke_object_url(&url)
}

/// Side panel: entity creation, edit modes, detection, record lists and
/// snapshot import/export.
#[component]
pub fn ControlPanel(
	store: RwSignal<EntityStore>,
	report: RwSignal<DeadlockReport>,
	editor: RwSignal<EditorState>,
) -> impl IntoView {
	let mode_buttons = EditMode::ALL
		.into_iter()
		.map(|mode| {
			let class = move || {
				if editor.with(|e| e.mode == mode) {
					"mode active"
				} else {
					"mode"
				}
			};
			view! {
				<button class=class on:click=move |_| editor.update(|e| e.set_mode(mode))>
					{mode.label()}
				</button>
			}
		})
		.collect_view();

	let edge_step = move || {
		editor.with(|e| match &e.edge_step {
			Some(source) => format!("Edge step: waiting for second node (source {source})"),
			None => "Edge step: none".to_string(),
		})
	};

	view! {
		<div class="control-panel">
			<div class="panel-title">"Controls"</div>
			<div class="button-row">
				<button on:click=move |_| {
					store.update(|s| {
						s.add_process(None);
					})
				}>"Add Process"</button>
				<button on:click=move |_| {
					store.update(|s| {
						s.add_resource(None, 1);
					})
				}>"Add Resource"</button>
			</div>
			<div class="mode-grid">{mode_buttons}</div>
			<div class="edge-step">{edge_step}</div>
			<div class="button-row">
				<button
					class="danger"
					on:click=move |_| report.set(store.with(EntityStore::run_detection))
				>
					"Detect Deadlock"
				</button>
				<button on:click=move |_| report.set(DeadlockReport::default())>
					"Clear Detection"
				</button>
			</div>
			<CapacityEditor store=store editor=editor />
			<RecordLists store=store report=report />
			<DetectionSummary store=store report=report />
			<SnapshotPanel store=store report=report editor=editor />
		</div>
	}
}

/// Instance count of the selected resource.
#[component]
fn CapacityEditor(store: RwSignal<EntityStore>, editor: RwSignal<EditorState>) -> impl IntoView {
	move || {
		let id = ResourceId(editor.with(|e| e.selected.clone())?);
		let (label, instances, available) = store.with(|s| {
			s.resource(&id)
				.map(|r| (r.label.clone(), r.instances, s.available_instances(&id)))
		})?;
		Some(view! {
			<div class="capacity">
				<label>
					{format!("Instances of {label}")}
					<input
						type="number"
						min="0"
						prop:value=instances.to_string()
						on:change=move |ev| {
							match event_target_value(&ev).trim().parse::<u32>() {
								Ok(n) => {
									store.update(|s| {
										s.set_instances(&id, n);
									})
								}
								Err(err) => warn!("ignoring capacity input: {err}"),
							}
						}
					/>
				</label>
				<span class="hint">{format!("{available} free")}</span>
			</div>
		})
	}
}

#[component]
fn RecordLists(store: RwSignal<EntityStore>, report: RwSignal<DeadlockReport>) -> impl IntoView {
	let allocations = move || {
		store.with(|s| {
			if s.allocations().is_empty() {
				return view! { <div class="empty">"(none)"</div> }.into_any();
			}
			s.allocations()
				.iter()
				.enumerate()
				.map(|(i, a)| {
					let text = format!(
						"{} ➜ {} (count {})",
						resource_label(s, &a.res_id),
						process_label(s, &a.proc_id),
						a.count
					);
					let class = if report.with(|r| r.highlights_allocation(a)) {
						"record deadlocked"
					} else {
						"record"
					};
					view! {
						<div class=class>
							<span>{text}</span>
							<button on:click=move |_| {
								store.update(|s| {
									s.remove_allocation(i);
								})
							}>"x"</button>
						</div>
					}
				})
				.collect_view()
				.into_any()
		})
	};

	let requests = move || {
		store.with(|s| {
			if s.requests().is_empty() {
				return view! { <div class="empty">"(none)"</div> }.into_any();
			}
			s.requests()
				.iter()
				.enumerate()
				.map(|(i, r)| {
					let text = format!(
						"{} ➜ {} (count {})",
						process_label(s, &r.proc_id),
						resource_label(s, &r.res_id),
						r.count
					);
					let class = if report.with(|rep| rep.highlights_request(r)) {
						"record deadlocked"
					} else {
						"record"
					};
					view! {
						<div class=class>
							<span>{text}</span>
							<button on:click=move |_| {
								store.update(|s| {
									s.remove_request(i);
								})
							}>"x"</button>
						</div>
					}
				})
				.collect_view()
				.into_any()
		})
	};

	view! {
		<div class="records">
			<div class="panel-title">"Allocations"</div>
			<div class="record-list">{allocations}</div>
			<div class="panel-title">"Requests"</div>
			<div class="record-list">{requests}</div>
		</div>
	}
}

#[component]
fn DetectionSummary(
	store: RwSignal<EntityStore>,
	report: RwSignal<DeadlockReport>,
) -> impl IntoView {
	let summary = move || {
		report.with(|r| {
			if r.is_deadlocked() {
				format!(
					"Deadlock: {} cycle(s) over {} wait-for edge(s)",
					r.cycles.len(),
					r.wait_for_edges.len()
				)
			} else {
				format!("No cycles ({} wait-for edge(s))", r.wait_for_edges.len())
			}
		})
	};
	let cycles = move || {
		report.with(|r| {
			store.with(|s| {
				r.cycles
					.iter()
					.map(|cycle| {
						let names: Vec<String> = cycle.iter().map(|p| process_label(s, p)).collect();
						view! { <li>{names.join(" → ")}</li> }
					})
					.collect_view()
			})
		})
	};

	view! {
		<div class="detection">
			<div class="panel-title">"Detection"</div>
			<div class="hint">{summary}</div>
			<ul class="cycles">{cycles}</ul>
		</div>
	}
}

#[component]
fn SnapshotPanel(
	store: RwSignal<EntityStore>,
	report: RwSignal<DeadlockReport>,
	editor: RwSignal<EditorState>,
) -> impl IntoView {
	let (text, set_text) = signal(String::new());
	let (error, set_error) = signal(None::<String>);

	let export = move |_: MouseEvent| match store.with(EntityStore::snapshot).to_json_pretty() {
		Ok(json) => {
			match download_json(&json) {
				Ok(()) => {
					info!("exported {EXPORT_FILE_NAME}");
					set_error.set(None);
				}
				Err(err) => {
					warn!("download of {EXPORT_FILE_NAME} failed: {err:?}");
					set_error.set(Some(format!("download failed: {err:?}")));
				}
			}
			set_text.set(json);
		}
		Err(err) => set_error.set(Some(err.to_string())),
	};

	let import = move |_: MouseEvent| match Snapshot::from_json(&text.get_untracked()) {
		Ok(snapshot) => {
			store.update(|s| s.load(snapshot));
			report.set(DeadlockReport::default());
			editor.update(EditorState::reset);
			set_error.set(None);
		}
		Err(err) => {
			warn!("snapshot import failed: {err}");
			set_error.set(Some(err.to_string()));
		}
	};

	view! {
		<div class="snapshot">
			<div class="panel-title">{format!("Snapshot ({EXPORT_FILE_NAME})")}</div>
			<div class="button-row">
				<button on:click=export>"Export JSON"</button>
				<button on:click=import>"Import JSON"</button>
			</div>
			<textarea
				rows="8"
				prop:value=move || text.get()
				on:input=move |ev| set_text.set(event_target_value(&ev))
			/>
			{move || error.get().map(|err| view! { <div class="error">{err}</div> })}
		</div>
	}
}
