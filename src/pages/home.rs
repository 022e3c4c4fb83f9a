use leptos::prelude::*;

use crate::components::mind_map::{MindMapCanvas, load_saved_map};
use crate::map::{MindMap, NodePatch, Point};

const STORAGE_KEY: &str = "mind-map";

/// Map shown the first time the page is opened.
fn starter_map() -> MindMap {
	let mut map = MindMap::new();
	map.metadata.title = "My Mind Map".to_owned();
	let root = map.create_node(Point::new(400.0, 300.0), "Central Topic", None);
	for text in ["Goals", "Resources", "Schedule"] {
		if let Some(child) = map.add_child_node(&root) {
			map.update_node(&child, NodePatch::text(text));
		}
	}
	map
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let initial = load_saved_map(STORAGE_KEY).unwrap_or_else(starter_map);

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

			<div class="fullscreen-map">
				<MindMapCanvas data=initial storage_key=STORAGE_KEY fullscreen=true />
				<div class="map-overlay">
					<h1>"Mind Map"</h1>
					<p class="subtitle">
						"Drag nodes to move them. Drag the background to pan. Scroll to zoom. Double-click to edit."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
