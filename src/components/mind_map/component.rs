use std::cell::RefCell;
use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Element, HtmlAnchorElement, HtmlCanvasElement, KeyboardEvent,
	MouseEvent, WheelEvent, Window,
};

use super::render::{self, ICONS};
use super::state::MindMapState;
use super::storage;
use super::types::{ChromeView, canvas_point, parse_tags};
use crate::map::{Attachment, AttachmentKind, Layout, MindMap, NodePatch, Point, Shape};

/// Copyable handles shared by every event handler.
#[derive(Clone, Copy)]
struct Engine {
	state: StoredValue<Option<MindMapState>>,
	chrome: RwSignal<ChromeView>,
	saved_revision: StoredValue<u64>,
	storage_key: &'static str,
}

impl Engine {
	/// Runs `f` against the state, refreshes the chrome and autosaves.
	fn update<U>(self, f: impl FnOnce(&mut MindMapState) -> U) -> Option<U> {
		let out = self.update_view(f);
		self.save_if_changed();
		out
	}

	/// Like [`Engine::update`] without saving; for high-frequency events.
	fn update_view<U>(self, f: impl FnOnce(&mut MindMapState) -> U) -> Option<U> {
		let out = self
			.state
			.try_update_value(|slot| slot.as_mut().map(f))
			.flatten();
		let view = self
			.state
			.try_with_value(|slot| slot.as_ref().map(ChromeView::of))
			.flatten();
		if let Some(view) = view {
			if self.chrome.with_untracked(|current| *current != view) {
				self.chrome.set(view);
			}
		}
		out
	}

	fn save_if_changed(self) {
		let key = self.storage_key;
		let saved = self.saved_revision.get_value();
		let revision = self.state.with_value(|slot| {
			let s = slot.as_ref()?;
			if s.revision() != saved {
				storage::save(key, &s.map);
			}
			Some(s.revision())
		});
		if let Some(revision) = revision {
			self.saved_revision.set_value(revision);
		}
	}

	fn with<U>(self, f: impl FnOnce(&MindMapState) -> U) -> Option<U> {
		self.state.with_value(|slot| slot.as_ref().map(f))
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(600.0),
	)
}

fn download(file_name: &str, href: &str) {
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		return;
	};
	let Ok(anchor) = document
		.create_element("a")
		.map_err(JsValue::from)
		.and_then(|el| el.dyn_into::<HtmlAnchorElement>().map_err(JsValue::from))
	else {
		warn!("could not create download link");
		return;
	};
	anchor.set_href(href);
	anchor.set_download(file_name);
	anchor.click();
}

/// True when a key event comes from a form control of the page chrome.
fn from_form_control(ev: &KeyboardEvent) -> bool {
	ev.target()
		.and_then(|t| t.dyn_into::<Element>().ok())
		.is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

#[component]
pub fn MindMapCanvas(
	#[prop(into)] data: Signal<MindMap>,
	#[prop(default = "mind-map")] storage_key: &'static str,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let editor_ref = NodeRef::<leptos::html::Input>::new();
	let engine = Engine {
		state: StoredValue::new(None),
		chrome: RwSignal::new(ChromeView::default()),
		saved_revision: StoredValue::new(0),
		storage_key,
	};
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (animate_init, resize_cb_init) = (animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = context_2d(&canvas) else {
			warn!("canvas has no 2d context");
			return;
		};
		engine
			.state
			.set_value(Some(MindMapState::new(data.get_untracked(), w, h)));
		engine.update_view(|_| ());
		info!("mind map canvas mounted at {w}x{h}");

		if fullscreen {
			let canvas_resize = canvas.clone();
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				engine.update_view(|s| s.resize(nw, nh));
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let animate_inner = animate_init.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			let alive = engine
				.state
				.try_with_value(|slot| {
					if let Some(s) = slot {
						render::render(s, &ctx);
					}
				})
				.is_some();
			if !alive {
				return;
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// later changes to `data` replace the whole graph
	Effect::new(move |initialised: Option<()>| {
		let map = data.get();
		if initialised.is_some() {
			engine.update(|s| s.replace_map(map));
		}
	});

	Effect::new(move |_| {
		if let Some(input) = editor_ref.get() {
			let _ = input.focus();
			input.select();
		}
	});

	let _keys = window_event_listener(ev::keydown, move |ev: KeyboardEvent| {
		let editing = engine.with(|s| s.editing().is_some()).unwrap_or(false);
		if !editing && from_form_control(&ev) {
			return;
		}
		if engine.update(|s| s.key_down(&ev.key())).unwrap_or(false) {
			ev.prevent_default();
		}
	});

	let pointer = move |ev: &MouseEvent| -> Option<Point> {
		let canvas = canvas_ref.get_untracked()?;
		let rect = canvas.get_bounding_client_rect();
		Some(canvas_point(
			ev.client_x(),
			ev.client_y(),
			rect.left(),
			rect.top(),
		))
	};

	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		if let Some(p) = pointer(&ev) {
			engine.update_view(|s| s.pointer_down(p));
		}
	};

	let on_mousemove = move |ev: MouseEvent| {
		if let Some(p) = pointer(&ev) {
			engine.update_view(|s| s.pointer_move(p));
		}
	};

	let on_mouseup = move |_: MouseEvent| {
		engine.update(|s| s.pointer_up());
	};

	let on_mouseleave = move |_: MouseEvent| {
		engine.update(|s| s.pointer_leave());
	};

	let on_dblclick = move |ev: MouseEvent| {
		if let Some(p) = pointer(&ev) {
			engine.update_view(|s| s.double_click(p));
		}
	};

	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		engine.update_view(|s| s.wheel(ev.delta_y()));
	};

	let export_json = move |_: MouseEvent| {
		match engine.with(|s| s.map.to_json()) {
			Some(Ok(json)) => {
				let encoded: String = js_sys::encode_uri_component(&json).into();
				download(
					"mind-map.json",
					&format!("data:application/json;charset=utf-8,{encoded}"),
				);
			}
			Some(Err(err)) => warn!("export failed: {err}"),
			None => {}
		}
	};

	let export_png = move |_: MouseEvent| {
		match engine.with(|s| render::export_png(&s.map)) {
			Some(Ok(url)) => download("mind-map.png", &url),
			Some(Err(err)) => warn!("image export failed: {err:?}"),
			None => {}
		}
	};

	let import_json = move |_: MouseEvent| {
		let Some(window) = web_sys::window() else {
			return;
		};
		let Ok(Some(raw)) = window.prompt_with_message("Paste a mind map JSON document") else {
			return;
		};
		match MindMap::from_json(&raw) {
			Ok(map) => {
				info!("imported {} nodes", map.len());
				engine.update(|s| {
					s.replace_map(map);
					s.fit_to_view();
				});
			}
			Err(err) => {
				warn!("import rejected: {err}");
				let _ = window.alert_with_message(&format!("Import failed: {err}"));
			}
		}
	};

	let clear_map = move |_: MouseEvent| {
		let confirmed = web_sys::window()
			.and_then(|w| w.confirm_with_message("Start a new, empty map?").ok())
			.unwrap_or(false);
		if confirmed {
			engine.update(|s| s.replace_map(MindMap::new()));
		}
	};

	let has_selection = move || engine.chrome.with(|c| c.selection.is_some());
	let patch = move |p: NodePatch| {
		engine.update(|s| s.update_selected(p));
	};

	let editor = Memo::new(move |_| engine.chrome.with(|c| c.editor.clone()));
	let editor_view = move || {
		editor.get().map(|ed| {
			let draft = engine
				.with(|s| s.editing().map(|(_, d)| d.to_owned()))
				.flatten()
				.unwrap_or_default();
			let style = format!(
				"position: absolute; left: {}px; top: {}px; width: {}px; height: {}px; \
				 font-size: {}px; text-align: center;",
				ed.left,
				ed.top,
				ed.width,
				ed.height,
				ed.font_size
			);
			view! {
				<input
					node_ref=editor_ref
					class="node-editor"
					type="text"
					style=style
					prop:value=draft
					on:input=move |ev| {
						engine.update_view(|s| s.edit_input(event_target_value(&ev)));
					}
					on:blur=move |_| {
						engine.update(|s| s.commit_edit());
					}
				/>
			}
		})
	};

	let new_kind = RwSignal::new(AttachmentKind::Note);
	let new_content = RwSignal::new(String::new());
	let attach = move |_: MouseEvent| {
		let content = new_content.get_untracked();
		if content.trim().is_empty() {
			return;
		}
		let attachment = Attachment {
			kind: new_kind.get_untracked(),
			content,
			title: None,
		};
		if engine.update(|s| s.attach_to_selected(attachment)).unwrap_or(false) {
			new_content.set(String::new());
		}
	};

	let panel = Memo::new(move |_| {
		engine
			.chrome
			.with(|c| c.selection.clone().filter(|_| c.style_panel_open))
	});
	let panel_view = move || {
		panel.get().map(|sel| {
			let current_shape = sel.shape.clone();
			let current_icon = sel.icon.clone();
			view! {
				<aside class="style-panel">
					<h3>"Node style"</h3>
					<label>
						"Fill "
						<input
							type="color"
							prop:value=sel.color
							on:change=move |ev| patch(NodePatch {
								color: Some(event_target_value(&ev)),
								..NodePatch::default()
							})
						/>
					</label>
					<label>
						"Text "
						<input
							type="color"
							prop:value=sel.text_color
							on:change=move |ev| patch(NodePatch {
								text_color: Some(event_target_value(&ev)),
								..NodePatch::default()
							})
						/>
					</label>
					<label>
						"Font size "
						<input
							type="number"
							min="6"
							max="72"
							prop:value=sel.font_size.to_string()
							on:change=move |ev| {
								if let Ok(size) = event_target_value(&ev).parse::<f64>() {
									if size > 0.0 {
										patch(NodePatch {
											font_size: Some(size),
											..NodePatch::default()
										});
									}
								}
							}
						/>
					</label>
					<label>
						"Shape "
						<select on:change=move |ev| {
							if let Some(shape) = Shape::parse(&event_target_value(&ev)) {
								patch(NodePatch {
									shape: Some(shape),
									..NodePatch::default()
								});
							}
						}>
							{Shape::ALL
								.into_iter()
								.map(|shape| {
									let name = shape.as_str();
									view! {
										<option value=name selected={name == current_shape}>
											{name}
										</option>
									}
								})
								.collect_view()}
						</select>
					</label>
					<label>
						"Icon "
						<select on:change=move |ev| {
							let key = event_target_value(&ev);
							patch(NodePatch {
								icon: Some((!key.is_empty()).then_some(key)),
								..NodePatch::default()
							});
						}>
							<option value="" selected={current_icon.is_empty()}>
								"none"
							</option>
							{ICONS
								.iter()
								.map(|(key, glyph)| {
									view! {
										<option value=*key selected={*key == current_icon}>
											{format!("{glyph} {key}")}
										</option>
									}
								})
								.collect_view()}
						</select>
					</label>
					<label>
						"Notes"
						<textarea
							prop:value=sel.notes
							on:change=move |ev| patch(NodePatch {
								notes: Some(event_target_value(&ev)),
								..NodePatch::default()
							})
						></textarea>
					</label>
					<label>
						"Tags "
						<input
							type="text"
							prop:value=sel.tags
							on:change=move |ev| patch(NodePatch {
								tags: Some(parse_tags(&event_target_value(&ev))),
								..NodePatch::default()
							})
						/>
					</label>
					<div class="attachments">
						"Attachments"
						<ul>
							{sel
								.attachments
								.iter()
								.enumerate()
								.map(|(index, label)| {
									let label = label.clone();
									view! {
										<li>
											{label}
											<button on:click=move |_| {
												engine.update(|s| s.detach_from_selected(index));
											}>"×"</button>
										</li>
									}
								})
								.collect_view()}
						</ul>
						<select on:change=move |ev| {
							if let Some(kind) = AttachmentKind::parse(&event_target_value(&ev)) {
								new_kind.set(kind);
							}
						}>
							{AttachmentKind::ALL
								.into_iter()
								.map(|kind| {
									let name = kind.as_str();
									let current = kind == new_kind.get_untracked();
									view! {
										<option value=name selected=current>
											{name}
										</option>
									}
								})
								.collect_view()}
						</select>
						<input
							type="text"
							placeholder="URL, formula or note"
							prop:value=move || new_content.get()
							on:input=move |ev| new_content.set(event_target_value(&ev))
						/>
						<button on:click=attach>"Attach"</button>
					</div>
					<button
						disabled={sel.child_count == 0}
						on:click=move |_| {
							engine.update(|s| s.toggle_collapse_selected());
						}
					>
						{if sel.collapsed { "Expand" } else { "Collapse" }}
					</button>
				</aside>
			}
		})
	};

	view! {
		<div class="mind-map" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="mind-map-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{editor_view}
			<nav class="toolbar">
				<button on:click=move |_| {
					engine.update(|s| s.add_node());
				}>"Add"</button>
				<button
					disabled=move || !has_selection()
					on:click=move |_| {
						engine.update(|s| s.delete_selected());
					}
				>
					"Delete"
				</button>
				<button
					disabled=move || !has_selection()
					on:click=move |_| {
						engine.update(|s| s.toggle_collapse_selected());
					}
				>
					"Collapse"
				</button>
				<button
					disabled=move || !has_selection()
					on:click=move |_| {
						engine.update_view(|s| s.toggle_style_panel());
					}
				>
					"Style"
				</button>
				<button on:click=move |_| {
					engine.update_view(|s| s.zoom_out());
				}>"−"</button>
				<span class="zoom">
					{move || format!("{}%", engine.chrome.with(|c| c.zoom_percent))}
				</span>
				<button on:click=move |_| {
					engine.update_view(|s| s.zoom_in());
				}>"+"</button>
				<button on:click=move |_| {
					engine.update_view(|s| s.reset_view());
				}>"Reset"</button>
				<button on:click=move |_| {
					engine.update_view(|s| s.fit_to_view());
				}>"Fit"</button>
				<button on:click=move |_| {
					engine.update(|s| s.apply_layout(Layout::Radial));
				}>"Radial"</button>
				<button on:click=move |_| {
					engine.update(|s| s.apply_layout(Layout::Tree));
				}>"Tree"</button>
				<button on:click=export_json>"Export JSON"</button>
				<button on:click=export_png>"Export PNG"</button>
				<button on:click=import_json>"Import"</button>
				<button on:click=clear_map>"New"</button>
				<span class="count">
					{move || format!("{} nodes", engine.chrome.with(|c| c.node_count))}
				</span>
			</nav>
			{panel_view}
		</div>
	}
}
