//! `localStorage` persistence of the map document.

use log::{info, warn};
use web_sys::Storage;

use crate::map::MindMap;

fn local_storage() -> Option<Storage> {
	web_sys::window()?.local_storage().ok().flatten()
}

/// Loads and validates the map stored under `key`. Returns `None` when
/// nothing usable is stored; an invalid entry is left in place.
pub fn load(key: &str) -> Option<MindMap> {
	let raw = local_storage()?.get_item(key).ok().flatten()?;
	match MindMap::from_json(&raw) {
		Ok(map) => {
			info!("loaded {} nodes from '{key}'", map.len());
			Some(map)
		}
		Err(err) => {
			warn!("ignoring stored map '{key}': {err}");
			None
		}
	}
}

pub fn save(key: &str, map: &MindMap) {
	let Some(storage) = local_storage() else {
		warn!("localStorage unavailable, map not saved");
		return;
	};
	match map.to_json() {
		Ok(json) => {
			if let Err(err) = storage.set_item(key, &json) {
				warn!("saving map to '{key}' failed: {err:?}");
			}
		}
		Err(err) => warn!("serializing map failed: {err}"),
	}
}
