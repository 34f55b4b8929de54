//! Storage-backed state mirror.
//!
//! Mirrors the state tree (or a path-filtered subset of it) into a
//! string storage backend after every mutation, under a single
//! configurable key. On the client the backend is localStorage; tests
//! and servers use [`MemoryStorage`]. Restoring merges the saved blob
//! back over the initial state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use crate::store::{Store, SubscriberHandle};

/// A string blob store keyed by name, the shape localStorage has.
pub trait StateStorage {
	/// Reads the blob stored under `key`, if any.
	fn load(&self, key: &str) -> Option<String>;
	/// Writes `value` under `key`, replacing any previous blob.
	fn store(&self, key: &str, value: &str);
}

/// In-memory [`StateStorage`] backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
	/// Creates an empty storage.
	pub fn new() -> Self {
		Self::default()
	}
}

impl StateStorage for MemoryStorage {
	fn load(&self, key: &str) -> Option<String> {
		self.entries.borrow().get(key).cloned()
	}

	fn store(&self, key: &str, value: &str) {
		self.entries
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
	}
}

/// Options for [`attach`] and [`restore`].
#[derive(Debug, Clone)]
pub struct PersistenceOptions {
	key: String,
	paths: Option<Vec<String>>,
}

impl PersistenceOptions {
	/// Persists the whole state tree under `key`.
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			paths: None,
		}
	}

	/// Restricts the mirror to the given dot-separated state paths.
	pub fn paths(mut self, paths: Vec<String>) -> Self {
		self.paths = Some(paths);
		self
	}
}

/// Subscribes a mirror that rewrites the stored blob after every
/// committed mutation. Returns the subscriber handle so the mirror can
/// be detached with [`Store::unsubscribe`].
pub fn attach(store: &Rc<Store>, storage: Rc<dyn StateStorage>, options: PersistenceOptions) -> SubscriberHandle {
	store.subscribe(move |_record, new_state, _previous| {
		let snapshot = match &options.paths {
			Some(paths) => filter_paths(new_state, paths),
			None => new_state.clone(),
		};
		match serde_json::to_string(&snapshot) {
			Ok(blob) => storage.store(&options.key, &blob),
			Err(err) => warn!(key = options.key.as_str(), %err, "state mirror serialization failed"),
		}
	})
}

/// Merges a previously saved blob back into the store's state.
///
/// Returns `true` when a blob existed and was merged. A missing or
/// unparsable blob leaves state untouched; parse failures are logged
/// and the stale blob is ignored, never fatal.
pub fn restore(store: &Store, storage: &dyn StateStorage, options: &PersistenceOptions) -> bool {
	let Some(blob) = storage.load(&options.key) else {
		return false;
	};
	let saved: Value = match serde_json::from_str(&blob) {
		Ok(value) => value,
		Err(err) => {
			warn!(key = options.key.as_str(), %err, "ignoring unparsable persisted state");
			return false;
		}
	};
	merge_into(&mut store.state.borrow_mut(), saved);
	true
}

/// Builds a value containing only the given dot-separated paths.
fn filter_paths(state: &Value, paths: &[String]) -> Value {
	let mut out = Value::Object(Default::default());
	for path in paths {
		let mut cursor = state;
		let segments: Vec<&str> = path.split('.').collect();
		let mut found = true;
		for segment in &segments {
			match cursor.get(segment) {
				Some(next) => cursor = next,
				None => {
					found = false;
					break;
				}
			}
		}
		if found {
			insert_path(&mut out, &segments, cursor.clone());
		}
	}
	out
}

fn insert_path(target: &mut Value, segments: &[&str], value: Value) {
	let Some((first, rest)) = segments.split_first() else {
		return;
	};
	let Value::Object(map) = target else {
		return;
	};
	if rest.is_empty() {
		map.insert((*first).to_string(), value);
		return;
	}
	let entry = map
		.entry((*first).to_string())
		.or_insert_with(|| Value::Object(Default::default()));
	insert_path(entry, rest, value);
}

/// Deep-merges `saved` into `state`; saved leaves win.
fn merge_into(state: &mut Value, saved: Value) {
	match (state, saved) {
		(Value::Object(state_map), Value::Object(saved_map)) => {
			for (key, value) in saved_map {
				match state_map.get_mut(&key) {
					Some(existing) => merge_into(existing, value),
					None => {
						state_map.insert(key, value);
					}
				}
			}
		}
		(slot, saved) => *slot = saved,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn store_with_count() -> Rc<Store> {
		Store::builder()
			.state(json!({ "count": 0, "ui": { "theme": "dark", "scratch": 1 } }))
			.mutation("SET", |state, payload| state["count"] = payload)
			.build()
	}

	#[test]
	fn test_mirror_writes_after_every_commit() {
		let store = store_with_count();
		let storage = Rc::new(MemoryStorage::new());
		attach(&store, storage.clone(), PersistenceOptions::new("switch:state"));

		store.commit("SET", json!(3));

		let blob = storage.load("switch:state").expect("blob written");
		let saved: Value = serde_json::from_str(&blob).expect("valid json");
		assert_eq!(saved["count"], json!(3));
	}

	#[test]
	fn test_mirror_respects_path_filter() {
		let store = store_with_count();
		let storage = Rc::new(MemoryStorage::new());
		attach(
			&store,
			storage.clone(),
			PersistenceOptions::new("k").paths(vec!["count".to_string(), "ui.theme".to_string()]),
		);

		store.commit("SET", json!(9));

		let saved: Value = serde_json::from_str(&storage.load("k").expect("blob")).expect("json");
		assert_eq!(saved, json!({ "count": 9, "ui": { "theme": "dark" } }));
	}

	#[test]
	fn test_restore_merges_saved_blob() {
		let store = store_with_count();
		let storage = MemoryStorage::new();
		storage.store("k", r#"{"count":42,"ui":{"theme":"light"}}"#);

		let restored = restore(&store, &storage, &PersistenceOptions::new("k"));

		assert!(restored);
		let state = store.state();
		assert_eq!(state["count"], json!(42));
		assert_eq!(state["ui"]["theme"], json!("light"));
		// Keys absent from the blob keep their initial values.
		assert_eq!(state["ui"]["scratch"], json!(1));
	}

	#[test]
	fn test_restore_ignores_garbage_blob() {
		let store = store_with_count();
		let storage = MemoryStorage::new();
		storage.store("k", "{not json");

		assert!(!restore(&store, &storage, &PersistenceOptions::new("k")));
		assert_eq!(store.state()["count"], json!(0));
	}

	#[test]
	fn test_restore_missing_blob_is_noop() {
		let store = store_with_count();
		let storage = MemoryStorage::new();
		assert!(!restore(&store, &storage, &PersistenceOptions::new("k")));
	}

	#[test]
	fn test_detached_mirror_stops_writing() {
		let store = store_with_count();
		let storage = Rc::new(MemoryStorage::new());
		let handle = attach(&store, storage.clone(), PersistenceOptions::new("k"));

		store.commit("SET", json!(1));
		store.unsubscribe(handle);
		store.commit("SET", json!(2));

		let saved: Value = serde_json::from_str(&storage.load("k").expect("blob")).expect("json");
		assert_eq!(saved["count"], json!(1));
	}
}
