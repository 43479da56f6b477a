//! Key/value persistence with lossless value round-trips.
//!
//! The backing store is string-keyed and string-valued (browser local
//! storage, a JSON file, an in-memory map). A serialization layer on top
//! round-trips extended value types - see [`onboard_protocol::value`] -
//! and treats any corrupted persisted value as absent rather than failing
//! startup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use onboard_protocol::{PersistedSession, fields, from_store_string, to_store_string};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// String-keyed, string-valued backing store.
pub trait StorageBackend: Send + Sync {
	/// Reads the raw string stored under `key`.
	fn get(&self, key: &str) -> Option<String>;
	/// Stores `value` under `key`.
	fn set(&self, key: &str, value: String);
	/// Removes `key` if present.
	fn remove(&self, key: &str);
}

/// Process-lifetime in-memory store, the default backend.
#[derive(Default)]
pub struct MemoryStorage {
	entries: RwLock<HashMap<String, String>>,
}

impl StorageBackend for MemoryStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.read().get(key).cloned()
	}

	fn set(&self, key: &str, value: String) {
		self.entries.write().insert(key.to_string(), value);
	}

	fn remove(&self, key: &str) {
		self.entries.write().remove(key);
	}
}

/// JSON-file-backed store for hosts without a native key/value store.
pub struct FileStorage {
	path: PathBuf,
	entries: RwLock<HashMap<String, String>>,
}

impl FileStorage {
	/// Opens `path`, treating a missing or unreadable file as empty.
	pub fn open(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let entries = std::fs::read_to_string(&path)
			.ok()
			.and_then(|raw| serde_json::from_str(&raw).ok())
			.unwrap_or_default();
		Self {
			path,
			entries: RwLock::new(entries),
		}
	}

	fn flush(&self, entries: &HashMap<String, String>) {
		if let Some(parent) = self.path.parent() {
			let _ = std::fs::create_dir_all(parent);
		}
		let json = match serde_json::to_string_pretty(entries) {
			Ok(json) => json,
			Err(err) => {
				warn!(target = "onboard.store", error = %err, "failed to encode store file");
				return;
			}
		};
		if let Err(err) = std::fs::write(&self.path, json) {
			warn!(
				target = "onboard.store",
				path = %self.path.display(),
				error = %err,
				"failed to write store file"
			);
		}
	}
}

impl StorageBackend for FileStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.read().get(key).cloned()
	}

	fn set(&self, key: &str, value: String) {
		let mut entries = self.entries.write();
		entries.insert(key.to_string(), value);
		self.flush(&entries);
	}

	fn remove(&self, key: &str) {
		let mut entries = self.entries.write();
		if entries.remove(key).is_some() {
			self.flush(&entries);
		}
	}
}

/// Namespaced, typed facade over the raw backing store for session fields.
///
/// Keys are namespaced per app to avoid collision with unrelated stored
/// data. Reads fall back to the caller-supplied default on corruption;
/// writes are best-effort and never surface failures to the session.
pub struct SessionStore {
	backend: Arc<dyn StorageBackend>,
	namespace: String,
}

impl SessionStore {
	/// Creates a store scoped to `app_name`.
	pub fn new(backend: Arc<dyn StorageBackend>, app_name: &str) -> Self {
		Self {
			backend,
			namespace: format!("{app_name}:session"),
		}
	}

	fn key(&self, field: &str) -> String {
		format!("{}:{}", self.namespace, field)
	}

	/// Reads a typed field, falling back to `default` on any corruption.
	pub fn get_or<T: DeserializeOwned>(&self, field: &str, default: T) -> T {
		let Some(raw) = self.backend.get(&self.key(field)) else {
			return default;
		};
		match from_store_string(&raw) {
			Some(value) => value,
			None => {
				warn!(target = "onboard.store", field, "corrupt persisted value; using default");
				default
			}
		}
	}

	/// Writes a typed field; encoding failures are swallowed.
	pub fn set<T: Serialize>(&self, field: &str, value: &T) {
		match to_store_string(value) {
			Ok(raw) => self.backend.set(&self.key(field), raw),
			Err(err) => warn!(target = "onboard.store", field, error = %err, "failed to encode persisted value"),
		}
	}

	/// Removes a field if present.
	pub fn remove(&self, field: &str) {
		self.backend.remove(&self.key(field));
	}

	/// Loads the durable session subset, field-wise.
	///
	/// Each field falls back independently so one corrupt entry does not
	/// discard the rest.
	pub fn load(&self) -> PersistedSession {
		PersistedSession {
			connector_id: self.get_or(fields::CONNECTOR, None),
			account_address: self.get_or(fields::ACCOUNT, None),
			chain_id: self.get_or(fields::CHAIN, None),
			auto_connect: self.get_or(fields::AUTO_CONNECT, false),
		}
	}

	/// Persists the durable subset, one storage key per field.
	pub fn save(&self, session: &PersistedSession) {
		match &session.connector_id {
			Some(id) => self.set(fields::CONNECTOR, id),
			None => self.remove(fields::CONNECTOR),
		}
		match &session.account_address {
			Some(address) => self.set(fields::ACCOUNT, address),
			None => self.remove(fields::ACCOUNT),
		}
		match &session.chain_id {
			Some(chain) => self.set(fields::CHAIN, chain),
			None => self.remove(fields::CHAIN),
		}
		self.set(fields::AUTO_CONNECT, &session.auto_connect);
		debug!(target = "onboard.store", connector = ?session.connector_id, "saved durable session state");
	}

	/// Removes every durable session field.
	pub fn clear(&self) {
		for field in [fields::CONNECTOR, fields::ACCOUNT, fields::CHAIN, fields::AUTO_CONNECT] {
			self.remove(field);
		}
	}
}
