//! Session state container and snapshots.

use onboard_protocol::{Account, ChainId, PersistedSession};
use serde::Serialize;

/// Connection status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
	Disconnected,
	Connecting,
	Connected,
}

impl SessionStatus {
	pub fn is_connected(&self) -> bool {
		matches!(self, SessionStatus::Connected)
	}
}

/// Immutable view of session state delivered to subscribers.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
	pub status: SessionStatus,
	/// Active connector id, set from `Connecting` onwards.
	pub connector_id: Option<String>,
	/// Full account list from the active connector.
	pub accounts: Vec<Account>,
	/// Selected account; non-empty exactly while `Connected`.
	pub selected_account: Option<Account>,
	/// Selected chain; always present in the chain registry.
	pub selected_chain: ChainId,
	/// Message of the last recorded operation failure.
	pub last_error: Option<String>,
}

/// Mutable session aggregate owned by the session manager.
///
/// Invariant: `selected_account` names a member of `accounts` and is set
/// exactly while `Connected`.
#[derive(Debug)]
pub(crate) struct SessionState {
	pub status: SessionStatus,
	pub connector_id: Option<String>,
	pub accounts: Vec<Account>,
	pub selected_account: Option<String>,
	pub selected_chain: ChainId,
	pub last_error: Option<String>,
}

impl SessionState {
	pub fn new(selected_chain: ChainId) -> Self {
		Self {
			status: SessionStatus::Disconnected,
			connector_id: None,
			accounts: Vec::new(),
			selected_account: None,
			selected_chain,
			last_error: None,
		}
	}

	/// Clears everything except the chain selection.
	pub fn reset(&mut self) {
		self.status = SessionStatus::Disconnected;
		self.connector_id = None;
		self.accounts.clear();
		self.selected_account = None;
		self.last_error = None;
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		let selected_account = self
			.selected_account
			.as_deref()
			.and_then(|address| self.accounts.iter().find(|a| a.address == address))
			.cloned();
		SessionSnapshot {
			status: self.status,
			connector_id: self.connector_id.clone(),
			accounts: self.accounts.clone(),
			selected_account,
			selected_chain: self.selected_chain.clone(),
			last_error: self.last_error.clone(),
		}
	}

	/// Durable subset written to the persistent store.
	pub fn durable(&self, auto_connect: bool) -> PersistedSession {
		PersistedSession {
			connector_id: self.connector_id.clone(),
			account_address: self.selected_account.clone(),
			chain_id: Some(self.selected_chain.clone()),
			auto_connect,
		}
	}
}
