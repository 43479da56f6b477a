//! Persisted session layout read back at startup.

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// Storage field names for the durable session subset.
///
/// Each field is stored under its own namespaced key.
pub mod fields {
	pub const CONNECTOR: &str = "connector";
	pub const ACCOUNT: &str = "account";
	pub const CHAIN: &str = "chain";
	pub const AUTO_CONNECT: &str = "autoConnect";
}

/// Durable subset of session state, written on every committed transition
/// and used for silent reconnection at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
	/// Active connector id, when a session was established.
	#[serde(default)]
	pub connector_id: Option<String>,
	/// Address of the selected account.
	#[serde(default)]
	pub account_address: Option<String>,
	/// Selected chain id.
	#[serde(default)]
	pub chain_id: Option<ChainId>,
	/// Whether startup may attempt a silent reconnect.
	#[serde(default)]
	pub auto_connect: bool,
}

impl PersistedSession {
	/// True when no session data survived.
	pub fn is_empty(&self) -> bool {
		self.connector_id.is_none() && self.account_address.is_none() && self.chain_id.is_none()
	}
}
