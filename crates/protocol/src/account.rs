//! Account snapshots reported by connectors.

use serde::{Deserialize, Serialize};

/// A single account as listed by a connector.
///
/// Listings are immutable snapshots; a connector replaces the whole list
/// when the external provider's account set changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
	/// Chain-encoded address identity.
	pub address: String,
	/// Optional display name from the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Optional hex-encoded public key.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub public_key: Option<String>,
	/// Identifier of the connector that produced this snapshot.
	///
	/// Lookup reference only; the connector owns the account list.
	#[serde(default)]
	pub connector_id: String,
}

impl Account {
	/// Creates an account snapshot with only an address.
	pub fn new(address: impl Into<String>) -> Self {
		Self {
			address: address.into(),
			name: None,
			public_key: None,
			connector_id: String::new(),
		}
	}

	/// Sets the provider-supplied display name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Sets the hex-encoded public key.
	pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
		self.public_key = Some(public_key.into());
		self
	}
}
