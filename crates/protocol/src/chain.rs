//! Chain descriptors registered at configuration time.

use serde::{Deserialize, Serialize};

/// Unique chain identifier, typically derived from the genesis hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(String);

impl ChainId {
	/// Creates an identifier from its canonical string form.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the canonical string form.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for ChainId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ChainId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for ChainId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// Native-currency descriptor used for display and amount formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
}

/// A configured network, immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
	/// Unique identifier looked up during chain switches.
	pub id: ChainId,
	/// Human-readable network name.
	pub name: String,
	/// Native currency metadata.
	pub currency: NativeCurrency,
	/// Candidate RPC endpoints in preference order.
	pub rpc_urls: Vec<String>,
	/// Whether the network is a test network.
	#[serde(default)]
	pub testnet: bool,
}

impl Chain {
	/// Creates a chain descriptor with no RPC endpoints.
	pub fn new(id: impl Into<ChainId>, name: impl Into<String>, currency: NativeCurrency) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			currency,
			rpc_urls: Vec::new(),
			testnet: false,
		}
	}

	/// Appends an RPC endpoint candidate.
	pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
		self.rpc_urls.push(url.into());
		self
	}

	/// Marks the chain as a test network.
	pub fn with_testnet(mut self, testnet: bool) -> Self {
		self.testnet = testnet;
		self
	}
}
