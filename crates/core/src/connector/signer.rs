//! Connector bound to an API-client signer.
//!
//! Wraps key material held by an external signing service (or a local
//! keystore exposed through one) behind the connector contract. The
//! account list is fixed at construction, so listing needs no fresh
//! authorization and the connector is always available.

use std::sync::Arc;

use async_trait::async_trait;
use onboard_protocol::{Account, ChainId};
use tracing::debug;

use super::{ConnectorFeatures, ConnectorMeta, WalletConnector, stamp_accounts};
use crate::error::{Error, Result};

/// Signing capability bound to an API client.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
	/// Accounts this signer can sign for.
	fn accounts(&self) -> Vec<Account>;

	/// Signs a transaction payload for `address`.
	async fn sign(&self, address: &str, payload: &[u8]) -> Result<Vec<u8>>;

	/// Signs a free-form message; optional capability.
	async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>> {
		let _ = (address, message);
		Err(Error::UnsupportedOperation("message signing"))
	}
}

/// Connector over a bound [`TransactionSigner`].
pub struct SignerConnector {
	meta: ConnectorMeta,
	signer: Arc<dyn TransactionSigner>,
}

impl SignerConnector {
	/// Creates a connector with the given identity over `signer`.
	pub fn new(id: impl Into<String>, name: impl Into<String>, signer: Arc<dyn TransactionSigner>) -> Self {
		Self {
			meta: ConnectorMeta {
				id: id.into(),
				name: name.into(),
				features: ConnectorFeatures {
					multi_account: true,
					persisted_accounts: true,
					..ConnectorFeatures::default()
				},
			},
			signer,
		}
	}
}

#[async_trait]
impl WalletConnector for SignerConnector {
	fn id(&self) -> &str {
		&self.meta.id
	}

	fn meta(&self) -> &ConnectorMeta {
		&self.meta
	}

	fn is_available(&self) -> bool {
		true
	}

	async fn connect(&self, _chain_hint: Option<&ChainId>) -> Result<Vec<Account>> {
		let accounts = self.signer.accounts();
		if accounts.is_empty() {
			return Err(Error::NoAccounts);
		}
		Ok(stamp_accounts(accounts, &self.meta.id))
	}

	async fn disconnect(&self) {
		debug!(target = "onboard.connector", connector = %self.meta.id, "signer connector released");
	}

	async fn list_accounts(&self) -> Result<Vec<Account>> {
		Ok(stamp_accounts(self.signer.accounts(), &self.meta.id))
	}

	async fn sign_payload(&self, address: &str, payload: &[u8]) -> Result<Vec<u8>> {
		self.signer.sign(address, payload).await
	}

	async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>> {
		self.signer.sign_message(address, message).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct FixedSigner;

	#[async_trait]
	impl TransactionSigner for FixedSigner {
		fn accounts(&self) -> Vec<Account> {
			vec![Account::new("addr-1").with_name("Ops")]
		}

		async fn sign(&self, _address: &str, payload: &[u8]) -> Result<Vec<u8>> {
			Ok(payload.to_vec())
		}
	}

	#[tokio::test]
	async fn connect_lists_bound_accounts() {
		let connector = SignerConnector::new("signer:api", "API signer", Arc::new(FixedSigner));
		let accounts = connector.connect(None).await.unwrap();
		assert_eq!(accounts.len(), 1);
		assert_eq!(accounts[0].connector_id, "signer:api");
	}

	#[tokio::test]
	async fn message_signing_defaults_to_unsupported() {
		let connector = SignerConnector::new("signer:api", "API signer", Arc::new(FixedSigner));
		let err = connector.sign_message("addr-1", b"hello").await.unwrap_err();
		assert!(matches!(err, Error::UnsupportedOperation(_)));
	}
}
