//! Uniform adapters around heterogeneous external wallet integrations.
//!
//! Every wallet integration - in-browser extension, remote-session
//! protocol, API-bound signer - differs in transport and trust model. A
//! single capability-flagged contract lets the session state machine
//! treat them uniformly; callers query [`ConnectorFeatures`] before
//! invoking optional operations instead of relying on errors for "not
//! supported", so unsupported controls degrade gracefully.

mod injected;
mod registry;
mod remote;
mod signer;

use std::sync::Arc;

use async_trait::async_trait;
use onboard_protocol::{Account, Chain, ChainId};

pub use injected::{ExtensionHandle, InjectedConnector, InjectedExtension, lookup_extension, register_extension, unregister_extension};
pub use registry::ConnectorRegistry;
pub use remote::{RemoteConnector, RemoteConnectorConfig, RemotePairing, RemoteSession, RemoteSigner, RemoteWallet};
pub use signer::{SignerConnector, TransactionSigner};

use crate::error::{Error, Result};

/// Human-readable metadata describing a connector.
#[derive(Debug, Clone)]
pub struct ConnectorMeta {
	/// Stable identifier used for registry lookup and persistence.
	pub id: String,
	/// Display name for wallet pickers.
	pub name: String,
	/// Declared optional capabilities.
	pub features: ConnectorFeatures,
}

/// Declared optional capabilities of a connector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectorFeatures {
	/// The provider can expose more than one account.
	pub multi_account: bool,
	/// The provider can retarget itself to another chain.
	pub chain_switch: bool,
	/// The provider can sign free-form messages.
	pub message_signing: bool,
	/// The provider can list accounts without a fresh authorization.
	pub persisted_accounts: bool,
}

/// Callback receiving a wholesale-replaced account list.
pub type AccountsCallback = Arc<dyn Fn(Vec<Account>) + Send + Sync>;

/// Explicit disposer for an account-change subscription.
///
/// The session state machine invokes it on disconnect or connector
/// replacement, so a stale callback can never mutate a superseded
/// session. Dropping the handle unsubscribes as well.
pub struct AccountSubscription {
	unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl AccountSubscription {
	/// Wraps the provider-specific unsubscribe action.
	pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
		Self {
			unsubscribe: Some(Box::new(unsubscribe)),
		}
	}

	/// Releases the subscription immediately.
	pub fn unsubscribe(mut self) {
		if let Some(dispose) = self.unsubscribe.take() {
			dispose();
		}
	}
}

impl Drop for AccountSubscription {
	fn drop(&mut self) {
		if let Some(dispose) = self.unsubscribe.take() {
			dispose();
		}
	}
}

impl std::fmt::Debug for AccountSubscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccountSubscription")
			.field("active", &self.unsubscribe.is_some())
			.finish()
	}
}

/// Uniform contract implemented by every wallet integration.
///
/// Connectors are constructed at configuration time and stay stateless
/// until selected by the session state machine; they are torn down on
/// disconnect or replacement.
#[async_trait]
pub trait WalletConnector: Send + Sync {
	/// Stable identifier used for registry lookup and persistence.
	fn id(&self) -> &str;

	/// Human-readable metadata and declared capabilities.
	fn meta(&self) -> &ConnectorMeta;

	/// Synchronous capability probe; never blocks, never errors.
	fn is_available(&self) -> bool;

	/// Requests user authorization from the external provider.
	///
	/// Returns a non-empty account list on success. An empty list is
	/// reported as [`Error::NoAccounts`].
	async fn connect(&self, chain_hint: Option<&ChainId>) -> Result<Vec<Account>>;

	/// Releases provider resources; idempotent, best-effort, never fails.
	async fn disconnect(&self);

	/// Lists accounts without a fresh authorization round-trip.
	///
	/// Optional capability; see [`ConnectorFeatures::persisted_accounts`].
	async fn list_accounts(&self) -> Result<Vec<Account>> {
		Err(Error::UnsupportedOperation("persisted account listing"))
	}

	/// Pushes wholesale account-list replacements to `callback`.
	///
	/// Optional capability.
	fn subscribe_accounts(&self, callback: AccountsCallback) -> Result<AccountSubscription> {
		let _ = callback;
		Err(Error::UnsupportedOperation("account subscriptions"))
	}

	/// Signs a transaction payload with the externally held key.
	async fn sign_payload(&self, address: &str, payload: &[u8]) -> Result<Vec<u8>>;

	/// Signs a free-form message; optional capability.
	async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>> {
		let _ = (address, message);
		Err(Error::UnsupportedOperation("message signing"))
	}

	/// Asks the wallet itself to retarget to `chain`; optional capability.
	///
	/// Connectors without this capability leave the default in place and
	/// the session falls back to retargeting only its chain-scoped
	/// clients.
	async fn switch_chain(&self, chain: &Chain) -> Result<()> {
		let _ = chain;
		Err(Error::UnsupportedOperation("chain switching"))
	}
}

/// Stamps the owning connector id onto a listed account set.
pub(crate) fn stamp_accounts(mut accounts: Vec<Account>, connector_id: &str) -> Vec<Account> {
	for account in &mut accounts {
		account.connector_id = connector_id.to_string();
	}
	accounts
}
