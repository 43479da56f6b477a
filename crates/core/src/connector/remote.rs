//! Remote-session connector for QR/deep-link wallet pairing.
//!
//! The connector drives the pairing lifecycle; the actual relay protocol
//! lives behind [`RemoteWallet`], supplied at construction. While a
//! pairing is awaiting approval its URI is observable for rendering as a
//! QR code or deep link.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use onboard_protocol::{Account, Chain, ChainId};
use parking_lot::RwLock;
use tokio::time::timeout;
use tracing::debug;

use super::{AccountSubscription, AccountsCallback, ConnectorFeatures, ConnectorMeta, WalletConnector, stamp_accounts};
use crate::error::{Error, Result};

const PAIRING_TIMEOUT: Duration = Duration::from_secs(300);
const SIGN_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for a remote-session connector.
#[derive(Debug, Clone)]
pub struct RemoteConnectorConfig {
	/// Relay authentication token issued to the dApp.
	pub project_id: String,
	/// Chains advertised during pairing.
	pub supported_chains: Vec<ChainId>,
	/// App name shown on the remote wallet's approval screen.
	pub app_name: String,
}

/// An open pairing awaiting approval on the remote wallet.
pub struct RemotePairing {
	/// URI rendered as a QR code or deep link.
	pub uri: String,
	/// Resolves once the remote wallet approves or rejects.
	pub approval: BoxFuture<'static, Result<RemoteSession>>,
}

/// An approved remote session.
pub struct RemoteSession {
	/// Relay topic identifying this session.
	pub topic: String,
	/// Accounts approved by the remote wallet.
	pub accounts: Vec<Account>,
	/// Signer endpoint for the approved session.
	pub signer: Arc<dyn RemoteSigner>,
}

/// Signer endpoint of an approved remote session.
#[async_trait]
pub trait RemoteSigner: Send + Sync {
	/// Signs a transaction payload for `address`.
	async fn sign(&self, address: &str, payload: &[u8]) -> Result<Vec<u8>>;

	/// Signs a free-form message; optional capability.
	async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>> {
		let _ = (address, message);
		Err(Error::UnsupportedOperation("message signing"))
	}

	/// Subscribes to account-set changes; optional capability.
	fn subscribe_accounts(&self, callback: AccountsCallback) -> Result<AccountSubscription> {
		let _ = callback;
		Err(Error::UnsupportedOperation("account subscriptions"))
	}

	/// Asks the remote wallet to retarget to `chain`; optional capability.
	async fn switch_chain(&self, chain: &Chain) -> Result<()> {
		let _ = chain;
		Err(Error::UnsupportedOperation("chain switching"))
	}
}

/// Transport seam to the remote-session relay.
///
/// Implementations speak the pairing protocol; the connector only drives
/// the session lifecycle over it.
#[async_trait]
pub trait RemoteWallet: Send + Sync {
	/// Whether the relay transport is currently usable.
	fn is_reachable(&self) -> bool;

	/// Opens a pairing advertised with the configured chains.
	async fn open_pairing(&self, config: &RemoteConnectorConfig, chain_hint: Option<&ChainId>) -> Result<RemotePairing>;

	/// Tears down a paired session topic; best-effort.
	async fn close(&self, topic: &str);
}

struct ActiveRemote {
	topic: String,
	signer: Arc<dyn RemoteSigner>,
}

/// Connector for remote signers reached through a pairing relay.
pub struct RemoteConnector {
	meta: ConnectorMeta,
	config: RemoteConnectorConfig,
	wallet: Arc<dyn RemoteWallet>,
	pairing_uri: RwLock<Option<String>>,
	session: RwLock<Option<ActiveRemote>>,
}

impl RemoteConnector {
	/// Creates a connector over `wallet` with the given relay config.
	pub fn new(config: RemoteConnectorConfig, wallet: Arc<dyn RemoteWallet>) -> Self {
		Self {
			meta: ConnectorMeta {
				id: "remote:pairing".to_string(),
				name: "Remote wallet".to_string(),
				features: ConnectorFeatures {
					multi_account: true,
					chain_switch: true,
					message_signing: true,
					..ConnectorFeatures::default()
				},
			},
			config,
			wallet,
			pairing_uri: RwLock::new(None),
			session: RwLock::new(None),
		}
	}

	/// Overrides the connector id and display name.
	pub fn with_identity(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
		self.meta.id = id.into();
		self.meta.name = name.into();
		self
	}

	/// URI of the pairing currently awaiting approval, if any.
	pub fn pairing_uri(&self) -> Option<String> {
		self.pairing_uri.read().clone()
	}

	fn current_signer(&self) -> Result<Arc<dyn RemoteSigner>> {
		self.session
			.read()
			.as_ref()
			.map(|active| active.signer.clone())
			.ok_or_else(|| Error::ProviderUnavailable(self.meta.id.clone()))
	}
}

#[async_trait]
impl WalletConnector for RemoteConnector {
	fn id(&self) -> &str {
		&self.meta.id
	}

	fn meta(&self) -> &ConnectorMeta {
		&self.meta
	}

	fn is_available(&self) -> bool {
		self.wallet.is_reachable()
	}

	async fn connect(&self, chain_hint: Option<&ChainId>) -> Result<Vec<Account>> {
		if !self.wallet.is_reachable() {
			return Err(Error::ProviderUnavailable(self.meta.id.clone()));
		}

		let pairing = self.wallet.open_pairing(&self.config, chain_hint).await?;
		*self.pairing_uri.write() = Some(pairing.uri.clone());
		debug!(target = "onboard.connector", connector = %self.meta.id, "pairing open; awaiting approval");

		let approved = timeout(PAIRING_TIMEOUT, pairing.approval).await;
		*self.pairing_uri.write() = None;

		let session = match approved {
			Ok(result) => result?,
			Err(_) => return Err(Error::Timeout),
		};
		if session.accounts.is_empty() {
			self.wallet.close(&session.topic).await;
			return Err(Error::NoAccounts);
		}

		let accounts = stamp_accounts(session.accounts.clone(), &self.meta.id);
		*self.session.write() = Some(ActiveRemote {
			topic: session.topic,
			signer: session.signer,
		});
		Ok(accounts)
	}

	async fn disconnect(&self) {
		let active = self.session.write().take();
		if let Some(active) = active {
			debug!(target = "onboard.connector", connector = %self.meta.id, topic = %active.topic, "closing remote session");
			self.wallet.close(&active.topic).await;
		}
		*self.pairing_uri.write() = None;
	}

	fn subscribe_accounts(&self, callback: AccountsCallback) -> Result<AccountSubscription> {
		let signer = self.current_signer()?;
		let connector_id = self.meta.id.clone();
		signer.subscribe_accounts(Arc::new(move |accounts| {
			callback(stamp_accounts(accounts, &connector_id));
		}))
	}

	async fn sign_payload(&self, address: &str, payload: &[u8]) -> Result<Vec<u8>> {
		let signer = self.current_signer()?;
		match timeout(SIGN_TIMEOUT, signer.sign(address, payload)).await {
			Ok(result) => result,
			Err(_) => Err(Error::SigningFailed("no response from remote wallet".to_string())),
		}
	}

	async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>> {
		let signer = self.current_signer()?;
		match timeout(SIGN_TIMEOUT, signer.sign_message(address, message)).await {
			Ok(result) => result,
			Err(_) => Err(Error::SigningFailed("no response from remote wallet".to_string())),
		}
	}

	async fn switch_chain(&self, chain: &Chain) -> Result<()> {
		let signer = self.current_signer()?;
		signer.switch_chain(chain).await
	}
}
