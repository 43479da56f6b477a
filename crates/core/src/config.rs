//! Configuration entry point that wires the core.

use std::sync::Arc;

use onboard_protocol::{Chain, ChainId};

use crate::backend::{AccountState, ChainBackend};
use crate::chain::ChainRegistry;
use crate::connector::{ConnectorRegistry, WalletConnector};
use crate::error::{Error, Result};
use crate::session::{self, SessionManager, SessionSnapshot, SessionSubscription};
use crate::store::{MemoryStorage, SessionStore, StorageBackend};
use crate::tx::{SendRequest, TxHandle};

/// Configuration accepted by [`WalletCore::new`].
pub struct CoreConfig {
	app_name: String,
	chains: Vec<Chain>,
	connectors: Vec<Arc<dyn WalletConnector>>,
	auto_connect: bool,
	storage: Arc<dyn StorageBackend>,
	backend: Option<Arc<dyn ChainBackend>>,
}

impl CoreConfig {
	/// Creates a configuration for `app_name` with in-memory storage.
	pub fn new(app_name: impl Into<String>) -> Self {
		Self {
			app_name: app_name.into(),
			chains: Vec::new(),
			connectors: Vec::new(),
			auto_connect: false,
			storage: Arc::new(MemoryStorage::default()),
			backend: None,
		}
	}

	/// Sets the configured chains; the first is the default selection.
	pub fn with_chains(mut self, chains: Vec<Chain>) -> Self {
		self.chains = chains;
		self
	}

	/// Sets the configured connectors.
	pub fn with_connectors(mut self, connectors: Vec<Arc<dyn WalletConnector>>) -> Self {
		self.connectors = connectors;
		self
	}

	/// Enables silent reconnection at startup.
	pub fn with_auto_connect(mut self, enabled: bool) -> Self {
		self.auto_connect = enabled;
		self
	}

	/// Replaces the persistence backend.
	pub fn with_storage(mut self, storage: Arc<dyn StorageBackend>) -> Self {
		self.storage = storage;
		self
	}

	/// Sets the chain-scoped query/submission backend.
	pub fn with_backend(mut self, backend: Arc<dyn ChainBackend>) -> Self {
		self.backend = Some(backend);
		self
	}
}

/// Fully wired core: registries, session state machine, and transaction
/// surface, ready for use by UI collaborators.
pub struct WalletCore {
	manager: Arc<SessionManager>,
	backend: Option<Arc<dyn ChainBackend>>,
}

impl WalletCore {
	/// Wires registries and the session state machine from `config`.
	pub fn new(config: CoreConfig) -> Result<Self> {
		let chains = ChainRegistry::new(config.chains);
		let Some(default_chain) = chains.first().map(|c| c.id.clone()) else {
			return Err(Error::Config("at least one chain must be configured".to_string()));
		};
		let connectors = ConnectorRegistry::new(config.connectors);
		let store = SessionStore::new(config.storage, &config.app_name);

		// Restore the persisted chain selection when still registered.
		let initial_chain = store
			.load()
			.chain_id
			.filter(|id| chains.contains(id))
			.unwrap_or(default_chain);

		let manager = SessionManager::new(connectors, chains, store, config.auto_connect, initial_chain);
		Ok(Self {
			manager,
			backend: config.backend,
		})
	}

	/// Attempts silent restoration of the persisted session.
	pub async fn restore(&self) -> SessionSnapshot {
		session::restore(&self.manager).await
	}

	/// Session state machine backing this core.
	pub fn session(&self) -> &Arc<SessionManager> {
		&self.manager
	}

	/// Current session snapshot.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.manager.snapshot()
	}

	/// Subscribes to committed session changes.
	pub fn subscribe(&self, callback: impl Fn(&SessionSnapshot) + Send + Sync + 'static) -> SessionSubscription {
		self.manager.subscribe(callback)
	}

	/// Connects to the configured connector with id `connector_id`.
	pub async fn connect(&self, connector_id: &str) -> Result<SessionSnapshot> {
		self.manager.connect(connector_id).await
	}

	/// Disconnects the session; idempotent.
	pub async fn disconnect(&self) -> SessionSnapshot {
		self.manager.disconnect().await
	}

	/// Selects `address` from the current account list.
	pub fn select_account(&self, address: &str) -> Result<SessionSnapshot> {
		self.manager.select_account(address)
	}

	/// Switches the session's current chain.
	pub async fn switch_chain(&self, chain_id: &ChainId) -> Result<SessionSnapshot> {
		self.manager.switch_chain(chain_id).await
	}

	fn backend(&self) -> Result<Arc<dyn ChainBackend>> {
		self.backend
			.clone()
			.ok_or_else(|| Error::Config("no chain backend configured".to_string()))
	}

	fn active_connector_for(&self, address: &str) -> Result<Arc<dyn WalletConnector>> {
		let snapshot = self.manager.snapshot();
		if !snapshot.accounts.iter().any(|a| a.address == address) {
			return Err(Error::InvalidAccount(address.to_string()));
		}
		let Some(connector_id) = snapshot.connector_id else {
			return Err(Error::InvalidAccount(address.to_string()));
		};
		self.manager
			.active_connector()
			.ok_or(Error::ProviderUnavailable(connector_id))
	}

	/// Fetches balance and nonce for `address` at the current chain.
	pub async fn account_state(&self, address: &str) -> Result<AccountState> {
		let backend = self.backend()?;
		let chain = self.manager.snapshot().selected_chain;
		backend.account_state(&chain, address).await
	}

	/// Signs a free-form message with the active connector.
	///
	/// Checks the declared capability before delegating so unsupported
	/// providers fail fast.
	pub async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>> {
		let connector = self.active_connector_for(address)?;
		if !connector.meta().features.message_signing {
			return Err(Error::UnsupportedOperation("message signing"));
		}
		connector.sign_message(address, message).await
	}

	/// Submits a transaction attempt and returns its tracking handle.
	///
	/// Each call is an independent attempt, even for the same sender.
	pub fn submit_transaction(&self, request: SendRequest) -> Result<TxHandle> {
		let backend = self.backend()?;
		let connector = self.active_connector_for(&request.sender)?;
		let chain = self.manager.snapshot().selected_chain;
		let epochs = self.manager.epoch_watch();
		let epoch = self.manager.current_epoch();
		Ok(crate::tx::spawn_attempt(connector, backend, chain, request, epochs, epoch))
	}
}
