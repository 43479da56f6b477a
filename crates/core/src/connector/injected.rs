//! Injected-extension connector over the host-global provider registry.
//!
//! Browser-style hosts inject wallet providers into a shared registry
//! keyed by provider name; each entry exposes an `enable(app_name)` call
//! yielding a signer-capable handle plus a version string. The global
//! lookup is wrapped behind [`lookup_extension`], performed at connect
//! time and re-probed via `is_available`, rather than read ad hoc
//! throughout the codebase.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use onboard_protocol::{Account, ChainId};
use parking_lot::RwLock;
use tokio::time::timeout;
use tracing::debug;

use super::{AccountSubscription, AccountsCallback, ConnectorFeatures, ConnectorMeta, WalletConnector, stamp_accounts};
use crate::error::{Error, Result};

const ENABLE_TIMEOUT: Duration = Duration::from_secs(60);
const SIGN_TIMEOUT: Duration = Duration::from_secs(120);

/// Entry point a host registers for one injected wallet provider.
#[async_trait]
pub trait InjectedExtension: Send + Sync {
	/// Provider implementation version string.
	fn version(&self) -> &str;

	/// Requests authorization for `app_name`, yielding a signer-capable
	/// handle on approval.
	async fn enable(&self, app_name: &str) -> Result<Arc<dyn ExtensionHandle>>;
}

/// Signer-capable handle returned by a successful enable.
#[async_trait]
pub trait ExtensionHandle: Send + Sync {
	/// Lists the accounts the user exposed to this app.
	async fn accounts(&self) -> Result<Vec<Account>>;

	/// Subscribes to account-set changes; optional capability.
	fn subscribe_accounts(&self, callback: AccountsCallback) -> Result<AccountSubscription> {
		let _ = callback;
		Err(Error::UnsupportedOperation("account subscriptions"))
	}

	/// Signs a transaction payload for `address`.
	async fn sign(&self, address: &str, payload: &[u8]) -> Result<Vec<u8>>;

	/// Signs a free-form message; optional capability.
	async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>> {
		let _ = (address, message);
		Err(Error::UnsupportedOperation("message signing"))
	}
}

fn registry() -> &'static RwLock<HashMap<String, Arc<dyn InjectedExtension>>> {
	static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<dyn InjectedExtension>>>> = OnceLock::new();
	REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers a host-injected provider under `name`.
pub fn register_extension(name: impl Into<String>, extension: Arc<dyn InjectedExtension>) {
	registry().write().insert(name.into(), extension);
}

/// Removes a host-injected provider; returns whether one was present.
pub fn unregister_extension(name: &str) -> bool {
	registry().write().remove(name).is_some()
}

/// Scoped lookup over the host-global provider registry.
pub fn lookup_extension(name: &str) -> Option<Arc<dyn InjectedExtension>> {
	registry().read().get(name).cloned()
}

/// Connector over one injected browser-extension provider.
pub struct InjectedConnector {
	meta: ConnectorMeta,
	provider_key: String,
	app_name: String,
	handle: RwLock<Option<Arc<dyn ExtensionHandle>>>,
}

impl InjectedConnector {
	/// Creates a connector for the provider injected under `provider_key`.
	pub fn new(provider_key: impl Into<String>, app_name: impl Into<String>) -> Self {
		let provider_key = provider_key.into();
		Self {
			meta: ConnectorMeta {
				id: format!("injected:{provider_key}"),
				name: provider_key.clone(),
				features: ConnectorFeatures {
					multi_account: true,
					message_signing: true,
					..ConnectorFeatures::default()
				},
			},
			provider_key,
			app_name: app_name.into(),
			handle: RwLock::new(None),
		}
	}

	/// Overrides the display name shown in wallet pickers.
	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.meta.name = name.into();
		self
	}

	fn current_handle(&self) -> Result<Arc<dyn ExtensionHandle>> {
		self.handle
			.read()
			.clone()
			.ok_or_else(|| Error::ProviderUnavailable(self.meta.id.clone()))
	}
}

#[async_trait]
impl WalletConnector for InjectedConnector {
	fn id(&self) -> &str {
		&self.meta.id
	}

	fn meta(&self) -> &ConnectorMeta {
		&self.meta
	}

	fn is_available(&self) -> bool {
		lookup_extension(&self.provider_key).is_some()
	}

	async fn connect(&self, _chain_hint: Option<&ChainId>) -> Result<Vec<Account>> {
		let Some(extension) = lookup_extension(&self.provider_key) else {
			return Err(Error::ProviderUnavailable(self.meta.id.clone()));
		};

		debug!(
			target = "onboard.connector",
			provider = %self.provider_key,
			version = extension.version(),
			"enabling injected provider"
		);
		let handle = match timeout(ENABLE_TIMEOUT, extension.enable(&self.app_name)).await {
			Ok(result) => result?,
			Err(_) => return Err(Error::Timeout),
		};

		let accounts = handle.accounts().await?;
		if accounts.is_empty() {
			return Err(Error::NoAccounts);
		}

		*self.handle.write() = Some(handle);
		Ok(stamp_accounts(accounts, &self.meta.id))
	}

	async fn disconnect(&self) {
		if self.handle.write().take().is_some() {
			debug!(target = "onboard.connector", provider = %self.provider_key, "released injected provider handle");
		}
	}

	async fn list_accounts(&self) -> Result<Vec<Account>> {
		let handle = self.current_handle()?;
		let accounts = handle.accounts().await?;
		Ok(stamp_accounts(accounts, &self.meta.id))
	}

	fn subscribe_accounts(&self, callback: AccountsCallback) -> Result<AccountSubscription> {
		let handle = self.current_handle()?;
		let connector_id = self.meta.id.clone();
		handle.subscribe_accounts(Arc::new(move |accounts| {
			callback(stamp_accounts(accounts, &connector_id));
		}))
	}

	async fn sign_payload(&self, address: &str, payload: &[u8]) -> Result<Vec<u8>> {
		let handle = self.current_handle()?;
		match timeout(SIGN_TIMEOUT, handle.sign(address, payload)).await {
			Ok(result) => result,
			Err(_) => Err(Error::SigningFailed("no response from provider".to_string())),
		}
	}

	async fn sign_message(&self, address: &str, message: &[u8]) -> Result<Vec<u8>> {
		let handle = self.current_handle()?;
		match timeout(SIGN_TIMEOUT, handle.sign_message(address, message)).await {
			Ok(result) => result,
			Err(_) => Err(Error::SigningFailed("no response from provider".to_string())),
		}
	}
}
