//! Single-writer session state machine.
//!
//! All session mutation funnels through one commit path: mutate under the
//! state lock, persist the durable subset, then notify subscribers, all
//! while holding the commit lock so notifications arrive in commit order.
//! A connector-driven account push and a UI-driven call therefore never
//! interleave inconsistently; the last committed mutation wins.
//!
//! Subscriber callbacks must not invoke session operations synchronously;
//! they receive a snapshot and hand work back to their own executor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use onboard_protocol::{Account, ChainId};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::state::{SessionSnapshot, SessionState, SessionStatus};
use crate::chain::ChainRegistry;
use crate::connector::{AccountSubscription, ConnectorRegistry, WalletConnector};
use crate::error::{Error, Result};
use crate::store::SessionStore;

/// Callback receiving committed session snapshots.
pub type SessionCallback = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

type SubscriberList = Mutex<Vec<(u64, SessionCallback)>>;

/// Explicit disposer for a session subscription.
///
/// Dropping the handle unsubscribes as well.
pub struct SessionSubscription {
	id: u64,
	subscribers: std::sync::Weak<SubscriberList>,
}

impl SessionSubscription {
	/// Stops delivery of further snapshots.
	pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
	fn drop(&mut self) {
		if let Some(subscribers) = self.subscribers.upgrade() {
			subscribers.lock().retain(|(id, _)| *id != self.id);
		}
	}
}

/// Live resources of the currently active connector.
struct ActiveConnector {
	connector: Arc<dyn WalletConnector>,
	subscription: Option<AccountSubscription>,
}

/// Resets the in-flight connect flag when the attempt leaves scope.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

/// Owner and single mutator of session state.
pub struct SessionManager {
	connectors: ConnectorRegistry,
	chains: ChainRegistry,
	store: SessionStore,
	auto_connect: bool,
	state: Mutex<SessionState>,
	commit: Mutex<()>,
	subscribers: Arc<SubscriberList>,
	next_subscriber: AtomicU64,
	/// Session generation; bumped on disconnect and connector replacement
	/// so late results from superseded operations can be discarded and
	/// long-lived transaction subscriptions can observe supersession.
	epoch: watch::Sender<u64>,
	connecting: AtomicBool,
	active: Mutex<Option<ActiveConnector>>,
}

impl SessionManager {
	pub(crate) fn new(
		connectors: ConnectorRegistry,
		chains: ChainRegistry,
		store: SessionStore,
		auto_connect: bool,
		initial_chain: ChainId,
	) -> Arc<Self> {
		Arc::new(Self {
			connectors,
			chains,
			store,
			auto_connect,
			state: Mutex::new(SessionState::new(initial_chain)),
			commit: Mutex::new(()),
			subscribers: Arc::new(Mutex::new(Vec::new())),
			next_subscriber: AtomicU64::new(0),
			epoch: watch::channel(0).0,
			connecting: AtomicBool::new(false),
			active: Mutex::new(None),
		})
	}

	/// Current session snapshot.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.state.lock().snapshot()
	}

	/// Configured connector catalog.
	pub fn connectors(&self) -> &ConnectorRegistry {
		&self.connectors
	}

	/// Configured chain catalog.
	pub fn chains(&self) -> &ChainRegistry {
		&self.chains
	}

	pub(crate) fn store(&self) -> &SessionStore {
		&self.store
	}

	pub(crate) fn active_connector(&self) -> Option<Arc<dyn WalletConnector>> {
		self.active.lock().as_ref().map(|active| active.connector.clone())
	}

	pub(crate) fn current_epoch(&self) -> u64 {
		*self.epoch.borrow()
	}

	/// Observes session-generation bumps, used by transaction trackers to
	/// stop acting on events for a session that no longer exists.
	pub(crate) fn epoch_watch(&self) -> watch::Receiver<u64> {
		self.epoch.subscribe()
	}

	fn bump_epoch(&self) {
		self.epoch.send_modify(|epoch| *epoch += 1);
	}

	/// Subscribes to committed session changes.
	pub fn subscribe(&self, callback: impl Fn(&SessionSnapshot) + Send + Sync + 'static) -> SessionSubscription {
		let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
		self.subscribers.lock().push((id, Arc::new(callback)));
		SessionSubscription {
			id,
			subscribers: Arc::downgrade(&self.subscribers),
		}
	}

	fn commit(&self, mutate: impl FnOnce(&mut SessionState)) -> SessionSnapshot {
		let _ordering = self.commit.lock();
		let snapshot = {
			let mut state = self.state.lock();
			mutate(&mut state);
			state.snapshot()
		};
		self.finish_commit(&snapshot);
		snapshot
	}

	/// Persists the durable subset and notifies subscribers.
	///
	/// Must be called with the commit lock held.
	fn finish_commit(&self, snapshot: &SessionSnapshot) {
		match snapshot.status {
			SessionStatus::Connected => {
				let durable = {
					let state = self.state.lock();
					state.durable(self.auto_connect)
				};
				self.store.save(&durable);
			}
			SessionStatus::Disconnected => self.store.clear(),
			// Transient; the durable subset is written once the attempt
			// commits either way.
			SessionStatus::Connecting => {}
		}

		let callbacks: Vec<SessionCallback> = self.subscribers.lock().iter().map(|(_, cb)| cb.clone()).collect();
		for callback in callbacks {
			callback(snapshot);
		}
	}

	/// Connects to the configured connector with id `connector_id`.
	///
	/// A second call while one is in flight fails with
	/// [`Error::OperationInProgress`]. Calling while already connected
	/// replaces the active connector. A result arriving after the session
	/// was superseded by `disconnect` is discarded and the current
	/// snapshot returned unchanged.
	pub async fn connect(self: &Arc<Self>, connector_id: &str) -> Result<SessionSnapshot> {
		self.connect_inner(connector_id, false).await
	}

	pub(crate) async fn connect_inner(self: &Arc<Self>, connector_id: &str, silent: bool) -> Result<SessionSnapshot> {
		let Some(connector) = self.connectors.get(connector_id) else {
			return Err(Error::ProviderUnavailable(connector_id.to_string()));
		};

		if self
			.connecting
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			return Err(Error::OperationInProgress);
		}
		let _in_flight = InFlightGuard(&self.connecting);

		// Replace any currently active connector before dialing.
		self.teardown_active().await;

		let epoch = self.current_epoch();
		let chain_hint = self.state.lock().selected_chain.clone();
		self.commit(|state| {
			state.reset();
			state.status = SessionStatus::Connecting;
			state.connector_id = Some(connector.id().to_string());
		});

		let result = connector.connect(Some(&chain_hint)).await;

		if self.current_epoch() != epoch {
			debug!(target = "onboard.session", connector = connector_id, "discarding stale connect result");
			if result.is_ok() {
				connector.disconnect().await;
			}
			return Ok(self.snapshot());
		}

		match result {
			Ok(accounts) => self.commit_connected(&connector, epoch, accounts).await,
			Err(err) => {
				let message = (!silent).then(|| err.to_string());
				self.commit(|state| {
					state.reset();
					state.last_error = message.clone();
				});
				debug!(target = "onboard.session", connector = connector_id, error = %err, "connect failed");
				Err(err)
			}
		}
	}

	async fn commit_connected(
		self: &Arc<Self>,
		connector: &Arc<dyn WalletConnector>,
		epoch: u64,
		accounts: Vec<Account>,
	) -> Result<SessionSnapshot> {
		// Prefer the persisted previously-selected account when the new
		// list still contains it.
		let preferred = self.store.load().account_address;
		let selected = preferred
			.filter(|address| accounts.iter().any(|a| a.address == *address))
			.or_else(|| accounts.first().map(|a| a.address.clone()));

		let snapshot = self.commit(|state| {
			state.status = SessionStatus::Connected;
			state.accounts = accounts;
			state.selected_account = selected;
			state.last_error = None;
		});
		info!(
			target = "onboard.session",
			connector = connector.id(),
			accounts = snapshot.accounts.len(),
			"session connected"
		);

		let subscription = self.subscribe_connector_accounts(connector, epoch);

		// The session may have been superseded between the commit above
		// and here; if so, release the resources we just acquired.
		let stale = {
			let mut active = self.active.lock();
			if self.current_epoch() == epoch {
				*active = Some(ActiveConnector {
					connector: connector.clone(),
					subscription,
				});
				false
			} else {
				true
			}
		};
		if stale {
			connector.disconnect().await;
			return Ok(self.snapshot());
		}

		Ok(snapshot)
	}

	fn subscribe_connector_accounts(self: &Arc<Self>, connector: &Arc<dyn WalletConnector>, epoch: u64) -> Option<AccountSubscription> {
		let weak = Arc::downgrade(self);
		let connector_id = connector.id().to_string();
		let callback_id = connector_id.clone();
		match connector.subscribe_accounts(Arc::new(move |accounts| {
			let Some(manager) = weak.upgrade() else {
				return;
			};
			manager.handle_account_push(&callback_id, epoch, accounts);
		})) {
			Ok(subscription) => Some(subscription),
			Err(Error::UnsupportedOperation(_)) => {
				debug!(target = "onboard.session", connector = %connector_id, "connector has no account subscription capability");
				None
			}
			Err(err) => {
				warn!(target = "onboard.session", connector = %connector_id, error = %err, "account subscription failed; continuing without");
				None
			}
		}
	}

	/// Reconciles an account-change push from the active connector.
	///
	/// Never propagates errors; a malfunctioning push must not crash the
	/// session.
	fn handle_account_push(self: &Arc<Self>, connector_id: &str, epoch: u64, accounts: Vec<Account>) {
		if self.current_epoch() != epoch {
			debug!(target = "onboard.session", connector = connector_id, "discarding account push from superseded session");
			return;
		}
		{
			let state = self.state.lock();
			if state.status != SessionStatus::Connected || state.connector_id.as_deref() != Some(connector_id) {
				debug!(target = "onboard.session", connector = connector_id, "discarding account push outside active session");
				return;
			}
		}

		if accounts.is_empty() {
			// The wallet revoked access.
			info!(target = "onboard.session", connector = connector_id, "provider revoked all accounts; disconnecting");
			self.bump_epoch();
			if let Some(active) = self.active.lock().take() {
				Self::dispose_active(active);
			}
			self.commit(|state| state.reset());
			return;
		}

		self.commit(|state| {
			let keep_selection = state
				.selected_account
				.as_deref()
				.is_some_and(|address| accounts.iter().any(|a| a.address == address));
			if !keep_selection {
				state.selected_account = accounts.first().map(|a| a.address.clone());
			}
			state.accounts = accounts;
		});
	}

	/// Disconnects the session; idempotent, any state to `Disconnected`.
	pub async fn disconnect(&self) -> SessionSnapshot {
		self.bump_epoch();
		let active = self.active.lock().take();
		if let Some(active) = active {
			if let Some(subscription) = active.subscription {
				subscription.unsubscribe();
			}
			active.connector.disconnect().await;
		}
		let snapshot = self.commit(|state| state.reset());
		info!(target = "onboard.session", "session disconnected");
		snapshot
	}

	async fn teardown_active(&self) {
		let active = self.active.lock().take();
		if let Some(active) = active {
			self.bump_epoch();
			if let Some(subscription) = active.subscription {
				subscription.unsubscribe();
			}
			active.connector.disconnect().await;
		}
	}

	/// Releases connector resources without blocking the caller.
	///
	/// Used from push callbacks, which may not be on a runtime thread.
	fn dispose_active(active: ActiveConnector) {
		if let Some(subscription) = active.subscription {
			subscription.unsubscribe();
		}
		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(async move { active.connector.disconnect().await });
		}
	}

	/// Selects `address` from the current account list.
	pub fn select_account(&self, address: &str) -> Result<SessionSnapshot> {
		let _ordering = self.commit.lock();
		let snapshot = {
			let mut state = self.state.lock();
			if state.status != SessionStatus::Connected || !state.accounts.iter().any(|a| a.address == address) {
				return Err(Error::InvalidAccount(address.to_string()));
			}
			state.selected_account = Some(address.to_string());
			state.snapshot()
		};
		self.finish_commit(&snapshot);
		Ok(snapshot)
	}

	/// Switches the session's current chain.
	///
	/// Delegates to the active connector when it declares the capability;
	/// otherwise (or while disconnected) only the local selection moves
	/// and chain-scoped clients re-target through the committed snapshot.
	/// Connection status never changes.
	pub async fn switch_chain(&self, chain_id: &ChainId) -> Result<SessionSnapshot> {
		let Some(chain) = self.chains.get(chain_id).cloned() else {
			return Err(Error::UnknownChain(chain_id.clone()));
		};

		let delegate = self
			.active_connector()
			.filter(|connector| connector.meta().features.chain_switch);
		if let Some(connector) = delegate {
			match connector.switch_chain(&chain).await {
				Ok(()) => {}
				Err(Error::UnsupportedOperation(_)) => {
					debug!(target = "onboard.session", chain = %chain.id, "connector declined chain switch; retargeting locally");
				}
				Err(err) => {
					let message = err.to_string();
					self.commit(|state| state.last_error = Some(message.clone()));
					return Err(err);
				}
			}
		}

		let id = chain.id.clone();
		Ok(self.commit(move |state| state.selected_chain = id))
	}
}
