#![allow(dead_code)]

//! In-memory fakes for driving the session core without real providers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use onboard::connector::{AccountSubscription, AccountsCallback, ConnectorFeatures, ConnectorMeta, WalletConnector};
use onboard::protocol::{Account, BigIntValue, Chain, ChainId, NativeCurrency};
use onboard::{AccountState, ChainBackend, Error, Result, SignedPayload, SubmissionEvent, SubmissionWatch};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

pub fn chain(id: &str, name: &str) -> Chain {
	Chain::new(
		id,
		name,
		NativeCurrency {
			name: "Unit".to_string(),
			symbol: "UNIT".to_string(),
			decimals: 12,
		},
	)
}

pub fn account(address: &str) -> Account {
	Account::new(address)
}

/// Scriptable wallet connector with an injection controller surface.
pub struct MockWallet {
	meta: ConnectorMeta,
	available: AtomicBool,
	accounts: Mutex<Vec<Account>>,
	connect_error: Mutex<Option<Error>>,
	sign_error: Mutex<Option<Error>>,
	gate: Mutex<Option<oneshot::Receiver<()>>>,
	push: Arc<Mutex<Option<AccountsCallback>>>,
	pub unsubscribed: Arc<AtomicBool>,
	pub disconnects: AtomicUsize,
	pub switched_to: Mutex<Option<ChainId>>,
}

impl MockWallet {
	pub fn new(id: &str, addresses: &[&str]) -> Arc<Self> {
		Self::build(id, addresses, false)
	}

	/// A wallet that also advertises the chain-switch capability.
	pub fn new_switching(id: &str, addresses: &[&str]) -> Arc<Self> {
		Self::build(id, addresses, true)
	}

	fn build(id: &str, addresses: &[&str], chain_switch: bool) -> Arc<Self> {
		Arc::new(Self {
			meta: ConnectorMeta {
				id: id.to_string(),
				name: format!("Mock {id}"),
				features: ConnectorFeatures {
					multi_account: true,
					message_signing: true,
					chain_switch,
					..ConnectorFeatures::default()
				},
			},
			available: AtomicBool::new(true),
			accounts: Mutex::new(addresses.iter().map(|a| account(a)).collect()),
			connect_error: Mutex::new(None),
			sign_error: Mutex::new(None),
			gate: Mutex::new(None),
			push: Arc::new(Mutex::new(None)),
			unsubscribed: Arc::new(AtomicBool::new(false)),
			disconnects: AtomicUsize::new(0),
			switched_to: Mutex::new(None),
		})
	}

	pub fn set_available(&self, available: bool) {
		self.available.store(available, Ordering::SeqCst);
	}

	/// Holds the next `connect` until the returned sender fires (or drops).
	pub fn hold_connect(&self) -> oneshot::Sender<()> {
		let (tx, rx) = oneshot::channel();
		*self.gate.lock() = Some(rx);
		tx
	}

	pub fn fail_next_connect(&self, error: Error) {
		*self.connect_error.lock() = Some(error);
	}

	pub fn fail_next_signing(&self, error: Error) {
		*self.sign_error.lock() = Some(error);
	}

	pub fn has_subscriber(&self) -> bool {
		self.push.lock().is_some()
	}

	/// Pushes a wholesale account-list replacement to the subscriber.
	pub fn push_accounts(&self, addresses: &[&str]) {
		let callback = self.push.lock().clone();
		if let Some(callback) = callback {
			callback(addresses.iter().map(|a| account(a)).collect());
		}
	}
}

#[async_trait]
impl WalletConnector for MockWallet {
	fn id(&self) -> &str {
		&self.meta.id
	}

	fn meta(&self) -> &ConnectorMeta {
		&self.meta
	}

	fn is_available(&self) -> bool {
		self.available.load(Ordering::SeqCst)
	}

	async fn connect(&self, _chain_hint: Option<&ChainId>) -> Result<Vec<Account>> {
		let gate = self.gate.lock().take();
		if let Some(gate) = gate {
			let _ = gate.await;
		}
		if let Some(error) = self.connect_error.lock().take() {
			return Err(error);
		}
		if !self.is_available() {
			return Err(Error::ProviderUnavailable(self.meta.id.clone()));
		}
		let accounts = self.accounts.lock().clone();
		if accounts.is_empty() {
			return Err(Error::NoAccounts);
		}
		Ok(accounts)
	}

	async fn disconnect(&self) {
		self.disconnects.fetch_add(1, Ordering::SeqCst);
	}

	fn subscribe_accounts(&self, callback: AccountsCallback) -> Result<AccountSubscription> {
		*self.push.lock() = Some(callback);
		let push = self.push.clone();
		let unsubscribed = self.unsubscribed.clone();
		Ok(AccountSubscription::new(move || {
			*push.lock() = None;
			unsubscribed.store(true, Ordering::SeqCst);
		}))
	}

	async fn sign_payload(&self, _address: &str, payload: &[u8]) -> Result<Vec<u8>> {
		if let Some(error) = self.sign_error.lock().take() {
			return Err(error);
		}
		let mut signature = b"sig:".to_vec();
		signature.extend_from_slice(&payload[..payload.len().min(8)]);
		Ok(signature)
	}

	async fn switch_chain(&self, chain: &Chain) -> Result<()> {
		if !self.meta.features.chain_switch {
			return Err(Error::UnsupportedOperation("chain switching"));
		}
		*self.switched_to.lock() = Some(chain.id.clone());
		Ok(())
	}
}

/// Recorded submission with its event-injection side.
pub struct SubmissionProbe {
	pub hash: String,
	pub payload: SignedPayload,
	pub events: mpsc::Sender<SubmissionEvent>,
}

/// Scriptable chain backend recording submissions for later injection.
#[derive(Default)]
pub struct MockBackend {
	submissions: Mutex<Vec<SubmissionProbe>>,
	submit_error: Mutex<Option<Error>>,
	balance: Mutex<u64>,
}

impl MockBackend {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			balance: Mutex::new(1_000_000),
			..Self::default()
		})
	}

	pub fn fail_next_submit(&self, error: Error) {
		*self.submit_error.lock() = Some(error);
	}

	pub fn submission_count(&self) -> usize {
		self.submissions.lock().len()
	}

	/// Injects an event into submission `index`.
	pub fn inject(&self, index: usize, event: SubmissionEvent) -> bool {
		let sender = self.submissions.lock().get(index).map(|probe| probe.events.clone());
		match sender {
			Some(sender) => sender.try_send(event).is_ok(),
			None => false,
		}
	}

	pub fn hash_of(&self, index: usize) -> Option<String> {
		self.submissions.lock().get(index).map(|probe| probe.hash.clone())
	}

	/// Waits until `count` submissions were recorded.
	pub async fn wait_for_submissions(&self, count: usize) {
		for _ in 0..200 {
			if self.submission_count() >= count {
				return;
			}
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
		panic!("timed out waiting for {count} submissions");
	}
}

#[async_trait]
impl ChainBackend for MockBackend {
	async fn account_state(&self, _chain: &ChainId, _address: &str) -> Result<AccountState> {
		Ok(AccountState {
			free_balance: BigIntValue::from(*self.balance.lock()),
			nonce: 7,
		})
	}

	async fn submit(&self, _chain: &ChainId, payload: SignedPayload) -> Result<SubmissionWatch> {
		if let Some(error) = self.submit_error.lock().take() {
			return Err(error);
		}
		let (events_tx, events_rx) = mpsc::channel(16);
		let hash = {
			let mut submissions = self.submissions.lock();
			let hash = format!("0xhash-{}", submissions.len());
			submissions.push(SubmissionProbe {
				hash: hash.clone(),
				payload,
				events: events_tx,
			});
			hash
		};
		Ok(SubmissionWatch {
			hash,
			events: events_rx,
		})
	}
}
