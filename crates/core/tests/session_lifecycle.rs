//! Session state machine behavior against scriptable providers.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{MockWallet, chain};
use onboard::{CoreConfig, Error, MemoryStorage, SessionStatus, StorageBackend, WalletCore};
use parking_lot::Mutex;

fn core_with(wallet: Arc<MockWallet>, storage: Arc<MemoryStorage>, auto_connect: bool) -> WalletCore {
	WalletCore::new(
		CoreConfig::new("demo-dapp")
			.with_chains(vec![chain("0xaaa", "Alpha"), chain("0xbbb", "Beta")])
			.with_connectors(vec![wallet])
			.with_storage(storage)
			.with_auto_connect(auto_connect),
	)
	.unwrap()
}

#[tokio::test]
async fn connect_selects_first_account_and_persists() {
	let wallet = MockWallet::new("mock:alpha", &["a1", "a2"]);
	let storage = Arc::new(MemoryStorage::default());
	let core = core_with(wallet, storage.clone(), true);

	let snapshot = core.connect("mock:alpha").await.unwrap();
	assert_eq!(snapshot.status, SessionStatus::Connected);
	assert_eq!(snapshot.accounts.len(), 2);
	assert_eq!(snapshot.selected_account.unwrap().address, "a1");

	assert!(storage.get("demo-dapp:session:connector").is_some());
	assert!(storage.get("demo-dapp:session:account").is_some());
}

#[tokio::test]
async fn unknown_connector_is_unavailable() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);

	let err = core.connect("mock:ghost").await.unwrap_err();
	assert!(matches!(err, Error::ProviderUnavailable(_)));
	assert_eq!(core.snapshot().status, SessionStatus::Disconnected);
}

#[tokio::test]
async fn connect_failure_records_error_and_disconnects() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	wallet.fail_next_connect(Error::UserRejected);
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);

	let err = core.connect("mock:alpha").await.unwrap_err();
	assert!(matches!(err, Error::UserRejected));

	let snapshot = core.snapshot();
	assert_eq!(snapshot.status, SessionStatus::Disconnected);
	assert!(snapshot.last_error.is_some());
}

#[tokio::test]
async fn double_disconnect_is_idempotent() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let storage = Arc::new(MemoryStorage::default());
	let core = core_with(wallet, storage.clone(), false);

	core.connect("mock:alpha").await.unwrap();
	let first = core.disconnect().await;
	let second = core.disconnect().await;

	assert_eq!(first.status, SessionStatus::Disconnected);
	assert_eq!(second.status, SessionStatus::Disconnected);
	assert!(second.last_error.is_none());
	assert!(storage.get("demo-dapp:session:connector").is_none());
}

#[tokio::test]
async fn select_account_updates_or_rejects() {
	let wallet = MockWallet::new("mock:alpha", &["a1", "a2"]);
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);
	core.connect("mock:alpha").await.unwrap();

	let snapshot = core.select_account("a2").unwrap();
	assert_eq!(snapshot.selected_account.unwrap().address, "a2");

	let err = core.select_account("nope").unwrap_err();
	assert!(matches!(err, Error::InvalidAccount(_)));
	assert_eq!(core.snapshot().selected_account.unwrap().address, "a2");
}

#[tokio::test]
async fn select_account_requires_connection() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);

	let err = core.select_account("a1").unwrap_err();
	assert!(matches!(err, Error::InvalidAccount(_)));
}

#[tokio::test]
async fn account_push_falls_back_to_first_remaining() {
	let wallet = MockWallet::new("mock:alpha", &["a1", "a2"]);
	let core = core_with(wallet.clone(), Arc::new(MemoryStorage::default()), false);
	core.connect("mock:alpha").await.unwrap();
	assert!(wallet.has_subscriber());
	assert_eq!(core.snapshot().selected_account.unwrap().address, "a1");

	wallet.push_accounts(&["a2"]);

	let snapshot = core.snapshot();
	assert_eq!(snapshot.status, SessionStatus::Connected);
	assert_eq!(snapshot.accounts.len(), 1);
	assert_eq!(snapshot.selected_account.unwrap().address, "a2");
}

#[tokio::test]
async fn account_push_preserves_existing_selection() {
	let wallet = MockWallet::new("mock:alpha", &["a1", "a2"]);
	let core = core_with(wallet.clone(), Arc::new(MemoryStorage::default()), false);
	core.connect("mock:alpha").await.unwrap();
	core.select_account("a2").unwrap();

	wallet.push_accounts(&["a2", "a3"]);

	assert_eq!(core.snapshot().selected_account.unwrap().address, "a2");
}

#[tokio::test]
async fn empty_account_push_disconnects() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let storage = Arc::new(MemoryStorage::default());
	let core = core_with(wallet.clone(), storage.clone(), false);
	core.connect("mock:alpha").await.unwrap();

	wallet.push_accounts(&[]);

	let snapshot = core.snapshot();
	assert_eq!(snapshot.status, SessionStatus::Disconnected);
	assert!(snapshot.selected_account.is_none());
	assert!(storage.get("demo-dapp:session:connector").is_none());
	assert!(wallet.unsubscribed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn concurrent_connect_fails_fast() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let release = wallet.hold_connect();
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);
	let manager = core.session().clone();

	let pending = tokio::spawn(async move { manager.connect("mock:alpha").await });
	// Wait for the first call to enter the Connecting state.
	for _ in 0..200 {
		if core.snapshot().status == SessionStatus::Connecting {
			break;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	let err = core.connect("mock:alpha").await.unwrap_err();
	assert!(matches!(err, Error::OperationInProgress));

	release.send(()).unwrap();
	let snapshot = pending.await.unwrap().unwrap();
	assert_eq!(snapshot.status, SessionStatus::Connected);
}

#[tokio::test]
async fn disconnect_supersedes_pending_connect() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let release = wallet.hold_connect();
	let core = core_with(wallet.clone(), Arc::new(MemoryStorage::default()), false);
	let manager = core.session().clone();

	let pending = tokio::spawn(async move { manager.connect("mock:alpha").await });
	for _ in 0..200 {
		if core.snapshot().status == SessionStatus::Connecting {
			break;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	core.disconnect().await;
	release.send(()).unwrap();

	// The late success is discarded and its resources released.
	let snapshot = pending.await.unwrap().unwrap();
	assert_eq!(snapshot.status, SessionStatus::Disconnected);
	assert_eq!(core.snapshot().status, SessionStatus::Disconnected);
	assert!(wallet.disconnects.load(Ordering::SeqCst) >= 1);

	// The session stays usable for a fresh attempt.
	let snapshot = core.connect("mock:alpha").await.unwrap();
	assert_eq!(snapshot.status, SessionStatus::Connected);
}

#[tokio::test]
async fn connect_while_connected_replaces_connector() {
	let alpha = MockWallet::new("mock:alpha", &["a1"]);
	let beta = MockWallet::new("mock:beta", &["b1"]);
	let core = WalletCore::new(
		CoreConfig::new("demo-dapp")
			.with_chains(vec![chain("0xaaa", "Alpha")])
			.with_connectors(vec![alpha.clone(), beta]),
	)
	.unwrap();

	core.connect("mock:alpha").await.unwrap();
	let snapshot = core.connect("mock:beta").await.unwrap();

	assert_eq!(snapshot.connector_id.as_deref(), Some("mock:beta"));
	assert_eq!(snapshot.selected_account.unwrap().address, "b1");
	assert!(alpha.unsubscribed.load(Ordering::SeqCst));
	assert!(alpha.disconnects.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn notifications_arrive_in_commit_order() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);

	let seen: Arc<Mutex<Vec<SessionStatus>>> = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let subscription = core.subscribe(move |snapshot| sink.lock().push(snapshot.status));

	core.connect("mock:alpha").await.unwrap();
	core.disconnect().await;
	subscription.unsubscribe();

	assert_eq!(
		*seen.lock(),
		vec![SessionStatus::Connecting, SessionStatus::Connected, SessionStatus::Disconnected]
	);
}

#[tokio::test]
async fn unsubscribed_callback_stops_receiving() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);

	let seen: Arc<Mutex<Vec<SessionStatus>>> = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	core.subscribe(move |snapshot| sink.lock().push(snapshot.status)).unsubscribe();

	core.connect("mock:alpha").await.unwrap();
	assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn switch_chain_validates_registration() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);

	let err = core.switch_chain(&"0xccc".into()).await.unwrap_err();
	assert!(matches!(err, Error::UnknownChain(_)));
}

#[tokio::test]
async fn switch_chain_without_capability_retargets_locally() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let core = core_with(wallet.clone(), Arc::new(MemoryStorage::default()), false);
	core.connect("mock:alpha").await.unwrap();

	let snapshot = core.switch_chain(&"0xbbb".into()).await.unwrap();
	assert_eq!(snapshot.selected_chain, "0xbbb".into());
	assert_eq!(snapshot.status, SessionStatus::Connected);
	assert!(wallet.switched_to.lock().is_none());
}

#[tokio::test]
async fn switch_chain_delegates_when_supported() {
	let wallet = MockWallet::new_switching("mock:alpha", &["a1"]);
	let core = core_with(wallet.clone(), Arc::new(MemoryStorage::default()), false);
	core.connect("mock:alpha").await.unwrap();

	let snapshot = core.switch_chain(&"0xbbb".into()).await.unwrap();
	assert_eq!(snapshot.selected_chain, "0xbbb".into());
	assert_eq!(*wallet.switched_to.lock(), Some("0xbbb".into()));
}

#[tokio::test]
async fn switch_chain_while_disconnected_moves_selection() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let core = core_with(wallet, Arc::new(MemoryStorage::default()), false);

	let snapshot = core.switch_chain(&"0xbbb".into()).await.unwrap();
	assert_eq!(snapshot.status, SessionStatus::Disconnected);
	assert_eq!(snapshot.selected_chain, "0xbbb".into());
}

#[tokio::test]
async fn restore_reconnects_previous_session_silently() {
	let wallet = MockWallet::new("mock:alpha", &["a1", "a2"]);
	let storage = Arc::new(MemoryStorage::default());
	{
		let core = core_with(wallet.clone(), storage.clone(), true);
		core.connect("mock:alpha").await.unwrap();
		core.select_account("a2").unwrap();
	}

	// Fresh process: same storage, same configuration.
	let core = core_with(wallet, storage, true);
	let snapshot = core.restore().await;

	assert_eq!(snapshot.status, SessionStatus::Connected);
	assert_eq!(snapshot.selected_account.unwrap().address, "a2");
	assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn restore_with_unavailable_connector_stays_silent() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let storage = Arc::new(MemoryStorage::default());
	{
		let core = core_with(wallet.clone(), storage.clone(), true);
		core.connect("mock:alpha").await.unwrap();
	}

	wallet.set_available(false);
	let core = core_with(wallet, storage, true);
	let snapshot = core.restore().await;

	assert_eq!(snapshot.status, SessionStatus::Disconnected);
	assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn restore_without_auto_connect_does_nothing() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let storage = Arc::new(MemoryStorage::default());
	{
		let core = core_with(wallet.clone(), storage.clone(), false);
		core.connect("mock:alpha").await.unwrap();
	}

	let core = core_with(wallet, storage, false);
	let snapshot = core.restore().await;
	assert_eq!(snapshot.status, SessionStatus::Disconnected);
}

#[tokio::test]
async fn restore_failure_is_swallowed() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let storage = Arc::new(MemoryStorage::default());
	{
		let core = core_with(wallet.clone(), storage.clone(), true);
		core.connect("mock:alpha").await.unwrap();
	}

	wallet.fail_next_connect(Error::Timeout);
	let core = core_with(wallet, storage, true);
	let snapshot = core.restore().await;

	assert_eq!(snapshot.status, SessionStatus::Disconnected);
	assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn corrupt_persisted_state_does_not_break_startup() {
	let wallet = MockWallet::new("mock:alpha", &["a1"]);
	let storage = Arc::new(MemoryStorage::default());
	storage.set("demo-dapp:session:connector", "{broken".to_string());
	storage.set("demo-dapp:session:autoConnect", "true".to_string());

	let core = core_with(wallet, storage, true);
	let snapshot = core.restore().await;
	assert_eq!(snapshot.status, SessionStatus::Disconnected);
	assert!(snapshot.last_error.is_none());
}
