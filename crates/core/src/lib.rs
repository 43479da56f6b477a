//! Wallet connector abstraction and connection session core for dApps.
//!
//! `onboard` lets a dApp front-end discover, connect to, and transact
//! through one of several independent wallet providers - injected
//! browser extensions, QR/deep-link remote signers, API-bound signer
//! adapters - across multiple networks, persisting and restoring the
//! session across restarts.
//!
//! The moving parts, leaves first:
//! * [`store`] - key/value persistence with lossless round-trips of
//!   extended value types
//! * [`connector`] - the capability-flagged wallet-provider contract and
//!   built-in adapters
//! * [`chain`] - the configured-chain catalog
//! * [`session`] - the single-writer session state machine
//! * [`tx`] - the transaction lifecycle tracker
//! * [`config`] - the entry point wiring it all together
//!
//! # Quick start
//!
//! ```ignore
//! let core = WalletCore::new(
//! 	CoreConfig::new("demo-dapp")
//! 		.with_chains(vec![polkadot, kusama])
//! 		.with_connectors(vec![Arc::new(InjectedConnector::new("polkadot-js", "demo-dapp"))])
//! 		.with_auto_connect(true),
//! )?;
//! core.restore().await;
//!
//! let session = core.connect("injected:polkadot-js").await?;
//! core.select_account(&session.accounts[0].address)?;
//! ```

pub mod backend;
pub mod chain;
pub mod config;
pub mod connector;
pub mod error;
pub mod session;
pub mod store;
pub mod tx;

pub use backend::{AccountState, ChainBackend, SignedPayload, SubmissionEvent, SubmissionWatch};
pub use chain::ChainRegistry;
pub use config::{CoreConfig, WalletCore};
pub use connector::{
	AccountSubscription, AccountsCallback, ConnectorFeatures, ConnectorMeta, ConnectorRegistry, InjectedConnector, RemoteConnector,
	RemoteConnectorConfig, SignerConnector, WalletConnector,
};
pub use error::{Error, Result};
pub use onboard_protocol as protocol;
pub use session::{SessionManager, SessionSnapshot, SessionStatus, SessionSubscription};
pub use store::{FileStorage, MemoryStorage, SessionStore, StorageBackend};
pub use tx::{SendRequest, TxHandle, TxPayload, TxStage, TxSuccess};
