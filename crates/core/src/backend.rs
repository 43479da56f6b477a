//! Chain-scoped backend boundary consumed by the session core.
//!
//! The backend is an opaque query/submission client; its wire protocol is
//! out of scope here. Implementations adapt an RPC or API client to the
//! two capabilities the core needs: account-state queries and payload
//! submission with a lifecycle event stream.

use async_trait::async_trait;
use onboard_protocol::{BigIntValue, ChainId};
use tokio::sync::mpsc;

use crate::error::Result;

/// Balance and nonce of an account at the current chain head.
#[derive(Debug, Clone)]
pub struct AccountState {
	pub free_balance: BigIntValue,
	pub nonce: u64,
}

/// A signed payload ready for submission.
///
/// The signable bytes are the core's neutral representation; chain-specific
/// transaction encoding lives behind the backend adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
	/// Address the signature was produced for.
	pub signer: String,
	/// Signable call bytes handed to the wallet.
	pub call: Vec<u8>,
	/// Signature produced by the externally held key.
	pub signature: Vec<u8>,
}

/// Backend-taxonomy events observed for one submitted payload.
///
/// External backends expose inconsistent event vocabularies; the
/// transaction tracker maps these onto the fixed stage set in
/// [`crate::tx`]. Backends whose strongest inclusion signal is best-block
/// inclusion emit [`SubmissionEvent::Finalized`] at that point.
#[derive(Debug, Clone)]
pub enum SubmissionEvent {
	/// The payload was accepted into the network's gossip pool.
	Broadcast,
	/// The payload was observed in a best (non-final) block.
	InBestBlock,
	/// The payload was observed in a durably included block.
	Finalized,
	/// The payload was dropped before inclusion.
	Dropped(String),
	/// The payload was found invalid after submission.
	Invalid(String),
}

/// Event subscription for one submitted payload.
///
/// Closing or dropping the receiver unsubscribes from the backend stream.
pub struct SubmissionWatch {
	/// Hash assigned at broadcast time.
	pub hash: String,
	/// Backend event stream for this submission.
	pub events: mpsc::Receiver<SubmissionEvent>,
}

/// Query and submission capabilities of a chain-scoped client.
#[async_trait]
pub trait ChainBackend: Send + Sync {
	/// Fetches balance and nonce for `address` on `chain`.
	async fn account_state(&self, chain: &ChainId, address: &str) -> Result<AccountState>;

	/// Submits a signed payload and yields its lifecycle event stream.
	async fn submit(&self, chain: &ChainId, payload: SignedPayload) -> Result<SubmissionWatch>;
}
