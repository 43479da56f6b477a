//! Transaction lifecycle tracking.
//!
//! One attempt is driven through signing, submission, and the backend's
//! event stream, mapping backend-specific event kinds onto a fixed,
//! strictly ordered stage vocabulary. The intermediate stage is exposed
//! on a watch channel purely for UI feedback; the outcome resolves
//! exactly once, at the first event representing durable inclusion or
//! unrecoverable failure, after which the event subscription is closed
//! even if further events would arrive.

use std::sync::Arc;
use std::time::Duration;

use onboard_protocol::{BigIntValue, ChainId};
use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;
use tracing::debug;

use crate::backend::{ChainBackend, SignedPayload, SubmissionEvent};
use crate::connector::WalletConnector;
use crate::error::{Error, Result};

const TERMINAL_EVENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Observable stages of one transaction attempt, in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TxStage {
	Preparing,
	Submitted,
	InBlock,
	Finalized,
	Failed,
	Rejected,
}

impl TxStage {
	/// Whether the stage ends the attempt.
	pub fn is_terminal(&self) -> bool {
		matches!(self, TxStage::Finalized | TxStage::Failed | TxStage::Rejected)
	}
}

/// Payload of a transaction attempt.
///
/// The signable bytes produced here are the core's neutral JSON
/// representation; chain-specific transaction encoding is the backend
/// adapter's concern.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TxPayload {
	/// Native-currency transfer.
	Transfer { dest: String, amount: BigIntValue },
	/// Pre-encoded call data.
	Call { data: Vec<u8> },
}

impl TxPayload {
	fn signable_bytes(&self) -> Result<Vec<u8>> {
		serde_json::to_vec(self).map_err(|err| Error::SigningFailed(err.to_string()))
	}
}

/// Request to move value or invoke a call from `sender`.
#[derive(Debug, Clone)]
pub struct SendRequest {
	/// Address of the signing account; must be in the current list.
	pub sender: String,
	pub payload: TxPayload,
}

/// Terminal success of a transaction attempt.
#[derive(Debug, Clone)]
pub struct TxSuccess {
	/// Hash assigned at broadcast time.
	pub hash: String,
}

/// Handle to a spawned transaction attempt.
///
/// Attempts are independent; concurrent sends from the same account each
/// get their own handle and are never merged.
#[derive(Debug)]
pub struct TxHandle {
	stage: watch::Receiver<TxStage>,
	outcome: oneshot::Receiver<Result<TxSuccess>>,
}

impl TxHandle {
	/// Stage observed at the last commit.
	pub fn stage(&self) -> TxStage {
		*self.stage.borrow()
	}

	/// Watches stage progression for UI feedback.
	pub fn stage_watch(&self) -> watch::Receiver<TxStage> {
		self.stage.clone()
	}

	/// Waits for the terminal outcome; resolves exactly once.
	pub async fn wait(self) -> Result<TxSuccess> {
		match self.outcome.await {
			Ok(result) => result,
			Err(_) => Err(Error::SubmissionFailed("tracker dropped before resolving".to_string())),
		}
	}
}

/// Spawns the tracker driving one attempt to its terminal outcome.
///
/// `session_epochs` carries the session generation observed at submit
/// time; any bump means the session the attempt belonged to no longer
/// exists, and the tracker stops acting on further backend events.
pub(crate) fn spawn_attempt(
	connector: Arc<dyn WalletConnector>,
	backend: Arc<dyn ChainBackend>,
	chain: ChainId,
	request: SendRequest,
	session_epochs: watch::Receiver<u64>,
	epoch: u64,
) -> TxHandle {
	let (stage_tx, stage_rx) = watch::channel(TxStage::Preparing);
	let (outcome_tx, outcome_rx) = oneshot::channel();

	tokio::spawn(async move {
		let result = run_attempt(connector, backend, chain, request, &stage_tx, session_epochs, epoch).await;
		if let Err(err) = &result {
			let terminal = match err {
				Error::SigningRejected => TxStage::Rejected,
				_ => TxStage::Failed,
			};
			advance(&stage_tx, terminal);
		}
		let _ = outcome_tx.send(result);
	});

	TxHandle {
		stage: stage_rx,
		outcome: outcome_rx,
	}
}

async fn run_attempt(
	connector: Arc<dyn WalletConnector>,
	backend: Arc<dyn ChainBackend>,
	chain: ChainId,
	request: SendRequest,
	stage: &watch::Sender<TxStage>,
	mut session_epochs: watch::Receiver<u64>,
	epoch: u64,
) -> Result<TxSuccess> {
	let call = request.payload.signable_bytes()?;
	let signature = connector.sign_payload(&request.sender, &call).await?;

	let signed = SignedPayload {
		signer: request.sender,
		call,
		signature,
	};
	let mut submission = backend.submit(&chain, signed).await?;
	advance(stage, TxStage::Submitted);
	debug!(target = "onboard.tx", hash = %submission.hash, chain = %chain, "payload broadcast");

	loop {
		let received = tokio::select! {
			received = timeout(TERMINAL_EVENT_TIMEOUT, submission.events.recv()) => received,
			// A session-generation bump (or a dropped session) means this
			// attempt's session is gone; stop acting on its events.
			_ = session_epochs.wait_for(|current| *current != epoch) => {
				submission.events.close();
				return Err(Error::SubmissionFailed("session ended before a terminal event".to_string()));
			}
		};
		let event = match received {
			Ok(Some(event)) => event,
			Ok(None) => {
				submission.events.close();
				return Err(Error::SubmissionFailed("event stream ended before a terminal event".to_string()));
			}
			// No terminal event within the window; conservatively a
			// failure, never assumed success.
			Err(_) => {
				submission.events.close();
				return Err(Error::Timeout);
			}
		};

		match event {
			SubmissionEvent::Broadcast => advance(stage, TxStage::Submitted),
			SubmissionEvent::InBestBlock => advance(stage, TxStage::InBlock),
			SubmissionEvent::Finalized => {
				advance(stage, TxStage::Finalized);
				submission.events.close();
				debug!(target = "onboard.tx", hash = %submission.hash, "attempt finalized");
				return Ok(TxSuccess { hash: submission.hash });
			}
			SubmissionEvent::Dropped(reason) | SubmissionEvent::Invalid(reason) => {
				submission.events.close();
				debug!(target = "onboard.tx", hash = %submission.hash, reason = %reason, "attempt failed");
				return Err(Error::SubmissionFailed(reason));
			}
		}
	}
}

/// Commits a stage change, never stepping backward.
fn advance(stage: &watch::Sender<TxStage>, next: TxStage) {
	stage.send_if_modified(|current| {
		if next > *current {
			*current = next;
			true
		} else {
			false
		}
	});
}
