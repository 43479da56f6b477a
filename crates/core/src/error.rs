//! Error types shared across the wallet core.

use onboard_protocol::ChainId;
use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for connector, session, and transaction surfaces.
#[derive(Debug, Error)]
pub enum Error {
	/// The core was wired with an unusable configuration.
	#[error("configuration error: {0}")]
	Config(String),

	/// The provider behind a connector is not injected or not reachable.
	#[error("provider unavailable for connector '{0}'")]
	ProviderUnavailable(String),

	/// The user denied the authorization request.
	#[error("user rejected the connection request")]
	UserRejected,

	/// The provider authorized the app but exposed no accounts.
	#[error("provider returned no accounts")]
	NoAccounts,

	/// The provider did not respond within the bounded interval.
	#[error("operation timed out")]
	Timeout,

	/// The address is not part of the current account list.
	#[error("account '{0}' is not in the current account list")]
	InvalidAccount(String),

	/// The chain id is not present in the chain registry.
	#[error("chain '{0}' is not registered")]
	UnknownChain(ChainId),

	/// The connector does not implement the requested capability.
	#[error("connector does not support {0}")]
	UnsupportedOperation(&'static str),

	/// Another connect is already in flight.
	#[error("another session operation is in progress")]
	OperationInProgress,

	/// The user declined to sign the payload.
	#[error("user rejected the signing request")]
	SigningRejected,

	/// The provider failed to produce a signature.
	#[error("signing failed: {0}")]
	SigningFailed(String),

	/// The backend rejected the submitted payload.
	#[error("submission failed: {0}")]
	SubmissionFailed(String),
}
