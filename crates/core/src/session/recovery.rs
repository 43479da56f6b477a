//! Silent session restoration at startup.

use std::sync::Arc;

use tracing::{debug, info};

use super::manager::SessionManager;
use super::state::SessionSnapshot;

/// Attempts silent reconnection from persisted state.
///
/// Best-effort: every failure path lands in `Disconnected` with no
/// recorded error, since this is not a user-initiated action and must
/// never surface a prompt or an error banner.
pub(crate) async fn restore(manager: &Arc<SessionManager>) -> SessionSnapshot {
	let persisted = manager.store().load();
	if !persisted.auto_connect {
		debug!(target = "onboard.session", "auto-connect disabled; skipping restore");
		return manager.snapshot();
	}
	let Some(connector_id) = persisted.connector_id else {
		debug!(target = "onboard.session", "no persisted connector; skipping restore");
		return manager.snapshot();
	};
	let Some(connector) = manager.connectors().get(&connector_id) else {
		debug!(target = "onboard.session", connector = %connector_id, "persisted connector is no longer configured");
		return manager.snapshot();
	};
	if !connector.is_available() {
		debug!(target = "onboard.session", connector = %connector_id, "persisted connector unavailable; staying disconnected");
		return manager.snapshot();
	}

	match manager.connect_inner(&connector_id, true).await {
		Ok(snapshot) => {
			info!(target = "onboard.session", connector = %connector_id, "session restored");
			snapshot
		}
		Err(err) => {
			debug!(target = "onboard.session", connector = %connector_id, error = %err, "auto-connect failed; staying disconnected");
			manager.snapshot()
		}
	}
}
