//! Configured connector catalog.

use std::sync::Arc;

use tracing::warn;

use super::WalletConnector;

/// Catalog of configured connector instances, in configured order.
///
/// Populated once at configuration time; reconfiguration rebuilds the
/// catalog rather than editing it.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
	connectors: Vec<Arc<dyn WalletConnector>>,
}

impl ConnectorRegistry {
	/// Builds a catalog, dropping duplicate ids (first wins).
	pub fn new(connectors: Vec<Arc<dyn WalletConnector>>) -> Self {
		let mut unique: Vec<Arc<dyn WalletConnector>> = Vec::with_capacity(connectors.len());
		for connector in connectors {
			if unique.iter().any(|c| c.id() == connector.id()) {
				warn!(target = "onboard.connector", id = connector.id(), "duplicate connector id; keeping first");
				continue;
			}
			unique.push(connector);
		}
		Self { connectors: unique }
	}

	/// Looks up a connector by its stable id.
	pub fn get(&self, id: &str) -> Option<Arc<dyn WalletConnector>> {
		self.connectors.iter().find(|c| c.id() == id).cloned()
	}

	/// Connectors whose provider probe currently succeeds.
	pub fn available(&self) -> Vec<Arc<dyn WalletConnector>> {
		self.connectors.iter().filter(|c| c.is_available()).cloned().collect()
	}

	/// All configured connectors in configured order.
	pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn WalletConnector>> {
		self.connectors.iter()
	}

	pub fn len(&self) -> usize {
		self.connectors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.connectors.is_empty()
	}
}
