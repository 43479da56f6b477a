//! Configured chain catalog and lookup.

use std::collections::HashMap;

use onboard_protocol::{Chain, ChainId};
use tracing::warn;

/// Catalog of configured chain descriptors, keyed by chain id.
///
/// Populated once at configuration time and immutable afterwards;
/// reconfiguration rebuilds the registry rather than editing it.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
	order: Vec<ChainId>,
	chains: HashMap<ChainId, Chain>,
}

impl ChainRegistry {
	/// Builds a registry, dropping duplicate ids (first wins).
	pub fn new(chains: Vec<Chain>) -> Self {
		let mut registry = Self::default();
		for chain in chains {
			if registry.chains.contains_key(&chain.id) {
				warn!(target = "onboard.session", chain = %chain.id, "duplicate chain id; keeping first");
				continue;
			}
			registry.order.push(chain.id.clone());
			registry.chains.insert(chain.id.clone(), chain);
		}
		registry
	}

	/// Looks up a chain descriptor by id.
	pub fn get(&self, id: &ChainId) -> Option<&Chain> {
		self.chains.get(id)
	}

	/// Whether `id` is registered.
	pub fn contains(&self, id: &ChainId) -> bool {
		self.chains.contains_key(id)
	}

	/// First configured chain, used as the default selection.
	pub fn first(&self) -> Option<&Chain> {
		self.order.first().and_then(|id| self.chains.get(id))
	}

	/// All chains in configured order.
	pub fn iter(&self) -> impl Iterator<Item = &Chain> {
		self.order.iter().filter_map(|id| self.chains.get(id))
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}
}
