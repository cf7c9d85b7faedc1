//! Per-source-type capability tables.

use std::sync::Arc;

use adapt_types::Type;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::provider::SharedProvider;
use crate::registry::ProviderMap;

/// Candidate providers per capability name for one source type.
///
/// Candidates are ordered by search order first (closer ancestors first), then
/// by registration order. A provider reachable through several ancestors is
/// listed once per ancestor. Names iterate in first-discovery order.
#[derive(Debug, Default)]
pub struct CapabilityTable {
	by_capability: IndexMap<Box<str>, Box<[SharedProvider]>, FxBuildHasher>,
}

impl CapabilityTable {
	/// Builds the table by walking `order` and collecting each ancestor's
	/// exact-name registrations. Only declared names are consulted, so no
	/// provider is loaded.
	pub(crate) fn build(order: &[Type], providers: &ProviderMap) -> Self {
		let mut staged: IndexMap<Box<str>, Vec<SharedProvider>, FxBuildHasher> = IndexMap::default();
		for ancestor in order {
			for provider in providers.get(ancestor.name()) {
				for name in provider.capability_names() {
					staged.entry(name.into_boxed_str()).or_default().push(Arc::clone(provider));
				}
			}
		}
		Self {
			by_capability: staged
				.into_iter()
				.map(|(name, candidates)| (name, candidates.into_boxed_slice()))
				.collect(),
		}
	}

	/// Returns the candidates for `capability`, best first.
	pub fn candidates(&self, capability: &str) -> &[SharedProvider] {
		self.by_capability.get(capability).map_or(&[], |candidates| &**candidates)
	}

	pub fn contains(&self, capability: &str) -> bool {
		self.by_capability.contains_key(capability)
	}

	/// Iterates capability names in first-discovery order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.by_capability.keys().map(|name| &**name)
	}

	pub fn len(&self) -> usize {
		self.by_capability.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_capability.is_empty()
	}
}
