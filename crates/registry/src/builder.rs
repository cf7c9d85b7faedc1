//! Resolver construction.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::provider::SharedProvider;
use crate::registry::{ProviderMap, ProviderSource};
use crate::resolver::Resolver;

/// Collects initial registrations before a [`Resolver`] exists.
///
/// Startup code builds one resolver and hands references to its collaborators.
pub struct ResolverBuilder {
	label: Box<str>,
	providers: ProviderMap,
	sources: VecDeque<Arc<dyn ProviderSource>>,
}

impl ResolverBuilder {
	pub fn new(label: impl Into<Box<str>>) -> Self {
		Self {
			label: label.into(),
			providers: ProviderMap::default(),
			sources: VecDeque::new(),
		}
	}

	/// Registers `provider` for `source_type`, in call order.
	pub fn push_provider(&mut self, provider: SharedProvider, source_type: &str) -> &mut Self {
		self.providers.push(provider, source_type);
		self
	}

	/// Queues a lazy source; it is consulted on the first demand, not at build time.
	pub fn push_lazy_source(&mut self, source: Arc<dyn ProviderSource>) -> &mut Self {
		self.sources.push_back(source);
		self
	}

	/// Number of provider registrations collected so far.
	pub fn len(&self) -> usize {
		self.providers.registrations()
	}

	pub fn is_empty(&self) -> bool {
		self.providers.is_empty()
	}

	pub fn build(self) -> Resolver {
		tracing::debug!(
			resolver = %self.label,
			registrations = self.providers.registrations(),
			lazy_sources = self.sources.len(),
			"resolver built"
		);
		Resolver::from_parts(self.label, self.providers, self.sources)
	}
}
