//! Capability resolver.
//!
//! # Purpose
//!
//! Answer "give me a `T` for this object" by consulting providers registered
//! against the object's type and its ancestors.
//!
//! # Mental model
//!
//! 1. **Registry:** providers are registered per source type name. Every structural
//!    change builds a new [`ProviderMap`] and publishes it in a fresh epoch.
//! 2. **Tables:** the first query for a source type walks its search order and
//!    records, per capability name, which providers declared it.
//! 3. **Queries:** candidates are tried in table order, one at a time; the first
//!    usable value wins.
//!
//! # Concurrency
//!
//! - **Reads:** lock-free epoch load. Misses build tables and publish them by RCU.
//! - **Writes:** serialized by one mutation lock; each publishes a whole epoch, which
//!   flushes every derived cache at once.
//! - **Lazy sources:** drained under their own queue lock before tables are built.
//! - **Type resolution:** separate lock, eventually consistent with the registry.
//!
//! # Invariants
//!
//! - Reads observe a table wholly before or wholly after any mutation.
//!   - Tested by: `invariants::test_reads_never_see_partial_tables`
//! - Registration is visible to the next query on any thread.
//!   - Tested by: `invariants::test_mutation_invalidates_tables`
//! - Each lazy source is consulted at most once.
//!   - Tested by: `invariants::test_lazy_source_drained_once`
//! - Providers run sequentially, at most once per candidate per query.
//!   - Tested by: `invariants::test_first_match_short_circuits`
//! - A published table never changes; mutation replaces it.
//!   - Tested by: `invariants::test_published_tables_are_immutable`

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use adapt_types::{Object, Type};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::builder::ResolverBuilder;
use crate::epoch::{Epoch, SearchOrder};
use crate::error::{Anomaly, IncompatibleCapabilities, ResolveError};
use crate::provider::{SharedProvider, is_loaded};
use crate::registry::{Contributions, ProviderMap, ProviderSource};
use crate::table::CapabilityTable;
use crate::type_cache::TypeResolutionCache;

/// Availability of a capability without loading anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityStatus {
	/// No provider declares the capability.
	Absent,
	/// At least one declaring provider is already loaded.
	Loaded,
	/// Declaring providers exist but none is loaded yet.
	NotLoaded,
}

/// Resolves capabilities for objects from a dynamic set of providers.
pub struct Resolver {
	label: Box<str>,
	epoch: ArcSwap<Epoch>,
	mutation: Mutex<()>,
	lazy: Mutex<VecDeque<Arc<dyn ProviderSource>>>,
	lazy_pending: AtomicBool,
	types: TypeResolutionCache,
}

impl Default for Resolver {
	fn default() -> Self {
		Self::new("default")
	}
}

impl Resolver {
	/// Creates an empty resolver. `label` tags its log events.
	pub fn new(label: impl Into<Box<str>>) -> Self {
		Self::from_parts(label.into(), ProviderMap::default(), VecDeque::new())
	}

	pub fn builder(label: impl Into<Box<str>>) -> ResolverBuilder {
		ResolverBuilder::new(label)
	}

	pub(crate) fn from_parts(label: Box<str>, providers: ProviderMap, sources: VecDeque<Arc<dyn ProviderSource>>) -> Self {
		let pending = !sources.is_empty();
		Self {
			label,
			epoch: ArcSwap::from_pointee(Epoch::new(Arc::new(providers))),
			mutation: Mutex::new(()),
			lazy: Mutex::new(sources),
			lazy_pending: AtomicBool::new(pending),
			types: TypeResolutionCache::default(),
		}
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	/// Appends `provider` to the list for `source_type`. Duplicates are kept.
	pub fn register_provider(&self, provider: SharedProvider, source_type: &str) {
		self.mutate("register", |providers| providers.push(provider, source_type));
	}

	/// Removes `provider` from every source type it is registered for.
	///
	/// Returns true if any registration was removed.
	pub fn unregister_provider(&self, provider: &SharedProvider) -> bool {
		self.mutate("unregister", |providers| providers.remove_everywhere(provider))
	}

	/// Removes `provider` from the `source_type` list only.
	pub fn unregister_provider_from(&self, provider: &SharedProvider, source_type: &str) -> bool {
		self.mutate("unregister", |providers| providers.remove_from(provider, source_type))
	}

	/// Removes every registered provider. Pending lazy sources are kept.
	pub fn unregister_all(&self) {
		self.mutate("unregister all", |providers| *providers = ProviderMap::default());
	}

	/// Enqueues a source to be consulted on the next demand for registry contents.
	pub fn register_lazy_source(&self, source: Arc<dyn ProviderSource>) {
		let mut queue = self.lazy.lock();
		queue.push_back(source);
		self.lazy_pending.store(true, Ordering::Release);
	}

	/// Removes a source that has not been consulted yet.
	pub fn unregister_lazy_source(&self, source: &Arc<dyn ProviderSource>) -> bool {
		let mut queue = self.lazy.lock();
		let Some(pos) = queue.iter().position(|s| std::ptr::addr_eq(Arc::as_ptr(s), Arc::as_ptr(source))) else {
			return false;
		};
		queue.remove(pos);
		true
	}

	/// Returns the effective registry contents, after draining lazy sources.
	pub fn providers(&self) -> Arc<ProviderMap> {
		self.drain_lazy_sources();
		Arc::clone(&self.epoch.load().providers)
	}

	/// Discards every derived cache.
	pub fn flush(&self) {
		let _guard = self.mutation.lock();
		let providers = Arc::clone(&self.epoch.load().providers);
		self.publish(providers, "flush");
	}

	/// Returns the cached ancestor search order for `ty`.
	pub fn compute_search_order(&self, ty: &Type) -> SearchOrder {
		self.epoch.load().search_order(ty)
	}

	/// Returns the capability table for `source_type`, building it on first use.
	pub fn capability_table(&self, source_type: &Type) -> Arc<CapabilityTable> {
		self.drain_lazy_sources();
		self.epoch.load().table(source_type)
	}

	/// Returns the names of all capabilities declared for `source_type`, in
	/// first-discovery order.
	pub fn compute_capability_names(&self, source_type: &Type) -> Vec<String> {
		self.capability_table(source_type).names().map(str::to_owned).collect()
	}

	/// Returns a capability of type `capability` for `source`.
	///
	/// Falls back to `source` itself when nothing is produced and `source` is
	/// already an instance of `capability`. Values of the wrong type are
	/// skipped; if nothing valid is found they are reported together as
	/// [`ResolveError::Incompatible`].
	pub fn get_capability(&self, source: &Object, capability: &Type) -> Result<Option<Object>, ResolveError> {
		let table = self.capability_table(source.runtime_type());
		let epoch = self.epoch.load_full();
		let mut anomalies = Vec::new();
		for provider in table.candidates(capability.name()) {
			let Some(value) = provider.produce(source, capability) else {
				continue;
			};
			if is_instance(&epoch, value.runtime_type(), capability) {
				return Ok(Some(value));
			}
			anomalies.push(Anomaly {
				provider: Arc::clone(provider),
				actual: value.runtime_type().clone(),
			});
		}

		if !anomalies.is_empty() {
			warn!(
				resolver = %self.label,
				expected = %capability,
				count = anomalies.len(),
				"providers returned values of the wrong type"
			);
			return Err(ResolveError::Incompatible(IncompatibleCapabilities {
				expected: capability.clone(),
				anomalies,
			}));
		}
		Ok(is_instance(&epoch, source.runtime_type(), capability).then(|| Arc::clone(source)))
	}

	/// Returns a capability named `capability` for `source`, using only
	/// providers that are already loaded.
	pub fn get_capability_by_name(&self, source: &Object, capability: &str) -> Result<Option<Object>, ResolveError> {
		self.resolve_by_name(source, capability, false)
	}

	/// Like [`Resolver::get_capability_by_name`], but loads deferred providers as needed.
	pub fn load_capability(&self, source: &Object, capability: &str) -> Result<Option<Object>, ResolveError> {
		self.resolve_by_name(source, capability, true)
	}

	/// Returns true if any provider declares `capability` for `source`.
	/// Never invokes or loads a provider. An empty name is never available.
	pub fn has_capability(&self, source: &Object, capability: &str) -> bool {
		!capability.is_empty() && self.capability_table(source.runtime_type()).contains(capability)
	}

	/// Reports whether `capability` is available for `source` without loading anything.
	pub fn query_status(&self, source: &Object, capability: &str) -> CapabilityStatus {
		if capability.is_empty() {
			return CapabilityStatus::Absent;
		}
		let table = self.capability_table(source.runtime_type());
		let candidates = table.candidates(capability);
		if candidates.is_empty() {
			CapabilityStatus::Absent
		} else if candidates.iter().any(is_loaded) {
			CapabilityStatus::Loaded
		} else {
			CapabilityStatus::NotLoaded
		}
	}

	fn resolve_by_name(&self, source: &Object, capability: &str, force: bool) -> Result<Option<Object>, ResolveError> {
		if capability.is_empty() {
			return Err(ResolveError::EmptyCapabilityName);
		}
		let table = self.capability_table(source.runtime_type());

		// Stable partition: loaded providers first, registration order kept within each half.
		let (loaded, pending): (Vec<&SharedProvider>, Vec<&SharedProvider>) =
			table.candidates(capability).iter().partition(|provider| is_loaded(provider));
		let candidates = loaded.into_iter().chain(pending).filter_map(|provider| match provider.as_deferred() {
			Some(deferred) if force => deferred.load(true),
			_ => Some(Arc::clone(provider)),
		});

		for provider in candidates {
			let Some(ty) = self.types.resolve(&provider, capability) else {
				continue;
			};
			if let Some(value) = provider.produce(source, &ty) {
				return Ok(Some(value));
			}
		}
		Ok((source.runtime_type().name() == capability).then(|| Arc::clone(source)))
	}

	/// Applies `edit` to a copy of the registry and publishes it with empty caches.
	fn mutate<R>(&self, reason: &'static str, edit: impl FnOnce(&mut ProviderMap) -> R) -> R {
		let _guard = self.mutation.lock();
		let mut providers = ProviderMap::clone(&self.epoch.load().providers);
		let out = edit(&mut providers);
		self.publish(Arc::new(providers), reason);
		out
	}

	/// Installs a new epoch and clears the type cache. Caller holds `mutation`.
	fn publish(&self, providers: Arc<ProviderMap>, reason: &'static str) {
		let source_types = providers.len();
		self.epoch.store(Arc::new(Epoch::new(providers)));
		self.types.clear();
		debug!(resolver = %self.label, reason, source_types, "capability caches flushed");
	}

	/// Consults queued lazy sources in order, each exactly once.
	fn drain_lazy_sources(&self) {
		if !self.lazy_pending.load(Ordering::Acquire) {
			return;
		}
		let mut queue = self.lazy.lock();
		while let Some(source) = queue.pop_front() {
			let _guard = self.mutation.lock();
			let mut contributions = Contributions::new(ProviderMap::clone(&self.epoch.load().providers));
			let reported = source.contribute(&mut contributions);
			let added = contributions.added();
			debug!(resolver = %self.label, reported, added, "lazy provider source consulted");
			if reported || added > 0 {
				self.publish(Arc::new(contributions.into_map()), "lazy source");
			}
		}
		self.lazy_pending.store(false, Ordering::Release);
	}

	#[cfg(test)]
	pub(crate) fn cached_types(&self) -> usize {
		self.types.len()
	}

	#[cfg(test)]
	pub(crate) fn cached_tables(&self) -> usize {
		self.epoch.load().cached_tables()
	}

	#[cfg(test)]
	pub(crate) fn cached_orders(&self) -> usize {
		self.epoch.load().cached_orders()
	}
}

/// Instance check against the cached search order of `ty`.
fn is_instance(epoch: &Epoch, ty: &Type, capability: &Type) -> bool {
	ty == capability || epoch.search_order(ty).contains(capability)
}

#[cfg(any(test, doc))]
mod invariants;
