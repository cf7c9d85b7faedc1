//! Type Resolution Cache: capability names resolved to types, per provider.
//!
//! Guarded by its own lock, separate from the resolver's mutation lock, because
//! every successful name resolution writes to it. Consistency with the provider
//! registry is eventual: a flush clears it after the new epoch is published.
//! A query still running against the old epoch may insert afterwards, pinning a
//! provider that is no longer registered until the next flush.

use std::sync::Arc;

use adapt_types::{Type, TypeLoadError};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::provider::SharedProvider;

/// Address of a provider allocation.
type ProviderKey = usize;

fn key_of(provider: &SharedProvider) -> ProviderKey {
	Arc::as_ptr(provider).cast::<()>() as usize
}

struct ProviderTypes {
	/// Pins the allocation so its address cannot be reused while cached.
	_provider: SharedProvider,
	types: FxHashMap<Box<str>, Type>,
}

#[derive(Default)]
pub(crate) struct TypeResolutionCache {
	entries: Mutex<FxHashMap<ProviderKey, ProviderTypes>>,
}

impl TypeResolutionCache {
	/// Resolves `name` to a type on behalf of `provider`.
	///
	/// Lookup order: this cache, the provider's loading context, then the
	/// provider's own declared capability types. A deferred provider that is not
	/// loaded cannot resolve anything beyond what is cached. No lock is held
	/// while provider code runs.
	pub(crate) fn resolve(&self, provider: &SharedProvider, name: &str) -> Option<Type> {
		if let Some(ty) = self.get(provider, name) {
			return Some(ty);
		}
		let target = match provider.as_deferred() {
			Some(deferred) => deferred.load(false)?,
			None => Arc::clone(provider),
		};
		let loaded = match target.loader() {
			Some(loader) => loader.load_type(name),
			None => Err(TypeLoadError::NoLoader(name.to_owned())),
		};
		let ty = match loaded {
			Ok(ty) => ty,
			Err(err) => {
				tracing::trace!(%err, provider = ?target, "resolving capability from declared types");
				target.capability_types().into_iter().find(|ty| ty.name() == name)?
			}
		};
		self.insert(provider, name, ty.clone());
		Some(ty)
	}

	pub(crate) fn get(&self, provider: &SharedProvider, name: &str) -> Option<Type> {
		let entries = self.entries.lock();
		entries.get(&key_of(provider))?.types.get(name).cloned()
	}

	fn insert(&self, provider: &SharedProvider, name: &str, ty: Type) {
		let mut entries = self.entries.lock();
		entries
			.entry(key_of(provider))
			.or_insert_with(|| ProviderTypes {
				_provider: Arc::clone(provider),
				types: FxHashMap::default(),
			})
			.types
			.insert(Box::from(name), ty);
	}

	pub(crate) fn clear(&self) {
		self.entries.lock().clear();
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self.entries.lock().values().map(|entry| entry.types.len()).sum()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use adapt_types::TypeSpace;

	use super::*;
	use crate::LazyProvider;
	use crate::test_fixtures::{FixedProvider, shared};

	#[test]
	fn loader_result_is_cached() {
		let mut space = TypeSpace::new();
		let x = space.interface("X", &[]).unwrap();
		let p = shared(&Arc::new(FixedProvider::new("p", &[]).with_loader(space)));
		let cache = TypeResolutionCache::default();

		assert_eq!(cache.resolve(&p, "X"), Some(x.clone()));
		assert_eq!(cache.get(&p, "X"), Some(x));
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn falls_back_to_declared_types() {
		let x = Type::interface("X", []).unwrap();
		let without_loader = shared(&Arc::new(FixedProvider::new("plain", &[&x])));
		let stale_loader = shared(&Arc::new(FixedProvider::new("stale", &[&x]).with_loader(TypeSpace::new())));
		let cache = TypeResolutionCache::default();

		assert_eq!(cache.resolve(&without_loader, "X"), Some(x.clone()));
		assert_eq!(cache.resolve(&stale_loader, "X"), Some(x));
		assert_eq!(cache.resolve(&stale_loader, "Y"), None);
		assert_eq!(cache.len(), 2);
	}

	#[test]
	fn entries_are_per_provider() {
		let x = Type::interface("X", []).unwrap();
		let p1 = shared(&Arc::new(FixedProvider::new("p1", &[&x])));
		let p2 = shared(&Arc::new(FixedProvider::new("p2", &[])));
		let cache = TypeResolutionCache::default();

		assert!(cache.resolve(&p1, "X").is_some());
		assert!(cache.get(&p2, "X").is_none());
		assert!(cache.resolve(&p2, "X").is_none());
	}

	#[test]
	fn unloaded_deferred_provider_resolves_nothing() {
		let x = Type::interface("X", []).unwrap();
		let inner = shared(&Arc::new(FixedProvider::new("inner", &[&x])));
		let loads = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&loads);
		let lazy: SharedProvider = Arc::new(LazyProvider::new("lazy", ["X"], move || {
			counter.fetch_add(1, Ordering::SeqCst);
			Some(Arc::clone(&inner))
		}));
		let cache = TypeResolutionCache::default();

		assert_eq!(cache.resolve(&lazy, "X"), None);
		assert_eq!(loads.load(Ordering::SeqCst), 0);

		lazy.as_deferred().and_then(|d| d.load(true)).expect("loads");
		assert_eq!(cache.resolve(&lazy, "X"), Some(x));
	}

	#[test]
	fn clear_drops_everything() {
		let x = Type::interface("X", []).unwrap();
		let p = shared(&Arc::new(FixedProvider::new("p", &[&x])));
		let cache = TypeResolutionCache::default();
		cache.resolve(&p, "X");
		cache.clear();
		assert_eq!(cache.len(), 0);
		assert!(cache.get(&p, "X").is_none());
	}

	#[test]
	fn late_insert_pins_provider_until_next_clear() {
		let x = Type::interface("X", []).unwrap();
		let p = shared(&Arc::new(FixedProvider::new("p", &[&x])));
		let cache = TypeResolutionCache::default();

		cache.clear();
		// A query against a retired registry resolves after the flush.
		cache.resolve(&p, "X");
		assert_eq!(Arc::strong_count(&p), 2);
		assert_eq!(cache.len(), 1);

		cache.clear();
		assert_eq!(Arc::strong_count(&p), 1);
	}
}
