//! Registry content plus the caches derived from it.
//!
//! # Role
//!
//! An [`Epoch`] is what the resolver publishes. It pairs one immutable
//! [`ProviderMap`] with the Search Order cache and Resolution Cache computed from
//! it, so a flush is a single swap of the whole epoch and readers can never see
//! registry content and cached tables out of step.
//!
//! # Invariants
//!
//! - Cached values are immutable once inserted; maps are replaced by RCU, never edited.
//! - Entries built against an epoch are only ever stored in that epoch. A reader
//!   that races a flush fills the retired epoch, which nobody reads again.

use std::sync::Arc;

use adapt_types::{Type, search_order};
use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::registry::ProviderMap;
use crate::table::CapabilityTable;

/// Ancestor search order for one type, source type first.
pub type SearchOrder = Arc<[Type]>;

pub(crate) struct Epoch {
	pub(crate) providers: Arc<ProviderMap>,
	orders: ArcSwap<FxHashMap<Type, SearchOrder>>,
	tables: ArcSwap<FxHashMap<Type, Arc<CapabilityTable>>>,
}

impl Epoch {
	pub(crate) fn new(providers: Arc<ProviderMap>) -> Self {
		Self {
			providers,
			orders: ArcSwap::default(),
			tables: ArcSwap::default(),
		}
	}

	/// Returns the cached search order for `ty`, computing it on a miss.
	pub(crate) fn search_order(&self, ty: &Type) -> SearchOrder {
		if let Some(order) = self.orders.load().get(ty) {
			return Arc::clone(order);
		}
		let order: SearchOrder = search_order(ty).into();
		publish(&self.orders, ty, &order);
		order
	}

	/// Returns the cached capability table for `source_type`, building it on a miss.
	///
	/// Concurrent misses may build the same table twice; both results are equal.
	pub(crate) fn table(&self, source_type: &Type) -> Arc<CapabilityTable> {
		if let Some(table) = self.tables.load().get(source_type) {
			return Arc::clone(table);
		}
		let order = self.search_order(source_type);
		let table = Arc::new(CapabilityTable::build(&order, &self.providers));
		tracing::trace!(
			source_type = %source_type,
			ancestors = order.len(),
			capabilities = table.len(),
			"capability table built"
		);
		publish(&self.tables, source_type, &table);
		table
	}

	#[cfg(test)]
	pub(crate) fn cached_tables(&self) -> usize {
		self.tables.load().len()
	}

	#[cfg(test)]
	pub(crate) fn cached_orders(&self) -> usize {
		self.orders.load().len()
	}
}

fn publish<V: Clone>(cache: &ArcSwap<FxHashMap<Type, V>>, key: &Type, value: &V) {
	cache.rcu(|current| {
		let mut next = FxHashMap::clone(current);
		next.insert(key.clone(), value.clone());
		next
	});
}

#[cfg(test)]
mod tests {
	use adapt_types::TypeSpace;

	use super::*;
	use crate::test_fixtures::{FixedProvider, shared};

	#[test]
	fn tables_are_memoized_per_type_identity() {
		let mut space = TypeSpace::new();
		let x = space.interface("X", &[]).unwrap();
		let a = space.class("A", None, &[]).unwrap();
		let twin = space.class("A", None, &[]).unwrap();

		let mut providers = ProviderMap::default();
		providers.push(shared(&Arc::new(FixedProvider::new("p", &[&x]))), "A");
		let epoch = Epoch::new(Arc::new(providers));

		let first = epoch.table(&a);
		let again = epoch.table(&a);
		assert!(Arc::ptr_eq(&first, &again));

		// Same name, different identity: separate entry, equal content.
		let other = epoch.table(&twin);
		assert!(!Arc::ptr_eq(&first, &other));
		assert_eq!(other.candidates("X").len(), 1);
		assert_eq!(epoch.cached_tables(), 2);
	}

	#[test]
	fn search_orders_are_shared_between_calls() {
		let mut space = TypeSpace::new();
		let a = space.class("A", None, &[]).unwrap();
		let epoch = Epoch::new(Arc::default());

		let first = epoch.search_order(&a);
		let again = epoch.search_order(&a);
		assert!(Arc::ptr_eq(&first, &again));
		assert_eq!(&*first, &[a, space.object().clone()]);
	}
}
