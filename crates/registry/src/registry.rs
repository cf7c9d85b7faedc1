//! Provider registry contents and lazy provider sources.
//!
//! # Role
//!
//! [`ProviderMap`] is the registry content published inside each resolver epoch.
//! It is edited on a private copy under the resolver's mutation lock and never
//! mutated after publication. Per-name lists are `Arc`-shared between copies, so
//! an edit only clones the lists it touches.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::provider::{SharedProvider, same_provider};

/// Registered providers per source type name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ProviderMap {
	by_name: FxHashMap<Box<str>, Arc<Vec<SharedProvider>>>,
}

impl ProviderMap {
	/// Returns the providers registered for exactly `source_type`.
	pub fn get(&self, source_type: &str) -> &[SharedProvider] {
		self.by_name.get(source_type).map_or(&[], |list| list.as_slice())
	}

	/// Iterates source type names with their providers, in no particular order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[SharedProvider])> {
		self.by_name.iter().map(|(name, list)| (&**name, list.as_slice()))
	}

	/// Number of source type names with at least one provider.
	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}

	/// Total number of registrations, counting duplicates.
	pub fn registrations(&self) -> usize {
		self.by_name.values().map(|list| list.len()).sum()
	}

	pub(crate) fn push(&mut self, provider: SharedProvider, source_type: &str) {
		let list = self.by_name.entry(Box::from(source_type)).or_default();
		Arc::make_mut(list).push(provider);
	}

	/// Removes the first occurrence of `provider` from every list.
	pub(crate) fn remove_everywhere(&mut self, provider: &SharedProvider) -> bool {
		let mut removed = false;
		self.by_name.retain(|_, list| {
			removed |= remove_first(list, provider);
			!list.is_empty()
		});
		removed
	}

	/// Removes the first occurrence of `provider` from the `source_type` list.
	pub(crate) fn remove_from(&mut self, provider: &SharedProvider, source_type: &str) -> bool {
		let Some(list) = self.by_name.get_mut(source_type) else {
			return false;
		};
		let removed = remove_first(list, provider);
		if list.is_empty() {
			self.by_name.remove(source_type);
		}
		removed
	}
}

fn remove_first(list: &mut Arc<Vec<SharedProvider>>, provider: &SharedProvider) -> bool {
	match list.iter().position(|p| same_provider(p, provider)) {
		Some(pos) => {
			Arc::make_mut(list).remove(pos);
			true
		}
		None => false,
	}
}

/// External collaborator that registers providers on first demand.
///
/// Each source is consulted at most once, in the order sources were enqueued.
/// `contribute` runs while the resolver's locks are held, so it must only
/// register through `contributions` and never call back into the resolver.
pub trait ProviderSource: Send + Sync {
	/// Registers providers; returns true if anything was added.
	fn contribute(&self, contributions: &mut Contributions) -> bool;
}

/// Registration sink handed to a [`ProviderSource`].
pub struct Contributions {
	map: ProviderMap,
	added: usize,
}

impl Contributions {
	pub(crate) fn new(map: ProviderMap) -> Self {
		Self { map, added: 0 }
	}

	/// Appends `provider` for `source_type`.
	pub fn register(&mut self, provider: SharedProvider, source_type: &str) {
		self.map.push(provider, source_type);
		self.added += 1;
	}

	/// Number of registrations made so far.
	pub fn added(&self) -> usize {
		self.added
	}

	/// Providers visible to the source, including its own additions.
	pub fn providers(&self) -> &ProviderMap {
		&self.map
	}

	pub(crate) fn into_map(self) -> ProviderMap {
		self.map
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use adapt_types::Type;

	use super::*;
	use crate::test_fixtures::{FixedProvider, shared};

	fn provider(name: &'static str) -> SharedProvider {
		let x = Type::root("X");
		shared(&Arc::new(FixedProvider::new(name, &[&x])))
	}

	#[test]
	fn push_preserves_order_and_duplicates() {
		let p1 = provider("p1");
		let p2 = provider("p2");
		let mut map = ProviderMap::default();
		map.push(p1.clone(), "A");
		map.push(p2.clone(), "A");
		map.push(p1.clone(), "A");

		let list = map.get("A");
		assert_eq!(list.len(), 3);
		assert!(same_provider(&list[0], &p1));
		assert!(same_provider(&list[1], &p2));
		assert!(same_provider(&list[2], &p1));
		assert_eq!(map.registrations(), 3);
		assert!(map.get("B").is_empty());
	}

	#[test]
	fn remove_everywhere_drops_first_occurrence_per_list() {
		let p1 = provider("p1");
		let p2 = provider("p2");
		let mut map = ProviderMap::default();
		map.push(p1.clone(), "A");
		map.push(p1.clone(), "A");
		map.push(p1.clone(), "B");
		map.push(p2.clone(), "C");

		assert!(map.remove_everywhere(&p1));
		assert_eq!(map.get("A").len(), 1);
		assert!(map.get("B").is_empty());
		assert_eq!(map.len(), 2);

		assert!(map.remove_everywhere(&p1));
		assert!(!map.remove_everywhere(&p1));
		assert_eq!(map.len(), 1);
	}

	#[test]
	fn remove_from_touches_one_list() {
		let p1 = provider("p1");
		let mut map = ProviderMap::default();
		map.push(p1.clone(), "A");
		map.push(p1.clone(), "B");

		assert!(map.remove_from(&p1, "A"));
		assert!(!map.remove_from(&p1, "A"));
		assert!(!map.remove_from(&p1, "Missing"));
		assert_eq!(map.get("B").len(), 1);
	}

	#[test]
	fn edits_do_not_leak_into_published_copies() {
		let p1 = provider("p1");
		let mut published = ProviderMap::default();
		published.push(p1.clone(), "A");

		let mut draft = published.clone();
		draft.push(provider("p2"), "A");
		draft.remove_everywhere(&p1);

		assert_eq!(published.get("A").len(), 1);
		assert!(same_provider(&published.get("A")[0], &p1));
		assert_eq!(draft.get("A").len(), 1);
	}

	#[test]
	fn contributions_count_registrations() {
		let mut contributions = Contributions::new(ProviderMap::default());
		contributions.register(provider("p1"), "A");
		contributions.register(provider("p2"), "B");
		assert_eq!(contributions.added(), 2);
		assert_eq!(contributions.providers().len(), 2);
		assert_eq!(contributions.into_map().registrations(), 2);
	}
}
