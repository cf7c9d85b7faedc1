#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use adapt_types::{Adaptable, Object, Type, TypeSpace};

use super::Resolver;
use crate::{Contributions, Provider, ProviderSource, SharedProvider, same_provider};

#[derive(Debug)]
struct Plain {
	ty: Type,
	tag: &'static str,
}

impl Adaptable for Plain {
	fn runtime_type(&self) -> &Type {
		&self.ty
	}
}

fn tag(object: &Object) -> &'static str {
	adapt_types::downcast_ref::<Plain>(&**object).map_or("", |p| p.tag)
}

/// Produces an instance of the requested type; optionally produces nothing.
#[derive(Debug)]
struct Echo {
	tag: &'static str,
	declared: Type,
	silent: bool,
	calls: AtomicUsize,
}

impl Echo {
	fn new(tag: &'static str, declared: &Type, silent: bool) -> Arc<Self> {
		Arc::new(Self {
			tag,
			declared: declared.clone(),
			silent,
			calls: AtomicUsize::new(0),
		})
	}
}

impl Provider for Echo {
	fn produce(&self, _source: &Object, capability: &Type) -> Option<Object> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.silent {
			return None;
		}
		Some(Arc::new(Plain {
			ty: capability.clone(),
			tag: self.tag,
		}))
	}

	fn capability_types(&self) -> Vec<Type> {
		vec![self.declared.clone()]
	}
}

fn fixture() -> (TypeSpace, Type, Type) {
	let mut space = TypeSpace::new();
	let x = space.interface("X", &[]).unwrap();
	let a = space.class("A", None, &[]).unwrap();
	(space, x, a)
}

/// Invariant: readers observe a capability table wholly before or wholly after a mutation.
///
/// The writer cycles the registry through `[]`, `[p1]`, `[p1, p2]`. Any other
/// candidate list, or any value not produced by `p1`, means a reader saw a torn state.
pub(crate) fn inv_reads_never_see_partial_tables() {
	let (_space, x, a) = fixture();
	let resolver = Resolver::new("invariants");
	let p1: SharedProvider = Echo::new("p1", &x, false);
	let p2: SharedProvider = Echo::new("p2", &x, false);
	let source: Object = Arc::new(Plain { ty: a.clone(), tag: "source" });
	let stop = AtomicBool::new(false);

	std::thread::scope(|scope| {
		scope.spawn(|| {
			for _ in 0..200 {
				resolver.register_provider(Arc::clone(&p1), "A");
				resolver.register_provider(Arc::clone(&p2), "A");
				resolver.unregister_all();
			}
			stop.store(true, Ordering::SeqCst);
		});

		for _ in 0..4 {
			scope.spawn(|| {
				while !stop.load(Ordering::SeqCst) {
					let table = resolver.capability_table(&a);
					let candidates = table.candidates("X");
					let valid = match candidates {
						[] => true,
						[first] => same_provider(first, &p1),
						[first, second] => same_provider(first, &p1) && same_provider(second, &p2),
						_ => false,
					};
					assert!(valid, "torn candidate list: {candidates:?}");

					if let Some(value) = resolver.get_capability(&source, &x).expect("no anomalies") {
						assert_eq!(tag(&value), "p1");
					}
				}
			});
		}
	});
}

#[cfg_attr(test, test)]
pub(crate) fn test_reads_never_see_partial_tables() {
	inv_reads_never_see_partial_tables()
}

/// Invariant: a registration made on one thread is visible to the next query on another,
/// even when the old table was cached.
pub(crate) fn inv_mutation_invalidates_tables() {
	let (_space, x, a) = fixture();
	let resolver = Resolver::new("invariants");
	let source: Object = Arc::new(Plain { ty: a, tag: "source" });

	assert!(resolver.get_capability(&source, &x).unwrap().is_none());
	std::thread::scope(|scope| {
		scope.spawn(|| resolver.register_provider(Echo::new("late", &x, false), "A"));
	});
	let value = resolver.get_capability(&source, &x).unwrap().expect("visible after join");
	assert_eq!(tag(&value), "late");
}

#[cfg_attr(test, test)]
pub(crate) fn test_mutation_invalidates_tables() {
	inv_mutation_invalidates_tables()
}

struct OnceSource {
	provider: SharedProvider,
	calls: AtomicUsize,
}

impl ProviderSource for OnceSource {
	fn contribute(&self, contributions: &mut Contributions) -> bool {
		self.calls.fetch_add(1, Ordering::SeqCst);
		contributions.register(Arc::clone(&self.provider), "A");
		true
	}
}

/// Invariant: a lazy source is consulted exactly once even when many readers
/// demand the registry at the same time, and every reader sees its providers.
pub(crate) fn inv_lazy_source_drained_once() {
	let (_space, x, a) = fixture();
	let resolver = Resolver::new("invariants");
	let source = Arc::new(OnceSource {
		provider: Echo::new("lazy", &x, false),
		calls: AtomicUsize::new(0),
	});
	resolver.register_lazy_source(source.clone());

	std::thread::scope(|scope| {
		for _ in 0..8 {
			scope.spawn(|| {
				let object: Object = Arc::new(Plain { ty: a.clone(), tag: "source" });
				let value = resolver.get_capability(&object, &x).unwrap().expect("drained before lookup");
				assert_eq!(tag(&value), "lazy");
			});
		}
	});
	assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[cfg_attr(test, test)]
pub(crate) fn test_lazy_source_drained_once() {
	inv_lazy_source_drained_once()
}

/// Invariant: candidates are invoked in order, once each, stopping at the first value.
pub(crate) fn inv_first_match_short_circuits() {
	let (_space, x, a) = fixture();
	let resolver = Resolver::new("invariants");
	let silent = Echo::new("silent", &x, true);
	let winner = Echo::new("winner", &x, false);
	let never = Echo::new("never", &x, false);
	resolver.register_provider(silent.clone(), "A");
	resolver.register_provider(winner.clone(), "A");
	resolver.register_provider(never.clone(), "A");
	let source: Object = Arc::new(Plain { ty: a, tag: "source" });

	let value = resolver.get_capability_by_name(&source, "X").unwrap().unwrap();
	assert_eq!(tag(&value), "winner");
	let calls = [&silent, &winner, &never].map(|p| p.calls.load(Ordering::SeqCst));
	assert_eq!(calls, [1, 1, 0]);
}

#[cfg_attr(test, test)]
pub(crate) fn test_first_match_short_circuits() {
	inv_first_match_short_circuits()
}

/// Invariant: a published table is never mutated; a reader holding one across a
/// mutation keeps the contents it started with.
pub(crate) fn inv_published_tables_are_immutable() {
	let (_space, x, a) = fixture();
	let resolver = Resolver::new("invariants");
	resolver.register_provider(Echo::new("p1", &x, false), "A");

	let held = resolver.capability_table(&a);
	resolver.register_provider(Echo::new("p2", &x, false), "A");
	resolver.flush();

	assert_eq!(held.candidates("X").len(), 1);
	assert_eq!(resolver.capability_table(&a).candidates("X").len(), 2);
}

#[cfg_attr(test, test)]
pub(crate) fn test_published_tables_are_immutable() {
	inv_published_tables_are_immutable()
}
