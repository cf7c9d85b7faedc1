//! Ancestor search order.
//!
//! # Invariants
//!
//! - The source type comes first, followed by its parent chain up to the root.
//! - Interfaces follow all classes. Each class contributes its declared interfaces
//!   in declaration order before any of their super-interfaces.
//! - No type appears twice.

use rustc_hash::FxHashSet;

use crate::ty::Type;

/// Computes the ancestor search order for `ty`.
///
/// This is uncached; the resolver memoizes it per type.
pub fn search_order(ty: &Type) -> Vec<Type> {
	let mut order = Vec::new();
	let mut cursor = Some(ty);
	while let Some(class) = cursor {
		order.push(class.clone());
		cursor = class.parent();
	}

	let mut seen = FxHashSet::default();
	let classes = order.len();
	for idx in 0..classes {
		let class = order[idx].clone();
		push_interfaces(class.supertypes(), &mut order, &mut seen);
	}
	order
}

/// Appends unseen `declared` interfaces, then expands each newly found one in turn.
fn push_interfaces(declared: &[Type], order: &mut Vec<Type>, seen: &mut FxHashSet<Type>) {
	let start = order.len();
	for ty in declared {
		if seen.insert(ty.clone()) {
			order.push(ty.clone());
		}
	}
	for idx in start..order.len() {
		let found = order[idx].clone();
		push_interfaces(found.supertypes(), order, seen);
	}
}
