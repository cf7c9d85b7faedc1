//! Identity-compared type handles.
//!
//! # Invariants
//!
//! - A [`Type`] is immutable once constructed; parents and supertypes must exist
//!   before the types that name them, so the graph is acyclic.
//! - Equality and hashing use the handle's allocation, never the name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::TypeError;

/// Whether a [`Type`] is a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
	/// Has at most one parent class and any number of declared interfaces.
	Class,
	/// Declares super-interfaces only.
	Interface,
}

struct TypeData {
	name: Box<str>,
	kind: TypeKind,
	parent: Option<Type>,
	supertypes: Box<[Type]>,
}

/// Cheap handle to a host type.
#[derive(Clone)]
pub struct Type(Arc<TypeData>);

impl Type {
	/// Creates a class without a parent.
	pub fn root(name: impl Into<Box<str>>) -> Self {
		Self::from_parts(name.into(), TypeKind::Class, None, Box::default())
	}

	/// Creates a class extending `parent` that implements `interfaces` in declaration order.
	pub fn class<'a>(
		name: impl Into<Box<str>>,
		parent: &Type,
		interfaces: impl IntoIterator<Item = &'a Type>,
	) -> Result<Self, TypeError> {
		let name = name.into();
		if parent.is_interface() {
			return Err(TypeError::ParentNotClass {
				name: name.into(),
				parent: parent.name().to_owned(),
			});
		}
		let supertypes = collect_interfaces(&name, interfaces)?;
		Ok(Self::from_parts(name, TypeKind::Class, Some(parent.clone()), supertypes))
	}

	/// Creates an interface extending `supertypes` in declaration order.
	pub fn interface<'a>(
		name: impl Into<Box<str>>,
		supertypes: impl IntoIterator<Item = &'a Type>,
	) -> Result<Self, TypeError> {
		let name = name.into();
		let supertypes = collect_interfaces(&name, supertypes)?;
		Ok(Self::from_parts(name, TypeKind::Interface, None, supertypes))
	}

	fn from_parts(name: Box<str>, kind: TypeKind, parent: Option<Type>, supertypes: Box<[Type]>) -> Self {
		Self(Arc::new(TypeData {
			name,
			kind,
			parent,
			supertypes,
		}))
	}

	/// Returns the qualified name.
	#[inline]
	pub fn name(&self) -> &str {
		&self.0.name
	}

	#[inline]
	pub fn kind(&self) -> TypeKind {
		self.0.kind
	}

	#[inline]
	pub fn is_interface(&self) -> bool {
		self.0.kind == TypeKind::Interface
	}

	/// Returns the parent class, if any. Interfaces never have one.
	#[inline]
	pub fn parent(&self) -> Option<&Type> {
		self.0.parent.as_ref()
	}

	/// Returns the directly declared interfaces in declaration order.
	#[inline]
	pub fn supertypes(&self) -> &[Type] {
		&self.0.supertypes
	}

	/// Returns true if a value of type `other` is also an instance of `self`.
	pub fn is_assignable_from(&self, other: &Type) -> bool {
		let mut seen: FxHashSet<&Type> = FxHashSet::default();
		let mut stack = vec![other];
		while let Some(ty) = stack.pop() {
			if ty == self {
				return true;
			}
			if !seen.insert(ty) {
				continue;
			}
			stack.extend(ty.parent());
			stack.extend(ty.supertypes());
		}
		false
	}
}

fn collect_interfaces<'a>(name: &str, declared: impl IntoIterator<Item = &'a Type>) -> Result<Box<[Type]>, TypeError> {
	declared
		.into_iter()
		.map(|ty| {
			if ty.is_interface() {
				Ok(ty.clone())
			} else {
				Err(TypeError::NotAnInterface {
					name: name.to_owned(),
					supertype: ty.name().to_owned(),
				})
			}
		})
		.collect()
}

impl PartialEq for Type {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Type {}

impl Hash for Type {
	fn hash<H: Hasher>(&self, state: &mut H) {
		std::ptr::hash(Arc::as_ptr(&self.0), state);
	}
}

impl fmt::Debug for Type {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Type")
			.field("name", &self.name())
			.field("kind", &self.kind())
			.finish()
	}
}

impl fmt::Display for Type {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
