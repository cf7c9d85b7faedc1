//! Explicit host type graph.

use rustc_hash::FxHashMap;

use crate::error::{TypeError, TypeLoadError};
use crate::ty::Type;

/// Name of the root class every [`TypeSpace`] starts with.
pub const OBJECT: &str = "Object";

/// Loading context that turns qualified names into types.
pub trait TypeLoader: Send + Sync {
	fn load_type(&self, name: &str) -> Result<Type, TypeLoadError>;
}

/// Name-indexed set of types rooted at [`OBJECT`].
///
/// Classes defined without a parent extend the root. Defining a name twice
/// replaces the indexed entry; handles to the old type stay valid.
#[derive(Debug, Clone)]
pub struct TypeSpace {
	object: Type,
	by_name: FxHashMap<Box<str>, Type>,
}

impl Default for TypeSpace {
	fn default() -> Self {
		Self::new()
	}
}

impl TypeSpace {
	pub fn new() -> Self {
		let object = Type::root(OBJECT);
		let mut by_name = FxHashMap::default();
		by_name.insert(Box::from(OBJECT), object.clone());
		Self { object, by_name }
	}

	/// Returns the root class.
	pub fn object(&self) -> &Type {
		&self.object
	}

	/// Defines and indexes a class.
	pub fn class(&mut self, name: &str, parent: Option<&Type>, interfaces: &[&Type]) -> Result<Type, TypeError> {
		let parent = parent.unwrap_or(&self.object);
		let ty = Type::class(name, parent, interfaces.iter().copied())?;
		self.insert(ty.clone());
		Ok(ty)
	}

	/// Defines and indexes an interface.
	pub fn interface(&mut self, name: &str, supertypes: &[&Type]) -> Result<Type, TypeError> {
		let ty = Type::interface(name, supertypes.iter().copied())?;
		self.insert(ty.clone());
		Ok(ty)
	}

	/// Indexes an externally built type, returning the entry it displaced.
	pub fn insert(&mut self, ty: Type) -> Option<Type> {
		self.by_name.insert(Box::from(ty.name()), ty)
	}

	pub fn get(&self, name: &str) -> Option<&Type> {
		self.by_name.get(name)
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}
}

impl TypeLoader for TypeSpace {
	fn load_type(&self, name: &str) -> Result<Type, TypeLoadError> {
		self.get(name).cloned().ok_or_else(|| TypeLoadError::NotFound(name.to_owned()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classes_default_to_object_parent() {
		let mut space = TypeSpace::new();
		let a = space.class("A", None, &[]).unwrap();
		assert_eq!(a.parent(), Some(space.object()));
		assert_eq!(space.len(), 2);
	}

	#[test]
	fn loader_resolves_defined_names() {
		let mut space = TypeSpace::new();
		let i = space.interface("I", &[]).unwrap();
		let a = space.class("A", None, &[&i]).unwrap();

		assert_eq!(space.load_type("A"), Ok(a));
		assert_eq!(space.load_type("I"), Ok(i));
		assert_eq!(space.load_type(OBJECT).as_ref(), Ok(space.object()));
		assert_eq!(space.load_type("Missing"), Err(TypeLoadError::NotFound("Missing".into())));
	}

	#[test]
	fn redefinition_replaces_index_entry() {
		let mut space = TypeSpace::new();
		let first = space.class("A", None, &[]).unwrap();
		let second = space.class("A", None, &[]).unwrap();
		assert_ne!(first, second);
		assert_eq!(space.get("A"), Some(&second));
	}

	#[test]
	fn invalid_definitions_are_not_indexed() {
		let mut space = TypeSpace::new();
		let i = space.interface("I", &[]).unwrap();
		assert!(space.class("A", Some(&i), &[]).is_err());
		assert!(space.get("A").is_none());
	}
}
