//! Shared doubles for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use adapt_types::{Adaptable, Object, Type, TypeLoader, TypeSpace};

use crate::provider::{Provider, SharedProvider};

/// Minimal adaptable value tagged with the provider or test that created it.
#[derive(Debug)]
pub(crate) struct Thing {
	ty: Type,
	pub(crate) tag: &'static str,
}

impl Thing {
	pub(crate) fn object(ty: &Type, tag: &'static str) -> Object {
		Arc::new(Self { ty: ty.clone(), tag })
	}
}

impl Adaptable for Thing {
	fn runtime_type(&self) -> &Type {
		&self.ty
	}
}

pub(crate) fn tag_of(object: &Object) -> &'static str {
	adapt_types::downcast_ref::<Thing>(&**object).map_or("<foreign>", |thing| thing.tag)
}

#[derive(Debug, Clone, Copy)]
enum Output {
	/// An instance of the requested capability type.
	Requested,
	/// Nothing at all.
	Nothing,
}

/// Provider with a fixed declaration that counts `produce` calls.
#[derive(Debug)]
pub(crate) struct FixedProvider {
	name: &'static str,
	types: Vec<Type>,
	output: Output,
	wrong: Option<Type>,
	space: Option<TypeSpace>,
	calls: AtomicUsize,
}

impl FixedProvider {
	/// Declares `types` and produces an instance of whatever type is requested.
	pub(crate) fn new(name: &'static str, types: &[&Type]) -> Self {
		Self {
			name,
			types: types.iter().map(|&ty| ty.clone()).collect(),
			output: Output::Requested,
			wrong: None,
			space: None,
			calls: AtomicUsize::new(0),
		}
	}

	/// Produces nothing.
	pub(crate) fn empty(mut self) -> Self {
		self.output = Output::Nothing;
		self
	}

	/// Produces instances of `ty` regardless of the requested type.
	pub(crate) fn returning(mut self, ty: &Type) -> Self {
		self.wrong = Some(ty.clone());
		self
	}

	/// Resolves capability names through `space`.
	pub(crate) fn with_loader(mut self, space: TypeSpace) -> Self {
		self.space = Some(space);
		self
	}

	pub(crate) fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl Provider for FixedProvider {
	fn produce(&self, _source: &Object, capability: &Type) -> Option<Object> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		match (self.output, &self.wrong) {
			(Output::Nothing, _) => None,
			(Output::Requested, Some(wrong)) => Some(Thing::object(wrong, self.name)),
			(Output::Requested, None) => Some(Thing::object(capability, self.name)),
		}
	}

	fn capability_types(&self) -> Vec<Type> {
		self.types.clone()
	}

	fn loader(&self) -> Option<&dyn TypeLoader> {
		self.space.as_ref().map(|space| space as &dyn TypeLoader)
	}
}

pub(crate) fn shared(provider: &Arc<FixedProvider>) -> SharedProvider {
	Arc::clone(provider) as SharedProvider
}
