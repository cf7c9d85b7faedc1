use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::ty::Type;

/// Upcasting support so trait objects can be downcast to their concrete type.
pub trait AsAny: Any + Send + Sync {
	fn as_any(&self) -> &dyn Any;
	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
		self
	}
}

/// A value that can be queried for capabilities, or returned as one.
pub trait Adaptable: AsAny {
	/// Returns the host type this value is an instance of.
	fn runtime_type(&self) -> &Type;
}

/// Shared handle to an [`Adaptable`] value.
pub type Object = Arc<dyn Adaptable>;

impl fmt::Debug for dyn Adaptable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Object({})", self.runtime_type().name())
	}
}

/// Borrows the concrete Rust value behind an object.
pub fn downcast_ref<T: Adaptable>(object: &dyn Adaptable) -> Option<&T> {
	AsAny::as_any(object).downcast_ref::<T>()
}

/// Recovers a typed handle from an object, sharing the allocation.
pub fn downcast<T: Adaptable>(object: &Object) -> Option<Arc<T>> {
	Arc::clone(object).into_any().downcast::<T>().ok()
}
