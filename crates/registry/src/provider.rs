//! Provider contracts consumed by the resolver.

use std::fmt;
use std::sync::Arc;

use adapt_types::{Object, Type, TypeLoader};

/// Shared provider handle. Identity is the allocation address.
pub type SharedProvider = Arc<dyn Provider>;

/// Produces capability values for the source types it is registered against.
pub trait Provider: fmt::Debug + Send + Sync + 'static {
	/// Returns a value of type `capability` adapting `source`, or `None`.
	fn produce(&self, source: &Object, capability: &Type) -> Option<Object>;

	/// Returns the capability types this provider can produce.
	///
	/// May materialize the provider's backing code. The resolver only calls this when
	/// the provider's loading context cannot resolve a requested name.
	fn capability_types(&self) -> Vec<Type>;

	/// Returns the names of the declared capability types.
	///
	/// Must not require loading backing code; providers that defer loading override it.
	fn capability_names(&self) -> Vec<String> {
		self.capability_types().iter().map(|ty| ty.name().to_owned()).collect()
	}

	/// Loading context used to resolve capability names into types.
	fn loader(&self) -> Option<&dyn TypeLoader> {
		None
	}

	/// Exposes the deferred-loading contract, if this provider materializes lazily.
	fn as_deferred(&self) -> Option<&dyn Deferred> {
		None
	}
}

/// Extended contract for providers that defer their own materialization.
pub trait Deferred {
	/// Returns true once the backing provider is available.
	fn is_loaded(&self) -> bool;

	/// Returns the backing provider. Without `force`, only an already loaded
	/// provider is returned.
	fn load(&self, force: bool) -> Option<SharedProvider>;
}

/// Returns true for plain providers and for deferred providers that have loaded.
pub(crate) fn is_loaded(provider: &SharedProvider) -> bool {
	provider.as_deferred().is_none_or(|deferred| deferred.is_loaded())
}

/// Identity comparison for provider handles.
#[inline]
pub fn same_provider(a: &SharedProvider, b: &SharedProvider) -> bool {
	std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
