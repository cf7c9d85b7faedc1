//! Ready-made deferred provider.

use std::fmt;
use std::sync::OnceLock;

use adapt_types::{Object, Type, TypeLoader};

use crate::provider::{Deferred, Provider, SharedProvider};

type Materialize = Box<dyn Fn() -> Option<SharedProvider> + Send + Sync>;

/// Provider that declares its capability names up front and materializes the
/// real provider on the first forced load.
///
/// The materialization outcome is remembered, including failure. Until loaded,
/// it produces nothing and resolves no types.
pub struct LazyProvider {
	label: Box<str>,
	names: Box<[Box<str>]>,
	materialize: Materialize,
	loaded: OnceLock<Option<SharedProvider>>,
}

impl LazyProvider {
	pub fn new<N>(
		label: impl Into<Box<str>>,
		names: impl IntoIterator<Item = N>,
		materialize: impl Fn() -> Option<SharedProvider> + Send + Sync + 'static,
	) -> Self
	where
		N: Into<Box<str>>,
	{
		Self {
			label: label.into(),
			names: names.into_iter().map(Into::into).collect(),
			materialize: Box::new(materialize),
			loaded: OnceLock::new(),
		}
	}

	fn delegate(&self) -> Option<&SharedProvider> {
		self.loaded.get()?.as_ref()
	}
}

impl fmt::Debug for LazyProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = match self.loaded.get() {
			None => "pending",
			Some(Some(_)) => "loaded",
			Some(None) => "failed",
		};
		f.debug_struct("LazyProvider")
			.field("label", &self.label)
			.field("names", &self.names)
			.field("state", &state)
			.finish()
	}
}

impl Provider for LazyProvider {
	fn produce(&self, source: &Object, capability: &Type) -> Option<Object> {
		self.delegate()?.produce(source, capability)
	}

	fn capability_types(&self) -> Vec<Type> {
		self.delegate().map(|p| p.capability_types()).unwrap_or_default()
	}

	fn capability_names(&self) -> Vec<String> {
		self.names.iter().map(|name| name.to_string()).collect()
	}

	fn loader(&self) -> Option<&dyn TypeLoader> {
		self.delegate()?.loader()
	}

	fn as_deferred(&self) -> Option<&dyn Deferred> {
		Some(self)
	}
}

impl Deferred for LazyProvider {
	fn is_loaded(&self) -> bool {
		self.delegate().is_some()
	}

	fn load(&self, force: bool) -> Option<SharedProvider> {
		if let Some(outcome) = self.loaded.get() {
			return outcome.clone();
		}
		if !force {
			return None;
		}
		self.loaded
			.get_or_init(|| {
				let provider = (self.materialize)();
				if provider.is_none() {
					tracing::warn!(provider = %self.label, "lazy provider failed to materialize");
				}
				provider
			})
			.clone()
	}
}
