use std::fmt;

use adapt_types::Type;

use crate::provider::SharedProvider;

/// A provider returned a value that is not an instance of the requested type.
#[derive(Debug, Clone)]
pub struct Anomaly {
	pub provider: SharedProvider,
	/// Runtime type of the rejected value.
	pub actual: Type,
}

/// Every wrong-typed result seen by a typed query that found nothing valid.
#[derive(Debug, Clone)]
pub struct IncompatibleCapabilities {
	pub expected: Type,
	pub anomalies: Vec<Anomaly>,
}

impl fmt::Display for IncompatibleCapabilities {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (idx, anomaly) in self.anomalies.iter().enumerate() {
			if idx > 0 {
				f.write_str("\n")?;
			}
			write!(
				f,
				"provider {:?} returned {} that is not an instance of {}",
				anomaly.provider, anomaly.actual, self.expected
			)?;
		}
		Ok(())
	}
}

/// Resolver query failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
	/// Name-based queries require a non-empty capability name.
	#[error("capability name must not be empty")]
	EmptyCapabilityName,
	/// Providers are defective: they only produced values of the wrong type.
	#[error("{0}")]
	Incompatible(IncompatibleCapabilities),
}
