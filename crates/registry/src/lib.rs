//! Capability resolution over a dynamic provider registry.
//!
//! Providers are registered against source type names and declare which
//! capability types they can produce. A [`Resolver`] answers, for any
//! [`Object`](adapt_types::Object), which provider can adapt it to a requested
//! capability, searching the object's type and then its ancestors in
//! [`search_order`](adapt_types::search_order).
//!
//! # Key types
//!
//! | Type | Role |
//! |------|------|
//! | [`Resolver`] | Query entry point and registry owner. |
//! | [`ResolverBuilder`] | Startup configuration: label, providers, lazy sources. |
//! | [`Provider`] / [`Deferred`] | Contract implemented by capability providers. |
//! | [`LazyProvider`] | Provider that materializes its delegate on first forced load. |
//! | [`ProviderSource`] | Contributes providers on first demand. |
//! | [`CapabilityTable`] | Per-source-type candidate lists, cached until the next mutation. |

mod builder;
mod epoch;
mod error;
mod lazy;
mod provider;
mod registry;
mod resolver;
mod table;
mod type_cache;

#[cfg(test)]
mod test_fixtures;

pub use builder::ResolverBuilder;
pub use epoch::SearchOrder;
pub use error::{Anomaly, IncompatibleCapabilities, ResolveError};
pub use lazy::LazyProvider;
pub use provider::{Deferred, Provider, SharedProvider, same_provider};
pub use registry::{Contributions, ProviderMap, ProviderSource};
pub use resolver::{CapabilityStatus, Resolver};
pub use table::CapabilityTable;
