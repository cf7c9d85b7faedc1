//! Host type model for the capability resolver.
//!
//! The resolver never inspects Rust types directly. Everything it needs to know
//! about inheritance comes from the explicit graph in this crate:
//!
//! - [`Type`] - identity-compared handle with a parent class and declared interfaces
//! - [`TypeSpace`] - a name-indexed graph rooted at `Object`, usable as a [`TypeLoader`]
//! - [`Adaptable`] / [`Object`] - values that report their runtime [`Type`]
//! - [`search_order`] - the deterministic ancestor walk used for provider lookup

mod error;
mod object;
mod order;
mod space;
mod ty;

pub use error::{TypeError, TypeLoadError};
pub use object::{Adaptable, AsAny, Object, downcast, downcast_ref};
pub use order::search_order;
pub use space::{OBJECT, TypeLoader, TypeSpace};
pub use ty::{Type, TypeKind};
