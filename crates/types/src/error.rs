/// Rejected type graph construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
	/// A class named an interface as its parent.
	#[error("class {name} cannot extend interface {parent}")]
	ParentNotClass { name: String, parent: String },
	/// A class was listed where only interfaces are allowed.
	#[error("{name} cannot declare class {supertype} as an interface")]
	NotAnInterface { name: String, supertype: String },
}

/// A loading context could not produce a type for a name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeLoadError {
	#[error("type {0} not found")]
	NotFound(String),
	#[error("no loading context available for type {0}")]
	NoLoader(String),
}
