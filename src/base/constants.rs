//! Domain constants shared across the crate.

/// Namespace of the built-in primitive types.
pub const EDM_NAMESPACE: &str = "Edm";

/// Underlying type of an enum type that declares none.
pub const DEFAULT_ENUM_UNDERLYING_TYPE: &str = "Edm.Int32";

/// Separator between a namespace and a declared name (`Ns.Product`).
pub const NAMESPACE_SEPARATOR: char = '.';

/// Separator between the two segments of a container-scoped or member path
/// (`Ns.Container/Products`, `Ns.Color/Red`).
pub const PATH_SEPARATOR: char = '/';
