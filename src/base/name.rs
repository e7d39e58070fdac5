//! Qualified names and two-segment paths.
//!
//! Declarations are referenced by `Namespace.Name`. Container-scoped and member
//! references use a two-segment path `Namespace.Container/EntitySet` or
//! `Namespace.Enum/Member`. A parser must hand over well-formed paths; a
//! malformed one is a collaborator defect and is rejected with a
//! [`ContractViolation`] at construction time rather than surfacing later as a
//! resolution failure.

use std::fmt;
use std::str::FromStr;

use smol_str::SmolStr;
use thiserror::Error;

use super::constants::{NAMESPACE_SEPARATOR, PATH_SEPARATOR};

/// A violated collaborator contract.
///
/// Distinct from [`EdmError`](crate::hir::EdmError): those describe defects in
/// the schema document and never abort resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("malformed two-segment path '{0}': expected '<first>/<second>'")]
    MalformedPath(String),
    #[error("malformed qualified name '{0}': expected '<namespace>.<name>'")]
    MalformedQualifiedName(String),
}

/// Split `Namespace.Name` at the last separator.
///
/// Namespaces may themselves be dotted (`Org.Sales.Product`).
pub fn split_qualified_name(name: &str) -> Option<(&str, &str)> {
    let idx = name.rfind(NAMESPACE_SEPARATOR)?;
    let (namespace, rest) = (&name[..idx], &name[idx + 1..]);
    if namespace.is_empty() || rest.is_empty() {
        return None;
    }
    Some((namespace, rest))
}

/// Join a namespace and a local name.
pub fn qualify(namespace: &str, name: &str) -> String {
    let mut s = String::with_capacity(namespace.len() + name.len() + 1);
    s.push_str(namespace);
    s.push(NAMESPACE_SEPARATOR);
    s.push_str(name);
    s
}

/// A validated `<first>/<second>` path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct TwoSegmentPath {
    first: SmolStr,
    second: SmolStr,
}

impl TwoSegmentPath {
    pub fn parse(path: &str) -> Result<Self, ContractViolation> {
        let mut parts = path.split(PATH_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(first), Some(second), None) if !first.is_empty() && !second.is_empty() => {
                Ok(Self {
                    first: SmolStr::new(first),
                    second: SmolStr::new(second),
                })
            }
            _ => Err(ContractViolation::MalformedPath(path.to_string())),
        }
    }

    /// The qualified container or enum type name.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// The entity set or member name.
    pub fn second(&self) -> &str {
        &self.second
    }
}

impl FromStr for TwoSegmentPath {
    type Err = ContractViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TwoSegmentPath {
    type Error = ContractViolation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TwoSegmentPath> for String {
    fn from(path: TwoSegmentPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for TwoSegmentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.first, PATH_SEPARATOR, self.second)
    }
}
