//! The three ways of naming a function.
//!
//! From coarsest to finest:
//!
//! - [`IndexName`]: the bare identifier, matched against symbol text. Scope
//!   and receiver are ignored.
//! - [`Signature`]: receiver, name and parameter/return types. Stable across
//!   revisions and used as the storage key.
//! - [`Descriptor`]: signature plus file and declaration span. Unique inside
//!   one revision, meaningless across revisions.
//!
//! Conversions only go from the entity towards the coarser identity, never
//! back: an index name cannot be widened into a signature.

use crate::span::Span;
use crate::types::{Function, FunctionWithPath, Symbol};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexName(String);

impl IndexName {
    /// Name typed by a user or read from a store
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<str> for IndexName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Function> for IndexName {
    fn from(function: &Function) -> Self {
        Self(function.name.clone())
    }
}

impl From<&Symbol> for IndexName {
    fn from(symbol: &Symbol) -> Self {
        Self(symbol.symbol.clone())
    }
}

/// `<receiver>::<name>|<paramTypes>|<returnTypes>`, types comma-joined.
///
/// The format is shared with other processes and stores, keep it bit exact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a signature received from a store or a query string
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl Borrow<str> for Signature {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Function> for Signature {
    fn from(function: &Function) -> Self {
        let params = function
            .parameters
            .iter()
            .map(|p| p.type_name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let rets = function
            .returns
            .iter()
            .map(|r| r.type_name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Self(format!(
            "{}::{}|{}|{}",
            function.receiver, function.name, params, rets
        ))
    }
}

/// Revision-local vertex identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
    pub path: String,
    pub span: Span,
    pub signature: Signature,
}

impl Descriptor {
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl From<&FunctionWithPath> for Descriptor {
    fn from(fwp: &FunctionWithPath) -> Self {
        Self {
            path: fwp.path.clone(),
            span: fwp.function.span,
            signature: Signature::from(&fwp.function),
        }
    }
}

impl From<Descriptor> for Signature {
    fn from(desc: Descriptor) -> Self {
        desc.signature
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.path, self.span, self.signature)
    }
}

impl Function {
    #[must_use]
    pub fn index_name(&self) -> IndexName {
        IndexName::from(self)
    }

    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature::from(self)
    }
}

impl Symbol {
    #[must_use]
    pub fn index_name(&self) -> IndexName {
        IndexName::from(self)
    }
}

impl FunctionWithPath {
    #[must_use]
    pub fn descriptor(&self) -> Descriptor {
        Descriptor::from(self)
    }
}
