//! # Refgraph Entity
//!
//! Declaration-level entities produced by language extractors and consumed
//! by the reference graph.
//!
//! ```text
//! Source file
//!     │
//!     └──> Extractor (per language, external)
//!            ├─ FunctionFile: Function[] with spans
//!            └─ SymbolFile:   Symbol[] (every named token)
//! ```
//!
//! Functions carry three identities of decreasing coarseness, see
//! [`identity`]. Keep them apart: matching on the wrong one is how a
//! reference graph quietly goes wrong.

pub mod identity;
mod span;
mod types;

pub use identity::{Descriptor, IndexName, Signature};
pub use span::{Point, Span};
pub use types::{
    FileResult, Function, FunctionFile, FunctionWithPath, Language, NodeId, Symbol, SymbolFile,
    ValueUnit,
};
