//! # Refgraph Graph
//!
//! Function reference graph of one repository revision, used to find the
//! functions affected by a change.
//!
//! ## Features
//!
//! - **Reference graph** - an edge `A -> B` means the name of `B` occurs inside `A`
//! - **Lazy neighbor index** - built once on first query, shared by every reader
//! - **Function contexts** - a function with its direct callers and callees
//! - **Impact chains** - bounded transitive walks over callers or callees
//!
//! ## Architecture
//!
//! ```text
//! FunctionFile[] + SymbolFile[]
//!     │
//!     ├──> Graph Builder
//!     │      ├─ Register functions as vertices
//!     │      ├─ Attribute symbols to their enclosing function
//!     │      └─ Correlate symbol names with function names (edges)
//!     │
//!     ├──> FuncGraph (petgraph)
//!     │      ├─ call graph: caller -> callee
//!     │      ├─ reverse call graph: callee -> caller
//!     │      └─ neighbor index (OnceCell)
//!     │
//!     ├──> Context Assembler
//!     │      ├─ FunctionContext / FunctionContextSlim
//!     │      └─ SlimContextIndex keyed by signature
//!     │
//!     └──> Chain Walker
//!            ├─ Any SuccessorLookup: the graph or a slim index
//!            └─ Depth bound, deadline, cancellation
//! ```
//!
//! The graph is a name-correlation heuristic, not a resolved call graph: two
//! functions sharing a name are both referenced by every occurrence of it.

mod assembler;
mod builder;
mod chain;
mod config;
mod error;
mod graph;
mod slim;
mod types;

pub use assembler::{ContextAssembler, ContextNode, ContextRole, FunctionContext, FunctionContextSlim};
pub use builder::GraphBuilder;
pub use chain::{Chain, ChainTree, ChainWalker, RelatedFunctions, SuccessorLookup};
pub use config::GraphConfig;
pub use error::{GraphError, Result};
pub use slim::{FunctionContextChains, SlimContextIndex};
pub use types::{FuncGraph, FuncGraphType, GraphStats, QueryDepth, Relation};

pub use refgraph_entity as entity;
