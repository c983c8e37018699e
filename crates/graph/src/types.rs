use once_cell::sync::OnceCell;
use petgraph::graph::{DiGraph, NodeIndex};
use refgraph_entity::{Descriptor, FunctionWithPath};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Vertices are shared between both directions
pub type FuncGraphType = DiGraph<Arc<FunctionWithPath>, ()>;

/// Direction of a one-hop relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Functions referenced from inside the function (edge caller -> callee)
    Calls,

    /// Functions that reference the function (edge callee -> caller)
    ReverseCalls,
}

impl Relation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calls => "calls",
            Self::ReverseCalls => "reverse_calls",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far a relationship query goes.
///
/// One hop is served from the cached neighbor index. Chains walk the graph
/// and can be expensive on dense repositories, so they always carry a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum QueryDepth {
    OneHop,
    BoundedChain { depth: usize },
}

impl Default for QueryDepth {
    fn default() -> Self {
        Self::OneHop
    }
}

/// Graph size summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub vertices: usize,
    pub edges: usize,
    pub adjacency_ready: bool,
}

/// Neighbor lists per vertex, ordered by vertex index
#[derive(Debug, Default)]
pub(crate) struct Adjacency {
    pub calls: Vec<Vec<NodeIndex>>,
    pub reverse_calls: Vec<Vec<NodeIndex>>,
}

impl Adjacency {
    pub fn neighbors(&self, idx: NodeIndex, relation: Relation) -> &[NodeIndex] {
        let lists = match relation {
            Relation::Calls => &self.calls,
            Relation::ReverseCalls => &self.reverse_calls,
        };
        lists.get(idx.index()).map_or(&[], Vec::as_slice)
    }
}

/// Reference graph of one revision.
///
/// It is not a serious call graph: edges come from name references, not
/// resolved calls. Immutable once built; the neighbor index is computed on
/// first query and shared afterwards.
pub struct FuncGraph {
    /// caller -> callee
    pub(crate) call_graph: FuncGraphType,

    /// callee -> caller, always the transpose of `call_graph`
    pub(crate) reverse_call_graph: FuncGraphType,

    /// Descriptor -> vertex, same index in both graphs
    pub(crate) vertex_index: HashMap<Descriptor, NodeIndex>,

    pub(crate) adjacency: OnceCell<Adjacency>,

    #[cfg(test)]
    pub(crate) adjacency_builds: std::sync::atomic::AtomicUsize,
}

impl FuncGraph {
    pub(crate) fn new() -> Self {
        Self {
            call_graph: DiGraph::new(),
            reverse_call_graph: DiGraph::new(),
            vertex_index: HashMap::new(),
            adjacency: OnceCell::new(),
            #[cfg(test)]
            adjacency_builds: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Register a vertex in both graphs. A vertex with the same descriptor
    /// is reused.
    pub(crate) fn add_vertex(&mut self, function: FunctionWithPath) -> NodeIndex {
        let desc = function.descriptor();
        if let Some(&idx) = self.vertex_index.get(&desc) {
            log::warn!("Duplicate function vertex {desc}, keeping the first one");
            return idx;
        }

        let shared = Arc::new(function);
        let idx = self.call_graph.add_node(Arc::clone(&shared));
        let reverse_idx = self.reverse_call_graph.add_node(shared);
        debug_assert_eq!(idx, reverse_idx);

        self.vertex_index.insert(desc, idx);
        idx
    }

    /// Record "caller references callee" in both directions.
    /// Returns false when the edge already existed.
    pub(crate) fn add_reference(&mut self, caller: NodeIndex, callee: NodeIndex) -> bool {
        if self.call_graph.find_edge(caller, callee).is_some() {
            return false;
        }
        self.call_graph.add_edge(caller, callee, ());
        self.reverse_call_graph.add_edge(callee, caller, ());
        true
    }

    /// Edge caller -> callee
    #[must_use]
    pub fn call_graph(&self) -> &FuncGraphType {
        &self.call_graph
    }

    /// Edge callee -> caller
    #[must_use]
    pub fn reverse_call_graph(&self) -> &FuncGraphType {
        &self.reverse_call_graph
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.call_graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.call_graph.edge_count()
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            vertices: self.vertex_count(),
            edges: self.edge_count(),
            adjacency_ready: self.adjacency.get().is_some(),
        }
    }
}

impl std::fmt::Debug for FuncGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuncGraph")
            .field("stats", &self.stats())
            .finish()
    }
}
