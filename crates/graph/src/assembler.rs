use crate::error::Result;
use crate::slim::SlimContextIndex;
use crate::types::{FuncGraph, GraphStats, Relation};
use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;
use refgraph_entity::{FunctionWithPath, Signature};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A function with its direct neighbors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionContext {
    #[serde(flatten)]
    pub function: FunctionWithPath,
    pub calls: Vec<FunctionWithPath>,
    pub reverse_calls: Vec<FunctionWithPath>,
}

/// Same as [`FunctionContext`] but neighbors are kept as signatures only,
/// which bounds the payload when contexts are persisted in bulk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionContextSlim {
    #[serde(flatten)]
    pub function: FunctionWithPath,
    pub calls: Vec<Signature>,
    pub reverse_calls: Vec<Signature>,
}

/// Role of a vertex in a rendered context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextRole {
    Target,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextNode {
    pub signature: Signature,
    pub path: String,
    pub role: ContextRole,
}

impl fmt::Display for ContextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.signature, self.path)
    }
}

impl FunctionContext {
    pub fn new(function: FunctionWithPath) -> Self {
        Self {
            function,
            calls: Vec::new(),
            reverse_calls: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_isolated(&self) -> bool {
        self.calls.is_empty() && self.reverse_calls.is_empty()
    }

    /// Keep signatures only, in the same order
    #[must_use]
    pub fn to_slim(&self) -> FunctionContextSlim {
        FunctionContextSlim {
            function: self.function.clone(),
            calls: self.calls.iter().map(|f| f.signature()).collect(),
            reverse_calls: self.reverse_calls.iter().map(|f| f.signature()).collect(),
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Star-shaped graph: the function, its callees and its callers.
    /// Every edge points from caller to callee.
    #[must_use]
    pub fn to_graph(&self) -> DiGraph<ContextNode, Relation> {
        let node = |f: &FunctionWithPath, role| ContextNode {
            signature: f.signature(),
            path: f.path.clone(),
            role,
        };

        let mut graph = DiGraph::new();
        let center = graph.add_node(node(&self.function, ContextRole::Target));
        for callee in &self.calls {
            let idx = graph.add_node(node(callee, ContextRole::Direct));
            graph.add_edge(center, idx, Relation::Calls);
        }
        for caller in &self.reverse_calls {
            let idx = graph.add_node(node(caller, ContextRole::Direct));
            graph.add_edge(idx, center, Relation::Calls);
        }
        graph
    }

    /// Graphviz rendering of [`Self::to_graph`]
    #[must_use]
    pub fn to_dot(&self) -> String {
        let graph = self.to_graph();
        format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
    }
}

impl FunctionContextSlim {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FuncGraph {
    /// Function plus its one-hop calls and reverse calls.
    /// Unknown functions come back isolated.
    #[must_use]
    pub fn find_related(&self, f: &FunctionWithPath) -> FunctionContext {
        FunctionContext {
            function: f.clone(),
            calls: self.find_calls(f),
            reverse_calls: self.find_reverse_calls(f),
        }
    }
}

/// Produces function contexts from a built graph
pub struct ContextAssembler {
    graph: FuncGraph,
}

impl ContextAssembler {
    pub fn new(graph: FuncGraph) -> Self {
        Self { graph }
    }

    #[must_use]
    pub fn graph(&self) -> &FuncGraph {
        &self.graph
    }

    #[must_use]
    pub fn into_graph(self) -> FuncGraph {
        self.graph
    }

    #[must_use]
    pub fn assemble(&self, f: &FunctionWithPath) -> FunctionContext {
        self.graph.find_related(f)
    }

    /// Contexts of every function sharing the signature
    #[must_use]
    pub fn assemble_for_signature(&self, signature: &Signature) -> Vec<FunctionContext> {
        self.graph
            .find_by_signature(signature)
            .into_iter()
            .map(|f| self.assemble(f))
            .collect()
    }

    /// Contexts of the functions touched by changed lines of one file
    #[must_use]
    pub fn assemble_for_lines(&self, path: &str, lines: &[u32]) -> Vec<FunctionContext> {
        self.graph
            .find_by_lines(path, lines)
            .into_iter()
            .map(|f| self.assemble(f))
            .collect()
    }

    /// Context of every function, in extraction order
    pub fn assemble_all(&self) -> impl Iterator<Item = FunctionContext> + '_ {
        self.graph.functions().map(|f| self.assemble(f))
    }

    /// Slim contexts grouped into batches of at most `batch_size`, so a
    /// persistence worker can store and retry them one batch at a time
    #[must_use]
    pub fn assemble_slim_batches(&self, batch_size: usize) -> Vec<Vec<FunctionContextSlim>> {
        let batch_size = batch_size.max(1);
        let mut batches = Vec::new();
        let mut current = Vec::with_capacity(batch_size);
        for ctx in self.assemble_all() {
            current.push(ctx.to_slim());
            if current.len() == batch_size {
                batches.push(std::mem::replace(
                    &mut current,
                    Vec::with_capacity(batch_size),
                ));
            }
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    /// Signature-keyed index of every slim context
    #[must_use]
    pub fn slim_index(&self) -> SlimContextIndex {
        self.assemble_all().map(|ctx| ctx.to_slim()).collect()
    }

    #[must_use]
    pub fn get_stats(&self) -> GraphStats {
        self.graph.stats()
    }
}
