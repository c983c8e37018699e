//! Transitive impact analysis.
//!
//! A chain is a path of one-hop relationships starting at the queried
//! function: for a reverse walk from `d` over `a -> b -> d`, the chain is
//! `[d, b, a]`. The walk is depth-first and never re-enters a node already on
//! the current path, so it terminates on cyclic graphs; a branch that only
//! leads back into the path is dropped. The same node may
//! still show up in several chains reached through different paths, which
//! is what makes diamond-shaped graphs expensive: bound the depth.

use crate::error::{GraphError, Result};
use crate::types::{FuncGraph, QueryDepth, Relation};
use refgraph_entity::{Descriptor, FunctionWithPath};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type Chain<N> = Vec<N>;

/// One-hop relationship source for a chain walk.
///
/// Implemented by the in-memory [`FuncGraph`] and by anything that can answer
/// per-node lookups from a store. Store failures are returned as errors; a
/// node without relationships is an empty list.
pub trait SuccessorLookup {
    type Node: Clone + Eq + Hash + Display;

    fn successors(&self, node: &Self::Node, relation: Relation) -> anyhow::Result<Vec<Self::Node>>;
}

impl SuccessorLookup for FuncGraph {
    type Node = Descriptor;

    fn successors(&self, node: &Descriptor, relation: Relation) -> anyhow::Result<Vec<Descriptor>> {
        Ok(self
            .neighbor_vertices(node, relation)
            .into_iter()
            .map(|f| f.descriptor())
            .collect())
    }
}

/// Answer of [`FuncGraph::query`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "functions")]
pub enum RelatedFunctions {
    OneHop(Vec<FunctionWithPath>),
    Chains(Vec<Chain<FunctionWithPath>>),
}

impl RelatedFunctions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::OneHop(functions) => functions.is_empty(),
            Self::Chains(chains) => chains.is_empty(),
        }
    }
}

impl FuncGraph {
    /// Related functions of `f` in one direction.
    ///
    /// `BoundedChain` chains start with `f` itself. Functions unknown to the
    /// graph have no relations.
    pub fn query(
        &self,
        f: &FunctionWithPath,
        relation: Relation,
        depth: QueryDepth,
    ) -> Result<RelatedFunctions> {
        let desc = f.descriptor();
        match depth {
            QueryDepth::OneHop => Ok(RelatedFunctions::OneHop(
                self.find_neighbors(&desc, relation),
            )),
            QueryDepth::BoundedChain { depth } => {
                if self.function(&desc).is_none() {
                    return Ok(RelatedFunctions::Chains(Vec::new()));
                }
                let chains = ChainWalker::new(self, relation)
                    .with_max_depth(depth)
                    .chains(&desc)?
                    .into_iter()
                    .map(|chain| self.resolve_chain(chain))
                    .collect::<Result<Vec<_>>>()?;
                Ok(RelatedFunctions::Chains(chains))
            }
        }
    }

    fn resolve_chain(&self, chain: Chain<Descriptor>) -> Result<Chain<FunctionWithPath>> {
        chain
            .into_iter()
            .map(|desc| {
                self.function(&desc)
                    .cloned()
                    .ok_or_else(|| GraphError::NodeNotFound(desc.to_string()))
            })
            .collect()
    }
}

/// Depth-first chain enumeration over a [`SuccessorLookup`]
pub struct ChainWalker<'a, L: SuccessorLookup + ?Sized> {
    lookup: &'a L,
    relation: Relation,
    max_depth: Option<usize>,
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

struct Frame<N> {
    successors: Vec<N>,
    cursor: usize,
}

impl<'a, L: SuccessorLookup + ?Sized> ChainWalker<'a, L> {
    pub fn new(lookup: &'a L, relation: Relation) -> Self {
        Self {
            lookup,
            relation,
            max_depth: None,
            deadline: None,
            cancel: None,
        }
    }

    /// Follow callers: everything that could be affected by a change
    pub fn reverse(lookup: &'a L) -> Self {
        Self::new(lookup, Relation::ReverseCalls)
    }

    /// Follow callees
    pub fn forward(lookup: &'a L) -> Self {
        Self::new(lookup, Relation::Calls)
    }

    /// Cut chains after `depth` hops
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now
    #[must_use]
    pub fn with_budget(self, budget: Duration) -> Self {
        self.with_deadline(Instant::now() + budget)
    }

    /// Abort the walk once the flag is set
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[must_use]
    pub const fn relation(&self) -> Relation {
        self.relation
    }

    /// Every distinct chain starting at `start`.
    ///
    /// A chain ends at a node without successors or at the depth bound.
    /// Paths whose every successor is already on the path are loops and
    /// produce no chain.
    pub fn chains(&self, start: &L::Node) -> Result<Vec<Chain<L::Node>>> {
        let mut walk = Walk {
            memo: HashMap::new(),
            path: Vec::new(),
            on_path: HashSet::new(),
            frames: Vec::new(),
            chains: Vec::new(),
        };

        self.enter(&mut walk, start.clone())?;
        while let Some(frame) = walk.frames.last_mut() {
            let next = frame.successors[frame.cursor..]
                .iter()
                .position(|n| !walk.on_path.contains(n));
            match next {
                Some(offset) => {
                    let node = frame.successors[frame.cursor + offset].clone();
                    frame.cursor += offset + 1;
                    self.enter(&mut walk, node)?;
                }
                None => {
                    walk.frames.pop();
                    walk.leave();
                }
            }
        }

        log::debug!(
            "Chain walk from {start} ({}): {} chains, {} lookups",
            self.relation,
            walk.chains.len(),
            walk.memo.len()
        );
        Ok(walk.chains)
    }

    /// Push `node` on the path and either open a frame for its successors
    /// or emit the path as a finished chain
    fn enter(&self, walk: &mut Walk<L::Node>, node: L::Node) -> Result<()> {
        walk.path.push(node.clone());
        walk.on_path.insert(node.clone());

        let hops = walk.path.len() - 1;
        if self.max_depth.is_some_and(|max| hops >= max) {
            walk.emit();
            walk.leave();
            return Ok(());
        }

        let successors = match walk.memo.get(&node) {
            Some(cached) => cached.clone(),
            None => {
                self.check_budget()?;
                let found = self
                    .lookup
                    .successors(&node, self.relation)
                    .map_err(|err| GraphError::lookup_failed(&node, err))?;
                walk.memo.insert(node, found.clone());
                found
            }
        };

        if successors.is_empty() {
            walk.emit();
            walk.leave();
        } else {
            walk.frames.push(Frame {
                successors,
                cursor: 0,
            });
        }
        Ok(())
    }

    fn check_budget(&self) -> Result<()> {
        if let Some(cancel) = &self.cancel {
            if cancel.load(Ordering::Relaxed) {
                return Err(GraphError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(GraphError::BudgetExceeded);
            }
        }
        Ok(())
    }
}

struct Walk<N> {
    /// Successors per node, looked up once per walk
    memo: HashMap<N, Vec<N>>,
    path: Vec<N>,
    on_path: HashSet<N>,
    frames: Vec<Frame<N>>,
    chains: Vec<Chain<N>>,
}

impl<N: Clone + Eq + Hash> Walk<N> {
    fn emit(&mut self) {
        self.chains.push(self.path.clone());
    }

    fn leave(&mut self) {
        if let Some(node) = self.path.pop() {
            self.on_path.remove(&node);
        }
    }
}

/// Chains merged on their common prefixes.
///
/// Duplicate chains collapse, and a dashboard can render the result as a
/// tree rooted at the queried function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTree<N> {
    pub content: N,
    pub children: Vec<ChainTree<N>>,
}

impl<N: Clone + PartialEq> ChainTree<N> {
    pub fn new(content: N) -> Self {
        Self {
            content,
            children: Vec::new(),
        }
    }

    /// Merge chains into trees, one tree per distinct first node
    pub fn from_chains<'c>(chains: impl IntoIterator<Item = &'c Chain<N>>) -> Vec<Self>
    where
        N: 'c,
    {
        let mut roots: Vec<Self> = Vec::new();
        for chain in chains {
            let Some((head, rest)) = chain.split_first() else {
                continue;
            };
            match roots.iter_mut().find(|root| &root.content == head) {
                Some(root) => root.add_chain(rest),
                None => {
                    let mut root = Self::new(head.clone());
                    root.add_chain(rest);
                    roots.push(root);
                }
            }
        }
        roots
    }

    /// Insert a chain below this node, reusing existing children
    pub fn add_chain(&mut self, chain: &[N]) {
        let mut current = self;
        for part in chain {
            let pos = match current.children.iter().position(|c| &c.content == part) {
                Some(pos) => pos,
                None => {
                    current.children.push(Self::new(part.clone()));
                    current.children.len() - 1
                }
            };
            current = &mut current.children[pos];
        }
    }

    /// Number of distinct chains stored in the tree
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(Self::leaf_count).sum()
        }
    }

    /// Longest chain length in nodes
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Adjacency list keyed by name, `Calls` direction only
    struct Edges(Vec<(&'static str, &'static str)>);

    impl SuccessorLookup for Edges {
        type Node = &'static str;

        fn successors(&self, node: &&'static str, relation: Relation) -> anyhow::Result<Vec<&'static str>> {
            Ok(self
                .0
                .iter()
                .filter_map(|&(from, to)| match relation {
                    Relation::Calls if from == *node => Some(to),
                    Relation::ReverseCalls if to == *node => Some(from),
                    _ => None,
                })
                .collect())
        }
    }

    fn diamond() -> Edges {
        Edges(vec![("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")])
    }

    #[test]
    fn test_diamond_reverse_chains() {
        let edges = diamond();
        let chains = ChainWalker::reverse(&edges).chains(&"d").unwrap();
        assert_eq!(chains, vec![vec!["d", "b", "a"], vec!["d", "c", "a"]]);
    }

    #[test]
    fn test_forward_chains() {
        let edges = diamond();
        let chains = ChainWalker::forward(&edges).chains(&"a").unwrap();
        assert_eq!(chains, vec![vec!["a", "b", "d"], vec!["a", "c", "d"]]);
    }

    #[test]
    fn test_isolated_start_is_single_chain() {
        let edges = diamond();
        let chains = ChainWalker::reverse(&edges).chains(&"a").unwrap();
        assert_eq!(chains, vec![vec!["a"]]);
    }

    #[test]
    fn test_cycle_terminates_without_repeats() {
        let edges = Edges(vec![("a", "b"), ("b", "c"), ("c", "a"), ("c", "c"), ("b", "d")]);
        let chains = ChainWalker::forward(&edges).chains(&"a").unwrap();
        assert_eq!(chains, vec![vec!["a", "b", "d"]]);
        for chain in &chains {
            let unique: HashSet<_> = chain.iter().collect();
            assert_eq!(unique.len(), chain.len());
        }
    }

    #[test]
    fn test_loop_only_branches_yield_nothing() {
        let edges = Edges(vec![("a", "b"), ("b", "a")]);
        let chains = ChainWalker::forward(&edges).chains(&"a").unwrap();
        assert!(chains.is_empty());

        let edges = Edges(vec![("a", "b"), ("b", "a"), ("a", "c")]);
        let chains = ChainWalker::forward(&edges).chains(&"a").unwrap();
        assert_eq!(chains, vec![vec!["a", "c"]]);
    }

    #[test]
    fn test_depth_bound_truncates() {
        let edges = Edges(vec![("a", "b"), ("b", "c"), ("c", "d")]);
        let chains = ChainWalker::forward(&edges)
            .with_max_depth(2)
            .chains(&"a")
            .unwrap();
        assert_eq!(chains, vec![vec!["a", "b", "c"]]);

        let chains = ChainWalker::forward(&edges)
            .with_max_depth(0)
            .chains(&"a")
            .unwrap();
        assert_eq!(chains, vec![vec!["a"]]);
    }

    struct Failing;

    impl SuccessorLookup for Failing {
        type Node = String;

        fn successors(&self, node: &String, _relation: Relation) -> anyhow::Result<Vec<String>> {
            if node == "root" {
                Ok(vec!["broken".to_string()])
            } else {
                Err(anyhow::anyhow!("store unavailable"))
            }
        }
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let err = ChainWalker::reverse(&Failing)
            .chains(&"root".to_string())
            .unwrap_err();
        match err {
            GraphError::LookupFailed { node, source } => {
                assert_eq!(node, "broken");
                assert_eq!(source.to_string(), "store unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_expired_deadline_and_cancel() {
        let edges = diamond();
        let expired = ChainWalker::reverse(&edges)
            .with_deadline(Instant::now())
            .chains(&"d");
        assert!(matches!(expired, Err(GraphError::BudgetExceeded)));

        let flag = Arc::new(AtomicBool::new(true));
        let cancelled = ChainWalker::reverse(&edges)
            .with_cancel_flag(flag)
            .chains(&"d");
        assert!(matches!(cancelled, Err(GraphError::Cancelled)));
    }

    #[test]
    fn test_chain_tree_merges_prefixes() {
        let chains = vec![
            vec!["d", "b", "a"],
            vec!["d", "c", "a"],
            vec!["d", "b", "a"],
            vec!["d", "b", "e"],
        ];
        let trees = ChainTree::from_chains(&chains);
        assert_eq!(trees.len(), 1);

        let root = &trees[0];
        assert_eq!(root.content, "d");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.leaf_count(), 3);
        assert_eq!(root.depth(), 3);
        assert_eq!(
            root.children[0]
                .children
                .iter()
                .map(|c| c.content)
                .collect::<Vec<_>>(),
            vec!["a", "e"]
        );
    }
}
