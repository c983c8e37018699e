use crate::assembler::FunctionContextSlim;
use crate::chain::{ChainTree, ChainWalker, SuccessorLookup};
use crate::error::{GraphError, Result};
use crate::types::Relation;
use refgraph_entity::Signature;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slim contexts of one revision keyed by signature.
///
/// This is the shape persistence workers store, and it answers chain walks
/// without the graph being resident.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlimContextIndex {
    contexts: HashMap<Signature, FunctionContextSlim>,
}

/// Slim context plus its reverse call chains, merged into trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionContextChains {
    #[serde(flatten)]
    pub context: FunctionContextSlim,
    pub reverse_call_chains: Vec<ChainTree<Signature>>,
}

impl SlimContextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a context. Functions sharing a signature are one logical
    /// function, so their neighbor lists are merged.
    pub fn insert(&mut self, ctx: FunctionContextSlim) {
        let signature = ctx.function.signature();
        match self.contexts.get_mut(&signature) {
            Some(existing) => {
                log::debug!("Merging contexts sharing signature {signature}");
                merge_unique(&mut existing.calls, ctx.calls);
                merge_unique(&mut existing.reverse_calls, ctx.reverse_calls);
            }
            None => {
                self.contexts.insert(signature, ctx);
            }
        }
    }

    #[must_use]
    pub fn get(&self, signature: &Signature) -> Option<&FunctionContextSlim> {
        self.contexts.get(signature)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.contexts.keys()
    }

    /// Stored context of `signature` with its reverse call chains cut at
    /// `depth` hops
    pub fn reverse_call_chains(
        &self,
        signature: &Signature,
        depth: usize,
    ) -> Result<FunctionContextChains> {
        let context = self
            .get(signature)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(signature.to_string()))?;
        let chains = ChainWalker::reverse(self)
            .with_max_depth(depth)
            .chains(signature)?;
        Ok(FunctionContextChains {
            context,
            reverse_call_chains: ChainTree::from_chains(&chains),
        })
    }
}

impl FromIterator<FunctionContextSlim> for SlimContextIndex {
    fn from_iter<T: IntoIterator<Item = FunctionContextSlim>>(iter: T) -> Self {
        let mut index = Self::new();
        for ctx in iter {
            index.insert(ctx);
        }
        index
    }
}

impl SuccessorLookup for SlimContextIndex {
    type Node = Signature;

    fn successors(&self, node: &Signature, relation: Relation) -> anyhow::Result<Vec<Signature>> {
        let ctx = self
            .contexts
            .get(node)
            .ok_or_else(|| anyhow::anyhow!("no function context stored for {node}"))?;
        Ok(match relation {
            Relation::Calls => ctx.calls.clone(),
            Relation::ReverseCalls => ctx.reverse_calls.clone(),
        })
    }
}

fn merge_unique(into: &mut Vec<Signature>, from: Vec<Signature>) {
    for sig in from {
        if !into.contains(&sig) {
            into.push(sig);
        }
    }
}
