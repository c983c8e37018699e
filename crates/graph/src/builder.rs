use crate::config::GraphConfig;
use crate::error::Result;
use crate::types::FuncGraph;
use petgraph::graph::NodeIndex;
use refgraph_entity::{Function, FunctionFile, FunctionWithPath, IndexName, Symbol, SymbolFile};
use std::collections::HashMap;

/// Build a reference graph from one revision's extraction output.
///
/// Every symbol is attributed to the innermost function enclosing it; a
/// function `F` is then referenced by every function owning a symbol whose
/// text equals `F`'s name. Matching is by name only, so same-named
/// functions on different receivers share their references.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    config: GraphConfig,
}

/// Functions of one file with their vertices, in file order
type FileVertices<'a> = Vec<(&'a Function, NodeIndex)>;

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Build graph from function and symbol files of the same revision
    pub fn build(&self, function_files: &[FunctionFile], symbol_files: &[SymbolFile]) -> FuncGraph {
        let mut graph = FuncGraph::new();

        // Phase 1: vertices, grouped by path for enclosing lookups
        let mut by_path: HashMap<&str, FileVertices<'_>> =
            HashMap::with_capacity(function_files.len());
        let mut order: Vec<(&Function, NodeIndex)> = Vec::new();
        for file in function_files {
            log::debug!("file {}, functions: {}", file.path, file.units.len());
            let vertices = by_path.entry(file.path.as_str()).or_default();
            for function in &file.units {
                let idx = graph.add_vertex(FunctionWithPath::new(function.clone(), &file.path));
                vertices.push((function, idx));
                order.push((function, idx));
            }
        }

        // Phase 2: attribute symbols to their enclosing function
        let mut references: HashMap<IndexName, Vec<NodeIndex>> = HashMap::new();
        let mut headless = 0usize;
        for file in symbol_files {
            let Some(vertices) = by_path.get(file.path.as_str()) else {
                // this file only contains symbols
                headless += file.units.len();
                continue;
            };
            for symbol in &file.units {
                match enclosing_function(vertices, symbol) {
                    Some(owner) => references
                        .entry(symbol.index_name())
                        .or_default()
                        .push(owner),
                    None => {
                        log::trace!(
                            "Headless symbol {} at {}:{}",
                            symbol.symbol,
                            file.path,
                            symbol.line()
                        );
                        headless += 1;
                    }
                }
            }
        }
        log::debug!(
            "Attributed symbols to {} names, skipped {headless} headless symbols",
            references.len()
        );

        // Phase 3: edges
        let mut over_limit = 0usize;
        for (function, callee) in order {
            let name = function.index_name();
            if name.len() < self.config.min_index_name_len {
                continue;
            }
            let Some(owners) = references.get(&name) else {
                continue;
            };
            if let Some(limit) = self.config.max_references_per_function {
                if owners.len() > limit {
                    over_limit += 1;
                    continue;
                }
            }
            for &caller in owners {
                if caller != callee {
                    graph.add_reference(caller, callee);
                }
            }
        }
        if over_limit > 0 {
            log::debug!("{over_limit} functions exceeded the reference limit and were left unconnected");
        }

        log::info!(
            "Built function graph: {} vertices, {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );

        graph
    }
}

impl FuncGraph {
    /// Build with the default configuration
    pub fn build(function_files: &[FunctionFile], symbol_files: &[SymbolFile]) -> Self {
        GraphBuilder::default().build(function_files, symbol_files)
    }
}

/// Innermost function whose scope encloses the symbol.
/// Nested scopes start later, ties go to the narrower one.
fn enclosing_function(vertices: &FileVertices<'_>, symbol: &Symbol) -> Option<NodeIndex> {
    vertices
        .iter()
        .filter(|(function, _)| function.scope_span().encloses(&symbol.span))
        .max_by(|(a, _), (b, _)| {
            let (a, b) = (a.scope_span(), b.scope_span());
            a.start.cmp(&b.start).then(b.end.cmp(&a.end))
        })
        .map(|&(_, idx)| idx)
}
