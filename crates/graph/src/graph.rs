use crate::types::{Adjacency, FuncGraph, FuncGraphType, Relation};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use refgraph_entity::{Descriptor, FunctionWithPath, IndexName, Signature};
use std::sync::Arc;

impl FuncGraph {
    /// Direct callees: functions referenced from inside `f`
    #[must_use]
    pub fn find_calls(&self, f: &FunctionWithPath) -> Vec<FunctionWithPath> {
        self.find_neighbors(&f.descriptor(), Relation::Calls)
    }

    /// Direct callers: functions referencing `f`
    #[must_use]
    pub fn find_reverse_calls(&self, f: &FunctionWithPath) -> Vec<FunctionWithPath> {
        self.find_neighbors(&f.descriptor(), Relation::ReverseCalls)
    }

    /// One-hop neighbors of a vertex. Unknown descriptors have none.
    #[must_use]
    pub fn find_neighbors(&self, desc: &Descriptor, relation: Relation) -> Vec<FunctionWithPath> {
        self.neighbor_vertices(desc, relation)
            .into_iter()
            .map(|f| FunctionWithPath::clone(f))
            .collect()
    }

    pub(crate) fn neighbor_vertices(
        &self,
        desc: &Descriptor,
        relation: Relation,
    ) -> Vec<&Arc<FunctionWithPath>> {
        let Some(&idx) = self.vertex_index.get(desc) else {
            return Vec::new();
        };
        self.adjacency()
            .neighbors(idx, relation)
            .iter()
            .filter_map(|&n| self.call_graph.node_weight(n))
            .collect()
    }

    /// Vertex registered under this descriptor
    #[must_use]
    pub fn function(&self, desc: &Descriptor) -> Option<&FunctionWithPath> {
        let idx = self.vertex_index.get(desc)?;
        self.call_graph.node_weight(*idx).map(|f| &**f)
    }

    #[must_use]
    pub fn contains(&self, f: &FunctionWithPath) -> bool {
        self.vertex_index.contains_key(&f.descriptor())
    }

    /// All functions, in extraction order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionWithPath> {
        self.call_graph.node_weights().map(|f| &**f)
    }

    /// Functions sharing a signature; more than one when files repeat a
    /// declaration
    #[must_use]
    pub fn find_by_signature(&self, signature: &Signature) -> Vec<&FunctionWithPath> {
        self.functions()
            .filter(|f| &f.signature() == signature)
            .collect()
    }

    /// Functions a symbol with this text would be correlated with
    #[must_use]
    pub fn find_by_index_name(&self, name: &IndexName) -> Vec<&FunctionWithPath> {
        self.functions()
            .filter(|f| &f.index_name() == name)
            .collect()
    }

    /// Functions in `path` whose declaration touches any of the line indexes.
    /// Maps the changed lines of a diff to the affected functions.
    #[must_use]
    pub fn find_by_lines(&self, path: &str, lines: &[u32]) -> Vec<&FunctionWithPath> {
        self.functions()
            .filter(|f| f.path == path && f.span.contains_any_line(lines))
            .collect()
    }

    /// Neighbor index, built on first use.
    ///
    /// `OnceCell` blocks concurrent first callers until the single
    /// computation finishes.
    pub(crate) fn adjacency(&self) -> &Adjacency {
        self.adjacency.get_or_init(|| {
            #[cfg(test)]
            self.adjacency_builds
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.compute_adjacency()
        })
    }

    fn compute_adjacency(&self) -> Adjacency {
        let count = self.call_graph.node_count();
        let mut adjacency = Adjacency {
            calls: Vec::with_capacity(count),
            reverse_calls: Vec::with_capacity(count),
        };

        for idx in self.call_graph.node_indices() {
            adjacency
                .calls
                .push(sorted_neighbors(&self.call_graph, idx));
            if self.reverse_call_graph.node_weight(idx).is_none() {
                log::warn!(
                    "Vertex {} missing from reverse call graph, skipping its callers",
                    idx.index()
                );
                adjacency.reverse_calls.push(Vec::new());
                continue;
            }
            adjacency
                .reverse_calls
                .push(sorted_neighbors(&self.reverse_call_graph, idx));
        }

        log::debug!(
            "Computed neighbor index for {} vertices, {} edges",
            count,
            self.call_graph.edge_count()
        );
        adjacency
    }
}

/// Outgoing neighbors in vertex order, vertices without weight skipped
fn sorted_neighbors(graph: &FuncGraphType, idx: NodeIndex) -> Vec<NodeIndex> {
    let mut neighbors: Vec<NodeIndex> = graph
        .neighbors_directed(idx, Direction::Outgoing)
        .filter(|&n| {
            let present = graph.node_weight(n).is_some();
            if !present {
                log::warn!("Edge {} -> {} points at a missing vertex", idx.index(), n.index());
            }
            present
        })
        .collect();
    neighbors.sort_unstable();
    neighbors.dedup();
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;
    use refgraph_entity::{Function, FunctionFile, Language, Point, Span, Symbol, SymbolFile};
    use std::sync::atomic::Ordering;

    fn func(name: &str, start: u32, end: u32) -> Function {
        Function::new(
            name,
            Span::new(Point::new(start, 0), Point::new(end, 1)),
            Span::new(Point::new(start, 10), Point::new(end, 1)),
        )
    }

    fn sym(name: &str, row: u32) -> Symbol {
        Symbol::new(
            name,
            "identifier",
            Span::new(Point::new(row, 4), Point::new(row, 8)),
        )
    }

    /// main -> {alpha, beta}, alpha -> beta
    fn sample() -> FuncGraph {
        let functions = vec![FunctionFile::new(
            "m.go",
            Language::Golang,
            vec![func("main", 0, 5), func("alpha", 7, 9), func("beta", 11, 13)],
        )];
        let symbols = vec![SymbolFile::new(
            "m.go",
            Language::Golang,
            vec![sym("beta", 2), sym("alpha", 3), sym("beta", 8)],
        )];
        FuncGraph::build(&functions, &symbols)
    }

    fn by_name<'a>(graph: &'a FuncGraph, name: &str) -> &'a FunctionWithPath {
        graph.find_by_index_name(&IndexName::new(name))[0]
    }

    fn names(fs: &[FunctionWithPath]) -> Vec<&str> {
        fs.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_neighbors_in_extraction_order() {
        let graph = sample();
        let main = by_name(&graph, "main").clone();
        let beta = by_name(&graph, "beta").clone();

        assert_eq!(names(&graph.find_calls(&main)), vec!["alpha", "beta"]);
        assert_eq!(names(&graph.find_reverse_calls(&beta)), vec!["main", "alpha"]);
    }

    #[test]
    fn test_adjacency_is_lazy_and_built_once() {
        let graph = sample();
        assert!(!graph.stats().adjacency_ready);

        let main = by_name(&graph, "main").clone();
        let first = graph.find_calls(&main);
        let second = graph.find_calls(&main);
        assert_eq!(first, second);
        assert!(graph.stats().adjacency_ready);
        assert_eq!(graph.adjacency_builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let graph = sample();
        let main = by_name(&graph, "main").clone();

        let results: Vec<Vec<FunctionWithPath>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| graph.find_calls(&main)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(graph.adjacency_builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lookup_helpers() {
        let graph = sample();
        assert_eq!(graph.functions().count(), 3);

        let alpha = by_name(&graph, "alpha");
        assert_eq!(graph.function(&alpha.descriptor()), Some(alpha));
        assert_eq!(graph.find_by_signature(&alpha.signature()).len(), 1);

        let touched = graph.find_by_lines("m.go", &[4, 12]);
        let touched: Vec<&str> = touched.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(touched, vec!["main", "beta"]);
        assert!(graph.find_by_lines("other.go", &[4]).is_empty());
    }

    #[test]
    fn test_unknown_function_has_no_neighbors() {
        let graph = sample();
        let stranger = FunctionWithPath::new(func("main", 0, 5), "elsewhere.go");
        assert!(!graph.contains(&stranger));
        assert!(graph.find_calls(&stranger).is_empty());
        assert!(graph.find_reverse_calls(&stranger).is_empty());
    }
}
