//! Folded graph - identities linked by shared object usage
//!
//! A disposable snapshot rebuilt on every fold. Vertices are held in
//! identity order and addressed by dense index; there is at most one edge
//! per unordered identity pair.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use affinity_core::Identity;

/// Lookup handle for an identity in the most recent fold
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FoldedVertex {
    pub identity: Identity,
    /// Dense index into the folded graph that produced this handle
    pub index: usize,
}

/// Undirected weighted edge between two folded vertices, `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldedEdge {
    pub a: usize,
    pub b: usize,
    pub weight: u64,
}

/// Unipartite identity graph without parallel edges
#[derive(Debug, Clone, Default)]
pub struct FoldedGraph {
    vertices: Vec<Identity>,
    index: HashMap<Identity, usize>,
    edges: Vec<FoldedEdge>,
    /// Per vertex: (neighbor, weight)
    adjacency: Vec<Vec<(usize, u64)>>,
    total_weight: u64,
}

impl FoldedGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Sum of all edge weights
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices in identity order
    pub fn identities(&self) -> &[Identity] {
        &self.vertices
    }

    pub fn identity(&self, index: usize) -> Option<&Identity> {
        self.vertices.get(index)
    }

    pub fn index_of(&self, identity: &Identity) -> Option<usize> {
        self.index.get(identity).copied()
    }

    /// Neighbors of `index` with the connecting edge weight
    pub fn neighbors(&self, index: usize) -> &[(usize, u64)] {
        self.adjacency.get(index).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors(index).len()
    }

    /// Sum of weights of edges incident to `index`
    pub fn weighted_degree(&self, index: usize) -> u64 {
        self.neighbors(index).iter().map(|(_, w)| *w).sum()
    }

    pub fn edges(&self) -> &[FoldedEdge] {
        &self.edges
    }

    /// Weight of the edge between two identities, if any
    pub fn edge_weight(&self, a: &Identity, b: &Identity) -> Option<u64> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        self.neighbors(ia)
            .iter()
            .find(|(n, _)| *n == ib)
            .map(|(_, w)| *w)
    }

    /// Handle for `identity` in this graph
    pub fn vertex(&self, identity: &Identity) -> Option<FoldedVertex> {
        self.index_of(identity).map(|index| FoldedVertex {
            identity: identity.clone(),
            index,
        })
    }
}

/// Builder for folded graphs
///
/// Parallel edges are summed and self loops dropped, so whatever is added
/// the result has one edge per identity pair.
#[derive(Debug, Clone, Default)]
pub struct FoldedGraphBuilder {
    vertices: BTreeSet<Identity>,
    edges: BTreeMap<(Identity, Identity), u64>,
}

impl FoldedGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex (idempotent)
    pub fn add_vertex(&mut self, identity: Identity) -> &mut Self {
        self.vertices.insert(identity);
        self
    }

    /// Add `weight` to the edge between `a` and `b`, creating both
    /// vertices as needed
    pub fn add_edge(&mut self, a: &Identity, b: &Identity, weight: u64) -> &mut Self {
        if a == b || weight == 0 {
            return self;
        }
        self.vertices.insert(a.clone());
        self.vertices.insert(b.clone());
        let key = if a < b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        *self.edges.entry(key).or_insert(0) += weight;
        self
    }

    pub fn build(self) -> FoldedGraph {
        let vertices: Vec<Identity> = self.vertices.into_iter().collect();
        let index: HashMap<Identity, usize> = vertices
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut adjacency = vec![Vec::new(); vertices.len()];
        let mut edges = Vec::with_capacity(self.edges.len());
        let mut total_weight = 0;
        for ((a, b), weight) in self.edges {
            // Both endpoints were inserted alongside the edge
            let (Some(&ia), Some(&ib)) = (index.get(&a), index.get(&b)) else {
                continue;
            };
            adjacency[ia].push((ib, weight));
            adjacency[ib].push((ia, weight));
            edges.push(FoldedEdge {
                a: ia.min(ib),
                b: ia.max(ib),
                weight,
            });
            total_weight += weight;
        }

        FoldedGraph {
            vertices,
            index,
            edges,
            adjacency,
            total_weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> Identity {
        Identity::new(name)
    }

    #[test]
    fn test_parallel_edges_collapse() {
        let mut builder = FoldedGraphBuilder::new();
        builder
            .add_edge(&id("a"), &id("b"), 3)
            .add_edge(&id("b"), &id("a"), 2)
            .add_edge(&id("a"), &id("a"), 9);
        let graph = builder.build();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight(&id("a"), &id("b")), Some(5));
        assert_eq!(graph.edge_weight(&id("b"), &id("a")), Some(5));
        assert_eq!(graph.total_weight(), 5);
    }

    #[test]
    fn test_vertices_sorted_and_isolated_kept() {
        let mut builder = FoldedGraphBuilder::new();
        builder.add_vertex(id("z")).add_edge(&id("m"), &id("c"), 1);
        let graph = builder.build();

        let names: Vec<_> = graph.identities().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["c", "m", "z"]);
        let z = graph.index_of(&id("z")).unwrap();
        assert_eq!(graph.degree(z), 0);
        assert_eq!(graph.weighted_degree(z), 0);
    }

    #[test]
    fn test_vertex_handle() {
        let mut builder = FoldedGraphBuilder::new();
        builder.add_vertex(id("a"));
        let graph = builder.build();

        assert_eq!(graph.vertex(&id("a")).map(|v| v.index), Some(0));
        assert!(graph.vertex(&id("b")).is_none());
    }
}
