//! Candidate solutions for the evolutionary search.
//!
//! A chromosome carries a deletion set `S` (indexed over edges for Cluster
//! Deletion, over vertices for Cluster Vertex Deletion), the vertex subset
//! `V` of the induced subgraph it covers, and a cached enumeration of `V`.
//! The cache must be refreshed whenever `V` changes; `V` only changes at
//! seeding and at merge, both of which do so here.

use crate::bits::PackedSet;
use rand::Rng;

/// A candidate solution: deletion set, vertex subset, cached vertex list.
#[derive(Clone, Debug)]
pub struct Chromosome {
    /// Deletion set over edges (CD) or vertices (CVD).
    pub deletions: PackedSet,
    /// Vertex subset of the induced subgraph covered so far.
    pub vertices: PackedSet,
    vertex_cache: Vec<usize>,
}

impl Chromosome {
    /// Creates an empty chromosome with a deletion set of `solution_len` bits
    /// over a graph with `n` vertices.
    pub fn new(solution_len: usize, n: usize) -> Self {
        Self {
            deletions: PackedSet::new(solution_len),
            vertices: PackedSet::new(n),
            vertex_cache: Vec::with_capacity(n),
        }
    }

    /// Seeds the chromosome to cover the single vertex `v` with a randomized
    /// deletion set.
    pub fn seed<R: Rng>(&mut self, v: usize, rng: &mut R) {
        self.vertices.zero();
        self.vertices.insert(v);
        self.vertex_cache.clear();
        self.vertex_cache.push(v);
        self.deletions.randomize(rng);
    }

    /// Copies `src` into `self`, refreshing the vertex cache.
    pub fn copy_from(&mut self, src: &Chromosome) {
        self.deletions.copy_from(&src.deletions);
        self.vertices.copy_from(&src.vertices);
        self.vertex_cache.clear();
        self.vertex_cache.extend_from_slice(&src.vertex_cache);
    }

    /// Sets this chromosome's vertex subset to the union of the parents'
    /// vertex subsets and refreshes the cache. The deletion set is cleared:
    /// the merged candidate starts from the fresh induced subgraph.
    pub fn merge_vertices(&mut self, p1: &Chromosome, p2: &Chromosome) {
        self.vertices.copy_from(&p1.vertices);
        self.vertices.union_with(&p2.vertices);
        self.deletions.zero();
        self.refresh_cache();
    }

    /// The members of the vertex subset, in increasing order.
    #[inline(always)]
    pub fn vertex_list(&self) -> &[usize] {
        &self.vertex_cache
    }

    /// Number of elements in the deletion set.
    #[inline(always)]
    pub fn deletion_count(&self) -> usize {
        self.deletions.len()
    }

    fn refresh_cache(&mut self) {
        self.vertices.members(&mut self.vertex_cache);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn seed_produces_singleton_cover() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        let mut c = Chromosome::new(12, 8);
        c.seed(5, &mut rng);
        assert_eq!(c.vertex_list(), &[5]);
        assert_eq!(c.vertices.len(), 1);
    }

    #[test]
    fn merge_unions_vertices_and_clears_deletions() {
        let mut rng = XorShiftRng::seed_from_u64(8);
        let mut a = Chromosome::new(12, 8);
        let mut b = Chromosome::new(12, 8);
        a.seed(1, &mut rng);
        b.seed(6, &mut rng);

        let mut child = Chromosome::new(12, 8);
        child.deletions.insert(3); // stale scratch from a previous generation
        child.merge_vertices(&a, &b);
        assert_eq!(child.vertex_list(), &[1, 6]);
        assert!(child.deletions.is_empty());
    }

    #[test]
    fn copy_refreshes_cache() {
        let mut rng = XorShiftRng::seed_from_u64(9);
        let mut a = Chromosome::new(4, 4);
        a.seed(2, &mut rng);
        let mut b = Chromosome::new(4, 4);
        b.copy_from(&a);
        assert_eq!(b.vertex_list(), &[2]);
        assert_eq!(b.deletions, a.deletions);
    }
}
