//! Cluster Vertex Deletion: feasibility oracle, repair operator and template
//! builder.
//!
//! The deletion set is indexed over vertices. Repair is the expensive
//! operator here: it partitions the protected vertices into clusters,
//! classifies every unprotected vertex against them, groups the undecided
//! vertices into merge components and assigns each component a cluster (or
//! none) by solving a min-cost assignment.

use crate::assign::{AssignmentSolver, CostMatrix, FlowAssignment};
use crate::bits::PackedSet;
use crate::chromosome::Chromosome;
use crate::graph::GraphIndex;

/// Engine for the Cluster Vertex Deletion variant.
///
/// Generic over the assignment solver so the min-cost-flow implementation
/// can be swapped out; the default is exact. All scratch storage is sized at
/// construction and reused across repair calls.
#[derive(Clone, Debug)]
pub struct CvdEngine<'g, S: AssignmentSolver = FlowAssignment> {
    graph: &'g GraphIndex,
    solver: S,
    protected: PackedSet,
    marked: PackedSet,
    remaining: PackedSet,
    /// A-cluster label per vertex; 0 = not protected.
    cluster_of: Vec<u32>,
    /// Size of each A-cluster, indexed by label (entry 0 unused).
    cluster_sizes: Vec<usize>,
    /// Target class per undecided vertex; 0 = join nothing.
    merge_class: Vec<u32>,
    /// B-cluster label per vertex; 0 = not undecided.
    b_cluster_of: Vec<u32>,
    /// Per-A-cluster neighbor counts for the vertex under classification.
    neighbor_hits: Vec<u32>,
    touched: Vec<u32>,
    undecided: Vec<usize>,
    queue: Vec<usize>,
}

impl<'g> CvdEngine<'g> {
    /// Creates an engine with the default exact assignment solver.
    pub fn new(graph: &'g GraphIndex) -> Self {
        Self::with_solver(graph, FlowAssignment::new())
    }
}

impl<'g, S: AssignmentSolver> CvdEngine<'g, S> {
    /// Creates an engine around a caller-supplied assignment solver.
    pub fn with_solver(graph: &'g GraphIndex, solver: S) -> Self {
        let n = graph.n();
        Self {
            graph,
            solver,
            protected: PackedSet::new(n),
            marked: PackedSet::new(n),
            remaining: PackedSet::new(n),
            cluster_of: vec![0; n],
            cluster_sizes: Vec::with_capacity(n + 1),
            merge_class: vec![0; n],
            b_cluster_of: vec![0; n],
            neighbor_hits: vec![0; n + 1],
            touched: Vec::with_capacity(n),
            undecided: Vec::with_capacity(n),
            queue: Vec::with_capacity(n),
        }
    }

    /// Deletion sets for this variant are indexed over vertices.
    pub fn solution_len(&self) -> usize {
        self.graph.n()
    }

    /// Returns whether `kept` induces a cluster graph inside the candidate's
    /// vertex subset: no vertex of `kept` centers an obstruction pair whose
    /// ends are also kept and covered.
    fn is_cluster_graph(&self, cand: &Chromosome, kept: &PackedSet) -> bool {
        for &v in cand.vertex_list() {
            if !kept.contains(v) {
                continue;
            }
            for &(u, w) in self.graph.vertex_obstructions(v) {
                let (u, w) = (u as usize, w as usize);
                if kept.contains(u)
                    && kept.contains(w)
                    && cand.vertices.contains(u)
                    && cand.vertices.contains(w)
                {
                    return false;
                }
            }
        }
        true
    }

    /// Returns whether the candidate deletes at most `k` covered vertices and
    /// the remaining covered vertices induce a cluster graph.
    pub fn is_feasible(&mut self, cand: &Chromosome) -> bool {
        if cand.deletions.intersection_len(&cand.vertices) > self.graph.k() {
            return false;
        }
        self.remaining.copy_from(&cand.vertices);
        self.remaining.subtract(&cand.deletions);
        self.is_cluster_graph(cand, &self.remaining)
    }

    /// Repairs the candidate so that, outside the protected set, the covered
    /// subgraph becomes a cluster graph.
    ///
    /// Returns `false` without touching the candidate when the protected
    /// vertices already induce a forbidden path (no deletion outside them can
    /// fix that) or when the assignment solver fails. On success the computed
    /// deletions are unioned into the candidate's deletion set; the caller
    /// still re-checks the budget via [`CvdEngine::is_feasible`].
    pub fn repair(
        &mut self,
        cand: &mut Chromosome,
        p1: &PackedSet,
        p2: &PackedSet,
        template: &PackedSet,
    ) -> bool {
        self.protected.copy_from(p1);
        self.protected.union_with(p2);
        self.protected.union_with(template);
        self.protected.subtract(&cand.deletions);
        self.protected.intersect_with(&cand.vertices);

        if !self.is_cluster_graph(cand, &self.protected) {
            return false;
        }

        let num_clusters = self.label_protected_clusters(cand);
        self.classify_unprotected(cand);
        let num_groups = self.label_merge_groups(cand);

        if num_clusters > 0 && num_groups > 0 {
            let costs = self.group_costs(num_groups, num_clusters);
            let assignment = match self.solver.assign(&costs) {
                Ok(a) => a,
                Err(_) => return false,
            };
            for &u in &self.undecided {
                let group = self.b_cluster_of[u] as usize;
                if self.merge_class[u] as usize != assignment[group - 1] {
                    self.marked.insert(u);
                }
            }
        }

        cand.deletions.union_with(&self.marked);
        true
    }

    /// Labels the connected components of the protected vertices (within the
    /// covered subgraph) 1..=l and records their sizes. Returns l.
    fn label_protected_clusters(&mut self, cand: &Chromosome) -> usize {
        self.cluster_of.fill(0);
        self.cluster_sizes.clear();
        self.cluster_sizes.push(0); // label 0 unused
        let mut label = 0u32;

        for &v in cand.vertex_list() {
            if !self.protected.contains(v) || self.cluster_of[v] != 0 {
                continue;
            }
            label += 1;
            let mut size = 0usize;
            self.queue.clear();
            self.queue.push(v);
            self.cluster_of[v] = label;
            while let Some(x) = self.queue.pop() {
                size += 1;
                for &w in self.graph.neighbors(x) {
                    let w = w as usize;
                    if self.protected.contains(w)
                        && cand.vertices.contains(w)
                        && self.cluster_of[w] == 0
                    {
                        self.cluster_of[w] = label;
                        self.queue.push(w);
                    }
                }
            }
            self.cluster_sizes.push(size);
        }
        label as usize
    }

    /// Classifies every covered unprotected vertex: no protected neighbors
    /// means class 0; full adjacency to exactly one protected cluster means
    /// that cluster's class; anything else conflicts and is deleted outright.
    /// Undecided (non-deleted) vertices are collected for grouping.
    fn classify_unprotected(&mut self, cand: &Chromosome) {
        self.marked.zero();
        self.undecided.clear();

        for &u in cand.vertex_list() {
            if self.protected.contains(u) {
                continue;
            }
            self.touched.clear();
            for &w in self.graph.neighbors(u) {
                let w = w as usize;
                if !cand.vertices.contains(w) {
                    continue;
                }
                let c = self.cluster_of[w];
                if c != 0 {
                    if self.neighbor_hits[c as usize] == 0 {
                        self.touched.push(c);
                    }
                    self.neighbor_hits[c as usize] += 1;
                }
            }

            let decision = match self.touched.as_slice() {
                [] => Some(0),
                &[c] if self.neighbor_hits[c as usize] as usize
                    == self.cluster_sizes[c as usize] =>
                {
                    Some(c)
                }
                // Partial adjacency or more than one cluster touched: the
                // vertex would leave a path through some protected cluster.
                _ => None,
            };

            for &c in &self.touched {
                self.neighbor_hits[c as usize] = 0;
            }

            match decision {
                Some(c) => {
                    self.merge_class[u] = c;
                    self.undecided.push(u);
                }
                None => self.marked.insert(u),
            }
        }
    }

    /// Labels the connected components of the undecided vertices 1..=mb.
    /// Returns mb. Each component must merge as a unit: keeping two adjacent
    /// undecided vertices in different final clusters leaves a path.
    fn label_merge_groups(&mut self, cand: &Chromosome) -> usize {
        self.b_cluster_of.fill(0);
        let mut label = 0u32;

        for i in 0..self.undecided.len() {
            let v = self.undecided[i];
            if self.b_cluster_of[v] != 0 {
                continue;
            }
            label += 1;
            self.queue.clear();
            self.queue.push(v);
            self.b_cluster_of[v] = label;
            while let Some(x) = self.queue.pop() {
                for &w in self.graph.neighbors(x) {
                    let w = w as usize;
                    if cand.vertices.contains(w)
                        && !self.protected.contains(w)
                        && !self.marked.contains(w)
                        && self.b_cluster_of[w] == 0
                    {
                        self.b_cluster_of[w] = label;
                        self.queue.push(w);
                    }
                }
            }
        }
        label as usize
    }

    /// Cost of sending group i to class j: the number of group members whose
    /// own classification disagrees with j, each of which must be deleted.
    fn group_costs(&self, num_groups: usize, num_clusters: usize) -> CostMatrix {
        let mut costs = CostMatrix::new(num_groups, num_clusters + 1);
        let mut group_sizes = vec![0u64; num_groups];
        for &u in &self.undecided {
            let group = self.b_cluster_of[u] as usize - 1;
            group_sizes[group] += 1;
            let class = self.merge_class[u] as usize;
            let agree = costs.cost(group, class);
            costs.set(group, class, agree + 1);
        }
        // Convert agreement counts to disagreement costs.
        for i in 0..num_groups {
            for j in 0..num_clusters + 1 {
                costs.set(i, j, group_sizes[i] - costs.cost(i, j));
            }
        }
        costs
    }

    /// Builds a template: one representative covered obstruction triple per
    /// center vertex, skipping anything a parent deletes or the template
    /// already holds.
    pub fn build_template(
        &self,
        template: &mut PackedSet,
        cand: &Chromosome,
        p1: &Chromosome,
        p2: &Chromosome,
    ) {
        template.zero();
        for &v in cand.vertex_list() {
            if p1.deletions.contains(v) || p2.deletions.contains(v) || template.contains(v) {
                continue;
            }
            for &(u, w) in self.graph.vertex_obstructions(v) {
                let (u, w) = (u as usize, w as usize);
                if cand.vertices.contains(u)
                    && cand.vertices.contains(w)
                    && !p1.deletions.contains(u)
                    && !p2.deletions.contains(u)
                    && !template.contains(u)
                    && !p1.deletions.contains(w)
                    && !p2.deletions.contains(w)
                    && !template.contains(w)
                {
                    template.insert(u);
                    template.insert(v);
                    template.insert(w);
                    break;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn cover(n: usize, vertices: &[usize]) -> Chromosome {
        let mut donor = Chromosome::new(n, n);
        for &v in vertices {
            donor.vertices.insert(v);
        }
        let mut c = Chromosome::new(n, n);
        c.merge_vertices(&donor, &donor);
        c
    }

    fn brute_force_feasible(n: usize, edges: &[(u32, u32)], cand: &Chromosome, k: usize) -> bool {
        let alive = |v: usize| cand.vertices.contains(v) && !cand.deletions.contains(v);
        let deleted_in_v = cand.deletions.intersection_len(&cand.vertices);
        if deleted_in_v > k {
            return false;
        }
        let mut adj = vec![vec![false; n]; n];
        for &(u, v) in edges {
            let (u, v) = (u as usize, v as usize);
            if alive(u) && alive(v) {
                adj[u][v] = true;
                adj[v][u] = true;
            }
        }
        for a in 0..n {
            for b in 0..n {
                for c in 0..n {
                    if a != b && b != c && a != c && adj[a][b] && adj[b][c] && !adj[a][c] {
                        return false;
                    }
                }
            }
        }
        true
    }

    #[test]
    fn scenario_b_star_graph() {
        // Star with center 0 and leaves 1..3, k = 1.
        let edges = [(0, 1), (0, 2), (0, 3)];
        let g = GraphIndex::build(4, &edges, 1);
        let mut engine = CvdEngine::new(&g);

        let mut cand = cover(4, &[0, 1, 2, 3]);
        assert!(!engine.is_feasible(&cand), "the star has covered paths");

        cand.deletions.insert(0);
        assert!(engine.is_feasible(&cand), "deleting the center isolates the leaves");

        // Deleting a leaf instead leaves a smaller star, still a path.
        let mut cand = cover(4, &[0, 1, 2, 3]);
        cand.deletions.insert(1);
        assert!(!engine.is_feasible(&cand));
    }

    #[test]
    fn repair_fails_when_protected_set_is_not_cluster_graph() {
        // Path 0-1-2 entirely protected: nothing outside it can help.
        let g = GraphIndex::build(3, &[(0, 1), (1, 2)], 1);
        let mut engine = CvdEngine::new(&g);
        let mut cand = cover(3, &[0, 1, 2]);

        let mut p1 = PackedSet::new(3);
        p1.insert(0);
        p1.insert(1);
        p1.insert(2);
        let empty = PackedSet::new(3);

        assert!(!engine.repair(&mut cand, &p1, &empty, &empty));
        assert!(cand.deletions.is_empty(), "failed repair leaves the candidate alone");
    }

    #[test]
    fn repair_deletes_conflicting_vertex() {
        // Triangle {0,1,2} protected, vertex 3 adjacent to 0 only: partial
        // adjacency to the protected cluster, so 3 must go.
        let g = GraphIndex::build(4, &[(0, 1), (1, 2), (0, 2), (0, 3)], 1);
        let mut engine = CvdEngine::new(&g);
        let mut cand = cover(4, &[0, 1, 2, 3]);

        let mut p1 = PackedSet::new(4);
        p1.insert(0);
        p1.insert(1);
        p1.insert(2);
        let empty = PackedSet::new(4);

        assert!(engine.repair(&mut cand, &p1, &empty, &empty));
        assert!(cand.deletions.contains(3));
        assert_eq!(cand.deletion_count(), 1);
        assert!(engine.is_feasible(&cand));
    }

    #[test]
    fn repair_assigns_merge_group_optimally() {
        // Protected edge {0,1}; vertex 2 fully adjacent to it, vertex 3
        // adjacent only to 2. The group {2,3} cannot keep both: either
        // assignment deletes exactly one vertex.
        let g = GraphIndex::build(4, &[(0, 1), (0, 2), (1, 2), (2, 3)], 1);
        let mut engine = CvdEngine::new(&g);
        let mut cand = cover(4, &[0, 1, 2, 3]);

        let mut p1 = PackedSet::new(4);
        p1.insert(0);
        p1.insert(1);
        let empty = PackedSet::new(4);

        assert!(engine.repair(&mut cand, &p1, &empty, &empty));
        assert_eq!(cand.deletion_count(), 1);
        assert!(engine.is_feasible(&cand));
    }

    #[test]
    fn repair_merges_compatible_group_without_deletions() {
        // Protected edge {0,1}; vertices 2 and 3 both fully adjacent to it
        // and to each other: the whole group joins the cluster for free.
        let g = GraphIndex::build(
            4,
            &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)],
            1,
        );
        let mut engine = CvdEngine::new(&g);
        let mut cand = cover(4, &[0, 1, 2, 3]);

        let mut p1 = PackedSet::new(4);
        p1.insert(0);
        p1.insert(1);
        let empty = PackedSet::new(4);

        assert!(engine.repair(&mut cand, &p1, &empty, &empty));
        assert!(cand.deletions.is_empty());
        assert!(engine.is_feasible(&cand));
    }

    #[test]
    fn oracle_matches_brute_force_on_random_graphs() {
        let mut rng = XorShiftRng::seed_from_u64(0xC7D);
        for _ in 0..200 {
            let n = rng.random_range(3..=10);
            let mut edges = Vec::new();
            for u in 0..n as u32 {
                for v in (u + 1)..n as u32 {
                    if rng.random_bool(0.4) {
                        edges.push((u, v));
                    }
                }
            }
            let k = rng.random_range(0..=n);
            let g = GraphIndex::build(n, &edges, k);
            let mut engine = CvdEngine::new(&g);

            let mut cand = Chromosome::new(n, n);
            let mut donor = Chromosome::new(n, n);
            donor.vertices.randomize(&mut rng);
            if donor.vertices.is_empty() {
                donor.vertices.insert(0);
            }
            cand.merge_vertices(&donor, &donor);
            cand.deletions.randomize(&mut rng);

            assert_eq!(
                engine.is_feasible(&cand),
                brute_force_feasible(n, &edges, &cand, k),
                "n={n} edges={edges:?}"
            );
        }
    }

    #[test]
    fn structural_feasibility_is_monotone_in_deletions() {
        // With k = n the budget never binds; deleting more vertices can only
        // remove obstructions, never create them.
        let mut rng = XorShiftRng::seed_from_u64(0x301);
        for _ in 0..100 {
            let n = rng.random_range(4..=9);
            let mut edges = Vec::new();
            for u in 0..n as u32 {
                for v in (u + 1)..n as u32 {
                    if rng.random_bool(0.5) {
                        edges.push((u, v));
                    }
                }
            }
            let g = GraphIndex::build(n, &edges, n);
            let mut engine = CvdEngine::new(&g);

            let mut cand = cover(n, &(0..n).collect::<Vec<_>>());
            cand.deletions.randomize(&mut rng);
            if !engine.is_feasible(&cand) {
                continue;
            }
            for _ in 0..n {
                cand.deletions.insert(rng.random_range(0..n));
                assert!(engine.is_feasible(&cand), "superset became infeasible");
            }
        }
    }

    #[test]
    fn repair_with_nothing_protected_is_a_successful_noop() {
        // An empty protected set gives repair nothing to anchor on: it must
        // succeed (the empty set is trivially a cluster graph) and must not
        // delete anything, leaving the feasibility verdict to the caller.
        let mut rng = XorShiftRng::seed_from_u64(0x4E9A12);
        for _ in 0..50 {
            let n = rng.random_range(3..=10);
            let mut edges = Vec::new();
            for u in 0..n as u32 {
                for v in (u + 1)..n as u32 {
                    if rng.random_bool(0.45) {
                        edges.push((u, v));
                    }
                }
            }
            let g = GraphIndex::build(n, &edges, n);
            let mut engine = CvdEngine::new(&g);

            let mut cand = Chromosome::new(n, n);
            let mut donor = Chromosome::new(n, n);
            donor.vertices.randomize(&mut rng);
            if donor.vertices.is_empty() {
                donor.vertices.insert(0);
            }
            cand.merge_vertices(&donor, &donor);

            let empty = PackedSet::new(n);
            assert!(engine.repair(&mut cand, &empty, &empty, &empty));
            assert!(cand.deletions.is_empty(), "edges={edges:?}");
        }
    }

    #[test]
    fn repair_is_best_effort_across_merge_groups() {
        // Protected singleton {0}; 1 and 2 are each fully adjacent to it but
        // not to each other, and 3 glues them into one merge group. The
        // cheapest assignment sends the group to the cluster and deletes 3,
        // keeping both 1 and 2. The path 1-0-2 survives, so the caller's
        // feasibility re-check must reject this candidate.
        let g = GraphIndex::build(4, &[(0, 1), (0, 2), (1, 3), (2, 3)], 4);
        let mut engine = CvdEngine::new(&g);
        let mut cand = cover(4, &[0, 1, 2, 3]);

        let mut p1 = PackedSet::new(4);
        p1.insert(0);
        let empty = PackedSet::new(4);

        assert!(engine.repair(&mut cand, &p1, &empty, &empty));
        assert!(cand.deletions.contains(3));
        assert_eq!(cand.deletion_count(), 1);
        assert!(!engine.is_feasible(&cand));
    }

    #[test]
    fn template_stores_covered_triples_only() {
        // Path 0-1-2 plus isolated covered vertex 3.
        let g = GraphIndex::build(4, &[(0, 1), (1, 2)], 1);
        let engine = CvdEngine::new(&g);
        let cand = cover(4, &[0, 1, 2, 3]);
        let parent = Chromosome::new(4, 4);
        let mut template = PackedSet::new(4);

        engine.build_template(&mut template, &cand, &parent, &parent);
        assert!(template.contains(0) && template.contains(1) && template.contains(2));
        assert!(!template.contains(3));
    }

    #[test]
    fn template_skips_uncovered_obstructions() {
        // Same path but vertex 2 is outside the candidate's subset: the
        // obstruction is not covered, so the template stays empty.
        let g = GraphIndex::build(3, &[(0, 1), (1, 2)], 1);
        let engine = CvdEngine::new(&g);
        let cand = cover(3, &[0, 1]);
        let parent = Chromosome::new(3, 3);
        let mut template = PackedSet::new(3);

        engine.build_template(&mut template, &cand, &parent, &parent);
        assert!(template.is_empty());
    }
}
