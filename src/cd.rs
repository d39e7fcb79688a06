//! Cluster Deletion: feasibility oracle, repair operator and template builder.
//!
//! The deletion set is indexed over edges. An edge is *in-graph* for a
//! candidate iff it is not deleted and both endpoints lie in the candidate's
//! vertex subset.

use crate::bits::PackedSet;
use crate::chromosome::Chromosome;
use crate::graph::GraphIndex;

/// Engine for the Cluster Deletion variant.
///
/// Owns the scratch sets the repair pass needs, so nothing is allocated per
/// generation. Constructed once per graph and reused for the whole run.
#[derive(Clone, Debug)]
pub struct CdEngine<'g> {
    graph: &'g GraphIndex,
    protected: PackedSet,
    marked: PackedSet,
    protected_list: Vec<usize>,
}

impl<'g> CdEngine<'g> {
    /// Creates an engine with pre-sized scratch storage.
    pub fn new(graph: &'g GraphIndex) -> Self {
        let m = graph.m();
        Self {
            graph,
            protected: PackedSet::new(m),
            marked: PackedSet::new(m),
            protected_list: Vec::with_capacity(m),
        }
    }

    /// Deletion sets for this variant are indexed over edges.
    pub fn solution_len(&self) -> usize {
        self.graph.m()
    }

    #[inline(always)]
    fn edge_in_graph(&self, cand: &Chromosome, e: usize) -> bool {
        let (u, v) = self.graph.edge(e);
        !cand.deletions.contains(e) && cand.vertices.contains(u) && cand.vertices.contains(v)
    }

    /// Returns whether the candidate, restricted to its vertex subset minus
    /// its deletion set, is a cluster graph within budget `k`.
    ///
    /// Checks, in order: at most `k` deleted edges with both endpoints in the
    /// vertex subset; no in-graph obstruction partner for any in-graph edge;
    /// no half-broken triangle (for every triangle-partner pair of an
    /// in-graph edge, both edges in-graph or neither, since losing exactly
    /// one leaves an induced path).
    pub fn is_feasible(&self, cand: &Chromosome) -> bool {
        let mut count = 0usize;
        for e in 0..self.graph.m() {
            let (u, v) = self.graph.edge(e);
            if cand.deletions.contains(e)
                && cand.vertices.contains(u)
                && cand.vertices.contains(v)
            {
                count += 1;
                if count > self.graph.k() {
                    return false;
                }
            }

            if self.edge_in_graph(cand, e) {
                for &f in self.graph.edge_obstructions(e) {
                    if self.edge_in_graph(cand, f as usize) {
                        return false;
                    }
                }
                for &(f, g) in self.graph.triangle_partners(e) {
                    if self.edge_in_graph(cand, f as usize) != self.edge_in_graph(cand, g as usize)
                    {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Single best-effort repair pass.
    ///
    /// The protected set is `(p1 ∪ p2 ∪ template) \ S`: edges the parents or
    /// the template want kept. For every protected in-graph edge, every
    /// in-graph unprotected obstruction partner is marked and unioned into
    /// the deletion set. The pass neither loops to a fixpoint nor re-checks
    /// feasibility; the caller must re-verify with [`CdEngine::is_feasible`]
    /// before accepting the offspring. Always reports success.
    pub fn repair(
        &mut self,
        cand: &mut Chromosome,
        p1: &PackedSet,
        p2: &PackedSet,
        template: &PackedSet,
    ) -> bool {
        if self.is_feasible(cand) {
            return true;
        }

        self.protected.copy_from(p1);
        self.protected.union_with(p2);
        self.protected.union_with(template);
        self.protected.subtract(&cand.deletions);

        self.marked.zero();
        self.protected.members(&mut self.protected_list);
        for &e in &self.protected_list {
            if !self.edge_in_graph(cand, e) {
                continue;
            }
            for &f in self.graph.edge_obstructions(e) {
                let f = f as usize;
                if self.edge_in_graph(cand, f) && !self.protected.contains(f) {
                    self.marked.insert(f);
                }
            }
        }

        cand.deletions.union_with(&self.marked);
        true
    }

    /// Builds a template: one representative unresolved obstruction per edge.
    ///
    /// For each in-graph edge `e` unprotected by either parent and not yet in
    /// the template, the first in-graph unprotected obstruction partner `f`
    /// is stored together with `e`. A hint to bias the crossover, not a
    /// complete obstruction cover.
    pub fn build_template(
        &self,
        template: &mut PackedSet,
        cand: &Chromosome,
        p1: &Chromosome,
        p2: &Chromosome,
    ) {
        template.zero();
        for e in 0..self.graph.m() {
            if !self.edge_in_graph(cand, e)
                || p1.deletions.contains(e)
                || p2.deletions.contains(e)
                || template.contains(e)
            {
                continue;
            }
            for &f in self.graph.edge_obstructions(e) {
                let f = f as usize;
                if self.edge_in_graph(cand, f)
                    && !p1.deletions.contains(f)
                    && !p2.deletions.contains(f)
                    && !template.contains(f)
                {
                    template.insert(e);
                    template.insert(f);
                    break;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
