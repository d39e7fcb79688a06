//! Problem-variant selection and dispatch.
//!
//! Both variants expose the same four operations to the search driver; the
//! closed [`Engine`] enum keeps the driver monomorphic and free of dynamic
//! dispatch in the generation loop.

use std::fmt;

use crate::bits::PackedSet;
use crate::cd::CdEngine;
use crate::chromosome::Chromosome;
use crate::cvd::CvdEngine;
use crate::graph::GraphIndex;

/// Which graph-editing problem a run solves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProblemKind {
    /// Cluster Deletion: delete at most k edges.
    Cd,
    /// Cluster Vertex Deletion: delete at most k vertices.
    Cvd,
}

impl ProblemKind {
    /// Parses the command-line spelling of a problem kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cd" => Some(ProblemKind::Cd),
            "cvd" => Some(ProblemKind::Cvd),
            _ => None,
        }
    }

    /// The command-line spelling, also used in result records.
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemKind::Cd => "cd",
            ProblemKind::Cvd => "cvd",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem engine bound to a graph: feasibility, repair and template
/// construction for one of the two variants.
#[derive(Clone, Debug)]
pub enum Engine<'g> {
    /// Cluster Deletion engine.
    Cd(CdEngine<'g>),
    /// Cluster Vertex Deletion engine.
    Cvd(CvdEngine<'g>),
}

impl<'g> Engine<'g> {
    /// Creates the engine for `kind` over `graph`.
    pub fn new(kind: ProblemKind, graph: &'g GraphIndex) -> Self {
        match kind {
            ProblemKind::Cd => Engine::Cd(CdEngine::new(graph)),
            ProblemKind::Cvd => Engine::Cvd(CvdEngine::new(graph)),
        }
    }

    /// The variant this engine solves.
    pub fn kind(&self) -> ProblemKind {
        match self {
            Engine::Cd(_) => ProblemKind::Cd,
            Engine::Cvd(_) => ProblemKind::Cvd,
        }
    }

    /// Bit width of deletion sets: edges for CD, vertices for CVD.
    pub fn solution_len(&self) -> usize {
        match self {
            Engine::Cd(e) => e.solution_len(),
            Engine::Cvd(e) => e.solution_len(),
        }
    }

    /// Feasibility oracle for the candidate.
    pub fn is_feasible(&mut self, cand: &Chromosome) -> bool {
        match self {
            Engine::Cd(e) => e.is_feasible(cand),
            Engine::Cvd(e) => e.is_feasible(cand),
        }
    }

    /// Repair operator; `false` means the candidate must be discarded.
    pub fn repair(
        &mut self,
        cand: &mut Chromosome,
        p1: &PackedSet,
        p2: &PackedSet,
        template: &PackedSet,
    ) -> bool {
        match self {
            Engine::Cd(e) => e.repair(cand, p1, p2, template),
            Engine::Cvd(e) => e.repair(cand, p1, p2, template),
        }
    }

    /// Fills `template` with representative obstructions for the crossover.
    pub fn build_template(
        &self,
        template: &mut PackedSet,
        cand: &Chromosome,
        p1: &Chromosome,
        p2: &Chromosome,
    ) {
        match self {
            Engine::Cd(e) => e.build_template(template, cand, p1, p2),
            Engine::Cvd(e) => e.build_template(template, cand, p1, p2),
        }
    }
}
