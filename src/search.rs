//! Steady-state evolutionary search over both problem variants.
//!
//! The population starts with one chromosome per vertex, each covering only
//! its own vertex. Crossover merges the two parents' induced subgraphs and
//! shrinks the population by one on acceptance; mutation keeps the induced
//! subgraph and perturbs the deletion set. The instance is solved when a
//! single chromosome covering the whole graph survives.

use std::io::{self, Write};

use rand::Rng;

use crate::bits::PackedSet;
use crate::chromosome::Chromosome;
use crate::graph::GraphIndex;
use crate::problem::{Engine, ProblemKind};
use crate::random::{choose_two, geometric};

// ============================================================================
// Configuration
// ============================================================================

/// Parameters of a search run.
#[derive(Clone, Debug)]
pub struct GaConfig {
    /// Which problem variant to solve.
    pub kind: ProblemKind,
    /// Maximum number of generations before giving up.
    pub cutoff: u64,
    /// Probability of attempting a crossover instead of a mutation.
    pub crossover_probability: f64,
    /// Emit a progress line every this many generations; 0 disables.
    pub report_every: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            kind: ProblemKind::Cd,
            cutoff: 1_000_000,
            crossover_probability: 0.8,
            report_every: 0,
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// What a finished run produced.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// Vertex count of the instance.
    pub n: usize,
    /// Edge count of the instance.
    pub m: usize,
    /// Deletion budget of the instance.
    pub k: usize,
    /// Problem variant.
    pub kind: ProblemKind,
    /// Generations actually spent.
    pub generations: u64,
    /// Whether a single whole-graph chromosome survived.
    pub solved: bool,
    /// Active population size at the end of the run.
    pub population_size: usize,
    /// The configured generation limit.
    pub cutoff: u64,
    /// The active population, survivors first.
    pub population: Vec<Chromosome>,
}

impl RunOutcome {
    /// The deletion set of the surviving chromosome, if the run solved the
    /// instance.
    pub fn solution(&self) -> Option<&PackedSet> {
        if self.solved {
            Some(&self.population[0].deletions)
        } else {
            None
        }
    }

    /// One comma-separated record per run, suitable for appending to a
    /// results file:
    /// `input,n,m,k,type,generations,solved,popsize,cutoff`.
    pub fn csv_line(&self, input: &str) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            input,
            self.n,
            self.m,
            self.k,
            self.kind,
            self.generations,
            u8::from(self.solved),
            self.population_size,
            self.cutoff
        )
    }

    /// Writes the solution in the variant's plaintext format: one `u v` edge
    /// line per deleted edge for CD, one vertex id per line for CVD.
    ///
    /// # Errors
    /// Fails only on I/O errors of the underlying writer.
    pub fn write_solution<W: Write>(&self, graph: &GraphIndex, w: &mut W) -> io::Result<()> {
        let Some(solution) = self.solution() else {
            return Ok(());
        };
        match self.kind {
            ProblemKind::Cd => {
                for e in solution.iter() {
                    let (u, v) = graph.edge(e);
                    writeln!(w, "{u} {v}")?;
                }
            }
            ProblemKind::Cvd => {
                for v in solution.iter() {
                    writeln!(w, "{v}")?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Flips positions of `s` at geometrically distributed gaps, so each
/// position flips with probability `rate` independently.
fn mutate<R: Rng>(s: &mut PackedSet, rate: f64, rng: &mut R) {
    let mut i = geometric(rng, rate) - 1;
    while i < s.capacity() {
        s.toggle(i);
        i += geometric(rng, rate);
    }
}

/// Three-way uniform crossover: each position of `child` is drawn from one
/// of the two parent deletion sets or the obstruction template, each with
/// probability 1/3.
fn crossover<R: Rng>(
    child: &mut PackedSet,
    p1: &PackedSet,
    p2: &PackedSet,
    template: &PackedSet,
    rng: &mut R,
) {
    for i in 0..child.capacity() {
        let source = match rng.random_range(0..3u32) {
            0 => p1,
            1 => p2,
            _ => template,
        };
        child.copy_bit_from(source, i);
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Runs the steady-state search until the population collapses to a single
/// whole-graph chromosome or the generation cutoff is reached.
pub fn run<R: Rng>(graph: &GraphIndex, cfg: &GaConfig, rng: &mut R) -> RunOutcome {
    let mut engine = Engine::new(cfg.kind, graph);
    let solution_len = engine.solution_len();
    let n = graph.n();

    let mut population: Vec<Chromosome> = (0..n)
        .map(|v| {
            let mut c = Chromosome::new(solution_len, n);
            c.seed(v, rng);
            c
        })
        .collect();
    let mut popsize = n;

    let mut offspring = Chromosome::new(solution_len, n);
    let mut template = PackedSet::new(solution_len);
    let mutation_rate = 1.0 / solution_len.max(1) as f64;

    let mut generations = 0u64;
    while generations < cfg.cutoff && popsize > 1 {
        generations += 1;
        if cfg.report_every != 0 && generations % cfg.report_every == 0 {
            eprintln!("generation {generations}: {popsize} chromosomes active");
        }

        let (i, j) = choose_two(rng, popsize);

        if rng.random::<f64>() < cfg.crossover_probability {
            // Crossover: merge the parents' subgraphs, mix their deletion
            // sets with an obstruction template, then repair.
            offspring.merge_vertices(&population[i], &population[j]);
            engine.build_template(&mut template, &offspring, &population[i], &population[j]);
            crossover(
                &mut offspring.deletions,
                &population[i].deletions,
                &population[j].deletions,
                &template,
                rng,
            );
            let repaired = engine.repair(
                &mut offspring,
                &population[i].deletions,
                &population[j].deletions,
                &template,
            );
            if repaired && engine.is_feasible(&offspring) {
                population[i].copy_from(&offspring);
                population.swap(j, popsize - 1);
                popsize -= 1;
            }
        } else {
            // Mutation: perturb the parent's deletion set over the same
            // subgraph; accept feasible non-growing offspring.
            offspring.copy_from(&population[i]);
            mutate(&mut offspring.deletions, mutation_rate, rng);
            if engine.is_feasible(&offspring)
                && offspring.deletion_count() <= population[i].deletion_count()
            {
                population[i].copy_from(&offspring);
            }
        }
    }

    population.truncate(popsize);
    RunOutcome {
        n,
        m: graph.m(),
        k: graph.k(),
        kind: engine.kind(),
        generations,
        solved: popsize == 1,
        population_size: popsize,
        cutoff: cfg.cutoff,
        population,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Dxsm;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn mutate_flips_each_position_with_given_rate() {
        let mut rng = XorShiftRng::seed_from_u64(0x300C);
        let capacity = 256;
        let rate = 0.05;
        let trials = 2_000;
        let mut flips = 0usize;
        for _ in 0..trials {
            let mut s = PackedSet::new(capacity);
            mutate(&mut s, rate, &mut rng);
            flips += s.len();
        }
        let observed = flips as f64 / (trials * capacity) as f64;
        assert!(
            (observed - rate).abs() < 0.01,
            "flip rate {observed} too far from {rate}"
        );
    }

    #[test]
    fn crossover_only_draws_from_its_sources() {
        let mut rng = XorShiftRng::seed_from_u64(0xC0);
        let capacity = 128;
        let mut p1 = PackedSet::new(capacity);
        let mut p2 = PackedSet::new(capacity);
        let mut t = PackedSet::new(capacity);
        p1.randomize(&mut rng);
        p2.randomize(&mut rng);
        t.randomize(&mut rng);

        let mut child = PackedSet::new(capacity);
        for _ in 0..50 {
            crossover(&mut child, &p1, &p2, &t, &mut rng);
            for i in 0..capacity {
                let sources = [p1.contains(i), p2.contains(i), t.contains(i)];
                assert!(sources.contains(&child.contains(i)), "position {i} invented");
            }
        }
    }

    #[test]
    fn merging_disjoint_components_needs_no_deletions() {
        // Two disjoint edges: any merged candidate with an empty deletion
        // set is feasible, so crossing candidates from different components
        // must be acceptable as-is.
        let g = GraphIndex::build(4, &[(0, 1), (2, 3)], 0);
        let mut engine = Engine::new(ProblemKind::Cd, &g);

        let mut p1 = Chromosome::new(g.m(), 4);
        let mut p2 = Chromosome::new(g.m(), 4);
        let mut seed_rng = XorShiftRng::seed_from_u64(0xD15);
        p1.seed(0, &mut seed_rng);
        p2.seed(2, &mut seed_rng);
        p1.deletions.zero();
        p2.deletions.zero();

        let mut offspring = Chromosome::new(g.m(), 4);
        offspring.merge_vertices(&p1, &p2);
        let mut template = PackedSet::new(g.m());
        engine.build_template(&mut template, &offspring, &p1, &p2);
        assert!(template.is_empty(), "no covered obstruction exists");

        assert!(engine.repair(&mut offspring, &p1.deletions, &p2.deletions, &template));
        assert!(engine.is_feasible(&offspring));
        assert_eq!(offspring.deletion_count(), 0);
    }

    #[test]
    fn solves_a_path_instance_for_cd() {
        // Path 0-1-2 with k = 1: the only feasible whole-graph solutions
        // delete exactly one edge.
        let g = GraphIndex::build(3, &[(0, 1), (1, 2)], 1);
        let cfg = GaConfig {
            kind: ProblemKind::Cd,
            cutoff: 200_000,
            ..GaConfig::default()
        };
        let mut rng = Pcg64Dxsm::seed_from_u64(1);
        let out = run(&g, &cfg, &mut rng);

        assert!(out.solved, "tiny instance not solved in {} generations", out.generations);
        assert_eq!(out.population_size, 1);
        let survivor = &out.population[0];
        assert_eq!(survivor.vertices.len(), 3, "survivor covers the whole graph");
        assert_eq!(out.solution().unwrap().len(), 1);
    }

    #[test]
    fn solves_a_star_instance_for_cvd() {
        // Star with 3 leaves and k = 1: only deleting the center works.
        let g = GraphIndex::build(4, &[(0, 1), (0, 2), (0, 3)], 1);
        let cfg = GaConfig {
            kind: ProblemKind::Cvd,
            cutoff: 200_000,
            ..GaConfig::default()
        };
        let mut rng = Pcg64Dxsm::seed_from_u64(2);
        let out = run(&g, &cfg, &mut rng);

        assert!(out.solved);
        assert_eq!(out.kind, ProblemKind::Cvd);
        let solution = out.solution().unwrap();
        assert_eq!(solution.len(), 1);
        assert!(solution.contains(0), "the center is the only valid deletion");
    }

    #[test]
    fn runs_are_reproducible_from_the_seed() {
        let g = GraphIndex::build(
            6,
            &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (0, 2), (3, 5)],
            2,
        );
        let cfg = GaConfig {
            kind: ProblemKind::Cd,
            cutoff: 50_000,
            ..GaConfig::default()
        };
        let out1 = run(&g, &cfg, &mut Pcg64Dxsm::seed_from_u64(42));
        let out2 = run(&g, &cfg, &mut Pcg64Dxsm::seed_from_u64(42));

        assert_eq!(out1.generations, out2.generations);
        assert_eq!(out1.solved, out2.solved);
        assert_eq!(out1.population_size, out2.population_size);
        for (a, b) in out1.population.iter().zip(&out2.population) {
            assert_eq!(a.deletions, b.deletions);
            assert_eq!(a.vertices, b.vertices);
        }
    }

    #[test]
    fn cutoff_bounds_the_generation_count() {
        // An infeasible instance (K1,3 with k = 0) can never merge down to
        // one chromosome: the run must stop exactly at the cutoff.
        let g = GraphIndex::build(4, &[(0, 1), (0, 2), (0, 3)], 0);
        let cfg = GaConfig {
            kind: ProblemKind::Cvd,
            cutoff: 3_000,
            ..GaConfig::default()
        };
        let mut rng = Pcg64Dxsm::seed_from_u64(3);
        let out = run(&g, &cfg, &mut rng);

        assert!(!out.solved);
        assert_eq!(out.generations, out.cutoff);
        assert!(out.population_size > 1);
        assert!(out.solution().is_none());
        assert_eq!(out.population.len(), out.population_size);
    }

    #[test]
    fn csv_line_layout() {
        let out = RunOutcome {
            n: 5,
            m: 7,
            k: 2,
            kind: ProblemKind::Cvd,
            generations: 123,
            solved: true,
            population_size: 1,
            cutoff: 1_000,
            population: vec![Chromosome::new(5, 5)],
        };
        assert_eq!(out.csv_line("graphs/toy.txt"), "graphs/toy.txt,5,7,2,cvd,123,1,1,1000");
    }

    #[test]
    fn solution_dump_formats_per_variant() {
        let g = GraphIndex::build(3, &[(0, 1), (1, 2)], 1);
        let mut cd_chromosome = Chromosome::new(2, 3);
        cd_chromosome.deletions.insert(1);
        let cd_out = RunOutcome {
            n: 3,
            m: 2,
            k: 1,
            kind: ProblemKind::Cd,
            generations: 1,
            solved: true,
            population_size: 1,
            cutoff: 10,
            population: vec![cd_chromosome],
        };
        let mut buf = Vec::new();
        cd_out.write_solution(&g, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1 2\n");

        let mut cvd_chromosome = Chromosome::new(3, 3);
        cvd_chromosome.deletions.insert(1);
        let cvd_out = RunOutcome {
            kind: ProblemKind::Cvd,
            population: vec![cvd_chromosome],
            ..cd_out
        };
        let mut buf = Vec::new();
        cvd_out.write_solution(&g, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1\n");
    }
}
