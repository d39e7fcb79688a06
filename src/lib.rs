//! # Cluster Editing Search
//!
//! A randomized steady-state search for two NP-hard graph-editing problems:
//! **Cluster Deletion** (remove at most k edges) and **Cluster Vertex
//! Deletion** (remove at most k vertices), both targeting a *cluster graph*:
//! a disjoint union of cliques, equivalently a graph with no induced path on
//! three vertices.
//!
//! This crate provides:
//! - A packed bitset over a fixed universe ([`bits::PackedSet`]).
//! - A static obstruction index over the input graph, built once and queried
//!   by both variants ([`graph::GraphIndex`]).
//! - Exact feasibility oracles and best-effort repair operators for both
//!   variants ([`cd`], [`cvd`]), the latter backed by an exact min-cost
//!   assignment solver ([`assign`]).
//! - A steady-state evolutionary driver that merges chromosomes until a
//!   single whole-graph solution survives ([`search`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clusterga::graph::{load_graph_file, GraphIndex};
//! use clusterga::problem::ProblemKind;
//! use clusterga::search::{run, GaConfig};
//! use rand::SeedableRng;
//! use rand_pcg::Pcg64Dxsm;
//!
//! let loaded = load_graph_file("graph.txt").expect("readable edge list");
//! let graph = GraphIndex::build(loaded.n, &loaded.edges, 3);
//! let cfg = GaConfig {
//!     kind: ProblemKind::Cd,
//!     cutoff: 1_000_000,
//!     ..GaConfig::default()
//! };
//! let mut rng = Pcg64Dxsm::seed_from_u64(12345);
//! let outcome = run(&graph, &cfg, &mut rng);
//! println!("{}", outcome.csv_line("graph.txt"));
//! ```
//!
//! ## Modules
//!
//! - [`bits`]: Fixed-capacity packed bit sets.
//! - [`graph`]: Graph loading and the precomputed obstruction index.
//! - [`chromosome`]: Candidate solutions (deletion set + covered subgraph).
//! - [`random`]: Geometric-gap and distinct-pair sampling helpers.
//! - [`assign`]: Min-cost assignment of merge groups to clusters.
//! - [`cd`], [`cvd`]: Per-variant feasibility, repair and templates.
//! - [`problem`]: Variant selection and dispatch.
//! - [`search`]: The steady-state evolutionary driver.
//!
//! ## Performance Notes
//!
//! - The obstruction index is quadratic to cubic to build but makes every
//!   feasibility query proportional to the obstructions it touches.
//! - Engines own all their scratch storage; the generation loop allocates
//!   only inside the occasional CVD assignment solve.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::inline_always)] // Intentional for hot-path code
#![allow(clippy::many_single_char_names)] // Graph-theoretic variable names
#![allow(clippy::needless_range_loop)] // Often clearer for edge-id loops

pub mod assign;
pub mod bits;
pub mod cd;
pub mod chromosome;
pub mod cvd;
pub mod graph;
pub mod problem;
pub mod random;
pub mod search;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::bits::PackedSet;
    pub use crate::chromosome::Chromosome;
    pub use crate::graph::{load_graph_file, GraphIndex, LoadedGraph};
    pub use crate::problem::ProblemKind;
    pub use crate::search::{run, GaConfig, RunOutcome};
}
