//! Static graph index over a fixed vertex/edge universe, plus an edge-list reader.
//!
//! The index is built once from the loaded graph and is read-only afterwards:
//! adjacency lists, per-vertex obstruction pairs, per-edge obstruction
//! partners and per-edge triangle partners. An *obstruction* is an induced
//! path on three vertices (a P3), the single structural defect a cluster
//! graph must not contain.
//!
//! All per-vertex and per-edge lists live in contiguous arenas addressed by
//! offset and length, so no slot carries a worst-case-sized allocation.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// ============================================================================
// Arena
// ============================================================================

/// Contiguous storage for a family of variable-length lists.
#[derive(Clone, Debug)]
struct Arena<T> {
    items: Vec<T>,
    offsets: Vec<u32>,
}

impl<T> Arena<T> {
    fn from_lists(lists: Vec<Vec<T>>) -> Self {
        let total: usize = lists.iter().map(Vec::len).sum();
        assert!(total <= u32::MAX as usize, "arena too large for 32-bit offsets");
        let mut items = Vec::with_capacity(total);
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        offsets.push(0);
        for list in lists {
            items.extend(list);
            offsets.push(items.len() as u32);
        }
        Self { items, offsets }
    }

    #[inline(always)]
    fn slice(&self, i: usize) -> &[T] {
        let lo = self.offsets[i] as usize;
        let hi = self.offsets[i + 1] as usize;
        &self.items[lo..hi]
    }
}

// ============================================================================
// GraphIndex
// ============================================================================

/// Immutable index over a graph: adjacency plus the precomputed obstruction
/// structure both problem variants query.
///
/// Construction is the dominant preprocessing cost (quadratic to cubic in the
/// graph size) but runs exactly once per input.
#[derive(Clone, Debug)]
pub struct GraphIndex {
    n: usize,
    k: usize,
    edges: Vec<(u32, u32)>,
    edge_ids: HashMap<(u32, u32), u32>,
    adjacency: Arena<u32>,
    vertex_obstructions: Arena<(u32, u32)>,
    edge_obstructions: Arena<u32>,
    triangle_partners: Arena<(u32, u32)>,
}

impl GraphIndex {
    /// Builds the index from a vertex count, an edge list and the deletion
    /// budget `k`.
    ///
    /// # Panics
    /// Panics if an edge endpoint is out of range or an edge is a self-loop.
    /// The loader guarantees neither can happen for graphs it produced.
    pub fn build(n: usize, edges: &[(u32, u32)], k: usize) -> Self {
        let m = edges.len();
        assert!(m <= u32::MAX as usize, "too many edges for 32-bit edge ids");

        let mut edge_ids = HashMap::with_capacity(m);
        let mut adj: Vec<Vec<u32>> = vec![Vec::new(); n];
        for (e, &(u, v)) in edges.iter().enumerate() {
            assert!((u as usize) < n && (v as usize) < n, "edge endpoint out of range");
            assert!(u != v, "self-loop in edge list");
            edge_ids.insert(normalize(u, v), e as u32);
            adj[u as usize].push(v);
            adj[v as usize].push(u);
        }

        let has_edge = |u: u32, v: u32| edge_ids.contains_key(&normalize(u, v));

        // Per-vertex obstruction pairs: ordered pairs (u, w) of distinct
        // neighbors of v with uw not an edge, so v centers the path u-v-w.
        let mut vlists: Vec<Vec<(u32, u32)>> = vec![Vec::new(); n];
        for v in 0..n {
            for (i, &u) in adj[v].iter().enumerate() {
                for (j, &w) in adj[v].iter().enumerate() {
                    if i != j && !has_edge(u, w) {
                        vlists[v].push((u, w));
                    }
                }
            }
        }

        // Per-edge lists: classify every third vertex w against e = (v, u).
        // Exactly one of (v,w), (u,w) present: the present edge is an
        // obstruction partner of e. Both present: a triangle-partner pair.
        let mut elists: Vec<Vec<u32>> = vec![Vec::new(); m];
        let mut tlists: Vec<Vec<(u32, u32)>> = vec![Vec::new(); m];
        for (e, &(v, u)) in edges.iter().enumerate() {
            for w in 0..n as u32 {
                if w == v || w == u {
                    continue;
                }
                let vw = edge_ids.get(&normalize(v, w)).copied();
                let uw = edge_ids.get(&normalize(u, w)).copied();
                match (vw, uw) {
                    (Some(f), None) | (None, Some(f)) => elists[e].push(f),
                    (Some(f), Some(g)) => tlists[e].push((f, g)),
                    (None, None) => {}
                }
            }
        }

        Self {
            n,
            k,
            edges: edges.to_vec(),
            edge_ids,
            adjacency: Arena::from_lists(adj),
            vertex_obstructions: Arena::from_lists(vlists),
            edge_obstructions: Arena::from_lists(elists),
            triangle_partners: Arena::from_lists(tlists),
        }
    }

    /// Number of vertices.
    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of edges.
    #[inline(always)]
    pub fn m(&self) -> usize {
        self.edges.len()
    }

    /// Deletion budget.
    #[inline(always)]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Endpoints of edge `e`.
    #[inline(always)]
    pub fn edge(&self, e: usize) -> (usize, usize) {
        let (u, v) = self.edges[e];
        (u as usize, v as usize)
    }

    /// Returns whether `u` and `v` are adjacent.
    #[inline(always)]
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.edge_ids.contains_key(&normalize(u as u32, v as u32))
    }

    /// Returns the edge id of `(u, v)` if that edge exists.
    #[inline(always)]
    pub fn edge_id(&self, u: usize, v: usize) -> Option<usize> {
        self.edge_ids
            .get(&normalize(u as u32, v as u32))
            .map(|&e| e as usize)
    }

    /// Neighbors of vertex `v`.
    #[inline(always)]
    pub fn neighbors(&self, v: usize) -> &[u32] {
        self.adjacency.slice(v)
    }

    /// Obstruction pairs centered at `v`: pairs (u, w) of neighbors of `v`
    /// with `uw` absent.
    #[inline(always)]
    pub fn vertex_obstructions(&self, v: usize) -> &[(u32, u32)] {
        self.vertex_obstructions.slice(v)
    }

    /// Edges forming an induced path together with edge `e`.
    #[inline(always)]
    pub fn edge_obstructions(&self, e: usize) -> &[u32] {
        self.edge_obstructions.slice(e)
    }

    /// Pairs of edges closing a triangle with edge `e`.
    #[inline(always)]
    pub fn triangle_partners(&self, e: usize) -> &[(u32, u32)] {
        self.triangle_partners.slice(e)
    }
}

#[inline(always)]
fn normalize(u: u32, v: u32) -> (u32, u32) {
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}

// ============================================================================
// Edge-list loading
// ============================================================================

/// A graph as produced by the loader: a vertex count and an edge list of
/// 0-based vertex-id pairs.
#[derive(Clone, Debug)]
pub struct LoadedGraph {
    /// Number of vertices (highest id + 1; isolated vertices are allowed).
    pub n: usize,
    /// Deduplicated edge list.
    pub edges: Vec<(u32, u32)>,
}

/// Errors encountered while reading an edge list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphReadError {
    /// The input contained no edges.
    Empty,
    /// A vertex id could not be parsed or does not fit the id range.
    BadVertexId {
        /// 1-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// An edge joins a vertex to itself.
    SelfLoop {
        /// 1-based line number.
        line: usize,
        /// The repeated vertex id.
        vertex: u32,
    },
    /// I/O error (file not found, read failure, ...).
    Io(String),
}

impl fmt::Display for GraphReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphReadError::Empty => write!(f, "edge list is empty"),
            GraphReadError::BadVertexId { line, token } => {
                write!(f, "line {line}: invalid vertex id {token:?}")
            }
            GraphReadError::SelfLoop { line, vertex } => {
                write!(f, "line {line}: self-loop at vertex {vertex}")
            }
            GraphReadError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for GraphReadError {}

/// Reads a plaintext edge list.
///
/// Rules:
/// - Lines starting with `#` are comments.
/// - A line with anything other than two fields is skipped with a warning
///   (some datasets carry a vertex-count header line).
/// - Duplicate edges (including reversed duplicates) are kept once.
/// - The vertex count is the highest vertex id + 1.
///
/// # Errors
/// Returns an error on I/O failure, an unparsable vertex id, a self-loop,
/// or an input with no edges at all.
pub fn read_edge_list<R: BufRead>(reader: R) -> Result<LoadedGraph, GraphReadError> {
    let mut edges = Vec::new();
    let mut seen = HashMap::new();
    let mut max_id = 0u32;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| GraphReadError::Io(e.to_string()))?;
        let lineno = lineno + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 2 {
            eprintln!("WARNING: line {lineno} contains {} fields, skipping", fields.len());
            continue;
        }
        let u = parse_vertex(fields[0], lineno)?;
        let v = parse_vertex(fields[1], lineno)?;
        if u == v {
            return Err(GraphReadError::SelfLoop { line: lineno, vertex: u });
        }
        max_id = max_id.max(u).max(v);
        let key = normalize(u, v);
        if seen.insert(key, ()).is_none() {
            edges.push((u, v));
        }
    }

    if edges.is_empty() {
        return Err(GraphReadError::Empty);
    }
    Ok(LoadedGraph {
        n: max_id as usize + 1,
        edges,
    })
}

/// Reads a plaintext edge list from a file.
///
/// # Errors
/// See [`read_edge_list`].
pub fn load_graph_file(path: impl AsRef<Path>) -> Result<LoadedGraph, GraphReadError> {
    let file = File::open(path).map_err(|e| GraphReadError::Io(e.to_string()))?;
    read_edge_list(BufReader::new(file))
}

fn parse_vertex(token: &str, line: usize) -> Result<u32, GraphReadError> {
    token.parse::<u32>().map_err(|_| GraphReadError::BadVertexId {
        line,
        token: token.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
