//! Minimum-cost assignment of merge groups to target classes.
//!
//! During CVD repair every B-cluster must be assigned exactly one class:
//! class 0 ("delete everything that blocks, join nothing") or one of the
//! classes 1..=l, each standing for an A-cluster that can absorb at most one
//! merging group. The constraint matrix of this program is totally
//! unimodular, so instead of a general LP solver the bundled implementation
//! runs successive shortest augmenting paths on the equivalent
//! min-cost-flow network, which is exact and integral by construction.

use std::fmt;

// ============================================================================
// Problem statement
// ============================================================================

/// A dense rows × classes cost matrix. Column 0 is the unconstrained
/// "unassigned" class; columns 1.. each accept at most one row.
#[derive(Clone, Debug)]
pub struct CostMatrix {
    rows: usize,
    classes: usize,
    data: Vec<u64>,
}

impl CostMatrix {
    /// Creates a zero matrix with `rows` rows and `classes` columns
    /// (column 0 included).
    pub fn new(rows: usize, classes: usize) -> Self {
        assert!(classes >= 1, "need at least the unassigned class");
        Self {
            rows,
            classes,
            data: vec![0; rows * classes],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of classes, column 0 included.
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Sets `cost(row, class)`.
    #[inline(always)]
    pub fn set(&mut self, row: usize, class: usize, cost: u64) {
        self.data[row * self.classes + class] = cost;
    }

    /// Returns `cost(row, class)`.
    #[inline(always)]
    pub fn cost(&self, row: usize, class: usize) -> u64 {
        self.data[row * self.classes + class]
    }
}

/// Failure to produce a complete assignment.
///
/// With column 0 unconstrained every instance is feasible, so seeing this
/// error means the solver or its input data is defective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignmentError;

impl fmt::Display for AssignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "assignment solver failed to assign every row")
    }
}

impl std::error::Error for AssignmentError {}

/// Contract for assignment solvers: given the cost matrix, return for each
/// row the class it is assigned to, minimizing total cost subject to
/// row-sum-exactly-one and column-at-most-one (columns ≥ 1).
pub trait AssignmentSolver {
    /// Solves the assignment problem.
    ///
    /// # Errors
    /// Returns [`AssignmentError`] if a complete assignment cannot be
    /// produced; see the error's documentation for why that is a defect.
    fn assign(&mut self, costs: &CostMatrix) -> Result<Vec<usize>, AssignmentError>;
}

// ============================================================================
// Min-cost-flow implementation
// ============================================================================

/// Exact solver via successive shortest augmenting paths.
///
/// Network: source → each row (capacity 1), row → class arcs (capacity 1,
/// the matrix cost), each class ≥ 1 → sink (capacity 1), class 0 → sink
/// (capacity = number of rows). Each augmentation routes one row; costs are
/// non-negative so Bellman-Ford shortest paths suffice.
#[derive(Clone, Debug, Default)]
pub struct FlowAssignment {
    arcs: Vec<Arc>,
    heads: Vec<Vec<u32>>,
}

#[derive(Clone, Copy, Debug)]
struct Arc {
    to: u32,
    cap: u32,
    cost: i64,
}

impl FlowAssignment {
    /// Creates a solver.
    pub fn new() -> Self {
        Self::default()
    }

    fn add_arc(&mut self, from: usize, to: usize, cap: u32, cost: i64) {
        self.heads[from].push(self.arcs.len() as u32);
        self.arcs.push(Arc { to: to as u32, cap, cost });
        self.heads[to].push(self.arcs.len() as u32);
        self.arcs.push(Arc { to: from as u32, cap: 0, cost: -cost });
    }

    fn build(&mut self, costs: &CostMatrix) {
        let rows = costs.rows();
        let classes = costs.classes();
        let nodes = 2 + rows + classes;
        self.arcs.clear();
        self.heads.clear();
        self.heads.resize(nodes, Vec::new());

        let source = 0usize;
        let sink = nodes - 1;
        let row_node = |i: usize| 1 + i;
        let class_node = |j: usize| 1 + rows + j;

        for i in 0..rows {
            self.add_arc(source, row_node(i), 1, 0);
            for j in 0..classes {
                self.add_arc(row_node(i), class_node(j), 1, costs.cost(i, j) as i64);
            }
        }
        self.add_arc(class_node(0), sink, rows as u32, 0);
        for j in 1..classes {
            self.add_arc(class_node(j), sink, 1, 0);
        }
    }

    /// Finds a shortest source→sink path in the residual network and
    /// augments one unit along it. Returns `false` when no path remains.
    fn augment_once(&mut self, nodes: usize) -> bool {
        const UNREACHED: i64 = i64::MAX;
        let source = 0usize;
        let sink = nodes - 1;

        let mut dist = vec![UNREACHED; nodes];
        let mut pred = vec![u32::MAX; nodes]; // arc used to reach node
        let mut in_queue = vec![false; nodes];
        let mut queue = std::collections::VecDeque::new();
        dist[source] = 0;
        queue.push_back(source);
        in_queue[source] = true;

        while let Some(v) = queue.pop_front() {
            in_queue[v] = false;
            for &ai in &self.heads[v] {
                let arc = self.arcs[ai as usize];
                if arc.cap == 0 {
                    continue;
                }
                let to = arc.to as usize;
                let nd = dist[v] + arc.cost;
                if dist[to] == UNREACHED || nd < dist[to] {
                    dist[to] = nd;
                    pred[to] = ai;
                    if !in_queue[to] {
                        queue.push_back(to);
                        in_queue[to] = true;
                    }
                }
            }
        }

        if dist[sink] == UNREACHED {
            return false;
        }
        // Unit capacities on the path: augment by exactly one.
        let mut v = sink;
        while v != source {
            let ai = pred[v] as usize;
            self.arcs[ai].cap -= 1;
            self.arcs[ai ^ 1].cap += 1;
            v = self.arcs[ai ^ 1].to as usize;
        }
        true
    }
}

impl AssignmentSolver for FlowAssignment {
    fn assign(&mut self, costs: &CostMatrix) -> Result<Vec<usize>, AssignmentError> {
        let rows = costs.rows();
        let classes = costs.classes();
        if rows == 0 {
            return Ok(Vec::new());
        }
        self.build(costs);
        let nodes = 2 + rows + classes;
        for _ in 0..rows {
            if !self.augment_once(nodes) {
                return Err(AssignmentError);
            }
        }

        // Row i's chosen class is the row→class arc whose reverse carries flow.
        let mut assignment = vec![usize::MAX; rows];
        for i in 0..rows {
            let row = 1 + i;
            for &ai in &self.heads[row] {
                let ai = ai as usize;
                if ai % 2 == 0 {
                    let arc = self.arcs[ai];
                    let to = arc.to as usize;
                    if to > rows && to < nodes - 1 && self.arcs[ai ^ 1].cap > 0 {
                        assignment[i] = to - 1 - rows;
                    }
                }
            }
            if assignment[i] == usize::MAX {
                return Err(AssignmentError);
            }
        }
        Ok(assignment)
    }
}

// ============================================================================
// Tests
// ============================================================================
