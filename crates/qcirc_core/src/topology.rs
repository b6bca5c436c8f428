//! Qubit topology (coupling map)
//!
//! Describes which physical qubit pairs support two-qubit gates. Used by the
//! transpiler for layout and routing and by device backends to reject
//! circuits that were not compiled for them.

use crate::circuit::Circuit;
use crate::error::{QcError, QcResult};
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Qubit topology (coupling map)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Coupling map: list of (control, target) pairs
    coupling_map: Vec<(QubitId, QubitId)>,

    /// Number of qubits
    num_qubits: usize,

    /// Whether every coupling works in both directions
    bidirectional: bool,

    name: Option<String>,
}

impl Topology {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create from coupling map; qubit count is one past the largest index
    pub fn from_coupling_map(
        coupling_map: Vec<(QubitId, QubitId)>,
        bidirectional: bool,
    ) -> QcResult<Self> {
        if coupling_map.is_empty() {
            return Err(QcError::EmptyCouplingMap);
        }

        for &(q1, q2) in &coupling_map {
            if q1 == q2 {
                return Err(QcError::InvalidCoupling(q1, q2));
            }
        }

        let max_qubit = coupling_map
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .max()
            .unwrap_or(0);

        Ok(Self {
            coupling_map,
            num_qubits: max_qubit + 1,
            bidirectional,
            name: None,
        })
    }

    /// Linear chain 0-1-2-...-N-1
    pub fn linear(n: usize) -> Self {
        Self {
            coupling_map: (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect(),
            num_qubits: n,
            bidirectional: true,
            name: Some(format!("linear_{}", n)),
        }
    }

    /// Ring 0-1-...-N-1-0
    pub fn ring(n: usize) -> Self {
        let mut coupling_map: Vec<(QubitId, QubitId)> =
            (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect();
        if n > 2 {
            coupling_map.push((n - 1, 0));
        }

        Self {
            coupling_map,
            num_qubits: n,
            bidirectional: true,
            name: Some(format!("ring_{}", n)),
        }
    }

    /// Set the name (consuming)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Device name, if set
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of coupling pairs
    pub fn num_edges(&self) -> usize {
        self.coupling_map.len()
    }

    /// Undirected edges as sorted `(low, high)` pairs without duplicates
    pub fn edges(&self) -> Vec<(QubitId, QubitId)> {
        self.coupling_map
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    // ========================================================================
    // Connectivity Queries
    // ========================================================================

    /// Check if two qubits are directly connected
    pub fn is_connected(&self, q1: QubitId, q2: QubitId) -> bool {
        if q1 == q2 {
            return true;
        }

        let has_forward = self.coupling_map.contains(&(q1, q2));
        if self.bidirectional {
            has_forward || self.coupling_map.contains(&(q2, q1))
        } else {
            has_forward
        }
    }

    /// Sorted neighbours of a qubit
    pub fn neighbors(&self, qubit: QubitId) -> Vec<QubitId> {
        let mut neighbors = BTreeSet::new();
        for &(q1, q2) in &self.coupling_map {
            if q1 == qubit {
                neighbors.insert(q2);
            }
            if self.bidirectional && q2 == qubit {
                neighbors.insert(q1);
            }
        }
        neighbors.into_iter().collect()
    }

    /// Number of connections
    pub fn degree(&self, qubit: QubitId) -> usize {
        self.neighbors(qubit).len()
    }

    /// Qubit with the most connections (lowest index on ties)
    pub fn max_degree_qubit(&self) -> Option<QubitId> {
        (0..self.num_qubits).max_by(|&a, &b| self.degree(a).cmp(&self.degree(b)).then(b.cmp(&a)))
    }

    fn adjacency_list(&self) -> Vec<Vec<QubitId>> {
        (0..self.num_qubits).map(|q| self.neighbors(q)).collect()
    }

    /// Shortest path between two qubits (BFS), endpoints included
    pub fn shortest_path(&self, start: QubitId, end: QubitId) -> Option<Vec<QubitId>> {
        if start >= self.num_qubits || end >= self.num_qubits {
            return None;
        }
        if start == end {
            return Some(vec![start]);
        }

        let adj = self.adjacency_list();
        let mut visited = vec![false; self.num_qubits];
        let mut parent: Vec<Option<QubitId>> = vec![None; self.num_qubits];
        let mut queue = VecDeque::new();

        visited[start] = true;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == end {
                let mut path = Vec::new();
                let mut node = Some(end);
                while let Some(n) = node {
                    path.push(n);
                    node = parent[n];
                }
                path.reverse();
                return Some(path);
            }

            for &neighbor in &adj[current] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    parent[neighbor] = Some(current);
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check that a circuit fits and only couples connected qubits
    pub fn validate_circuit(&self, circuit: &Circuit) -> QcResult<()> {
        if circuit.num_qubits() > self.num_qubits {
            return Err(QcError::QubitOutOfRange {
                qubit: circuit.num_qubits() - 1,
                max: self.num_qubits.saturating_sub(1),
            });
        }

        for gate in circuit.gates() {
            if gate.is_directive() || gate.qubits().len() < 2 {
                continue;
            }
            let qs = gate.qubits();
            for (i, &a) in qs.iter().enumerate() {
                for &b in &qs[i + 1..] {
                    if !self.is_connected(a, b) && !self.is_connected(b, a) {
                        return Err(QcError::TopologyViolation { q1: a, q2: b });
                    }
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // Chains
    // ========================================================================

    /// Simple path of `length` qubits, if one exists
    pub fn find_linear_chain(&self, length: usize) -> Option<Vec<QubitId>> {
        if length > self.num_qubits {
            return None;
        }
        if length <= 1 {
            return Some(vec![0]);
        }
        (0..self.num_qubits).find_map(|start| self.find_chain_from(start, length))
    }

    fn find_chain_from(&self, start: QubitId, length: usize) -> Option<Vec<QubitId>> {
        let mut chain = vec![start];
        let mut visited = HashSet::new();
        visited.insert(start);

        while chain.len() < length {
            let current = *chain.last()?;
            let next = self
                .neighbors(current)
                .into_iter()
                .find(|n| !visited.contains(n))?;
            chain.push(next);
            visited.insert(next);
        }

        Some(chain)
    }
}

// ============================================================================
// Display
// ============================================================================

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Topology({} qubits, {} edges{})",
            self.num_qubits,
            self.num_edges(),
            self.name
                .as_ref()
                .map(|n| format!(", {}", n))
                .unwrap_or_default()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
