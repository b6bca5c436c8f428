//! Logical to physical qubit assignment

use crate::target::Target;
use qcirc_core::error::{QcError, QcResult};
use qcirc_core::{Circuit, QubitId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// How the initial layout is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutMethod {
    /// Logical qubit `i` on physical qubit `i`
    Trivial,
    /// Connected set grown from the highest-degree physical qubit
    Dense,
}

/// Bijection between logical qubits and a subset of physical qubits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// `l2p[logical] = physical`
    l2p: Vec<QubitId>,
    /// `p2l[physical] = Some(logical)`
    p2l: Vec<Option<QubitId>>,
}

impl Layout {
    /// Identity layout of `num_logical` qubits on `num_physical`
    pub fn trivial(num_logical: usize, num_physical: usize) -> Self {
        let mut p2l = vec![None; num_physical.max(num_logical)];
        for (l, slot) in p2l.iter_mut().enumerate().take(num_logical) {
            *slot = Some(l);
        }
        Self {
            l2p: (0..num_logical).collect(),
            p2l,
        }
    }

    /// Layout from an explicit `logical -> physical` list
    pub fn from_mapping(l2p: Vec<QubitId>, num_physical: usize) -> QcResult<Self> {
        let mut p2l = vec![None; num_physical];
        for (l, &p) in l2p.iter().enumerate() {
            let slot = p2l.get_mut(p).ok_or(QcError::QubitOutOfRange {
                qubit: p,
                max: num_physical.saturating_sub(1),
            })?;
            if slot.is_some() {
                return Err(QcError::DuplicateQubit(p));
            }
            *slot = Some(l);
        }
        Ok(Self { l2p, p2l })
    }

    /// Physical qubit hosting a logical qubit
    pub fn physical(&self, logical: QubitId) -> QubitId {
        self.l2p[logical]
    }

    /// Logical qubit hosted on a physical qubit, if any
    pub fn logical(&self, physical: QubitId) -> Option<QubitId> {
        self.p2l.get(physical).copied().flatten()
    }

    /// Number of logical qubits
    pub fn num_logical(&self) -> usize {
        self.l2p.len()
    }

    /// Number of physical qubits
    pub fn num_physical(&self) -> usize {
        self.p2l.len()
    }

    /// Exchange the contents of two physical qubits
    pub fn swap_physical(&mut self, a: QubitId, b: QubitId) {
        let (la, lb) = (self.p2l[a], self.p2l[b]);
        self.p2l[a] = lb;
        self.p2l[b] = la;
        if let Some(l) = la {
            self.l2p[l] = b;
        }
        if let Some(l) = lb {
            self.l2p[l] = a;
        }
    }

    /// `logical -> physical` as a vector
    pub fn to_vec(&self) -> Vec<QubitId> {
        self.l2p.clone()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<_> = self
            .l2p
            .iter()
            .enumerate()
            .map(|(l, p)| format!("{}->{}", l, p))
            .collect();
        write!(f, "Layout[{}]", pairs.join(", "))
    }
}

// ============================================================================
// Layout Selection
// ============================================================================

/// Choose an initial layout for `circuit` on `target`
pub fn choose_layout(method: LayoutMethod, circuit: &Circuit, target: &Target) -> QcResult<Layout> {
    let n = circuit.num_qubits();
    if n > target.num_qubits {
        return Err(QcError::TargetTooSmall {
            target: target.name.clone(),
            needed: n,
            available: target.num_qubits,
        });
    }

    match (method, &target.topology) {
        (LayoutMethod::Dense, Some(topology)) if n > 0 => {
            let start = topology.max_degree_qubit().unwrap_or(0);
            let physical = bfs_region(topology, start, n);
            if physical.len() < n {
                log::warn!(
                    "dense layout found only {} connected qubits, falling back to trivial",
                    physical.len()
                );
                return Ok(Layout::trivial(n, target.num_qubits));
            }

            // Busiest logical qubits take the best-connected physical slots
            let mut logical: Vec<QubitId> = (0..n).collect();
            let activity = interaction_counts(circuit);
            logical.sort_by(|a, b| activity[*b].cmp(&activity[*a]).then(a.cmp(b)));

            let mut l2p = vec![0; n];
            for (l, p) in logical.into_iter().zip(physical) {
                l2p[l] = p;
            }
            Layout::from_mapping(l2p, target.num_qubits)
        }
        _ => Ok(Layout::trivial(n, target.num_qubits)),
    }
}

/// Breadth-first region of up to `size` qubits around `start`
fn bfs_region(topology: &qcirc_core::Topology, start: QubitId, size: usize) -> Vec<QubitId> {
    let mut order = Vec::with_capacity(size);
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([start]);
    seen.insert(start);

    while let Some(q) = queue.pop_front() {
        order.push(q);
        if order.len() == size {
            break;
        }
        for nb in topology.neighbors(q) {
            if seen.insert(nb) {
                queue.push_back(nb);
            }
        }
    }
    order
}

/// Number of multi-qubit gates touching each logical qubit
fn interaction_counts(circuit: &Circuit) -> Vec<usize> {
    let mut counts = vec![0; circuit.num_qubits()];
    for gate in circuit.gates() {
        if gate.is_directive() {
            continue;
        }
        let qs = gate.qubits();
        if qs.len() >= 2 {
            for q in qs {
                counts[q] += 1;
            }
        }
    }
    counts
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_calibration::fake_devices;
    use qcirc_core::CircuitBuilder;

    #[test]
    fn test_trivial_layout() {
        let layout = Layout::trivial(3, 5);
        assert_eq!(layout.physical(2), 2);
        assert_eq!(layout.logical(4), None);
        assert_eq!(layout.num_physical(), 5);
    }

    #[test]
    fn test_swap_physical() {
        let mut layout = Layout::trivial(2, 3);
        layout.swap_physical(1, 2);
        assert_eq!(layout.physical(1), 2);
        assert_eq!(layout.logical(1), None);
        assert_eq!(layout.logical(2), Some(1));
    }

    #[test]
    fn test_from_mapping_rejects_duplicates() {
        assert!(Layout::from_mapping(vec![1, 1], 3).is_err());
        assert!(Layout::from_mapping(vec![0, 7], 3).is_err());
        assert_eq!(Layout::from_mapping(vec![2, 0], 3).unwrap().logical(2), Some(0));
    }

    #[test]
    fn test_dense_layout_puts_hub_on_high_degree() {
        let circuit = CircuitBuilder::new(4, 0)
            .cx(2, 0)
            .cx(2, 1)
            .cx(2, 3)
            .build()
            .unwrap();
        let target = Target::from_calibration(&fake_devices::belem());
        let layout = choose_layout(LayoutMethod::Dense, &circuit, &target).unwrap();

        // belem qubit 1 has degree 3
        assert_eq!(layout.physical(2), 1);
        for l in 0..4 {
            assert!(target.is_coupled(layout.physical(2), layout.physical(l)) || l == 2);
        }
    }

    #[test]
    fn test_too_many_qubits() {
        let circuit = Circuit::new(6, 0);
        let target = Target::from_calibration(&fake_devices::lima());
        assert!(matches!(
            choose_layout(LayoutMethod::Trivial, &circuit, &target),
            Err(QcError::TargetTooSmall { needed: 6, .. })
        ));
    }
}
