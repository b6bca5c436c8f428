//! SWAP insertion for restricted connectivity
//!
//! Gates arrive on logical qubits and leave on physical qubits. When a
//! two-qubit gate lands on an uncoupled pair, its first operand is walked
//! along the shortest path with SWAPs until it sits next to the second.

use crate::layout::Layout;
use crate::target::Target;
use qcirc_core::error::{QcError, QcResult};
use qcirc_core::Gate;

/// Outcome of routing a gate list
#[derive(Debug, Clone)]
pub struct RoutedGates {
    /// Gates on physical qubits, SWAPs included
    pub gates: Vec<Gate>,
    /// Layout after the last SWAP
    pub final_layout: Layout,
    /// Number of SWAPs inserted
    pub swaps_inserted: usize,
}

/// Map `gates` through `layout`, inserting SWAPs where the target needs them
///
/// Three-qubit gates must already be decomposed when the target has a
/// coupling map.
pub fn route(gates: &[Gate], layout: Layout, target: &Target) -> QcResult<RoutedGates> {
    let mut layout = layout;
    let mut out = Vec::with_capacity(gates.len());
    let mut swaps_inserted = 0;

    for gate in gates {
        let qs = gate.qubits();

        if qs.len() == 2 && !gate.is_directive() {
            let (p0, p1) = (layout.physical(qs[0]), layout.physical(qs[1]));
            if !target.is_coupled(p0, p1) {
                let topology = target
                    .topology
                    .as_ref()
                    .ok_or(QcError::PathNotFound(p0, p1))?;
                let path = topology
                    .shortest_path(p0, p1)
                    .ok_or(QcError::PathNotFound(p0, p1))?;

                for hop in path.windows(2).take(path.len().saturating_sub(2)) {
                    out.push(Gate::Swap(hop[0], hop[1]));
                    layout.swap_physical(hop[0], hop[1]);
                    swaps_inserted += 1;
                }
                log::debug!(
                    "routed {} on ({}, {}) with {} swaps",
                    gate.name(),
                    p0,
                    p1,
                    path.len().saturating_sub(2)
                );
            }
        } else if qs.len() > 2 && !gate.is_directive() {
            let ps: Vec<_> = qs.iter().map(|&q| layout.physical(q)).collect();
            for (i, &a) in ps.iter().enumerate() {
                for &b in &ps[i + 1..] {
                    if !target.is_coupled(a, b) {
                        return Err(QcError::TranspilerError(format!(
                            "'{}' spans uncoupled qubits {} and {}; decompose it before routing",
                            gate.name(),
                            a,
                            b
                        )));
                    }
                }
            }
        }

        out.push(gate.remap(|q| layout.physical(q)));
    }

    Ok(RoutedGates {
        gates: out,
        final_layout: layout,
        swaps_inserted,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_calibration::fake_devices;
    use qcirc_core::Topology;

    fn linear_target(n: usize) -> Target {
        Target::ideal(n).with_topology(Topology::linear(n))
    }

    #[test]
    fn test_adjacent_gates_untouched() {
        let gates = vec![Gate::H(0), Gate::Cnot(0, 1), Gate::Cnot(2, 1)];
        let routed = route(&gates, Layout::trivial(3, 3), &linear_target(3)).unwrap();
        assert_eq!(routed.gates, gates);
        assert_eq!(routed.swaps_inserted, 0);
    }

    #[test]
    fn test_swap_moves_first_operand() {
        let gates = vec![Gate::Cnot(0, 3), Gate::Measure(0, 0)];
        let routed = route(&gates, Layout::trivial(4, 4), &linear_target(4)).unwrap();

        assert_eq!(
            routed.gates,
            vec![
                Gate::Swap(0, 1),
                Gate::Swap(1, 2),
                Gate::Cnot(2, 3),
                Gate::Measure(2, 0),
            ]
        );
        assert_eq!(routed.swaps_inserted, 2);
        assert_eq!(routed.final_layout.physical(0), 2);
        assert_eq!(routed.final_layout.logical(0), Some(1));
    }

    #[test]
    fn test_every_routed_gate_is_coupled() {
        let target = Target::from_calibration(&fake_devices::belem());
        let gates: Vec<_> = (1..5).map(|t| Gate::Cnot(0, t)).collect();
        let routed = route(&gates, Layout::trivial(5, 5), &target).unwrap();

        for g in &routed.gates {
            let qs = g.qubits();
            assert!(target.is_coupled(qs[0], qs[1]), "{:?}", g);
        }
    }

    #[test]
    fn test_unrouted_three_qubit_gate_rejected() {
        let err = route(&[Gate::Ccx(0, 1, 3)], Layout::trivial(4, 4), &linear_target(4));
        assert!(matches!(err, Err(QcError::TranspilerError(_))));
    }

    #[test]
    fn test_no_topology_only_relabels() {
        let layout = Layout::from_mapping(vec![2, 0, 1], 3).unwrap();
        let routed = route(&[Gate::Cnot(0, 1), Gate::Barrier(vec![0, 2])], layout, &Target::ideal(3)).unwrap();
        assert_eq!(routed.gates, vec![Gate::Cnot(2, 0), Gate::Barrier(vec![2, 1])]);
    }
}
