//! Peephole optimisation
//!
//! Two local rewrites: adjacent inverse pairs cancel, and runs of
//! single-qubit gates collapse into one resynthesised run.

use crate::basis::{run_matrix, synthesize_1q};
use crate::target::Target;
use qcirc_core::{Gate, QubitId};
use std::collections::BTreeMap;

fn is_global(gate: &Gate) -> bool {
    matches!(gate, Gate::SaveStatevector) || matches!(gate, Gate::Barrier(qs) if qs.is_empty())
}

fn shares_wire(a: &Gate, b: &Gate) -> bool {
    if is_global(a) || is_global(b) {
        return true;
    }
    let qa = a.qubits();
    if b.qubits().iter().any(|q| qa.contains(q)) {
        return true;
    }
    let ca = a.clbits();
    b.clbits().iter().any(|c| ca.contains(c))
}

/// Remove gate pairs `g · g⁻¹` with nothing in between on their wires
pub fn cancel_inverse_pairs(gates: &[Gate]) -> Vec<Gate> {
    let mut out: Vec<Gate> = Vec::with_capacity(gates.len());

    for gate in gates {
        if gate.is_unitary() && !gate.is_composite() {
            if let Some(pos) = out.iter().rposition(|prev| shares_wire(prev, gate)) {
                let prev = &out[pos];
                if prev.qubits() == gate.qubits() && prev.inverse().as_ref() == Some(gate) {
                    out.remove(pos);
                    continue;
                }
            }
        }
        out.push(gate.clone());
    }

    out
}

/// Collapse each maximal run of single-qubit gates on a wire
///
/// A run is replaced only when the resynthesised form is shorter and
/// supported by `target`. Identity runs disappear.
pub fn merge_1q_runs(gates: &[Gate], target: &Target) -> Vec<Gate> {
    let mut out = Vec::with_capacity(gates.len());
    let mut pending: BTreeMap<QubitId, Vec<Gate>> = BTreeMap::new();

    let flush = |run: Vec<Gate>, q: QubitId, out: &mut Vec<Gate>| {
        if run.len() < 2 && !run.iter().any(|g| !target.supports(g.name())) {
            out.extend(run);
            return;
        }
        match run_matrix(&run) {
            Some(m) => {
                let synth = synthesize_1q(&m, q);
                let usable = synth.iter().all(|g| target.supports(g.name()));
                if usable && synth.len() < run.len() {
                    out.extend(synth);
                } else {
                    out.extend(run);
                }
            }
            None => out.extend(run),
        }
    };

    for gate in gates {
        if gate.is_single_qubit() {
            pending.entry(gate.qubits()[0]).or_default().push(gate.clone());
            continue;
        }

        let blocked: Vec<QubitId> = if is_global(gate) {
            pending.keys().copied().collect()
        } else {
            gate.qubits()
        };
        for q in blocked {
            if let Some(run) = pending.remove(&q) {
                flush(run, q, &mut out);
            }
        }
        out.push(gate.clone());
    }

    for (q, run) in std::mem::take(&mut pending) {
        flush(run, q, &mut out);
    }

    out
}

/// One optimisation round: merge runs, then cancel pairs
pub fn optimize_once(gates: &[Gate], target: &Target) -> Vec<Gate> {
    let merged = if target.is_universal() {
        gates.to_vec()
    } else {
        merge_1q_runs(gates, target)
    };
    cancel_inverse_pairs(&merged)
}

/// Repeat [`optimize_once`] until the gate count stops shrinking
pub fn optimize_to_fixed_point(gates: &[Gate], target: &Target, max_rounds: usize) -> Vec<Gate> {
    let mut current = gates.to_vec();
    for round in 0..max_rounds {
        let next = optimize_once(&current, target);
        let shrunk = next.len() < current.len();
        current = next;
        if !shrunk {
            log::debug!("optimisation converged after {} rounds", round + 1);
            break;
        }
    }
    current
}

// ============================================================================
// Tests
// ============================================================================
