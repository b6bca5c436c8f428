//! User-defined instructions
//!
//! A [`CompositeGate`] is a named, reusable block of unitary gates acting on
//! local qubits `0..num_qubits`. It is produced by
//! [`Circuit::to_instruction`](crate::circuit::Circuit::to_instruction) and
//! placed into another circuit with
//! [`Circuit::append`](crate::circuit::Circuit::append).

use crate::error::{QcError, QcResult};
use crate::gate::Gate;
use crate::types::QubitId;
use serde::{Deserialize, Serialize};

/// Named block of gates acting on local qubits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeGate {
    name: String,
    num_qubits: usize,
    gates: Vec<Gate>,
}

impl CompositeGate {
    /// Create a composite from a gate body.
    ///
    /// The body may only contain unitary gates (and barriers) on local
    /// qubits below `num_qubits`.
    pub fn new(name: impl Into<String>, num_qubits: usize, gates: Vec<Gate>) -> QcResult<Self> {
        let name = name.into();
        for gate in &gates {
            if !gate.is_unitary() && !gate.is_barrier() {
                return Err(QcError::NonUnitaryInstruction(format!(
                    "'{}' contains non-unitary operation '{}'",
                    name,
                    gate.name()
                )));
            }
            for q in gate.qubits() {
                if q >= num_qubits {
                    return Err(QcError::GateQubitMismatch {
                        qubit: q,
                        num_qubits,
                    });
                }
            }
        }
        Ok(Self {
            name,
            num_qubits,
            gates,
        })
    }

    /// Instruction name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits the instruction acts on
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Body gates on local qubits
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Body gates mapped onto `qubits`, with nested composites flattened
    pub fn unroll(&self, qubits: &[QubitId]) -> QcResult<Vec<Gate>> {
        if qubits.len() != self.num_qubits {
            return Err(QcError::ArityMismatch {
                name: self.name.clone(),
                expected: self.num_qubits,
                got: qubits.len(),
            });
        }

        let mut out = Vec::with_capacity(self.gates.len());
        for gate in &self.gates {
            let mapped = gate.remap(|q| qubits[q]);
            match mapped {
                Gate::Composite(inner, operands) => out.extend(inner.unroll(&operands)?),
                Gate::Barrier(_) => {}
                other => out.push(other),
            }
        }
        Ok(out)
    }

    /// Number of primitive gates after full unrolling
    pub fn size(&self) -> usize {
        self.gates
            .iter()
            .map(|g| match g {
                Gate::Composite(inner, _) => inner.size(),
                Gate::Barrier(_) => 0,
                _ => 1,
            })
            .sum()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn toggle() -> CompositeGate {
        CompositeGate::new(
            "toggle_cx",
            3,
            vec![
                Gate::Cnot(0, 1),
                Gate::Cnot(1, 2),
                Gate::Cnot(0, 1),
                Gate::Cnot(1, 2),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_unroll_maps_operands() {
        let gates = toggle().unroll(&[1, 2, 3]).unwrap();
        assert_eq!(gates.len(), 4);
        assert_eq!(gates[0], Gate::Cnot(1, 2));
        assert_eq!(gates[1], Gate::Cnot(2, 3));
    }

    #[test]
    fn test_unroll_arity() {
        let err = toggle().unroll(&[0, 1]).unwrap_err();
        assert!(matches!(err, QcError::ArityMismatch { expected: 3, got: 2, .. }));
    }

    #[test]
    fn test_nested_unroll() {
        let outer = CompositeGate::new(
            "outer",
            4,
            vec![Gate::H(0), Gate::Composite(Box::new(toggle()), vec![3, 2, 1])],
        )
        .unwrap();
        let gates = outer.unroll(&[0, 1, 2, 3]).unwrap();
        assert_eq!(gates.len(), 5);
        assert_eq!(gates[1], Gate::Cnot(3, 2));
        assert_eq!(outer.size(), 5);
    }

    #[test]
    fn test_rejects_measurement() {
        let err = CompositeGate::new("m", 1, vec![Gate::Measure(0, 0)]).unwrap_err();
        assert!(matches!(err, QcError::NonUnitaryInstruction(_)));
    }
}
