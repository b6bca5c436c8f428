//! Quantum gate definitions for qcirc
//!
//! Every operation a circuit can hold is a [`Gate`] with its operands
//! embedded: unitary gates, measurement, reset, and the directives
//! (barrier, statevector snapshot). User-defined instructions appear as
//! [`Gate::Composite`].

use crate::composite::CompositeGate;
use crate::types::{Angle, ClbitId, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantum operation enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================
    /// Hadamard gate
    H(QubitId),

    /// Pauli-X gate (NOT)
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// S gate (sqrt(Z))
    S(QubitId),

    /// S-dagger gate
    Sdg(QubitId),

    /// T gate (fourth root of Z)
    T(QubitId),

    /// T-dagger gate
    Tdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    /// SX-dagger gate
    Sxdg(QubitId),

    /// Identity gate
    Id(QubitId),

    // ========================================================================
    // Single-Qubit Parameterized Gates
    // ========================================================================
    /// Rotation around X-axis
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    /// General single-qubit rotation U(θ, φ, λ)
    U(QubitId, Angle, Angle, Angle),

    /// Phase gate P(λ) = diag(1, e^{iλ})
    P(QubitId, Angle),

    // ========================================================================
    // Two-Qubit Gates
    // ========================================================================
    /// Controlled-NOT (control, target)
    Cnot(QubitId, QubitId),

    /// Controlled-Z
    Cz(QubitId, QubitId),

    /// Controlled-Y
    Cy(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    /// iSWAP gate
    ISwap(QubitId, QubitId),

    /// Controlled-Rz
    Crz(QubitId, QubitId, Angle),

    /// Controlled-Rx
    Crx(QubitId, QubitId, Angle),

    /// Controlled-Ry
    Cry(QubitId, QubitId, Angle),

    /// Echoed cross-resonance gate
    Ecr(QubitId, QubitId),

    // ========================================================================
    // Three-Qubit Gates
    // ========================================================================
    /// Toffoli (control, control, target)
    Ccx(QubitId, QubitId, QubitId),

    /// Fredkin (control, a, b)
    Cswap(QubitId, QubitId, QubitId),

    // ========================================================================
    // Non-Unitary Operations and Directives
    // ========================================================================
    /// Measure a qubit into a classical bit
    Measure(QubitId, ClbitId),

    /// Barrier over the listed qubits (empty = all qubits)
    Barrier(Vec<QubitId>),

    /// Reset qubit to |0⟩
    Reset(QubitId),

    /// Snapshot of the full statevector at this point
    SaveStatevector,

    /// User-defined instruction applied to the given qubits
    Composite(Box<CompositeGate>, Vec<QubitId>),
}

impl Gate {
    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Get qubits involved in this gate
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Sx(q)
            | Gate::Sxdg(q)
            | Gate::Id(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::U(q, _, _, _)
            | Gate::P(q, _)
            | Gate::Measure(q, _)
            | Gate::Reset(q) => vec![*q],

            Gate::Cnot(a, b)
            | Gate::Cz(a, b)
            | Gate::Cy(a, b)
            | Gate::Swap(a, b)
            | Gate::ISwap(a, b)
            | Gate::Ecr(a, b)
            | Gate::Crz(a, b, _)
            | Gate::Crx(a, b, _)
            | Gate::Cry(a, b, _) => vec![*a, *b],

            Gate::Ccx(a, b, c) | Gate::Cswap(a, b, c) => vec![*a, *b, *c],

            Gate::Barrier(qs) | Gate::Composite(_, qs) => qs.clone(),
            Gate::SaveStatevector => vec![],
        }
    }

    /// Classical bits written by this gate
    pub fn clbits(&self) -> Vec<ClbitId> {
        match self {
            Gate::Measure(_, c) => vec![*c],
            _ => vec![],
        }
    }

    /// Check if gate is single-qubit unitary
    pub fn is_single_qubit(&self) -> bool {
        matches!(
            self,
            Gate::H(_)
                | Gate::X(_)
                | Gate::Y(_)
                | Gate::Z(_)
                | Gate::S(_)
                | Gate::Sdg(_)
                | Gate::T(_)
                | Gate::Tdg(_)
                | Gate::Sx(_)
                | Gate::Sxdg(_)
                | Gate::Id(_)
                | Gate::Rx(_, _)
                | Gate::Ry(_, _)
                | Gate::Rz(_, _)
                | Gate::U(_, _, _, _)
                | Gate::P(_, _)
        )
    }

    /// Check if gate is two-qubit unitary
    pub fn is_two_qubit(&self) -> bool {
        matches!(
            self,
            Gate::Cnot(_, _)
                | Gate::Cz(_, _)
                | Gate::Cy(_, _)
                | Gate::Swap(_, _)
                | Gate::ISwap(_, _)
                | Gate::Ecr(_, _)
                | Gate::Crz(_, _, _)
                | Gate::Crx(_, _, _)
                | Gate::Cry(_, _, _)
        )
    }

    /// Check if gate is three-qubit unitary
    pub fn is_three_qubit(&self) -> bool {
        matches!(self, Gate::Ccx(_, _, _) | Gate::Cswap(_, _, _))
    }

    /// Check if gate is parameterized
    pub fn is_parameterized(&self) -> bool {
        !self.params().is_empty()
    }

    /// Check if gate is measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure(_, _))
    }

    /// Check if gate is a barrier
    pub fn is_barrier(&self) -> bool {
        matches!(self, Gate::Barrier(_))
    }

    /// Check if gate is a directive (no effect on the quantum state)
    pub fn is_directive(&self) -> bool {
        matches!(self, Gate::Barrier(_) | Gate::SaveStatevector)
    }

    /// Check if gate is a user-defined instruction
    pub fn is_composite(&self) -> bool {
        matches!(self, Gate::Composite(_, _))
    }

    /// Check if gate is unitary (composites are unitary by construction)
    pub fn is_unitary(&self) -> bool {
        self.is_single_qubit() || self.is_two_qubit() || self.is_three_qubit() || self.is_composite()
    }

    /// Get gate name
    pub fn name(&self) -> &str {
        match self {
            Gate::H(_) => "h",
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::S(_) => "s",
            Gate::Sdg(_) => "sdg",
            Gate::T(_) => "t",
            Gate::Tdg(_) => "tdg",
            Gate::Sx(_) => "sx",
            Gate::Sxdg(_) => "sxdg",
            Gate::Id(_) => "id",
            Gate::Rx(_, _) => "rx",
            Gate::Ry(_, _) => "ry",
            Gate::Rz(_, _) => "rz",
            Gate::U(_, _, _, _) => "u",
            Gate::P(_, _) => "p",
            Gate::Cnot(_, _) => "cx",
            Gate::Cz(_, _) => "cz",
            Gate::Cy(_, _) => "cy",
            Gate::Swap(_, _) => "swap",
            Gate::ISwap(_, _) => "iswap",
            Gate::Ecr(_, _) => "ecr",
            Gate::Crz(_, _, _) => "crz",
            Gate::Crx(_, _, _) => "crx",
            Gate::Cry(_, _, _) => "cry",
            Gate::Ccx(_, _, _) => "ccx",
            Gate::Cswap(_, _, _) => "cswap",
            Gate::Measure(_, _) => "measure",
            Gate::Barrier(_) => "barrier",
            Gate::Reset(_) => "reset",
            Gate::SaveStatevector => "save_statevector",
            Gate::Composite(def, _) => def.name(),
        }
    }

    /// Gate parameters in declaration order
    pub fn params(&self) -> Vec<Angle> {
        match self {
            Gate::Rx(_, t)
            | Gate::Ry(_, t)
            | Gate::Rz(_, t)
            | Gate::P(_, t)
            | Gate::Crz(_, _, t)
            | Gate::Crx(_, _, t)
            | Gate::Cry(_, _, t) => vec![*t],
            Gate::U(_, theta, phi, lambda) => vec![*theta, *phi, *lambda],
            _ => vec![],
        }
    }

    /// Return the same gate with every qubit operand passed through `f`
    pub fn remap<F: Fn(QubitId) -> QubitId>(&self, f: F) -> Gate {
        match self {
            Gate::H(q) => Gate::H(f(*q)),
            Gate::X(q) => Gate::X(f(*q)),
            Gate::Y(q) => Gate::Y(f(*q)),
            Gate::Z(q) => Gate::Z(f(*q)),
            Gate::S(q) => Gate::S(f(*q)),
            Gate::Sdg(q) => Gate::Sdg(f(*q)),
            Gate::T(q) => Gate::T(f(*q)),
            Gate::Tdg(q) => Gate::Tdg(f(*q)),
            Gate::Sx(q) => Gate::Sx(f(*q)),
            Gate::Sxdg(q) => Gate::Sxdg(f(*q)),
            Gate::Id(q) => Gate::Id(f(*q)),
            Gate::Rx(q, t) => Gate::Rx(f(*q), *t),
            Gate::Ry(q, t) => Gate::Ry(f(*q), *t),
            Gate::Rz(q, t) => Gate::Rz(f(*q), *t),
            Gate::U(q, a, b, c) => Gate::U(f(*q), *a, *b, *c),
            Gate::P(q, t) => Gate::P(f(*q), *t),
            Gate::Cnot(a, b) => Gate::Cnot(f(*a), f(*b)),
            Gate::Cz(a, b) => Gate::Cz(f(*a), f(*b)),
            Gate::Cy(a, b) => Gate::Cy(f(*a), f(*b)),
            Gate::Swap(a, b) => Gate::Swap(f(*a), f(*b)),
            Gate::ISwap(a, b) => Gate::ISwap(f(*a), f(*b)),
            Gate::Ecr(a, b) => Gate::Ecr(f(*a), f(*b)),
            Gate::Crz(a, b, t) => Gate::Crz(f(*a), f(*b), *t),
            Gate::Crx(a, b, t) => Gate::Crx(f(*a), f(*b), *t),
            Gate::Cry(a, b, t) => Gate::Cry(f(*a), f(*b), *t),
            Gate::Ccx(a, b, c) => Gate::Ccx(f(*a), f(*b), f(*c)),
            Gate::Cswap(a, b, c) => Gate::Cswap(f(*a), f(*b), f(*c)),
            Gate::Measure(q, c) => Gate::Measure(f(*q), *c),
            Gate::Barrier(qs) => Gate::Barrier(qs.iter().map(|&q| f(q)).collect()),
            Gate::Reset(q) => Gate::Reset(f(*q)),
            Gate::SaveStatevector => Gate::SaveStatevector,
            Gate::Composite(def, qs) => {
                Gate::Composite(def.clone(), qs.iter().map(|&q| f(q)).collect())
            }
        }
    }

    /// Inverse of a unitary gate, when it is another single `Gate`
    pub fn inverse(&self) -> Option<Gate> {
        let inv = match self {
            Gate::H(_)
            | Gate::X(_)
            | Gate::Y(_)
            | Gate::Z(_)
            | Gate::Id(_)
            | Gate::Cnot(_, _)
            | Gate::Cz(_, _)
            | Gate::Cy(_, _)
            | Gate::Swap(_, _)
            | Gate::Ecr(_, _)
            | Gate::Ccx(_, _, _)
            | Gate::Cswap(_, _, _) => self.clone(),
            Gate::S(q) => Gate::Sdg(*q),
            Gate::Sdg(q) => Gate::S(*q),
            Gate::T(q) => Gate::Tdg(*q),
            Gate::Tdg(q) => Gate::T(*q),
            Gate::Sx(q) => Gate::Sxdg(*q),
            Gate::Sxdg(q) => Gate::Sx(*q),
            Gate::Rx(q, t) => Gate::Rx(*q, -t),
            Gate::Ry(q, t) => Gate::Ry(*q, -t),
            Gate::Rz(q, t) => Gate::Rz(*q, -t),
            Gate::P(q, t) => Gate::P(*q, -t),
            Gate::U(q, theta, phi, lambda) => Gate::U(*q, -theta, -lambda, -phi),
            Gate::Crz(a, b, t) => Gate::Crz(*a, *b, -t),
            Gate::Crx(a, b, t) => Gate::Crx(*a, *b, -t),
            Gate::Cry(a, b, t) => Gate::Cry(*a, *b, -t),
            _ => return None,
        };
        Some(inv)
    }

    // ========================================================================
    // QASM
    // ========================================================================

    /// Convert to OpenQASM 2.0 using flat `q[i]` / `c[i]` operand names
    pub fn to_qasm(&self) -> String {
        self.to_qasm_with(&|q| format!("q[{}]", q), &|c| format!("c[{}]", c))
    }

    /// Convert to OpenQASM 2.0 with caller-supplied operand naming
    pub fn to_qasm_with(
        &self,
        qubit_name: &dyn Fn(QubitId) -> String,
        clbit_name: &dyn Fn(ClbitId) -> String,
    ) -> String {
        let operands = |qs: &[QubitId]| -> String {
            qs.iter()
                .map(|&q| qubit_name(q))
                .collect::<Vec<_>>()
                .join(",")
        };

        match self {
            Gate::Measure(q, c) => format!("measure {} -> {};", qubit_name(*q), clbit_name(*c)),
            Gate::Barrier(qs) if qs.is_empty() => "barrier q;".to_string(),
            Gate::SaveStatevector => "// save_statevector".to_string(),
            _ => {
                let params = self.params();
                let qubits = self.qubits();
                if params.is_empty() {
                    format!("{} {};", self.name(), operands(&qubits))
                } else {
                    let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
                    format!("{}({}) {};", self.name(), params.join(","), operands(&qubits))
                }
            }
        }
    }

    /// Get approximate gate time in nanoseconds
    pub fn gate_time_ns(&self) -> f64 {
        use crate::constants::physics::{gate_times_s, MEASUREMENT_NS, RESET_NS};

        let time_s = match self {
            Gate::H(_) => gate_times_s::H,
            Gate::X(_) => gate_times_s::X,
            Gate::Y(_) => gate_times_s::Y,
            Gate::Z(_) => gate_times_s::Z,
            Gate::S(_) | Gate::Sdg(_) => gate_times_s::S,
            Gate::T(_) | Gate::Tdg(_) => gate_times_s::T,
            Gate::Sx(_) | Gate::Sxdg(_) => gate_times_s::SX,
            Gate::Id(_) => gate_times_s::SX,
            Gate::Rx(_, _) => gate_times_s::RX,
            Gate::Ry(_, _) => gate_times_s::RY,
            Gate::Rz(_, _) | Gate::P(_, _) => gate_times_s::RZ,
            Gate::U(_, _, _, _) => gate_times_s::SX * 2.0,
            Gate::Cnot(_, _) | Gate::Ecr(_, _) => gate_times_s::CX,
            Gate::Cz(_, _) => gate_times_s::CZ,
            Gate::Cy(_, _) => gate_times_s::CX,
            Gate::Swap(_, _) | Gate::ISwap(_, _) => gate_times_s::SWAP,
            Gate::Crz(_, _, _) | Gate::Crx(_, _, _) | Gate::Cry(_, _, _) => gate_times_s::CX * 2.0,
            Gate::Ccx(_, _, _) => gate_times_s::CX * 6.0,
            Gate::Cswap(_, _, _) => gate_times_s::CX * 8.0,
            Gate::Measure(_, _) => MEASUREMENT_NS * 1e-9,
            Gate::Reset(_) => RESET_NS * 1e-9,
            Gate::Barrier(_) | Gate::SaveStatevector => 0.0,
            Gate::Composite(def, _) => {
                return def.gates().iter().map(|g| g.gate_time_ns()).sum();
            }
        };

        time_s * 1e9
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_qasm())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_qubits() {
        assert_eq!(Gate::H(0).qubits(), vec![0]);
        assert_eq!(Gate::Cnot(0, 1).qubits(), vec![0, 1]);
        assert_eq!(Gate::Ccx(0, 1, 2).qubits(), vec![0, 1, 2]);
        assert_eq!(Gate::Measure(3, 1).qubits(), vec![3]);
        assert_eq!(Gate::Measure(3, 1).clbits(), vec![1]);
        assert!(Gate::SaveStatevector.qubits().is_empty());
    }

    #[test]
    fn test_gate_classification() {
        assert!(Gate::H(0).is_single_qubit());
        assert!(!Gate::H(0).is_two_qubit());
        assert!(Gate::Cnot(0, 1).is_two_qubit());
        assert!(Gate::Cswap(0, 1, 2).is_three_qubit());
        assert!(Gate::Rx(0, 1.0).is_parameterized());
        assert!(!Gate::H(0).is_parameterized());
        assert!(Gate::Barrier(vec![]).is_directive());
        assert!(Gate::SaveStatevector.is_directive());
        assert!(!Gate::Measure(0, 0).is_unitary());
    }

    #[test]
    fn test_gate_to_qasm() {
        assert_eq!(Gate::H(0).to_qasm(), "h q[0];");
        assert_eq!(Gate::Cnot(0, 1).to_qasm(), "cx q[0],q[1];");
        assert_eq!(Gate::Rz(2, 0.5).to_qasm(), "rz(0.5) q[2];");
        assert_eq!(Gate::Measure(1, 0).to_qasm(), "measure q[1] -> c[0];");
        assert_eq!(Gate::Barrier(vec![0, 1]).to_qasm(), "barrier q[0],q[1];");
    }

    #[test]
    fn test_remap() {
        let g = Gate::Cnot(0, 1).remap(|q| q + 2);
        assert_eq!(g, Gate::Cnot(2, 3));
        let m = Gate::Measure(0, 4).remap(|_| 7);
        assert_eq!(m, Gate::Measure(7, 4));
    }

    #[test]
    fn test_inverse() {
        assert_eq!(Gate::S(0).inverse(), Some(Gate::Sdg(0)));
        assert_eq!(Gate::Rz(0, 0.3).inverse(), Some(Gate::Rz(0, -0.3)));
        assert_eq!(Gate::Cnot(0, 1).inverse(), Some(Gate::Cnot(0, 1)));
        assert_eq!(Gate::Reset(0).inverse(), None);
    }

    #[test]
    fn test_gate_time() {
        let h_time = Gate::H(0).gate_time_ns();
        let cx_time = Gate::Cnot(0, 1).gate_time_ns();
        assert!(cx_time > h_time);
        assert_eq!(Gate::Barrier(vec![0]).gate_time_ns(), 0.0);
    }
}
