//! Circuit builder for qcirc
//!
//! Fluent, consuming wrapper around [`Circuit`]. The first failing operation
//! is remembered and returned by [`CircuitBuilder::build`]; later operations
//! are skipped.

use crate::circuit::Circuit;
use crate::composite::CompositeGate;
use crate::error::{QcError, QcResult};
use crate::register::{ClassicalRegister, ClbitRef, QuantumRegister, QubitRef};
use crate::types::{Angle, QubitId};

/// Fluent circuit builder (consuming self pattern)
pub struct CircuitBuilder {
    circuit: Circuit,
    error: Option<QcError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Builder over `Circuit::new(num_qubits, num_clbits)`
    pub fn new(num_qubits: usize, num_clbits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits, num_clbits),
            error: None,
        }
    }

    /// Builder over explicit registers
    pub fn from_registers(qregs: Vec<QuantumRegister>, cregs: Vec<ClassicalRegister>) -> Self {
        match Circuit::from_registers(qregs, cregs) {
            Ok(circuit) => Self {
                circuit,
                error: None,
            },
            Err(e) => Self {
                circuit: Circuit::new(0, 0),
                error: Some(e),
            },
        }
    }

    /// Set the circuit name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.circuit.set_name(name);
        self
    }

    fn apply<F>(mut self, op: F) -> Self
    where
        F: FnOnce(&mut Circuit) -> QcResult<()>,
    {
        if self.error.is_none() {
            if let Err(e) = op(&mut self.circuit) {
                self.error = Some(e);
            }
        }
        self
    }

    // ========================================================================
    // Gates
    // ========================================================================

    /// Add Hadamard gate
    pub fn h(self, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.h(q).map(|_| ()))
    }

    /// Add Pauli-X gate
    pub fn x(self, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.x(q).map(|_| ()))
    }

    /// Add Pauli-Y gate
    pub fn y(self, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.y(q).map(|_| ()))
    }

    /// Add Pauli-Z gate
    pub fn z(self, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.z(q).map(|_| ()))
    }

    /// Add S gate
    pub fn s(self, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.s(q).map(|_| ()))
    }

    /// Add T gate
    pub fn t(self, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.t(q).map(|_| ()))
    }

    /// Add √X gate
    pub fn sx(self, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.sx(q).map(|_| ()))
    }

    /// Add Rx rotation
    pub fn rx(self, theta: Angle, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.rx(theta, q).map(|_| ()))
    }

    /// Add Ry rotation
    pub fn ry(self, theta: Angle, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.ry(theta, q).map(|_| ()))
    }

    /// Add Rz rotation
    pub fn rz(self, theta: Angle, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.rz(theta, q).map(|_| ()))
    }

    /// Add CNOT gate
    pub fn cx(self, control: impl Into<QubitRef>, target: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.cx(control, target).map(|_| ()))
    }

    /// Add CZ gate
    pub fn cz(self, control: impl Into<QubitRef>, target: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.cz(control, target).map(|_| ()))
    }

    /// Add SWAP gate
    pub fn swap(self, a: impl Into<QubitRef>, b: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.swap(a, b).map(|_| ()))
    }

    /// Add Toffoli gate
    pub fn ccx(
        self,
        c1: impl Into<QubitRef>,
        c2: impl Into<QubitRef>,
        target: impl Into<QubitRef>,
    ) -> Self {
        self.apply(|c| c.ccx(c1, c2, target).map(|_| ()))
    }

    /// Add measurement
    pub fn measure(self, q: impl Into<QubitRef>, c: impl Into<ClbitRef>) -> Self {
        self.apply(|circ| circ.measure(q, c).map(|_| ()))
    }

    /// Barrier plus a `meas` register measuring every qubit
    pub fn measure_all(self) -> Self {
        self.apply(|c| c.measure_all().map(|_| ()))
    }

    /// Barrier on all qubits
    pub fn barrier(self) -> Self {
        self.apply(|c| c.barrier_all().map(|_| ()))
    }

    /// Add reset to |0⟩
    pub fn reset(self, q: impl Into<QubitRef>) -> Self {
        self.apply(|c| c.reset(q).map(|_| ()))
    }

    /// Snapshot the statevector at this point
    pub fn save_statevector(self) -> Self {
        self.apply(|c| c.save_statevector().map(|_| ()))
    }

    /// Apply a user-defined instruction
    pub fn append(self, instruction: &CompositeGate, qubits: &[QubitId]) -> Self {
        self.apply(|c| c.append(instruction, qubits.iter().copied()).map(|_| ()))
    }

    // ========================================================================
    // Layer Operations
    // ========================================================================

    /// Add Hadamard layer on all qubits
    pub fn h_layer(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n).fold(self, |b, q| b.h(q))
    }

    /// CX between each neighbouring pair (0,1), (1,2), ...
    pub fn cx_chain(self) -> Self {
        let n = self.circuit.num_qubits();
        (0..n.saturating_sub(1)).fold(self, |b, q| b.cx(q, q + 1))
    }

    /// GHZ preparation: H on qubit 0 followed by a CX chain
    pub fn ghz(self) -> Self {
        if self.circuit.num_qubits() == 0 {
            return self;
        }
        self.h(0).cx_chain()
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Finish building, returning the first recorded error if any
    pub fn build(self) -> QcResult<Circuit> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.circuit),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
