//! # qcirc Core
//!
//! Registers, gates, circuits, user-defined instructions, coupling maps and
//! the text drawer shared by every qcirc crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use qcirc_core::prelude::*;
//!
//! let a = QuantumRegister::new(2, "a");
//! let mut circuit = Circuit::from_registers(vec![a.clone()], vec![]).unwrap();
//! circuit.h(a.bit(0)).unwrap();
//! circuit.cx(a.bit(0), a.bit(1)).unwrap();
//!
//! println!("{}", circuit.draw());
//! assert_eq!(circuit.depth(), 2);
//! ```
//!
//! ## Custom Instructions
//!
//! ```rust
//! use qcirc_core::prelude::*;
//!
//! let mut sub = Circuit::new(3, 0).with_name("toggle_cx");
//! sub.cx(0, 1).unwrap().cx(1, 2).unwrap();
//! let toggle = sub.to_instruction().unwrap();
//!
//! let mut host = Circuit::new(4, 0);
//! host.append(&toggle, [1, 2, 3]).unwrap();
//! assert_eq!(host.unrolled().unwrap().count_2q(), 2);
//! ```
//!
//! ## Topology Validation
//!
//! ```rust
//! use qcirc_core::prelude::*;
//!
//! let topo = Topology::linear(5);
//! let circuit = CircuitBuilder::new(5, 0).cx_chain().build().unwrap();
//! assert!(topo.validate_circuit(&circuit).is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types
pub mod types;

/// Constants
pub mod constants;

/// Error types
pub mod error;

/// Quantum and classical registers
pub mod register;

/// Quantum gates
pub mod gate;

/// User-defined instructions
pub mod composite;

/// Circuit structure
pub mod circuit;

/// Circuit builder
pub mod builder;

/// Qubit topology
pub mod topology;

/// Text drawer
pub mod drawer;

/// Gate matrices and state kernels
pub mod matrix;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use composite::CompositeGate;
pub use constants::{execution, physics, tolerance};
pub use drawer::DrawOptions;
pub use error::{QcError, QcResult};
pub use gate::Gate;
pub use register::{Clbit, ClbitRef, ClassicalRegister, QuantumRegister, Qubit, QubitRef};
pub use topology::Topology;
pub use types::{Angle, Bitstring, ClbitId, Counts, Probability, QubitId};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qcirc_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::Circuit;
    pub use crate::composite::CompositeGate;
    pub use crate::constants::{execution, physics};
    pub use crate::drawer::DrawOptions;
    pub use crate::error::{QcError, QcResult};
    pub use crate::gate::Gate;
    pub use crate::register::{ClassicalRegister, QuantumRegister};
    pub use crate::topology::Topology;
    pub use crate::types::{Angle, Bitstring, ClbitId, Counts, Probability, QubitId};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_register_circuit_then_add_creg() {
        let a = QuantumRegister::new(2, "a");
        let mut circuit = Circuit::from_registers(vec![a.clone()], vec![]).unwrap();
        circuit.h(a.bit(0)).unwrap().cx(a.bit(0), a.bit(1)).unwrap();

        let creg = ClassicalRegister::new(2, "creg");
        circuit.add_creg(creg.clone()).unwrap();
        for i in 0..2 {
            circuit.measure(a.bit(i), creg.bit(i)).unwrap();
        }

        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.count_measurements(), 2);
        assert_eq!(circuit.gates()[3], Gate::Measure(1, 1));
        assert!(circuit.draw().contains("creg_1: "));
    }

    #[test]
    fn test_simplified_notation() {
        let mut circuit = Circuit::new(2, 1);
        circuit.h(0).unwrap().cx(0, 1).unwrap().measure(1, 0).unwrap();
        assert_eq!(circuit.count_ops().get("measure"), Some(&1));
        assert_eq!(circuit.depth(), 3);
    }

    #[test]
    fn test_fan_out_with_measure_all() {
        let mut circuit = Circuit::new(5, 5);
        circuit.x(0).unwrap();
        for q in 0..4 {
            circuit.cx(0, q + 1).unwrap();
        }
        circuit.measure_all().unwrap();

        assert_eq!(circuit.num_clbits(), 10);
        assert_eq!(circuit.count_2q(), 4);
        assert_eq!(circuit.used_qubits().len(), 5);
        assert_eq!(circuit.two_qubit_pairs(), vec![(0, 1), (0, 2), (0, 3), (0, 4)]);

        // fan-out needs routing on a line
        assert!(Topology::linear(5).validate_circuit(&circuit).is_err());
        let star = Topology::from_coupling_map(vec![(0, 1), (0, 2), (0, 3), (0, 4)], true).unwrap();
        assert!(star.validate_circuit(&circuit).is_ok());
    }

    #[test]
    fn test_qasm_roundtrip() {
        let original = CircuitBuilder::new(3, 0)
            .h(0)
            .cx(0, 1)
            .rz(std::f64::consts::FRAC_PI_2, 0)
            .measure_all()
            .build()
            .unwrap();

        let parsed = Circuit::from_qasm(&original.to_qasm()).unwrap();
        assert_eq!(original.num_qubits(), parsed.num_qubits());
        assert_eq!(original.gates(), parsed.gates());
    }

    #[test]
    fn test_circuit_serde_roundtrip() {
        let circuit = CircuitBuilder::new(2, 2).h(0).cx(0, 1).build().unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(circuit, back);
    }

    #[test]
    fn test_probability_validation() {
        assert!(Probability::new(0.5).is_ok());
        assert!(Probability::new(1.1).is_err());
    }
}
