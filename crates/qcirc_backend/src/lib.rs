//! # qcirc Backend
//!
//! Circuit execution: a dense statevector, an ideal/noisy shot simulator,
//! fake devices built from calibration snapshots, and lookup by name.
//!
//! ## Quick Start
//!
//! ```rust
//! use qcirc_backend::prelude::*;
//! use qcirc_core::CircuitBuilder;
//!
//! let backend = get_backend_seeded("aer_simulator", Some(42)).unwrap();
//!
//! let circuit = CircuitBuilder::new(2, 2)
//!     .h(0)
//!     .cx(0, 1)
//!     .measure(0, 0)
//!     .measure(1, 1)
//!     .build()
//!     .unwrap();
//!
//! let result = backend.execute(&circuit, 1000).unwrap();
//! assert_eq!(result.total_counts(), 1000);
//! println!("{:?}", result.get_counts());
//! ```
//!
//! ## Noisy Devices
//!
//! ```rust
//! use qcirc_backend::prelude::*;
//! use qcirc_core::CircuitBuilder;
//! use qcirc_transpiler::transpile;
//!
//! let device = FakeBackend::athens().with_seed(7);
//! let circuit = CircuitBuilder::new(3, 0).h(0).cx(0, 2).measure_all().build().unwrap();
//!
//! let compiled = transpile(&circuit, &device.target()).unwrap();
//! let result = device.execute(&compiled.circuit, 1000).unwrap();
//! println!("{}", result);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Dense statevector
pub mod statevector;

/// Execution results and the backend trait
pub mod execution;

/// Ideal and noisy simulator
pub mod simulator;

/// Fake device backends
pub mod fake;

/// Backend lookup by name
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use execution::{Backend, ExecutionMetadata, ExecutionResult};
pub use fake::FakeBackend;
pub use registry::{available_backends, get_backend, get_backend_seeded};
pub use simulator::SimulatorBackend;
pub use statevector::Statevector;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qcirc_backend::prelude::*;
    //! ```

    pub use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
    pub use crate::fake::FakeBackend;
    pub use crate::registry::{available_backends, get_backend, get_backend_seeded};
    pub use crate::simulator::SimulatorBackend;
    pub use crate::statevector::Statevector;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qcirc_core::{Circuit, CircuitBuilder, ClassicalRegister, QuantumRegister};
    use qcirc_transpiler::{transpile, Transpiler};
    use std::f64::consts::FRAC_1_SQRT_2;

    fn bell_on_register() -> Circuit {
        let a = QuantumRegister::new(2, "a");
        let mut circuit = Circuit::from_registers(vec![a.clone()], vec![]).unwrap();
        circuit.h(a.bit(0)).unwrap();
        circuit.cx(a.bit(0), a.bit(1)).unwrap();
        circuit
    }

    #[test]
    fn test_bell_statevector() {
        let mut circuit = bell_on_register();
        circuit.save_statevector().unwrap();

        let backend = get_backend_seeded("aer_simulator", Some(1)).unwrap();
        let result = backend.execute(&circuit, 1).unwrap();
        let sv = result.get_statevector().unwrap();

        assert!((sv.amplitudes()[0].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((sv.amplitudes()[3].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!(sv.amplitudes()[1].norm() < 1e-12);
        assert!(sv.amplitudes()[2].norm() < 1e-12);
    }

    #[test]
    fn test_bell_counts_after_save() {
        let mut circuit = bell_on_register();
        circuit.save_statevector().unwrap();
        let creg = ClassicalRegister::new(2, "creg");
        circuit.add_creg(creg.clone()).unwrap();
        circuit.measure(0, creg.bit(0)).unwrap();
        circuit.measure(1, creg.bit(1)).unwrap();

        let backend = get_backend_seeded("aer_simulator", Some(2024)).unwrap();
        let result = backend.execute(&circuit, 8192).unwrap();

        assert_eq!(result.total_counts(), 8192);
        assert_eq!(result.counts.len(), 2);
        let p00 = result.probability("00");
        assert!((p00 - 0.5).abs() < 0.03, "P(00) = {}", p00);
        assert!(result.statevector.is_some());
    }

    #[test]
    fn test_fan_out_on_fake_athens() {
        let mut circuit = Circuit::new(5, 5);
        circuit.x(0).unwrap();
        for q in 0..4 {
            circuit.cx(0, q + 1).unwrap();
        }
        circuit.measure_all().unwrap();

        let device = FakeBackend::athens().with_seed(5);
        assert!(device.execute(&circuit, 100).is_err());

        let compiled = transpile(&circuit, &device.target()).unwrap();
        let result = device.execute(&compiled.circuit, 4096).unwrap();

        assert_eq!(result.total_counts(), 4096);
        assert!(result.counts.keys().all(|k| k.len() == 11 && k.ends_with(" 00000")));
        let (top, count) = result.most_frequent().unwrap();
        assert_eq!(top, "11111 00000");
        assert!(count < 4096, "a noisy device should not be perfect");

        let meas = result.marginal_counts("meas").unwrap();
        assert_eq!(meas.values().sum::<u64>(), 4096);
    }

    #[test]
    fn test_noise_degrades_ghz() {
        let circuit = CircuitBuilder::new(4, 0).ghz().measure_all().build().unwrap();
        let correct = |r: &ExecutionResult| r.probability("0000") + r.probability("1111");

        let ideal = SimulatorBackend::ideal(4).with_seed(42).execute(&circuit, 2000).unwrap();
        let noisy = SimulatorBackend::from_depol(4, 0.02)
            .unwrap()
            .with_seed(42)
            .execute(&circuit, 2000)
            .unwrap();

        assert!((correct(&ideal) - 1.0).abs() < 1e-12);
        assert!(correct(&noisy) < correct(&ideal));
    }

    #[test]
    fn test_batch_execution() {
        let backend = SimulatorBackend::ideal(3).with_seed(42);
        let circuits: Vec<_> = (0..5)
            .map(|i| {
                CircuitBuilder::new(2, 0)
                    .h(0)
                    .rz(i as f64 * 0.2, 0)
                    .measure_all()
                    .build()
                    .unwrap()
            })
            .collect();

        let results = backend.execute_batch(&circuits, 100).unwrap();
        assert_eq!(results.len(), 5);
        for result in &results {
            assert_eq!(result.shots, 100);
            assert_eq!(result.total_counts(), 100);
        }
    }

    #[test]
    fn test_transpiled_composite_matches_ideal() {
        let mut sub = Circuit::new(3, 0).with_name("toggle_cx");
        sub.cx(0, 1).unwrap().cx(1, 2).unwrap().cx(0, 1).unwrap().cx(1, 2).unwrap();
        let toggle = sub.to_instruction().unwrap();

        let mut host = Circuit::new(4, 0);
        host.x(1).unwrap();
        host.append(&toggle, [1, 2, 3]).unwrap();
        host.measure_all().unwrap();

        let ideal = get_backend_seeded("aer_simulator", Some(3)).unwrap();
        let expected = ideal.execute(&host, 200).unwrap();
        // x(1) then toggle leaves q1 and q3 set
        assert_eq!(expected.counts.get("1010"), Some(&200));

        let device = FakeBackend::manila();
        let compiled = Transpiler::new(device.target())
            .with_optimization_level(2)
            .run(&host)
            .unwrap();
        let result = ideal.execute(&compiled.circuit, 200).unwrap();
        assert_eq!(result.counts.get("1010"), Some(&200));
    }
}
