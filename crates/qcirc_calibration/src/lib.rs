//! # qcirc Calibration
//!
//! Device calibration snapshots and a catalog of fake 5-qubit devices.
//!
//! ## Quick Start
//!
//! ```rust
//! use qcirc_calibration::prelude::*;
//!
//! let info = fake_devices::by_name("fake_athens").unwrap();
//! assert_eq!(info.num_qubits(), 5);
//!
//! // Derived views used by the noisy backend and the transpiler
//! let noise = info.to_noise_vectors();
//! let topology = info.to_topology();
//! assert!(topology.is_connected(2, 3));
//! println!("best qubits: {:?}", noise.best_qubits(3));
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Calibration snapshots
pub mod calibration_info;

/// Fake device catalog
pub mod fake_devices;

// ============================================================================
// Re-exports
// ============================================================================

pub use calibration_info::{CalibrationInfo, EdgeError, DEFAULT_BASIS};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::calibration_info::{CalibrationInfo, EdgeError};
    pub use crate::fake_devices;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qcirc_core::CircuitBuilder;

    #[test]
    fn test_fake_device_pipeline() {
        let info = fake_devices::manila();
        let model = info.to_noise_model();
        assert!(model.validate().is_ok());
        assert!(model.gate_error_2q() > model.gate_error_1q());

        let vectors = info.to_noise_vectors();
        assert_eq!(vectors.num_qubits(), 5);
        for q in 0..5 {
            assert!(vectors.get(q).unwrap().gate_error_2q > 0.0);
        }
    }

    #[test]
    fn test_topology_rejects_fan_out() {
        let circuit = CircuitBuilder::new(5, 0)
            .cx(0, 1)
            .cx(0, 2)
            .build()
            .unwrap();
        assert!(fake_devices::athens().to_topology().validate_circuit(&circuit).is_err());
    }

    #[test]
    fn test_gate_times_from_snapshot() {
        let times = fake_devices::lima().to_gate_times();
        assert_eq!(times.two_qubit_ns, 448.0);
        assert_eq!(times.override_for("rz"), Some(0.0));
    }

    #[test]
    fn test_best_linear_chain() {
        let chain = fake_devices::athens().best_linear_chain(5).unwrap();
        assert_eq!(chain.len(), 5);
    }

    #[test]
    fn test_json_roundtrip() {
        let info = fake_devices::belem();
        let json = serde_json::to_string_pretty(&info).unwrap();
        let back: CalibrationInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backend_name, info.backend_name);
        assert_eq!(back.coupling_map, info.coupling_map);
        assert_eq!(back.timestamp, info.timestamp);
        assert!((back.error_2q(1, 3).unwrap() - 0.0121).abs() < 1e-12);
    }
}
