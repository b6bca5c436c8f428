//! # qcirc Noise
//!
//! Noise models, per-qubit noise vectors and gate timing for simulated
//! NISQ devices.
//!
//! ## Quick Start
//!
//! ```rust
//! use qcirc_noise::prelude::*;
//!
//! let model = NoiseModel::from_depol(0.02).unwrap();
//! let fidelity = model.estimate_circuit_fidelity(10, 6, 5, 1.0);
//! assert!(fidelity < 1.0);
//!
//! // Jump probabilities for a 300ns CX on one qubit
//! let nv = NoiseVector::from_noise_model(0, &model);
//! let params = nv.relaxation(300.0);
//! assert!(params.gamma > 0.0);
//! ```
//!
//! ## Gate Timing
//!
//! ```rust
//! use qcirc_noise::prelude::*;
//! use qcirc_core::CircuitBuilder;
//!
//! let times = GateTimes::default();
//! let circuit = CircuitBuilder::new(5, 0).ghz().measure_all().build().unwrap();
//! let (duration, _) = times.circuit_duration_asap(&circuit);
//! assert!(duration > 0.0);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Uniform noise model
pub mod noise_model;

/// Per-qubit noise vectors and relaxation channels
pub mod noise_vector;

/// Gate timing configuration
pub mod gate_times;

// ============================================================================
// Re-exports
// ============================================================================

pub use gate_times::GateTimes;
pub use noise_model::NoiseModel;
pub use noise_vector::{NoiseVector, NoiseVectorSet, RelaxationParams};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::gate_times::GateTimes;
    pub use crate::noise_model::NoiseModel;
    pub use crate::noise_vector::{NoiseVector, NoiseVectorSet, RelaxationParams};
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qcirc_core::CircuitBuilder;

    #[test]
    fn test_model_to_vector_set() {
        let model = NoiseModel::ibm_typical();
        let vectors = NoiseVectorSet::from_noise_model(5, &model);

        assert_eq!(vectors.num_qubits(), 5);
        assert!((vectors.avg_t1() - model.t1_us()).abs() < 1e-10);
        assert_eq!(vectors.to_noise_model().t2_us(), model.t2_us());
    }

    #[test]
    fn test_fan_out_timing() {
        let times = GateTimes::default();
        let circuit = CircuitBuilder::new(5, 0)
            .x(0)
            .cx(0, 1)
            .cx(0, 2)
            .cx(0, 3)
            .cx(0, 4)
            .measure_all()
            .build()
            .unwrap();

        let (duration, per_qubit) = times.circuit_duration_asap(&circuit);
        // x, four serial cx on q0, then barrier and a measurement
        assert!((duration - (35.0 + 4.0 * 300.0 + 5000.0)).abs() < 1e-9);
        assert_eq!(per_qubit.len(), 5);
    }

    #[test]
    fn test_relaxation_grows_with_duration() {
        let nv = NoiseVector::from_noise_model(0, &NoiseModel::ibm_typical());
        let short = nv.relaxation(35.0);
        let long = nv.relaxation(5000.0);
        assert!(short.gamma < long.gamma);
        assert!(short.p_phase < long.p_phase);
    }

    #[test]
    fn test_fidelity_estimation() {
        let model = NoiseModel::new(100.0, 60.0, 0.001, 0.01, 0.01).unwrap();
        let fidelity = model.estimate_circuit_fidelity(5, 2, 3, 0.1);
        assert!(fidelity > 0.9 && fidelity < 1.0);
    }
}
