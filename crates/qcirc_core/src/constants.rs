//! Constants for qcirc
//!
//! Physical defaults for superconducting devices, execution limits and
//! numerical tolerances.

// ============================================================================
// Physics Constants
// ============================================================================

pub mod physics {
    //! Physical constants for superconducting hardware

    /// Single-qubit gate time in nanoseconds (SX pulse)
    pub const GATE_TIME_1Q_NS: f64 = 35.0;

    /// Two-qubit gate time in nanoseconds (CX)
    pub const GATE_TIME_2Q_NS: f64 = 300.0;

    /// Measurement time in nanoseconds
    pub const MEASUREMENT_NS: f64 = 5000.0;

    /// Reset time in nanoseconds
    pub const RESET_NS: f64 = 1000.0;

    /// Default T1 relaxation time in microseconds
    pub const DEFAULT_T1_US: f64 = 100.0;

    /// Default T2 dephasing time in microseconds
    pub const DEFAULT_T2_US: f64 = 60.0;

    /// Gate times in seconds for individual gates
    pub mod gate_times_s {
        /// H gate time (seconds)
        pub const H: f64 = 35e-9;
        /// X gate time (seconds)
        pub const X: f64 = 35e-9;
        /// Y gate time (seconds)
        pub const Y: f64 = 35e-9;
        /// Z gate time (seconds) - virtual, effectively 0
        pub const Z: f64 = 0.0;
        /// Rz gate time (seconds) - virtual
        pub const RZ: f64 = 0.0;
        /// Rx gate time (seconds)
        pub const RX: f64 = 70e-9;
        /// Ry gate time (seconds)
        pub const RY: f64 = 70e-9;
        /// SX gate time (seconds)
        pub const SX: f64 = 35e-9;
        /// S gate time (seconds) - virtual
        pub const S: f64 = 0.0;
        /// T gate time (seconds) - virtual
        pub const T: f64 = 0.0;
        /// CNOT/CX gate time (seconds)
        pub const CX: f64 = 300e-9;
        /// CZ gate time (seconds)
        pub const CZ: f64 = 300e-9;
        /// SWAP gate time (seconds) - 3 CNOTs
        pub const SWAP: f64 = 900e-9;
    }

    /// Convert microseconds to nanoseconds
    #[inline]
    pub const fn us_to_ns(us: f64) -> f64 {
        us * 1e3
    }

    /// Convert nanoseconds to seconds
    #[inline]
    pub const fn ns_to_s(ns: f64) -> f64 {
        ns * 1e-9
    }
}

// ============================================================================
// Execution Constants
// ============================================================================

pub mod execution {
    //! Shot limits and simulator capacity

    /// Default number of shots per experiment
    pub const DEFAULT_SHOTS: u64 = 1024;

    /// Shots used by the measurement walkthrough
    pub const TOUR_SHOTS: u64 = 8192;

    /// Maximum shots accepted by a backend
    pub const MAX_SHOTS: u64 = 100_000;

    /// Largest register the dense statevector simulator accepts
    pub const MAX_SIMULATOR_QUBITS: usize = 24;

    /// Name of the register `measure_all` creates
    pub const MEASURE_ALL_REGISTER: &str = "meas";
}

// ============================================================================
// Numerical Tolerances
// ============================================================================

pub mod tolerance {
    //! Floating point tolerances

    /// Tolerance for angle comparisons
    pub const ANGLE_EPS: f64 = 1e-9;

    /// Tolerance for matrix / amplitude comparisons
    pub const MATRIX_EPS: f64 = 1e-9;

    /// Reduce an angle into (-π, π]
    pub fn wrap_angle(angle: f64) -> f64 {
        use std::f64::consts::PI;
        let mut a = angle % (2.0 * PI);
        if a <= -PI {
            a += 2.0 * PI;
        } else if a > PI {
            a -= 2.0 * PI;
        }
        a
    }

    /// Check whether an angle is a multiple of 2π
    pub fn is_zero_angle(angle: f64) -> bool {
        wrap_angle(angle).abs() < ANGLE_EPS
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_t2_constraint() {
        // T2 should be <= 2*T1 (physical constraint)
        assert!(physics::DEFAULT_T2_US <= 2.0 * physics::DEFAULT_T1_US);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((tolerance::wrap_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((tolerance::wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!(tolerance::wrap_angle(0.5).abs() - 0.5 < 1e-12);
        assert!(tolerance::is_zero_angle(4.0 * PI));
        assert!(!tolerance::is_zero_angle(0.1));
    }

    #[test]
    fn test_shot_limits() {
        assert!(execution::TOUR_SHOTS <= execution::MAX_SHOTS);
        assert!(execution::DEFAULT_SHOTS > 0);
    }
}
