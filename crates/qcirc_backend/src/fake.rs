//! Fake device backends
//!
//! A [`FakeBackend`] behaves like submitting to a real device: circuits must
//! already be expressed in the device basis and respect its coupling map.
//! Execution runs on a [`SimulatorBackend`] loaded with the device's
//! calibration snapshot.

use crate::execution::{Backend, ExecutionResult};
use crate::simulator::SimulatorBackend;
use qcirc_calibration::{fake_devices, CalibrationInfo};
use qcirc_core::{Circuit, QcResult};
use qcirc_transpiler::{Target, Transpiler};

/// Noisy simulator mimicking a calibrated device
#[derive(Debug, Clone)]
pub struct FakeBackend {
    calibration: CalibrationInfo,
    simulator: SimulatorBackend,
    target: Target,
}

impl FakeBackend {
    /// Backend from an arbitrary calibration snapshot
    pub fn from_calibration(calibration: CalibrationInfo) -> Self {
        let simulator = SimulatorBackend::from_calibration(&calibration);
        let target = Target::from_calibration(&calibration);
        Self {
            calibration,
            simulator,
            target,
        }
    }

    /// Backend for a catalogued device (`fake_athens`, `belem`, ...)
    pub fn from_name(name: &str) -> QcResult<Self> {
        Ok(Self::from_calibration(fake_devices::by_name(name)?))
    }

    /// `fake_athens`
    pub fn athens() -> Self {
        Self::from_calibration(fake_devices::athens())
    }

    /// `fake_belem`
    pub fn belem() -> Self {
        Self::from_calibration(fake_devices::belem())
    }

    /// `fake_manila`
    pub fn manila() -> Self {
        Self::from_calibration(fake_devices::manila())
    }

    /// `fake_lima`
    pub fn lima() -> Self {
        Self::from_calibration(fake_devices::lima())
    }

    /// Seed the underlying simulator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulator = self.simulator.with_seed(seed);
        self
    }

    /// Set or clear the seed
    pub fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        self.simulator = self.simulator.with_seed_opt(seed);
        self
    }

    /// Record per-shot outcomes
    pub fn with_memory(mut self, memory: bool) -> Self {
        self.simulator = self.simulator.with_memory(memory);
        self
    }

    /// Simulator doing the work
    pub fn simulator(&self) -> &SimulatorBackend {
        &self.simulator
    }
}

impl Backend for FakeBackend {
    fn name(&self) -> &str {
        &self.calibration.backend_name
    }

    fn num_qubits(&self) -> usize {
        self.target.num_qubits
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QcResult<ExecutionResult> {
        self.check_shots(shots)?;
        Transpiler::new(self.target.clone()).validate(circuit)?;
        self.simulator.execute(circuit, shots)
    }

    fn calibration(&self) -> Option<&CalibrationInfo> {
        Some(&self.calibration)
    }

    fn target(&self) -> Target {
        self.target.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_core::{CircuitBuilder, QcError};

    #[test]
    fn test_catalog_backends() {
        for name in fake_devices::names() {
            let backend = FakeBackend::from_name(name).unwrap();
            assert_eq!(backend.name(), name);
            assert_eq!(backend.num_qubits(), 5);
            assert!(!backend.target().is_universal());
            assert!(backend.calibration().is_some());
        }
        assert!(FakeBackend::from_name("fake_nowhere").is_err());
    }

    #[test]
    fn test_rejects_untranspiled_circuits() {
        let backend = FakeBackend::athens().with_seed(1);

        let non_native = CircuitBuilder::new(2, 0).h(0).measure_all().build().unwrap();
        assert!(matches!(
            backend.execute(&non_native, 10),
            Err(QcError::GateNotInBasis { .. })
        ));

        let uncoupled = CircuitBuilder::new(5, 0).cx(0, 3).measure_all().build().unwrap();
        assert!(matches!(
            backend.execute(&uncoupled, 10),
            Err(QcError::TopologyViolation { .. })
        ));
    }

    #[test]
    fn test_native_circuit_runs_noisy() {
        let backend = FakeBackend::lima().with_seed(7);
        let circuit = CircuitBuilder::new(2, 0)
            .x(0)
            .cx(0, 1)
            .measure_all()
            .build()
            .unwrap();

        let result = backend.execute(&circuit, 2000).unwrap();
        assert_eq!(result.total_counts(), 2000);
        assert_eq!(result.metadata.method, "trajectory");
        let p11 = result.probability("11");
        assert!(p11 > 0.85 && p11 < 1.0, "P(11) = {}", p11);
    }
}
