//! Compilation target: native gates plus coupling map

use qcirc_calibration::CalibrationInfo;
use qcirc_core::{QubitId, Topology};
use serde::{Deserialize, Serialize};

/// Operations every target accepts regardless of its basis
pub const ALWAYS_SUPPORTED: [&str; 3] = ["measure", "barrier", "save_statevector"];

/// Description of the device a circuit is compiled for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Device name
    pub name: String,

    /// Physical qubit count
    pub num_qubits: usize,

    /// Native gate names; empty means any gate is accepted
    pub basis_gates: Vec<String>,

    /// Coupling map; `None` means all-to-all
    pub topology: Option<Topology>,
}

impl Target {
    /// Fully connected target that accepts every gate
    pub fn ideal(num_qubits: usize) -> Self {
        Self {
            name: "ideal".to_string(),
            num_qubits,
            basis_gates: Vec::new(),
            topology: None,
        }
    }

    /// Target described by a device calibration snapshot
    pub fn from_calibration(info: &CalibrationInfo) -> Self {
        Self {
            name: info.backend_name.clone(),
            num_qubits: info.num_qubits(),
            basis_gates: info.basis_gates.clone(),
            topology: Some(info.to_topology()),
        }
    }

    /// Set native gate names
    pub fn with_basis(mut self, basis: &[&str]) -> Self {
        self.basis_gates = basis.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set the coupling graph, growing the qubit count to fit
    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.num_qubits = self.num_qubits.max(topology.num_qubits());
        self.topology = Some(topology);
        self
    }

    /// True when the basis places no restriction on gates
    pub fn is_universal(&self) -> bool {
        self.basis_gates.is_empty()
    }

    /// Whether an operation name can run on this target
    pub fn supports(&self, name: &str) -> bool {
        self.is_universal()
            || ALWAYS_SUPPORTED.contains(&name)
            || self.basis_gates.iter().any(|g| g == name)
    }

    /// Whether two physical qubits may share a two-qubit gate
    pub fn is_coupled(&self, a: QubitId, b: QubitId) -> bool {
        match &self.topology {
            Some(t) => t.is_connected(a, b) || t.is_connected(b, a),
            None => a != b,
        }
    }

    /// Comma-separated basis, for error messages
    pub fn basis_string(&self) -> String {
        if self.is_universal() {
            "*".to_string()
        } else {
            self.basis_gates.join(", ")
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_calibration::fake_devices;

    #[test]
    fn test_ideal_target() {
        let t = Target::ideal(4);
        assert!(t.is_universal());
        assert!(t.supports("ccx"));
        assert!(t.is_coupled(0, 3));
        assert_eq!(t.basis_string(), "*");
    }

    #[test]
    fn test_from_calibration() {
        let t = Target::from_calibration(&fake_devices::athens());
        assert_eq!(t.name, "fake_athens");
        assert_eq!(t.num_qubits, 5);
        assert!(t.supports("cx"));
        assert!(t.supports("measure"));
        assert!(!t.supports("h"));
        assert!(t.is_coupled(1, 0));
        assert!(!t.is_coupled(0, 4));
    }
}
