//! Gate durations
//!
//! Per-platform default durations with per-gate overrides. The trajectory
//! simulator turns these into relaxation probabilities, and the ASAP
//! schedule gives the wall-clock length of a circuit.

use qcirc_core::constants::physics;
use qcirc_core::{Circuit, Gate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Gate timing configuration, all values in nanoseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateTimes {
    /// Single-qubit gate time
    pub single_qubit_ns: f64,

    /// Two-qubit gate time
    pub two_qubit_ns: f64,

    /// Measurement time
    pub measurement_ns: f64,

    /// Reset time
    pub reset_ns: f64,

    /// Per-gate overrides keyed by lowercase gate name
    #[serde(default)]
    gate_overrides: HashMap<String, f64>,
}

impl GateTimes {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Durations in nanoseconds
    pub fn new(single_qubit_ns: f64, two_qubit_ns: f64, measurement_ns: f64) -> Self {
        Self {
            single_qubit_ns,
            two_qubit_ns,
            measurement_ns,
            reset_ns: physics::RESET_NS,
            gate_overrides: HashMap::new(),
        }
    }

    /// Superconducting transmon timings
    pub fn superconducting() -> Self {
        Self::new(
            physics::GATE_TIME_1Q_NS,
            physics::GATE_TIME_2Q_NS,
            physics::MEASUREMENT_NS,
        )
    }

    /// Trapped ion timings
    pub fn trapped_ion() -> Self {
        Self::new(10_000.0, 200_000.0, 100_000.0)
    }

    /// Zero-duration gates, for ideal simulation
    pub fn instantaneous() -> Self {
        let mut times = Self::new(0.0, 0.0, 0.0);
        times.reset_ns = 0.0;
        times
    }

    // ========================================================================
    // Gate Time Overrides
    // ========================================================================

    /// Set a custom time for a named gate
    pub fn with_gate_time(mut self, gate_name: &str, time_ns: f64) -> Self {
        self.gate_overrides.insert(gate_name.to_lowercase(), time_ns);
        self
    }

    /// Virtual Z-family gates and the usual CX-derived figures
    pub fn with_virtual_z(self) -> Self {
        let cx = self.two_qubit_ns;
        let sx = self.single_qubit_ns;
        ["rz", "z", "s", "sdg", "t", "tdg", "p", "id"]
            .iter()
            .fold(self, |t, name| t.with_gate_time(name, 0.0))
            .with_gate_time("rx", 2.0 * sx)
            .with_gate_time("ry", 2.0 * sx)
            .with_gate_time("swap", 3.0 * cx)
    }

    /// Override for a gate name, if any
    pub fn override_for(&self, gate_name: &str) -> Option<f64> {
        self.gate_overrides.get(gate_name).copied()
    }

    // ========================================================================
    // Time Calculations
    // ========================================================================

    /// Duration of one operation
    ///
    /// Composite instructions take the sum of their body. Three-qubit gates
    /// are priced as six two-qubit gates.
    pub fn gate_duration(&self, gate: &Gate) -> f64 {
        if let Gate::Composite(def, _) = gate {
            return def.gates().iter().map(|g| self.gate_duration(g)).sum();
        }
        if let Some(time) = self.override_for(gate.name()) {
            return time;
        }

        match gate {
            g if g.is_directive() => 0.0,
            g if g.is_measurement() => self.measurement_ns,
            Gate::Reset(_) => self.reset_ns,
            g if g.is_two_qubit() => self.two_qubit_ns,
            g if g.is_three_qubit() => self.two_qubit_ns * 6.0,
            _ => self.single_qubit_ns,
        }
    }

    /// Sum of all durations, no parallelism
    pub fn circuit_duration_sequential(&self, circuit: &Circuit) -> f64 {
        circuit.gates().iter().map(|g| self.gate_duration(g)).sum()
    }

    /// ASAP schedule: returns (total duration, per-qubit finish times)
    ///
    /// Operations without explicit qubits (full barrier, save_statevector)
    /// synchronise every qubit.
    pub fn circuit_duration_asap(&self, circuit: &Circuit) -> (f64, Vec<f64>) {
        let num_qubits = circuit.num_qubits();
        let mut qubit_available = vec![0.0; num_qubits];

        for gate in circuit.gates() {
            let qubits = gate.qubits();
            let duration = self.gate_duration(gate);

            if qubits.is_empty() {
                let max_time = qubit_available.iter().cloned().fold(0.0, f64::max);
                for t in &mut qubit_available {
                    *t = max_time + duration;
                }
                continue;
            }

            let start = qubits
                .iter()
                .filter_map(|&q| qubit_available.get(q))
                .cloned()
                .fold(0.0, f64::max);

            for &q in &qubits {
                if let Some(t) = qubit_available.get_mut(q) {
                    *t = start + duration;
                }
            }
        }

        let total = qubit_available.iter().cloned().fold(0.0, f64::max);
        (total, qubit_available)
    }

    /// Idle time per qubit under the ASAP schedule
    pub fn estimate_idle_times(&self, circuit: &Circuit) -> Vec<f64> {
        let (total, _) = self.circuit_duration_asap(circuit);
        let mut active = vec![0.0; circuit.num_qubits()];

        for gate in circuit.gates() {
            let duration = self.gate_duration(gate);
            for q in gate.qubits() {
                if let Some(a) = active.get_mut(q) {
                    *a += duration;
                }
            }
        }

        active.iter().map(|&a| (total - a).max(0.0)).collect()
    }

    /// Sequential over ASAP duration; 1.0 means fully sequential
    pub fn parallelism_factor(&self, circuit: &Circuit) -> f64 {
        let sequential = self.circuit_duration_sequential(circuit);
        let (parallel, _) = self.circuit_duration_asap(circuit);

        if parallel > 0.0 {
            sequential / parallel
        } else {
            1.0
        }
    }
}

impl Default for GateTimes {
    fn default() -> Self {
        Self::superconducting().with_virtual_z()
    }
}

impl fmt::Display for GateTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GateTimes(1Q={:.0}ns, 2Q={:.0}ns, meas={:.0}ns)",
            self.single_qubit_ns, self.two_qubit_ns, self.measurement_ns
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
