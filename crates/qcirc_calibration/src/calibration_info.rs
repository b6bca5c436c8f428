//! Calibration snapshot of a quantum device
//!
//! Per-qubit coherence times and error rates, per-edge two-qubit errors,
//! connectivity, native basis and gate durations. Everything a simulated
//! device needs is derived from here: the noise vectors, the coupling
//! topology and the gate timing table.

use qcirc_core::constants::physics;
use qcirc_core::error::{QcError, QcResult};
use qcirc_core::{QubitId, Topology};
use qcirc_noise::{GateTimes, NoiseModel, NoiseVector, NoiseVectorSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime};

/// Native basis of the 5-qubit superconducting devices
pub const DEFAULT_BASIS: [&str; 6] = ["id", "rz", "sx", "x", "cx", "reset"];

/// Two-qubit error on one coupling, stored with `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeError {
    /// Lower qubit
    pub a: QubitId,
    /// Higher qubit
    pub b: QubitId,
    /// Gate error probability
    pub error: f64,
}

/// Calibration data for one backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationInfo {
    /// Backend name
    pub backend_name: String,

    /// When the snapshot was taken
    #[serde(with = "system_time_serde")]
    pub timestamp: SystemTime,

    /// T1 per qubit (microseconds)
    pub t1_times: BTreeMap<QubitId, f64>,

    /// T2 per qubit (microseconds)
    pub t2_times: BTreeMap<QubitId, f64>,

    /// Single-qubit gate error per qubit
    pub gate_errors_1q: BTreeMap<QubitId, f64>,

    /// Two-qubit gate error per coupling
    pub gate_errors_2q: Vec<EdgeError>,

    /// Readout error per qubit
    pub readout_errors: BTreeMap<QubitId, f64>,

    /// Undirected coupling map
    pub coupling_map: Vec<(QubitId, QubitId)>,

    /// Native gate names
    pub basis_gates: Vec<String>,

    /// Single-qubit gate duration (ns)
    pub gate_time_1q_ns: Option<f64>,

    /// Two-qubit gate duration (ns)
    pub gate_time_2q_ns: Option<f64>,

    /// Readout duration (ns)
    pub measurement_ns: Option<f64>,
}

impl CalibrationInfo {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Empty snapshot stamped with the current time
    pub fn new(backend_name: &str) -> Self {
        Self {
            backend_name: backend_name.to_string(),
            timestamp: SystemTime::now(),
            t1_times: BTreeMap::new(),
            t2_times: BTreeMap::new(),
            gate_errors_1q: BTreeMap::new(),
            gate_errors_2q: Vec::new(),
            readout_errors: BTreeMap::new(),
            coupling_map: Vec::new(),
            basis_gates: DEFAULT_BASIS.iter().map(|s| s.to_string()).collect(),
            gate_time_1q_ns: None,
            gate_time_2q_ns: None,
            measurement_ns: None,
        }
    }

    /// Same figures on every qubit of a linear chain
    pub fn uniform(
        backend_name: &str,
        num_qubits: usize,
        t1_us: f64,
        t2_us: f64,
        error_1q: f64,
        error_2q: f64,
        readout_error: f64,
    ) -> Self {
        let mut info = Self::new(backend_name);

        for q in 0..num_qubits {
            info.set_qubit(q, t1_us, t2_us, error_1q, readout_error);
        }
        for q in 0..num_qubits.saturating_sub(1) {
            info.add_edge(q, q + 1, error_2q);
        }

        info
    }

    /// Uniform snapshot with [`NoiseModel::ibm_typical`] figures
    pub fn ibm_typical(num_qubits: usize) -> Self {
        let m = NoiseModel::ibm_typical();
        Self::uniform(
            "ibm_typical",
            num_qubits,
            m.t1_us(),
            m.t2_us(),
            m.gate_error_1q(),
            m.gate_error_2q(),
            m.readout_error(),
        )
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Record the figures of one qubit
    pub fn set_qubit(
        &mut self,
        qubit: QubitId,
        t1_us: f64,
        t2_us: f64,
        error_1q: f64,
        readout_error: f64,
    ) {
        self.t1_times.insert(qubit, t1_us);
        self.t2_times.insert(qubit, t2_us);
        self.gate_errors_1q.insert(qubit, error_1q);
        self.readout_errors.insert(qubit, readout_error);
    }

    /// Add a coupling with its CX error, replacing any previous figure
    pub fn add_edge(&mut self, a: QubitId, b: QubitId, error: f64) {
        let (a, b) = (a.min(b), a.max(b));
        if let Some(edge) = self.gate_errors_2q.iter_mut().find(|e| e.a == a && e.b == b) {
            edge.error = error;
            return;
        }
        self.gate_errors_2q.push(EdgeError { a, b, error });
        self.coupling_map.push((a, b));
    }

    /// Set native gate names
    pub fn with_basis_gates(mut self, basis: &[&str]) -> Self {
        self.basis_gates = basis.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set gate and readout durations (ns)
    pub fn with_gate_times(mut self, gate_1q_ns: f64, gate_2q_ns: f64, measurement_ns: f64) -> Self {
        self.gate_time_1q_ns = Some(gate_1q_ns);
        self.gate_time_2q_ns = Some(gate_2q_ns);
        self.measurement_ns = Some(measurement_ns);
        self
    }

    /// Set snapshot time
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of qubits: one past the largest index seen anywhere
    pub fn num_qubits(&self) -> usize {
        let per_qubit = [
            self.t1_times.keys().max(),
            self.t2_times.keys().max(),
            self.gate_errors_1q.keys().max(),
            self.readout_errors.keys().max(),
        ];
        let from_qubits = per_qubit.iter().flatten().map(|&&q| q + 1).max().unwrap_or(0);
        let from_edges = self
            .coupling_map
            .iter()
            .map(|&(a, b)| a.max(b) + 1)
            .max()
            .unwrap_or(0);
        from_qubits.max(from_edges)
    }

    /// CX error on a coupling, in either direction
    pub fn error_2q(&self, a: QubitId, b: QubitId) -> Option<f64> {
        let (a, b) = (a.min(b), a.max(b));
        self.gate_errors_2q
            .iter()
            .find(|e| e.a == a && e.b == b)
            .map(|e| e.error)
    }

    /// Whether a gate name is native on this device
    pub fn supports_gate(&self, name: &str) -> bool {
        self.basis_gates.iter().any(|g| g == name)
    }

    fn mean(values: impl Iterator<Item = f64>, default: f64) -> f64 {
        let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        if count == 0 {
            default
        } else {
            sum / count as f64
        }
    }

    /// Mean T1 (microseconds)
    pub fn avg_t1(&self) -> f64 {
        Self::mean(self.t1_times.values().copied(), physics::DEFAULT_T1_US)
    }

    /// Mean T2 (microseconds)
    pub fn avg_t2(&self) -> f64 {
        Self::mean(self.t2_times.values().copied(), physics::DEFAULT_T2_US)
    }

    /// Mean single-qubit gate error
    pub fn avg_error_1q(&self) -> f64 {
        Self::mean(self.gate_errors_1q.values().copied(), 0.001)
    }

    /// Mean two-qubit gate error
    pub fn avg_error_2q(&self) -> f64 {
        Self::mean(self.gate_errors_2q.iter().map(|e| e.error), 0.01)
    }

    /// Mean readout error
    pub fn avg_readout(&self) -> f64 {
        Self::mean(self.readout_errors.values().copied(), 0.01)
    }

    /// Whether the snapshot is younger than `ttl`
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        match self.timestamp.elapsed() {
            Ok(elapsed) => elapsed < ttl,
            Err(_) => false,
        }
    }

    /// Age of the snapshot, `None` if the timestamp is in the future
    pub fn age(&self) -> Option<Duration> {
        self.timestamp.elapsed().ok()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Every qubit must have a physically valid set of figures
    pub fn validate(&self) -> QcResult<()> {
        if self.num_qubits() == 0 {
            return Err(QcError::CalibrationError(format!(
                "calibration '{}' has no qubits",
                self.backend_name
            )));
        }
        for nv in self.to_noise_vectors().vectors() {
            NoiseModel::new(nv.t1, nv.t2, nv.gate_error_1q, nv.gate_error_2q, nv.readout_error)?;
        }
        Ok(())
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Averages as a uniform model
    pub fn to_noise_model(&self) -> NoiseModel {
        NoiseModel::new(
            self.avg_t1(),
            self.avg_t2(),
            self.avg_error_1q(),
            self.avg_error_2q(),
            self.avg_readout(),
        )
        .unwrap_or_else(|_| NoiseModel::ibm_typical())
    }

    /// Per-qubit vectors; the 2q figure is the mean over the qubit's edges
    pub fn to_noise_vectors(&self) -> NoiseVectorSet {
        let vectors = (0..self.num_qubits())
            .map(|q| {
                let t1 = self.t1_times.get(&q).copied().unwrap_or(physics::DEFAULT_T1_US);
                let t2 = self.t2_times.get(&q).copied().unwrap_or(physics::DEFAULT_T2_US);
                let error_1q = self.gate_errors_1q.get(&q).copied().unwrap_or(0.001);
                let readout = self.readout_errors.get(&q).copied().unwrap_or(0.01);
                let error_2q = Self::mean(
                    self.gate_errors_2q
                        .iter()
                        .filter(|e| e.a == q || e.b == q)
                        .map(|e| e.error),
                    0.0,
                );
                NoiseVector::new(q, t1, t2, error_1q, error_2q, readout)
            })
            .collect();

        NoiseVectorSet::new(vectors)
    }

    /// Bidirectional coupling topology named after the backend
    pub fn to_topology(&self) -> Topology {
        Topology::from_coupling_map(self.coupling_map.clone(), true)
            .unwrap_or_else(|_| Topology::linear(self.num_qubits()))
            .with_name(self.backend_name.clone())
    }

    /// Gate timing table with virtual Z gates
    pub fn to_gate_times(&self) -> GateTimes {
        GateTimes::new(
            self.gate_time_1q_ns.unwrap_or(physics::GATE_TIME_1Q_NS),
            self.gate_time_2q_ns.unwrap_or(physics::GATE_TIME_2Q_NS),
            self.measurement_ns.unwrap_or(physics::MEASUREMENT_NS),
        )
        .with_virtual_z()
    }

    // ========================================================================
    // Qubit Selection
    // ========================================================================

    /// The `n` best qubits by quality score
    pub fn best_qubits(&self, n: usize) -> Vec<QubitId> {
        self.to_noise_vectors().best_qubits(n)
    }

    /// Any simple path of `length` connected qubits
    pub fn best_linear_chain(&self, length: usize) -> Option<Vec<QubitId>> {
        self.to_topology().find_linear_chain(length)
    }
}

impl fmt::Display for CalibrationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CalibrationInfo({}, {}Q, T1={:.0}μs, T2={:.0}μs, 1Q={:.4}, 2Q={:.4})",
            self.backend_name,
            self.num_qubits(),
            self.avg_t1(),
            self.avg_t2(),
            self.avg_error_1q(),
            self.avg_error_2q()
        )
    }
}

// ============================================================================
// SystemTime Serde Helper
// ============================================================================

mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos) = <(u64, u32)>::deserialize(deserializer)?;
        if nanos >= 1_000_000_000 {
            return Err(serde::de::Error::custom("timestamp nanos out of range"));
        }
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_is_empty() {
        let info = CalibrationInfo::new("test_backend");
        assert_eq!(info.num_qubits(), 0);
        assert!(info.validate().is_err());
        assert!(info.supports_gate("sx"));
        assert!(!info.supports_gate("h"));
    }

    #[test]
    fn test_uniform() {
        let info = CalibrationInfo::uniform("test", 5, 100.0, 60.0, 0.001, 0.01, 0.01);
        assert_eq!(info.num_qubits(), 5);
        assert_relative_eq!(info.avg_t1(), 100.0);
        assert_eq!(info.coupling_map.len(), 4);
        assert!(info.validate().is_ok());
    }

    #[test]
    fn test_error_2q_symmetric() {
        let mut info = CalibrationInfo::new("test");
        info.add_edge(3, 1, 0.02);
        assert_eq!(info.error_2q(1, 3), Some(0.02));
        assert_eq!(info.error_2q(3, 1), Some(0.02));
        assert_eq!(info.error_2q(0, 1), None);

        info.add_edge(1, 3, 0.03);
        assert_eq!(info.gate_errors_2q.len(), 1);
        assert_eq!(info.error_2q(3, 1), Some(0.03));
    }

    #[test]
    fn test_noise_vectors_average_edges() {
        let mut info = CalibrationInfo::uniform("test", 3, 100.0, 60.0, 0.001, 0.01, 0.01);
        info.add_edge(1, 2, 0.03);
        let vectors = info.to_noise_vectors();

        assert_eq!(vectors.num_qubits(), 3);
        assert_relative_eq!(vectors.get(0).unwrap().gate_error_2q, 0.01);
        assert_relative_eq!(vectors.get(1).unwrap().gate_error_2q, 0.02);
    }

    #[test]
    fn test_to_topology_and_times() {
        let info = CalibrationInfo::uniform("dev", 5, 100.0, 60.0, 0.001, 0.01, 0.01)
            .with_gate_times(40.0, 400.0, 4000.0);
        let topology = info.to_topology();
        assert_eq!(topology.num_qubits(), 5);
        assert!(topology.is_connected(1, 0));
        assert_eq!(topology.name(), Some("dev"));

        let times = info.to_gate_times();
        assert_eq!(times.two_qubit_ns, 400.0);
        assert_eq!(times.measurement_ns, 4000.0);
    }

    #[test]
    fn test_freshness() {
        let info = CalibrationInfo::new("test");
        assert!(info.is_fresh(Duration::from_secs(60)));

        let old = info.with_timestamp(SystemTime::UNIX_EPOCH);
        assert!(!old.is_fresh(Duration::from_secs(3600)));
    }

    #[test]
    fn test_invalid_t2_fails_validation() {
        let mut info = CalibrationInfo::uniform("bad", 2, 100.0, 60.0, 0.001, 0.01, 0.01);
        info.t2_times.insert(1, 250.0);
        assert!(matches!(info.validate(), Err(QcError::InvalidT2 { .. })));
    }

    #[test]
    fn test_serialization() {
        let info = CalibrationInfo::ibm_typical(5);
        let json = serde_json::to_string(&info).unwrap();
        let restored: CalibrationInfo = serde_json::from_str(&json).unwrap();

        assert_eq!(info.backend_name, restored.backend_name);
        assert_eq!(restored.error_2q(2, 3), info.error_2q(2, 3));
    }

    #[test]
    fn test_timestamp_keeps_subsecond_part() {
        let stamp = SystemTime::UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        let info = CalibrationInfo::new("test").with_timestamp(stamp);
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("[1700000000,123456789]"));

        let restored: CalibrationInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.timestamp, stamp);

        let now = CalibrationInfo::new("now");
        let back: CalibrationInfo =
            serde_json::from_str(&serde_json::to_string(&now).unwrap()).unwrap();
        assert_eq!(back, now);
    }
}
