//! Backend execution types and traits
//!
//! Defines the interface for quantum backend execution and the result
//! object every backend returns.

use crate::statevector::Statevector;
use qcirc_calibration::CalibrationInfo;
use qcirc_core::constants::execution::MAX_SHOTS;
use qcirc_core::{Circuit, Counts, QcError, QcResult};
use qcirc_transpiler::Target;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Result of circuit execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts (classical register key -> count)
    pub counts: Counts,

    /// Number of shots executed
    pub shots: u64,

    /// State captured by `save_statevector`, if the circuit had one
    pub statevector: Option<Statevector>,

    /// Per-shot keys, in shot order, when memory was requested
    pub memory: Option<Vec<String>>,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Name of the executed circuit
    pub circuit_name: String,

    /// Classical registers as `(name, size)` in circuit order
    pub registers: Vec<(String, usize)>,

    /// "statevector" when shots were sampled from one evolution,
    /// "trajectory" when every shot was simulated on its own
    pub method: String,

    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,

    /// Whether simulation was used
    pub simulated: bool,

    /// Seed used (if any)
    pub seed: Option<u64>,

    /// Additional info
    pub extra: HashMap<String, String>,
}

impl ExecutionResult {
    /// Create new execution result
    pub fn new(counts: Counts, shots: u64, backend: &str) -> Self {
        Self {
            counts,
            shots,
            statevector: None,
            memory: None,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                simulated: true,
                ..Default::default()
            },
        }
    }

    /// Attach a saved statevector
    pub fn with_statevector(mut self, statevector: Statevector) -> Self {
        self.statevector = Some(statevector);
        self
    }

    /// Attach per-shot memory
    pub fn with_memory(mut self, memory: Vec<String>) -> Self {
        self.memory = Some(memory);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Measurement histogram
    pub fn get_counts(&self) -> &Counts {
        &self.counts
    }

    /// Statevector saved during the run
    pub fn get_statevector(&self) -> QcResult<&Statevector> {
        self.statevector.as_ref().ok_or(QcError::NoStatevector)
    }

    /// Per-shot outcomes
    pub fn get_memory(&self) -> QcResult<&[String]> {
        self.memory
            .as_deref()
            .ok_or_else(|| QcError::BackendError("memory was not enabled for this run".into()))
    }

    /// Get total count (equals shots whenever the circuit has classical bits)
    pub fn total_counts(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Get probability of a specific key
    pub fn probability(&self, key: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let count = self.counts.get(key).copied().unwrap_or(0);
        count as f64 / self.shots as f64
    }

    /// Get most frequent key; ties go to the smallest key
    pub fn most_frequent(&self) -> Option<(&String, u64)> {
        self.counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(key, &count)| (key, count))
    }

    /// Pretty-printed JSON dump
    pub fn to_json(&self) -> QcResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ========================================================================
    // Marginals
    // ========================================================================

    /// Counts of a single classical register
    pub fn marginal_counts(&self, register: &str) -> QcResult<Counts> {
        let regs = &self.metadata.registers;
        let pos = regs
            .iter()
            .position(|(name, _)| name == register)
            .ok_or_else(|| QcError::RegisterNotFound(register.to_string()))?;
        // Keys list registers last-added first
        let field = regs.len() - 1 - pos;

        let mut out = Counts::new();
        for (key, &count) in &self.counts {
            let part = key.split(' ').nth(field).ok_or_else(|| {
                QcError::InternalError(format!("count key '{}' lacks register '{}'", key, register))
            })?;
            *out.entry(part.to_string()).or_insert(0) += count;
        }
        Ok(out)
    }

    /// Counts with every register in its own map, keyed by register name
    pub fn counts_by_register(&self) -> QcResult<HashMap<String, Counts>> {
        self.metadata
            .registers
            .iter()
            .map(|(name, _)| Ok((name.clone(), self.marginal_counts(name)?)))
            .collect()
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(backend={}, shots={}, unique={}",
            self.metadata.backend,
            self.shots,
            self.counts.len()
        )?;
        if let Some((key, count)) = self.most_frequent() {
            write!(f, ", top='{}':{}", key, count)?;
        }
        write!(f, ")")
    }
}

/// Build the count key of one shot
///
/// Registers are separated by a space and the last-added register comes
/// first; inside a register bit 0 is rightmost.
pub fn format_key(bits: &[bool], registers: &[(String, usize)]) -> String {
    let mut parts = Vec::with_capacity(registers.len());
    let mut offset = 0;
    for (_, size) in registers {
        let part: String = (0..*size)
            .rev()
            .map(|i| if bits[offset + i] { '1' } else { '0' })
            .collect();
        parts.push(part);
        offset += size;
    }
    parts.reverse();
    parts.join(" ")
}

/// Classical register layout of a circuit as `(name, size)` pairs
pub fn register_layout(circuit: &Circuit) -> Vec<(String, usize)> {
    circuit
        .cregs()
        .iter()
        .map(|r| (r.name().to_string(), r.size()))
        .collect()
}

/// Quantum backend trait
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Get number of qubits
    fn num_qubits(&self) -> usize;

    /// Execute a circuit
    fn execute(&self, circuit: &Circuit, shots: u64) -> QcResult<ExecutionResult>;

    /// Execute multiple circuits (batch)
    fn execute_batch(&self, circuits: &[Circuit], shots: u64) -> QcResult<Vec<ExecutionResult>> {
        circuits.iter().map(|c| self.execute(c, shots)).collect()
    }

    /// Get calibration info (if available)
    fn calibration(&self) -> Option<&CalibrationInfo> {
        None
    }

    /// Compilation target describing this backend
    fn target(&self) -> Target {
        Target::ideal(self.num_qubits())
    }

    /// Check if backend is simulator
    fn is_simulator(&self) -> bool {
        true
    }

    /// Get maximum shots per execution
    fn max_shots(&self) -> u64 {
        MAX_SHOTS
    }

    /// Reject shot counts outside `[1, max_shots]`
    fn check_shots(&self, shots: u64) -> QcResult<()> {
        let max = self.max_shots();
        if shots == 0 || shots > max {
            return Err(QcError::ShotsOutOfRange(shots, 1, max));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_counts() -> Counts {
        let mut counts = Counts::new();
        counts.insert("1 00".to_string(), 400);
        counts.insert("0 11".to_string(), 300);
        counts.insert("1 11".to_string(), 200);
        counts.insert("0 01".to_string(), 100);
        counts
    }

    fn make_result() -> ExecutionResult {
        let mut result = ExecutionResult::new(make_test_counts(), 1000, "test");
        result.metadata.registers = vec![("c".to_string(), 2), ("flag".to_string(), 1)];
        result
    }

    #[test]
    fn test_execution_result_new() {
        let result = make_result();
        assert_eq!(result.shots, 1000);
        assert_eq!(result.metadata.backend, "test");
        assert!(result.statevector.is_none());
    }

    #[test]
    fn test_total_counts() {
        assert_eq!(make_result().total_counts(), 1000);
    }

    #[test]
    fn test_probability() {
        let result = make_result();
        assert!((result.probability("1 00") - 0.4).abs() < 1e-10);
        assert!((result.probability("1 01") - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_most_frequent() {
        let result = make_result();
        let (key, count) = result.most_frequent().unwrap();
        assert_eq!(key, "1 00");
        assert_eq!(count, 400);

        let mut tied = Counts::new();
        tied.insert("11".to_string(), 5);
        tied.insert("00".to_string(), 5);
        let result = ExecutionResult::new(tied, 10, "test");
        assert_eq!(result.most_frequent().unwrap().0, "00");
    }

    #[test]
    fn test_missing_statevector() {
        assert_eq!(make_result().get_statevector(), Err(QcError::NoStatevector));
        assert!(make_result().get_memory().is_err());
    }

    #[test]
    fn test_marginal_counts() {
        let result = make_result();

        let c = result.marginal_counts("c").unwrap();
        assert_eq!(c["00"], 400);
        assert_eq!(c["11"], 500);
        assert_eq!(c["01"], 100);

        let flag = result.marginal_counts("flag").unwrap();
        assert_eq!(flag["1"], 600);
        assert_eq!(flag["0"], 400);

        assert!(result.marginal_counts("missing").is_err());
        assert_eq!(result.counts_by_register().unwrap().len(), 2);
    }

    #[test]
    fn test_json_dump() {
        let json = make_result().to_json().unwrap();
        let back: ExecutionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.counts, make_test_counts());
        assert_eq!(back.metadata.registers.len(), 2);
    }

    #[test]
    fn test_format_key() {
        let regs = vec![("a".to_string(), 2), ("b".to_string(), 3)];
        // a = [1, 0], b = [0, 0, 1]
        let bits = [true, false, false, false, true];
        assert_eq!(format_key(&bits, &regs), "100 01");
        assert_eq!(format_key(&[], &[]), "");
    }

    #[test]
    fn test_register_layout() {
        let mut circuit = Circuit::new(2, 2);
        circuit.measure_all().unwrap();
        assert_eq!(
            register_layout(&circuit),
            vec![("c".to_string(), 2), ("meas".to_string(), 2)]
        );
    }
}
