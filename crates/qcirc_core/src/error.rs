//! Error types for qcirc
//!
//! A single error enum shared by every library crate in the workspace.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for qcirc
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QcError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Probability value out of range [0, 1]
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Qubit index out of range
    #[error("Qubit {qubit} out of range: max is {max}")]
    QubitOutOfRange { qubit: usize, max: usize },

    /// Classical bit index out of range
    #[error("Classical bit {clbit} out of range: circuit has {num_clbits} bits")]
    ClbitOutOfRange { clbit: usize, num_clbits: usize },

    /// Invalid T2 value (must be <= 2*T1)
    #[error("Invalid T2 ({t2_us:.2}µs): must be <= 2*T1 ({t1_us:.2}µs)")]
    InvalidT2 { t2_us: f64, t1_us: f64 },

    /// Invalid noise level
    #[error("Invalid noise level {0}: must be in range [0, 0.06]")]
    InvalidNoiseLevel(f64),

    /// Invalid bitstring format
    #[error("Invalid bitstring '{0}': must contain only '0' and '1'")]
    InvalidBitstring(String),

    /// Invalid angle
    #[error("Invalid angle {0}: must be finite")]
    InvalidAngle(f64),

    // ========================================================================
    // Register Errors
    // ========================================================================
    /// Register name already used in the circuit
    #[error("Register '{0}' already exists in circuit")]
    DuplicateRegister(String),

    /// Register not found in the circuit
    #[error("Register '{0}' not found in circuit")]
    RegisterNotFound(String),

    /// Bit index past the end of a register
    #[error("Index {index} out of range for register '{register}' of size {size}")]
    RegisterIndexOutOfRange {
        register: String,
        index: usize,
        size: usize,
    },

    // ========================================================================
    // Circuit Errors
    // ========================================================================
    /// Empty circuit
    #[error("Circuit is empty")]
    EmptyCircuit,

    /// Gate on non-existent qubit
    #[error("Gate references qubit {qubit} but circuit has only {num_qubits} qubits")]
    GateQubitMismatch { qubit: usize, num_qubits: usize },

    /// Same qubit used twice in one operation
    #[error("Qubit {0} used more than once in a single operation")]
    DuplicateQubit(usize),

    /// Composite gate applied to the wrong number of qubits
    #[error("Instruction '{name}' acts on {expected} qubits, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Circuit cannot be converted to an instruction
    #[error("Cannot convert circuit to instruction: {0}")]
    NonUnitaryInstruction(String),

    /// Invalid gate parameter
    #[error("Invalid gate parameter: {0}")]
    InvalidGateParameter(String),

    /// Topology violation (qubits not connected)
    #[error("Topology violation: qubits {q1} and {q2} are not connected")]
    TopologyViolation { q1: usize, q2: usize },

    /// Invalid QASM format
    #[error("Invalid QASM: {0}")]
    InvalidQasm(String),

    // ========================================================================
    // Topology Errors
    // ========================================================================
    /// Empty coupling map
    #[error("Coupling map is empty")]
    EmptyCouplingMap,

    /// Invalid coupling
    #[error("Invalid coupling ({0}, {1}): qubits must be different")]
    InvalidCoupling(usize, usize),

    /// Path not found between qubits
    #[error("No path found between qubits {0} and {1}")]
    PathNotFound(usize, usize),

    // ========================================================================
    // Transpiler Errors
    // ========================================================================
    /// Gate outside the target basis
    #[error("Gate '{gate}' is not in the target basis [{basis}]")]
    GateNotInBasis { gate: String, basis: String },

    /// Circuit does not fit on the target
    #[error("Circuit needs {needed} qubits but target '{target}' has {available}")]
    TargetTooSmall {
        target: String,
        needed: usize,
        available: usize,
    },

    /// Transpilation failure
    #[error("Transpiler error: {0}")]
    TranspilerError(String),

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Backend execution error
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Backend not available
    #[error("Backend '{0}' not available")]
    BackendNotAvailable(String),

    /// Shots out of range
    #[error("Shots {0} out of range [{1}, {2}]")]
    ShotsOutOfRange(u64, u64, u64),

    /// Result holds no statevector
    #[error("No statevector saved for this experiment")]
    NoStatevector,

    /// Calibration error
    #[error("Calibration error: {0}")]
    CalibrationError(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// File I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for qcirc operations
pub type QcResult<T> = Result<T, QcError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QcError {
    fn from(err: serde_json::Error) -> Self {
        QcError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for QcError {
    fn from(err: std::io::Error) -> Self {
        QcError::FileError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl QcError {
    /// Check if error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            QcError::InvalidProbability(_)
                | QcError::QubitOutOfRange { .. }
                | QcError::ClbitOutOfRange { .. }
                | QcError::InvalidT2 { .. }
                | QcError::InvalidNoiseLevel(_)
                | QcError::InvalidBitstring(_)
                | QcError::InvalidAngle(_)
                | QcError::RegisterIndexOutOfRange { .. }
        )
    }

    /// Check if error is a circuit error
    pub fn is_circuit_error(&self) -> bool {
        matches!(
            self,
            QcError::EmptyCircuit
                | QcError::GateQubitMismatch { .. }
                | QcError::DuplicateQubit(_)
                | QcError::ArityMismatch { .. }
                | QcError::NonUnitaryInstruction(_)
                | QcError::InvalidGateParameter(_)
                | QcError::TopologyViolation { .. }
                | QcError::InvalidQasm(_)
                | QcError::DuplicateRegister(_)
                | QcError::RegisterNotFound(_)
        )
    }

    /// Check if error came from executing on a backend
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            QcError::BackendError(_)
                | QcError::BackendNotAvailable(_)
                | QcError::ShotsOutOfRange(..)
                | QcError::NoStatevector
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QcError::InvalidProbability(1.5);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_register_index_message() {
        let err = QcError::RegisterIndexOutOfRange {
            register: "a".into(),
            index: 4,
            size: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("'a'"));
        assert!(msg.contains("4"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn test_classification() {
        assert!(QcError::QubitOutOfRange { qubit: 9, max: 4 }.is_validation_error());
        assert!(QcError::DuplicateRegister("c".into()).is_circuit_error());
        assert!(QcError::NoStatevector.is_backend_error());
        assert!(!QcError::EmptyCircuit.is_backend_error());
    }

    #[test]
    fn test_from_json_error() {
        let err: QcError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, QcError::JsonError(_)));
    }
}
