//! Quantum and classical registers
//!
//! Registers name a contiguous slice of a circuit's qubits or classical bits.
//! Bits can be addressed either by their flat circuit index or through a
//! register (`qr.bit(0)`), which the circuit resolves when the operation is
//! added.

use crate::types::{ClbitId, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

static QREG_COUNTER: AtomicUsize = AtomicUsize::new(0);
static CREG_COUNTER: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Quantum Register
// ============================================================================

/// Named group of qubits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuantumRegister {
    name: String,
    size: usize,
}

impl QuantumRegister {
    /// Create a register with `size` qubits
    pub fn new(size: usize, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Create a register named `q<N>` from a process-wide counter
    pub fn anonymous(size: usize) -> Self {
        let n = QREG_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::new(size, format!("q{}", n))
    }

    /// Register name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits
    pub fn size(&self) -> usize {
        self.size
    }

    /// Reference to the i-th qubit of this register
    pub fn bit(&self, index: usize) -> Qubit {
        Qubit {
            register: self.name.clone(),
            index,
        }
    }

    /// All qubits of this register, in order
    pub fn bits(&self) -> Vec<Qubit> {
        (0..self.size).map(|i| self.bit(i)).collect()
    }
}

impl fmt::Display for QuantumRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuantumRegister({}, '{}')", self.size, self.name)
    }
}

// ============================================================================
// Classical Register
// ============================================================================

/// Named group of classical bits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicalRegister {
    name: String,
    size: usize,
}

impl ClassicalRegister {
    /// Create a register with `size` classical bits
    pub fn new(size: usize, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Create a register named `c<N>` from a process-wide counter
    pub fn anonymous(size: usize) -> Self {
        let n = CREG_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::new(size, format!("c{}", n))
    }

    /// Register name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bits
    pub fn size(&self) -> usize {
        self.size
    }

    /// Reference to the i-th bit of this register
    pub fn bit(&self, index: usize) -> Clbit {
        Clbit {
            register: self.name.clone(),
            index,
        }
    }

    /// All bits of this register, in order
    pub fn bits(&self) -> Vec<Clbit> {
        (0..self.size).map(|i| self.bit(i)).collect()
    }
}

impl fmt::Display for ClassicalRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassicalRegister({}, '{}')", self.size, self.name)
    }
}

// ============================================================================
// Bit References
// ============================================================================

/// Register-qualified qubit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Qubit {
    /// Owning register name
    pub register: String,
    /// Index within the register
    pub index: usize,
}

/// Register-qualified classical bit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clbit {
    /// Owning register name
    pub register: String,
    /// Index within the register
    pub index: usize,
}

/// Qubit operand: flat circuit index or register bit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QubitRef {
    /// Flat index across all quantum registers
    Index(QubitId),
    /// Bit of a named register
    Bit(Qubit),
}

/// Classical bit operand: flat circuit index or register bit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClbitRef {
    /// Flat index across all classical registers
    Index(ClbitId),
    /// Bit of a named register
    Bit(Clbit),
}

impl From<usize> for QubitRef {
    fn from(q: usize) -> Self {
        QubitRef::Index(q)
    }
}

impl From<Qubit> for QubitRef {
    fn from(q: Qubit) -> Self {
        QubitRef::Bit(q)
    }
}

impl From<&Qubit> for QubitRef {
    fn from(q: &Qubit) -> Self {
        QubitRef::Bit(q.clone())
    }
}

impl From<usize> for ClbitRef {
    fn from(c: usize) -> Self {
        ClbitRef::Index(c)
    }
}

impl From<Clbit> for ClbitRef {
    fn from(c: Clbit) -> Self {
        ClbitRef::Bit(c)
    }
}

impl From<&Clbit> for ClbitRef {
    fn from(c: &Clbit) -> Self {
        ClbitRef::Bit(c.clone())
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

impl fmt::Display for Clbit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.register, self.index)
    }
}

// ============================================================================
// Tests
// ============================================================================
