//! Device-wide noise model
//!
//! One set of T1/T2, gate and readout error figures applied uniformly to
//! every qubit. Per-qubit figures live in [`crate::noise_vector`].

use qcirc_core::constants::physics;
use qcirc_core::error::{QcError, QcResult};
use qcirc_core::Probability;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest depolarizing rate accepted by [`NoiseModel::from_depol`]
pub const MAX_DEPOL: f64 = 0.06;

/// Uniform noise model for a simulated device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// T1 relaxation time in microseconds
    t1_us: f64,

    /// T2 dephasing time in microseconds
    t2_us: f64,

    /// Single-qubit gate error probability
    gate_error_1q: f64,

    /// Two-qubit gate error probability
    gate_error_2q: f64,

    /// Readout flip probability
    readout_error: f64,

    /// Crosstalk error probability
    crosstalk: Option<f64>,
}

impl NoiseModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a validated noise model
    pub fn new(
        t1_us: f64,
        t2_us: f64,
        gate_error_1q: f64,
        gate_error_2q: f64,
        readout_error: f64,
    ) -> QcResult<Self> {
        let model = Self {
            t1_us,
            t2_us,
            gate_error_1q,
            gate_error_2q,
            readout_error,
            crosstalk: None,
        };
        model.validate()?;
        Ok(model)
    }

    /// Noiseless model: infinite coherence and zero error rates
    pub fn ideal() -> Self {
        Self {
            t1_us: f64::INFINITY,
            t2_us: f64::INFINITY,
            gate_error_1q: 0.0,
            gate_error_2q: 0.0,
            readout_error: 0.0,
            crosstalk: None,
        }
    }

    /// Figures typical of a 5-qubit superconducting device
    pub fn ibm_typical() -> Self {
        Self {
            t1_us: physics::DEFAULT_T1_US,
            t2_us: physics::DEFAULT_T2_US,
            gate_error_1q: 0.0003,
            gate_error_2q: 0.01,
            readout_error: 0.02,
            crosstalk: Some(0.001),
        }
    }

    /// Model derived from a single depolarizing rate
    ///
    /// The two-qubit error is ten times `p_depol`, the readout error a quarter
    /// of it. Coherence times use the physics defaults.
    pub fn from_depol(p_depol: f64) -> QcResult<Self> {
        if !(0.0..=MAX_DEPOL).contains(&p_depol) {
            return Err(QcError::InvalidNoiseLevel(p_depol));
        }

        Ok(Self {
            t1_us: physics::DEFAULT_T1_US,
            t2_us: physics::DEFAULT_T2_US,
            gate_error_1q: p_depol,
            gate_error_2q: p_depol * 10.0,
            readout_error: p_depol / 4.0,
            crosstalk: None,
        })
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set crosstalk error
    pub fn with_crosstalk(mut self, crosstalk: f64) -> Self {
        self.crosstalk = Some(crosstalk);
        self
    }

    /// Set T1 time
    pub fn with_t1(mut self, t1_us: f64) -> Self {
        self.t1_us = t1_us;
        self
    }

    /// Set T2 time
    pub fn with_t2(mut self, t2_us: f64) -> Self {
        self.t2_us = t2_us;
        self
    }

    /// Set single-qubit gate error
    pub fn with_gate_error_1q(mut self, error: f64) -> Self {
        self.gate_error_1q = error;
        self
    }

    /// Set two-qubit gate error
    pub fn with_gate_error_2q(mut self, error: f64) -> Self {
        self.gate_error_2q = error;
        self
    }

    /// Set readout error
    pub fn with_readout_error(mut self, error: f64) -> Self {
        self.readout_error = error;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// T1 in microseconds
    pub fn t1_us(&self) -> f64 {
        self.t1_us
    }

    /// T2 in microseconds
    pub fn t2_us(&self) -> f64 {
        self.t2_us
    }

    /// Single-qubit gate error
    pub fn gate_error_1q(&self) -> f64 {
        self.gate_error_1q
    }

    /// Two-qubit gate error
    pub fn gate_error_2q(&self) -> f64 {
        self.gate_error_2q
    }

    /// Readout error
    pub fn readout_error(&self) -> f64 {
        self.readout_error
    }

    /// Crosstalk rate, if modelled
    pub fn crosstalk(&self) -> Option<f64> {
        self.crosstalk
    }

    /// True when every error source is switched off
    pub fn is_ideal(&self) -> bool {
        self.gate_error_1q == 0.0
            && self.gate_error_2q == 0.0
            && self.readout_error == 0.0
            && self.t1_us.is_infinite()
            && self.t2_us.is_infinite()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check physical constraints: positive times, T2 <= 2*T1, rates in [0, 1]
    pub fn validate(&self) -> QcResult<()> {
        if self.t1_us <= 0.0 || self.t1_us.is_nan() {
            return Err(QcError::CalibrationError(format!(
                "T1 must be positive: {}",
                self.t1_us
            )));
        }

        if self.t2_us <= 0.0 || self.t2_us.is_nan() {
            return Err(QcError::CalibrationError(format!(
                "T2 must be positive: {}",
                self.t2_us
            )));
        }

        if self.t2_us.is_finite() && self.t2_us > 2.0 * self.t1_us {
            return Err(QcError::InvalidT2 {
                t2_us: self.t2_us,
                t1_us: self.t1_us,
            });
        }

        let rates = [
            ("1Q gate error", Some(self.gate_error_1q)),
            ("2Q gate error", Some(self.gate_error_2q)),
            ("Readout error", Some(self.readout_error)),
            ("Crosstalk", self.crosstalk),
        ];
        for (label, rate) in rates {
            if let Some(r) = rate {
                Probability::new(r).map_err(|_| {
                    QcError::CalibrationError(format!("{} must be in [0,1]: {}", label, r))
                })?;
            }
        }

        Ok(())
    }

    // ========================================================================
    // Derived Quantities
    // ========================================================================

    /// Single-qubit depolarizing rate, the headline noise figure
    pub fn effective_depol(&self) -> f64 {
        self.gate_error_1q
    }

    /// 1 - single-qubit error
    pub fn fidelity_1q(&self) -> f64 {
        1.0 - self.gate_error_1q
    }

    /// 1 - two-qubit error
    pub fn fidelity_2q(&self) -> f64 {
        1.0 - self.gate_error_2q
    }

    /// 1 - readout error
    pub fn fidelity_readout(&self) -> f64 {
        1.0 - self.readout_error
    }

    /// Probability of T1 decay within `time_us`
    pub fn t1_decay_prob(&self, time_us: f64) -> f64 {
        if self.t1_us.is_infinite() || time_us <= 0.0 {
            0.0
        } else {
            1.0 - (-time_us / self.t1_us).exp()
        }
    }

    /// Probability of losing phase coherence within `time_us`
    pub fn t2_dephasing_prob(&self, time_us: f64) -> f64 {
        if self.t2_us.is_infinite() || time_us <= 0.0 {
            0.0
        } else {
            1.0 - (-time_us / self.t2_us).exp()
        }
    }

    /// Product of gate, readout and T2 decoherence fidelities
    pub fn estimate_circuit_fidelity(
        &self,
        num_1q_gates: usize,
        num_2q_gates: usize,
        num_measurements: usize,
        circuit_time_us: f64,
    ) -> f64 {
        let gate_fidelity = self.fidelity_1q().powi(num_1q_gates as i32)
            * self.fidelity_2q().powi(num_2q_gates as i32);
        let readout_fidelity = self.fidelity_readout().powi(num_measurements as i32);

        gate_fidelity * readout_fidelity * (1.0 - self.t2_dephasing_prob(circuit_time_us))
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::ibm_typical()
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NoiseModel(T1={:.0}μs, T2={:.0}μs, 1Q={:.4}, 2Q={:.4}, RO={:.4})",
            self.t1_us, self.t2_us, self.gate_error_1q, self.gate_error_2q, self.readout_error
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
