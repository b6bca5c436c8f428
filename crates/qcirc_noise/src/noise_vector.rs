//! Per-qubit noise parameters
//!
//! Real devices are heterogeneous: every qubit carries its own coherence
//! times and error rates. [`NoiseVector`] holds one qubit's figures and
//! derives the channel parameters the trajectory simulator samples from.

use crate::noise_model::NoiseModel;
use qcirc_core::QubitId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Relaxation Channel
// ============================================================================

/// Jump probabilities for one qubit over a fixed duration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelaxationParams {
    /// Amplitude damping probability, `1 - exp(-t/T1)`
    pub gamma: f64,
    /// Pure-dephasing Z flip probability, `(1 - exp(-t/T_phi)) / 2`
    pub p_phase: f64,
}

impl RelaxationParams {
    /// True when neither jump can occur
    pub fn is_trivial(&self) -> bool {
        self.gamma <= 0.0 && self.p_phase <= 0.0
    }
}

// ============================================================================
// NoiseVector
// ============================================================================

/// Noise figures for a single physical qubit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseVector {
    /// Physical qubit index
    pub qubit_id: QubitId,

    /// T1 relaxation time in microseconds
    pub t1: f64,

    /// T2 dephasing time in microseconds
    pub t2: f64,

    /// Single-qubit gate error probability
    pub gate_error_1q: f64,

    /// Average two-qubit gate error on edges touching this qubit
    pub gate_error_2q: f64,

    /// Readout flip probability
    pub readout_error: f64,
}

impl NoiseVector {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Noise figures for one qubit (T1/T2 in microseconds)
    pub fn new(
        qubit_id: QubitId,
        t1: f64,
        t2: f64,
        gate_error_1q: f64,
        gate_error_2q: f64,
        readout_error: f64,
    ) -> Self {
        Self {
            qubit_id,
            t1,
            t2,
            gate_error_1q,
            gate_error_2q,
            readout_error,
        }
    }

    /// Copy the uniform figures of a model onto one qubit
    pub fn from_noise_model(qubit_id: QubitId, model: &NoiseModel) -> Self {
        Self {
            qubit_id,
            t1: model.t1_us(),
            t2: model.t2_us(),
            gate_error_1q: model.gate_error_1q(),
            gate_error_2q: model.gate_error_2q(),
            readout_error: model.readout_error(),
        }
    }

    /// Noiseless qubit
    pub fn ideal(qubit_id: QubitId) -> Self {
        Self::from_noise_model(qubit_id, &NoiseModel::ideal())
    }

    // ========================================================================
    // Channel Parameters
    // ========================================================================

    /// Relaxation and dephasing jump probabilities over `duration_ns`
    ///
    /// The pure-dephasing rate is `1/T_phi = 1/T2 - 1/(2 T1)`. A non-positive
    /// rate (T2 at its 2*T1 limit, or infinite T2) yields `p_phase = 0`.
    pub fn relaxation(&self, duration_ns: f64) -> RelaxationParams {
        if duration_ns <= 0.0 {
            return RelaxationParams::default();
        }
        let t_us = duration_ns / 1000.0;

        let gamma = if self.t1.is_finite() && self.t1 > 0.0 {
            1.0 - (-t_us / self.t1).exp()
        } else {
            0.0
        };

        let rate_t1 = if self.t1.is_finite() && self.t1 > 0.0 {
            1.0 / (2.0 * self.t1)
        } else {
            0.0
        };
        let rate_t2 = if self.t2.is_finite() && self.t2 > 0.0 {
            1.0 / self.t2
        } else {
            0.0
        };
        let rate_phi = rate_t2 - rate_t1;

        let p_phase = if rate_phi > 0.0 {
            (1.0 - (-t_us * rate_phi).exp()) / 2.0
        } else {
            0.0
        };

        RelaxationParams { gamma, p_phase }
    }

    // ========================================================================
    // Fidelity Estimations
    // ========================================================================

    /// Gate fidelity for a sequence of 1q and 2q gates
    pub fn estimate_gate_fidelity(&self, num_1q_gates: usize, num_2q_gates: usize) -> f64 {
        (1.0 - self.gate_error_1q).powi(num_1q_gates as i32)
            * (1.0 - self.gate_error_2q).powi(num_2q_gates as i32)
    }

    /// T2 decoherence probability over an idle time in microseconds
    pub fn estimate_decoherence(&self, time_us: f64) -> f64 {
        if time_us <= 0.0 || self.t2.is_infinite() {
            0.0
        } else {
            1.0 - (-time_us / self.t2).exp()
        }
    }

    /// Probability that `num_measurements` readouts are all correct
    pub fn estimate_readout_fidelity(&self, num_measurements: usize) -> f64 {
        (1.0 - self.readout_error).powi(num_measurements as i32)
    }

    /// Gate, readout and decoherence fidelity combined
    pub fn estimate_circuit_fidelity(
        &self,
        num_1q_gates: usize,
        num_2q_gates: usize,
        num_measurements: usize,
        circuit_time_us: f64,
    ) -> f64 {
        self.estimate_gate_fidelity(num_1q_gates, num_2q_gates)
            * self.estimate_readout_fidelity(num_measurements)
            * (1.0 - self.estimate_decoherence(circuit_time_us))
    }

    // ========================================================================
    // Quality Metrics
    // ========================================================================

    /// Quality score in [0, 1], higher is better
    ///
    /// Geometric mean of five fidelities; T1 and T2 are normalised against
    /// 200μs and 120μs.
    pub fn quality_score(&self) -> f64 {
        let t1_fidelity = if self.t1.is_finite() && self.t1 > 0.0 {
            (self.t1 / 200.0).min(1.0)
        } else {
            1.0
        };
        let t2_fidelity = if self.t2.is_finite() && self.t2 > 0.0 {
            (self.t2 / 120.0).min(1.0)
        } else {
            1.0
        };

        (t1_fidelity
            * t2_fidelity
            * (1.0 - self.gate_error_1q)
            * (1.0 - self.gate_error_2q)
            * (1.0 - self.readout_error))
            .max(0.0)
            .powf(0.2)
    }
}

impl fmt::Display for NoiseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Q{}: T1={:.0}μs T2={:.0}μs 1Q={:.4} 2Q={:.4} RO={:.4}",
            self.qubit_id,
            self.t1,
            self.t2,
            self.gate_error_1q,
            self.gate_error_2q,
            self.readout_error
        )
    }
}

// ============================================================================
// NoiseVectorSet
// ============================================================================

/// Noise vectors for every qubit of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseVectorSet {
    vectors: Vec<NoiseVector>,
}

impl NoiseVectorSet {
    /// Vectors are re-ordered by qubit id
    pub fn new(mut vectors: Vec<NoiseVector>) -> Self {
        vectors.sort_by_key(|v| v.qubit_id);
        Self { vectors }
    }

    /// Same figures on every qubit
    pub fn from_noise_model(num_qubits: usize, model: &NoiseModel) -> Self {
        let vectors = (0..num_qubits)
            .map(|q| NoiseVector::from_noise_model(q, model))
            .collect();
        Self { vectors }
    }

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.vectors.len()
    }

    /// Vector for a qubit
    pub fn get(&self, qubit: QubitId) -> Option<&NoiseVector> {
        self.vectors.iter().find(|v| v.qubit_id == qubit)
    }

    /// All vectors in qubit order
    pub fn vectors(&self) -> &[NoiseVector] {
        &self.vectors
    }

    fn finite_mean(&self, field: impl Fn(&NoiseVector) -> f64) -> f64 {
        if self.vectors.is_empty() {
            return 0.0;
        }
        let finite: Vec<f64> = self
            .vectors
            .iter()
            .map(field)
            .filter(|x| x.is_finite())
            .collect();
        if finite.is_empty() {
            f64::INFINITY
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        }
    }

    /// Mean T1 over qubits with finite T1
    pub fn avg_t1(&self) -> f64 {
        self.finite_mean(|v| v.t1)
    }

    /// Mean T2 over qubits with finite T2
    pub fn avg_t2(&self) -> f64 {
        self.finite_mean(|v| v.t2)
    }

    /// Mean single-qubit gate error
    pub fn avg_error_1q(&self) -> f64 {
        self.finite_mean(|v| v.gate_error_1q)
    }

    /// Mean two-qubit gate error
    pub fn avg_error_2q(&self) -> f64 {
        self.finite_mean(|v| v.gate_error_2q)
    }

    /// Mean readout error
    pub fn avg_readout_error(&self) -> f64 {
        self.finite_mean(|v| v.readout_error)
    }

    /// The `n` qubits with the highest quality score, best first
    pub fn best_qubits(&self, n: usize) -> Vec<QubitId> {
        let mut scored: Vec<_> = self
            .vectors
            .iter()
            .map(|v| (v.qubit_id, v.quality_score()))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(n).map(|(q, _)| q).collect()
    }

    /// Collapse to a uniform model of average values
    ///
    /// Falls back to [`NoiseModel::ibm_typical`] if the averages violate a
    /// physical constraint.
    pub fn to_noise_model(&self) -> NoiseModel {
        NoiseModel::new(
            self.avg_t1(),
            self.avg_t2(),
            self.avg_error_1q(),
            self.avg_error_2q(),
            self.avg_readout_error(),
        )
        .unwrap_or_else(|_| NoiseModel::ibm_typical())
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
    fn test_from_model() {
        let model = NoiseModel::ibm_typical();
        let nv = NoiseVector::from_noise_model(3, &model);
        assert_eq!(nv.qubit_id, 3);
        assert_eq!(nv.t1, model.t1_us());
    }

    #[test]
    fn test_relaxation_params() {
        let nv = NoiseVector::new(0, 100.0, 60.0, 0.0, 0.0, 0.0);
        let p = nv.relaxation(1000.0); // 1μs

        assert_relative_eq!(p.gamma, 1.0 - (-0.01f64).exp(), epsilon = 1e-12);
        // 1/T_phi = 1/60 - 1/200
        let rate_phi: f64 = 1.0 / 60.0 - 1.0 / 200.0;
        assert_relative_eq!(p.p_phase, (1.0 - (-rate_phi).exp()) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_relaxation_t2_limit_has_no_dephasing() {
        let nv = NoiseVector::new(0, 100.0, 200.0, 0.0, 0.0, 0.0);
        let p = nv.relaxation(500.0);
        assert!(p.gamma > 0.0);
        assert_eq!(p.p_phase, 0.0);
    }

    #[test]
    fn test_relaxation_ideal_is_trivial() {
        assert!(NoiseVector::ideal(0).relaxation(5000.0).is_trivial());
        assert!(NoiseVector::new(0, 100.0, 60.0, 0.0, 0.0, 0.0)
            .relaxation(0.0)
            .is_trivial());
    }

    #[test]
    fn test_decoherence_at_t2() {
        let nv = NoiseVector::new(0, 100.0, 60.0, 0.001, 0.01, 0.01);
        assert_relative_eq!(nv.estimate_decoherence(0.0), 0.0);
        assert_relative_eq!(nv.estimate_decoherence(60.0), 1.0 - (-1.0f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_set_lookup_and_averages() {
        let set = NoiseVectorSet::new(vec![
            NoiseVector::new(1, 120.0, 80.0, 0.001, 0.01, 0.02),
            NoiseVector::new(0, 80.0, 40.0, 0.003, 0.03, 0.04),
        ]);
        assert_eq!(set.vectors()[0].qubit_id, 0);
        assert_eq!(set.get(1).map(|v| v.t1), Some(120.0));
        assert_relative_eq!(set.avg_t1(), 100.0);
        assert_relative_eq!(set.avg_readout_error(), 0.03);
    }

    #[test]
    fn test_best_qubits() {
        let set = NoiseVectorSet::new(vec![
            NoiseVector::new(0, 100.0, 60.0, 0.002, 0.02, 0.02),
            NoiseVector::new(1, 150.0, 90.0, 0.001, 0.01, 0.01),
            NoiseVector::new(2, 120.0, 70.0, 0.0015, 0.015, 0.015),
        ]);
        assert_eq!(set.best_qubits(2), vec![1, 2]);
    }

    #[test]
    fn test_quality_score_ordering() {
        let good = NoiseVector::new(0, 200.0, 120.0, 0.0001, 0.005, 0.005);
        let bad = NoiseVector::new(1, 50.0, 30.0, 0.005, 0.05, 0.05);
        assert!(good.quality_score() > bad.quality_score());
    }
}
