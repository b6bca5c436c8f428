//! Dense statevector
//!
//! Amplitudes are stored little-endian: bit `q` of an index is the value of
//! qubit `q`, so the basis label of index `i` prints qubit 0 rightmost.

use num_complex::Complex64;
use qcirc_core::constants::execution::MAX_SIMULATOR_QUBITS;
use qcirc_core::error::{QcError, QcResult};
use qcirc_core::matrix::{self, Matrix2};
use qcirc_core::{Bitstring, Circuit, Gate, QubitId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Probabilities below this are left out of [`Statevector::probabilities_dict`]
const PROB_CUTOFF: f64 = 1e-12;

/// Pure state of `num_qubits` qubits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statevector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl Statevector {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// The all-zero state |0...0⟩
    pub fn zero(num_qubits: usize) -> Self {
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            num_qubits,
            amplitudes,
        }
    }

    /// Build from raw amplitudes; the length must be a power of two and the
    /// vector normalised
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> QcResult<Self> {
        let dim = amplitudes.len();
        if dim == 0 || !dim.is_power_of_two() {
            return Err(QcError::BackendError(format!(
                "statevector length {} is not a power of two",
                dim
            )));
        }
        let sv = Self {
            num_qubits: dim.trailing_zeros() as usize,
            amplitudes,
        };
        if (sv.norm() - 1.0).abs() > 1e-6 {
            return Err(QcError::BackendError(format!(
                "statevector norm {:.6} is not 1",
                sv.norm()
            )));
        }
        Ok(sv)
    }

    /// Evolve |0...0⟩ through the unitary part of `circuit`
    ///
    /// Measurements and resets are rejected; directives are skipped.
    pub fn from_circuit(circuit: &Circuit) -> QcResult<Self> {
        if circuit.num_qubits() > MAX_SIMULATOR_QUBITS {
            return Err(QcError::QubitOutOfRange {
                qubit: circuit.num_qubits(),
                max: MAX_SIMULATOR_QUBITS,
            });
        }
        let mut sv = Self::zero(circuit.num_qubits());
        for gate in circuit.gates() {
            sv.apply(gate)?;
        }
        Ok(sv)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Hilbert space dimension
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// All amplitudes, index order
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Amplitude of basis state `index`
    pub fn amplitude(&self, index: usize) -> Option<Complex64> {
        self.amplitudes.get(index).copied()
    }

    /// Iterate over `(index, amplitude)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Complex64)> {
        self.amplitudes.iter().enumerate()
    }

    /// Basis label of `index`, qubit 0 rightmost
    pub fn label(&self, index: usize) -> String {
        Bitstring::from_usize(index, self.num_qubits).to_string()
    }

    // ========================================================================
    // Evolution
    // ========================================================================

    /// Apply a unitary gate or directive
    pub fn apply(&mut self, gate: &Gate) -> QcResult<()> {
        if let Some(&q) = gate.qubits().iter().find(|&&q| q >= self.num_qubits) {
            return Err(QcError::GateQubitMismatch {
                qubit: q,
                num_qubits: self.num_qubits,
            });
        }
        match gate {
            Gate::Measure(..) | Gate::Reset(_) => Err(QcError::NonUnitaryInstruction(format!(
                "'{}' cannot be applied to a statevector",
                gate.name()
            ))),
            g => matrix::apply_unitary(&mut self.amplitudes, g),
        }
    }

    /// Apply an arbitrary 2x2 operator to qubit `q` (not renormalised)
    pub fn apply_matrix(&mut self, q: QubitId, m: &Matrix2) {
        matrix::apply_1q(&mut self.amplitudes, q, m);
    }

    /// Rescale to unit norm; a zero vector is left alone
    pub fn renormalize(&mut self) {
        let n = self.norm();
        if n > 0.0 {
            for a in &mut self.amplitudes {
                *a /= n;
            }
        }
    }

    // ========================================================================
    // Measurement
    // ========================================================================

    /// Probability that qubit `q` reads 1
    pub fn prob_one(&self, q: QubitId) -> f64 {
        let mask = 1usize << q;
        self.iter()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Projective measurement of qubit `q`; the state collapses
    pub fn measure_qubit<R: Rng + ?Sized>(&mut self, q: QubitId, rng: &mut R) -> bool {
        let p1 = self.prob_one(q);
        let outcome = rng.gen::<f64>() < p1;
        let mask = 1usize << q;
        for (i, a) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) != outcome {
                *a = Complex64::new(0.0, 0.0);
            }
        }
        self.renormalize();
        outcome
    }

    /// Measure qubit `q` and flip it back to |0⟩ if needed
    pub fn reset_qubit<R: Rng + ?Sized>(&mut self, q: QubitId, rng: &mut R) {
        if self.measure_qubit(q, rng) {
            let mask = 1usize << q;
            for i in 0..self.amplitudes.len() {
                if i & mask == 0 {
                    self.amplitudes.swap(i, i | mask);
                }
            }
        }
    }

    /// Born-rule probability of every basis state
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Non-negligible probabilities keyed by basis label
    pub fn probabilities_dict(&self) -> BTreeMap<String, f64> {
        self.probabilities()
            .into_iter()
            .enumerate()
            .filter(|(_, p)| *p > PROB_CUTOFF)
            .map(|(i, p)| (self.label(i), p))
            .collect()
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.amplitudes
            .iter()
            .map(|a| a.norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    /// ⟨self|other⟩
    pub fn inner(&self, other: &Statevector) -> Complex64 {
        self.amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum()
    }

    /// Equal up to a global phase
    pub fn equiv(&self, other: &Statevector) -> bool {
        self.num_qubits == other.num_qubits
            && (self.inner(other).norm() - self.norm() * other.norm()).abs() < 1e-9
    }
}

impl fmt::Display for Statevector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amps: Vec<String> = self
            .amplitudes
            .iter()
            .map(|a| format!("{:.4}{:+.4}j", a.re, a.im))
            .collect();
        let dims = vec!["2"; self.num_qubits].join(", ");
        write!(f, "Statevector([{}], dims=({}))", amps.join(", "), dims)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qcirc_core::CircuitBuilder;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn bell() -> Statevector {
        let circuit = CircuitBuilder::new(2, 0).h(0).cx(0, 1).build().unwrap();
        Statevector::from_circuit(&circuit).unwrap()
    }

    #[test]
    fn test_zero_state() {
        let sv = Statevector::zero(3);
        assert_eq!(sv.dim(), 8);
        assert_eq!(sv.amplitude(0), Some(Complex64::new(1.0, 0.0)));
        assert_relative_eq!(sv.norm(), 1.0);
    }

    #[test]
    fn test_bell_amplitudes() {
        let sv = bell();
        assert_relative_eq!(sv.amplitudes()[0].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(sv.amplitudes()[3].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(sv.amplitudes()[1].norm(), 0.0, epsilon = 1e-12);

        let probs = sv.probabilities_dict();
        assert_eq!(probs.keys().collect::<Vec<_>>(), vec!["00", "11"]);
        assert_relative_eq!(probs["11"], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_little_endian_labels() {
        let circuit = CircuitBuilder::new(3, 0).x(0).build().unwrap();
        let sv = Statevector::from_circuit(&circuit).unwrap();
        assert_eq!(sv.probabilities_dict().keys().next().unwrap(), "001");
    }

    #[test]
    fn test_measure_collapses() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut sv = bell();
        let first = sv.measure_qubit(0, &mut rng);
        let second = sv.measure_qubit(1, &mut rng);
        assert_eq!(first, second);
        assert_relative_eq!(sv.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            let mut sv = bell();
            sv.reset_qubit(1, &mut rng);
            assert_relative_eq!(sv.prob_one(1), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_equiv_ignores_global_phase() {
        let a = bell();
        let phased: Vec<_> = a
            .amplitudes()
            .iter()
            .map(|z| z * Complex64::from_polar(1.0, 0.7))
            .collect();
        let b = Statevector::from_amplitudes(phased).unwrap();
        assert!(a.equiv(&b));
        assert!(!a.equiv(&Statevector::zero(2)));
    }

    #[test]
    fn test_rejects_non_unitary() {
        let mut sv = Statevector::zero(1);
        assert!(sv.apply(&Gate::Measure(0, 0)).is_err());
        assert!(sv.apply(&Gate::H(3)).is_err());
        assert!(Statevector::from_amplitudes(vec![Complex64::new(1.0, 0.0); 3]).is_err());
    }

    #[test]
    fn test_display() {
        let text = Statevector::zero(1).to_string();
        assert!(text.starts_with("Statevector([1.0000+0.0000j"));
        assert!(text.ends_with("dims=(2))"));
    }
}
