//! Simulator backend for qcirc
//!
//! Two execution strategies:
//!
//! * **statevector sampling**: with no noise, no reset and only terminal
//!   measurements the circuit is evolved once and every shot is drawn from
//!   the final distribution.
//! * **trajectories**: otherwise each shot is simulated on its own. After
//!   each gate a random non-identity Pauli is applied with the gate's error
//!   probability, then every touched qubit undergoes an amplitude-damping
//!   and dephasing jump sized by the gate duration. Measurements collapse the
//!   state and readout errors flip the recorded bit.

use crate::execution::{format_key, register_layout, Backend, ExecutionMetadata, ExecutionResult};
use crate::statevector::Statevector;
use num_complex::Complex64;
use qcirc_calibration::CalibrationInfo;
use qcirc_core::constants::execution::MAX_SIMULATOR_QUBITS;
use qcirc_core::{Circuit, Counts, Gate, QcError, QcResult, QubitId};
use qcirc_noise::{GateTimes, NoiseModel, NoiseVector, NoiseVectorSet, RelaxationParams};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::time::Instant;

/// Registry name of the general-purpose simulator
pub const AER_SIMULATOR: &str = "aer_simulator";

/// Registry name of the simulator that always returns the final state
pub const STATEVECTOR_SIMULATOR: &str = "statevector_simulator";

/// Simulator backend with noise model
#[derive(Debug, Clone)]
pub struct SimulatorBackend {
    /// Backend name
    name: String,

    /// Number of qubits
    num_qubits: usize,

    /// Uniform noise, used for qubits without a noise vector
    noise_model: NoiseModel,

    /// Per-qubit noise
    noise_vectors: Option<NoiseVectorSet>,

    /// Two-qubit error per coupled pair, keyed `(min, max)`
    edge_errors: HashMap<(QubitId, QubitId), f64>,

    /// Durations driving relaxation
    gate_times: GateTimes,

    /// Calibration info
    calibration: Option<CalibrationInfo>,

    /// Random seed
    seed: Option<u64>,

    /// Keep per-shot outcomes
    memory: bool,

    /// Return the final state even without `save_statevector`
    final_state: bool,
}

impl SimulatorBackend {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create new simulator backend
    pub fn new(num_qubits: usize, noise_model: NoiseModel) -> Self {
        Self {
            name: AER_SIMULATOR.to_string(),
            num_qubits,
            noise_model,
            noise_vectors: None,
            edge_errors: HashMap::new(),
            gate_times: GateTimes::default(),
            calibration: None,
            seed: None,
            memory: false,
            final_state: false,
        }
    }

    /// Create ideal (noiseless) simulator
    pub fn ideal(num_qubits: usize) -> Self {
        Self::new(num_qubits, NoiseModel::ideal())
    }

    /// Ideal simulator at full size, named `aer_simulator`
    pub fn aer() -> Self {
        Self::ideal(MAX_SIMULATOR_QUBITS)
    }

    /// Ideal simulator that attaches the final statevector to every result
    pub fn statevector() -> Self {
        let mut backend = Self::aer().with_name(STATEVECTOR_SIMULATOR);
        backend.final_state = true;
        backend
    }

    /// Create IBM-typical simulator
    pub fn ibm_typical(num_qubits: usize) -> Self {
        Self::new(num_qubits, NoiseModel::ibm_typical())
    }

    /// Create from depolarizing error rate
    pub fn from_depol(num_qubits: usize, p_depol: f64) -> QcResult<Self> {
        let noise_model = NoiseModel::from_depol(p_depol)?;
        Ok(Self::new(num_qubits, noise_model))
    }

    /// Simulator reproducing a calibrated device: per-qubit noise vectors,
    /// per-edge two-qubit errors and the device gate times
    pub fn from_calibration(calibration: &CalibrationInfo) -> Self {
        Self::new(calibration.num_qubits(), calibration.to_noise_model())
            .with_name(&calibration.backend_name)
            .with_calibration(calibration.clone())
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set or clear the seed
    pub fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Take noise, edge errors and gate times from calibration info
    pub fn with_calibration(mut self, calibration: CalibrationInfo) -> Self {
        self.noise_vectors = Some(calibration.to_noise_vectors());
        self.edge_errors = calibration
            .gate_errors_2q
            .iter()
            .map(|e| ((e.a.min(e.b), e.a.max(e.b)), e.error))
            .collect();
        self.gate_times = calibration.to_gate_times();
        self.calibration = Some(calibration);
        self
    }

    /// Set per-qubit noise
    pub fn with_noise_vectors(mut self, vectors: NoiseVectorSet) -> Self {
        self.noise_vectors = Some(vectors);
        self
    }

    /// Set gate durations
    pub fn with_gate_times(mut self, gate_times: GateTimes) -> Self {
        self.gate_times = gate_times;
        self
    }

    /// Record every shot's key in the result
    pub fn with_memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Uniform noise model
    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    /// Gate durations
    pub fn gate_times(&self) -> &GateTimes {
        &self.gate_times
    }

    /// Configured seed
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// True when no error source is active
    pub fn is_noiseless(&self) -> bool {
        let edges_clean = self.edge_errors.values().all(|&e| e == 0.0);
        match &self.noise_vectors {
            Some(set) => edges_clean && set.vectors().iter().all(vector_is_ideal),
            None => edges_clean && self.noise_model.is_ideal(),
        }
    }

    /// Noise acting on `qubit`
    pub fn qubit_noise(&self, qubit: QubitId) -> NoiseVector {
        self.noise_vectors
            .as_ref()
            .and_then(|set| set.get(qubit))
            .cloned()
            .unwrap_or_else(|| NoiseVector::from_noise_model(qubit, &self.noise_model))
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    fn make_rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Ideal evolution up to the first `save_statevector` (or the end, when
    /// the backend returns final states); measurements collapse, resets reset
    fn snapshot(&self, circuit: &Circuit, rng: &mut ChaCha8Rng) -> QcResult<Option<Statevector>> {
        let wants_save = circuit.gates().iter().any(|g| matches!(g, Gate::SaveStatevector));
        if !wants_save && !self.final_state {
            return Ok(None);
        }

        let mut state = Statevector::zero(circuit.num_qubits());
        for gate in circuit.gates() {
            match gate {
                Gate::SaveStatevector => return Ok(Some(state)),
                Gate::Measure(q, _) => {
                    state.measure_qubit(*q, rng);
                }
                Gate::Reset(q) => state.reset_qubit(*q, rng),
                g => state.apply(g)?,
            }
        }
        Ok(Some(state))
    }

    /// Evolve once and draw every shot from the final distribution
    fn sample_statevector(
        &self,
        circuit: &Circuit,
        shots: u64,
        rng: &mut ChaCha8Rng,
    ) -> QcResult<Vec<Vec<bool>>> {
        let mut state = Statevector::zero(circuit.num_qubits());
        let mut measures = Vec::new();
        for gate in circuit.gates() {
            match gate {
                Gate::Measure(q, c) => measures.push((*q, *c)),
                g => state.apply(g)?,
            }
        }

        let mut cdf = Vec::with_capacity(state.dim());
        let mut acc = 0.0;
        for p in state.probabilities() {
            acc += p;
            cdf.push(acc);
        }

        let last = cdf.len() - 1;
        let outcomes = (0..shots)
            .map(|_| {
                let r = rng.gen::<f64>() * acc;
                let index = cdf.partition_point(|&c| c <= r).min(last);
                let mut bits = vec![false; circuit.num_clbits()];
                for &(q, c) in &measures {
                    bits[c] = (index >> q) & 1 == 1;
                }
                bits
            })
            .collect();
        Ok(outcomes)
    }

    /// One noisy shot
    fn run_trajectory(
        &self,
        circuit: &Circuit,
        noise: &[NoiseVector],
        rng: &mut ChaCha8Rng,
    ) -> QcResult<Vec<bool>> {
        let mut state = Statevector::zero(circuit.num_qubits());
        let mut bits = vec![false; circuit.num_clbits()];

        for gate in circuit.gates() {
            match gate {
                g if g.is_directive() => {}
                Gate::Measure(q, c) => {
                    let mut outcome = state.measure_qubit(*q, rng);
                    if rng.gen::<f64>() < noise[*q].readout_error {
                        outcome = !outcome;
                    }
                    bits[*c] = outcome;
                }
                Gate::Reset(q) => state.reset_qubit(*q, rng),
                g => {
                    state.apply(g)?;
                    let qubits = g.qubits();
                    if rng.gen::<f64>() < self.gate_error(g, noise) {
                        apply_random_pauli(&mut state, &qubits, rng)?;
                    }
                    let duration = self.gate_times.gate_duration(g);
                    for &q in &qubits {
                        relax(&mut state, q, noise[q].relaxation(duration), rng);
                    }
                }
            }
        }

        Ok(bits)
    }

    /// Depolarizing probability of one gate
    fn gate_error(&self, gate: &Gate, noise: &[NoiseVector]) -> f64 {
        let qs = gate.qubits();
        match qs.as_slice() {
            [q] => noise[*q].gate_error_1q,
            [a, b] => self.pair_error(*a, *b, noise),
            [a, b, c] => {
                let e = (self.pair_error(*a, *b, noise)
                    + self.pair_error(*b, *c, noise)
                    + self.pair_error(*a, *c, noise))
                    / 3.0;
                1.0 - (1.0 - e).powi(6)
            }
            _ => 0.0,
        }
    }

    fn pair_error(&self, a: QubitId, b: QubitId, noise: &[NoiseVector]) -> f64 {
        self.edge_errors
            .get(&(a.min(b), a.max(b)))
            .copied()
            .unwrap_or_else(|| (noise[a].gate_error_2q + noise[b].gate_error_2q) / 2.0)
    }

    fn tally(
        &self,
        outcomes: Vec<Vec<bool>>,
        registers: &[(String, usize)],
    ) -> (Counts, Option<Vec<String>>) {
        let mut counts = Counts::new();
        let mut memory = self.memory.then(Vec::new);
        if registers.is_empty() {
            return (counts, memory);
        }

        let mut keys: HashMap<Vec<bool>, String> = HashMap::new();
        for bits in outcomes {
            let key = keys
                .entry(bits)
                .or_insert_with_key(|b| format_key(b, registers))
                .clone();
            if let Some(mem) = memory.as_mut() {
                mem.push(key.clone());
            }
            *counts.entry(key).or_insert(0) += 1;
        }
        (counts, memory)
    }
}

fn vector_is_ideal(v: &NoiseVector) -> bool {
    v.gate_error_1q == 0.0
        && v.gate_error_2q == 0.0
        && v.readout_error == 0.0
        && v.t1.is_infinite()
        && v.t2.is_infinite()
}

/// Apply one of the `4^k - 1` non-identity Paulis on `qubits`
fn apply_random_pauli<R: Rng>(
    state: &mut Statevector,
    qubits: &[QubitId],
    rng: &mut R,
) -> QcResult<()> {
    let total = 1usize << (2 * qubits.len());
    let mut code = rng.gen_range(1..total);
    for &q in qubits {
        let pauli = match code & 3 {
            1 => Some(Gate::X(q)),
            2 => Some(Gate::Y(q)),
            3 => Some(Gate::Z(q)),
            _ => None,
        };
        if let Some(p) = pauli {
            state.apply(&p)?;
        }
        code >>= 2;
    }
    Ok(())
}

/// Amplitude damping followed by a dephasing jump
fn relax<R: Rng>(state: &mut Statevector, q: QubitId, params: RelaxationParams, rng: &mut R) {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);

    if params.gamma > 0.0 {
        let p_decay = params.gamma * state.prob_one(q);
        let kraus = if rng.gen::<f64>() < p_decay {
            [[zero, one * params.gamma.sqrt()], [zero, zero]]
        } else {
            [[one, zero], [zero, one * (1.0 - params.gamma).sqrt()]]
        };
        state.apply_matrix(q, &kraus);
        state.renormalize();
    }

    if params.p_phase > 0.0 && rng.gen::<f64>() < params.p_phase {
        state.apply_matrix(q, &[[one, zero], [zero, -one]]);
    }
}

impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QcResult<ExecutionResult> {
        self.check_shots(shots)?;
        if circuit.num_qubits() > self.num_qubits {
            return Err(QcError::QubitOutOfRange {
                qubit: circuit.num_qubits(),
                max: self.num_qubits,
            });
        }

        let started = Instant::now();
        let flat = circuit.unrolled()?;
        let registers = register_layout(&flat);
        let mut rng = self.make_rng();

        let statevector = self.snapshot(&flat, &mut rng)?;

        let sampled =
            self.is_noiseless() && !flat.has_reset() && !flat.has_mid_circuit_measurement();
        let outcomes = if flat.count_measurements() == 0 {
            vec![vec![false; flat.num_clbits()]; shots as usize]
        } else if sampled {
            self.sample_statevector(&flat, shots, &mut rng)?
        } else {
            let noise: Vec<NoiseVector> =
                (0..flat.num_qubits()).map(|q| self.qubit_noise(q)).collect();
            (0..shots)
                .map(|_| self.run_trajectory(&flat, &noise, &mut rng))
                .collect::<QcResult<_>>()?
        };

        let (counts, memory) = self.tally(outcomes, &registers);
        let method = if sampled { "statevector" } else { "trajectory" };
        let elapsed = started.elapsed().as_millis() as u64;

        log::info!(
            "{}: '{}' on {} qubits, {} shots, {} method, {} ms",
            self.name,
            circuit.name(),
            flat.num_qubits(),
            shots,
            method,
            elapsed
        );

        Ok(ExecutionResult {
            counts,
            shots,
            statevector,
            memory,
            metadata: ExecutionMetadata {
                backend: self.name.clone(),
                circuit_name: circuit.name().to_string(),
                registers,
                method: method.to_string(),
                execution_time_ms: Some(elapsed),
                simulated: true,
                seed: self.seed,
                ..Default::default()
            },
        })
    }

    fn calibration(&self) -> Option<&CalibrationInfo> {
        self.calibration.as_ref()
    }

    fn is_simulator(&self) -> bool {
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_calibration::fake_devices;
    use qcirc_core::{CircuitBuilder, ClassicalRegister, QuantumRegister};
    use std::f64::consts::PI;

    #[test]
    fn test_simulator_ideal() {
        let backend = SimulatorBackend::ideal(3).with_seed(42);
        let circuit = CircuitBuilder::new(2, 2)
            .h(0)
            .cx(0, 1)
            .measure(0, 0)
            .measure(1, 1)
            .build()
            .unwrap();

        let result = backend.execute(&circuit, 1000).unwrap();

        let p00 = result.probability("00");
        let p11 = result.probability("11");
        assert!(p00 > 0.4 && p00 < 0.6, "P(00) = {}", p00);
        assert!((p00 + p11 - 1.0).abs() < 1e-12);
        assert_eq!(result.total_counts(), 1000);
        assert_eq!(result.metadata.method, "statevector");
    }

    #[test]
    fn test_simulator_noisy() {
        let backend = SimulatorBackend::from_depol(3, 0.01).unwrap().with_seed(42);
        let circuit = CircuitBuilder::new(2, 0)
            .h(0)
            .cx(0, 1)
            .measure_all()
            .build()
            .unwrap();

        let result = backend.execute(&circuit, 1000).unwrap();

        let p00 = result.probability("00");
        let p11 = result.probability("11");
        assert!(p00 + p11 > 0.85, "P(00)+P(11) = {}", p00 + p11);
        assert!(p00 + p11 < 1.0);
        assert_eq!(result.metadata.method, "trajectory");
    }

    #[test]
    fn test_rz_gate() {
        let backend = SimulatorBackend::ideal(2).with_seed(42);
        let circuit = CircuitBuilder::new(1, 1)
            .h(0)
            .rz(PI, 0)
            .h(0)
            .measure(0, 0)
            .build()
            .unwrap();

        let result = backend.execute(&circuit, 1000).unwrap();
        assert_eq!(result.get_counts().get("1"), Some(&1000));
    }

    #[test]
    fn test_qubit_limit() {
        let backend = SimulatorBackend::ideal(3);
        let circuit = Circuit::new(5, 0);
        assert!(matches!(
            backend.execute(&circuit, 100),
            Err(QcError::QubitOutOfRange { .. })
        ));
    }

    #[test]
    fn test_shot_limits() {
        let backend = SimulatorBackend::ideal(1);
        let circuit = CircuitBuilder::new(1, 1).measure(0, 0).build().unwrap();
        assert_eq!(
            backend.execute(&circuit, 0).unwrap_err(),
            QcError::ShotsOutOfRange(0, 1, 100_000)
        );
        assert!(backend.execute(&circuit, 100_001).is_err());
        assert!(backend.execute(&circuit, 100_000).is_ok());
    }

    #[test]
    fn test_seed_reproducibility() {
        let backend1 = SimulatorBackend::from_depol(3, 0.02).unwrap().with_seed(42);
        let backend2 = SimulatorBackend::from_depol(3, 0.02).unwrap().with_seed(42);
        let circuit = CircuitBuilder::new(3, 0)
            .h(0)
            .cx(0, 1)
            .cx(1, 2)
            .measure_all()
            .build()
            .unwrap();

        let result1 = backend1.execute(&circuit, 200).unwrap();
        let result2 = backend2.execute(&circuit, 200).unwrap();
        assert_eq!(result1.counts, result2.counts);
    }

    #[test]
    fn test_save_statevector() {
        let backend = SimulatorBackend::aer().with_seed(3);
        let circuit = CircuitBuilder::new(2, 0)
            .h(0)
            .cx(0, 1)
            .save_statevector()
            .build()
            .unwrap();

        let result = backend.execute(&circuit, 1).unwrap();
        let sv = result.get_statevector().unwrap();
        let probs = sv.probabilities_dict();
        assert_eq!(probs.len(), 2);
        assert!((probs["00"] - 0.5).abs() < 1e-12);
        assert!(result.counts.is_empty());
    }

    #[test]
    fn test_statevector_simulator_returns_final_state() {
        let backend = SimulatorBackend::statevector();
        let circuit = CircuitBuilder::new(1, 0).x(0).build().unwrap();
        let result = backend.execute(&circuit, 1).unwrap();
        assert!((result.get_statevector().unwrap().prob_one(0) - 1.0).abs() < 1e-12);

        let plain = SimulatorBackend::aer().execute(&circuit, 1).unwrap();
        assert_eq!(plain.get_statevector().unwrap_err(), QcError::NoStatevector);
    }

    #[test]
    fn test_register_keys() {
        let mut circuit = Circuit::from_registers(
            vec![QuantumRegister::new(2, "q")],
            vec![ClassicalRegister::new(1, "lo"), ClassicalRegister::new(2, "hi")],
        )
        .unwrap();
        circuit.x(1).unwrap();
        circuit.measure(0, 0).unwrap();
        circuit.measure(0, 1).unwrap();
        circuit.measure(1, 2).unwrap();

        let result = SimulatorBackend::aer().with_seed(1).execute(&circuit, 50).unwrap();
        // hi = [q0, q1] = [0, 1], lo = [q0] = 0
        assert_eq!(result.counts.get("10 0"), Some(&50));
        assert_eq!(result.marginal_counts("hi").unwrap()["10"], 50);
    }

    #[test]
    fn test_mid_circuit_measurement_and_reset() {
        let circuit = CircuitBuilder::new(1, 2)
            .x(0)
            .measure(0, 0)
            .reset(0)
            .measure(0, 1)
            .build()
            .unwrap();
        let result = SimulatorBackend::aer().with_seed(9).execute(&circuit, 100).unwrap();
        assert_eq!(result.metadata.method, "trajectory");
        assert_eq!(result.counts.get("01"), Some(&100));
    }

    #[test]
    fn test_memory() {
        let circuit = CircuitBuilder::new(1, 1).h(0).measure(0, 0).build().unwrap();
        let result = SimulatorBackend::aer()
            .with_seed(5)
            .with_memory(true)
            .execute(&circuit, 64)
            .unwrap();
        let memory = result.get_memory().unwrap();
        assert_eq!(memory.len(), 64);
        let ones = memory.iter().filter(|k| k.as_str() == "1").count() as u64;
        assert_eq!(result.counts.get("1").copied().unwrap_or(0), ones);
    }

    #[test]
    fn test_random_pauli_keeps_norm() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut state = Statevector::zero(2);
        for _ in 0..20 {
            apply_random_pauli(&mut state, &[0, 1], &mut rng).unwrap();
        }
        assert!((state.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_random_pauli_reports_bad_qubit() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut state = Statevector::zero(1);
        assert!(matches!(
            apply_random_pauli(&mut state, &[3], &mut rng),
            Err(QcError::GateQubitMismatch { qubit: 3, num_qubits: 1 })
        ));
    }

    #[test]
    fn test_relaxation_decays_excited_state() {
        // Slow gates against a short T1: |1> should mostly relax to |0>
        let model = NoiseModel::ideal().with_t1(1.0).with_t2(2.0);
        let backend = SimulatorBackend::new(1, model)
            .with_gate_times(GateTimes::new(5_000.0, 10_000.0, 1_000.0))
            .with_seed(11);
        let circuit = CircuitBuilder::new(1, 1).x(0).measure(0, 0).build().unwrap();

        let result = backend.execute(&circuit, 500).unwrap();
        assert!(result.probability("0") > 0.9, "P(0) = {}", result.probability("0"));
    }

    #[test]
    fn test_calibrated_simulator() {
        let backend = SimulatorBackend::from_calibration(&fake_devices::manila());
        assert_eq!(backend.name(), "fake_manila");
        assert_eq!(backend.num_qubits(), 5);
        assert!(!backend.is_noiseless());
        assert!(backend.calibration().is_some());
        assert!(SimulatorBackend::aer().is_noiseless());
        assert!((backend.qubit_noise(2).readout_error - 0.025).abs() < 1e-12);
    }
}
