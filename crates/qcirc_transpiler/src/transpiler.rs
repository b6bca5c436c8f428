//! Pass manager
//!
//! unroll → (3q decomposition) → layout → routing → basis translation →
//! optimisation. Optimisation level 0 skips the last stage, level 1 runs
//! one round, levels 2 and 3 iterate to a fixed point.

use crate::basis::{decompose_three_qubit, translate};
use crate::layout::{choose_layout, Layout, LayoutMethod};
use crate::optimize::{optimize_once, optimize_to_fixed_point};
use crate::routing::route;
use crate::target::Target;
use qcirc_core::error::{QcError, QcResult};
use qcirc_core::{Circuit, Gate, QuantumRegister};
use serde::{Deserialize, Serialize};

/// Highest accepted optimisation level
pub const MAX_OPTIMIZATION_LEVEL: u8 = 3;

/// Round limit for fixed-point optimisation
const MAX_OPTIMIZATION_ROUNDS: usize = 16;

/// Compiled circuit plus the qubit mapping that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranspileResult {
    /// Circuit on physical qubits, in the target basis
    pub circuit: Circuit,
    /// Placement before the first gate
    pub initial_layout: Layout,
    /// Placement after routing
    pub final_layout: Layout,
    /// SWAPs added by routing
    pub swaps_inserted: usize,
}

/// Circuit transpiler for a [`Target`]
#[derive(Debug, Clone)]
pub struct Transpiler {
    target: Target,
    optimization_level: u8,
    layout_method: Option<LayoutMethod>,
}

impl Transpiler {
    /// Transpiler at optimisation level 1
    pub fn new(target: Target) -> Self {
        Self {
            target,
            optimization_level: 1,
            layout_method: None,
        }
    }

    /// Set optimisation level, clamped to 0..=3
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(MAX_OPTIMIZATION_LEVEL);
        self
    }

    /// Force a layout method
    pub fn with_layout(mut self, method: LayoutMethod) -> Self {
        self.layout_method = Some(method);
        self
    }

    /// Device being compiled for
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Optimisation level (0-3)
    pub fn optimization_level(&self) -> u8 {
        self.optimization_level
    }

    /// Layout used when none is forced: dense from level 1 on a coupled target
    pub fn layout_method(&self) -> LayoutMethod {
        match self.layout_method {
            Some(m) => m,
            None if self.optimization_level >= 1 && self.target.topology.is_some() => {
                LayoutMethod::Dense
            }
            None => LayoutMethod::Trivial,
        }
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Compile `circuit` for the target
    pub fn run(&self, circuit: &Circuit) -> QcResult<TranspileResult> {
        let target = &self.target;
        let unrolled = circuit.unrolled()?;
        log::debug!(
            "transpile '{}' for '{}': {} ops after unroll",
            circuit.name(),
            target.name,
            unrolled.gate_count()
        );

        let needs_3q_split = target.topology.is_some()
            || ["ccx", "cswap"].iter().any(|g| !target.supports(g));
        let gates = if needs_3q_split {
            decompose_three_qubit(unrolled.gates())
        } else {
            unrolled.gates().to_vec()
        };

        let initial_layout = choose_layout(self.layout_method(), &unrolled, target)?;
        log::debug!("initial layout {}", initial_layout);

        let routed = route(&gates, initial_layout.clone(), target)?;
        log::debug!("routing inserted {} swaps", routed.swaps_inserted);

        let translated = translate(&routed.gates, target)?;

        let optimized = match self.optimization_level {
            0 => translated,
            1 => optimize_once(&translated, target),
            _ => optimize_to_fixed_point(&translated, target, MAX_OPTIMIZATION_ROUNDS),
        };
        log::debug!("{} ops after optimisation", optimized.len());

        let physical = QuantumRegister::new(target.num_qubits.max(circuit.num_qubits()), "q");
        let mut out = Circuit::from_registers(vec![physical], circuit.cregs().to_vec())?
            .with_name(circuit.name());
        out.add_gates(optimized)?;

        Ok(TranspileResult {
            circuit: out,
            initial_layout,
            final_layout: routed.final_layout,
            swaps_inserted: routed.swaps_inserted,
        })
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Whether every operation is native on the target
    pub fn uses_basis_gates(&self, circuit: &Circuit) -> bool {
        circuit
            .gates()
            .iter()
            .all(|g| !g.is_composite() && self.target.supports(g.name()))
    }

    /// Check size, basis and coupling conformance
    pub fn validate(&self, circuit: &Circuit) -> QcResult<()> {
        if circuit.num_qubits() > self.target.num_qubits {
            return Err(QcError::TargetTooSmall {
                target: self.target.name.clone(),
                needed: circuit.num_qubits(),
                available: self.target.num_qubits,
            });
        }

        for gate in circuit.gates() {
            if gate.is_composite() || !self.target.supports(gate.name()) {
                return Err(QcError::GateNotInBasis {
                    gate: gate.name().to_string(),
                    basis: self.target.basis_string(),
                });
            }
            if gate.is_directive() {
                continue;
            }
            let qs = gate.qubits();
            for (i, &a) in qs.iter().enumerate() {
                for &b in &qs[i + 1..] {
                    if !self.target.is_coupled(a, b) {
                        return Err(QcError::TopologyViolation { q1: a, q2: b });
                    }
                }
            }
        }

        Ok(())
    }

    // ========================================================================
    // Export
    // ========================================================================

    /// OpenQASM 3.0 text of a circuit, composites inlined
    pub fn to_qasm3(&self, circuit: &Circuit) -> QcResult<String> {
        let flat = circuit.unrolled()?;
        let mut qasm = String::new();

        qasm.push_str("OPENQASM 3.0;\n");
        qasm.push_str("include \"stdgates.inc\";\n\n");

        for qreg in flat.qregs() {
            qasm.push_str(&format!("qubit[{}] {};\n", qreg.size(), qreg.name()));
        }
        for creg in flat.cregs() {
            qasm.push_str(&format!("bit[{}] {};\n", creg.size(), creg.name()));
        }
        qasm.push('\n');

        let qubit = |q| match flat.qubit_location(q) {
            Some((reg, i)) => format!("{}[{}]", reg, i),
            None => format!("q[{}]", q),
        };
        let clbit = |c| match flat.clbit_location(c) {
            Some((reg, i)) => format!("{}[{}]", reg, i),
            None => format!("c[{}]", c),
        };

        for gate in flat.gates() {
            let line = match gate {
                Gate::Measure(q, c) => format!("{} = measure {};", clbit(*c), qubit(*q)),
                Gate::Barrier(qs) if qs.is_empty() => "barrier;".to_string(),
                Gate::SaveStatevector => "// save_statevector".to_string(),
                g => {
                    let params = g.params();
                    let head = if params.is_empty() {
                        g.name().to_string()
                    } else {
                        let ps: Vec<_> = params.iter().map(|p| p.to_string()).collect();
                        format!("{}({})", g.name(), ps.join(", "))
                    };
                    let ops: Vec<_> = g.qubits().into_iter().map(qubit).collect();
                    format!("{} {};", head, ops.join(", "))
                }
            };
            qasm.push_str(&line);
            qasm.push('\n');
        }

        Ok(qasm)
    }
}

/// Compile with default settings (optimisation level 1)
pub fn transpile(circuit: &Circuit, target: &Target) -> QcResult<TranspileResult> {
    Transpiler::new(target.clone()).run(circuit)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_calibration::fake_devices;
    use qcirc_core::CircuitBuilder;

    fn athens() -> Target {
        Target::from_calibration(&fake_devices::athens())
    }

    #[test]
    fn test_qasm3_output() {
        let circuit = CircuitBuilder::new(2, 0).h(0).cx(0, 1).measure_all().build().unwrap();
        let qasm = Transpiler::new(Target::ideal(2)).to_qasm3(&circuit).unwrap();

        assert!(qasm.contains("OPENQASM 3.0"));
        assert!(qasm.contains("qubit[2] q;"));
        assert!(qasm.contains("bit[2] meas;"));
        assert!(qasm.contains("cx q[0], q[1];"));
        assert!(qasm.contains("meas[1] = measure q[1];"));
    }

    #[test]
    fn test_validation() {
        let transpiler = Transpiler::new(athens());

        let too_big = Circuit::new(6, 0);
        assert!(matches!(
            transpiler.validate(&too_big),
            Err(QcError::TargetTooSmall { .. })
        ));

        let non_native = CircuitBuilder::new(2, 0).h(0).build().unwrap();
        assert!(matches!(
            transpiler.validate(&non_native),
            Err(QcError::GateNotInBasis { .. })
        ));

        let uncoupled = CircuitBuilder::new(5, 0).cx(0, 4).build().unwrap();
        assert!(matches!(
            transpiler.validate(&uncoupled),
            Err(QcError::TopologyViolation { q1: 0, q2: 4 })
        ));
    }

    #[test]
    fn test_layout_method_defaults() {
        assert_eq!(
            Transpiler::new(athens()).layout_method(),
            LayoutMethod::Dense
        );
        assert_eq!(
            Transpiler::new(athens()).with_optimization_level(0).layout_method(),
            LayoutMethod::Trivial
        );
        assert_eq!(
            Transpiler::new(Target::ideal(3)).layout_method(),
            LayoutMethod::Trivial
        );
        assert_eq!(Transpiler::new(athens()).with_optimization_level(9).optimization_level(), 3);
    }

    #[test]
    fn test_bell_on_device() {
        let circuit = CircuitBuilder::new(2, 2)
            .h(0)
            .cx(0, 1)
            .measure(0, 0)
            .measure(1, 1)
            .build()
            .unwrap();
        let result = Transpiler::new(athens()).run(&circuit).unwrap();

        assert_eq!(result.circuit.num_qubits(), 5);
        assert_eq!(result.swaps_inserted, 0);
        assert!(Transpiler::new(athens()).validate(&result.circuit).is_ok());
        assert_eq!(result.circuit.count_2q(), 1);
        assert_eq!(result.circuit.count_measurements(), 2);
    }

    #[test]
    fn test_ideal_target_keeps_gates() {
        let circuit = CircuitBuilder::new(3, 0).h(0).ccx(0, 1, 2).build().unwrap();
        let result = transpile(&circuit, &Target::ideal(3)).unwrap();
        assert_eq!(result.circuit.gates(), circuit.gates());
        assert_eq!(result.initial_layout, Layout::trivial(3, 3));
    }
}
