//! Basis translation
//!
//! Multi-qubit gates are expanded into CX plus single-qubit gates, and
//! single-qubit gates are resynthesised from their matrix as
//! `rz(λ) · sx · rz(θ+π) · sx · rz(φ+π)` (ZYZ Euler angles of the gate).
//! All rewrites hold up to a global phase.

use crate::target::Target;
use qcirc_core::constants::tolerance::{self, wrap_angle};
use qcirc_core::error::{QcError, QcResult};
use qcirc_core::matrix::{self, Matrix2};
use qcirc_core::{Gate, QubitId};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Native single-qubit gate set the synthesiser emits
pub const SYNTH_BASIS: [&str; 3] = ["rz", "sx", "x"];

// ============================================================================
// Multi-Qubit Decomposition
// ============================================================================

fn rzx(theta: f64, a: QubitId, b: QubitId) -> Vec<Gate> {
    vec![
        Gate::H(b),
        Gate::Cnot(a, b),
        Gate::Rz(b, theta),
        Gate::Cnot(a, b),
        Gate::H(b),
    ]
}

fn toffoli(a: QubitId, b: QubitId, c: QubitId) -> Vec<Gate> {
    vec![
        Gate::H(c),
        Gate::Cnot(b, c),
        Gate::Tdg(c),
        Gate::Cnot(a, c),
        Gate::T(c),
        Gate::Cnot(b, c),
        Gate::Tdg(c),
        Gate::Cnot(a, c),
        Gate::T(b),
        Gate::T(c),
        Gate::H(c),
        Gate::Cnot(a, b),
        Gate::T(a),
        Gate::Tdg(b),
        Gate::Cnot(a, b),
    ]
}

/// Rewrite a multi-qubit gate as CX plus single-qubit gates
///
/// Returns `None` for CX itself and for anything that is not a multi-qubit
/// unitary.
pub fn decompose_multi_qubit(gate: &Gate) -> Option<Vec<Gate>> {
    let gates = match *gate {
        Gate::Cz(c, t) => vec![Gate::H(t), Gate::Cnot(c, t), Gate::H(t)],
        Gate::Cy(c, t) => vec![Gate::Sdg(t), Gate::Cnot(c, t), Gate::S(t)],
        Gate::Swap(a, b) => vec![Gate::Cnot(a, b), Gate::Cnot(b, a), Gate::Cnot(a, b)],
        Gate::ISwap(a, b) => vec![
            Gate::S(a),
            Gate::S(b),
            Gate::H(a),
            Gate::Cnot(a, b),
            Gate::Cnot(b, a),
            Gate::H(b),
        ],
        Gate::Crz(c, t, theta) => vec![
            Gate::Rz(t, theta / 2.0),
            Gate::Cnot(c, t),
            Gate::Rz(t, -theta / 2.0),
            Gate::Cnot(c, t),
        ],
        Gate::Crx(c, t, theta) => vec![
            Gate::H(t),
            Gate::Rz(t, theta / 2.0),
            Gate::Cnot(c, t),
            Gate::Rz(t, -theta / 2.0),
            Gate::Cnot(c, t),
            Gate::H(t),
        ],
        Gate::Cry(c, t, theta) => vec![
            Gate::Ry(t, theta / 2.0),
            Gate::Cnot(c, t),
            Gate::Ry(t, -theta / 2.0),
            Gate::Cnot(c, t),
        ],
        Gate::Ecr(a, b) => {
            let mut g = rzx(FRAC_PI_4, a, b);
            g.push(Gate::X(a));
            g.extend(rzx(-FRAC_PI_4, a, b));
            g
        }
        Gate::Ccx(a, b, c) => toffoli(a, b, c),
        Gate::Cswap(c, a, b) => {
            let mut g = vec![Gate::Cnot(b, a)];
            g.extend(toffoli(c, a, b));
            g.push(Gate::Cnot(b, a));
            g
        }
        _ => return None,
    };
    Some(gates)
}

/// Replace every three-qubit gate with its CX expansion
pub fn decompose_three_qubit(gates: &[Gate]) -> Vec<Gate> {
    gates
        .iter()
        .flat_map(|g| match g {
            g if g.is_three_qubit() => decompose_multi_qubit(g).unwrap_or_else(|| vec![g.clone()]),
            g => vec![g.clone()],
        })
        .collect()
}

// ============================================================================
// Single-Qubit Synthesis
// ============================================================================

fn rz_if_nonzero(q: QubitId, angle: f64, out: &mut Vec<Gate>) {
    let a = wrap_angle(angle);
    if !tolerance::is_zero_angle(a) {
        out.push(Gate::Rz(q, a));
    }
}

/// Synthesise a 2x2 unitary on qubit `q` from `rz`, `sx` and `x`
pub fn synthesize_1q(m: &Matrix2, q: QubitId) -> Vec<Gate> {
    let eps = tolerance::MATRIX_EPS / 10.0;
    let mut out = Vec::new();

    if matrix::is_identity_up_to_phase(m, eps) {
        return out;
    }
    for shortcut in [Gate::X(q), Gate::Sx(q)] {
        if let Some(s) = matrix::unitary_1q(&shortcut) {
            if matrix::is_identity_up_to_phase(&matrix::mat2_mul(&adjoint(&s), m), eps) {
                out.push(shortcut);
                return out;
            }
        }
    }

    // Normalise into SU(2)
    let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
    let sd = det.sqrt();
    let v = [[m[0][0] / sd, m[0][1] / sd], [m[1][0] / sd, m[1][1] / sd]];

    let theta = 2.0 * v[1][0].norm().atan2(v[0][0].norm());

    if v[1][0].norm() < eps {
        rz_if_nonzero(q, 2.0 * v[1][1].arg(), &mut out);
        return out;
    }

    let (phi, lambda) = if v[1][1].norm() < eps {
        (2.0 * v[1][0].arg(), 0.0)
    } else {
        (v[1][1].arg() + v[1][0].arg(), v[1][1].arg() - v[1][0].arg())
    };

    if (theta - FRAC_PI_2).abs() < eps {
        // U(π/2, φ, λ) = rz(λ - π/2) · sx · rz(φ + π/2)
        rz_if_nonzero(q, lambda - FRAC_PI_2, &mut out);
        out.push(Gate::Sx(q));
        rz_if_nonzero(q, phi + FRAC_PI_2, &mut out);
        return out;
    }

    rz_if_nonzero(q, lambda, &mut out);
    out.push(Gate::Sx(q));
    rz_if_nonzero(q, theta + PI, &mut out);
    out.push(Gate::Sx(q));
    rz_if_nonzero(q, phi + PI, &mut out);
    out
}

fn adjoint(m: &Matrix2) -> Matrix2 {
    [
        [m[0][0].conj(), m[1][0].conj()],
        [m[0][1].conj(), m[1][1].conj()],
    ]
}

/// Product of a run of single-qubit gates, first gate applied first
pub fn run_matrix(gates: &[Gate]) -> Option<Matrix2> {
    let mut acc = matrix::unitary_1q(&Gate::Id(0))?;
    for g in gates {
        acc = matrix::mat2_mul(&matrix::unitary_1q(g)?, &acc);
    }
    Some(acc)
}

// ============================================================================
// Translation
// ============================================================================

/// Rewrite `gates` so every operation is supported by `target`
pub fn translate(gates: &[Gate], target: &Target) -> QcResult<Vec<Gate>> {
    let mut out = Vec::with_capacity(gates.len() * 3);
    for gate in gates {
        translate_one(gate, target, &mut out)?;
    }
    Ok(out)
}

fn translate_one(gate: &Gate, target: &Target, out: &mut Vec<Gate>) -> QcResult<()> {
    if target.supports(gate.name()) && !gate.is_composite() {
        out.push(gate.clone());
        return Ok(());
    }

    if let Gate::Composite(def, qs) = gate {
        for g in def.unroll(qs)? {
            translate_one(&g, target, out)?;
        }
        return Ok(());
    }

    if let Some(expansion) = decompose_multi_qubit(gate) {
        for g in &expansion {
            translate_one(g, target, out)?;
        }
        return Ok(());
    }

    if let Some(m) = matrix::unitary_1q(gate) {
        let q = gate.qubits()[0];
        let synthesized = synthesize_1q(&m, q);
        if let Some(bad) = synthesized.iter().find(|g| !target.supports(g.name())) {
            return Err(not_in_basis(bad, target));
        }
        out.extend(synthesized);
        return Ok(());
    }

    Err(not_in_basis(gate, target))
}

fn not_in_basis(gate: &Gate, target: &Target) -> QcError {
    QcError::GateNotInBasis {
        gate: gate.name().to_string(),
        basis: target.basis_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_core::matrix::{sequence_unitary, unitaries_equiv};
    use qcirc_core::CompositeGate;

    const TOL: f64 = 1e-9;

    fn assert_equiv(original: &[Gate], rewritten: &[Gate], n: usize) {
        let a = sequence_unitary(original, n).unwrap();
        let b = sequence_unitary(rewritten, n).unwrap();
        assert!(
            unitaries_equiv(&a, &b, TOL),
            "{:?} != {:?}",
            original,
            rewritten
        );
    }

    fn device_target() -> Target {
        Target::ideal(3).with_basis(&["id", "rz", "sx", "x", "cx", "reset"])
    }

    #[test]
    fn test_two_qubit_decompositions() {
        let theta = 0.7123;
        let gates = [
            Gate::Cz(0, 1),
            Gate::Cy(1, 0),
            Gate::Swap(0, 2),
            Gate::ISwap(0, 1),
            Gate::Crz(0, 1, theta),
            Gate::Crx(2, 0, theta),
            Gate::Cry(0, 1, theta),
            Gate::Ecr(0, 1),
        ];
        for g in &gates {
            let expansion = decompose_multi_qubit(g).unwrap();
            assert_equiv(std::slice::from_ref(g), &expansion, 3);
        }
    }

    #[test]
    fn test_three_qubit_decompositions() {
        for g in [Gate::Ccx(0, 1, 2), Gate::Ccx(2, 0, 1), Gate::Cswap(0, 1, 2)] {
            let expansion = decompose_multi_qubit(&g).unwrap();
            assert_eq!(expansion.iter().filter(|x| x.is_two_qubit()).count() % 2, 0);
            assert_equiv(&[g], &expansion, 3);
        }
    }

    #[test]
    fn test_cx_is_not_decomposed() {
        assert!(decompose_multi_qubit(&Gate::Cnot(0, 1)).is_none());
        assert!(decompose_multi_qubit(&Gate::H(0)).is_none());
    }

    #[test]
    fn test_synthesis_matches_every_1q_gate() {
        let gates = [
            Gate::H(0),
            Gate::Y(0),
            Gate::Z(0),
            Gate::S(0),
            Gate::Sdg(0),
            Gate::T(0),
            Gate::Sxdg(0),
            Gate::Rx(0, 0.3),
            Gate::Ry(0, 1.1),
            Gate::Rz(0, -2.0),
            Gate::P(0, 0.9),
            Gate::U(0, PI, 0.3, 0.2),
            Gate::U(0, 0.4, 1.0, 2.0),
            Gate::U(0, 2.9, -1.7, 0.4),
        ];
        for g in &gates {
            let m = matrix::unitary_1q(g).unwrap();
            let synth = synthesize_1q(&m, 0);
            assert!(synth.iter().all(|s| SYNTH_BASIS.contains(&s.name())));
            assert_equiv(std::slice::from_ref(g), &synth, 1);
        }
    }

    #[test]
    fn test_synthesis_shortcuts() {
        let x = matrix::unitary_1q(&Gate::X(0)).unwrap();
        assert_eq!(synthesize_1q(&x, 2), vec![Gate::X(2)]);

        let sx = matrix::unitary_1q(&Gate::Sx(0)).unwrap();
        assert_eq!(synthesize_1q(&sx, 0), vec![Gate::Sx(0)]);

        let id = matrix::unitary_1q(&Gate::Id(0)).unwrap();
        assert!(synthesize_1q(&id, 0).is_empty());

        let z = matrix::unitary_1q(&Gate::Z(0)).unwrap();
        assert_eq!(synthesize_1q(&z, 0).len(), 1);

        // H needs a single sx between two rz
        let h = matrix::unitary_1q(&Gate::H(0)).unwrap();
        assert_eq!(synthesize_1q(&h, 0).iter().filter(|g| g.name() == "sx").count(), 1);
    }

    #[test]
    fn test_run_matrix() {
        let m = run_matrix(&[Gate::H(0), Gate::H(0)]).unwrap();
        assert!(matrix::is_identity_up_to_phase(&m, TOL));
        assert!(run_matrix(&[Gate::Cnot(0, 1)]).is_none());
    }

    #[test]
    fn test_translate_to_device_basis() {
        let target = device_target();
        let gates = vec![
            Gate::H(0),
            Gate::Ccx(0, 1, 2),
            Gate::Cz(1, 2),
            Gate::Measure(2, 0),
            Gate::Barrier(vec![]),
        ];
        let out = translate(&gates, &target).unwrap();
        assert!(out.iter().all(|g| target.supports(g.name())));

        let unitary_in: Vec<_> = gates[..3].to_vec();
        let unitary_out: Vec<_> = out.iter().filter(|g| g.is_unitary()).cloned().collect();
        assert_equiv(&unitary_in, &unitary_out, 3);
        assert_eq!(out.iter().filter(|g| g.is_measurement()).count(), 1);
    }

    #[test]
    fn test_translate_composite() {
        let inner = CompositeGate::new("pair", 2, vec![Gate::H(0), Gate::Cz(0, 1)]).unwrap();
        let gate = Gate::Composite(Box::new(inner), vec![2, 0]);
        let out = translate(std::slice::from_ref(&gate), &device_target()).unwrap();
        assert!(out.iter().all(|g| !g.is_composite()));
        assert_equiv(&[gate], &out, 3);
    }

    #[test]
    fn test_missing_two_qubit_basis() {
        let target = Target::ideal(2).with_basis(&["rz", "sx", "x"]);
        let err = translate(&[Gate::Cz(0, 1)], &target).unwrap_err();
        assert!(matches!(err, QcError::GateNotInBasis { ref gate, .. } if gate == "cx"));
    }
}
