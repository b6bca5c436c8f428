//! Gate matrices and dense state kernels
//!
//! Amplitude index bit `q` is qubit `q` (little-endian). Two-qubit matrices
//! use basis index `b0 + 2*b1`, where `b0` is the gate's first operand.

use crate::error::{QcError, QcResult};
use crate::gate::Gate;
use crate::types::QubitId;
use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

/// 2x2 complex matrix, row-major
pub type Matrix2 = [[Complex64; 2]; 2];

/// 4x4 complex matrix, row-major
pub type Matrix4 = [[Complex64; 4]; 4];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

fn diag(a: Complex64, b: Complex64) -> Matrix2 {
    [[a, ZERO], [ZERO, b]]
}

fn phase(theta: f64) -> Complex64 {
    Complex64::from_polar(1.0, theta)
}

/// Matrix of a single-qubit gate
pub fn unitary_1q(gate: &Gate) -> Option<Matrix2> {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let m = match gate {
        Gate::H(_) => [[h, h], [h, -h]],
        Gate::X(_) => [[ZERO, ONE], [ONE, ZERO]],
        Gate::Y(_) => [[ZERO, -I], [I, ZERO]],
        Gate::Z(_) => diag(ONE, -ONE),
        Gate::S(_) => diag(ONE, I),
        Gate::Sdg(_) => diag(ONE, -I),
        Gate::T(_) => diag(ONE, phase(FRAC_PI_4)),
        Gate::Tdg(_) => diag(ONE, phase(-FRAC_PI_4)),
        Gate::Sx(_) => {
            let a = Complex64::new(0.5, 0.5);
            let b = Complex64::new(0.5, -0.5);
            [[a, b], [b, a]]
        }
        Gate::Sxdg(_) => {
            let a = Complex64::new(0.5, -0.5);
            let b = Complex64::new(0.5, 0.5);
            [[a, b], [b, a]]
        }
        Gate::Id(_) => diag(ONE, ONE),
        Gate::Rx(_, t) => {
            let c = Complex64::new((t / 2.0).cos(), 0.0);
            let s = Complex64::new(0.0, -(t / 2.0).sin());
            [[c, s], [s, c]]
        }
        Gate::Ry(_, t) => {
            let c = Complex64::new((t / 2.0).cos(), 0.0);
            let s = Complex64::new((t / 2.0).sin(), 0.0);
            [[c, -s], [s, c]]
        }
        Gate::Rz(_, t) => diag(phase(-t / 2.0), phase(t / 2.0)),
        Gate::P(_, t) => diag(ONE, phase(*t)),
        Gate::U(_, theta, phi, lambda) => {
            let c = (theta / 2.0).cos();
            let s = (theta / 2.0).sin();
            [
                [Complex64::new(c, 0.0), -phase(*lambda) * s],
                [phase(*phi) * s, phase(phi + lambda) * c],
            ]
        }
        _ => return None,
    };
    Some(m)
}

/// Controlled version of `u`, control on operand 0, target on operand 1
fn controlled(u: Matrix2) -> Matrix4 {
    let mut m = [[ZERO; 4]; 4];
    m[0][0] = ONE;
    m[2][2] = ONE;
    for o in 0..2 {
        for i in 0..2 {
            m[1 + 2 * o][1 + 2 * i] = u[o][i];
        }
    }
    m
}

/// Matrix of a two-qubit gate
pub fn unitary_2q(gate: &Gate) -> Option<Matrix4> {
    let m = match gate {
        Gate::Cnot(_, t) => controlled(unitary_1q(&Gate::X(*t))?),
        Gate::Cy(_, t) => controlled(unitary_1q(&Gate::Y(*t))?),
        Gate::Cz(_, t) => controlled(unitary_1q(&Gate::Z(*t))?),
        Gate::Crx(_, t, a) => controlled(unitary_1q(&Gate::Rx(*t, *a))?),
        Gate::Cry(_, t, a) => controlled(unitary_1q(&Gate::Ry(*t, *a))?),
        Gate::Crz(_, t, a) => controlled(unitary_1q(&Gate::Rz(*t, *a))?),
        Gate::Swap(_, _) => {
            let mut m = [[ZERO; 4]; 4];
            m[0][0] = ONE;
            m[1][2] = ONE;
            m[2][1] = ONE;
            m[3][3] = ONE;
            m
        }
        Gate::ISwap(_, _) => {
            let mut m = [[ZERO; 4]; 4];
            m[0][0] = ONE;
            m[1][2] = I;
            m[2][1] = I;
            m[3][3] = ONE;
            m
        }
        Gate::Ecr(_, _) => {
            let r = Complex64::new(FRAC_1_SQRT_2, 0.0);
            let ri = Complex64::new(0.0, FRAC_1_SQRT_2);
            [
                [ZERO, r, ZERO, ri],
                [r, ZERO, -ri, ZERO],
                [ZERO, ri, ZERO, r],
                [-ri, ZERO, r, ZERO],
            ]
        }
        _ => return None,
    };
    Some(m)
}

/// Matrix product `a · b`
pub fn mat2_mul(a: &Matrix2, b: &Matrix2) -> Matrix2 {
    let mut out = [[ZERO; 2]; 2];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = a[r][0] * b[0][c] + a[r][1] * b[1][c];
        }
    }
    out
}

/// Check `m ≈ e^{iφ}·I` for some global phase φ
pub fn is_identity_up_to_phase(m: &Matrix2, tol: f64) -> bool {
    if m[0][1].norm() > tol || m[1][0].norm() > tol {
        return false;
    }
    (m[0][0].norm() - 1.0).abs() < tol && (m[0][0] - m[1][1]).norm() < tol
}

// ============================================================================
// Dense State Kernels
// ============================================================================

/// Apply a 2x2 matrix to qubit `q`
pub fn apply_1q(state: &mut [Complex64], q: QubitId, m: &Matrix2) {
    let mask = 1usize << q;
    for i in 0..state.len() {
        if i & mask == 0 {
            let j = i | mask;
            let (a, b) = (state[i], state[j]);
            state[i] = m[0][0] * a + m[0][1] * b;
            state[j] = m[1][0] * a + m[1][1] * b;
        }
    }
}

/// Apply a 4x4 matrix with operand 0 on `q0` and operand 1 on `q1`
pub fn apply_2q(state: &mut [Complex64], q0: QubitId, q1: QubitId, m: &Matrix4) {
    let m0 = 1usize << q0;
    let m1 = 1usize << q1;
    for base in 0..state.len() {
        if base & (m0 | m1) != 0 {
            continue;
        }
        let idx = [base, base | m0, base | m1, base | m0 | m1];
        let amps = idx.map(|i| state[i]);
        for (r, &target) in idx.iter().enumerate() {
            state[target] = (0..4).map(|c| m[r][c] * amps[c]).sum();
        }
    }
}

/// Apply any unitary gate (composites are unrolled); directives are no-ops
pub fn apply_unitary(state: &mut [Complex64], gate: &Gate) -> QcResult<()> {
    if let Some(m) = unitary_1q(gate) {
        apply_1q(state, gate.qubits()[0], &m);
        return Ok(());
    }
    if let Some(m) = unitary_2q(gate) {
        let qs = gate.qubits();
        apply_2q(state, qs[0], qs[1], &m);
        return Ok(());
    }
    match gate {
        Gate::Ccx(c1, c2, t) => {
            let (m1, m2, mt) = (1usize << c1, 1usize << c2, 1usize << t);
            for i in 0..state.len() {
                if i & m1 != 0 && i & m2 != 0 && i & mt == 0 {
                    state.swap(i, i | mt);
                }
            }
            Ok(())
        }
        Gate::Cswap(c, a, b) => {
            let (mc, ma, mb) = (1usize << c, 1usize << a, 1usize << b);
            for i in 0..state.len() {
                if i & mc != 0 && i & ma != 0 && i & mb == 0 {
                    state.swap(i, (i & !ma) | mb);
                }
            }
            Ok(())
        }
        Gate::Composite(def, qs) => {
            for g in def.unroll(qs)? {
                apply_unitary(state, &g)?;
            }
            Ok(())
        }
        Gate::Barrier(_) | Gate::SaveStatevector => Ok(()),
        other => Err(QcError::InvalidGateParameter(format!(
            "'{}' is not unitary",
            other.name()
        ))),
    }
}

/// Dense unitary of a gate sequence on `num_qubits` qubits, as columns
/// `U|j⟩` indexed `[column][row]`
pub fn sequence_unitary(gates: &[Gate], num_qubits: usize) -> QcResult<Vec<Vec<Complex64>>> {
    let dim = 1usize << num_qubits;
    (0..dim)
        .map(|j| {
            let mut col = vec![ZERO; dim];
            col[j] = ONE;
            for g in gates {
                apply_unitary(&mut col, g)?;
            }
            Ok(col)
        })
        .collect()
}

/// Compare two dense unitaries up to a global phase
pub fn unitaries_equiv(a: &[Vec<Complex64>], b: &[Vec<Complex64>], tol: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    // Phase from the largest entry of `a`
    let mut best = (0, 0, 0.0);
    for (j, col) in a.iter().enumerate() {
        for (i, z) in col.iter().enumerate() {
            if z.norm() > best.2 {
                best = (j, i, z.norm());
            }
        }
    }
    let (j, i, _) = best;
    if b[j][i].norm() < tol {
        return false;
    }
    let ph = a[j][i] / b[j][i];
    a.iter()
        .zip(b)
        .all(|(ca, cb)| ca.iter().zip(cb).all(|(x, y)| (x - ph * y).norm() < tol))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_sx_squared_is_x() {
        let sx = unitary_1q(&Gate::Sx(0)).unwrap();
        let x = unitary_1q(&Gate::X(0)).unwrap();
        let sq = mat2_mul(&sx, &sx);
        for r in 0..2 {
            for c in 0..2 {
                assert_relative_eq!(sq[r][c].re, x[r][c].re, epsilon = 1e-12);
                assert_relative_eq!(sq[r][c].im, x[r][c].im, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_identity_up_to_phase() {
        let rz = unitary_1q(&Gate::Rz(0, 2.0 * PI)).unwrap();
        assert!(is_identity_up_to_phase(&rz, 1e-9));
        let h = unitary_1q(&Gate::H(0)).unwrap();
        assert!(!is_identity_up_to_phase(&h, 1e-9));
    }

    #[test]
    fn test_cnot_little_endian() {
        // |q1 q0⟩ = |01⟩ (index 1): control set, target flips -> index 3
        let mut state = vec![ZERO; 4];
        state[1] = ONE;
        apply_unitary(&mut state, &Gate::Cnot(0, 1)).unwrap();
        assert_relative_eq!(state[3].re, 1.0);

        // reversed operands: control is qubit 1
        let mut state = vec![ZERO; 4];
        state[2] = ONE;
        apply_unitary(&mut state, &Gate::Cnot(1, 0)).unwrap();
        assert_relative_eq!(state[3].re, 1.0);
    }

    #[test]
    fn test_bell_state() {
        let mut state = vec![ZERO; 4];
        state[0] = ONE;
        apply_unitary(&mut state, &Gate::H(0)).unwrap();
        apply_unitary(&mut state, &Gate::Cnot(0, 1)).unwrap();
        assert_relative_eq!(state[0].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(state[3].re, FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(state[1].norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_swap_equals_three_cnots() {
        let swap = sequence_unitary(&[Gate::Swap(0, 1)], 2).unwrap();
        let cx3 = sequence_unitary(&[Gate::Cnot(0, 1), Gate::Cnot(1, 0), Gate::Cnot(0, 1)], 2).unwrap();
        assert!(unitaries_equiv(&swap, &cx3, 1e-9));
    }

    #[test]
    fn test_toffoli() {
        let mut state = vec![ZERO; 8];
        state[0b011] = ONE;
        apply_unitary(&mut state, &Gate::Ccx(0, 1, 2)).unwrap();
        assert_relative_eq!(state[0b111].re, 1.0);
    }

    #[test]
    fn test_measure_is_not_unitary() {
        let mut state = vec![ONE, ZERO];
        assert!(apply_unitary(&mut state, &Gate::Measure(0, 0)).is_err());
    }
}
