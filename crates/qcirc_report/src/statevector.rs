//! Amplitude listing

use qcirc_backend::Statevector;
use std::fmt::Write;

/// Largest number of decimals printed per amplitude component
pub const MAX_PRECISION: usize = 12;

/// One line per basis state: `|label⟩  re±imj  p=prob`
///
/// `precision` is the number of decimals (capped at [`MAX_PRECISION`]).
/// Labels print qubit 0 rightmost.
pub fn format_statevector(statevector: &Statevector, precision: usize) -> String {
    let precision = precision.min(MAX_PRECISION);
    let mut output = String::new();
    for (index, amp) in statevector.iter() {
        let sign = if amp.im.is_sign_negative() { '-' } else { '+' };
        let _ = writeln!(
            output,
            "|{}⟩  {:+.p$}{}{:.p$}j  p={:.p$}",
            statevector.label(index),
            amp.re,
            sign,
            amp.im.abs(),
            amp.norm_sqr(),
            p = precision
        );
    }
    output
}

/// Amplitudes whose probability is above `cutoff`, as `(label, re, im)`
pub fn significant_amplitudes(statevector: &Statevector, cutoff: f64) -> Vec<(String, f64, f64)> {
    statevector
        .iter()
        .filter(|(_, amp)| amp.norm_sqr() > cutoff)
        .map(|(index, amp)| (statevector.label(index), amp.re, amp.im))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn bell() -> Statevector {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        Statevector::from_amplitudes(vec![h, zero, zero, h]).unwrap()
    }

    #[test]
    fn test_bell_listing() {
        let text = format_statevector(&bell(), 4);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "|00⟩  +0.7071+0.0000j  p=0.5000");
        assert_eq!(lines[1], "|01⟩  +0.0000+0.0000j  p=0.0000");
        assert_eq!(lines[3], "|11⟩  +0.7071+0.0000j  p=0.5000");
    }

    #[test]
    fn test_negative_imaginary() {
        let amps = vec![Complex64::new(0.0, 0.0), Complex64::new(0.0, -1.0)];
        let sv = Statevector::from_amplitudes(amps).unwrap();
        let text = format_statevector(&sv, 2);
        assert!(text.contains("|1⟩  +0.00-1.00j  p=1.00"));
    }

    #[test]
    fn test_significant_amplitudes() {
        let sig = significant_amplitudes(&bell(), 1e-9);
        let labels: Vec<_> = sig.iter().map(|(l, _, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["00", "11"]);
    }
}
