//! # qcirc Report
//!
//! Console output for runs: count histograms in several formats, amplitude
//! listings and a textual device gate map.
//!
//! ```rust
//! use qcirc_core::Counts;
//! use qcirc_report::prelude::*;
//!
//! let mut counts = Counts::new();
//! counts.insert("00".to_string(), 510);
//! counts.insert("11".to_string(), 490);
//!
//! let hist = Histogram::from_counts(&counts).with_bar_width(20);
//! println!("{}", hist.render(HistogramFormat::Text));
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Count histograms
pub mod histogram;

/// Amplitude listings
pub mod statevector;

/// Coupling map rendering
pub mod gate_map;

// ============================================================================
// Re-exports
// ============================================================================

pub use gate_map::render_gate_map;
pub use histogram::{Histogram, HistogramEntry, HistogramFormat, SortOrder};
pub use statevector::{format_statevector, significant_amplitudes};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports

    pub use crate::gate_map::render_gate_map;
    pub use crate::histogram::{Histogram, HistogramFormat, SortOrder};
    pub use crate::statevector::format_statevector;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qcirc_backend::prelude::*;
    use qcirc_core::CircuitBuilder;

    #[test]
    fn test_histogram_of_bell_run() {
        let circuit = CircuitBuilder::new(2, 2)
            .h(0)
            .cx(0, 1)
            .measure(0, 0)
            .measure(1, 1)
            .build()
            .unwrap();
        let result = SimulatorBackend::ideal(2)
            .with_seed(11)
            .execute(&circuit, 1000)
            .unwrap();

        let hist = Histogram::from_counts(result.get_counts()).sorted(SortOrder::ByCount);
        assert_eq!(hist.total(), 1000);
        assert_eq!(hist.len(), 2);
        assert!(hist.entries().iter().all(|e| e.key == "00" || e.key == "11"));

        let text = hist.render(HistogramFormat::Text);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains('█'));
    }

    #[test]
    fn test_device_gate_map() {
        let device = FakeBackend::belem();
        let topology = device.calibration().unwrap().to_topology();
        let text = render_gate_map(&topology);
        assert!(text.starts_with("Gate map: fake_belem (5 qubits, 4 edges)"));
        assert!(text.contains("Edges: 0-1, 1-2, 1-3, 3-4"));
    }
}
