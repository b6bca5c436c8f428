//! # qcirc Transpiler
//!
//! Compiles circuits for a device target: initial layout, SWAP routing over
//! the coupling map, translation into the native basis and peephole
//! optimisation.
//!
//! ## Quick Start
//!
//! ```rust
//! use qcirc_transpiler::prelude::*;
//! use qcirc_calibration::fake_devices;
//! use qcirc_core::Circuit;
//!
//! let mut circuit = Circuit::new(5, 5);
//! circuit.x(0).unwrap();
//! for q in 0..4 {
//!     circuit.cx(0, q + 1).unwrap();
//! }
//! circuit.measure_all().unwrap();
//!
//! let target = Target::from_calibration(&fake_devices::athens());
//! let result = transpile(&circuit, &target).unwrap();
//! assert!(Transpiler::new(target).validate(&result.circuit).is_ok());
//! println!("{}", result.circuit.draw());
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Device target description
pub mod target;

/// Initial layout selection
pub mod layout;

/// SWAP routing
pub mod routing;

/// Basis translation and single-qubit synthesis
pub mod basis;

/// Peephole optimisation passes
pub mod optimize;

/// Pass manager and QASM 3 export
pub mod transpiler;

// ============================================================================
// Re-exports
// ============================================================================

pub use layout::{Layout, LayoutMethod};
pub use target::Target;
pub use transpiler::{transpile, TranspileResult, Transpiler, MAX_OPTIMIZATION_LEVEL};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::layout::{Layout, LayoutMethod};
    pub use crate::target::Target;
    pub use crate::transpiler::{transpile, TranspileResult, Transpiler};
}

// ============================================================================
// Integration Tests
// ============================================================================
