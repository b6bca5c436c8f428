//! # qcirc Tour
//!
//! A walk through circuit construction in six sections: registers, the
//! saved statevector, measurement, integer-index notation, custom gates and
//! a run on a noisy fake device.
//!
//! ```rust,no_run
//! use qcirc_tour::prelude::*;
//!
//! let mut tour = Tour::new(TourConfig::quick()).unwrap();
//! for report in tour.run().unwrap() {
//!     println!("{}", report);
//! }
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Command-line flags
pub mod cli;

/// Tour settings
pub mod config;

/// Section implementations
pub mod sections;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::Cli;
pub use config::{Section, TourConfig};
pub use sections::{bell_on_register, SectionReport, Tour};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports

    pub use crate::config::{Section, TourConfig};
    pub use crate::sections::{SectionReport, Tour};
}

// ============================================================================
// Integration Tests
// ============================================================================
