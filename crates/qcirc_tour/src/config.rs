//! Tour configuration
//!
//! Loaded from an optional JSON file and then overridden by command-line
//! flags. Missing JSON fields take their default values.

use qcirc_backend::get_backend;
use qcirc_core::constants::execution::{MAX_SHOTS, TOUR_SHOTS};
use qcirc_core::{QcError, QcResult};
use qcirc_report::HistogramFormat;
use qcirc_transpiler::MAX_OPTIMIZATION_LEVEL;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One block of the tour
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Circuit built on a named register
    Registers,
    /// Saved Bell statevector
    Statevector,
    /// Measurement into a classical register
    Measurement,
    /// Integer-index notation
    Notation,
    /// Composite instruction
    CustomGate,
    /// Transpile and run on a fake device
    NoisyDevice,
}

impl Section {
    /// All sections in tour order
    pub const ALL: [Section; 6] = [
        Self::Registers,
        Self::Statevector,
        Self::Measurement,
        Self::Notation,
        Self::CustomGate,
        Self::NoisyDevice,
    ];

    /// Position in the tour, starting at 1
    pub fn number(&self) -> usize {
        match self {
            Self::Registers => 1,
            Self::Statevector => 2,
            Self::Measurement => 3,
            Self::Notation => 4,
            Self::CustomGate => 5,
            Self::NoisyDevice => 6,
        }
    }

    /// Machine name used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registers => "registers",
            Self::Statevector => "statevector",
            Self::Measurement => "measurement",
            Self::Notation => "notation",
            Self::CustomGate => "custom_gate",
            Self::NoisyDevice => "noisy_device",
        }
    }

    /// Heading printed above the section
    pub fn title(&self) -> &'static str {
        match self {
            Self::Registers => "Building a circuit from registers",
            Self::Statevector => "Inspecting the statevector",
            Self::Measurement => "Measuring into a classical register",
            Self::Notation => "Simplified notation",
            Self::CustomGate => "Custom gates",
            Self::NoisyDevice => "Running on a noisy device",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = QcError;

    /// Accepts the machine name (dashes allowed) or the section number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|sec| sec.as_str() == key || sec.number().to_string() == key)
            .ok_or_else(|| {
                QcError::ConfigError(format!(
                    "unknown section '{}' (expected 1-6 or one of: {})",
                    s,
                    Self::ALL.map(|sec| sec.as_str()).join(", ")
                ))
            })
    }
}

/// Settings for one run of the tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    // ========================================================================
    // Execution
    // ========================================================================
    /// Shots per measured run
    pub shots: u64,

    /// Sampling seed; `None` draws from entropy
    pub seed: Option<u64>,

    /// Device used by the noisy-device section
    pub backend: String,

    /// Transpiler optimisation level (0-3)
    pub optimization_level: u8,

    // ========================================================================
    // Output
    // ========================================================================
    /// Histogram format
    pub format: HistogramFormat,

    /// Width of the longest text histogram bar
    pub bar_width: usize,

    /// Sections to run, executed in tour order
    pub sections: Vec<Section>,

    /// Print OpenQASM next to each drawing
    pub show_qasm: bool,
}

impl TourConfig {
    // ========================================================================
    // Presets
    // ========================================================================

    /// Small shot count with a fixed seed, for smoke runs
    pub fn quick() -> Self {
        Self {
            shots: 1024,
            seed: Some(42),
            ..Self::default()
        }
    }

    /// Read a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> QcResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| QcError::FileError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse a JSON config
    pub fn from_json(text: &str) -> QcResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty JSON
    pub fn to_json(&self) -> QcResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set shots
    pub fn with_shots(mut self, shots: u64) -> Self {
        self.shots = shots;
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the noisy device
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Set optimisation level
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level;
        self
    }

    /// Set histogram format
    pub fn with_format(mut self, format: HistogramFormat) -> Self {
        self.format = format;
        self
    }

    /// Restrict to the given sections
    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    /// Toggle QASM output
    pub fn with_qasm(mut self, show: bool) -> Self {
        self.show_qasm = show;
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Selected sections, deduplicated, in tour order
    pub fn selected_sections(&self) -> Vec<Section> {
        let mut sections = self.sections.clone();
        sections.sort();
        sections.dedup();
        sections
    }

    /// True when `section` will run
    pub fn runs(&self, section: Section) -> bool {
        self.sections.contains(&section)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Reject settings the tour cannot run with
    pub fn validate(&self) -> QcResult<()> {
        if self.shots == 0 || self.shots > MAX_SHOTS {
            return Err(QcError::ShotsOutOfRange(self.shots, 1, MAX_SHOTS));
        }

        if self.optimization_level > MAX_OPTIMIZATION_LEVEL {
            return Err(QcError::ConfigError(format!(
                "optimization level must be 0-{}, got {}",
                MAX_OPTIMIZATION_LEVEL, self.optimization_level
            )));
        }

        get_backend(&self.backend)?;

        if self.sections.is_empty() {
            return Err(QcError::ConfigError("no sections selected".to_string()));
        }

        if self.bar_width == 0 {
            return Err(QcError::ConfigError("bar width must be > 0".to_string()));
        }

        Ok(())
    }
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            shots: TOUR_SHOTS,
            seed: None,
            backend: "fake_athens".to_string(),
            optimization_level: 1,
            format: HistogramFormat::Text,
            bar_width: 40,
            sections: Section::ALL.to_vec(),
            show_qasm: false,
        }
    }
}

impl fmt::Display for TourConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TourConfig(shots={}, backend={}, level={}, format={}, sections={})",
            self.shots,
            self.backend,
            self.optimization_level,
            self.format,
            self.sections.len()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = TourConfig::default();
        assert_eq!(config.shots, 8192);
        assert_eq!(config.backend, "fake_athens");
        assert_eq!(config.optimization_level, 1);
        assert_eq!(config.sections.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quick() {
        let config = TourConfig::quick();
        assert_eq!(config.shots, 1024);
        assert_eq!(config.seed, Some(42));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            TourConfig::default().with_shots(0).validate(),
            Err(QcError::ShotsOutOfRange(0, 1, _))
        ));
        assert!(TourConfig::default().with_shots(MAX_SHOTS + 1).validate().is_err());
        assert!(TourConfig::default().with_optimization_level(4).validate().is_err());
        assert!(matches!(
            TourConfig::default().with_backend("ibm_brisbane").validate(),
            Err(QcError::BackendNotAvailable(_))
        ));
        assert!(TourConfig::default().with_backend("FAKE_LIMA").validate().is_ok());
        assert!(TourConfig::default().with_sections(vec![]).validate().is_err());
    }

    #[test]
    fn test_validation_accepts_backend_aliases() {
        for name in ["athens", "Manila", " fake_belem ", "aer_simulator"] {
            assert!(
                TourConfig::default().with_backend(name).validate().is_ok(),
                "{} should validate",
                name
            );
        }
        assert!(TourConfig::default().with_backend("fake_").validate().is_err());
    }

    #[test]
    fn test_section_parsing() {
        assert_eq!("3".parse::<Section>().unwrap(), Section::Measurement);
        assert_eq!("custom-gate".parse::<Section>().unwrap(), Section::CustomGate);
        assert_eq!("Noisy_Device".parse::<Section>().unwrap(), Section::NoisyDevice);
        assert!("7".parse::<Section>().is_err());
        assert!("teleport".parse::<Section>().is_err());
    }

    #[test]
    fn test_selected_sections_in_tour_order() {
        let config = TourConfig::default().with_sections(vec![
            Section::NoisyDevice,
            Section::Registers,
            Section::NoisyDevice,
        ]);
        assert_eq!(
            config.selected_sections(),
            vec![Section::Registers, Section::NoisyDevice]
        );
        assert!(config.runs(Section::Registers));
        assert!(!config.runs(Section::Notation));
    }

    #[test]
    fn test_partial_json() {
        let config =
            TourConfig::from_json(r#"{"shots": 2000, "sections": ["notation", "custom_gate"]}"#)
                .unwrap();
        assert_eq!(config.shots, 2000);
        assert_eq!(config.backend, "fake_athens");
        assert_eq!(config.sections, vec![Section::Notation, Section::CustomGate]);

        let back = TourConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);

        assert!(matches!(
            TourConfig::from_json(r#"{"sections": ["bogus"]}"#),
            Err(QcError::JsonError(_))
        ));
        assert!(matches!(
            TourConfig::from_json_file("/nonexistent/tour.json"),
            Err(QcError::FileError(_))
        ));
    }
}
