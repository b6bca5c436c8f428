//! Command-line flags

use crate::config::{Section, TourConfig};
use clap::Parser;
use qcirc_core::QcResult;
use qcirc_report::HistogramFormat;
use std::path::PathBuf;

/// Build, draw, simulate, transpile and measure quantum circuits
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Shots per measured run
    #[arg(short, long)]
    pub shots: Option<u64>,

    /// Sampling seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Device for the noisy-device section (e.g. fake_athens, fake_lima)
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Transpiler optimisation level, 0-3
    #[arg(short = 'O', long)]
    pub optimization_level: Option<u8>,

    /// Histogram format: text, markdown, json or csv
    #[arg(short, long)]
    pub format: Option<HistogramFormat>,

    /// Run only this section (number or name); repeatable
    #[arg(long = "section")]
    pub sections: Vec<Section>,

    /// Print OpenQASM next to each drawing
    #[arg(long)]
    pub qasm: bool,

    /// Write every section report to this JSON file
    #[arg(long)]
    pub json_out: Option<PathBuf>,
}

impl Cli {
    /// Load the config file, if any, and apply the flags on top
    pub fn to_config(&self) -> QcResult<TourConfig> {
        let mut config = match &self.config {
            Some(path) => TourConfig::from_json_file(path)?,
            None => TourConfig::default(),
        };

        if let Some(shots) = self.shots {
            config.shots = shots;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(backend) = &self.backend {
            config.backend = backend.clone();
        }
        if let Some(level) = self.optimization_level {
            config.optimization_level = level;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if !self.sections.is_empty() {
            config.sections = self.sections.clone();
        }
        if self.qasm {
            config.show_qasm = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("qcirc-tour").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).to_config().unwrap();
        assert_eq!(config, TourConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "--shots",
            "2048",
            "--seed",
            "7",
            "--backend",
            "fake_manila",
            "-O",
            "2",
            "--format",
            "md",
            "--section",
            "3",
            "--section",
            "noisy-device",
            "--qasm",
            "--json-out",
            "tour.json",
        ]);
        let config = cli.to_config().unwrap();

        assert_eq!(config.shots, 2048);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.backend, "fake_manila");
        assert_eq!(config.optimization_level, 2);
        assert_eq!(config.format, HistogramFormat::Markdown);
        assert_eq!(config.sections, vec![Section::Measurement, Section::NoisyDevice]);
        assert!(config.show_qasm);
        assert_eq!(cli.json_out, Some(PathBuf::from("tour.json")));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["qcirc-tour", "--section", "9"]).is_err());
        assert!(Cli::try_parse_from(["qcirc-tour", "--format", "svg"]).is_err());
        assert!(parse(&["--shots", "0"]).to_config().is_err());
        assert!(parse(&["-O", "5"]).to_config().is_err());
    }
}
