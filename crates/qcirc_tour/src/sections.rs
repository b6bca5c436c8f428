//! The six tour sections
//!
//! Sections 1 to 3 work on one shared circuit: the Bell pair built on
//! register `a` gains a saved statevector in section 2 and a classical
//! register with measurements in section 3. When a section runs without its
//! predecessors the shared circuit is built on demand.

use crate::config::{Section, TourConfig};
use qcirc_backend::simulator::AER_SIMULATOR;
use qcirc_backend::{get_backend_seeded, Statevector};
use qcirc_core::constants::execution::DEFAULT_SHOTS;
use qcirc_core::{
    Circuit, ClassicalRegister, Counts, DrawOptions, QcError, QcResult, QuantumRegister,
};
use qcirc_report::{format_statevector, render_gate_map, Histogram, HistogramFormat, SortOrder};
use qcirc_transpiler::Transpiler;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimals used when listing amplitudes
const AMPLITUDE_PRECISION: usize = 4;

/// Output of one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    /// Which section produced this
    pub section: Section,

    /// Heading
    pub title: String,

    /// Circuit drawings, in print order
    pub drawings: Vec<String>,

    /// OpenQASM listings, when enabled
    pub qasm: Vec<String>,

    /// Saved state, for the statevector section
    pub statevector: Option<Statevector>,

    /// Measurement counts, when the section ran shots
    pub counts: Option<Counts>,

    /// Rendered histogram of `counts`
    pub histogram: Option<String>,

    /// Free-form lines printed after everything else
    pub notes: Vec<String>,
}

impl SectionReport {
    fn new(section: Section) -> Self {
        Self {
            section,
            title: section.title().to_string(),
            drawings: Vec::new(),
            qasm: Vec::new(),
            statevector: None,
            counts: None,
            histogram: None,
            notes: Vec::new(),
        }
    }

    fn add_circuit(&mut self, circuit: &Circuit, show_qasm: bool) {
        self.drawings.push(circuit.draw_with(&DrawOptions::unfolded()));
        if show_qasm {
            self.qasm.push(circuit.to_qasm());
        }
    }
}

impl fmt::Display for SectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {}. {} ===", self.section.number(), self.title)?;
        for drawing in &self.drawings {
            writeln!(f, "{}", drawing)?;
        }
        for qasm in &self.qasm {
            writeln!(f, "{}", qasm)?;
        }
        if let Some(sv) = &self.statevector {
            write!(f, "{}", format_statevector(sv, AMPLITUDE_PRECISION))?;
        }
        if let Some(counts) = &self.counts {
            writeln!(f, "counts: {:?}", counts)?;
        }
        if let Some(hist) = &self.histogram {
            writeln!(f, "{}", hist)?;
        }
        for note in &self.notes {
            writeln!(f, "{}", note)?;
        }
        Ok(())
    }
}

/// Runs sections against one configuration
#[derive(Debug)]
pub struct Tour {
    config: TourConfig,
    shared: Option<Circuit>,
}

impl Tour {
    /// Validate `config` and start a tour
    pub fn new(config: TourConfig) -> QcResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            shared: None,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    /// Circuit shared by sections 1-3 in its current state
    pub fn shared_circuit(&self) -> Option<&Circuit> {
        self.shared.as_ref()
    }

    /// Run every selected section in tour order
    pub fn run(&mut self) -> QcResult<Vec<SectionReport>> {
        self.config
            .selected_sections()
            .into_iter()
            .map(|section| self.run_section(section))
            .collect()
    }

    /// Run one section
    pub fn run_section(&mut self, section: Section) -> QcResult<SectionReport> {
        log::info!("section {}: {}", section.number(), section.title());
        match section {
            Section::Registers => self.registers(),
            Section::Statevector => self.statevector(),
            Section::Measurement => self.measurement(),
            Section::Notation => self.notation(),
            Section::CustomGate => self.custom_gate(),
            Section::NoisyDevice => self.noisy_device(),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn registers(&mut self) -> QcResult<SectionReport> {
        let circuit = bell_on_register()?;
        let mut report = SectionReport::new(Section::Registers);
        report.add_circuit(&circuit, self.config.show_qasm);
        report.notes.push(format!(
            "Circuit '{}' is ready: {} qubits, {} operations",
            circuit.name(),
            circuit.num_qubits(),
            circuit.gate_count()
        ));
        self.shared = Some(circuit);
        Ok(report)
    }

    fn statevector(&mut self) -> QcResult<SectionReport> {
        let seed = self.config.seed;
        let circuit = self.shared_mut()?;
        circuit.save_statevector()?;

        let simulator = get_backend_seeded(AER_SIMULATOR, seed)?;
        let result = simulator.execute(circuit, DEFAULT_SHOTS)?;
        let sv = result.get_statevector()?.clone();

        let mut report = SectionReport::new(Section::Statevector);
        report.statevector = Some(sv);
        Ok(report)
    }

    fn measurement(&mut self) -> QcResult<SectionReport> {
        let seed = self.config.seed;
        let shots = self.config.shots;
        let show_qasm = self.config.show_qasm;
        let circuit = self.shared_mut()?;

        let creg = ClassicalRegister::new(2, "creg");
        circuit.add_creg(creg.clone())?;
        let a = circuit.qregs()[0].clone();
        for i in 0..a.size() {
            circuit.measure(a.bit(i), creg.bit(i))?;
        }

        let simulator = get_backend_seeded(AER_SIMULATOR, seed)?;
        let result = simulator.execute(circuit, shots)?;

        let mut report = SectionReport::new(Section::Measurement);
        report.add_circuit(circuit, show_qasm);
        report.histogram = Some(self.histogram(result.get_counts(), "Bell pair", SortOrder::ByKey));
        report.counts = Some(result.counts);
        Ok(report)
    }

    fn notation(&mut self) -> QcResult<SectionReport> {
        let mut circuit = Circuit::new(2, 1);
        circuit.h(0)?.cx(0, 1)?.measure(1, 0)?;

        let mut report = SectionReport::new(Section::Notation);
        report.add_circuit(&circuit, self.config.show_qasm);
        Ok(report)
    }

    fn custom_gate(&mut self) -> QcResult<SectionReport> {
        let mut sub = Circuit::new(3, 0).with_name("toggle_cx");
        sub.cx(0, 1)?.cx(1, 2)?.cx(0, 1)?.cx(1, 2)?;
        let toggle = sub.to_instruction()?;

        let q = QuantumRegister::new(4, "q");
        let mut circuit = Circuit::from_registers(vec![q.clone()], vec![])?;
        circuit.append(&toggle, [q.bit(1), q.bit(2), q.bit(3)])?;

        let mut report = SectionReport::new(Section::CustomGate);
        report.add_circuit(&circuit, false);
        report.drawings.push(circuit.unrolled()?.draw_with(&DrawOptions::unfolded()));
        if self.config.show_qasm {
            report.qasm.push(circuit.to_qasm());
        }
        report.notes.push(format!(
            "'{}' acts on {} qubits and holds {} gates",
            toggle.name(),
            toggle.num_qubits(),
            toggle.size()
        ));
        Ok(report)
    }

    fn noisy_device(&mut self) -> QcResult<SectionReport> {
        let mut circuit = Circuit::new(5, 5);
        circuit.x(0)?;
        for q in 0..4 {
            circuit.cx(0, q + 1)?;
        }
        circuit.measure_all()?;

        let device = get_backend_seeded(&self.config.backend, self.config.seed)?;
        let target = device.target();
        let compiled = Transpiler::new(target.clone())
            .with_optimization_level(self.config.optimization_level)
            .run(&circuit)?;
        let result = device.execute(&compiled.circuit, self.config.shots)?;

        let mut report = SectionReport::new(Section::NoisyDevice);
        if let Some(topology) = &target.topology {
            report.notes.push(render_gate_map(topology));
        }
        report.add_circuit(&compiled.circuit, self.config.show_qasm);
        report.notes.push(format!(
            "Transpiled for {} at level {}: depth {}, {} ops, {} swaps, layout {:?}",
            device.name(),
            self.config.optimization_level,
            compiled.circuit.depth(),
            compiled.circuit.gate_count(),
            compiled.swaps_inserted,
            compiled.initial_layout.to_vec()
        ));
        report.histogram = Some(self.histogram(
            result.get_counts(),
            &format!("Fan-out on {}", device.name()),
            SortOrder::ByCount,
        ));
        report.counts = Some(result.counts);
        Ok(report)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn shared_mut(&mut self) -> QcResult<&mut Circuit> {
        if self.shared.is_none() {
            log::debug!("building the register circuit on demand");
            self.shared = Some(bell_on_register()?);
        }
        self.shared
            .as_mut()
            .ok_or_else(|| QcError::InternalError("shared circuit missing".into()))
    }

    fn histogram(&self, counts: &Counts, title: &str, order: SortOrder) -> String {
        let hist = Histogram::from_counts(counts)
            .with_bar_width(self.config.bar_width)
            .sorted(order);
        match self.config.format {
            HistogramFormat::Text | HistogramFormat::Markdown => {
                hist.with_title(title).render(self.config.format)
            }
            format => hist.render(format),
        }
    }
}

/// Bell pair on a two-qubit register named `a`
pub fn bell_on_register() -> QcResult<Circuit> {
    let a = QuantumRegister::new(2, "a");
    let mut circuit = Circuit::from_registers(vec![a.clone()], vec![])?;
    circuit.h(a.bit(0))?;
    circuit.cx(a.bit(0), a.bit(1))?;
    Ok(circuit)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcirc_core::Gate;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn tour() -> Tour {
        Tour::new(TourConfig::quick()).unwrap()
    }

    #[test]
    fn test_registers_section() {
        let mut tour = tour();
        let report = tour.run_section(Section::Registers).unwrap();
        assert_eq!(report.drawings.len(), 1);
        assert!(report.drawings[0].contains("a_0: "));
        assert!(report.drawings[0].contains("a_1: "));
        assert!(report.notes[0].contains("ready"));
        assert_eq!(tour.shared_circuit().unwrap().gate_count(), 2);
    }

    #[test]
    fn test_statevector_section() {
        let mut tour = tour();
        let report = tour.run_section(Section::Statevector).unwrap();
        let sv = report.statevector.as_ref().unwrap();
        let amps = sv.amplitudes();
        assert!((amps[0].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((amps[3].re - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!(amps[1].norm() < 1e-12 && amps[2].norm() < 1e-12);
        assert!(report.to_string().contains("|11⟩  +0.7071+0.0000j"));
    }

    #[test]
    fn test_statevector_printed_once() {
        let mut tour = tour();
        let report = tour.run_section(Section::Statevector).unwrap();
        let text = report.to_string();
        assert!(report.notes.is_empty());
        assert_eq!(text.matches("|11⟩").count(), 1);
        assert!(!text.contains("Statevector(["));
    }

    #[test]
    fn test_sections_share_one_circuit() {
        let mut tour = tour();
        tour.run_section(Section::Registers).unwrap();
        tour.run_section(Section::Statevector).unwrap();
        let report = tour.run_section(Section::Measurement).unwrap();

        let circuit = tour.shared_circuit().unwrap();
        assert!(circuit.gates().contains(&Gate::SaveStatevector));
        assert_eq!(circuit.count_measurements(), 2);
        assert_eq!(circuit.cregs()[0].name(), "creg");

        let counts = report.counts.unwrap();
        assert_eq!(counts.values().sum::<u64>(), 1024);
        assert!(counts.keys().all(|k| k == "00" || k == "11"));
        assert!(report.histogram.unwrap().contains("Bell pair"));
    }

    #[test]
    fn test_notation_section() {
        let report = tour().run_section(Section::Notation).unwrap();
        let drawing = &report.drawings[0];
        assert!(drawing.contains("q_0: "));
        assert!(drawing.contains("c_0: "));
        assert!(report.counts.is_none());
    }

    #[test]
    fn test_custom_gate_section() {
        let report = tour().run_section(Section::CustomGate).unwrap();
        assert_eq!(report.drawings.len(), 2);
        assert!(report.drawings[0].contains("toggle_cx"));
        assert!(!report.drawings[1].contains("toggle_cx"));
        assert!(report.notes[0].contains("3 qubits"));
        assert!(report.notes[0].contains("4 gates"));
    }

    #[test]
    fn test_noisy_device_section() {
        let mut tour = Tour::new(TourConfig::quick().with_seed(9)).unwrap();
        let report = tour.run_section(Section::NoisyDevice).unwrap();

        let counts = report.counts.as_ref().unwrap();
        assert_eq!(counts.values().sum::<u64>(), 1024);
        let (top, _) = counts.iter().max_by_key(|entry| *entry.1).unwrap();
        assert_eq!(top, "11111 00000");
        assert!(report.notes[0].starts_with("Gate map: fake_athens"));
    }

    #[test]
    fn test_full_run_in_order() {
        let mut tour = tour();
        let reports = tour.run().unwrap();
        let numbers: Vec<_> = reports.iter().map(|r| r.section.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_qasm_and_json_formats() {
        let config = TourConfig::quick()
            .with_qasm(true)
            .with_format(HistogramFormat::Json)
            .with_sections(vec![Section::Measurement]);
        let mut tour = Tour::new(config).unwrap();
        let reports = tour.run().unwrap();

        assert!(reports[0].qasm[0].starts_with("OPENQASM 2.0;"));
        let hist: serde_json::Value =
            serde_json::from_str(reports[0].histogram.as_ref().unwrap()).unwrap();
        assert_eq!(hist["total"], 1024);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Tour::new(TourConfig::default().with_shots(0)).is_err());
    }
}
