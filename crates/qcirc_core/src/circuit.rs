//! Quantum circuit structure for qcirc
//!
//! A [`Circuit`] owns an ordered list of quantum and classical registers and
//! the sequence of operations applied to them. Qubits and classical bits have
//! flat indices that follow register insertion order; operations may be
//! addressed either by those flat indices or through register bits.

use crate::composite::CompositeGate;
use crate::constants::execution::MEASURE_ALL_REGISTER;
use crate::drawer::{self, DrawOptions};
use crate::error::{QcError, QcResult};
use crate::gate::Gate;
use crate::register::{Clbit, ClassicalRegister, ClbitRef, QuantumRegister, Qubit, QubitRef};
use crate::topology::Topology;
use crate::types::{Angle, ClbitId, QubitId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

static CIRCUIT_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn next_circuit_name() -> String {
    format!("circuit-{}", CIRCUIT_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Quantum circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    qregs: Vec<QuantumRegister>,
    cregs: Vec<ClassicalRegister>,
    gates: Vec<Gate>,
}

macro_rules! single_qubit_gates {
    ($($(#[$doc:meta])* $method:ident => $variant:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(&mut self, q: impl Into<QubitRef>) -> QcResult<&mut Self> {
                let q = self.resolve_qubit(q)?;
                self.push(Gate::$variant(q))
            }
        )*
    };
}

macro_rules! rotation_gates {
    ($($(#[$doc:meta])* $method:ident => $variant:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(&mut self, theta: Angle, q: impl Into<QubitRef>) -> QcResult<&mut Self> {
                check_angle(theta)?;
                let q = self.resolve_qubit(q)?;
                self.push(Gate::$variant(q, theta))
            }
        )*
    };
}

macro_rules! two_qubit_gates {
    ($($(#[$doc:meta])* $method:ident => $variant:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(
                &mut self,
                a: impl Into<QubitRef>,
                b: impl Into<QubitRef>,
            ) -> QcResult<&mut Self> {
                let a = self.resolve_qubit(a)?;
                let b = self.resolve_qubit(b)?;
                self.push(Gate::$variant(a, b))
            }
        )*
    };
}

macro_rules! controlled_rotations {
    ($($(#[$doc:meta])* $method:ident => $variant:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $method(
                &mut self,
                theta: Angle,
                control: impl Into<QubitRef>,
                target: impl Into<QubitRef>,
            ) -> QcResult<&mut Self> {
                check_angle(theta)?;
                let c = self.resolve_qubit(control)?;
                let t = self.resolve_qubit(target)?;
                self.push(Gate::$variant(c, t, theta))
            }
        )*
    };
}

fn check_angle(theta: Angle) -> QcResult<()> {
    if theta.is_finite() {
        Ok(())
    } else {
        Err(QcError::InvalidAngle(theta))
    }
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a circuit with one quantum register `q` and one classical
    /// register `c` (omitted when `num_clbits` is zero)
    pub fn new(num_qubits: usize, num_clbits: usize) -> Self {
        let mut qregs = Vec::new();
        if num_qubits > 0 {
            qregs.push(QuantumRegister::new(num_qubits, "q"));
        }
        let mut cregs = Vec::new();
        if num_clbits > 0 {
            cregs.push(ClassicalRegister::new(num_clbits, "c"));
        }
        Self {
            name: next_circuit_name(),
            qregs,
            cregs,
            gates: Vec::new(),
        }
    }

    /// Create a circuit from explicit registers
    pub fn from_registers(
        qregs: Vec<QuantumRegister>,
        cregs: Vec<ClassicalRegister>,
    ) -> QcResult<Self> {
        let mut circuit = Self::new(0, 0);
        for qr in qregs {
            circuit.add_qreg(qr)?;
        }
        for cr in cregs {
            circuit.add_creg(cr)?;
        }
        Ok(circuit)
    }

    /// Set the circuit name (consuming)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a quantum register; its qubits get the next flat indices
    pub fn add_qreg(&mut self, qreg: QuantumRegister) -> QcResult<()> {
        if self.has_register(qreg.name()) {
            return Err(QcError::DuplicateRegister(qreg.name().to_string()));
        }
        self.qregs.push(qreg);
        Ok(())
    }

    /// Add a classical register; its bits get the next flat indices
    pub fn add_creg(&mut self, creg: ClassicalRegister) -> QcResult<()> {
        if self.has_register(creg.name()) {
            return Err(QcError::DuplicateRegister(creg.name().to_string()));
        }
        self.cregs.push(creg);
        Ok(())
    }

    fn has_register(&self, name: &str) -> bool {
        self.qregs.iter().any(|r| r.name() == name) || self.cregs.iter().any(|r| r.name() == name)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Circuit name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Total number of qubits
    pub fn num_qubits(&self) -> usize {
        self.qregs.iter().map(|r| r.size()).sum()
    }

    /// Total number of classical bits
    pub fn num_clbits(&self) -> usize {
        self.cregs.iter().map(|r| r.size()).sum()
    }

    /// Quantum registers in insertion order
    pub fn qregs(&self) -> &[QuantumRegister] {
        &self.qregs
    }

    /// Classical registers in insertion order
    pub fn cregs(&self) -> &[ClassicalRegister] {
        &self.cregs
    }

    /// Operations in program order
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Check if circuit has no operations
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Flat index of the first qubit of a register
    pub fn qubit_offset(&self, register: &str) -> QcResult<QubitId> {
        let mut offset = 0;
        for r in &self.qregs {
            if r.name() == register {
                return Ok(offset);
            }
            offset += r.size();
        }
        Err(QcError::RegisterNotFound(register.to_string()))
    }

    /// Flat index of the first bit of a classical register
    pub fn clbit_offset(&self, register: &str) -> QcResult<ClbitId> {
        let mut offset = 0;
        for r in &self.cregs {
            if r.name() == register {
                return Ok(offset);
            }
            offset += r.size();
        }
        Err(QcError::RegisterNotFound(register.to_string()))
    }

    /// Register name and local index of a flat qubit index
    pub fn qubit_location(&self, qubit: QubitId) -> Option<(&str, usize)> {
        let mut offset = 0;
        for r in &self.qregs {
            if qubit < offset + r.size() {
                return Some((r.name(), qubit - offset));
            }
            offset += r.size();
        }
        None
    }

    /// Register name and local index of a flat classical bit index
    pub fn clbit_location(&self, clbit: ClbitId) -> Option<(&str, usize)> {
        let mut offset = 0;
        for r in &self.cregs {
            if clbit < offset + r.size() {
                return Some((r.name(), clbit - offset));
            }
            offset += r.size();
        }
        None
    }

    /// Resolve a qubit operand to its flat index
    pub fn resolve_qubit(&self, q: impl Into<QubitRef>) -> QcResult<QubitId> {
        match q.into() {
            QubitRef::Index(i) => {
                let n = self.num_qubits();
                if i >= n {
                    return Err(QcError::GateQubitMismatch {
                        qubit: i,
                        num_qubits: n,
                    });
                }
                Ok(i)
            }
            QubitRef::Bit(bit) => {
                let offset = self.qubit_offset(&bit.register)?;
                let size = self
                    .qregs
                    .iter()
                    .find(|r| r.name() == bit.register)
                    .map(|r| r.size())
                    .unwrap_or(0);
                if bit.index >= size {
                    return Err(QcError::RegisterIndexOutOfRange {
                        register: bit.register,
                        index: bit.index,
                        size,
                    });
                }
                Ok(offset + bit.index)
            }
        }
    }

    /// Resolve a classical bit operand to its flat index
    pub fn resolve_clbit(&self, c: impl Into<ClbitRef>) -> QcResult<ClbitId> {
        match c.into() {
            ClbitRef::Index(i) => {
                let n = self.num_clbits();
                if i >= n {
                    return Err(QcError::ClbitOutOfRange {
                        clbit: i,
                        num_clbits: n,
                    });
                }
                Ok(i)
            }
            ClbitRef::Bit(bit) => {
                let offset = self.clbit_offset(&bit.register)?;
                let size = self
                    .cregs
                    .iter()
                    .find(|r| r.name() == bit.register)
                    .map(|r| r.size())
                    .unwrap_or(0);
                if bit.index >= size {
                    return Err(QcError::RegisterIndexOutOfRange {
                        register: bit.register,
                        index: bit.index,
                        size,
                    });
                }
                Ok(offset + bit.index)
            }
        }
    }

    // ========================================================================
    // Adding Operations
    // ========================================================================

    /// Add a gate with flat operands, validating ranges and duplicates
    pub fn add_gate(&mut self, gate: Gate) -> QcResult<()> {
        let num_qubits = self.num_qubits();
        let qubits = gate.qubits();
        let mut seen = HashSet::with_capacity(qubits.len());
        for &qubit in &qubits {
            if qubit >= num_qubits {
                return Err(QcError::GateQubitMismatch { qubit, num_qubits });
            }
            if !seen.insert(qubit) {
                return Err(QcError::DuplicateQubit(qubit));
            }
        }
        let num_clbits = self.num_clbits();
        for clbit in gate.clbits() {
            if clbit >= num_clbits {
                return Err(QcError::ClbitOutOfRange { clbit, num_clbits });
            }
        }
        if let Gate::Composite(def, operands) = &gate {
            if def.num_qubits() != operands.len() {
                return Err(QcError::ArityMismatch {
                    name: def.name().to_string(),
                    expected: def.num_qubits(),
                    got: operands.len(),
                });
            }
        }
        self.gates.push(gate);
        Ok(())
    }

    /// Add multiple gates
    pub fn add_gates(&mut self, gates: impl IntoIterator<Item = Gate>) -> QcResult<()> {
        for gate in gates {
            self.add_gate(gate)?;
        }
        Ok(())
    }

    fn push(&mut self, gate: Gate) -> QcResult<&mut Self> {
        self.add_gate(gate)?;
        Ok(self)
    }

    single_qubit_gates! {
        /// Hadamard
        h => H,
        /// Pauli-X
        x => X,
        /// Pauli-Y
        y => Y,
        /// Pauli-Z
        z => Z,
        /// Phase S = √Z
        s => S,
        /// Inverse of S
        sdg => Sdg,
        /// T = ⁴√Z
        t => T,
        /// Inverse of T
        tdg => Tdg,
        /// Square root of X
        sx => Sx,
        /// Inverse of √X
        sxdg => Sxdg,
        /// Identity
        id => Id,
        /// Reset to |0⟩
        reset => Reset,
    }

    rotation_gates! {
        /// Rotation about X by `theta`
        rx => Rx,
        /// Rotation about Y by `theta`
        ry => Ry,
        /// Rotation about Z by `theta`
        rz => Rz,
        /// Phase gate diag(1, e^{iθ})
        p => P,
    }

    two_qubit_gates! {
        /// Controlled-NOT (control, target)
        cx => Cnot,
        /// Controlled-Z
        cz => Cz,
        /// Controlled-Y (control, target)
        cy => Cy,
        /// Exchange two qubits
        swap => Swap,
        /// iSWAP
        iswap => ISwap,
        /// Echoed cross-resonance
        ecr => Ecr,
    }

    controlled_rotations! {
        /// Controlled Rx (control, target)
        crx => Crx,
        /// Controlled Ry (control, target)
        cry => Cry,
        /// Controlled Rz (control, target)
        crz => Crz,
    }

    /// General single-qubit gate U(θ, φ, λ)
    pub fn u(
        &mut self,
        theta: Angle,
        phi: Angle,
        lambda: Angle,
        q: impl Into<QubitRef>,
    ) -> QcResult<&mut Self> {
        for a in [theta, phi, lambda] {
            check_angle(a)?;
        }
        let q = self.resolve_qubit(q)?;
        self.push(Gate::U(q, theta, phi, lambda))
    }

    /// Toffoli
    pub fn ccx(
        &mut self,
        c1: impl Into<QubitRef>,
        c2: impl Into<QubitRef>,
        target: impl Into<QubitRef>,
    ) -> QcResult<&mut Self> {
        let c1 = self.resolve_qubit(c1)?;
        let c2 = self.resolve_qubit(c2)?;
        let t = self.resolve_qubit(target)?;
        self.push(Gate::Ccx(c1, c2, t))
    }

    /// Fredkin
    pub fn cswap(
        &mut self,
        control: impl Into<QubitRef>,
        a: impl Into<QubitRef>,
        b: impl Into<QubitRef>,
    ) -> QcResult<&mut Self> {
        let c = self.resolve_qubit(control)?;
        let a = self.resolve_qubit(a)?;
        let b = self.resolve_qubit(b)?;
        self.push(Gate::Cswap(c, a, b))
    }

    /// Measure a qubit into a classical bit
    pub fn measure(
        &mut self,
        q: impl Into<QubitRef>,
        c: impl Into<ClbitRef>,
    ) -> QcResult<&mut Self> {
        let q = self.resolve_qubit(q)?;
        let c = self.resolve_clbit(c)?;
        self.push(Gate::Measure(q, c))
    }

    /// Barrier over the given qubits
    pub fn barrier<I, Q>(&mut self, qubits: I) -> QcResult<&mut Self>
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QubitRef>,
    {
        let qs = qubits
            .into_iter()
            .map(|q| self.resolve_qubit(q))
            .collect::<QcResult<Vec<_>>>()?;
        self.push(Gate::Barrier(qs))
    }

    /// Barrier over every qubit
    pub fn barrier_all(&mut self) -> QcResult<&mut Self> {
        let qs: Vec<QubitId> = (0..self.num_qubits()).collect();
        self.push(Gate::Barrier(qs))
    }

    /// Add a barrier, a new classical register `meas` sized to the qubit
    /// count, and measure every qubit into it
    pub fn measure_all(&mut self) -> QcResult<&mut Self> {
        let n = self.num_qubits();
        self.add_creg(ClassicalRegister::new(n, MEASURE_ALL_REGISTER))?;
        let offset = self.clbit_offset(MEASURE_ALL_REGISTER)?;
        self.barrier_all()?;
        for q in 0..n {
            self.add_gate(Gate::Measure(q, offset + q))?;
        }
        Ok(self)
    }

    /// Record the full statevector at this point of the circuit
    pub fn save_statevector(&mut self) -> QcResult<&mut Self> {
        self.push(Gate::SaveStatevector)
    }

    /// Apply a user-defined instruction to the given qubits
    pub fn append<I, Q>(&mut self, instruction: &CompositeGate, qubits: I) -> QcResult<&mut Self>
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QubitRef>,
    {
        let qs = qubits
            .into_iter()
            .map(|q| self.resolve_qubit(q))
            .collect::<QcResult<Vec<_>>>()?;
        if qs.len() != instruction.num_qubits() {
            return Err(QcError::ArityMismatch {
                name: instruction.name().to_string(),
                expected: instruction.num_qubits(),
                got: qs.len(),
            });
        }
        self.push(Gate::Composite(Box::new(instruction.clone()), qs))
    }

    // ========================================================================
    // Instruction Conversion
    // ========================================================================

    /// Turn this circuit into a reusable instruction named after it
    pub fn to_instruction(&self) -> QcResult<CompositeGate> {
        if self.num_clbits() > 0 {
            return Err(QcError::NonUnitaryInstruction(format!(
                "'{}' has {} classical bits",
                self.name,
                self.num_clbits()
            )));
        }
        let body: Vec<Gate> = self
            .gates
            .iter()
            .filter(|g| !matches!(g, Gate::SaveStatevector))
            .cloned()
            .collect();
        CompositeGate::new(self.name.clone(), self.num_qubits(), body)
    }

    /// Copy of this circuit with every composite instruction flattened
    pub fn unrolled(&self) -> QcResult<Circuit> {
        let mut gates = Vec::with_capacity(self.gates.len());
        for gate in &self.gates {
            match gate {
                Gate::Composite(def, qs) => gates.extend(def.unroll(qs)?),
                other => gates.push(other.clone()),
            }
        }
        Ok(Circuit {
            name: self.name.clone(),
            qregs: self.qregs.clone(),
            cregs: self.cregs.clone(),
            gates,
        })
    }

    /// Empty circuit with the same registers and name
    pub fn empty_like(&self) -> Circuit {
        Circuit {
            name: self.name.clone(),
            qregs: self.qregs.clone(),
            cregs: self.cregs.clone(),
            gates: Vec::new(),
        }
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Circuit depth over qubit and classical wires (directives excluded)
    pub fn depth(&self) -> usize {
        let nq = self.num_qubits();
        let mut wire_depths = vec![0usize; nq + self.num_clbits()];

        for gate in self.gates.iter().filter(|g| !g.is_directive()) {
            let wires: Vec<usize> = gate
                .qubits()
                .into_iter()
                .chain(gate.clbits().into_iter().map(|c| nq + c))
                .collect();
            let level = wires
                .iter()
                .filter_map(|&w| wire_depths.get(w))
                .max()
                .copied()
                .unwrap_or(0)
                + 1;
            for w in wires {
                if let Some(d) = wire_depths.get_mut(w) {
                    *d = level;
                }
            }
        }

        wire_depths.into_iter().max().unwrap_or(0)
    }

    /// Total number of operations
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Operation counts by name
    pub fn count_ops(&self) -> BTreeMap<String, usize> {
        let mut ops = BTreeMap::new();
        for gate in &self.gates {
            *ops.entry(gate.name().to_string()).or_insert(0) += 1;
        }
        ops
    }

    /// Count single-qubit gates
    pub fn count_1q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_single_qubit()).count()
    }

    /// Count two-qubit gates
    pub fn count_2q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_two_qubit()).count()
    }

    /// Count three-qubit gates
    pub fn count_3q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_three_qubit()).count()
    }

    /// Count measurement operations
    pub fn count_measurements(&self) -> usize {
        self.gates.iter().filter(|g| g.is_measurement()).count()
    }

    /// Qubits touched by any operation other than a barrier
    pub fn used_qubits(&self) -> BTreeSet<QubitId> {
        self.gates
            .iter()
            .filter(|g| !g.is_barrier())
            .flat_map(|g| g.qubits())
            .collect()
    }

    /// Operand pairs of two-qubit gates (for topology validation)
    pub fn two_qubit_pairs(&self) -> Vec<(QubitId, QubitId)> {
        self.gates
            .iter()
            .filter(|g| g.is_two_qubit())
            .filter_map(|g| match g.qubits().as_slice() {
                [a, b] => Some((*a, *b)),
                _ => None,
            })
            .collect()
    }

    /// Check for a reset anywhere in the circuit
    pub fn has_reset(&self) -> bool {
        self.gates.iter().any(|g| matches!(g, Gate::Reset(_)))
    }

    /// Check whether some qubit is acted on after being measured
    pub fn has_mid_circuit_measurement(&self) -> bool {
        let mut measured = HashSet::new();
        for gate in self.gates.iter().filter(|g| !g.is_directive()) {
            match gate {
                Gate::Measure(q, _) => {
                    if !measured.insert(*q) {
                        return true;
                    }
                }
                other => {
                    if other.qubits().iter().any(|q| measured.contains(q)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Estimate total execution time in nanoseconds (serial sum)
    pub fn total_time_ns(&self) -> f64 {
        self.gates.iter().map(|g| g.gate_time_ns()).sum()
    }

    /// Validate circuit against a topology
    pub fn validate(&self, topology: &Topology) -> QcResult<()> {
        topology.validate_circuit(self)
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Text drawing with default options
    pub fn draw(&self) -> String {
        drawer::draw(self, &DrawOptions::default())
    }

    /// Text drawing with explicit options
    pub fn draw_with(&self, options: &DrawOptions) -> String {
        drawer::draw(self, options)
    }

    // ========================================================================
    // QASM Conversion
    // ========================================================================

    /// Convert to OpenQASM 2.0
    pub fn to_qasm(&self) -> String {
        let mut lines = vec![
            "OPENQASM 2.0;".to_string(),
            "include \"qelib1.inc\";".to_string(),
        ];

        let mut defined = HashSet::new();
        for gate in &self.gates {
            if let Gate::Composite(def, _) = gate {
                emit_gate_definition(def, &mut defined, &mut lines);
            }
        }

        for r in &self.qregs {
            lines.push(format!("qreg {}[{}];", r.name(), r.size()));
        }
        for r in &self.cregs {
            lines.push(format!("creg {}[{}];", r.name(), r.size()));
        }

        let qubit_name = |q: QubitId| match self.qubit_location(q) {
            Some((reg, i)) => format!("{}[{}]", reg, i),
            None => format!("q[{}]", q),
        };
        let clbit_name = |c: ClbitId| match self.clbit_location(c) {
            Some((reg, i)) => format!("{}[{}]", reg, i),
            None => format!("c[{}]", c),
        };

        for gate in &self.gates {
            match gate {
                Gate::Barrier(qs) if qs.is_empty() => {
                    let regs: Vec<&str> = self.qregs.iter().map(|r| r.name()).collect();
                    lines.push(format!("barrier {};", regs.join(",")));
                }
                _ => lines.push(gate.to_qasm_with(&qubit_name, &clbit_name)),
            }
        }

        lines.join("\n")
    }

    /// Parse from OpenQASM 2.0 (registers, standard gates, measure, barrier,
    /// reset). Gate definitions and unknown statements are skipped with a
    /// warning.
    pub fn from_qasm(qasm: &str) -> QcResult<Self> {
        let mut circuit = Circuit::new(0, 0);
        let mut in_definition = false;

        for raw in qasm.split(';').flat_map(|s| s.lines()) {
            let line = match raw.find("//") {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();

            if line.is_empty() {
                continue;
            }
            if in_definition {
                if line.contains('}') {
                    in_definition = false;
                }
                continue;
            }
            if line.starts_with("OPENQASM") || line.starts_with("include") {
                continue;
            }
            if line.starts_with("gate ") {
                log::warn!("skipping gate definition: {}", line);
                in_definition = !line.contains('}');
                continue;
            }
            if let Some(rest) = line.strip_prefix("qreg") {
                let (name, size) = parse_register_decl(rest)?;
                circuit.add_qreg(QuantumRegister::new(size, name))?;
                continue;
            }
            if let Some(rest) = line.strip_prefix("creg") {
                let (name, size) = parse_register_decl(rest)?;
                circuit.add_creg(ClassicalRegister::new(size, name))?;
                continue;
            }

            match parse_operation(&circuit, line)? {
                Some(gates) => circuit.add_gates(gates)?,
                None => log::warn!("skipping unsupported QASM statement: {}", line),
            }
        }

        if circuit.num_qubits() == 0 {
            return Err(QcError::InvalidQasm("No qreg declaration found".into()));
        }

        Ok(circuit)
    }
}

// ============================================================================
// QASM Helpers
// ============================================================================

fn emit_gate_definition(def: &CompositeGate, defined: &mut HashSet<String>, out: &mut Vec<String>) {
    if defined.contains(def.name()) {
        return;
    }
    for gate in def.gates() {
        if let Gate::Composite(inner, _) = gate {
            emit_gate_definition(inner, defined, out);
        }
    }
    defined.insert(def.name().to_string());

    let params: Vec<String> = (0..def.num_qubits()).map(|i| format!("q{}", i)).collect();
    let local = |q: QubitId| format!("q{}", q);
    let body: Vec<String> = def
        .gates()
        .iter()
        .map(|g| g.to_qasm_with(&local, &|c| format!("c{}", c)))
        .collect();
    out.push(format!(
        "gate {} {} {{ {} }}",
        def.name(),
        params.join(","),
        body.join(" ")
    ));
}

/// Byte positions of the `[` and `]` enclosing an index
fn bracket_span(s: &str) -> QcResult<(usize, usize)> {
    match (s.find('['), s.find(']')) {
        (Some(open), Some(close)) if close > open => Ok((open, close)),
        _ => Err(QcError::InvalidQasm(format!("bad index brackets: {}", s))),
    }
}

fn parse_register_decl(rest: &str) -> QcResult<(String, usize)> {
    // " name[N]" -> (name, N)
    let rest = rest.trim();
    let (open, close) = bracket_span(rest)?;
    let name = rest[..open].trim();
    if name.is_empty() {
        return Err(QcError::InvalidQasm(format!("bad register declaration: {}", rest)));
    }
    let size = rest[open + 1..close]
        .trim()
        .parse()
        .map_err(|_| QcError::InvalidQasm(format!("bad register size: {}", rest)))?;
    Ok((name.to_string(), size))
}

/// Parse an angle expression such as `0.5`, `pi/2`, `-3*pi/4`
fn parse_angle(expr: &str) -> QcResult<Angle> {
    let expr = expr.trim();
    let (sign, body) = match expr.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, expr),
    };

    let mut value = 1.0;
    let mut op = '*';
    let mut token = String::new();
    let apply = |value: f64, op: char, token: &str| -> QcResult<f64> {
        let t = token.trim();
        let x = if t == "pi" {
            std::f64::consts::PI
        } else {
            t.parse::<f64>()
                .map_err(|_| QcError::InvalidQasm(format!("bad parameter: {}", expr)))?
        };
        Ok(if op == '*' { value * x } else { value / x })
    };

    for ch in body.chars() {
        if ch == '*' || ch == '/' {
            value = apply(value, op, &token)?;
            op = ch;
            token.clear();
        } else {
            token.push(ch);
        }
    }
    value = apply(value, op, &token)?;
    Ok(sign * value)
}

/// Resolve `reg[i]` to one qubit, or `reg` to every qubit of the register
fn parse_qubit_operand(circuit: &Circuit, s: &str) -> QcResult<Vec<QubitId>> {
    let s = s.trim();
    match s.find('[') {
        Some(_) => {
            let (open, close) = bracket_span(s)?;
            let index: usize = s[open + 1..close]
                .trim()
                .parse()
                .map_err(|_| QcError::InvalidQasm(format!("bad operand: {}", s)))?;
            let bit = Qubit {
                register: s[..open].trim().to_string(),
                index,
            };
            Ok(vec![circuit.resolve_qubit(bit)?])
        }
        None => {
            let offset = circuit.qubit_offset(s)?;
            let size = circuit
                .qregs()
                .iter()
                .find(|r| r.name() == s)
                .map(|r| r.size())
                .unwrap_or(0);
            Ok((offset..offset + size).collect())
        }
    }
}

fn parse_clbit_operand(circuit: &Circuit, s: &str) -> QcResult<Vec<ClbitId>> {
    let s = s.trim();
    match s.find('[') {
        Some(_) => {
            let (open, close) = bracket_span(s)?;
            let index: usize = s[open + 1..close]
                .trim()
                .parse()
                .map_err(|_| QcError::InvalidQasm(format!("bad operand: {}", s)))?;
            let bit = Clbit {
                register: s[..open].trim().to_string(),
                index,
            };
            Ok(vec![circuit.resolve_clbit(bit)?])
        }
        None => {
            let offset = circuit.clbit_offset(s)?;
            let size = circuit
                .cregs()
                .iter()
                .find(|r| r.name() == s)
                .map(|r| r.size())
                .unwrap_or(0);
            Ok((offset..offset + size).collect())
        }
    }
}

fn parse_operation(circuit: &Circuit, line: &str) -> QcResult<Option<Vec<Gate>>> {
    if let Some(rest) = line.strip_prefix("measure") {
        let (lhs, rhs) = rest
            .split_once("->")
            .ok_or_else(|| QcError::InvalidQasm(format!("bad measure: {}", line)))?;
        let qs = parse_qubit_operand(circuit, lhs)?;
        let cs = parse_clbit_operand(circuit, rhs)?;
        if qs.len() != cs.len() {
            return Err(QcError::InvalidQasm(format!("measure size mismatch: {}", line)));
        }
        return Ok(Some(
            qs.into_iter().zip(cs).map(|(q, c)| Gate::Measure(q, c)).collect(),
        ));
    }

    // Split "name(params) operands"
    let (head, operands) = match line.find(')') {
        Some(close) if line.contains('(') => (&line[..=close], &line[close + 1..]),
        _ => match line.split_once(char::is_whitespace) {
            Some((h, o)) => (h, o),
            None => return Ok(None),
        },
    };
    let (name, params) = match head.find('(') {
        Some(open) => {
            let inner = &head[open + 1..head.len() - 1];
            let params = inner
                .split(',')
                .map(parse_angle)
                .collect::<QcResult<Vec<_>>>()?;
            (head[..open].trim(), params)
        }
        None => (head.trim(), Vec::new()),
    };

    let qubits: Vec<Vec<QubitId>> = operands
        .split(',')
        .map(|o| parse_qubit_operand(circuit, o))
        .collect::<QcResult<_>>()?;

    if name == "barrier" {
        return Ok(Some(vec![Gate::Barrier(qubits.concat())]));
    }

    // Register operands broadcast element-wise; single bits repeat
    let width = qubits.iter().map(Vec::len).max().unwrap_or(0);
    if qubits.iter().any(|v| v.len() != 1 && v.len() != width) {
        return Err(QcError::InvalidQasm(format!("register size mismatch: {}", line)));
    }

    let name = name.to_lowercase();
    let mut gates = Vec::with_capacity(width);
    for i in 0..width {
        let operands: Vec<QubitId> = qubits
            .iter()
            .map(|v| if v.len() == 1 { v[0] } else { v[i] })
            .collect();
        match build_gate(&name, &operands, &params) {
            Some(gate) => gates.push(gate),
            None => return Ok(None),
        }
    }
    Ok(Some(gates))
}

fn build_gate(name: &str, qubits: &[QubitId], params: &[Angle]) -> Option<Gate> {
    let param = |i: usize| params.get(i).copied();

    let gate = match (name, qubits) {
        ("h", [q]) => Gate::H(*q),
        ("x", [q]) => Gate::X(*q),
        ("y", [q]) => Gate::Y(*q),
        ("z", [q]) => Gate::Z(*q),
        ("s", [q]) => Gate::S(*q),
        ("sdg", [q]) => Gate::Sdg(*q),
        ("t", [q]) => Gate::T(*q),
        ("tdg", [q]) => Gate::Tdg(*q),
        ("sx", [q]) => Gate::Sx(*q),
        ("sxdg", [q]) => Gate::Sxdg(*q),
        ("id", [q]) => Gate::Id(*q),
        ("reset", [q]) => Gate::Reset(*q),
        ("rx", [q]) => Gate::Rx(*q, param(0)?),
        ("ry", [q]) => Gate::Ry(*q, param(0)?),
        ("rz", [q]) => Gate::Rz(*q, param(0)?),
        ("p" | "u1", [q]) => Gate::P(*q, param(0)?),
        ("u" | "u3", [q]) => Gate::U(*q, param(0)?, param(1)?, param(2)?),
        ("cx" | "cnot", [a, b]) => Gate::Cnot(*a, *b),
        ("cz", [a, b]) => Gate::Cz(*a, *b),
        ("cy", [a, b]) => Gate::Cy(*a, *b),
        ("swap", [a, b]) => Gate::Swap(*a, *b),
        ("iswap", [a, b]) => Gate::ISwap(*a, *b),
        ("ecr", [a, b]) => Gate::Ecr(*a, *b),
        ("crz", [a, b]) => Gate::Crz(*a, *b, param(0)?),
        ("crx", [a, b]) => Gate::Crx(*a, *b, param(0)?),
        ("cry", [a, b]) => Gate::Cry(*a, *b, param(0)?),
        ("ccx" | "toffoli", [a, b, c]) => Gate::Ccx(*a, *b, *c),
        ("cswap" | "fredkin", [a, b, c]) => Gate::Cswap(*a, *b, *c),
        _ => return None,
    };
    Some(gate)
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit '{}' ({} qubits, {} clbits, {} ops)",
            self.name,
            self.num_qubits(),
            self.num_clbits(),
            self.gates.len()
        )?;
        writeln!(f, "  Depth: {}", self.depth())?;
        writeln!(f, "  1Q gates: {}", self.count_1q())?;
        writeln!(f, "  2Q gates: {}", self.count_2q())?;
        writeln!(f, "  Measurements: {}", self.count_measurements())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
