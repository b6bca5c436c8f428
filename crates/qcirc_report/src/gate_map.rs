//! Text rendering of a device coupling map

use qcirc_core::Topology;
use std::fmt::Write;

/// Describe a topology: header, a chain diagram when the device is a
/// simple path, the edge list, and per-qubit degree and neighbours
pub fn render_gate_map(topology: &Topology) -> String {
    let n = topology.num_qubits();
    let edges = topology.edges();
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Gate map: {} ({} qubits, {} edges)",
        topology.name().unwrap_or("unnamed"),
        n,
        edges.len()
    );

    if let Some(chain) = path_order(topology) {
        let line: Vec<String> = chain.iter().map(|q| q.to_string()).collect();
        let _ = writeln!(output, "  {}", line.join(" ── "));
    }

    let edge_list: Vec<String> = edges.iter().map(|(a, b)| format!("{}-{}", a, b)).collect();
    let _ = writeln!(output, "Edges: {}", edge_list.join(", "));

    output.push_str("Qubit  Degree  Neighbors\n");
    for q in 0..n {
        let neighbors: Vec<String> = topology
            .neighbors(q)
            .iter()
            .map(|x| x.to_string())
            .collect();
        let _ = writeln!(output, "{:>5}  {:>6}  {}", q, topology.degree(q), neighbors.join(" "));
    }
    output
}

/// Qubits in path order when the coupling graph is a single chain
fn path_order(topology: &Topology) -> Option<Vec<usize>> {
    let n = topology.num_qubits();
    if n < 2 || topology.edges().len() != n - 1 {
        return None;
    }
    topology.find_linear_chain(n)
}
