//! Text drawing of circuits
//!
//! Operations are packed greedily into columns: each operation lands in the
//! first column after the last one used by any wire between its lowest and
//! highest wire. Each wire is drawn as a top, wire and bottom line; the
//! bottom line of one wire is overlaid on the top line of the next, so boxes
//! on neighbouring wires share their edges.
//!
//! ```text
//!      ┌───┐
//! a_0: ┤ H ├──■──
//!      └───┘┌─┴─┐
//! a_1: ─────┤ X ├
//!           └───┘
//! ```

use crate::circuit::Circuit;
use crate::gate::Gate;
use std::f64::consts::PI;

const QUANTUM_WIRE: char = '─';
const CLASSICAL_WIRE: char = '═';

/// Drawing options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOptions {
    /// Wrap the drawing when it gets wider than this many characters
    pub fold: Option<usize>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self { fold: Some(80) }
    }
}

impl DrawOptions {
    /// Never wrap
    pub fn unfolded() -> Self {
        Self { fold: None }
    }
}

/// Render a circuit as text
pub fn draw(circuit: &Circuit, options: &DrawOptions) -> String {
    let nq = circuit.num_qubits();
    let num_wires = nq + circuit.num_clbits();

    let labels: Vec<String> = (0..nq)
        .map(|q| match circuit.qubit_location(q) {
            Some((reg, i)) => format!("{}_{}: ", reg, i),
            None => format!("q_{}: ", q),
        })
        .chain((0..circuit.num_clbits()).map(|c| match circuit.clbit_location(c) {
            Some((reg, i)) => format!("{}_{}: ", reg, i),
            None => format!("c_{}: ", c),
        }))
        .collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let columns = pack_columns(circuit, num_wires);
    let rendered: Vec<RenderedColumn> = columns
        .iter()
        .map(|ops| render_column(ops, nq, num_wires))
        .collect();

    // Group columns into folds
    let mut chunks: Vec<Vec<&RenderedColumn>> = vec![Vec::new()];
    let mut used = label_width;
    for col in &rendered {
        let fits = match options.fold {
            Some(limit) => used + col.width <= limit,
            None => true,
        };
        let current_empty = chunks.last().map(|c| c.is_empty()).unwrap_or(true);
        if !fits && !current_empty {
            chunks.push(Vec::new());
            used = label_width;
        }
        used += col.width;
        if let Some(chunk) = chunks.last_mut() {
            chunk.push(col);
        }
    }

    let blocks: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            let pad = " ".repeat(label_width);
            let line = |w: usize, part: usize| -> String {
                chunk.iter().map(|col| col.rows[w][part].as_str()).collect()
            };

            let mut lines = Vec::with_capacity(num_wires * 2 + 1);
            if num_wires > 0 {
                lines.push(format!("{}{}", pad, line(0, 0)));
            }
            for (w, label) in labels.iter().enumerate() {
                lines.push(format!("{:>width$}{}", label, line(w, 1), width = label_width));
                let below = if w + 1 < num_wires {
                    merge_rows(&line(w, 2), &line(w + 1, 0))
                } else {
                    line(w, 2)
                };
                lines.push(format!("{}{}", pad, below));
            }
            lines
                .iter()
                .map(|l| l.trim_end())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    blocks.join("\n\n")
}

/// Overlay the bottom line of one wire with the top line of the next
fn merge_rows(upper: &str, lower: &str) -> String {
    upper
        .chars()
        .zip(lower.chars())
        .map(|(a, b)| merge_char(a, b))
        .collect()
}

fn merge_char(a: char, b: char) -> char {
    match (a, b) {
        (' ', x) | (x, ' ') => x,
        (x, y) if x == y => x,
        ('│' | '║', x) | (x, '│' | '║') => x,
        ('└', '┌') => '├',
        ('┘', '┐') => '┤',
        ('┬', '┴') => '┼',
        ('└' | '┘', '─') => '┴',
        ('─', '┌' | '┐') => '┬',
        (_, x) => x,
    }
}

// ============================================================================
// Column Packing
// ============================================================================

fn wire_span(gate: &Gate, nq: usize, num_wires: usize) -> Option<(usize, usize)> {
    let mut wires: Vec<usize> = match gate {
        Gate::Barrier(qs) if qs.is_empty() => (0..nq).collect(),
        Gate::SaveStatevector => (0..nq).collect(),
        _ => gate.qubits(),
    };
    wires.extend(gate.clbits().into_iter().map(|c| nq + c));
    let lo = *wires.iter().min()?;
    let hi = *wires.iter().max()?;
    if hi >= num_wires {
        return None;
    }
    Some((lo, hi))
}

fn pack_columns(circuit: &Circuit, num_wires: usize) -> Vec<Vec<(usize, usize, &Gate)>> {
    let nq = circuit.num_qubits();
    let mut columns: Vec<Vec<(usize, usize, &Gate)>> = Vec::new();
    let mut next_free = vec![0usize; num_wires];

    for gate in circuit.gates() {
        let Some((lo, hi)) = wire_span(gate, nq, num_wires) else {
            continue;
        };
        let col = next_free[lo..=hi].iter().copied().max().unwrap_or(0);
        if col == columns.len() {
            columns.push(Vec::new());
        }
        columns[col].push((lo, hi, gate));
        for slot in &mut next_free[lo..=hi] {
            *slot = col + 1;
        }
    }

    columns
}

// ============================================================================
// Cells
// ============================================================================

#[derive(Debug, Clone)]
enum Cell {
    Boxed { label: String, up: bool, down: bool },
    Dot { up: bool, down: bool },
    Swap { up: bool, down: bool },
    Cross { double: bool },
    Barrier,
    Measure,
    MeasureTarget { index: usize },
    Span { text: String, first: bool, last: bool },
    Text(String),
}

impl Cell {
    fn width(&self) -> usize {
        match self {
            Cell::Boxed { label, .. } => label.chars().count() + 4,
            Cell::Span { text, .. } => text.chars().count() + 2,
            Cell::Text(t) => t.chars().count() + 2,
            Cell::MeasureTarget { index } => index.to_string().len().max(3),
            _ => 3,
        }
    }

    fn render(&self, width: usize, fill: char) -> [String; 3] {
        let c = width / 2;
        match self {
            Cell::Boxed { label, up, down } => {
                let inner = width - 2;
                let mut top: Vec<char> = std::iter::once('┌')
                    .chain(std::iter::repeat('─').take(inner))
                    .chain(std::iter::once('┐'))
                    .collect();
                let mut bot: Vec<char> = std::iter::once('└')
                    .chain(std::iter::repeat('─').take(inner))
                    .chain(std::iter::once('┘'))
                    .collect();
                if *up {
                    top[c] = '┴';
                }
                if *down {
                    bot[c] = '┬';
                }
                [
                    top.into_iter().collect(),
                    format!("┤{}├", center(label, inner, ' ')),
                    bot.into_iter().collect(),
                ]
            }
            Cell::Dot { up, down } => glyph(width, fill, vert(*up), '■', vert(*down)),
            Cell::Swap { up, down } => glyph(width, fill, vert(*up), 'X', vert(*down)),
            Cell::Cross { double } => {
                if *double {
                    let crossing = if fill == CLASSICAL_WIRE { '╬' } else { '╫' };
                    glyph(width, fill, '║', crossing, '║')
                } else {
                    glyph(width, fill, '│', '┼', '│')
                }
            }
            Cell::Barrier => glyph(width, fill, '░', '░', '░'),
            Cell::Measure => [
                place("┌─┐", width, ' '),
                place("┤M├", width, fill),
                place("└╥┘", width, ' '),
            ],
            Cell::MeasureTarget { index } => [
                place("║", width, ' '),
                place("╩", width, fill),
                place(&index.to_string(), width, ' '),
            ],
            Cell::Span { text, first, last } => {
                let inner = width - 2;
                let edge = |open: bool, l: char, r: char| {
                    if open {
                        format!("{}{}{}", l, "─".repeat(inner), r)
                    } else {
                        format!("│{}│", " ".repeat(inner))
                    }
                };
                [
                    edge(*first, '┌', '┐'),
                    format!("┤{:<inner$}├", text, inner = inner),
                    edge(*last, '└', '┘'),
                ]
            }
            Cell::Text(t) => [
                " ".repeat(width),
                place(t, width, fill),
                " ".repeat(width),
            ],
        }
    }
}

fn vert(connected: bool) -> char {
    if connected {
        '│'
    } else {
        ' '
    }
}

fn glyph(width: usize, fill: char, top: char, mid: char, bot: char) -> [String; 3] {
    [
        place(&top.to_string(), width, ' '),
        place(&mid.to_string(), width, fill),
        place(&bot.to_string(), width, ' '),
    ]
}

/// Place `s` so its middle character sits at `width / 2`
fn place(s: &str, width: usize, fill: char) -> String {
    let n = s.chars().count();
    let left = (width / 2).saturating_sub(n / 2);
    let right = width.saturating_sub(left + n);
    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(s);
    out.extend(std::iter::repeat(fill).take(right));
    out
}

fn center(s: &str, width: usize, fill: char) -> String {
    let n = s.chars().count();
    let left = width.saturating_sub(n) / 2;
    let right = width.saturating_sub(left + n);
    let mut out = String::new();
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(s);
    out.extend(std::iter::repeat(fill).take(right));
    out
}

// ============================================================================
// Column Rendering
// ============================================================================

struct RenderedColumn {
    width: usize,
    rows: Vec<[String; 3]>,
}

fn wire_fill(wire: usize, nq: usize) -> char {
    if wire < nq {
        QUANTUM_WIRE
    } else {
        CLASSICAL_WIRE
    }
}

fn render_column(ops: &[(usize, usize, &Gate)], nq: usize, num_wires: usize) -> RenderedColumn {
    let laid_out: Vec<(usize, Vec<Option<Cell>>)> = ops
        .iter()
        .map(|&(lo, hi, gate)| (lo, layout_op(gate, lo, hi, nq)))
        .collect();

    let op_widths: Vec<usize> = laid_out
        .iter()
        .map(|(_, cells)| cells.iter().flatten().map(Cell::width).max().unwrap_or(1))
        .collect();
    let width = op_widths.iter().copied().max().unwrap_or(1);

    let mut rows: Vec<[String; 3]> = (0..num_wires)
        .map(|w| {
            let f = wire_fill(w, nq);
            [
                " ".repeat(width),
                f.to_string().repeat(width),
                " ".repeat(width),
            ]
        })
        .collect();

    for ((lo, cells), op_width) in laid_out.iter().zip(op_widths) {
        let left = (width - op_width) / 2;
        let right = width - op_width - left;
        for (offset, cell) in cells.iter().enumerate() {
            let w = lo + offset;
            let Some(cell) = cell else { continue };
            let f = wire_fill(w, nq);
            let [top, mid, bot] = cell.render(op_width, f);
            rows[w] = [
                format!("{}{}{}", " ".repeat(left), top, " ".repeat(right)),
                format!(
                    "{}{}{}",
                    f.to_string().repeat(left),
                    mid,
                    f.to_string().repeat(right)
                ),
                format!("{}{}{}", " ".repeat(left), bot, " ".repeat(right)),
            ];
        }
    }

    RenderedColumn { width, rows }
}

/// Cells for wires `lo..=hi` of one operation
fn layout_op(gate: &Gate, lo: usize, hi: usize, nq: usize) -> Vec<Option<Cell>> {
    let span = hi - lo + 1;
    let mut cells: Vec<Option<Cell>> = vec![None; span];
    let links = |w: usize| (w > lo, w < hi);

    match gate {
        Gate::Measure(q, c) => {
            let target = nq + c;
            for (i, slot) in cells.iter_mut().enumerate() {
                let w = lo + i;
                *slot = Some(if w == *q {
                    Cell::Measure
                } else if w == target {
                    Cell::MeasureTarget { index: *c }
                } else {
                    Cell::Cross { double: true }
                });
            }
        }
        Gate::Barrier(qs) => {
            for (i, slot) in cells.iter_mut().enumerate() {
                if qs.is_empty() || qs.contains(&(lo + i)) {
                    *slot = Some(Cell::Barrier);
                }
            }
        }
        Gate::SaveStatevector => {
            return span_box("save_statevector", &(lo..=hi).collect::<Vec<_>>(), lo, hi, false);
        }
        Gate::Composite(def, qs) => return span_box(def.name(), qs, lo, hi, true),
        Gate::ISwap(a, b) => return span_box("Iswap", &[*a, *b], lo, hi, true),
        Gate::Ecr(a, b) => return span_box("Ecr", &[*a, *b], lo, hi, true),
        _ if gate.is_single_qubit() || matches!(gate, Gate::Reset(_)) => {
            cells[0] = Some(match gate {
                Gate::Reset(_) => Cell::Text("|0>".to_string()),
                other => Cell::Boxed {
                    label: gate_label(other),
                    up: false,
                    down: false,
                },
            });
        }
        _ => {
            let qs = gate.qubits();
            let (controls, targets): (Vec<usize>, Vec<usize>) = match gate {
                Gate::Cz(a, b) => (vec![*a, *b], vec![]),
                Gate::Swap(a, b) => (vec![], vec![*a, *b]),
                Gate::Cswap(c, a, b) => (vec![*c], vec![*a, *b]),
                Gate::Ccx(a, b, t) => (vec![*a, *b], vec![*t]),
                _ => (qs[..1].to_vec(), qs[1..].to_vec()),
            };
            for (i, slot) in cells.iter_mut().enumerate() {
                let w = lo + i;
                let (up, down) = links(w);
                *slot = Some(if controls.contains(&w) {
                    Cell::Dot { up, down }
                } else if targets.contains(&w) {
                    match gate {
                        Gate::Swap(_, _) | Gate::Cswap(_, _, _) => Cell::Swap { up, down },
                        _ => Cell::Boxed {
                            label: target_label(gate),
                            up,
                            down,
                        },
                    }
                } else {
                    Cell::Cross { double: false }
                });
            }
        }
    }

    cells
}

fn span_box(name: &str, operands: &[usize], lo: usize, hi: usize, numbered: bool) -> Vec<Option<Cell>> {
    let index_width = if numbered {
        operands.len().saturating_sub(1).to_string().len()
    } else {
        0
    };
    let middle = (hi - lo) / 2;
    (lo..=hi)
        .enumerate()
        .map(|(i, w)| {
            let index = if numbered {
                operands
                    .iter()
                    .position(|&q| q == w)
                    .map(|p| p.to_string())
                    .unwrap_or_default()
            } else {
                String::new()
            };
            let label = if i == middle { name } else { "" };
            let text = if numbered {
                format!("{:<iw$} {:<nw$} ", index, label, iw = index_width, nw = name.len())
            } else {
                format!(" {:<nw$} ", label, nw = name.len())
            };
            Some(Cell::Span {
                text,
                first: w == lo,
                last: w == hi,
            })
        })
        .collect()
}

// ============================================================================
// Labels
// ============================================================================

/// Box label for a single-qubit gate
fn gate_label(gate: &Gate) -> String {
    let base = match gate {
        Gate::Sx(_) => "√X".to_string(),
        Gate::Sxdg(_) => "√Xdg".to_string(),
        Gate::Id(_) => "I".to_string(),
        other => capitalize(other.name()),
    };
    let params = gate.params();
    if params.is_empty() {
        base
    } else {
        let args: Vec<String> = params.iter().map(|&p| format_angle(p)).collect();
        format!("{}({})", base, args.join(","))
    }
}

/// Box label drawn on the target of a controlled gate
fn target_label(gate: &Gate) -> String {
    match gate {
        Gate::Cnot(_, _) | Gate::Ccx(_, _, _) => "X".to_string(),
        Gate::Cy(_, _) => "Y".to_string(),
        Gate::Crx(_, _, t) => format!("Rx({})", format_angle(*t)),
        Gate::Cry(_, _, t) => format!("Ry({})", format_angle(*t)),
        Gate::Crz(_, _, t) => format!("Rz({})", format_angle(*t)),
        other => capitalize(other.name()),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format an angle, using fractions of π where they are exact
pub fn format_angle(theta: f64) -> String {
    if theta == 0.0 {
        return "0".to_string();
    }
    let ratio = theta / PI;
    for den in [1i64, 2, 3, 4, 6, 8] {
        let num = ratio * den as f64;
        if (num - num.round()).abs() < 1e-9 {
            let num = num.round() as i64;
            let sign = if num < 0 { "-" } else { "" };
            let coeff = match num.abs() {
                1 => String::new(),
                n => n.to_string(),
            };
            return if den == 1 {
                format!("{}{}π", sign, coeff)
            } else {
                format!("{}{}π/{}", sign, coeff, den)
            };
        }
    }
    let s = format!("{:.4}", theta);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{ClassicalRegister, QuantumRegister};

    #[test]
    fn test_bell_drawing() {
        let a = QuantumRegister::new(2, "a");
        let mut c = Circuit::from_registers(vec![a.clone()], vec![]).unwrap();
        c.h(a.bit(0)).unwrap();
        c.cx(a.bit(0), a.bit(1)).unwrap();

        let expected = [
            "     ┌───┐",
            "a_0: ┤ H ├──■──",
            "     └───┘┌─┴─┐",
            "a_1: ─────┤ X ├",
            "          └───┘",
        ]
        .join("\n");
        assert_eq!(c.draw(), expected);
    }

    #[test]
    fn test_stacked_boxes_share_edges() {
        let mut c = Circuit::new(2, 0);
        c.h(0).unwrap().h(1).unwrap();
        let expected = ["     ┌───┐", "q_0: ┤ H ├", "     ├───┤", "q_1: ┤ H ├", "     └───┘"].join("\n");
        assert_eq!(c.draw(), expected);
    }

    #[test]
    fn test_measure_drops_to_classical_row() {
        let mut c = Circuit::new(2, 1);
        c.h(0).unwrap().cx(0, 1).unwrap().measure(1, 0).unwrap();
        let text = c.draw();
        assert!(text.contains("┤M├"));
        assert!(text.contains("╩"));
        assert!(text.contains("c_0: "));
        // measurement passes no qubit rows between q_1 and c_0
        assert!(!text.contains("╫"));
    }

    #[test]
    fn test_measure_crosses_rows() {
        let mut c = Circuit::from_registers(
            vec![QuantumRegister::new(2, "q")],
            vec![ClassicalRegister::new(2, "m")],
        )
        .unwrap();
        c.measure(0, 1).unwrap();
        let text = c.draw();
        assert!(text.contains("╫"));
        assert!(text.contains("╬"));
    }

    #[test]
    fn test_composite_box() {
        let mut sub = Circuit::new(3, 0).with_name("toggle_cx");
        sub.cx(0, 1).unwrap().cx(1, 2).unwrap();
        let inst = sub.to_instruction().unwrap();
        let mut host = Circuit::new(4, 0);
        host.append(&inst, [1, 2, 3]).unwrap();
        let text = host.draw();
        assert!(text.contains("toggle_cx"));
        assert!(text.contains("┤0"));
        assert!(text.contains("┤2"));
        // q_0 is untouched
        let q0 = text.lines().find(|l| l.starts_with("q_0:")).unwrap();
        assert!(!q0.contains('┤'));
    }

    #[test]
    fn test_columns_pack() {
        let mut c = Circuit::new(3, 0);
        c.h(0).unwrap().h(2).unwrap();
        let cols = pack_columns(&c, 3);
        assert_eq!(cols.len(), 1);

        c.cx(0, 2).unwrap().h(1).unwrap();
        let cols = pack_columns(&c, 3);
        // h(1) cannot move before the cx which spans wire 1
        assert_eq!(cols.len(), 3);
    }

    #[test]
    fn test_fold_wraps() {
        let mut c = Circuit::new(1, 0);
        for _ in 0..30 {
            c.h(0).unwrap();
        }
        let folded = c.draw_with(&DrawOptions { fold: Some(40) });
        assert!(folded.contains("\n\n"));
        assert!(folded.lines().all(|l| l.chars().count() <= 40));
        assert!(!c.draw_with(&DrawOptions::unfolded()).contains("\n\n"));
    }

    #[test]
    fn test_format_angle() {
        assert_eq!(format_angle(PI / 2.0), "π/2");
        assert_eq!(format_angle(-PI), "-π");
        assert_eq!(format_angle(3.0 * PI / 4.0), "3π/4");
        assert_eq!(format_angle(0.25), "0.25");
    }
}
