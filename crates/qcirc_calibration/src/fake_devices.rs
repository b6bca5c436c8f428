//! Catalog of fake 5-qubit devices
//!
//! Frozen calibration snapshots of small superconducting processors. They
//! let the noisy backend and the transpiler run against realistic
//! connectivity and error figures without any network access.

use crate::calibration_info::{CalibrationInfo, DEFAULT_BASIS};
use qcirc_core::error::{QcError, QcResult};
use qcirc_core::QubitId;
use std::time::{Duration, SystemTime};

/// Snapshot date shared by the catalog (2022-01-01 UTC)
const SNAPSHOT_EPOCH_SECS: u64 = 1_640_995_200;

/// Per-qubit row: T1 (μs), T2 (μs), 1q error, readout error
type QubitRow = (f64, f64, f64, f64);

/// Per-edge row: qubit a, qubit b, CX error
type EdgeRow = (QubitId, QubitId, f64);

struct DeviceTable {
    name: &'static str,
    qubits: [QubitRow; 5],
    edges: &'static [EdgeRow],
    gate_2q_ns: f64,
}

const ATHENS: DeviceTable = DeviceTable {
    name: "fake_athens",
    qubits: [
        (95.2, 112.4, 0.00036, 0.016),
        (82.7, 105.1, 0.00029, 0.021),
        (110.6, 141.0, 0.00041, 0.012),
        (74.9, 96.3, 0.00033, 0.018),
        (101.3, 88.5, 0.00047, 0.027),
    ],
    edges: &[(0, 1, 0.0094), (1, 2, 0.0118), (2, 3, 0.0087), (3, 4, 0.0132)],
    gate_2q_ns: 355.6,
};

const BELEM: DeviceTable = DeviceTable {
    name: "fake_belem",
    qubits: [
        (87.4, 121.9, 0.00025, 0.024),
        (104.8, 92.6, 0.00044, 0.031),
        (91.5, 79.2, 0.00031, 0.019),
        (118.2, 133.7, 0.00038, 0.022),
        (66.1, 84.0, 0.00052, 0.035),
    ],
    edges: &[(0, 1, 0.0107), (1, 2, 0.0098), (1, 3, 0.0121), (3, 4, 0.0149)],
    gate_2q_ns: 412.4,
};

const MANILA: DeviceTable = DeviceTable {
    name: "fake_manila",
    qubits: [
        (134.7, 98.3, 0.00022, 0.017),
        (156.2, 71.8, 0.00026, 0.013),
        (121.9, 24.6, 0.00035, 0.025),
        (143.3, 63.1, 0.00024, 0.020),
        (112.0, 45.7, 0.00030, 0.029),
    ],
    edges: &[(0, 1, 0.0072), (1, 2, 0.0089), (2, 3, 0.0081), (3, 4, 0.0076)],
    gate_2q_ns: 277.3,
};

const LIMA: DeviceTable = DeviceTable {
    name: "fake_lima",
    qubits: [
        (102.4, 131.5, 0.00034, 0.026),
        (61.3, 89.8, 0.00048, 0.018),
        (93.0, 110.2, 0.00029, 0.033),
        (76.5, 57.4, 0.00041, 0.021),
        (48.8, 39.6, 0.00058, 0.042),
    ],
    edges: &[(0, 1, 0.0113), (1, 2, 0.0095), (1, 3, 0.0139), (3, 4, 0.0171)],
    gate_2q_ns: 448.0,
};

const CATALOG: [&DeviceTable; 4] = [&ATHENS, &BELEM, &MANILA, &LIMA];

impl DeviceTable {
    fn to_calibration(&self) -> CalibrationInfo {
        let mut info = CalibrationInfo::new(self.name)
            .with_basis_gates(&DEFAULT_BASIS)
            .with_gate_times(35.6, self.gate_2q_ns, 5351.1)
            .with_timestamp(SystemTime::UNIX_EPOCH + Duration::from_secs(SNAPSHOT_EPOCH_SECS));

        for (q, &(t1, t2, e1, ro)) in self.qubits.iter().enumerate() {
            info.set_qubit(q, t1, t2, e1, ro);
        }
        for &(a, b, e) in self.edges {
            info.add_edge(a, b, e);
        }
        info
    }
}

// ============================================================================
// Catalog Access
// ============================================================================

/// Linear 0-1-2-3-4
pub fn athens() -> CalibrationInfo {
    ATHENS.to_calibration()
}

/// T shape: 0-1, 1-2, 1-3, 3-4
pub fn belem() -> CalibrationInfo {
    BELEM.to_calibration()
}

/// Linear 0-1-2-3-4
pub fn manila() -> CalibrationInfo {
    MANILA.to_calibration()
}

/// T shape: 0-1, 1-2, 1-3, 3-4
pub fn lima() -> CalibrationInfo {
    LIMA.to_calibration()
}

/// Device names in catalog order
pub fn names() -> Vec<&'static str> {
    CATALOG.iter().map(|d| d.name).collect()
}

/// Look up a device by `fake_athens` or `athens` (case-insensitive)
pub fn by_name(name: &str) -> QcResult<CalibrationInfo> {
    let wanted = name.trim().to_lowercase();
    let short = wanted.strip_prefix("fake_").unwrap_or(&wanted);

    CATALOG
        .iter()
        .find(|d| d.name.strip_prefix("fake_") == Some(short))
        .map(|d| d.to_calibration())
        .ok_or_else(|| QcError::BackendNotAvailable(name.to_string()))
}

/// Whether `name` resolves to a catalog device
pub fn is_known(name: &str) -> bool {
    by_name(name).is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_valid() {
        for name in names() {
            let info = by_name(name).unwrap();
            assert_eq!(info.num_qubits(), 5, "{}", name);
            assert!(info.validate().is_ok(), "{}", name);
            assert_eq!(info.basis_gates.len(), 6);
        }
    }

    #[test]
    fn test_athens_is_linear() {
        let topo = athens().to_topology();
        assert!(topo.is_connected(0, 1));
        assert!(topo.is_connected(3, 4));
        assert!(!topo.is_connected(0, 2));
        assert_eq!(topo.find_linear_chain(5).unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_belem_is_t_shaped() {
        let topo = belem().to_topology();
        assert_eq!(topo.degree(1), 3);
        assert!(topo.is_connected(3, 4));
        assert_eq!(topo.max_degree_qubit(), Some(1));
    }

    #[test]
    fn test_by_name_aliases() {
        assert_eq!(by_name("athens").unwrap().backend_name, "fake_athens");
        assert_eq!(by_name("FAKE_Lima").unwrap().backend_name, "fake_lima");
        assert!(matches!(
            by_name("fake_nowhere"),
            Err(QcError::BackendNotAvailable(_))
        ));
        assert!(is_known("manila"));
    }

    #[test]
    fn test_snapshots_are_stale() {
        assert!(!athens().is_fresh(Duration::from_secs(86_400)));
    }
}
