//! Backend lookup by name

use crate::execution::Backend;
use crate::fake::FakeBackend;
use crate::simulator::{SimulatorBackend, AER_SIMULATOR, STATEVECTOR_SIMULATOR};
use qcirc_calibration::fake_devices;
use qcirc_core::{QcError, QcResult};

/// Every name [`get_backend`] accepts
pub fn available_backends() -> Vec<String> {
    let mut names = vec![AER_SIMULATOR.to_string(), STATEVECTOR_SIMULATOR.to_string()];
    names.extend(fake_devices::names().into_iter().map(String::from));
    names
}

/// Look up a backend by name
pub fn get_backend(name: &str) -> QcResult<Box<dyn Backend>> {
    get_backend_seeded(name, None)
}

/// Look up a backend and fix its sampling seed
pub fn get_backend_seeded(name: &str, seed: Option<u64>) -> QcResult<Box<dyn Backend>> {
    let key = name.trim().to_ascii_lowercase();
    let backend: Box<dyn Backend> = match key.as_str() {
        AER_SIMULATOR => Box::new(SimulatorBackend::aer().with_seed_opt(seed)),
        STATEVECTOR_SIMULATOR => Box::new(SimulatorBackend::statevector().with_seed_opt(seed)),
        other if fake_devices::is_known(other) => {
            Box::new(FakeBackend::from_name(other)?.with_seed_opt(seed))
        }
        _ => {
            return Err(QcError::BackendNotAvailable(format!(
                "{} (available: {})",
                name,
                available_backends().join(", ")
            )))
        }
    };
    log::debug!("resolved backend '{}'", backend.name());
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let aer = get_backend("aer_simulator").unwrap();
        assert_eq!(aer.name(), "aer_simulator");
        assert!(aer.target().is_universal());

        let sv = get_backend("Statevector_Simulator").unwrap();
        assert_eq!(sv.name(), "statevector_simulator");

        let athens = get_backend("fake_athens").unwrap();
        assert_eq!(athens.num_qubits(), 5);
        assert!(athens.calibration().is_some());

        assert!(get_backend("manila").is_ok());
        assert!(matches!(
            get_backend("ibmq_qasm_simulator"),
            Err(QcError::BackendNotAvailable(_))
        ));
    }

    #[test]
    fn test_available_backends() {
        let names = available_backends();
        assert_eq!(names[0], "aer_simulator");
        assert!(names.iter().all(|n| get_backend(n).is_ok()));
    }
}
