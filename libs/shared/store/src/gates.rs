use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::StoreError;

/// Per-doctor write gates. A booking transaction holds the doctor's
/// gate across its conflict re-check and insert, so for any single
/// doctor those two steps are serialized. Doctors never contend with
/// each other.
pub struct DoctorGates {
    gates: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    acquire_timeout: Duration,
}

impl DoctorGates {
    pub fn new(acquire_timeout: Duration) -> Self {
        Self {
            gates: Mutex::new(HashMap::new()),
            acquire_timeout,
        }
    }

    /// Acquire the gate for one doctor, waiting at most the configured
    /// timeout. A timeout is a transient condition: the caller may
    /// retry the whole transaction.
    pub async fn acquire(&self, doctor_id: Uuid) -> Result<OwnedMutexGuard<()>, StoreError> {
        let gate = {
            let mut gates = self.gates.lock().await;
            Arc::clone(gates.entry(doctor_id).or_default())
        };

        debug!("Acquiring write gate for doctor {}", doctor_id);
        tokio::time::timeout(self.acquire_timeout, gate.lock_owned())
            .await
            .map_err(|_| {
                StoreError::LockTimeout(format!(
                    "doctor {} gate not acquired within {:?}",
                    doctor_id, self.acquire_timeout
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn gate_is_exclusive_per_doctor() {
        let gates = DoctorGates::new(Duration::from_millis(50));
        let doctor = Uuid::new_v4();

        let held = gates.acquire(doctor).await.unwrap();
        let second = gates.acquire(doctor).await;
        assert_matches!(second, Err(StoreError::LockTimeout(_)));

        drop(held);
        assert!(gates.acquire(doctor).await.is_ok());
    }

    #[tokio::test]
    async fn different_doctors_do_not_contend() {
        let gates = DoctorGates::new(Duration::from_millis(50));
        let _held = gates.acquire(Uuid::new_v4()).await.unwrap();
        assert!(gates.acquire(Uuid::new_v4()).await.is_ok());
    }
}
