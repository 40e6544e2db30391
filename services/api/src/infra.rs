use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use matchdesk::workflows::registration::{
    LedgerError, NewRegistration, PaymentStatus, Registration, RegistrationId, RegistrationLedger,
    SlotKind,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local ledger for development runs; production points
/// APP_LEDGER_CSV at a durable file instead.
#[derive(Default)]
pub(crate) struct InMemoryLedger {
    rows: Mutex<Vec<Registration>>,
}

impl RegistrationLedger for InMemoryLedger {
    fn append(&self, registration: NewRegistration) -> Result<Registration, LedgerError> {
        let mut rows = self.rows.lock().expect("ledger mutex poisoned");
        let registration = registration.into_registration(RegistrationId(rows.len() as u64 + 1));
        rows.push(registration.clone());
        Ok(registration)
    }

    fn count_main(&self, category: &str) -> Result<u32, LedgerError> {
        let rows = self.rows.lock().expect("ledger mutex poisoned");
        Ok(rows
            .iter()
            .filter(|row| row.category == category && row.slot == SlotKind::Main)
            .count() as u32)
    }

    fn fetch(&self, id: RegistrationId) -> Result<Option<Registration>, LedgerError> {
        let rows = self.rows.lock().expect("ledger mutex poisoned");
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    fn find_by_handle(&self, handle: &str) -> Result<Vec<Registration>, LedgerError> {
        let rows = self.rows.lock().expect("ledger mutex poisoned");
        Ok(rows
            .iter()
            .filter(|row| row.handle == handle)
            .cloned()
            .collect())
    }

    fn in_category(&self, category: &str) -> Result<Vec<Registration>, LedgerError> {
        let rows = self.rows.lock().expect("ledger mutex poisoned");
        Ok(rows
            .iter()
            .filter(|row| row.category == category)
            .cloned()
            .collect())
    }

    fn update_payment(
        &self,
        id: RegistrationId,
        expected: PaymentStatus,
        next: PaymentStatus,
        receipt_ref: Option<&str>,
    ) -> Result<Registration, LedgerError> {
        let mut rows = self.rows.lock().expect("ledger mutex poisoned");
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(LedgerError::NotFound)?;
        if row.payment != expected {
            return Err(LedgerError::ConcurrentModification);
        }
        row.payment = next;
        if let Some(receipt) = receipt_ref {
            row.receipt_ref = Some(receipt.to_string());
        }
        Ok(row.clone())
    }
}
