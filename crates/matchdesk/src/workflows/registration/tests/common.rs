use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::PaymentDetails;
use crate::workflows::registration::admission::AdmissionService;
use crate::workflows::registration::categories::{Category, CategoryRegistry};
use crate::workflows::registration::domain::{
    IntakeRecord, NewRegistration, PaymentStatus, Registration, RegistrationId,
};
use crate::workflows::registration::gateway::ConversationGateway;
use crate::workflows::registration::ledger::{LedgerError, RegistrationLedger};
use crate::workflows::registration::messages::MessageCatalog;

pub(super) fn registry() -> Arc<CategoryRegistry> {
    Arc::new(CategoryRegistry::standard())
}

/// Small table so capacity edges are cheap to hit in tests.
pub(super) fn tiny_registry() -> Arc<CategoryRegistry> {
    Arc::new(CategoryRegistry::new(vec![
        Category {
            name: "Ladies Amateur".to_string(),
            capacity: 2,
            requires_partner: false,
        },
        Category {
            name: "Mixed Amateur".to_string(),
            capacity: 2,
            requires_partner: true,
        },
    ]))
}

pub(super) fn payment_details() -> PaymentDetails {
    PaymentDetails {
        amount: "1000 RUB".to_string(),
        account: "1234 5678 9012 3456".to_string(),
        recipient: "Tournament Organizers".to_string(),
    }
}

pub(super) fn intake(category: &str, player: &str, handle: &str) -> IntakeRecord {
    IntakeRecord {
        category: category.to_string(),
        player_name: player.to_string(),
        partner_name: None,
        phone: "+7 900 000-00-00".to_string(),
        handle: handle.to_string(),
    }
}

pub(super) fn pair_intake(category: &str, player: &str, partner: &str, handle: &str) -> IntakeRecord {
    IntakeRecord {
        partner_name: Some(partner.to_string()),
        ..intake(category, player, handle)
    }
}

pub(super) fn build_service(
    registry: Arc<CategoryRegistry>,
) -> (AdmissionService<MemoryLedger>, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::default());
    (AdmissionService::new(registry, ledger.clone()), ledger)
}

pub(super) fn build_gateway(
    registry: Arc<CategoryRegistry>,
) -> (Arc<ConversationGateway<MemoryLedger>>, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::default());
    let gateway = ConversationGateway::new(
        registry,
        ledger.clone(),
        MessageCatalog::new(payment_details()),
    );
    (Arc::new(gateway), ledger)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
pub(super) struct MemoryLedger {
    rows: Mutex<Vec<Registration>>,
}

impl MemoryLedger {
    pub(super) fn rows(&self) -> Vec<Registration> {
        self.rows.lock().expect("ledger mutex poisoned").clone()
    }
}

impl RegistrationLedger for MemoryLedger {
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
            .filter(|row| {
                row.category == category
                    && row.slot == crate::workflows::registration::domain::SlotKind::Main
            })
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

/// Ledger that never comes back; exercises retry exhaustion.
pub(super) struct UnavailableLedger;

impl RegistrationLedger for UnavailableLedger {
    fn append(&self, _registration: NewRegistration) -> Result<Registration, LedgerError> {
        Err(LedgerError::Unavailable("store offline".to_string()))
    }

    fn count_main(&self, _category: &str) -> Result<u32, LedgerError> {
        Err(LedgerError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: RegistrationId) -> Result<Option<Registration>, LedgerError> {
        Err(LedgerError::Unavailable("store offline".to_string()))
    }

    fn find_by_handle(&self, _handle: &str) -> Result<Vec<Registration>, LedgerError> {
        Err(LedgerError::Unavailable("store offline".to_string()))
    }

    fn in_category(&self, _category: &str) -> Result<Vec<Registration>, LedgerError> {
        Err(LedgerError::Unavailable("store offline".to_string()))
    }

    fn update_payment(
        &self,
        _id: RegistrationId,
        _expected: PaymentStatus,
        _next: PaymentStatus,
        _receipt_ref: Option<&str>,
    ) -> Result<Registration, LedgerError> {
        Err(LedgerError::Unavailable("store offline".to_string()))
    }
}

/// Ledger that fails a fixed number of calls before recovering; exercises
/// the bounded retry path.
pub(super) struct FlakyLedger {
    failures_left: Mutex<u32>,
    inner: MemoryLedger,
}

impl FlakyLedger {
    pub(super) fn failing(times: u32) -> Self {
        Self {
            failures_left: Mutex::new(times),
            inner: MemoryLedger::default(),
        }
    }

    fn trip(&self) -> Result<(), LedgerError> {
        let mut left = self.failures_left.lock().expect("failure counter poisoned");
        if *left > 0 {
            *left -= 1;
            return Err(LedgerError::Unavailable("store hiccup".to_string()));
        }
        Ok(())
    }
}

impl RegistrationLedger for FlakyLedger {
    fn append(&self, registration: NewRegistration) -> Result<Registration, LedgerError> {
        self.trip()?;
        self.inner.append(registration)
    }

    fn count_main(&self, category: &str) -> Result<u32, LedgerError> {
        self.trip()?;
        self.inner.count_main(category)
    }

    fn fetch(&self, id: RegistrationId) -> Result<Option<Registration>, LedgerError> {
        self.trip()?;
        self.inner.fetch(id)
    }

    fn find_by_handle(&self, handle: &str) -> Result<Vec<Registration>, LedgerError> {
        self.trip()?;
        self.inner.find_by_handle(handle)
    }

    fn in_category(&self, category: &str) -> Result<Vec<Registration>, LedgerError> {
        self.trip()?;
        self.inner.in_category(category)
    }

    fn update_payment(
        &self,
        id: RegistrationId,
        expected: PaymentStatus,
        next: PaymentStatus,
        receipt_ref: Option<&str>,
    ) -> Result<Registration, LedgerError> {
        self.trip()?;
        self.inner.update_payment(id, expected, next, receipt_ref)
    }
}
