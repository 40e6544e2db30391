use std::time::Duration;

use super::domain::{NewRegistration, PaymentStatus, Registration, RegistrationId};

/// Storage abstraction over the durable registration store. Implementations
/// must provide read-your-writes within the process; the service assumes a
/// single controller instance owns the store.
pub trait RegistrationLedger: Send + Sync {
    /// Persist a new registration, assigning the next row id.
    fn append(&self, registration: NewRegistration) -> Result<Registration, LedgerError>;

    /// Number of Main-slot registrations currently recorded for a category.
    fn count_main(&self, category: &str) -> Result<u32, LedgerError>;

    fn fetch(&self, id: RegistrationId) -> Result<Option<Registration>, LedgerError>;

    /// All registrations for a messaging handle, in creation order.
    fn find_by_handle(&self, handle: &str) -> Result<Vec<Registration>, LedgerError>;

    /// All registrations in a category, in creation order.
    fn in_category(&self, category: &str) -> Result<Vec<Registration>, LedgerError>;

    /// Compare-and-swap on the payment column: applies `next` (and the
    /// receipt reference, when given) only while the stored status still
    /// equals `expected`; otherwise fails with `ConcurrentModification`.
    /// A `None` receipt leaves any stored reference untouched.
    fn update_payment(
        &self,
        id: RegistrationId,
        expected: PaymentStatus,
        next: PaymentStatus,
        receipt_ref: Option<&str>,
    ) -> Result<Registration, LedgerError>;

    /// Earliest-created Unpaid registration for a handle, if any. Creation
    /// order is row-id order, so "first" is deterministic.
    fn earliest_unpaid_for_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Registration>, LedgerError> {
        let mut matches = self.find_by_handle(handle)?;
        matches.retain(|registration| registration.payment == PaymentStatus::Unpaid);
        matches.sort_by_key(|registration| registration.id);
        Ok(matches.into_iter().next())
    }
}

/// Error enumeration for ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("registration not found")]
    NotFound,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("registration changed concurrently")]
    ConcurrentModification,
}

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

/// Retries transient `Unavailable` failures with exponential backoff, up to
/// three attempts. Every other outcome passes straight through, so a call
/// either committed or never reached the store.
pub(crate) fn with_retry<T>(
    call_site: &str,
    mut call: impl FnMut() -> Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    let mut attempt = 1;
    loop {
        match call() {
            Err(LedgerError::Unavailable(reason)) if attempt < RETRY_ATTEMPTS => {
                tracing::warn!(
                    call = call_site,
                    attempt,
                    error = %reason,
                    "transient ledger failure, retrying"
                );
                std::thread::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1));
                attempt += 1;
            }
            other => return other,
        }
    }
}
