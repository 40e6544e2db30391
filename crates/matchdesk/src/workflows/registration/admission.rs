use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::categories::{CategoryRegistry, UnknownCategory};
use super::domain::{
    IntakeRecord, NewRegistration, PaymentStatus, Registration, RegistrationId, SlotKind,
};
use super::ledger::{with_retry, LedgerError, RegistrationLedger};

/// Decides bracket placement and tracks payment progression. The capacity
/// check and the append form one critical section per category, so no two
/// submissions can observe the same pre-increment count.
pub struct AdmissionService<L> {
    registry: Arc<CategoryRegistry>,
    ledger: Arc<L>,
    category_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<L> AdmissionService<L>
where
    L: RegistrationLedger + 'static,
{
    pub fn new(registry: Arc<CategoryRegistry>, ledger: Arc<L>) -> Self {
        Self {
            registry,
            ledger,
            category_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    fn category_lock(&self, category: &str) -> Arc<Mutex<()>> {
        let mut locks = self.category_locks.lock().expect("category lock map poisoned");
        locks.entry(category.to_string()).or_default().clone()
    }

    /// Place a completed intake in the main bracket or on the waitlist.
    pub fn submit(&self, intake: IntakeRecord) -> Result<Registration, AdmissionError> {
        let category = self.registry.get(&intake.category)?.clone();

        let partner = intake
            .partner_name
            .as_deref()
            .map(str::trim)
            .filter(|partner| !partner.is_empty());
        if category.requires_partner && partner.is_none() {
            return Err(AdmissionError::MissingPartner {
                category: category.name,
            });
        }
        let partner = if category.requires_partner {
            partner.map(str::to_string)
        } else {
            None
        };

        let lock = self.category_lock(&category.name);
        let _admission = lock.lock().expect("category lock poisoned");

        let taken = with_retry("count_main", || self.ledger.count_main(&category.name))?;
        let slot = if taken < category.capacity {
            SlotKind::Main
        } else {
            SlotKind::Waitlist
        };

        let registration = with_retry("append", || {
            self.ledger.append(NewRegistration {
                submitted_at: Utc::now(),
                category: category.name.clone(),
                player_name: intake.player_name.clone(),
                partner_name: partner.clone(),
                phone: intake.phone.clone(),
                handle: intake.handle.clone(),
                slot,
            })
        })?;

        tracing::info!(
            id = %registration.id,
            category = %registration.category,
            slot = registration.slot.label(),
            "registration admitted"
        );
        Ok(registration)
    }

    /// Attach a payment receipt to the earliest-created Unpaid registration
    /// for the handle, moving it to PendingReview.
    pub fn confirm_receipt(
        &self,
        handle: &str,
        receipt_ref: &str,
    ) -> Result<Registration, AdmissionError> {
        loop {
            let candidate = with_retry("earliest_unpaid_for_handle", || {
                self.ledger.earliest_unpaid_for_handle(handle)
            })?;
            let Some(candidate) = candidate else {
                return Err(AdmissionError::ReceiptNotFound {
                    handle: handle.to_string(),
                });
            };

            match with_retry("update_payment", || {
                self.ledger.update_payment(
                    candidate.id,
                    PaymentStatus::Unpaid,
                    PaymentStatus::PendingReview,
                    Some(receipt_ref),
                )
            }) {
                Ok(updated) => {
                    tracing::info!(
                        id = %updated.id,
                        handle,
                        "receipt attached, awaiting operator review"
                    );
                    return Ok(updated);
                }
                // Another receipt claimed this row between the scan and the
                // swap; rescan, the Unpaid set only shrinks.
                Err(LedgerError::ConcurrentModification) => continue,
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Operator acknowledgment of a reviewed transfer: PendingReview ->
    /// Confirmed. Any other starting state is an invalid transition.
    pub fn confirm_payment(&self, id: RegistrationId) -> Result<Registration, AdmissionError> {
        let current = with_retry("fetch", || self.ledger.fetch(id))?
            .ok_or(AdmissionError::RegistrationNotFound(id))?;
        if current.payment != PaymentStatus::PendingReview {
            return Err(AdmissionError::InvalidTransition {
                from: current.payment,
                to: PaymentStatus::Confirmed,
            });
        }

        let updated = with_retry("update_payment", || {
            self.ledger.update_payment(
                id,
                PaymentStatus::PendingReview,
                PaymentStatus::Confirmed,
                None,
            )
        })?;

        tracing::info!(id = %updated.id, "payment confirmed");
        Ok(updated)
    }

    pub fn get(&self, id: RegistrationId) -> Result<Registration, AdmissionError> {
        with_retry("fetch", || self.ledger.fetch(id))?
            .ok_or(AdmissionError::RegistrationNotFound(id))
    }

    /// Registrations for a category in creation order, for roster views.
    pub fn roster(&self, category: &str) -> Result<Vec<Registration>, AdmissionError> {
        let category = self.registry.get(category)?;
        Ok(with_retry("in_category", || {
            self.ledger.in_category(&category.name)
        })?)
    }
}

/// Error raised by the admission controller.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error("category '{category}' requires a partner name")]
    MissingPartner { category: String },
    #[error("no unpaid registration found for handle '{handle}'")]
    ReceiptNotFound { handle: String },
    #[error("registration {0} not found")]
    RegistrationNotFound(RegistrationId),
    #[error("cannot move payment from {from} to {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
