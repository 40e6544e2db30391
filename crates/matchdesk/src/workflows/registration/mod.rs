//! Tournament registration: conversational intake, capacity-aware
//! admission, and payment confirmation over a durable registration ledger.

pub mod admission;
pub mod categories;
pub mod domain;
pub mod gateway;
pub mod intake;
pub mod ledger;
pub mod messages;
pub mod router;
pub mod sheet;

#[cfg(test)]
mod tests;

pub use admission::{AdmissionError, AdmissionService};
pub use categories::{Category, CategoryRegistry, UnknownCategory};
pub use domain::{
    IntakeRecord, NewRegistration, PaymentStatus, Registration, RegistrationId, RegistrationView,
    SlotKind,
};
pub use gateway::{ConversationGateway, InboundMessage, OutboundReply};
pub use intake::{
    ConversationId, IntakeError, IntakeProgress, IntakeSessionStore, IntakeStep, NextPrompt,
};
pub use ledger::{LedgerError, RegistrationLedger};
pub use messages::MessageCatalog;
pub use router::registration_router;
pub use sheet::CsvLedger;
