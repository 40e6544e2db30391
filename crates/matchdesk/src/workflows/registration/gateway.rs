use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::admission::{AdmissionError, AdmissionService};
use super::categories::CategoryRegistry;
use super::domain::{RegistrationView, SlotKind};
use super::intake::{ConversationId, IntakeError, IntakeProgress, IntakeSessionStore};
use super::ledger::{LedgerError, RegistrationLedger};
use super::messages::MessageCatalog;

/// One inbound message from the conversational front end.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Start,
    FreeText { text: String },
    Receipt {
        receipt_ref: String,
        sender_handle: String,
    },
}

/// Reply text for the applicant, plus the registration when one was
/// created or touched by the message.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundReply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<RegistrationView>,
}

impl OutboundReply {
    fn text(reply: String) -> Self {
        Self {
            reply,
            registration: None,
        }
    }
}

/// Transport-agnostic seam between the messaging front end and the core:
/// drives intake sessions, hands completed intakes to admission, and routes
/// receipts to confirmation.
pub struct ConversationGateway<L> {
    registry: Arc<CategoryRegistry>,
    sessions: IntakeSessionStore,
    admissions: AdmissionService<L>,
    messages: MessageCatalog,
}

impl<L> ConversationGateway<L>
where
    L: RegistrationLedger + 'static,
{
    pub fn new(
        registry: Arc<CategoryRegistry>,
        ledger: Arc<L>,
        messages: MessageCatalog,
    ) -> Self {
        Self {
            sessions: IntakeSessionStore::new(registry.clone()),
            admissions: AdmissionService::new(registry.clone(), ledger),
            messages,
            registry,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn admissions(&self) -> &AdmissionService<L> {
        &self.admissions
    }

    pub fn sessions(&self) -> &IntakeSessionStore {
        &self.sessions
    }

    pub fn handle(&self, conversation: &ConversationId, message: InboundMessage) -> OutboundReply {
        match message {
            InboundMessage::Start => {
                self.sessions.start(conversation);
                OutboundReply::text(self.messages.welcome(&self.registry))
            }
            InboundMessage::FreeText { text } => self.handle_answer(conversation, &text),
            InboundMessage::Receipt {
                receipt_ref,
                sender_handle,
            } => self.handle_receipt(&sender_handle, &receipt_ref),
        }
    }

    fn handle_answer(&self, conversation: &ConversationId, text: &str) -> OutboundReply {
        match self.sessions.answer(conversation, text) {
            Ok(IntakeProgress::Prompt(prompt)) => {
                OutboundReply::text(self.messages.prompt(prompt, &self.registry))
            }
            Ok(IntakeProgress::Complete(intake)) => match self.admissions.submit(intake) {
                Ok(registration) => {
                    let reply = match registration.slot {
                        SlotKind::Main => self.messages.main_slot_instructions(),
                        SlotKind::Waitlist => self.messages.waitlist_notice(),
                    };
                    OutboundReply {
                        reply,
                        registration: Some(registration.view()),
                    }
                }
                // The session already validated category and partner, so
                // a failure here is infrastructure, not the applicant.
                Err(AdmissionError::Ledger(LedgerError::Unavailable(reason))) => {
                    tracing::error!(error = %reason, "ledger unavailable during submit");
                    OutboundReply::text(self.messages.try_again_later())
                }
                Err(err) => {
                    tracing::error!(error = %err, "admission rejected a completed intake");
                    OutboundReply::text(self.messages.try_again_later())
                }
            },
            Err(IntakeError::UnknownCategory(unknown)) => {
                OutboundReply::text(self.messages.unknown_category(&unknown.0, &self.registry))
            }
            Err(IntakeError::MissingPartner) => {
                OutboundReply::text(self.messages.missing_partner())
            }
            Err(IntakeError::NoActiveSession) => OutboundReply::text(self.messages.start_over()),
        }
    }

    fn handle_receipt(&self, handle: &str, receipt_ref: &str) -> OutboundReply {
        match self.admissions.confirm_receipt(handle, receipt_ref) {
            Ok(registration) => OutboundReply {
                reply: self.messages.receipt_received(),
                registration: Some(registration.view()),
            },
            Err(AdmissionError::ReceiptNotFound { .. }) => {
                OutboundReply::text(self.messages.receipt_not_found())
            }
            Err(err) => {
                tracing::error!(error = %err, handle, "receipt confirmation failed");
                OutboundReply::text(self.messages.try_again_later())
            }
        }
    }
}
