use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::categories::{CategoryRegistry, UnknownCategory};
use super::domain::IntakeRecord;

/// Identity of one applicant conversation; sessions are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

/// Reporting tag for the step a session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    AwaitingCategory,
    AwaitingName,
    AwaitingPartner,
    AwaitingPhone,
    AwaitingHandle,
    Complete,
}

impl IntakeStep {
    pub const fn label(self) -> &'static str {
        match self {
            IntakeStep::AwaitingCategory => "awaiting_category",
            IntakeStep::AwaitingName => "awaiting_name",
            IntakeStep::AwaitingPartner => "awaiting_partner",
            IntakeStep::AwaitingPhone => "awaiting_phone",
            IntakeStep::AwaitingHandle => "awaiting_handle",
            IntakeStep::Complete => "complete",
        }
    }
}

/// The field the front end should ask for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPrompt {
    Category,
    Name,
    Partner,
    Phone,
    Handle,
}

/// Outcome of feeding one answer into a session.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeProgress {
    Prompt(NextPrompt),
    Complete(IntakeRecord),
}

/// Errors that keep the session on its current step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("no intake session in progress for this conversation")]
    NoActiveSession,
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error("a partner name is required for this category")]
    MissingPartner,
}

/// One applicant's intake, one enum variant per prompt. Answers accumulate
/// in the variants, so a session can never be in a shape its step does not
/// account for.
#[derive(Debug, Clone)]
enum IntakeSession {
    AwaitingCategory,
    AwaitingName {
        category: String,
        requires_partner: bool,
    },
    AwaitingPartner {
        category: String,
        player_name: String,
    },
    AwaitingPhone {
        category: String,
        player_name: String,
        partner_name: Option<String>,
    },
    AwaitingHandle {
        category: String,
        player_name: String,
        partner_name: Option<String>,
        phone: String,
    },
    Complete,
}

impl IntakeSession {
    fn step(&self) -> IntakeStep {
        match self {
            IntakeSession::AwaitingCategory => IntakeStep::AwaitingCategory,
            IntakeSession::AwaitingName { .. } => IntakeStep::AwaitingName,
            IntakeSession::AwaitingPartner { .. } => IntakeStep::AwaitingPartner,
            IntakeSession::AwaitingPhone { .. } => IntakeStep::AwaitingPhone,
            IntakeSession::AwaitingHandle { .. } => IntakeStep::AwaitingHandle,
            IntakeSession::Complete => IntakeStep::Complete,
        }
    }

    /// Consume one answer. On error the session stays on its current step.
    fn advance(
        &mut self,
        text: &str,
        registry: &CategoryRegistry,
    ) -> Result<IntakeProgress, IntakeError> {
        let answer = text.trim();
        let current = std::mem::replace(self, IntakeSession::Complete);
        let (next, outcome) = match current {
            IntakeSession::AwaitingCategory => match registry.get(answer) {
                Ok(category) => (
                    IntakeSession::AwaitingName {
                        category: category.name.clone(),
                        requires_partner: category.requires_partner,
                    },
                    Ok(IntakeProgress::Prompt(NextPrompt::Name)),
                ),
                Err(unknown) => (
                    IntakeSession::AwaitingCategory,
                    Err(IntakeError::from(unknown)),
                ),
            },
            IntakeSession::AwaitingName {
                category,
                requires_partner,
            } => {
                let player_name = answer.to_string();
                if requires_partner {
                    (
                        IntakeSession::AwaitingPartner {
                            category,
                            player_name,
                        },
                        Ok(IntakeProgress::Prompt(NextPrompt::Partner)),
                    )
                } else {
                    (
                        IntakeSession::AwaitingPhone {
                            category,
                            player_name,
                            partner_name: None,
                        },
                        Ok(IntakeProgress::Prompt(NextPrompt::Phone)),
                    )
                }
            }
            IntakeSession::AwaitingPartner {
                category,
                player_name,
            } => {
                if answer.is_empty() {
                    (
                        IntakeSession::AwaitingPartner {
                            category,
                            player_name,
                        },
                        Err(IntakeError::MissingPartner),
                    )
                } else {
                    (
                        IntakeSession::AwaitingPhone {
                            category,
                            player_name,
                            partner_name: Some(answer.to_string()),
                        },
                        Ok(IntakeProgress::Prompt(NextPrompt::Phone)),
                    )
                }
            }
            IntakeSession::AwaitingPhone {
                category,
                player_name,
                partner_name,
            } => (
                IntakeSession::AwaitingHandle {
                    category,
                    player_name,
                    partner_name,
                    phone: answer.to_string(),
                },
                Ok(IntakeProgress::Prompt(NextPrompt::Handle)),
            ),
            IntakeSession::AwaitingHandle {
                category,
                player_name,
                partner_name,
                phone,
            } => (
                IntakeSession::Complete,
                Ok(IntakeProgress::Complete(IntakeRecord {
                    category,
                    player_name,
                    partner_name,
                    phone,
                    handle: answer.to_string(),
                })),
            ),
            // The record was already emitted; a retired session never emits
            // a second one, even if a racing message still holds it.
            IntakeSession::Complete => (IntakeSession::Complete, Err(IntakeError::NoActiveSession)),
        };
        *self = next;
        outcome
    }
}

/// Keyed store of in-flight intakes. Each session sits behind its own
/// mutex, so two concurrent messages for the same conversation cannot
/// interleave; the outer map lock is only held for lookups.
pub struct IntakeSessionStore {
    registry: Arc<CategoryRegistry>,
    sessions: Mutex<HashMap<ConversationId, Arc<Mutex<IntakeSession>>>>,
}

impl IntakeSessionStore {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self {
            registry,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Begin (or restart) the intake for a conversation. Any answers
    /// already collected are discarded.
    pub fn start(&self, conversation: &ConversationId) -> NextPrompt {
        let slot = {
            let mut sessions = self.sessions.lock().expect("session map poisoned");
            sessions
                .entry(conversation.clone())
                .or_insert_with(|| Arc::new(Mutex::new(IntakeSession::AwaitingCategory)))
                .clone()
        };
        let mut session = slot.lock().expect("intake session poisoned");
        *session = IntakeSession::AwaitingCategory;
        NextPrompt::Category
    }

    /// Feed one free-text answer to the conversation's session. A completed
    /// session emits its record exactly once and is retired.
    pub fn answer(
        &self,
        conversation: &ConversationId,
        text: &str,
    ) -> Result<IntakeProgress, IntakeError> {
        let slot = {
            let sessions = self.sessions.lock().expect("session map poisoned");
            sessions.get(conversation).cloned()
        };
        let slot = slot.ok_or(IntakeError::NoActiveSession)?;

        let mut session = slot.lock().expect("intake session poisoned");
        let progress = session.advance(text, &self.registry)?;
        drop(session);

        if matches!(progress, IntakeProgress::Complete(_)) {
            let mut sessions = self.sessions.lock().expect("session map poisoned");
            sessions.remove(conversation);
        }
        Ok(progress)
    }

    /// Step the conversation is currently waiting on, if a session exists.
    pub fn step_of(&self, conversation: &ConversationId) -> Option<IntakeStep> {
        let slot = {
            let sessions = self.sessions.lock().expect("session map poisoned");
            sessions.get(conversation).cloned()
        }?;
        let session = slot.lock().expect("intake session poisoned");
        Some(session.step())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().expect("session map poisoned").len()
    }
}
