use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::admission::AdmissionError;
use super::domain::RegistrationId;
use super::gateway::{ConversationGateway, InboundMessage};
use super::intake::ConversationId;
use super::ledger::{LedgerError, RegistrationLedger};

/// Router builder exposing HTTP endpoints for the conversational intake
/// and the operator actions.
pub fn registration_router<L>(gateway: Arc<ConversationGateway<L>>) -> Router
where
    L: RegistrationLedger + 'static,
{
    Router::new()
        .route(
            "/api/v1/conversations/:conversation_id/messages",
            post(conversation_handler::<L>),
        )
        .route("/api/v1/categories", get(categories_handler::<L>))
        .route("/api/v1/categories/:name/roster", get(roster_handler::<L>))
        .route(
            "/api/v1/registrations/:registration_id",
            get(registration_handler::<L>),
        )
        .route(
            "/api/v1/registrations/:registration_id/payment-confirmation",
            post(payment_confirmation_handler::<L>),
        )
        .with_state(gateway)
}

pub(crate) async fn conversation_handler<L>(
    State(gateway): State<Arc<ConversationGateway<L>>>,
    Path(conversation_id): Path<String>,
    axum::Json(message): axum::Json<InboundMessage>,
) -> Response
where
    L: RegistrationLedger + 'static,
{
    let reply = gateway.handle(&ConversationId(conversation_id), message);
    (StatusCode::OK, axum::Json(reply)).into_response()
}

pub(crate) async fn categories_handler<L>(
    State(gateway): State<Arc<ConversationGateway<L>>>,
) -> Response
where
    L: RegistrationLedger + 'static,
{
    let categories = gateway.registry().categories().to_vec();
    (StatusCode::OK, axum::Json(categories)).into_response()
}

pub(crate) async fn roster_handler<L>(
    State(gateway): State<Arc<ConversationGateway<L>>>,
    Path(name): Path<String>,
) -> Response
where
    L: RegistrationLedger + 'static,
{
    match gateway.admissions().roster(&name) {
        Ok(registrations) => {
            let views: Vec<_> = registrations
                .iter()
                .map(|registration| registration.view())
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn registration_handler<L>(
    State(gateway): State<Arc<ConversationGateway<L>>>,
    Path(registration_id): Path<u64>,
) -> Response
where
    L: RegistrationLedger + 'static,
{
    match gateway.admissions().get(RegistrationId(registration_id)) {
        Ok(registration) => (StatusCode::OK, axum::Json(registration.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn payment_confirmation_handler<L>(
    State(gateway): State<Arc<ConversationGateway<L>>>,
    Path(registration_id): Path<u64>,
) -> Response
where
    L: RegistrationLedger + 'static,
{
    match gateway
        .admissions()
        .confirm_payment(RegistrationId(registration_id))
    {
        Ok(registration) => (StatusCode::OK, axum::Json(registration.view())).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AdmissionError) -> Response {
    let status = match &err {
        AdmissionError::UnknownCategory(_) | AdmissionError::MissingPartner { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AdmissionError::ReceiptNotFound { .. } | AdmissionError::RegistrationNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        AdmissionError::InvalidTransition { .. } => StatusCode::CONFLICT,
        AdmissionError::Ledger(LedgerError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        AdmissionError::Ledger(LedgerError::ConcurrentModification) => StatusCode::CONFLICT,
        AdmissionError::Ledger(LedgerError::NotFound) => StatusCode::NOT_FOUND,
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
