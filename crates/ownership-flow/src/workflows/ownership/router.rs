use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Intent, PersonId, VerificationMethod};
use super::orchestrator::{FlowError, PersonDraft};
use super::params::FlowParameterPatch;
use super::prefill::PrefillSource;
use super::repository::{RepositoryError, SessionId, SessionRepository};
use super::service::{CreateSession, SessionServiceError, VerificationSessionService};

type Service<R, P> = Arc<VerificationSessionService<R, P>>;

/// Router builder exposing session endpoints for the verification workflow.
pub fn ownership_router<R, P>(service: Service<R, P>) -> Router
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    Router::new()
        .route("/api/v1/ownership/sessions", post(create_handler::<R, P>))
        .route(
            "/api/v1/ownership/sessions/:session_id",
            get(session_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/intents",
            post(intent_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/people",
            post(add_person_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/people/:person_id",
            delete(remove_person_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/people/:person_id/restore",
            post(restore_person_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/flow-parameters",
            patch(flow_parameters_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/verification-method",
            put(verification_method_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/requirements/:requirement/complete",
            post(requirement_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/business-review/complete",
            post(manual_review_handler::<R, P>),
        )
        .route(
            "/api/v1/ownership/sessions/:session_id/reset",
            post(reset_handler::<R, P>),
        )
        .with_state(service)
}

/// Intent body; `screen` optionally pins the screen the intent was issued from.
#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    #[serde(default)]
    pub screen: Option<String>,
    #[serde(flatten)]
    pub intent: Intent,
}

#[derive(Debug, Deserialize)]
pub struct VerificationMethodRequest {
    pub method: VerificationMethod,
}

pub(crate) async fn create_handler<R, P>(
    State(service): State<Service<R, P>>,
    axum::Json(request): axum::Json<CreateSession>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.create(request) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.response())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn session_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.response())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn intent_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<IntentRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    let id = SessionId(session_id);
    match service
        .apply_intent(&id, request.screen.as_deref(), request.intent)
        .await
    {
        Ok((outcome, record)) => {
            let payload = json!({
                "navigation": outcome,
                "session": record.response(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_person_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path(session_id): Path<String>,
    axum::Json(draft): axum::Json<PersonDraft>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.add_person(&SessionId(session_id), draft) {
        Ok((person, record)) => {
            let payload = json!({
                "person": person,
                "session": record.response(),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn remove_person_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path((session_id, person_id)): Path<(String, String)>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.remove_person(&SessionId(session_id), &PersonId(person_id)) {
        Ok((removal, record)) => {
            let payload = json!({
                "removal": removal,
                "session": record.response(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn restore_person_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path((session_id, person_id)): Path<(String, String)>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.restore_person(&SessionId(session_id), &PersonId(person_id)) {
        Ok((person, record)) => {
            let payload = json!({
                "person": person,
                "session": record.response(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn flow_parameters_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path(session_id): Path<String>,
    axum::Json(patch): axum::Json<FlowParameterPatch>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.set_flow_parameters(&SessionId(session_id), &patch) {
        Ok((_, record)) => (StatusCode::OK, axum::Json(record.response())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn verification_method_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<VerificationMethodRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.set_verification_method(&SessionId(session_id), request.method) {
        Ok(record) => (StatusCode::OK, axum::Json(record.response())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn requirement_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path((session_id, requirement)): Path<(String, String)>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    let id = SessionId(session_id);
    let result = match requirement.as_str() {
        "business" => service.mark_business_requirement_complete(&id),
        "ownership" => service.mark_ownership_requirement_complete(&id),
        other => {
            let payload = json!({
                "error": format!("unknown requirement '{other}'"),
            });
            return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
        }
    };

    match result {
        Ok((state, record)) => {
            let payload = json!({
                "requirement": requirement,
                "state": state,
                "session": record.response(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn manual_review_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.complete_manual_review(&SessionId(session_id)) {
        Ok((state, record)) => {
            let payload = json!({
                "state": state,
                "session": record.response(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reset_handler<R, P>(
    State(service): State<Service<R, P>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    P: PrefillSource + 'static,
{
    match service.reset(&SessionId(session_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.response())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn status_for(err: &SessionServiceError) -> StatusCode {
    match err {
        SessionServiceError::Flow(flow) if flow.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        SessionServiceError::Flow(flow) if flow.is_not_found() => StatusCode::NOT_FOUND,
        SessionServiceError::Flow(
            FlowError::SubmissionPending(_)
            | FlowError::NoPendingSubmission
            | FlowError::NoManualReviewPending
            | FlowError::StaleScreen { .. },
        ) => StatusCode::CONFLICT,
        SessionServiceError::Flow(_) => StatusCode::BAD_REQUEST,
        SessionServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SessionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        SessionServiceError::Repository(RepositoryError::Unavailable(_))
        | SessionServiceError::Prefill(_)
        | SessionServiceError::SubmissionTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: SessionServiceError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (status_for(&err), axum::Json(payload)).into_response()
}
