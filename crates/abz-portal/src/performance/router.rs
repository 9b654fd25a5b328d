use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

use super::domain::{EvaluationFilter, EvaluationId};
use super::repository::{EvaluationRepository, NotificationPublisher, RepositoryError};
use super::service::{
    EvaluationChanges, EvaluationDraft, EvaluationService, EvaluationServiceError,
};

/// Router exposing the performance-evaluation endpoints.
pub fn evaluation_router<R, N>(service: Arc<EvaluationService<R, N>>) -> Router
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/performance/evaluations",
            get(list_handler::<R, N>).post(create_handler::<R, N>),
        )
        .route(
            "/api/v1/performance/evaluations/:evaluation_id",
            get(get_handler::<R, N>)
                .put(update_handler::<R, N>)
                .delete(delete_handler::<R, N>),
        )
        .route(
            "/api/v1/performance/criteria",
            get(criteria_handler::<R, N>),
        )
        .with_state(service)
}

/// Bearer token from the Authorization header, if present.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

fn error_response(error: EvaluationServiceError) -> Response {
    let status = match &error {
        EvaluationServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
        EvaluationServiceError::Forbidden => StatusCode::FORBIDDEN,
        EvaluationServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        EvaluationServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EvaluationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EvaluationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EvaluationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn get_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Path(evaluation_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let requester = service.authenticate(bearer_token(&headers));
    let id = EvaluationId(evaluation_id);
    match service.get(requester.as_ref(), &id) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Query(filter): Query<EvaluationFilter>,
    headers: HeaderMap,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let requester = service.authenticate(bearer_token(&headers));
    match service.list(requester.as_ref(), &filter) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<EvaluationDraft>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let requester = service.authenticate(bearer_token(&headers));
    match service.create(requester.as_ref(), draft) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Path(evaluation_id): Path<String>,
    headers: HeaderMap,
    axum::Json(changes): axum::Json<EvaluationChanges>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let requester = service.authenticate(bearer_token(&headers));
    let id = EvaluationId(evaluation_id);
    match service.update(requester.as_ref(), &id, changes) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
    Path(evaluation_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let requester = service.authenticate(bearer_token(&headers));
    let id = EvaluationId(evaluation_id);
    match service.delete(requester.as_ref(), &id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn criteria_handler<R, N>(
    State(service): State<Arc<EvaluationService<R, N>>>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: NotificationPublisher + 'static,
{
    (StatusCode::OK, axum::Json(service.criteria_by_category())).into_response()
}
