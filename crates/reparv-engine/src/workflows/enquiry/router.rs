use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{BrokerTier, EnquiryId, PartnerId, SalesPersonId};
use super::intake::NewEnquiry;
use super::repository::{
    EnquiryRepository, NotificationPublisher, PartnerDirectory, PropertyCatalog, RepositoryError,
};
use super::service::{
    BookingRequest, CancelRequest, EnquiryService, EnquiryServiceError, FollowUpRequest,
    VisitRequest,
};

/// Router builder exposing HTTP endpoints for the enquiry lifecycle.
pub fn enquiry_router<R, P, D, N>(service: Arc<EnquiryService<R, P, D, N>>) -> Router
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/enquiries", post(create_handler::<R, P, D, N>))
        .route("/api/v1/enquiries", get(open_handler::<R, P, D, N>))
        .route(
            "/api/v1/enquiries/:enquiry_id",
            get(status_handler::<R, P, D, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/timeline",
            get(timeline_handler::<R, P, D, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/assign",
            post(assign_handler::<R, P, D, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/visit",
            post(visit_handler::<R, P, D, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/follow-up",
            post(follow_up_handler::<R, P, D, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/cancel",
            post(cancel_handler::<R, P, D, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/token",
            post(book_handler::<R, P, D, N>),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/broker",
            post(broker_handler::<R, P, D, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignBody {
    pub(crate) sales_person_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BrokerBody {
    pub(crate) tier: BrokerTier,
    pub(crate) partner_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenQuery {
    #[serde(default = "default_open_limit")]
    pub(crate) limit: usize,
}

fn default_open_limit() -> usize {
    50
}

pub(crate) async fn create_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    axum::Json(payload): axum::Json<NewEnquiry>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create(payload) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn open_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Query(query): Query<OpenQuery>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.open(query.limit) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&EnquiryId(enquiry_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn timeline_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Path(enquiry_id): Path<String>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.timeline(&EnquiryId(enquiry_id)) {
        Ok(events) => (StatusCode::OK, axum::Json(events)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assign_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Path(enquiry_id): Path<String>,
    axum::Json(body): axum::Json<AssignBody>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.assign(&EnquiryId(enquiry_id), SalesPersonId(body.sales_person_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn visit_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Path(enquiry_id): Path<String>,
    axum::Json(request): axum::Json<VisitRequest>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.schedule_visit(&EnquiryId(enquiry_id), request) {
        Ok(event) => (StatusCode::CREATED, axum::Json(event)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn follow_up_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Path(enquiry_id): Path<String>,
    axum::Json(request): axum::Json<FollowUpRequest>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.add_follow_up(&EnquiryId(enquiry_id), request) {
        Ok(event) => (StatusCode::CREATED, axum::Json(event)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Path(enquiry_id): Path<String>,
    axum::Json(request): axum::Json<CancelRequest>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.cancel(&EnquiryId(enquiry_id), request) {
        Ok(event) => (StatusCode::CREATED, axum::Json(event)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn book_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Path(enquiry_id): Path<String>,
    axum::Json(request): axum::Json<BookingRequest>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.book(&EnquiryId(enquiry_id), request) {
        Ok(event) => (StatusCode::CREATED, axum::Json(event)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn broker_handler<R, P, D, N>(
    State(service): State<Arc<EnquiryService<R, P, D, N>>>,
    Path(enquiry_id): Path<String>,
    axum::Json(body): axum::Json<BrokerBody>,
) -> Response
where
    R: EnquiryRepository + 'static,
    P: PropertyCatalog + 'static,
    D: PartnerDirectory + 'static,
    N: NotificationPublisher + 'static,
{
    match service.assign_broker(&EnquiryId(enquiry_id), body.tier, PartnerId(body.partner_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

/// Maps the service error taxonomy onto HTTP statuses: input problems are
/// 422, state conflicts 409, unknown ids 404, infrastructure 500.
pub(crate) fn error_response(error: EnquiryServiceError) -> Response {
    let status = match &error {
        EnquiryServiceError::Validation(_) | EnquiryServiceError::Commission(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EnquiryServiceError::Lifecycle(_) | EnquiryServiceError::ConflictingBrokerAssignment => {
            StatusCode::CONFLICT
        }
        EnquiryServiceError::PropertyNotFound(_) => StatusCode::NOT_FOUND,
        EnquiryServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EnquiryServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EnquiryServiceError::Repository(_)
        | EnquiryServiceError::Catalog(_)
        | EnquiryServiceError::Directory(_)
        | EnquiryServiceError::Code(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = axum::Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}
