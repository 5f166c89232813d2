use crate::{
    auth::{roles::consts, AuthRouterExt, AuthUser},
    errors::ServiceError,
    models::disposal_request::{DisposalRequestStatus, Model as RequestModel},
    services::disposal_requests::{
        CreateDisposalRequestInput, DisposalRequestFilter, UpdateDisposalRequestInput,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct DisposalRequestListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    pub status: Option<DisposalRequestStatus>,
    pub created_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisposalRequestSummary {
    pub id: Uuid,
    pub request_number: String,
    pub status: DisposalRequestStatus,
    pub status_label: String,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub estimated_departure: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RequestModel> for DisposalRequestSummary {
    fn from(model: RequestModel) -> Self {
        Self {
            id: model.id,
            request_number: model.request_number,
            status: model.status,
            status_label: model.status.label().to_string(),
            created_by: model.created_by,
            approved_by: model.approved_by,
            assigned_to: model.assigned_to,
            estimated_departure: model.estimated_departure,
            rejection_reason: model.rejection_reason,
            note: model.note,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequestBody {
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRequestBody {
    pub assignee: Uuid,
}

pub async fn list_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DisposalRequestListQuery>,
) -> ApiResult<PaginatedResponse<DisposalRequestSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let filter = DisposalRequestFilter {
        status: query.status,
        created_by: query.created_by,
        approved_by: query.approved_by,
        assigned_to: query.assigned_to,
    };
    let (records, total) = state
        .services
        .disposal_requests
        .list_requests(page, limit, filter, &user.roles)
        .await?;

    let items: Vec<DisposalRequestSummary> = records
        .into_iter()
        .map(DisposalRequestSummary::from)
        .collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DisposalRequestSummary> {
    match state.services.disposal_requests.get_request(id).await? {
        Some(model) => Ok(Json(ApiResponse::success(DisposalRequestSummary::from(
            model,
        )))),
        None => Err(ServiceError::NotFound(format!(
            "Disposal request {} not found",
            id
        ))),
    }
}

pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateDisposalRequestInput>,
) -> ApiResult<DisposalRequestSummary> {
    let created_by = user.user_uuid().map_err(|_| {
        ServiceError::ValidationError("Token subject is not a valid user id".into())
    })?;
    let model = state
        .services
        .disposal_requests
        .create_request(payload, created_by)
        .await?;
    Ok(Json(ApiResponse::success(DisposalRequestSummary::from(
        model,
    ))))
}

pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDisposalRequestInput>,
) -> ApiResult<DisposalRequestSummary> {
    let model = state
        .services
        .disposal_requests
        .update_request(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(DisposalRequestSummary::from(
        model,
    ))))
}

pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.services.disposal_requests.delete_request(id).await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "deleted": id }),
    )))
}

pub async fn submit_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<DisposalRequestSummary> {
    let model = state.services.disposal_requests.submit_request(id).await?;
    Ok(Json(ApiResponse::success(DisposalRequestSummary::from(
        model,
    ))))
}

pub async fn approve_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<DisposalRequestSummary> {
    let approver = user.user_uuid().map_err(|_| {
        ServiceError::ValidationError("Token subject is not a valid user id".into())
    })?;
    let model = state
        .services
        .disposal_requests
        .approve_request(id, approver)
        .await?;
    Ok(Json(ApiResponse::success(DisposalRequestSummary::from(
        model,
    ))))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequestBody>,
) -> ApiResult<DisposalRequestSummary> {
    let model = state
        .services
        .disposal_requests
        .reject_request(id, payload.reason)
        .await?;
    Ok(Json(ApiResponse::success(DisposalRequestSummary::from(
        model,
    ))))
}

pub async fn assign_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequestBody>,
) -> ApiResult<DisposalRequestSummary> {
    let model = state
        .services
        .disposal_requests
        .assign_request(id, payload.assignee)
        .await?;
    Ok(Json(ApiResponse::success(DisposalRequestSummary::from(
        model,
    ))))
}

/// Routes for the disposal request workflow. Reads are open to every
/// warehouse role plus accounting; writes are manager-only.
pub fn routes() -> Router<AppState> {
    let read = Router::new()
        .route("/", get(list_requests))
        .route("/:id", get(get_request))
        .with_role(consts::ALL_ROLES);

    let manage = Router::new()
        .route("/", post(create_request))
        .route(
            "/:id",
            axum::routing::put(update_request).delete(delete_request),
        )
        .route("/:id/submit", post(submit_request))
        .route("/:id/approve", post(approve_request))
        .route("/:id/reject", post(reject_request))
        .route("/:id/assign", post(assign_request))
        .with_role(consts::WAREHOUSE_MANAGER);

    read.merge(manage)
}
