use crate::{
    auth::{roles::consts, AuthRouterExt, AuthUser},
    errors::ServiceError,
    models::pick_allocation::Model as AllocationModel,
    services::pick_allocations::{ConfirmPickInput, RePickInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanLookupQuery {
    /// Scanned location or pallet code.
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AllocationView {
    #[serde(flatten)]
    pub allocation: AllocationModel,
    pub status_label: String,
}

impl From<AllocationModel> for AllocationView {
    fn from(allocation: AllocationModel) -> Self {
        Self {
            status_label: allocation.status.label().to_string(),
            allocation,
        }
    }
}

pub async fn list_for_detail(
    State(state): State<AppState>,
    Path(detail_id): Path<Uuid>,
) -> ApiResult<Vec<AllocationView>> {
    let allocations = state
        .services
        .pick_allocations
        .list_for_detail(detail_id)
        .await?;
    let views = allocations.into_iter().map(AllocationView::from).collect();
    Ok(Json(ApiResponse::success(views)))
}

pub async fn scan_lookup(
    State(state): State<AppState>,
    Path(detail_id): Path<Uuid>,
    Query(query): Query<ScanLookupQuery>,
) -> ApiResult<AllocationView> {
    let allocation = state
        .services
        .pick_allocations
        .scan_lookup(detail_id, &query.code)
        .await?;
    Ok(Json(ApiResponse::success(AllocationView::from(allocation))))
}

pub async fn confirm_pick(
    State(state): State<AppState>,
    Path(allocation_id): Path<Uuid>,
    Json(payload): Json<ConfirmPickInput>,
) -> ApiResult<AllocationView> {
    let allocation = state
        .services
        .pick_allocations
        .confirm_pick(allocation_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(AllocationView::from(allocation))))
}

pub async fn re_pick_detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(detail_id): Path<Uuid>,
    Json(payload): Json<RePickInput>,
) -> ApiResult<serde_json::Value> {
    let requested_by = user.user_uuid().map_err(|_| {
        ServiceError::ValidationError("Token subject is not a valid user id".into())
    })?;
    state
        .services
        .pick_allocations
        .request_re_pick(detail_id, payload, requested_by, &user.roles)
        .await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "detail_id": detail_id, "re_pick": true }),
    )))
}

/// Routes for the handset-facing pick operations. Scan and confirm are
/// staff-only; re-pick is open to staff and managers, as is listing a
/// line's allocations.
pub fn routes() -> Router<AppState> {
    let read = Router::new()
        .route("/details/:detail_id", get(list_for_detail))
        .with_role(consts::WAREHOUSE_ANY);

    let staff = Router::new()
        .route("/details/:detail_id/scan", get(scan_lookup))
        .route("/:allocation_id/confirm", post(confirm_pick))
        .with_role(consts::WAREHOUSE_STAFF);

    let re_pick = Router::new()
        .route("/details/:detail_id/re-pick", post(re_pick_detail))
        .with_role(consts::WAREHOUSE_ANY);

    read.merge(staff).merge(re_pick)
}
