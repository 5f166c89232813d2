use crate::{
    auth::{roles::consts, AuthRouterExt, AuthUser},
    errors::ServiceError,
    models::goods_issue_note::{GoodsIssueNoteStatus, Model as NoteModel},
    services::goods_issue_notes::CreateGoodsIssueNoteInput,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
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

pub use crate::services::goods_issue_notes::{
    GoodsIssueDetailWithAllocations, GoodsIssueNoteWithDetails,
};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct GoodsIssueNoteListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    pub status: Option<GoodsIssueNoteStatus>,
    pub sales_order_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoodsIssueNoteSummary {
    #[serde(flatten)]
    pub note: NoteModel,
    pub status_label: String,
}

impl From<NoteModel> for GoodsIssueNoteSummary {
    fn from(note: NoteModel) -> Self {
        Self {
            status_label: note.status.label().to_string(),
            note,
        }
    }
}

pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<GoodsIssueNoteListQuery>,
) -> ApiResult<PaginatedResponse<GoodsIssueNoteSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (records, total) = state
        .services
        .goods_issue_notes
        .list_notes(page, limit, query.status, query.sales_order_code)
        .await?;
    let items: Vec<GoodsIssueNoteSummary> = records
        .into_iter()
        .map(GoodsIssueNoteSummary::from)
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

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<GoodsIssueNoteWithDetails> {
    match state.services.goods_issue_notes.get_note(id).await? {
        Some(note) => Ok(Json(ApiResponse::success(note))),
        None => Err(ServiceError::NotFound(format!(
            "Goods issue note {} not found",
            id
        ))),
    }
}

pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateGoodsIssueNoteInput>,
) -> ApiResult<GoodsIssueNoteWithDetails> {
    let created_by = user.user_uuid().map_err(|_| {
        ServiceError::ValidationError("Token subject is not a valid user id".into())
    })?;
    let note = state
        .services
        .goods_issue_notes
        .create_note(payload, created_by)
        .await?;
    Ok(Json(ApiResponse::success(note)))
}

pub async fn complete_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<GoodsIssueNoteWithDetails> {
    let approver = user.user_uuid().map_err(|_| {
        ServiceError::ValidationError("Token subject is not a valid user id".into())
    })?;
    let note = state
        .services
        .goods_issue_notes
        .complete_note(id, approver)
        .await?;
    Ok(Json(ApiResponse::success(note)))
}

/// Routes for goods issue notes. Staff create them; completion is
/// manager-only; reads are open to both warehouse roles.
pub fn routes() -> Router<AppState> {
    let read = Router::new()
        .route("/", get(list_notes))
        .route("/:id", get(get_note))
        .with_role(consts::WAREHOUSE_ANY);

    let staff = Router::new()
        .route("/", post(create_note))
        .with_role(consts::WAREHOUSE_STAFF);

    let manage = Router::new()
        .route("/:id/complete", post(complete_note))
        .with_role(consts::WAREHOUSE_MANAGER);

    read.merge(staff).merge(manage)
}
