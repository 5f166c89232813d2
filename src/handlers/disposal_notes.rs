use crate::{
    auth::{roles::consts, AuthRouterExt, AuthUser},
    errors::ServiceError,
    models::disposal_note::{DisposalNoteStatus, Model as NoteModel},
    services::disposal_notes::CreateDisposalNoteInput,
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

pub use crate::services::disposal_notes::{DisposalNoteWithDetails, NoteDetailWithAllocations};

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct DisposalNoteListQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size (max 100)
    pub limit: Option<u64>,
    pub status: Option<DisposalNoteStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DisposalNoteSummary {
    #[serde(flatten)]
    pub note: NoteModel,
    pub status_label: String,
}

impl From<NoteModel> for DisposalNoteSummary {
    fn from(note: NoteModel) -> Self {
        Self {
            status_label: note.status.label().to_string(),
            note,
        }
    }
}

pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<DisposalNoteListQuery>,
) -> ApiResult<PaginatedResponse<DisposalNoteSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (records, total) = state
        .services
        .disposal_notes
        .list_notes(page, limit, query.status)
        .await?;
    let items: Vec<DisposalNoteSummary> =
        records.into_iter().map(DisposalNoteSummary::from).collect();
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
) -> ApiResult<DisposalNoteWithDetails> {
    match state.services.disposal_notes.get_note(id).await? {
        Some(note) => Ok(Json(ApiResponse::success(note))),
        None => Err(ServiceError::NotFound(format!(
            "Disposal note {} not found",
            id
        ))),
    }
}

pub async fn get_note_for_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> ApiResult<DisposalNoteWithDetails> {
    match state
        .services
        .disposal_notes
        .get_note_for_request(request_id)
        .await?
    {
        Some(note) => Ok(Json(ApiResponse::success(note))),
        None => Err(ServiceError::NotFound(format!(
            "No disposal note exists for request {}",
            request_id
        ))),
    }
}

pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateDisposalNoteInput>,
) -> ApiResult<DisposalNoteWithDetails> {
    let created_by = user.user_uuid().map_err(|_| {
        ServiceError::ValidationError("Token subject is not a valid user id".into())
    })?;
    let note = state
        .services
        .disposal_notes
        .create_note(payload, created_by)
        .await?;
    Ok(Json(ApiResponse::success(note)))
}

pub async fn approve_note(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<DisposalNoteWithDetails> {
    let approver = user.user_uuid().map_err(|_| {
        ServiceError::ValidationError("Token subject is not a valid user id".into())
    })?;
    let note = state
        .services
        .disposal_notes
        .approve_note(id, approver)
        .await?;
    Ok(Json(ApiResponse::success(note)))
}

/// Routes for disposal notes. Staff create notes; approval is
/// manager-only; reads are open to both warehouse roles.
pub fn routes() -> Router<AppState> {
    let read = Router::new()
        .route("/", get(list_notes))
        .route("/:id", get(get_note))
        .route("/by-request/:request_id", get(get_note_for_request))
        .with_role(consts::WAREHOUSE_ANY);

    let staff = Router::new()
        .route("/", post(create_note))
        .with_role(consts::WAREHOUSE_STAFF);

    let manage = Router::new()
        .route("/:id/approve", post(approve_note))
        .with_role(consts::WAREHOUSE_MANAGER);

    read.merge(staff).merge(manage)
}
