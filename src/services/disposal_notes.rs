use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        disposal_note::{
            self, ActiveModel as NoteActiveModel, DisposalNoteStatus, Entity as NoteEntity,
            Model as NoteModel,
        },
        disposal_note_detail::{
            self, ActiveModel as DetailActiveModel, DetailStatus, Entity as DetailEntity,
            Model as DetailModel,
        },
        disposal_request::{
            self, DisposalRequestStatus, Entity as RequestEntity,
        },
        pick_allocation::{
            self, ActiveModel as AllocationActiveModel, Entity as AllocationEntity,
            Model as AllocationModel, PickAllocationStatus,
        },
    },
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAllocationInput {
    #[validate(custom = "super::not_blank")]
    pub location_code: String,
    pub pallet_code: Option<String>,
    #[validate(custom = "super::not_blank")]
    pub rack: String,
    pub row_index: i32,
    pub column_index: i32,
    #[validate(range(min = 1, message = "Required package quantity must be positive"))]
    pub required_package_quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateNoteDetailInput {
    #[validate(custom = "super::not_blank")]
    pub goods_code: String,
    #[validate(custom = "super::not_blank")]
    pub goods_name: String,
    pub batch_number: Option<String>,
    #[validate(range(min = 1, message = "Required package quantity must be positive"))]
    pub required_package_quantity: i32,
    pub allocations: Vec<CreateAllocationInput>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDisposalNoteInput {
    #[validate(custom = "super::not_blank")]
    pub note_number: String,
    pub disposal_request_id: Uuid,
    #[validate(length(min = 1, message = "At least one detail line is required"))]
    pub details: Vec<CreateNoteDetailInput>,
}

/// A detail line together with its pick allocations.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteDetailWithAllocations {
    #[serde(flatten)]
    pub detail: DetailModel,
    pub status_label: String,
    pub allocations: Vec<AllocationModel>,
}

/// A disposal note expanded with its detail lines.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DisposalNoteWithDetails {
    #[serde(flatten)]
    pub note: NoteModel,
    pub status_label: String,
    pub details: Vec<NoteDetailWithAllocations>,
}

/// Service owning disposal note creation and approval. Note creation moves
/// the parent request into Picking; approval completes both documents.
#[derive(Clone)]
pub struct DisposalNoteService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl DisposalNoteService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a disposal note for an assigned request in one transaction:
    /// the note, its detail lines, and each line's pick allocations. The
    /// parent request moves AssignedForPicking -> Picking in the same
    /// transaction, so a concurrent second note loses on the status check.
    #[instrument(skip(self, input), fields(note_number = %input.note_number, request_id = %input.disposal_request_id))]
    pub async fn create_note(
        &self,
        input: CreateDisposalNoteInput,
        created_by: Uuid,
    ) -> Result<DisposalNoteWithDetails, ServiceError> {
        input.validate()?;

        for detail in &input.details {
            detail.validate()?;
            for allocation in &detail.allocations {
                allocation.validate()?;
            }
            if detail.allocations.is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "Detail {} has no pick allocations",
                    detail.goods_code
                )));
            }
            let allocated: i64 = detail
                .allocations
                .iter()
                .map(|a| a.required_package_quantity as i64)
                .sum();
            if allocated != detail.required_package_quantity as i64 {
                return Err(ServiceError::ValidationError(format!(
                    "Allocations for {} cover {} packages but the line requires {}",
                    detail.goods_code, allocated, detail.required_package_quantity
                )));
            }
        }

        let db = &*self.db_pool;

        let duplicate = NoteEntity::find()
            .filter(disposal_note::Column::NoteNumber.eq(input.note_number.clone()))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!(
                "Note number {} already exists",
                input.note_number
            )));
        }

        let request = RequestEntity::find_by_id(input.disposal_request_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Disposal request {} not found",
                    input.disposal_request_id
                ))
            })?;
        if request.status != DisposalRequestStatus::AssignedForPicking {
            return Err(ServiceError::InvalidStatus(format!(
                "Request must be assigned for picking to create a note, currently {}",
                request.status.label()
            )));
        }

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction for note creation");
            ServiceError::DatabaseError(e)
        })?;

        let now = Utc::now();
        let note_id = Uuid::new_v4();
        let note = NoteActiveModel {
            id: Set(note_id),
            note_number: Set(input.note_number),
            disposal_request_id: Set(request.id),
            status: Set(DisposalNoteStatus::Picking),
            created_by: Set(created_by),
            approved_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let note = note.insert(&txn).await?;

        let mut details = Vec::with_capacity(input.details.len());
        for detail_input in input.details {
            let detail_id = Uuid::new_v4();
            let detail = DetailActiveModel {
                id: Set(detail_id),
                disposal_note_id: Set(note_id),
                goods_code: Set(detail_input.goods_code),
                goods_name: Set(detail_input.goods_name),
                batch_number: Set(detail_input.batch_number),
                required_package_quantity: Set(detail_input.required_package_quantity),
                status: Set(DetailStatus::Picking),
                created_at: Set(now),
                updated_at: Set(now),
            };
            let detail = detail.insert(&txn).await?;

            let mut allocations = Vec::with_capacity(detail_input.allocations.len());
            for alloc_input in detail_input.allocations {
                let allocation = AllocationActiveModel {
                    id: Set(Uuid::new_v4()),
                    disposal_note_detail_id: Set(Some(detail_id)),
                    goods_issue_note_detail_id: Set(None),
                    location_code: Set(alloc_input.location_code),
                    pallet_code: Set(alloc_input.pallet_code),
                    rack: Set(alloc_input.rack),
                    row_index: Set(alloc_input.row_index),
                    column_index: Set(alloc_input.column_index),
                    required_package_quantity: Set(alloc_input.required_package_quantity),
                    picked_package_quantity: Set(0),
                    status: Set(PickAllocationStatus::Pending),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                allocations.push(allocation.insert(&txn).await?);
            }

            details.push(NoteDetailWithAllocations {
                status_label: detail.status.label().to_string(),
                detail,
                allocations,
            });
        }

        let result = RequestEntity::update_many()
            .col_expr(
                disposal_request::Column::Status,
                Expr::value(DisposalRequestStatus::Picking),
            )
            .col_expr(disposal_request::Column::UpdatedAt, Expr::value(now))
            .filter(disposal_request::Column::Id.eq(request.id))
            .filter(
                disposal_request::Column::Status.eq(DisposalRequestStatus::AssignedForPicking),
            )
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Request status changed concurrently".into(),
            ));
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit note creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(note_id = %note.id, request_id = %request.id, "Disposal note created");
        self.emit(Event::DisposalNoteCreated {
            note_id: note.id,
            request_id: request.id,
        })
        .await;

        Ok(DisposalNoteWithDetails {
            status_label: note.status.label().to_string(),
            note,
            details,
        })
    }

    /// Approves a completed note. Every detail line must already be
    /// Completed; approval also completes the parent request.
    #[instrument(skip(self))]
    pub async fn approve_note(
        &self,
        id: Uuid,
        approver: Uuid,
    ) -> Result<DisposalNoteWithDetails, ServiceError> {
        let db = &*self.db_pool;

        let note = NoteEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Disposal note {} not found", id)))?;
        if note.status != DisposalNoteStatus::Picking {
            return Err(ServiceError::InvalidStatus(format!(
                "Note in status {} cannot be approved",
                note.status.label()
            )));
        }

        let txn = db.begin().await?;
        let now = Utc::now();

        // The note CAS runs before the detail check: the row lock it takes
        // serializes approval against re-picks, which touch the note row
        // before reopening any detail.
        let result = NoteEntity::update_many()
            .col_expr(
                disposal_note::Column::Status,
                Expr::value(DisposalNoteStatus::Completed),
            )
            .col_expr(disposal_note::Column::ApprovedBy, Expr::value(Some(approver)))
            .col_expr(disposal_note::Column::UpdatedAt, Expr::value(now))
            .filter(disposal_note::Column::Id.eq(id))
            .filter(disposal_note::Column::Status.eq(DisposalNoteStatus::Picking))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Note was approved concurrently".into(),
            ));
        }

        let unfinished = DetailEntity::find()
            .filter(disposal_note_detail::Column::DisposalNoteId.eq(id))
            .filter(disposal_note_detail::Column::Status.ne(DetailStatus::Completed))
            .count(&txn)
            .await?;
        if unfinished > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "{} detail line(s) are not yet picked",
                unfinished
            )));
        }

        let result = RequestEntity::update_many()
            .col_expr(
                disposal_request::Column::Status,
                Expr::value(DisposalRequestStatus::Completed),
            )
            .col_expr(disposal_request::Column::UpdatedAt, Expr::value(now))
            .filter(disposal_request::Column::Id.eq(note.disposal_request_id))
            .filter(disposal_request::Column::Status.eq(DisposalRequestStatus::Picking))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Request status changed concurrently".into(),
            ));
        }

        txn.commit().await?;

        info!(note_id = %id, request_id = %note.disposal_request_id, "Disposal note approved");
        self.emit(Event::DisposalNoteApproved(id)).await;
        self.emit(Event::DisposalRequestCompleted(note.disposal_request_id))
            .await;

        self.require_note_with_details(id).await
    }

    /// Retrieves a note expanded with its details and allocations.
    #[instrument(skip(self))]
    pub async fn get_note(
        &self,
        id: Uuid,
    ) -> Result<Option<DisposalNoteWithDetails>, ServiceError> {
        let db = &*self.db_pool;
        let note = match NoteEntity::find_by_id(id).one(db).await? {
            Some(note) => note,
            None => return Ok(None),
        };
        Ok(Some(self.expand_note(note).await?))
    }

    /// Finds the note belonging to a request, if one exists.
    #[instrument(skip(self))]
    pub async fn get_note_for_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<DisposalNoteWithDetails>, ServiceError> {
        let db = &*self.db_pool;
        let note = match NoteEntity::find()
            .filter(disposal_note::Column::DisposalRequestId.eq(request_id))
            .one(db)
            .await?
        {
            Some(note) => note,
            None => return Ok(None),
        };
        Ok(Some(self.expand_note(note).await?))
    }

    /// Lists notes with pagination, newest first.
    #[instrument(skip(self))]
    pub async fn list_notes(
        &self,
        page: u64,
        limit: u64,
        status: Option<DisposalNoteStatus>,
    ) -> Result<(Vec<NoteModel>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = NoteEntity::find();
        if let Some(status) = status {
            query = query.filter(disposal_note::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(disposal_note::Column::CreatedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let notes = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((notes, total))
    }

    async fn require_note_with_details(
        &self,
        id: Uuid,
    ) -> Result<DisposalNoteWithDetails, ServiceError> {
        self.get_note(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Disposal note {} not found", id)))
    }

    async fn expand_note(&self, note: NoteModel) -> Result<DisposalNoteWithDetails, ServiceError> {
        let db = &*self.db_pool;
        let detail_models = DetailEntity::find()
            .filter(disposal_note_detail::Column::DisposalNoteId.eq(note.id))
            .order_by_asc(disposal_note_detail::Column::CreatedAt)
            .all(db)
            .await?;

        let mut details = Vec::with_capacity(detail_models.len());
        for detail in detail_models {
            let allocations = AllocationEntity::find()
                .filter(pick_allocation::Column::DisposalNoteDetailId.eq(detail.id))
                .order_by_asc(pick_allocation::Column::CreatedAt)
                .all(db)
                .await?;
            details.push(NoteDetailWithAllocations {
                status_label: detail.status.label().to_string(),
                detail,
                allocations,
            });
        }

        Ok(DisposalNoteWithDetails {
            status_label: note.status.label().to_string(),
            note,
            details,
        })
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send disposal note event");
        }
    }
}
