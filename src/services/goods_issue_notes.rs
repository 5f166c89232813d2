use crate::{
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        goods_issue_note::{
            self, ActiveModel as NoteActiveModel, Entity as NoteEntity, GoodsIssueNoteStatus,
            Model as NoteModel,
        },
        goods_issue_note_detail::{
            self, ActiveModel as DetailActiveModel, DetailStatus, Entity as DetailEntity,
            Model as DetailModel,
        },
        pick_allocation::{
            self, ActiveModel as AllocationActiveModel, Entity as AllocationEntity,
            Model as AllocationModel, PickAllocationStatus,
        },
    },
    services::disposal_notes::CreateAllocationInput,
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
pub struct CreateGoodsIssueDetailInput {
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
pub struct CreateGoodsIssueNoteInput {
    #[validate(custom = "super::not_blank")]
    pub note_number: String,
    #[validate(custom = "super::not_blank")]
    pub sales_order_code: String,
    #[validate(length(min = 1, message = "At least one detail line is required"))]
    pub details: Vec<CreateGoodsIssueDetailInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GoodsIssueDetailWithAllocations {
    #[serde(flatten)]
    pub detail: DetailModel,
    pub status_label: String,
    pub allocations: Vec<AllocationModel>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GoodsIssueNoteWithDetails {
    #[serde(flatten)]
    pub note: NoteModel,
    pub status_label: String,
    pub details: Vec<GoodsIssueDetailWithAllocations>,
}

/// Service owning goods issue notes: the outbound sales-order counterpart
/// of a disposal note, with the same picking mechanics underneath.
#[derive(Clone)]
pub struct GoodsIssueNoteService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl GoodsIssueNoteService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a goods issue note with its detail lines and allocations in
    /// one transaction. Lines start in Picking with pending allocations.
    #[instrument(skip(self, input), fields(note_number = %input.note_number, sales_order = %input.sales_order_code))]
    pub async fn create_note(
        &self,
        input: CreateGoodsIssueNoteInput,
        created_by: Uuid,
    ) -> Result<GoodsIssueNoteWithDetails, ServiceError> {
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
            .filter(goods_issue_note::Column::NoteNumber.eq(input.note_number.clone()))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!(
                "Note number {} already exists",
                input.note_number
            )));
        }

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to begin transaction for goods issue note");
            ServiceError::DatabaseError(e)
        })?;

        let now = Utc::now();
        let note_id = Uuid::new_v4();
        let note = NoteActiveModel {
            id: Set(note_id),
            note_number: Set(input.note_number),
            sales_order_code: Set(input.sales_order_code),
            status: Set(GoodsIssueNoteStatus::Picking),
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
                goods_issue_note_id: Set(note_id),
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
                    disposal_note_detail_id: Set(None),
                    goods_issue_note_detail_id: Set(Some(detail_id)),
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

            details.push(GoodsIssueDetailWithAllocations {
                status_label: detail.status.label().to_string(),
                detail,
                allocations,
            });
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit goods issue note creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(note_id = %note.id, "Goods issue note created");
        self.emit(Event::GoodsIssueNoteCreated(note.id)).await;

        Ok(GoodsIssueNoteWithDetails {
            status_label: note.status.label().to_string(),
            note,
            details,
        })
    }

    /// Completes a note once every detail line has been picked. Records
    /// the approver on the document.
    #[instrument(skip(self))]
    pub async fn complete_note(
        &self,
        id: Uuid,
        approver: Uuid,
    ) -> Result<GoodsIssueNoteWithDetails, ServiceError> {
        let db = &*self.db_pool;

        let note = NoteEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Goods issue note {} not found", id)))?;
        if note.status != GoodsIssueNoteStatus::Picking {
            return Err(ServiceError::InvalidStatus(format!(
                "Note in status {} cannot be completed",
                note.status.label()
            )));
        }

        let txn = db.begin().await?;

        // The note CAS runs before the detail check: the row lock it takes
        // serializes completion against re-picks, which touch the note row
        // before reopening any detail.
        let result = NoteEntity::update_many()
            .col_expr(
                goods_issue_note::Column::Status,
                Expr::value(GoodsIssueNoteStatus::Completed),
            )
            .col_expr(
                goods_issue_note::Column::ApprovedBy,
                Expr::value(Some(approver)),
            )
            .col_expr(goods_issue_note::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(goods_issue_note::Column::Id.eq(id))
            .filter(goods_issue_note::Column::Status.eq(GoodsIssueNoteStatus::Picking))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Note was completed concurrently".into(),
            ));
        }

        let unfinished = DetailEntity::find()
            .filter(goods_issue_note_detail::Column::GoodsIssueNoteId.eq(id))
            .filter(goods_issue_note_detail::Column::Status.ne(DetailStatus::Completed))
            .count(&txn)
            .await?;
        if unfinished > 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "{} detail line(s) are not yet picked",
                unfinished
            )));
        }

        txn.commit().await?;

        info!(note_id = %id, "Goods issue note completed");
        self.emit(Event::GoodsIssueNoteCompleted(id)).await;

        self.require_note_with_details(id).await
    }

    /// Retrieves a note expanded with details and allocations.
    #[instrument(skip(self))]
    pub async fn get_note(
        &self,
        id: Uuid,
    ) -> Result<Option<GoodsIssueNoteWithDetails>, ServiceError> {
        let db = &*self.db_pool;
        let note = match NoteEntity::find_by_id(id).one(db).await? {
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
        status: Option<GoodsIssueNoteStatus>,
        sales_order_code: Option<String>,
    ) -> Result<(Vec<NoteModel>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = NoteEntity::find();
        if let Some(status) = status {
            query = query.filter(goods_issue_note::Column::Status.eq(status));
        }
        if let Some(code) = sales_order_code {
            query = query.filter(goods_issue_note::Column::SalesOrderCode.eq(code));
        }
        let paginator = query
            .order_by_desc(goods_issue_note::Column::CreatedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let notes = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((notes, total))
    }

    async fn require_note_with_details(
        &self,
        id: Uuid,
    ) -> Result<GoodsIssueNoteWithDetails, ServiceError> {
        self.get_note(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Goods issue note {} not found", id)))
    }

    async fn expand_note(
        &self,
        note: NoteModel,
    ) -> Result<GoodsIssueNoteWithDetails, ServiceError> {
        let db = &*self.db_pool;
        let detail_models = DetailEntity::find()
            .filter(goods_issue_note_detail::Column::GoodsIssueNoteId.eq(note.id))
            .order_by_asc(goods_issue_note_detail::Column::CreatedAt)
            .all(db)
            .await?;

        let mut details = Vec::with_capacity(detail_models.len());
        for detail in detail_models {
            let allocations = AllocationEntity::find()
                .filter(pick_allocation::Column::GoodsIssueNoteDetailId.eq(detail.id))
                .order_by_asc(pick_allocation::Column::CreatedAt)
                .all(db)
                .await?;
            details.push(GoodsIssueDetailWithAllocations {
                status_label: detail.status.label().to_string(),
                detail,
                allocations,
            });
        }

        Ok(GoodsIssueNoteWithDetails {
            status_label: note.status.label().to_string(),
            note,
            details,
        })
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send goods issue note event");
        }
    }
}
