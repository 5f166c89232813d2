use crate::{
    auth::roles::consts,
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        disposal_note::{self, DisposalNoteStatus, Entity as DisposalNoteEntity},
        disposal_note_detail::{
            self, DetailStatus, Entity as DisposalDetailEntity, Model as DisposalDetailModel,
        },
        goods_issue_note::{self, Entity as GoodsIssueNoteEntity, GoodsIssueNoteStatus},
        goods_issue_note_detail::{
            self, Entity as GoodsIssueDetailEntity, Model as GoodsIssueDetailModel,
        },
        pick_allocation::{
            self, Entity as AllocationEntity, Model as AllocationModel, PickAllocationStatus,
        },
    },
};
use chrono::Utc;
use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct ConfirmPickInput {
    #[validate(range(min = 1, message = "Picked package quantity must be positive"))]
    pub picked_package_quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RePickInput {
    pub reason: Option<String>,
}

/// Parent line an allocation hangs off. Exactly one side is ever set.
enum ParentDetail {
    Disposal(DisposalDetailModel),
    GoodsIssue(GoodsIssueDetailModel),
}

impl ParentDetail {
    fn required_package_quantity(&self) -> i32 {
        match self {
            Self::Disposal(d) => d.required_package_quantity,
            Self::GoodsIssue(d) => d.required_package_quantity,
        }
    }

    fn id(&self) -> Uuid {
        match self {
            Self::Disposal(d) => d.id,
            Self::GoodsIssue(d) => d.id,
        }
    }
}

/// Service owning the staff-facing pick operations: scan lookup, confirm,
/// and re-pick. These are the only writers of allocation status.
#[derive(Clone)]
pub struct PickAllocationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PickAllocationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Resolves a scanned location or pallet code to the matching
    /// allocation within one detail line. The comparison is exact but
    /// case-insensitive, done in SQL so the handset never has to pull the
    /// whole allocation list.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn scan_lookup(
        &self,
        detail_id: Uuid,
        code: &str,
    ) -> Result<AllocationModel, ServiceError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::ValidationError(
                "Scanned code cannot be empty".into(),
            ));
        }
        let lowered = code.to_ascii_lowercase();

        let db = &*self.db_pool;
        let allocation = AllocationEntity::find()
            .filter(
                Condition::any()
                    .add(pick_allocation::Column::DisposalNoteDetailId.eq(detail_id))
                    .add(pick_allocation::Column::GoodsIssueNoteDetailId.eq(detail_id)),
            )
            .filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(
                            pick_allocation::Column::LocationCode,
                        )))
                        .eq(lowered.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(pick_allocation::Column::PalletCode)))
                            .eq(lowered),
                    ),
            )
            .filter(pick_allocation::Column::Status.eq(PickAllocationStatus::Pending))
            .one(db)
            .await?;

        allocation.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "No allocation matches code {} on this detail line",
                code
            ))
        })
    }

    /// Confirms a pick against a pending allocation. The confirmed quantity
    /// may not push the detail line's picked total past its requirement.
    /// When this was the line's last pending allocation the line completes.
    #[instrument(skip(self, input))]
    pub async fn confirm_pick(
        &self,
        allocation_id: Uuid,
        input: ConfirmPickInput,
    ) -> Result<AllocationModel, ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;
        let allocation = self.require_allocation(allocation_id).await?;
        if allocation.status != PickAllocationStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "Allocation is already {}",
                allocation.status.label()
            )));
        }

        let parent = self.require_parent(&allocation).await?;

        let txn = db.begin().await?;
        let now = Utc::now();

        // Touching the detail row first takes its lock, so concurrent
        // confirms against sibling allocations read the picked sum one at
        // a time and the sum invariant holds across rows.
        self.lock_open_detail(&txn, &parent, now).await?;

        let siblings = Self::sibling_allocations_on(&txn, parent.id()).await?;
        let picked_so_far: i64 = siblings
            .iter()
            .filter(|a| a.id != allocation.id)
            .map(|a| a.picked_package_quantity as i64)
            .sum();
        if picked_so_far + input.picked_package_quantity as i64
            > parent.required_package_quantity() as i64
        {
            return Err(ServiceError::InvalidOperation(format!(
                "Picking {} packages would exceed the line requirement of {}",
                input.picked_package_quantity,
                parent.required_package_quantity()
            )));
        }

        let result = AllocationEntity::update_many()
            .col_expr(
                pick_allocation::Column::Status,
                Expr::value(PickAllocationStatus::Picked),
            )
            .col_expr(
                pick_allocation::Column::PickedPackageQuantity,
                Expr::value(input.picked_package_quantity),
            )
            .col_expr(pick_allocation::Column::UpdatedAt, Expr::value(now))
            .filter(pick_allocation::Column::Id.eq(allocation_id))
            .filter(pick_allocation::Column::Status.eq(PickAllocationStatus::Pending))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Allocation was confirmed concurrently".into(),
            ));
        }

        // The detail lock is held, so the sibling snapshot is authoritative.
        let still_pending = siblings
            .iter()
            .filter(|a| a.id != allocation.id)
            .any(|a| a.status == PickAllocationStatus::Pending);
        if !still_pending {
            Self::complete_detail(&txn, &parent, now).await?;
        }

        txn.commit().await?;

        info!(
            allocation_id = %allocation_id,
            quantity = input.picked_package_quantity,
            "Pick confirmed"
        );
        self.emit(Event::PickConfirmed {
            allocation_id,
            picked_package_quantity: input.picked_package_quantity,
        })
        .await;

        self.require_allocation(allocation_id).await
    }

    /// Reopens a detail line for picking: every allocation drops back to
    /// Pending with its picked quantity cleared, and the line reverts to
    /// Picking. Managers must give a reason; the assigned staff may omit it.
    #[instrument(skip(self, input))]
    pub async fn request_re_pick(
        &self,
        detail_id: Uuid,
        input: RePickInput,
        requested_by: Uuid,
        caller_roles: &[String],
    ) -> Result<(), ServiceError> {
        let is_staff = caller_roles.iter().any(|r| r == consts::WAREHOUSE_STAFF);
        let reason = input.reason.filter(|r| !r.trim().is_empty());
        if !is_staff && reason.is_none() {
            return Err(ServiceError::ValidationError(
                "A reason is required to request a re-pick".into(),
            ));
        }

        let db = &*self.db_pool;
        let parent = self.find_parent_detail(detail_id).await?;

        let txn = db.begin().await?;
        let now = Utc::now();

        // Lock order is note, then detail, then allocations; confirm_pick
        // starts at the detail, and note approval starts at the note, so the
        // three writers never wait on each other in a cycle. Holding the note
        // row also keeps approval from completing a note whose detail is
        // being reopened underneath it.
        self.lock_open_note(&txn, &parent, now).await?;

        match &parent {
            ParentDetail::Disposal(detail) => {
                DisposalDetailEntity::update_many()
                    .col_expr(
                        disposal_note_detail::Column::Status,
                        Expr::value(DetailStatus::Picking),
                    )
                    .col_expr(disposal_note_detail::Column::UpdatedAt, Expr::value(now))
                    .filter(disposal_note_detail::Column::Id.eq(detail.id))
                    .exec(&txn)
                    .await?;
            }
            ParentDetail::GoodsIssue(detail) => {
                GoodsIssueDetailEntity::update_many()
                    .col_expr(
                        goods_issue_note_detail::Column::Status,
                        Expr::value(DetailStatus::Picking),
                    )
                    .col_expr(goods_issue_note_detail::Column::UpdatedAt, Expr::value(now))
                    .filter(goods_issue_note_detail::Column::Id.eq(detail.id))
                    .exec(&txn)
                    .await?;
            }
        }

        let scope = Condition::any()
            .add(pick_allocation::Column::DisposalNoteDetailId.eq(detail_id))
            .add(pick_allocation::Column::GoodsIssueNoteDetailId.eq(detail_id));
        AllocationEntity::update_many()
            .col_expr(
                pick_allocation::Column::Status,
                Expr::value(PickAllocationStatus::Pending),
            )
            .col_expr(pick_allocation::Column::PickedPackageQuantity, Expr::value(0))
            .col_expr(pick_allocation::Column::UpdatedAt, Expr::value(now))
            .filter(scope)
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(detail_id = %detail_id, requested_by = %requested_by, "Re-pick requested");
        self.emit(Event::RePickRequested {
            detail_id,
            requested_by,
            reason,
        })
        .await;
        Ok(())
    }

    /// Lists the allocations of one detail line.
    #[instrument(skip(self))]
    pub async fn list_for_detail(
        &self,
        detail_id: Uuid,
    ) -> Result<Vec<AllocationModel>, ServiceError> {
        Self::sibling_allocations_on(&*self.db_pool, detail_id).await
    }

    async fn require_allocation(&self, id: Uuid) -> Result<AllocationModel, ServiceError> {
        let db = &*self.db_pool;
        AllocationEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Pick allocation {} not found", id)))
    }

    async fn require_parent(
        &self,
        allocation: &AllocationModel,
    ) -> Result<ParentDetail, ServiceError> {
        let db = &*self.db_pool;
        if let Some(detail_id) = allocation.disposal_note_detail_id {
            let detail = DisposalDetailEntity::find_by_id(detail_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Allocation {} references missing disposal detail",
                        allocation.id
                    ))
                })?;
            return Ok(ParentDetail::Disposal(detail));
        }
        if let Some(detail_id) = allocation.goods_issue_note_detail_id {
            let detail = GoodsIssueDetailEntity::find_by_id(detail_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Allocation {} references missing goods issue detail",
                        allocation.id
                    ))
                })?;
            return Ok(ParentDetail::GoodsIssue(detail));
        }
        Err(ServiceError::InternalError(format!(
            "Allocation {} has no parent detail",
            allocation.id
        )))
    }

    async fn find_parent_detail(&self, detail_id: Uuid) -> Result<ParentDetail, ServiceError> {
        let db = &*self.db_pool;
        if let Some(detail) = DisposalDetailEntity::find_by_id(detail_id).one(db).await? {
            return Ok(ParentDetail::Disposal(detail));
        }
        if let Some(detail) = GoodsIssueDetailEntity::find_by_id(detail_id).one(db).await? {
            return Ok(ParentDetail::GoodsIssue(detail));
        }
        Err(ServiceError::NotFound(format!(
            "Note detail {} not found",
            detail_id
        )))
    }

    /// Conditional touch of the enclosing note row. A re-pick only makes
    /// sense while the note is open, and the row lock the update takes
    /// serializes the re-pick against note approval for the rest of the
    /// transaction.
    async fn lock_open_note(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        parent: &ParentDetail,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let rows_affected = match parent {
            ParentDetail::Disposal(detail) => {
                DisposalNoteEntity::update_many()
                    .col_expr(disposal_note::Column::UpdatedAt, Expr::value(now))
                    .filter(disposal_note::Column::Id.eq(detail.disposal_note_id))
                    .filter(disposal_note::Column::Status.eq(DisposalNoteStatus::Picking))
                    .exec(txn)
                    .await?
                    .rows_affected
            }
            ParentDetail::GoodsIssue(detail) => {
                GoodsIssueNoteEntity::update_many()
                    .col_expr(goods_issue_note::Column::UpdatedAt, Expr::value(now))
                    .filter(goods_issue_note::Column::Id.eq(detail.goods_issue_note_id))
                    .filter(goods_issue_note::Column::Status.eq(GoodsIssueNoteStatus::Picking))
                    .exec(txn)
                    .await?
                    .rows_affected
            }
        };
        if rows_affected == 0 {
            return Err(ServiceError::InvalidStatus(
                "Note is no longer open for picking".into(),
            ));
        }
        Ok(())
    }

    /// Conditional touch of the detail row. Holding its lock keeps sibling
    /// confirms from interleaving their picked-sum reads.
    async fn lock_open_detail(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        parent: &ParentDetail,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let rows_affected = match parent {
            ParentDetail::Disposal(detail) => {
                DisposalDetailEntity::update_many()
                    .col_expr(disposal_note_detail::Column::UpdatedAt, Expr::value(now))
                    .filter(disposal_note_detail::Column::Id.eq(detail.id))
                    .filter(disposal_note_detail::Column::Status.eq(DetailStatus::Picking))
                    .exec(txn)
                    .await?
                    .rows_affected
            }
            ParentDetail::GoodsIssue(detail) => {
                GoodsIssueDetailEntity::update_many()
                    .col_expr(goods_issue_note_detail::Column::UpdatedAt, Expr::value(now))
                    .filter(goods_issue_note_detail::Column::Id.eq(detail.id))
                    .filter(goods_issue_note_detail::Column::Status.eq(DetailStatus::Picking))
                    .exec(txn)
                    .await?
                    .rows_affected
            }
        };
        if rows_affected == 0 {
            return Err(ServiceError::InvalidStatus(
                "Detail line is not open for picking".into(),
            ));
        }
        Ok(())
    }

    async fn sibling_allocations_on<C: ConnectionTrait>(
        conn: &C,
        detail_id: Uuid,
    ) -> Result<Vec<AllocationModel>, ServiceError> {
        let allocations = AllocationEntity::find()
            .filter(
                Condition::any()
                    .add(pick_allocation::Column::DisposalNoteDetailId.eq(detail_id))
                    .add(pick_allocation::Column::GoodsIssueNoteDetailId.eq(detail_id)),
            )
            .all(conn)
            .await?;
        Ok(allocations)
    }

    async fn complete_detail<C: ConnectionTrait>(
        conn: &C,
        parent: &ParentDetail,
        now: chrono::DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        match parent {
            ParentDetail::Disposal(detail) => {
                DisposalDetailEntity::update_many()
                    .col_expr(
                        disposal_note_detail::Column::Status,
                        Expr::value(DetailStatus::Completed),
                    )
                    .col_expr(disposal_note_detail::Column::UpdatedAt, Expr::value(now))
                    .filter(disposal_note_detail::Column::Id.eq(detail.id))
                    .filter(disposal_note_detail::Column::Status.eq(DetailStatus::Picking))
                    .exec(conn)
                    .await?;
            }
            ParentDetail::GoodsIssue(detail) => {
                GoodsIssueDetailEntity::update_many()
                    .col_expr(
                        goods_issue_note_detail::Column::Status,
                        Expr::value(DetailStatus::Completed),
                    )
                    .col_expr(goods_issue_note_detail::Column::UpdatedAt, Expr::value(now))
                    .filter(goods_issue_note_detail::Column::Id.eq(detail.id))
                    .filter(goods_issue_note_detail::Column::Status.eq(DetailStatus::Picking))
                    .exec(conn)
                    .await?;
            }
        }
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send pick event");
        }
    }
}
