use crate::{
    auth::{filter_access, FilterAccess},
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender},
    models::disposal_request::{
        self, ActiveModel as RequestActiveModel, DisposalRequestStatus, Entity as RequestEntity,
        Model as RequestModel,
    },
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDisposalRequestInput {
    #[validate(custom = "super::not_blank")]
    pub request_number: String,
    pub estimated_departure: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDisposalRequestInput {
    pub estimated_departure: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Optional list filters; each one is gated by the caller's filter access.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DisposalRequestFilter {
    pub status: Option<DisposalRequestStatus>,
    pub created_by: Option<Uuid>,
    pub approved_by: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

/// Service owning the disposal request state machine. Every transition is a
/// compare-and-set on the expected current status so that two racing
/// operators cannot both win the same transition.
#[derive(Clone)]
pub struct DisposalRequestService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl DisposalRequestService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new disposal request in Draft.
    #[instrument(skip(self, input), fields(request_number = %input.request_number))]
    pub async fn create_request(
        &self,
        input: CreateDisposalRequestInput,
        created_by: Uuid,
    ) -> Result<RequestModel, ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;

        let duplicate = RequestEntity::find()
            .filter(disposal_request::Column::RequestNumber.eq(input.request_number.clone()))
            .count(db)
            .await?;
        if duplicate > 0 {
            return Err(ServiceError::Conflict(format!(
                "Request number {} already exists",
                input.request_number
            )));
        }

        let now = Utc::now();
        let request = RequestActiveModel {
            id: Set(Uuid::new_v4()),
            request_number: Set(input.request_number),
            status: Set(DisposalRequestStatus::Draft),
            created_by: Set(created_by),
            approved_by: Set(None),
            assigned_to: Set(None),
            estimated_departure: Set(input.estimated_departure),
            rejection_reason: Set(None),
            note: Set(input.note),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = request.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to create disposal request");
            ServiceError::DatabaseError(e)
        })?;

        info!(request_id = %model.id, "Disposal request created");
        self.emit(Event::DisposalRequestCreated(model.id)).await;
        Ok(model)
    }

    /// Retrieves a request by ID.
    #[instrument(skip(self))]
    pub async fn get_request(&self, id: Uuid) -> Result<Option<RequestModel>, ServiceError> {
        let db = &*self.db_pool;
        RequestEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Lists requests with pagination. Filters beyond the caller's access
    /// level are refused rather than silently dropped.
    #[instrument(skip(self, filter))]
    pub async fn list_requests(
        &self,
        page: u64,
        limit: u64,
        filter: DisposalRequestFilter,
        caller_roles: &[String],
    ) -> Result<(Vec<RequestModel>, u64), ServiceError> {
        let access: FilterAccess = filter_access(caller_roles);
        if filter.created_by.is_some() && !access.by_creator {
            return Err(ServiceError::Forbidden(
                "Filtering by creator is not permitted for this role".into(),
            ));
        }
        if filter.approved_by.is_some() && !access.by_approver {
            return Err(ServiceError::Forbidden(
                "Filtering by approver is not permitted for this role".into(),
            ));
        }
        if filter.assigned_to.is_some() && !access.by_assignee {
            return Err(ServiceError::Forbidden(
                "Filtering by assignee is not permitted for this role".into(),
            ));
        }

        let db = &*self.db_pool;
        let mut query = RequestEntity::find();
        if let Some(status) = filter.status {
            query = query.filter(disposal_request::Column::Status.eq(status));
        }
        if let Some(creator) = filter.created_by {
            query = query.filter(disposal_request::Column::CreatedBy.eq(creator));
        }
        if let Some(approver) = filter.approved_by {
            query = query.filter(disposal_request::Column::ApprovedBy.eq(approver));
        }
        if let Some(assignee) = filter.assigned_to {
            query = query.filter(disposal_request::Column::AssignedTo.eq(assignee));
        }

        let paginator = query
            .order_by_desc(disposal_request::Column::CreatedAt)
            .paginate(db, limit);
        let total = paginator.num_items().await?;
        let requests = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((requests, total))
    }

    /// Submits a request for approval. Legal from Draft and from Rejected;
    /// resubmission clears the previous rejection reason.
    #[instrument(skip(self))]
    pub async fn submit_request(&self, id: Uuid) -> Result<RequestModel, ServiceError> {
        let current = self.require_request(id).await?;
        self.ensure_transition(&current, DisposalRequestStatus::PendingApproval)?;

        let db = &*self.db_pool;
        let result = RequestEntity::update_many()
            .col_expr(
                disposal_request::Column::Status,
                Expr::value(DisposalRequestStatus::PendingApproval),
            )
            .col_expr(
                disposal_request::Column::RejectionReason,
                Expr::value(Option::<String>::None),
            )
            .col_expr(disposal_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(disposal_request::Column::Id.eq(id))
            .filter(disposal_request::Column::Status.eq(current.status))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Request status changed concurrently".into(),
            ));
        }

        info!(request_id = %id, "Disposal request submitted for approval");
        self.emit(Event::DisposalRequestSubmitted(id)).await;
        self.require_request(id).await
    }

    /// Approves a pending request and records the approver.
    #[instrument(skip(self))]
    pub async fn approve_request(
        &self,
        id: Uuid,
        approver: Uuid,
    ) -> Result<RequestModel, ServiceError> {
        let current = self.require_request(id).await?;
        self.ensure_transition(&current, DisposalRequestStatus::Approved)?;

        let db = &*self.db_pool;
        let result = RequestEntity::update_many()
            .col_expr(
                disposal_request::Column::Status,
                Expr::value(DisposalRequestStatus::Approved),
            )
            .col_expr(
                disposal_request::Column::ApprovedBy,
                Expr::value(Some(approver)),
            )
            .col_expr(disposal_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(disposal_request::Column::Id.eq(id))
            .filter(disposal_request::Column::Status.eq(DisposalRequestStatus::PendingApproval))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Request was approved or rejected concurrently".into(),
            ));
        }

        info!(request_id = %id, approver = %approver, "Disposal request approved");
        self.emit(Event::DisposalRequestApproved {
            request_id: id,
            approver,
        })
        .await;
        self.require_request(id).await
    }

    /// Rejects a pending request. The reason is mandatory and becomes part
    /// of the document until resubmission.
    #[instrument(skip(self, reason))]
    pub async fn reject_request(
        &self,
        id: Uuid,
        reason: String,
    ) -> Result<RequestModel, ServiceError> {
        if reason.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Rejection reason cannot be empty".into(),
            ));
        }

        let current = self.require_request(id).await?;
        self.ensure_transition(&current, DisposalRequestStatus::Rejected)?;

        let db = &*self.db_pool;
        let result = RequestEntity::update_many()
            .col_expr(
                disposal_request::Column::Status,
                Expr::value(DisposalRequestStatus::Rejected),
            )
            .col_expr(
                disposal_request::Column::RejectionReason,
                Expr::value(Some(reason.clone())),
            )
            .col_expr(disposal_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(disposal_request::Column::Id.eq(id))
            .filter(disposal_request::Column::Status.eq(DisposalRequestStatus::PendingApproval))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Request was approved or rejected concurrently".into(),
            ));
        }

        info!(request_id = %id, "Disposal request rejected");
        self.emit(Event::DisposalRequestRejected {
            request_id: id,
            reason,
        })
        .await;
        self.require_request(id).await
    }

    /// Assigns an approved request to a staff member for picking.
    #[instrument(skip(self))]
    pub async fn assign_request(
        &self,
        id: Uuid,
        assignee: Uuid,
    ) -> Result<RequestModel, ServiceError> {
        let current = self.require_request(id).await?;
        self.ensure_transition(&current, DisposalRequestStatus::AssignedForPicking)?;

        let db = &*self.db_pool;
        let result = RequestEntity::update_many()
            .col_expr(
                disposal_request::Column::Status,
                Expr::value(DisposalRequestStatus::AssignedForPicking),
            )
            .col_expr(
                disposal_request::Column::AssignedTo,
                Expr::value(Some(assignee)),
            )
            .col_expr(disposal_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(disposal_request::Column::Id.eq(id))
            .filter(disposal_request::Column::Status.eq(DisposalRequestStatus::Approved))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Request status changed concurrently".into(),
            ));
        }

        info!(request_id = %id, assignee = %assignee, "Disposal request assigned for picking");
        self.emit(Event::DisposalRequestAssigned {
            request_id: id,
            assignee,
        })
        .await;
        self.require_request(id).await
    }

    /// Updates an editable request. Only Draft and Rejected allow edits.
    #[instrument(skip(self, input))]
    pub async fn update_request(
        &self,
        id: Uuid,
        input: UpdateDisposalRequestInput,
    ) -> Result<RequestModel, ServiceError> {
        input.validate()?;

        let current = self.require_request(id).await?;
        if !current.status.is_editable() {
            return Err(ServiceError::InvalidOperation(format!(
                "Request in status {} cannot be edited",
                current.status.label()
            )));
        }

        let db = &*self.db_pool;
        let mut active: RequestActiveModel = current.into();
        if input.estimated_departure.is_some() {
            active.estimated_departure = Set(input.estimated_departure);
        }
        if input.note.is_some() {
            active.note = Set(input.note);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;

        self.emit(Event::DisposalRequestUpdated(id)).await;
        Ok(updated)
    }

    /// Deletes a request. Only drafts are deletable; everything later is
    /// kept as audit history.
    #[instrument(skip(self))]
    pub async fn delete_request(&self, id: Uuid) -> Result<(), ServiceError> {
        let current = self.require_request(id).await?;
        if !current.status.is_deletable() {
            return Err(ServiceError::InvalidOperation(format!(
                "Request in status {} cannot be deleted",
                current.status.label()
            )));
        }

        let db = &*self.db_pool;
        let result = RequestEntity::delete_many()
            .filter(disposal_request::Column::Id.eq(id))
            .filter(disposal_request::Column::Status.eq(DisposalRequestStatus::Draft))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Request status changed concurrently".into(),
            ));
        }

        info!(request_id = %id, "Disposal request deleted");
        self.emit(Event::DisposalRequestDeleted(id)).await;
        Ok(())
    }

    async fn require_request(&self, id: Uuid) -> Result<RequestModel, ServiceError> {
        self.get_request(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Disposal request {} not found", id)))
    }

    fn ensure_transition(
        &self,
        current: &RequestModel,
        next: DisposalRequestStatus,
    ) -> Result<(), ServiceError> {
        if !current.status.can_transition_to(next) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot move request {} from {} to {}",
                current.id,
                current.status.label(),
                next.label()
            )));
        }
        Ok(())
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send disposal request event");
        }
    }
}
