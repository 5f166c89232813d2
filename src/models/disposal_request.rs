use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle states of a disposal request. The numeric codes are the wire
/// and storage representation; unknown codes fail to deserialize rather
/// than falling back to a default.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum DisposalRequestStatus {
    #[sea_orm(num_value = 1)]
    Draft = 1,
    #[sea_orm(num_value = 2)]
    PendingApproval = 2,
    #[sea_orm(num_value = 3)]
    Rejected = 3,
    #[sea_orm(num_value = 4)]
    Approved = 4,
    #[sea_orm(num_value = 5)]
    AssignedForPicking = 5,
    #[sea_orm(num_value = 6)]
    Picking = 6,
    #[sea_orm(num_value = 7)]
    Completed = 7,
}

impl From<DisposalRequestStatus> for i16 {
    fn from(status: DisposalRequestStatus) -> i16 {
        status as i16
    }
}

impl TryFrom<i16> for DisposalRequestStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Draft),
            2 => Ok(Self::PendingApproval),
            3 => Ok(Self::Rejected),
            4 => Ok(Self::Approved),
            5 => Ok(Self::AssignedForPicking),
            6 => Ok(Self::Picking),
            7 => Ok(Self::Completed),
            other => Err(format!("unknown disposal request status code {}", other)),
        }
    }
}

impl DisposalRequestStatus {
    /// Display label shown to operators.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Nháp",
            Self::PendingApproval => "Chờ duyệt",
            Self::Rejected => "Từ chối",
            Self::Approved => "Đã duyệt",
            Self::AssignedForPicking => "Đã phân công lấy hàng",
            Self::Picking => "Đang lấy hàng",
            Self::Completed => "Hoàn thành",
        }
    }

    /// Whether the request can still be edited by its creator.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }

    /// Whether the request can be deleted. Only drafts are deletable; every
    /// later state is append-only history.
    pub fn is_deletable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Legal transition table. Rejected requests re-enter the approval loop
    /// through resubmission.
    pub fn can_transition_to(&self, next: DisposalRequestStatus) -> bool {
        use DisposalRequestStatus::*;
        matches!(
            (self, next),
            (Draft, PendingApproval)
                | (Rejected, PendingApproval)
                | (PendingApproval, Approved)
                | (PendingApproval, Rejected)
                | (Approved, AssignedForPicking)
                | (AssignedForPicking, Picking)
                | (Picking, Completed)
        )
    }
}

/// The `disposal_requests` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "disposal_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-facing document number, unique per request.
    pub request_number: String,

    pub status: DisposalRequestStatus,

    pub created_by: Uuid,

    /// Populated once the approve transition has occurred.
    pub approved_by: Option<Uuid>,

    /// Populated once the assign-for-picking transition has occurred.
    pub assigned_to: Option<Uuid>,

    pub estimated_departure: Option<DateTime<Utc>>,

    /// Present iff status is Rejected; cleared on resubmission.
    pub rejection_reason: Option<String>,

    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A request owns zero-or-one disposal note.
    #[sea_orm(has_many = "super::disposal_note::Entity")]
    DisposalNotes,
}

impl Related<super::disposal_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisposalNotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Invariant check: a rejection reason is present exactly when the
    /// request is in the Rejected state.
    pub fn rejection_reason_consistent(&self) -> bool {
        let has_reason = self
            .rejection_reason
            .as_deref()
            .map_or(false, |r| !r.trim().is_empty());
        has_reason == (self.status == DisposalRequestStatus::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        use DisposalRequestStatus::*;
        let path = [
            Draft,
            PendingApproval,
            Approved,
            AssignedForPicking,
            Picking,
            Completed,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{:?} -> {:?} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn rejection_and_resubmission_loop() {
        use DisposalRequestStatus::*;
        assert!(PendingApproval.can_transition_to(Rejected));
        assert!(Rejected.can_transition_to(PendingApproval));
        // A rejected request cannot jump straight to approval.
        assert!(!Rejected.can_transition_to(Approved));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        use DisposalRequestStatus::*;
        assert!(!Draft.can_transition_to(Approved));
        assert!(!Draft.can_transition_to(Completed));
        assert!(!Approved.can_transition_to(PendingApproval));
        assert!(!Completed.can_transition_to(Draft));
        assert!(!Picking.can_transition_to(AssignedForPicking));
    }

    #[test]
    fn edit_and_delete_windows() {
        use DisposalRequestStatus::*;
        assert!(Draft.is_editable());
        assert!(Rejected.is_editable());
        assert!(!PendingApproval.is_editable());
        assert!(!Approved.is_editable());

        assert!(Draft.is_deletable());
        assert!(!Rejected.is_deletable());
        assert!(!Completed.is_deletable());
    }

    #[test]
    fn labels_cover_every_status() {
        use DisposalRequestStatus::*;
        assert_eq!(Draft.label(), "Nháp");
        assert_eq!(PendingApproval.label(), "Chờ duyệt");
        assert_eq!(Rejected.label(), "Từ chối");
        assert_eq!(Approved.label(), "Đã duyệt");
        assert_eq!(AssignedForPicking.label(), "Đã phân công lấy hàng");
        assert_eq!(Picking.label(), "Đang lấy hàng");
        assert_eq!(Completed.label(), "Hoàn thành");
    }

    #[test]
    fn status_serializes_as_numeric_code() {
        use DisposalRequestStatus::*;
        assert_eq!(
            serde_json::to_value(PendingApproval).unwrap(),
            serde_json::json!(2)
        );
        assert_eq!(
            serde_json::from_value::<DisposalRequestStatus>(serde_json::json!(3)).unwrap(),
            Rejected
        );
        // Unknown codes and variant names are both rejected.
        assert!(serde_json::from_value::<DisposalRequestStatus>(serde_json::json!(8)).is_err());
        assert!(
            serde_json::from_value::<DisposalRequestStatus>(serde_json::json!("Draft")).is_err()
        );
    }

    #[test]
    fn rejection_reason_invariant() {
        let now = Utc::now();
        let mut request = Model {
            id: Uuid::new_v4(),
            request_number: "DR-0001".into(),
            status: DisposalRequestStatus::Draft,
            created_by: Uuid::new_v4(),
            approved_by: None,
            assigned_to: None,
            estimated_departure: None,
            rejection_reason: None,
            note: None,
            created_at: now,
            updated_at: now,
        };
        assert!(request.rejection_reason_consistent());

        request.status = DisposalRequestStatus::Rejected;
        assert!(!request.rejection_reason_consistent());

        request.rejection_reason = Some("Hàng chưa hết hạn".into());
        assert!(request.rejection_reason_consistent());

        request.status = DisposalRequestStatus::PendingApproval;
        assert!(!request.rejection_reason_consistent());
    }
}
