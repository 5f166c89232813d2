use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a disposal note. Created in Picking once the parent request
/// is assigned; Completed when the manager approves the finished pick.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum DisposalNoteStatus {
    #[sea_orm(num_value = 1)]
    Picking = 1,
    #[sea_orm(num_value = 2)]
    Completed = 2,
}

impl From<DisposalNoteStatus> for i16 {
    fn from(status: DisposalNoteStatus) -> i16 {
        status as i16
    }
}

impl TryFrom<i16> for DisposalNoteStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Picking),
            2 => Ok(Self::Completed),
            other => Err(format!("unknown disposal note status code {}", other)),
        }
    }
}

impl DisposalNoteStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Picking => "Đang lấy hàng",
            Self::Completed => "Hoàn thành",
        }
    }
}

/// The `disposal_notes` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "disposal_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub note_number: String,

    /// The approved request this note executes; at most one note per request.
    pub disposal_request_id: Uuid,

    pub status: DisposalNoteStatus,

    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::disposal_request::Entity",
        from = "Column::DisposalRequestId",
        to = "super::disposal_request::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    DisposalRequest,

    #[sea_orm(has_many = "super::disposal_note_detail::Entity")]
    Details,
}

impl Related<super::disposal_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisposalRequest.def()
    }
}

impl Related<super::disposal_note_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
