use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-line status of a disposal note detail. A detail completes when its
/// last pick allocation is confirmed; re-pick reverts it to Picking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum DetailStatus {
    #[sea_orm(num_value = 1)]
    Picking = 1,
    #[sea_orm(num_value = 2)]
    Completed = 2,
}

impl From<DetailStatus> for i16 {
    fn from(status: DetailStatus) -> i16 {
        status as i16
    }
}

impl TryFrom<i16> for DetailStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Picking),
            2 => Ok(Self::Completed),
            other => Err(format!("unknown note detail status code {}", other)),
        }
    }
}

impl DetailStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Picking => "Đang lấy hàng",
            Self::Completed => "Hoàn thành",
        }
    }
}

/// The `disposal_note_details` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "disposal_note_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub disposal_note_id: Uuid,

    pub goods_code: String,
    pub goods_name: String,
    pub batch_number: Option<String>,

    /// Total packages this line must pick across its allocations.
    pub required_package_quantity: i32,

    pub status: DetailStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::disposal_note::Entity",
        from = "Column::DisposalNoteId",
        to = "super::disposal_note::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    DisposalNote,

    #[sea_orm(has_many = "super::pick_allocation::Entity")]
    PickAllocations,
}

impl Related<super::disposal_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisposalNote.def()
    }
}

impl Related<super::pick_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PickAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
