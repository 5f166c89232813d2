use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use super::disposal_note_detail::DetailStatus;

/// The `goods_issue_note_details` table. Line statuses reuse the shared
/// detail status set (Picking, Completed).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "goods_issue_note_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub goods_issue_note_id: Uuid,

    pub goods_code: String,
    pub goods_name: String,
    pub batch_number: Option<String>,

    pub required_package_quantity: i32,

    pub status: DetailStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goods_issue_note::Entity",
        from = "Column::GoodsIssueNoteId",
        to = "super::goods_issue_note::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    GoodsIssueNote,

    #[sea_orm(has_many = "super::pick_allocation::Entity")]
    PickAllocations,
}

impl Related<super::goods_issue_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoodsIssueNote.def()
    }
}

impl Related<super::pick_allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PickAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
