use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a goods issue note fulfilling a sales order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum GoodsIssueNoteStatus {
    #[sea_orm(num_value = 1)]
    Picking = 1,
    #[sea_orm(num_value = 2)]
    Completed = 2,
}

impl From<GoodsIssueNoteStatus> for i16 {
    fn from(status: GoodsIssueNoteStatus) -> i16 {
        status as i16
    }
}

impl TryFrom<i16> for GoodsIssueNoteStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Picking),
            2 => Ok(Self::Completed),
            other => Err(format!("unknown goods issue note status code {}", other)),
        }
    }
}

impl GoodsIssueNoteStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Picking => "Đang lấy hàng",
            Self::Completed => "Hoàn thành",
        }
    }
}

/// The `goods_issue_notes` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "goods_issue_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub note_number: String,

    /// Sales order this outbound note fulfills.
    pub sales_order_code: String,

    pub status: GoodsIssueNoteStatus,

    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::goods_issue_note_detail::Entity")]
    Details,
}

impl Related<super::goods_issue_note_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
