use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Two-state lifecycle of a pick allocation, nested inside the parent
/// document's state machine. The only forward transition is the staff
/// scan-confirm; re-pick resets a Picked allocation back to Pending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum PickAllocationStatus {
    #[sea_orm(num_value = 1)]
    Pending = 1,
    #[sea_orm(num_value = 2)]
    Picked = 2,
}

impl From<PickAllocationStatus> for i16 {
    fn from(status: PickAllocationStatus) -> i16 {
        status as i16
    }
}

impl TryFrom<i16> for PickAllocationStatus {
    type Error = String;

    fn try_from(code: i16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Picked),
            other => Err(format!("unknown pick allocation status code {}", other)),
        }
    }
}

impl PickAllocationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Chờ lấy",
            Self::Picked => "Đã lấy",
        }
    }
}

/// The `pick_allocations` table. Each allocation belongs to exactly one
/// note detail: either a disposal note detail or a goods issue note detail.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "pick_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub disposal_note_detail_id: Option<Uuid>,
    pub goods_issue_note_detail_id: Option<Uuid>,

    /// Scannable warehouse location code, e.g. "A-01".
    pub location_code: String,

    /// Scannable pallet code when the pick targets a specific pallet.
    pub pallet_code: Option<String>,

    pub rack: String,
    pub row_index: i32,
    pub column_index: i32,

    pub required_package_quantity: i32,
    pub picked_package_quantity: i32,

    pub status: PickAllocationStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::disposal_note_detail::Entity",
        from = "Column::DisposalNoteDetailId",
        to = "super::disposal_note_detail::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    DisposalNoteDetail,

    #[sea_orm(
        belongs_to = "super::goods_issue_note_detail::Entity",
        from = "Column::GoodsIssueNoteDetailId",
        to = "super::goods_issue_note_detail::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    GoodsIssueNoteDetail,
}

impl Related<super::disposal_note_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DisposalNoteDetail.def()
    }
}

impl Related<super::goods_issue_note_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GoodsIssueNoteDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Case-insensitive exact match of a scanned code against this
    /// allocation's location or pallet code.
    pub fn matches_code(&self, code: &str) -> bool {
        if self.location_code.eq_ignore_ascii_case(code) {
            return true;
        }
        self.pallet_code
            .as_deref()
            .map_or(false, |pallet| pallet.eq_ignore_ascii_case(code))
    }

    /// Invariant check: exactly one parent detail reference is set.
    pub fn has_single_parent(&self) -> bool {
        self.disposal_note_detail_id.is_some() != self.goods_issue_note_detail_id.is_some()
    }
}
