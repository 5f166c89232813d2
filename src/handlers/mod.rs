use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        disposal_notes::DisposalNoteService, disposal_requests::DisposalRequestService,
        goods_issue_notes::GoodsIssueNoteService, pick_allocations::PickAllocationService,
    },
};
use std::sync::Arc;

pub mod disposal_notes;
pub mod disposal_requests;
pub mod goods_issue_notes;
pub mod pick_allocations;

/// Shared service container handed to every handler through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub disposal_requests: Arc<DisposalRequestService>,
    pub disposal_notes: Arc<DisposalNoteService>,
    pub goods_issue_notes: Arc<GoodsIssueNoteService>,
    pub pick_allocations: Arc<PickAllocationService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            disposal_requests: Arc::new(DisposalRequestService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            disposal_notes: Arc::new(DisposalNoteService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            goods_issue_notes: Arc::new(GoodsIssueNoteService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            pick_allocations: Arc::new(PickAllocationService::new(db_pool, event_sender)),
        }
    }
}
