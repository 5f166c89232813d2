pub mod disposal_note;
pub mod disposal_note_detail;
pub mod disposal_request;
pub mod goods_issue_note;
pub mod goods_issue_note_detail;
pub mod pick_allocation;
