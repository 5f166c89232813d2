//! Integration tests for the disposal request approval workflow and the
//! disposal note picking flow behind it.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_request(app: &TestApp, manager: &str, number: &str) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-requests",
            Some(json!({ "request_number": number })),
            Some(manager),
        )
        .await;
    assert_eq!(response.status(), 200, "request creation should succeed");
    let body = response_json(response).await;
    assert!(body["success"].as_bool().unwrap_or(false));
    body["data"].clone()
}

async fn transition(app: &TestApp, token: &str, id: &str, action: &str, body: Option<Value>) -> Value {
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/disposal-requests/{}/{}", id, action),
            body,
            Some(token),
        )
        .await;
    assert_eq!(response.status(), 200, "{} should succeed", action);
    response_json(response).await["data"].clone()
}

fn note_payload(request_id: &str, note_number: &str) -> Value {
    json!({
        "note_number": note_number,
        "disposal_request_id": request_id,
        "details": [{
            "goods_code": "SP-001",
            "goods_name": "Thuốc hết hạn",
            "batch_number": "L2024-07",
            "required_package_quantity": 10,
            "allocations": [
                {
                    "location_code": "A-01",
                    "rack": "R1",
                    "row_index": 1,
                    "column_index": 2,
                    "required_package_quantity": 6
                },
                {
                    "location_code": "A-02",
                    "pallet_code": "PAL-9",
                    "rack": "R1",
                    "row_index": 1,
                    "column_index": 3,
                    "required_package_quantity": 4
                }
            ]
        }]
    })
}

#[tokio::test]
async fn happy_path_runs_from_draft_to_completed() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());
    let staff = app.staff_token(Uuid::new_v4());

    let request = create_request(&app, &manager, "YCX-0001").await;
    assert_eq!(request["status_label"], "Nháp");
    let id = request["id"].as_str().expect("request id").to_string();

    let submitted = transition(&app, &manager, &id, "submit", None).await;
    // Statuses travel as their numeric codes, with the label alongside.
    assert_eq!(submitted["status"], json!(2));
    assert_eq!(submitted["status_label"], "Chờ duyệt");

    let approved = transition(&app, &manager, &id, "approve", None).await;
    assert_eq!(approved["status_label"], "Đã duyệt");
    assert!(approved["approved_by"].as_str().is_some());

    let assignee = Uuid::new_v4();
    let assigned = transition(
        &app,
        &manager,
        &id,
        "assign",
        Some(json!({ "assignee": assignee })),
    )
    .await;
    assert_eq!(assigned["status_label"], "Đã phân công lấy hàng");
    assert_eq!(assigned["assigned_to"], json!(assignee));

    // Staff creates the note, moving the request into Picking.
    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-notes",
            Some(note_payload(&id, "PX-0001")),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 200, "note creation should succeed");
    let note = response_json(response).await["data"].clone();
    assert_eq!(note["status_label"], "Đang lấy hàng");

    let request_now = app
        .request(
            Method::GET,
            &format!("/api/v1/disposal-requests/{}", id),
            None,
            Some(&manager),
        )
        .await;
    let request_now = response_json(request_now).await["data"].clone();
    assert_eq!(request_now["status_label"], "Đang lấy hàng");

    // Confirm every allocation.
    let allocations = note["details"][0]["allocations"]
        .as_array()
        .expect("allocations")
        .clone();
    for allocation in &allocations {
        let alloc_id = allocation["id"].as_str().expect("allocation id");
        let qty = allocation["required_package_quantity"].clone();
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/pick-allocations/{}/confirm", alloc_id),
                Some(json!({ "picked_package_quantity": qty })),
                Some(&staff),
            )
            .await;
        assert_eq!(response.status(), 200, "pick confirmation should succeed");
        let confirmed = response_json(response).await["data"].clone();
        assert_eq!(confirmed["status_label"], "Đã lấy");
    }

    // The detail completed with its last allocation.
    let note_id = note["id"].as_str().expect("note id");
    let note_now = app
        .request(
            Method::GET,
            &format!("/api/v1/disposal-notes/{}", note_id),
            None,
            Some(&staff),
        )
        .await;
    let note_now = response_json(note_now).await["data"].clone();
    assert_eq!(note_now["details"][0]["status_label"], "Hoàn thành");

    // Manager approves the finished note; both documents complete.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/disposal-notes/{}/approve", note_id),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 200, "note approval should succeed");
    let approved_note = response_json(response).await["data"].clone();
    assert_eq!(approved_note["status_label"], "Hoàn thành");

    let request_done = app
        .request(
            Method::GET,
            &format!("/api/v1/disposal-requests/{}", id),
            None,
            Some(&manager),
        )
        .await;
    let request_done = response_json(request_done).await["data"].clone();
    assert_eq!(request_done["status_label"], "Hoàn thành");
}

#[tokio::test]
async fn rejection_sets_reason_and_resubmission_clears_it() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());

    let request = create_request(&app, &manager, "YCX-0002").await;
    let id = request["id"].as_str().expect("request id").to_string();
    transition(&app, &manager, &id, "submit", None).await;

    // Empty reason is refused.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/disposal-requests/{}/reject", id),
            Some(json!({ "reason": "   " })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 400);

    let rejected = transition(
        &app,
        &manager,
        &id,
        "reject",
        Some(json!({ "reason": "Thiếu chứng từ" })),
    )
    .await;
    assert_eq!(rejected["status_label"], "Từ chối");
    assert_eq!(rejected["rejection_reason"], "Thiếu chứng từ");

    // Rejected requests stay editable.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/disposal-requests/{}", id),
            Some(json!({ "note": "đã bổ sung chứng từ" })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 200);

    // Resubmission returns to pending approval and clears the reason.
    let resubmitted = transition(&app, &manager, &id, "submit", None).await;
    assert_eq!(resubmitted["status_label"], "Chờ duyệt");
    assert!(resubmitted["rejection_reason"].is_null());
}

#[tokio::test]
async fn update_and_delete_windows_are_enforced() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());

    let request = create_request(&app, &manager, "YCX-0003").await;
    let id = request["id"].as_str().expect("request id").to_string();
    transition(&app, &manager, &id, "submit", None).await;

    // Pending approval is neither editable nor deletable.
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/disposal-requests/{}", id),
            Some(json!({ "note": "too late" })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/disposal-requests/{}", id),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 400);

    // A draft deletes cleanly.
    let draft = create_request(&app, &manager, "YCX-0004").await;
    let draft_id = draft["id"].as_str().expect("request id");
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/disposal-requests/{}", draft_id),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/disposal-requests/{}", draft_id),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn approval_rolls_back_when_a_line_was_reopened() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());
    let staff = app.staff_token(Uuid::new_v4());

    let request = create_request(&app, &manager, "YCX-0009").await;
    let id = request["id"].as_str().expect("request id").to_string();
    transition(&app, &manager, &id, "submit", None).await;
    transition(&app, &manager, &id, "approve", None).await;
    transition(
        &app,
        &manager,
        &id,
        "assign",
        Some(json!({ "assignee": Uuid::new_v4() })),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-notes",
            Some(note_payload(&id, "PX-0009")),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 200);
    let note = response_json(response).await["data"].clone();
    let note_id = note["id"].as_str().expect("note id").to_string();
    let allocations = note["details"][0]["allocations"]
        .as_array()
        .expect("allocations")
        .clone();
    for allocation in &allocations {
        let alloc_id = allocation["id"].as_str().expect("allocation id");
        let qty = allocation["required_package_quantity"].clone();
        let response = app
            .request(
                Method::POST,
                &format!("/api/v1/pick-allocations/{}/confirm", alloc_id),
                Some(json!({ "picked_package_quantity": qty })),
                Some(&staff),
            )
            .await;
        assert_eq!(response.status(), 200);
    }

    // Staff reopens the picked line before the manager approves.
    let detail_id = note["details"][0]["id"].as_str().expect("detail id");
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/pick-allocations/details/{}/re-pick", detail_id),
            Some(json!({})),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/disposal-notes/{}/approve", note_id),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 400, "approval must see the reopened line");

    // The failed approval rolled back; the note is still open for picking.
    let note_now = app
        .request(
            Method::GET,
            &format!("/api/v1/disposal-notes/{}", note_id),
            None,
            Some(&staff),
        )
        .await;
    let note_now = response_json(note_now).await["data"].clone();
    assert_eq!(note_now["status_label"], "Đang lấy hàng");
    assert_eq!(note_now["details"][0]["status_label"], "Đang lấy hàng");
}

#[tokio::test]
async fn duplicate_request_number_conflicts() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());

    create_request(&app, &manager, "YCX-0005").await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-requests",
            Some(json!({ "request_number": "YCX-0005" })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn whitespace_only_document_fields_are_rejected() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());
    let staff = app.staff_token(Uuid::new_v4());

    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-requests",
            Some(json!({ "request_number": "   " })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 400, "blank request number must be refused");

    let request = create_request(&app, &manager, "YCX-0010").await;
    let id = request["id"].as_str().expect("request id").to_string();
    transition(&app, &manager, &id, "submit", None).await;
    transition(&app, &manager, &id, "approve", None).await;
    transition(
        &app,
        &manager,
        &id,
        "assign",
        Some(json!({ "assignee": Uuid::new_v4() })),
    )
    .await;

    let mut payload = note_payload(&id, "PX-0010");
    payload["details"][0]["goods_code"] = json!("  ");
    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-notes",
            Some(payload),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 400, "blank goods code must be refused");
}

#[tokio::test]
async fn double_approve_loses_exactly_once() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());

    let request = create_request(&app, &manager, "YCX-0006").await;
    let id = request["id"].as_str().expect("request id").to_string();
    transition(&app, &manager, &id, "submit", None).await;

    let request_id = Uuid::parse_str(&id).expect("uuid");
    let service = app.state.services.disposal_requests.clone();
    let (first, second) = tokio::join!(
        service.approve_request(request_id, Uuid::new_v4()),
        service.approve_request(request_id, Uuid::new_v4()),
    );
    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1, "exactly one approval may win");
}

#[tokio::test]
async fn role_gates_reject_unauthorized_callers() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());
    let staff = app.staff_token(Uuid::new_v4());

    // No token at all.
    let response = app
        .request(Method::GET, "/api/v1/disposal-requests", None, None)
        .await;
    assert_eq!(response.status(), 401);

    // Staff cannot create requests.
    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-requests",
            Some(json!({ "request_number": "YCX-0007" })),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 403);

    // Managers cannot create notes.
    let request = create_request(&app, &manager, "YCX-0008").await;
    let id = request["id"].as_str().expect("request id").to_string();
    transition(&app, &manager, &id, "submit", None).await;
    transition(&app, &manager, &id, "approve", None).await;
    transition(
        &app,
        &manager,
        &id,
        "assign",
        Some(json!({ "assignee": Uuid::new_v4() })),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-notes",
            Some(note_payload(&id, "PX-0008")),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn note_requires_assigned_request_and_matching_allocation_sums() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());
    let staff = app.staff_token(Uuid::new_v4());

    // Request still in draft: note creation is refused.
    let request = create_request(&app, &manager, "YCX-0009").await;
    let id = request["id"].as_str().expect("request id").to_string();
    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-notes",
            Some(note_payload(&id, "PX-0009")),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Allocation quantities must cover the line exactly.
    transition(&app, &manager, &id, "submit", None).await;
    transition(&app, &manager, &id, "approve", None).await;
    transition(
        &app,
        &manager,
        &id,
        "assign",
        Some(json!({ "assignee": Uuid::new_v4() })),
    )
    .await;

    let mut payload = note_payload(&id, "PX-0010");
    payload["details"][0]["required_package_quantity"] = json!(11);
    let response = app
        .request(
            Method::POST,
            "/api/v1/disposal-notes",
            Some(payload),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn list_filters_are_fail_closed_per_role() {
    let app = TestApp::new().await;
    let manager = app.manager_token(Uuid::new_v4());
    let staff = app.staff_token(Uuid::new_v4());

    // Staff may filter by creator and assignee, not by approver.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/disposal-requests?created_by={}", Uuid::new_v4()),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/disposal-requests?approved_by={}", Uuid::new_v4()),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 403);

    // Managers may use every filter.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/disposal-requests?approved_by={}", Uuid::new_v4()),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 200);
}
