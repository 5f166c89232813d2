//! Integration tests for goods issue note picking: scan lookup, pick
//! confirmation, the picked-quantity invariant, and re-pick rules.

mod common;

use axum::http::Method;
use common::{response_json, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

fn note_payload(note_number: &str) -> Value {
    json!({
        "note_number": note_number,
        "sales_order_code": "SO-2024-001",
        "details": [{
            "goods_code": "SP-100",
            "goods_name": "Hàng xuất bán",
            "batch_number": "L2024-11",
            "required_package_quantity": 8,
            "allocations": [
                {
                    "location_code": "A-01",
                    "rack": "R2",
                    "row_index": 3,
                    "column_index": 1,
                    "required_package_quantity": 5
                },
                {
                    "location_code": "B-07",
                    "pallet_code": "PAL-42",
                    "rack": "R2",
                    "row_index": 3,
                    "column_index": 4,
                    "required_package_quantity": 3
                }
            ]
        }]
    })
}

async fn create_note(app: &TestApp, staff: &str, number: &str) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/goods-issue-notes",
            Some(note_payload(number)),
            Some(staff),
        )
        .await;
    assert_eq!(response.status(), 200, "note creation should succeed");
    let body = response_json(response).await;
    assert!(body["success"].as_bool().unwrap_or(false));
    body["data"].clone()
}

async fn confirm(app: &TestApp, staff: &str, allocation_id: &str, qty: i64) -> axum::response::Response {
    app.request(
        Method::POST,
        &format!("/api/v1/pick-allocations/{}/confirm", allocation_id),
        Some(json!({ "picked_package_quantity": qty })),
        Some(staff),
    )
    .await
}

#[tokio::test]
async fn scan_lookup_matches_codes_case_insensitively() {
    let app = TestApp::new().await;
    let staff = app.staff_token(Uuid::new_v4());

    let note = create_note(&app, &staff, "PXB-0001").await;
    let detail_id = note["details"][0]["id"].as_str().expect("detail id");

    // Lowercase scan of an uppercase location code.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/pick-allocations/details/{}/scan?code=a-01", detail_id),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 200);
    let hit = response_json(response).await["data"].clone();
    assert_eq!(hit["location_code"], "A-01");

    // Pallet codes participate in the lookup too.
    let response = app
        .request(
            Method::GET,
            &format!(
                "/api/v1/pick-allocations/details/{}/scan?code=pal-42",
                detail_id
            ),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 200);
    let hit = response_json(response).await["data"].clone();
    assert_eq!(hit["pallet_code"], "PAL-42");

    // Prefixes are not matches.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/pick-allocations/details/{}/scan?code=a-0", detail_id),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn confirm_pick_enforces_quantity_invariant_and_completes_detail() {
    let app = TestApp::new().await;
    let staff = app.staff_token(Uuid::new_v4());
    let manager = app.manager_token(Uuid::new_v4());

    let note = create_note(&app, &staff, "PXB-0002").await;
    let note_id = note["id"].as_str().expect("note id");
    let detail = &note["details"][0];
    let first = detail["allocations"][0]["id"].as_str().expect("alloc id");
    let second = detail["allocations"][1]["id"].as_str().expect("alloc id");

    // Completing the note before picking is refused.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/goods-issue-notes/{}/complete", note_id),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Non-positive quantities are refused.
    let response = confirm(&app, &staff, first, 0).await;
    assert_eq!(response.status(), 400);

    let response = confirm(&app, &staff, first, 5).await;
    assert_eq!(response.status(), 200);

    // A second confirm on the same allocation is refused.
    let response = confirm(&app, &staff, first, 1).await;
    assert_eq!(response.status(), 400);

    // Overshooting the line requirement (5 already picked, 8 required) fails.
    let response = confirm(&app, &staff, second, 4).await;
    assert_eq!(response.status(), 400);

    let response = confirm(&app, &staff, second, 3).await;
    assert_eq!(response.status(), 200);

    // Last confirmation completed the detail line.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/goods-issue-notes/{}", note_id),
            None,
            Some(&staff),
        )
        .await;
    let body = response_json(response).await["data"].clone();
    assert_eq!(body["details"][0]["status_label"], "Hoàn thành");

    // Manager completes the note.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/goods-issue-notes/{}/complete", note_id),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 200);
    let completed = response_json(response).await["data"].clone();
    assert_eq!(completed["status_label"], "Hoàn thành");
    assert!(completed["approved_by"].as_str().is_some());
}

#[tokio::test]
async fn re_pick_is_refused_once_the_note_is_completed() {
    let app = TestApp::new().await;
    let staff = app.staff_token(Uuid::new_v4());
    let manager = app.manager_token(Uuid::new_v4());

    let note = create_note(&app, &staff, "PXB-0007").await;
    let note_id = note["id"].as_str().expect("note id");
    let detail = &note["details"][0];
    let detail_id = detail["id"].as_str().expect("detail id").to_string();
    for allocation in detail["allocations"].as_array().expect("allocations") {
        let alloc_id = allocation["id"].as_str().expect("alloc id");
        let qty = allocation["required_package_quantity"].as_i64().expect("qty");
        let response = confirm(&app, &staff, alloc_id, qty).await;
        assert_eq!(response.status(), 200);
    }

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/goods-issue-notes/{}/complete", note_id),
            None,
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 200);

    // The completed note no longer accepts a re-pick.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/pick-allocations/details/{}/re-pick", detail_id),
            Some(json!({ "reason": "Kiểm lại số lượng" })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Its allocations keep their picked state.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/pick-allocations/details/{}", detail_id),
            None,
            Some(&staff),
        )
        .await;
    let allocations = response_json(response).await["data"].clone();
    for allocation in allocations.as_array().expect("allocations") {
        assert_eq!(allocation["status_label"], "Đã lấy");
    }
}

#[tokio::test]
async fn re_pick_requires_reason_for_managers_but_not_staff() {
    let app = TestApp::new().await;
    let staff = app.staff_token(Uuid::new_v4());
    let manager = app.manager_token(Uuid::new_v4());

    let note = create_note(&app, &staff, "PXB-0003").await;
    let detail = &note["details"][0];
    let detail_id = detail["id"].as_str().expect("detail id");
    let first = detail["allocations"][0]["id"].as_str().expect("alloc id");
    let second = detail["allocations"][1]["id"].as_str().expect("alloc id");

    assert_eq!(confirm(&app, &staff, first, 5).await.status(), 200);
    assert_eq!(confirm(&app, &staff, second, 3).await.status(), 200);

    // Manager without a reason is refused.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/pick-allocations/details/{}/re-pick", detail_id),
            Some(json!({})),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Manager with a reason succeeds.
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/pick-allocations/details/{}/re-pick", detail_id),
            Some(json!({ "reason": "Sai lô hàng" })),
            Some(&manager),
        )
        .await;
    assert_eq!(response.status(), 200);

    // Everything is pending again with picked quantities cleared.
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/pick-allocations/details/{}", detail_id),
            None,
            Some(&staff),
        )
        .await;
    let allocations = response_json(response).await["data"].clone();
    for allocation in allocations.as_array().expect("allocations") {
        assert_eq!(allocation["status_label"], "Chờ lấy");
        assert_eq!(allocation["picked_package_quantity"], 0);
    }

    // Staff may re-pick without giving a reason.
    assert_eq!(confirm(&app, &staff, first, 5).await.status(), 200);
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/pick-allocations/details/{}/re-pick", detail_id),
            Some(json!({})),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn allocation_sums_must_cover_each_line() {
    let app = TestApp::new().await;
    let staff = app.staff_token(Uuid::new_v4());

    let mut payload = note_payload("PXB-0004");
    payload["details"][0]["required_package_quantity"] = json!(9);
    let response = app
        .request(
            Method::POST,
            "/api/v1/goods-issue-notes",
            Some(payload),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn duplicate_note_number_conflicts() {
    let app = TestApp::new().await;
    let staff = app.staff_token(Uuid::new_v4());

    create_note(&app, &staff, "PXB-0005").await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/goods-issue-notes",
            Some(note_payload("PXB-0005")),
            Some(&staff),
        )
        .await;
    assert_eq!(response.status(), 409);
}
