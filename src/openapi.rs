use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehouse API",
        version = "1.0.0",
        description = r#"
# Warehouse Disposal and Goods Issue API

Backend for warehouse outbound workflows: disposal requests moving through
an approval state machine, the disposal and goods issue notes that execute
them, and scan-confirmed pick allocations.

## Authentication

All workflow endpoints require a JWT bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Route groups are gated on the `warehouse_manager`, `warehouse_staff` and
`accountant` roles carried in the token.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).
        "#
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development")
    ),
    tags(
        (name = "Disposal Requests", description = "Disposal request approval workflow"),
        (name = "Disposal Notes", description = "Disposal note picking and approval"),
        (name = "Goods Issue Notes", description = "Sales order goods issue picking"),
        (name = "Pick Allocations", description = "Scan lookup and pick confirmation"),
        (name = "Health", description = "Health check endpoints")
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            // Disposal request types
            crate::handlers::disposal_requests::DisposalRequestSummary,
            crate::handlers::disposal_requests::RejectRequestBody,
            crate::handlers::disposal_requests::AssignRequestBody,
            crate::services::disposal_requests::CreateDisposalRequestInput,
            crate::services::disposal_requests::UpdateDisposalRequestInput,
            crate::models::disposal_request::DisposalRequestStatus,

            // Note types
            crate::handlers::disposal_notes::DisposalNoteSummary,
            crate::handlers::goods_issue_notes::GoodsIssueNoteSummary,
            crate::services::disposal_notes::CreateDisposalNoteInput,
            crate::services::disposal_notes::CreateNoteDetailInput,
            crate::services::disposal_notes::CreateAllocationInput,
            crate::services::disposal_notes::DisposalNoteWithDetails,
            crate::services::goods_issue_notes::CreateGoodsIssueNoteInput,
            crate::services::goods_issue_notes::CreateGoodsIssueDetailInput,
            crate::services::goods_issue_notes::GoodsIssueNoteWithDetails,
            crate::models::disposal_note::DisposalNoteStatus,
            crate::models::disposal_note_detail::DetailStatus,
            crate::models::goods_issue_note::GoodsIssueNoteStatus,

            // Picking types
            crate::handlers::pick_allocations::AllocationView,
            crate::handlers::pick_allocations::ScanLookupQuery,
            crate::services::pick_allocations::ConfirmPickInput,
            crate::services::pick_allocations::RePickInput,
            crate::models::pick_allocation::PickAllocationStatus,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).expect("serialize openapi");
        assert!(json.contains("Warehouse API"));
        assert!(json.contains("DisposalRequestStatus"));
    }
}
