use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_disposal_requests_table::Migration),
            Box::new(m20240101_000002_create_disposal_notes_tables::Migration),
            Box::new(m20240101_000003_create_goods_issue_tables::Migration),
            Box::new(m20240101_000004_create_pick_allocations_table::Migration),
        ]
    }
}

mod m20240101_000001_create_disposal_requests_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_disposal_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DisposalRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DisposalRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalRequests::RequestNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(DisposalRequests::Status)
                                .small_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DisposalRequests::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(DisposalRequests::ApprovedBy).uuid().null())
                        .col(ColumnDef::new(DisposalRequests::AssignedTo).uuid().null())
                        .col(
                            ColumnDef::new(DisposalRequests::EstimatedDeparture)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DisposalRequests::RejectionReason)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(DisposalRequests::Note).string().null())
                        .col(
                            ColumnDef::new(DisposalRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_disposal_requests_status")
                        .table(DisposalRequests::Table)
                        .col(DisposalRequests::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_disposal_requests_created_by")
                        .table(DisposalRequests::Table)
                        .col(DisposalRequests::CreatedBy)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DisposalRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DisposalRequests {
        Table,
        Id,
        RequestNumber,
        Status,
        CreatedBy,
        ApprovedBy,
        AssignedTo,
        EstimatedDeparture,
        RejectionReason,
        Note,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_disposal_notes_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_disposal_notes_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DisposalNotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DisposalNotes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNotes::NoteNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(DisposalNotes::DisposalRequestId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(DisposalNotes::Status)
                                .small_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DisposalNotes::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(DisposalNotes::ApprovedBy).uuid().null())
                        .col(
                            ColumnDef::new(DisposalNotes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNotes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_disposal_notes_request")
                                .from(DisposalNotes::Table, DisposalNotes::DisposalRequestId)
                                .to(DisposalRequests::Table, DisposalRequests::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DisposalNoteDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DisposalNoteDetails::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNoteDetails::DisposalNoteId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNoteDetails::GoodsCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNoteDetails::GoodsName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNoteDetails::BatchNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNoteDetails::RequiredPackageQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNoteDetails::Status)
                                .small_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNoteDetails::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisposalNoteDetails::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_disposal_note_details_note")
                                .from(
                                    DisposalNoteDetails::Table,
                                    DisposalNoteDetails::DisposalNoteId,
                                )
                                .to(DisposalNotes::Table, DisposalNotes::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_disposal_note_details_note_id")
                        .table(DisposalNoteDetails::Table)
                        .col(DisposalNoteDetails::DisposalNoteId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DisposalNoteDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DisposalNotes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DisposalRequests {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum DisposalNotes {
        Table,
        Id,
        NoteNumber,
        DisposalRequestId,
        Status,
        CreatedBy,
        ApprovedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DisposalNoteDetails {
        Table,
        Id,
        DisposalNoteId,
        GoodsCode,
        GoodsName,
        BatchNumber,
        RequiredPackageQuantity,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_goods_issue_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_goods_issue_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GoodsIssueNotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsIssueNotes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNotes::NoteNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNotes::SalesOrderCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNotes::Status)
                                .small_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsIssueNotes::CreatedBy).uuid().not_null())
                        .col(ColumnDef::new(GoodsIssueNotes::ApprovedBy).uuid().null())
                        .col(
                            ColumnDef::new(GoodsIssueNotes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNotes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(GoodsIssueNoteDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::GoodsIssueNoteId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::GoodsCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::GoodsName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::BatchNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::RequiredPackageQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::Status)
                                .small_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsIssueNoteDetails::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_goods_issue_note_details_note")
                                .from(
                                    GoodsIssueNoteDetails::Table,
                                    GoodsIssueNoteDetails::GoodsIssueNoteId,
                                )
                                .to(GoodsIssueNotes::Table, GoodsIssueNotes::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_goods_issue_note_details_note_id")
                        .table(GoodsIssueNoteDetails::Table)
                        .col(GoodsIssueNoteDetails::GoodsIssueNoteId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GoodsIssueNoteDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(GoodsIssueNotes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum GoodsIssueNotes {
        Table,
        Id,
        NoteNumber,
        SalesOrderCode,
        Status,
        CreatedBy,
        ApprovedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum GoodsIssueNoteDetails {
        Table,
        Id,
        GoodsIssueNoteId,
        GoodsCode,
        GoodsName,
        BatchNumber,
        RequiredPackageQuantity,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_pick_allocations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_pick_allocations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PickAllocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PickAllocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::DisposalNoteDetailId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::GoodsIssueNoteDetailId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::LocationCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::PalletCode)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(PickAllocations::Rack).string().not_null())
                        .col(
                            ColumnDef::new(PickAllocations::RowIndex)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::ColumnIndex)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::RequiredPackageQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::PickedPackageQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::Status)
                                .small_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickAllocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pick_allocations_disposal_detail")
                        .table(PickAllocations::Table)
                        .col(PickAllocations::DisposalNoteDetailId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pick_allocations_issue_detail")
                        .table(PickAllocations::Table)
                        .col(PickAllocations::GoodsIssueNoteDetailId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pick_allocations_location_code")
                        .table(PickAllocations::Table)
                        .col(PickAllocations::LocationCode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PickAllocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PickAllocations {
        Table,
        Id,
        DisposalNoteDetailId,
        GoodsIssueNoteDetailId,
        LocationCode,
        PalletCode,
        Rack,
        RowIndex,
        ColumnIndex,
        RequiredPackageQuantity,
        PickedPackageQuantity,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}
