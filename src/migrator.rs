#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_products_table::Migration),
            Box::new(m20240101_000002_create_batches_table::Migration),
            Box::new(m20240101_000003_create_inventory_items_table::Migration),
            Box::new(m20240101_000004_create_audit_logs_table::Migration),
            Box::new(m20240101_000005_create_sync_queue_table::Migration),
        ]
    }
}

mod m20240101_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Gtin).string().null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::Manufacturer).string().null())
                        .col(ColumnDef::new(Products::Category).string().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // GTIN is optional but must be unique when present
            manager
                .create_index(
                    Index::create()
                        .name("idx_products_gtin")
                        .table(Products::Table)
                        .col(Products::Gtin)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Gtin,
        Name,
        Description,
        Manufacturer,
        Category,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_batches_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_batches_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Batches::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Batches::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Batches::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Batches::BatchNumber).string().not_null())
                        .col(ColumnDef::new(Batches::ManufacturingDate).date().null())
                        .col(ColumnDef::new(Batches::ExpiryDate).date().not_null())
                        .col(
                            ColumnDef::new(Batches::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Batches::IsExpired)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Batches::PriorityLevel)
                                .small_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Batches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Batches::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_batches_product")
                                .from(Batches::Table, Batches::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // One batch number per product
            manager
                .create_index(
                    Index::create()
                        .name("idx_batches_product_batch_number")
                        .table(Batches::Table)
                        .col(Batches::ProductId)
                        .col(Batches::BatchNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // Default list order and the sweep predicate both hit expiry_date
            manager
                .create_index(
                    Index::create()
                        .name("idx_batches_expiry_date")
                        .table(Batches::Table)
                        .col(Batches::ExpiryDate)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Batches::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Batches {
        Table,
        Id,
        ProductId,
        BatchNumber,
        ManufacturingDate,
        ExpiryDate,
        Quantity,
        IsExpired,
        PriorityLevel,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
    }
}

mod m20240101_000003_create_inventory_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_inventory_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::BatchId).uuid().not_null())
                        .col(ColumnDef::new(InventoryItems::Barcode).string().null())
                        .col(ColumnDef::new(InventoryItems::QrCode).string().null())
                        .col(
                            ColumnDef::new(InventoryItems::Status)
                                .string()
                                .not_null()
                                .default("in_stock"),
                        )
                        .col(ColumnDef::new(InventoryItems::Location).string().null())
                        .col(ColumnDef::new(InventoryItems::Notes).text().null())
                        .col(ColumnDef::new(InventoryItems::ScannedBy).uuid().null())
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_items_batch")
                                .from(InventoryItems::Table, InventoryItems::BatchId)
                                .to(Batches::Table, Batches::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_items_batch_id")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::BatchId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_inventory_items_barcode")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::Barcode)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryItems {
        Table,
        Id,
        BatchId,
        Barcode,
        QrCode,
        Status,
        Location,
        Notes,
        ScannedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Batches {
        Table,
        Id,
    }
}

mod m20240101_000004_create_audit_logs_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_audit_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AuditLogs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AuditLogs::UserId).uuid().null())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityType).string().not_null())
                        .col(ColumnDef::new(AuditLogs::EntityId).string().null())
                        .col(ColumnDef::new(AuditLogs::Changes).json().null())
                        .col(ColumnDef::new(AuditLogs::IpAddress).string().null())
                        .col(
                            ColumnDef::new(AuditLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_audit_logs_entity")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::EntityType)
                        .col(AuditLogs::EntityId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AuditLogs {
        Table,
        Id,
        UserId,
        Action,
        EntityType,
        EntityId,
        Changes,
        IpAddress,
        CreatedAt,
    }
}

mod m20240101_000005_create_sync_queue_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_sync_queue_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SyncQueue::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SyncQueue::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SyncQueue::UserId).uuid().null())
                        .col(ColumnDef::new(SyncQueue::Operation).string().not_null())
                        .col(ColumnDef::new(SyncQueue::EntityType).string().not_null())
                        .col(ColumnDef::new(SyncQueue::EntityData).json().not_null())
                        .col(
                            ColumnDef::new(SyncQueue::SyncStatus)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(SyncQueue::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SyncQueue::ProcessedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sync_queue_user_status")
                        .table(SyncQueue::Table)
                        .col(SyncQueue::UserId)
                        .col(SyncQueue::SyncStatus)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SyncQueue::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SyncQueue {
        Table,
        Id,
        UserId,
        Operation,
        EntityType,
        EntityData,
        SyncStatus,
        CreatedAt,
        ProcessedAt,
    }
}
