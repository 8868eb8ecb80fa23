use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_catalog_tables::Migration),
            Box::new(m20250101_000002_create_document_tables::Migration),
            Box::new(m20250101_000003_create_history_tables::Migration),
        ]
    }
}

mod m20250101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Suppliers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Suppliers::AccountId).uuid().not_null())
                        .col(ColumnDef::new(Suppliers::Code).string().not_null())
                        .col(ColumnDef::new(Suppliers::Rif).string().not_null())
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::ContactName).string().null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Phone).string().null())
                        .col(ColumnDef::new(Suppliers::Address).text().null())
                        .col(
                            ColumnDef::new(Suppliers::PaymentTerms)
                                .string()
                                .not_null()
                                .default("Contado"),
                        )
                        .col(ColumnDef::new(Suppliers::CreditDays).integer().null())
                        .col(ColumnDef::new(Suppliers::CustomPaymentTerms).text().null())
                        .col(
                            ColumnDef::new(Suppliers::Status)
                                .string()
                                .not_null()
                                .default("Active"),
                        )
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_suppliers_account_code")
                        .table(Suppliers::Table)
                        .col(Suppliers::AccountId)
                        .col(Suppliers::Code)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Materials::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Materials::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Materials::AccountId).uuid().not_null())
                        .col(ColumnDef::new(Materials::Code).string().not_null())
                        .col(ColumnDef::new(Materials::Name).string().not_null())
                        .col(ColumnDef::new(Materials::Unit).string().null())
                        .col(ColumnDef::new(Materials::Category).string().null())
                        .col(ColumnDef::new(Materials::Description).text().null())
                        .col(
                            ColumnDef::new(Materials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Materials::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_materials_account_code")
                        .table(Materials::Table)
                        .col(Materials::AccountId)
                        .col(Materials::Code)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierMaterials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierMaterials::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SupplierMaterials::AccountId).uuid().not_null())
                        .col(ColumnDef::new(SupplierMaterials::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(SupplierMaterials::MaterialId).uuid().not_null())
                        .col(ColumnDef::new(SupplierMaterials::Specification).text().null())
                        .col(
                            ColumnDef::new(SupplierMaterials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_materials_supplier")
                                .from(SupplierMaterials::Table, SupplierMaterials::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_supplier_materials_material")
                                .from(SupplierMaterials::Table, SupplierMaterials::MaterialId)
                                .to(Materials::Table, Materials::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_supplier_materials_pair")
                        .table(SupplierMaterials::Table)
                        .col(SupplierMaterials::SupplierId)
                        .col(SupplierMaterials::MaterialId)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Companies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Companies::AccountId).uuid().not_null())
                        .col(ColumnDef::new(Companies::Rif).string().not_null())
                        .col(ColumnDef::new(Companies::Name).string().not_null())
                        .col(ColumnDef::new(Companies::Address).text().null())
                        .col(ColumnDef::new(Companies::Phone).string().null())
                        .col(ColumnDef::new(Companies::Email).string().null())
                        .col(ColumnDef::new(Companies::LogoUrl).string().null())
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Companies::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Profiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Profiles::AccountId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Profiles::DisplayName).string().null())
                        .col(ColumnDef::new(Profiles::Email).string().null())
                        .col(ColumnDef::new(Profiles::DefaultExchangeRate).double().null())
                        .col(
                            ColumnDef::new(Profiles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                SupplierMaterials::Table.into_iden(),
                Profiles::Table.into_iden(),
                Companies::Table.into_iden(),
                Materials::Table.into_iden(),
                Suppliers::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum Suppliers {
        Table,
        Id,
        AccountId,
        Code,
        Rif,
        Name,
        ContactName,
        Email,
        Phone,
        Address,
        PaymentTerms,
        CreditDays,
        CustomPaymentTerms,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Materials {
        Table,
        Id,
        AccountId,
        Code,
        Name,
        Unit,
        Category,
        Description,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum SupplierMaterials {
        Table,
        Id,
        AccountId,
        SupplierId,
        MaterialId,
        Specification,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Companies {
        Table,
        Id,
        AccountId,
        Rif,
        Name,
        Address,
        Phone,
        Email,
        LogoUrl,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum Profiles {
        Table,
        AccountId,
        DisplayName,
        Email,
        DefaultExchangeRate,
        UpdatedAt,
    }
}

mod m20250101_000002_create_document_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_document_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuoteRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuoteRequests::AccountId).uuid().not_null())
                        .col(ColumnDef::new(QuoteRequests::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(QuoteRequests::CompanyId).uuid().not_null())
                        .col(
                            ColumnDef::new(QuoteRequests::Currency)
                                .string()
                                .not_null()
                                .default("USD"),
                        )
                        .col(ColumnDef::new(QuoteRequests::ExchangeRate).double().null())
                        .col(
                            ColumnDef::new(QuoteRequests::Status)
                                .string()
                                .not_null()
                                .default("Draft"),
                        )
                        .col(ColumnDef::new(QuoteRequests::Notes).text().null())
                        .col(
                            ColumnDef::new(QuoteRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_quote_requests_supplier_status")
                        .table(QuoteRequests::Table)
                        .col(QuoteRequests::SupplierId)
                        .col(QuoteRequests::Status)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuoteRequestItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteRequestItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteRequestItems::QuoteRequestId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuoteRequestItems::Position).integer().not_null())
                        .col(ColumnDef::new(QuoteRequestItems::MaterialId).uuid().null())
                        .col(
                            ColumnDef::new(QuoteRequestItems::MaterialName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuoteRequestItems::Quantity).double().not_null())
                        .col(ColumnDef::new(QuoteRequestItems::Unit).string().null())
                        .col(ColumnDef::new(QuoteRequestItems::Description).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quote_request_items_parent")
                                .from(QuoteRequestItems::Table, QuoteRequestItems::QuoteRequestId)
                                .to(QuoteRequests::Table, QuoteRequests::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::AccountId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseOrders::SequenceNumber)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::CompanyId).uuid().not_null())
                        .col(ColumnDef::new(PurchaseOrders::QuoteRequestId).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::Currency)
                                .string()
                                .not_null()
                                .default("USD"),
                        )
                        .col(ColumnDef::new(PurchaseOrders::ExchangeRate).double().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::Status)
                                .string()
                                .not_null()
                                .default("Draft"),
                        )
                        .col(ColumnDef::new(PurchaseOrders::DeliveryDate).date().null())
                        .col(ColumnDef::new(PurchaseOrders::Observations).text().null())
                        .col(
                            ColumnDef::new(PurchaseOrders::Subtotal)
                                .decimal_len(20, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::TaxAmount)
                                .decimal_len(20, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::TotalAmount)
                                .decimal_len(20, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_purchase_orders_supplier_status")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::SupplierId)
                        .col(PurchaseOrders::Status)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Position)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::MaterialId).uuid().null())
                        .col(
                            ColumnDef::new(PurchaseOrderItems::MaterialName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::Quantity)
                                .double()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::Unit).string().null())
                        .col(
                            ColumnDef::new(PurchaseOrderItems::UnitPrice)
                                .decimal_len(20, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::TaxRate)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::TaxExempt)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderItems::DiscountPercent)
                                .double()
                                .null(),
                        )
                        .col(ColumnDef::new(PurchaseOrderItems::MarkupPercent).double().null())
                        .col(
                            ColumnDef::new(PurchaseOrderItems::LineTotal)
                                .decimal_len(20, 4)
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_order_items_parent")
                                .from(
                                    PurchaseOrderItems::Table,
                                    PurchaseOrderItems::PurchaseOrderId,
                                )
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrderSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrderSequences::AccountId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderSequences::LastValue)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrderSequences::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                PurchaseOrderItems::Table.into_iden(),
                PurchaseOrderSequences::Table.into_iden(),
                PurchaseOrders::Table.into_iden(),
                QuoteRequestItems::Table.into_iden(),
                QuoteRequests::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum QuoteRequests {
        Table,
        Id,
        AccountId,
        SupplierId,
        CompanyId,
        Currency,
        ExchangeRate,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum QuoteRequestItems {
        Table,
        Id,
        QuoteRequestId,
        Position,
        MaterialId,
        MaterialName,
        Quantity,
        Unit,
        Description,
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrders {
        Table,
        Id,
        AccountId,
        SequenceNumber,
        SupplierId,
        CompanyId,
        QuoteRequestId,
        Currency,
        ExchangeRate,
        Status,
        DeliveryDate,
        Observations,
        Subtotal,
        TaxAmount,
        TotalAmount,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrderItems {
        Table,
        Id,
        PurchaseOrderId,
        Position,
        MaterialId,
        MaterialName,
        Quantity,
        Unit,
        UnitPrice,
        TaxRate,
        TaxExempt,
        DiscountPercent,
        MarkupPercent,
        LineTotal,
    }

    #[derive(DeriveIden)]
    pub enum PurchaseOrderSequences {
        Table,
        AccountId,
        LastValue,
        UpdatedAt,
    }
}

mod m20250101_000003_create_history_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_history_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PriceHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PriceHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PriceHistory::AccountId).uuid().not_null())
                        .col(ColumnDef::new(PriceHistory::MaterialId).uuid().not_null())
                        .col(ColumnDef::new(PriceHistory::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(PriceHistory::UnitPrice).double().not_null())
                        .col(ColumnDef::new(PriceHistory::Currency).string().not_null())
                        .col(ColumnDef::new(PriceHistory::ExchangeRate).double().null())
                        .col(
                            ColumnDef::new(PriceHistory::PurchaseOrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PriceHistory::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_price_history_material")
                        .table(PriceHistory::Table)
                        .col(PriceHistory::AccountId)
                        .col(PriceHistory::MaterialId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_price_history_purchase_order")
                        .table(PriceHistory::Table)
                        .col(PriceHistory::PurchaseOrderId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuoteComparisons::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteComparisons::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuoteComparisons::AccountId).uuid().not_null())
                        .col(ColumnDef::new(QuoteComparisons::Title).string().not_null())
                        .col(ColumnDef::new(QuoteComparisons::Currency).string().not_null())
                        .col(ColumnDef::new(QuoteComparisons::ExchangeRate).double().null())
                        .col(ColumnDef::new(QuoteComparisons::Notes).text().null())
                        .col(
                            ColumnDef::new(QuoteComparisons::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QuoteComparisonItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuoteComparisonItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteComparisonItems::QuoteComparisonId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteComparisonItems::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteComparisonItems::MaterialName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteComparisonItems::Quantity)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteComparisonItems::UnitPrice)
                                .double()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteComparisonItems::Currency)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuoteComparisonItems::ExchangeRate)
                                .double()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuoteComparisonItems::LeadTimeDays)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(QuoteComparisonItems::Notes).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quote_comparison_items_parent")
                                .from(
                                    QuoteComparisonItems::Table,
                                    QuoteComparisonItems::QuoteComparisonId,
                                )
                                .to(QuoteComparisons::Table, QuoteComparisons::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TechnicalSheets::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TechnicalSheets::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TechnicalSheets::AccountId).uuid().not_null())
                        .col(ColumnDef::new(TechnicalSheets::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(TechnicalSheets::MaterialId).uuid().null())
                        .col(ColumnDef::new(TechnicalSheets::FileName).string().not_null())
                        .col(ColumnDef::new(TechnicalSheets::StoragePath).string().not_null())
                        .col(ColumnDef::new(TechnicalSheets::ContentType).string().not_null())
                        .col(
                            ColumnDef::new(TechnicalSheets::SizeBytes)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(TechnicalSheets::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLogs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(AuditLogs::AccountId).uuid().not_null())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::TableName).string().not_null())
                        .col(ColumnDef::new(AuditLogs::RecordId).uuid().null())
                        .col(ColumnDef::new(AuditLogs::Description).text().not_null())
                        .col(ColumnDef::new(AuditLogs::Details).json().not_null())
                        .col(ColumnDef::new(AuditLogs::Actor).string().not_null())
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
                        .name("idx_audit_logs_account_created")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::AccountId)
                        .col(AuditLogs::CreatedAt)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                AuditLogs::Table.into_iden(),
                TechnicalSheets::Table.into_iden(),
                QuoteComparisonItems::Table.into_iden(),
                QuoteComparisons::Table.into_iden(),
                PriceHistory::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub enum PriceHistory {
        Table,
        Id,
        AccountId,
        MaterialId,
        SupplierId,
        UnitPrice,
        Currency,
        ExchangeRate,
        PurchaseOrderId,
        RecordedAt,
    }

    #[derive(DeriveIden)]
    pub enum QuoteComparisons {
        Table,
        Id,
        AccountId,
        Title,
        Currency,
        ExchangeRate,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum QuoteComparisonItems {
        Table,
        Id,
        QuoteComparisonId,
        SupplierId,
        MaterialName,
        Quantity,
        UnitPrice,
        Currency,
        ExchangeRate,
        LeadTimeDays,
        Notes,
    }

    #[derive(DeriveIden)]
    pub enum TechnicalSheets {
        Table,
        Id,
        AccountId,
        SupplierId,
        MaterialId,
        FileName,
        StoragePath,
        ContentType,
        SizeBytes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub enum AuditLogs {
        Table,
        Id,
        AccountId,
        Action,
        TableName,
        RecordId,
        Description,
        Details,
        Actor,
        CreatedAt,
    }
}
