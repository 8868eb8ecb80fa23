pub mod admin;
pub mod audit_logs;
pub mod common;
pub mod companies;
pub mod exports;
pub mod imports;
pub mod materials;
pub mod profile;
pub mod purchase_orders;
pub mod quote_comparisons;
pub mod quote_requests;
pub mod suppliers;
pub mod technical_sheets;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    models::Currency,
    services::{
        admin::AdminService, audit::AuditLogService, bulk_import::BulkImportService,
        companies::CompanyService, exports::ExportService, lifecycle::LifecycleManager,
        materials::MaterialService, price_history::PriceHistoryService,
        profiles::ProfileService, purchase_orders::PurchaseOrderService,
        quote_comparisons::QuoteComparisonService, quote_requests::QuoteRequestService,
        suppliers::SupplierService, technical_sheets::TechnicalSheetService,
    },
};

pub use crate::AppState;

/// Services layer used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: Arc<SupplierService>,
    pub materials: Arc<MaterialService>,
    pub companies: Arc<CompanyService>,
    pub quote_requests: Arc<QuoteRequestService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub quote_comparisons: Arc<QuoteComparisonService>,
    pub technical_sheets: Arc<TechnicalSheetService>,
    pub price_history: Arc<PriceHistoryService>,
    pub imports: Arc<BulkImportService>,
    pub exports: Arc<ExportService>,
    pub audit_logs: Arc<AuditLogService>,
    pub profiles: Arc<ProfileService>,
    pub admin: Arc<AdminService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let default_currency = config
            .default_currency
            .parse::<Currency>()
            .unwrap_or(Currency::Usd);
        let lifecycle = Arc::new(LifecycleManager::new(
            db_pool.clone(),
            event_sender.clone(),
            config.enforce_status_transitions,
        ));

        let suppliers = SupplierService::new(db_pool.clone(), event_sender.clone(), lifecycle.clone());
        let materials = MaterialService::new(db_pool.clone(), event_sender.clone());
        let imports = BulkImportService::new(
            db_pool.clone(),
            event_sender.clone(),
            suppliers.clone(),
            materials.clone(),
        );

        Self {
            companies: Arc::new(CompanyService::new(db_pool.clone(), event_sender.clone())),
            quote_requests: Arc::new(QuoteRequestService::new(
                db_pool.clone(),
                event_sender.clone(),
                lifecycle.clone(),
                default_currency,
            )),
            purchase_orders: Arc::new(PurchaseOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
                lifecycle,
                default_currency,
            )),
            quote_comparisons: Arc::new(QuoteComparisonService::new(
                db_pool.clone(),
                default_currency,
            )),
            technical_sheets: Arc::new(TechnicalSheetService::new(db_pool.clone())),
            price_history: Arc::new(PriceHistoryService::new(db_pool.clone())),
            imports: Arc::new(imports),
            exports: Arc::new(ExportService::new(db_pool.clone())),
            audit_logs: Arc::new(AuditLogService::new(db_pool.clone())),
            profiles: Arc::new(ProfileService::new(db_pool.clone())),
            admin: Arc::new(AdminService::new(
                db_pool,
                event_sender,
                config.admin_pin.clone(),
            )),
            suppliers: Arc::new(suppliers),
            materials: Arc::new(materials),
        }
    }
}
