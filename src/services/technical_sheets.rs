use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AccountContext,
    db::DbPool,
    errors::ServiceError,
    models::technical_sheet,
    services::{
        audit::{self, AuditAction, AuditEntry},
        materials::find_material,
        suppliers::find_supplier,
    },
};

/// Metadata of an uploaded technical sheet. The file itself lives in object storage.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TechnicalSheetInput {
    pub supplier_id: Uuid,
    #[serde(default)]
    pub material_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub file_name: String,
    #[validate(length(min = 1, max = 1024, message = "Storage path is required"))]
    pub storage_path: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub size_bytes: i64,
}

fn default_content_type() -> String {
    "application/pdf".to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TechnicalSheetFilter {
    pub supplier_id: Option<Uuid>,
    pub material_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct TechnicalSheetService {
    db_pool: Arc<DbPool>,
}

impl TechnicalSheetService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn list(
        &self,
        ctx: &AccountContext,
        filter: TechnicalSheetFilter,
    ) -> Result<Vec<technical_sheet::Model>, ServiceError> {
        let mut query = technical_sheet::Entity::find()
            .filter(technical_sheet::Column::AccountId.eq(ctx.account_id))
            .order_by_desc(technical_sheet::Column::CreatedAt);
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(technical_sheet::Column::SupplierId.eq(supplier_id));
        }
        if let Some(material_id) = filter.material_id {
            query = query.filter(technical_sheet::Column::MaterialId.eq(material_id));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    #[instrument(skip(self, ctx, input), fields(account_id = %ctx.account_id))]
    pub async fn register(
        &self,
        ctx: &AccountContext,
        input: TechnicalSheetInput,
    ) -> Result<technical_sheet::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        find_supplier(db, ctx, input.supplier_id).await?;
        if let Some(material_id) = input.material_id {
            find_material(db, ctx, material_id).await?;
        }

        let sheet = technical_sheet::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(ctx.account_id),
            supplier_id: Set(input.supplier_id),
            material_id: Set(input.material_id),
            file_name: Set(input.file_name.trim().to_string()),
            storage_path: Set(input.storage_path.trim().to_string()),
            content_type: Set(input.content_type.trim().to_string()),
            size_bytes: Set(input.size_bytes),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Create,
                "technical_sheets",
                format!("Registered technical sheet {}", sheet.file_name),
            )
            .record(sheet.id)
            .details(json!({ "supplier_id": sheet.supplier_id, "material_id": sheet.material_id })),
        )
        .await;

        info!(technical_sheet_id = %sheet.id, "Technical sheet registered");
        Ok(sheet)
    }

    /// Removes the metadata row only; deleting the stored file is the caller's job
    #[instrument(skip(self, ctx), fields(account_id = %ctx.account_id))]
    pub async fn delete(&self, ctx: &AccountContext, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let sheet = technical_sheet::Entity::find_by_id(id)
            .filter(technical_sheet::Column::AccountId.eq(ctx.account_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Technical sheet", id))?;

        technical_sheet::Entity::delete_by_id(id).exec(db).await?;
        audit::record(
            db,
            ctx,
            AuditEntry::new(
                AuditAction::Delete,
                "technical_sheets",
                format!("Deleted technical sheet {}", sheet.file_name),
            )
            .record(id),
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::suppliers::SupplierInput;
    use crate::services::{
        lifecycle::LifecycleManager,
        suppliers::SupplierService,
        test_support::{event_sender, setup_db},
    };
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn sheets_are_scoped_to_supplier_and_account() {
        let (_dir, db) = setup_db().await;
        let events = event_sender();
        let lifecycle = Arc::new(LifecycleManager::new(db.clone(), events.clone(), true));
        let ctx = AccountContext::system(Uuid::new_v4());
        let supplier_input: SupplierInput = serde_json::from_value(json!({
            "rif": "J-11111111-1",
            "name": "Aceros del Sur"
        }))
        .unwrap();
        let supplier = SupplierService::new(db.clone(), events, lifecycle)
            .create(&ctx, supplier_input)
            .await
            .unwrap();

        let service = TechnicalSheetService::new(db);
        let input: TechnicalSheetInput = serde_json::from_value(json!({
            "supplier_id": supplier.id,
            "file_name": "cabilla.pdf",
            "storage_path": "sheets/cabilla.pdf",
            "size_bytes": 2048
        }))
        .unwrap();
        let sheet = service.register(&ctx, input.clone()).await.unwrap();
        assert_eq!(sheet.content_type, "application/pdf");

        let listed = service
            .list(
                &ctx,
                TechnicalSheetFilter {
                    supplier_id: Some(supplier.id),
                    material_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        let stranger = AccountContext::system(Uuid::new_v4());
        assert_matches!(
            service.register(&stranger, input).await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            service.delete(&stranger, sheet.id).await,
            Err(ServiceError::NotFound(_))
        );

        service.delete(&ctx, sheet.id).await.unwrap();
        assert!(service
            .list(&ctx, TechnicalSheetFilter::default())
            .await
            .unwrap()
            .is_empty());
    }
}
