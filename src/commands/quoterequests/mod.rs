pub mod create_quote_request_command;
pub mod update_quote_request_command;

pub use create_quote_request_command::CreateQuoteRequestCommand;
pub use update_quote_request_command::UpdateQuoteRequestCommand;

use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    commands::purchaseorders::positive,
    errors::ServiceError,
    models::{enums::validate_exchange_rate, quote_request, quote_request_item, Currency},
    services::clean,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_request_currency"))]
pub struct QuoteRequestInput {
    pub supplier_id: Uuid,
    pub company_id: Uuid,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<QuoteRequestItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuoteRequestItemInput {
    #[serde(default)]
    pub material_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Material name is required"))]
    pub material_name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

fn validate_request_currency(input: &QuoteRequestInput) -> Result<(), ValidationError> {
    validate_exchange_rate(input.currency.unwrap_or(Currency::Usd), input.exchange_rate)
}

impl QuoteRequestInput {
    pub fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        for (index, item) in self.items.iter().enumerate() {
            let line = index + 1;
            item.validate()
                .map_err(|e| ServiceError::ValidationError(format!("Item {}: {}", line, e)))?;
            positive(item.quantity)
                .map_err(|e| ServiceError::ValidationError(format!("Item {}: {}", line, e)))?;
        }
        Ok(())
    }

    pub fn currency(&self) -> Currency {
        self.currency.unwrap_or(Currency::Usd)
    }

    pub fn exchange_rate(&self) -> Option<f64> {
        self.exchange_rate.filter(|r| *r > 0.0)
    }
}

/// Quote request with its lines
#[derive(Debug, Clone, Serialize)]
pub struct QuoteRequestDetails {
    #[serde(flatten)]
    pub request: quote_request::Model,
    pub items: Vec<quote_request_item::Model>,
}

pub(crate) async fn insert_items<C>(
    db: &C,
    quote_request_id: Uuid,
    items: &[QuoteRequestItemInput],
) -> Result<Vec<quote_request_item::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut saved = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let model = quote_request_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            quote_request_id: Set(quote_request_id),
            position: Set(index as i32 + 1),
            material_id: Set(item.material_id),
            material_name: Set(item.material_name.trim().to_string()),
            quantity: Set(item.quantity),
            unit: Set(clean(item.unit.clone())),
            description: Set(clean(item.description.clone())),
        }
        .insert(db)
        .await?;
        saved.push(model);
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn requires_items_with_positive_quantities() {
        let empty: QuoteRequestInput = serde_json::from_value(json!({
            "supplier_id": Uuid::new_v4(),
            "company_id": Uuid::new_v4(),
            "items": []
        }))
        .unwrap();
        assert_matches!(empty.check(), Err(ServiceError::ValidationError(_)));

        let negative: QuoteRequestInput = serde_json::from_value(json!({
            "supplier_id": Uuid::new_v4(),
            "company_id": Uuid::new_v4(),
            "items": [{ "material_name": "Arena", "quantity": -2.0 }]
        }))
        .unwrap();
        assert_matches!(negative.check(), Err(ServiceError::ValidationError(m)) if m.starts_with("Item 1"));
    }

    #[test]
    fn usd_requests_do_not_need_a_rate() {
        let input: QuoteRequestInput = serde_json::from_value(json!({
            "supplier_id": Uuid::new_v4(),
            "company_id": Uuid::new_v4(),
            "items": [{ "material_name": "Arena", "quantity": 2.0 }]
        }))
        .unwrap();
        assert!(input.check().is_ok());
        assert_eq!(input.currency(), Currency::Usd);
        assert_eq!(input.exchange_rate(), None);
    }
}
