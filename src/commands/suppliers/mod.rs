pub mod create_supplier_command;
pub mod delete_supplier_command;
pub mod update_supplier_command;

pub use create_supplier_command::CreateSupplierCommand;
pub use delete_supplier_command::DeleteSupplierCommand;
pub use update_supplier_command::{UpdateSupplierCommand, UpdateSupplierResult};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    errors::ServiceError,
    models::{PaymentTerms, PaymentTermsKind, SupplierStatus},
    services::clean,
};

/// Supplier fields as submitted by the form, the API or an import row.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_payment_terms"))]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 20, message = "RIF is required"))]
    pub rif: String,
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_payment_terms")]
    pub payment_terms: PaymentTermsKind,
    #[serde(default)]
    pub credit_days: Option<i32>,
    #[serde(default)]
    pub custom_payment_terms: Option<String>,
    /// Left unchanged on update when omitted; new suppliers start Active
    #[serde(default)]
    pub status: Option<SupplierStatus>,
}

fn default_payment_terms() -> PaymentTermsKind {
    PaymentTermsKind::Cash
}

fn validate_payment_terms(input: &SupplierInput) -> Result<(), ValidationError> {
    PaymentTerms::from_parts(
        input.payment_terms,
        input.credit_days,
        input.custom_payment_terms.as_deref(),
    )
    .map(|_| ())
}

impl SupplierInput {
    /// Trims every text field and drops blank optional ones.
    pub fn normalized(self) -> Self {
        Self {
            rif: self.rif.trim().to_uppercase(),
            name: self.name.trim().to_string(),
            contact_name: clean(self.contact_name),
            email: clean(self.email),
            phone: clean(self.phone),
            address: clean(self.address),
            payment_terms: self.payment_terms,
            credit_days: self.credit_days,
            custom_payment_terms: clean(self.custom_payment_terms),
            status: self.status,
        }
    }

    /// Normalizes, validates and resolves the payment terms in one step.
    pub fn prepare(self) -> Result<(Self, PaymentTerms), ServiceError> {
        let input = self.normalized();
        input.validate()?;
        let terms = PaymentTerms::from_parts(
            input.payment_terms,
            input.credit_days,
            input.custom_payment_terms.as_deref(),
        )?;
        Ok((input, terms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn input() -> SupplierInput {
        SupplierInput {
            rif: " j-12345678-9 ".into(),
            name: " Ferretería El Tornillo ".into(),
            contact_name: Some("  ".into()),
            email: Some("".into()),
            phone: None,
            address: None,
            payment_terms: PaymentTermsKind::Credit,
            credit_days: Some(30),
            custom_payment_terms: None,
            status: None,
        }
    }

    #[test]
    fn prepare_trims_and_resolves_terms() {
        let (input, terms) = input().prepare().unwrap();
        assert_eq!(input.rif, "J-12345678-9");
        assert_eq!(input.name, "Ferretería El Tornillo");
        assert_eq!(input.contact_name, None);
        assert_eq!(input.email, None);
        assert_eq!(terms, PaymentTerms::Credit { days: 30 });
    }

    #[test]
    fn credit_without_days_is_rejected() {
        let mut bad = input();
        bad.credit_days = None;
        assert_matches!(bad.prepare(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut bad = input();
        bad.name = "   ".into();
        assert_matches!(bad.prepare(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn terms_default_to_cash_when_omitted() {
        let parsed: SupplierInput =
            serde_json::from_str(r#"{"rif":"V-1","name":"Acme"}"#).unwrap();
        assert_eq!(parsed.payment_terms, PaymentTermsKind::Cash);
        assert!(parsed.prepare().is_ok());
    }
}
