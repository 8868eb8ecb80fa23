use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::ValidationError;

/// Document currency. VES amounts always travel with a VES-per-USD exchange rate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(ascii_case_insensitive)]
pub enum Currency {
    #[sea_orm(string_value = "USD")]
    #[strum(to_string = "USD")]
    #[serde(rename = "USD")]
    Usd,
    #[sea_orm(string_value = "VES")]
    #[strum(to_string = "VES", serialize = "Bs")]
    #[serde(rename = "VES")]
    Ves,
}

impl Currency {
    /// Converts `amount` expressed in `self` into `target` using a VES-per-USD rate.
    /// Returns `None` when a conversion is needed and the rate is missing or not positive.
    pub fn convert(self, amount: f64, target: Currency, rate: Option<f64>) -> Option<f64> {
        match (self, target) {
            (Currency::Usd, Currency::Usd) | (Currency::Ves, Currency::Ves) => Some(amount),
            (Currency::Usd, Currency::Ves) => rate.filter(|r| *r > 0.0).map(|r| amount * r),
            (Currency::Ves, Currency::Usd) => rate.filter(|r| *r > 0.0).map(|r| amount / r),
        }
    }
}

/// Checks the currency/exchange-rate pairing shared by every priced document.
pub fn validate_exchange_rate(
    currency: Currency,
    exchange_rate: Option<f64>,
) -> Result<(), ValidationError> {
    match (currency, exchange_rate) {
        (_, Some(rate)) if !rate.is_finite() || rate <= 0.0 => {
            let mut err = ValidationError::new("exchange_rate");
            err.message = Some("Exchange rate must be greater than zero".into());
            Err(err)
        }
        (Currency::Ves, None) => {
            let mut err = ValidationError::new("exchange_rate");
            err.message = Some("Exchange rate is required for VES documents".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Supplier status
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(ascii_case_insensitive)]
pub enum SupplierStatus {
    #[sea_orm(string_value = "Active")]
    #[strum(to_string = "Active", serialize = "Activo")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    #[strum(to_string = "Inactive", serialize = "Inactivo")]
    Inactive,
}

/// Lifecycle status shared by quote requests and purchase orders.
/// `Rejected` only applies to purchase orders.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(ascii_case_insensitive)]
pub enum DocumentStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Sent")]
    Sent,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    #[sea_orm(string_value = "Archived")]
    Archived,
}

impl DocumentStatus {
    /// Statuses listed under the "Active" filter
    pub const ACTIVE: [DocumentStatus; 2] = [DocumentStatus::Draft, DocumentStatus::Sent];

    /// Whether the document can still be edited in this status
    pub fn is_editable(self) -> bool {
        !matches!(self, DocumentStatus::Approved | DocumentStatus::Archived)
    }
}

/// List filter used by the quote-request and purchase-order list views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum StatusFilter {
    #[default]
    Active,
    Approved,
    Rejected,
    Archived,
    All,
}

impl StatusFilter {
    pub fn statuses(self) -> Vec<DocumentStatus> {
        match self {
            StatusFilter::Active => DocumentStatus::ACTIVE.to_vec(),
            StatusFilter::Approved => vec![DocumentStatus::Approved],
            StatusFilter::Rejected => vec![DocumentStatus::Rejected],
            StatusFilter::Archived => vec![DocumentStatus::Archived],
            StatusFilter::All => vec![
                DocumentStatus::Draft,
                DocumentStatus::Sent,
                DocumentStatus::Approved,
                DocumentStatus::Rejected,
                DocumentStatus::Archived,
            ],
        }
    }
}

/// Stored discriminant of a supplier's payment terms
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(ascii_case_insensitive)]
pub enum PaymentTermsKind {
    #[sea_orm(string_value = "Contado")]
    #[strum(to_string = "Contado", serialize = "Cash")]
    #[serde(rename = "Contado")]
    Cash,
    #[sea_orm(string_value = "Crédito")]
    #[strum(to_string = "Crédito", serialize = "Credito", serialize = "Credit")]
    #[serde(rename = "Crédito", alias = "Credito")]
    Credit,
    #[sea_orm(string_value = "Otro")]
    #[strum(to_string = "Otro", serialize = "Other")]
    #[serde(rename = "Otro")]
    Other,
}

/// Payment terms as one value: credit days only exist for credit, free text only for "other".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentTerms {
    Cash,
    Credit { days: i32 },
    Other { terms: String },
}

impl PaymentTerms {
    /// Builds payment terms from the three form/column values, enforcing
    /// `credit_days > 0` iff credit and non-empty custom text iff other.
    pub fn from_parts(
        kind: PaymentTermsKind,
        credit_days: Option<i32>,
        custom_terms: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let custom = custom_terms.map(str::trim).filter(|s| !s.is_empty());
        let days = credit_days.filter(|d| *d != 0);

        match kind {
            PaymentTermsKind::Cash => {
                reject_days(days)?;
                reject_custom(custom)?;
                Ok(PaymentTerms::Cash)
            }
            PaymentTermsKind::Credit => {
                reject_custom(custom)?;
                match days {
                    Some(d) if d > 0 => Ok(PaymentTerms::Credit { days: d }),
                    _ => {
                        let mut err = ValidationError::new("credit_days");
                        err.message =
                            Some("Credit days must be greater than zero for credit terms".into());
                        Err(err)
                    }
                }
            }
            PaymentTermsKind::Other => {
                reject_days(days)?;
                match custom {
                    Some(text) => Ok(PaymentTerms::Other {
                        terms: text.to_string(),
                    }),
                    None => {
                        let mut err = ValidationError::new("custom_payment_terms");
                        err.message = Some("Describe the payment terms when choosing Otro".into());
                        Err(err)
                    }
                }
            }
        }
    }

    pub fn kind(&self) -> PaymentTermsKind {
        match self {
            PaymentTerms::Cash => PaymentTermsKind::Cash,
            PaymentTerms::Credit { .. } => PaymentTermsKind::Credit,
            PaymentTerms::Other { .. } => PaymentTermsKind::Other,
        }
    }

    /// Column values `(payment_terms, credit_days, custom_payment_terms)`
    pub fn into_columns(self) -> (PaymentTermsKind, Option<i32>, Option<String>) {
        match self {
            PaymentTerms::Cash => (PaymentTermsKind::Cash, None, None),
            PaymentTerms::Credit { days } => (PaymentTermsKind::Credit, Some(days), None),
            PaymentTerms::Other { terms } => (PaymentTermsKind::Other, None, Some(terms)),
        }
    }
}

fn reject_days(days: Option<i32>) -> Result<(), ValidationError> {
    if days.is_some() {
        let mut err = ValidationError::new("credit_days");
        err.message = Some("Credit days only apply to credit terms".into());
        return Err(err);
    }
    Ok(())
}

fn reject_custom(custom: Option<&str>) -> Result<(), ValidationError> {
    if custom.is_some() {
        let mut err = ValidationError::new("custom_payment_terms");
        err.message = Some("Custom payment terms only apply to Otro".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn credit_requires_positive_days() {
        assert_eq!(
            PaymentTerms::from_parts(PaymentTermsKind::Credit, Some(30), None).unwrap(),
            PaymentTerms::Credit { days: 30 }
        );
        assert!(PaymentTerms::from_parts(PaymentTermsKind::Credit, None, None).is_err());
        assert!(PaymentTerms::from_parts(PaymentTermsKind::Credit, Some(-5), None).is_err());
    }

    #[test]
    fn days_outside_credit_are_rejected() {
        assert!(PaymentTerms::from_parts(PaymentTermsKind::Cash, Some(15), None).is_err());
        assert!(PaymentTerms::from_parts(PaymentTermsKind::Other, Some(15), Some("50/50")).is_err());
        // zero is what an untouched form field submits
        assert_eq!(
            PaymentTerms::from_parts(PaymentTermsKind::Cash, Some(0), None).unwrap(),
            PaymentTerms::Cash
        );
    }

    #[test]
    fn other_requires_text() {
        assert!(PaymentTerms::from_parts(PaymentTermsKind::Other, None, Some("   ")).is_err());
        let terms =
            PaymentTerms::from_parts(PaymentTermsKind::Other, None, Some(" 50% adelantado ")).unwrap();
        assert_eq!(
            terms.into_columns(),
            (PaymentTermsKind::Other, None, Some("50% adelantado".to_string()))
        );
        assert!(PaymentTerms::from_parts(PaymentTermsKind::Cash, None, Some("x")).is_err());
    }

    #[test]
    fn parses_spreadsheet_labels() {
        assert_eq!(PaymentTermsKind::from_str("Crédito").unwrap(), PaymentTermsKind::Credit);
        assert_eq!(PaymentTermsKind::from_str("credito").unwrap(), PaymentTermsKind::Credit);
        assert_eq!(PaymentTermsKind::from_str("CONTADO").unwrap(), PaymentTermsKind::Cash);
        assert_eq!(PaymentTermsKind::Credit.to_string(), "Crédito");
        assert_eq!(Currency::from_str("ves").unwrap(), Currency::Ves);
        assert_eq!(SupplierStatus::from_str("inactivo").unwrap(), SupplierStatus::Inactive);
    }

    #[test]
    fn converts_between_usd_and_ves() {
        assert_eq!(Currency::Usd.convert(10.0, Currency::Ves, Some(36.5)), Some(365.0));
        assert_eq!(Currency::Ves.convert(365.0, Currency::Usd, Some(36.5)), Some(10.0));
        assert_eq!(Currency::Ves.convert(365.0, Currency::Usd, None), None);
        assert_eq!(Currency::Usd.convert(4.0, Currency::Usd, None), Some(4.0));
    }

    #[test]
    fn ves_documents_need_a_rate() {
        assert!(validate_exchange_rate(Currency::Ves, None).is_err());
        assert!(validate_exchange_rate(Currency::Ves, Some(0.0)).is_err());
        assert!(validate_exchange_rate(Currency::Ves, Some(36.2)).is_ok());
        assert!(validate_exchange_rate(Currency::Usd, None).is_ok());
    }

    #[test]
    fn active_filter_covers_draft_and_sent() {
        assert_eq!(
            StatusFilter::Active.statuses(),
            vec![DocumentStatus::Draft, DocumentStatus::Sent]
        );
        assert_eq!(StatusFilter::All.statuses().len(), 5);
    }
}
