pub mod audit_log;
pub mod company;
pub mod enums;
pub mod material;
pub mod price_history;
pub mod profile;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod purchase_order_sequence;
pub mod quote_comparison;
pub mod quote_comparison_item;
pub mod quote_request;
pub mod quote_request_item;
pub mod supplier;
pub mod supplier_material;
pub mod technical_sheet;

pub use enums::{
    Currency, DocumentStatus, PaymentTerms, PaymentTermsKind, StatusFilter, SupplierStatus,
};
