//! Request and response shapes of the QPay business endpoints

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Object type the payment check endpoint filters by
pub const OBJECT_TYPE_INVOICE: &str = "INVOICE";

/// Caller-facing description of an invoice to create
#[derive(Debug, Clone, PartialEq)]
pub struct CreateInvoiceInput {
    /// Merchant side invoice number
    pub sender_code: String,
    pub sender_branch_code: String,
    /// Customer identifier on the merchant side
    pub receiver_code: String,
    pub description: String,
    pub amount: Decimal,
    /// Query parameters appended to the configured callback URL
    pub callback_params: BTreeMap<String, String>,
}

impl CreateInvoiceInput {
    /// Create a new invoice input
    pub fn new(sender_code: impl Into<String>, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            sender_code: sender_code.into(),
            sender_branch_code: String::new(),
            receiver_code: String::new(),
            description: description.into(),
            amount,
            callback_params: BTreeMap::new(),
        }
    }

    /// Set the branch code
    pub fn with_branch_code(mut self, branch_code: impl Into<String>) -> Self {
        self.sender_branch_code = branch_code.into();
        self
    }

    /// Set the receiver code
    pub fn with_receiver_code(mut self, receiver_code: impl Into<String>) -> Self {
        self.receiver_code = receiver_code.into();
        self
    }

    /// Add a callback query parameter
    pub fn with_callback_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.callback_params.insert(key.into(), value.into());
        self
    }
}

/// V2 `POST /invoice` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub invoice_code: String,
    pub sender_invoice_no: String,
    pub sender_branch_code: String,
    pub invoice_receiver_code: String,
    pub invoice_description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub callback_url: String,
}

/// V1 `POST /bill/create` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillRequest {
    pub merchant_id: String,
    pub template_id: String,
    pub branch_id: String,
    pub bill_no: String,
    pub date: DateTime<Utc>,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub callback_url: String,
}

/// Deep link into a bank or wallet app
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentUrl {
    pub name: String,
    pub description: String,
    pub logo: String,
    pub link: String,
}

/// Answer to invoice creation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceResponse {
    pub invoice_id: String,
    pub qr_text: String,
    /// Base64 encoded PNG
    pub qr_image: String,
    #[serde(rename = "qPay_shortUrl")]
    pub short_url: String,
    pub urls: Vec<PaymentUrl>,
}

/// Invoice as returned by `GET /invoice/{id}`. Fields not modelled here are
/// kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceDetails {
    pub invoice_id: String,
    pub invoice_status: String,
    pub sender_invoice_no: String,
    pub sender_branch_code: String,
    pub invoice_description: String,
    pub total_amount: Option<Decimal>,
    pub gross_amount: Option<Decimal>,
    pub callback_url: String,
    pub note: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoiceDetails {
    /// Whether the gateway reports the invoice as paid
    pub fn is_paid(&self) -> bool {
        self.invoice_status.eq_ignore_ascii_case("PAID")
    }
}

/// Pagination of the payment check endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub page_number: i64,
    pub page_limit: i64,
}

/// V2 `POST /payment/check` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCheckRequest {
    pub object_type: String,
    pub object_id: String,
    pub offset: Offset,
}

impl PaymentCheckRequest {
    /// Check the payments of one invoice
    pub fn for_invoice(invoice_id: impl Into<String>, page_limit: i64, page_number: i64) -> Self {
        Self {
            object_type: OBJECT_TYPE_INVOICE.to_string(),
            object_id: invoice_id.into(),
            offset: Offset {
                page_number,
                page_limit,
            },
        }
    }
}

/// One payment made against an invoice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRow {
    pub payment_id: String,
    pub payment_status: String,
    pub payment_date: String,
    pub payment_fee: Option<Decimal>,
    pub payment_amount: Option<Decimal>,
    pub payment_currency: String,
    pub payment_wallet: String,
    pub transaction_type: String,
}

/// Payments found by the check endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentCheckResponse {
    pub count: i64,
    pub paid_amount: Option<Decimal>,
    pub rows: Vec<PaymentRow>,
}

impl PaymentCheckResponse {
    /// Whether any payment has been made
    pub fn is_paid(&self) -> bool {
        self.count > 0
    }
}

/// Body of payment cancel and refund requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCancelRequest {
    pub callback_url: String,
    pub note: String,
}
