//! Gateway endpoint table

use crate::config::ProtocolVariant;
use crate::{QPayError, Result};
use reqwest::Method;

/// Content type of every request body sent to the gateway
pub const CONTENT_TYPE: &str = "application/json";

/// HTTP method and path of one gateway endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
}

impl Endpoint {
    const fn new(method: Method, path: &'static str) -> Self {
        Self { method, path }
    }

    /// Full URL: `base + path + suffix`
    pub fn url(&self, base: &str, suffix: &str) -> String {
        format!("{}{}{}", base, self.path, suffix)
    }
}

pub const AUTH_TOKEN: Endpoint = Endpoint::new(Method::POST, "/auth/token");
pub const AUTH_REFRESH: Endpoint = Endpoint::new(Method::POST, "/auth/refresh");

pub const BILL_CREATE: Endpoint = Endpoint::new(Method::POST, "/bill/create");
pub const INVOICE_CREATE: Endpoint = Endpoint::new(Method::POST, "/invoice");
pub const INVOICE_GET: Endpoint = Endpoint::new(Method::GET, "/invoice/");
pub const INVOICE_CANCEL: Endpoint = Endpoint::new(Method::DELETE, "/invoice/");

pub const PAYMENT_GET: Endpoint = Endpoint::new(Method::GET, "/payment/get/");
pub const PAYMENT_CHECK_V1: Endpoint = Endpoint::new(Method::GET, "/payment/check/");
pub const PAYMENT_CHECK: Endpoint = Endpoint::new(Method::POST, "/payment/check");
pub const PAYMENT_CANCEL: Endpoint = Endpoint::new(Method::DELETE, "/payment/cancel/");
pub const PAYMENT_REFUND: Endpoint = Endpoint::new(Method::DELETE, "/payment/refund/");

/// Business operations of the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateInvoice,
    GetInvoice,
    CancelInvoice,
    GetPayment,
    CheckPayment,
    CancelPayment,
    RefundPayment,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateInvoice => "create invoice",
            Operation::GetInvoice => "get invoice",
            Operation::CancelInvoice => "cancel invoice",
            Operation::GetPayment => "get payment",
            Operation::CheckPayment => "check payment",
            Operation::CancelPayment => "cancel payment",
            Operation::RefundPayment => "refund payment",
        }
    }

    /// Endpoint of this operation under `variant`
    pub fn endpoint(self, variant: ProtocolVariant) -> Result<Endpoint> {
        use Operation::*;
        use ProtocolVariant::*;

        match (self, variant) {
            (CreateInvoice, V1) => Ok(BILL_CREATE),
            (CreateInvoice, V2) => Ok(INVOICE_CREATE),
            (GetInvoice, _) => Ok(INVOICE_GET),
            (CancelInvoice, V2) => Ok(INVOICE_CANCEL),
            (GetPayment, _) => Ok(PAYMENT_GET),
            (CheckPayment, V1) => Ok(PAYMENT_CHECK_V1),
            (CheckPayment, V2) => Ok(PAYMENT_CHECK),
            (CancelPayment, V2) => Ok(PAYMENT_CANCEL),
            (RefundPayment, V2) => Ok(PAYMENT_REFUND),
            (operation, variant) => Err(QPayError::unsupported(operation.as_str(), variant)),
        }
    }
}
