//! Payment operations

use crate::api::Operation;
use crate::client::{QPayClient, NO_BODY};
use crate::config::ProtocolVariant;
use crate::types::*;
use crate::Result;
use serde_json::Value;
use tracing::info;

impl QPayClient {
    /// Fetch a payment by id
    pub async fn get_payment(&self, payment_id: &str) -> Result<Value> {
        let endpoint = Operation::GetPayment.endpoint(self.variant())?;
        self.execute_json(NO_BODY, &endpoint, payment_id).await
    }

    /// List the payments made against an invoice.
    ///
    /// V1 has no pagination, `page_limit` and `page_number` are ignored there.
    pub async fn check_payment(
        &self,
        invoice_id: &str,
        page_limit: i64,
        page_number: i64,
    ) -> Result<PaymentCheckResponse> {
        let endpoint = Operation::CheckPayment.endpoint(self.variant())?;

        match self.variant() {
            ProtocolVariant::V1 => self.execute_json(NO_BODY, &endpoint, invoice_id).await,
            ProtocolVariant::V2 => {
                let request = PaymentCheckRequest::for_invoice(invoice_id, page_limit, page_number);
                self.execute_json(Some(&request), &endpoint, "").await
            }
        }
    }

    /// Cancel a card payment. V2 only.
    pub async fn cancel_payment(&self, invoice_id: &str, payment_uuid: &str) -> Result<PaymentCheckResponse> {
        let endpoint = Operation::CancelPayment.endpoint(self.variant())?;
        let request = self.cancel_request(invoice_id, payment_uuid);

        let response = self.execute_json(Some(&request), &endpoint, invoice_id).await?;
        info!("Cancelled QPay payment for invoice {}", invoice_id);
        Ok(response)
    }

    /// Refund a card payment. V2 only.
    pub async fn refund_payment(&self, invoice_id: &str, payment_uuid: &str) -> Result<Value> {
        let endpoint = Operation::RefundPayment.endpoint(self.variant())?;
        let request = self.cancel_request(invoice_id, payment_uuid);

        let response = self.execute_json(Some(&request), &endpoint, invoice_id).await?;
        info!("Refunded QPay payment for invoice {}", invoice_id);
        Ok(response)
    }

    fn cancel_request(&self, invoice_id: &str, payment_uuid: &str) -> PaymentCancelRequest {
        PaymentCancelRequest {
            callback_url: format!("{}{}", self.config().callback, payment_uuid),
            note: format!("Cancel payment - {}", invoice_id),
        }
    }
}
