//! Invoice operations

use crate::api::Operation;
use crate::client::{QPayClient, NO_BODY};
use crate::config::ProtocolVariant;
use crate::types::*;
use crate::Result;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

impl QPayClient {
    /// Create an invoice (`/invoice` on V2, `/bill/create` on V1)
    pub async fn create_invoice(&self, input: &CreateInvoiceInput) -> Result<InvoiceResponse> {
        let config = self.config();
        let callback_url = callback_url(&config.callback, &input.callback_params);
        let endpoint = Operation::CreateInvoice.endpoint(self.variant())?;

        let response: InvoiceResponse = match self.variant() {
            ProtocolVariant::V2 => {
                let request = InvoiceRequest {
                    invoice_code: config.invoice_code.clone(),
                    sender_invoice_no: input.sender_code.clone(),
                    sender_branch_code: input.sender_branch_code.clone(),
                    invoice_receiver_code: input.receiver_code.clone(),
                    invoice_description: input.description.clone(),
                    amount: input.amount,
                    callback_url,
                };
                self.execute_json(Some(&request), &endpoint, "").await?
            }
            ProtocolVariant::V1 => {
                let request = BillRequest {
                    merchant_id: config.merchant_id.clone(),
                    template_id: config.invoice_code.clone(),
                    branch_id: input.sender_branch_code.clone(),
                    bill_no: input.sender_code.clone(),
                    date: Utc::now(),
                    description: input.description.clone(),
                    amount: input.amount,
                    callback_url,
                };
                self.execute_json(Some(&request), &endpoint, "").await?
            }
        };

        info!("Created QPay invoice {}", response.invoice_id);
        Ok(response)
    }

    /// Fetch an invoice by id
    pub async fn get_invoice(&self, invoice_id: &str) -> Result<InvoiceDetails> {
        let endpoint = Operation::GetInvoice.endpoint(self.variant())?;
        self.execute_json(NO_BODY, &endpoint, invoice_id).await
    }

    /// Cancel an unpaid invoice. V2 only.
    pub async fn cancel_invoice(&self, invoice_id: &str) -> Result<Value> {
        let endpoint = Operation::CancelInvoice.endpoint(self.variant())?;
        let response = self.execute_json(NO_BODY, &endpoint, invoice_id).await?;

        info!("Cancelled QPay invoice {}", invoice_id);
        Ok(response)
    }
}

/// `callback?k=v&...` with form-urlencoded parameters in key order
fn callback_url(callback: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return callback.to_string();
    }

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{}?{}", callback, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_url_encodes_params() {
        let mut params = BTreeMap::new();
        params.insert("order".to_string(), "42".to_string());
        params.insert("note".to_string(), "a b&c".to_string());

        assert_eq!(
            callback_url("https://shop.mn/cb", &params),
            "https://shop.mn/cb?note=a+b%26c&order=42"
        );
    }

    #[test]
    fn test_callback_url_without_params() {
        assert_eq!(
            callback_url("https://shop.mn/cb", &BTreeMap::new()),
            "https://shop.mn/cb"
        );
    }
}
