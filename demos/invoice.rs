//! Create a QPay invoice and poll it until paid.
//!
//! Reads the client configuration from `QPAY_*` environment variables, e.g.
//!
//! ```sh
//! QPAY_ENDPOINT=https://merchant-sandbox.qpay.mn/v2 QPAY_USERNAME=TEST_MERCHANT \
//!   QPAY_PASSWORD=123456 QPAY_INVOICE_CODE=TEST_INVOICE \
//!   QPAY_CALLBACK_URL=https://example.com/callback cargo run --example invoice
//! ```

use qpay::{ClientConfig, CreateInvoiceInput, QPayClient};
use rust_decimal::Decimal;
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?.with_timeout(Duration::from_secs(30));
    println!("Using the {} protocol at {}", config.variant(), config.endpoint);

    let client = QPayClient::connect(config).await?;

    let input = CreateInvoiceInput::new("demo-order-1", "Demo order", Decimal::from(100))
        .with_receiver_code("terminal")
        .with_callback_param("order", "demo-order-1");
    let invoice = client.create_invoice(&input).await?;

    println!("Invoice {} created", invoice.invoice_id);
    println!("  QR: {}", invoice.qr_text);
    println!("  Short URL: {}", invoice.short_url);
    for url in &invoice.urls {
        println!("  {}: {}", url.name, url.link);
    }

    for _ in 0..12 {
        let payments = client.check_payment(&invoice.invoice_id, 100, 1).await?;
        if payments.is_paid() {
            println!("Paid: {:?}", payments.paid_amount);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    println!("Not paid yet");
    Ok(())
}
