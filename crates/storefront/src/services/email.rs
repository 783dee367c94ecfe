//! Email service for order notifications.
//!
//! Uses SMTP via lettre for delivery with Askama templates (plain text and
//! HTML alternatives).

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use bazaar_core::{CheckoutLine, OrderId, Price};

use crate::config::EmailConfig;

/// HTML template for the order confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    username: &'a str,
    order_id: OrderId,
    lines: &'a [CheckoutLine],
    total: Price,
    orders_url: &'a str,
}

/// Plain text template for the order confirmation.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    username: &'a str,
    order_id: OrderId,
    lines: &'a [CheckoutLine],
    total: Price,
    orders_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// What goes into an order confirmation.
#[derive(Debug)]
pub struct OrderConfirmation<'a> {
    pub to: &'a str,
    pub username: &'a str,
    pub order_id: OrderId,
    pub lines: &'a [CheckoutLine],
    pub total: Price,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    orders_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// `base_url` is used to link back to the order history page.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            orders_url: format!("{}/orders", base_url.trim_end_matches('/')),
        })
    }

    /// Send the buyer a confirmation for a completed checkout.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        confirmation: &OrderConfirmation<'_>,
    ) -> Result<(), EmailError> {
        let (text, html) = render_order_confirmation(confirmation, &self.orders_url)?;
        let subject = format!("Your order #{}", confirmation.order_id);

        self.send_multipart_email(confirmation.to, &subject, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Render the text and HTML bodies of an order confirmation.
fn render_order_confirmation(
    confirmation: &OrderConfirmation<'_>,
    orders_url: &str,
) -> Result<(String, String), EmailError> {
    let text = OrderConfirmationText {
        username: confirmation.username,
        order_id: confirmation.order_id,
        lines: confirmation.lines,
        total: confirmation.total,
        orders_url,
    }
    .render()?;
    let html = OrderConfirmationHtml {
        username: confirmation.username,
        order_id: confirmation.order_id,
        lines: confirmation.lines,
        total: confirmation.total,
        orders_url,
    }
    .render()?;
    Ok((text, html))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::ProductId;

    #[test]
    fn test_order_confirmation_renders_lines_and_total() {
        let lines = vec![CheckoutLine {
            product_id: ProductId::new(3),
            product_name: "Blue <Mug>".to_string(),
            quantity: 2,
            unit_price: Price::from_cents(1250),
            remaining_stock: 4,
        }];
        let confirmation = OrderConfirmation {
            to: "buyer@example.com",
            username: "buyer",
            order_id: OrderId::new(42),
            lines: &lines,
            total: Price::from_cents(2500),
        };

        let (text, html) =
            render_order_confirmation(&confirmation, "http://localhost:3000/orders").unwrap();

        assert!(text.contains("Order #42"));
        assert!(text.contains("2 x Blue <Mug>"));
        assert!(text.contains("25.00"));
        assert!(text.contains("http://localhost:3000/orders"));
        assert!(html.contains("Blue &#60;Mug&#62;") || html.contains("Blue &lt;Mug&gt;"));
        assert!(html.contains("25.00"));
    }
}
