//! SMTP confirmation notifier.
//!
//! Delivery is best-effort by contract: every failure path resolves to a
//! [`DeliveryOutcome`] so a lost email can never fail the booking it
//! confirms.

pub mod template;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tera::Tera;
use thiserror::Error;
use tracing::{info, warn};

use medbook_core::config::{ClinicConfig, SmtpConfig};
use medbook_core::notify::{BookingConfirmation, ConfirmationNotifier, DeliveryOutcome};

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid sender address `{0}`")]
    InvalidSenderAddress(String),
    #[error("smtp transport setup failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("template setup failed: {0}")]
    Template(#[from] tera::Error),
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    clinic: ClinicConfig,
    templates: Tera,
}

impl SmtpMailer {
    pub fn from_config(smtp: &SmtpConfig, clinic: &ClinicConfig) -> Result<Self, MailerError> {
        let sender: Mailbox = format!("{} <{}>", clinic.name, smtp.sender_email)
            .parse()
            .map_err(|_| MailerError::InvalidSenderAddress(smtp.sender_email.clone()))?;

        let credentials = Credentials::new(
            smtp.sender_email.clone(),
            smtp.sender_password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)?
            .port(smtp.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            sender,
            clinic: clinic.clone(),
            templates: template::confirmation_templates()?,
        })
    }

    fn build_message(&self, confirmation: &BookingConfirmation) -> Result<Message, String> {
        let recipient: Mailbox = confirmation
            .to_email
            .parse()
            .map_err(|_| format!("invalid recipient address `{}`", confirmation.to_email))?;

        let (plain, html) = template::render_bodies(&self.templates, &self.clinic, confirmation)
            .map_err(|error| format!("rendering confirmation body: {error}"))?;

        Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(template::subject(&self.clinic, confirmation))
            .multipart(MultiPart::alternative_plain_html(plain, html))
            .map_err(|error| format!("assembling confirmation message: {error}"))
    }
}

#[async_trait]
impl ConfirmationNotifier for SmtpMailer {
    async fn send_booking_confirmation(
        &self,
        confirmation: &BookingConfirmation,
    ) -> DeliveryOutcome {
        let message = match self.build_message(confirmation) {
            Ok(message) => message,
            Err(reason) => {
                warn!(booking_id = confirmation.booking_id.0, error = %reason, "confirmation build failed");
                return DeliveryOutcome::failed(reason);
            }
        };

        match self.transport.send(message).await {
            Ok(_) => {
                info!(
                    booking_id = confirmation.booking_id.0,
                    to = %confirmation.to_email,
                    "confirmation email sent"
                );
                DeliveryOutcome::delivered()
            }
            Err(error) => {
                warn!(booking_id = confirmation.booking_id.0, error = %error, "confirmation send failed");
                DeliveryOutcome::failed(format!("Failed to send email: {error}"))
            }
        }
    }
}

/// Stand-in notifier for deployments without SMTP credentials. Always
/// reports a non-delivery so the flow surfaces the degraded outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl ConfirmationNotifier for DisabledNotifier {
    async fn send_booking_confirmation(
        &self,
        _confirmation: &BookingConfirmation,
    ) -> DeliveryOutcome {
        DeliveryOutcome::failed("Email service not configured")
    }
}
