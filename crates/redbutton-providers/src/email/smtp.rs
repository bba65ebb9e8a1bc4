//! SMTP mailer for invitation emails

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use redbutton_common::EmailConfig;
use redbutton_core::{Mailer, ProviderError, ProviderResult};

/// SMTP-backed mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Build a mailer from SMTP configuration.
    ///
    /// Port 465 uses implicit TLS; anything else negotiates STARTTLS.
    ///
    /// # Errors
    /// Returns an error if the relay cannot be configured
    pub fn new(config: &EmailConfig) -> ProviderResult<Self> {
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| ProviderError::Transport(format!("SMTP relay setup failed: {e}")))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

fn invite_body(invite_url: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #3E63DD;">Welcome to RedButton!</h2>
  <p>You've been invited to join RedButton, a minimalist assistant application designed to help you react to your inner states.</p>
  <p>Click the button below to accept your invitation and create your account:</p>
  <a href="{invite_url}" style="display: inline-block; background-color: #3E63DD; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; margin: 20px 0;">Accept Invitation</a>
  <p>This invitation link will expire in 7 days.</p>
  <p>If you have any questions, please contact our support team.</p>
  <p>Thank you,<br>The RedButton Team</p>
</div>"#
    )
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_invite(&self, to: &str, invite_url: &str) -> ProviderResult<()> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| ProviderError::InvalidResponse(format!("bad from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| ProviderError::InvalidResponse(format!("bad recipient: {e}")))?)
            .subject("Invitation to RedButton")
            .header(ContentType::TEXT_HTML)
            .body(invite_body(invite_url))
            .map_err(|e| ProviderError::InvalidResponse(format!("message build failed: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ProviderError::Transport(format!("SMTP send failed: {e}")))?;

        Ok(())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_body_embeds_url() {
        let body = invite_body("https://app.example.com/accept-invite?token=abc");
        assert!(body.contains("https://app.example.com/accept-invite?token=abc"));
        assert!(body.contains("expire in 7 days"));
    }
}
