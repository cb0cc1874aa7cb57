//! Outgoing mail for password reset links.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;
use tracing::{info, warn};

use crate::config::{MailConfig, MailTransportConfig};

/// Delivers the reset link to the account owner.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to_email: &str, to_name: &str, reset_link: &str)
    -> Result<()>;
}

pub struct LettreMailer {
    transport: MailTransport,
    from_email: String,
    from_name: String,
}

enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
    Log,
}

impl LettreMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let transport = match &config.transport {
            MailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                        .with_context(|| format!("Failed to create SMTP transport for {host}"))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                };

                MailTransport::Smtp(
                    builder
                        .port(*port)
                        .credentials(Credentials::new(username.clone(), password.clone()))
                        .build(),
                )
            }
            MailTransportConfig::File { path } => {
                let dir = Path::new(path);
                if !dir.exists() {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("Failed to create mail directory {path}"))?;
                }
                MailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
            MailTransportConfig::Log => MailTransport::Log,
        };

        Ok(Self {
            transport,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    fn build_message(&self, to_email: &str, to_name: &str, body: String) -> Result<Message> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .context("Invalid sender address")?;

        let to = if to_name.is_empty() {
            to_email.to_string()
        } else {
            format!("{to_name} <{to_email}>")
        }
        .parse::<Mailbox>()
        .context("Invalid recipient address")?;

        Message::builder()
            .from(from)
            .to(to)
            .subject("Reset your password")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("Failed to build mail message")
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_link: &str,
    ) -> Result<()> {
        let message = self.build_message(to_email, to_name, reset_body(reset_link))?;

        match &self.transport {
            MailTransport::Smtp(smtp) => {
                smtp.send(message).await.context("SMTP delivery failed")?;
            }
            MailTransport::File(file) => {
                file.send(message).await.context("Writing mail file failed")?;
            }
            MailTransport::Log => {
                info!(to = %to_email, "Mail transport is log-only; reset mail not delivered");
            }
        }

        Ok(())
    }
}

fn reset_body(reset_link: &str) -> String {
    format!(
        "You are receiving this email because you (or someone else) asked to reset the \
password of your cookbook account.\n\n\
Open the link below, or paste it into your browser, to choose a new password:\n\n\
{reset_link}\n\n\
The link expires in a few minutes. If you did not ask for this, ignore this email \
and do not open the link.\n"
    )
}
