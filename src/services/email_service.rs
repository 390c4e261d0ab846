use anyhow::{Context, Result};
use lettre::{
    message::header::ContentType, message::Mailbox,
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Message,
    Tokio1Executor,
};
use std::env;
use tracing::info;

const APP_NAME: &str = "Trainforge";

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpConfig {
    /// Returns `None` when no SMTP credentials are configured; email
    /// delivery is then disabled.
    pub fn from_env() -> Option<Self> {
        let username = env::var("MAIL_USERNAME").ok()?;
        let password = env::var("MAIL_PASSWORD").ok()?;

        Some(Self {
            host: env::var("MAIL_SERVER").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            port: env::var("MAIL_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(587),
            from_email: env::var("MAIL_FROM").unwrap_or_else(|_| username.clone()),
            from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| APP_NAME.to_string()),
            username,
            password,
        })
    }
}

/// Outbound email over async SMTP, used for the registration welcome mail.
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("Failed to build SMTP transport")?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .context("Invalid MAIL_FROM address")?;

        Ok(Self { transport, from })
    }

    pub async fn send_welcome_email(&self, to_email: &str, full_name: Option<&str>) -> Result<()> {
        let greeting = match full_name {
            Some(name) => format!("Hello {name},"),
            None => "Hello,".to_string(),
        };
        let body = format!(
            "{greeting}\n\nYour {APP_NAME} account is ready. Sign in to start \
             building trainings.\n\nThe {APP_NAME} team\n"
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to_email.parse().context("Invalid recipient address")?)
            .subject(format!("Welcome to {APP_NAME}!"))
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("Failed to build welcome email")?;

        self.transport
            .send(message)
            .await
            .context("Failed to send welcome email")?;

        info!("Sent welcome email to {}", to_email);
        Ok(())
    }
}
