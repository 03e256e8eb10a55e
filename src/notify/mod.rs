// src/notify/mod.rs

use anyhow::{Context, Result};
use chrono::Local;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::env;
use tracing::{error, info};

use crate::config::{MailConfig, MAIL_PASSWORD_ENV, MAIL_USER_ENV};
use crate::error::PipelineError;

/// Failure reporter over authenticated SMTP submission (STARTTLS).
///
/// Policy: mail goes out on failure only; success is logged locally. The
/// scrape runs many times a day and a daily inbox full of "still fine"
/// drowns the one mail that matters.
///
/// When either credential env var is unset the notifier is constructed
/// disabled and every call is a no-op, so the pipeline runs unchanged in
/// environments without mail configured.
pub struct Notifier {
    inner: Option<Mailer>,
}

struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl Notifier {
    /// Build from config plus the credential environment variables,
    /// checked once here rather than ad hoc at send time.
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let user = env::var(MAIL_USER_ENV).ok().filter(|v| !v.is_empty());
        let password = env::var(MAIL_PASSWORD_ENV).ok().filter(|v| !v.is_empty());

        let (user, password) = match (user, password) {
            (Some(u), Some(p)) => (u, p),
            _ => {
                info!("mail credentials absent; notifications disabled");
                return Ok(Notifier { inner: None });
            }
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("smtp relay {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(user.clone(), password))
            .build();

        let from: Mailbox = user
            .parse()
            .with_context(|| format!("sender address {user}"))?;
        let to: Mailbox = config
            .recipient
            .parse()
            .with_context(|| format!("recipient address {}", config.recipient))?;

        Ok(Notifier {
            inner: Some(Mailer {
                transport,
                from,
                to,
            }),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Send the failure report. A send failure is logged, never propagated,
    /// so it cannot mask the pipeline error that triggered it.
    pub async fn report_failure(&self, err: &PipelineError) {
        let Some(mailer) = &self.inner else {
            info!("notifications disabled; skipping failure mail");
            return;
        };

        let now = Local::now().format("%Y-%m-%d %H:%M:%S");
        let subject = format!("[DAT MONITOR] update failed ({now})");
        let cause_hint = if err.is_stale_session() {
            "The session cookie has most likely expired. Extract a fresh cookie \
             from the site and update the injected secret."
        } else {
            "The holdings page could not be fetched or the output could not be \
             written. The session cookie is the usual suspect."
        };
        let body = format!(
            "The treasury data update needs attention.\n\n\
             Cause: {err}\n\
             At:    {now}\n\n\
             {cause_hint}\n"
        );

        let message = match Message::builder()
            .from(mailer.from.clone())
            .to(mailer.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
        {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, "building failure mail");
                return;
            }
        };

        match mailer.transport.send(message).await {
            Ok(_) => info!("sent failure notification"),
            Err(e) => error!(error = %e, "sending failure mail"),
        }
    }
}
