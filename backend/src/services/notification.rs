//! Best-effort e-mail notifications for request submissions and decisions.
//!
//! Delivery happens on a detached task after the triggering write has
//! committed. Failures are logged and never reach the caller.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use sqlx::SqlitePool;
use tokio::task::JoinHandle;

use crate::{
    config::MailConfig,
    error::AppError,
    models::{
        department::Department,
        employee_request::{DecisionOutcome, EmployeeRequest},
    },
    repositories::DepartmentRepository,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("department lookup failed: {0}")]
    Lookup(#[from] AppError),
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Outbound mail channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        tracing::info!(
            target: "notification",
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Email notification (not sent, mail disabled)"
        );
        Ok(())
    }
}

pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpTransport {
    pub fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
        };
        let builder = builder.port(config.port);
        let mailer = match (&config.username, &config.password) {
            (Some(username), password) => builder
                .credentials(Credentials::new(
                    username.clone(),
                    password.clone().unwrap_or_default(),
                ))
                .build(),
            (None, _) => builder.build(),
        };

        Ok(Self {
            mailer,
            from: config.default_sender.parse()?,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())?;

        self.mailer.send(email).await?;
        Ok(())
    }
}

/// Picks the SMTP transport when mail is enabled, the log transport otherwise.
pub fn transport_from_config(
    config: &MailConfig,
) -> Result<Arc<dyn MailTransport>, NotificationError> {
    if config.enabled {
        Ok(Arc::new(SmtpTransport::from_config(config)?))
    } else {
        Ok(Arc::new(LogTransport))
    }
}

/// Message telling a department manager about a new request.
///
/// `None` when the department has no manager address on file.
pub fn manager_message(request: &EmployeeRequest, department: &Department) -> Option<EmailMessage> {
    let to = department.manager_email.clone()?;
    Some(EmailMessage {
        to,
        subject: format!(
            "New request: {} - {}",
            request.request_type(),
            request.employee_name
        ),
        body: format!(
            "Employee {} submitted a {} request (#{}).\nStatus: {}",
            request.employee_name,
            request.request_type(),
            request.id,
            request.status
        ),
    })
}

/// Message telling the employee how their request was decided.
pub fn employee_message(request: &EmployeeRequest, outcome: DecisionOutcome) -> EmailMessage {
    let comments = request
        .approval
        .as_ref()
        .map(|approval| approval.comments.as_str())
        .unwrap_or_default();
    EmailMessage {
        to: request.employee_email.clone(),
        subject: format!("Your request has been {}", outcome.verb()),
        body: format!(
            "Request #{} - Status: {}\nComments: {}",
            request.id, request.status, comments
        ),
    }
}

/// Lifecycle events that trigger a notification.
#[derive(Debug, Clone)]
pub enum RequestEvent {
    Submitted(EmployeeRequest),
    Decided {
        request: EmployeeRequest,
        outcome: DecisionOutcome,
    },
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: SqlitePool,
    transport: Arc<dyn MailTransport>,
}

impl NotificationDispatcher {
    pub fn new(pool: SqlitePool, transport: Arc<dyn MailTransport>) -> Self {
        Self { pool, transport }
    }

    /// Delivers the event on a detached task.
    pub fn dispatch(&self, event: RequestEvent) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(err) = dispatcher.deliver(&event).await {
                tracing::warn!(error = %err, event = ?event, "Failed to deliver notification");
            }
        })
    }

    pub async fn deliver(&self, event: &RequestEvent) -> Result<(), NotificationError> {
        match event {
            RequestEvent::Submitted(request) => {
                let Some(name) = request.department.as_deref() else {
                    return Ok(());
                };
                let department = DepartmentRepository::new()
                    .find_by_name(&self.pool, name)
                    .await?;
                let Some(message) = department
                    .as_ref()
                    .and_then(|department| manager_message(request, department))
                else {
                    tracing::debug!(department = %name, "No manager to notify");
                    return Ok(());
                };
                self.transport.send(&message).await
            }
            RequestEvent::Decided { request, outcome } => {
                self.transport
                    .send(&employee_message(request, *outcome))
                    .await
            }
        }
    }
}
