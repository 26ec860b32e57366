//! Notification channels and the service that dispatches through them.
//!
//! A [`Transport`] is the outward side of a channel (SMTP, SMS gateway) and is
//! kept pluggable; the crate ships a logging transport only. A channel send
//! also records a tagged copy of the message in the recipient's inbox-kind
//! mailbox, which is the part tests and collaborator code observe.

use crate::directory::UserDirectory;
use crate::models::MailboxKind;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Diagnostic carried by a failed delivery attempt.
#[derive(Debug, Error)]
#[error("{channel} delivery to '{recipient}' failed: {reason}")]
pub struct TransportError {
    pub channel: &'static str,
    pub recipient: String,
    pub reason: String,
}

/// Outward delivery mechanism behind a channel.
pub trait Transport: Send + Sync {
    fn deliver(&self, recipient: &str, message: &str) -> Result<(), TransportError>;
}

/// Default transport: records the send in the log and always succeeds.
pub struct LogTransport {
    channel: &'static str,
}

impl LogTransport {
    pub fn new(channel: &'static str) -> Self {
        LogTransport { channel }
    }
}

impl Transport for LogTransport {
    fn deliver(&self, recipient: &str, message: &str) -> Result<(), TransportError> {
        info!("{} sent to {}: {}", self.channel, recipient, message);
        Ok(())
    }
}

/// A notification channel: transport plus the mailbox tag it stamps on
/// delivered copies.
pub trait NotificationChannel: Send + Sync {
    fn tag(&self) -> &'static str;

    fn send(
        &self,
        directory: &UserDirectory,
        recipient: &str,
        message: &str,
    ) -> Result<(), TransportError>;
}

/// Email-like channel. Mailbox copies are tagged `Email Alert:`.
pub struct EmailChannel {
    transport: Arc<dyn Transport>,
}

impl EmailChannel {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        EmailChannel { transport }
    }
}

impl Default for EmailChannel {
    fn default() -> Self {
        EmailChannel::new(Arc::new(LogTransport::new("Email")))
    }
}

impl NotificationChannel for EmailChannel {
    fn tag(&self) -> &'static str {
        "Email Alert"
    }

    fn send(
        &self,
        directory: &UserDirectory,
        recipient: &str,
        message: &str,
    ) -> Result<(), TransportError> {
        self.transport.deliver(recipient, message)?;
        directory.resolve_and_deliver(
            recipient,
            &format!("{}: {}", self.tag(), message),
            MailboxKind::Inbox,
        );
        Ok(())
    }
}

/// SMS-like channel. Mailbox copies are tagged `SMS Alert:`.
pub struct SmsChannel {
    transport: Arc<dyn Transport>,
}

impl SmsChannel {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        SmsChannel { transport }
    }
}

impl Default for SmsChannel {
    fn default() -> Self {
        SmsChannel::new(Arc::new(LogTransport::new("SMS")))
    }
}

impl NotificationChannel for SmsChannel {
    fn tag(&self) -> &'static str {
        "SMS Alert"
    }

    fn send(
        &self,
        directory: &UserDirectory,
        recipient: &str,
        message: &str,
    ) -> Result<(), TransportError> {
        self.transport.deliver(recipient, message)?;
        directory.resolve_and_deliver(
            recipient,
            &format!("{}: {}", self.tag(), message),
            MailboxKind::Inbox,
        );
        Ok(())
    }
}

/// Dispatch facade over the two channels.
///
/// Delivery failures are caught and logged here; no consumer of the service
/// fails because a transport did.
#[derive(Clone)]
pub struct NotificationService {
    directory: Arc<UserDirectory>,
    email: Arc<dyn NotificationChannel>,
    sms: Arc<dyn NotificationChannel>,
}

impl NotificationService {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        NotificationService {
            directory,
            email: Arc::new(EmailChannel::default()),
            sms: Arc::new(SmsChannel::default()),
        }
    }

    /// Build a service over custom channels, e.g. real transports or
    /// deliberately failing ones in tests.
    pub fn with_channels(
        directory: Arc<UserDirectory>,
        email: Arc<dyn NotificationChannel>,
        sms: Arc<dyn NotificationChannel>,
    ) -> Self {
        NotificationService { directory, email, sms }
    }

    pub fn directory(&self) -> &Arc<UserDirectory> {
        &self.directory
    }

    pub fn send_email_alert(&self, recipient: &str, message: &str) {
        if let Err(err) = self.email.send(&self.directory, recipient, message) {
            warn!("email alert not delivered: {err}");
        }
    }

    pub fn send_sms_alert(&self, recipient: &str, message: &str) {
        if let Err(err) = self.sms.send(&self.directory, recipient, message) {
            warn!("sms alert not delivered: {err}");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Transport, TransportError};

    /// Transport that always refuses, for the catch-and-continue paths.
    pub(crate) struct FailingTransport(pub(crate) &'static str);

    impl Transport for FailingTransport {
        fn deliver(&self, recipient: &str, _message: &str) -> Result<(), TransportError> {
            Err(TransportError {
                channel: self.0,
                recipient: recipient.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FailingTransport;
    use super::*;

    fn service() -> (Arc<UserDirectory>, NotificationService) {
        let dir = Arc::new(UserDirectory::new());
        dir.register_patient("P001", "Gulwarina").unwrap();
        let service = NotificationService::new(dir.clone());
        (dir, service)
    }

    #[test]
    fn email_alert_lands_in_inbox_with_tag() {
        let (dir, service) = service();
        service.send_email_alert("Gulwarina", "see you tomorrow");
        assert_eq!(
            dir.patient_inbox("P001").unwrap(),
            vec!["Email Alert: see you tomorrow"]
        );
    }

    #[test]
    fn sms_alert_lands_in_inbox_with_tag() {
        let (dir, service) = service();
        service.send_sms_alert("P001", "see you tomorrow");
        assert_eq!(
            dir.patient_inbox("P001").unwrap(),
            vec!["SMS Alert: see you tomorrow"]
        );
    }

    #[test]
    fn transport_failure_skips_the_mailbox_copy_without_panicking() {
        let dir = Arc::new(UserDirectory::new());
        dir.register_patient("P001", "Gulwarina").unwrap();
        let service = NotificationService::with_channels(
            dir.clone(),
            Arc::new(EmailChannel::new(Arc::new(FailingTransport("Email")))),
            Arc::new(SmsChannel::default()),
        );

        service.send_email_alert("P001", "lost mail");
        service.send_sms_alert("P001", "still here");

        // Only the surviving channel appended its copy.
        assert_eq!(dir.patient_inbox("P001").unwrap(), vec!["SMS Alert: still here"]);
    }

    #[test]
    fn alerts_to_unknown_recipients_are_dropped() {
        let (dir, service) = service();
        service.send_sms_alert("nobody", "into the void");
        assert!(dir.patient_inbox("P001").unwrap().is_empty());
    }
}
