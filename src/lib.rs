//! Clinical appointment lifecycle and reminder notification core.
//!
//! Patients request appointments with named doctors, doctors approve or
//! cancel them in batches, and the system delivers an advance reminder to the
//! right recipient over the right channel. The interactive front end is an
//! external collaborator: it resolves recipients through [`UserDirectory`],
//! drives the lifecycle through [`AppointmentLedger`], and hands deferred
//! work to [`ReminderScheduler`].

pub mod audit;
pub mod chat;
pub mod directory;
pub mod emergency;
pub mod ledger;
pub mod models;
pub mod notify;
pub mod reminder;

pub use audit::AuditLog;
pub use chat::ChatHub;
pub use directory::{DirectoryError, RecipientInfo, RecipientKind, UserDirectory};
pub use emergency::{assess, EmergencyMonitor, PanicTrigger, VitalsAssessment};
pub use ledger::{
    AppliedDecision, AppointmentLedger, BatchDecisionReport, DecisionError, LedgerError,
};
pub use models::{
    Appointment, AppointmentStatus, DecisionAction, Doctor, MailboxKind, ModelError, Patient,
    SharedAppointment,
};
pub use notify::{
    EmailChannel, LogTransport, NotificationChannel, NotificationService, SmsChannel, Transport,
    TransportError,
};
pub use reminder::{appointment_reminder_time, ReminderScheduler};
