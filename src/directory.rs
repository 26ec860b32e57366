//! Recipient registry and notification resolution.
//!
//! The directory holds the patient and doctor registries and resolves a
//! human-readable name or id to mailbox targets. Resolution is a deliberate
//! fan-out: every entry of either kind whose name or id matches
//! case-insensitively receives its own copy of the message. An unmatched
//! recipient is a silent drop, not an error.

use crate::models::{Doctor, MailboxKind, ModelError, Patient};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error(transparent)]
    Invalid(#[from] ModelError),
    #[error("a {kind} with id '{id}' is already registered")]
    DuplicateId { kind: &'static str, id: String },
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
}

/// Which registry a resolved recipient came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientKind {
    Patient,
    Doctor,
}

/// Identity snapshot of a registered recipient, without mailbox contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientInfo {
    pub kind: RecipientKind,
    pub user_id: String,
    pub name: String,
}

#[derive(Default)]
struct Registries {
    patients: Vec<Patient>,
    doctors: Vec<Doctor>,
}

/// Registry of all notification recipients.
///
/// One directory-wide lock serialises mailbox appends from fired reminder
/// tasks and the synchronous path, so no append is lost or interleaved at the
/// low concurrency this system sees.
pub struct UserDirectory {
    registries: Mutex<Registries>,
}

impl UserDirectory {
    pub fn new() -> Self {
        UserDirectory {
            registries: Mutex::new(Registries::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registries> {
        // Mailbox appends are infallible; a poisoned lock only means another
        // thread panicked mid-append, and the registries are still usable.
        self.registries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register_patient(&self, user_id: &str, name: &str) -> Result<(), DirectoryError> {
        let patient = Patient::new(user_id.to_string(), name.to_string())?;
        let mut reg = self.lock();
        if reg.patients.iter().any(|p| p.user_id == patient.user_id) {
            return Err(DirectoryError::DuplicateId {
                kind: "patient",
                id: patient.user_id,
            });
        }
        reg.patients.push(patient);
        Ok(())
    }

    pub fn register_doctor(&self, user_id: &str, name: &str) -> Result<(), DirectoryError> {
        let doctor = Doctor::new(user_id.to_string(), name.to_string())?;
        let mut reg = self.lock();
        if reg.doctors.iter().any(|d| d.user_id == doctor.user_id) {
            return Err(DirectoryError::DuplicateId {
                kind: "doctor",
                id: doctor.user_id,
            });
        }
        reg.doctors.push(doctor);
        Ok(())
    }

    pub fn remove_patient(&self, user_id: &str) -> Result<(), DirectoryError> {
        let mut reg = self.lock();
        match reg.patients.iter().position(|p| p.user_id == user_id) {
            Some(idx) => {
                reg.patients.remove(idx);
                Ok(())
            }
            None => Err(DirectoryError::NotFound {
                kind: "patient",
                id: user_id.to_string(),
            }),
        }
    }

    pub fn remove_doctor(&self, user_id: &str) -> Result<(), DirectoryError> {
        let mut reg = self.lock();
        match reg.doctors.iter().position(|d| d.user_id == user_id) {
            Some(idx) => {
                reg.doctors.remove(idx);
                Ok(())
            }
            None => Err(DirectoryError::NotFound {
                kind: "doctor",
                id: user_id.to_string(),
            }),
        }
    }

    /// Look up a recipient by exact id, patients first.
    pub fn lookup(&self, user_id: &str) -> Option<RecipientInfo> {
        let reg = self.lock();
        if let Some(p) = reg.patients.iter().find(|p| p.user_id == user_id) {
            return Some(RecipientInfo {
                kind: RecipientKind::Patient,
                user_id: p.user_id.clone(),
                name: p.name.clone(),
            });
        }
        reg.doctors
            .iter()
            .find(|d| d.user_id == user_id)
            .map(|d| RecipientInfo {
                kind: RecipientKind::Doctor,
                user_id: d.user_id.clone(),
                name: d.name.clone(),
            })
    }

    /// Deliver `message` to every recipient matching `name_or_id`.
    ///
    /// Both registries are always scanned; a name shared by a patient and a
    /// doctor delivers to both mailboxes, and a name borne by several entries
    /// of one kind delivers once per entry. Returns the number of mailboxes
    /// appended to; zero matches means the message is dropped.
    pub fn resolve_and_deliver(
        &self,
        name_or_id: &str,
        message: &str,
        mailbox: MailboxKind,
    ) -> usize {
        let mut reg = self.lock();
        let mut delivered = 0;

        for patient in reg
            .patients
            .iter_mut()
            .filter(|p| matches_recipient(&p.name, &p.user_id, name_or_id))
        {
            let target = match mailbox {
                MailboxKind::Inbox => &mut patient.inbox,
                MailboxKind::Chat => &mut patient.chat,
            };
            target.push(message.to_string());
            delivered += 1;
        }

        for doctor in reg
            .doctors
            .iter_mut()
            .filter(|d| matches_recipient(&d.name, &d.user_id, name_or_id))
        {
            let target = match mailbox {
                MailboxKind::Inbox => &mut doctor.alerts,
                MailboxKind::Chat => &mut doctor.chat,
            };
            target.push(message.to_string());
            delivered += 1;
        }

        if delivered == 0 {
            debug!(recipient = name_or_id, "no registered recipient matched, message dropped");
        }
        delivered
    }

    /// Append directly to one looked-up recipient's mailbox, no fan-out.
    pub fn append_mailbox(
        &self,
        recipient: &RecipientInfo,
        mailbox: MailboxKind,
        text: &str,
    ) -> Result<(), DirectoryError> {
        let mut reg = self.lock();
        let target = match recipient.kind {
            RecipientKind::Patient => reg
                .patients
                .iter_mut()
                .find(|p| p.user_id == recipient.user_id)
                .map(|p| match mailbox {
                    MailboxKind::Inbox => &mut p.inbox,
                    MailboxKind::Chat => &mut p.chat,
                }),
            RecipientKind::Doctor => reg
                .doctors
                .iter_mut()
                .find(|d| d.user_id == recipient.user_id)
                .map(|d| match mailbox {
                    MailboxKind::Inbox => &mut d.alerts,
                    MailboxKind::Chat => &mut d.chat,
                }),
        };
        match target {
            Some(messages) => {
                messages.push(text.to_string());
                Ok(())
            }
            None => Err(DirectoryError::NotFound {
                kind: match recipient.kind {
                    RecipientKind::Patient => "patient",
                    RecipientKind::Doctor => "doctor",
                },
                id: recipient.user_id.clone(),
            }),
        }
    }

    /// Snapshot of a patient's inbox, in delivery order.
    pub fn patient_inbox(&self, user_id: &str) -> Option<Vec<String>> {
        let reg = self.lock();
        reg.patients
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.inbox.clone())
    }

    pub fn patient_chat(&self, user_id: &str) -> Option<Vec<String>> {
        let reg = self.lock();
        reg.patients
            .iter()
            .find(|p| p.user_id == user_id)
            .map(|p| p.chat.clone())
    }

    /// Snapshot of a doctor's alert list, in delivery order.
    pub fn doctor_alerts(&self, user_id: &str) -> Option<Vec<String>> {
        let reg = self.lock();
        reg.doctors
            .iter()
            .find(|d| d.user_id == user_id)
            .map(|d| d.alerts.clone())
    }

    pub fn doctor_chat(&self, user_id: &str) -> Option<Vec<String>> {
        let reg = self.lock();
        reg.doctors
            .iter()
            .find(|d| d.user_id == user_id)
            .map(|d| d.chat.clone())
    }

    /// All registered patient ids, in registration order.
    pub fn patient_ids(&self) -> Vec<String> {
        self.lock().patients.iter().map(|p| p.user_id.clone()).collect()
    }

    /// All registered doctor ids, in registration order.
    pub fn doctor_ids(&self) -> Vec<String> {
        self.lock().doctors.iter().map(|d| d.user_id.clone()).collect()
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_recipient(name: &str, user_id: &str, query: &str) -> bool {
    name.eq_ignore_ascii_case(query) || user_id.eq_ignore_ascii_case(query)
}
