//! The authoritative appointment ledger.
//!
//! Owns the canonical list of all appointments across the system and enforces
//! the status-transition rules. Requesting an appointment also arranges the
//! advance reminder as a best-effort side effect; a reminder that cannot be
//! scheduled never fails the request.

use crate::audit::AuditLog;
use crate::directory::UserDirectory;
use crate::models::{Appointment, AppointmentStatus, DecisionAction, SharedAppointment};
use crate::reminder::{appointment_reminder_time, ReminderScheduler};
use chrono::NaiveDate;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid appointment date '{input}': {source}")]
    InvalidDate {
        input: String,
        source: chrono::ParseError,
    },
    #[error("appointment not found for patient '{patient_id}' with Dr. {doctor_name} on {date}")]
    NotFound {
        patient_id: String,
        doctor_name: String,
        date: NaiveDate,
    },
    #[error(transparent)]
    Invalid(#[from] crate::models::ModelError),
}

/// Per-token failure inside a decision batch. Reported, never aborting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("malformed token '{0}'")]
    MalformedToken(String),
    #[error("invalid index: {0}")]
    InvalidIndex(usize),
    #[error("invalid action '{action}' for appointment index {index}")]
    InvalidAction { index: usize, action: char },
    #[error("appointment at index {index} is already {status}")]
    AlreadyDecided {
        index: usize,
        status: AppointmentStatus,
    },
}

/// A decision that was applied to the shared appointment.
#[derive(Debug, Clone)]
pub struct AppliedDecision {
    /// 1-based index into the pending snapshot the doctor was shown.
    pub index: usize,
    pub action: DecisionAction,
    pub appointment: SharedAppointment,
}

/// Outcome of a whole decision batch: what stuck and what was rejected.
#[derive(Debug, Default)]
pub struct BatchDecisionReport {
    pub applied: Vec<AppliedDecision>,
    pub errors: Vec<DecisionError>,
}

/// Shared mutable ledger of every appointment in the system.
pub struct AppointmentLedger {
    appointments: Mutex<Vec<SharedAppointment>>,
    directory: Arc<UserDirectory>,
    scheduler: ReminderScheduler,
    audit: Arc<AuditLog>,
}

impl AppointmentLedger {
    pub fn new(
        directory: Arc<UserDirectory>,
        scheduler: ReminderScheduler,
        audit: Arc<AuditLog>,
    ) -> Self {
        AppointmentLedger {
            appointments: Mutex::new(Vec::new()),
            directory,
            scheduler,
            audit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SharedAppointment>> {
        self.appointments.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// File a new appointment request.
    ///
    /// The date must be `YYYY-MM-DD`; a malformed date fails only this
    /// request. A valid request always yields a pending appointment; the
    /// advance reminder is then scheduled best-effort.
    pub fn request(
        &self,
        patient_id: &str,
        doctor_name: &str,
        date: &str,
    ) -> Result<SharedAppointment, LedgerError> {
        let parsed = date
            .parse::<NaiveDate>()
            .map_err(|source| LedgerError::InvalidDate {
                input: date.to_string(),
                source,
            })?;

        let appointment =
            Appointment::new(patient_id.to_string(), doctor_name.to_string(), parsed)?;
        let handle: SharedAppointment = Arc::new(Mutex::new(appointment));
        self.lock().push(handle.clone());
        info!(patient_id, doctor_name, date, "appointment requested");

        self.schedule_reminder(patient_id, doctor_name, parsed);
        Ok(handle)
    }

    /// Best-effort reminder scheduling; never propagates a failure into the
    /// request path.
    fn schedule_reminder(&self, patient_id: &str, doctor_name: &str, date: NaiveDate) {
        let recipient = match self.directory.lookup(patient_id) {
            Some(info) => info.name,
            None => {
                warn!(patient_id, "failed to schedule appointment reminder: patient not registered");
                return;
            }
        };
        let message = format!("You have an appointment with Dr. {doctor_name} on {date}");
        self.scheduler
            .schedule_appointment_reminder(&recipient, &message, appointment_reminder_time(date));
    }

    /// Exact-match lookup across all three identifying fields.
    pub fn find_by_exact(
        &self,
        patient_id: &str,
        doctor_name: &str,
        date: NaiveDate,
    ) -> Option<SharedAppointment> {
        self.lock()
            .iter()
            .find(|a| lock_appointment(a).matches(patient_id, doctor_name, date))
            .cloned()
    }

    /// Administrative approve-by-details. Not finding the appointment is a
    /// normal, reportable outcome.
    pub fn approve_by_details(
        &self,
        patient_id: &str,
        doctor_name: &str,
        date: NaiveDate,
    ) -> Result<(), LedgerError> {
        self.decide_by_details(patient_id, doctor_name, date, DecisionAction::Approve)
    }

    /// Administrative cancel-by-details.
    pub fn cancel_by_details(
        &self,
        patient_id: &str,
        doctor_name: &str,
        date: NaiveDate,
    ) -> Result<(), LedgerError> {
        self.decide_by_details(patient_id, doctor_name, date, DecisionAction::Cancel)
    }

    fn decide_by_details(
        &self,
        patient_id: &str,
        doctor_name: &str,
        date: NaiveDate,
        action: DecisionAction,
    ) -> Result<(), LedgerError> {
        let handle =
            self.find_by_exact(patient_id, doctor_name, date)
                .ok_or_else(|| LedgerError::NotFound {
                    patient_id: patient_id.to_string(),
                    doctor_name: doctor_name.to_string(),
                    date,
                })?;
        let mut appointment = lock_appointment(&handle);
        appointment.decide(action)?;
        self.audit
            .append(&format!("Appointment {}: {}", action.verb(), appointment));
        Ok(())
    }

    /// Pending appointments for a doctor, case-insensitive name match, in
    /// ledger insertion order. The returned snapshot is the display sequence
    /// a decision batch is indexed against.
    pub fn list_pending(&self, doctor_name: &str) -> Vec<SharedAppointment> {
        self.lock()
            .iter()
            .filter(|a| {
                let appt = lock_appointment(a);
                appt.status() == AppointmentStatus::Pending && appt.is_with_doctor(doctor_name)
            })
            .cloned()
            .collect()
    }

    /// Ids of patients holding an approved appointment with the doctor,
    /// deduplicated in first-seen order.
    pub fn list_approved_patient_ids(&self, doctor_name: &str) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for handle in self.lock().iter() {
            let appt = lock_appointment(handle);
            if appt.status() == AppointmentStatus::Approved
                && appt.is_with_doctor(doctor_name)
                && !ids.contains(&appt.patient_id)
            {
                ids.push(appt.patient_id.clone());
            }
        }
        ids
    }

    /// Apply a doctor's decision batch against a pending-list snapshot.
    ///
    /// `decisions` is whitespace-separated tokens of the form
    /// `<1-based index><A|C>` (case-insensitive); the index is relative to
    /// `pending` exactly as it was displayed. Tokens shorter than two
    /// characters are skipped; every other malformed or out-of-range token is
    /// reported in the result without affecting the rest of the batch.
    pub fn apply_batch_decision(
        &self,
        doctor_name: &str,
        pending: &[SharedAppointment],
        decisions: &str,
    ) -> BatchDecisionReport {
        let mut report = BatchDecisionReport::default();

        for token in decisions.split_whitespace() {
            if token.chars().count() < 2 {
                continue;
            }
            match self.apply_token(doctor_name, pending, token) {
                Ok(applied) => report.applied.push(applied),
                Err(err) => report.errors.push(err),
            }
        }
        report
    }

    fn apply_token(
        &self,
        doctor_name: &str,
        pending: &[SharedAppointment],
        token: &str,
    ) -> Result<AppliedDecision, DecisionError> {
        // The last character is the action letter, everything before it the
        // 1-based index.
        let action_letter = token
            .chars()
            .next_back()
            .ok_or_else(|| DecisionError::MalformedToken(token.to_string()))?;
        let index_part = &token[..token.len() - action_letter.len_utf8()];
        let index: usize = index_part
            .parse()
            .map_err(|_| DecisionError::MalformedToken(token.to_string()))?;

        if index < 1 || index > pending.len() {
            return Err(DecisionError::InvalidIndex(index));
        }
        let action = DecisionAction::from_letter(action_letter).ok_or(
            DecisionError::InvalidAction {
                index,
                action: action_letter,
            },
        )?;

        let handle = &pending[index - 1];
        let mut appointment = lock_appointment(handle);
        if appointment.decide(action).is_err() {
            return Err(DecisionError::AlreadyDecided {
                index,
                status: appointment.status(),
            });
        }
        self.audit.append(&format!(
            "Appointment {} by Doctor {}: {}",
            action.verb(),
            doctor_name,
            appointment
        ));
        drop(appointment);

        Ok(AppliedDecision {
            index,
            action,
            appointment: handle.clone(),
        })
    }

    /// Number of appointments ever filed, any status.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn lock_appointment(handle: &SharedAppointment) -> std::sync::MutexGuard<'_, Appointment> {
    handle.lock().unwrap_or_else(|e| e.into_inner())
}
