//! Core data types for the clinic workflow.
//!
//! This module defines the structures shared across the crate:
//! - AppointmentStatus / DecisionAction: the lifecycle state machine
//! - Appointment: a patient's request for a visit with a named doctor
//! - Patient / Doctor: notification recipients with mailboxes

use chrono::NaiveDate;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Shared handle to an appointment in the ledger.
///
/// The ledger owns the canonical list; patient and doctor views hold clones
/// of the same handle, so a status change made through one view is visible
/// through every other without re-fetching.
pub type SharedAppointment = Arc<Mutex<Appointment>>;

/// Errors raised while constructing or mutating model values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("appointment is already {0}, only pending appointments can be decided")]
    AlreadyDecided(AppointmentStatus),
}

/// Lifecycle states of an appointment.
///
/// The only legal transitions are Pending -> Approved and Pending -> Cancelled.
/// Approved and Cancelled are terminal; a patient who wants another visit
/// files a new appointment instead of reviving an old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Cancelled,
}

impl AppointmentStatus {
    pub fn name(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Approved => "approved",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A doctor's verdict on a pending appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    Approve,
    Cancel,
}

impl DecisionAction {
    /// Parse the action letter of a batch decision token, case-insensitive.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(DecisionAction::Approve),
            'C' => Some(DecisionAction::Cancel),
            _ => None,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            DecisionAction::Approve => "approved",
            DecisionAction::Cancel => "cancelled",
        }
    }
}

/// A requested visit with a named doctor on a calendar date.
///
/// Appointments carry no explicit identifier; administrative operations match
/// them by the (patient id, doctor name, date) value tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub date: NaiveDate,
    pub doctor_name: String,
    pub patient_id: String,
    status: AppointmentStatus,
}

impl Appointment {
    pub fn new(patient_id: String, doctor_name: String, date: NaiveDate) -> Result<Self, ModelError> {
        if patient_id.is_empty() {
            return Err(ModelError::EmptyField("patient id"));
        }
        if doctor_name.is_empty() {
            return Err(ModelError::EmptyField("doctor name"));
        }

        Ok(Appointment {
            date,
            doctor_name,
            patient_id,
            status: AppointmentStatus::Pending,
        })
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    /// Apply a doctor's decision. Only pending appointments can move.
    pub fn decide(&mut self, action: DecisionAction) -> Result<(), ModelError> {
        if self.status != AppointmentStatus::Pending {
            return Err(ModelError::AlreadyDecided(self.status));
        }
        self.status = match action {
            DecisionAction::Approve => AppointmentStatus::Approved,
            DecisionAction::Cancel => AppointmentStatus::Cancelled,
        };
        Ok(())
    }

    /// Exact match on all three identifying fields.
    pub fn matches(&self, patient_id: &str, doctor_name: &str, date: NaiveDate) -> bool {
        self.patient_id == patient_id && self.doctor_name == doctor_name && self.date == date
    }

    /// Case-insensitive doctor-name match used by the per-doctor listings.
    pub fn is_with_doctor(&self, doctor_name: &str) -> bool {
        self.doctor_name.eq_ignore_ascii_case(doctor_name)
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Appointment with Dr. {} on {}, Status: {}",
            self.doctor_name, self.date, self.status
        )
    }
}

/// Which mailbox of a recipient a delivery targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxKind {
    /// Alerts and reminders: a patient's inbox, a doctor's alert list.
    Inbox,
    /// Chat history kept per recipient, independent of the hub transcript.
    Chat,
}

/// A registered patient with their delivered-message mailboxes.
#[derive(Debug, Clone)]
pub struct Patient {
    pub user_id: String,
    pub name: String,
    pub inbox: Vec<String>,
    pub chat: Vec<String>,
}

impl Patient {
    pub fn new(user_id: String, name: String) -> Result<Self, ModelError> {
        if user_id.is_empty() {
            return Err(ModelError::EmptyField("patient id"));
        }
        if name.is_empty() {
            return Err(ModelError::EmptyField("patient name"));
        }

        Ok(Patient {
            user_id,
            name,
            inbox: Vec::new(),
            chat: Vec::new(),
        })
    }
}

/// A registered doctor. The alert list is the doctor's inbox-kind mailbox.
#[derive(Debug, Clone)]
pub struct Doctor {
    pub user_id: String,
    pub name: String,
    pub alerts: Vec<String>,
    pub chat: Vec<String>,
}

impl Doctor {
    pub fn new(user_id: String, name: String) -> Result<Self, ModelError> {
        if user_id.is_empty() {
            return Err(ModelError::EmptyField("doctor id"));
        }
        if name.is_empty() {
            return Err(ModelError::EmptyField("doctor name"));
        }

        Ok(Doctor {
            user_id,
            name,
            alerts: Vec::new(),
            chat: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 14).unwrap()
    }

    #[test]
    fn new_appointment_starts_pending() {
        let appt = Appointment::new("P001".into(), "Dr. X".into(), sample_date()).unwrap();
        assert_eq!(appt.status(), AppointmentStatus::Pending);
    }

    #[test]
    fn decide_moves_pending_to_terminal_state() {
        let mut appt = Appointment::new("P001".into(), "Dr. X".into(), sample_date()).unwrap();
        appt.decide(DecisionAction::Approve).unwrap();
        assert_eq!(appt.status(), AppointmentStatus::Approved);
    }

    #[test]
    fn decide_rejects_terminal_states() {
        let mut appt = Appointment::new("P001".into(), "Dr. X".into(), sample_date()).unwrap();
        appt.decide(DecisionAction::Cancel).unwrap();
        let err = appt.decide(DecisionAction::Approve).unwrap_err();
        assert_eq!(err, ModelError::AlreadyDecided(AppointmentStatus::Cancelled));
    }

    #[test]
    fn doctor_match_is_case_insensitive() {
        let appt = Appointment::new("P001".into(), "Dr. X".into(), sample_date()).unwrap();
        assert!(appt.is_with_doctor("dr. x"));
        assert!(!appt.is_with_doctor("Dr. Y"));
    }

    #[test]
    fn action_letter_parsing() {
        assert_eq!(DecisionAction::from_letter('a'), Some(DecisionAction::Approve));
        assert_eq!(DecisionAction::from_letter('C'), Some(DecisionAction::Cancel));
        assert_eq!(DecisionAction::from_letter('x'), None);
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert!(Appointment::new(String::new(), "Dr. X".into(), sample_date()).is_err());
        assert!(Patient::new("P001".into(), String::new()).is_err());
        assert!(Doctor::new(String::new(), "Muska Saleem".into()).is_err());
    }

    #[test]
    fn display_includes_doctor_date_and_status() {
        let appt = Appointment::new("P001".into(), "Smith".into(), sample_date()).unwrap();
        assert_eq!(
            appt.to_string(),
            "Appointment with Dr. Smith on 2026-09-14, Status: pending"
        );
    }
}
