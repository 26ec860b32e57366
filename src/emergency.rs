//! Vital-sign threshold monitoring and the panic button.
//!
//! Both are thin consumers of the notification service: the monitor fires an
//! SMS alert on a critical reading, the panic trigger always fires two.

use crate::notify::NotificationService;
use tracing::{info, warn};

const HEART_RATE_WARNING: u32 = 100;
const HEART_RATE_CRITICAL: u32 = 120;
const BLOOD_PRESSURE_CRITICAL: u32 = 180;
const OXYGEN_LOW: u32 = 90;

/// Classification of a single vitals reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalsAssessment {
    Normal,
    Warning,
    Critical,
}

/// Stateless per-reading classification.
pub fn assess(heart_rate: u32, blood_pressure: u32, oxygen_level: u32) -> VitalsAssessment {
    if heart_rate > HEART_RATE_CRITICAL
        || blood_pressure > BLOOD_PRESSURE_CRITICAL
        || oxygen_level < OXYGEN_LOW
    {
        VitalsAssessment::Critical
    } else if heart_rate > HEART_RATE_WARNING {
        VitalsAssessment::Warning
    } else {
        VitalsAssessment::Normal
    }
}

pub struct EmergencyMonitor {
    notifications: NotificationService,
}

impl EmergencyMonitor {
    pub fn new(notifications: NotificationService) -> Self {
        EmergencyMonitor { notifications }
    }

    /// Classify a reading and alert the patient on a critical one.
    ///
    /// Warning and normal readings are reported locally only; no notification
    /// is dispatched for them.
    pub fn check(
        &self,
        patient_name: &str,
        heart_rate: u32,
        blood_pressure: u32,
        oxygen_level: u32,
    ) -> VitalsAssessment {
        let assessment = assess(heart_rate, blood_pressure, oxygen_level);
        match assessment {
            VitalsAssessment::Critical => {
                warn!(
                    patient = patient_name,
                    heart_rate, blood_pressure, oxygen_level, "abnormal vitals, emergency alert"
                );
                self.notifications
                    .send_sms_alert(patient_name, "Immediate attention needed.");
            }
            VitalsAssessment::Warning => {
                warn!(patient = patient_name, heart_rate, "increased heart rate detected");
            }
            VitalsAssessment::Normal => {
                info!(patient = patient_name, "vitals are normal");
            }
        }
        assessment
    }
}

pub struct PanicTrigger {
    notifications: NotificationService,
}

impl PanicTrigger {
    pub fn new(notifications: NotificationService) -> Self {
        PanicTrigger { notifications }
    }

    /// Alert the patient and the named doctor unconditionally.
    ///
    /// No existence check is made on either name; an unmatched recipient
    /// means that alert is silently dropped by resolution.
    pub fn press(&self, patient_name: &str, doctor_name: &str) {
        warn!(patient = patient_name, "panic button pressed");
        self.notifications.send_sms_alert(
            patient_name,
            "You triggered the panic button, please wait for the doctor.",
        );
        self.notifications.send_sms_alert(
            doctor_name,
            &format!("Immediate response needed for {patient_name}"),
        );
    }
}
