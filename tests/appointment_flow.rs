//! End-to-end appointment lifecycle: request, doctor decision batch, and the
//! deferred reminder landing in the patient's inbox.

use chrono::{Duration, Local};
use clinicflow::{
    AppointmentLedger, AppointmentStatus, AuditLog, NotificationService, ReminderScheduler,
    UserDirectory,
};
use std::sync::Arc;

fn init_tracing() {
    // One subscriber for the whole test binary; later calls are no-ops.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn clinic() -> (Arc<UserDirectory>, Arc<AuditLog>, ReminderScheduler, AppointmentLedger) {
    init_tracing();
    let directory = Arc::new(UserDirectory::new());
    directory.register_patient("P001", "Gulwarina").unwrap();
    directory.register_doctor("D001", "Muska Saleem").unwrap();
    let audit = Arc::new(AuditLog::new());
    let scheduler = ReminderScheduler::spawn(NotificationService::new(directory.clone()));
    let ledger = AppointmentLedger::new(directory.clone(), scheduler.clone(), audit.clone());
    (directory, audit, scheduler, ledger)
}

#[tokio::test]
async fn request_then_approve_round_trip() {
    let (_directory, audit, _scheduler, ledger) = clinic();
    let tomorrow = (Local::now().date_naive() + Duration::days(1)).to_string();

    let requested = ledger.request("P001", "Dr. X", &tomorrow).unwrap();
    assert_eq!(requested.lock().unwrap().status(), AppointmentStatus::Pending);

    let pending = ledger.list_pending("Dr. X");
    assert_eq!(pending.len(), 1);
    assert!(Arc::ptr_eq(&pending[0], &requested));

    let report = ledger.apply_batch_decision("Dr. X", &pending, "1A");
    assert_eq!(report.applied.len(), 1);
    assert!(report.errors.is_empty());

    assert_eq!(requested.lock().unwrap().status(), AppointmentStatus::Approved);
    assert!(ledger.list_pending("Dr. X").is_empty());
    assert_eq!(ledger.list_approved_patient_ids("Dr. X"), vec!["P001".to_string()]);
    assert_eq!(audit.dump().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn far_future_request_delivers_its_reminder() {
    let (directory, _audit, scheduler, ledger) = clinic();
    let date = Local::now().date_naive() + Duration::days(3);

    ledger.request("P001", "Muska Saleem", &date.to_string()).unwrap();
    assert_eq!(scheduler.pending_count(), 1);

    // Fast-forward past the fire time (midnight before the appointment).
    tokio::time::sleep(std::time::Duration::from_secs(4 * 24 * 3600)).await;

    assert_eq!(scheduler.pending_count(), 0);
    let expected = format!("You have an appointment with Dr. Muska Saleem on {date}");
    let inbox = directory.patient_inbox("P001").unwrap();
    assert_eq!(
        inbox,
        vec![
            format!("Email Alert: {expected}"),
            format!("SMS Alert: {expected}"),
            format!("Scheduled Appointment Reminder: {expected}"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_appointment_reminder_still_fires() {
    let (directory, _audit, scheduler, ledger) = clinic();
    let date = Local::now().date_naive() + Duration::days(3);

    ledger.request("P001", "Muska Saleem", &date.to_string()).unwrap();
    let pending = ledger.list_pending("Muska Saleem");
    ledger.apply_batch_decision("Muska Saleem", &pending, "1C");

    // No cancellation path for a queued reminder: it fires regardless.
    tokio::time::sleep(std::time::Duration::from_secs(4 * 24 * 3600)).await;
    assert_eq!(scheduler.pending_count(), 0);
    assert_eq!(directory.patient_inbox("P001").unwrap().len(), 3);
}

#[tokio::test]
async fn near_term_request_schedules_no_reminder() {
    let (directory, _audit, scheduler, ledger) = clinic();
    let tomorrow = (Local::now().date_naive() + Duration::days(1)).to_string();

    // Midnight minus one day is already in the past for a next-day date.
    ledger.request("P001", "Dr. X", &tomorrow).unwrap();
    assert_eq!(scheduler.pending_count(), 0);
    assert!(directory.patient_inbox("P001").unwrap().is_empty());
}
