//! One-shot reminder scheduling and dispatch.
//!
//! Reminders sit in a priority queue keyed by fire time (earliest first) and
//! are drained by a single background task that sleeps until the next
//! deadline. Each entry fires at most once; there is no cancellation path, so
//! an appointment cancelled after its reminder was queued still produces the
//! reminder.
//!
//! An appointment reminder dispatch goes through both the email-like and the
//! SMS-like channel and then records a category-tagged copy in the
//! recipient's inbox; medication reminders use the SMS channel only.

use crate::models::MailboxKind;
use crate::notify::NotificationService;
use chrono::{DateTime, Duration as TimeDelta, Local, NaiveDate, NaiveTime, TimeZone};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

/// Fire time for an appointment reminder: local midnight of the appointment
/// date, minus one day.
pub fn appointment_reminder_time(date: NaiveDate) -> DateTime<Local> {
    let naive = date.and_time(NaiveTime::MIN) - TimeDelta::days(1);
    naive
        .and_local_timezone(Local)
        .earliest()
        // Midnight swallowed by a DST gap; anchor on the UTC reading instead.
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// What a fired reminder is about; selects channels and the mailbox tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchCategory {
    /// Timer-fired advance reminder for an appointment.
    ScheduledAppointment,
    /// Operator-invoked appointment reminder, sent immediately.
    ManualAppointment,
    /// Medication nudge, SMS only.
    Medication,
}

impl DispatchCategory {
    fn tag(&self) -> &'static str {
        match self {
            DispatchCategory::ScheduledAppointment => "Scheduled Appointment Reminder",
            DispatchCategory::ManualAppointment => "Appointment Reminder",
            DispatchCategory::Medication => "Medication Reminder",
        }
    }

    fn uses_email(&self) -> bool {
        !matches!(self, DispatchCategory::Medication)
    }
}

/// A reminder waiting in the queue.
///
/// Snapshot of recipient name and message text taken at scheduling time; a
/// fired task never reads appointment state.
#[derive(Debug, Clone)]
struct QueuedReminder {
    fire_at: DateTime<Local>,
    recipient: String,
    message: String,
    task_id: Uuid,
}

impl PartialEq for QueuedReminder {
    fn eq(&self, other: &Self) -> bool {
        self.task_id == other.task_id
    }
}

impl Eq for QueuedReminder {}

impl PartialOrd for QueuedReminder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedReminder {
    /// Earliest fire time first when popped from the max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.task_id.cmp(&self.task_id))
    }
}

struct SchedulerShared {
    queue: Mutex<BinaryHeap<QueuedReminder>>,
    wakeup: Notify,
}

impl SchedulerShared {
    fn lock(&self) -> MutexGuard<'_, BinaryHeap<QueuedReminder>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Deferred and immediate reminder dispatch.
///
/// Cheap to clone; all clones feed the same queue and background drain task.
#[derive(Clone)]
pub struct ReminderScheduler {
    shared: Arc<SchedulerShared>,
    service: NotificationService,
}

impl ReminderScheduler {
    /// Start the scheduler and its drain task. Must be called from within a
    /// tokio runtime; the task runs for the life of the runtime.
    pub fn spawn(service: NotificationService) -> Self {
        let shared = Arc::new(SchedulerShared {
            queue: Mutex::new(BinaryHeap::new()),
            wakeup: Notify::new(),
        });
        tokio::spawn(run_loop(shared.clone(), service.clone()));
        ReminderScheduler { shared, service }
    }

    /// Queue a one-shot appointment reminder.
    ///
    /// A fire time not in the future is a silent no-op: past or imminent
    /// appointments get no advance reminder. Returns whether a task was
    /// queued.
    pub fn schedule_appointment_reminder(
        &self,
        recipient: &str,
        message: &str,
        fire_at: DateTime<Local>,
    ) -> bool {
        if fire_at <= Local::now() {
            debug!(recipient, %fire_at, "reminder fire time already passed, nothing scheduled");
            return false;
        }

        let entry = QueuedReminder {
            fire_at,
            recipient: recipient.to_string(),
            message: message.to_string(),
            task_id: Uuid::new_v4(),
        };
        info!(task = %entry.task_id, recipient, %fire_at, "appointment reminder scheduled");
        self.shared.lock().push(entry);
        self.shared.wakeup.notify_one();
        true
    }

    /// Immediate dispatch path for operator-invoked appointment reminders.
    pub fn fire_now(&self, recipient: &str, message: &str) {
        dispatch(&self.service, DispatchCategory::ManualAppointment, recipient, message);
    }

    /// Send `You have an appointment at <time_text>` right away.
    pub fn send_appointment_reminder(&self, recipient: &str, time_text: &str) {
        let message = format!("You have an appointment at {time_text}");
        self.fire_now(recipient, &message);
    }

    /// Send the medication nudge right away, SMS channel only.
    pub fn send_medication_reminder(&self, recipient: &str) {
        dispatch(
            &self.service,
            DispatchCategory::Medication,
            recipient,
            "Take your meds",
        );
    }

    /// Number of reminders still waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().len()
    }
}

fn dispatch(service: &NotificationService, category: DispatchCategory, recipient: &str, message: &str) {
    if category.uses_email() {
        service.send_email_alert(recipient, message);
    }
    service.send_sms_alert(recipient, message);
    service.directory().resolve_and_deliver(
        recipient,
        &format!("{}: {}", category.tag(), message),
        MailboxKind::Inbox,
    );
}

async fn run_loop(shared: Arc<SchedulerShared>, service: NotificationService) {
    loop {
        let next_deadline = shared.lock().peek().map(|r| r.fire_at);

        match next_deadline {
            None => shared.wakeup.notified().await,
            Some(deadline) => {
                let wait = (deadline - Local::now()).to_std().unwrap_or(Duration::ZERO);
                tokio::select! {
                    _ = sleep(wait) => {
                        for entry in drain_due(&shared, deadline) {
                            info!(task = %entry.task_id, recipient = %entry.recipient, "reminder fired");
                            dispatch(
                                &service,
                                DispatchCategory::ScheduledAppointment,
                                &entry.recipient,
                                &entry.message,
                            );
                        }
                    }
                    // An earlier reminder may have arrived; re-arm on it.
                    _ = shared.wakeup.notified() => {}
                }
            }
        }
    }
}

fn drain_due(shared: &SchedulerShared, deadline: DateTime<Local>) -> Vec<QueuedReminder> {
    let mut queue = shared.lock();
    let mut due = Vec::new();
    while queue.peek().is_some_and(|r| r.fire_at <= deadline) {
        if let Some(entry) = queue.pop() {
            due.push(entry);
        }
    }
    due
}
