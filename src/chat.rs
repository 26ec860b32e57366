//! Doctor-patient chat hub.
//!
//! Keeps a single server-side transcript and fans each formatted line out to
//! the chat mailboxes of sender and receiver, when they are registered
//! recipients. The transcript is independent of those per-recipient copies.

use crate::directory::UserDirectory;
use crate::models::MailboxKind;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct ChatHub {
    directory: Arc<UserDirectory>,
    transcript: Mutex<Vec<String>>,
}

impl ChatHub {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        ChatHub {
            directory,
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Relay a message, recording it as `<sender> to <receiver>: <text>`.
    pub fn send_message(&self, sender: &str, receiver: &str, text: &str) {
        let line = format!("{sender} to {receiver}: {text}");
        info!("chat relayed: {line}");
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.clone());

        self.directory
            .resolve_and_deliver(sender, &line, MailboxKind::Chat);
        self.directory
            .resolve_and_deliver(receiver, &line, MailboxKind::Chat);
    }

    /// Full server-side chat history, in relay order.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_reaches_transcript_and_both_chat_mailboxes() {
        let dir = Arc::new(UserDirectory::new());
        dir.register_patient("P001", "Gulwarina").unwrap();
        dir.register_doctor("D001", "Muska Saleem").unwrap();
        let hub = ChatHub::new(dir.clone());

        hub.send_message("Gulwarina", "Muska Saleem", "hello doctor");

        let line = "Gulwarina to Muska Saleem: hello doctor".to_string();
        assert_eq!(hub.transcript(), vec![line.clone()]);
        assert_eq!(dir.patient_chat("P001").unwrap(), vec![line.clone()]);
        assert_eq!(dir.doctor_chat("D001").unwrap(), vec![line]);
    }

    #[test]
    fn unregistered_parties_still_reach_the_transcript() {
        let dir = Arc::new(UserDirectory::new());
        dir.register_patient("P001", "Gulwarina").unwrap();
        let hub = ChatHub::new(dir.clone());

        hub.send_message("Stranger", "Gulwarina", "hi");

        assert_eq!(hub.transcript().len(), 1);
        // Only the registered side keeps a copy.
        assert_eq!(dir.patient_chat("P001").unwrap().len(), 1);
    }
}
