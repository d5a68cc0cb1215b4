//! Link notices queued as JSON lines for an external mailer.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use pal_core::notify::{LinkNotifier, NotifyError};
use pal_core::reports::LinkNotice;

/// Appends each notice as one JSON line to an outbox file.
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LinkNotifier for OutboxNotifier {
    fn deliver(&self, notice: &LinkNotice) -> Result<(), NotifyError> {
        let mut line =
            serde_json::to_string(notice).map_err(|e| NotifyError::Delivery(e.to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        tracing::debug!(path = %self.path.display(), recipient = %notice.recipient, "notice queued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn notice(recipient: &str) -> LinkNotice {
        LinkNotice {
            recipient: recipient.into(),
            supervisor_name: "Marc Leroy".into(),
            group_name: "Palanquée Marc Leroy".into(),
            session_date: NaiveDate::from_ymd_opt(2026, 6, 14).unwrap(),
            location: "Fosse de Villeneuve".into(),
            url: "/evaluation/abc/".into(),
            expires_at: Utc.with_ymd_and_hms(2026, 7, 14, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn notices_are_appended_one_per_line() {
        let dir = TempDir::new().unwrap();
        let notifier = OutboxNotifier::new(dir.path().join("outbox.jsonl"));

        notifier.deliver(&notice("a@club.example")).unwrap();
        notifier.deliver(&notice("b@club.example")).unwrap();

        let content = std::fs::read_to_string(dir.path().join("outbox.jsonl")).unwrap();
        let lines: Vec<LinkNotice> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines, vec![notice("a@club.example"), notice("b@club.example")]);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let notifier = OutboxNotifier::new(dir.path().join("absent/outbox.jsonl"));
        assert!(matches!(
            notifier.deliver(&notice("a@club.example")),
            Err(NotifyError::Io(_))
        ));
    }
}
