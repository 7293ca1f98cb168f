use notify_rust::Notification;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::NotifierError;
use crate::pomodoro::CompletionEvent;

/// User-facing completion alerts. Delivery is best effort.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifierError>;
}

/// Desktop notification through the platform notification daemon.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifierError> {
        Notification::new()
            .summary(title)
            .body(body)
            .appname(crate::APP_NAME)
            .timeout(0) // No auto-dismiss
            .show()
            .map_err(|e| NotifierError::Unavailable(e.to_string()))?;
        Ok(())
    }
}

/// Used when notifications are turned off in the config.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, title: &str, _body: &str) -> Result<(), NotifierError> {
        tracing::debug!("Notifications disabled, skipping '{}'", title);
        Ok(())
    }
}

pub fn completion_message(event: &CompletionEvent) -> (String, String) {
    let label = event.mode.label();
    (
        format!("⏰ {} Complete!", label),
        format!("Great job! Your {} session is complete!", label),
    )
}

/// Deliver the completion alert, swallowing any failure.
pub fn announce(notifier: &dyn Notifier, event: &CompletionEvent) {
    let (title, body) = completion_message(event);
    if let Err(e) = notifier.notify(&title, &body) {
        tracing::warn!("Failed to send notification: {}", e);
    }
}

/// Deliver the alert on tokio's blocking pool. Must be called from a runtime.
pub fn announce_in_background(
    notifier: Arc<dyn Notifier>,
    event: CompletionEvent,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || announce(notifier.as_ref(), &event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pomodoro::Mode;
    use chrono::Local;

    fn event(mode: Mode) -> CompletionEvent {
        CompletionEvent {
            mode,
            completed_at: Local::now(),
        }
    }

    #[test]
    fn test_completion_message_uses_mode_label() {
        let (title, body) = completion_message(&event(Mode::ShortBreak));
        assert_eq!(title, "⏰ Short Break Complete!");
        assert_eq!(body, "Great job! Your Short Break session is complete!");
    }

    #[test]
    fn test_announce_calls_notifier_once() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|title, _| title == "⏰ Focus Complete!")
            .times(1)
            .returning(|_, _| Ok(()));

        announce(&notifier, &event(Mode::Focus));
    }

    #[test]
    fn test_announce_swallows_unavailable_notifier() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_, _| Err(NotifierError::Unavailable("no dbus".to_string())));

        announce(&notifier, &event(Mode::LongBreak));
    }

    #[tokio::test]
    async fn test_background_announce_runs_off_the_caller() {
        let caller = std::thread::current().id();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |title, _| {
                title == "⏰ Short Break Complete!" && std::thread::current().id() != caller
            })
            .times(1)
            .returning(|_, _| Ok(()));

        announce_in_background(Arc::new(notifier), event(Mode::ShortBreak))
            .await
            .unwrap();
    }
}
