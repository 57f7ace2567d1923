//! Transient operator notifications.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message shown to the operator and then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// What the notice is about (e.g. `approve bot 123`), if anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub timestamp: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Sending half of the notification channel.
///
/// Sends never block and never fail; if nobody is listening the notice is
/// dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    pub fn new(sender: mpsc::UnboundedSender<Notice>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Creates a notifier together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// A notifier that discards everything.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn notify(&self, notice: Notice) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(notice);
        }
    }
}
