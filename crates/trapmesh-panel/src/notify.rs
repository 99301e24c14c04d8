//! Success and failure popups.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::fmt;

const HISTORY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Failure,
}

impl NotificationKind {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            NotificationKind::Success => "OK",
            NotificationKind::Failure => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.title(), self.message)
    }
}

/// At most one visible popup per kind, plus a short history of everything
/// that was shown.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    success: Option<Notification>,
    failure: Option<Notification>,
    history: VecDeque<Notification>,
}

impl Notifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a popup. Returns `false` when one of that kind is already up;
    /// the visible popup is kept until dismissed.
    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>) -> bool {
        let slot = self.slot_mut(kind);
        if slot.is_some() {
            return false;
        }
        let notification = Notification {
            kind,
            message: message.into(),
        };
        *slot = Some(notification.clone());
        if self.history.len() >= HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(notification);
        true
    }

    pub fn success(&mut self, message: impl Into<String>) -> bool {
        self.show(NotificationKind::Success, message)
    }

    pub fn failure(&mut self, message: impl Into<String>) -> bool {
        self.show(NotificationKind::Failure, message)
    }

    pub fn dismiss(&mut self, kind: NotificationKind) -> Option<Notification> {
        self.slot_mut(kind).take()
    }

    pub fn dismiss_all(&mut self) {
        self.success = None;
        self.failure = None;
    }

    #[must_use]
    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.failure.iter().chain(self.success.iter())
    }

    #[must_use]
    pub fn is_visible(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Success => self.success.is_some(),
            NotificationKind::Failure => self.failure.is_some(),
        }
    }

    #[must_use]
    pub fn history(&self) -> &VecDeque<Notification> {
        &self.history
    }

    fn slot_mut(&mut self, kind: NotificationKind) -> &mut Option<Notification> {
        match kind {
            NotificationKind::Success => &mut self.success,
            NotificationKind::Failure => &mut self.failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_popup_of_same_kind_is_ignored() {
        let mut notifications = Notifications::new();
        assert!(notifications.failure("getModuleInfo failed"));
        assert!(!notifications.failure("getMeshGraph failed"));
        assert!(notifications.success("time synced"));
        let visible: Vec<_> = notifications.visible().map(ToString::to_string).collect();
        assert_eq!(visible, vec!["FAILED getModuleInfo failed", "OK time synced"]);
        assert_eq!(notifications.history().len(), 2);
    }

    #[test]
    fn dismiss_allows_a_new_popup() {
        let mut notifications = Notifications::new();
        notifications.success("first");
        let dismissed = notifications.dismiss(NotificationKind::Success).unwrap();
        assert_eq!(dismissed.message, "first");
        assert!(!notifications.is_visible(NotificationKind::Success));
        assert!(notifications.success("second"));
        notifications.dismiss_all();
        assert_eq!(notifications.visible().count(), 0);
    }

    #[test]
    fn history_is_capped() {
        let mut notifications = Notifications::new();
        for index in 0..8 {
            notifications.success(format!("event {index}"));
            notifications.dismiss_all();
        }
        assert_eq!(notifications.history().len(), HISTORY_LIMIT);
        assert_eq!(notifications.history()[0].message, "event 3");
    }
}
