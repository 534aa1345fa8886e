//! Pure state transitions for the notification queue.
//!
//! The manager owns timers and subscribers; everything that changes the
//! collection itself goes through [`reduce`].

use std::collections::VecDeque;

use super::types::{Notification, NotificationId, ToastPatch};

/// A state change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Insert at the front, evicting the oldest entries past the limit.
    Add(Notification),
    /// Merge a patch onto the matching notification.
    Update(NotificationId, ToastPatch),
    /// Hide one notification, or all of them when `None`.
    Dismiss(Option<NotificationId>),
    /// Physically delete one notification, or all of them when `None`.
    Remove(Option<NotificationId>),
}

/// Active notifications, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueState {
    pub toasts: VecDeque<Notification>,
}

impl QueueState {
    #[must_use]
    pub fn contains(&self, id: NotificationId) -> bool {
        self.toasts.iter().any(|t| t.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = NotificationId> + '_ {
        self.toasts.iter().map(Notification::id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

/// Applies `action` to `state`.
///
/// Unknown ids leave the state unchanged. A `max_visible` of zero is treated
/// as one, so the newest notification always survives its own insert.
pub fn reduce(mut state: QueueState, action: Action, max_visible: usize) -> QueueState {
    match action {
        Action::Add(notification) => {
            state.toasts.push_front(notification);
            state.toasts.truncate(max_visible.max(1));
        }
        Action::Update(id, patch) => {
            if let Some(toast) = state.toasts.iter_mut().find(|t| t.id() == id) {
                toast.merge(patch);
            }
        }
        Action::Dismiss(target) => {
            for toast in state
                .toasts
                .iter_mut()
                .filter(|t| target.is_none_or(|id| t.id() == id))
            {
                toast.hide();
            }
        }
        Action::Remove(None) => state.toasts.clear(),
        Action::Remove(Some(id)) => state.toasts.retain(|t| t.id() != id),
    }
    state
}

#[cfg(test)]
#[path = "reducer_tests.rs"]
mod reducer_tests;
