//! Plain-text rendering of notifications for terminal output.

use super::types::{Notification, Snapshot, Variant};

/// Renders one notification, e.g. `[#3] (destructive) Error - Try again [Retry]`.
pub fn render_line(notification: &Notification) -> String {
    let mut line = format!("[#{}]", notification.id());

    if notification.variant() == Variant::Destructive {
        line.push_str(" (destructive)");
    }

    match (notification.title(), notification.description()) {
        (Some(title), Some(description)) => {
            line.push_str(&format!(" {} - {}", title, description));
        }
        (Some(text), None) | (None, Some(text)) => {
            line.push(' ');
            line.push_str(text);
        }
        (None, None) => {}
    }

    if let Some(action) = notification.action() {
        line.push_str(&format!(" [{}]", action.label));
    }

    if !notification.is_visible() {
        line.push_str(" (hidden)");
    }

    line
}

/// Renders a whole snapshot on one line, entries separated by ` | `.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return format!("v{}: (empty)", snapshot.version);
    }

    let lines: Vec<String> = snapshot.iter().map(render_line).collect();
    format!("v{}: {}", snapshot.version, lines.join(" | "))
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod render_tests;
