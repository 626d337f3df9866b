/// Desktop notifications
/// Currently only implements macOS notifications

#[cfg(target_os = "macos")]
use std::process::Command;

/// Send a notification when the countdown reaches zero
pub fn notify_timer_complete(minutes: u32) {
    let message = if minutes == 1 {
        "1 minute of focus done".to_string()
    } else {
        format!("{} minutes of focus done", minutes)
    };
    send("Pourover - Time's up", &message);
}

/// Send a notification when a task is completed during a session
pub fn notify_task_done(task_text: &str, time_spent: &str) {
    send("Pourover - Task Completed", &format!("{} ({})", task_text, time_spent));
}

fn send(title: &str, message: &str) {
    #[cfg(target_os = "macos")]
    {
        let script = format!(
            r#"display notification "{}" with title "{}""#,
            message.replace('"', "\\\""),
            title
        );

        if let Err(e) = Command::new("osascript").arg("-e").arg(&script).output() {
            tracing::debug!(error = %e, "Notification failed");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        // No-op on other platforms
        tracing::trace!(title, message, "Notifications unsupported on this platform");
    }
}
