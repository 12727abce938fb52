//! Shared helpers for command handlers.

use tokio::sync::broadcast;

use dockmon_core::{Notification, NotificationKind, Tone};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Tone used to print a notification.
pub fn notification_tone(kind: NotificationKind) -> Tone {
    match kind {
        NotificationKind::Success => Tone::Ok,
        NotificationKind::Info => Tone::Muted,
        NotificationKind::Error => Tone::Err,
    }
}

/// Print queued success and info notifications to stderr. Error
/// notifications are skipped: the same failure comes back as the command's
/// `CliError`.
pub fn drain_notifications(rx: &mut broadcast::Receiver<Notification>, global: &GlobalOpts) {
    let color = output::should_color(global.color);
    while let Ok(note) = rx.try_recv() {
        if global.quiet || note.kind == NotificationKind::Error {
            continue;
        }
        eprintln!("{}", output::paint(&note.message, notification_tone(note.kind), color));
    }
}
