//! `dockmon watch`: the live view.
//!
//! Starts the dashboard's background tasks and redraws the table whenever
//! the row view, the unused count or the notification stream changes.
//! Single-letter commands on stdin drive the row actions.

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use dockmon_core::{
    Dashboard, DashboardConfig, Language, Notification, PollRequest, Trigger, t,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output::{self, ContainerRow};

use super::util;

const HELP: &str = "r refresh · r <name> refresh one · u <name> update · p prune · l fr|en language · q quit";

// ── Input ───────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Poll,
    Refresh(String),
    Update(String),
    Prune,
    Confirm,
    Lang(Language),
    Quit,
    Nothing,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Input::Nothing;
    };
    let arg = words.next();
    match (verb, arg) {
        ("r", None) => Input::Poll,
        ("r", Some(name)) => Input::Refresh(name.to_owned()),
        ("u", Some(name)) => Input::Update(name.to_owned()),
        ("p", None) => Input::Prune,
        ("y" | "yes", None) => Input::Confirm,
        ("l", Some(code)) => code
            .parse()
            .map_or_else(|_| Input::Unknown(line.trim().to_owned()), Input::Lang),
        ("q" | "quit", None) => Input::Quit,
        _ => Input::Unknown(line.trim().to_owned()),
    }
}

// ── Screen state ────────────────────────────────────────────────────

#[derive(Default)]
struct Screen {
    last_note: Option<Notification>,
    awaiting_prune: bool,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    mut config: DashboardConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least one second".into(),
            });
        }
        config.fast_interval = Duration::from_secs(secs);
    }
    if let Some(batch) = args.batch {
        config.batch_size = batch;
    }

    let dash = Dashboard::new(config)?;
    dash.start().await?;
    let result = run_loop(&dash, global).await;
    dash.dispose().await;
    result
}

async fn run_loop(dash: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let mut rows = dash.rows();
    let mut unused = dash.unused_count();
    let mut notes = dash.notifications();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut screen = Screen::default();

    draw(dash, &screen, *unused.borrow(), color);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rows.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = unused.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            note = notes.recv() => match note {
                Ok(note) => screen.last_note = Some(note),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "notifications lagged"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !apply_input(dash, &mut screen, parse_input(&line)).await {
                    break;
                }
            }
        }
        draw(dash, &screen, *unused.borrow(), color);
    }
    Ok(())
}

/// Act on one command line. Returns `false` when the user asked to quit.
async fn apply_input(dash: &Dashboard, screen: &mut Screen, input: Input) -> bool {
    let lang = dash.language();
    let awaiting_prune = std::mem::take(&mut screen.awaiting_prune);

    match input {
        Input::Quit => return false,
        Input::Nothing => {}
        Input::Poll => {
            if let Err(e) = dash.trigger(Trigger::Poll(PollRequest::USER)).await {
                warn!(error = %e, "poll trigger dropped");
            }
        }
        Input::Refresh(name) => {
            if known(dash, &name, screen) {
                let dash = dash.clone();
                tokio::spawn(async move {
                    if let Err(e) = dash.refresh_entity(&name).await {
                        debug!(container = %name, error = %e, "refresh ended with an error");
                    }
                });
            }
        }
        Input::Update(name) => {
            if known(dash, &name, screen) {
                let dash = dash.clone();
                tokio::spawn(async move {
                    if let Err(e) = dash.update_entity(&name).await {
                        debug!(container = %name, error = %e, "update ended with an error");
                    }
                });
            }
        }
        Input::Prune => {
            if dash.prune_in_flight() {
                screen.last_note = Some(Notification::info(t(lang, "prune_ing", &[])));
            } else {
                screen.awaiting_prune = true;
                screen.last_note = Some(Notification::info(format!(
                    "{} [y/N]",
                    t(lang, "prune_confirm", &[])
                )));
            }
        }
        Input::Confirm if awaiting_prune => {
            screen.last_note = Some(Notification::info(t(lang, "prune_ing", &[])));
            let dash = dash.clone();
            tokio::spawn(async move {
                if let Err(e) = dash.prune_unused().await {
                    debug!(error = %e, "prune ended with an error");
                }
            });
        }
        Input::Lang(language) => {
            dash.set_language(language);
            if let Err(e) = dockmon_config::set_language(language) {
                warn!(error = %e, "language preference not saved");
            }
        }
        Input::Confirm | Input::Unknown(_) => {
            screen.last_note = Some(Notification::error(HELP));
        }
    }
    true
}

fn known(dash: &Dashboard, name: &str, screen: &mut Screen) -> bool {
    let found = dash.rows_snapshot().iter().any(|row| row.name == name);
    if !found {
        screen.last_note = Some(Notification::error(format!("unknown container: {name}")));
    }
    found
}

// ── Drawing ─────────────────────────────────────────────────────────

fn draw(dash: &Dashboard, screen: &Screen, unused: Option<u64>, color: bool) {
    let lang = dash.language();
    let rows: Vec<ContainerRow> = dash
        .rows_snapshot()
        .iter()
        .map(|view| ContainerRow::from_view(view, lang, color))
        .collect();

    let unused = unused.map_or_else(|| "-".to_owned(), |n| n.to_string());
    let mut frame = String::from("\x1b[2J\x1b[H");
    frame.push_str(&format!(
        "dockmon · {} · {}: {unused} · {}\n",
        dash.config().url,
        t(lang, "unused", &[]),
        chrono::Local::now().format("%H:%M:%S"),
    ));
    frame.push_str(&output::render_table(&rows));
    frame.push('\n');
    if let Some(note) = &screen.last_note {
        frame.push_str(&output::paint(
            &note.message,
            util::notification_tone(note.kind),
            color,
        ));
        frame.push('\n');
    }
    frame.push_str(&output::paint(HELP, dockmon_core::Tone::Muted, color));
    frame.push('\n');

    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(frame.as_bytes());
    let _ = stdout.flush();
}
