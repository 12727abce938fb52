//! Container command handlers: status table, single refresh, update, health.

use serde::Serialize;

use dockmon_api::UpdateOutcome;
use dockmon_core::{CoreError, Dashboard, DashboardConfig, PollOutcome, PollRequest};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output::{self, ContainerRow};

use super::util;

pub async fn status(
    config: DashboardConfig,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let lang = config.language;
    let request = PollRequest {
        force: args.force,
        show_loading: false,
        light: !args.full,
    };
    let fill = !args.no_metrics;

    let (outcome, rows) = Dashboard::oneshot(config, |dash| async move {
        let outcome = dash.poll(request).await;
        if outcome == PollOutcome::Live && fill {
            dash.fill_visible_metrics().await;
        }
        Ok((outcome, dash.rows_snapshot()))
    })
    .await?;

    match outcome {
        PollOutcome::Unchanged | PollOutcome::Skipped => {
            return Err(CliError::Unreachable {
                message: "status poll failed and no cached snapshot exists (run with -v for details)"
                    .into(),
            });
        }
        PollOutcome::Cached if !global.quiet => {
            eprintln!("monitor unreachable: showing the last cached snapshot");
        }
        _ => {}
    }

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        rows.as_slice(),
        |v| ContainerRow::from_view(v, lang, color),
        |v| v.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn refresh(
    config: DashboardConfig,
    name: String,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let lang = config.language;
    let view = Dashboard::oneshot(config, |dash| async move {
        dash.poll(PollRequest::FAST).await;
        dash.refresh_entity(&name).await
    })
    .await?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &view,
        |v| output::row_detail(v, lang, color),
        |v| v.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Serialize)]
struct UpdateReport {
    name: String,
    outcome: UpdateOutcome,
}

pub async fn update(
    config: DashboardConfig,
    name: String,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let report = Dashboard::oneshot(config, |dash| async move {
        let mut notes = dash.notifications();
        dash.poll(PollRequest::FAST).await;
        let result = dash.update_entity(&name).await;
        util::drain_notifications(&mut notes, global);
        result.map(|outcome| UpdateReport { name, outcome })
    })
    .await?;

    let out = output::render_single(
        global.output,
        &report,
        // Notifications already told the story.
        |_| String::new(),
        |r| {
            match r.outcome {
                UpdateOutcome::AlreadyUpToDate => "already_up_to_date",
                UpdateOutcome::Updated => "updated",
                UpdateOutcome::Unknown => "unknown",
            }
            .to_owned()
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn health(config: DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let report = Dashboard::oneshot(config, |dash| async move {
        dash.client().health().await.map_err(CoreError::from)
    })
    .await?;

    if !report.ok {
        return Err(CliError::Unreachable {
            message: report
                .error
                .unwrap_or_else(|| "monitor reported an unhealthy state".into()),
        });
    }

    let out = output::render_single(
        global.output,
        &report,
        |r| format!("ok: {} containers visible", r.containers.len()),
        |r| r.containers.join("\n"),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
