//! Image command handlers: prune and the unused listing.

use tabled::Tabled;

use dockmon_api::{PruneReport, UnusedImage};
use dockmon_core::format::format_bytes;
use dockmon_core::{CoreError, Dashboard, DashboardConfig, t};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UnusedRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl From<&UnusedImage> for UnusedRow {
    fn from(image: &UnusedImage) -> Self {
        Self {
            id: short_id(&image.id).to_owned(),
            tags: if image.tags.is_empty() {
                "<none>".into()
            } else {
                image.tags.join(", ")
            },
        }
    }
}

/// `sha256:0123456789abcdef...` → `0123456789ab`.
fn short_id(id: &str) -> &str {
    let bare = id.strip_prefix("sha256:").unwrap_or(id);
    bare.get(..12).unwrap_or(bare)
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn unused(config: DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let images = Dashboard::oneshot(config, |dash| async move {
        dash.client().unused_images().await.map_err(CoreError::from)
    })
    .await?;

    let out = output::render_list(
        global.output,
        &images.items,
        |i| UnusedRow::from(i),
        |i| i.id.clone(),
    );
    output::print_output(&out, global.quiet);
    if !global.quiet && matches!(global.output, crate::cli::OutputFormat::Table) {
        eprintln!("{} unused", images.count);
    }
    Ok(())
}

pub async fn prune(config: DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let prompt = t(config.language, "prune_confirm", &[]);
    if !util::confirm(&prompt, global.yes)? {
        return Ok(());
    }

    let report: PruneReport = Dashboard::oneshot(config, |dash| async move {
        let mut notes = dash.notifications();
        let result = dash.prune_unused().await;
        util::drain_notifications(&mut notes, global);
        result
    })
    .await?;

    let out = output::render_single(
        global.output,
        &report,
        |r| {
            #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
            let reclaimed = format_bytes(r.space_reclaimed as f64);
            format!("{} images removed, {reclaimed} reclaimed", r.deleted_count())
        },
        |r| r.space_reclaimed.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids() {
        assert_eq!(short_id("sha256:0123456789abcdef0123"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn untagged_images_say_none() {
        let row = UnusedRow::from(&UnusedImage {
            id: "sha256:ffffffffffffffff".into(),
            tags: Vec::new(),
        });
        assert_eq!(row.tags, "<none>");
    }
}
