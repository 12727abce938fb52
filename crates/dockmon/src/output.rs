//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use dockmon_core::{Language, ResourcesCell, RowView, StatusCell, Tone, t};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Paint `text` with the colour of `tone`.
pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match tone {
        Tone::Ok => text.green().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Err => text.red().to_string(),
        Tone::Muted => text.dimmed().to_string(),
    }
}

// ── Container rows ───────────────────────────────────────────────────

#[derive(Tabled)]
pub struct ContainerRow {
    #[tabled(rename = "Container")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "RAM")]
    ram: String,
    #[tabled(rename = "NET")]
    net: String,
    #[tabled(rename = "Image")]
    image: String,
}

impl ContainerRow {
    pub fn from_view(view: &RowView, lang: Language, color: bool) -> Self {
        let mut status = match &view.status {
            StatusCell::Pending => paint(&t(lang, "pending", &[]), Tone::Muted, color),
            StatusCell::Tag { status, tone } => paint(status.as_str(), *tone, color),
        };
        if view.updating {
            status.push_str(" ⟳");
        }

        let (state, cpu, ram, net) = match &view.resources {
            ResourcesCell::Loading => {
                let loading = paint(&t(lang, "loading", &[]), Tone::Muted, color);
                (loading, "…".into(), "…".into(), "…".into())
            }
            ResourcesCell::Ready(m) => (
                paint(m.state.as_deref().unwrap_or("-"), m.state_tone, color),
                meter_text(m.cpu.as_ref()),
                meter_text(m.ram.as_ref()),
                meter_text(m.net.as_ref()),
            ),
        };

        Self {
            name: view.name.clone(),
            status,
            state,
            cpu,
            ram,
            net,
            image: view
                .link
                .as_ref()
                .map(|l| l.label.clone())
                .unwrap_or_default(),
        }
    }
}

fn meter_text(meter: Option<&dockmon_core::Meter>) -> String {
    meter.map_or_else(|| "-".into(), |m| m.text.clone())
}

/// Multi-line detail view of one row.
pub fn row_detail(view: &RowView, lang: Language, color: bool) -> String {
    let row = ContainerRow::from_view(view, lang, color);
    let mut lines = vec![
        format!("Container: {}", row.name),
        format!("Status:    {}", row.status),
        format!("State:     {}", row.state),
        format!("CPU:       {}", row.cpu),
        format!("RAM:       {}", row.ram),
        format!("NET:       {}", row.net),
    ];
    if let Some(link) = &view.link {
        lines.push(format!("Image:     {}", link.label));
        if let Some(url) = &link.url {
            lines.push(format!("Repo:      {url}"));
        }
    }
    lines.join("\n")
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_default()
}
