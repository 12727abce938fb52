//! `dockmon lang`: show or persist the display language. Never touches the network.

use dockmon_core::Language;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(language: Option<Language>, global: &GlobalOpts) -> Result<(), CliError> {
    let Some(language) = language else {
        let cfg = config::load_config_or_default();
        output::print_output(cfg.language().as_ref(), global.quiet);
        return Ok(());
    };

    dockmon_config::set_language(language)?;
    tracing::debug!(%language, path = %config::config_path().display(), "language saved");
    output::print_output(&format!("Language set to {language}"), global.quiet);
    Ok(())
}
