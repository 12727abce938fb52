//! Settings command handlers: show, set, generate-key.

use secrecy::ExposeSecret;
use serde::Serialize;

use dockmon_core::{AuthState, Dashboard, DashboardConfig, Language, SettingsInput, t};

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

/// What `settings show` prints. The key itself never leaves the process.
#[derive(Serialize)]
struct SettingsView {
    auth_enabled: bool,
    api_key_known: bool,
    allowed_cidrs: Vec<String>,
}

impl From<&AuthState> for SettingsView {
    fn from(auth: &AuthState) -> Self {
        Self {
            auth_enabled: auth.auth_enabled,
            api_key_known: auth.api_key.is_some(),
            allowed_cidrs: auth.allowed_cidrs.clone(),
        }
    }
}

fn settings_detail(view: &SettingsView, lang: Language) -> String {
    let auth = if view.auth_enabled {
        t(lang, "auth_on", &[])
    } else {
        t(lang, "auth_off", &[])
    };
    let cidrs = if view.allowed_cidrs.is_empty() {
        "-".to_owned()
    } else {
        view.allowed_cidrs.join(", ")
    };
    format!(
        "{auth}\nAPI key:       {}\nAllowed CIDRs: {cidrs}",
        if view.api_key_known { "known" } else { "unknown" }
    )
}

fn collect_cidrs(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|chunk| SettingsInput::parse_cidrs(chunk))
        .collect()
}

pub async fn handle(
    config: DashboardConfig,
    args: SettingsArgs,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let lang = config.language;
    match args.command {
        SettingsCommand::Show => {
            let auth = Dashboard::oneshot(config, |dash| async move { dash.load_settings().await })
                .await?;
            let view = SettingsView::from(&auth);
            let out = output::render_single(
                global.output,
                &view,
                |v| settings_detail(v, lang),
                |v| v.auth_enabled.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SettingsCommand::Set {
            enable,
            disable,
            key,
            cidrs,
        } => {
            let cidrs = collect_cidrs(&cidrs);
            let auth = Dashboard::oneshot(config, |dash| async move {
                let current = dash.load_settings().await?;
                let input = SettingsInput {
                    auth_enabled: if enable {
                        true
                    } else if disable {
                        false
                    } else {
                        current.auth_enabled
                    },
                    api_key: key,
                    allowed_cidrs: if cidrs.is_empty() {
                        current.allowed_cidrs
                    } else {
                        cidrs
                    },
                };
                let mut notes = dash.notifications();
                let result = dash.save_settings(input).await;
                util::drain_notifications(&mut notes, global);
                result
            })
            .await?;

            let view = SettingsView::from(&auth);
            let out = output::render_single(
                global.output,
                &view,
                |v| settings_detail(v, lang),
                |v| v.auth_enabled.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SettingsCommand::GenerateKey { cidrs, save } => {
            let cidrs = collect_cidrs(&cidrs);
            let auth = Dashboard::oneshot(config, |dash| async move {
                let mut notes = dash.notifications();
                let result = dash.generate_api_key(cidrs).await;
                util::drain_notifications(&mut notes, global);
                result
            })
            .await?;

            let Some(key) = auth.api_key.as_ref() else {
                return Err(CliError::ActionFailed {
                    message: "the monitor did not return the generated key".into(),
                });
            };
            if save {
                dockmon_config::store_api_key(profile_name, key.expose_secret())?;
                if !global.quiet {
                    eprintln!("Key stored in the system keyring for profile '{profile_name}'");
                }
            }
            // The one time the key is shown: it is what the user asked for.
            output::print_output(key.expose_secret(), global.quiet);
            Ok(())
        }
    }
}
