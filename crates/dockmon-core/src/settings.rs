// ── Auth settings ──
//
// Form input for the settings collaborator and the rules for folding its
// answers into the local auth view.

use dockmon_api::{MASKED_API_KEY, Settings, SettingsUpdate};
use secrecy::SecretString;

use crate::state::AuthState;

/// What the user submitted in the settings form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsInput {
    pub auth_enabled: bool,
    /// New key typed by the user. Blank or masked means "keep the current one".
    pub api_key: Option<String>,
    pub allowed_cidrs: Vec<String>,
}

impl SettingsInput {
    /// Split a free-form CIDR list (one per line, or comma separated).
    pub fn parse_cidrs(text: &str) -> Vec<String> {
        text.split(['\n', ','])
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub(crate) fn into_update(self) -> SettingsUpdate {
        let api_key = self
            .api_key
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty() && k != MASKED_API_KEY);
        SettingsUpdate {
            auth_enabled: self.auth_enabled,
            api_key,
            allowed_cidrs: normalize_cidrs(self.allowed_cidrs),
            generate_api_key: false,
        }
    }
}

/// Request asking the monitor to mint a fresh key and enable auth.
pub(crate) fn generate_request(allowed_cidrs: Vec<String>) -> SettingsUpdate {
    SettingsUpdate {
        auth_enabled: true,
        api_key: None,
        allowed_cidrs: normalize_cidrs(allowed_cidrs),
        generate_api_key: true,
    }
}

fn normalize_cidrs(cidrs: Vec<String>) -> Vec<String> {
    cidrs
        .into_iter()
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .collect()
}

impl AuthState {
    /// Adopt the monitor's view. A masked key never replaces one we know.
    pub(crate) fn absorb(&mut self, remote: Settings) {
        let Settings {
            auth_enabled,
            api_key,
            allowed_cidrs,
        } = remote;
        self.auth_enabled = auth_enabled;
        self.allowed_cidrs = allowed_cidrs;
        if !api_key.is_empty() && api_key != MASKED_API_KEY {
            self.api_key = Some(SecretString::from(api_key));
        }
    }
}
