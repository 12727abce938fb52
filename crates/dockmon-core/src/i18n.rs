// ── Localized strings ──
//
// Pure lookup: `t(lang, key, vars)`. Missing keys fall back to French,
// then to the key itself. `{name}` placeholders are substituted from
// `vars`; unknown placeholders become empty.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    Fr,
    En,
}

impl Language {
    /// Pick a language from a locale string such as `en_US.UTF-8`.
    /// Anything unsupported (or absent) falls back to French.
    pub fn detect(locale: Option<&str>) -> Self {
        locale
            .and_then(|l| l.get(..2))
            .and_then(|prefix| prefix.parse().ok())
            .unwrap_or_default()
    }
}

const FR: &[(&str, &str)] = &[
    ("refresh", "Rafraîchir"),
    ("refresh_ing", "Rafraîchir…"),
    ("prune", "Nettoyer"),
    ("prune_confirm", "Nettoyer les images inutilisées ?"),
    ("prune_ing", "Nettoyage en cours…"),
    ("settings", "Réglages"),
    ("th_container", "Conteneur"),
    ("th_state", "État & Ressources"),
    ("th_status", "Statut"),
    ("th_link", "Lien"),
    ("th_action", "Action"),
    ("unused", "Images inutilisées"),
    ("loading", "Chargement…"),
    ("pending", "pending…"),
    ("cleaned_ok", "Nettoyage terminé. Espace récupéré: {bytes} octets."),
    ("clean_fail", "Échec du nettoyage: {err}"),
    ("update_btn", "Mettre à jour"),
    ("updated_ok", "✅ {name} mis à jour"),
    ("up_to_date", "✅ {name} est déjà à jour"),
    ("update_fail", "❌ {name}: {err}"),
    ("update_sent", "{name}: {message}"),
    ("refresh_fail", "Échec du rafraîchissement: {err}"),
    ("settings_saved", "Réglages enregistrés"),
    ("settings_fail", "Erreur lors de l’enregistrement: {err}"),
    ("generate_fail", "Erreur lors de la génération: {err}"),
    ("auth_on", "Authentification par clé API activée"),
    ("auth_off", "Authentification désactivée"),
    ("CPU", "CPU"),
    ("RAM", "RAM"),
    ("NET", "NET"),
];

const EN: &[(&str, &str)] = &[
    ("refresh", "Refresh"),
    ("refresh_ing", "Refreshing…"),
    ("prune", "Prune"),
    ("prune_confirm", "Prune unused images?"),
    ("prune_ing", "Pruning…"),
    ("settings", "Settings"),
    ("th_container", "Container"),
    ("th_state", "State & Resources"),
    ("th_status", "Status"),
    ("th_link", "Link"),
    ("th_action", "Action"),
    ("unused", "Unused images"),
    ("loading", "Loading…"),
    ("pending", "pending…"),
    ("cleaned_ok", "Prune done. Space reclaimed: {bytes} bytes."),
    ("clean_fail", "Prune failed: {err}"),
    ("update_btn", "Update"),
    ("updated_ok", "✅ {name} updated"),
    ("up_to_date", "✅ {name} is already up to date"),
    ("update_fail", "❌ {name}: {err}"),
    ("update_sent", "{name}: {message}"),
    ("refresh_fail", "Refresh failed: {err}"),
    ("settings_saved", "Settings saved"),
    ("settings_fail", "Error while saving: {err}"),
    ("generate_fail", "Generation failed: {err}"),
    ("auth_on", "API key authentication enabled"),
    ("auth_off", "Authentication disabled"),
    ("CPU", "CPU"),
    ("RAM", "RAM"),
    ("NET", "NET"),
];

fn table(lang: Language) -> &'static [(&'static str, &'static str)] {
    match lang {
        Language::Fr => FR,
        Language::En => EN,
    }
}

fn lookup(lang: Language, key: &str) -> Option<&'static str> {
    table(lang)
        .iter()
        .find_map(|(k, v)| (*k == key).then_some(*v))
}

/// Translate `key` and substitute `{var}` placeholders.
pub fn t(lang: Language, key: &str, vars: &[(&str, &str)]) -> String {
    let template = lookup(lang, key)
        .or_else(|| lookup(Language::Fr, key))
        .unwrap_or(key);
    if vars.is_empty() {
        return template.to_owned();
    }
    substitute(template, vars)
}

fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after.find('}');
        match close {
            Some(close) if is_word(&after[..close]) => {
                let name = &after[..close];
                if let Some((_, value)) = vars.iter().find(|(k, _)| *k == name) {
                    out.push_str(value);
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}
