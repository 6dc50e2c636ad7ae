//! Purge engine configuration.
//!
//! Built from the `[purge]` table of `edgepurge.toml` (see `crate::config`).

use url::Url;

use crate::domain::changes::SensitiveFields;

use super::variant::StageVariant;

pub(crate) const DEFAULT_DELETE_MENU_FLAG: &str = "ShowInMenu";

/// Runtime configuration for the purge engine.
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    /// Master switch. When false, lifecycle events are ignored.
    pub enabled: bool,
    /// Fields whose change forces a full-site purge.
    pub sensitive_fields: SensitiveFields,
    /// Field read on delete to decide whether the object appeared in menus.
    ///
    /// Distinct from `ShowInMenus` in `sensitive_fields`.
    pub delete_menu_flag: String,
    /// Query parameter used to address the draft rendering of a URL.
    pub stage: StageVariant,
    /// Site origin prepended to relative URLs before dispatch.
    pub base_url: Option<Url>,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitive_fields: SensitiveFields::default(),
            delete_menu_flag: DEFAULT_DELETE_MENU_FLAG.to_string(),
            stage: StageVariant::default(),
            base_url: None,
        }
    }
}

impl From<&crate::config::PurgeSettings> for PurgeConfig {
    fn from(settings: &crate::config::PurgeSettings) -> Self {
        Self {
            enabled: settings.enabled,
            sensitive_fields: settings.sensitive_fields.clone(),
            delete_menu_flag: settings.delete_menu_flag.clone(),
            stage: StageVariant::new(&settings.stage_param, &settings.stage_value),
            base_url: settings.base_url.clone(),
        }
    }
}
