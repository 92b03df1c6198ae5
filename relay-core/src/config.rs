use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Relay settings shared by every extension context
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Name of the long-lived port opened towards the background
    pub channel_name: String,

    /// DOM id of the USB permissions iframe
    pub permissions_iframe_id: String,

    /// URL pattern of the connect popup, used by the unload path
    pub popup_url_pattern: String,

    /// Switch back to the popup tab when the permissions tab unloads.
    /// Needs the `tabs` permission in the manifest for URL queries.
    pub switch_on_unload: bool,

    pub saved_page_key: String,

    /// How long a saved popup page stays restorable
    pub saved_page_max_age_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_name: "trezor-connect".to_string(),
            permissions_iframe_id: "trezor-usb-permissions".to_string(),
            popup_url_pattern: "*://connect.trezor.io/*/popup.html".to_string(),
            switch_on_unload: true,
            saved_page_key: "popup_saved_page".to_string(),
            saved_page_max_age_ms: 30_000,
        }
    }
}

impl RelayConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RelayConfig =
            toml::from_str(content).context("Failed to parse relay config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.channel_name.trim().is_empty() {
            anyhow::bail!("channel_name must not be empty");
        }
        if self.permissions_iframe_id.trim().is_empty() {
            anyhow::bail!("permissions_iframe_id must not be empty");
        }
        if self.switch_on_unload && self.popup_url_pattern.trim().is_empty() {
            anyhow::bail!("popup_url_pattern is required when switch_on_unload is set");
        }
        Ok(())
    }
}
