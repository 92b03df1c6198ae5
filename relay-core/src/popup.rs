// Popup page restore
// The popup is torn down whenever it loses focus (e.g. while the user
// grants USB access in another tab). The last route is kept in local
// storage so a reopened popup lands where the user left off.

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Key/value string storage (`window.localStorage` in the browser)
pub trait PageStore {
    fn get(&self, key: &str) -> Result<Option<String>, RelayError>;
    fn set(&self, key: &str, value: &str) -> Result<(), RelayError>;
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub hash: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedPage {
    #[serde(flatten)]
    pub location: Location,
    /// Milliseconds since the Unix epoch
    pub saved_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    Popup,
    FullPage,
}

/// The popup UI only stays in the popup when it really is the extension
/// popup view and the user has popup mode enabled.
pub fn launch_mode(is_popup_view: bool, popup_mode_enabled: bool) -> LaunchMode {
    if is_popup_view && popup_mode_enabled {
        LaunchMode::Popup
    } else {
        LaunchMode::FullPage
    }
}

pub fn remember<S: PageStore>(
    store: &S,
    key: &str,
    location: Location,
    now_ms: f64,
) -> Result<(), RelayError> {
    let saved = SavedPage {
        location,
        saved_at: now_ms,
    };
    let data = serde_json::to_string(&saved)
        .map_err(|e| RelayError::Storage(format!("Serialization error: {}", e)))?;
    store.set(key, &data)
}

/// Saved location if it is younger than `max_age_ms`
pub fn restore<S: PageStore>(
    store: &S,
    key: &str,
    now_ms: f64,
    max_age_ms: u64,
) -> Result<Option<Location>, RelayError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    let saved: SavedPage = match serde_json::from_str(&raw) {
        Ok(saved) => saved,
        Err(e) => {
            log::warn!("Ignoring unreadable saved popup page: {}", e);
            return Ok(None);
        }
    };

    if saved.saved_at > now_ms - max_age_ms as f64 {
        Ok(Some(saved.location))
    } else {
        log::debug!("Saved popup page expired");
        Ok(None)
    }
}
