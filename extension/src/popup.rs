// Popup bootstrap helpers: saved page restore and launch mode

use hw_relay_core::{popup, LaunchMode, Location, PageStore, RelayError};
use wasm_bindgen::prelude::*;
use web_sys::Storage;

use crate::interop::{describe, into_js_error, to_js};

struct LocalStore(Storage);

impl LocalStore {
    fn open() -> Result<Self, RelayError> {
        let window = web_sys::window().ok_or_else(|| RelayError::Storage("no window".into()))?;
        window
            .local_storage()
            .map_err(|e| RelayError::Storage(describe(&e)))?
            .map(LocalStore)
            .ok_or_else(|| RelayError::Storage("localStorage unavailable".into()))
    }
}

impl PageStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, RelayError> {
        self.0
            .get_item(key)
            .map_err(|e| RelayError::Storage(describe(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), RelayError> {
        self.0
            .set_item(key, value)
            .map_err(|e| RelayError::Storage(describe(&e)))
    }
}

/// Location to navigate to on popup open, or `null`
#[wasm_bindgen]
pub fn restore_popup_page() -> Result<JsValue, JsValue> {
    crate::init_logging();
    let config = crate::relay_config();
    let store = LocalStore::open().map_err(into_js_error)?;

    let restored = popup::restore(
        &store,
        &config.saved_page_key,
        js_sys::Date::now(),
        config.saved_page_max_age_ms,
    )
    .map_err(into_js_error)?;

    match restored {
        Some(location) => to_js(&location).map_err(into_js_error),
        None => Ok(JsValue::NULL),
    }
}

/// Called on every route change while the popup is open
#[wasm_bindgen]
pub fn remember_popup_page(pathname: String, search: String, hash: String) -> Result<(), JsValue> {
    crate::init_logging();
    let config = crate::relay_config();
    let store = LocalStore::open().map_err(into_js_error)?;
    let location = Location {
        pathname,
        search,
        hash,
    };
    popup::remember(&store, &config.saved_page_key, location, js_sys::Date::now())
        .map_err(into_js_error)
}

/// True when the UI must leave the popup and reopen as a full page
#[wasm_bindgen]
pub fn should_open_in_full_page(is_popup_view: bool, popup_mode_enabled: bool) -> bool {
    popup::launch_mode(is_popup_view, popup_mode_enabled) == LaunchMode::FullPage
}
