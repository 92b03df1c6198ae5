// Hardware-wallet connect relay - browser glue
// All relay logic lives in hw-relay-core; this crate binds it to the
// extension APIs. One entry point per extension context.

use std::sync::Once;

use hw_relay_core::RelayConfig;

mod browser;
mod content_script;
mod interop;
mod popup;
mod usb_permissions;

pub use content_script::start_content_bridge;
pub use popup::{remember_popup_page, restore_popup_page, should_open_in_full_page};
pub use usb_permissions::start_usb_permissions;

const RELAY_TOML: &str = include_str!("../relay.toml");

static LOGGER: Once = Once::new();

fn init_logging() {
    LOGGER.call_once(|| wasm_logger::init(wasm_logger::Config::default()));
}

/// Embedded relay settings, falling back to defaults on a bad file
fn relay_config() -> RelayConfig {
    RelayConfig::from_toml_str(RELAY_TOML).unwrap_or_else(|e| {
        log::warn!("Using default relay config: {:#}", e);
        RelayConfig::default()
    })
}
