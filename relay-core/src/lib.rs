// Hardware-wallet connect relay
// Platform-independent core: the wasm glue in `extension` binds these
// types to the real browser APIs

pub mod bridge;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod message;
pub mod popup;

pub use bridge::{ChannelState, Forward, PageBus, PageMessage, RelayChannel, TabBridge};
pub use config::RelayConfig;
pub use coordinator::{
    PermissionFrame, SwitchOutcome, SwitchTrigger, Tab, TabId, TabQuery, TabsApi, UnloadHook,
    UsbPermissionCoordinator,
};
pub use error::RelayError;
pub use message::{Payload, PermissionsInit, Signal};
pub use popup::{launch_mode, remember, restore, LaunchMode, Location, PageStore, SavedPage};
