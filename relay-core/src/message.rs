// Message shapes crossing the extension contexts

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const USB_PERMISSIONS_INIT: &str = "usb-permissions-init";
pub const USB_PERMISSIONS_CLOSE: &str = "usb-permissions-close";

/// Signals posted by the connect popup into the permissions tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    UsbPermissionsInit,
    UsbPermissionsClose,
}

impl Signal {
    /// Decode raw message data. Anything but the two sentinel strings is not a signal.
    pub fn decode(data: Option<&str>) -> Option<Self> {
        match data? {
            USB_PERMISSIONS_INIT => Some(Signal::UsbPermissionsInit),
            USB_PERMISSIONS_CLOSE => Some(Signal::UsbPermissionsClose),
            _ => None,
        }
    }

    /// Decode from a structured payload (only string values can be signals)
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::decode(value.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::UsbPermissionsInit => USB_PERMISSIONS_INIT,
            Signal::UsbPermissionsClose => USB_PERMISSIONS_CLOSE,
        }
    }
}

/// Acknowledgment posted into the permissions iframe on init
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PermissionsInit {
    #[serde(rename = "type")]
    pub kind: String,
    pub extension: String,
}

impl PermissionsInit {
    pub fn new(extension_id: impl Into<String>) -> Self {
        Self {
            kind: USB_PERMISSIONS_INIT.to_string(),
            extension: extension_id.into(),
        }
    }
}

/// A relayed payload. Empty follows JavaScript truthiness:
/// null, undefined, false, 0, NaN and "" are all empty.
pub trait Payload {
    fn is_empty(&self) -> bool;
}

impl Payload for Value {
    fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(_) | Value::Object(_) => false,
        }
    }
}
