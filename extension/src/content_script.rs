// Tab Message Bridge wiring
// Runs in the page hosting the connect UI

use std::cell::RefCell;
use std::rc::Rc;

use hw_relay_core::{Forward, PageBus, PageMessage, RelayChannel, RelayError, TabBridge};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, Window};

use crate::browser::{self, Port};
use crate::interop::{describe, into_js_error, JsPayload};

struct PortChannel(Port);

impl RelayChannel<JsPayload> for PortChannel {
    fn post(&self, message: &JsPayload) -> Result<(), RelayError> {
        self.0
            .post_message(&message.0)
            .map_err(|e| RelayError::Channel(describe(&e)))
    }
}

struct WindowBus {
    window: Window,
    origin: String,
}

impl PageBus<JsPayload> for WindowBus {
    fn emit(&self, message: &JsPayload) -> Result<(), RelayError> {
        self.window
            .post_message(&message.0, &self.origin)
            .map_err(|e| RelayError::PageBus(describe(&e)))
    }
}

type Bridge = TabBridge<PortChannel, WindowBus>;

#[wasm_bindgen]
pub fn start_content_bridge() -> Result<(), JsValue> {
    crate::init_logging();
    let config = crate::relay_config();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let origin = window.location().origin()?;
    let port = browser::connect(&config.channel_name).map_err(into_js_error)?;

    let bridge = Rc::new(RefCell::new(TabBridge::new(
        PortChannel(port.clone()),
        WindowBus {
            window: window.clone(),
            origin,
        },
    )));

    // Background -> page
    let on_message = {
        let bridge = bridge.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |message: JsValue| {
            if let Err(e) = bridge.borrow().on_channel_message(&JsPayload(message)) {
                log::warn!("Failed to relay background message: {}", e);
            }
        })
    };
    port.on_message()
        .add_listener(on_message.as_ref().unchecked_ref());
    on_message.forget();

    let on_disconnect = {
        let bridge = bridge.clone();
        Closure::<dyn FnMut(JsValue)>::new(move |_port: JsValue| {
            bridge.borrow_mut().disconnect();
        })
    };
    port.on_disconnect()
        .add_listener(on_disconnect.as_ref().unchecked_ref());
    on_disconnect.forget();

    // Page -> background
    let on_page_message = {
        let window = window.clone();
        Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            relay_page_message(&bridge, &window, &event);
        })
    };
    window.add_event_listener_with_callback("message", on_page_message.as_ref().unchecked_ref())?;
    on_page_message.forget();

    log::info!("Content bridge connected on port `{}`", config.channel_name);
    Ok(())
}

fn relay_page_message(bridge: &Rc<RefCell<Bridge>>, window: &Window, event: &MessageEvent) {
    let from_own_window = event
        .source()
        .is_some_and(|source| js_sys::Object::is(&source, window));
    let message = PageMessage {
        from_own_window,
        data: JsPayload(event.data()),
    };

    match bridge.borrow().on_page_message(&message) {
        Ok(Forward::Sent) => {}
        Ok(skipped) => log::trace!("Page message not forwarded: {:?}", skipped),
        Err(e) => log::warn!("Failed to relay page message: {}", e),
    }
}
