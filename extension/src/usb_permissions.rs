// USB Permission Coordinator wiring
// Runs in the extension tab that embeds the USB permissions iframe

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use hw_relay_core::{
    PermissionFrame, PermissionsInit, RelayError, Signal, Tab, TabId, TabQuery, TabsApi,
    UnloadHook, UsbPermissionCoordinator,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlIFrameElement, MessageEvent, Window};

use crate::browser;
use crate::interop::{describe, to_js};

struct BrowserTabs;

#[async_trait(?Send)]
impl TabsApi for BrowserTabs {
    async fn query(&self, query: &TabQuery) -> Result<Vec<Tab>, RelayError> {
        browser::query_tabs(query).await
    }

    async fn activate(&self, id: TabId) -> Result<(), RelayError> {
        browser::activate_tab(id).await
    }

    async fn remove(&self, id: TabId) -> Result<(), RelayError> {
        browser::remove_tab(id).await
    }
}

struct IframeTarget {
    document: Document,
    iframe_id: String,
}

impl PermissionFrame for IframeTarget {
    fn post_init(&self, message: &PermissionsInit) -> Result<(), RelayError> {
        let missing = || RelayError::MissingFrame(self.iframe_id.clone());
        let target = self
            .document
            .get_element_by_id(&self.iframe_id)
            .and_then(|el| el.dyn_into::<HtmlIFrameElement>().ok())
            .and_then(|iframe| iframe.content_window())
            .ok_or_else(missing)?;

        target
            .post_message(&to_js(message)?, "*")
            .map_err(|e| RelayError::PageBus(describe(&e)))
    }
}

/// Shared slot for the `beforeunload` callback so the coordinator can detach it
#[derive(Clone)]
struct UnloadListener {
    window: Window,
    callback: Rc<RefCell<Option<js_sys::Function>>>,
}

impl UnloadHook for UnloadListener {
    fn detach(&self) {
        if let Some(callback) = self.callback.borrow_mut().take() {
            if let Err(e) = self
                .window
                .remove_event_listener_with_callback("beforeunload", &callback)
            {
                log::warn!("Failed to remove beforeunload listener: {}", describe(&e));
            }
        }
    }
}

type Coordinator = UsbPermissionCoordinator<BrowserTabs, IframeTarget, UnloadListener>;

#[wasm_bindgen]
pub fn start_usb_permissions() -> Result<(), JsValue> {
    crate::init_logging();
    let config = crate::relay_config();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let extension_id = browser::runtime_id()?;

    let unload = UnloadListener {
        window: window.clone(),
        callback: Rc::new(RefCell::new(None)),
    };
    let coordinator: Rc<Coordinator> = Rc::new(UsbPermissionCoordinator::new(
        BrowserTabs,
        IframeTarget {
            document,
            iframe_id: config.permissions_iframe_id.clone(),
        },
        unload.clone(),
        extension_id,
        &config,
    ));

    let on_message = {
        let coordinator = coordinator.clone();
        Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            let Some(signal) = Signal::decode(event.data().as_string().as_deref()) else {
                return;
            };
            let coordinator = coordinator.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match coordinator.handle_signal(signal).await {
                    Ok(Some(outcome)) => log::debug!("{} handled: {:?}", signal.as_str(), outcome),
                    Ok(None) => {}
                    Err(e) => log::warn!("{} failed: {}", signal.as_str(), e),
                }
            });
        })
    };
    window.add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())?;
    on_message.forget();

    let on_unload = Closure::<dyn FnMut(JsValue)>::new(move |_event: JsValue| {
        let coordinator = coordinator.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = coordinator.handle_unload().await {
                log::warn!("Switching back on unload failed: {}", e);
            }
        });
    });
    let callback: js_sys::Function = on_unload.as_ref().unchecked_ref::<js_sys::Function>().clone();
    window.add_event_listener_with_callback("beforeunload", &callback)?;
    *unload.callback.borrow_mut() = Some(callback);
    on_unload.forget();

    log::info!("USB permissions coordinator ready");
    Ok(())
}
