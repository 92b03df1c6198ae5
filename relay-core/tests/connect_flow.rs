// End-to-end connect flow against in-memory browser fakes

use async_trait::async_trait;
use hw_relay_core::{
    Forward, PageBus, PageMessage, PermissionFrame, PermissionsInit, RelayChannel, RelayConfig,
    RelayError, Signal, SwitchOutcome, Tab, TabBridge, TabId, TabQuery, TabsApi, UnloadHook,
    UsbPermissionCoordinator,
};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared browser state: a single window of tabs plus message logs
#[derive(Default)]
struct Browser {
    tabs: RefCell<Vec<(Tab, bool)>>,
    background_inbox: RefCell<Vec<Value>>,
    page_outbox: RefCell<Vec<Value>>,
    iframe_inbox: RefCell<Vec<PermissionsInit>>,
    unload_listeners: Cell<u32>,
}

#[derive(Clone)]
struct Handle(Rc<Browser>);

impl RelayChannel<Value> for Handle {
    fn post(&self, message: &Value) -> Result<(), RelayError> {
        self.0.background_inbox.borrow_mut().push(message.clone());
        Ok(())
    }
}

impl PageBus<Value> for Handle {
    fn emit(&self, message: &Value) -> Result<(), RelayError> {
        self.0.page_outbox.borrow_mut().push(message.clone());
        Ok(())
    }
}

impl PermissionFrame for Handle {
    fn post_init(&self, message: &PermissionsInit) -> Result<(), RelayError> {
        self.0.iframe_inbox.borrow_mut().push(message.clone());
        Ok(())
    }
}

impl UnloadHook for Handle {
    fn detach(&self) {
        self.0.unload_listeners.set(self.0.unload_listeners.get() - 1);
    }
}

#[async_trait(?Send)]
impl TabsApi for Handle {
    async fn query(&self, query: &TabQuery) -> Result<Vec<Tab>, RelayError> {
        let tabs = self.0.tabs.borrow();
        let found = tabs.iter().filter(|(tab, active)| match query {
            TabQuery::ActiveInCurrentWindow => *active,
            TabQuery::IndexInCurrentWindow(i) => tab.index == *i,
            TabQuery::UrlPattern(_) => tab
                .url
                .as_deref()
                .is_some_and(|u| u.starts_with("https://connect.trezor.io/") && u.ends_with("/popup.html")),
        });
        Ok(found.map(|(tab, _)| tab.clone()).collect())
    }

    async fn activate(&self, id: TabId) -> Result<(), RelayError> {
        for (tab, active) in self.0.tabs.borrow_mut().iter_mut() {
            *active = tab.id == id;
        }
        Ok(())
    }

    async fn remove(&self, id: TabId) -> Result<(), RelayError> {
        let mut tabs = self.0.tabs.borrow_mut();
        tabs.retain(|(tab, _)| tab.id != id);
        for (i, (tab, _)) in tabs.iter_mut().enumerate() {
            tab.index = i as u32;
        }
        Ok(())
    }
}

fn open_tab(browser: &Browser, id: TabId, url: &str) {
    let mut tabs = browser.tabs.borrow_mut();
    for (_, active) in tabs.iter_mut() {
        *active = false;
    }
    let index = tabs.len() as u32;
    tabs.push((
        Tab {
            id,
            index,
            url: Some(url.to_string()),
        },
        true,
    ));
}

#[tokio::test]
async fn test_usb_permission_round_trip() {
    let browser = Rc::new(Browser::default());
    let handle = Handle(browser.clone());
    open_tab(&browser, 1, "https://connect.trezor.io/8/popup.html");

    // The connect popup page talks to the background through the bridge
    let mut bridge = TabBridge::new(handle.clone(), handle.clone());
    let request = json!({ "type": "iframe-call", "payload": { "method": "requestLogin" } });
    let forwarded = bridge
        .on_page_message(&PageMessage {
            from_own_window: true,
            data: request.clone(),
        })
        .unwrap();
    assert_eq!(forwarded, Forward::Sent);

    // User is sent to the permissions tab
    open_tab(&browser, 2, "chrome-extension://ext-id/usb-permissions.html");
    browser.unload_listeners.set(1);
    let config = RelayConfig::default();
    let coordinator =
        UsbPermissionCoordinator::new(handle.clone(), handle.clone(), handle.clone(), "ext-id", &config);

    let init = Signal::decode(Some("usb-permissions-init")).unwrap();
    assert_eq!(coordinator.handle_signal(init).await.unwrap(), None);
    assert_eq!(*browser.iframe_inbox.borrow(), vec![PermissionsInit::new("ext-id")]);

    let close = Signal::decode(Some("usb-permissions-close")).unwrap();
    let outcome = coordinator.handle_signal(close).await.unwrap();
    assert_eq!(
        outcome,
        Some(SwitchOutcome::Switched {
            activated: 1,
            closed: Some(2)
        })
    );

    // Closing the tab fires beforeunload, which must not switch again
    assert_eq!(coordinator.handle_unload().await.unwrap(), SwitchOutcome::UnloadIgnored);
    assert_eq!(browser.unload_listeners.get(), 0);
    assert_eq!(*browser.tabs.borrow(), vec![(
        Tab {
            id: 1,
            index: 0,
            url: Some("https://connect.trezor.io/8/popup.html".to_string())
        },
        true
    )]);

    // Background answers, then goes away
    bridge.on_channel_message(&json!({ "success": true })).unwrap();
    bridge.disconnect();
    let dropped = bridge
        .on_page_message(&PageMessage {
            from_own_window: true,
            data: json!("late"),
        })
        .unwrap();

    assert_eq!(dropped, Forward::ChannelAbsent);
    assert_eq!(*browser.background_inbox.borrow(), vec![request]);
    assert_eq!(*browser.page_outbox.borrow(), vec![json!({ "success": true })]);
}
