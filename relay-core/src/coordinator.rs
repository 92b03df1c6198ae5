// USB Permission Coordinator
// Runs in the tab hosting the USB permissions iframe. Hands the extension id
// to the iframe on init and switches back to the connect popup when done.

use async_trait::async_trait;
use std::cell::Cell;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::message::{PermissionsInit, Signal};

pub type TabId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub index: u32,
    pub url: Option<String>,
}

impl Tab {
    /// Build from the numeric fields the tabs API reports. Tabs without a
    /// real id (`TAB_ID_NONE` is -1) cannot be switched to and yield `None`.
    pub fn from_raw(id: f64, index: f64, url: Option<String>) -> Option<Self> {
        if id.is_nan() || index.is_nan() || id < 0.0 || index < 0.0 {
            return None;
        }
        Some(Self {
            id: id as TabId,
            index: index as u32,
            url,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabQuery {
    ActiveInCurrentWindow,
    IndexInCurrentWindow(u32),
    UrlPattern(String),
}

/// Browser tab operations
#[async_trait(?Send)]
pub trait TabsApi {
    async fn query(&self, query: &TabQuery) -> Result<Vec<Tab>, RelayError>;
    async fn activate(&self, id: TabId) -> Result<(), RelayError>;
    async fn remove(&self, id: TabId) -> Result<(), RelayError>;
}

/// The embedded permissions iframe
pub trait PermissionFrame {
    /// Fails with `RelayError::MissingFrame` when the iframe is absent
    fn post_init(&self, message: &PermissionsInit) -> Result<(), RelayError>;
}

/// Handle on the registered `beforeunload` listener
pub trait UnloadHook {
    fn detach(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchTrigger {
    CloseSignal,
    Unload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched {
        activated: TabId,
        closed: Option<TabId>,
    },
    NoActiveTab,
    NoPrecedingTab,
    NoPopupTab,
    UnloadSwitchDisabled,
    /// Unload fired after the listener was already detached
    UnloadIgnored,
}

pub struct UsbPermissionCoordinator<T, F, U> {
    tabs: T,
    frame: F,
    unload: U,
    extension_id: String,
    popup_url_pattern: String,
    switch_on_unload: bool,
    unload_armed: Cell<bool>,
}

impl<T, F, U> UsbPermissionCoordinator<T, F, U>
where
    T: TabsApi,
    F: PermissionFrame,
    U: UnloadHook,
{
    pub fn new(
        tabs: T,
        frame: F,
        unload: U,
        extension_id: impl Into<String>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            tabs,
            frame,
            unload,
            extension_id: extension_id.into(),
            popup_url_pattern: config.popup_url_pattern.clone(),
            switch_on_unload: config.switch_on_unload,
            unload_armed: Cell::new(true),
        }
    }

    pub fn unload_armed(&self) -> bool {
        self.unload_armed.get()
    }

    /// Init posts into the iframe and yields `None`; close switches tabs.
    pub async fn handle_signal(&self, signal: Signal) -> Result<Option<SwitchOutcome>, RelayError> {
        match signal {
            Signal::UsbPermissionsInit => {
                let message = PermissionsInit::new(self.extension_id.as_str());
                self.frame.post_init(&message)?;
                log::info!("Posted permissions init to iframe");
                Ok(None)
            }
            Signal::UsbPermissionsClose => self
                .switch_to_popup_tab(SwitchTrigger::CloseSignal)
                .await
                .map(Some),
        }
    }

    pub async fn handle_unload(&self) -> Result<SwitchOutcome, RelayError> {
        if !self.unload_armed.get() {
            return Ok(SwitchOutcome::UnloadIgnored);
        }
        self.switch_to_popup_tab(SwitchTrigger::Unload).await
    }

    pub async fn switch_to_popup_tab(
        &self,
        trigger: SwitchTrigger,
    ) -> Result<SwitchOutcome, RelayError> {
        // Detach before the first await so unload cannot re-enter
        self.detach_unload();

        let outcome = match trigger {
            SwitchTrigger::CloseSignal => self.switch_to_previous_tab().await?,
            SwitchTrigger::Unload => self.switch_to_connect_popup().await?,
        };
        log::debug!("Tab switch ({:?}): {:?}", trigger, outcome);
        Ok(outcome)
    }

    fn detach_unload(&self) {
        if self.unload_armed.replace(false) {
            self.unload.detach();
        }
    }

    async fn switch_to_previous_tab(&self) -> Result<SwitchOutcome, RelayError> {
        let active = self.tabs.query(&TabQuery::ActiveInCurrentWindow).await?;
        let Some(current) = active.first() else {
            return Ok(SwitchOutcome::NoActiveTab);
        };
        let Some(previous_index) = current.index.checked_sub(1) else {
            return Ok(SwitchOutcome::NoPrecedingTab);
        };

        let preceding = self
            .tabs
            .query(&TabQuery::IndexInCurrentWindow(previous_index))
            .await?;
        let Some(popup) = preceding.first() else {
            return Ok(SwitchOutcome::NoPrecedingTab);
        };

        self.tabs.activate(popup.id).await?;
        self.tabs.remove(current.id).await?;
        log::info!("Switched to tab {} and closed tab {}", popup.id, current.id);

        Ok(SwitchOutcome::Switched {
            activated: popup.id,
            closed: Some(current.id),
        })
    }

    async fn switch_to_connect_popup(&self) -> Result<SwitchOutcome, RelayError> {
        if !self.switch_on_unload {
            return Ok(SwitchOutcome::UnloadSwitchDisabled);
        }

        let matches = self
            .tabs
            .query(&TabQuery::UrlPattern(self.popup_url_pattern.clone()))
            .await?;
        let Some(popup) = matches.first() else {
            return Ok(SwitchOutcome::NoPopupTab);
        };

        self.tabs.activate(popup.id).await?;
        log::info!("Switched to connect popup tab {}", popup.id);

        Ok(SwitchOutcome::Switched {
            activated: popup.id,
            closed: None,
        })
    }
}
