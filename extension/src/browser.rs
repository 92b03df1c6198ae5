// Extension API bindings (chrome.runtime / chrome.tabs)

use hw_relay_core::{RelayError, Tab, TabId, TabQuery};
use js_sys::{Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::interop::describe;

#[wasm_bindgen]
extern "C" {
    pub type Event;

    #[wasm_bindgen(method, js_name = addListener)]
    pub fn add_listener(this: &Event, callback: &js_sys::Function);
}

#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    pub type Port;

    #[wasm_bindgen(method, catch, js_name = postMessage)]
    pub fn post_message(this: &Port, message: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, getter, js_name = onMessage)]
    pub fn on_message(this: &Port) -> Event;

    #[wasm_bindgen(method, getter, js_name = onDisconnect)]
    pub fn on_disconnect(this: &Port) -> Event;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = connect)]
    fn runtime_connect(info: &JsValue) -> Result<Port, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = query)]
    fn tabs_query(info: &JsValue) -> Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = update)]
    fn tabs_update(id: u32, props: &JsValue) -> Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = remove)]
    fn tabs_remove(id: u32) -> Promise;
}

/// Open a named long-lived port to the background
pub fn connect(name: &str) -> Result<Port, RelayError> {
    let info = Object::new();
    Reflect::set(&info, &"name".into(), &name.into())
        .map_err(|e| RelayError::Channel(describe(&e)))?;
    runtime_connect(&info).map_err(|e| RelayError::Channel(describe(&e)))
}

/// `chrome.runtime.id`
pub fn runtime_id() -> Result<String, JsValue> {
    let chrome = Reflect::get(&js_sys::global(), &"chrome".into())?;
    let runtime = Reflect::get(&chrome, &"runtime".into())?;
    Reflect::get(&runtime, &"id".into())?
        .as_string()
        .ok_or_else(|| JsValue::from_str("chrome.runtime.id unavailable"))
}

fn query_info(query: &TabQuery) -> Result<Object, JsValue> {
    let info = Object::new();
    match query {
        TabQuery::ActiveInCurrentWindow => {
            Reflect::set(&info, &"currentWindow".into(), &JsValue::TRUE)?;
            Reflect::set(&info, &"active".into(), &JsValue::TRUE)?;
        }
        TabQuery::IndexInCurrentWindow(index) => {
            Reflect::set(&info, &"currentWindow".into(), &JsValue::TRUE)?;
            Reflect::set(&info, &"index".into(), &(*index as f64).into())?;
        }
        TabQuery::UrlPattern(pattern) => {
            Reflect::set(&info, &"url".into(), &pattern.into())?;
        }
    }
    Ok(info)
}

/// Tabs without an id (devtools windows, `TAB_ID_NONE`) are skipped
fn parse_tab(value: &JsValue) -> Option<Tab> {
    let id = Reflect::get(value, &"id".into()).ok()?.as_f64()?;
    let index = Reflect::get(value, &"index".into()).ok()?.as_f64()?;
    let url = Reflect::get(value, &"url".into())
        .ok()
        .and_then(|u| u.as_string());
    Tab::from_raw(id, index, url)
}

pub async fn query_tabs(query: &TabQuery) -> Result<Vec<Tab>, RelayError> {
    let info = query_info(query).map_err(|e| RelayError::Tabs(describe(&e)))?;
    let result = JsFuture::from(tabs_query(&info))
        .await
        .map_err(|e| RelayError::Tabs(describe(&e)))?;

    let tabs = js_sys::Array::from(&result);
    Ok(tabs.iter().filter_map(|t| parse_tab(&t)).collect())
}

pub async fn activate_tab(id: TabId) -> Result<(), RelayError> {
    let props = Object::new();
    Reflect::set(&props, &"active".into(), &JsValue::TRUE)
        .map_err(|e| RelayError::Tabs(describe(&e)))?;
    JsFuture::from(tabs_update(id, &props))
        .await
        .map_err(|e| RelayError::Tabs(describe(&e)))?;
    Ok(())
}

pub async fn remove_tab(id: TabId) -> Result<(), RelayError> {
    JsFuture::from(tabs_remove(id))
        .await
        .map_err(|e| RelayError::Tabs(describe(&e)))?;
    Ok(())
}
