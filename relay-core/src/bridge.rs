// Tab Message Bridge
// Forwards messages between the hosting page's window and a long-lived
// port to the extension background

use crate::error::RelayError;
use crate::message::Payload;

/// Outbound half of the background port
pub trait RelayChannel<M> {
    fn post(&self, message: &M) -> Result<(), RelayError>;
}

/// The hosting page's global message bus (same-origin `postMessage`)
pub trait PageBus<M> {
    fn emit(&self, message: &M) -> Result<(), RelayError>;
}

/// Connection state of the background port
///
/// Once `Disconnected`, the bridge never reconnects on its own.
pub enum ChannelState<C> {
    Connected(C),
    Disconnected,
}

impl<C> ChannelState<C> {
    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelState::Connected(_))
    }
}

/// A message event observed on the page
#[derive(Debug, Clone)]
pub struct PageMessage<M> {
    /// True when the event's source is the page's own window
    pub from_own_window: bool,
    pub data: M,
}

/// What happened to a page message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forward {
    Sent,
    ChannelAbsent,
    ForeignSource,
    EmptyPayload,
}

pub struct TabBridge<C, B> {
    channel: ChannelState<C>,
    page: B,
}

impl<C, B> TabBridge<C, B> {
    pub fn new(channel: C, page: B) -> Self {
        Self {
            channel: ChannelState::Connected(channel),
            page,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    /// Background side went away. Later page messages are dropped.
    pub fn disconnect(&mut self) {
        if self.channel.is_connected() {
            log::info!("Background channel disconnected, forwarding disabled");
        }
        self.channel = ChannelState::Disconnected;
    }

    /// Background → page
    pub fn on_channel_message<M>(&self, message: &M) -> Result<(), RelayError>
    where
        B: PageBus<M>,
    {
        self.page.emit(message)
    }

    /// Page → background
    pub fn on_page_message<M>(&self, event: &PageMessage<M>) -> Result<Forward, RelayError>
    where
        C: RelayChannel<M>,
        M: Payload,
    {
        let ChannelState::Connected(channel) = &self.channel else {
            log::debug!("Dropping page message: no background channel");
            return Ok(Forward::ChannelAbsent);
        };
        if !event.from_own_window {
            return Ok(Forward::ForeignSource);
        }
        if event.data.is_empty() {
            return Ok(Forward::EmptyPayload);
        }

        channel.post(&event.data)?;
        Ok(Forward::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Rc<RefCell<Vec<Value>>>,
    }

    impl RelayChannel<Value> for Recorder {
        fn post(&self, message: &Value) -> Result<(), RelayError> {
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    impl PageBus<Value> for Recorder {
        fn emit(&self, message: &Value) -> Result<(), RelayError> {
            self.sent.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    struct BrokenPort;

    impl RelayChannel<Value> for BrokenPort {
        fn post(&self, _message: &Value) -> Result<(), RelayError> {
            Err(RelayError::Channel("Attempting to use a disconnected port".into()))
        }
    }

    fn own(data: Value) -> PageMessage<Value> {
        PageMessage {
            from_own_window: true,
            data,
        }
    }

    #[test]
    fn test_background_messages_reach_page_in_order() {
        let port = Recorder::default();
        let page = Recorder::default();
        let bridge = TabBridge::new(port.clone(), page.clone());

        for i in 0..3 {
            bridge.on_channel_message(&json!({ "seq": i })).unwrap();
        }

        assert_eq!(
            *page.sent.borrow(),
            vec![json!({ "seq": 0 }), json!({ "seq": 1 }), json!({ "seq": 2 })]
        );
        assert!(port.sent.borrow().is_empty());
    }

    #[test]
    fn test_page_message_forwarded_unchanged() {
        let port = Recorder::default();
        let bridge = TabBridge::new(port.clone(), Recorder::default());
        let payload = json!({ "event": "UI_EVENT", "payload": { "device": null } });

        assert_eq!(bridge.on_page_message(&own(payload.clone())).unwrap(), Forward::Sent);
        assert_eq!(*port.sent.borrow(), vec![payload]);
    }

    #[test]
    fn test_foreign_source_never_forwarded() {
        let port = Recorder::default();
        let bridge = TabBridge::new(port.clone(), Recorder::default());
        let event = PageMessage {
            from_own_window: false,
            data: json!({ "type": "iframe" }),
        };

        assert_eq!(bridge.on_page_message(&event).unwrap(), Forward::ForeignSource);
        assert!(port.sent.borrow().is_empty());
    }

    #[test]
    fn test_empty_payload_dropped() {
        let port = Recorder::default();
        let bridge = TabBridge::new(port.clone(), Recorder::default());

        for data in [json!(null), json!(""), json!(false), json!(0)] {
            assert_eq!(bridge.on_page_message(&own(data)).unwrap(), Forward::EmptyPayload);
        }
        assert!(port.sent.borrow().is_empty());
    }

    #[test]
    fn test_disconnect_stops_forwarding() {
        let port = Recorder::default();
        let mut bridge = TabBridge::new(port.clone(), Recorder::default());

        bridge.on_page_message(&own(json!("before"))).unwrap();
        bridge.disconnect();
        assert!(!bridge.is_connected());

        for i in 0..5 {
            assert_eq!(
                bridge.on_page_message(&own(json!({ "after": i }))).unwrap(),
                Forward::ChannelAbsent
            );
        }
        assert_eq!(*port.sent.borrow(), vec![json!("before")]);
    }

    #[test]
    fn test_channel_checked_before_source_and_payload() {
        let port = Recorder::default();
        let mut bridge = TabBridge::new(port.clone(), Recorder::default());
        bridge.disconnect();

        let foreign = PageMessage {
            from_own_window: false,
            data: json!({ "type": "iframe" }),
        };
        assert_eq!(bridge.on_page_message(&foreign).unwrap(), Forward::ChannelAbsent);
        assert_eq!(bridge.on_page_message(&own(json!(null))).unwrap(), Forward::ChannelAbsent);

        let connected = TabBridge::new(port.clone(), Recorder::default());
        let foreign_empty = PageMessage {
            from_own_window: false,
            data: json!(""),
        };
        assert_eq!(
            connected.on_page_message(&foreign_empty).unwrap(),
            Forward::ForeignSource
        );
        assert!(port.sent.borrow().is_empty());
    }

    #[test]
    fn test_background_to_page_survives_disconnect() {
        let page = Recorder::default();
        let mut bridge = TabBridge::new(Recorder::default(), page.clone());
        bridge.disconnect();

        bridge.on_channel_message(&json!("late")).unwrap();
        assert_eq!(*page.sent.borrow(), vec![json!("late")]);
    }

    #[test]
    fn test_channel_failure_is_reported() {
        let bridge = TabBridge::new(BrokenPort, Recorder::default());
        let err = bridge.on_page_message(&own(json!({ "a": 1 }))).unwrap_err();
        assert!(matches!(err, RelayError::Channel(_)));
    }
}
