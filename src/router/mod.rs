//! Event router: component-scoped frame routing on a shared connection.
//!
//! A router joins its channels and registers one catch-all subscription on
//! mount. Each frame goes to `on_message` first and then to the handler for
//! its exact type. Dropping the router unmounts it.

mod options;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::connection::{ConnectionManager, EventKey, FrameHandler, Subscription};
use crate::websocket::{Frame, FrameType};

pub use options::RouterOptions;

pub struct EventRouter {
    manager: Arc<ConnectionManager>,
    channels: Vec<String>,
    subscription: Option<Subscription>,
    last_message: Arc<watch::Sender<Option<Frame>>>,
}

impl EventRouter {
    /// Join the channels in `options` and start routing frames.
    pub fn mount(manager: &Arc<ConnectionManager>, options: RouterOptions) -> Self {
        let (last_message, _) = watch::channel(None);
        let mut router = Self {
            manager: manager.clone(),
            channels: Vec::new(),
            subscription: None,
            last_message: Arc::new(last_message),
        };
        router.apply(options);
        router
    }

    /// Replace channels and handlers.
    ///
    /// New channels are joined before the old ones are released, so a
    /// channel present in both sets never leaves the server.
    pub fn update(&mut self, options: RouterOptions) {
        self.apply(options);
    }

    fn apply(&mut self, options: RouterOptions) {
        let RouterOptions {
            channels,
            on_message,
            handlers,
        } = options;

        for channel in &channels {
            self.manager.subscribe_to_channel(channel);
        }
        let previous = std::mem::replace(&mut self.channels, channels);

        // Register the new handler before dropping the old one so no frame
        // slips between them.
        let subscription = self.manager.subscribe_handler(
            EventKey::Any,
            route(self.last_message.clone(), on_message, handlers),
        );
        self.subscription = Some(subscription);

        for channel in &previous {
            self.manager.unsubscribe_from_channel(channel);
        }
        debug!(channels = ?self.channels, "Router mounted");
    }

    /// Most recently dispatched frame, whichever handler consumed it.
    pub fn last_message(&self) -> Option<Frame> {
        self.last_message.borrow().clone()
    }

    /// Watch `last_message` from async code.
    pub fn last_message_receiver(&self) -> watch::Receiver<Option<Frame>> {
        self.last_message.subscribe()
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Send through the shared connection; `false` when it is not open.
    pub fn send(&self, frame: Frame) -> bool {
        self.manager.send(frame)
    }
}

impl Drop for EventRouter {
    fn drop(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        for channel in std::mem::take(&mut self.channels) {
            self.manager.unsubscribe_from_channel(&channel);
        }
    }
}

fn route(
    last_message: Arc<watch::Sender<Option<Frame>>>,
    on_message: Option<FrameHandler>,
    handlers: HashMap<FrameType, FrameHandler>,
) -> FrameHandler {
    Arc::new(move |frame: &Frame| {
        last_message.send_replace(Some(frame.clone()));
        if let Some(handler) = &on_message {
            handler(frame);
        }
        if let Some(handler) = handlers.get(&frame.frame_type) {
            handler(frame);
        }
    })
}
