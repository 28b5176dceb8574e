//! Inputs a router is mounted with.

use std::collections::HashMap;
use std::sync::Arc;

use crate::connection::FrameHandler;
use crate::websocket::{Frame, FrameType};

/// Channels to join plus the handlers that consume frames.
///
/// ```ignore
/// let options = RouterOptions::new()
///     .channel("run-42")
///     .on_message(|frame| println!("{}", frame.frame_type))
///     .on(FrameType::ChatResponse, |frame| handle(frame));
/// ```
#[derive(Clone, Default)]
pub struct RouterOptions {
    pub(crate) channels: Vec<String>,
    pub(crate) on_message: Option<FrameHandler>,
    pub(crate) handlers: HashMap<FrameType, FrameHandler>,
}

impl RouterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join `channel` while mounted. Duplicates are ignored.
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        if !self.channels.contains(&channel) {
            self.channels.push(channel);
        }
        self
    }

    pub fn channels<I, S>(self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        channels
            .into_iter()
            .fold(self, |options, channel| options.channel(channel))
    }

    /// Catch-all handler, called before any typed handler.
    pub fn on_message<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(handler));
        self
    }

    /// Handler for one frame type. Registering a type twice keeps the last.
    pub fn on<F>(mut self, frame_type: FrameType, handler: F) -> Self
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.handlers.insert(frame_type, Arc::new(handler));
        self
    }

    pub fn channel_list(&self) -> &[String] {
        &self.channels
    }

    pub fn handles(&self, frame_type: &FrameType) -> bool {
        self.handlers.contains_key(frame_type)
    }
}

impl std::fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterOptions")
            .field("channels", &self.channels)
            .field("on_message", &self.on_message.is_some())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
