//! Mock implementations for test fixtures.
//!
//! This module re-exports the mock implementations from
//! `playground_realtime::adapters::mock` and adds a recording handler.

#[allow(unused_imports)]
pub use playground_realtime::adapters::mock::{MockConnector, MockWebSocket};

use std::sync::{Arc, Mutex};

use playground_realtime::websocket::{Frame, FrameType};

/// Collects the frames a handler was called with.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct Recorder {
    frames: Arc<Mutex<Vec<Frame>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler closure that records into this recorder.
    pub fn handler(&self) -> impl Fn(&Frame) + Send + Sync + 'static {
        let frames = self.frames.clone();
        move |frame: &Frame| frames.lock().unwrap().push(frame.clone())
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub fn types(&self) -> Vec<FrameType> {
        self.frames().into_iter().map(|frame| frame.frame_type).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap().len()
    }
}
