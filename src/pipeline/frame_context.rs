// src/pipeline/frame_context.rs
//
// Everything the tracking core produced for one frame. The compositor
// reads only this: render items plus the fade signal.

use crate::tracking::{CanvasState, StateTransition};
use crate::types::{Identity, RenderItem};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FrameContext {
    pub frame_id: u64,
    pub timestamp_secs: f64,

    /// One item per identity present this frame, in detection order
    pub render: Vec<RenderItem>,
    pub fade: bool,
    pub state: CanvasState,
    pub transition: Option<StateTransition>,

    // Bookkeeping
    pub pruned: Vec<Identity>,
    pub skipped: usize,
    pub reseeded: usize,
}

impl FrameContext {
    pub fn new(frame_id: u64, timestamp_secs: f64) -> Self {
        Self {
            frame_id,
            timestamp_secs,
            render: Vec::new(),
            fade: false,
            state: CanvasState::Active,
            transition: None,
            pruned: Vec::new(),
            skipped: 0,
            reseeded: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.render.is_empty()
    }

    #[cfg(test)]
    pub fn identities(&self) -> Vec<Identity> {
        self.render.iter().map(|r| r.identity).collect()
    }
}
