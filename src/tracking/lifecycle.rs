// src/tracking/lifecycle.rs
//
// Runs once per frame after the shape tracker.
//
// Per identity: anything tracked but absent from this frame's presence set
// is pruned. With grace_frames = 0 (the default) that happens the first
// absent frame, and a returning identity starts over from a fresh seed.
//
// Per canvas: a two-state machine driven by the idle timer (timestamp of
// the last frame that saw anything).
//
//   Active  ──(empty for ≥ threshold)──▶ Idling
//   Idling  ──(any identity present)───▶ Active

use crate::tracking::shape_tracker::ShapeTracker;
use crate::types::{Identity, TrackingConfig};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CanvasState {
    Active,
    Idling,
}

impl CanvasState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Idling => "IDLING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub from: CanvasState,
    pub to: CanvasState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleReport {
    pub pruned: Vec<Identity>,
    /// True when the compositor should run its fade pass this frame
    pub fade: bool,
    pub state: CanvasState,
    pub transition: Option<StateTransition>,
}

pub struct LifecycleManager {
    idle_threshold_secs: f64,
    grace_frames: u32,
    /// Timestamp of the most recent non-empty frame. Starts at the first
    /// frame seen so a scene that begins empty still times out.
    last_seen_secs: Option<f64>,
    absent_frames: HashMap<Identity, u32>,
    state: CanvasState,
}

impl LifecycleManager {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            idle_threshold_secs: config.idle_fade_threshold_seconds,
            grace_frames: config.grace_frames,
            last_seen_secs: None,
            absent_frames: HashMap::new(),
            state: CanvasState::Active,
        }
    }

    pub fn reconfigure(&mut self, config: &TrackingConfig) {
        self.idle_threshold_secs = config.idle_fade_threshold_seconds;
        self.grace_frames = config.grace_frames;
    }

    pub fn update(
        &mut self,
        presence: &HashSet<Identity>,
        tracker: &mut ShapeTracker,
        now_secs: f64,
    ) -> LifecycleReport {
        let pruned = self.prune(presence, tracker);

        if !presence.is_empty() || self.last_seen_secs.is_none() {
            self.last_seen_secs = Some(now_secs);
        }
        let fade = presence.is_empty() && self.idle_secs(now_secs) >= self.idle_threshold_secs;

        // Only a detection ends Idling; a raised threshold or a clock step
        // back just pauses the fade.
        let next = if !presence.is_empty() {
            CanvasState::Active
        } else if fade {
            CanvasState::Idling
        } else {
            self.state
        };
        let transition = (next != self.state).then(|| StateTransition {
            from: self.state,
            to: next,
        });
        if let Some(t) = transition {
            info!(
                "Canvas {} → {} (idle {:.1}s)",
                t.from.as_str(),
                t.to.as_str(),
                self.idle_secs(now_secs)
            );
            self.state = next;
        }

        LifecycleReport {
            pruned,
            fade,
            state: self.state,
            transition,
        }
    }

    fn prune(&mut self, presence: &HashSet<Identity>, tracker: &mut ShapeTracker) -> Vec<Identity> {
        for id in presence {
            self.absent_frames.remove(id);
        }

        let mut pruned = Vec::new();
        for id in tracker.identities() {
            if presence.contains(&id) {
                continue;
            }
            let absent = self.absent_frames.entry(id).or_insert(0);
            *absent += 1;
            if *absent > self.grace_frames {
                tracker.remove(id);
                self.absent_frames.remove(&id);
                pruned.push(id);
            }
        }

        if !pruned.is_empty() {
            pruned.sort_unstable();
            debug!("Pruned identities {:?}", pruned);
        }
        pruned
    }

    /// Seconds since anything was last seen. Zero before the first frame.
    pub fn idle_secs(&self, now_secs: f64) -> f64 {
        self.last_seen_secs
            .map(|seen| (now_secs - seen).max(0.0))
            .unwrap_or(0.0)
    }

    #[cfg(test)]
    pub fn last_seen_secs(&self) -> Option<f64> {
        self.last_seen_secs
    }

    pub fn state(&self) -> CanvasState {
        self.state
    }

    /// Whether `identity` is being held through an absence by the grace period.
    #[cfg(test)]
    pub fn is_absent(&self, identity: Identity) -> bool {
        self.absent_frames.contains_key(&identity)
    }
}
