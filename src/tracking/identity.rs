// src/tracking/identity.rs
//
// Surfaces the labels the detection collaborator already assigned and
// builds the frame's presence set. No correspondence logic lives here:
// re-matching on top of the collaborator's labels would double-track.

use crate::types::{Identity, LabeledDetection, RawDetection};
use std::collections::HashSet;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Outline with fewer than two points cannot be resampled
    TooFewPoints(usize),
    /// Label already used by an earlier detection this frame
    DuplicateLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedDetection {
    pub label: Identity,
    pub reason: SkipReason,
}

/// One frame's assignments. `assigned` keeps detection order.
#[derive(Debug, Clone, Default)]
pub struct FrameAssignment {
    pub assigned: Vec<(Identity, RawDetection)>,
    pub presence: HashSet<Identity>,
    pub skipped: Vec<SkippedDetection>,
}

impl FrameAssignment {
    pub fn is_empty(&self) -> bool {
        self.presence.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct IdentityAssigner;

impl IdentityAssigner {
    pub fn new() -> Self {
        Self
    }

    /// Malformed and duplicate-label detections are skipped for this frame
    /// and do not count as present.
    pub fn assign(&self, detections: Vec<LabeledDetection>) -> FrameAssignment {
        let mut frame = FrameAssignment {
            assigned: Vec::with_capacity(detections.len()),
            presence: HashSet::with_capacity(detections.len()),
            skipped: Vec::new(),
        };

        for LabeledDetection { label, detection } in detections {
            let points = detection.outline.len();
            if points < 2 {
                warn!(
                    "Skipping detection {}: outline has {} point(s)",
                    label, points
                );
                frame.skipped.push(SkippedDetection {
                    label,
                    reason: SkipReason::TooFewPoints(points),
                });
                continue;
            }
            if !frame.presence.insert(label) {
                warn!("Skipping detection {}: label repeated in frame", label);
                frame.skipped.push(SkippedDetection {
                    label,
                    reason: SkipReason::DuplicateLabel,
                });
                continue;
            }
            trace!("Identity {} ← {} outline points", label, points);
            frame.assigned.push((label, detection));
        }

        frame
    }
}
