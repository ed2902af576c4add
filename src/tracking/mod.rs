// src/tracking/mod.rs
//
// Temporal core. Per frame:
//
//   labelled detections → identity ─┐
//                                   ├→ shape_tracker (resample + blend)
//                                   └→ lifecycle (prune + idle/fade)
//
// velocity supplies the cosmetic scale hint consumed by shape_tracker.

pub mod identity;
pub mod lifecycle;
pub mod shape_tracker;
pub mod velocity;

pub use identity::IdentityAssigner;
pub use lifecycle::{CanvasState, LifecycleManager, StateTransition};
pub use shape_tracker::{ShapeTracker, TrackedShape, UpdateOutcome};
