// src/pipeline/mod.rs

pub mod frame_context;
pub mod frame_queue;
pub mod metrics;
pub mod orchestrator;

pub use frame_context::FrameContext;
pub use metrics::PipelineMetrics;
pub use orchestrator::CanvasPipeline;
