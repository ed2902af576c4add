// src/main.rs

mod canvas;
mod color;
mod config;
mod debug;
mod detection;
mod geometry;
mod pipeline;
mod tracking;
mod types;

use anyhow::{Context, Result};
use canvas::Canvas;
use config::ConfigWatcher;
use detection::{BlobDetector, DepthFrame, DetectionSource, DirectoryFrameSource, FrameSource};
use pipeline::frame_queue::{self, FrameProducer};
use pipeline::{CanvasPipeline, PipelineMetrics};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use types::Config;

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let (mut config, loaded) = Config::load_or_default(&config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("depth_canvas=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🎨 Depth Canvas starting");
    if loaded {
        info!("✓ Configuration loaded from {}", config_path);
    } else {
        warn!("{} not found, running with defaults", config_path);
    }
    config.validate();

    info!(
        "Tracking: {} vertices, blend {:.3}, idle fade after {:.1}s",
        config.tracking.resample_vertex_count,
        config.tracking.blend_factor,
        config.tracking.idle_fade_threshold_seconds
    );

    let output_dir = PathBuf::from(&config.output.dir);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output dir {}", output_dir.display()))?;

    let effective = output_dir.join("config_effective.yaml");
    if let Err(e) = config.save(&effective) {
        warn!("{:#}", e);
    }

    let source = DirectoryFrameSource::open(&config.source.input_dir, config.source.fps)?;
    if source.is_empty() {
        error!("No depth frames found in {}", config.source.input_dir);
        return Ok(());
    }
    info!("Replaying {} frames at {:.1} FPS", source.len(), config.source.fps);

    let mut detector = BlobDetector::new(&config.source);
    let mut pipeline = CanvasPipeline::new(&config.tracking, &config.canvas);

    let (producer, consumer) = frame_queue::bounded::<DepthFrame>(config.source.queue_capacity);
    let capture_metrics = pipeline.metrics().clone();
    let capture = thread::Builder::new()
        .name("capture".to_string())
        .spawn(move || run_capture(source, producer, capture_metrics))
        .context("Failed to spawn capture thread")?;

    let mut canvas = Canvas::new(&config.canvas);
    let mut watcher = ConfigWatcher::new(&config_path);

    let mut last_timestamp = 0.0;
    while let Some(frame) = consumer.recv() {
        last_timestamp = frame.timestamp_secs;
        canvas.fit_source(frame.image.width(), frame.image.height());

        let detections = detector.detect(&frame.image);
        if config.output.save_debug {
            let overlay = debug::render_overlay(&frame.image, &detections, pipeline.palette());
            let path = output_dir.join(format!("debug_{:06}.png", frame.index));
            if let Err(e) = debug::save_overlay(&overlay, &path) {
                warn!("{:#}", e);
            }
        }

        let ctx = pipeline.process_frame(detections, frame.timestamp_secs);
        canvas.stipple(&frame.image, config.source.min_depth, config.source.max_depth);
        canvas.composite(&ctx);

        if let Some(t) = ctx.transition {
            debug!(
                "Frame {} ({:.2}s): {} → {}",
                frame.index,
                frame.timestamp_secs,
                t.from.as_str(),
                t.to.as_str()
            );
        }

        let processed = pipeline.frames_processed();
        if config.output.save_every > 0 && processed % config.output.save_every == 0 {
            save_snapshot(&canvas, &output_dir, &format!("canvas_{:06}.png", frame.index));
            debug!("{:.1} FPS", pipeline.metrics().fps());
        }

        if config.output.reload_check_every > 0
            && processed % config.output.reload_check_every == 0
        {
            if let Some(updated) = watcher.poll() {
                pipeline.apply_tracking_config(&updated.tracking);
                pipeline.set_palette(&updated.canvas);
                detector.reconfigure(&updated.source);
                canvas.set_style(&updated.canvas);
                config = updated;
            }
        }
    }

    match capture.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Capture stopped early: {:#}", e),
        Err(_) => error!("Capture thread panicked"),
    }

    save_snapshot(&canvas, &output_dir, "canvas_final.png");

    let summary = pipeline.metrics().summary();
    let lifecycle = pipeline.lifecycle();
    info!("\n📊 Run summary:");
    info!("  Frames processed: {}", summary.total_frames);
    info!("  Frames with shapes: {}", summary.frames_with_detections);
    info!("  Fading frames: {}", summary.fade_frames);
    if pipeline.tracker().is_empty() {
        info!(
            "  Final state: {} (idle {:.1}s)",
            lifecycle.state().as_str(),
            lifecycle.idle_secs(last_timestamp)
        );
    } else {
        info!(
            "  Final state: {} with {} shape(s) tracked",
            lifecycle.state().as_str(),
            pipeline.tracker().len()
        );
    }
    info!("  Processing speed: {:.1} FPS", summary.fps);
    info!("{}", serde_json::to_string(&summary)?);

    Ok(())
}

fn run_capture(
    mut source: DirectoryFrameSource,
    producer: FrameProducer<DepthFrame>,
    metrics: PipelineMetrics,
) -> Result<()> {
    let result = loop {
        match source.next_frame() {
            Ok(Some(frame)) => {
                metrics.inc(&metrics.frames_captured);
                if producer.push(frame).is_err() {
                    debug!("Frame loop gone, capture stopping");
                    break Ok(());
                }
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    metrics.add(&metrics.frames_unreadable, source.unreadable() as u64);
    result
}

fn save_snapshot(canvas: &Canvas, dir: &Path, name: &str) {
    let path = dir.join(name);
    match canvas.save(&path) {
        Ok(()) => debug!("💾 Canvas saved to {}", path.display()),
        Err(e) => warn!("{:#}", e),
    }
}
