// src/pipeline/frame_queue.rs
//
// Single-producer/single-consumer handoff from the capture thread to the
// frame loop. The tracking state never leaves the consumer thread; only
// frames cross. Bounded: a fast producer blocks instead of piling up frames.

use std::sync::mpsc::{self, Receiver, SyncSender};

pub struct FrameProducer<T> {
    tx: SyncSender<T>,
}

pub struct FrameConsumer<T> {
    rx: Receiver<T>,
}

/// Create a queue holding at most `capacity` frames in flight.
pub fn bounded<T>(capacity: usize) -> (FrameProducer<T>, FrameConsumer<T>) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (FrameProducer { tx }, FrameConsumer { rx })
}

impl<T> FrameProducer<T> {
    /// Blocks while the queue is full. `Err(frame)` once the consumer is gone.
    pub fn push(&self, frame: T) -> Result<(), T> {
        self.tx.send(frame).map_err(|e| e.0)
    }
}

impl<T> FrameConsumer<T> {
    /// Next frame, or `None` when the producer has finished and the queue is drained.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }
}
