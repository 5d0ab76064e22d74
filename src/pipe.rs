//! Output Pipe
//!
//! The seam between the engine thread and the frame consumer. The engine
//! hands each written generation to an [`OutputSink`]; the sink replies with
//! the logical time to simulate next and, once the consumer is done with an
//! earlier generation, returns its storage for reuse.
//!
//! [`RenderPipe`] / [`FrameConsumer`] are the canonical channel-backed pair:
//! the consumer receives [`PublishedFrame`]s, reads them, and releases them
//! back. Because only two generations exist, `publish` blocks once the
//! consumer falls a full frame behind. That block is the engine's intended
//! backpressure, bounding production rate to consumption rate.

use std::time::Duration;

use crate::engine::LogicalTime;
use crate::errors::{EngineError, Result};
use crate::frame::{FrameBuffers, Generation};

/// A written generation in transit from engine to consumer.
pub struct FramePacket {
    pub generation: Generation,
    pub buffers: Box<FrameBuffers>,
}

/// Consumer-side handoff interface, called from exactly the engine thread.
pub trait OutputSink: Send {
    /// Hands the freshly written generation to the consumer.
    ///
    /// Returns the logical time for the next frame and, once the consumer
    /// has released a previously published generation, that generation's
    /// storage. May block until the consumer catches up.
    fn publish(
        &mut self,
        time: LogicalTime,
        packet: FramePacket,
    ) -> Result<(LogicalTime, Option<Box<FrameBuffers>>)>;
}

struct Release {
    buffers: Box<FrameBuffers>,
    next_time: LogicalTime,
}

/// Engine-side endpoint of the canonical pipe.
pub struct RenderPipe {
    frames: flume::Sender<PublishedFrame>,
    release_tx: flume::Sender<Release>,
    release_rx: flume::Receiver<Release>,
    frame_interval: LogicalTime,
    in_flight: usize,
}

impl RenderPipe {
    /// Creates a connected pipe/consumer pair.
    ///
    /// `frame_interval` (milliseconds) paces the first frame, before any
    /// release from the consumer has carried a logical time back.
    #[must_use]
    pub fn new(frame_interval: LogicalTime) -> (Self, FrameConsumer) {
        let (frames_tx, frames_rx) = flume::unbounded();
        let (release_tx, release_rx) = flume::unbounded();
        (
            Self {
                frames: frames_tx,
                release_tx,
                release_rx,
                frame_interval,
                in_flight: 0,
            },
            FrameConsumer { frames: frames_rx },
        )
    }
}

impl OutputSink for RenderPipe {
    fn publish(
        &mut self,
        time: LogicalTime,
        packet: FramePacket,
    ) -> Result<(LogicalTime, Option<Box<FrameBuffers>>)> {
        let frame = PublishedFrame {
            time,
            generation: packet.generation,
            buffers: Some(packet.buffers),
            releases: self.release_tx.clone(),
        };
        self.frames
            .send(frame)
            .map_err(|_| EngineError::PipeDisconnected)?;
        self.in_flight += 1;

        if self.in_flight < 2 {
            // Nothing to reclaim yet; the engine still holds the spare
            // generation.
            return Ok((time + self.frame_interval, None));
        }

        // Backpressure point: wait for the consumer to release the older
        // generation before the engine may write into it again.
        let release = self
            .release_rx
            .recv()
            .map_err(|_| EngineError::PipeDisconnected)?;
        self.in_flight -= 1;
        Ok((release.next_time, Some(release.buffers)))
    }
}

/// Consumer-side endpoint of the canonical pipe.
pub struct FrameConsumer {
    frames: flume::Receiver<PublishedFrame>,
}

impl FrameConsumer {
    /// Blocks for the next published frame.
    pub fn recv(&self) -> Result<PublishedFrame> {
        self.frames.recv().map_err(|_| EngineError::PipeDisconnected)
    }

    /// Waits up to `timeout` for the next published frame.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PublishedFrame> {
        self.frames.recv_timeout(timeout).ok()
    }

    /// Returns a published frame if one is already waiting.
    #[must_use]
    pub fn try_recv(&self) -> Option<PublishedFrame> {
        self.frames.try_recv().ok()
    }
}

/// A frame generation currently owned by the consumer.
///
/// Read the draw data through [`buffers`](Self::buffers), then call
/// [`release`](Self::release) with the logical time the engine should
/// simulate next. Dropping the frame without releasing returns the storage
/// with the frame's own time, so a lost frame can never wedge the engine.
pub struct PublishedFrame {
    /// Logical time this frame was computed for.
    pub time: LogicalTime,
    /// Which generation this is.
    pub generation: Generation,
    buffers: Option<Box<FrameBuffers>>,
    releases: flume::Sender<Release>,
}

impl PublishedFrame {
    /// The frame's draw data.
    #[must_use]
    pub fn buffers(&self) -> &FrameBuffers {
        self.buffers
            .as_deref()
            .expect("frame buffers present until release")
    }

    /// Returns the generation to the engine, carrying the logical time the
    /// next frame should be computed for.
    pub fn release(mut self, next_time: LogicalTime) {
        if let Some(buffers) = self.buffers.take() {
            let _ = self.releases.send(Release { buffers, next_time });
        }
    }
}

impl Drop for PublishedFrame {
    fn drop(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            let _ = self.releases.send(Release {
                buffers,
                next_time: self.time,
            });
        }
    }
}
