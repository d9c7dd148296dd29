// src/capture.rs
// Cross-thread frame capture and video export orchestration
// The export worker never touches graphics state: it asks the render thread
// for one frame at a time over a rendezvous channel and blocks until the
// pixels come back. One frame in flight, never pipelined.
// RELEVANT FILES: src/render/target.rs, src/config.rs, src/util/image_write.rs

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;

use log::warn;

/// A captured frame, tightly packed RGBA8.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 4);
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Drop the alpha channel; encoders consume RGB.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixels.len() / 4 * 3);
        for px in self.pixels.chunks_exact(4) {
            rgb.extend_from_slice(&px[..3]);
        }
        rgb
    }
}

/// Shared cooperative cancellation flag, checked before each frame capture.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A pending frame request: the render thread switches to `frame_index`,
/// snapshots, and replies exactly once.
pub struct FrameRequest {
    frame_index: usize,
    reply: SyncSender<Frame>,
}

impl FrameRequest {
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn fulfill(self, frame: Frame) {
        // A worker that gave up waiting is the only way this fails; the
        // frame is simply dropped then.
        let _ = self.reply.send(frame);
    }
}

/// Worker half of the capture handshake.
pub struct FrameRequester {
    requests: SyncSender<FrameRequest>,
}

impl FrameRequester {
    /// Request one frame and block until the render thread replies.
    /// Returns `None` when the responder is gone.
    pub fn capture(&self, frame_index: usize) -> Option<Frame> {
        let (reply_tx, reply_rx) = sync_channel(1);
        self.requests
            .send(FrameRequest {
                frame_index,
                reply: reply_tx,
            })
            .ok()?;
        reply_rx.recv().ok()
    }
}

/// Render-thread half of the capture handshake.
pub struct FrameResponder {
    requests: Receiver<FrameRequest>,
}

impl FrameResponder {
    /// Poll for a pending request without blocking the render loop.
    pub fn try_next(&self) -> Option<FrameRequest> {
        self.requests.try_recv().ok()
    }

    /// Block until a request arrives or the worker is gone.
    pub fn next(&self) -> Option<FrameRequest> {
        self.requests.recv().ok()
    }
}

/// Single-slot request/response channel for frame capture. The request
/// side rendezvouses (capacity 0), so a second request cannot be queued
/// while one is in flight.
pub fn frame_channel() -> (FrameRequester, FrameResponder) {
    let (tx, rx) = sync_channel(0);
    (FrameRequester { requests: tx }, FrameResponder { requests: rx })
}

/// Parameters handed to the external encoder.
#[derive(Debug, Clone)]
pub struct EncodeSettings {
    /// Output path without extension; the encoder appends one per format.
    pub base_path: PathBuf,
    pub frame_count: usize,
    pub fps: u32,
    /// Encoder quality knob, 0-100.
    pub quality: u32,
}

/// External multi-format video encoder.
///
/// Pulls frames through the callback (a `None` frame means the export was
/// cancelled mid-stream), reports progress in [0, 1], and returns every
/// file it produced.
pub trait VideoEncoder {
    fn encode(
        &self,
        settings: &EncodeSettings,
        next_frame: &mut dyn FnMut(usize) -> Option<Frame>,
        progress: &mut dyn FnMut(f32),
    ) -> anyhow::Result<Vec<PathBuf>>;
}

/// Result of a video export.
#[derive(Debug)]
pub enum ExportOutcome {
    Completed(Vec<PathBuf>),
    /// User-cancelled; partial output files were deleted.
    Cancelled,
}

/// Drive a full export on the worker thread.
///
/// Frames are pulled one at a time through `requester`; the cancel token is
/// checked before every capture. On cancellation the encoder's partial
/// output is deleted; an encoder failure without cancellation leaves files
/// intact and propagates the error.
pub fn export_video(
    encoder: &dyn VideoEncoder,
    settings: &EncodeSettings,
    requester: &FrameRequester,
    cancel: &CancelToken,
    mut progress: impl FnMut(f32),
) -> anyhow::Result<ExportOutcome> {
    let mut next_frame = |index: usize| {
        if cancel.is_cancelled() {
            return None;
        }
        requester.capture(index)
    };

    match encoder.encode(settings, &mut next_frame, &mut progress) {
        Ok(files) => {
            if cancel.is_cancelled() {
                for file in &files {
                    if let Err(e) = std::fs::remove_file(file) {
                        warn!("could not remove partial output {}: {e}", file.display());
                    }
                }
                Ok(ExportOutcome::Cancelled)
            } else {
                Ok(ExportOutcome::Completed(files))
            }
        }
        Err(e) if cancel.is_cancelled() => {
            warn!("encoder stopped after cancellation: {e}");
            Ok(ExportOutcome::Cancelled)
        }
        Err(e) => Err(e),
    }
}
