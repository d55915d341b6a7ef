//! The file lane: chunked, non-blocking file reads, with an optional
//! bridge into the image sub-lane for PNG wallpaper loads.
//!
//! State machine (spec'd as IDLE -> OPEN_OK -> TRANSFERRING -> PARSING ->
//! FINISHED -> IDLE): `FileLane::task` being `None` is IDLE; once a command
//! is pulled and `NbioOpener::open` succeeds, `FileTask` tracks the rest.
//! `is_blocking` flips true when the chunked read finishes (TRANSFERRING ->
//! PARSING); `is_finished` flips true once the completion tag has been
//! dispatched (PARSING -> FINISHED). A `MenuWallpaper` tag defers the final
//! free by bridging to an `ImageTask`, which borrows the still-alive file
//! buffer until it finishes.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::command::FileCompletion;
use crate::image_lane::{ImageOutcome, ImageTask};
use crate::queue::{split_tag, MessageQueue};
use crate::sinks::WallpaperSink;
use crate::traits::{IterateResult, NbioFile, NbioOpener, PngDecoderFactory};

struct FileTask {
    handle: Box<dyn NbioFile>,
    completion: FileCompletion,
    is_blocking: bool,
    is_finished: bool,
    image: Option<ImageTask>,
}

impl FileTask {
    /// Advance by one tick. Returns `true` once the handle should be freed
    /// and the lane returned to idle.
    fn tick(
        &mut self,
        cfg: &EngineConfig,
        png_factory: &dyn PngDecoderFactory,
        sink: Option<&WallpaperSink>,
    ) -> bool {
        if let Some(image) = self.image.as_mut() {
            return match image.tick(self.handle.data(), sink) {
                ImageOutcome::Continue => false,
                ImageOutcome::Done => {
                    self.image = None;
                    true
                }
            };
        }

        if !self.is_blocking {
            for _ in 0..cfg.nbio_steps_per_tick {
                match self.handle.iterate() {
                    IterateResult::Continue => continue,
                    IterateResult::Done => {
                        self.is_blocking = true;
                        break;
                    }
                    IterateResult::Error => {
                        warn!("file lane: nbio transfer failed");
                        self.is_blocking = true;
                        self.is_finished = true;
                        return true;
                    }
                }
            }
            return false;
        }

        if !self.is_finished {
            self.is_finished = true;
            return match self.completion {
                FileCompletion::Default => true,
                FileCompletion::MenuWallpaper => match png_factory.new_decoder() {
                    Some(decoder) => {
                        let len = self.handle.data().len();
                        self.image = Some(ImageTask::new(decoder, cfg, len));
                        false
                    }
                    None => {
                        warn!("file lane: could not start png decoder for wallpaper load");
                        true
                    }
                },
            };
        }

        true
    }
}

/// The file-read lane: a bounded command queue feeding a single in-flight
/// [`FileTask`] at a time.
pub(crate) struct FileLane {
    queue: MessageQueue,
    opener: Arc<dyn NbioOpener>,
    png_factory: Arc<dyn PngDecoderFactory>,
    wallpaper_sink: Option<Arc<WallpaperSink>>,
    task: Option<FileTask>,
    cfg: EngineConfig,
}

impl FileLane {
    pub(crate) fn new(
        cfg: EngineConfig,
        opener: Arc<dyn NbioOpener>,
        png_factory: Arc<dyn PngDecoderFactory>,
        wallpaper_sink: Option<Arc<WallpaperSink>>,
    ) -> Self {
        Self {
            queue: MessageQueue::new(cfg.queue_capacity),
            opener,
            png_factory,
            wallpaper_sink,
            task: None,
            cfg,
        }
    }

    /// Enqueue a `"path"` or `"path|tag"` command. Returns `false` if the
    /// queue was full and the command was silently dropped.
    pub(crate) fn post(&self, command: impl Into<String>, priority: i32, duration: Duration) -> bool {
        self.queue.push(command, priority, duration)
    }

    pub(crate) fn dropped_count(&self) -> u64 {
        self.queue.dropped_count()
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
        self.task = None;
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    /// Advance by one tick. Returns `true` if the lane did any work (opened
    /// a file, advanced a read, or freed a handle), used by the worker
    /// thread to decide whether to keep spinning or sleep.
    pub(crate) fn tick(&mut self) -> bool {
        if self.task.is_none() {
            let Some(command) = self.queue.pull() else {
                return false;
            };
            let (path, tag) = split_tag(&command);
            let completion = FileCompletion::parse(tag);
            match self.opener.open(path) {
                Some(handle) => {
                    debug!(path, "file lane: opened");
                    self.task = Some(FileTask {
                        handle,
                        completion,
                        is_blocking: false,
                        is_finished: false,
                        image: None,
                    });
                }
                None => warn!(path, "file lane: open failed"),
            }
            return true;
        }

        let task = self.task.as_mut().expect("checked above");
        let sink = self.wallpaper_sink.as_deref();
        if task.tick(&self.cfg, self.png_factory.as_ref(), sink) {
            self.task = None;
        }
        true
    }
}
