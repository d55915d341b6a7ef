//! The image sub-lane: decodes a PNG buffer lent by the file lane's
//! in-flight read and uploads the resulting pixels.
//!
//! Bridged into existence by the file lane's `MenuWallpaper` completion
//! (see `file_lane.rs`); never reached through `post` directly. Owns no
//! buffer of its own — `tick` is handed a borrow of the file task's bytes
//! each call, which is why the image task's lifetime is bounded by its
//! parent file task's.

use crate::config::EngineConfig;
use crate::sinks::WallpaperSink;
use crate::traits::{ChunkStep, PngDecoder, ProcessResult};

/// Outcome of one image-lane tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageOutcome {
    /// Still decoding or processing; keep the sub-task alive.
    Continue,
    /// Finished (successfully or not) and can be dropped; the file lane
    /// regains ownership of the tick.
    Done,
}

/// Progressive PNG decode state, bridged from a file task.
pub(crate) struct ImageTask {
    decoder: Option<Box<dyn PngDecoder>>,
    is_blocking: bool,
    is_blocking_on_processing: bool,
    is_finished: bool,
    pos_increment: usize,
    processing_pos_increment: usize,
    processing_final_state: Option<ProcessResult>,
}

impl ImageTask {
    /// Start a fresh decode. `input_len` is the file task's current byte
    /// count, used to size both per-tick chunk budgets up front.
    pub(crate) fn new(decoder: Box<dyn PngDecoder>, cfg: &EngineConfig, input_len: usize) -> Self {
        Self {
            decoder: Some(decoder),
            is_blocking: false,
            is_blocking_on_processing: false,
            is_finished: false,
            pos_increment: cfg.png_chunks_per_tick(input_len),
            processing_pos_increment: cfg.png_process_per_tick(input_len),
            processing_final_state: None,
        }
    }

    /// Advance the sub-lane by one tick. `buffer` is the file task's bytes
    /// read so far; `sink`, if present, receives the decoded pixels on
    /// success (it is `None` when no wallpaper sink was configured, in
    /// which case a successful decode is simply dropped).
    pub(crate) fn tick(&mut self, buffer: &[u8], sink: Option<&WallpaperSink>) -> ImageOutcome {
        if self.is_blocking_on_processing {
            return self.tick_processing(sink);
        }
        if !self.is_blocking {
            return self.tick_headers(buffer);
        }
        // is_finished is implied by is_blocking once headers failed outright.
        ImageOutcome::Done
    }

    fn tick_headers(&mut self, buffer: &[u8]) -> ImageOutcome {
        let decoder = self.decoder.as_mut().expect("decoder present until finished");
        for _ in 0..self.pos_increment {
            match decoder.iterate(buffer) {
                ChunkStep::Continue => continue,
                ChunkStep::Done => {
                    self.is_blocking = true;
                    self.is_blocking_on_processing = true;
                    return ImageOutcome::Continue;
                }
                ChunkStep::Error => {
                    self.is_blocking = true;
                    self.is_finished = true;
                    self.decoder = None;
                    return ImageOutcome::Done;
                }
            }
        }
        ImageOutcome::Continue
    }

    fn tick_processing(&mut self, sink: Option<&WallpaperSink>) -> ImageOutcome {
        {
            let decoder = self.decoder.as_mut().expect("decoder present while processing");
            for _ in 0..self.processing_pos_increment {
                match decoder.process() {
                    ProcessResult::Next => continue,
                    terminal => {
                        self.processing_final_state = Some(terminal);
                        break;
                    }
                }
            }
        }
        let Some(final_state) = self.processing_final_state else {
            return ImageOutcome::Continue;
        };
        self.is_finished = true;
        let decoder = self.decoder.take().expect("decoder present at processing exit");
        if final_state == ProcessResult::Ok {
            if let Some((pixels, width, height)) = decoder.into_pixels() {
                if let Some(sink) = sink {
                    sink(pixels, width, height);
                }
            }
        }
        ImageOutcome::Done
    }
}
