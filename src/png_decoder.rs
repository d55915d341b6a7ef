//! Real PNG decoder: a manual, bounded chunk walk (matching the spec's own
//! "advance the cursor by `4 + 4 + chunk.size + 4` per chunk" arithmetic)
//! feeding pixel decode via the `image` crate once all required chunks are
//! present.
//!
//! The chunk walk never copies bytes; it only inspects the file lane's
//! buffer through the borrow handed to `iterate`. Once headers are
//! confirmed complete, the decoder takes its own copy of the bytes (the
//! `image` crate has no incremental PNG API to decode against a borrow a
//! tick at a time) and the progressive part becomes a row counter rather
//! than a second pass over the source bytes.

use image::GenericImageView;
use tracing::warn;

use crate::traits::{ChunkStep, PngDecoder, PngDecoderFactory, ProcessResult};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

#[derive(Default)]
struct ChunkWalk {
    cursor: usize,
    seen_ihdr: bool,
    seen_idat: bool,
    seen_iend: bool,
}

impl ChunkWalk {
    fn step(&mut self, buffer: &[u8]) -> ChunkStep {
        if self.cursor == 0 {
            if buffer.len() < PNG_SIGNATURE.len() || buffer[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
                return ChunkStep::Error;
            }
            self.cursor = PNG_SIGNATURE.len();
        }

        if self.cursor + 8 > buffer.len() {
            return ChunkStep::Error;
        }
        let len = u32::from_be_bytes(buffer[self.cursor..self.cursor + 4].try_into().unwrap()) as usize;
        let chunk_type = &buffer[self.cursor + 4..self.cursor + 8];
        let chunk_total = 4 + 4 + len + 4;
        if self.cursor + chunk_total > buffer.len() {
            return ChunkStep::Error;
        }

        match chunk_type {
            b"IHDR" => self.seen_ihdr = true,
            b"IDAT" => self.seen_idat = true,
            b"IEND" => self.seen_iend = true,
            _ => {}
        }
        let is_iend = chunk_type == b"IEND";
        self.cursor += chunk_total;

        if is_iend {
            if self.seen_ihdr && self.seen_idat && self.seen_iend {
                ChunkStep::Done
            } else {
                ChunkStep::Error
            }
        } else {
            ChunkStep::Continue
        }
    }
}

/// A [`PngDecoder`] backed by `image`'s PNG codec.
#[derive(Default)]
pub struct ImagePngDecoder {
    walk: ChunkWalk,
    raw: Option<Vec<u8>>,
    decoded: Option<(Vec<u8>, u32, u32)>,
    rows_delivered: usize,
    rows_total: usize,
    failed: bool,
}

impl PngDecoder for ImagePngDecoder {
    fn iterate(&mut self, buffer: &[u8]) -> ChunkStep {
        let step = self.walk.step(buffer);
        if step == ChunkStep::Done {
            self.raw = Some(buffer.to_vec());
        }
        step
    }

    fn process(&mut self) -> ProcessResult {
        if self.failed {
            return ProcessResult::ErrorEnd;
        }
        if self.decoded.is_none() {
            let raw = self
                .raw
                .as_ref()
                .expect("process is only called after the chunk walk reaches Done");
            match image::load_from_memory(raw) {
                Ok(img) => {
                    let (width, height) = img.dimensions();
                    self.rows_total = (height as usize).max(1);
                    self.decoded = Some((img.to_rgba8().into_raw(), width, height));
                }
                Err(err) => {
                    warn!(error = %err, "png: decode failed");
                    self.failed = true;
                    return ProcessResult::Error;
                }
            }
        }
        self.rows_delivered += 1;
        if self.rows_delivered >= self.rows_total {
            ProcessResult::Ok
        } else {
            ProcessResult::Next
        }
    }

    fn into_pixels(self: Box<Self>) -> Option<(Vec<u8>, u32, u32)> {
        self.decoded
    }
}

/// Factory producing [`ImagePngDecoder`] instances.
pub struct ImagePngDecoderFactory;

impl PngDecoderFactory for ImagePngDecoderFactory {
    fn new_decoder(&self) -> Option<Box<dyn PngDecoder>> {
        Some(Box::new(ImagePngDecoder::default()))
    }
}
