//! Real non-blocking-ish file reader: `std::fs::File` read in fixed-size
//! chunks, one chunk per `iterate` call.
//!
//! "Non-blocking" here means bounded, not async — each `iterate` call reads
//! at most [`CHUNK_BYTES`] and returns immediately, the same contract the
//! teacher's [`crate::config::EngineConfig::nbio_steps_per_tick`]-bounded
//! loop expects. Grounded on the chunked-read pattern in
//! `horizon-lattice::file::reader::File::read_chunk`.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use tracing::warn;

use crate::traits::{IterateResult, NbioFile, NbioOpener};

const CHUNK_BYTES: usize = 64 * 1024;

struct RealNbioFile {
    inner: fs::File,
    path: PathBuf,
    buffer: Vec<u8>,
}

impl NbioFile for RealNbioFile {
    fn iterate(&mut self) -> IterateResult {
        let mut scratch = [0u8; CHUNK_BYTES];
        match self.inner.read(&mut scratch) {
            Ok(0) => IterateResult::Done,
            Ok(n) => {
                self.buffer.extend_from_slice(&scratch[..n]);
                IterateResult::Continue
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "nbio: read failed");
                IterateResult::Error
            }
        }
    }

    fn data(&self) -> &[u8] {
        &self.buffer
    }
}

/// Opens plain filesystem paths. The only [`NbioOpener`] this crate ships;
/// hosts needing virtualized or archive-backed paths supply their own.
pub struct StdFsOpener;

impl NbioOpener for StdFsOpener {
    fn open(&self, path: &str) -> Option<Box<dyn NbioFile>> {
        match fs::File::open(path) {
            Ok(inner) => Some(Box::new(RealNbioFile {
                inner,
                path: PathBuf::from(path),
                buffer: Vec::new(),
            })),
            Err(err) => {
                warn!(path, error = %err, "nbio: open failed");
                None
            }
        }
    }
}
