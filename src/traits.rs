//! Narrow trait contracts for the external collaborators each lane drives.
//!
//! The engine never talks to a socket, a filesystem, or a PNG stream
//! directly; it only calls through these traits, so lane logic can be
//! exercised against fakes (see `tests/support`) without real I/O.

/// Result of advancing a non-blocking file read by one substep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterateResult {
    /// More substeps are needed.
    Continue,
    /// The transfer is complete.
    Done,
    /// The transfer failed.
    Error,
}

/// A non-blocking file handle, opened and already mid-read.
///
/// Corresponds to the `nbio` primitive's `iterate` / `get_ptr` pair; `open`
/// and `begin_read` are folded into [`NbioOpener::open`] since this engine
/// only ever reads, never writes, through the file lane.
pub trait NbioFile: Send {
    /// Advance the read by one substep. Called up to
    /// `EngineConfig::nbio_steps_per_tick` times per tick.
    fn iterate(&mut self) -> IterateResult;

    /// The bytes read so far. Only meaningful once `iterate` returns `Done`.
    fn data(&self) -> &[u8];
}

/// Factory for [`NbioFile`] handles, i.e. the `open` + `begin_read` half of
/// the `nbio` contract.
pub trait NbioOpener: Send + Sync {
    /// Open `path` for non-blocking read. `None` means the file could not be
    /// opened (missing, permissions, etc.) — the lane treats this as an
    /// immediate abort, never retrying on its own.
    fn open(&self, path: &str) -> Option<Box<dyn NbioFile>>;
}

/// Progress of an in-flight HTTP body transfer.
#[derive(Debug, Clone, Copy)]
pub struct HttpProgress {
    /// Bytes received so far.
    pub bytes_so_far: u64,
    /// Total expected bytes, if the server reported a length.
    pub total_bytes: Option<u64>,
    /// Whether the transfer has finished (successfully).
    pub done: bool,
}

/// The DNS/TCP/TLS handshake phase of an HTTP transfer.
pub trait HttpConnection: Send {
    /// Advance the handshake by one step. Returns `true` once connected and
    /// ready to promote to a session.
    fn poll(&mut self) -> bool;

    /// Whether the handshake failed and the lane should abort.
    fn failed(&self) -> bool;

    /// Erase to `dyn Any` so a transport's `promote` can downcast back to
    /// its own concrete connection type across the trait-object boundary.
    /// Fakes used only for testing a transport-agnostic lane never need
    /// their concrete type recovered, so a trivial `self` implementation is
    /// always correct.
    fn into_any(self: Box<Self>) -> Box<dyn std::any::Any>;
}

/// The body-transfer phase of an HTTP transfer, following a successful
/// connection.
pub trait HttpSession: Send {
    /// Advance the transfer by one step.
    fn poll(&mut self) -> HttpProgress;

    /// Whether the transfer failed and the lane should abort.
    fn failed(&self) -> bool;

    /// Take ownership of the received body.
    ///
    /// Only called once `poll` has reported `done`; the session is deleted
    /// immediately afterward.
    fn take_data(&mut self) -> Vec<u8>;
}

/// Transport factory driving both phases of an HTTP transfer.
pub trait HttpTransport: Send + Sync {
    /// Begin connecting to `url`. `None` means the connection could not even
    /// be allocated (malformed URL, resolver failure before the handshake
    /// starts).
    fn connect(&self, url: &str) -> Option<Box<dyn HttpConnection>>;

    /// Promote a finished connection into a session that transfers the body.
    /// `None` means session creation failed; the connection is dropped
    /// either way.
    fn promote(&self, connection: Box<dyn HttpConnection>) -> Option<Box<dyn HttpSession>>;
}

/// Result of advancing the PNG chunk walk by one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStep {
    /// More chunks remain to be walked.
    Continue,
    /// All required chunks (IHDR, IDAT, IEND) were seen.
    Done,
    /// The buffer is malformed or missing a required chunk.
    Error,
}

/// Result of advancing the pixel-processing phase by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// More processing steps remain.
    Next,
    /// Processing finished successfully.
    Ok,
    /// Processing failed.
    Error,
    /// Processing failed after partial output was produced.
    ErrorEnd,
}

/// A PNG decoder context, owning its own read cursor and processing state.
pub trait PngDecoder: Send {
    /// Walk one more PNG chunk out of `buffer`, starting from wherever the
    /// decoder's internal cursor left off.
    fn iterate(&mut self, buffer: &[u8]) -> ChunkStep;

    /// Advance pixel processing by one step, once chunk walking is `Done`.
    fn process(&mut self) -> ProcessResult;

    /// Consume the decoder and take the decoded RGBA buffer plus dimensions.
    ///
    /// Only meaningful after `process` has returned [`ProcessResult::Ok`].
    fn into_pixels(self: Box<Self>) -> Option<(Vec<u8>, u32, u32)>;
}

/// Factory for [`PngDecoder`] contexts, i.e. the `start` half of the PNG
/// decoder contract.
pub trait PngDecoderFactory: Send + Sync {
    /// Allocate a fresh decoder context. `false`/`None` return means the
    /// decoder could not be started at all.
    fn new_decoder(&self) -> Option<Box<dyn PngDecoder>>;
}

/// Status of the externally owned input overlay state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStatus {
    /// No overlay loaded; nothing to do.
    None,
    /// Overlay fully loaded and active.
    Alive,
    /// A deferred load has been requested but not started.
    DeferredLoad,
    /// A deferred load is in progress.
    DeferredLoading,
    /// A deferred load finished loading and is resolving references.
    DeferredLoadingResolve,
    /// A deferred load completed successfully.
    DeferredDone,
    /// A deferred load failed.
    DeferredError,
}

/// Drives the host's overlay loader one step per tick.
///
/// The overlay's own logic lives entirely on the host side; the engine only
/// knows how to read its status and tell it to advance.
pub trait OverlayDriver: Send {
    /// Current status of the overlay state machine.
    fn status(&self) -> OverlayStatus;

    /// Advance the overlay by one step, given its current status.
    fn step(&mut self, status: OverlayStatus);
}

/// Drives the host's offline database indexer one step per tick.
pub trait DbIndexDriver: Send {
    /// Whether the indexer is mid-iteration.
    fn is_iterating(&self) -> bool;

    /// Advance the indexer by one step.
    fn step(&mut self);

    /// Release the indexer's resources. Called once iteration finishes.
    fn free(&mut self);
}
