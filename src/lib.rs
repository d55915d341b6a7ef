//! Cooperative background data runloop.
//!
//! A chunked task engine that multiplexes file reads, HTTP transfers, and
//! progressive PNG decoding across independent lanes, advancing each by a
//! bounded amount of work per tick so no single transfer starves the
//! others. See [`DataRunloop`] for the entry point.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use horizon_lattice_dataloop::{
//!     command::PostKind, http_transport::ReqwestTransport, nbio::StdFsOpener,
//!     png_decoder::ImagePngDecoderFactory, DataRunloopBuilder,
//! };
//!
//! let engine = DataRunloopBuilder::new(
//!     Arc::new(StdFsOpener),
//!     Arc::new(ReqwestTransport::new()),
//!     Arc::new(ImagePngDecoderFactory),
//! )
//! .build();
//!
//! engine.init();
//! engine.post(PostKind::File, "/tmp/example.bin", "", 0, Duration::ZERO, false);
//! while engine.file_lane_busy() {
//!     engine.tick();
//! }
//! engine.deinit();
//! ```

pub mod command;
pub mod config;
pub mod error;
mod file_lane;
mod http_lane;
pub mod http_transport;
mod image_lane;
pub mod nbio;
mod overlay;
pub mod png_decoder;
mod runloop;
pub mod runtime;
pub mod sinks;
pub mod traits;

mod queue;

pub use config::{ConcurrencyMode, EngineConfig};
pub use error::{DataRunloopError, Result};
pub use queue::{split_tag, Command, MessageQueue};
pub use runloop::{DataRunloop, DataRunloopBuilder};
