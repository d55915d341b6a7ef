//! Callback sink type aliases shared across lanes.
//!
//! These are the Rust expression of the original's function-pointer "tags":
//! a closed, enum-addressable set of completion kinds (see `command.rs`)
//! that ultimately resolve to one of these closures.

/// Invoked once a wallpaper PNG finishes decoding, with the RGBA pixel
/// buffer and its width/height.
pub type WallpaperSink = dyn Fn(Vec<u8>, u32, u32) + Send + Sync;

/// Invoked once an HTTP body finishes downloading, with the body bytes.
pub type BodySink = dyn Fn(Vec<u8>) + Send + Sync;
