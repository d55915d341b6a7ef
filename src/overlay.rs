//! Thin per-tick drivers for the externally owned overlay and offline
//! database indexer state machines.
//!
//! All real logic lives in the [`OverlayDriver`] / [`DbIndexDriver`]
//! implementations the host supplies; these functions are just the
//! dispatch-and-skip rules spelled out for the runloop shell to call.

use crate::traits::{DbIndexDriver, OverlayDriver};

/// Step the overlay driver once, if one is configured. A host with no
/// overlay loaded simply supplies no driver. Returns whether a driver was
/// present to step, for the worker thread's idle-sleep decision.
pub(crate) fn step_overlay(overlay: Option<&mut dyn OverlayDriver>) -> bool {
    let Some(overlay) = overlay else { return false };
    let status = overlay.status();
    overlay.step(status);
    true
}

/// Step the DB index driver once: free and clear once iteration finishes,
/// otherwise advance it by one step.
pub(crate) fn step_db_index(db: Option<&mut dyn DbIndexDriver>) -> bool {
    let Some(db) = db else { return false };
    if db.is_iterating() {
        db.step();
    } else {
        db.free();
    }
    true
}
