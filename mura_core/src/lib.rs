//! MÜRA Viewer Core - Live Position Stream Reducer
//!
//! Sits between "a position arrived" and "here is what the map should show":
//! 1. **Validation**: untrusted snapshots and history records become checked
//!    `Position`s, or a status line; never a `(0, 0)` default
//! 2. **Tracking**: marker position plus a bounded, arrival-ordered path
//! 3. **Recentering**: follow or free-roam, chosen per session
//! 4. **Lifecycle**: `Initializing -> Live -> Ended`, with late data ignored

pub mod position;
pub mod path;
pub mod recenter;
pub mod events;
pub mod tracker;
pub mod reducer;

// Re-export key types for convenience
pub use position::{Position, PositionError, RawPosition, RawSnapshot};
pub use path::{Path, DEFAULT_MAX_PATH_LEN};
pub use recenter::{RecenterPolicy, DEFAULT_RECENTER_THRESHOLD_M};
pub use events::{status, EndReason, PositionEvent, RenderCommand, ViewerError};
pub use tracker::{Phase, TrackerState};
pub use reducer::{open_session, reduce_at, PositionStreamReducer, SessionStart, ViewerConfig};
