// Session - Live-session snapshots and the clip rename watch loop

pub mod source;
pub mod types;
pub mod watch;

pub use source::{JsonFileSession, SessionError, SessionSource};
pub use types::{ClipKey, ClipSnapshot, SessionSnapshot, TrackSnapshot};
pub use watch::{poll_once, CycleReport, ObservationMap, RenameHandler, WatchLoop};
