#![allow(dead_code)]

pub mod anchor;
pub mod triggers;
pub mod watcher;

pub use anchor::{picker_anchor, PICKER_WIDTH};
pub use triggers::{TriggerSet, TriggerSpec};
pub use watcher::{DisarmReason, TriggerWatcher, WatcherEvent};
