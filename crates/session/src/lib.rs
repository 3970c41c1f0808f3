#![allow(dead_code)]

pub mod controller;
pub mod ports;
pub mod state;
pub mod suppress;

pub use controller::{SessionConfig, SessionController, SessionHandle};
pub use ports::{NullPicker, NullStats, PickerPort, StatsPort};
pub use state::{ActiveSession, SessionCommand, SessionPhase, SessionView};
pub use suppress::ErrorLedger;
