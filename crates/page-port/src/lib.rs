#![allow(dead_code)]

pub mod events;
pub mod ports;

#[cfg(feature = "stub")]
pub mod scripted;

pub use events::PageEvent;
pub use ports::{DispatchOutcome, ElementState, PagePort};

#[cfg(feature = "stub")]
pub use scripted::{ElementSpec, ScriptedPage};
