//! promptdock — prompt-snippet injection into third-party AI chat pages.
//!
//! The engine runs against an uncontrolled host page: it resolves which chat
//! platform the page belongs to, locates the message composer despite
//! unstable DOM structure, watches the user's typing for a configured
//! trigger suffix, and — once the external picker returns a prompt — splices
//! the prompt text in while synthesizing the event sequence the page's own
//! framework needs to accept the change as genuine input.
//!
//! Crate map:
//! - [`promptdock_platform_registry`]: platform profiles and resolution
//! - [`promptdock_input_locator`]: composer location
//! - [`promptdock_trigger_watcher`]: trigger detection
//! - [`promptdock_insert_engine`]: the substitution itself
//! - [`promptdock_session`]: the lifecycle state machine tying it together
//!
//! This crate wires those into a [`Runtime`] over a [`PagePort`]
//! implementation and adds runtime configuration plus a compatibility probe.

#![allow(dead_code)]

pub mod config;
pub mod probe;
pub mod runtime;

pub use config::{ConfigError, RuntimeConfig, TriggerEntry};
pub use probe::{probe_page, ProbeReport};
pub use runtime::{Runtime, RuntimeBuilder};

pub use promptdock_core_types::{
    DockError, ElementKind, KeyChord, NodeId, PageLocation, PromptId, Rect, SyntheticEvent,
    SyntheticEventKind, Viewport,
};
pub use promptdock_input_locator::TrackedElement;
pub use promptdock_insert_engine::{InsertError, InsertReport, InsertRequest};
pub use promptdock_page_port::{DispatchOutcome, ElementState, PageEvent, PagePort};
pub use promptdock_platform_registry::{
    builtin_profiles, generic_profile, EventRecipe, FeatureFlags, HostRule, InsertionContract,
    PlatformHooks, PlatformProfile, ProfileResolver,
};
pub use promptdock_session::{
    NullPicker, NullStats, PickerPort, SessionHandle, SessionPhase, SessionView, StatsPort,
};
pub use promptdock_trigger_watcher::{TriggerSet, TriggerSpec};

#[cfg(feature = "stub")]
pub use promptdock_page_port::{ElementSpec, ScriptedPage};

/// Default trigger shipped with a fresh install.
pub const DEFAULT_TRIGGER: &str = "@@";
