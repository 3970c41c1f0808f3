//! Engine composition.
//!
//! The builder wires the resolver, locator, watcher, insertion engine, and
//! session controller over one [`PagePort`]. Collaborators default to no-op
//! implementations so the engine degrades silently when a host surface
//! (picker UI, statistics store) is absent.

use std::sync::Arc;

use promptdock_page_port::PagePort;
use promptdock_platform_registry::ProfileResolver;
use promptdock_session::{
    NullPicker, NullStats, PickerPort, SessionController, SessionHandle, StatsPort,
};
use tracing::info;

use crate::config::RuntimeConfig;

pub struct RuntimeBuilder {
    config: RuntimeConfig,
    resolver: Option<Arc<ProfileResolver>>,
    picker: Option<Arc<dyn PickerPort>>,
    stats: Option<Arc<dyn StatsPort>>,
}

impl RuntimeBuilder {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            resolver: None,
            picker: None,
            stats: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<ProfileResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_picker(mut self, picker: Arc<dyn PickerPort>) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatsPort>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Start the engine against `page`.
    pub fn attach(self, page: Arc<dyn PagePort>) -> Runtime {
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(ProfileResolver::new()));
        let picker = self.picker.unwrap_or_else(|| Arc::new(NullPicker));
        let stats = self.stats.unwrap_or_else(|| Arc::new(NullStats));

        info!(location = %page.location(), "promptdock runtime attaching");
        let handle = SessionController::spawn(
            page,
            resolver.clone(),
            picker,
            stats,
            self.config.session_config(),
            self.config.trigger_set(),
        );
        Runtime { handle, resolver }
    }
}

/// A running engine instance for one page.
pub struct Runtime {
    handle: SessionHandle,
    resolver: Arc<ProfileResolver>,
}

impl Runtime {
    pub fn builder(config: RuntimeConfig) -> RuntimeBuilder {
        RuntimeBuilder::new(config)
    }

    /// Command/observation handle shared with the collaborators.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// The resolver, for platform-change subscriptions.
    pub fn resolver(&self) -> &Arc<ProfileResolver> {
        &self.resolver
    }

    pub fn shutdown(&self) {
        self.handle.shutdown();
    }
}
