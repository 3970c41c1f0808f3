//! Session state owned exclusively by the controller.

use std::fmt;
use std::sync::Arc;

use promptdock_core_types::PromptId;
use promptdock_input_locator::TrackedElement;
use promptdock_platform_registry::PlatformProfile;
use promptdock_trigger_watcher::TriggerSpec;

/// Lifecycle phase of one page's session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SessionPhase {
    /// No usable composer tracked; every structural mutation retries location.
    #[default]
    Unattached,
    /// Composer tracked, watcher listening.
    Attached,
    /// Trigger matched; the picker is expected to be visible.
    Armed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Unattached => write!(f, "UNATTACHED"),
            SessionPhase::Attached => write!(f, "ATTACHED"),
            SessionPhase::Armed => write!(f, "ARMED"),
        }
    }
}

/// Mutable per-page session data.
///
/// Invariant: `active_trigger` is non-`None` only while `target` is
/// non-`None`. Every path that drops the target clears both fields in the
/// same synchronous step, so no later read observes a trigger without its
/// element.
#[derive(Clone, Debug)]
pub struct ActiveSession {
    pub profile: Arc<PlatformProfile>,
    pub target: Option<TrackedElement>,
    pub active_trigger: Option<String>,
}

impl ActiveSession {
    pub fn new(profile: Arc<PlatformProfile>) -> Self {
        Self {
            profile,
            target: None,
            active_trigger: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.target, &self.active_trigger) {
            (None, _) => SessionPhase::Unattached,
            (Some(_), None) => SessionPhase::Attached,
            (Some(_), Some(_)) => SessionPhase::Armed,
        }
    }

    /// Armed -> Attached.
    pub fn disarm(&mut self) -> bool {
        self.active_trigger.take().is_some()
    }

    /// Any phase -> Unattached; trigger and target drop together.
    pub fn detach(&mut self) {
        self.active_trigger = None;
        self.target = None;
    }
}

/// Read-only view published to observers after every transition.
#[derive(Clone, Debug)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub platform: String,
    pub active_trigger: Option<String>,
}

/// Commands from the excluded collaborators (picker UI, settings screen).
#[derive(Clone, Debug)]
pub enum SessionCommand {
    /// The user picked a prompt while the session was armed.
    CommitSelection {
        content: String,
        prompt_id: Option<PromptId>,
    },
    /// Settings-changed notification; the trigger set is re-derived.
    SettingsChanged { triggers: Vec<TriggerSpec> },
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptdock_core_types::{ElementKind, NodeId};
    use promptdock_platform_registry::generic_profile;

    #[test]
    fn phase_follows_the_field_pair() {
        let mut session = ActiveSession::new(generic_profile());
        assert_eq!(session.phase(), SessionPhase::Unattached);

        session.target = Some(TrackedElement {
            node: NodeId(1),
            kind: ElementKind::PlainTextArea,
        });
        assert_eq!(session.phase(), SessionPhase::Attached);

        session.active_trigger = Some("@@".into());
        assert_eq!(session.phase(), SessionPhase::Armed);

        session.detach();
        assert_eq!(session.phase(), SessionPhase::Unattached);
        assert!(session.active_trigger.is_none());
    }
}
