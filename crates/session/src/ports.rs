//! Collaborator ports.
//!
//! The picker UI and the usage-statistics store are excluded collaborators;
//! the session talks to them through these traits and treats every call as
//! best-effort.

use async_trait::async_trait;
use promptdock_core_types::{DockError, PromptId, Rect};

/// The prompt-picker UI: shown anchored to a rectangle while armed, hidden
/// on every disarm path. The selection itself arrives back as a
/// [`crate::SessionCommand::CommitSelection`].
#[async_trait]
pub trait PickerPort: Send + Sync {
    async fn show(&self, anchor: Rect);
    async fn hide(&self);
}

/// Usage reporting after a successful insertion. Failures are logged and
/// never block or undo the insertion.
#[async_trait]
pub trait StatsPort: Send + Sync {
    async fn prompt_used(&self, prompt: &PromptId) -> Result<(), DockError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullPicker;

#[async_trait]
impl PickerPort for NullPicker {
    async fn show(&self, _anchor: Rect) {}
    async fn hide(&self) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullStats;

#[async_trait]
impl StatsPort for NullStats {
    async fn prompt_used(&self, _prompt: &PromptId) -> Result<(), DockError> {
        Ok(())
    }
}
