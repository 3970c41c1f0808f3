//! Platform profile model.
//!
//! A profile is the static description of how one target site's composer
//! works: how to recognize the site, where the input element lives, which
//! property must be mutated to change its text, and which synthetic events
//! the site's framework expects to observe afterwards. The insertion
//! strategy is declared here rather than sniffed off framework internals at
//! runtime.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;
use promptdock_core_types::{
    DockError, KeyChord, NodeId, SyntheticEvent, SyntheticEventKind,
};

/// Identity matching rule against the page hostname.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HostRule {
    Exact(String),
    /// Matches the hostname itself and any subdomain of it.
    Suffix(String),
    Contains(String),
}

impl HostRule {
    pub fn matches(&self, hostname: &str) -> bool {
        match self {
            HostRule::Exact(host) => hostname == host,
            HostRule::Suffix(suffix) => {
                hostname == suffix || hostname.ends_with(&format!(".{suffix}"))
            }
            HostRule::Contains(needle) => hostname.contains(needle.as_str()),
        }
    }
}

/// Which property/API must be mutated so the displayed text changes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertionContract {
    /// Native `value` property setter; survives frameworks that intercept
    /// plain property assignment.
    WritableValue,
    /// Direct text-content assignment on an editable container.
    TextContent,
    /// Structured rich-text editing. Not implemented; selecting it makes the
    /// platform-aware path fail over to the simplified strategy.
    RichText,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct FeatureFlags: u8 {
        const TEMPLATE_VARIABLES = 0b0001;
        const MULTILINE = 0b0010;
        const RICH_TEXT = 0b0100;
        const FILE_UPLOAD = 0b1000;
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags::empty()
    }
}

/// Ordered synthetic-event plan dispatched after a commit, with a scheduling
/// gap so the host framework's event loop observes each event separately
/// instead of coalescing the batch.
#[derive(Clone, Debug)]
pub struct EventRecipe {
    pub steps: Vec<SyntheticEventKind>,
    pub stagger: Duration,
}

impl EventRecipe {
    /// Plain input + change, dispatched back to back.
    pub fn basic() -> Self {
        Self {
            steps: vec![SyntheticEventKind::Input, SyntheticEventKind::Change],
            stagger: Duration::ZERO,
        }
    }

    /// Composition-bracketed sequence for frameworks that only commit
    /// programmatic text inside composition boundaries. Order is part of the
    /// interop contract and must not be reordered.
    pub fn composition() -> Self {
        Self {
            steps: vec![
                SyntheticEventKind::Focus,
                SyntheticEventKind::CompositionStart,
                SyntheticEventKind::Input,
                SyntheticEventKind::CompositionEnd,
                SyntheticEventKind::Change,
            ],
            stagger: Duration::from_millis(10),
        }
    }

    /// Input/change followed by a blur/focus cycle, paced apart; some
    /// editors refresh internal state only on focus transitions.
    pub fn focus_refresh() -> Self {
        Self {
            steps: vec![
                SyntheticEventKind::Input,
                SyntheticEventKind::Change,
                SyntheticEventKind::Blur,
                SyntheticEventKind::Focus,
            ],
            stagger: Duration::from_millis(10),
        }
    }

    /// Input/change plus a blur/focus pair, all in one tick.
    pub fn change_and_refocus() -> Self {
        Self {
            steps: vec![
                SyntheticEventKind::Input,
                SyntheticEventKind::Change,
                SyntheticEventKind::Blur,
                SyntheticEventKind::Focus,
            ],
            stagger: Duration::ZERO,
        }
    }

    /// Materialize the plan for a concrete inserted text; input events carry
    /// the inserted content as their data payload.
    pub fn events_for(&self, content: &str) -> Vec<SyntheticEvent> {
        self.steps
            .iter()
            .map(|kind| match kind {
                SyntheticEventKind::Input => SyntheticEvent::input_with(content),
                other => SyntheticEvent::plain(*other),
            })
            .collect()
    }
}

/// Hook invoked around insertion; an `Err` is logged and never aborts the
/// remaining steps.
pub type InsertHook = dyn Fn(NodeId, &str) -> Result<(), DockError> + Send + Sync;

/// Platform-specific key interception; `Ok(true)` means the key was handled
/// and normal processing is skipped.
pub type SpecialKeyHook = dyn Fn(&KeyChord, NodeId) -> Result<bool, DockError> + Send + Sync;

#[derive(Clone, Default)]
pub struct PlatformHooks {
    pub before_insert: Option<Arc<InsertHook>>,
    pub after_insert: Option<Arc<InsertHook>>,
    pub handle_special_key: Option<Arc<SpecialKeyHook>>,
}

impl fmt::Debug for PlatformHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformHooks")
            .field("before_insert", &self.before_insert.is_some())
            .field("after_insert", &self.after_insert.is_some())
            .field("handle_special_key", &self.handle_special_key.is_some())
            .finish()
    }
}

/// Immutable description of one target platform, loaded once at startup.
#[derive(Clone, Debug)]
pub struct PlatformProfile {
    pub name: String,
    pub identity: Vec<HostRule>,
    /// Ordered candidate selectors for the composer; first match wins.
    pub input_candidates: Vec<String>,
    pub insertion_contract: InsertionContract,
    pub features: FeatureFlags,
    /// The host framework is known to strip transient DOM state between
    /// renders; a missing trigger at insertion time is recoverable.
    pub tolerate_missing_trigger: bool,
    pub recipe: EventRecipe,
    pub hooks: PlatformHooks,
}

impl PlatformProfile {
    pub fn matches_host(&self, hostname: &str) -> bool {
        self.identity.iter().any(|rule| rule.matches(hostname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_rule_covers_subdomains() {
        let rule = HostRule::Suffix("claude.ai".into());
        assert!(rule.matches("claude.ai"));
        assert!(rule.matches("www.claude.ai"));
        assert!(!rule.matches("notclaude.ai"));
    }

    #[test]
    fn contains_rule_is_substring() {
        let rule = HostRule::Contains("deepseek.com".into());
        assert!(rule.matches("chat.deepseek.com"));
        assert!(!rule.matches("deepseek.org"));
    }

    #[test]
    fn composition_recipe_orders_the_bracket() {
        let events = EventRecipe::composition().events_for("hello");
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntheticEventKind::Focus,
                SyntheticEventKind::CompositionStart,
                SyntheticEventKind::Input,
                SyntheticEventKind::CompositionEnd,
                SyntheticEventKind::Change,
            ]
        );
        let input = &events[2];
        assert_eq!(input.data.as_deref(), Some("hello"));
        assert!(input.bubbles);
    }
}
