//! Location-based profile resolution with change notification.
//!
//! The resolver owns the subscription interface: interested components
//! register once at startup via [`ProfileResolver::subscribe`] and observe
//! every profile change, including re-resolution after single-page-app
//! route changes. Resolution itself cannot fail; the generic profile is the
//! floor.

use std::sync::Arc;

use promptdock_core_types::PageLocation;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::builtin::{builtin_profiles, generic_profile, SECONDARY_PATTERNS};
use crate::profile::PlatformProfile;

pub struct ProfileResolver {
    profiles: Vec<Arc<PlatformProfile>>,
    generic: Arc<PlatformProfile>,
    secondary: Vec<(String, String)>,
    current_tx: watch::Sender<Arc<PlatformProfile>>,
}

impl ProfileResolver {
    /// Resolver over the builtin registry.
    pub fn new() -> Self {
        Self::with_profiles(builtin_profiles(), generic_profile())
    }

    pub fn with_profiles(
        profiles: Vec<Arc<PlatformProfile>>,
        generic: Arc<PlatformProfile>,
    ) -> Self {
        let (current_tx, _) = watch::channel(generic.clone());
        Self {
            profiles,
            generic,
            secondary: SECONDARY_PATTERNS
                .iter()
                .map(|(pattern, name)| (pattern.to_string(), name.to_string()))
                .collect(),
            current_tx,
        }
    }

    /// Resolve the profile for `location` and notify subscribers.
    ///
    /// First pass: identity rules in declaration order. Second pass: broader
    /// substring patterns for mirrored domains. Fallback: generic.
    pub fn resolve(&self, location: &PageLocation) -> Arc<PlatformProfile> {
        let hostname = location.hostname.as_str();

        let resolved = self
            .profiles
            .iter()
            .find(|profile| profile.matches_host(hostname))
            .cloned()
            .or_else(|| self.resolve_secondary(hostname))
            .unwrap_or_else(|| {
                debug!(hostname, "no platform match, using generic profile");
                self.generic.clone()
            });

        info!(hostname, platform = %resolved.name, "platform resolved");
        // Observers hear about changes only; re-resolving the same profile
        // (same-platform route change, a probe pass) is not a transition.
        self.current_tx.send_if_modified(|current| {
            if Arc::ptr_eq(current, &resolved) {
                false
            } else {
                *current = resolved.clone();
                true
            }
        });
        resolved
    }

    fn resolve_secondary(&self, hostname: &str) -> Option<Arc<PlatformProfile>> {
        self.secondary
            .iter()
            .find(|(pattern, _)| hostname.contains(pattern.as_str()))
            .and_then(|(pattern, name)| {
                let profile = self.profiles.iter().find(|p| p.name == *name).cloned();
                if profile.is_some() {
                    debug!(hostname, pattern, "platform matched via secondary pattern");
                }
                profile
            })
    }

    /// Profile from the most recent resolution (generic before the first).
    pub fn current(&self) -> Arc<PlatformProfile> {
        self.current_tx.borrow().clone()
    }

    /// Register a platform-change observer.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PlatformProfile>> {
        self.current_tx.subscribe()
    }
}

impl Default for ProfileResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(hostname: &str) -> PageLocation {
        PageLocation::new(hostname, format!("https://{hostname}/"))
    }

    #[test]
    fn resolves_known_platform_by_identity() {
        let resolver = ProfileResolver::new();
        let profile = resolver.resolve(&location("chat.openai.com"));
        assert_eq!(profile.name, "ChatGPT");
    }

    #[test]
    fn mirrored_domain_resolves_via_secondary_pattern() {
        let resolver = ProfileResolver::new();
        let profile = resolver.resolve(&location("bard.google.com"));
        assert_eq!(profile.name, "Gemini");

        let profile = resolver.resolve(&location("api.volcengine.com"));
        assert_eq!(profile.name, "Doubao");
    }

    #[test]
    fn unknown_host_falls_back_to_generic() {
        let resolver = ProfileResolver::new();
        let profile = resolver.resolve(&location("example.org"));
        assert_eq!(profile.name, "Generic");
    }

    #[test]
    fn subscribers_observe_profile_changes() {
        let resolver = ProfileResolver::new();
        let mut rx = resolver.subscribe();
        assert_eq!(rx.borrow().name, "Generic");

        resolver.resolve(&location("claude.ai"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().name, "Claude");
    }

    #[test]
    fn re_resolving_the_same_platform_is_not_a_transition() {
        let resolver = ProfileResolver::new();
        resolver.resolve(&location("claude.ai"));
        let mut rx = resolver.subscribe();

        resolver.resolve(&location("claude.ai"));
        assert!(!rx.has_changed().unwrap());
    }
}
