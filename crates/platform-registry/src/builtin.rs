//! Builtin platform registry.
//!
//! Declaration order matters: the resolver walks this table front to back
//! and the first identity match wins.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::profile::{
    EventRecipe, FeatureFlags, HostRule, InsertionContract, PlatformHooks, PlatformProfile,
};

static BUILTIN: Lazy<Vec<Arc<PlatformProfile>>> = Lazy::new(|| {
    vec![
        Arc::new(PlatformProfile {
            name: "ChatGPT".into(),
            identity: vec![HostRule::Suffix("chat.openai.com".into())],
            input_candidates: vec![
                "#prompt-textarea".into(),
                "textarea[id*=\"prompt\"]".into(),
                "textarea[placeholder*=\"Message ChatGPT\"]".into(),
                "textarea[placeholder*=\"Send a message\"]".into(),
                "div[contenteditable=\"true\"][role=\"textbox\"]".into(),
                "div[contenteditable=\"true\"]:not([role]):last-of-type".into(),
            ],
            insertion_contract: InsertionContract::TextContent,
            features: FeatureFlags::TEMPLATE_VARIABLES
                | FeatureFlags::MULTILINE
                | FeatureFlags::FILE_UPLOAD,
            tolerate_missing_trigger: false,
            recipe: EventRecipe::composition(),
            hooks: PlatformHooks::default(),
        }),
        Arc::new(PlatformProfile {
            name: "Claude".into(),
            identity: vec![HostRule::Suffix("claude.ai".into())],
            input_candidates: vec![
                "div[contenteditable=\"true\"][role=\"textbox\"]".into(),
                "div[contenteditable=\"true\"]:not([role])".into(),
                "textarea[placeholder*=\"Talk to Claude\"]".into(),
                "textarea[placeholder*=\"Type a message\"]".into(),
                ".ProseMirror".into(),
                "[data-testid=\"chat-input\"]".into(),
            ],
            insertion_contract: InsertionContract::TextContent,
            features: FeatureFlags::TEMPLATE_VARIABLES
                | FeatureFlags::MULTILINE
                | FeatureFlags::RICH_TEXT
                | FeatureFlags::FILE_UPLOAD,
            tolerate_missing_trigger: false,
            recipe: EventRecipe::focus_refresh(),
            hooks: PlatformHooks::default(),
        }),
        Arc::new(PlatformProfile {
            name: "Gemini".into(),
            identity: vec![HostRule::Suffix("gemini.google.com".into())],
            input_candidates: vec![
                "div[contenteditable=\"true\"][role=\"textbox\"]".into(),
                "textarea[placeholder*=\"Enter a prompt here\"]".into(),
                "textarea[aria-label*=\"Message\"]".into(),
                ".ql-editor".into(),
                "[data-testid=\"input-area\"]".into(),
            ],
            insertion_contract: InsertionContract::TextContent,
            features: FeatureFlags::TEMPLATE_VARIABLES
                | FeatureFlags::MULTILINE
                | FeatureFlags::RICH_TEXT
                | FeatureFlags::FILE_UPLOAD,
            tolerate_missing_trigger: false,
            recipe: EventRecipe::change_and_refocus(),
            hooks: PlatformHooks::default(),
        }),
        Arc::new(PlatformProfile {
            name: "DeepSeek".into(),
            identity: vec![HostRule::Suffix("chat.deepseek.com".into())],
            input_candidates: vec![
                "textarea[placeholder*=\"Send a message\"]".into(),
                "div[contenteditable=\"true\"]".into(),
                "textarea:not([readonly]):not([disabled])".into(),
            ],
            insertion_contract: InsertionContract::WritableValue,
            features: FeatureFlags::TEMPLATE_VARIABLES | FeatureFlags::MULTILINE,
            tolerate_missing_trigger: false,
            recipe: EventRecipe::basic(),
            hooks: PlatformHooks::default(),
        }),
        Arc::new(PlatformProfile {
            name: "Doubao".into(),
            identity: vec![HostRule::Suffix("www.doubao.com".into())],
            input_candidates: vec![
                "textarea[placeholder*=\"Send a message\"]".into(),
                "div[contenteditable=\"true\"]".into(),
                "textarea:not([readonly]):not([disabled])".into(),
            ],
            insertion_contract: InsertionContract::WritableValue,
            features: FeatureFlags::TEMPLATE_VARIABLES | FeatureFlags::MULTILINE,
            // The composer is re-rendered aggressively; the typed trigger may
            // already be gone by the time the user picks a prompt.
            tolerate_missing_trigger: true,
            recipe: EventRecipe::composition(),
            hooks: PlatformHooks::default(),
        }),
    ]
});

static GENERIC: Lazy<Arc<PlatformProfile>> = Lazy::new(|| {
    Arc::new(PlatformProfile {
        name: "Generic".into(),
        identity: Vec::new(),
        input_candidates: vec![
            "textarea:not([readonly]):not([disabled])".into(),
            "div[contenteditable=\"true\"]".into(),
            "input[type=\"text\"]:not([readonly]):not([disabled])".into(),
        ],
        // Least-trusting strategy: assume the framework intercepts plain
        // property assignment.
        insertion_contract: InsertionContract::WritableValue,
        features: FeatureFlags::empty(),
        tolerate_missing_trigger: false,
        recipe: EventRecipe::basic(),
        hooks: PlatformHooks::default(),
    })
});

/// Secondary substring patterns for mirrored/alternate domains, consulted
/// only when no identity rule matched.
pub(crate) const SECONDARY_PATTERNS: &[(&str, &str)] = &[
    ("openai.com", "ChatGPT"),
    ("claude.ai", "Claude"),
    ("gemini.google.com", "Gemini"),
    ("bard.google.com", "Gemini"),
    ("deepseek.com", "DeepSeek"),
    ("doubao.com", "Doubao"),
    ("volcengine.com", "Doubao"),
];

pub fn builtin_profiles() -> Vec<Arc<PlatformProfile>> {
    BUILTIN.clone()
}

pub fn generic_profile() -> Arc<PlatformProfile> {
    GENERIC.clone()
}
