#![allow(dead_code)]

pub mod builtin;
pub mod profile;
pub mod resolver;

pub use builtin::{builtin_profiles, generic_profile};
pub use profile::{
    EventRecipe, FeatureFlags, HostRule, InsertHook, InsertionContract, PlatformHooks,
    PlatformProfile, SpecialKeyHook,
};
pub use resolver::ProfileResolver;
