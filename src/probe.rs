//! Compatibility probe.
//!
//! Answers "would the engine work on this page right now?" without touching
//! anything: resolved platform, located composer and its usability, the
//! insertion contract that would be used, and the profile's feature set.
//! Purely informational; the management surface renders it as-is.

use promptdock_input_locator::locate;
use promptdock_page_port::PagePort;
use promptdock_platform_registry::{FeatureFlags, InsertionContract, ProfileResolver};
use serde::Serialize;
use tracing::debug;

#[derive(Clone, Debug, Serialize)]
pub struct ProbeReport {
    pub hostname: String,
    pub platform: String,
    pub composer_found: bool,
    pub composer_kind: Option<String>,
    pub composer_area: Option<f64>,
    pub insertion_contract: String,
    pub tolerates_missing_trigger: bool,
    pub features: Vec<String>,
}

pub async fn probe_page(page: &dyn PagePort, resolver: &ProfileResolver) -> ProbeReport {
    let location = page.location();
    let profile = resolver.resolve(&location);
    let composer = locate(page, &profile).await;

    let (composer_kind, composer_area) = match composer {
        Some(tracked) => {
            let area = match page.element_state(tracked.node).await {
                Ok(Some(state)) => Some(state.rect.area()),
                _ => None,
            };
            (Some(tracked.kind.name().to_string()), area)
        }
        None => (None, None),
    };

    let report = ProbeReport {
        hostname: location.hostname,
        platform: profile.name.clone(),
        composer_found: composer.is_some(),
        composer_kind,
        composer_area,
        insertion_contract: contract_name(profile.insertion_contract).to_string(),
        tolerates_missing_trigger: profile.tolerate_missing_trigger,
        features: feature_names(profile.features),
    };
    debug!(?report, "compatibility probe complete");
    report
}

fn contract_name(contract: InsertionContract) -> &'static str {
    match contract {
        InsertionContract::WritableValue => "writable-value-property",
        InsertionContract::TextContent => "text-content",
        InsertionContract::RichText => "rich-text",
    }
}

fn feature_names(features: FeatureFlags) -> Vec<String> {
    let mut names = Vec::new();
    if features.contains(FeatureFlags::TEMPLATE_VARIABLES) {
        names.push("template-variables".to_string());
    }
    if features.contains(FeatureFlags::MULTILINE) {
        names.push("multiline".to_string());
    }
    if features.contains(FeatureFlags::RICH_TEXT) {
        names.push("rich-text".to_string());
    }
    if features.contains(FeatureFlags::FILE_UPLOAD) {
        names.push("file-upload".to_string());
    }
    names
}
