//! The insertion runner.
//!
//! Commits the substitution through the profile's declared contract, then
//! notifies the host framework with the profile's event recipe, paced so the
//! framework's own event loop observes each event separately. Success means
//! commit+notify ran without an unhandled error; whether the host framework
//! later reverts the text is outside the engine's control and only logged.

use std::time::Duration;

use promptdock_core_types::{ElementKind, InsertionId, NodeId};
use promptdock_page_port::PagePort;
use promptdock_platform_registry::{EventRecipe, InsertHook, InsertionContract, PlatformProfile};
use tracing::{debug, instrument, warn};

use crate::errors::InsertError;
use crate::placeholders;
use crate::splice::{splice_at_trigger, Splice};

#[derive(Clone, Debug)]
pub struct InsertRequest {
    pub id: InsertionId,
    pub node: NodeId,
    pub kind: ElementKind,
    pub content: String,
    /// The trigger string armed by the watcher before the picker opened.
    pub trigger: String,
}

impl InsertRequest {
    pub fn new(
        node: NodeId,
        kind: ElementKind,
        content: impl Into<String>,
        trigger: impl Into<String>,
    ) -> Self {
        Self {
            id: InsertionId::new(),
            node,
            kind,
            content: content.into(),
            trigger: trigger.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct InsertReport {
    pub new_text: String,
    /// Absolute byte ranges of each placeholder's inner text, document order.
    pub placeholder_ranges: Vec<(usize, usize)>,
    /// Final caret position when no placeholder captured the selection.
    pub caret: usize,
    /// Host-handler errors suppressed during event dispatch.
    pub suppressed: Vec<String>,
}

/// Platform-aware insertion (spec'd steps: splice, commit, notify, cursor,
/// hooks). On `Err` the caller falls back to [`insert_basic`].
#[instrument(skip_all, fields(insertion = %request.id.0, node = %request.node))]
pub async fn insert(
    page: &dyn PagePort,
    request: &InsertRequest,
    profile: &PlatformProfile,
) -> Result<InsertReport, InsertError> {
    let current = page
        .read_text(request.node, request.kind)
        .await
        .map_err(|_| InsertError::Detached)?;

    let splice = splice_at_trigger(
        &current,
        &request.trigger,
        &request.content,
        profile.tolerate_missing_trigger,
    )
    .ok_or(InsertError::TriggerMissing)?;

    if profile.tolerate_missing_trigger && !current.contains(&request.trigger) {
        debug!("trigger already stripped by the host framework, appending");
    }

    run_hook(
        profile.hooks.before_insert.as_deref(),
        "before_insert",
        request.node,
        &request.content,
    );

    commit(page, request, profile.insertion_contract, &splice.new_text).await?;

    let mut report = InsertReport {
        new_text: splice.new_text.clone(),
        ..InsertReport::default()
    };
    notify(page, request, profile, &mut report).await;

    run_hook(
        profile.hooks.after_insert.as_deref(),
        "after_insert",
        request.node,
        &request.content,
    );

    place_cursor(page, request, &splice, &mut report).await;
    verify_advisory(page, request, &splice.new_text).await;

    Ok(report)
}

/// Simplified fallback: plain write plus basic input/change dispatch, no
/// composition bracket, no cursor placement. The splice is always tolerant
/// here; this path runs when the platform-aware one already failed.
#[instrument(skip_all, fields(node = %request.node))]
pub async fn insert_basic(
    page: &dyn PagePort,
    request: &InsertRequest,
) -> Result<InsertReport, InsertError> {
    let current = page
        .read_text(request.node, request.kind)
        .await
        .map_err(|_| InsertError::Detached)?;
    let splice = splice_at_trigger(&current, &request.trigger, &request.content, true)
        .ok_or(InsertError::TriggerMissing)?;

    let write = match request.kind {
        ElementKind::EditableContainer => {
            page.write_text_content(request.node, &splice.new_text).await
        }
        _ => page.write_value(request.node, &splice.new_text).await,
    };
    write.map_err(|err| InsertError::Write(err.to_string()))?;

    let mut report = InsertReport {
        new_text: splice.new_text.clone(),
        caret: splice.insert_end,
        ..InsertReport::default()
    };
    for event in EventRecipe::basic().events_for(&request.content) {
        match page.dispatch(request.node, event).await {
            Ok(outcome) => {
                if let Some(suppressed) = outcome.suppressed_error {
                    warn!(error = %suppressed, "host handler raised during fallback dispatch");
                    report.suppressed.push(suppressed);
                }
            }
            Err(err) => return Err(InsertError::Write(err.to_string())),
        }
    }
    Ok(report)
}

async fn commit(
    page: &dyn PagePort,
    request: &InsertRequest,
    contract: InsertionContract,
    new_text: &str,
) -> Result<(), InsertError> {
    let write = match (contract, request.kind) {
        (InsertionContract::RichText, _) => return Err(InsertError::RichTextUnsupported),
        (_, ElementKind::EditableContainer) => {
            page.write_text_content(request.node, new_text).await
        }
        (InsertionContract::WritableValue, _) => {
            // Native setter: frameworks that shadow the property setter must
            // not be able to silently drop the write.
            page.write_value_native(request.node, new_text).await
        }
        (InsertionContract::TextContent, _) => page.write_value(request.node, new_text).await,
    };
    write.map_err(|err| InsertError::Write(err.to_string()))
}

/// Dispatch the profile's event recipe in its declared order, with the
/// recipe's stagger between steps.
async fn notify(
    page: &dyn PagePort,
    request: &InsertRequest,
    profile: &PlatformProfile,
    report: &mut InsertReport,
) {
    let events = profile.recipe.events_for(&request.content);
    let stagger = profile.recipe.stagger;
    for (index, event) in events.into_iter().enumerate() {
        if index > 0 && stagger > Duration::ZERO {
            tokio::time::sleep(stagger).await;
        }
        match page.dispatch(request.node, event).await {
            Ok(outcome) => {
                if let Some(suppressed) = outcome.suppressed_error {
                    warn!(error = %suppressed, "host handler raised during dispatch");
                    report.suppressed.push(suppressed);
                }
            }
            Err(err) => warn!(error = %err, "event dispatch failed"),
        }
    }
}

async fn place_cursor(
    page: &dyn PagePort,
    request: &InsertRequest,
    splice: &Splice,
    report: &mut InsertReport,
) {
    if let Err(err) = page.focus_element(request.node).await {
        warn!(error = %err, "focus failed before cursor placement");
    }

    let spans = placeholders::scan(&request.content);
    report.placeholder_ranges = spans
        .iter()
        .map(|span| {
            (
                splice.insert_start + span.inner_start,
                splice.insert_start + span.inner_end,
            )
        })
        .collect();
    report.caret = splice.insert_end;

    let placed = match report.placeholder_ranges.first() {
        // Select the first placeholder's inner text so it can be overtyped.
        Some((start, end)) => page.set_selection(request.node, *start, *end).await,
        None => page.caret_to(request.node, splice.insert_end).await,
    };
    if let Err(err) = placed {
        warn!(error = %err, "cursor placement failed");
    }
}

async fn verify_advisory(page: &dyn PagePort, request: &InsertRequest, expected: &str) {
    // Advisory only: a host framework may still revert the commit during its
    // own reconciliation, which is outside the success contract.
    match page.read_text(request.node, request.kind).await {
        Ok(text) if text == expected => {}
        Ok(text) => debug!(
            expected_len = expected.len(),
            actual_len = text.len(),
            "inserted content did not stick"
        ),
        Err(err) => debug!(error = %err, "post-insert verification unavailable"),
    }
}

fn run_hook(hook: Option<&InsertHook>, name: &str, node: NodeId, content: &str) {
    if let Some(hook) = hook {
        if let Err(err) = hook(node, content) {
            warn!(hook = name, %node, error = %err, "platform hook failed");
        }
    }
}
