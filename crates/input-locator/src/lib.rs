#![allow(dead_code)]

//! Composer element location.
//!
//! Walks a profile's candidate selectors in priority order, validating each
//! hit, then falls back to a generic scan over every input surface on the
//! page ranked by visible on-screen area. Purely a query: attaches nothing,
//! and "nothing found" is the recoverable retry-on-next-mutation outcome.

use promptdock_core_types::{ElementKind, NodeId};
use promptdock_page_port::{ElementState, PagePort};
use promptdock_platform_registry::PlatformProfile;
use tracing::{debug, warn};

/// The located composer: node handle plus its kind, classified once here and
/// carried along so downstream components never re-derive it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TrackedElement {
    pub node: NodeId,
    pub kind: ElementKind,
}

/// Whether an element can currently serve as the composer.
pub fn is_usable(state: &ElementState) -> bool {
    if state.rect.is_empty() || state.hidden {
        return false;
    }
    match state.kind {
        ElementKind::PlainTextArea | ElementKind::SingleLineInput => {
            !state.readonly && !state.disabled
        }
        ElementKind::EditableContainer => state.editable,
    }
}

/// Find a usable input element for `profile`, or `None` if the page has no
/// usable candidate anywhere right now.
pub async fn locate(page: &dyn PagePort, profile: &PlatformProfile) -> Option<TrackedElement> {
    for selector in &profile.input_candidates {
        match page.query_selector(selector).await {
            Ok(Some(node)) => match usable_state(page, node).await {
                Some(state) => {
                    debug!(%node, selector, kind = %state.kind, "composer located via profile selector");
                    return Some(TrackedElement {
                        node,
                        kind: state.kind,
                    });
                }
                None => debug!(%node, selector, "candidate matched but unusable"),
            },
            Ok(None) => {}
            Err(err) => {
                warn!(selector, error = %err, "selector query failed");
            }
        }
    }
    locate_generic(page).await
}

/// Generic scan: every input surface of any kind, filtered by usability,
/// largest on-screen area first. Empirically the largest visible editable
/// surface is the primary chat composer. Ties keep collection order, which
/// is document order within each kind.
async fn locate_generic(page: &dyn PagePort) -> Option<TrackedElement> {
    let mut best: Option<(TrackedElement, f64)> = None;
    for kind in ElementKind::scan_order() {
        let nodes = match page.scan_kind(kind).await {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(%kind, error = %err, "generic scan failed");
                continue;
            }
        };
        for node in nodes {
            if let Some(state) = usable_state(page, node).await {
                let area = state.rect.area();
                let better = match &best {
                    Some((_, best_area)) => area > *best_area,
                    None => true,
                };
                if better {
                    best = Some((
                        TrackedElement {
                            node,
                            kind: state.kind,
                        },
                        area,
                    ));
                }
            }
        }
    }
    match &best {
        Some((tracked, area)) => {
            debug!(node = %tracked.node, kind = %tracked.kind, area, "composer located via generic scan");
        }
        None => debug!("no usable composer anywhere on the page"),
    }
    best.map(|(tracked, _)| tracked)
}

async fn usable_state(page: &dyn PagePort, node: NodeId) -> Option<ElementState> {
    match page.element_state(node).await {
        Ok(Some(state)) if is_usable(&state) => Some(state),
        Ok(_) => None,
        Err(err) => {
            warn!(%node, error = %err, "element state query failed");
            None
        }
    }
}
