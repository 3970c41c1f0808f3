//! The trigger watcher task.
//!
//! One watcher per tracked composer element. It consumes the page event
//! stream, evaluates the trigger set against the element text on every
//! change, and reports armed/disarmed transitions to its sink. Detachment is
//! cancellation-token based and idempotent: detaching twice, or after the
//! element left the document, is a no-op.

use std::sync::Arc;

use parking_lot::Mutex;
use promptdock_core_types::{ElementKind, NodeId, Rect};
use promptdock_page_port::{PageEvent, PagePort};
use promptdock_platform_registry::PlatformProfile;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::anchor::picker_anchor;
use crate::triggers::TriggerSet;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisarmReason {
    /// The text no longer ends with the armed trigger.
    SuffixLost,
    Escape,
}

#[derive(Clone, Debug)]
pub enum WatcherEvent {
    Armed { trigger: String, anchor: Rect },
    Disarmed { reason: DisarmReason },
}

pub struct TriggerWatcher {
    cancel: CancellationToken,
    armed: Arc<Mutex<Option<String>>>,
}

impl TriggerWatcher {
    /// Attach to `node`. The page event subscription is taken before this
    /// returns, so nothing typed afterwards is missed.
    pub fn attach(
        page: Arc<dyn PagePort>,
        node: NodeId,
        kind: ElementKind,
        profile: Arc<PlatformProfile>,
        triggers: watch::Receiver<TriggerSet>,
        sink: mpsc::UnboundedSender<WatcherEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let armed = Arc::new(Mutex::new(None));
        let events = page.events();
        tokio::spawn(run(
            page,
            node,
            kind,
            profile,
            triggers,
            sink,
            events,
            cancel.clone(),
            armed.clone(),
        ));
        Self { cancel, armed }
    }

    /// Idempotent; safe after the element was removed from the document.
    pub fn detach(&self) {
        self.cancel.cancel();
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Forget the armed trigger without emitting a transition. Called by the
    /// session when it disarms on its own (committed insertion, outside
    /// click), so the watcher re-arms cleanly on the next suffix match.
    pub fn reset(&self) {
        self.armed.lock().take();
    }
}

impl Drop for TriggerWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[allow(clippy::too_many_arguments)]
async fn run(
    page: Arc<dyn PagePort>,
    node: NodeId,
    kind: ElementKind,
    profile: Arc<PlatformProfile>,
    triggers: watch::Receiver<TriggerSet>,
    sink: mpsc::UnboundedSender<WatcherEvent>,
    mut events: broadcast::Receiver<PageEvent>,
    cancel: CancellationToken,
    armed: Arc<Mutex<Option<String>>>,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(PageEvent::TextChanged { node: changed }) if changed == node => {
                on_text_changed(&*page, node, kind, &triggers, &sink, &armed).await;
            }
            Ok(PageEvent::KeyDown { node: target, chord }) if target == node => {
                if let Some(hook) = &profile.hooks.handle_special_key {
                    match hook(&chord, node) {
                        Ok(true) => continue,
                        Ok(false) => {}
                        Err(err) => warn!(%node, error = %err, "special-key hook failed"),
                    }
                }
                if chord.is_escape() && armed.lock().take().is_some() {
                    debug!(%node, "escape pressed, disarming");
                    let _ = sink.send(WatcherEvent::Disarmed {
                        reason: DisarmReason::Escape,
                    });
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Missed events; the next text change re-evaluates from
                // scratch, so nothing is lost permanently.
                warn!(%node, skipped, "page event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn on_text_changed(
    page: &dyn PagePort,
    node: NodeId,
    kind: ElementKind,
    triggers: &watch::Receiver<TriggerSet>,
    sink: &mpsc::UnboundedSender<WatcherEvent>,
    armed: &Arc<Mutex<Option<String>>>,
) {
    let text = match page.read_text(node, kind).await {
        Ok(text) => text,
        // Likely detached mid-event; the lifecycle glue will notice.
        Err(err) => {
            debug!(%node, error = %err, "text read failed, skipping evaluation");
            return;
        }
    };
    let matched = triggers
        .borrow()
        .matched_suffix(&text)
        .map(str::to_string);

    let previous = armed.lock().clone();
    match (previous, matched) {
        (None, Some(trigger)) => {
            if let Some(anchor) = arm_anchor(page, node).await {
                debug!(%node, trigger, "trigger armed");
                *armed.lock() = Some(trigger.clone());
                let _ = sink.send(WatcherEvent::Armed { trigger, anchor });
            }
        }
        (Some(current), Some(trigger)) if current != trigger => {
            // Suffix moved straight from one trigger to another: re-arm.
            if let Some(anchor) = arm_anchor(page, node).await {
                debug!(%node, trigger, "trigger re-armed");
                *armed.lock() = Some(trigger.clone());
                let _ = sink.send(WatcherEvent::Armed { trigger, anchor });
            }
        }
        (Some(_), None) => {
            debug!(%node, "trigger suffix lost, disarming");
            armed.lock().take();
            let _ = sink.send(WatcherEvent::Disarmed {
                reason: DisarmReason::SuffixLost,
            });
        }
        _ => {}
    }
}

async fn arm_anchor(page: &dyn PagePort, node: NodeId) -> Option<Rect> {
    match page.element_state(node).await {
        Ok(Some(state)) => Some(picker_anchor(state.rect, page.viewport())),
        Ok(None) => None,
        Err(err) => {
            warn!(%node, error = %err, "anchor geometry unavailable");
            None
        }
    }
}
