//! Scripted in-memory page.
//!
//! Test double for [`PagePort`]: a small document model whose elements
//! declare which selectors they match, how they are rendered, and how an
//! embedded framework reacts to writes and synthetic events. Mutators emit
//! the same [`PageEvent`]s a live page would.

use std::collections::HashMap;

use parking_lot::Mutex;
use promptdock_core_types::{
    DockError, ElementKind, KeyChord, NodeId, PageLocation, Rect, SyntheticEvent,
    SyntheticEventKind, Viewport,
};
use tokio::sync::broadcast;
use tracing::debug;

use crate::events::PageEvent;
use crate::ports::{DispatchOutcome, ElementState, PagePort};
use async_trait::async_trait;

const EVENT_CAPACITY: usize = 256;

/// Declarative description of one scripted element.
#[derive(Clone, Debug)]
pub struct ElementSpec {
    pub kind: ElementKind,
    /// Selector strings this element answers to, beyond the kind-generic ones.
    pub selectors: Vec<String>,
    pub rect: Rect,
    pub hidden: bool,
    pub readonly: bool,
    pub disabled: bool,
    pub editable: bool,
    /// Simulates a framework that intercepts the `value` property: plain
    /// writes are reverted, only the native setter sticks.
    pub framework_guard: bool,
    /// Synthetic event kinds whose host handler raises when dispatched.
    pub failing_events: Vec<SyntheticEventKind>,
    pub text: String,
}

impl ElementSpec {
    fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            selectors: Vec::new(),
            rect: Rect::new(100.0, 400.0, 600.0, 120.0),
            hidden: false,
            readonly: false,
            disabled: false,
            editable: matches!(kind, ElementKind::EditableContainer),
            framework_guard: false,
            failing_events: Vec::new(),
            text: String::new(),
        }
    }

    pub fn textarea() -> Self {
        Self::new(ElementKind::PlainTextArea)
    }

    pub fn editable_container() -> Self {
        Self::new(ElementKind::EditableContainer)
    }

    pub fn text_input() -> Self {
        let mut spec = Self::new(ElementKind::SingleLineInput);
        spec.rect = Rect::new(100.0, 400.0, 400.0, 32.0);
        spec
    }

    pub fn matching(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn at(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn not_editable(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn framework_guarded(mut self) -> Self {
        self.framework_guard = true;
        self
    }

    pub fn failing_on(mut self, kind: SyntheticEventKind) -> Self {
        self.failing_events.push(kind);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

#[derive(Debug)]
struct ScriptedNode {
    spec: ElementSpec,
    attached: bool,
    selection: Option<(usize, usize)>,
    focused: bool,
}

#[derive(Debug)]
struct DocState {
    location: PageLocation,
    viewport: Viewport,
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, ScriptedNode>,
    next_id: u64,
    dispatch_log: Vec<(NodeId, SyntheticEvent)>,
}

/// In-memory [`PagePort`] implementation driven by the test script.
pub struct ScriptedPage {
    state: Mutex<DocState>,
    events_tx: broadcast::Sender<PageEvent>,
}

impl ScriptedPage {
    pub fn new(location: PageLocation) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(DocState {
                location,
                viewport: Viewport::default(),
                order: Vec::new(),
                nodes: HashMap::new(),
                next_id: 1,
                dispatch_log: Vec::new(),
            }),
            events_tx,
        }
    }

    pub fn at_host(hostname: &str) -> Self {
        Self::new(PageLocation::new(
            hostname,
            format!("https://{hostname}/"),
        ))
    }

    fn emit(&self, event: PageEvent) {
        // No receivers yet is fine; the stream is fire-and-forget.
        let _ = self.events_tx.send(event);
    }

    pub fn add_element(&self, spec: ElementSpec) -> NodeId {
        let node = {
            let mut state = self.state.lock();
            let node = NodeId(state.next_id);
            state.next_id += 1;
            state.order.push(node);
            state.nodes.insert(
                node,
                ScriptedNode {
                    spec,
                    attached: true,
                    selection: None,
                    focused: false,
                },
            );
            node
        };
        self.emit(PageEvent::Structural);
        node
    }

    pub fn remove_element(&self, node: NodeId) {
        {
            let mut state = self.state.lock();
            state.order.retain(|n| *n != node);
            if let Some(entry) = state.nodes.get_mut(&node) {
                entry.attached = false;
            }
        }
        self.emit(PageEvent::Structural);
    }

    /// Append text as if the user typed it, then surface the change event.
    pub fn type_text(&self, node: NodeId, typed: &str) {
        {
            let mut state = self.state.lock();
            if let Some(entry) = state.nodes.get_mut(&node) {
                entry.spec.text.push_str(typed);
            }
        }
        self.emit(PageEvent::TextChanged { node });
    }

    /// Replace the whole text (host-framework re-render), surfacing the event.
    pub fn set_text(&self, node: NodeId, text: &str) {
        {
            let mut state = self.state.lock();
            if let Some(entry) = state.nodes.get_mut(&node) {
                entry.spec.text = text.to_string();
            }
        }
        self.emit(PageEvent::TextChanged { node });
    }

    /// Replace the text without surfacing any event: a framework rewriting
    /// its internal state between renders fires no input events.
    pub fn set_text_silently(&self, node: NodeId, text: &str) {
        let mut state = self.state.lock();
        if let Some(entry) = state.nodes.get_mut(&node) {
            entry.spec.text = text.to_string();
        }
    }

    pub fn press_key(&self, node: NodeId, chord: KeyChord) {
        self.emit(PageEvent::KeyDown { node, chord });
    }

    pub fn pointer_down(&self, node: Option<NodeId>) {
        self.emit(PageEvent::PointerDown { node });
    }

    pub fn navigate(&self, location: PageLocation) {
        {
            let mut state = self.state.lock();
            state.location = location.clone();
        }
        self.emit(PageEvent::Navigated { location });
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.lock().viewport = viewport;
    }

    // Test inspection -----------------------------------------------------

    pub fn text_of(&self, node: NodeId) -> String {
        self.state
            .lock()
            .nodes
            .get(&node)
            .map(|entry| entry.spec.text.clone())
            .unwrap_or_default()
    }

    pub fn selection_of(&self, node: NodeId) -> Option<(usize, usize)> {
        self.state.lock().nodes.get(&node).and_then(|n| n.selection)
    }

    pub fn dispatched(&self, node: NodeId) -> Vec<SyntheticEvent> {
        self.state
            .lock()
            .dispatch_log
            .iter()
            .filter(|(n, _)| *n == node)
            .map(|(_, ev)| ev.clone())
            .collect()
    }

    pub fn clear_dispatch_log(&self) {
        self.state.lock().dispatch_log.clear();
    }

    fn matches(selector: &str, node: &ScriptedNode) -> bool {
        if node.spec.selectors.iter().any(|s| s == selector) {
            return true;
        }
        // Kind-generic selectors, matched structurally rather than through a
        // CSS engine; enough for the candidate lists the registry carries.
        match selector {
            "textarea" => node.spec.kind == ElementKind::PlainTextArea,
            "textarea:not([readonly]):not([disabled])" => {
                node.spec.kind == ElementKind::PlainTextArea
                    && !node.spec.readonly
                    && !node.spec.disabled
            }
            "div[contenteditable=\"true\"]" => {
                node.spec.kind == ElementKind::EditableContainer && node.spec.editable
            }
            "input[type=\"text\"]" => node.spec.kind == ElementKind::SingleLineInput,
            "input[type=\"text\"]:not([readonly]):not([disabled])" => {
                node.spec.kind == ElementKind::SingleLineInput
                    && !node.spec.readonly
                    && !node.spec.disabled
            }
            _ => false,
        }
    }
}

#[async_trait]
impl PagePort for ScriptedPage {
    fn location(&self) -> PageLocation {
        self.state.lock().location.clone()
    }

    fn viewport(&self) -> Viewport {
        self.state.lock().viewport
    }

    fn events(&self) -> broadcast::Receiver<PageEvent> {
        self.events_tx.subscribe()
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DockError> {
        let state = self.state.lock();
        for node in &state.order {
            if let Some(entry) = state.nodes.get(node) {
                if entry.attached && Self::matches(selector, entry) {
                    return Ok(Some(*node));
                }
            }
        }
        Ok(None)
    }

    async fn scan_kind(&self, kind: ElementKind) -> Result<Vec<NodeId>, DockError> {
        let state = self.state.lock();
        Ok(state
            .order
            .iter()
            .filter(|node| {
                state
                    .nodes
                    .get(node)
                    .map(|entry| entry.attached && entry.spec.kind == kind)
                    .unwrap_or(false)
            })
            .copied()
            .collect())
    }

    async fn element_state(&self, node: NodeId) -> Result<Option<ElementState>, DockError> {
        let state = self.state.lock();
        Ok(state.nodes.get(&node).and_then(|entry| {
            if !entry.attached {
                return None;
            }
            Some(ElementState {
                kind: entry.spec.kind,
                rect: entry.spec.rect,
                hidden: entry.spec.hidden,
                readonly: entry.spec.readonly,
                disabled: entry.spec.disabled,
                editable: entry.spec.editable,
            })
        }))
    }

    async fn is_attached(&self, node: NodeId) -> bool {
        self.state
            .lock()
            .nodes
            .get(&node)
            .map(|entry| entry.attached)
            .unwrap_or(false)
    }

    async fn read_text(&self, node: NodeId, _kind: ElementKind) -> Result<String, DockError> {
        let state = self.state.lock();
        state
            .nodes
            .get(&node)
            .filter(|entry| entry.attached)
            .map(|entry| entry.spec.text.clone())
            .ok_or_else(|| DockError::new(format!("{node} is detached")))
    }

    async fn write_value(&self, node: NodeId, text: &str) -> Result<(), DockError> {
        let mut state = self.state.lock();
        let entry = state
            .nodes
            .get_mut(&node)
            .filter(|entry| entry.attached)
            .ok_or_else(|| DockError::new(format!("{node} is detached")))?;
        if !entry.spec.kind.carries_value() {
            return Err(DockError::new("element has no value property"));
        }
        if entry.spec.framework_guard {
            // The embedded framework reconciles the property right back.
            debug!(%node, "framework guard reverted plain value write");
            return Ok(());
        }
        entry.spec.text = text.to_string();
        Ok(())
    }

    async fn write_value_native(&self, node: NodeId, text: &str) -> Result<(), DockError> {
        let mut state = self.state.lock();
        let entry = state
            .nodes
            .get_mut(&node)
            .filter(|entry| entry.attached)
            .ok_or_else(|| DockError::new(format!("{node} is detached")))?;
        if !entry.spec.kind.carries_value() {
            return Err(DockError::new("element has no value property"));
        }
        entry.spec.text = text.to_string();
        Ok(())
    }

    async fn write_text_content(&self, node: NodeId, text: &str) -> Result<(), DockError> {
        let mut state = self.state.lock();
        let entry = state
            .nodes
            .get_mut(&node)
            .filter(|entry| entry.attached)
            .ok_or_else(|| DockError::new(format!("{node} is detached")))?;
        if entry.spec.kind != ElementKind::EditableContainer {
            return Err(DockError::new("text content is not the display text here"));
        }
        entry.spec.text = text.to_string();
        Ok(())
    }

    async fn dispatch(
        &self,
        node: NodeId,
        event: SyntheticEvent,
    ) -> Result<DispatchOutcome, DockError> {
        let (outcome, input_seen) = {
            let mut state = self.state.lock();
            let Some(entry) = state.nodes.get(&node) else {
                return Ok(DispatchOutcome::default());
            };
            if !entry.attached {
                return Ok(DispatchOutcome::default());
            }
            let suppressed_error = if entry.spec.failing_events.contains(&event.kind) {
                Some(format!("host handler raised on {}", event.kind))
            } else {
                None
            };
            let input_seen = event.kind == SyntheticEventKind::Input;
            state.dispatch_log.push((node, event));
            (
                DispatchOutcome {
                    delivered: true,
                    suppressed_error,
                },
                input_seen,
            )
        };
        if input_seen {
            // A synthetic input event reaches the page's input listeners just
            // like a typed one, so it surfaces on the event stream too.
            self.emit(PageEvent::TextChanged { node });
        }
        Ok(outcome)
    }

    async fn focus_element(&self, node: NodeId) -> Result<(), DockError> {
        let mut state = self.state.lock();
        let focused: Vec<NodeId> = state.nodes.keys().copied().collect();
        for other in focused {
            if let Some(entry) = state.nodes.get_mut(&other) {
                entry.focused = other == node;
            }
        }
        Ok(())
    }

    async fn set_selection(
        &self,
        node: NodeId,
        start: usize,
        end: usize,
    ) -> Result<(), DockError> {
        let mut state = self.state.lock();
        let entry = state
            .nodes
            .get_mut(&node)
            .filter(|entry| entry.attached)
            .ok_or_else(|| DockError::new(format!("{node} is detached")))?;
        let len = entry.spec.text.len();
        entry.selection = Some((start.min(len), end.min(len)));
        Ok(())
    }

    async fn selection(&self, node: NodeId) -> Result<Option<(usize, usize)>, DockError> {
        Ok(self.state.lock().nodes.get(&node).and_then(|n| n.selection))
    }
}
