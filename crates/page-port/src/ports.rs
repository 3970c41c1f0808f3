use async_trait::async_trait;
use promptdock_core_types::{
    DockError, ElementKind, NodeId, PageLocation, Rect, SyntheticEvent, Viewport,
};
use tokio::sync::broadcast;

use crate::events::PageEvent;

/// Snapshot of an element's usability-relevant state at query time.
#[derive(Clone, Debug)]
pub struct ElementState {
    pub kind: ElementKind,
    pub rect: Rect,
    /// Computed-style hidden (`display: none` / `visibility: hidden`).
    pub hidden: bool,
    pub readonly: bool,
    pub disabled: bool,
    /// Editable capability flag; only meaningful for editable containers.
    pub editable: bool,
}

/// Result of dispatching one synthetic event into the host page.
///
/// A host handler that raises is isolated inside the port: the error text
/// comes back here for accounting, it never unwinds into the engine.
#[derive(Clone, Debug, Default)]
pub struct DispatchOutcome {
    pub delivered: bool,
    pub suppressed_error: Option<String>,
}

/// The engine's only view of the host page.
///
/// Implementations adapt whatever actually backs the page (a devtools
/// session, an extension bridge, the scripted stub). All node-addressed
/// calls treat a detached node as an error or `None`, never a panic.
#[async_trait]
pub trait PagePort: Send + Sync {
    fn location(&self) -> PageLocation;

    fn viewport(&self) -> Viewport;

    /// Subscribe to the page event stream. Each call yields an independent
    /// receiver positioned at the current tail.
    fn events(&self) -> broadcast::Receiver<PageEvent>;

    /// First element matching `selector`, in document order.
    async fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, DockError>;

    /// Every attached element of the given kind, in document order.
    async fn scan_kind(&self, kind: ElementKind) -> Result<Vec<NodeId>, DockError>;

    /// `None` when the node is no longer attached to the document.
    async fn element_state(&self, node: NodeId) -> Result<Option<ElementState>, DockError>;

    async fn is_attached(&self, node: NodeId) -> bool;

    /// Current text, read by element kind (value property vs text content).
    async fn read_text(&self, node: NodeId, kind: ElementKind) -> Result<String, DockError>;

    /// Plain `value` assignment. A framework that intercepts the property may
    /// silently revert this write; callers that must not be reverted use
    /// [`PagePort::write_value_native`].
    async fn write_value(&self, node: NodeId, text: &str) -> Result<(), DockError>;

    /// Assignment through the element type's native property setter, bypassing
    /// any subclass-shadowed setter the host framework installed.
    async fn write_value_native(&self, node: NodeId, text: &str) -> Result<(), DockError>;

    /// Direct text-content assignment for editable containers.
    async fn write_text_content(&self, node: NodeId, text: &str) -> Result<(), DockError>;

    async fn dispatch(
        &self,
        node: NodeId,
        event: SyntheticEvent,
    ) -> Result<DispatchOutcome, DockError>;

    async fn focus_element(&self, node: NodeId) -> Result<(), DockError>;

    async fn set_selection(&self, node: NodeId, start: usize, end: usize)
        -> Result<(), DockError>;

    /// Collapse the selection to a caret at `position`.
    async fn caret_to(&self, node: NodeId, position: usize) -> Result<(), DockError> {
        self.set_selection(node, position, position).await
    }

    async fn selection(&self, node: NodeId) -> Result<Option<(usize, usize)>, DockError>;
}
