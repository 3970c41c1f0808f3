use promptdock_core_types::{KeyChord, NodeId, PageLocation};

/// Events the host page pushes toward the engine. One broadcast stream per
/// page; subscribers filter by node where relevant.
#[derive(Clone, Debug)]
pub enum PageEvent {
    /// The text of an input surface changed (user typing or otherwise).
    TextChanged { node: NodeId },
    /// A key went down while the node had focus.
    KeyDown { node: NodeId, chord: KeyChord },
    /// Child-list/structural mutation somewhere in the document.
    Structural,
    /// Single-page-app route change or full navigation.
    Navigated { location: PageLocation },
    /// Pointer pressed; `None` when the press landed outside any tracked node.
    PointerDown { node: Option<NodeId> },
}
