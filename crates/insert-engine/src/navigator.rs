//! Transient placeholder navigation.
//!
//! After an insertion with two or more placeholders, a short-lived key
//! handler cycles the selection across them: Tab forward, Shift+Tab
//! backward, wrapping at either end. It self-removes after a fixed expiry or
//! on Escape, so it can never permanently mask the main trigger watcher's
//! keyboard handling.

use std::sync::Arc;
use std::time::Duration;

use promptdock_core_types::NodeId;
use promptdock_page_port::{PageEvent, PagePort};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug)]
pub struct NavigatorConfig {
    pub expiry: Duration,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            expiry: DEFAULT_EXPIRY,
        }
    }
}

pub struct PlaceholderNavigator {
    cancel: CancellationToken,
}

impl PlaceholderNavigator {
    /// Start cycling over `ranges` (absolute inner-text byte ranges in
    /// document order). The first range is assumed already selected by the
    /// insertion engine.
    pub fn spawn(
        page: Arc<dyn PagePort>,
        node: NodeId,
        ranges: Vec<(usize, usize)>,
        config: NavigatorConfig,
    ) -> Self {
        let cancel = CancellationToken::new();
        let events = page.events();
        tokio::spawn(run(page, node, ranges, config, events, cancel.clone()));
        Self { cancel }
    }

    /// Idempotent early dismissal.
    pub fn dismiss(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PlaceholderNavigator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    page: Arc<dyn PagePort>,
    node: NodeId,
    ranges: Vec<(usize, usize)>,
    config: NavigatorConfig,
    mut events: broadcast::Receiver<PageEvent>,
    cancel: CancellationToken,
) {
    if ranges.len() < 2 {
        return;
    }
    let mut index = 0usize;
    let expire = tokio::time::sleep(config.expiry);
    tokio::pin!(expire);

    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = &mut expire => {
                debug!(%node, "placeholder navigator expired");
                break;
            }
            event = events.recv() => event,
        };
        match event {
            Ok(PageEvent::KeyDown { node: target, chord }) if target == node => {
                if chord.is_tab() {
                    index = (index + 1) % ranges.len();
                } else if chord.is_shift_tab() {
                    index = (index + ranges.len() - 1) % ranges.len();
                } else if chord.is_escape() {
                    debug!(%node, "placeholder navigator dismissed by escape");
                    break;
                } else {
                    continue;
                }
                let (start, end) = ranges[index];
                if let Err(err) = page.set_selection(node, start, end).await {
                    // Element likely left the document; nothing left to cycle.
                    warn!(%node, error = %err, "placeholder selection failed");
                    break;
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptdock_core_types::KeyChord;
    use promptdock_page_port::{ElementSpec, ScriptedPage};

    async fn settle() {
        // Let the navigator task observe the queued key events.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn tab_cycles_forward_and_shift_tab_back() {
        let text = "Summarize [topic] in [n] words";
        let page = Arc::new(ScriptedPage::at_host("example.com"));
        let node = page.add_element(ElementSpec::textarea().with_text(text));
        let first = (11, 16); // topic
        let second = (22, 23); // n
        page.set_selection(node, first.0, first.1).await.unwrap();

        let _nav = PlaceholderNavigator::spawn(
            page.clone(),
            node,
            vec![first, second],
            NavigatorConfig::default(),
        );

        page.press_key(node, KeyChord::plain("Tab"));
        settle().await;
        assert_eq!(page.selection_of(node), Some(second));

        page.press_key(node, KeyChord::shifted("Tab"));
        settle().await;
        assert_eq!(page.selection_of(node), Some(first));

        // Wrap around backwards.
        page.press_key(node, KeyChord::shifted("Tab"));
        settle().await;
        assert_eq!(page.selection_of(node), Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_navigator_ignores_tab() {
        let page = Arc::new(ScriptedPage::at_host("example.com"));
        let node = page.add_element(ElementSpec::textarea().with_text("[a] [b]"));
        let first = (1, 2);
        let second = (5, 6);
        page.set_selection(node, first.0, first.1).await.unwrap();

        let _nav = PlaceholderNavigator::spawn(
            page.clone(),
            node,
            vec![first, second],
            NavigatorConfig::default(),
        );

        tokio::time::sleep(DEFAULT_EXPIRY + Duration::from_secs(1)).await;
        page.press_key(node, KeyChord::plain("Tab"));
        settle().await;
        assert_eq!(page.selection_of(node), Some(first));
    }

    #[tokio::test(start_paused = true)]
    async fn escape_dismisses_early() {
        let page = Arc::new(ScriptedPage::at_host("example.com"));
        let node = page.add_element(ElementSpec::textarea().with_text("[a] [b]"));
        let first = (1, 2);
        let second = (5, 6);
        page.set_selection(node, first.0, first.1).await.unwrap();

        let _nav = PlaceholderNavigator::spawn(
            page.clone(),
            node,
            vec![first, second],
            NavigatorConfig::default(),
        );

        page.press_key(node, KeyChord::plain("Escape"));
        settle().await;
        page.press_key(node, KeyChord::plain("Tab"));
        settle().await;
        assert_eq!(page.selection_of(node), Some(first));
    }

    #[tokio::test(start_paused = true)]
    async fn single_placeholder_needs_no_navigator() {
        let page = Arc::new(ScriptedPage::at_host("example.com"));
        let node = page.add_element(ElementSpec::textarea().with_text("[a]"));
        page.set_selection(node, 1, 2).await.unwrap();

        let _nav = PlaceholderNavigator::spawn(
            page.clone(),
            node,
            vec![(1, 2)],
            NavigatorConfig::default(),
        );
        page.press_key(node, KeyChord::plain("Tab"));
        settle().await;
        assert_eq!(page.selection_of(node), Some((1, 2)));
    }
}
