//! End-to-end flows through the assembled runtime against a scripted page.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use promptdock::{
    DockError, ElementSpec, KeyChord, PickerPort, PromptId, Rect, Runtime, RuntimeConfig,
    ScriptedPage, SessionPhase, SessionView, StatsPort,
};
use tokio::sync::watch;

#[derive(Clone, Debug, PartialEq)]
enum PickerCall {
    Show(Rect),
    Hide,
}

#[derive(Default)]
struct RecordingPicker {
    calls: Mutex<Vec<PickerCall>>,
}

impl RecordingPicker {
    fn calls(&self) -> Vec<PickerCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl PickerPort for RecordingPicker {
    async fn show(&self, anchor: Rect) {
        self.calls.lock().push(PickerCall::Show(anchor));
    }

    async fn hide(&self) {
        self.calls.lock().push(PickerCall::Hide);
    }
}

struct FlakyStats {
    reports: AtomicUsize,
    fail: bool,
}

impl FlakyStats {
    fn reliable() -> Self {
        Self {
            reports: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            reports: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait]
impl StatsPort for FlakyStats {
    async fn prompt_used(&self, _prompt: &PromptId) -> Result<(), DockError> {
        self.reports.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(DockError::new("stats store unavailable"))
        } else {
            Ok(())
        }
    }
}

async fn wait_phase(view: &mut watch::Receiver<SessionView>, phase: SessionPhase) -> SessionView {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            {
                let current = view.borrow();
                if current.phase == phase {
                    return current.clone();
                }
            }
            view.changed().await.expect("session alive");
        }
    })
    .await
    .expect("phase reached within deadline")
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(2)).await;
}

#[tokio::test(start_paused = true)]
async fn full_flow_arms_inserts_and_navigates_placeholders() {
    let page = Arc::new(ScriptedPage::at_host("chat.openai.com"));
    let node = page.add_element(
        ElementSpec::textarea()
            .matching("#prompt-textarea")
            .at(Rect::new(100.0, 400.0, 600.0, 120.0)),
    );

    let picker = Arc::new(RecordingPicker::default());
    let stats = Arc::new(FlakyStats::reliable());
    let runtime = Runtime::builder(RuntimeConfig::default())
        .with_picker(picker.clone())
        .with_stats(stats.clone())
        .attach(page.clone());
    let mut view = runtime.handle().view();

    let attached = wait_phase(&mut view, SessionPhase::Attached).await;
    assert_eq!(attached.platform, "ChatGPT");

    page.type_text(node, "write @@");
    let armed = wait_phase(&mut view, SessionPhase::Armed).await;
    assert_eq!(armed.active_trigger.as_deref(), Some("@@"));

    // The picker is anchored to the composer, clamped to the fixed popup
    // width and the y >= 100 floor.
    let calls = picker.calls();
    match calls.first() {
        Some(PickerCall::Show(anchor)) => {
            assert_eq!(anchor.width, 650.0);
            assert_eq!(anchor.x, 100.0);
            assert_eq!(anchor.y, 400.0);
        }
        other => panic!("expected picker show, got {other:?}"),
    }

    let content = "Summarize [topic] in [n] words";
    runtime
        .handle()
        .commit_selection(content, Some(PromptId("prompt-7".into())));
    wait_phase(&mut view, SessionPhase::Attached).await;

    assert_eq!(page.text_of(node), "write Summarize [topic] in [n] words");
    assert_eq!(stats.reports.load(Ordering::SeqCst), 1);
    assert!(picker.calls().contains(&PickerCall::Hide));

    // First placeholder's inner text holds the selection.
    let topic = (
        "write Summarize [".len(),
        "write Summarize [".len() + "topic".len(),
    );
    let n = (
        "write Summarize [topic] in [".len(),
        "write Summarize [topic] in [".len() + 1,
    );
    assert_eq!(page.selection_of(node), Some(topic));

    // Tab cycles forward, Shift+Tab back.
    page.press_key(node, KeyChord::plain("Tab"));
    settle().await;
    assert_eq!(page.selection_of(node), Some(n));
    page.press_key(node, KeyChord::shifted("Tab"));
    settle().await;
    assert_eq!(page.selection_of(node), Some(topic));

    // After the 30s expiry the transient handler is gone.
    tokio::time::sleep(Duration::from_secs(31)).await;
    page.press_key(node, KeyChord::plain("Tab"));
    settle().await;
    assert_eq!(page.selection_of(node), Some(topic));

    runtime.shutdown();
}

#[tokio::test(start_paused = true)]
async fn tolerant_platform_inserts_despite_stripped_trigger() {
    let page = Arc::new(ScriptedPage::at_host("www.doubao.com"));
    let node = page.add_element(ElementSpec::textarea().framework_guarded());

    let stats = Arc::new(FlakyStats::failing());
    let runtime = Runtime::builder(RuntimeConfig::default())
        .with_stats(stats.clone())
        .attach(page.clone());
    let mut view = runtime.handle().view();

    wait_phase(&mut view, SessionPhase::Attached).await;
    page.type_text(node, "draft @@");
    wait_phase(&mut view, SessionPhase::Armed).await;

    // The host framework rewrites its composer between renders and drops the
    // typed trigger without firing any event.
    page.set_text_silently(node, "draft ");

    runtime
        .handle()
        .commit_selection("APPENDED", Some(PromptId("prompt-9".into())));
    wait_phase(&mut view, SessionPhase::Attached).await;

    // Insertion appended instead of failing, and the failing statistics
    // report did not undo it.
    assert_eq!(page.text_of(node), "draft APPENDED");
    assert_eq!(stats.reports.load(Ordering::SeqCst), 1);

    runtime.shutdown();
}

#[tokio::test(start_paused = true)]
async fn strict_platform_aborts_when_trigger_vanishes() {
    let page = Arc::new(ScriptedPage::at_host("unknown.example"));
    let node = page.add_element(ElementSpec::textarea());

    let runtime = Runtime::builder(RuntimeConfig::default()).attach(page.clone());
    let mut view = runtime.handle().view();

    wait_phase(&mut view, SessionPhase::Attached).await;
    page.type_text(node, "draft @@");
    wait_phase(&mut view, SessionPhase::Armed).await;

    page.set_text_silently(node, "draft ");
    runtime.handle().commit_selection("LOST", None);
    wait_phase(&mut view, SessionPhase::Attached).await;

    // No tolerant flag: the attempt fails and the text is untouched.
    assert_eq!(page.text_of(node), "draft ");

    // The session still works for the next attempt.
    page.type_text(node, "@@");
    wait_phase(&mut view, SessionPhase::Armed).await;
    runtime.handle().commit_selection("OK", None);
    wait_phase(&mut view, SessionPhase::Attached).await;
    assert_eq!(page.text_of(node), "draft OK");

    runtime.shutdown();
}
