//! End-to-end walkthrough on the scripted page backend.
//!
//! Simulates what the content runtime does on a live chat page: resolve the
//! platform, locate the composer, watch for the `@@` trigger, and splice a
//! picked prompt in with placeholder targeting.
//!
//! Run with: `cargo run --example scripted_walkthrough`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use promptdock::{
    probe_page, ElementSpec, KeyChord, PickerPort, PromptId, Rect, Runtime, RuntimeConfig,
    ScriptedPage, SessionPhase, SessionView,
};
use tokio::sync::watch;

struct AnnouncingPicker;

#[async_trait]
impl PickerPort for AnnouncingPicker {
    async fn show(&self, anchor: Rect) {
        println!(
            "picker shown at x={:.0} y={:.0} (width {:.0})",
            anchor.x, anchor.y, anchor.width
        );
    }

    async fn hide(&self) {
        println!("picker hidden");
    }
}

async fn wait_phase(view: &mut watch::Receiver<SessionView>, phase: SessionPhase) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if view.borrow().phase == phase {
                return;
            }
            view.changed().await.expect("session alive");
        }
    })
    .await
    .expect("phase reached");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptdock=debug".into()),
        )
        .init();

    let page = Arc::new(ScriptedPage::at_host("chat.openai.com"));
    let composer = page.add_element(
        ElementSpec::textarea()
            .matching("#prompt-textarea")
            .at(Rect::new(120.0, 520.0, 640.0, 96.0)),
    );

    let runtime = Runtime::builder(RuntimeConfig::default())
        .with_picker(Arc::new(AnnouncingPicker))
        .attach(page.clone());
    let mut view = runtime.handle().view();

    wait_phase(&mut view, SessionPhase::Attached).await;
    let report = probe_page(&*page, runtime.resolver()).await;
    println!("probe: {}", serde_json::to_string_pretty(&report)?);

    println!("user types: 'please @@'");
    page.type_text(composer, "please @@");
    wait_phase(&mut view, SessionPhase::Armed).await;

    println!("user picks a prompt with two placeholders");
    runtime.handle().commit_selection(
        "Summarize [topic] in [n] words",
        Some(PromptId("demo-prompt".into())),
    );
    wait_phase(&mut view, SessionPhase::Attached).await;
    println!("composer now reads: {:?}", page.text_of(composer));
    println!("selection covers: {:?}", page.selection_of(composer));

    println!("user presses Tab to jump to the next placeholder");
    page.press_key(composer, KeyChord::plain("Tab"));
    tokio::time::sleep(Duration::from_millis(20)).await;
    println!("selection covers: {:?}", page.selection_of(composer));

    runtime.shutdown();
    Ok(())
}
