//! The session controller task.
//!
//! Exclusive owner of [`ActiveSession`]. A single event loop consumes page
//! events, watcher transitions, and collaborator commands, so every state
//! mutation happens synchronously inside one callback at a time. Structural
//! mutations drive both detachment detection and relocation; navigation
//! re-resolves the platform profile.

use std::sync::Arc;

use promptdock_core_types::PromptId;
use promptdock_input_locator::locate;
use promptdock_insert_engine::{
    insert, insert_basic, InsertError, InsertRequest, NavigatorConfig, PlaceholderNavigator,
};
use promptdock_page_port::{PageEvent, PagePort};
use promptdock_platform_registry::{PlatformProfile, ProfileResolver};
use promptdock_trigger_watcher::{TriggerSet, TriggerSpec, TriggerWatcher, WatcherEvent};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::ports::{PickerPort, StatsPort};
use crate::state::{ActiveSession, SessionCommand, SessionPhase, SessionView};
use crate::suppress::ErrorLedger;

#[derive(Clone, Copy, Debug, Default)]
pub struct SessionConfig {
    /// Disarm when the pointer goes down outside the composer. Off by
    /// default; kept behind a flag.
    pub dismiss_on_outside_click: bool,
    pub navigator: NavigatorConfig,
}

/// Command/observation handle returned by [`SessionController::spawn`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    view: watch::Receiver<SessionView>,
}

impl SessionHandle {
    pub fn commit_selection(&self, content: impl Into<String>, prompt_id: Option<PromptId>) {
        let _ = self.commands.send(SessionCommand::CommitSelection {
            content: content.into(),
            prompt_id,
        });
    }

    pub fn settings_changed(&self, triggers: Vec<TriggerSpec>) {
        let _ = self
            .commands
            .send(SessionCommand::SettingsChanged { triggers });
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
    }

    pub fn view(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }
}

pub struct SessionController {
    page: Arc<dyn PagePort>,
    resolver: Arc<ProfileResolver>,
    picker: Arc<dyn PickerPort>,
    stats: Arc<dyn StatsPort>,
    config: SessionConfig,
    session: ActiveSession,
    watcher: Option<TriggerWatcher>,
    navigator: Option<PlaceholderNavigator>,
    triggers_tx: watch::Sender<TriggerSet>,
    watcher_tx: mpsc::UnboundedSender<WatcherEvent>,
    errors: ErrorLedger,
    view_tx: watch::Sender<SessionView>,
}

impl SessionController {
    /// Start the controller task for one page instance.
    pub fn spawn(
        page: Arc<dyn PagePort>,
        resolver: Arc<ProfileResolver>,
        picker: Arc<dyn PickerPort>,
        stats: Arc<dyn StatsPort>,
        config: SessionConfig,
        initial_triggers: TriggerSet,
    ) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (watcher_tx, watcher_rx) = mpsc::unbounded_channel();
        let (triggers_tx, _) = watch::channel(initial_triggers);
        let profile = resolver.current();
        let (view_tx, view_rx) = watch::channel(SessionView {
            phase: SessionPhase::Unattached,
            platform: profile.name.clone(),
            active_trigger: None,
        });

        // Subscribe before spawning so no mutation between now and the first
        // poll is missed. The resolver subscription is the one-time observer
        // registration for platform changes.
        let page_events = page.events();
        let profile_changes = resolver.subscribe();
        let controller = Self {
            page,
            resolver,
            picker,
            stats,
            config,
            session: ActiveSession::new(profile),
            watcher: None,
            navigator: None,
            triggers_tx,
            watcher_tx,
            errors: ErrorLedger::new(),
            view_tx,
        };
        tokio::spawn(controller.run(commands_rx, page_events, watcher_rx, profile_changes));

        SessionHandle {
            commands: commands_tx,
            view: view_rx,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut page_events: broadcast::Receiver<PageEvent>,
        mut watcher_rx: mpsc::UnboundedReceiver<WatcherEvent>,
        mut profile_changes: watch::Receiver<Arc<PlatformProfile>>,
    ) {
        let profile = self.resolver.resolve(&self.page.location());
        self.session.profile = profile;
        profile_changes.mark_unchanged();
        self.try_attach().await;
        self.publish();

        loop {
            tokio::select! {
                event = page_events.recv() => match event {
                    Ok(event) => self.on_page_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "page event stream lagged, resyncing");
                        self.resync().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(event) = watcher_rx.recv() => self.on_watcher_event(event).await,
                changed = profile_changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let profile = profile_changes.borrow_and_update().clone();
                    self.on_profile_change(profile).await;
                }
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => {
                        self.detach_target("shutdown").await;
                        self.publish();
                        break;
                    }
                    Some(command) => self.on_command(command).await,
                },
            }
            self.publish();
        }
    }

    /// Somebody re-resolved the platform (navigation, an external probe); if
    /// the profile actually changed, the session starts over on top of it.
    async fn on_profile_change(&mut self, profile: Arc<PlatformProfile>) {
        if Arc::ptr_eq(&profile, &self.session.profile) {
            return;
        }
        info!(platform = %profile.name, "platform profile changed");
        self.detach_target("platform change").await;
        self.session.profile = profile;
        self.try_attach().await;
    }

    async fn on_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Structural => match self.session.target {
                Some(tracked) => {
                    if !self.page.is_attached(tracked.node).await {
                        self.detach_target("composer removed from document").await;
                        // This mutation was observed while unattached, so the
                        // relocation retry applies to it as well.
                        self.try_attach().await;
                    }
                }
                None => self.try_attach().await,
            },
            PageEvent::Navigated { location } => {
                let profile = self.resolver.resolve(&location);
                self.detach_target("navigation").await;
                self.session.profile = profile;
                self.try_attach().await;
            }
            PageEvent::PointerDown { node } => {
                if self.config.dismiss_on_outside_click
                    && self.session.phase() == SessionPhase::Armed
                    && node != self.session.target.map(|t| t.node)
                {
                    debug!("pointer down outside composer, disarming");
                    if self.session.disarm() {
                        if let Some(watcher) = &self.watcher {
                            watcher.reset();
                        }
                        self.picker.hide().await;
                    }
                }
            }
            // Typing and keys are the watcher's business.
            PageEvent::TextChanged { .. } | PageEvent::KeyDown { .. } => {}
        }
    }

    async fn on_watcher_event(&mut self, event: WatcherEvent) {
        match event {
            WatcherEvent::Armed { trigger, anchor } => {
                // A watcher event can race its own detachment; arming without
                // a target would break the session invariant.
                if self.session.target.is_some() {
                    debug!(trigger, "session armed");
                    self.session.active_trigger = Some(trigger);
                    self.picker.show(anchor).await;
                }
            }
            WatcherEvent::Disarmed { reason } => {
                if self.session.disarm() {
                    debug!(?reason, "session disarmed");
                    self.picker.hide().await;
                }
            }
        }
    }

    async fn on_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SettingsChanged { triggers } => {
                let set = TriggerSet::from_specs(triggers);
                info!(enabled = set.len(), "trigger set rebuilt from settings");
                self.triggers_tx.send_replace(set);
            }
            SessionCommand::CommitSelection { content, prompt_id } => {
                self.commit(content, prompt_id).await;
            }
            SessionCommand::Shutdown => {}
        }
    }

    async fn commit(&mut self, content: String, prompt_id: Option<PromptId>) {
        let (Some(tracked), Some(trigger)) =
            (self.session.target, self.session.active_trigger.clone())
        else {
            debug!("selection committed while not armed, ignoring");
            return;
        };
        if !self.page.is_attached(tracked.node).await {
            self.detach_target("composer removed before insertion").await;
            return;
        }

        let request = InsertRequest::new(tracked.node, tracked.kind, content, trigger);
        let report = match insert(&*self.page, &request, &self.session.profile).await {
            Ok(report) => Some(report),
            // The trigger vanished on a platform that does not tolerate it:
            // this attempt is over, the fallback would only mis-splice.
            Err(InsertError::TriggerMissing) => {
                warn!("trigger no longer present in composer text, insertion aborted");
                None
            }
            Err(err) => {
                warn!(error = %err, "platform-aware insertion failed, trying simplified fallback");
                match insert_basic(&*self.page, &request).await {
                    Ok(report) => Some(report),
                    Err(err) => {
                        warn!(error = %err, "insertion failed");
                        None
                    }
                }
            }
        };

        if let Some(report) = report {
            for suppressed in &report.suppressed {
                if self.errors.record(suppressed) {
                    warn!(error = %suppressed, "host handler error suppressed");
                }
            }
            if report.placeholder_ranges.len() > 1 {
                self.navigator = Some(PlaceholderNavigator::spawn(
                    self.page.clone(),
                    tracked.node,
                    report.placeholder_ranges.clone(),
                    self.config.navigator,
                ));
            }
            if let Some(prompt) = prompt_id {
                if let Err(err) = self.stats.prompt_used(&prompt).await {
                    debug!(error = %err, "usage report failed, ignoring");
                }
            }
        }

        // Armed -> Attached whether or not the insertion landed; the picker
        // closes with the selection, and the watcher forgets the consumed
        // trigger so the next suffix match arms again.
        self.session.disarm();
        if let Some(watcher) = &self.watcher {
            watcher.reset();
        }
        self.picker.hide().await;
    }

    async fn try_attach(&mut self) {
        if self.session.target.is_some() {
            return;
        }
        let Some(tracked) = locate(&*self.page, &self.session.profile).await else {
            return;
        };
        let watcher = TriggerWatcher::attach(
            self.page.clone(),
            tracked.node,
            tracked.kind,
            self.session.profile.clone(),
            self.triggers_tx.subscribe(),
            self.watcher_tx.clone(),
        );
        self.watcher = Some(watcher);
        self.session.target = Some(tracked);
        info!(
            node = %tracked.node,
            kind = %tracked.kind,
            platform = %self.session.profile.name,
            "session attached"
        );
    }

    async fn detach_target(&mut self, reason: &str) {
        if let Some(watcher) = self.watcher.take() {
            watcher.detach();
        }
        if let Some(navigator) = self.navigator.take() {
            navigator.dismiss();
        }
        let was_armed = self.session.active_trigger.is_some();
        self.session.detach();
        if was_armed {
            self.picker.hide().await;
        }
        debug!(reason, "session detached");
    }

    /// After a lagged event stream the observed history has holes; verify
    /// attachment and retry location from scratch.
    async fn resync(&mut self) {
        if let Some(tracked) = self.session.target {
            if !self.page.is_attached(tracked.node).await {
                self.detach_target("composer lost during lag").await;
            }
        }
        self.try_attach().await;
    }

    fn publish(&self) {
        self.view_tx.send_replace(SessionView {
            phase: self.session.phase(),
            platform: self.session.profile.name.clone(),
            active_trigger: self.session.active_trigger.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{NullPicker, NullStats};
    use promptdock_core_types::{KeyChord, SyntheticEventKind};
    use promptdock_page_port::{ElementSpec, ScriptedPage};
    use std::time::Duration;

    fn triggers(values: &[&str]) -> TriggerSet {
        TriggerSet::from_specs(values.iter().map(|v| TriggerSpec::enabled(*v)))
    }

    fn start(
        page: &Arc<ScriptedPage>,
        config: SessionConfig,
        trigger_values: &[&str],
    ) -> SessionHandle {
        SessionController::spawn(
            page.clone(),
            Arc::new(ProfileResolver::new()),
            Arc::new(NullPicker),
            Arc::new(NullStats),
            config,
            triggers(trigger_values),
        )
    }

    async fn wait_view<F>(rx: &mut watch::Receiver<SessionView>, pred: F) -> SessionView
    where
        F: Fn(&SessionView) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                {
                    let view = rx.borrow();
                    if pred(&view) {
                        return view.clone();
                    }
                }
                rx.changed().await.expect("controller alive");
            }
        })
        .await
        .expect("view condition within deadline")
    }

    #[tokio::test(start_paused = true)]
    async fn attach_arm_commit_roundtrip() {
        let page = Arc::new(ScriptedPage::at_host("chat.deepseek.com"));
        let node = page.add_element(ElementSpec::textarea());
        let handle = start(&page, SessionConfig::default(), &["@@"]);
        let mut view = handle.view();

        let attached = wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        assert_eq!(attached.platform, "DeepSeek");

        page.type_text(node, "hello @@");
        let armed = wait_view(&mut view, |v| v.phase == SessionPhase::Armed).await;
        assert_eq!(armed.active_trigger.as_deref(), Some("@@"));

        handle.commit_selection("WORLD", Some(PromptId("p-1".into())));
        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        assert_eq!(page.text_of(node), "hello WORLD");
    }

    #[tokio::test(start_paused = true)]
    async fn element_removal_recovers_through_unattached() {
        let page = Arc::new(ScriptedPage::at_host("unknown.example"));
        let node = page.add_element(ElementSpec::textarea());
        let handle = start(&page, SessionConfig::default(), &["@@"]);
        let mut view = handle.view();

        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        page.type_text(node, "draft@@");
        wait_view(&mut view, |v| v.phase == SessionPhase::Armed).await;

        // Removing the armed composer clears trigger and target together.
        page.remove_element(node);
        let unattached = wait_view(&mut view, |v| v.phase == SessionPhase::Unattached).await;
        assert!(unattached.active_trigger.is_none());

        // A later mutation adding a qualifying element re-attaches.
        page.add_element(ElementSpec::textarea());
        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
    }

    #[tokio::test(start_paused = true)]
    async fn escape_returns_to_attached() {
        let page = Arc::new(ScriptedPage::at_host("unknown.example"));
        let node = page.add_element(ElementSpec::textarea());
        let handle = start(&page, SessionConfig::default(), &["@@"]);
        let mut view = handle.view();

        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        page.type_text(node, "x@@");
        wait_view(&mut view, |v| v.phase == SessionPhase::Armed).await;

        page.press_key(node, KeyChord::plain("Escape"));
        let settled = wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        assert!(settled.active_trigger.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn host_errors_do_not_stall_later_keystrokes() {
        let page = Arc::new(ScriptedPage::at_host("unknown.example"));
        let node = page.add_element(
            ElementSpec::textarea().failing_on(SyntheticEventKind::Input),
        );
        let handle = start(&page, SessionConfig::default(), &["@@"]);
        let mut view = handle.view();

        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        page.type_text(node, "a@@");
        wait_view(&mut view, |v| v.phase == SessionPhase::Armed).await;

        // The insertion dispatch hits a raising host handler.
        handle.commit_selection("X", None);
        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        assert_eq!(page.text_of(node), "aX");

        // The next keystrokes still arm normally.
        page.type_text(node, "@@");
        wait_view(&mut view, |v| v.phase == SessionPhase::Armed).await;
    }

    #[tokio::test(start_paused = true)]
    async fn outside_click_dismisses_only_behind_flag() {
        let page = Arc::new(ScriptedPage::at_host("unknown.example"));
        let node = page.add_element(ElementSpec::textarea());
        let config = SessionConfig {
            dismiss_on_outside_click: true,
            ..SessionConfig::default()
        };
        let handle = start(&page, config, &["@@"]);
        let mut view = handle.view();

        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        page.type_text(node, "x@@");
        wait_view(&mut view, |v| v.phase == SessionPhase::Armed).await;

        // A press on the composer itself keeps the armed state.
        page.pointer_down(Some(node));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(view.borrow().phase, SessionPhase::Armed);

        page.pointer_down(None);
        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
    }

    #[tokio::test(start_paused = true)]
    async fn settings_change_swaps_the_trigger_set() {
        let page = Arc::new(ScriptedPage::at_host("unknown.example"));
        let node = page.add_element(ElementSpec::textarea());
        let handle = start(&page, SessionConfig::default(), &["@@"]);
        let mut view = handle.view();

        wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        handle.settings_changed(vec![
            TriggerSpec::disabled("@@"),
            TriggerSpec::enabled("//"),
        ]);
        // Let the settings command land before typing resumes.
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Old trigger no longer arms.
        page.type_text(node, "x@@");
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(view.borrow().phase, SessionPhase::Attached);

        page.type_text(node, "//");
        let armed = wait_view(&mut view, |v| v.phase == SessionPhase::Armed).await;
        assert_eq!(armed.active_trigger.as_deref(), Some("//"));
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_reresolves_the_platform() {
        let page = Arc::new(ScriptedPage::at_host("unknown.example"));
        page.add_element(ElementSpec::textarea());
        let handle = start(&page, SessionConfig::default(), &["@@"]);
        let mut view = handle.view();

        let attached = wait_view(&mut view, |v| v.phase == SessionPhase::Attached).await;
        assert_eq!(attached.platform, "Generic");

        page.navigate(promptdock_core_types::PageLocation::new(
            "claude.ai",
            "https://claude.ai/chat",
        ));
        let reattached = wait_view(&mut view, |v| v.platform == "Claude").await;
        // The old composer is still present and usable for the new profile.
        assert_eq!(reattached.phase, SessionPhase::Attached);
    }
}
