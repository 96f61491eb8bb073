use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{NoteListState, RefreshTicket};
use crate::bus::{topics, Subscription, SurfaceBus};
use crate::clipboard::{copy_text, CopyFeedback, CopyFeedbackState, CopyPath, NativeClipboard};
use crate::commands::StorageClient;
use crate::config::CoreConfig;
use crate::deletion::{DeletionFlow, PendingDeletion};
use crate::error::{ClipboardFailure, StorageFailure};
use crate::models::{Note, NoteId};
use crate::theme::{ThemeController, ThemeListener};
use crate::util::lock;

/// Everything the list surface renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSurfaceState {
    pub list: NoteListState,
    pub copy: CopyFeedback,
    pub deletion: DeletionFlow,
}

#[derive(Clone)]
struct Refresher {
    bus: SurfaceBus,
    client: StorageClient,
    state: Arc<watch::Sender<ListSurfaceState>>,
}

impl Refresher {
    /// Issue a `list` request. The ticket is taken before the request leaves,
    /// so tickets follow issue order.
    fn refresh(&self) -> JoinHandle<()> {
        let mut ticket = RefreshTicket::default();
        self.state
            .send_modify(|state| ticket = state.list.begin_refresh());

        let refresher = self.clone();
        tokio::spawn(async move {
            let result = refresher.client.list().await;
            if refresher.bus.is_torn_down() {
                tracing::debug!("Dropping list response for torn down surface");
                return;
            }
            refresher
                .state
                .send_if_modified(|state| state.list.finish_refresh(ticket, result));
        })
    }
}

/// Main note list surface.
///
/// Keeps a cached list in sync with the backend by refetching on every
/// `notes-changed` broadcast, and drives copy and delete for the host UI.
pub struct ListSurface {
    refresher: Refresher,
    native_clipboard: Arc<dyn NativeClipboard>,
    theme: ThemeController,
    copy_feedback: Duration,
    revert: Mutex<Option<JoinHandle<()>>>,
    _notes_changed: Subscription,
    _theme_listener: ThemeListener,
}

impl ListSurface {
    /// Subscribe to note changes and issue the initial load.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        bus: SurfaceBus,
        client: StorageClient,
        theme: ThemeController,
        native_clipboard: Arc<dyn NativeClipboard>,
        config: &CoreConfig,
    ) -> Self {
        let (state, _) = watch::channel(ListSurfaceState::default());
        let refresher = Refresher {
            bus: bus.clone(),
            client,
            state: Arc::new(state),
        };

        let on_change = refresher.clone();
        let notes_changed = bus.subscribe(topics::NOTES_CHANGED, move |_| {
            on_change.refresh();
        });
        let theme_listener = theme.listen();
        refresher.refresh();
        tracing::debug!("List surface '{}' mounted", bus.label());

        Self {
            refresher,
            native_clipboard,
            theme,
            copy_feedback: config.copy_feedback(),
            revert: Mutex::new(None),
            _notes_changed: notes_changed,
            _theme_listener: theme_listener,
        }
    }

    /// Receiver notified on every state change.
    pub fn state(&self) -> watch::Receiver<ListSurfaceState> {
        self.refresher.state.subscribe()
    }

    pub fn snapshot(&self) -> ListSurfaceState {
        self.refresher.state.borrow().clone()
    }

    /// Notes matching the current search query, in backend order.
    pub fn visible_notes(&self) -> Vec<Note> {
        self.refresher.state.borrow().list.visible()
    }

    pub const fn theme(&self) -> &ThemeController {
        &self.theme
    }

    /// Refetch the list now.
    pub fn refresh(&self) -> JoinHandle<()> {
        self.refresher.refresh()
    }

    /// Wait until no refresh is awaiting a response.
    pub async fn wait_until_settled(&self) {
        let mut receiver = self.state();
        let _ = receiver.wait_for(|state| state.list.is_settled()).await;
    }

    pub fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.refresher
            .state
            .send_if_modified(|state| state.list.set_search_query(query));
    }

    pub fn dismiss_error(&self) {
        self.refresher
            .state
            .send_if_modified(|state| state.list.clear_error());
    }

    /// Copy a cached note's text through both clipboard paths.
    ///
    /// On success the note shows the "copied" indicator for the configured
    /// duration; a later copy replaces it. On failure the error is shown.
    pub async fn copy_note(&self, id: &NoteId) -> Result<CopyPath, ClipboardFailure> {
        let text = self
            .refresher
            .state
            .borrow()
            .list
            .note(id)
            .map(|note| note.text.clone());
        let Some(text) = text else {
            return Err(ClipboardFailure::new("Note not found"));
        };

        let result = copy_text(
            &self.refresher.client,
            self.native_clipboard.as_ref(),
            &text,
        )
        .await;
        if self.refresher.bus.is_torn_down() {
            return result;
        }

        match &result {
            Ok(path) => {
                tracing::info!("Copied note {id} via {path:?} clipboard");
                let expires_at = Instant::now() + self.copy_feedback;
                let mut mark = None;
                self.refresher.state.send_modify(|state| {
                    state.list.clear_error();
                    mark = Some(state.copy.mark(id.clone(), expires_at));
                });
                if let Some(mark) = mark {
                    self.schedule_revert(mark);
                }
            }
            Err(error) => {
                tracing::error!("Failed to copy note {id}: {error}");
                let message = error.message().to_string();
                self.refresher
                    .state
                    .send_modify(|state| state.list.set_error(message));
            }
        }
        result
    }

    /// Note currently showing the "copied" indicator.
    pub fn copied_note(&self) -> Option<NoteId> {
        self.refresher
            .state
            .borrow()
            .copy
            .active()
            .map(|active| active.note_id.clone())
    }

    pub fn is_copied(&self, id: &NoteId) -> bool {
        self.refresher.state.borrow().copy.is_copied(id)
    }

    /// Open the confirmation prompt for a cached note.
    pub fn request_delete(&self, id: &NoteId) -> Option<PendingDeletion> {
        let mut pending = None;
        self.refresher.state.send_if_modified(|state| {
            let Some(note) = state.list.note(id) else {
                return false;
            };
            pending = Some(state.deletion.request(note));
            true
        });
        if pending.is_none() {
            tracing::debug!("Ignoring delete request for unknown note {id}");
        }
        pending
    }

    /// Delete the note awaiting confirmation.
    ///
    /// Returns `None` if no prompt was open. The list itself is refreshed by
    /// the backend's `notes-changed` broadcast.
    pub async fn confirm_delete(&self) -> Option<Result<(), StorageFailure>> {
        let mut target = None;
        self.refresher.state.send_if_modified(|state| {
            target = state.deletion.confirm();
            target.is_some()
        });
        let id = target?;

        let result = self.refresher.client.delete(&id).await;
        match &result {
            Ok(()) => tracing::info!("Deleted note {id}"),
            Err(error) => {
                tracing::error!("Failed to delete note {id}: {error}");
                if !self.refresher.bus.is_torn_down() {
                    let message = error.message().to_string();
                    self.refresher
                        .state
                        .send_modify(|state| state.list.set_error(message));
                }
            }
        }
        Some(result)
    }

    pub fn cancel_delete(&self) -> bool {
        self.refresher
            .state
            .send_if_modified(|state| state.deletion.cancel())
    }

    /// The prompt was closed by clicking outside or pressing escape.
    pub fn dismiss_delete(&self) -> bool {
        self.refresher
            .state
            .send_if_modified(|state| state.deletion.dismiss())
    }

    /// Ask the backend to show the capture surface.
    pub async fn open_capture(&self) -> Result<(), StorageFailure> {
        let result = self.refresher.client.open_capture_surface().await;
        if let Err(error) = &result {
            if !self.refresher.bus.is_torn_down() {
                let message = error.message().to_string();
                self.refresher
                    .state
                    .send_modify(|state| state.list.set_error(message));
            }
        }
        result
    }

    /// Show this surface's window and bring it to the front. Best-effort.
    pub async fn reveal(&self) {
        let label = self.refresher.bus.label();
        self.refresher.client.show_surface(label).await;
        self.refresher.client.focus_surface(label).await;
    }

    /// Hide this surface's window. Best-effort.
    pub async fn hide(&self) {
        self.refresher
            .client
            .hide_surface(self.refresher.bus.label())
            .await;
    }

    /// Stop listening and cancel pending timers. Responses still in flight
    /// are dropped when they arrive.
    pub fn teardown(&self) {
        self.refresher.bus.teardown();
        if let Some(revert) = lock(&self.revert).take() {
            revert.abort();
        }
    }

    fn schedule_revert(&self, mark: CopyFeedbackState) {
        let state = Arc::clone(&self.refresher.state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(mark.expires_at).await;
            state.send_if_modified(|state| state.copy.expire(mark.generation()));
        });
        if let Some(previous) = lock(&self.revert).replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for ListSurface {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    use super::*;
    use crate::bus::{EventBus, MAIN_SURFACE};
    use crate::clipboard::testing::FakeClipboard;
    use crate::commands::testing::ScriptedTransport;
    use crate::commands::{Command, CommandTransport};
    use crate::theme::{FixedPreference, MemoryThemeSlot};

    struct Fixture {
        bus: EventBus,
        transport: Arc<ScriptedTransport>,
        native: Arc<FakeClipboard>,
        surface: ListSurface,
    }

    fn mount_with(
        transport: Arc<dyn CommandTransport>,
        native: Arc<FakeClipboard>,
        bus: &EventBus,
    ) -> ListSurface {
        let surface_bus = bus.surface(MAIN_SURFACE);
        let theme = ThemeController::new(
            surface_bus.clone(),
            Arc::new(MemoryThemeSlot::default()),
            Arc::new(FixedPreference::default()),
        );
        ListSurface::mount(
            surface_bus,
            StorageClient::new(transport),
            theme,
            native,
            &CoreConfig::default(),
        )
    }

    async fn mounted(notes: Vec<Note>) -> Fixture {
        let bus = EventBus::default();
        let transport = Arc::new(ScriptedTransport::default());
        transport.set_notes(notes);
        let native = Arc::new(FakeClipboard::default());
        let surface = mount_with(transport.clone(), native.clone(), &bus);
        surface.wait_until_settled().await;
        Fixture {
            bus,
            transport,
            native,
            surface,
        }
    }

    async fn wait_for(surface: &ListSurface, predicate: impl FnMut(&ListSurfaceState) -> bool) {
        let mut receiver = surface.state();
        timeout(Duration::from_secs(5), receiver.wait_for(predicate))
            .await
            .expect("state never matched")
            .expect("state sender dropped");
    }

    #[tokio::test]
    async fn initial_load_populates_cache() {
        let fixture = mounted(vec![Note::new("n-1", "buy milk")]).await;

        let state = fixture.surface.snapshot();

        assert!(!state.list.is_loading());
        assert_eq!(state.list.notes().len(), 1);
        assert_eq!(fixture.transport.count("list_notes"), 1);
    }

    #[tokio::test]
    async fn notes_changed_triggers_refetch() {
        let fixture = mounted(Vec::new()).await;

        fixture
            .transport
            .set_notes(vec![Note::new("n-1", "from elsewhere")]);
        fixture.bus.publish(topics::NOTES_CHANGED, None);

        wait_for(&fixture.surface, |state| state.list.notes().len() == 1).await;
        assert_eq!(fixture.transport.count("list_notes"), 2);
    }

    #[tokio::test]
    async fn converges_when_other_topics_flood_a_small_bus() {
        let bus = EventBus::new(1);
        let transport = Arc::new(ScriptedTransport::default());
        let surface = mount_with(transport.clone(), Arc::new(FakeClipboard::default()), &bus);
        surface.wait_until_settled().await;

        transport.set_notes(vec![Note::new("n-1", "from elsewhere")]);
        bus.publish(topics::NOTES_CHANGED, None);
        bus.publish(topics::THEME_CHANGED, Some(Value::from("dark")));
        bus.publish(topics::CAPTURE_OPENED, None);

        wait_for(&surface, |state| state.list.notes().len() == 1).await;
        assert_eq!(transport.count("list_notes"), 2);
    }

    #[tokio::test]
    async fn refresh_failure_keeps_cache_and_shows_error() {
        let fixture = mounted(vec![Note::new("n-1", "kept")]).await;
        fixture.transport.reply(Err("database is locked".to_string()));

        fixture.surface.refresh().await.unwrap();

        let state = fixture.surface.snapshot();
        assert_eq!(state.list.error(), Some("database is locked"));
        assert_eq!(state.list.notes().len(), 1);
    }

    #[tokio::test]
    async fn search_filters_visible_notes() {
        let fixture = mounted(vec![
            Note::new("n-2", "Walk the dog"),
            Note::new("n-1", "buy milk"),
        ])
        .await;

        fixture.surface.set_search_query("  DOG");

        let visible = fixture.surface.visible_notes();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, NoteId::from("n-2"));
    }

    /// Holds each `list_notes` response until the test releases it.
    #[derive(Default)]
    struct GatedTransport {
        pending: Mutex<VecDeque<oneshot::Receiver<Vec<Note>>>>,
    }

    impl GatedTransport {
        fn gate(&self) -> oneshot::Sender<Vec<Note>> {
            let (sender, receiver) = oneshot::channel();
            lock(&self.pending).push_back(receiver);
            sender
        }
    }

    #[async_trait]
    impl CommandTransport for GatedTransport {
        async fn invoke(&self, command: Command) -> Result<Value, String> {
            if command != Command::ListNotes {
                return Ok(Value::Null);
            }
            let gate = lock(&self.pending).pop_front();
            let notes = match gate {
                Some(gate) => gate.await.map_err(|error| error.to_string())?,
                None => Vec::new(),
            };
            serde_json::to_value(notes).map_err(|error| error.to_string())
        }
    }

    #[tokio::test]
    async fn late_response_never_overwrites_newer_list() {
        let bus = EventBus::default();
        let transport = Arc::new(GatedTransport::default());
        let initial = transport.gate();
        let second = transport.gate();
        let surface = mount_with(transport.clone(), Arc::new(FakeClipboard::default()), &bus);
        let refresh = surface.refresh();

        second
            .send(vec![Note::new("n-2", "new"), Note::new("n-1", "old")])
            .unwrap();
        refresh.await.unwrap();
        initial.send(vec![Note::new("n-1", "old")]).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(surface.snapshot().list.notes().len(), 2);
    }

    #[tokio::test]
    async fn responses_after_teardown_are_ignored() {
        let bus = EventBus::default();
        let transport = Arc::new(GatedTransport::default());
        let initial = transport.gate();
        let surface = mount_with(transport.clone(), Arc::new(FakeClipboard::default()), &bus);
        let mut state = surface.state();

        surface.teardown();
        initial.send(vec![Note::new("n-1", "late")]).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(!state.has_changed().unwrap());
        assert!(surface.snapshot().list.notes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn copy_marks_note_then_reverts() {
        let fixture = mounted(vec![Note::new("n-1", "buy milk")]).await;
        let id = NoteId::from("n-1");

        let path = fixture.surface.copy_note(&id).await.unwrap();

        assert_eq!(path, CopyPath::Privileged);
        assert_eq!(fixture.surface.copied_note(), Some(id.clone()));
        assert_eq!(fixture.native.written(), vec!["buy milk".to_string()]);

        tokio::time::sleep(CoreConfig::default().copy_feedback() + Duration::from_millis(1)).await;
        assert_eq!(fixture.surface.copied_note(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_copy_supersedes_previous_indicator() {
        let fixture = mounted(vec![Note::new("n-2", "second"), Note::new("n-1", "first")]).await;
        let feedback = CoreConfig::default().copy_feedback();

        fixture.surface.copy_note(&NoteId::from("n-1")).await.unwrap();
        tokio::time::sleep(feedback / 2).await;
        fixture.surface.copy_note(&NoteId::from("n-2")).await.unwrap();
        tokio::time::sleep(feedback / 2 + Duration::from_millis(1)).await;

        assert_eq!(fixture.surface.copied_note(), Some(NoteId::from("n-2")));
    }

    #[tokio::test]
    async fn copy_succeeds_via_native_when_privileged_fails() {
        let fixture = mounted(vec![Note::new("n-1", "x")]).await;
        fixture.transport.reply(Err("clipboard unavailable".to_string()));

        let path = fixture.surface.copy_note(&NoteId::from("n-1")).await.unwrap();

        assert_eq!(path, CopyPath::Native);
        assert_eq!(fixture.surface.snapshot().list.error(), None);
    }

    #[tokio::test]
    async fn successful_copy_clears_previous_error() {
        let fixture = mounted(vec![Note::new("n-1", "buy milk")]).await;
        fixture.surface.request_delete(&NoteId::from("n-1"));
        fixture.transport.reply(Err("disk full".to_string()));
        fixture.surface.confirm_delete().await.unwrap().unwrap_err();
        assert_eq!(fixture.surface.snapshot().list.error(), Some("disk full"));

        let path = fixture.surface.copy_note(&NoteId::from("n-1")).await.unwrap();

        assert_eq!(path, CopyPath::Privileged);
        assert_eq!(fixture.surface.snapshot().list.error(), None);
        assert!(fixture.surface.is_copied(&NoteId::from("n-1")));
    }

    #[tokio::test]
    async fn copy_failure_on_both_paths_shows_error() {
        let bus = EventBus::default();
        let transport = Arc::new(ScriptedTransport::default());
        transport.set_notes(vec![Note::new("n-1", "x")]);
        let native = Arc::new(FakeClipboard::failing("NotAllowedError"));
        let surface = mount_with(transport.clone(), native, &bus);
        surface.wait_until_settled().await;
        transport.reply(Err(String::new()));

        let error = surface.copy_note(&NoteId::from("n-1")).await.unwrap_err();

        assert_eq!(error.message(), "NotAllowedError");
        assert_eq!(surface.snapshot().list.error(), Some("NotAllowedError"));
        assert_eq!(surface.copied_note(), None);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let fixture = mounted(vec![Note::new("n-1", "buy milk")]).await;
        let id = NoteId::from("n-1");

        let pending = fixture.surface.request_delete(&id).unwrap();
        assert_eq!(pending.preview, "buy milk");
        assert_eq!(fixture.transport.count("delete_note"), 0);

        assert_eq!(fixture.surface.confirm_delete().await, Some(Ok(())));
        assert_eq!(fixture.surface.confirm_delete().await, None);
        assert_eq!(fixture.transport.count("delete_note"), 1);
        assert_eq!(fixture.surface.snapshot().deletion.pending(), None);
    }

    #[tokio::test]
    async fn cancelled_or_dismissed_prompt_never_deletes() {
        let fixture = mounted(vec![Note::new("n-1", "buy milk")]).await;
        let id = NoteId::from("n-1");

        fixture.surface.request_delete(&id);
        assert!(fixture.surface.cancel_delete());
        fixture.surface.request_delete(&id);
        assert!(fixture.surface.dismiss_delete());

        assert_eq!(fixture.surface.confirm_delete().await, None);
        assert_eq!(fixture.transport.count("delete_note"), 0);
    }

    #[tokio::test]
    async fn failed_delete_surfaces_error() {
        let fixture = mounted(vec![Note::new("n-1", "x")]).await;
        fixture.surface.request_delete(&NoteId::from("n-1"));
        fixture.transport.reply(Err("Note not found".to_string()));

        let result = fixture.surface.confirm_delete().await;

        assert_eq!(result, Some(Err(StorageFailure::new("Note not found"))));
        assert_eq!(fixture.surface.snapshot().list.error(), Some("Note not found"));
    }

    #[tokio::test]
    async fn reveal_and_hide_target_own_window() {
        let fixture = mounted(Vec::new()).await;

        fixture.surface.reveal().await;
        fixture.surface.hide().await;

        let window_commands = fixture
            .transport
            .invoked()
            .into_iter()
            .filter(|command| *command != Command::ListNotes)
            .collect::<Vec<_>>();
        assert_eq!(
            window_commands,
            vec![
                Command::ShowSurface {
                    label: MAIN_SURFACE.to_string()
                },
                Command::FocusSurface {
                    label: MAIN_SURFACE.to_string()
                },
                Command::HideSurface {
                    label: MAIN_SURFACE.to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn open_capture_error_is_soft() {
        let fixture = mounted(Vec::new()).await;
        fixture.transport.reply(Err("window missing".to_string()));

        assert!(fixture.surface.open_capture().await.is_err());
        assert_eq!(fixture.surface.snapshot().list.error(), Some("window missing"));

        fixture.surface.dismiss_error();
        assert_eq!(fixture.surface.snapshot().list.error(), None);
    }
}
