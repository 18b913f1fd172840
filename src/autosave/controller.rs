use super::draft::{DraftState, SaveSkip, SaveTicket};
use super::runtime::{BrowserRuntime, Runtime, TimerId};
use super::status::{SaveStatus, StatusTracker};
use super::store::{ContentStore, Document, DocumentUpdate, StoreError};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AutosaveConfig {
    /// Debounce window after the last keystroke.
    pub quiet_period_ms: u32,
    pub saved_display_ms: u32,
    pub error_display_ms: u32,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 3000,
            saved_display_ms: 2000,
            error_display_ms: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SaveOutcome {
    Saved,
    Failed(StoreError),
}

/// Completion of one persistence call. Cloneable; awaiting it is optional.
pub(crate) type SaveHandle = Shared<LocalBoxFuture<'static, SaveOutcome>>;

pub(crate) enum SaveAttempt {
    Started(SaveHandle),
    Skipped(SaveSkip),
}

impl SaveAttempt {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    pub fn skipped(&self) -> Option<SaveSkip> {
        match self {
            Self::Skipped(skip) => Some(*skip),
            Self::Started(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SaveEvent {
    Status(SaveStatus),
    /// The store acknowledged this text; it is the new baseline.
    Saved(String),
    Failed(StoreError),
}

type Listener = Rc<dyn Fn(&SaveEvent)>;
type SavedHook = Rc<dyn Fn(&str)>;

struct Inner {
    draft: DraftState,
    status: StatusTracker,
    debounce: Option<TimerId>,
    status_clear: Option<TimerId>,
    pending: Option<SaveHandle>,
    listener: Option<Listener>,
    /// Outlives `dispose` so acknowledgements that land after the view is
    /// gone still reach local bookkeeping.
    after_detach: Option<SavedHook>,
    detached: bool,
}

/// Debounced autosave for a single document.
///
/// Every keystroke re-arms one quiet-period timer owned by this controller, so
/// independent editors never share a debounce window. At most one update is
/// outstanding per controller; saves attempted meanwhile are dropped.
pub(crate) struct AutosaveController<S, R = BrowserRuntime> {
    document_id: Rc<str>,
    store: S,
    runtime: R,
    config: AutosaveConfig,
    inner: Rc<RefCell<Inner>>,
}

impl<S: Clone, R: Clone> Clone for AutosaveController<S, R> {
    fn clone(&self) -> Self {
        Self {
            document_id: self.document_id.clone(),
            store: self.store.clone(),
            runtime: self.runtime.clone(),
            config: self.config,
            inner: self.inner.clone(),
        }
    }
}

impl<S, R> AutosaveController<S, R>
where
    S: ContentStore + Clone + 'static,
    R: Runtime,
{
    pub fn new(
        document_id: impl Into<String>,
        draft: DraftState,
        store: S,
        runtime: R,
        config: AutosaveConfig,
    ) -> Self {
        let document_id: String = document_id.into();
        Self {
            document_id: document_id.into(),
            store,
            runtime,
            config,
            inner: Rc::new(RefCell::new(Inner {
                draft,
                status: StatusTracker::default(),
                debounce: None,
                status_clear: None,
                pending: None,
                listener: None,
                after_detach: None,
                detached: false,
            })),
        }
    }

    /// Fetch the document and start editing it.
    ///
    /// `recover` may supply a locally kept body; it becomes the draft while the
    /// fetched body stays the baseline.
    pub async fn open(
        document_id: &str,
        store: S,
        runtime: R,
        config: AutosaveConfig,
        recover: impl FnOnce(&Document) -> Option<String>,
    ) -> Result<(Self, Document), StoreError> {
        let doc = store.fetch(document_id).await?;
        let draft = match recover(&doc) {
            Some(local) if local != doc.body => {
                tracing::info!(document_id, "restoring unsynced local draft");
                DraftState::recovered(doc.body.clone(), local)
            }
            _ => DraftState::new(doc.body.clone()),
        };
        let controller = Self::new(document_id, draft, store, runtime, config);
        Ok((controller, doc))
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn set_listener(&self, f: impl Fn(&SaveEvent) + 'static) {
        self.inner.borrow_mut().listener = Some(Rc::new(f));
    }

    pub fn body(&self) -> String {
        self.inner.borrow().draft.body().to_string()
    }

    pub fn baseline(&self) -> String {
        self.inner.borrow().draft.baseline().to_string()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().draft.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.inner.borrow().draft.is_saving()
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.borrow().status.status()
    }

    /// Handle of the save currently in flight, if any.
    pub fn settled(&self) -> Option<SaveHandle> {
        self.inner.borrow().pending.clone()
    }

    /// Record an edit and restart the quiet period.
    pub fn on_text_change(&self, text: impl Into<String>) {
        let text = text.into();
        {
            let mut inner = self.inner.borrow_mut();
            inner.draft.set_body(text.clone());
            if inner.detached {
                return;
            }
        }
        self.cancel_debounce();

        let this = self.clone();
        let timer = self.runtime.set_timeout(
            self.config.quiet_period_ms,
            Box::new(move || {
                this.inner.borrow_mut().debounce = None;
                let _ = this.save(Some(text));
            }),
        );
        self.inner.borrow_mut().debounce = timer;
    }

    /// Save the current body now, dropping any pending debounce.
    pub fn manual_save(&self) -> SaveAttempt {
        self.cancel_debounce();
        self.save(None)
    }

    /// Persist `text` (or the current body) unless a save is already in flight
    /// or the text matches the baseline.
    pub fn save(&self, text: Option<String>) -> SaveAttempt {
        let begun = self.inner.borrow_mut().draft.begin_save(text);
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(skip) => {
                tracing::debug!(document_id = %self.document_id, ?skip, "save skipped");
                return SaveAttempt::Skipped(skip);
            }
        };

        self.set_status(SaveStatus::Saving);

        let update = DocumentUpdate {
            body: ticket.text().to_string(),
            updated_at: self.runtime.timestamp(),
        };
        tracing::debug!(
            document_id = %self.document_id,
            len = update.body.len(),
            "saving document body"
        );

        let this = self.clone();
        let handle: SaveHandle = async move {
            let result = this.store.update(&this.document_id, update).await;
            this.finish(ticket, result)
        }
        .boxed_local()
        .shared();

        self.inner.borrow_mut().pending = Some(handle.clone());
        self.runtime.spawn(handle.clone().map(|_| ()).boxed_local());
        SaveAttempt::Started(handle)
    }

    /// Best-effort save when the view is being left. Does not wait.
    pub fn leave(&self) -> SaveAttempt {
        self.cancel_debounce();
        if !self.is_dirty() {
            return SaveAttempt::Skipped(SaveSkip::Unchanged);
        }
        tracing::info!(document_id = %self.document_id, "saving unsaved changes on exit");
        self.save(None)
    }

    /// `leave` then `dispose`. `on_saved` receives the text of any save the
    /// store acknowledges afterwards, including one already in flight.
    pub fn detach(&self, on_saved: impl Fn(&str) + 'static) -> SaveAttempt {
        let attempt = self.leave();
        self.inner.borrow_mut().after_detach = Some(Rc::new(on_saved));
        self.dispose();
        attempt
    }

    /// Stop timers and drop the listener. An in-flight save still completes
    /// and moves the baseline.
    pub fn dispose(&self) {
        let (debounce, status_clear) = {
            let mut inner = self.inner.borrow_mut();
            inner.detached = true;
            inner.listener = None;
            (inner.debounce.take(), inner.status_clear.take())
        };
        for id in [debounce, status_clear].into_iter().flatten() {
            self.runtime.clear_timeout(id);
        }
    }

    fn cancel_debounce(&self) {
        let previous = self.inner.borrow_mut().debounce.take();
        if let Some(id) = previous {
            self.runtime.clear_timeout(id);
        }
    }

    fn finish(&self, ticket: SaveTicket, result: Result<(), StoreError>) -> SaveOutcome {
        let text = ticket.text().to_string();
        let _pending = {
            let mut inner = self.inner.borrow_mut();
            inner.draft.finish_save(ticket, result.is_ok());
            inner.pending.take()
        };

        match result {
            Ok(()) => {
                tracing::info!(document_id = %self.document_id, len = text.len(), "document saved");
                let hook = {
                    let inner = self.inner.borrow();
                    inner.after_detach.clone().filter(|_| inner.detached)
                };
                if let Some(hook) = hook {
                    hook(&text);
                }
                self.emit(&SaveEvent::Saved(text));
                self.set_status(SaveStatus::Saved);
                SaveOutcome::Saved
            }
            Err(e) => {
                tracing::warn!(document_id = %self.document_id, error = %e, "document save failed");
                self.emit(&SaveEvent::Failed(e.clone()));
                self.set_status(SaveStatus::Error);
                SaveOutcome::Failed(e)
            }
        }
    }

    fn set_status(&self, status: SaveStatus) {
        let (generation, stale_clear, detached) = {
            let mut inner = self.inner.borrow_mut();
            (
                inner.status.enter(status),
                inner.status_clear.take(),
                inner.detached,
            )
        };
        if let Some(id) = stale_clear {
            self.runtime.clear_timeout(id);
        }

        let display_ms = match status {
            SaveStatus::Saved => Some(self.config.saved_display_ms),
            SaveStatus::Error => Some(self.config.error_display_ms),
            SaveStatus::Idle | SaveStatus::Saving => None,
        };
        if let (Some(ms), false) = (display_ms, detached) {
            let this = self.clone();
            let id = self
                .runtime
                .set_timeout(ms, Box::new(move || this.expire_status(generation)));
            self.inner.borrow_mut().status_clear = id;
        }

        self.emit(&SaveEvent::Status(status));
    }

    fn expire_status(&self, generation: u64) {
        let expired = {
            let mut inner = self.inner.borrow_mut();
            inner.status_clear = None;
            inner.status.expire(generation)
        };
        if expired {
            self.emit(&SaveEvent::Status(SaveStatus::Idle));
        }
    }

    fn emit(&self, event: &SaveEvent) {
        let listener = self.inner.borrow().listener.clone();
        if let Some(listener) = listener {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::runtime::manual::ManualRuntime;
    use crate::drafts::phase::PhaseDraft;
    use futures::channel::oneshot;

    #[derive(Default)]
    struct FakeState {
        doc: Option<Document>,
        calls: Vec<(String, DocumentUpdate)>,
        fail_next: Option<StoreError>,
        gate: Option<oneshot::Receiver<()>>,
    }

    #[derive(Clone, Default)]
    struct FakeStore {
        state: Rc<RefCell<FakeState>>,
    }

    impl FakeStore {
        fn bodies(&self) -> Vec<String> {
            self.state
                .borrow()
                .calls
                .iter()
                .map(|(_, u)| u.body.clone())
                .collect()
        }

        fn fail_next(&self, e: StoreError) {
            self.state.borrow_mut().fail_next = Some(e);
        }

        /// Keep the next update in flight until the sender fires.
        fn hold_next(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.state.borrow_mut().gate = Some(rx);
            tx
        }
    }

    impl ContentStore for FakeStore {
        async fn fetch(&self, document_id: &str) -> Result<Document, StoreError> {
            self.state
                .borrow()
                .doc
                .clone()
                .filter(|d| d.id == document_id)
                .ok_or(StoreError::NotFound)
        }

        async fn update(&self, document_id: &str, update: DocumentUpdate) -> Result<(), StoreError> {
            let (gate, failure) = {
                let mut s = self.state.borrow_mut();
                s.calls.push((document_id.to_string(), update));
                (s.gate.take(), s.fail_next.take())
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            match failure {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
    }

    fn setup(body: &str) -> (AutosaveController<FakeStore, ManualRuntime>, FakeStore, ManualRuntime) {
        let store = FakeStore::default();
        let rt = ManualRuntime::new();
        let c = AutosaveController::new(
            "phase-1",
            DraftState::new(body),
            store.clone(),
            rt.clone(),
            AutosaveConfig::default(),
        );
        (c, store, rt)
    }

    fn record_events(c: &AutosaveController<FakeStore, ManualRuntime>) -> Rc<RefCell<Vec<SaveEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        c.set_listener(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn test_only_final_text_of_a_quiet_window_is_persisted() {
        let (c, store, rt) = setup("");
        c.on_text_change("H");
        rt.advance(1000);
        c.on_text_change("He");
        rt.advance(1000);
        c.on_text_change("Hello");
        rt.advance(2999);
        assert!(store.bodies().is_empty());

        rt.advance(1);
        assert_eq!(store.bodies(), vec!["Hello".to_string()]);
        assert_eq!(store.state.borrow().calls[0].0, "phase-1");
    }

    #[test]
    fn test_hello_world_scenario() {
        let (c, store, rt) = setup("");
        c.on_text_change("Hello");
        rt.advance(3001);
        assert_eq!(store.bodies(), vec!["Hello"]);
        assert_eq!(c.baseline(), "Hello");

        c.on_text_change("Hello world");
        rt.advance(1000);
        assert_eq!(c.baseline(), "Hello");
        assert!(c.is_dirty());

        rt.advance(2000);
        assert_eq!(store.bodies(), vec!["Hello", "Hello world"]);
        assert_eq!(c.baseline(), "Hello world");

        rt.advance(10_000);
        assert_eq!(store.bodies().len(), 2);
    }

    #[test]
    fn test_manual_save_twice_is_a_single_call() {
        let (c, store, rt) = setup("");
        c.on_text_change("draft");
        assert!(c.manual_save().is_started());
        rt.run_until_stalled();

        assert_eq!(c.manual_save().skipped(), Some(SaveSkip::Unchanged));
        rt.run_until_stalled();
        assert_eq!(store.bodies(), vec!["draft"]);
    }

    #[test]
    fn test_manual_save_with_clean_draft_makes_no_call() {
        let (c, store, rt) = setup("persisted");
        assert_eq!(c.manual_save().skipped(), Some(SaveSkip::Unchanged));
        rt.advance(5000);
        assert!(store.bodies().is_empty());
        assert_eq!(c.status(), SaveStatus::Idle);
    }

    #[test]
    fn test_manual_save_cancels_pending_debounce() {
        let (c, store, rt) = setup("");
        c.on_text_change("abc");
        assert_eq!(rt.pending_timers(), 1);
        c.manual_save();
        rt.run_until_stalled();
        rt.advance(3000);
        assert_eq!(store.bodies(), vec!["abc"]);
    }

    #[test]
    fn test_saves_during_flight_are_dropped_not_queued() {
        let (c, store, rt) = setup("");
        let release = store.hold_next();

        c.on_text_change("one");
        let first = c.manual_save();
        assert!(first.is_started());
        rt.run_until_stalled();
        assert!(c.is_saving());
        assert!(c.settled().is_some());

        c.on_text_change("one two");
        assert_eq!(c.manual_save().skipped(), Some(SaveSkip::InFlight));

        c.on_text_change("one two three");
        rt.advance(3000);
        assert_eq!(store.bodies(), vec!["one"]);

        release.send(()).unwrap();
        rt.run_until_stalled();
        assert!(!c.is_saving());
        assert!(c.settled().is_none());
        assert_eq!(c.baseline(), "one");
        assert!(c.is_dirty());

        // Nothing was queued: only a new trigger retries.
        rt.advance(10_000);
        assert_eq!(store.bodies(), vec!["one"]);
        assert!(c.manual_save().is_started());
        rt.run_until_stalled();
        assert_eq!(store.bodies(), vec!["one", "one two three"]);
    }

    #[test]
    fn test_started_handle_resolves_to_outcome() {
        let (c, store, rt) = setup("");
        let release = store.hold_next();
        c.on_text_change("x");
        let SaveAttempt::Started(handle) = c.manual_save() else {
            panic!("save should start");
        };
        rt.run_until_stalled();
        assert!(handle.peek().is_none());

        release.send(()).unwrap();
        rt.run_until_stalled();
        assert_eq!(handle.peek(), Some(&SaveOutcome::Saved));
    }

    #[test]
    fn test_failed_save_keeps_baseline_and_reports_error() {
        let (c, store, rt) = setup("start");
        let events = record_events(&c);
        store.fail_next(StoreError::TransientWriteFailure("503".into()));

        c.on_text_change("start + more");
        let SaveAttempt::Started(handle) = c.manual_save() else {
            panic!("save should start");
        };
        rt.run_until_stalled();

        assert_eq!(
            handle.peek(),
            Some(&SaveOutcome::Failed(StoreError::TransientWriteFailure("503".into())))
        );
        assert_eq!(c.baseline(), "start");
        assert!(c.is_dirty());
        assert_eq!(c.status(), SaveStatus::Error);
        assert!(events
            .borrow()
            .iter()
            .any(|e| matches!(e, SaveEvent::Failed(StoreError::TransientWriteFailure(_)))));

        rt.advance(2999);
        assert_eq!(c.status(), SaveStatus::Error);
        rt.advance(1);
        assert_eq!(c.status(), SaveStatus::Idle);

        // Next trigger retries with the latest text.
        assert!(c.manual_save().is_started());
        rt.run_until_stalled();
        assert_eq!(c.baseline(), "start + more");
        assert_eq!(store.bodies().len(), 2);
    }

    #[test]
    fn test_status_sequence_and_auto_clear() {
        let (c, _store, rt) = setup("");
        let events = record_events(&c);

        c.on_text_change("words");
        rt.advance(3000);
        assert_eq!(c.status(), SaveStatus::Saved);

        rt.advance(2000);
        assert_eq!(c.status(), SaveStatus::Idle);
        assert_eq!(
            *events.borrow(),
            vec![
                SaveEvent::Status(SaveStatus::Saving),
                SaveEvent::Saved("words".to_string()),
                SaveEvent::Status(SaveStatus::Saved),
                SaveEvent::Status(SaveStatus::Idle),
            ]
        );
    }

    #[test]
    fn test_new_save_during_saved_display_is_not_reset_by_old_clear() {
        let (c, store, rt) = setup("");
        c.on_text_change("a");
        c.manual_save();
        rt.run_until_stalled();
        assert_eq!(c.status(), SaveStatus::Saved);

        let release = store.hold_next();
        c.on_text_change("ab");
        c.manual_save();
        rt.advance(2500);
        assert_eq!(c.status(), SaveStatus::Saving);

        release.send(()).unwrap();
        rt.run_until_stalled();
        assert_eq!(c.status(), SaveStatus::Saved);
    }

    #[test]
    fn test_leave_saves_dirty_draft_immediately() {
        let (c, store, rt) = setup("");
        c.on_text_change("unsaved");
        assert!(c.leave().is_started());
        c.dispose();
        rt.run_until_stalled();
        assert_eq!(store.bodies(), vec!["unsaved"]);
        assert_eq!(c.baseline(), "unsaved");
        assert_eq!(rt.pending_timers(), 0);
    }

    #[test]
    fn test_save_acked_after_detach_settles_local_journal() {
        let (c, store, rt) = setup("server text");
        let events = record_events(&c);
        let journal = Rc::new(RefCell::new(PhaseDraft::default()));

        journal.borrow_mut().touch("my text", 1);
        c.on_text_change("my text");
        let release = store.hold_next();

        let sink = journal.clone();
        assert!(c.detach(move |text| {
            sink.borrow_mut().mark_synced(text);
        })
        .is_started());
        let seen = events.borrow().len();

        release.send(()).unwrap();
        rt.run_until_stalled();

        assert_eq!(store.bodies(), vec!["my text"]);
        assert_eq!(c.baseline(), "my text");
        assert!(!journal.borrow().is_unsynced());
        assert_eq!(journal.borrow().override_for("newer server text"), None);
        // The page listener is gone once detached.
        assert_eq!(events.borrow().len(), seen);
        assert_eq!(rt.pending_timers(), 0);
    }

    #[test]
    fn test_detach_during_flight_reports_only_the_acked_text() {
        let (c, store, rt) = setup("");
        let release = store.hold_next();
        c.on_text_change("a");
        rt.advance(3000);
        assert!(c.is_saving());

        c.on_text_change("ab");
        let acked = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = acked.clone();
        assert_eq!(
            c.detach(move |text| sink.borrow_mut().push(text.to_string()))
                .skipped(),
            Some(SaveSkip::InFlight)
        );

        release.send(()).unwrap();
        rt.run_until_stalled();
        rt.advance(10_000);

        assert_eq!(store.bodies(), vec!["a"]);
        assert_eq!(*acked.borrow(), vec!["a".to_string()]);
        assert!(c.is_dirty());
    }

    #[test]
    fn test_leave_with_clean_draft_is_noop() {
        let (c, store, rt) = setup("clean");
        assert_eq!(c.leave().skipped(), Some(SaveSkip::Unchanged));
        rt.run_until_stalled();
        assert!(store.bodies().is_empty());
    }

    #[test]
    fn test_editors_debounce_independently() {
        let rt = ManualRuntime::new();
        let store = FakeStore::default();
        let a = AutosaveController::new(
            "a",
            DraftState::new(""),
            store.clone(),
            rt.clone(),
            AutosaveConfig::default(),
        );
        let b = AutosaveController::new(
            "b",
            DraftState::new(""),
            store.clone(),
            rt.clone(),
            AutosaveConfig::default(),
        );

        a.on_text_change("first");
        rt.advance(2000);
        b.on_text_change("second");
        rt.advance(1000);
        assert_eq!(store.bodies(), vec!["first"]);
        rt.advance(2000);
        assert_eq!(store.bodies(), vec!["first", "second"]);
    }

    #[test]
    fn test_update_carries_fresh_timestamp() {
        let (c, store, rt) = setup("");
        rt.advance(500);
        c.on_text_change("t");
        rt.advance(3000);
        assert_eq!(rt.now(), 3500);
        assert_eq!(store.state.borrow().calls[0].1.updated_at, "t+3500ms");
    }

    #[test]
    fn test_open_restores_differing_local_draft() {
        let store = FakeStore::default();
        store.state.borrow_mut().doc = Some(Document {
            id: "p".into(),
            title: "Chapter 1".into(),
            description: None,
            body: "server".into(),
            assigned_to: None,
            updated_at: String::new(),
        });
        let rt = ManualRuntime::new();

        let (c, doc) = futures::executor::block_on(AutosaveController::open(
            "p",
            store.clone(),
            rt.clone(),
            AutosaveConfig::default(),
            |_| Some("local".to_string()),
        ))
        .unwrap();
        assert_eq!(doc.title, "Chapter 1");
        assert_eq!(c.body(), "local");
        assert_eq!(c.baseline(), "server");
        assert!(c.is_dirty());

        let (c2, _) = futures::executor::block_on(AutosaveController::open(
            "p",
            store,
            rt,
            AutosaveConfig::default(),
            |d| Some(d.body.clone()),
        ))
        .unwrap();
        assert!(!c2.is_dirty());
    }

    #[test]
    fn test_open_missing_document_is_not_found() {
        let result = futures::executor::block_on(AutosaveController::open(
            "missing",
            FakeStore::default(),
            ManualRuntime::new(),
            AutosaveConfig::default(),
            |_| None,
        ));
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
