//! Task sync engine
//!
//! One task drains every trigger (session changes, UI actions, the
//! polling timer, visibility flips), so fetch cycles never overlap and
//! the merge step always sees a settled set of per-list results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use log::{debug, error, warn};
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::MissedTickBehavior;

use auth_session::SessionEngine;
use graph_client::{map_task, TodoApi};
use todo_core::{merge_ranked, Task, Visibility};

use crate::state::SyncState;

/// How often the collection is refreshed while logged in and visible.
const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Read access to the auth session, as the sync engine sees it.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn logged_in(&self) -> bool;

    async fn client(&self) -> Option<Arc<dyn TodoApi>>;

    /// Resolves when the session may have changed.
    async fn changed(&self);
}

#[async_trait]
impl SessionSource for SessionEngine {
    async fn logged_in(&self) -> bool {
        self.session().await.logged_in
    }

    async fn client(&self) -> Option<Arc<dyn TodoApi>> {
        self.session()
            .await
            .client
            .map(|client| client as Arc<dyn TodoApi>)
    }

    async fn changed(&self) {
        SessionEngine::changed(self).await;
    }
}

#[derive(Debug)]
enum Command {
    Refresh,
    Toggle(Task),
    VisibilityChanged(Visibility),
    SessionChanged,
}

struct SyncInner {
    source: Arc<dyn SessionSource>,
    link_template: String,
    state: Mutex<SyncState>,
    tasks: RwLock<Vec<Task>>,
    error: AtomicBool,
    visibility: Mutex<Visibility>,
    logged_in: AtomicBool,
    notify: Notify,
}

/// Handle to the sync engine. Cheap to clone.
#[derive(Clone)]
pub struct TaskSyncEngine {
    inner: Arc<SyncInner>,
    tx: mpsc::UnboundedSender<Command>,
}

impl TaskSyncEngine {
    pub fn new(source: Arc<dyn SessionSource>, link_template: impl Into<String>) -> Self {
        Self::with_interval(source, link_template, REFRESH_INTERVAL)
    }

    /// Engine with a custom polling interval (tests).
    pub fn with_interval(
        source: Arc<dyn SessionSource>,
        link_template: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(SyncInner {
            source: source.clone(),
            link_template: link_template.into(),
            state: Mutex::new(SyncState::Load),
            tasks: RwLock::new(Vec::new()),
            error: AtomicBool::new(false),
            visibility: Mutex::new(Visibility::Visible),
            logged_in: AtomicBool::new(false),
            notify: Notify::new(),
        });

        tokio::spawn(run(inner.clone(), rx, interval));

        // Forward session changes into the command queue and pick up the
        // session's current state once at startup.
        let session_tx = tx.clone();
        tokio::spawn(async move {
            loop {
                if session_tx.send(Command::SessionChanged).is_err() {
                    break;
                }
                source.changed().await;
            }
        });

        Self { inner, tx }
    }

    /// UI action: request a re-fetch.
    pub fn refresh(&self) {
        let _ = self.tx.send(Command::Refresh);
    }

    /// UI action: optimistically flip a task's completion.
    pub fn toggle_complete(&self, task: &Task) {
        let _ = self.tx.send(Command::Toggle(task.clone()));
    }

    /// Page visibility changed.
    pub fn set_visibility(&self, visibility: Visibility) {
        let _ = self.tx.send(Command::VisibilityChanged(visibility));
    }

    /// The displayed collection.
    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.tasks.read().await.clone()
    }

    pub fn state(&self) -> SyncState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn error(&self) -> bool {
        self.inner.error.load(Ordering::SeqCst)
    }

    /// Wait until the next engine change.
    pub async fn changed(&self) {
        self.inner.notify.notified().await;
    }
}

async fn run(
    inner: Arc<SyncInner>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    interval: Duration,
) {
    let mut poll = tokio::time::interval(interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    poll.reset();

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(command) = maybe else { break };
                if matches!(command, Command::VisibilityChanged(Visibility::Visible))
                    || matches!(command, Command::SessionChanged)
                {
                    // Restart the cadence when polling conditions change.
                    poll.reset();
                }
                inner.handle_command(command).await;
            }
            _ = poll.tick(), if inner.polling_enabled() => {
                inner.timer_tick().await;
            }
        }
        inner.notify.notify_waiters();
    }
    debug!("task sync command queue closed");
}

impl SyncInner {
    fn polling_enabled(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
            && !self
                .visibility
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .is_hidden()
    }

    fn set_state(&self, state: SyncState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_hidden(&self) -> bool {
        self.visibility
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_hidden()
    }

    async fn handle_command(&self, command: Command) {
        match command {
            Command::SessionChanged => self.session_changed().await,
            Command::Refresh => self.refresh_requested().await,
            Command::Toggle(task) => self.toggle(task).await,
            Command::VisibilityChanged(visibility) => {
                self.visibility_changed(visibility).await
            }
        }
    }

    async fn session_changed(&self) {
        let logged_in = self.source.logged_in().await;
        self.logged_in.store(logged_in, Ordering::SeqCst);

        if logged_in {
            if matches!(self.state(), SyncState::Load | SyncState::Refresh) {
                self.fetch().await;
            }
        } else if self.state().is_settled() {
            // Logging out clears the collection so the next login starts
            // a fresh cycle.
            self.tasks.write().await.clear();
            self.error.store(false, Ordering::SeqCst);
            self.set_state(SyncState::Load);
        }
    }

    async fn refresh_requested(&self) {
        self.set_state(SyncState::Refresh);
        if self.logged_in.load(Ordering::SeqCst) {
            self.fetch().await;
        }
    }

    async fn timer_tick(&self) {
        if self.state().is_settled() {
            self.set_state(SyncState::Refresh);
            self.fetch().await;
        }
    }

    async fn visibility_changed(&self, visibility: Visibility) {
        *self
            .visibility
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = visibility;

        // Coming back into view refreshes a settled collection right
        // away instead of waiting out the timer.
        if !visibility.is_hidden()
            && self.logged_in.load(Ordering::SeqCst)
            && self.state() == SyncState::Loaded
        {
            self.set_state(SyncState::Refresh);
            self.fetch().await;
        }
    }

    /// One fetch cycle: lists, then per-list tasks concurrently, then a
    /// wholesale rebuild of the collection.
    async fn fetch(&self) {
        let Some(client) = self.source.client().await else {
            return;
        };

        // A hidden page skips refreshes, never the initial load.
        if self.state() == SyncState::Refresh && self.is_hidden() {
            debug!("page hidden, skipping refresh");
            return;
        }

        let lists = match client.list_task_lists().await {
            Ok(lists) => lists,
            Err(e) => {
                error!("failed to load task lists: {e}");
                self.error.store(true, Ordering::SeqCst);
                self.set_state(SyncState::Error);
                return;
            }
        };

        if lists.is_empty() {
            *self.tasks.write().await = Vec::new();
            self.error.store(false, Ordering::SeqCst);
            self.set_state(SyncState::Loaded);
            return;
        }

        // Per-list fetches run concurrently; one list failing only
        // blanks its own contribution.
        let per_list = join_all(lists.iter().map(|list| {
            let client = client.clone();
            async move {
                match client.list_tasks(&list.id).await {
                    Ok(records) => records
                        .iter()
                        .map(|record| map_task(record, list, &self.link_template))
                        .collect(),
                    Err(e) => {
                        error!("failed to fetch tasks for list {}: {e}", list.id);
                        Vec::new()
                    }
                }
            }
        }))
        .await;

        let merged = merge_ranked(per_list);
        debug!("loaded {} tasks", merged.len());
        *self.tasks.write().await = merged;
        self.error.store(false, Ordering::SeqCst);
        self.set_state(SyncState::Loaded);
    }

    /// Two-phase optimistic toggle: tentative local apply, remote
    /// confirm, then reconcile or revert from the pre-toggle snapshot.
    async fn toggle(&self, task: Task) {
        let snapshot = {
            let tasks = self.tasks.read().await;
            match tasks.iter().find(|t| t.id == task.id) {
                Some(current) => current.clone(),
                None => {
                    warn!("toggle for unknown task {}", task.id);
                    return;
                }
            }
        };
        let next_status = snapshot.status.toggled();

        {
            let mut tasks = self.tasks.write().await;
            if let Some(current) = tasks.iter_mut().find(|t| t.id == snapshot.id) {
                current.status = next_status;
            }
        }

        let Some(client) = self.source.client().await else {
            self.revert(&snapshot).await;
            return;
        };

        match client
            .set_task_status(&snapshot.list_id, &snapshot.id, next_status)
            .await
        {
            Ok(()) => {
                // The optimistic value is provisional; reconcile with
                // server truth.
                self.set_state(SyncState::Refresh);
                self.fetch().await;
            }
            Err(e) => {
                error!("failed to update task {}: {e}", snapshot.id);
                self.revert(&snapshot).await;
            }
        }
    }

    async fn revert(&self, snapshot: &Task) {
        let mut tasks = self.tasks.write().await;
        if let Some(current) = tasks.iter_mut().find(|t| t.id == snapshot.id) {
            current.status = snapshot.status;
        }
        self.error.store(true, Ordering::SeqCst);
    }
}
