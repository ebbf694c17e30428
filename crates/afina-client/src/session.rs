//! Session context: owns every component and is the only place background
//! results are folded into state.

use afina_types::{ChatReply, ChatRequest, DatabaseEntry, RagParameters};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::{BackendClient, UploadOutcome};
use crate::composer::Composer;
use crate::config::Config;
use crate::intake::{parse_dropped_paths, FileIntake, IntakeReport, PendingFile};
use crate::selector::{spawn_refresh, DatabaseSelector, RefreshLoop, SelectionPusher, REFRESH_INTERVAL};
use crate::settings::{load_settings, SettingsPanel};
use crate::storage::LocalStorage;
use crate::transcript::{EntryId, Transcript};
use crate::typing::{spawn_reveal, TypingTiming};
use crate::uploader::{AttemptId, UploadState, Uploader, UPLOAD_FAILED};

/// Results of background work, delivered back to the session in arrival order.
#[derive(Debug)]
pub enum SessionEvent {
    ChatReplied(Result<ChatReply>),
    TypingAdvanced { entry: EntryId, revealed: usize },
    UploadFinished { collection: String, attempt: AttemptId, result: Result<UploadOutcome> },
    DatabasesListed(Result<Vec<DatabaseEntry>>),
    ServerParameters(Result<RagParameters>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel { Info, Success, Warn, Error }

/// Something worth a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self { Self { level: NoticeLevel::Info, text: text.into() } }
    pub fn success(text: impl Into<String>) -> Self { Self { level: NoticeLevel::Success, text: text.into() } }
    pub fn warn(text: impl Into<String>) -> Self { Self { level: NoticeLevel::Warn, text: text.into() } }
    pub fn error(text: impl Into<String>) -> Self { Self { level: NoticeLevel::Error, text: text.into() } }
}

fn intake_notices(report: &IntakeReport) -> Vec<Notice> {
    let mut out = Vec::new();
    if !report.added.is_empty() {
        out.push(Notice::info(format!("Added {} file(s)", report.added.len())));
    }
    if !report.rejected.is_empty() {
        out.push(Notice::warn(format!("Only .txt files are accepted; skipped {}", report.rejected.join(", "))));
    }
    if !report.duplicates.is_empty() {
        out.push(Notice::info(format!("Already selected: {}", report.duplicates.join(", "))));
    }
    for (path, err) in &report.unreadable {
        out.push(Notice::warn(format!("Cannot read {}: {}", path.display(), err)));
    }
    out
}

pub struct Session {
    client: BackendClient,
    storage: LocalStorage,
    settings: RagParameters,
    panel: Option<SettingsPanel>,
    pub transcript: Transcript,
    pub composer: Composer,
    pub intake: FileIntake,
    pub uploader: Uploader,
    pub selector: DatabaseSelector,
    pusher: SelectionPusher,
    refresh: Option<RefreshLoop>,
    refresh_every: Duration,
    typing: TypingTiming,
    tx: mpsc::UnboundedSender<SessionEvent>,
    rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Session {
    /// Must be called inside a tokio runtime; the selection worker is spawned here.
    pub fn new(client: BackendClient, storage: LocalStorage) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pusher = SelectionPusher::spawn(client.clone());
        Self {
            client,
            storage,
            settings: RagParameters::default(),
            panel: None,
            transcript: Transcript::new(),
            composer: Composer::new(),
            intake: FileIntake::new(),
            uploader: Uploader::new(),
            selector: DatabaseSelector::new(),
            pusher,
            refresh: None,
            refresh_every: REFRESH_INTERVAL,
            typing: TypingTiming::default(),
            tx,
            rx,
        }
    }

    pub fn open(cfg: &Config) -> Result<Self> {
        let client = BackendClient::from_config(cfg)?;
        let storage = LocalStorage::open(&cfg.home_dir())?;
        Ok(Self::new(client, storage))
    }

    pub fn with_typing_timing(mut self, timing: TypingTiming) -> Self {
        self.typing = timing;
        self
    }

    pub fn with_refresh_interval(mut self, every: Duration) -> Self {
        self.refresh_every = every;
        self
    }

    pub fn backend_url(&self) -> &str { self.client.base() }

    pub fn storage_path(&self) -> &Path { self.storage.path() }

    /// Page-load sequence: inject the hidden panel, load persisted settings, start polling.
    pub fn start(&mut self) {
        if self.panel.is_none() {
            self.panel = Some(SettingsPanel::new(&self.settings));
        }
        self.settings = load_settings(&self.storage);
        if let Some(panel) = self.panel.as_mut() {
            panel.fill_from(&self.settings);
        }
        if !self.refresh_running() {
            self.refresh = Some(RefreshLoop::start(self.client.clone(), self.refresh_every, self.tx.clone()));
        }
        tracing::info!(backend = %self.client.base(), "session started");
    }

    pub fn teardown(&mut self) {
        if let Some(mut r) = self.refresh.take() {
            r.stop();
            tracing::info!("session torn down");
        }
    }

    pub fn refresh_running(&self) -> bool {
        self.refresh.as_ref().is_some_and(RefreshLoop::is_running)
    }

    pub fn settings(&self) -> &RagParameters { &self.settings }

    // ---- chat ----

    /// Send the composer's text. `false` (and no request) when it is blank.
    pub fn submit_message(&mut self) -> bool {
        let Some(message) = self.composer.message().map(str::to_string) else { return false };
        self.transcript.push_user(message.clone());
        let req = ChatRequest {
            message,
            selected_databases: self.selector.selected().to_vec(),
            rag_parameters: self.settings,
        };
        self.composer.begin_request();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let res = client.chat(&req).await;
            let _ = tx.send(SessionEvent::ChatReplied(res));
        });
        true
    }

    // ---- intake ----

    pub fn add_files(&mut self, files: Vec<PendingFile>) -> Vec<Notice> {
        let report = self.intake.add(files);
        intake_notices(&report)
    }

    pub fn add_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<Notice> {
        let report = self.intake.add_paths(paths);
        intake_notices(&report)
    }

    /// Treat pasted text as a drag-and-drop of local paths.
    pub fn add_dropped(&mut self, pasted: &str) -> Vec<Notice> {
        let paths: Vec<PathBuf> = parse_dropped_paths(pasted);
        if paths.is_empty() {
            return Vec::new();
        }
        self.add_paths(&paths)
    }

    pub fn remove_file(&mut self, index: usize) -> bool {
        self.intake.remove(index).is_some()
    }

    pub fn upload_enabled(&self) -> bool {
        self.intake.upload_enabled(self.uploader.collection_name())
    }

    // ---- upload ----

    /// Start an upload of every pending file. No-op unless `upload_enabled()`.
    pub fn upload(&mut self) -> bool {
        if !self.upload_enabled() {
            return false;
        }
        let collection = self.uploader.collection_name().trim().to_string();
        let attempt = self.uploader.begin(&collection);
        let files = self.intake.files().to_vec();
        let generator = self.uploader.generator();
        let client = self.client.clone();
        let tx = self.tx.clone();
        tracing::info!(collection = %collection, files = files.len(), generator = generator.as_str(), "upload started");
        tokio::spawn(async move {
            let result = client.upload(&collection, generator, &files).await;
            let _ = tx.send(SessionEvent::UploadFinished { collection, attempt, result });
        });
        true
    }

    // ---- databases ----

    /// Check or uncheck `id`, then push the whole selection.
    pub fn set_database_checked(&mut self, id: i64, checked: bool) {
        self.selector.set_checked(id, checked);
        self.pusher.push(self.selector.selected().to_vec());
    }

    pub fn toggle_database(&mut self, id: i64) {
        let checked = !self.selector.is_selected(id);
        self.set_database_checked(id, checked);
    }

    pub fn refresh_databases(&self) {
        spawn_refresh(self.client.clone(), self.tx.clone());
    }

    // ---- settings ----

    pub fn settings_panel(&self) -> Option<&SettingsPanel> { self.panel.as_ref() }

    pub fn settings_panel_mut(&mut self) -> Option<&mut SettingsPanel> { self.panel.as_mut() }

    pub fn toggle_settings(&mut self) {
        if let Some(panel) = self.panel.as_mut() {
            panel.toggle();
        }
    }

    pub fn save_settings(&mut self) -> Result<()> {
        let Some(panel) = self.panel.as_mut() else { return Ok(()) };
        panel.save(&mut self.settings, &mut self.storage)?;
        tracing::info!(settings = ?self.settings, "chat settings saved");
        Ok(())
    }

    /// Fetch the backend's defaults into the panel fields. Nothing is saved.
    pub fn pull_server_parameters(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let res = client.parameters().await;
            let _ = tx.send(SessionEvent::ServerParameters(res));
        });
    }

    // ---- events ----

    pub async fn next_event(&mut self) -> Option<SessionEvent> { self.rx.recv().await }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> { self.rx.try_recv().ok() }

    pub fn apply(&mut self, event: SessionEvent) -> Option<Notice> {
        match event {
            SessionEvent::ChatReplied(Ok(reply)) => {
                self.composer.end_request();
                let id = self.transcript.push_ai(reply.response.clone());
                spawn_reveal(id, reply.response, self.typing, self.tx.clone());
                self.composer.clear();
                None
            }
            SessionEvent::ChatReplied(Err(e)) => {
                self.composer.end_request();
                tracing::error!(error = %e, "chat request failed");
                Some(Notice::error(format!("Chat failed: {e}")))
            }
            SessionEvent::TypingAdvanced { entry, revealed } => {
                self.transcript.advance(entry, revealed);
                None
            }
            SessionEvent::UploadFinished { collection, attempt, result } => {
                let (state, succeeded) = match result {
                    Ok(UploadOutcome::Accepted(ack)) => (UploadState::Succeeded(ack.message), true),
                    Ok(UploadOutcome::Rejected { status, rejection }) => {
                        tracing::warn!(collection = %collection, status, error = %rejection.error, "upload rejected");
                        (UploadState::Failed(rejection.error), false)
                    }
                    Err(e) => {
                        tracing::warn!(collection = %collection, error = %e, "upload failed");
                        (UploadState::Failed(UPLOAD_FAILED.to_string()), false)
                    }
                };
                let current = self.uploader.finish(&collection, attempt, state);
                if succeeded {
                    // the collection exists server-side even if a newer attempt owns the line
                    self.refresh_databases();
                    if current {
                        self.intake.clear();
                        self.uploader.set_collection_name("");
                    }
                }
                None
            }
            SessionEvent::DatabasesListed(Ok(rows)) => {
                tracing::debug!(count = rows.len(), "database listing refreshed");
                self.selector.replace_listing(rows);
                None
            }
            SessionEvent::DatabasesListed(Err(e)) => {
                tracing::warn!(error = %e, "loading database list failed");
                None
            }
            SessionEvent::ServerParameters(Ok(p)) => {
                let panel = self.panel.as_mut()?;
                panel.fill_from(&p);
                Some(Notice::info("Server defaults loaded; save to keep them"))
            }
            SessionEvent::ServerParameters(Err(e)) => {
                tracing::warn!(error = %e, "loading server parameters failed");
                Some(Notice::warn("Could not load server defaults"))
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) { self.teardown(); }
}
