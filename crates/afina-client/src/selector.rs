//! Database checklist: the local selection, the last listing, the background
//! push worker and the periodic refresh loop.

use afina_types::DatabaseEntry;
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::BackendClient;
use crate::session::SessionEvent;

pub const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
pub struct DatabaseSelector {
    selected: Vec<i64>,
    listing: Vec<DatabaseEntry>,
    cursor: usize,
    refreshed_at: Option<DateTime<Local>>,
}

impl DatabaseSelector {
    pub fn new() -> Self { Self::default() }

    /// Selected ids in the order they were checked.
    pub fn selected(&self) -> &[i64] { &self.selected }

    pub fn is_selected(&self, id: i64) -> bool { self.selected.contains(&id) }

    /// Idempotent add/remove. Returns whether the set changed.
    pub fn set_checked(&mut self, id: i64, checked: bool) -> bool {
        match (checked, self.selected.iter().position(|s| *s == id)) {
            (true, None) => {
                self.selected.push(id);
                true
            }
            (false, Some(i)) => {
                self.selected.remove(i);
                true
            }
            _ => false,
        }
    }

    /// Listing rows with their checkbox state.
    pub fn rows(&self) -> impl Iterator<Item = (&DatabaseEntry, bool)> + '_ {
        self.listing.iter().map(|e| (e, self.is_selected(e.id)))
    }

    pub fn listing(&self) -> &[DatabaseEntry] { &self.listing }

    /// Rebuild from a fresh listing. Selected ids absent from it stay selected.
    pub fn replace_listing(&mut self, rows: Vec<DatabaseEntry>) {
        self.listing = rows;
        self.cursor = self.cursor.min(self.listing.len().saturating_sub(1));
        self.refreshed_at = Some(Local::now());
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> { self.refreshed_at }

    pub fn cursor(&self) -> usize { self.cursor }

    pub fn current(&self) -> Option<&DatabaseEntry> { self.listing.get(self.cursor) }

    pub fn move_up(&mut self) { self.cursor = self.cursor.saturating_sub(1); }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.listing.len() {
            self.cursor += 1;
        }
    }
}

/// Single background worker sending whole-set snapshots in order.
///
/// A burst of toggles collapses to its newest snapshot.
pub struct SelectionPusher {
    tx: mpsc::UnboundedSender<Vec<i64>>,
}

impl SelectionPusher {
    pub fn spawn(client: BackendClient) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<i64>>();
        tokio::spawn(async move {
            while let Some(mut snapshot) = rx.recv().await {
                while let Ok(newer) = rx.try_recv() {
                    snapshot = newer;
                }
                match client.push_selection(&snapshot).await {
                    Ok(()) => tracing::debug!(selected = ?snapshot, "selection pushed"),
                    Err(e) => tracing::warn!(error = %e, selected = ?snapshot, "selection push failed"),
                }
            }
        });
        Self { tx }
    }

    pub fn push(&self, snapshot: Vec<i64>) {
        if self.tx.send(snapshot).is_err() {
            tracing::warn!("selection worker has stopped");
        }
    }
}

/// Periodic listing fetch. The first fetch happens immediately.
pub struct RefreshLoop {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl RefreshLoop {
    pub fn start(client: BackendClient, every: Duration, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let listing = client.list_databases().await;
                        if events.send(SessionEvent::DatabasesListed(listing)).is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("refresh loop stopped");
        });
        Self { stop_tx: Some(stop_tx), handle }
    }

    pub fn is_running(&self) -> bool { self.stop_tx.is_some() && !self.handle.is_finished() }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.stop();
        self.handle.abort();
    }
}

/// One extra listing fetch outside the loop.
pub(crate) fn spawn_refresh(client: BackendClient, events: mpsc::UnboundedSender<SessionEvent>) {
    tokio::spawn(async move {
        let listing = client.list_databases().await;
        let _ = events.send(SessionEvent::DatabasesListed(listing));
    });
}
