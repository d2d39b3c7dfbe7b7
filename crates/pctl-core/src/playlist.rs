//! Client-side copy of the shared Syncplay playlist.
//!
//! The backend owns the playlist.  We keep two copies: `entries` (what the
//! user sees and edits) and `server_entries` (the last order known to be on
//! the backend).  While `dirty` or `dragging` is set, refresh replies are
//! discarded so a background poll never clobbers a local edit.  Both flags
//! are checked when a reply is applied, not when it was requested, because
//! the user may start editing while a fetch is in flight.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::clipboard::{normalize_entry, InsertError};
use crate::command::{step_index, Direction};
use crate::config::CommitPolicy;
use crate::protocol::PlaylistSnapshot;
use crate::request::Request;
use crate::transport::TransportError;

pub const FETCH_ERROR_PLACEHOLDER: &str = "Error fetching playlist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRow {
    pub index: usize,
    pub text: String,
    pub is_current: bool,
}

/// Rows for display.  Entries are matched against `current` by content, so
/// every duplicate of the current entry is marked.
pub fn render(entries: &[String], current: Option<&str>) -> Vec<PlaylistRow> {
    entries
        .iter()
        .enumerate()
        .map(|(index, text)| PlaylistRow {
            index,
            text: text.clone(),
            is_current: current == Some(text.as_str()),
        })
        .collect()
}

/// What happened to a refresh reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Local edits or a drag were in progress; the reply was dropped.
    Discarded,
    Failed,
}

/// Double-tap detector.  A tap arms a window; a second tap on the same entry
/// inside it fires, anything else re-arms.
#[derive(Debug, Clone)]
pub struct TapTracker {
    window: Duration,
    last: Option<(usize, Instant)>,
}

impl TapTracker {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn tap(&mut self, index: usize, at: Instant) -> bool {
        match self.last {
            Some((prev, armed_at))
                if prev == index && at.saturating_duration_since(armed_at) < self.window =>
            {
                self.last = None;
                true
            }
            _ => {
                self.last = Some((index, at));
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Debug)]
pub struct PlaylistSync {
    entries: Vec<String>,
    server_entries: Vec<String>,
    current: Option<String>,
    dirty: bool,
    dragging: bool,
    drag_origin: Vec<String>,
    fetch_failed: bool,
    loaded: bool,
    policy: CommitPolicy,
    taps: TapTracker,
}

impl PlaylistSync {
    pub fn new(policy: CommitPolicy, double_tap: Duration) -> Self {
        Self {
            entries: Vec::new(),
            server_entries: Vec::new(),
            current: None,
            dirty: false,
            dragging: false,
            drag_origin: Vec::new(),
            fetch_failed: false,
            loaded: false,
            policy,
            taps: TapTracker::new(double_tap),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────────

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn server_entries(&self) -> &[String] {
        &self.server_entries
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Position of the first entry equal to the current item.
    pub fn current_index(&self) -> Option<usize> {
        let current = self.current.as_deref()?;
        self.entries.iter().position(|e| e == current)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Inline placeholder to show instead of the rows, if any.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.fetch_failed.then_some(FETCH_ERROR_PLACEHOLDER)
    }

    pub fn rows(&self) -> Vec<PlaylistRow> {
        render(&self.entries, self.current.as_deref())
    }

    // ── Refresh ────────────────────────────────────────────────────────────────

    /// Request for a scheduled refresh, or `None` while edits are pending or a
    /// drag is in progress.
    pub fn refresh_request(&self) -> Option<Request> {
        if self.dirty || self.dragging {
            debug!(
                "[playlist] refresh skipped (dirty={}, dragging={})",
                self.dirty, self.dragging
            );
            return None;
        }
        Some(Request::FetchPlaylist)
    }

    pub fn apply_refresh(
        &mut self,
        result: Result<PlaylistSnapshot, TransportError>,
    ) -> RefreshOutcome {
        let guarded = self.dirty || self.dragging;
        match result {
            Ok(_) if guarded => {
                debug!("[playlist] refresh reply discarded, local edits pending");
                RefreshOutcome::Discarded
            }
            Ok(snapshot) => {
                self.server_entries = snapshot.entries.clone();
                self.entries = snapshot.entries;
                self.current = snapshot.current;
                self.fetch_failed = false;
                self.loaded = true;
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!("[playlist] error fetching playlist: {}", e);
                // The placeholder would hide a locally edited list.
                if !guarded {
                    self.fetch_failed = true;
                }
                RefreshOutcome::Failed
            }
        }
    }

    // ── Drag reorder ───────────────────────────────────────────────────────────

    pub fn drag_start(&mut self) {
        if self.dragging {
            return;
        }
        self.dragging = true;
        self.drag_origin = self.entries.clone();
        self.taps.reset();
    }

    /// Move the entry at `from` to position `to` in the displayed list.
    /// Ignored outside a drag or with an out-of-range index.
    pub fn drag_move(&mut self, from: usize, to: usize) -> bool {
        if !self.dragging || from >= self.entries.len() || to >= self.entries.len() {
            return false;
        }
        if from != to {
            let item = self.entries.remove(from);
            self.entries.insert(to, item);
        }
        true
    }

    /// End the gesture.  Returns a commit request under the immediate policy
    /// when the order changed.
    pub fn drag_end(&mut self) -> Option<Request> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        let changed = self.entries != std::mem::take(&mut self.drag_origin);
        if !changed {
            return None;
        }
        self.local_edit()
    }

    // ── Local edits ────────────────────────────────────────────────────────────

    /// Append trimmed `text`.  Blank input is rejected.
    pub fn insert_text(&mut self, text: &str) -> Result<Option<Request>, InsertError> {
        let entry = normalize_entry(text)?;
        info!("[playlist] appended {:?}", entry);
        self.entries.push(entry);
        Ok(self.local_edit())
    }

    /// Marks dirty under both policies; an immediate commit clears it once
    /// the backend accepts the order, so refreshes stay guarded meanwhile.
    fn local_edit(&mut self) -> Option<Request> {
        self.dirty = true;
        match self.policy {
            CommitPolicy::Batched => None,
            CommitPolicy::Immediate => Some(self.commit_request()),
        }
    }

    /// Push the displayed order to the backend.
    pub fn commit_request(&self) -> Request {
        Request::CommitPlaylist {
            entries: self.entries.clone(),
        }
    }

    /// Apply a commit reply for the order `sent`.  Dirty stays set only if the
    /// displayed order moved on while the commit was in flight.
    pub fn apply_commit(
        &mut self,
        sent: Vec<String>,
        result: Result<(), TransportError>,
    ) -> Result<(), TransportError> {
        match result {
            Ok(()) => {
                self.server_entries = sent;
                self.dirty = self.entries != self.server_entries;
                info!(
                    "[playlist] order committed ({} entries, dirty={})",
                    self.server_entries.len(),
                    self.dirty
                );
                Ok(())
            }
            Err(e) => {
                warn!("[playlist] error updating playlist order: {}", e);
                self.dirty = self.entries != self.server_entries;
                Err(e)
            }
        }
    }

    /// Drop local edits and show the last known backend order again.
    pub fn revert(&mut self) -> bool {
        if self.dragging || !self.dirty {
            return false;
        }
        self.entries = self.server_entries.clone();
        self.dirty = false;
        true
    }

    // ── Jumps ──────────────────────────────────────────────────────────────────

    /// Jump to displayed row `index`.  The backend resolves indices against
    /// its own order, so with unstaged edits the row is mapped onto
    /// `server_entries` first; an entry the backend doesn't have yet is
    /// not jumpable.
    pub fn jump_to_index(&self, index: usize) -> Option<Request> {
        if index >= self.entries.len() {
            debug!("[playlist] jump to {} ignored ({} entries)", index, self.entries.len());
            return None;
        }
        let Some(target) = self.backend_index(index) else {
            info!("[playlist] jump to {} ignored, entry not committed yet", index);
            return None;
        };
        if target != index {
            debug!("[playlist] row {} is backend index {}", index, target);
        }
        Some(Request::SetIndex { index: target })
    }

    /// Jump one step from the current entry in backend order, wrapping around.
    pub fn step(&self, direction: Direction) -> Option<Request> {
        let current = self
            .current
            .as_deref()
            .and_then(|c| self.server_entries.iter().position(|e| e == c));
        let index = step_index(self.server_entries.len(), current, direction)?;
        Some(Request::SetIndex { index })
    }

    /// Backend position of displayed row `index`.  Duplicates map to the
    /// same occurrence on both sides.
    fn backend_index(&self, index: usize) -> Option<usize> {
        let entry = self.entries.get(index)?;
        if self.entries == self.server_entries {
            return Some(index);
        }
        let nth = self.entries[..index].iter().filter(|e| *e == entry).count();
        self.server_entries
            .iter()
            .enumerate()
            .filter(|(_, e)| *e == entry)
            .nth(nth)
            .map(|(i, _)| i)
    }

    /// A tap on row `index`; the second tap inside the window jumps.
    pub fn tap(&mut self, index: usize, at: Instant) -> Option<Request> {
        if index >= self.entries.len() || self.dragging {
            return None;
        }
        if self.taps.tap(index, at) {
            self.jump_to_index(index)
        } else {
            None
        }
    }

    pub fn apply_set_index(
        &mut self,
        index: usize,
        result: Result<(), TransportError>,
    ) -> Result<(), TransportError> {
        match result {
            Ok(()) => {
                if let Some(entry) = self.server_entries.get(index) {
                    self.current = Some(entry.clone());
                }
                Ok(())
            }
            Err(e) => {
                warn!("[playlist] error setting index {}: {}", index, e);
                Err(e)
            }
        }
    }
}
