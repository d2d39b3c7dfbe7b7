//! Now-playing display state fed by the periodic status tick.

use tracing::{debug, warn};

use crate::media::SessionMetadata;
use crate::protocol::{CommandReply, PlaybackStatus, TrackMetadata};
use crate::transport::TransportError;

/// Everything the header and progress bar draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusView {
    pub status: PlaybackStatus,
    pub title: String,
    pub artist: String,
    pub thumbnail: Option<String>,
    /// Bumped each time the thumbnail URL actually changes.
    pub thumbnail_generation: u64,
    pub seek_max: f64,
    pub seek_value: f64,
    pub volume: Option<f64>,
}

impl StatusView {
    pub fn thumbnail_visible(&self) -> bool {
        self.thumbnail.is_some()
    }
}

#[derive(Debug, Default)]
pub struct StatusPoller {
    view: StatusView,
    seeking: bool,
    /// Last value seen by the playback probe.
    playing: bool,
}

impl StatusPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &StatusView {
        &self.view
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn apply_status(&mut self, reply: &CommandReply) {
        self.view.status = PlaybackStatus::from_reply(reply);
    }

    /// Apply a metadata reply.  Returns the session metadata when the
    /// title, artist or artwork changed so the caller can mirror it.
    pub fn apply_metadata(
        &mut self,
        result: Result<TrackMetadata, TransportError>,
    ) -> Option<SessionMetadata> {
        let meta = match result {
            Ok(m) => m,
            Err(e) => {
                warn!("[status] metadata fetch failed: {}", e);
                return None;
            }
        };

        let changed = self.view.title != meta.title
            || self.view.artist != meta.artist
            || self.view.thumbnail != meta.thumbnail;

        self.view.title = meta.title;
        self.view.artist = meta.artist;
        if self.view.thumbnail != meta.thumbnail {
            self.view.thumbnail = meta.thumbnail;
            self.view.thumbnail_generation += 1;
        }

        self.view.seek_max = meta.length.max(0.0);
        if !self.seeking {
            self.view.seek_value = meta.position.max(0.0);
        }

        changed.then(|| SessionMetadata {
            title: self.view.title.clone(),
            artist: self.view.artist.clone(),
            artwork: self.view.thumbnail.clone(),
        })
    }

    pub fn apply_volume(&mut self, result: Result<f64, TransportError>) {
        match result {
            Ok(v) => self.view.volume = Some(v),
            Err(e) => warn!("[status] volume fetch failed: {}", e),
        }
    }

    /// Record the probe's view of playback.  Returns true on an edge.
    pub fn observe_playing(&mut self, playing: bool) -> bool {
        if playing == self.playing {
            return false;
        }
        debug!("[status] playback edge: playing={}", playing);
        self.playing = playing;
        true
    }

    // ── Seek gesture ───────────────────────────────────────────────────────────

    pub fn begin_seek(&mut self) {
        self.seeking = true;
    }

    /// Move the displayed seek value during a gesture.
    pub fn scrub_seek(&mut self, value: f64) {
        if !self.seeking {
            return;
        }
        let max = if self.view.seek_max > 0.0 {
            self.view.seek_max
        } else {
            f64::MAX
        };
        self.view.seek_value = value.clamp(0.0, max);
    }

    /// Finish the gesture; returns the position to seek to.
    pub fn end_seek(&mut self) -> Option<f64> {
        if !self.seeking {
            return None;
        }
        self.seeking = false;
        Some(self.view.seek_value)
    }

    pub fn cancel_seek(&mut self) {
        self.seeking = false;
    }

    /// Optimistic local volume update while a set request is in flight.
    pub fn set_local_volume(&mut self, value: f64) {
        self.view.volume = Some(value);
    }
}
