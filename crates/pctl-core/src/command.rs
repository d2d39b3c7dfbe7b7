//! Remote command client: turns transport, volume and seek commands for the
//! selected player into requests, and decides when next/previous become a
//! playlist jump instead.

use crate::config::JumpRedirect;
use crate::protocol::Command;
use crate::request::Request;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// What `send_command` should do with a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Send(Request),
    Jump(Direction),
}

#[derive(Debug, Clone)]
pub struct CommandClient {
    player: String,
    redirect: JumpRedirect,
}

impl CommandClient {
    pub fn new(player: impl Into<String>, redirect: JumpRedirect) -> Self {
        Self {
            player: player.into(),
            redirect,
        }
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn set_player(&mut self, player: impl Into<String>) {
        self.player = player.into();
    }

    pub fn redirect(&self) -> &JumpRedirect {
        &self.redirect
    }

    pub fn route(&self, command: Command) -> Route {
        let direction = match command {
            Command::Next => Some(Direction::Next),
            Command::Previous => Some(Direction::Previous),
            _ => None,
        };
        match direction {
            Some(d) if self.redirect.applies_to(&self.player) => Route::Jump(d),
            _ => Route::Send(self.command(command)),
        }
    }

    /// The request for `command`, never redirected.
    pub fn command(&self, command: Command) -> Request {
        Request::Command {
            player: self.player.clone(),
            command,
        }
    }

    pub fn set_volume(&self, value: f64) -> Request {
        Request::SetVolume {
            player: self.player.clone(),
            value: clamp_volume(value),
        }
    }

    pub fn seek(&self, delta_secs: i64) -> Request {
        Request::Seek {
            player: self.player.clone(),
            delta_secs,
        }
    }

    pub fn seek_absolute(&self, position_secs: f64) -> Request {
        Request::SeekAbsolute {
            player: self.player.clone(),
            position_secs: position_secs.max(0.0).round() as u64,
        }
    }

    pub fn metadata(&self) -> Request {
        Request::Metadata {
            player: self.player.clone(),
        }
    }

    pub fn volume(&self) -> Request {
        Request::Volume {
            player: self.player.clone(),
        }
    }

    pub fn playback_probe(&self) -> Request {
        Request::PlaybackProbe {
            player: self.player.clone(),
        }
    }
}

fn clamp_volume(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Index reached by stepping once from `current` in a list of `len` entries,
/// wrapping at both ends.  With no current entry, next lands on the first
/// entry and previous on the last.
pub fn step_index(len: usize, current: Option<usize>, direction: Direction) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (current, direction) {
        (None, Direction::Next) => 0,
        (None, Direction::Previous) => len - 1,
        (Some(i), Direction::Next) => (i + 1) % len,
        (Some(i), Direction::Previous) => (i + len - 1) % len,
    })
}
