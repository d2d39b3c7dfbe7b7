//! Core of the playerctl remote: wire types, configuration, HTTP transport,
//! and the sans-IO controller that owns playlist, status and media-session
//! state.
//!
//! The controller never performs IO itself.  Every input returns a list of
//! [`request::Request`]s; the front end executes them (see
//! [`request::execute`]) and feeds the [`request::Completion`]s back in.

pub mod clipboard;
pub mod command;
pub mod config;
pub mod controller;
pub mod http;
pub mod media;
pub mod platform;
pub mod playlist;
pub mod protocol;
pub mod request;
pub mod scheduler;
pub mod status;
pub mod subscription;
pub mod transport;

pub use controller::{Controller, Notice, Severity};
pub use request::{Completion, Request};
