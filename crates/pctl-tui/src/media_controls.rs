//! OS media controls (MPRIS / SMTC / Now Playing) as the media platform.
//!
//! The registration doubles as the keep-alive: while it reports "playing"
//! the OS keeps routing media keys here.  Key presses come back as
//! `MediaIntent`s on an mpsc channel read by the app loop.

use pctl_core::config::MediaConfig;
use pctl_core::media::{MediaIntent, MediaPlatform, NoMediaPlatform};
use tokio::sync::mpsc::UnboundedSender;

/// Pick the platform for this build and configuration.
pub fn platform(
    config: &MediaConfig,
    tx: UnboundedSender<MediaIntent>,
) -> Box<dyn MediaPlatform> {
    if !config.enabled {
        return Box::new(NoMediaPlatform);
    }
    #[cfg(feature = "media-controls")]
    {
        Box::new(os::OsMediaControls::new(&config.display_name, tx))
    }
    #[cfg(not(feature = "media-controls"))]
    {
        drop(tx);
        tracing::info!("[media] built without media-controls");
        Box::new(NoMediaPlatform)
    }
}

#[cfg(feature = "media-controls")]
mod os {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use pctl_core::media::{
        KeepAlive, KeepAliveError, MediaIntent, MediaSessionSurface, SessionMetadata,
        SessionPlayback,
    };
    use souvlaki::{MediaControlEvent, MediaControls, MediaMetadata, MediaPlayback, PlatformConfig};
    use tokio::sync::mpsc::UnboundedSender;
    use tracing::{debug, info, warn};

    const DBUS_NAME: &str = "pctl_remote";

    pub struct OsMediaControls {
        controls: Option<MediaControls>,
        display_name: String,
        tx: UnboundedSender<MediaIntent>,
        /// Read by the event handler thread to resolve Toggle.
        playing: Arc<AtomicBool>,
        paused: bool,
    }

    impl OsMediaControls {
        pub fn new(display_name: &str, tx: UnboundedSender<MediaIntent>) -> Self {
            Self {
                controls: None,
                display_name: display_name.to_string(),
                tx,
                playing: Arc::new(AtomicBool::new(false)),
                paused: true,
            }
        }

        fn publish(&mut self, playback: MediaPlayback) -> Result<(), KeepAliveError> {
            let Some(controls) = self.controls.as_mut() else {
                return Err(KeepAliveError::InteractionRequired(
                    "media controls not registered".into(),
                ));
            };
            controls
                .set_playback(playback)
                .map_err(|e| KeepAliveError::InteractionRequired(format!("{:?}", e)))
        }

        #[cfg(not(target_os = "windows"))]
        fn create(&self) -> Result<MediaControls, KeepAliveError> {
            MediaControls::new(PlatformConfig {
                display_name: &self.display_name,
                dbus_name: DBUS_NAME,
                hwnd: None,
            })
            .map_err(|e| KeepAliveError::Unavailable(format!("{:?}", e)))
        }

        #[cfg(target_os = "windows")]
        fn create(&self) -> Result<MediaControls, KeepAliveError> {
            // SMTC needs a window handle; a console has none.
            Err(KeepAliveError::Unavailable(
                "SMTC requires a window handle".into(),
            ))
        }
    }

    impl KeepAlive for OsMediaControls {
        fn start(&mut self) -> Result<(), KeepAliveError> {
            if self.controls.is_none() {
                let mut controls = self.create()?;
                let tx = self.tx.clone();
                let playing = Arc::clone(&self.playing);
                controls
                    .attach(move |event| {
                        let now_playing = playing.load(Ordering::Relaxed);
                        if let Some(intent) = map_event(event, now_playing) {
                            let _ = tx.send(intent);
                        }
                    })
                    .map_err(|e| KeepAliveError::InteractionRequired(format!("{:?}", e)))?;
                info!("[media] registered as {}", self.display_name);
                self.controls = Some(controls);
            }
            self.play()
        }

        fn play(&mut self) -> Result<(), KeepAliveError> {
            self.publish(MediaPlayback::Playing { progress: None })?;
            self.paused = false;
            Ok(())
        }

        fn pause(&mut self) {
            if let Err(e) = self.publish(MediaPlayback::Paused { progress: None }) {
                debug!("[media] pause not published: {}", e);
            }
            self.paused = true;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    }

    impl MediaSessionSurface for OsMediaControls {
        fn set_playback_state(&mut self, state: SessionPlayback) {
            let playing = state == SessionPlayback::Playing;
            self.playing.store(playing, Ordering::Relaxed);
            let playback = if playing {
                MediaPlayback::Playing { progress: None }
            } else {
                MediaPlayback::Paused { progress: None }
            };
            if let Err(e) = self.publish(playback) {
                debug!("[media] playback state not published: {}", e);
            }
        }

        fn set_metadata(&mut self, metadata: &SessionMetadata) {
            let Some(controls) = self.controls.as_mut() else {
                return;
            };
            let result = controls.set_metadata(MediaMetadata {
                title: Some(metadata.title.as_str()),
                artist: Some(metadata.artist.as_str()),
                album: None,
                cover_url: metadata.artwork.as_deref(),
                duration: None,
            });
            if let Err(e) = result {
                warn!("[media] failed to publish metadata: {:?}", e);
            }
        }
    }

    pub(super) fn map_event(event: MediaControlEvent, playing: bool) -> Option<MediaIntent> {
        match event {
            MediaControlEvent::Play => Some(MediaIntent::Play),
            MediaControlEvent::Pause | MediaControlEvent::Stop => Some(MediaIntent::Pause),
            MediaControlEvent::Toggle => Some(if playing {
                MediaIntent::Pause
            } else {
                MediaIntent::Play
            }),
            MediaControlEvent::Next => Some(MediaIntent::Next),
            MediaControlEvent::Previous => Some(MediaIntent::Previous),
            _ => None,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_toggle_follows_playback() {
            assert_eq!(map_event(MediaControlEvent::Toggle, true), Some(MediaIntent::Pause));
            assert_eq!(map_event(MediaControlEvent::Toggle, false), Some(MediaIntent::Play));
        }

        #[test]
        fn test_transport_events() {
            assert_eq!(map_event(MediaControlEvent::Next, false), Some(MediaIntent::Next));
            assert_eq!(
                map_event(MediaControlEvent::Previous, false),
                Some(MediaIntent::Previous)
            );
            assert_eq!(map_event(MediaControlEvent::Stop, true), Some(MediaIntent::Pause));
            assert_eq!(map_event(MediaControlEvent::Raise, true), None);
        }

        #[test]
        fn test_unregistered_controls_defer_start_of_playback() {
            let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
            let mut c = OsMediaControls::new("PlayerCTL", tx);
            assert!(matches!(c.play(), Err(KeepAliveError::InteractionRequired(_))));
            assert!(c.is_paused());
            c.pause();
            assert!(c.is_paused());
        }
    }
}
