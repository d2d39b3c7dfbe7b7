//! reqwest implementation of [`CommandTransport`] against the playerctl web
//! backend.
//!
//! Per-player routes always carry `?player={id}`, even when the identifier is
//! empty; the backend treats an empty value as "default player".
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::protocol::{
    Command, CommandReply, CurrentItemReply, ErrorReply, PlaylistBody, SetIndexBody,
    TrackMetadata, VolumeReply,
};
use crate::transport::{CommandTransport, TransportError};

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut h = reqwest::header::HeaderMap::new();
                h.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                h
            })
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}/api/{}", self.base_url, route)
    }

    fn player_get(&self, route: &str, player: &str) -> RequestBuilder {
        self.client.get(self.url(route)).query(&[("player", player)])
    }

    async fn post<B: Serialize + ?Sized>(&self, route: &str, body: &B) -> Result<(), TransportError> {
        let response = self.client.post(self.url(route)).json(body).send().await?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }
}

// ── Response decoding ─────────────────────────────────────────────────────────

/// Turn a non-2xx reply into [`TransportError::Backend`], preferring the
/// backend's `{error}` message over the bare status line.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let url = response.url().path().to_string();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorReply>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
        return Err(TransportError::Backend {
            status: status.as_u16(),
            message,
        });
    }

    debug!("[http] {} -> {}", url, body.trim());
    serde_json::from_str(&body).map_err(|e| TransportError::Decode(format!("{url}: {e}")))
}

// ── Routes ────────────────────────────────────────────────────────────────────

#[async_trait]
impl CommandTransport for HttpTransport {
    async fn command(
        &self,
        player: &str,
        command: Command,
    ) -> Result<CommandReply, TransportError> {
        let response = self.player_get(command.as_str(), player).send().await?;
        decode(response).await
    }

    async fn metadata(&self, player: &str) -> Result<TrackMetadata, TransportError> {
        let response = self.player_get("metadata", player).send().await?;
        decode(response).await
    }

    async fn volume(&self, player: &str) -> Result<f64, TransportError> {
        let response = self.player_get("volume", player).send().await?;
        let reply: VolumeReply = decode(response).await?;
        Ok(reply.volume)
    }

    async fn set_volume(&self, player: &str, value: f64) -> Result<CommandReply, TransportError> {
        // The route only matches a float with a decimal point.
        let route = format!("volume/{:.2}", value);
        let response = self.player_get(&route, player).send().await?;
        decode(response).await
    }

    async fn seek(&self, player: &str, delta_secs: i64) -> Result<CommandReply, TransportError> {
        let response = self
            .player_get(&format!("seek/{delta_secs}"), player)
            .send()
            .await?;
        decode(response).await
    }

    async fn seek_absolute(
        &self,
        player: &str,
        position_secs: u64,
    ) -> Result<CommandReply, TransportError> {
        let response = self
            .player_get(&format!("seek_absolute/{position_secs}"), player)
            .send()
            .await?;
        decode(response).await
    }

    async fn playlist(&self) -> Result<Vec<String>, TransportError> {
        let response = self.client.get(self.url("syncplay_playlist")).send().await?;
        let body: PlaylistBody = decode(response).await?;
        Ok(body.playlist)
    }

    async fn current_item(&self) -> Result<Option<String>, TransportError> {
        let response = self.client.get(self.url("syncplay_current")).send().await?;
        let reply: CurrentItemReply = decode(response).await?;
        Ok(reply.current_item)
    }

    async fn set_playlist(&self, entries: &[String]) -> Result<(), TransportError> {
        self.post(
            "syncplay_playlist",
            &PlaylistBody {
                playlist: entries.to_vec(),
            },
        )
        .await
    }

    async fn set_index(&self, index: usize) -> Result<(), TransportError> {
        self.post("syncplay_set_index", &SetIndexBody { index }).await
    }

    async fn players(&self) -> Result<Vec<String>, TransportError> {
        let response = self.client.get(self.url("players")).send().await?;
        let players: Vec<String> = decode(response).await?;
        Ok(players.into_iter().filter(|p| !p.trim().is_empty()).collect())
    }
}
