//! Where embed pages and player assets come from

use crate::error::DecipherError;
use crate::platform::client::{HttpClientConfig, PlayerClient};
use crate::platform::player::{embed_url, PlayerRelease};
use async_trait::async_trait;
use tracing::debug;

/// Fetches the two documents the resolver needs.
///
/// Implementations must not retry; transient failures go back to the caller.
#[async_trait]
pub trait PlayerSource: Send + Sync {
    /// Raw HTML of the embed page for `video_id`
    async fn fetch_embed_page(&self, video_id: &str) -> Result<String, DecipherError>;

    /// Raw player code for `release`
    async fn fetch_player_asset(&self, release: &PlayerRelease) -> Result<String, DecipherError>;
}

/// [`PlayerSource`] backed by HTTP
#[derive(Debug, Clone)]
pub struct HttpPlayerSource {
    client: PlayerClient,
}

impl HttpPlayerSource {
    pub fn new(config: HttpClientConfig) -> Result<Self, DecipherError> {
        Ok(Self {
            client: PlayerClient::with_config(config)?,
        })
    }

    pub fn from_client(client: PlayerClient) -> Self {
        Self { client }
    }

    fn origin(&self) -> &str {
        &self.client.config().origin
    }
}

#[async_trait]
impl PlayerSource for HttpPlayerSource {
    async fn fetch_embed_page(&self, video_id: &str) -> Result<String, DecipherError> {
        let url = embed_url(self.origin(), video_id);
        debug!("Fetching embed page for {}", video_id);
        self.client.get_text(&url).await
    }

    async fn fetch_player_asset(&self, release: &PlayerRelease) -> Result<String, DecipherError> {
        let url = release.asset_url(self.origin());
        debug!("Fetching player asset {}", release);
        self.client.get_text(&url).await
    }
}
