//! Player release identification

use crate::error::DecipherError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default origin for embed pages and player assets
pub const DEFAULT_ORIGIN: &str = "https://www.youtube.com";

/// One version of the player asset, addressed by its script path
/// (e.g. `/s/player/f676c671/player_ias.vflset/en_US/base.js`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerRelease {
    path: String,
}

impl PlayerRelease {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Locate the player script path inside an embed page.
    ///
    /// The page may carry the path JSON-escaped (`\/s\/player\/...`).
    pub fn from_embed_page(html: &str) -> Result<Self, DecipherError> {
        let unescaped = html.replace("\\/", "/");
        let basejs_regex = Regex::new(r"(/s/player/[\w-]+/player_ias\.vflset/[\w-]+/base\.js)")?;

        basejs_regex
            .captures(&unescaped)
            .and_then(|captures| captures.get(1))
            .map(|path| Self::new(path.as_str()))
            .ok_or_else(|| {
                DecipherError::AssetUnavailable(
                    "player script path not found in embed page".to_string(),
                )
            })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Short release hash, e.g. `f676c671`
    pub fn player_id(&self) -> Option<&str> {
        self.path
            .split("/s/player/")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .filter(|id| !id.is_empty())
    }

    /// Absolute asset URL under `origin`
    pub fn asset_url(&self, origin: &str) -> String {
        if self.path.starts_with("http://") || self.path.starts_with("https://") {
            return self.path.clone();
        }
        format!("{}{}", origin.trim_end_matches('/'), self.path)
    }
}

impl fmt::Display for PlayerRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Embed page URL for a video
pub fn embed_url(origin: &str, video_id: &str) -> String {
    format!("{}/embed/{}?hl=en", origin.trim_end_matches('/'), video_id)
}
