//! Video ID helpers for CLI input

use crate::error::DecipherError;
use url::Url;

/// Check that `id` is non-empty and safe to place in an embed URL path
pub fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Extract a video ID from a raw ID or a watch, short or embed URL
pub fn extract_video_id(input: &str) -> Result<String, DecipherError> {
    let input = input.trim();
    if is_valid_video_id(input) {
        return Ok(input.to_string());
    }

    let parsed =
        Url::parse(input).map_err(|e| DecipherError::InvalidVideoId(format!("{}: {}", input, e)))?;

    let id = match parsed.host_str() {
        Some("youtu.be") => Some(parsed.path().trim_start_matches('/').to_string()),
        Some("youtube.com") | Some("www.youtube.com") | Some("m.youtube.com") => {
            let path = parsed.path();
            if path.starts_with("/watch") {
                parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.to_string())
            } else {
                ["/shorts/", "/embed/"]
                    .iter()
                    .find_map(|prefix| path.strip_prefix(prefix))
                    .map(|id| id.trim_end_matches('/').to_string())
            }
        }
        _ => {
            return Err(DecipherError::InvalidVideoId(format!(
                "not a supported video URL: {}",
                input
            )))
        }
    };

    match id {
        Some(id) if is_valid_video_id(&id) => Ok(id),
        _ => Err(DecipherError::InvalidVideoId(format!(
            "no video ID in {}",
            input
        ))),
    }
}
