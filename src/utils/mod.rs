use regex::Regex;
use std::sync::LazyLock;

/// Filename offered when saving a resolved video
pub const DEFAULT_VIDEO_FILENAME: &str = "instagram-video.mp4";

static INSTAGRAM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(www\.)?instagram\.com/(p|reel|reels)/[a-z0-9_-]+/?(\?.*)?$")
        .expect("instagram url pattern is valid")
});

/// Check whether the input is a link to an Instagram post or reel
pub fn is_valid_instagram_url(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    INSTAGRAM_URL.is_match(trimmed)
}

/// Render a 0-100 progress value for status lines
pub fn percent_label(percent: f32) -> String {
    format!("{:.0}%", percent.clamp(0.0, 100.0))
}
