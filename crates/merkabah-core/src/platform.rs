//! Static catalog of supported source platforms.
//!
//! Each platform reports a fixed capability descriptor. Nothing here talks to
//! a platform; the catalog only tells the operator which export formats and
//! data types the pipeline is prepared to receive.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Platform {0} not supported")]
    Unsupported(String),
}

/// A source platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Discord,
    Telegram,
    X,
    Facebook,
    Instagram,
    Reddit,
    LinkedIn,
    TikTok,
    Twitch,
    YouTube,
    Mastodon,
    BlueSky,
}

/// What a platform's extractor can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCapabilities {
    pub platform: &'static str,
    pub status: &'static str,
    pub methods: &'static [&'static str],
    pub data_types: &'static [&'static str],
}

impl Platform {
    pub const ALL: [Platform; 12] = [
        Platform::Discord,
        Platform::Telegram,
        Platform::X,
        Platform::Facebook,
        Platform::Instagram,
        Platform::Reddit,
        Platform::LinkedIn,
        Platform::TikTok,
        Platform::Twitch,
        Platform::YouTube,
        Platform::Mastodon,
        Platform::BlueSky,
    ];

    /// Lower-case key used on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Platform::Discord => "discord",
            Platform::Telegram => "telegram",
            Platform::X => "x",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Reddit => "reddit",
            Platform::LinkedIn => "linkedin",
            Platform::TikTok => "tiktok",
            Platform::Twitch => "twitch",
            Platform::YouTube => "youtube",
            Platform::Mastodon => "mastodon",
            Platform::BlueSky => "bluesky",
        }
    }

    pub fn capabilities(self) -> PlatformCapabilities {
        let (platform, methods, data_types): (_, &'static [&'static str], &'static [&'static str]) =
            match self {
                Platform::Discord => (
                    "Discord",
                    &["json_export", "api_token"],
                    &["messages", "reactions", "threads", "voice_logs"],
                ),
                Platform::Telegram => (
                    "Telegram",
                    &["json_export", "api_token", "local_database"],
                    &["messages", "media", "stickers", "channels", "groups"],
                ),
                Platform::X => (
                    "X",
                    &["api_v2", "archive_export", "web_scrape"],
                    &["tweets", "replies", "retweets", "likes", "bookmarks", "dms"],
                ),
                Platform::Facebook => (
                    "Facebook",
                    &["data_export", "api_token", "graph_api"],
                    &["posts", "comments", "messages", "reactions", "photos"],
                ),
                Platform::Instagram => (
                    "Instagram",
                    &["data_export", "api_token", "graph_api"],
                    &["posts", "comments", "dms", "stories", "reels", "likes"],
                ),
                Platform::Reddit => (
                    "Reddit",
                    &["api_token", "pushshift_api", "web_scrape"],
                    &["posts", "comments", "awards", "saved", "subscriptions"],
                ),
                Platform::LinkedIn => (
                    "LinkedIn",
                    &["data_export", "api_token"],
                    &["posts", "comments", "messages", "connections", "endorsements"],
                ),
                Platform::TikTok => (
                    "TikTok",
                    &["api_token", "data_export", "web_scrape"],
                    &["videos", "comments", "likes", "bookmarks", "messages"],
                ),
                Platform::Twitch => (
                    "Twitch",
                    &["api_token", "chat_logs"],
                    &["chat_messages", "clips", "vods", "follows", "subscriptions"],
                ),
                Platform::YouTube => (
                    "YouTube",
                    &["api_token", "transcript_api"],
                    &["comments", "transcripts", "metadata", "likes", "playlists"],
                ),
                Platform::Mastodon => (
                    "Mastodon",
                    &["api_token", "instance_api"],
                    &["toots", "replies", "boosts", "favorites", "dms"],
                ),
                Platform::BlueSky => (
                    "BlueSky",
                    &["api_token", "firehose"],
                    &["posts", "replies", "reposts", "likes", "follows"],
                ),
            };

        PlatformCapabilities {
            platform,
            status: "ready",
            methods,
            data_types,
        }
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlatformError::Unsupported(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_is_ready() {
        for platform in Platform::ALL {
            let caps = platform.capabilities();
            assert_eq!(caps.status, "ready");
            assert!(!caps.methods.is_empty());
            assert!(!caps.data_types.is_empty());
        }
    }

    #[test]
    fn test_parse_platform() {
        assert_eq!("Discord".parse::<Platform>().unwrap(), Platform::Discord);
        assert_eq!("x".parse::<Platform>().unwrap(), Platform::X);
        assert_eq!(
            "myspace".parse::<Platform>(),
            Err(PlatformError::Unsupported("myspace".to_string()))
        );
    }

    #[test]
    fn test_keys_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(platform.key().parse::<Platform>().unwrap(), platform);
        }
    }
}
