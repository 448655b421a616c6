//! Singleton site content blocks.
//!
//! Each block is one JSON document stored under a well-known key. Only the
//! settings block has a schema the backend reads; the others are passed
//! through to the frontend as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::ParseEnumError;

/// Well-known content block keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKey {
    /// Hero banner
    Hero,
    /// Prize image carousel
    PrizeCarousel,
    /// Scrolling info ticker
    InfoTicker,
    /// Site settings ([`SiteSettings`])
    Settings,
}

impl ContentKey {
    /// All keys
    pub const ALL: [Self; 4] = [Self::Hero, Self::PrizeCarousel, Self::InfoTicker, Self::Settings];

    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::PrizeCarousel => "prize_carousel",
            Self::InfoTicker => "info_ticker",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("content key", s))
    }
}

/// A stored content document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Which block
    pub key: ContentKey,
    /// Document body
    pub body: serde_json::Value,
    /// Last replacement
    pub updated_at: DateTime<Utc>,
}

/// Typed view of the settings block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Title shown in the page header
    pub site_title: Option<String>,
    /// Number the WhatsApp handoff link opens a chat with
    pub whatsapp_number: Option<String>,
}
