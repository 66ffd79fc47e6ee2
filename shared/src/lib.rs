//! Types shared between the A2S query client and the status monitor.
//!
//! Holds the server snapshot returned by a query, the game specific extra
//! data parsed out of its keyword string, the template renderer used to
//! produce channel texts, and the fingerprint used for change detection.

pub mod keywords;
pub mod template;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

pub use keywords::{Arma3Keywords, DayZKeywords, GameExtra};
pub use template::{Renderer, TemplateError};

/// Maximum length of a channel description, in characters.
pub const DESCRIPTION_LIMIT: usize = 1024;
/// Maximum length of the presence status text, in characters.
pub const PRESENCE_LIMIT: usize = 128;
/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

pub const APP_ID_DAYZ: u64 = 221100;
pub const APP_ID_DAYZ_EXP: u64 = 1024020;
pub const APP_ID_ARMA3: u64 = 107410;

/// Snapshot of a game server as reported by an A2S_INFO response.
///
/// Field names are exposed to templates in PascalCase (`.Info.Players`,
/// `.Info.MaxPlayers`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerInfo {
    pub protocol: u8,
    pub name: String,
    pub map: String,
    pub folder: String,
    pub game: String,
    /// 16 bit Steam application id
    #[serde(rename = "ID")]
    pub id: u16,
    pub players: u8,
    pub max_players: u8,
    pub bots: u8,
    pub server_type: char,
    pub environment: char,
    pub visibility: bool,
    #[serde(rename = "VAC")]
    pub vac: bool,
    pub version: String,
    pub port: Option<u16>,
    #[serde(rename = "SteamID")]
    pub steam_id: Option<u64>,
    pub spectator_port: Option<u16>,
    pub spectator_name: Option<String>,
    pub keywords: Option<String>,
    #[serde(rename = "GameID")]
    pub game_id: Option<u64>,
    /// Round trip of the query in milliseconds
    pub ping: u64,
}

impl ServerInfo {
    /// Returns the full application id.
    ///
    /// The 16 bit `id` field cannot hold newer app ids, so the low 24 bits of
    /// the 64 bit game id win whenever the server reports one.
    pub fn app_id(&self) -> u64 {
        match self.game_id {
            Some(game_id) if game_id & 0xFF_FFFF != 0 => game_id & 0xFF_FFFF,
            _ => u64::from(self.id),
        }
    }

    /// Parses the game specific keyword data, if the game is known.
    pub fn extra(&self) -> Option<GameExtra> {
        GameExtra::parse(self.app_id(), self.keywords.as_deref().unwrap_or_default())
    }
}

/// 64 bit change detection fingerprint of a rendered name/description pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    pub fn of(name: &str, description: &str) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(name.as_bytes());
        // Separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update(&[0]);
        hasher.update(description.as_bytes());
        Fingerprint(hasher.digest())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Truncates `text` to at most `limit` characters, replacing the tail with
/// [`ELLIPSIS`] when anything was cut.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let keep = limit.saturating_sub(ELLIPSIS.chars().count());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
