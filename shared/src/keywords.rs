//! Game specific data carried in the A2S keyword string.

use crate::{APP_ID_ARMA3, APP_ID_DAYZ, APP_ID_DAYZ_EXP};
use serde::Serialize;

/// Extra data exposed to templates as `.Extra`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GameExtra {
    DayZ(DayZKeywords),
    Arma3(Arma3Keywords),
}

impl GameExtra {
    /// Parses the keyword string for the given app id. Returns `None` for
    /// games without a known keyword layout.
    pub fn parse(app_id: u64, keywords: &str) -> Option<Self> {
        match app_id {
            APP_ID_DAYZ | APP_ID_DAYZ_EXP => Some(GameExtra::DayZ(DayZKeywords::parse(keywords))),
            APP_ID_ARMA3 => Some(GameExtra::Arma3(Arma3Keywords::parse(keywords))),
            _ => None,
        }
    }

    /// Players waiting in the server's login queue.
    pub fn queued_players(&self) -> u32 {
        match self {
            GameExtra::DayZ(dayz) => dayz.players_queue,
            GameExtra::Arma3(_) => 0,
        }
    }
}

/// DayZ server flags, e.g.
/// `battleye,no3rd,external,privHive,shard001,lqs3,etm4.000000,entm6.000000,mod,1.26.159040,12:34`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DayZKeywords {
    pub battleye: bool,
    pub no_third_person: bool,
    pub external: bool,
    pub private_hive: bool,
    pub modded: bool,
    pub shard: Option<String>,
    pub players_queue: u32,
    pub time_acceleration: Option<f32>,
    pub night_time_acceleration: Option<f32>,
    /// In-game time as `HH:MM`
    pub time: Option<String>,
    pub version: Option<String>,
}

impl DayZKeywords {
    pub fn parse(keywords: &str) -> Self {
        let mut parsed = DayZKeywords::default();

        for token in keywords.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "battleye" => parsed.battleye = true,
                "no3rd" => parsed.no_third_person = true,
                "external" => parsed.external = true,
                "privHive" => parsed.private_hive = true,
                "mod" => parsed.modded = true,
                _ => parsed.parse_valued(token),
            }
        }

        parsed
    }

    fn parse_valued(&mut self, token: &str) {
        if let Some(rest) = token.strip_prefix("entm") {
            self.night_time_acceleration = rest.parse().ok();
        } else if let Some(rest) = token.strip_prefix("etm") {
            self.time_acceleration = rest.parse().ok();
        } else if let Some(rest) = token.strip_prefix("lqs") {
            self.players_queue = rest.parse().unwrap_or(0);
        } else if let Some(rest) = token.strip_prefix("shard") {
            self.shard = Some(rest.to_string());
        } else if is_clock(token) {
            self.time = Some(token.to_string());
        } else if is_version(token) {
            self.version = Some(token.to_string());
        }
    }
}

fn is_clock(token: &str) -> bool {
    match token.split_once(':') {
        Some((hours, minutes)) => {
            matches!(hours.parse::<u8>(), Ok(h) if h < 24)
                && minutes.len() == 2
                && matches!(minutes.parse::<u8>(), Ok(m) if m < 60)
        }
        None => false,
    }
}

fn is_version(token: &str) -> bool {
    token.contains('.') && token.split('.').all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// Arma 3 server flags. Every token is a one letter key followed by its
/// value, e.g. `bt,r210,n152,s1,i2,mf,lf,vt,dt,tcoop,g65545,hd12ce14a,c0-0,pw,e0`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Arma3Keywords {
    pub battleye: bool,
    /// Required game version as `major.minor`
    pub required_version: Option<String>,
    pub required_build: Option<u32>,
    pub server_state: Option<u8>,
    pub difficulty: Option<u8>,
    pub equal_mod_required: bool,
    pub locked: bool,
    pub verify_signatures: bool,
    pub dedicated: bool,
    pub game_type: Option<String>,
    pub language: Option<u32>,
    pub mods_hash: Option<String>,
    /// Longitude and latitude as reported, `lon-lat`
    pub location: Option<String>,
    pub platform: Option<String>,
    pub file_patching: Option<u8>,
}

impl Arma3Keywords {
    pub fn parse(keywords: &str) -> Self {
        let mut parsed = Arma3Keywords::default();

        for token in keywords.split(',').map(str::trim) {
            let mut chars = token.chars();
            let Some(key) = chars.next() else {
                continue;
            };
            let value = chars.as_str();

            match key {
                'b' => parsed.battleye = value == "t",
                'r' => parsed.required_version = arma_version(value),
                'n' => parsed.required_build = value.parse().ok(),
                's' => parsed.server_state = value.parse().ok(),
                'i' => parsed.difficulty = value.parse().ok(),
                'm' => parsed.equal_mod_required = value == "t",
                'l' => parsed.locked = value == "t",
                'v' => parsed.verify_signatures = value == "t",
                'd' => parsed.dedicated = value == "t",
                't' if !value.is_empty() => parsed.game_type = Some(value.to_string()),
                'g' => parsed.language = value.parse().ok(),
                'h' if !value.is_empty() => parsed.mods_hash = Some(value.to_string()),
                'c' if !value.is_empty() => parsed.location = Some(value.to_string()),
                'p' => {
                    parsed.platform = match value {
                        "w" => Some("windows".to_string()),
                        "l" => Some("linux".to_string()),
                        "" => None,
                        other => Some(other.to_string()),
                    }
                }
                'e' => parsed.file_patching = value.parse().ok(),
                _ => {}
            }
        }

        parsed
    }
}

/// `210` is version 2.10
fn arma_version(value: &str) -> Option<String> {
    if value.len() < 2 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (major, minor) = value.split_at(1);
    Some(format!("{}.{}", major, minor))
}
