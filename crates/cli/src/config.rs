use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use kassenwart_statement::{EventRecord, Roster};

/// Treasurer-maintained matching data: the events currently accepting fees
/// and the member roster to resolve DB ids against.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub events: Vec<EventEntry>,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventEntry {
    pub title: String,
    pub begin: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberEntry {
    pub id: u64,
    pub given_names: String,
    pub family_name: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Event {title:?}: bad date {value:?} (expected YYYY-MM-DD)")]
    BadDate { title: String, value: String },
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Event records for the matcher, with `YYYY-MM-DD` dates parsed.
    pub fn event_records(&self) -> Result<Vec<EventRecord>, ConfigError> {
        self.events
            .iter()
            .map(|entry| {
                Ok(EventRecord {
                    title: entry.title.clone(),
                    begin: parse_date(&entry.title, entry.begin.as_deref())?,
                    end: parse_date(&entry.title, entry.end.as_deref())?,
                })
            })
            .collect()
    }

    pub fn roster(&self) -> Roster {
        let mut roster = Roster::new();
        for member in &self.members {
            roster.insert(member.id, &member.given_names, &member.family_name);
        }
        roster
    }
}

fn parse_date(title: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ConfigError> {
    match value {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ConfigError::BadDate {
                title: title.to_string(),
                value: raw.to_string(),
            }),
    }
}
