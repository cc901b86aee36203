use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Sites watched for new research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Admis,
    Saxo,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Admis, Source::Saxo];

    pub fn name(&self) -> &'static str {
        match self {
            Source::Admis => "ADMIS Written Commentary",
            Source::Saxo => "Saxo Bank Research",
        }
    }

    /// Stable key used for identifiers and file names. Never change these.
    pub fn key(&self) -> &'static str {
        match self {
            Source::Admis => "admis",
            Source::Saxo => "saxo",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Source::Admis => "🌾",
            Source::Saxo => "🏦",
        }
    }

    pub fn cli_name(&self) -> &'static str {
        self.key()
    }

    pub fn from_cli_name(name: &str) -> Option<Source> {
        let name = name.trim().to_lowercase();
        Source::ALL.into_iter().find(|s| s.cli_name() == name)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const ID_BYTES: usize = 16;

/// Identifier of an article, derived from its source and absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn derive(source: Source, url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.key().as_bytes());
        hasher.update(b"\n");
        hasher.update(url.as_bytes());
        let digest = hasher.finalize();

        let mut hex = String::with_capacity(ID_BYTES * 2);
        for byte in &digest[..ID_BYTES] {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArticleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.len() == ID_BYTES * 2
            && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::NotFound(format!("malformed article id: {}", s)))
        }
    }
}

/// A listing entry as scraped, before URL resolution and title cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: String,
    pub href: String,
    pub date_text: String,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub date_text: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: Source,
    pub discovered_at: DateTime<Utc>,
}

impl ArticleRecord {
    pub fn id(&self) -> ArticleId {
        ArticleId::derive(self.source, &self.url)
    }

    /// Date as shown to the operator.
    pub fn display_date(&self) -> String {
        if !self.date_text.trim().is_empty() {
            self.date_text.trim().to_string()
        } else if let Some(published) = self.published_at {
            published.format("%Y-%m-%d").to_string()
        } else {
            "Unknown".to_string()
        }
    }
}

const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%m/%d/%Y", "%Y-%m-%d", "%d %B %Y"];

/// Normalizes the free-form date text found on listing pages.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    })
}

pub const INSIGHTS_NAMESPACE: &str = "INSIGHTS";

/// Data round-tripped through the "Load Insights" button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackPayload {
    pub id: ArticleId,
}

impl CallbackPayload {
    pub fn new(id: ArticleId) -> Self {
        Self { id }
    }

    /// Returns `None` when the payload belongs to another namespace.
    /// A payload in our namespace with a malformed id is a `NotFound`.
    pub fn parse(data: &str) -> Option<Result<Self>> {
        let (tag, rest) = data.split_once('|')?;
        if tag != INSIGHTS_NAMESPACE {
            return None;
        }
        Some(rest.parse::<ArticleId>().map(Self::new))
    }

    pub fn encode(&self) -> String {
        format!("{}|{}", INSIGHTS_NAMESPACE, self.id)
    }
}
