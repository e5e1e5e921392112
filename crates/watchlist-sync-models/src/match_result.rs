use crate::canonical_id::CanonicalId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of looking an entry up in the media library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Availability {
    Available,
    NotInLibrary,
    /// The entry carried no canonical id, so no search was attempted
    NotFound,
    Error(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => f.write_str("Available in Library"),
            Availability::NotInLibrary => f.write_str("Not in Library"),
            Availability::NotFound => f.write_str("Not Found"),
            Availability::Error(detail) => write!(f, "Error: {}", detail),
        }
    }
}

impl From<Availability> for String {
    fn from(value: Availability) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Availability {
    type Error = String;

    // `Self::Error` would be ambiguous with the `Error` variant
    fn try_from(value: String) -> Result<Self, String> {
        match value.as_str() {
            "Available in Library" => Ok(Availability::Available),
            "Not in Library" => Ok(Availability::NotInLibrary),
            "Not Found" => Ok(Availability::NotFound),
            other => other
                .strip_prefix("Error: ")
                .map(|detail| Availability::Error(detail.to_string()))
                .ok_or_else(|| format!("unknown availability value: {:?}", other)),
        }
    }
}

/// One line of the match report, in the same order as the input entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub film_name: String,
    pub tmdb_id: Option<CanonicalId>,
    /// Local time the entry was matched; empty in the report when unmatched
    #[serde(with = "report_date")]
    pub date_added: Option<NaiveDateTime>,
    pub availability: Availability,
}

impl MatchResult {
    pub fn new(film_name: impl Into<String>, tmdb_id: Option<CanonicalId>, availability: Availability) -> Self {
        Self {
            film_name: film_name.into(),
            tmdb_id,
            date_added: None,
            availability,
        }
    }

    pub fn with_date_added(mut self, date_added: NaiveDateTime) -> Self {
        self.date_added = Some(date_added);
        self
    }
}

/// Report timestamps look like `mar 05 2025 09:41pm`
pub mod report_date {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%b %d %Y %I:%M%p";

    pub fn format(date: &NaiveDateTime) -> String {
        date.format(FORMAT).to_string().to_lowercase()
    }

    pub fn serialize<S>(date: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&format(date)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(raw.trim(), FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
