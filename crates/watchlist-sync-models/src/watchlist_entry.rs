use crate::canonical_id::CanonicalId;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// One enriched watchlist record: the input of the library matcher
///
/// Field names follow the entries file on disk
/// (`{film_name, tmdb_id, film_year}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub film_name: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub tmdb_id: Option<CanonicalId>,
    #[serde(default, deserialize_with = "deserialize_optional_year")]
    pub film_year: Option<u32>,
}

impl WatchlistEntry {
    pub fn new(film_name: impl Into<String>, tmdb_id: Option<CanonicalId>, film_year: Option<u32>) -> Self {
        Self {
            film_name: film_name.into(),
            tmdb_id,
            film_year,
        }
    }
}

// Entries files in the wild carry ids and years either as numbers or strings.
// A value that cannot be used is dropped with a warning so one bad row never
// rejects the whole file.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(u64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<CanonicalId>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Option::<Loose>::deserialize(deserializer)? {
        None => None,
        Some(Loose::Number(n)) => Some(CanonicalId::from(n)),
        Some(Loose::Float(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Some(CanonicalId::from(f as u64))
        }
        Some(Loose::Float(f)) => {
            warn!("Ignoring tmdb_id {}: not a TMDB movie id", f);
            None
        }
        Some(Loose::Text(s)) if s.trim().is_empty() => None,
        Some(Loose::Text(s)) => match CanonicalId::new(s.trim()) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Ignoring tmdb_id: {}", e);
                None
            }
        },
        Some(Loose::Other(_)) => {
            warn!("Ignoring tmdb_id that is neither a number nor a string");
            None
        }
    };
    Ok(id)
}

fn deserialize_optional_year<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let year = match Option::<Loose>::deserialize(deserializer)? {
        None => None,
        Some(Loose::Number(n)) => u32::try_from(n).ok(),
        Some(Loose::Float(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Some(f as u32),
        Some(Loose::Text(s)) if s.trim().is_empty() => None,
        Some(Loose::Text(s)) => match s.trim().parse::<u32>() {
            Ok(year) => Some(year),
            Err(_) => {
                warn!("Ignoring film_year {:?}; searching without a year", s);
                None
            }
        },
        Some(_) => {
            warn!("Ignoring film_year that is not a year; searching without a year");
            None
        }
    };
    Ok(year)
}
