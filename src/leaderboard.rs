//! Leaderboard types and ranking rules.
//!
//! The stored file is a plain JSON array of entries, highest score first.
//! Scores are kept as `serde_json::Number` so whatever the game submitted
//! (`1200`, `87.5`) is written back in the same form. Numeric strings in
//! older files (`"10"`) are read as numbers. Fields other than the four known
//! ones are carried through untouched.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Number of entries kept on the board.
pub const MAX_ENTRIES: usize = 10;

// =============================================================================
// Submissions and entries
// =============================================================================

/// Body of an inbound score submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreSubmission {
    pub name: String,
    pub score: Number,
    pub country: String,
}

impl ScoreSubmission {
    /// Stamp the submission, producing the entry that gets stored.
    pub fn into_entry(self, at: DateTime<Utc>) -> ScoreEntry {
        ScoreEntry {
            name: self.name,
            score: self.score,
            country: self.country,
            date: format_timestamp(at),
            extra: Map::new(),
        }
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub name: String,
    #[serde(deserialize_with = "stored_score")]
    pub score: Number,
    pub country: String,
    pub date: String, // ISO 8601, millisecond precision, UTC
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScoreEntry {
    pub fn new(
        name: impl Into<String>,
        score: impl Into<Number>,
        country: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            score: score.into(),
            country: country.into(),
            date: date.into(),
            extra: Map::new(),
        }
    }

    /// Score as a float for ordering.
    pub fn score_value(&self) -> f64 {
        self.score.as_f64().unwrap_or(0.0)
    }
}

/// Accept a JSON number, or a string holding one.
fn stored_score<'de, D>(deserializer: D) -> Result<Number, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(n),
        Value::String(s) => parse_numeric(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("score {:?} is not a number", s))
        }),
        other => Err(serde::de::Error::custom(format!(
            "score must be a number, got {}",
            other
        ))),
    }
}

fn parse_numeric(raw: &str) -> Option<Number> {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Number::from(i));
    }
    raw.parse::<f64>().ok().and_then(Number::from_f64)
}

/// `2024-03-01T12:30:45.123Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Leaderboard
// =============================================================================

/// Ordered list of top scores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap entries as stored; ordering is only enforced on `record`.
    pub fn from_entries(entries: Vec<ScoreEntry>) -> Self {
        Self { entries }
    }

    /// Parse the stored JSON array.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize for storage, indented by two spaces.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Add an entry, re-rank, and drop everything past `MAX_ENTRIES`.
    ///
    /// The sort is stable, so an entry tying an existing score lands after it.
    /// Returns `true` if the new entry made the board.
    pub fn record(&mut self, entry: ScoreEntry) -> bool {
        let position = self.entries.len();
        self.entries.push(entry);

        // Track the new entry through the sort by its original index.
        let mut indexed: Vec<(usize, ScoreEntry)> = self.entries.drain(..).enumerate().collect();
        indexed.sort_by(|(_, a), (_, b)| b.score_value().total_cmp(&a.score_value()));
        indexed.truncate(MAX_ENTRIES);

        let kept = indexed.iter().any(|(i, _)| *i == position);
        self.entries = indexed.into_iter().map(|(_, e)| e).collect();
        kept
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ScoreEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
