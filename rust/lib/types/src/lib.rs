//! Domain types for the Agro Mark batch ("lote") client.
//!
//! The wire shape is the one the batch API speaks:
//!
//! ```json
//! {"codigo": "A1", "nome": "Soja safra 24", "validade": "2024-05-20"}
//! ```
//!
//! `validade` is a calendar date. It is carried as [`Validade`], which
//! never holds a time of day or an offset, so the `YYYY-MM-DD` form sent
//! over the wire is the same in every local time zone.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Codigo ──────────────────────────────────────────────────────────

/// Server-assigned batch code. Natural key of a [`Lote`] and the payload a
/// barcode scan produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Codigo(pub String);

impl Codigo {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Case-insensitive substring test. `needle_lower` must already be
    /// lowercased; callers filtering a whole list lowercase it once.
    pub fn contains_lowercase(&self, needle_lower: &str) -> bool {
        self.0.to_lowercase().contains(needle_lower)
    }
}

impl Deref for Codigo {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Codigo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Codigo {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Codigo {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Validade ────────────────────────────────────────────────────────

/// Wire format of a [`Validade`].
pub const WIRE_FORMAT: &str = "%Y-%m-%d";

/// Error returned when a string is not a `YYYY-MM-DD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid validade {input:?}: expected YYYY-MM-DD")]
pub struct ParseValidadeError {
    pub input: String,
}

/// Expiry date of a batch. Year/month/day only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Validade(NaiveDate);

impl Validade {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build from calendar parts. `None` for impossible dates (e.g. Feb 30).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date in the local calendar.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `DD/MM/YYYY`, as the batch list shows it.
    pub fn to_pt_br(&self) -> String {
        format!("{:02}/{:02}/{:04}", self.0.day(), self.0.month(), self.0.year())
    }

    /// Long form shown on the date picker button, e.g. `Mon May 20 2024`.
    pub fn to_long(&self) -> String {
        self.0.format("%a %b %d %Y").to_string()
    }
}

impl From<NaiveDate> for Validade {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Validade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

impl FromStr for Validade {
    type Err = ParseValidadeError;

    /// Accepts `YYYY-MM-DD`. A full timestamp (`2024-05-20T00:00:00Z`) is
    /// also accepted and its time part dropped, since some servers echo
    /// dates that way.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let date_part = match trimmed.find('T') {
            Some(10) => &trimmed[..10],
            _ => trimmed,
        };
        NaiveDate::parse_from_str(date_part, WIRE_FORMAT)
            .map(Self)
            .map_err(|_| ParseValidadeError {
                input: s.to_string(),
            })
    }
}

impl Serialize for Validade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Validade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Lote ────────────────────────────────────────────────────────────

/// A tracked batch of agricultural goods, as returned by `GET /lotes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lote {
    pub codigo: Codigo,
    pub nome: String,
    pub validade: Validade,
}

/// Creation payload for `POST /lotes`. The server assigns the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLote {
    pub nome: String,
    pub validade: Validade,
}

impl NewLote {
    pub fn new(nome: impl Into<String>, validade: Validade) -> Self {
        Self {
            nome: nome.into(),
            validade,
        }
    }
}
