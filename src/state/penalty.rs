//! Canonical catalog of penalty codes and their point deltas.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of an infraction, e.g. `touching_robot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PenaltyCode(String);

impl PenaltyCode {
    /// Wrap a raw code string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrow the raw code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PenaltyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PenaltyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PenaltyCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Raised when a penalty code is not part of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown penalty code `{0}`")]
pub struct UnknownPenalty(pub PenaltyCode);

/// Raised when building a catalog from a list that names the same code twice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("penalty code `{0}` is defined more than once")]
pub struct DuplicatePenalty(pub PenaltyCode);

/// Display label and point delta attached to a penalty code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyEntry {
    /// Human readable name shown on the entry UI.
    pub label: String,
    /// Points added to the team score (negative for penalties).
    pub delta: i32,
}

/// Immutable, closed set of penalty codes shared by validation, scoring and labeling.
///
/// Cloning is cheap; the entries live behind an [`Arc`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyCatalog {
    entries: Arc<IndexMap<PenaltyCode, PenaltyEntry>>,
}

impl PenaltyCatalog {
    /// Build a catalog from `(code, label, delta)` triples, keeping their order for display.
    pub fn from_entries<I, C, L>(entries: I) -> Result<Self, DuplicatePenalty>
    where
        I: IntoIterator<Item = (C, L, i32)>,
        C: Into<PenaltyCode>,
        L: Into<String>,
    {
        let mut map = IndexMap::new();
        for (code, label, delta) in entries {
            let code = code.into();
            let entry = PenaltyEntry {
                label: label.into(),
                delta,
            };
            if map.insert(code.clone(), entry).is_some() {
                return Err(DuplicatePenalty(code));
            }
        }

        Ok(Self {
            entries: Arc::new(map),
        })
    }

    /// Point delta for `code`.
    pub fn delta(&self, code: &PenaltyCode) -> Result<i32, UnknownPenalty> {
        self.entries
            .get(code)
            .map(|entry| entry.delta)
            .ok_or_else(|| UnknownPenalty(code.clone()))
    }

    /// Display label for `code`.
    pub fn label(&self, code: &PenaltyCode) -> Result<&str, UnknownPenalty> {
        self.entries
            .get(code)
            .map(|entry| entry.label.as_str())
            .ok_or_else(|| UnknownPenalty(code.clone()))
    }

    /// Whether `code` belongs to the catalog.
    pub fn contains(&self, code: &PenaltyCode) -> bool {
        self.entries.contains_key(code)
    }

    /// Check every code of `codes`, failing on the first one outside the catalog.
    pub fn validate<'a, I>(&self, codes: I) -> Result<(), UnknownPenalty>
    where
        I: IntoIterator<Item = &'a PenaltyCode>,
    {
        codes
            .into_iter()
            .try_for_each(|code| self.delta(code).map(|_| ()))
    }

    /// Iterate over the catalog in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&PenaltyCode, &PenaltyEntry)> {
        self.entries.iter()
    }

    /// Number of codes in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog defines no codes at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PenaltyCatalog {
    /// The WRO Double Tennis scoring vocabulary.
    fn default() -> Self {
        let entries = [
            ("touching_robot", "Touching Robot", -30),
            ("robot_outside", "Robot Outside Field", -30),
            ("ball_thrown", "Ball Thrown", -30),
            ("wrong_start", "Wrong Starting Position", -10),
            ("ball_outside", "Ball Outside", -10),
            ("illegal_action", "Illegal Action", -30),
            ("late_start", "Late Start", -30),
        ];

        let map = entries
            .into_iter()
            .map(|(code, label, delta)| {
                (
                    PenaltyCode::new(code),
                    PenaltyEntry {
                        label: label.to_string(),
                        delta,
                    },
                )
            })
            .collect();

        Self {
            entries: Arc::new(map),
        }
    }
}
