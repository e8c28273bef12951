//! Academic sessions and their terms.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, fee_schedule::FeeSchedule};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// A school year such as `2024/2025`.
pub struct AcademicSession {
    pub id: Uuid,
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AcademicSession {
    pub fn new(name: impl Into<String>, start_year: i32, end_year: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_year,
            end_year,
            is_active: false,
            created_at: now,
        }
    }
}

impl Identifiable for AcademicSession {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for AcademicSession {
    fn display_label(&self) -> String {
        format!("{} ({}-{})", self.name, self.start_year, self.end_year)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Position of a term within its session.
pub enum TermOrdinal {
    #[serde(rename = "1st")]
    First,
    #[serde(rename = "2nd")]
    Second,
    #[serde(rename = "3rd")]
    Third,
}

impl TermOrdinal {
    pub const ALL: [TermOrdinal; 3] = [TermOrdinal::First, TermOrdinal::Second, TermOrdinal::Third];

    /// Whether this is the closing term of a session, after which promotion runs.
    pub fn is_last(self) -> bool {
        matches!(self, TermOrdinal::Third)
    }
}

impl fmt::Display for TermOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TermOrdinal::First => "1st",
            TermOrdinal::Second => "2nd",
            TermOrdinal::Third => "3rd",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Term {
    pub id: Uuid,
    pub session_id: Uuid,
    pub ordinal: TermOrdinal,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub fee_schedule: FeeSchedule,
    pub created_at: DateTime<Utc>,
}

impl Term {
    pub fn new(session_id: Uuid, ordinal: TermOrdinal, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            ordinal,
            is_active: false,
            fee_schedule: FeeSchedule::default(),
            created_at: now,
        }
    }
}

impl Identifiable for Term {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Term {
    fn display_label(&self) -> String {
        format!("{} term", self.ordinal)
    }
}
