//! Student records and registration numbers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    class::{SchoolClass, Section},
    common::*,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Immutable identifier printed on receipts, e.g. `PRI/24/007`.
pub struct RegistrationNumber(String);

impl RegistrationNumber {
    /// Builds `[PREFIX/]SEC/YY/NNN` from its parts. Only the last two digits of the
    /// entry year are kept.
    pub fn compose(prefix: Option<&str>, section: Section, entry_year: i32, serial: u32) -> Self {
        let short_year = entry_year.rem_euclid(100);
        let body = format!("{}/{:02}/{:03}", section.code(), short_year, serial);
        match prefix.map(str::trim).filter(|p| !p.is_empty()) {
            Some(prefix) => Self(format!("{}/{}", prefix.to_ascii_uppercase(), body)),
            None => Self(body),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Why a student left the active roster.
pub enum ArchiveReason {
    Graduated,
    Withdrawn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: Uuid,
    pub registration_number: RegistrationNumber,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    /// Section the student enrolled into; encoded in the registration number.
    pub entry_section: Section,
    pub class: SchoolClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    pub parent_phone: String,
    pub entry_year: i32,
    pub is_new_intake: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_reason: Option<ArchiveReason>,
}

impl Student {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Section of the student's current class.
    pub fn section(&self) -> Section {
        self.class.section()
    }

    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.trim().is_empty()) {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }

    pub fn archive(&mut self, reason: ArchiveReason, at: DateTime<Utc>) {
        self.archived_at = Some(at);
        self.archive_reason = Some(reason);
    }
}

impl Identifiable for Student {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Student {
    fn display_label(&self) -> String {
        format!("{} [{}] {}", self.full_name(), self.registration_number, self.class)
    }
}
