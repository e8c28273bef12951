//! Closed class taxonomy spanning the primary and secondary sections.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
/// School section a class belongs to.
pub enum Section {
    Primary,
    Secondary,
}

impl Section {
    /// Short code used inside registration numbers.
    pub fn code(self) -> &'static str {
        match self {
            Section::Primary => "PRI",
            Section::Secondary => "SEC",
        }
    }

    /// Classes of this section in progression order.
    pub fn classes(self) -> Vec<SchoolClass> {
        SchoolClass::ALL
            .iter()
            .copied()
            .filter(|class| class.section() == self)
            .collect()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Section::Primary => "Primary",
            Section::Secondary => "Secondary",
        };
        f.write_str(label)
    }
}

/// Every recognized class. Declaration order is progression order, which also drives
/// sorted reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SchoolClass {
    Creche,
    Nursery1,
    Nursery2,
    Primary1,
    Primary2,
    Primary3,
    Primary4,
    Primary5,
    Jss1,
    Jss2,
    Jss3,
    Sss1,
    Sss2,
    Sss3,
}

impl SchoolClass {
    pub const ALL: [SchoolClass; 14] = [
        SchoolClass::Creche,
        SchoolClass::Nursery1,
        SchoolClass::Nursery2,
        SchoolClass::Primary1,
        SchoolClass::Primary2,
        SchoolClass::Primary3,
        SchoolClass::Primary4,
        SchoolClass::Primary5,
        SchoolClass::Jss1,
        SchoolClass::Jss2,
        SchoolClass::Jss3,
        SchoolClass::Sss1,
        SchoolClass::Sss2,
        SchoolClass::Sss3,
    ];

    pub fn section(self) -> Section {
        match self {
            SchoolClass::Creche
            | SchoolClass::Nursery1
            | SchoolClass::Nursery2
            | SchoolClass::Primary1
            | SchoolClass::Primary2
            | SchoolClass::Primary3
            | SchoolClass::Primary4
            | SchoolClass::Primary5 => Section::Primary,
            SchoolClass::Jss1
            | SchoolClass::Jss2
            | SchoolClass::Jss3
            | SchoolClass::Sss1
            | SchoolClass::Sss2
            | SchoolClass::Sss3 => Section::Secondary,
        }
    }

    /// Position in the overall progression, starting at zero.
    pub fn rank(self) -> usize {
        self as usize
    }

    /// The class a promoted student moves into. `None` for the graduation tier.
    ///
    /// The last primary class feeds the first secondary class.
    pub fn next(self) -> Option<SchoolClass> {
        SchoolClass::ALL.get(self.rank() + 1).copied()
    }

    /// Final class of the secondary progression; students here graduate.
    pub fn is_graduation_tier(self) -> bool {
        self.next().is_none()
    }

    pub fn label(self) -> &'static str {
        match self {
            SchoolClass::Creche => "Creche",
            SchoolClass::Nursery1 => "Nursery 1",
            SchoolClass::Nursery2 => "Nursery 2",
            SchoolClass::Primary1 => "Primary 1",
            SchoolClass::Primary2 => "Primary 2",
            SchoolClass::Primary3 => "Primary 3",
            SchoolClass::Primary4 => "Primary 4",
            SchoolClass::Primary5 => "Primary 5",
            SchoolClass::Jss1 => "JSS 1",
            SchoolClass::Jss2 => "JSS 2",
            SchoolClass::Jss3 => "JSS 3",
            SchoolClass::Sss1 => "SSS 1",
            SchoolClass::Sss2 => "SSS 2",
            SchoolClass::Sss3 => "SSS 3",
        }
    }
}

impl fmt::Display for SchoolClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raised when a class label cannot be recognized.
pub struct UnknownClass(pub String);

impl fmt::Display for UnknownClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown class `{}`", self.0)
    }
}

impl std::error::Error for UnknownClass {}

impl FromStr for SchoolClass {
    type Err = UnknownClass;

    /// Accepts labels such as `Primary 1`, `primary_1` or `JSS1`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        SchoolClass::ALL
            .iter()
            .copied()
            .find(|class| {
                let candidate: String = class
                    .label()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                candidate == normalized
            })
            .ok_or_else(|| UnknownClass(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_crosses_from_primary_into_secondary() {
        assert_eq!(SchoolClass::Primary5.next(), Some(SchoolClass::Jss1));
        assert_eq!(SchoolClass::Jss1.section(), Section::Secondary);
        assert!(SchoolClass::Sss3.is_graduation_tier());
        assert!(!SchoolClass::Creche.is_graduation_tier());
    }

    #[test]
    fn parses_loose_labels() {
        assert_eq!("Primary 1".parse::<SchoolClass>(), Ok(SchoolClass::Primary1));
        assert_eq!("jss1".parse::<SchoolClass>(), Ok(SchoolClass::Jss1));
        assert!("Grade 9".parse::<SchoolClass>().is_err());
    }

    #[test]
    fn sections_list_classes_in_order() {
        let secondary = Section::Secondary.classes();
        assert_eq!(secondary.first(), Some(&SchoolClass::Jss1));
        assert_eq!(secondary.last(), Some(&SchoolClass::Sss3));
        assert_eq!(Section::Primary.classes().len(), 8);
    }
}
