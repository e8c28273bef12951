//! Per-term fee amounts keyed by class.

use serde::{Deserialize, Serialize};

use crate::class::SchoolClass;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// Fee amounts charged to a single class for one term.
pub struct FeeRow {
    pub class: SchoolClass,
    pub new_intake_fee: f64,
    pub returning_fee: f64,
}

impl FeeRow {
    pub fn new(class: SchoolClass, new_intake_fee: f64, returning_fee: f64) -> Self {
        Self {
            class,
            new_intake_fee,
            returning_fee,
        }
    }

    /// Fee charged to a student of this class given their intake category.
    pub fn fee_for(&self, is_new_intake: bool) -> f64 {
        if is_new_intake {
            self.new_intake_fee
        } else {
            self.returning_fee
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// Ordered collection of fee rows, at most one per class.
pub struct FeeSchedule {
    #[serde(default)]
    pub rows: Vec<FeeRow>,
}

impl FeeSchedule {
    pub fn new(rows: Vec<FeeRow>) -> Self {
        let mut schedule = Self::default();
        for row in rows {
            schedule.upsert(row);
        }
        schedule
    }

    pub fn row(&self, class: SchoolClass) -> Option<&FeeRow> {
        self.rows.iter().find(|row| row.class == class)
    }

    /// Overwrites the row for `row.class`, inserting it in class order when absent.
    pub fn upsert(&mut self, row: FeeRow) {
        if let Some(existing) = self.rows.iter_mut().find(|r| r.class == row.class) {
            *existing = row;
            return;
        }
        let position = self
            .rows
            .iter()
            .position(|r| r.class > row.class)
            .unwrap_or(self.rows.len());
        self.rows.insert(position, row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
