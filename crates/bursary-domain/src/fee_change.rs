//! Proposed edits to a term's fee schedule awaiting review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{class::SchoolClass, common::*, fee_schedule::FeeRow, payment::ApprovalStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeChangeRequest {
    pub id: Uuid,
    pub term_id: Uuid,
    pub class: SchoolClass,
    pub new_intake_fee: f64,
    pub returning_fee: f64,
    #[serde(default)]
    pub status: ApprovalStatus,
    pub requested_by: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FeeChangeRequest {
    /// The schedule row this request writes when approved.
    pub fn proposed_row(&self) -> FeeRow {
        FeeRow::new(self.class, self.new_intake_fee, self.returning_fee)
    }
}

impl Identifiable for FeeChangeRequest {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for FeeChangeRequest {
    fn display_label(&self) -> String {
        format!(
            "{}: new {:.2} / returning {:.2} [{}]",
            self.class, self.new_intake_fee, self.returning_fee, self.status
        )
    }
}
