//! Payments, their approval state and the append-only amendment audit trail.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Pos,
    Transfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pos => "pos",
            PaymentMethod::Transfer => "transfer",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
/// Review state shared by payments and fee-change requests.
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    /// Opaque, globally unique reference printed on receipts.
    pub transaction_id: String,
    pub student_id: Uuid,
    pub session_id: Uuid,
    pub term_id: Uuid,
    pub amount: f64,
    pub method: PaymentMethod,
    /// Fee payable for the term when the payment was recorded.
    pub fee_payable: f64,
    /// Balance still owed for the term when the payment was recorded.
    pub outstanding_balance: f64,
    pub recorded_by: Uuid,
    pub received_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approval_status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
    #[serde(default)]
    pub is_voided: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voided_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voided_by: Option<Uuid>,
}

impl Payment {
    /// Whether the payment currently counts toward collections and balances.
    pub fn is_settled(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved && !self.is_voided
    }

    pub fn is_pending(&self) -> bool {
        self.approval_status == ApprovalStatus::Pending && !self.is_voided
    }

    /// Short state label such as `approved` or `voided`.
    pub fn state_label(&self) -> String {
        if self.is_voided {
            format!("voided ({})", self.approval_status)
        } else {
            self.approval_status.to_string()
        }
    }
}

impl Identifiable for Payment {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Payment {
    fn display_label(&self) -> String {
        format!(
            "{} {:.2} via {} [{}]",
            self.transaction_id,
            self.amount,
            self.method,
            self.state_label()
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Edited,
    Voided,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuditAction::Edited => "edited",
            AuditAction::Voided => "voided",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Append-only record of an amendment made to a payment. Never updated or removed.
pub struct PaymentAudit {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub action: AuditAction,
    pub previous_amount: Option<f64>,
    pub new_amount: Option<f64>,
    pub previous_method: Option<PaymentMethod>,
    pub new_method: Option<PaymentMethod>,
    pub reason: String,
    pub performed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for PaymentAudit {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_status_uses_lowercase_wire_names() {
        let json = serde_json::to_string(&ApprovalStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        let method: PaymentMethod = serde_json::from_str("\"pos\"").unwrap();
        assert_eq!(method, PaymentMethod::Pos);
    }
}
