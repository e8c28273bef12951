//! The `FeeBook` aggregate: every record the fee office keeps, in one snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    access::User,
    common::Identifiable,
    fee_change::FeeChangeRequest,
    payment::{Payment, PaymentAudit},
    session::{AcademicSession, Term},
    student::Student,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Outcome counts of one bulk promotion.
pub struct PromotionCounts {
    pub promoted: u32,
    pub graduated: u32,
    pub manual: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Log entry written each time the roster is promoted at a term boundary.
pub struct PromotionRun {
    pub id: Uuid,
    pub term_id: Uuid,
    pub performed_by: Uuid,
    pub performed_at: DateTime<Utc>,
    pub counts: PromotionCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeBook {
    #[serde(default = "FeeBook::default_schema_version")]
    pub schema_version: u8,
    #[serde(default)]
    pub sessions: Vec<AcademicSession>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub audits: Vec<PaymentAudit>,
    #[serde(default)]
    pub fee_changes: Vec<FeeChangeRequest>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub promotions: Vec<PromotionRun>,
    pub updated_at: DateTime<Utc>,
}

impl Default for FeeBook {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl FeeBook {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            sessions: Vec::new(),
            terms: Vec::new(),
            students: Vec::new(),
            payments: Vec::new(),
            audits: Vec::new(),
            fee_changes: Vec::new(),
            users: Vec::new(),
            promotions: Vec::new(),
            updated_at: now,
        }
    }

    pub fn default_schema_version() -> u8 {
        CURRENT_SCHEMA_VERSION
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn session(&self, id: Uuid) -> Option<&AcademicSession> {
        find_by_id(&self.sessions, id)
    }

    pub fn term(&self, id: Uuid) -> Option<&Term> {
        find_by_id(&self.terms, id)
    }

    pub fn term_mut(&mut self, id: Uuid) -> Option<&mut Term> {
        find_by_id_mut(&mut self.terms, id)
    }

    pub fn terms_of(&self, session_id: Uuid) -> impl Iterator<Item = &Term> {
        self.terms.iter().filter(move |t| t.session_id == session_id)
    }

    /// The single active term, if any.
    pub fn active_term(&self) -> Option<&Term> {
        self.terms.iter().find(|t| t.is_active)
    }

    pub fn active_session(&self) -> Option<&AcademicSession> {
        self.sessions.iter().find(|s| s.is_active)
    }

    pub fn student(&self, id: Uuid) -> Option<&Student> {
        find_by_id(&self.students, id)
    }

    pub fn student_mut(&mut self, id: Uuid) -> Option<&mut Student> {
        find_by_id_mut(&mut self.students, id)
    }

    /// Students that have not been archived, in registration order.
    pub fn active_students(&self) -> impl Iterator<Item = &Student> {
        self.students.iter().filter(|s| !s.is_archived())
    }

    pub fn payment(&self, id: Uuid) -> Option<&Payment> {
        find_by_id(&self.payments, id)
    }

    pub fn payment_mut(&mut self, id: Uuid) -> Option<&mut Payment> {
        find_by_id_mut(&mut self.payments, id)
    }

    pub fn payments_for_term(&self, term_id: Uuid) -> impl Iterator<Item = &Payment> {
        self.payments.iter().filter(move |p| p.term_id == term_id)
    }

    /// Audit entries for a payment, oldest first.
    pub fn audits_for(&self, payment_id: Uuid) -> Vec<&PaymentAudit> {
        let mut entries: Vec<_> = self
            .audits
            .iter()
            .filter(|a| a.payment_id == payment_id)
            .collect();
        entries.sort_by_key(|a| a.created_at);
        entries
    }

    pub fn fee_change(&self, id: Uuid) -> Option<&FeeChangeRequest> {
        find_by_id(&self.fee_changes, id)
    }

    pub fn fee_change_mut(&mut self, id: Uuid) -> Option<&mut FeeChangeRequest> {
        find_by_id_mut(&mut self.fee_changes, id)
    }

    pub fn user(&self, id: Uuid) -> Option<&User> {
        find_by_id(&self.users, id)
    }

    pub fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        find_by_id_mut(&mut self.users, id)
    }
}

fn find_by_id<T: Identifiable>(items: &[T], id: Uuid) -> Option<&T> {
    items.iter().find(|item| item.id() == id)
}

fn find_by_id_mut<T: Identifiable>(items: &mut [T], id: Uuid) -> Option<&mut T> {
    items.iter_mut().find(|item| item.id() == id)
}
