//! Payment submission, review, amendment and receipts.
//!
//! State machine: `pending -> approved | rejected`, and orthogonally any payment that is
//! not yet voided may be voided. Voided is terminal: a voided payment can no longer be
//! decided, edited or voided again. Every transition re-reads the payment's current
//! status inside the store transaction and fails with [`CoreError::InvalidState`] when
//! it no longer matches, which is what stops two reviewers double-applying a decision.

use bursary_domain::{
    is_positive_amount, Action, ApprovalStatus, AuditAction, FeeBook, Payment, PaymentAudit,
    PaymentMethod, RegistrationNumber, SchoolClass, Term, TermOrdinal,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{access_service::AccessService, ledger_service::LedgerEngine, time::Clock, CoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSubmission {
    pub student_id: Uuid,
    /// Term to credit. Must be the active term when given; defaults to it.
    pub term_id: Option<Uuid>,
    pub amount: f64,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
/// Printable proof of a settled payment.
pub struct Receipt {
    pub payment_id: Uuid,
    pub transaction_id: String,
    pub student_name: String,
    pub registration_number: RegistrationNumber,
    pub class: SchoolClass,
    pub session_name: String,
    pub term: TermOrdinal,
    pub amount: f64,
    pub method: PaymentMethod,
    pub fee_payable: f64,
    pub total_paid: f64,
    /// What the student still owes for the term, never below zero.
    pub balance_remaining: f64,
    pub received_by: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptStatus {
    Ready(Receipt),
    AwaitingApproval,
    Unavailable { reason: String },
}

pub struct PaymentService;

impl PaymentService {
    /// Records a new pending payment, snapshotting the fee payable and the balance that
    /// would remain once it is approved.
    pub fn submit(
        book: &mut FeeBook,
        clock: &dyn Clock,
        actor_id: Uuid,
        submission: PaymentSubmission,
    ) -> Result<Payment, CoreError> {
        let actor = AccessService::authorize(book, actor_id, Action::RecordPayment)?;
        if !is_positive_amount(submission.amount) {
            return Err(CoreError::Validation(format!(
                "payment amount must be a positive number, got {}",
                submission.amount
            )));
        }
        let term = Self::resolve_term(book, submission.term_id)?.clone();
        if book.session(term.session_id).is_none() {
            return Err(CoreError::Validation(format!(
                "term {} has no academic session",
                term.id
            )));
        }
        let student = book
            .student(submission.student_id)
            .ok_or_else(|| CoreError::not_found("student", submission.student_id))?;
        if student.is_archived() {
            return Err(CoreError::invalid_state("student", student.id, "archived"));
        }

        let fee_payable = LedgerEngine::fee_payable(student, Some(&term));
        let balance = LedgerEngine::balance(student, Some(&term), &book.payments);
        let now = clock.now();
        let payment = Payment {
            id: Uuid::new_v4(),
            transaction_id: Self::unique_transaction_id(book, now),
            student_id: student.id,
            session_id: term.session_id,
            term_id: term.id,
            amount: submission.amount,
            method: submission.method,
            fee_payable,
            outstanding_balance: balance - submission.amount,
            recorded_by: actor.id,
            received_by: actor.display_name.clone(),
            created_at: now,
            approval_status: ApprovalStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            is_voided: false,
            voided_at: None,
            voided_by: None,
        };
        book.payments.push(payment.clone());
        book.touch(now);
        info!(
            payment = %payment.id,
            txn = %payment.transaction_id,
            student = %payment.student_id,
            amount = payment.amount,
            "payment submitted"
        );
        Ok(payment)
    }

    /// Approves or rejects a pending payment.
    pub fn decide(
        book: &mut FeeBook,
        clock: &dyn Clock,
        payment_id: Uuid,
        decision: Decision,
        reviewer_id: Uuid,
        notes: Option<&str>,
    ) -> Result<Payment, CoreError> {
        let reviewer = AccessService::authorize(book, reviewer_id, Action::ApprovePayment)?;
        let now = clock.now();
        let payment = book
            .payment_mut(payment_id)
            .ok_or_else(|| CoreError::not_found("payment", payment_id))?;
        if !payment.is_pending() {
            warn!(payment = %payment_id, state = %payment.state_label(), "decision on processed payment");
            return Err(CoreError::invalid_state(
                "payment",
                payment_id,
                payment.state_label(),
            ));
        }
        payment.approval_status = match decision {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        };
        payment.reviewed_by = Some(reviewer.id);
        payment.reviewed_at = Some(now);
        payment.review_notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        let updated = payment.clone();
        book.touch(now);
        info!(payment = %payment_id, status = %updated.approval_status, reviewer = %reviewer.id, "payment decided");
        Ok(updated)
    }

    /// Overwrites amount and method, appending an audit entry first.
    pub fn edit(
        book: &mut FeeBook,
        clock: &dyn Clock,
        payment_id: Uuid,
        new_amount: f64,
        new_method: PaymentMethod,
        reason: &str,
        actor_id: Uuid,
    ) -> Result<Payment, CoreError> {
        let actor = AccessService::authorize(book, actor_id, Action::AmendPayment)?;
        let reason = Self::require_reason(reason)?;
        if !is_positive_amount(new_amount) {
            return Err(CoreError::Validation(format!(
                "edited amount must be a positive number, got {new_amount}"
            )));
        }
        let now = clock.now();
        let payment = book
            .payment_mut(payment_id)
            .ok_or_else(|| CoreError::not_found("payment", payment_id))?;
        if payment.is_voided {
            return Err(CoreError::invalid_state(
                "payment",
                payment_id,
                payment.state_label(),
            ));
        }
        let audit = PaymentAudit {
            id: Uuid::new_v4(),
            payment_id,
            action: AuditAction::Edited,
            previous_amount: Some(payment.amount),
            new_amount: Some(new_amount),
            previous_method: Some(payment.method),
            new_method: Some(new_method),
            reason,
            performed_by: actor.id,
            created_at: now,
        };
        payment.amount = new_amount;
        payment.method = new_method;
        let updated = payment.clone();
        book.audits.push(audit);
        book.touch(now);
        info!(payment = %payment_id, amount = new_amount, method = %new_method, "payment edited");
        Ok(updated)
    }

    /// Excludes a payment from every ledger figure for good.
    pub fn void(
        book: &mut FeeBook,
        clock: &dyn Clock,
        payment_id: Uuid,
        reason: &str,
        actor_id: Uuid,
    ) -> Result<Payment, CoreError> {
        let actor = AccessService::authorize(book, actor_id, Action::AmendPayment)?;
        let reason = Self::require_reason(reason)?;
        let now = clock.now();
        let payment = book
            .payment_mut(payment_id)
            .ok_or_else(|| CoreError::not_found("payment", payment_id))?;
        if payment.is_voided {
            return Err(CoreError::invalid_state(
                "payment",
                payment_id,
                payment.state_label(),
            ));
        }
        let audit = PaymentAudit {
            id: Uuid::new_v4(),
            payment_id,
            action: AuditAction::Voided,
            previous_amount: Some(payment.amount),
            new_amount: Some(0.0),
            previous_method: Some(payment.method),
            new_method: None,
            reason,
            performed_by: actor.id,
            created_at: now,
        };
        payment.is_voided = true;
        payment.voided_at = Some(now);
        payment.voided_by = Some(actor.id);
        let updated = payment.clone();
        book.audits.push(audit);
        book.touch(now);
        info!(payment = %payment_id, "payment voided");
        Ok(updated)
    }

    /// A receipt exists only for approved payments that have not been voided.
    pub fn receipt(book: &FeeBook, payment_id: Uuid) -> Result<ReceiptStatus, CoreError> {
        let payment = book
            .payment(payment_id)
            .ok_or_else(|| CoreError::not_found("payment", payment_id))?;
        if payment.is_voided {
            return Ok(ReceiptStatus::Unavailable {
                reason: "payment was voided".into(),
            });
        }
        match payment.approval_status {
            ApprovalStatus::Pending => return Ok(ReceiptStatus::AwaitingApproval),
            ApprovalStatus::Rejected => {
                return Ok(ReceiptStatus::Unavailable {
                    reason: "payment was rejected".into(),
                })
            }
            ApprovalStatus::Approved => {}
        }

        let student = book
            .student(payment.student_id)
            .ok_or_else(|| CoreError::not_found("student", payment.student_id))?;
        let term = book
            .term(payment.term_id)
            .ok_or_else(|| CoreError::not_found("term", payment.term_id))?;
        let session_name = book
            .session(term.session_id)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let fee_payable = LedgerEngine::fee_payable(student, Some(term));
        let total_paid = LedgerEngine::paid(student.id, term.id, &book.payments);
        let approved_by = payment
            .reviewed_by
            .and_then(|id| book.user(id))
            .map(|u| u.display_name.clone());

        Ok(ReceiptStatus::Ready(Receipt {
            payment_id: payment.id,
            transaction_id: payment.transaction_id.clone(),
            student_name: student.full_name(),
            registration_number: student.registration_number.clone(),
            class: student.class,
            session_name,
            term: term.ordinal,
            amount: payment.amount,
            method: payment.method,
            fee_payable,
            total_paid,
            balance_remaining: (fee_payable - total_paid).max(0.0),
            received_by: payment.received_by.clone(),
            approved_by,
            approved_at: payment.reviewed_at,
            paid_at: payment.created_at,
        }))
    }

    /// Payments awaiting review, oldest first.
    pub fn pending(book: &FeeBook) -> Vec<&Payment> {
        let mut queue: Vec<_> = book.payments.iter().filter(|p| p.is_pending()).collect();
        queue.sort_by_key(|p| p.created_at);
        queue
    }

    /// Payment history of a student, newest first, optionally limited to one term.
    pub fn history(book: &FeeBook, student_id: Uuid, term_id: Option<Uuid>) -> Vec<&Payment> {
        let mut rows: Vec<_> = book
            .payments
            .iter()
            .filter(|p| p.student_id == student_id)
            .filter(|p| term_id.map_or(true, |t| p.term_id == t))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub fn audit_trail(book: &FeeBook, payment_id: Uuid) -> Result<Vec<&PaymentAudit>, CoreError> {
        if book.payment(payment_id).is_none() {
            return Err(CoreError::not_found("payment", payment_id));
        }
        Ok(book.audits_for(payment_id))
    }

    /// Payments are only taken against the live term. An explicit `term_id` must name it.
    fn resolve_term(book: &FeeBook, term_id: Option<Uuid>) -> Result<&Term, CoreError> {
        let active = book
            .active_term()
            .ok_or_else(|| CoreError::Validation("no active term; activate a term first".into()))?;
        if book.session(active.session_id).map_or(true, |s| !s.is_active) {
            return Err(CoreError::Validation("no active academic session".into()));
        }
        match term_id {
            Some(id) if id != active.id => {
                if book.term(id).is_none() {
                    return Err(CoreError::not_found("term", id));
                }
                Err(CoreError::Validation(format!(
                    "term {id} is not the active term; payments are recorded against {}",
                    active.id
                )))
            }
            _ => Ok(active),
        }
    }

    fn require_reason(reason: &str) -> Result<String, CoreError> {
        let trimmed = reason.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation("a reason is required".into()));
        }
        Ok(trimmed.to_string())
    }

    fn unique_transaction_id(book: &FeeBook, now: DateTime<Utc>) -> String {
        loop {
            let candidate = format!(
                "TXN-{}-{}",
                now.format("%Y%m%d"),
                Uuid::new_v4().simple().to_string().to_uppercase()
            );
            if !book.payments.iter().any(|p| p.transaction_id == candidate) {
                return candidate;
            }
        }
    }
}
