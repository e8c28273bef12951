//! Fee-payable, balance and revenue arithmetic.
//!
//! Balances are never stored. Every figure is recomputed from the fee schedule and the
//! payment set, so edits and voids on historical payments are reflected immediately.

use std::collections::HashMap;

use bursary_domain::{Payment, RegistrationNumber, SchoolClass, Student, Term};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
/// A student who still owes money for a term.
pub struct Debtor {
    pub student_id: Uuid,
    pub registration_number: RegistrationNumber,
    pub name: String,
    pub class: SchoolClass,
    pub fee_payable: f64,
    pub paid: f64,
    /// Raw balance, always positive for a debtor.
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebtorGroup {
    pub class: SchoolClass,
    pub debtors: Vec<Debtor>,
}

impl DebtorGroup {
    pub fn total_owed(&self) -> f64 {
        self.debtors.iter().map(|d| d.balance).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Debtors grouped by current class. Groups appear in the order their first debtor
/// was seen; use [`DebtorsByClass::in_class_order`] for display.
pub struct DebtorsByClass {
    pub groups: Vec<DebtorGroup>,
}

impl DebtorsByClass {
    pub fn group(&self, class: SchoolClass) -> Option<&DebtorGroup> {
        self.groups.iter().find(|g| g.class == class)
    }

    pub fn in_class_order(&self) -> Vec<&DebtorGroup> {
        let mut groups: Vec<_> = self.groups.iter().collect();
        groups.sort_by_key(|g| g.class);
        groups
    }

    pub fn debtor_count(&self) -> usize {
        self.groups.iter().map(|g| g.debtors.len()).sum()
    }

    pub fn total_owed(&self) -> f64 {
        self.groups.iter().map(DebtorGroup::total_owed).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Pure ledger computations over supplied state. Absent data yields zero.
pub struct LedgerEngine;

impl LedgerEngine {
    /// Fee charged to `student` for `term`, or `0` when there is no term or no row for
    /// the student's class.
    pub fn fee_payable(student: &Student, term: Option<&Term>) -> f64 {
        term.and_then(|t| t.fee_schedule.row(student.class))
            .map(|row| row.fee_for(student.is_new_intake))
            .unwrap_or(0.0)
    }

    /// Sum of approved, non-voided payments by `student_id` for `term_id`.
    pub fn paid(student_id: Uuid, term_id: Uuid, payments: &[Payment]) -> f64 {
        payments
            .iter()
            .filter(|p| p.student_id == student_id && p.term_id == term_id && p.is_settled())
            .map(|p| p.amount)
            .sum()
    }

    /// `fee_payable - paid`. Negative when the student has overpaid.
    pub fn balance(student: &Student, term: Option<&Term>, payments: &[Payment]) -> f64 {
        let Some(term) = term else {
            return 0.0;
        };
        Self::fee_payable(student, Some(term)) - Self::paid(student.id, term.id, payments)
    }

    /// Balance clamped at zero: what is still owed.
    pub fn amount_owed(student: &Student, term: Option<&Term>, payments: &[Payment]) -> f64 {
        Self::balance(student, term, payments).max(0.0)
    }

    /// Full-fee expectation across the non-archived roster, regardless of payments.
    pub fn expected_revenue<'a, I>(students: I, term: Option<&Term>) -> f64
    where
        I: IntoIterator<Item = &'a Student>,
    {
        students
            .into_iter()
            .filter(|s| !s.is_archived())
            .map(|s| Self::fee_payable(s, term))
            .sum()
    }

    /// Sum of approved, non-voided payments recorded against `term`.
    pub fn collected(term: Option<&Term>, payments: &[Payment]) -> f64 {
        let Some(term) = term else {
            return 0.0;
        };
        payments
            .iter()
            .filter(|p| p.term_id == term.id && p.is_settled())
            .map(|p| p.amount)
            .sum()
    }

    /// Groups every non-archived student whose balance is above zero by current class.
    pub fn debtors_by_class<'a, I>(
        students: I,
        term: Option<&Term>,
        payments: &[Payment],
    ) -> DebtorsByClass
    where
        I: IntoIterator<Item = &'a Student>,
    {
        let mut report = DebtorsByClass::default();
        let Some(term) = term else {
            return report;
        };
        let paid = Self::paid_by_student(term.id, payments);

        for student in students.into_iter().filter(|s| !s.is_archived()) {
            let fee_payable = Self::fee_payable(student, Some(term));
            let paid = paid.get(&student.id).copied().unwrap_or(0.0);
            let balance = fee_payable - paid;
            if balance <= 0.0 {
                continue;
            }
            let debtor = Debtor {
                student_id: student.id,
                registration_number: student.registration_number.clone(),
                name: student.full_name(),
                class: student.class,
                fee_payable,
                paid,
                balance,
            };
            match report.groups.iter_mut().find(|g| g.class == student.class) {
                Some(group) => group.debtors.push(debtor),
                None => report.groups.push(DebtorGroup {
                    class: student.class,
                    debtors: vec![debtor],
                }),
            }
        }
        report
    }

    fn paid_by_student(term_id: Uuid, payments: &[Payment]) -> HashMap<Uuid, f64> {
        let mut totals = HashMap::new();
        for payment in payments
            .iter()
            .filter(|p| p.term_id == term_id && p.is_settled())
        {
            *totals.entry(payment.student_id).or_insert(0.0) += payment.amount;
        }
        totals
    }
}
