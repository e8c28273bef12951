use bursary_domain::{FeeBook, Payment, PaymentMethod, Term};
use uuid::Uuid;

use crate::{
    ledger_service::{DebtorGroup, LedgerEngine},
    CoreError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TermOverview {
    pub term_id: Option<Uuid>,
    pub student_count: usize,
    pub expected: f64,
    pub collected: f64,
    /// Sum of what each student still owes; overpayments do not offset other debts.
    pub outstanding: f64,
    pub pending_count: usize,
    pub pending_amount: f64,
    pub debtor_count: usize,
    /// Collected as a percentage of expected, when anything is expected.
    pub collection_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentStatement {
    pub student_id: Uuid,
    pub term_id: Option<Uuid>,
    pub fee_payable: f64,
    pub paid: f64,
    pub balance: f64,
    pub amount_owed: f64,
    pub payments: Vec<Payment>,
}

pub struct SummaryService;

impl SummaryService {
    /// Headline figures for a term (the active term when `term_id` is `None`).
    pub fn term_overview(book: &FeeBook, term_id: Option<Uuid>) -> Result<TermOverview, CoreError> {
        let term = Self::resolve(book, term_id)?;
        let students: Vec<_> = book.active_students().collect();
        let expected = LedgerEngine::expected_revenue(students.iter().copied(), term);
        let collected = LedgerEngine::collected(term, &book.payments);
        let outstanding: f64 = students
            .iter()
            .map(|s| LedgerEngine::amount_owed(s, term, &book.payments))
            .sum();
        let debtors =
            LedgerEngine::debtors_by_class(students.iter().copied(), term, &book.payments);
        let pending: Vec<_> = match term {
            Some(term) => book
                .payments_for_term(term.id)
                .filter(|p| p.is_pending())
                .collect(),
            None => Vec::new(),
        };
        let collection_rate = if expected > 0.0 {
            Some(collected / expected * 100.0)
        } else {
            None
        };
        Ok(TermOverview {
            term_id: term.map(|t| t.id),
            student_count: students.len(),
            expected,
            collected,
            outstanding,
            pending_count: pending.len(),
            pending_amount: pending.iter().map(|p| p.amount).sum(),
            debtor_count: debtors.debtor_count(),
            collection_rate,
        })
    }

    pub fn student_statement(
        book: &FeeBook,
        student_id: Uuid,
        term_id: Option<Uuid>,
    ) -> Result<StudentStatement, CoreError> {
        let student = book
            .student(student_id)
            .ok_or_else(|| CoreError::not_found("student", student_id))?;
        let term = Self::resolve(book, term_id)?;
        let fee_payable = LedgerEngine::fee_payable(student, term);
        let paid = term
            .map(|t| LedgerEngine::paid(student_id, t.id, &book.payments))
            .unwrap_or(0.0);
        let balance = LedgerEngine::balance(student, term, &book.payments);
        let mut payments: Vec<Payment> = match term {
            Some(term) => book
                .payments_for_term(term.id)
                .filter(|p| p.student_id == student_id)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        payments.sort_by_key(|p| p.created_at);
        Ok(StudentStatement {
            student_id,
            term_id: term.map(|t| t.id),
            fee_payable,
            paid,
            balance,
            amount_owed: balance.max(0.0),
            payments,
        })
    }

    /// Debtors grouped by class, in class order.
    pub fn debtors_report(
        book: &FeeBook,
        term_id: Option<Uuid>,
    ) -> Result<Vec<DebtorGroup>, CoreError> {
        let term = Self::resolve(book, term_id)?;
        let report = LedgerEngine::debtors_by_class(book.active_students(), term, &book.payments);
        Ok(report.in_class_order().into_iter().cloned().collect())
    }

    /// Settled collections per payment method, in method declaration order.
    pub fn collections_by_method(
        book: &FeeBook,
        term_id: Option<Uuid>,
    ) -> Result<Vec<(PaymentMethod, f64)>, CoreError> {
        let Some(term) = Self::resolve(book, term_id)? else {
            return Ok(Vec::new());
        };
        let methods = [PaymentMethod::Cash, PaymentMethod::Pos, PaymentMethod::Transfer];
        Ok(methods
            .iter()
            .map(|method| {
                let total: f64 = book
                    .payments_for_term(term.id)
                    .filter(|p| p.is_settled() && p.method == *method)
                    .map(|p| p.amount)
                    .sum();
                (*method, total)
            })
            .collect())
    }

    fn resolve(book: &FeeBook, term_id: Option<Uuid>) -> Result<Option<&Term>, CoreError> {
        match term_id {
            Some(id) => book
                .term(id)
                .map(Some)
                .ok_or_else(|| CoreError::not_found("term", id)),
            None => Ok(book.active_term()),
        }
    }
}
