mod common;

use std::{sync::Arc, thread};

use bursary::{
    bursary_core::{Decision, PaymentSubmission, ReceiptStatus},
    bursary_domain::{ApprovalStatus, AuditAction, PaymentMethod, SchoolClass},
    BursaryError, Config, FeeOffice,
};
use common::{fixed_clock, pupil, staffed_office};
use uuid::Uuid;

fn cash(student_id: Uuid, amount: f64) -> PaymentSubmission {
    PaymentSubmission {
        student_id,
        term_id: None,
        amount,
        method: PaymentMethod::Cash,
    }
}

#[test]
fn primary_one_payment_lifecycle() {
    let s = staffed_office(FeeOffice::in_memory(&Config::default(), fixed_clock()));
    let student = s
        .office
        .register_student(s.clerk, pupil("Ada", SchoolClass::Primary1))
        .expect("register");

    let statement = s.office.student_statement(s.admin, student.id, None).unwrap();
    assert_eq!(statement.fee_payable, 100_000.0);
    assert_eq!(statement.balance, 100_000.0);

    let payment = s
        .office
        .submit_payment(s.clerk, cash(student.id, 40_000.0))
        .expect("submit");
    assert_eq!(payment.approval_status, ApprovalStatus::Pending);
    let pending = s.office.pending_payments(s.admin).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(
        s.office.student_statement(s.admin, student.id, None).unwrap().balance,
        100_000.0
    );

    s.office
        .decide_payment(s.admin, payment.id, Decision::Approve, None)
        .expect("approve");
    assert!(s.office.pending_payments(s.admin).unwrap().is_empty());
    assert_eq!(
        s.office.student_statement(s.admin, student.id, None).unwrap().balance,
        60_000.0
    );

    s.office
        .edit_payment(s.admin, payment.id, 60_000.0, PaymentMethod::Pos, "wrong amount keyed")
        .expect("edit");
    assert_eq!(
        s.office.student_statement(s.admin, student.id, None).unwrap().balance,
        40_000.0
    );

    s.office
        .void_payment(s.admin, payment.id, "bounced transfer")
        .expect("void");
    assert_eq!(
        s.office.student_statement(s.admin, student.id, None).unwrap().balance,
        100_000.0
    );

    let trail = s.office.audit_trail(s.admin, payment.id).unwrap();
    let actions: Vec<_> = trail.iter().map(|a| a.action).collect();
    assert_eq!(actions, vec![AuditAction::Edited, AuditAction::Voided]);
    assert!(matches!(
        s.office.receipt(s.clerk, payment.id).unwrap(),
        ReceiptStatus::Unavailable { .. }
    ));
}

#[test]
fn staff_and_bursary_cannot_review_payments() {
    let s = staffed_office(FeeOffice::in_memory(&Config::default(), fixed_clock()));
    let student = s
        .office
        .register_student(s.bursar, pupil("Bola", SchoolClass::Jss1))
        .unwrap();
    let payment = s
        .office
        .submit_payment(s.bursar, cash(student.id, 20_000.0))
        .unwrap();

    for actor in [s.clerk, s.bursar] {
        let err = s
            .office
            .decide_payment(actor, payment.id, Decision::Approve, None)
            .unwrap_err();
        assert!(matches!(err, BursaryError::PermissionDenied(_)));
        assert!(matches!(
            s.office.pending_payments(actor),
            Err(BursaryError::PermissionDenied(_))
        ));
    }
    assert!(matches!(
        s.office.term_overview(s.clerk, None),
        Err(BursaryError::PermissionDenied(_))
    ));
    assert!(s.office.term_overview(s.bursar, None).is_ok());
}

#[test]
fn deactivated_user_is_denied() {
    let s = staffed_office(FeeOffice::in_memory(&Config::default(), fixed_clock()));
    let student = s
        .office
        .register_student(s.clerk, pupil("Chi", SchoolClass::Primary1))
        .unwrap();
    s.office.set_user_active(s.admin, s.clerk, false).unwrap();

    let err = s
        .office
        .submit_payment(s.clerk, cash(student.id, 1_000.0))
        .unwrap_err();
    assert!(matches!(err, BursaryError::PermissionDenied(_)));
    assert!(matches!(
        s.office.set_user_active(s.admin, s.admin, false),
        Err(BursaryError::InvalidState { .. })
    ));
}

#[test]
fn payments_need_an_active_term() {
    let office = FeeOffice::in_memory(&Config::default(), fixed_clock());
    let admin = office.bootstrap_admin("Principal").unwrap().id;
    office
        .create_session(admin, "2024/2025", 2024, 2025, false)
        .unwrap();
    let student = office
        .register_student(admin, pupil("Dayo", SchoolClass::Primary2))
        .unwrap();

    let err = office
        .submit_payment(admin, cash(student.id, 5_000.0))
        .unwrap_err();
    assert!(matches!(err, BursaryError::Validation(_)));
    assert!(office.snapshot().unwrap().payments.is_empty());
}

#[test]
fn rejected_payment_keeps_notes_and_never_counts() {
    let s = staffed_office(FeeOffice::in_memory(&Config::default(), fixed_clock()));
    let student = s
        .office
        .register_student(s.clerk, pupil("Efe", SchoolClass::Primary1))
        .unwrap();
    let payment = s
        .office
        .submit_payment(s.clerk, cash(student.id, 30_000.0))
        .unwrap();
    let rejected = s
        .office
        .decide_payment(s.admin, payment.id, Decision::Reject, Some("no teller"))
        .unwrap();
    assert_eq!(rejected.approval_status, ApprovalStatus::Rejected);
    assert_eq!(rejected.review_notes.as_deref(), Some("no teller"));

    let err = s
        .office
        .decide_payment(s.admin, payment.id, Decision::Approve, None)
        .unwrap_err();
    assert!(matches!(err, BursaryError::InvalidState { .. }));
    let overview = s.office.term_overview(s.admin, None).unwrap();
    assert_eq!(overview.collected, 0.0);
    assert_eq!(overview.outstanding, 100_000.0);
}

#[test]
fn overpayment_shows_negative_balance_but_is_clamped_in_reports() {
    let s = staffed_office(FeeOffice::in_memory(&Config::default(), fixed_clock()));
    let student = s
        .office
        .register_student(s.clerk, pupil("Femi", SchoolClass::Primary1))
        .unwrap();
    let payment = s
        .office
        .submit_payment(s.clerk, cash(student.id, 120_000.0))
        .unwrap();
    assert_eq!(payment.outstanding_balance, -20_000.0);
    s.office
        .decide_payment(s.admin, payment.id, Decision::Approve, None)
        .unwrap();

    let statement = s.office.student_statement(s.admin, student.id, None).unwrap();
    assert_eq!(statement.balance, -20_000.0);
    assert_eq!(statement.amount_owed, 0.0);
    assert!(s.office.debtors(s.admin, None).unwrap().is_empty());
    match s.office.receipt(s.clerk, payment.id).unwrap() {
        ReceiptStatus::Ready(receipt) => assert_eq!(receipt.balance_remaining, 0.0),
        other => panic!("expected a receipt, got {other:?}"),
    }
}

#[test]
fn racing_reviewers_produce_exactly_one_decision() {
    let s = staffed_office(FeeOffice::in_memory(&Config::default(), fixed_clock()));
    let student = s
        .office
        .register_student(s.clerk, pupil("Gbenga", SchoolClass::Primary1))
        .unwrap();
    let payment = s
        .office
        .submit_payment(s.clerk, cash(student.id, 40_000.0))
        .unwrap();
    let second_admin = s
        .office
        .add_user(s.admin, "Proprietor", bursary::bursary_domain::Role::SuperAdmin)
        .unwrap()
        .id;

    let office = Arc::new(s.office);
    let handles: Vec<_> = [(s.admin, Decision::Approve), (second_admin, Decision::Reject)]
        .into_iter()
        .map(|(reviewer, decision)| {
            let office = Arc::clone(&office);
            thread::spawn(move || office.decide_payment(reviewer, payment.id, decision, None))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("reviewer thread"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(BursaryError::InvalidState { .. }))));
}
