use bursary::{
    bursary_core::{
        transact_with, AccessService, Decision, FixedClock, LedgerEngine, NewStudent,
        PaymentService, PaymentSubmission, RegistrationFormat, RosterService, SessionService,
        SummaryService,
    },
    bursary_domain::{FeeBook, FeeRow, PaymentMethod, SchoolClass},
    bursary_storage_json::{load_book_from_path, JsonFeeStore},
};
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::tempdir;

fn build_sample_book(student_count: usize) -> FeeBook {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap());
    let mut book = FeeBook::new(Utc.with_ymd_and_hms(2025, 1, 6, 8, 0, 0).unwrap());
    let admin = AccessService::bootstrap(&mut book, &clock, "Bench").unwrap().id;
    let (_, terms) =
        SessionService::create_session(&mut book, &clock, admin, "2024/2025", 2024, 2025, false)
            .unwrap();
    let rows = SchoolClass::ALL
        .iter()
        .enumerate()
        .map(|(idx, class)| {
            let base = 60_000.0 + idx as f64 * 10_000.0;
            FeeRow::new(*class, base, base * 0.85)
        })
        .collect();
    SessionService::replace_fee_schedule(&mut book, &clock, admin, terms[1].id, rows).unwrap();
    SessionService::activate_term(&mut book, &clock, admin, terms[1].id).unwrap();

    let format = RegistrationFormat::default();
    for idx in 0..student_count {
        let class = SchoolClass::ALL[idx % SchoolClass::ALL.len()];
        let student = RosterService::register(
            &mut book,
            &clock,
            admin,
            &format,
            NewStudent {
                first_name: format!("Student{idx}"),
                middle_name: None,
                last_name: "Bench".into(),
                class,
                parent_name: None,
                parent_phone: "0800000000".into(),
                entry_year: 2015 + (idx % 10) as i32,
                is_new_intake: idx % 4 == 0,
            },
        )
        .unwrap();
        for installment in 0..3 {
            let payment = PaymentService::submit(
                &mut book,
                &clock,
                admin,
                PaymentSubmission {
                    student_id: student.id,
                    term_id: None,
                    amount: 15_000.0 + (installment * 1_000) as f64,
                    method: PaymentMethod::Cash,
                },
            )
            .unwrap();
            if (idx + installment) % 3 != 0 {
                PaymentService::decide(
                    &mut book,
                    &clock,
                    payment.id,
                    Decision::Approve,
                    admin,
                    None,
                )
                .unwrap();
            }
        }
    }
    book
}

fn bench_aggregation(c: &mut Criterion) {
    let book = build_sample_book(black_box(2_000));
    let term = book.active_term();

    c.bench_function("debtors_by_class_2k", |b| {
        b.iter(|| {
            let report = LedgerEngine::debtors_by_class(book.active_students(), term, &book.payments);
            black_box(report);
        })
    });

    c.bench_function("term_overview_2k", |b| {
        b.iter(|| {
            let overview = SummaryService::term_overview(&book, None).expect("overview");
            black_box(overview);
        })
    });
}

fn bench_store_io(c: &mut Criterion) {
    let book = build_sample_book(black_box(2_000));
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("feebook.json");
    let store = JsonFeeStore::with_retention(path.clone(), dir.path().join("backups"), 1)
        .expect("open store");
    transact_with(&store, |draft| {
        *draft = book.clone();
        Ok(())
    })
    .expect("seed");

    c.bench_function("store_commit_2k", |b| {
        b.iter(|| {
            transact_with(&store, |draft| {
                draft.touch(Utc::now());
                Ok(())
            })
            .expect("commit");
        })
    });

    c.bench_function("store_load_2k", |b| {
        b.iter(|| {
            let loaded = load_book_from_path(&path).expect("load book");
            black_box(loaded);
        })
    });
}

criterion_group!(benches, bench_aggregation, bench_store_io);
criterion_main!(benches);
