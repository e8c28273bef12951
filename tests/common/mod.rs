#![allow(dead_code)]

use std::sync::Mutex;

use bursary::{
    bursary_core::{FixedClock, NewStudent},
    bursary_domain::{FeeRow, Role, SchoolClass},
    Config, FeeOffice,
};
use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Config pointing at a fresh temporary data directory.
pub fn temp_config() -> Config {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    Config {
        school_name: "Greenfield Academy".into(),
        data_dir: Some(base),
        ..Config::default()
    }
}

pub struct Staffed {
    pub office: FeeOffice,
    pub admin: Uuid,
    pub bursar: Uuid,
    pub clerk: Uuid,
    pub terms: Vec<Uuid>,
}

pub fn fixed_clock() -> Box<FixedClock> {
    Box::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 9, 10, 8, 0, 0).unwrap(),
    ))
}

/// An office with three users and an active 1st term charging Primary 1 100,000 for new
/// intake and 85,000 for returning students.
pub fn staffed_office(office: FeeOffice) -> Staffed {
    let admin = office.bootstrap_admin("Principal").expect("bootstrap").id;
    let bursar = office
        .add_user(admin, "Bursar", Role::Bursary)
        .expect("add bursar")
        .id;
    let clerk = office
        .add_user(admin, "Front Desk", Role::Staff)
        .expect("add clerk")
        .id;
    let (_, terms) = office
        .create_session(admin, "2024/2025", 2024, 2025, false)
        .expect("create session");
    let terms: Vec<Uuid> = terms.iter().map(|t| t.id).collect();
    office
        .replace_fee_schedule(
            admin,
            terms[0],
            vec![
                FeeRow::new(SchoolClass::Primary1, 100_000.0, 85_000.0),
                FeeRow::new(SchoolClass::Jss1, 150_000.0, 120_000.0),
            ],
        )
        .expect("fee schedule");
    office.activate_term(admin, terms[0]).expect("activate");
    Staffed {
        office,
        admin,
        bursar,
        clerk,
        terms,
    }
}

pub fn pupil(first: &str, class: SchoolClass) -> NewStudent {
    NewStudent {
        first_name: first.into(),
        middle_name: None,
        last_name: "Okafor".into(),
        class,
        parent_name: None,
        parent_phone: "08031234567".into(),
        entry_year: 2024,
        is_new_intake: true,
    }
}
