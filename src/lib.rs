#![doc(test(attr(deny(warnings))))]

//! Bursary keeps a school's fee ledger: term fee schedules, payments that only count
//! once a super admin approves them, audited corrections, fee-change requests and the
//! end-of-session promotion of the roster.
//!
//! [`office::FeeOffice`] is the entry point; the engine itself lives in `bursary-core`.

pub mod errors;
pub mod office;
pub mod utils;

pub use bursary_config::{Config, ConfigManager};
pub use bursary_core;
pub use bursary_domain;
pub use bursary_storage_json;
pub use errors::BursaryError;
pub use office::FeeOffice;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("bursary tracing initialized");
    });
}
