//! bursary-domain
//!
//! Pure domain models (sessions, terms, classes, students, payments, fee changes, roles).
//! No I/O, no storage. Only data types, core enums and the `FeeBook` aggregate.

pub mod access;
pub mod book;
pub mod class;
pub mod common;
pub mod fee_change;
pub mod fee_schedule;
pub mod payment;
pub mod session;
pub mod student;

pub use access::*;
pub use book::*;
pub use class::*;
pub use common::*;
pub use fee_change::*;
pub use fee_schedule::*;
pub use payment::*;
pub use session::*;
pub use student::*;
