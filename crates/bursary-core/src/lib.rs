//! bursary-core
//!
//! Fee ledger and approval engine for the bursary.
//! Depends on bursary-domain. No CLI, no terminal I/O, no file formats.

pub mod access_service;
pub mod error;
pub mod fee_change_service;
pub mod ledger_service;
pub mod payment_service;
pub mod promotion_service;
pub mod roster_service;
pub mod session_service;
pub mod storage;
pub mod summary_service;
pub mod time;


pub use access_service::*;
pub use error::CoreError;
pub use fee_change_service::*;
pub use ledger_service::*;
pub use payment_service::*;
pub use promotion_service::*;
pub use roster_service::*;
pub use session_service::*;
pub use storage::{transact_with, FeeStore, MemoryFeeStore};
pub use summary_service::*;
pub use time::{Clock, FixedClock, SystemClock};
