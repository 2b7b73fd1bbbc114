mod ledger;
mod user_service;

pub use ledger::EarningLedger;
pub use user_service::{ensure_assignable, search_pattern, UserService};
