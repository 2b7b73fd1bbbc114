mod earning_event;
mod user;

pub use earning_event::{CreateEarningEvent, EarningEvent, EarningTotals};
pub(crate) use user::USER_COLUMNS;
pub use user::{UpsertAgent, User, UserRole};
