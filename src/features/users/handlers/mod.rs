mod agent_handler;
mod user_handler;

pub use agent_handler::*;
pub use user_handler::*;
