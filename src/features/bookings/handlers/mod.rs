mod booking_handler;
mod pickup_handler;

pub use booking_handler::*;
pub use pickup_handler::*;
