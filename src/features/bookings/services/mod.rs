mod booking_service;

pub use booking_service::{pickup_statuses, price_item, BookingFilter, BookingService};
