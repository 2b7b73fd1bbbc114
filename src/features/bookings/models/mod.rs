mod booking;

pub(crate) use booking::BOOKING_COLUMNS;
pub use booking::{
    Booking, BookingDetails, BookingItem, BookingStatus, NewBooking, PaymentMethod,
    PaymentStatus, PickupAddress, StatusHistoryEntry, TimeSlot,
};
