mod notification;

pub use notification::{Audience, NewNotification, Notification, NotificationKind};
