pub mod notification;
pub mod notification_list;
