pub mod http_notification_feed;

pub use http_notification_feed::HttpNotificationFeed;
