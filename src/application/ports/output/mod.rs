pub mod notification_cache_port;
pub mod notification_feed_port;
