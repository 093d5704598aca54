pub mod application_settings;

pub use application_settings::{ApiConfig, CacheConfig, Settings, SettingsError, SyncConfig};
